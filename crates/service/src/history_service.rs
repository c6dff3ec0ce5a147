use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use serde_json::Value;
use tracing::{instrument, warn};

use models::db::Db;
use models::history::{self, EntityName, HistoryAction};
use crate::errors::ServiceError;

#[derive(Debug, Clone)]
pub struct CreateHistory {
    pub user_id: Option<i32>,
    pub entity_name: EntityName,
    pub entity_id: i32,
    pub action: HistoryAction,
    pub entity: Value,
}

#[instrument(skip(db, input), fields(action = input.action.as_str(), entity_id = input.entity_id))]
pub async fn create(db: &Db, input: CreateHistory) -> Result<history::Model, ServiceError> {
    let created = history::ActiveModel {
        user_id: Set(input.user_id),
        entity_name: Set(input.entity_name.as_str().into()),
        entity_id: Set(input.entity_id),
        action: Set(input.action.as_str().into()),
        entity: Set(input.entity),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db.writer())
    .await?;
    Ok(created)
}

/// Fire-and-forget variant; failures are only logged.
pub fn spawn_create(db: Db, input: CreateHistory) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        if let Err(e) = create(&db, input).await {
            warn!(error = %e, "history write failed");
        }
    })
}

pub async fn find_by_entity(db: &Db, entity_name: EntityName, entity_id: i32) -> Result<Vec<history::Model>, ServiceError> {
    Ok(history::Entity::find()
        .filter(history::Column::EntityName.eq(entity_name.as_str()))
        .filter(history::Column::EntityId.eq(entity_id))
        .order_by_asc(history::Column::Id)
        .all(db.reader())
        .await?)
}

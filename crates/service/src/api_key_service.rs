use chrono::Utc;
use rand::{distributions::Alphanumeric, Rng};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};
use tracing::{info, instrument};

use models::api_key;
use models::db::Db;
use crate::errors::ServiceError;

const KEY_LEN: usize = 20;

fn generate_key() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(KEY_LEN)
        .map(|b| (b as char).to_ascii_uppercase())
        .collect()
}

/// Issue a new random key for the project.
#[instrument(skip(db))]
pub async fn create(db: &Db, project_id: i32) -> Result<api_key::Model, ServiceError> {
    crate::project_service::find_by_id(db, project_id).await?;
    let created = api_key::ActiveModel {
        project_id: Set(project_id),
        value: Set(generate_key()),
        created_at: Set(Utc::now()),
        deleted_at: Set(None),
        ..Default::default()
    }
    .insert(db.writer())
    .await?;
    info!(api_key_id = created.id, "api_key_created");
    Ok(created)
}

/// `Unauthorized` unless `value` is a live key of `project_id`.
pub async fn verify(db: &Db, project_id: i32, value: &str) -> Result<api_key::Model, ServiceError> {
    api_key::Entity::find()
        .filter(api_key::Column::Value.eq(value))
        .filter(api_key::Column::ProjectId.eq(project_id))
        .filter(api_key::Column::DeletedAt.is_null())
        .one(db.reader())
        .await?
        .ok_or_else(|| ServiceError::Unauthorized("Invalid API key".into()))
}

/// Soft delete; the key stops authenticating immediately.
pub async fn revoke(db: &Db, project_id: i32, api_key_id: i32) -> Result<(), ServiceError> {
    let mut am: api_key::ActiveModel = api_key::Entity::find_by_id(api_key_id)
        .filter(api_key::Column::ProjectId.eq(project_id))
        .one(db.writer())
        .await?
        .ok_or_else(|| ServiceError::not_found("ApiKey"))?
        .into();
    am.deleted_at = Set(Some(Utc::now()));
    am.update(db.writer()).await?;
    Ok(())
}

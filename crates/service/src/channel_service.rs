//! Channels and their field definitions.
use std::collections::HashSet;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use models::db::Db;
use models::field::{FieldFormat, FieldType, DEFAULT_FIELDS};
use models::{channel, field, project};
use crate::errors::ServiceError;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateField {
    pub key: String,
    pub name: String,
    pub format: FieldFormat,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(default)]
    pub options: Option<Vec<String>>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateChannel {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub fields: Vec<CreateField>,
}

/// Channel with its owning project and field definitions.
#[derive(Debug, Clone, Serialize)]
pub struct ChannelDetail {
    #[serde(flatten)]
    pub channel: channel::Model,
    pub project: project::Model,
    pub fields: Vec<field::Model>,
}

impl ChannelDetail {
    pub fn field(&self, key: &str) -> Option<&field::Model> {
        self.fields.iter().find(|f| f.key == key)
    }
}

fn validate_fields(fields: &[CreateField]) -> Result<(), ServiceError> {
    let mut seen = HashSet::new();
    for f in fields {
        if f.key.trim().is_empty() || f.name.trim().is_empty() {
            return Err(ServiceError::bad_request("field key and name must not be empty"));
        }
        if !f.key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-') {
            return Err(ServiceError::bad_request(format!("invalid field key: {}", f.key)));
        }
        if models::field::is_default_key(&f.key) {
            return Err(ServiceError::bad_request(format!("field key is reserved: {}", f.key)));
        }
        if f.field_type == FieldType::Default {
            return Err(ServiceError::bad_request("DEFAULT fields are managed by the system"));
        }
        if !seen.insert(f.key.as_str()) {
            return Err(ServiceError::bad_request(format!("duplicated field key: {}", f.key)));
        }
        let selectable = matches!(f.format, FieldFormat::Select | FieldFormat::MultiSelect);
        if !selectable && f.options.as_ref().is_some_and(|o| !o.is_empty()) {
            return Err(ServiceError::bad_request(format!("options are only allowed on select fields: {}", f.key)));
        }
    }
    Ok(())
}

/// Create a channel; the DEFAULT fields are added ahead of `fields`.
#[instrument(skip(db, input), fields(name = %input.name))]
pub async fn create(db: &Db, project_id: i32, input: CreateChannel) -> Result<ChannelDetail, ServiceError> {
    if input.name.trim().is_empty() {
        return Err(ServiceError::bad_request("name must not be empty"));
    }
    validate_fields(&input.fields)?;

    let txn = db.writer().begin().await?;
    if project::Entity::find_by_id(project_id).one(&txn).await?.is_none() {
        txn.rollback().await?;
        return Err(ServiceError::not_found("Project"));
    }
    let dup = channel::Entity::find()
        .filter(channel::Column::ProjectId.eq(project_id))
        .filter(channel::Column::Name.eq(input.name.clone()))
        .count(&txn)
        .await?;
    if dup > 0 {
        txn.rollback().await?;
        return Err(ServiceError::NameDuplicated("Channel name is duplicated".into()));
    }

    let now = Utc::now();
    let created = channel::ActiveModel {
        project_id: Set(project_id),
        name: Set(input.name),
        description: Set(input.description),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    let defaults = DEFAULT_FIELDS.iter().map(|(key, name, format)| field::ActiveModel {
        channel_id: Set(created.id),
        key: Set(key.to_string()),
        name: Set(name.to_string()),
        format: Set(format.as_str().into()),
        field_type: Set(FieldType::Default.as_str().into()),
        options: Set(None),
        description: Set(None),
        created_at: Set(now),
        ..Default::default()
    });
    let custom = input.fields.into_iter().map(|f| field::ActiveModel {
        channel_id: Set(created.id),
        key: Set(f.key),
        name: Set(f.name),
        format: Set(f.format.as_str().into()),
        field_type: Set(f.field_type.as_str().into()),
        options: Set(f.options.map(|o| serde_json::json!(o))),
        description: Set(f.description),
        created_at: Set(now),
        ..Default::default()
    });
    field::Entity::insert_many(defaults.chain(custom)).exec(&txn).await?;

    let detail = load_detail(&txn, created).await?;
    txn.commit().await?;
    info!(channel_id = detail.channel.id, fields = detail.fields.len(), "channel_created");
    Ok(detail)
}

/// Channel with project and fields; `NotFound` when missing.
pub async fn find_by_id(db: &Db, channel_id: i32) -> Result<ChannelDetail, ServiceError> {
    let conn = db.reader();
    let found = channel::Entity::find_by_id(channel_id)
        .one(conn)
        .await?
        .ok_or_else(|| ServiceError::not_found("Channel"))?;
    load_detail(conn, found).await
}

async fn load_detail<C: ConnectionTrait>(conn: &C, ch: channel::Model) -> Result<ChannelDetail, ServiceError> {
    let project = project::Entity::find_by_id(ch.project_id)
        .one(conn)
        .await?
        .ok_or_else(|| ServiceError::not_found("Project"))?;
    let fields = field::Entity::find()
        .filter(field::Column::ChannelId.eq(ch.id))
        .order_by_asc(field::Column::Id)
        .all(conn)
        .await?;
    Ok(ChannelDetail { channel: ch, project, fields })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::fixture;

    #[tokio::test]
    async fn create_adds_default_fields_first() -> Result<(), anyhow::Error> {
        let fx = fixture().await?;
        let keys: Vec<_> = fx.channel.fields.iter().map(|f| f.key.as_str()).collect();
        assert_eq!(&keys[..4], &["id", "createdAt", "updatedAt", "issues"]);
        assert!(fx.channel.fields[..4].iter().all(|f| f.field_type == "DEFAULT"));
        assert_eq!(fx.channel.field("os").unwrap().option_list(), vec!["ios", "android"]);
        assert_eq!(fx.channel.project.id, fx.project.id);

        let found = find_by_id(&fx.db, fx.channel.channel.id).await?;
        assert_eq!(found.fields.len(), fx.channel.fields.len());
        Ok(())
    }

    #[tokio::test]
    async fn reserved_and_duplicated_keys_are_rejected() -> Result<(), anyhow::Error> {
        let fx = fixture().await?;
        let f = |key: &str| CreateField {
            key: key.into(),
            name: key.into(),
            format: FieldFormat::Text,
            field_type: FieldType::Api,
            options: None,
            description: None,
        };
        let reserved = CreateChannel { name: "c2".into(), description: None, fields: vec![f("createdAt")] };
        assert!(matches!(create(&fx.db, fx.project.id, reserved).await, Err(ServiceError::BadRequest(_))));

        let dup = CreateChannel { name: "c3".into(), description: None, fields: vec![f("a"), f("a")] };
        assert!(matches!(create(&fx.db, fx.project.id, dup).await, Err(ServiceError::BadRequest(_))));

        let same_name = CreateChannel { name: "app".into(), description: None, fields: vec![] };
        assert!(matches!(create(&fx.db, fx.project.id, same_name).await, Err(ServiceError::NameDuplicated(_))));
        Ok(())
    }

    #[tokio::test]
    async fn missing_channel_is_not_found() -> Result<(), anyhow::Error> {
        let fx = fixture().await?;
        assert!(matches!(find_by_id(&fx.db, 999).await, Err(ServiceError::NotFound(_))));
        Ok(())
    }
}

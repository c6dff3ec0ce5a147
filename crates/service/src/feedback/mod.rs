//! Feedback records of a channel: intake, search, issue links, admin edits
//! and bulk deletion.

pub mod search;
pub mod validate;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{info, instrument};

use models::db::Db;
use models::field::FieldType;
use models::{channel, feedback, feedback_issue, issue};
use crate::channel_service::{self, ChannelDetail};
use crate::errors::ServiceError;
use crate::issue_service;
use crate::pagination::Page;
use crate::query::format_datetime;

pub use search::SearchFeedbacks;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueLink {
    pub feedback_id: i32,
    pub issue_id: i32,
}

/// Feedback data flattened with its system fields.
pub fn to_item(fb: &feedback::Model, issues: &[issue::Model]) -> Map<String, Value> {
    let mut item = fb.data.as_object().cloned().unwrap_or_default();
    item.insert("id".into(), Value::from(fb.id));
    item.insert("createdAt".into(), Value::String(format_datetime(&fb.created_at)));
    item.insert("updatedAt".into(), Value::String(format_datetime(&fb.updated_at)));
    item.insert("issues".into(), serde_json::to_value(issues).unwrap_or(Value::Array(vec![])));
    item
}

/// Store a feedback sent through the API; only API fields are accepted.
#[instrument(skip(db, data))]
pub async fn create(
    db: &Db,
    project_id: i32,
    channel_id: i32,
    data: Map<String, Value>,
) -> Result<feedback::Model, ServiceError> {
    let channel = channel_service::find_by_id(db, channel_id).await?;
    if channel.project.id != project_id {
        return Err(ServiceError::bad_request("Invalid channel id"));
    }
    let validated = validate::validate_payload(&channel.fields, &data, FieldType::Api)?;

    let now = Utc::now();
    let created = feedback::ActiveModel {
        channel_id: Set(channel_id),
        data: Set(Value::Object(validated)),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db.writer())
    .await?;
    info!(feedback_id = created.id, channel_id, "feedback_created");
    Ok(created)
}

/// Paginated search; items carry the flattened data and linked issues.
#[instrument(skip(db, input))]
pub async fn search(db: &Db, channel_id: i32, input: SearchFeedbacks) -> Result<Page<Map<String, Value>>, ServiceError> {
    let channel = channel_service::find_by_id(db, channel_id).await?;
    search_in(db, &channel, &input).await
}

pub(crate) async fn search_in(
    db: &Db,
    channel: &ChannelDetail,
    input: &SearchFeedbacks,
) -> Result<Page<Map<String, Value>>, ServiceError> {
    let conn = db.reader();
    let (rows, total) = search::find_page(conn, channel, &input.query, &input.sort, input.pagination).await?;
    let ids: Vec<i32> = rows.iter().map(|f| f.id).collect();
    let issues = issue_service::find_by_feedback_ids(conn, &ids).await?;
    let items = rows
        .iter()
        .map(|fb| to_item(fb, issues.get(&fb.id).map(Vec::as_slice).unwrap_or(&[])))
        .collect();
    Ok(Page::new(items, input.pagination, total))
}

async fn load_pair<C: sea_orm::ConnectionTrait>(
    conn: &C,
    channel_id: i32,
    feedback_id: i32,
    issue_id: i32,
) -> Result<(feedback::Model, issue::Model), ServiceError> {
    let ch = channel::Entity::find_by_id(channel_id)
        .one(conn)
        .await?
        .ok_or_else(|| ServiceError::not_found("Channel"))?;
    let fb = feedback::Entity::find_by_id(feedback_id)
        .filter(feedback::Column::ChannelId.eq(channel_id))
        .one(conn)
        .await?
        .ok_or_else(|| ServiceError::not_found("Feedback"))?;
    let is = issue::Entity::find_by_id(issue_id)
        .filter(issue::Column::ProjectId.eq(ch.project_id))
        .one(conn)
        .await?
        .ok_or_else(|| ServiceError::not_found("Issue"))?;
    Ok((fb, is))
}

/// Link a feedback to an issue. Linking twice is a no-op.
#[instrument(skip(db))]
pub async fn add_issue(db: &Db, channel_id: i32, feedback_id: i32, issue_id: i32) -> Result<IssueLink, ServiceError> {
    let txn = db.writer().begin().await?;
    let (fb, is) = match load_pair(&txn, channel_id, feedback_id, issue_id).await {
        Ok(pair) => pair,
        Err(e) => {
            txn.rollback().await?;
            return Err(e);
        }
    };
    let existing = feedback_issue::Entity::find_by_id((fb.id, is.id)).one(&txn).await?;
    if existing.is_none() {
        feedback_issue::ActiveModel { feedback_id: Set(fb.id), issue_id: Set(is.id) }
            .insert(&txn)
            .await?;
        issue_service::bump_feedback_count(&txn, is.id, 1).await?;
        touch(&txn, fb).await?;
    }
    txn.commit().await?;
    Ok(IssueLink { feedback_id, issue_id })
}

/// Remove a link; removing a missing link is a no-op.
#[instrument(skip(db))]
pub async fn remove_issue(db: &Db, channel_id: i32, feedback_id: i32, issue_id: i32) -> Result<IssueLink, ServiceError> {
    let txn = db.writer().begin().await?;
    let (fb, is) = match load_pair(&txn, channel_id, feedback_id, issue_id).await {
        Ok(pair) => pair,
        Err(e) => {
            txn.rollback().await?;
            return Err(e);
        }
    };
    let removed = feedback_issue::Entity::delete_by_id((fb.id, is.id)).exec(&txn).await?;
    if removed.rows_affected > 0 {
        issue_service::bump_feedback_count(&txn, is.id, -1).await?;
        touch(&txn, fb).await?;
    }
    txn.commit().await?;
    Ok(IssueLink { feedback_id, issue_id })
}

async fn touch<C: sea_orm::ConnectionTrait>(conn: &C, fb: feedback::Model) -> Result<(), ServiceError> {
    let mut am: feedback::ActiveModel = fb.into();
    am.updated_at = Set(Utc::now());
    am.update(conn).await?;
    Ok(())
}

/// Patch ADMIN fields of a feedback; other keys are rejected.
#[instrument(skip(db, patch))]
pub async fn update(
    db: &Db,
    channel_id: i32,
    feedback_id: i32,
    patch: Map<String, Value>,
) -> Result<feedback::Model, ServiceError> {
    let channel = channel_service::find_by_id(db, channel_id).await?;
    let validated = validate::validate_payload(&channel.fields, &patch, FieldType::Admin)?;

    let txn = db.writer().begin().await?;
    let Some(fb) = feedback::Entity::find_by_id(feedback_id)
        .filter(feedback::Column::ChannelId.eq(channel_id))
        .one(&txn)
        .await?
    else {
        txn.rollback().await?;
        return Err(ServiceError::not_found("Feedback"));
    };
    let mut data = fb.data.as_object().cloned().unwrap_or_default();
    data.extend(validated);

    let mut am: feedback::ActiveModel = fb.into();
    am.data = Set(Value::Object(data));
    am.updated_at = Set(Utc::now());
    let updated = am.update(&txn).await?;
    txn.commit().await?;
    Ok(updated)
}

/// Delete feedback of the channel among `feedback_ids` together with their
/// issue links; cached issue counts are recomputed in the same transaction.
#[instrument(skip(db, feedback_ids), fields(count = feedback_ids.len()))]
pub async fn delete_by_ids(db: &Db, channel_id: i32, feedback_ids: &[i32]) -> Result<u64, ServiceError> {
    if feedback_ids.is_empty() {
        return Ok(0);
    }
    let txn = db.writer().begin().await?;
    let owned: Vec<i32> = feedback::Entity::find()
        .filter(feedback::Column::ChannelId.eq(channel_id))
        .filter(feedback::Column::Id.is_in(feedback_ids.to_vec()))
        .all(&txn)
        .await?
        .into_iter()
        .map(|f| f.id)
        .collect();
    if owned.is_empty() {
        txn.rollback().await?;
        return Ok(0);
    }

    let mut touched: Vec<i32> = feedback_issue::Entity::find()
        .filter(feedback_issue::Column::FeedbackId.is_in(owned.clone()))
        .all(&txn)
        .await?
        .into_iter()
        .map(|l| l.issue_id)
        .collect();
    touched.sort_unstable();
    touched.dedup();

    feedback_issue::Entity::delete_many()
        .filter(feedback_issue::Column::FeedbackId.is_in(owned.clone()))
        .exec(&txn)
        .await?;
    let res = feedback::Entity::delete_many()
        .filter(feedback::Column::Id.is_in(owned))
        .exec(&txn)
        .await?;
    issue_service::recount_feedbacks(&txn, &touched).await?;
    txn.commit().await?;
    info!(channel_id, deleted = res.rows_affected, "feedbacks_deleted");
    Ok(res.rows_affected)
}

use std::collections::BTreeMap;

use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{info, instrument};

use models::db::Db;
use models::issue::{self, IssueStatus};
use models::feedback_issue;
use crate::errors::ServiceError;
use crate::pagination::{Page, Pagination};
use crate::query::{like_pattern, parse_sort, text_as_id, TimeRange};
use crate::tenant_service::Count;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateIssue {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: Option<IssueStatus>,
    #[serde(default)]
    pub external_issue_id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateIssue {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: Option<IssueStatus>,
    #[serde(default)]
    pub external_issue_id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchIssues {
    #[serde(default)]
    pub query: Map<String, Value>,
    #[serde(default)]
    pub sort: Map<String, Value>,
    #[serde(flatten)]
    pub pagination: Pagination,
}

fn column_for(key: &str) -> Option<issue::Column> {
    match key {
        "id" => Some(issue::Column::Id),
        "name" => Some(issue::Column::Name),
        "description" => Some(issue::Column::Description),
        "status" => Some(issue::Column::Status),
        "externalIssueId" => Some(issue::Column::ExternalIssueId),
        "feedbackCount" => Some(issue::Column::FeedbackCount),
        "createdAt" => Some(issue::Column::CreatedAt),
        "updatedAt" => Some(issue::Column::UpdatedAt),
        _ => None,
    }
}

fn scalar_text(key: &str, value: &Value) -> Result<String, ServiceError> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        _ => Err(ServiceError::bad_request(format!("invalid value for {key}"))),
    }
}

/// Conjunctive filter over the issue query; `searchText` is handled by the caller.
fn build_filter(project_id: i32, query: &Map<String, Value>) -> Result<Condition, ServiceError> {
    let mut cond = Condition::all().add(issue::Column::ProjectId.eq(project_id));
    for (key, value) in query {
        match key.as_str() {
            "searchText" => {}
            "createdAt" => cond = cond.add(TimeRange::from_value(key, value)?.condition(issue::Column::CreatedAt)),
            "updatedAt" => cond = cond.add(TimeRange::from_value(key, value)?.condition(issue::Column::UpdatedAt)),
            "id" => {
                let id = text_as_id(&scalar_text(key, value)?)
                    .ok_or_else(|| ServiceError::bad_request("id must be an integer"))?;
                cond = cond.add(issue::Column::Id.eq(id));
            }
            "name" | "description" | "status" | "externalIssueId" => {
                let col = column_for(key).ok_or_else(|| ServiceError::bad_request(format!("unknown query column: {key}")))?;
                cond = cond.add(col.like(like_pattern(&scalar_text(key, value)?)));
            }
            other => return Err(ServiceError::bad_request(format!("unknown query column: {other}"))),
        }
    }
    Ok(cond)
}

fn search_text_filter(text: &str) -> Condition {
    let pattern = like_pattern(text);
    let mut any = Condition::any()
        .add(issue::Column::Name.like(pattern.clone()))
        .add(issue::Column::Description.like(pattern.clone()))
        .add(issue::Column::ExternalIssueId.like(pattern));
    if let Some(id) = text_as_id(text) {
        any = any.add(issue::Column::Id.eq(id));
    }
    any
}

/// Create an issue; names are unique within a project.
#[instrument(skip(db, input), fields(name = %input.name))]
pub async fn create(db: &Db, project_id: i32, input: CreateIssue) -> Result<issue::Model, ServiceError> {
    if input.name.trim().is_empty() {
        return Err(ServiceError::bad_request("name must not be empty"));
    }
    let txn = db.writer().begin().await?;
    let dup = issue::Entity::find()
        .filter(issue::Column::ProjectId.eq(project_id))
        .filter(issue::Column::Name.eq(input.name.clone()))
        .count(&txn)
        .await?;
    if dup > 0 {
        txn.rollback().await?;
        return Err(ServiceError::NameDuplicated("Issue name is duplicated".into()));
    }

    let now = Utc::now();
    let created = issue::ActiveModel {
        project_id: Set(project_id),
        name: Set(input.name),
        description: Set(input.description),
        status: Set(input.status.unwrap_or_default().as_str().into()),
        external_issue_id: Set(input.external_issue_id),
        feedback_count: Set(0),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await?;
    txn.commit().await?;
    info!(issue_id = created.id, project_id, "issue_created");
    Ok(created)
}

/// Paginated issue search within a project.
#[instrument(skip(db, input))]
pub async fn search(db: &Db, project_id: i32, input: SearchIssues) -> Result<Page<issue::Model>, ServiceError> {
    let mut cond = build_filter(project_id, &input.query)?;
    if let Some(text) = input.query.get("searchText") {
        let text = scalar_text("searchText", text)?;
        if !text.is_empty() {
            cond = cond.add(search_text_filter(&text));
        }
    }

    let mut select = issue::Entity::find().filter(cond);
    let sort = parse_sort(&input.sort, column_for)?;
    if sort.is_empty() {
        select = select.order_by_desc(issue::Column::Id);
    }
    for (col, order) in sort {
        select = select.order_by(col, order);
    }

    let (idx, limit) = input.pagination.normalize();
    let paginator = select.paginate(db.reader(), limit);
    let total = paginator.num_items().await?;
    let items = paginator.fetch_page(idx).await?;
    Ok(Page::new(items, input.pagination, total))
}

pub async fn find_by_id(db: &Db, issue_id: i32) -> Result<issue::Model, ServiceError> {
    issue::Entity::find_by_id(issue_id)
        .one(db.reader())
        .await?
        .ok_or_else(|| ServiceError::not_found("Issue"))
}

/// Issues linked to each feedback id, ordered by issue id. Every requested
/// id is present in the result.
pub async fn find_by_feedback_ids<C: ConnectionTrait>(
    conn: &C,
    feedback_ids: &[i32],
) -> Result<BTreeMap<i32, Vec<issue::Model>>, ServiceError> {
    let mut out: BTreeMap<i32, Vec<issue::Model>> = feedback_ids.iter().map(|id| (*id, Vec::new())).collect();
    if feedback_ids.is_empty() {
        return Ok(out);
    }
    let links = feedback_issue::Entity::find()
        .filter(feedback_issue::Column::FeedbackId.is_in(feedback_ids.to_vec()))
        .all(conn)
        .await?;
    if links.is_empty() {
        return Ok(out);
    }
    let issue_ids: Vec<i32> = links.iter().map(|l| l.issue_id).collect();
    let issues: BTreeMap<i32, issue::Model> = issue::Entity::find()
        .filter(issue::Column::Id.is_in(issue_ids))
        .order_by_asc(issue::Column::Id)
        .all(conn)
        .await?
        .into_iter()
        .map(|i| (i.id, i))
        .collect();
    for link in links {
        if let (Some(list), Some(found)) = (out.get_mut(&link.feedback_id), issues.get(&link.issue_id)) {
            list.push(found.clone());
        }
    }
    for list in out.values_mut() {
        list.sort_by_key(|i| i.id);
    }
    Ok(out)
}

/// Apply the given fields; renames must stay unique within the project.
#[instrument(skip(db, input))]
pub async fn update(db: &Db, issue_id: i32, input: UpdateIssue) -> Result<issue::Model, ServiceError> {
    let txn = db.writer().begin().await?;
    let Some(found) = issue::Entity::find_by_id(issue_id).one(&txn).await? else {
        txn.rollback().await?;
        return Err(ServiceError::not_found("Issue"));
    };

    if let Some(name) = &input.name {
        let clash = issue::Entity::find()
            .filter(issue::Column::ProjectId.eq(found.project_id))
            .filter(issue::Column::Name.eq(name.clone()))
            .filter(issue::Column::Id.ne(issue_id))
            .count(&txn)
            .await?;
        if clash > 0 {
            txn.rollback().await?;
            return Err(ServiceError::InvalidName("Duplicated name".into()));
        }
    }

    let mut am: issue::ActiveModel = found.into();
    if let Some(name) = input.name {
        am.name = Set(name);
    }
    if let Some(description) = input.description {
        am.description = Set(Some(description));
    }
    if let Some(status) = input.status {
        am.status = Set(status.as_str().into());
    }
    if let Some(external) = input.external_issue_id {
        am.external_issue_id = Set(Some(external));
    }
    am.updated_at = Set(Utc::now());
    let updated = am.update(&txn).await?;
    txn.commit().await?;
    Ok(updated)
}

#[instrument(skip(db))]
pub async fn delete_by_id(db: &Db, issue_id: i32) -> Result<(), ServiceError> {
    let txn = db.writer().begin().await?;
    if issue::Entity::find_by_id(issue_id).one(&txn).await?.is_none() {
        txn.rollback().await?;
        return Err(ServiceError::not_found("Issue"));
    }
    feedback_issue::Entity::delete_many()
        .filter(feedback_issue::Column::IssueId.eq(issue_id))
        .exec(&txn)
        .await?;
    issue::Entity::delete_by_id(issue_id).exec(&txn).await?;
    txn.commit().await?;
    info!(issue_id, "issue_deleted");
    Ok(())
}

/// Delete the project's issues among `issue_ids`; returns how many went.
#[instrument(skip(db, issue_ids), fields(count = issue_ids.len()))]
pub async fn delete_by_ids(db: &Db, project_id: i32, issue_ids: &[i32]) -> Result<u64, ServiceError> {
    if issue_ids.is_empty() {
        return Ok(0);
    }
    let txn = db.writer().begin().await?;
    let owned: Vec<i32> = issue::Entity::find()
        .filter(issue::Column::ProjectId.eq(project_id))
        .filter(issue::Column::Id.is_in(issue_ids.to_vec()))
        .all(&txn)
        .await?
        .into_iter()
        .map(|i| i.id)
        .collect();
    if owned.is_empty() {
        txn.rollback().await?;
        return Ok(0);
    }
    feedback_issue::Entity::delete_many()
        .filter(feedback_issue::Column::IssueId.is_in(owned.clone()))
        .exec(&txn)
        .await?;
    let res = issue::Entity::delete_many()
        .filter(issue::Column::Id.is_in(owned))
        .exec(&txn)
        .await?;
    txn.commit().await?;
    Ok(res.rows_affected)
}

pub async fn count_by_project(db: &Db, project_id: i32) -> Result<Count, ServiceError> {
    let total = issue::Entity::find()
        .filter(issue::Column::ProjectId.eq(project_id))
        .count(db.reader())
        .await?;
    Ok(Count { total })
}

/// Add `delta` to the cached feedback count of an issue.
pub(crate) async fn bump_feedback_count<C: ConnectionTrait>(conn: &C, issue_id: i32, delta: i32) -> Result<(), ServiceError> {
    issue::Entity::update_many()
        .col_expr(issue::Column::FeedbackCount, Expr::col(issue::Column::FeedbackCount).add(delta))
        .col_expr(issue::Column::UpdatedAt, Expr::value(Utc::now()))
        .filter(issue::Column::Id.eq(issue_id))
        .exec(conn)
        .await?;
    Ok(())
}

/// Recompute cached feedback counts from the junction table.
pub(crate) async fn recount_feedbacks<C: ConnectionTrait>(conn: &C, issue_ids: &[i32]) -> Result<(), ServiceError> {
    for issue_id in issue_ids {
        let count = feedback_issue::Entity::find()
            .filter(feedback_issue::Column::IssueId.eq(*issue_id))
            .count(conn)
            .await?;
        issue::Entity::update_many()
            .col_expr(issue::Column::FeedbackCount, Expr::value(count as i32))
            .filter(issue::Column::Id.eq(*issue_id))
            .exec(conn)
            .await?;
    }
    Ok(())
}

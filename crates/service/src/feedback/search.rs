//! Dynamic feedback query: column filters, per-field JSON filters and
//! free-text search, all resolved against the channel's fields.

use sea_orm::sea_query::{Expr, Query};
use sea_orm::{
    ColumnTrait, Condition, ConnectionTrait, EntityTrait, Order, PaginatorTrait, QueryFilter, QueryOrder,
};
use serde::Deserialize;
use serde_json::{Map, Value};

use models::field::FieldFormat;
use models::{feedback, feedback_issue};
use crate::channel_service::ChannelDetail;
use crate::errors::ServiceError;
use crate::pagination::Pagination;
use crate::query::{parse_sort, text_as_id, JsonColumn, TimeRange};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchFeedbacks {
    #[serde(default)]
    pub query: Map<String, Value>,
    #[serde(default)]
    pub sort: Map<String, Value>,
    #[serde(flatten)]
    pub pagination: Pagination,
}

fn id_list(key: &str, value: &Value) -> Result<Vec<i32>, ServiceError> {
    let items = value
        .as_array()
        .ok_or_else(|| ServiceError::bad_request(format!("{key} must be an array of ids")))?;
    items
        .iter()
        .map(|v| {
            v.as_i64()
                .and_then(|n| i32::try_from(n).ok())
                .ok_or_else(|| ServiceError::bad_request(format!("{key} must be an array of ids")))
        })
        .collect()
}

fn linked_to_issues(issue_ids: Vec<i32>) -> Condition {
    Condition::all().add(
        feedback::Column::Id.in_subquery(
            Query::select()
                .column(feedback_issue::Column::FeedbackId)
                .from(feedback_issue::Entity)
                .and_where(feedback_issue::Column::IssueId.is_in(issue_ids))
                .to_owned(),
        ),
    )
}

fn never() -> Condition {
    Condition::all().add(Expr::val(1).eq(0))
}

fn field_filter(json: &JsonColumn, channel: &ChannelDetail, key: &str, value: &Value) -> Result<Condition, ServiceError> {
    let def = channel
        .field(key)
        .ok_or_else(|| ServiceError::bad_request(format!("unknown query field: {key}")))?;
    let bad = || ServiceError::bad_request(format!("invalid filter value for {key}"));
    let cond = match def.format()? {
        FieldFormat::Text => {
            let text = value.as_str().ok_or_else(bad)?;
            Condition::all().add(json.like(key, text))
        }
        FieldFormat::Keyword | FieldFormat::Select | FieldFormat::Number | FieldFormat::Boolean => {
            if value.is_array() || value.is_object() || value.is_null() {
                return Err(bad());
            }
            Condition::all().add(json.equals(key, value))
        }
        FieldFormat::MultiSelect => {
            let items: Vec<&str> = match value {
                Value::String(s) => vec![s.as_str()],
                Value::Array(arr) => arr.iter().map(|v| v.as_str().ok_or_else(bad)).collect::<Result<_, _>>()?,
                _ => return Err(bad()),
            };
            items.into_iter().fold(Condition::all(), |c, item| c.add(json.contains(key, item)))
        }
        FieldFormat::Date => json.range(key, &TimeRange::from_value(key, value)?),
    };
    Ok(cond)
}

fn search_text(json: &JsonColumn, channel: &ChannelDetail, text: &str) -> Condition {
    let mut any = Condition::any();
    let mut terms = 0;
    for f in &channel.fields {
        if f.format().map(|fmt| fmt.is_textual()).unwrap_or(false) {
            any = any.add(json.like(&f.key, text));
            terms += 1;
        }
    }
    if let Some(id) = text_as_id(text) {
        any = any.add(feedback::Column::Id.eq(id));
        terms += 1;
    }
    if terms == 0 { never() } else { any }
}

/// Conjunction of every query entry for feedback of `channel`.
pub(crate) fn build_condition(
    backend: sea_orm::DatabaseBackend,
    channel: &ChannelDetail,
    query: &Map<String, Value>,
) -> Result<Condition, ServiceError> {
    let json = JsonColumn::new(backend, "feedback", "data");
    let mut cond = Condition::all().add(feedback::Column::ChannelId.eq(channel.channel.id));
    for (key, value) in query {
        let part = match key.as_str() {
            "searchText" => match value.as_str() {
                Some("") => continue,
                Some(text) => search_text(&json, channel, text),
                None => return Err(ServiceError::bad_request("searchText must be a string")),
            },
            "createdAt" => TimeRange::from_value(key, value)?.condition(feedback::Column::CreatedAt),
            "updatedAt" => TimeRange::from_value(key, value)?.condition(feedback::Column::UpdatedAt),
            "id" => {
                let id = value
                    .as_i64()
                    .and_then(|n| i32::try_from(n).ok())
                    .ok_or_else(|| ServiceError::bad_request("id must be an integer"))?;
                Condition::all().add(feedback::Column::Id.eq(id))
            }
            "ids" => Condition::all().add(feedback::Column::Id.is_in(id_list(key, value)?)),
            "issueIds" | "issues" => linked_to_issues(id_list(key, value)?),
            _ => field_filter(&json, channel, key, value)?,
        };
        cond = cond.add(part);
    }
    Ok(cond)
}

fn sort_column(key: &str) -> Option<feedback::Column> {
    match key {
        "id" => Some(feedback::Column::Id),
        "createdAt" => Some(feedback::Column::CreatedAt),
        "updatedAt" => Some(feedback::Column::UpdatedAt),
        _ => None,
    }
}

/// One page of matching feedback plus the total match count.
pub(crate) async fn find_page<C: ConnectionTrait>(
    conn: &C,
    channel: &ChannelDetail,
    query: &Map<String, Value>,
    sort: &Map<String, Value>,
    pagination: Pagination,
) -> Result<(Vec<feedback::Model>, u64), ServiceError> {
    let cond = build_condition(conn.get_database_backend(), channel, query)?;
    let mut select = feedback::Entity::find().filter(cond);
    let order = parse_sort(sort, sort_column)?;
    if order.is_empty() {
        select = select.order_by(feedback::Column::CreatedAt, Order::Desc);
    }
    for (col, dir) in order {
        select = select.order_by(col, dir);
    }
    select = select.order_by(feedback::Column::Id, Order::Desc);

    let (idx, limit) = pagination.normalize();
    let paginator = select.paginate(conn, limit);
    let total = paginator.num_items().await?;
    let items = paginator.fetch_page(idx).await?;
    Ok((items, total))
}

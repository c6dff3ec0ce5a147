//! Building blocks for the dynamic search endpoints: time ranges, sort
//! clauses and expressions over keys of a JSON column.

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use sea_orm::sea_query::{Expr, SimpleExpr};
use sea_orm::{ColumnTrait, Condition, DatabaseBackend, Order};
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::errors::ServiceError;

/// Half-open interval `[gte, lt)`; either bound may be omitted.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct TimeRange {
    #[serde(default, deserialize_with = "de_opt_datetime")]
    pub gte: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "de_opt_datetime")]
    pub lt: Option<DateTime<Utc>>,
}

fn de_opt_datetime<'de, D: serde::Deserializer<'de>>(d: D) -> Result<Option<DateTime<Utc>>, D::Error> {
    let raw: Option<String> = Option::deserialize(d)?;
    raw.map(|s| parse_datetime(&s).ok_or_else(|| serde::de::Error::custom(format!("invalid date: {s}"))))
        .transpose()
}

impl TimeRange {
    pub fn from_value(key: &str, value: &Value) -> Result<Self, ServiceError> {
        serde_json::from_value(value.clone())
            .map_err(|e| ServiceError::bad_request(format!("invalid range for {key}: {e}")))
    }

    pub fn condition<C: ColumnTrait>(&self, col: C) -> Condition {
        let mut cond = Condition::all();
        if let Some(gte) = self.gte {
            cond = cond.add(col.gte(gte));
        }
        if let Some(lt) = self.lt {
            cond = cond.add(col.lt(lt));
        }
        cond
    }
}

/// RFC 3339 timestamps or plain `YYYY-MM-DD` dates (midnight UTC).
pub fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

/// Canonical text form used when dates are stored inside JSON documents,
/// so lexical comparison matches chronological order.
pub fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// `{ "createdAt": "ASC" }` style sort clause resolved against `resolve`.
pub fn parse_sort<C>(
    sort: &Map<String, Value>,
    resolve: impl Fn(&str) -> Option<C>,
) -> Result<Vec<(C, Order)>, ServiceError> {
    sort.iter()
        .map(|(key, dir)| {
            let col = resolve(key).ok_or_else(|| ServiceError::bad_request(format!("unknown sort column: {key}")))?;
            let order = match dir.as_str().map(|d| d.to_ascii_uppercase()) {
                Some(d) if d == "ASC" => Order::Asc,
                Some(d) if d == "DESC" => Order::Desc,
                _ => return Err(ServiceError::bad_request(format!("invalid sort direction for {key}"))),
            };
            Ok((col, order))
        })
        .collect()
}

/// Leading integer of free text (`"12abc"` is 12), used to match ids in
/// text search. `None` when the text does not start with a number.
pub fn text_as_id(text: &str) -> Option<i32> {
    let text = text.trim_start();
    let sign_len = usize::from(text.starts_with(['+', '-']));
    let digits = text[sign_len..].bytes().take_while(u8::is_ascii_digit).count();
    if digits == 0 {
        return None;
    }
    text[..sign_len + digits].parse().ok()
}

pub fn like_pattern(text: &str) -> String {
    format!("%{}%", text)
}

/// Expressions over `table.column` holding a JSON object.
#[derive(Clone, Copy, Debug)]
pub struct JsonColumn {
    pub backend: DatabaseBackend,
    pub table: &'static str,
    pub column: &'static str,
}

impl JsonColumn {
    pub fn new(backend: DatabaseBackend, table: &'static str, column: &'static str) -> Self {
        Self { backend, table, column }
    }

    fn qualified(&self) -> String {
        match self.backend {
            DatabaseBackend::MySql => format!("`{}`.`{}`", self.table, self.column),
            _ => format!("\"{}\".\"{}\"", self.table, self.column),
        }
    }

    fn path(key: &str) -> String {
        format!("$.\"{}\"", key)
    }

    /// Unquoted text of `key`.
    pub fn text(&self, key: &str) -> SimpleExpr {
        let col = self.qualified();
        let sql = match self.backend {
            DatabaseBackend::MySql => format!("JSON_UNQUOTE(JSON_EXTRACT({col}, ?))"),
            _ => format!("json_extract({col}, ?)"),
        };
        Expr::cust_with_values(sql, [Self::path(key)])
    }

    /// `key` equals the JSON scalar `value` (string, number or boolean).
    pub fn equals(&self, key: &str, value: &Value) -> SimpleExpr {
        let col = self.qualified();
        let sql = match self.backend {
            DatabaseBackend::MySql => format!("JSON_EXTRACT({col}, ?) = CAST(? AS JSON)"),
            _ => format!("json_extract({col}, ?) = json_extract(?, '$')"),
        };
        Expr::cust_with_values(sql, [Self::path(key), value.to_string()])
    }

    /// `key` holds an array containing the string `item`.
    pub fn contains(&self, key: &str, item: &str) -> SimpleExpr {
        let col = self.qualified();
        match self.backend {
            DatabaseBackend::MySql => Expr::cust_with_values(
                format!("JSON_CONTAINS({col}, ?, ?)"),
                [Value::String(item.to_string()).to_string(), Self::path(key)],
            ),
            _ => Expr::cust_with_values(
                format!("EXISTS (SELECT 1 FROM json_each({col}, ?) AS je WHERE je.value = ?)"),
                [Self::path(key), item.to_string()],
            ),
        }
    }

    pub fn like(&self, key: &str, text: &str) -> SimpleExpr {
        Expr::expr(self.text(key)).like(like_pattern(text))
    }

    /// Text of `key` within `[gte, lt)` using the canonical date format.
    pub fn range(&self, key: &str, range: &TimeRange) -> Condition {
        let mut cond = Condition::all();
        if let Some(gte) = range.gte {
            cond = cond.add(Expr::expr(self.text(key)).gte(format_datetime(&gte)));
        }
        if let Some(lt) = range.lt {
            cond = cond.add(Expr::expr(self.text(key)).lt(format_datetime(&lt)));
        }
        cond
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::sea_query::{Query, SqliteQueryBuilder, MysqlQueryBuilder, Alias};

    #[test]
    fn text_as_id_reads_leading_integer() {
        assert_eq!(text_as_id("12"), Some(12));
        assert_eq!(text_as_id(" 12abc"), Some(12));
        assert_eq!(text_as_id("+7 days"), Some(7));
        assert_eq!(text_as_id("abc12"), None);
        assert_eq!(text_as_id("-"), None);
        assert_eq!(text_as_id(""), None);
        assert_eq!(text_as_id("99999999999"), None);
    }

    #[test]
    fn parses_dates_and_timestamps() {
        let d = parse_datetime("2024-03-01").unwrap();
        assert_eq!(format_datetime(&d), "2024-03-01T00:00:00.000Z");
        let t = parse_datetime("2024-03-01T10:00:00+09:00").unwrap();
        assert_eq!(format_datetime(&t), "2024-03-01T01:00:00.000Z");
        assert!(parse_datetime("yesterday").is_none());
    }

    #[test]
    fn time_range_rejects_garbage() {
        let bad = serde_json::json!({"gte": "not a date"});
        assert!(TimeRange::from_value("createdAt", &bad).is_err());
        let ok = TimeRange::from_value("createdAt", &serde_json::json!({"lt": "2024-01-02"})).unwrap();
        assert!(ok.gte.is_none() && ok.lt.is_some());
    }

    #[test]
    fn sort_clause_requires_known_columns_and_direction() {
        let resolve = |k: &str| (k == "id").then_some("id");
        let sort = serde_json::json!({"id": "desc"});
        let parsed = parse_sort(sort.as_object().unwrap(), resolve).unwrap();
        assert!(matches!(parsed[0].1, Order::Desc));

        let unknown = serde_json::json!({"nope": "ASC"});
        assert!(parse_sort(unknown.as_object().unwrap(), resolve).is_err());
        let bad_dir = serde_json::json!({"id": "UP"});
        assert!(parse_sort(bad_dir.as_object().unwrap(), resolve).is_err());
    }

    #[test]
    fn json_expressions_follow_backend_dialect() {
        let sqlite = JsonColumn::new(DatabaseBackend::Sqlite, "feedback", "data");
        let sql = Query::select()
            .expr(Expr::val(1))
            .from(Alias::new("feedback"))
            .and_where(sqlite.like("message", "crash"))
            .to_string(SqliteQueryBuilder);
        assert!(sql.contains("json_extract(\"feedback\".\"data\", "), "{sql}");
        assert!(sql.contains("LIKE '%crash%'"), "{sql}");

        let mysql = JsonColumn::new(DatabaseBackend::MySql, "feedback", "data");
        let sql = Query::select()
            .expr(Expr::val(1))
            .from(Alias::new("feedback"))
            .and_where(mysql.contains("tags", "bug"))
            .to_string(MysqlQueryBuilder);
        assert!(sql.contains("JSON_CONTAINS(`feedback`.`data`"), "{sql}");
    }
}

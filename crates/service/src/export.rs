//! Spreadsheet export of a channel's feedback.
//!
//! Columns follow field type precedence (`DEFAULT`, `API`, `ADMIN`); the
//! DEFAULT block is `ID`, `Created`, `Updated`, `Issue`. Rows are loaded in
//! fixed-size pages so large channels never sit in one query.

use std::collections::HashMap;

use chrono::Local;
use rust_xlsxwriter::Workbook;
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{info, instrument};

use models::db::Db;
use models::field::{self, FieldFormat, FieldType};
use models::issue;
use crate::channel_service::{self, ChannelDetail};
use crate::errors::ServiceError;
use crate::feedback::search;
use crate::issue_service;
use crate::pagination::Pagination;
use crate::query::format_datetime;

pub const DOWNLOAD_PAGE_SIZE: u64 = 1000;

const DEFAULT_NAME_ORDER: [&str; 4] = ["ID", "Created", "Updated", "Issue"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportType {
    Xlsx,
    Csv,
}

impl ExportType {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportType::Xlsx => "xlsx",
            ExportType::Csv => "csv",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            ExportType::Xlsx => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
            ExportType::Csv => "text/csv",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExportRequest {
    #[serde(rename = "type")]
    pub export_type: ExportType,
    #[serde(default)]
    pub query: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
}

impl Cell {
    fn as_text(&self) -> String {
        match self {
            Cell::Empty => String::new(),
            Cell::Text(s) => s.clone(),
            Cell::Number(n) => n.to_string(),
            Cell::Bool(b) => b.to_string(),
        }
    }
}

pub struct ExportFile {
    pub filename: String,
    pub content_type: &'static str,
    pub bytes: Vec<u8>,
    pub feedback_ids: Vec<i32>,
}

fn default_rank(f: &field::Model) -> i32 {
    DEFAULT_NAME_ORDER
        .iter()
        .position(|n| *n == f.name)
        .map(|p| p as i32)
        .unwrap_or(-1)
}

/// Fields in export column order. The sort is stable, so API and ADMIN
/// fields keep their definition order.
pub fn sort_header(fields: &[field::Model]) -> Vec<&field::Model> {
    let mut out: Vec<&field::Model> = fields.iter().collect();
    out.sort_by_key(|f| {
        let kind = f.kind().unwrap_or(FieldType::Admin);
        let within = if kind == FieldType::Default { default_rank(f) } else { 0 };
        (kind.precedence(), within)
    });
    out
}

fn scalar_cell(value: &Value) -> Cell {
    match value {
        Value::Null => Cell::Empty,
        Value::Bool(b) => Cell::Bool(*b),
        Value::Number(n) => n.as_f64().map(Cell::Number).unwrap_or_else(|| Cell::Text(n.to_string())),
        Value::String(s) => Cell::Text(s.clone()),
        Value::Array(items) => Cell::Text(
            items
                .iter()
                .map(|v| v.as_str().map(String::from).unwrap_or_else(|| v.to_string()))
                .collect::<Vec<_>>()
                .join(", "),
        ),
        Value::Object(_) => Cell::Text(value.to_string()),
    }
}

/// One export row in `header` order.
pub fn to_row(header: &[&field::Model], fb: &models::feedback::Model, issues: &[issue::Model]) -> Vec<Cell> {
    header
        .iter()
        .map(|f| match f.key.as_str() {
            "id" => Cell::Number(fb.id as f64),
            "createdAt" => Cell::Text(format_datetime(&fb.created_at)),
            "updatedAt" => Cell::Text(format_datetime(&fb.updated_at)),
            "issues" => Cell::Text(issues.iter().map(|i| i.name.as_str()).collect::<Vec<_>>().join(", ")),
            key => match (f.format(), fb.data.get(key)) {
                (_, None) => Cell::Empty,
                (Ok(FieldFormat::Date), Some(Value::String(s))) => Cell::Text(s.clone()),
                (_, Some(v)) => scalar_cell(v),
            },
        })
        .collect()
}

pub fn render_xlsx(header: &[String], rows: &[Vec<Cell>]) -> Result<Vec<u8>, ServiceError> {
    let err = |e: rust_xlsxwriter::XlsxError| ServiceError::Export(e.to_string());
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name("feedback").map_err(err)?;
    for (col, name) in header.iter().enumerate() {
        sheet.write_string(0, col as u16, name.as_str()).map_err(err)?;
    }
    for (r, row) in rows.iter().enumerate() {
        let r = (r + 1) as u32;
        for (c, cell) in row.iter().enumerate() {
            let c = c as u16;
            match cell {
                Cell::Empty => {}
                Cell::Text(s) => {
                    sheet.write_string(r, c, s.as_str()).map_err(err)?;
                }
                Cell::Number(n) => {
                    sheet.write_number(r, c, *n).map_err(err)?;
                }
                Cell::Bool(b) => {
                    sheet.write_boolean(r, c, *b).map_err(err)?;
                }
            }
        }
    }
    workbook.save_to_buffer().map_err(err)
}

pub fn render_csv(header: &[String], rows: &[Vec<Cell>]) -> Result<Vec<u8>, ServiceError> {
    let mut wtr = csv::Writer::from_writer(Vec::new());
    wtr.write_record(header).map_err(|e| ServiceError::Export(e.to_string()))?;
    for row in rows {
        wtr.write_record(row.iter().map(Cell::as_text))
            .map_err(|e| ServiceError::Export(e.to_string()))?;
    }
    wtr.into_inner().map_err(|e| ServiceError::Export(e.to_string()))
}

pub fn filename(channel: &ChannelDetail, export_type: ExportType) -> String {
    format!(
        "UFB_{}_{}_Feedback_{}.{}",
        channel.project.name,
        channel.channel.name,
        Local::now().format("%Y-%m-%d"),
        export_type.extension()
    )
}

/// All feedback matching `query`, loaded `page_size` at a time, with their
/// issues.
pub async fn find_for_download(
    db: &Db,
    channel: &ChannelDetail,
    query: &Map<String, Value>,
    page_size: u64,
) -> Result<Vec<(models::feedback::Model, Vec<issue::Model>)>, ServiceError> {
    let conn = db.reader();
    let sort = Map::new();
    let mut out = Vec::new();
    let mut page = 1;
    loop {
        let (rows, total) = search::find_page(conn, channel, query, &sort, Pagination::new(page, page_size)).await?;
        let fetched = rows.len() as u64;
        let ids: Vec<i32> = rows.iter().map(|f| f.id).collect();
        let mut issues: HashMap<i32, Vec<issue::Model>> =
            issue_service::find_by_feedback_ids(conn, &ids).await?.into_iter().collect();
        out.extend(rows.into_iter().map(|fb| {
            let linked = issues.remove(&fb.id).unwrap_or_default();
            (fb, linked)
        }));
        if fetched < page_size || out.len() as u64 >= total {
            break;
        }
        page += 1;
    }
    Ok(out)
}

/// Build the export file for a channel.
#[instrument(skip(db, req), fields(export_type = req.export_type.extension()))]
pub async fn export(db: &Db, channel_id: i32, req: &ExportRequest) -> Result<ExportFile, ServiceError> {
    let channel = channel_service::find_by_id(db, channel_id).await?;
    let found = find_for_download(db, &channel, &req.query, DOWNLOAD_PAGE_SIZE).await?;

    let header_fields = sort_header(&channel.fields);
    let header: Vec<String> = header_fields.iter().map(|f| f.name.clone()).collect();
    let rows: Vec<Vec<Cell>> = found.iter().map(|(fb, issues)| to_row(&header_fields, fb, issues)).collect();

    let bytes = match req.export_type {
        ExportType::Xlsx => render_xlsx(&header, &rows)?,
        ExportType::Csv => render_csv(&header, &rows)?,
    };
    info!(channel_id, rows = rows.len(), "feedback_exported");
    Ok(ExportFile {
        filename: filename(&channel, req.export_type),
        content_type: req.export_type.content_type(),
        bytes,
        feedback_ids: found.iter().map(|(fb, _)| fb.id).collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use crate::test_support::fixture;

    fn def(key: &str, name: &str, kind: FieldType) -> field::Model {
        field::Model {
            id: 0,
            channel_id: 1,
            key: key.into(),
            name: name.into(),
            format: "text".into(),
            field_type: kind.as_str().into(),
            options: None,
            description: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn header_orders_default_then_api_then_admin() {
        let fields = vec![
            def("memo", "Memo", FieldType::Admin),
            def("issues", "Issue", FieldType::Default),
            def("message", "Message", FieldType::Api),
            def("updatedAt", "Updated", FieldType::Default),
            def("device", "Device", FieldType::Api),
            def("id", "ID", FieldType::Default),
            def("createdAt", "Created", FieldType::Default),
        ];
        let names: Vec<_> = sort_header(&fields).iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["ID", "Created", "Updated", "Issue", "Message", "Device", "Memo"]);
    }

    #[test]
    fn csv_quotes_embedded_commas() {
        let bytes = render_csv(
            &["ID".into(), "Message".into()],
            &[vec![Cell::Number(1.0), Cell::Text("a, b".into())]],
        )
        .unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert_eq!(text, "ID,Message\n1,\"a, b\"\n");
    }

    #[test]
    fn xlsx_is_a_zip_container() {
        let bytes = render_xlsx(&["ID".into()], &[vec![Cell::Number(1.0)]]).unwrap();
        assert_eq!(&bytes[..2], b"PK");
    }

    #[tokio::test]
    async fn export_pages_through_every_match() -> Result<(), anyhow::Error> {
        let fx = fixture().await?;
        for i in 0..5 {
            let data = serde_json::json!({"message": format!("m{i}"), "tags": ["bug"]});
            crate::feedback::create(&fx.db, fx.project.id, fx.channel.channel.id, data.as_object().cloned().unwrap())
                .await?;
        }
        let all = find_for_download(&fx.db, &fx.channel, &Map::new(), 2).await?;
        assert_eq!(all.len(), 5);

        let req = ExportRequest { export_type: ExportType::Csv, query: Map::new() };
        let file = export(&fx.db, fx.channel.channel.id, &req).await?;
        assert_eq!(file.feedback_ids.len(), 5);
        assert_eq!(file.content_type, "text/csv");
        assert!(file.filename.starts_with("UFB_web_app_Feedback_"));
        assert!(file.filename.ends_with(".csv"));
        let text = String::from_utf8(file.bytes)?;
        let first_line = text.lines().next().unwrap_or_default();
        assert!(first_line.starts_with("ID,Created,Updated,Issue,MESSAGE"));
        assert!(text.contains("bug"));
        Ok(())
    }
}

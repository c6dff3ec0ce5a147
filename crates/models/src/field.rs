//! Channel field definitions.
//!
//! A field names one key of the feedback `data` document, its value format
//! and who may write it: `DEFAULT` fields are system managed, `API` fields
//! arrive with the feedback, `ADMIN` fields are edited afterwards.
use std::fmt;
use std::str::FromStr;

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::errors::ModelError;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "field")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub channel_id: i32,
    pub key: String,
    pub name: String,
    pub format: String,
    pub field_type: String,
    pub options: Option<Json>,
    pub description: Option<String>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::channel::Entity",
        from = "Column::ChannelId",
        to = "super::channel::Column::Id",
        on_delete = "Cascade"
    )]
    Channel,
}

impl Related<super::channel::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Channel.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn format(&self) -> Result<FieldFormat, ModelError> {
        self.format.parse()
    }

    pub fn kind(&self) -> Result<FieldType, ModelError> {
        self.field_type.parse()
    }

    pub fn option_list(&self) -> Vec<String> {
        self.options
            .as_ref()
            .and_then(|v| serde_json::from_value(v.clone()).ok())
            .unwrap_or_default()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FieldFormat {
    Text,
    Keyword,
    Number,
    Boolean,
    Select,
    MultiSelect,
    Date,
}

impl FieldFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldFormat::Text => "text",
            FieldFormat::Keyword => "keyword",
            FieldFormat::Number => "number",
            FieldFormat::Boolean => "boolean",
            FieldFormat::Select => "select",
            FieldFormat::MultiSelect => "multiSelect",
            FieldFormat::Date => "date",
        }
    }

    /// Formats included in free-text search.
    pub fn is_textual(&self) -> bool {
        matches!(self, FieldFormat::Text | FieldFormat::Keyword)
    }
}

impl FromStr for FieldFormat {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(FieldFormat::Text),
            "keyword" => Ok(FieldFormat::Keyword),
            "number" => Ok(FieldFormat::Number),
            "boolean" => Ok(FieldFormat::Boolean),
            "select" => Ok(FieldFormat::Select),
            "multiSelect" => Ok(FieldFormat::MultiSelect),
            "date" => Ok(FieldFormat::Date),
            other => Err(ModelError::unknown("field format", other)),
        }
    }
}

impl fmt::Display for FieldFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FieldType {
    Default,
    Api,
    Admin,
}

impl FieldType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::Default => "DEFAULT",
            FieldType::Api => "API",
            FieldType::Admin => "ADMIN",
        }
    }

    /// Column precedence in exports; lower comes first.
    pub fn precedence(&self) -> u8 {
        match self {
            FieldType::Default => 0,
            FieldType::Api => 1,
            FieldType::Admin => 2,
        }
    }
}

impl FromStr for FieldType {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "DEFAULT" => Ok(FieldType::Default),
            "API" => Ok(FieldType::Api),
            "ADMIN" => Ok(FieldType::Admin),
            other => Err(ModelError::unknown("field type", other)),
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// System fields every channel carries, as `(key, name, format)`.
pub const DEFAULT_FIELDS: [(&str, &str, FieldFormat); 4] = [
    ("id", "ID", FieldFormat::Number),
    ("createdAt", "Created", FieldFormat::Date),
    ("updatedAt", "Updated", FieldFormat::Date),
    ("issues", "Issue", FieldFormat::MultiSelect),
];

pub fn is_default_key(key: &str) -> bool {
    DEFAULT_FIELDS.iter().any(|(k, _, _)| *k == key)
}

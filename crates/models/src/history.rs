use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "history")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub user_id: Option<i32>,
    pub entity_name: String,
    pub entity_id: i32,
    pub action: String,
    pub entity: Json,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_delete = "SetNull"
    )]
    User,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HistoryAction {
    Create,
    Update,
    Delete,
    Download,
}

impl HistoryAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            HistoryAction::Create => "Create",
            HistoryAction::Update => "Update",
            HistoryAction::Delete => "Delete",
            HistoryAction::Download => "Download",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EntityName {
    Channel,
    Feedback,
    Issue,
    Project,
}

impl EntityName {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityName::Channel => "Channel",
            EntityName::Feedback => "Feedback",
            EntityName::Issue => "Issue",
            EntityName::Project => "Project",
        }
    }
}

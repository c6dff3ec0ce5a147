use std::fmt;
use std::str::FromStr;

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::errors::ModelError;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "role")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub project_id: i32,
    pub name: String,
    /// JSON array of permission names
    pub permissions: Json,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::project::Entity",
        from = "Column::ProjectId",
        to = "super::project::Column::Id",
        on_delete = "Cascade"
    )]
    Project,
    #[sea_orm(has_many = "super::member::Entity")]
    Member,
}

impl Related<super::project::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Project.def()
    }
}

impl Related<super::member::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Member.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Unknown permission names are ignored.
    pub fn permission_list(&self) -> Vec<Permission> {
        let names: Vec<String> = serde_json::from_value(self.permissions.clone()).unwrap_or_default();
        names.iter().filter_map(|n| n.parse().ok()).collect()
    }

    pub fn has(&self, permission: Permission) -> bool {
        self.permission_list().contains(&permission)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    FeedbackRead,
    FeedbackUpdate,
    FeedbackDelete,
    FeedbackDownloadRead,
    FeedbackIssueUpdate,
    IssueCreate,
    IssueRead,
    IssueUpdate,
    IssueDelete,
    ProjectUpdate,
    ChannelCreate,
    ChannelRead,
    ApikeyCreate,
}

impl Permission {
    pub const ALL: [Permission; 13] = [
        Permission::FeedbackRead,
        Permission::FeedbackUpdate,
        Permission::FeedbackDelete,
        Permission::FeedbackDownloadRead,
        Permission::FeedbackIssueUpdate,
        Permission::IssueCreate,
        Permission::IssueRead,
        Permission::IssueUpdate,
        Permission::IssueDelete,
        Permission::ProjectUpdate,
        Permission::ChannelCreate,
        Permission::ChannelRead,
        Permission::ApikeyCreate,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::FeedbackRead => "feedback_read",
            Permission::FeedbackUpdate => "feedback_update",
            Permission::FeedbackDelete => "feedback_delete",
            Permission::FeedbackDownloadRead => "feedback_download_read",
            Permission::FeedbackIssueUpdate => "feedback_issue_update",
            Permission::IssueCreate => "issue_create",
            Permission::IssueRead => "issue_read",
            Permission::IssueUpdate => "issue_update",
            Permission::IssueDelete => "issue_delete",
            Permission::ProjectUpdate => "project_update",
            Permission::ChannelCreate => "channel_create",
            Permission::ChannelRead => "channel_read",
            Permission::ApikeyCreate => "apikey_create",
        }
    }

    pub fn all_as_json() -> Json {
        Json::from(Self::ALL.iter().map(|p| p.as_str()).collect::<Vec<_>>())
    }
}

impl FromStr for Permission {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| ModelError::unknown("permission", s))
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

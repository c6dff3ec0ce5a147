use std::fmt;
use std::str::FromStr;

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::errors::ModelError;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "issue")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub project_id: i32,
    pub name: String,
    pub description: Option<String>,
    pub status: String,
    pub external_issue_id: Option<String>,
    pub feedback_count: i32,
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
    #[sea_orm(has_many = "super::feedback_issue::Entity")]
    FeedbackIssue,
}

impl Related<super::project::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Project.def()
    }
}

impl Related<super::feedback_issue::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::FeedbackIssue.def()
    }
}

impl Related<super::feedback::Entity> for Entity {
    fn to() -> RelationDef {
        super::feedback_issue::Relation::Feedback.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::feedback_issue::Relation::Issue.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IssueStatus {
    #[default]
    Init,
    OnReview,
    InProgress,
    Resolved,
    Pending,
}

impl IssueStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueStatus::Init => "INIT",
            IssueStatus::OnReview => "ON_REVIEW",
            IssueStatus::InProgress => "IN_PROGRESS",
            IssueStatus::Resolved => "RESOLVED",
            IssueStatus::Pending => "PENDING",
        }
    }
}

impl FromStr for IssueStatus {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "INIT" => Ok(IssueStatus::Init),
            "ON_REVIEW" => Ok(IssueStatus::OnReview),
            "IN_PROGRESS" => Ok(IssueStatus::InProgress),
            "RESOLVED" => Ok(IssueStatus::Resolved),
            "PENDING" => Ok(IssueStatus::Pending),
            other => Err(ModelError::unknown("issue status", other)),
        }
    }
}

impl fmt::Display for IssueStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

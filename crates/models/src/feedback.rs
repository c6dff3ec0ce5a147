use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "feedback")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub channel_id: i32,
    /// JSON object keyed by field key
    pub data: Json,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
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
    #[sea_orm(has_many = "super::feedback_issue::Entity")]
    FeedbackIssue,
}

impl Related<super::channel::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Channel.def()
    }
}

impl Related<super::feedback_issue::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::FeedbackIssue.def()
    }
}

impl Related<super::issue::Entity> for Entity {
    fn to() -> RelationDef {
        super::feedback_issue::Relation::Issue.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::feedback_issue::Relation::Feedback.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}

//! Create `issue` and the `feedback_issue` junction table.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Issue::Table)
                    .if_not_exists()
                    .col(pk_auto(Issue::Id))
                    .col(integer(Issue::ProjectId))
                    .col(string_len(Issue::Name, 255))
                    .col(text_null(Issue::Description))
                    .col(string_len(Issue::Status, 32))
                    .col(string_len_null(Issue::ExternalIssueId, 255))
                    .col(integer(Issue::FeedbackCount).default(0))
                    .col(timestamp_with_time_zone(Issue::CreatedAt))
                    .col(timestamp_with_time_zone(Issue::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_issue_project")
                            .from(Issue::Table, Issue::ProjectId)
                            .to(Project::Table, Project::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(FeedbackIssue::Table)
                    .if_not_exists()
                    .col(integer(FeedbackIssue::FeedbackId))
                    .col(integer(FeedbackIssue::IssueId))
                    .primary_key(
                        Index::create()
                            .col(FeedbackIssue::FeedbackId)
                            .col(FeedbackIssue::IssueId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_feedback_issue_feedback")
                            .from(FeedbackIssue::Table, FeedbackIssue::FeedbackId)
                            .to(Feedback::Table, Feedback::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_feedback_issue_issue")
                            .from(FeedbackIssue::Table, FeedbackIssue::IssueId)
                            .to(Issue::Table, Issue::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(FeedbackIssue::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(Issue::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Issue {
    Table,
    Id,
    ProjectId,
    Name,
    Description,
    Status,
    ExternalIssueId,
    FeedbackCount,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum FeedbackIssue { Table, FeedbackId, IssueId }

#[derive(DeriveIden)]
enum Feedback { Table, Id }

#[derive(DeriveIden)]
enum Project { Table, Id }

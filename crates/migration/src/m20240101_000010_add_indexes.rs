use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Project: unique name per tenant
        manager
            .create_index(
                Index::create()
                    .name("uniq_project_tenant_name")
                    .table(Project::Table)
                    .col(Project::TenantId)
                    .col(Project::Name)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Role: unique name per project
        manager
            .create_index(
                Index::create()
                    .name("uniq_role_project_name")
                    .table(Role::Table)
                    .col(Role::ProjectId)
                    .col(Role::Name)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Member: one row per (role, user)
        manager
            .create_index(
                Index::create()
                    .name("uniq_member_role_user")
                    .table(Member::Table)
                    .col(Member::RoleId)
                    .col(Member::UserId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Channel: unique name per project
        manager
            .create_index(
                Index::create()
                    .name("uniq_channel_project_name")
                    .table(Channel::Table)
                    .col(Channel::ProjectId)
                    .col(Channel::Name)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Field: unique key per channel
        manager
            .create_index(
                Index::create()
                    .name("uniq_field_channel_key")
                    .table(Field::Table)
                    .col(Field::ChannelId)
                    .col(Field::Key)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Issue: unique name per project
        manager
            .create_index(
                Index::create()
                    .name("uniq_issue_project_name")
                    .table(Issue::Table)
                    .col(Issue::ProjectId)
                    .col(Issue::Name)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Feedback: listing by channel ordered by creation time
        manager
            .create_index(
                Index::create()
                    .name("idx_feedback_channel_created")
                    .table(Feedback::Table)
                    .col(Feedback::ChannelId)
                    .col(Feedback::CreatedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_feedback_issue_issue")
                    .table(FeedbackIssue::Table)
                    .col(FeedbackIssue::IssueId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let drops = [
            ("uniq_project_tenant_name", Project::Table.into_iden()),
            ("uniq_role_project_name", Role::Table.into_iden()),
            ("uniq_member_role_user", Member::Table.into_iden()),
            ("uniq_channel_project_name", Channel::Table.into_iden()),
            ("uniq_field_channel_key", Field::Table.into_iden()),
            ("uniq_issue_project_name", Issue::Table.into_iden()),
            ("idx_feedback_channel_created", Feedback::Table.into_iden()),
            ("idx_feedback_issue_issue", FeedbackIssue::Table.into_iden()),
        ];
        for (name, table) in drops {
            manager
                .drop_index(Index::drop().name(name).table(table).to_owned())
                .await?;
        }
        Ok(())
    }
}

#[derive(DeriveIden)]
enum Project { Table, TenantId, Name }

#[derive(DeriveIden)]
enum Role { Table, ProjectId, Name }

#[derive(DeriveIden)]
enum Member { Table, RoleId, UserId }

#[derive(DeriveIden)]
enum Channel { Table, ProjectId, Name }

#[derive(DeriveIden)]
enum Field { Table, ChannelId, Key }

#[derive(DeriveIden)]
enum Issue { Table, ProjectId, Name }

#[derive(DeriveIden)]
enum Feedback { Table, ChannelId, CreatedAt }

#[derive(DeriveIden)]
enum FeedbackIssue { Table, IssueId }

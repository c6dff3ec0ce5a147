//! Create `role` and `member` tables.
//!
//! A member binds a user to exactly one role of a project.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Role::Table)
                    .if_not_exists()
                    .col(pk_auto(Role::Id))
                    .col(integer(Role::ProjectId))
                    .col(string_len(Role::Name, 255))
                    .col(json(Role::Permissions))
                    .col(timestamp_with_time_zone(Role::CreatedAt))
                    .col(timestamp_with_time_zone(Role::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_role_project")
                            .from(Role::Table, Role::ProjectId)
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
                    .table(Member::Table)
                    .if_not_exists()
                    .col(pk_auto(Member::Id))
                    .col(integer(Member::RoleId))
                    .col(integer(Member::UserId))
                    .col(timestamp_with_time_zone(Member::CreatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_member_role")
                            .from(Member::Table, Member::RoleId)
                            .to(Role::Table, Role::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_member_user")
                            .from(Member::Table, Member::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Member::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(Role::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Role { Table, Id, ProjectId, Name, Permissions, CreatedAt, UpdatedAt }

#[derive(DeriveIden)]
enum Member { Table, Id, RoleId, UserId, CreatedAt }

#[derive(DeriveIden)]
enum Project { Table, Id }

#[derive(DeriveIden)]
enum User { Table, Id }

//! Create `history` table (audit trail of user actions).
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(History::Table)
                    .if_not_exists()
                    .col(pk_auto(History::Id))
                    .col(integer_null(History::UserId))
                    .col(string_len(History::EntityName, 32))
                    .col(integer(History::EntityId))
                    .col(string_len(History::Action, 32))
                    .col(json(History::Entity))
                    .col(timestamp_with_time_zone(History::CreatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_history_user")
                            .from(History::Table, History::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::SetNull)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(History::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum History { Table, Id, UserId, EntityName, EntityId, Action, Entity, CreatedAt }

#[derive(DeriveIden)]
enum User { Table, Id }

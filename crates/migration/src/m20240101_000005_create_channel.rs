//! Create `channel` and `field` tables.
//!
//! Fields describe the shape of the feedback `data` document of a channel.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Channel::Table)
                    .if_not_exists()
                    .col(pk_auto(Channel::Id))
                    .col(integer(Channel::ProjectId))
                    .col(string_len(Channel::Name, 255))
                    .col(text_null(Channel::Description))
                    .col(timestamp_with_time_zone(Channel::CreatedAt))
                    .col(timestamp_with_time_zone(Channel::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_channel_project")
                            .from(Channel::Table, Channel::ProjectId)
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
                    .table(Field::Table)
                    .if_not_exists()
                    .col(pk_auto(Field::Id))
                    .col(integer(Field::ChannelId))
                    .col(string_len(Field::Key, 255))
                    .col(string_len(Field::Name, 255))
                    .col(string_len(Field::Format, 32))
                    .col(string_len(Field::FieldType, 16))
                    .col(json_null(Field::Options))
                    .col(text_null(Field::Description))
                    .col(timestamp_with_time_zone(Field::CreatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_field_channel")
                            .from(Field::Table, Field::ChannelId)
                            .to(Channel::Table, Channel::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Field::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(Channel::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Channel { Table, Id, ProjectId, Name, Description, CreatedAt, UpdatedAt }

#[derive(DeriveIden)]
enum Field { Table, Id, ChannelId, Key, Name, Format, FieldType, Options, Description, CreatedAt }

#[derive(DeriveIden)]
enum Project { Table, Id }

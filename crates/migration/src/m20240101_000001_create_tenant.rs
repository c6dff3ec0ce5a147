//! Create `tenant` table.
//!
//! Root entity for multi-tenancy; other tables reference it.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Tenant::Table)
                    .if_not_exists()
                    .col(pk_auto(Tenant::Id))
                    .col(string_len(Tenant::SiteName, 50).unique_key())
                    .col(boolean(Tenant::UseEmail).default(true))
                    .col(boolean(Tenant::IsPrivate).default(false))
                    .col(boolean(Tenant::IsRestrictDomain).default(false))
                    .col(json(Tenant::AllowDomains))
                    .col(boolean(Tenant::UseOauth).default(false))
                    .col(json_null(Tenant::OauthConfig))
                    .col(timestamp_with_time_zone(Tenant::CreatedAt))
                    .col(timestamp_with_time_zone(Tenant::UpdatedAt))
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Tenant::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Tenant {
    Table,
    Id,
    SiteName,
    UseEmail,
    IsPrivate,
    IsRestrictDomain,
    AllowDomains,
    UseOauth,
    OauthConfig,
    CreatedAt,
    UpdatedAt,
}

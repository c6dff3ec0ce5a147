//! Migrator registering entity-specific migrations in dependency order.
//! Indexes are applied last.
pub use sea_orm_migration::prelude::*;

mod m20240101_000001_create_tenant;
mod m20240101_000002_create_user;
mod m20240101_000003_create_project;
mod m20240101_000004_create_role;
mod m20240101_000005_create_channel;
mod m20240101_000006_create_api_key;
mod m20240101_000007_create_feedback;
mod m20240101_000008_create_issue;
mod m20240101_000009_create_history;
mod m20240101_000010_add_indexes;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240101_000001_create_tenant::Migration),
            Box::new(m20240101_000002_create_user::Migration),
            Box::new(m20240101_000003_create_project::Migration),
            Box::new(m20240101_000004_create_role::Migration),
            Box::new(m20240101_000005_create_channel::Migration),
            Box::new(m20240101_000006_create_api_key::Migration),
            Box::new(m20240101_000007_create_feedback::Migration),
            Box::new(m20240101_000008_create_issue::Migration),
            Box::new(m20240101_000009_create_history::Migration),
            // Indexes should always be applied last
            Box::new(m20240101_000010_add_indexes::Migration),
        ]
    }
}

#![cfg(test)]
use chrono::Utc;
use migration::MigratorTrait;
use models::db::Db;
use models::user::UserType;
use sea_orm::{ActiveModelTrait, ColumnTrait, ConnectOptions, Database, EntityTrait, QueryFilter, Set};

use crate::auth::service::hash_password;

/// Fresh in-memory SQLite database with the schema applied.
///
/// A single pooled connection keeps every query on the same in-memory
/// database; code running inside a transaction must therefore use the
/// transaction handle, never `Db` again.
pub async fn get_db() -> Result<Db, anyhow::Error> {
    let mut opt = ConnectOptions::new("sqlite::memory:".to_owned());
    opt.max_connections(1).min_connections(1).sqlx_logging(false);
    let conn = Database::connect(opt).await?;
    migration::Migrator::up(&conn, None).await?;
    Ok(Db::single(conn))
}

pub struct Fixture {
    pub db: Db,
    pub tenant: models::tenant::Model,
    pub admin: models::user::Model,
    pub project: models::project::Model,
    pub channel: crate::channel_service::ChannelDetail,
}

/// Tenant with a SUPER admin, one project and a channel with a couple of
/// API and ADMIN fields.
pub async fn fixture() -> Result<Fixture, anyhow::Error> {
    use crate::channel_service::{self, CreateChannel, CreateField};
    use crate::project_service::{self, CreateProject};
    use crate::tenant_service::{self, SetupTenant};
    use models::field::{FieldFormat, FieldType};

    let db = get_db().await?;
    let tenant = tenant_service::create(
        &db,
        SetupTenant { site_name: "acme".into(), email: "admin@acme.io".into(), password: "Passw0rd!".into() },
    )
    .await?;
    let admin = models::user::Entity::find()
        .filter(models::user::Column::Email.eq("admin@acme.io"))
        .one(db.reader())
        .await?
        .ok_or_else(|| anyhow::anyhow!("tenant admin missing"))?;
    let project = project_service::create(
        &db,
        admin.id,
        CreateProject { tenant_id: tenant.id, name: "web".into(), description: None },
    )
    .await?;
    let field = |key: &str, format: FieldFormat, kind: FieldType, options: Option<Vec<&str>>| CreateField {
        key: key.into(),
        name: key.to_uppercase(),
        format,
        field_type: kind,
        options: options.map(|o| o.into_iter().map(String::from).collect()),
        description: None,
    };
    let channel = channel_service::create(
        &db,
        project.id,
        CreateChannel {
            name: "app".into(),
            description: None,
            fields: vec![
                field("message", FieldFormat::Text, FieldType::Api, None),
                field("device", FieldFormat::Keyword, FieldType::Api, None),
                field("rating", FieldFormat::Number, FieldType::Api, None),
                field("paid", FieldFormat::Boolean, FieldType::Api, None),
                field("os", FieldFormat::Select, FieldType::Api, Some(vec!["ios", "android"])),
                field("tags", FieldFormat::MultiSelect, FieldType::Api, Some(vec!["bug", "ux", "perf"])),
                field("visited", FieldFormat::Date, FieldType::Api, None),
                field("memo", FieldFormat::Text, FieldType::Admin, None),
            ],
        },
    )
    .await?;
    Ok(Fixture { db, tenant, admin, project, channel })
}

/// Plain GENERAL user in the fixture's tenant, without any membership.
pub async fn general_user(db: &Db, tenant_id: i32, email: &str) -> Result<models::user::Model, anyhow::Error> {
    let now = Utc::now();
    let user = models::user::ActiveModel {
        tenant_id: Set(tenant_id),
        email: Set(email.to_string()),
        name: Set("General".into()),
        password_hash: Set(Some(hash_password("Passw0rd!")?)),
        user_type: Set(UserType::General.as_str().into()),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db.writer())
    .await?;
    Ok(user)
}

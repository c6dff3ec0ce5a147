use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, JoinType, PaginatorTrait, QueryFilter, QuerySelect,
    RelationTrait, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use models::db::Db;
use models::user::UserType;
use models::{channel, feedback, project, tenant, user};
use crate::auth::service::hash_password;
use crate::errors::ServiceError;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetupTenant {
    pub site_name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTenant {
    pub site_name: String,
    pub use_email: bool,
    pub is_private: bool,
    pub is_restrict_domain: bool,
    #[serde(default)]
    pub allow_domains: Vec<String>,
    #[serde(rename = "useOAuth", alias = "useOauth")]
    pub use_oauth: bool,
    #[serde(default, rename = "oauthConfig")]
    pub oauth_config: Option<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Count {
    pub total: u64,
}

/// Create a tenant together with its SUPER admin.
///
/// Fails with `AlreadyExists` before writing anything when the site name
/// is taken.
#[instrument(skip(db, input), fields(site_name = %input.site_name))]
pub async fn create(db: &Db, input: SetupTenant) -> Result<tenant::Model, ServiceError> {
    if input.site_name.trim().is_empty() {
        return Err(ServiceError::bad_request("siteName must not be empty"));
    }
    if !input.email.contains('@') {
        return Err(ServiceError::bad_request("invalid email"));
    }
    let password_hash = hash_password(&input.password)?;

    let txn = db.writer().begin().await?;
    let exists = tenant::Entity::find()
        .filter(tenant::Column::SiteName.eq(input.site_name.clone()))
        .count(&txn)
        .await?;
    if exists > 0 {
        txn.rollback().await?;
        return Err(ServiceError::AlreadyExists("Tenant already exists".into()));
    }

    let now = Utc::now();
    let created = tenant::ActiveModel {
        site_name: Set(input.site_name.clone()),
        use_email: Set(true),
        is_private: Set(false),
        is_restrict_domain: Set(false),
        allow_domains: Set(serde_json::json!([])),
        use_oauth: Set(false),
        oauth_config: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    user::ActiveModel {
        tenant_id: Set(created.id),
        email: Set(input.email.clone()),
        name: Set(input.email.split('@').next().unwrap_or_default().to_string()),
        password_hash: Set(Some(password_hash)),
        user_type: Set(UserType::Super.as_str().into()),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    txn.commit().await?;
    info!(tenant_id = created.id, "tenant_created");
    Ok(created)
}

/// Overwrite every tenant setting. Renaming onto another tenant's site
/// name is `AlreadyExists` and leaves the row untouched.
#[instrument(skip(db, input))]
pub async fn update(db: &Db, tenant_id: i32, input: UpdateTenant) -> Result<tenant::Model, ServiceError> {
    if input.site_name.trim().is_empty() {
        return Err(ServiceError::bad_request("siteName must not be empty"));
    }
    let txn = db.writer().begin().await?;
    let Some(current) = tenant::Entity::find_by_id(tenant_id).one(&txn).await? else {
        txn.rollback().await?;
        return Err(ServiceError::not_found("Tenant"));
    };
    let taken = tenant::Entity::find()
        .filter(tenant::Column::SiteName.eq(input.site_name.clone()))
        .filter(tenant::Column::Id.ne(tenant_id))
        .count(&txn)
        .await?;
    if taken > 0 {
        txn.rollback().await?;
        return Err(ServiceError::AlreadyExists("Tenant already exists".into()));
    }

    let mut am: tenant::ActiveModel = current.into();
    am.site_name = Set(input.site_name);
    am.use_email = Set(input.use_email);
    am.is_private = Set(input.is_private);
    am.is_restrict_domain = Set(input.is_restrict_domain);
    am.allow_domains = Set(serde_json::json!(input.allow_domains));
    am.use_oauth = Set(input.use_oauth);
    am.oauth_config = Set(input.oauth_config);
    am.updated_at = Set(Utc::now());
    let updated = am.update(&txn).await?;
    txn.commit().await?;
    Ok(updated)
}

pub async fn find_by_id(db: &Db, tenant_id: i32) -> Result<tenant::Model, ServiceError> {
    tenant::Entity::find_by_id(tenant_id)
        .one(db.reader())
        .await?
        .ok_or_else(|| ServiceError::not_found("Tenant"))
}

/// Number of feedbacks across every channel of every project of the tenant.
#[instrument(skip(db))]
pub async fn count_feedbacks(db: &Db, tenant_id: i32) -> Result<Count, ServiceError> {
    find_by_id(db, tenant_id).await?;
    let total = feedback::Entity::find()
        .join(JoinType::InnerJoin, feedback::Relation::Channel.def())
        .join(JoinType::InnerJoin, channel::Relation::Project.def())
        .filter(project::Column::TenantId.eq(tenant_id))
        .count(db.reader())
        .await?;
    Ok(Count { total })
}

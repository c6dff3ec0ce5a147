//! Project permission checks.
//!
//! SUPER users pass for any project of their own tenant. Everyone else needs
//! a membership whose role grants the permission.

use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QuerySelect, RelationTrait, JoinType};
use tracing::debug;

use models::db::Db;
use models::role::Permission;
use models::user::UserType;
use models::{member, project, role};
use crate::errors::ServiceError;

/// Identity of the caller as carried by the access token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub user_id: i32,
    pub tenant_id: i32,
    pub user_type: UserType,
}

/// Role the principal holds in the project, if any.
pub async fn role_in_project(db: &Db, user_id: i32, project_id: i32) -> Result<Option<role::Model>, ServiceError> {
    Ok(role::Entity::find()
        .join(JoinType::InnerJoin, role::Relation::Member.def())
        .filter(role::Column::ProjectId.eq(project_id))
        .filter(member::Column::UserId.eq(user_id))
        .one(db.reader())
        .await?)
}

/// `NotFound` for unknown projects, `Forbidden` when the principal may not
/// perform `permission` there.
pub async fn require(db: &Db, principal: &Principal, project_id: i32, permission: Permission) -> Result<(), ServiceError> {
    let found = project::Entity::find_by_id(project_id)
        .one(db.reader())
        .await?
        .ok_or_else(|| ServiceError::not_found("Project"))?;
    if found.tenant_id != principal.tenant_id {
        return Err(ServiceError::Forbidden("Forbidden resource".into()));
    }
    if principal.user_type == UserType::Super {
        return Ok(());
    }
    match role_in_project(db, principal.user_id, project_id).await? {
        Some(r) if r.has(permission) => Ok(()),
        _ => {
            debug!(user_id = principal.user_id, project_id, permission = %permission, "permission denied");
            Err(ServiceError::Forbidden("Forbidden resource".into()))
        }
    }
}

/// Read access to the project itself: SUPER of its tenant or any member.
pub async fn require_member(db: &Db, principal: &Principal, project_id: i32) -> Result<project::Model, ServiceError> {
    let found = project::Entity::find_by_id(project_id)
        .one(db.reader())
        .await?
        .ok_or_else(|| ServiceError::not_found("Project"))?;
    if found.tenant_id != principal.tenant_id {
        return Err(ServiceError::Forbidden("Forbidden resource".into()));
    }
    if principal.user_type == UserType::Super || role_in_project(db, principal.user_id, project_id).await?.is_some() {
        return Ok(found);
    }
    Err(ServiceError::Forbidden("Forbidden resource".into()))
}

/// SUPER user of `tenant_id`.
pub fn require_super_of(principal: &Principal, tenant_id: i32) -> Result<(), ServiceError> {
    if principal.user_type == UserType::Super && principal.tenant_id == tenant_id {
        Ok(())
    } else {
        Err(ServiceError::Forbidden("Forbidden resource".into()))
    }
}

use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, Set, TransactionTrait};
use serde::Deserialize;
use tracing::{info, instrument};

use models::db::Db;
use models::role::Permission;
use models::{member, project, role, tenant};
use crate::errors::ServiceError;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProject {
    pub tenant_id: i32,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Create a project with an `Admin` role holding every permission and
/// make the creator its member.
#[instrument(skip(db, input), fields(tenant_id = input.tenant_id, name = %input.name))]
pub async fn create(db: &Db, creator_id: i32, input: CreateProject) -> Result<project::Model, ServiceError> {
    if input.name.trim().is_empty() {
        return Err(ServiceError::bad_request("name must not be empty"));
    }
    let txn = db.writer().begin().await?;
    if tenant::Entity::find_by_id(input.tenant_id).one(&txn).await?.is_none() {
        txn.rollback().await?;
        return Err(ServiceError::not_found("Tenant"));
    }
    let dup = project::Entity::find()
        .filter(project::Column::TenantId.eq(input.tenant_id))
        .filter(project::Column::Name.eq(input.name.clone()))
        .count(&txn)
        .await?;
    if dup > 0 {
        txn.rollback().await?;
        return Err(ServiceError::NameDuplicated("Project name is duplicated".into()));
    }

    let now = Utc::now();
    let created = project::ActiveModel {
        tenant_id: Set(input.tenant_id),
        name: Set(input.name),
        description: Set(input.description),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    let admin_role = role::ActiveModel {
        project_id: Set(created.id),
        name: Set("Admin".into()),
        permissions: Set(Permission::all_as_json()),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    member::ActiveModel {
        role_id: Set(admin_role.id),
        user_id: Set(creator_id),
        created_at: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    txn.commit().await?;
    info!(project_id = created.id, "project_created");
    Ok(created)
}

pub async fn find_by_id(db: &Db, project_id: i32) -> Result<project::Model, ServiceError> {
    project::Entity::find_by_id(project_id)
        .one(db.reader())
        .await?
        .ok_or_else(|| ServiceError::not_found("Project"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::fixture;

    #[tokio::test]
    async fn creator_becomes_admin_member() -> Result<(), anyhow::Error> {
        let fx = fixture().await?;
        let roles = role::Entity::find()
            .filter(role::Column::ProjectId.eq(fx.project.id))
            .all(fx.db.reader())
            .await?;
        assert_eq!(roles.len(), 1);
        assert_eq!(roles[0].permission_list().len(), Permission::ALL.len());

        let members = member::Entity::find()
            .filter(member::Column::RoleId.eq(roles[0].id))
            .all(fx.db.reader())
            .await?;
        assert_eq!(members.len(), 1);
        assert_eq!(members[0].user_id, fx.admin.id);
        Ok(())
    }

    #[tokio::test]
    async fn project_name_is_unique_per_tenant() -> Result<(), anyhow::Error> {
        let fx = fixture().await?;
        let err = create(
            &fx.db,
            fx.admin.id,
            CreateProject { tenant_id: fx.tenant.id, name: "web".into(), description: None },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ServiceError::NameDuplicated(_)));
        assert!(matches!(find_by_id(&fx.db, 404).await, Err(ServiceError::NotFound(_))));
        Ok(())
    }
}

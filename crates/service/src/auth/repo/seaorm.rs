use models::db::Db;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};

use crate::auth::domain::{AuthUser, Credentials};
use crate::auth::errors::AuthError;
use crate::auth::repository::AuthRepository;

pub struct SeaOrmAuthRepository {
    pub db: Db,
}

#[async_trait::async_trait]
impl AuthRepository for SeaOrmAuthRepository {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<AuthUser>, AuthError> {
        let res = models::user::Entity::find()
            .filter(models::user::Column::Email.eq(email.to_string()))
            .one(self.db.reader())
            .await
            .map_err(|e| AuthError::Repository(e.to_string()))?;
        Ok(res.map(|u| AuthUser { id: u.id, tenant_id: u.tenant_id, email: u.email, name: u.name, user_type: u.user_type }))
    }

    async fn get_credentials(&self, user_id: i32) -> Result<Option<Credentials>, AuthError> {
        let res = models::user::Entity::find_by_id(user_id)
            .one(self.db.reader())
            .await
            .map_err(|e| AuthError::Repository(e.to_string()))?;
        Ok(res.and_then(|u| u.password_hash.map(|password_hash| Credentials { user_id: u.id, password_hash })))
    }
}

use async_trait::async_trait;

use super::domain::{AuthUser, Credentials};
use super::errors::AuthError;

/// Repository abstraction for auth-related persistence.
#[async_trait]
pub trait AuthRepository: Send + Sync {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<AuthUser>, AuthError>;
    async fn get_credentials(&self, user_id: i32) -> Result<Option<Credentials>, AuthError>;
}

/// Simple in-memory mock repository for tests and doc examples
pub mod mock {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    use crate::auth::service::hash_password;

    #[derive(Default)]
    pub struct MockAuthRepository {
        users: Mutex<HashMap<String, AuthUser>>, // key: email
        creds: Mutex<HashMap<i32, Credentials>>, // key: user_id
    }

    impl MockAuthRepository {
        /// Store a user with an argon2 hash of `password`.
        pub fn insert_user(&self, user: AuthUser, password: &str) -> Result<(), AuthError> {
            let password_hash = hash_password(password)?;
            let mut creds = self.creds.lock().map_err(|e| AuthError::Repository(e.to_string()))?;
            creds.insert(user.id, Credentials { user_id: user.id, password_hash });
            let mut users = self.users.lock().map_err(|e| AuthError::Repository(e.to_string()))?;
            users.insert(user.email.clone(), user);
            Ok(())
        }
    }

    #[async_trait]
    impl AuthRepository for MockAuthRepository {
        async fn find_user_by_email(&self, email: &str) -> Result<Option<AuthUser>, AuthError> {
            let users = self.users.lock().map_err(|e| AuthError::Repository(e.to_string()))?;
            Ok(users.get(email).cloned())
        }

        async fn get_credentials(&self, user_id: i32) -> Result<Option<Credentials>, AuthError> {
            let creds = self.creds.lock().map_err(|e| AuthError::Repository(e.to_string()))?;
            Ok(creds.get(&user_id).cloned())
        }
    }
}

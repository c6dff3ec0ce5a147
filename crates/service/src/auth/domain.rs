use serde::{Deserialize, Serialize};

/// Sign-in input
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignInInput {
    pub email: String,
    pub password: String,
}

/// Domain user (business view)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: i32,
    pub tenant_id: i32,
    pub email: String,
    pub name: String,
    pub user_type: String,
}

/// Domain credentials (hashed)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub user_id: i32,
    pub password_hash: String,
}

/// Sign-in result (session)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthSession {
    pub user: AuthUser,
    pub access_token: String,
}

/// JWT claims carried by access tokens and the `auth_token` cookie.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// user id
    pub sub: String,
    pub email: String,
    /// tenant id
    pub tid: i32,
    /// user type (`SUPER` | `GENERAL`)
    pub typ: String,
    pub exp: usize,
}

impl Claims {
    pub fn user_id(&self) -> Option<i32> {
        self.sub.parse().ok()
    }
}

use std::sync::Arc;

use argon2::{Argon2, password_hash::{PasswordHasher, PasswordVerifier, SaltString}, PasswordHash};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header as JwtHeader, Validation};
use rand::rngs::OsRng;
use tracing::{info, instrument};

use super::domain::{AuthSession, AuthUser, Claims, SignInInput};
use super::errors::AuthError;
use super::repository::AuthRepository;

/// Auth service configuration
#[derive(Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub token_ttl_hours: i64,
}

impl From<&configs::AuthConfig> for AuthConfig {
    fn from(c: &configs::AuthConfig) -> Self {
        Self { jwt_secret: c.jwt_secret.clone(), token_ttl_hours: c.token_ttl_hours }
    }
}

/// Hash a password with argon2 and a random salt.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| AuthError::HashError(e.to_string()))
}

pub fn verify_password(password: &str, hash: &str) -> Result<bool, AuthError> {
    let parsed = PasswordHash::new(hash).map_err(|e| AuthError::HashError(e.to_string()))?;
    Ok(Argon2::default().verify_password(password.as_bytes(), &parsed).is_ok())
}

/// Auth business service independent of web framework
pub struct AuthService<R: AuthRepository> {
    repo: Arc<R>,
    cfg: AuthConfig,
}

impl<R: AuthRepository> AuthService<R> {
    pub fn new(repo: Arc<R>, cfg: AuthConfig) -> Self { Self { repo, cfg } }

    /// Authenticate a user by e-mail and password and issue an access token.
    ///
    /// # Examples
    /// ```
    /// use service::auth::{service::{AuthService, AuthConfig}, repository::mock::MockAuthRepository};
    /// use service::auth::domain::{AuthUser, SignInInput};
    /// use std::sync::Arc;
    /// let repo = Arc::new(MockAuthRepository::default());
    /// let user = AuthUser { id: 1, tenant_id: 1, email: "u@e.com".into(), name: "N".into(), user_type: "SUPER".into() };
    /// repo.insert_user(user, "Passw0rd").unwrap();
    /// let svc = AuthService::new(repo, AuthConfig { jwt_secret: "secret".into(), token_ttl_hours: 12 });
    /// let session = tokio_test::block_on(svc.sign_in(SignInInput { email: "u@e.com".into(), password: "Passw0rd".into() })).unwrap();
    /// assert_eq!(session.user.email, "u@e.com");
    /// assert!(!session.access_token.is_empty());
    /// ```
    #[instrument(skip(self, input), fields(email = %input.email))]
    pub async fn sign_in(&self, input: SignInInput) -> Result<AuthSession, AuthError> {
        if input.email.trim().is_empty() || input.password.is_empty() {
            return Err(AuthError::Validation("email and password are required".into()));
        }
        let user = self.repo
            .find_user_by_email(&input.email)
            .await?
            .ok_or(AuthError::Unauthorized)?;

        let cred = self.repo
            .get_credentials(user.id)
            .await?
            .ok_or(AuthError::Unauthorized)?;

        if !verify_password(&input.password, &cred.password_hash)? {
            return Err(AuthError::Unauthorized);
        }

        let access_token = self.issue_token(&user)?;
        info!(user_id = user.id, tenant_id = user.tenant_id, "user_signed_in");
        Ok(AuthSession { user, access_token })
    }

    pub fn issue_token(&self, user: &AuthUser) -> Result<String, AuthError> {
        issue_token(&self.cfg, user)
    }

    pub fn verify_token(&self, token: &str) -> Result<Claims, AuthError> {
        verify_token(&self.cfg.jwt_secret, token)
    }
}

/// HS256 token with `sub`, `email`, `tid`, `typ` claims.
pub fn issue_token(cfg: &AuthConfig, user: &AuthUser) -> Result<String, AuthError> {
    let exp = (chrono::Utc::now() + chrono::Duration::hours(cfg.token_ttl_hours)).timestamp() as usize;
    let claims = Claims {
        sub: user.id.to_string(),
        email: user.email.clone(),
        tid: user.tenant_id,
        typ: user.user_type.clone(),
        exp,
    };
    encode(&JwtHeader::default(), &claims, &EncodingKey::from_secret(cfg.jwt_secret.as_bytes()))
        .map_err(|e| AuthError::TokenError(e.to_string()))
}

pub fn verify_token(secret: &str, token: &str) -> Result<Claims, AuthError> {
    decode::<Claims>(token, &DecodingKey::from_secret(secret.as_bytes()), &Validation::default())
        .map(|data| data.claims)
        .map_err(|e| AuthError::TokenError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::repository::mock::MockAuthRepository;

    fn svc() -> AuthService<MockAuthRepository> {
        let repo = Arc::new(MockAuthRepository::default());
        let user = AuthUser { id: 7, tenant_id: 3, email: "a@b.io".into(), name: "A".into(), user_type: "GENERAL".into() };
        repo.insert_user(user, "Sup3rSecret").unwrap();
        AuthService::new(repo, AuthConfig { jwt_secret: "k".into(), token_ttl_hours: 12 })
    }

    #[tokio::test]
    async fn sign_in_issues_verifiable_token() {
        let svc = svc();
        let session = svc
            .sign_in(SignInInput { email: "a@b.io".into(), password: "Sup3rSecret".into() })
            .await
            .unwrap();
        let claims = svc.verify_token(&session.access_token).unwrap();
        assert_eq!(claims.user_id(), Some(7));
        assert_eq!(claims.tid, 3);
        assert_eq!(claims.typ, "GENERAL");
        assert_eq!(claims.email, "a@b.io");
    }

    #[tokio::test]
    async fn wrong_password_is_unauthorized() {
        let err = svc()
            .sign_in(SignInInput { email: "a@b.io".into(), password: "nope".into() })
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Unauthorized));
    }

    #[tokio::test]
    async fn unknown_email_is_unauthorized() {
        let err = svc()
            .sign_in(SignInInput { email: "x@b.io".into(), password: "Sup3rSecret".into() })
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Unauthorized));
    }

    #[tokio::test]
    async fn blank_input_is_a_validation_error() {
        let err = svc()
            .sign_in(SignInInput { email: "  ".into(), password: String::new() })
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Validation(_)));
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let cfg = AuthConfig { jwt_secret: "one".into(), token_ttl_hours: 1 };
        let user = AuthUser { id: 1, tenant_id: 1, email: "e".into(), name: "n".into(), user_type: "SUPER".into() };
        let token = issue_token(&cfg, &user).unwrap();
        assert!(verify_token("two", &token).is_err());
        assert!(verify_token("one", &token).is_ok());
    }
}

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::auth::jwt::{IssuedToken, TokenSigner};
use crate::auth::password::PasswordHasher;
use crate::clock::Clock;
use crate::db::Store;
use crate::error::AppError;
use crate::models::{NewUser, Role, User};

/// Body returned by both login and registration.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub username: String,
    pub role: Role,
}

impl AuthResponse {
    fn new(user: &User, issued: IssuedToken) -> Self {
        Self {
            token: issued.token,
            expires_at: issued.expires_at,
            username: user.username.clone(),
            role: user.role,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Registration<'a> {
    pub username: &'a str,
    pub email: &'a str,
    pub password: &'a str,
    pub role: Option<&'a str>,
}

pub struct AuthService {
    store: Arc<dyn Store>,
    tokens: Arc<TokenSigner>,
    hasher: PasswordHasher,
    clock: Arc<dyn Clock>,
}

impl AuthService {
    pub fn new(
        store: Arc<dyn Store>,
        tokens: Arc<TokenSigner>,
        hasher: PasswordHasher,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            tokens,
            hasher,
            clock,
        }
    }

    /// Returns `None` when the username is unknown, inactive, or the password is wrong.
    pub async fn authenticate(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Option<AuthResponse>, AppError> {
        let username = username.trim();
        if username.is_empty() {
            return Ok(None);
        }

        let Some(user) = self.store.find_active_user(username).await? else {
            return Ok(None);
        };

        let valid = self
            .hasher
            .verify(password, &user.password_hash)
            .await
            .map_err(AppError::Internal)?;
        if !valid {
            return Ok(None);
        }

        self.store.record_login(user.id, self.clock.now()).await?;

        let issued = self.tokens.issue(&user).map_err(AppError::Internal)?;
        Ok(Some(AuthResponse::new(&user, issued)))
    }

    pub async fn register(&self, req: Registration<'_>) -> Result<AuthResponse, AppError> {
        let username = req.username.trim();
        let email = req.email.trim();

        if username.is_empty() {
            return Err(AppError::BadRequest("Username is required".to_string()));
        }
        if email.is_empty() {
            return Err(AppError::BadRequest("Email is required".to_string()));
        }
        if req.password.is_empty() {
            return Err(AppError::BadRequest("Password is required".to_string()));
        }

        if self.store.username_exists(username).await? {
            return Err(AppError::Conflict("Username already exists".to_string()));
        }
        if self.store.email_exists(email).await? {
            return Err(AppError::Conflict("Email already exists".to_string()));
        }

        let role = Role::from_requested(req.role);
        let password_hash = self
            .hasher
            .hash(req.password)
            .await
            .map_err(AppError::Internal)?;

        let user = self
            .store
            .create_user(&NewUser {
                username,
                email,
                password_hash: &password_hash,
                role,
            })
            .await?;

        tracing::info!(user_id = %user.id, role = %user.role, "Registered user {}", user.username);

        let issued = self.tokens.issue(&user).map_err(AppError::Internal)?;
        Ok(AuthResponse::new(&user, issued))
    }
}

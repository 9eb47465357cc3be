use crate::domain_model::{FieldErrors, Profile, RegisteredUser, Session};
use serde::Serialize;

#[derive(Debug, Clone, thiserror::Error)]
pub enum AuthError {
    #[error("access token rejected")]
    Unauthorized,
    #[error("permission denied")]
    Forbidden,
    #[error("validation failed: {0}")]
    Validation(FieldErrors),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("session expired")]
    SessionExpired,
    #[error("invalid credentials: {0}")]
    InvalidCredentials(String),
    #[error("api error ({status}): {}", .detail.as_deref().unwrap_or("no detail"))]
    Api {
        status: u16,
        detail: Option<String>,
    },
    #[error("store error: {0}")]
    Store(String),
    #[error("internal error: {0}")]
    InternalError(String),
}

impl AuthError {
    /// Errors after which the caller should send the user to a login surface.
    pub fn requires_login(&self) -> bool {
        matches!(self, AuthError::Unauthorized | AuthError::SessionExpired)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginInput {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RegisterInput {
    pub username: String,
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password_confirm: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChangePasswordInput {
    pub current_password: String,
    pub new_password: String,
    pub new_password_confirm: String,
}

/// The contract the UI and routing layers consume.
///
/// The three synchronous reads only look at memory, so they are safe to call
/// from render or guard code at any time.
#[async_trait::async_trait]
pub trait AuthService: Send + Sync {
    fn is_authenticated(&self) -> bool;
    fn is_admin(&self) -> bool;
    fn current_user(&self) -> Option<Profile>;

    /// Restores a persisted session. Must run once before any authorized call.
    async fn rehydrate_from_storage(&self) -> Result<Option<Session>, AuthError>;
    async fn login(&self, request: LoginInput) -> Result<Profile, AuthError>;
    async fn logout(&self);
    async fn register(&self, request: RegisterInput) -> Result<RegisteredUser, AuthError>;
    /// Returns the server's confirmation message.
    async fn change_password(&self, request: ChangePasswordInput) -> Result<String, AuthError>;
    async fn fetch_current_user(&self) -> Result<Profile, AuthError>;
}

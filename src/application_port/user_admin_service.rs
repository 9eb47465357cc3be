use crate::application_port::AuthError;
use crate::domain_model::{AdminUser, UserId};
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct CreateUserInput {
    pub username: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// The server assigns its default password when omitted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    pub is_staff: bool,
    pub is_active: bool,
}

/// Partial update; `None` fields are left untouched on the server.
#[derive(Debug, Clone, Default, Serialize)]
pub struct UpdateUserInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_staff: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResetPasswordInput {
    pub new_password: String,
    pub new_password_confirm: String,
}

#[async_trait::async_trait]
pub trait UserAdminService: Send + Sync {
    async fn list_users(&self) -> Result<Vec<AdminUser>, AuthError>;
    async fn create_user(&self, request: CreateUserInput) -> Result<AdminUser, AuthError>;
    async fn update_user(
        &self,
        user_id: UserId,
        request: UpdateUserInput,
    ) -> Result<AdminUser, AuthError>;
    async fn delete_user(&self, user_id: UserId) -> Result<(), AuthError>;
    /// Returns the server's confirmation message.
    async fn reset_password(
        &self,
        user_id: UserId,
        request: ResetPasswordInput,
    ) -> Result<String, AuthError>;
}

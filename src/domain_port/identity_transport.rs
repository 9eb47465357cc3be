use crate::application_port::AuthError;
use crate::domain_model::{ApiRequest, ApiResponse};

/// Sends one request to the identity service.
///
/// Any HTTP status is a successful send; only failures to obtain a response at
/// all (connection, timeout, protocol) are reported, as `AuthError::Transport`.
#[async_trait::async_trait]
pub trait IdentityTransport: Send + Sync {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, AuthError>;
}

use crate::application_impl::RequestAuthorizer;
use crate::application_port::*;
use crate::domain_model::*;
use std::sync::Arc;
use tracing::info;

const DEFAULT_PASSWORD_RESET: &str = "Password reset.";

/// Administrative user management over the generic authorizer. Staff-only on
/// the server; a non-staff session gets `Forbidden` and stays logged in.
pub struct RealUserAdminService {
    authorizer: Arc<RequestAuthorizer>,
    paths: IdentityPaths,
}

impl RealUserAdminService {
    pub fn new(authorizer: Arc<RequestAuthorizer>, paths: IdentityPaths) -> RealUserAdminService {
        RealUserAdminService { authorizer, paths }
    }
}

#[async_trait::async_trait]
impl UserAdminService for RealUserAdminService {
    async fn list_users(&self) -> Result<Vec<AdminUser>, AuthError> {
        self.authorizer
            .execute_json(ApiRequest::get(self.paths.users.as_str()))
            .await
    }

    async fn create_user(&self, request: CreateUserInput) -> Result<AdminUser, AuthError> {
        let user: AdminUser = self
            .authorizer
            .execute_json(ApiRequest::post(self.paths.users.as_str()).json(&request)?)
            .await?;
        info!(user_id = %user.id, username = %user.username, "user created");
        Ok(user)
    }

    async fn update_user(
        &self,
        user_id: UserId,
        request: UpdateUserInput,
    ) -> Result<AdminUser, AuthError> {
        let user: AdminUser = self
            .authorizer
            .execute_json(ApiRequest::patch(self.paths.user(user_id)).json(&request)?)
            .await?;
        info!(user_id = %user.id, "user updated");
        Ok(user)
    }

    async fn delete_user(&self, user_id: UserId) -> Result<(), AuthError> {
        self.authorizer
            .execute(ApiRequest::delete(self.paths.user(user_id)))
            .await?
            .error_for_status()?;
        info!(user_id = %user_id, "user deleted");
        Ok(())
    }

    async fn reset_password(
        &self,
        user_id: UserId,
        request: ResetPasswordInput,
    ) -> Result<String, AuthError> {
        let response: DetailResponse = self
            .authorizer
            .execute_json(
                ApiRequest::post(self.paths.user_reset_password(user_id)).json(&request)?,
            )
            .await?;
        info!(user_id = %user_id, "password reset");
        Ok(response
            .detail
            .unwrap_or_else(|| DEFAULT_PASSWORD_RESET.to_string()))
    }
}

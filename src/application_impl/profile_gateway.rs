use crate::application_impl::RequestAuthorizer;
use crate::application_port::AuthError;
use crate::domain_model::{ApiRequest, Profile};
use std::sync::Arc;

/// Fetches the authenticated user's profile. Persisting it is up to the caller.
pub struct ProfileGateway {
    authorizer: Arc<RequestAuthorizer>,
    profile_path: String,
}

impl ProfileGateway {
    pub fn new(authorizer: Arc<RequestAuthorizer>, profile_path: impl Into<String>) -> Self {
        Self {
            authorizer,
            profile_path: profile_path.into(),
        }
    }

    pub async fn fetch_profile(&self) -> Result<Profile, AuthError> {
        self.authorizer
            .execute_json(ApiRequest::get(self.profile_path.as_str()))
            .await
    }
}

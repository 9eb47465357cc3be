use crate::application_impl::{RefreshCoordinator, SessionStore};
use crate::application_port::AuthError;
use crate::domain_model::*;
use crate::domain_port::IdentityTransport;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::{debug, warn};

/// Decorates requests with the current access token and repairs a rejected
/// token once, by refreshing and resending the original request.
pub struct RequestAuthorizer {
    store: Arc<SessionStore>,
    coordinator: Arc<RefreshCoordinator>,
    transport: Arc<dyn IdentityTransport>,
    public: PublicEndpoints,
}

impl RequestAuthorizer {
    pub fn new(
        store: Arc<SessionStore>,
        coordinator: Arc<RefreshCoordinator>,
        transport: Arc<dyn IdentityTransport>,
        public: PublicEndpoints,
    ) -> Self {
        Self {
            store,
            coordinator,
            transport,
            public,
        }
    }

    /// Sends `request` and returns the response as received, whatever its
    /// status, with two exceptions: transport failures are returned as
    /// `AuthError::Transport`, and a 401 that could not be repaired ends the
    /// session and is returned as `AuthError::SessionExpired`.
    pub async fn execute(&self, request: ApiRequest) -> Result<ApiResponse, AuthError> {
        if self.public.is_public(request.route()) {
            debug!(method = %request.method, path = request.route(), "public endpoint");
            let mut request = request;
            request.bearer = None;
            return self.transport.send(request).await;
        }

        let session = self.store.session();
        let decorated = match &session {
            Some(session) => request.with_bearer(session.access_token.clone()),
            None => request.clone(),
        };
        let response = self.transport.send(decorated).await?;
        if !response.is_unauthorized() {
            return Ok(response);
        }

        debug!(method = %request.method, path = request.route(), "access token rejected");
        let Some(token) = self.coordinator.request_refresh().await else {
            warn!(path = request.route(), "session could not be repaired");
            if let Some(session) = &session {
                self.store.clear_if_current(&session.refresh_token).await;
            }
            return Err(AuthError::SessionExpired);
        };

        let response = self.transport.send(request.with_bearer(token)).await?;
        if response.is_unauthorized() {
            warn!(path = request.route(), "renewed token rejected, not retrying again");
        }
        Ok(response)
    }

    /// [`execute`](Self::execute), then classify the status and decode the body.
    pub async fn execute_json<T: DeserializeOwned>(
        &self,
        request: ApiRequest,
    ) -> Result<T, AuthError> {
        self.execute(request).await?.error_for_status()?.json()
    }
}

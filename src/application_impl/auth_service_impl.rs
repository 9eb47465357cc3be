use crate::application_impl::{ProfileGateway, RequestAuthorizer, SessionStore};
use crate::application_port::*;
use crate::domain_model::*;
use std::sync::{Arc, Mutex};
use tokio::task::JoinHandle;
use tracing::{info, warn};

const DEFAULT_CREDENTIALS_DETAIL: &str = "No active account found with the given credentials";
const DEFAULT_PASSWORD_CHANGED: &str = "Password changed.";

pub struct RealAuthService {
    store: Arc<SessionStore>,
    authorizer: Arc<RequestAuthorizer>,
    gateway: Arc<ProfileGateway>,
    paths: IdentityPaths,
    revalidation: Mutex<Option<JoinHandle<()>>>,
}

impl RealAuthService {
    pub fn new(
        store: Arc<SessionStore>,
        authorizer: Arc<RequestAuthorizer>,
        gateway: Arc<ProfileGateway>,
        paths: IdentityPaths,
    ) -> RealAuthService {
        RealAuthService {
            store,
            authorizer,
            gateway,
            paths,
            revalidation: Mutex::new(None),
        }
    }

    /// Waits for the profile revalidation scheduled by
    /// [`rehydrate_from_storage`](AuthService::rehydrate_from_storage), if any.
    pub async fn wait_for_revalidation(&self) {
        let handle = self.take_revalidation();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                if !e.is_cancelled() {
                    warn!(error = %e, "profile revalidation task failed");
                }
            }
        }
    }

    fn take_revalidation(&self) -> Option<JoinHandle<()>> {
        match self.revalidation.lock() {
            Ok(mut slot) => slot.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        }
    }

    fn cancel_revalidation(&self) {
        if let Some(handle) = self.take_revalidation() {
            handle.abort();
        }
    }

    fn schedule_revalidation(&self) {
        let store = self.store.clone();
        let gateway = self.gateway.clone();
        let handle = tokio::spawn(async move {
            match gateway.fetch_profile().await {
                Ok(profile) => {
                    if let Err(e) = store.set_profile(profile).await {
                        warn!(error = %e, "could not persist revalidated profile");
                    }
                }
                Err(e) if e.requires_login() => {
                    info!(error = %e, "restored session rejected, logging out");
                    store.clear().await;
                }
                Err(e) => warn!(error = %e, "profile revalidation failed, keeping session"),
            }
        });
        let previous = match self.revalidation.lock() {
            Ok(mut slot) => slot.replace(handle),
            Err(poisoned) => poisoned.into_inner().replace(handle),
        };
        if let Some(previous) = previous {
            previous.abort();
        }
    }

    async fn exchange_credentials(&self, request: &LoginInput) -> Result<Profile, AuthError> {
        let response = self
            .authorizer
            .execute(ApiRequest::post(self.paths.token.as_str()).json(request)?)
            .await?;
        if response.is_unauthorized() {
            let detail = response
                .detail()
                .unwrap_or_else(|| DEFAULT_CREDENTIALS_DETAIL.to_string());
            return Err(AuthError::InvalidCredentials(detail));
        }

        let tokens: TokenResponse = response.error_for_status()?.json()?;
        let (Some(access), Some(refresh)) = (tokens.access, tokens.refresh) else {
            return Err(AuthError::Transport(
                "token response is missing access or refresh token".to_string(),
            ));
        };
        if !self.store.set_tokens(access, refresh).await? {
            return Err(AuthError::Transport(
                "token response carried an empty token".to_string(),
            ));
        }

        self.fetch_current_user().await
    }
}

#[async_trait::async_trait]
impl AuthService for RealAuthService {
    fn is_authenticated(&self) -> bool {
        self.store.is_authenticated()
    }

    fn is_admin(&self) -> bool {
        self.store.is_admin()
    }

    fn current_user(&self) -> Option<Profile> {
        self.store.profile()
    }

    async fn rehydrate_from_storage(&self) -> Result<Option<Session>, AuthError> {
        let session = self.store.rehydrate().await?;
        if let Some(session) = &session {
            if session.profile.is_none() {
                self.schedule_revalidation();
            }
        }
        Ok(session)
    }

    async fn login(&self, request: LoginInput) -> Result<Profile, AuthError> {
        self.cancel_revalidation();
        match self.exchange_credentials(&request).await {
            Ok(profile) => {
                info!(username = %profile.username, is_staff = profile.is_staff, "logged in");
                Ok(profile)
            }
            Err(e) => {
                warn!(username = %request.username, error = %e, "login failed");
                self.store.clear().await;
                Err(e)
            }
        }
    }

    async fn logout(&self) {
        self.cancel_revalidation();
        self.store.clear().await;
        info!("logged out");
    }

    async fn register(&self, request: RegisterInput) -> Result<RegisteredUser, AuthError> {
        let user: RegisteredUser = self
            .authorizer
            .execute_json(ApiRequest::post(self.paths.register.as_str()).json(&request)?)
            .await?;
        info!(user_id = %user.id, username = %user.username, "registered");
        Ok(user)
    }

    async fn change_password(&self, request: ChangePasswordInput) -> Result<String, AuthError> {
        let response: DetailResponse = self
            .authorizer
            .execute_json(ApiRequest::post(self.paths.change_password.as_str()).json(&request)?)
            .await?;
        info!("password changed");
        Ok(response
            .detail
            .unwrap_or_else(|| DEFAULT_PASSWORD_CHANGED.to_string()))
    }

    async fn fetch_current_user(&self) -> Result<Profile, AuthError> {
        let profile = self.gateway.fetch_profile().await?;
        self.store.set_profile(profile.clone()).await?;
        Ok(profile)
    }
}

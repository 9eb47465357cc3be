use crate::application_impl::SessionStore;
use crate::application_port::AuthError;
use crate::domain_model::*;
use crate::domain_port::IdentityTransport;
use futures_util::FutureExt;
use futures_util::future::{BoxFuture, Shared};
use serde_json::json;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info, warn};

type RefreshOutcome = Option<AccessToken>;
type SharedRefresh = Shared<BoxFuture<'static, RefreshOutcome>>;

struct InFlight {
    attempt: u64,
    outcome: SharedRefresh,
}

struct Inner {
    store: Arc<SessionStore>,
    transport: Arc<dyn IdentityTransport>,
    refresh_path: String,
    in_flight: Mutex<Option<InFlight>>,
    attempts: AtomicU64,
}

enum Exchange {
    Applied(AccessToken),
    Superseded,
}

/// Exchanges the refresh token for a new access token, with at most one
/// exchange in flight. Callers arriving while an exchange runs share its
/// outcome instead of starting their own.
///
/// The exchange runs on its own task, so it completes (and the session is
/// updated or cleared) even if every caller stops waiting.
pub struct RefreshCoordinator {
    inner: Arc<Inner>,
}

impl RefreshCoordinator {
    pub fn new(
        store: Arc<SessionStore>,
        transport: Arc<dyn IdentityTransport>,
        refresh_path: impl Into<String>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                store,
                transport,
                refresh_path: refresh_path.into(),
                in_flight: Mutex::new(None),
                attempts: AtomicU64::new(0),
            }),
        }
    }

    /// Returns the renewed access token, or `None` when the session cannot be
    /// repaired. On `None` the session has already been cleared.
    pub async fn request_refresh(&self) -> Option<AccessToken> {
        let outcome = self.attach_or_start();
        outcome.await
    }

    pub fn is_refreshing(&self) -> bool {
        self.inner.slot().is_some()
    }

    /// Number of refresh attempts started so far.
    pub fn attempts(&self) -> u64 {
        self.inner.attempts.load(Ordering::SeqCst)
    }

    fn attach_or_start(&self) -> SharedRefresh {
        let mut slot = self.inner.slot();
        if let Some(in_flight) = slot.as_ref() {
            debug!(attempt = in_flight.attempt, "refresh in flight, attaching");
            return in_flight.outcome.clone();
        }

        let attempt = self.inner.attempts.fetch_add(1, Ordering::SeqCst) + 1;
        let inner = self.inner.clone();
        let task = tokio::spawn(async move {
            let _teardown = Teardown {
                inner: inner.clone(),
                attempt,
            };
            inner.run(attempt).await
        });

        let outcome = async move {
            match task.await {
                Ok(outcome) => outcome,
                Err(e) => {
                    warn!(attempt, "refresh task aborted: {}", e);
                    None
                }
            }
        }
        .boxed()
        .shared();

        *slot = Some(InFlight {
            attempt,
            outcome: outcome.clone(),
        });
        outcome
    }
}

impl Inner {
    fn slot(&self) -> MutexGuard<'_, Option<InFlight>> {
        match self.in_flight.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    async fn run(&self, attempt: u64) -> RefreshOutcome {
        let Some(refresh) = self.store.refresh_token() else {
            debug!(attempt, "no refresh token, session cannot be repaired");
            return None;
        };

        info!(attempt, "refreshing access token");
        match self.exchange(&refresh).await {
            Ok(Exchange::Applied(access)) => {
                info!(attempt, "access token refreshed");
                Some(access)
            }
            Ok(Exchange::Superseded) => {
                debug!(attempt, "session changed during refresh");
                self.store.access_token()
            }
            Err(e) => {
                warn!(attempt, "token refresh failed: {}", e);
                if self.store.clear_if_current(&refresh).await {
                    info!(attempt, "session cleared after failed refresh");
                    None
                } else {
                    // logged out or logged in again meanwhile
                    self.store.access_token()
                }
            }
        }
    }

    async fn exchange(&self, refresh: &RefreshToken) -> Result<Exchange, AuthError> {
        let request =
            ApiRequest::post(self.refresh_path.as_str()).json(&json!({ "refresh": refresh }))?;
        let tokens: TokenResponse = self
            .transport
            .send(request)
            .await?
            .error_for_status()?
            .json()?;

        let access = tokens
            .access
            .filter(|a| !a.is_empty())
            .ok_or_else(|| AuthError::Transport("refresh response without access token".into()))?;

        if self
            .store
            .apply_refresh(refresh, access.clone(), tokens.refresh)
            .await?
        {
            Ok(Exchange::Applied(access))
        } else {
            Ok(Exchange::Superseded)
        }
    }

    fn finish(&self, attempt: u64) {
        let mut slot = self.slot();
        if slot.as_ref().is_some_and(|f| f.attempt == attempt) {
            *slot = None;
        }
    }
}

/// Returns the coordinator to idle when the refresh task ends, including by
/// panic. Runs before the task's result becomes visible to waiters.
struct Teardown {
    inner: Arc<Inner>,
    attempt: u64,
}

impl Drop for Teardown {
    fn drop(&mut self) {
        self.inner.finish(self.attempt);
    }
}

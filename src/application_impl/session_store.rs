use crate::application_port::AuthError;
use crate::domain_model::*;
use crate::domain_port::SessionStorage;
use std::sync::{Arc, RwLock};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Storage keys for the persisted payload. Legacy keys are only read as a
/// fallback and are removed once the payload has been migrated.
#[derive(Debug, Clone)]
pub struct StorageKeys {
    pub current: String,
    pub legacy: Vec<String>,
}

impl StorageKeys {
    pub fn new(current: impl Into<String>, legacy: Vec<String>) -> Self {
        Self {
            current: current.into(),
            legacy,
        }
    }

    fn all(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.current.as_str()).chain(self.legacy.iter().map(String::as_str))
    }
}

/// Single source of truth for the current tokens and profile.
///
/// Reads are synchronous and only touch memory. Mutations are serialized and
/// write durable storage before they return, so memory and storage never
/// disagree once a call has completed.
pub struct SessionStore {
    storage: Arc<dyn SessionStorage>,
    keys: StorageKeys,
    state: RwLock<Option<Session>>,
    write_gate: Mutex<()>,
}

impl SessionStore {
    pub fn new(storage: Arc<dyn SessionStorage>, keys: StorageKeys) -> Self {
        Self {
            storage,
            keys,
            state: RwLock::new(None),
            write_gate: Mutex::new(()),
        }
    }

    // region reads

    pub fn session(&self) -> Option<Session> {
        match self.state.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn access_token(&self) -> Option<AccessToken> {
        self.session().map(|s| s.access_token)
    }

    pub fn refresh_token(&self) -> Option<RefreshToken> {
        self.session().map(|s| s.refresh_token)
    }

    pub fn profile(&self) -> Option<Profile> {
        self.session().and_then(|s| s.profile)
    }

    pub fn is_authenticated(&self) -> bool {
        self.session().is_some()
    }

    pub fn is_admin(&self) -> bool {
        self.profile().map(|p| p.is_staff).unwrap_or(false)
    }

    // endregion

    // region mutations

    /// Stores a freshly issued token pair and drops any previous profile.
    ///
    /// Returns `false` when the pair was incomplete; the session is cleared
    /// instead of being stored half-valid.
    pub async fn set_tokens(
        &self,
        access: AccessToken,
        refresh: RefreshToken,
    ) -> Result<bool, AuthError> {
        let _gate = self.write_gate.lock().await;
        match Session::new(access, refresh, None) {
            Some(session) => {
                self.persist_locked(session).await?;
                Ok(true)
            }
            None => {
                warn!("incomplete token pair received, clearing session");
                self.clear_locked().await;
                Ok(false)
            }
        }
    }

    /// Applies the result of a refresh exchange performed with `used`.
    ///
    /// A missing `refresh` keeps the current refresh token. The profile is kept.
    /// If the session no longer holds `used` (it was cleared or replaced while
    /// the exchange was running) the result is discarded and `false` returned.
    pub async fn apply_refresh(
        &self,
        used: &RefreshToken,
        access: AccessToken,
        refresh: Option<RefreshToken>,
    ) -> Result<bool, AuthError> {
        let _gate = self.write_gate.lock().await;
        let Some(current) = self.session() else {
            debug!("session cleared during refresh, discarding result");
            return Ok(false);
        };
        if &current.refresh_token != used {
            debug!("session replaced during refresh, discarding result");
            return Ok(false);
        }

        let refresh = refresh
            .filter(|r| !r.is_empty())
            .unwrap_or(current.refresh_token);
        match Session::new(access, refresh, current.profile) {
            Some(session) => {
                self.persist_locked(session).await?;
                Ok(true)
            }
            None => {
                warn!("refresh returned an empty access token, clearing session");
                self.clear_locked().await;
                Ok(false)
            }
        }
    }

    /// Attaches `profile` to the current session. Ignored when logged out.
    pub async fn set_profile(&self, profile: Profile) -> Result<(), AuthError> {
        let _gate = self.write_gate.lock().await;
        let Some(mut session) = self.session() else {
            debug!("no session to attach profile to");
            return Ok(());
        };
        session.profile = Some(profile);
        self.persist_locked(session).await
    }

    /// Wipes memory and every storage key. Idempotent.
    pub async fn clear(&self) {
        let _gate = self.write_gate.lock().await;
        self.clear_locked().await;
    }

    /// Clears the session only if it still holds `used`. A session replaced by
    /// a new login since `used` was read is kept. Returns whether it cleared.
    pub async fn clear_if_current(&self, used: &RefreshToken) -> bool {
        let _gate = self.write_gate.lock().await;
        match self.session() {
            Some(current) if &current.refresh_token == used => {
                self.clear_locked().await;
                true
            }
            Some(_) => {
                debug!("session replaced since the token was read, keeping it");
                false
            }
            None => false,
        }
    }

    /// Restores the persisted session, migrating legacy keys.
    ///
    /// A malformed payload clears storage and yields `None`.
    pub async fn rehydrate(&self) -> Result<Option<Session>, AuthError> {
        let _gate = self.write_gate.lock().await;

        let mut raw = None;
        for key in self.keys.all() {
            if let Some(value) = self.storage.load(key).await? {
                debug!(key, "found persisted session");
                raw = Some(value);
                break;
            }
        }

        let Some(raw) = raw else {
            self.set_state(None);
            return Ok(None);
        };

        let Some(session) = PersistedPayload::parse(&raw) else {
            warn!("persisted session is malformed, discarding it");
            self.clear_locked().await;
            return Ok(None);
        };

        self.persist_locked(session.clone()).await?;
        for key in &self.keys.legacy {
            self.storage.remove(key).await?;
        }
        info!(
            has_profile = session.profile.is_some(),
            "session restored from storage"
        );
        Ok(Some(session))
    }

    // endregion

    fn set_state(&self, next: Option<Session>) {
        match self.state.write() {
            Ok(mut guard) => *guard = next,
            Err(poisoned) => *poisoned.into_inner() = next,
        }
    }

    async fn persist_locked(&self, session: Session) -> Result<(), AuthError> {
        let raw = serde_json::to_string(&session.to_payload())
            .map_err(|e| AuthError::InternalError(format!("serialize session: {}", e)))?;
        self.storage.save(&self.keys.current, &raw).await?;
        self.set_state(Some(session));
        Ok(())
    }

    async fn clear_locked(&self) {
        self.set_state(None);
        for key in self.keys.all() {
            if let Err(e) = self.storage.remove(key).await {
                warn!(key, "failed to remove persisted session: {}", e);
            }
        }
    }
}

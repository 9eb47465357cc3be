use crate::domain_model::{AccessToken, Profile, RefreshToken};
use serde::{Deserialize, Serialize};

/// A complete, valid session. Both tokens are non-empty by construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub access_token: AccessToken,
    pub refresh_token: RefreshToken,
    pub profile: Option<Profile>,
}

impl Session {
    /// Returns `None` unless both tokens are non-empty.
    pub fn new(
        access_token: AccessToken,
        refresh_token: RefreshToken,
        profile: Option<Profile>,
    ) -> Option<Self> {
        if access_token.is_empty() || refresh_token.is_empty() {
            return None;
        }
        Some(Self {
            access_token,
            refresh_token,
            profile,
        })
    }

    pub fn to_payload(&self) -> PersistedPayload {
        PersistedPayload {
            access: self.access_token.0.clone(),
            refresh: self.refresh_token.0.clone(),
            user: self.profile.clone(),
        }
    }
}

/// Durable form of a [`Session`], stored as JSON under a single key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedPayload {
    pub access: String,
    pub refresh: String,
    #[serde(default)]
    pub user: Option<Profile>,
}

impl PersistedPayload {
    /// Parses a stored payload. Anything that does not describe a full session
    /// (bad JSON, missing or empty tokens) yields `None`.
    pub fn parse(raw: &str) -> Option<Session> {
        let payload: PersistedPayload = serde_json::from_str(raw).ok()?;
        Session::new(
            AccessToken(payload.access),
            RefreshToken(payload.refresh),
            payload.user,
        )
    }
}

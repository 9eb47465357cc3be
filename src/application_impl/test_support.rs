use crate::application_impl::{SessionStore, StorageKeys};
use crate::domain_model::*;
use crate::infra_local::MemorySessionStorage;
use chrono::{TimeZone, Utc};
use serde_json::Value;
use std::sync::Arc;

pub const REFRESH_PATH: &str = "/authtokenrefresh";

pub fn empty_store() -> Arc<SessionStore> {
    Arc::new(SessionStore::new(
        Arc::new(MemorySessionStorage::new()),
        StorageKeys::new("tokenwarden.auth", Vec::new()),
    ))
}

pub async fn logged_in_store(access: &str, refresh: &str) -> Arc<SessionStore> {
    let store = empty_store();
    store
        .set_tokens(access.into(), refresh.into())
        .await
        .expect("memory storage accepts writes");
    store
}

pub fn ok_json(body: Value) -> ApiResponse {
    ApiResponse::new(200, Some(body))
}

pub fn trainer_profile() -> Profile {
    Profile {
        id: UserId(1),
        username: "trainer1".to_string(),
        email: None,
        is_staff: false,
        date_joined: Utc.with_ymd_and_hms(2024, 1, 15, 9, 30, 0).unwrap(),
    }
}

pub fn profile_json(profile: &Profile) -> Value {
    serde_json::to_value(profile).expect("profile serializes")
}

use crate::application_port::AuthError;

/// Durable key/value storage for the persisted session payload.
#[async_trait::async_trait]
pub trait SessionStorage: Send + Sync {
    /// Read the raw value stored under `key`.
    async fn load(&self, key: &str) -> Result<Option<String>, AuthError>;
    /// Overwrite the value stored under `key`.
    async fn save(&self, key: &str, value: &str) -> Result<(), AuthError>;
    /// Delete `key`. Removing a missing key is not an error.
    async fn remove(&self, key: &str) -> Result<(), AuthError>;
}

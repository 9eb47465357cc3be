use crate::application_port::AuthError;
use crate::domain_port::SessionStorage;
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

/// Process-local storage. Nothing survives a restart.
#[derive(Debug, Default)]
pub struct MemorySessionStorage {
    entries: Mutex<HashMap<String, String>>,
    fail_writes: AtomicBool,
}

impl MemorySessionStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.entries.lock().ok()?.get(key).cloned()
    }

    pub fn insert(&self, key: &str, value: &str) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(key.to_owned(), value.to_owned());
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().map(|e| e.is_empty()).unwrap_or(true)
    }

    /// Makes every following `save`/`remove` fail.
    #[cfg(test)]
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn check_writable(&self) -> Result<(), AuthError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            Err(AuthError::Store("memory storage is read-only".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait::async_trait]
impl SessionStorage for MemorySessionStorage {
    async fn load(&self, key: &str) -> Result<Option<String>, AuthError> {
        let entries = self
            .entries
            .lock()
            .map_err(|e| AuthError::Store(e.to_string()))?;
        Ok(entries.get(key).cloned())
    }

    async fn save(&self, key: &str, value: &str) -> Result<(), AuthError> {
        self.check_writable()?;
        let mut entries = self
            .entries
            .lock()
            .map_err(|e| AuthError::Store(e.to_string()))?;
        entries.insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), AuthError> {
        self.check_writable()?;
        let mut entries = self
            .entries
            .lock()
            .map_err(|e| AuthError::Store(e.to_string()))?;
        entries.remove(key);
        Ok(())
    }
}

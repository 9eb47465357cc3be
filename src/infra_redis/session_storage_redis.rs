use crate::application_port::AuthError;
use crate::domain_port::SessionStorage;
use redis::AsyncCommands;
use redis::aio::ConnectionManager;

/// Session payloads kept in Redis under `{prefix}:{key}`, for agents that share
/// one session across processes or hosts.
pub struct RedisSessionStorage {
    conn: ConnectionManager,
    prefix: String,
}

impl RedisSessionStorage {
    pub fn new(conn: ConnectionManager, prefix: impl Into<String>) -> Self {
        RedisSessionStorage {
            conn,
            prefix: prefix.into(),
        }
    }

    pub async fn connect(url: &str, prefix: impl Into<String>) -> Result<Self, AuthError> {
        let client = redis::Client::open(url).map_err(|e| AuthError::Store(e.to_string()))?;
        let conn = client
            .get_connection_manager()
            .await
            .map_err(|e| AuthError::Store(e.to_string()))?;
        Ok(Self::new(conn, prefix))
    }

    fn key(&self, key: &str) -> String {
        format!("{}:{}", self.prefix, key)
    }
}

#[async_trait::async_trait]
impl SessionStorage for RedisSessionStorage {
    async fn load(&self, key: &str) -> Result<Option<String>, AuthError> {
        let key = self.key(key);
        let mut conn = self.conn.clone();
        let val: Option<String> = conn
            .get(&key)
            .await
            .map_err(|e| AuthError::Store(e.to_string()))?;
        Ok(val)
    }

    async fn save(&self, key: &str, value: &str) -> Result<(), AuthError> {
        let key = self.key(key);
        let mut conn = self.conn.clone();
        let _: () = conn
            .set(&key, value)
            .await
            .map_err(|e| AuthError::Store(e.to_string()))?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), AuthError> {
        let key = self.key(key);
        let mut conn = self.conn.clone();
        let _: () = conn
            .del(&key)
            .await
            .map_err(|e| AuthError::Store(e.to_string()))?;
        Ok(())
    }
}

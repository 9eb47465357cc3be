use crate::application_port::AuthError;
use crate::domain_model::{ApiRequest, ApiResponse, HttpMethod};
use crate::domain_port::IdentityTransport;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

pub const REQUEST_ID_HEADER: &str = "X-Request-ID";

/// HTTP transport to the identity service. Paths in [`ApiRequest`] are joined
/// onto `base_url`; timeouts surface as `AuthError::Transport`.
pub struct ReqwestIdentityTransport {
    client: reqwest::Client,
    base_url: String,
}

impl ReqwestIdentityTransport {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, AuthError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AuthError::Transport(e.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }
}

#[async_trait::async_trait]
impl IdentityTransport for ReqwestIdentityTransport {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, AuthError> {
        let url = self.url(&request.path);
        let request_id = uuid::Uuid::new_v4().simple().to_string();

        let mut req = match request.method {
            HttpMethod::Get => self.client.get(&url),
            HttpMethod::Post => self.client.post(&url),
            HttpMethod::Patch => self.client.patch(&url),
            HttpMethod::Delete => self.client.delete(&url),
        };
        req = req.header(REQUEST_ID_HEADER, &request_id);
        if let Some(token) = &request.bearer {
            req = req.bearer_auth(token.as_str());
        }
        if let Some(body) = &request.body {
            req = req.json(body);
        }

        let resp = req
            .send()
            .await
            .map_err(|e| AuthError::Transport(e.to_string()))?;
        let status = resp.status().as_u16();
        let bytes = resp
            .bytes()
            .await
            .map_err(|e| AuthError::Transport(e.to_string()))?;

        // Non-JSON bodies (HTML error pages, empty 204s) are kept as absent or
        // as a plain string so that classification still sees the status.
        let body = if bytes.is_empty() {
            None
        } else {
            match serde_json::from_slice::<Value>(&bytes) {
                Ok(value) => Some(value),
                Err(_) => Some(Value::String(String::from_utf8_lossy(&bytes).into_owned())),
            }
        };

        debug!(
            request_id = %request_id,
            method = %request.method,
            path = request.route(),
            status,
            "identity request"
        );
        Ok(ApiResponse::new(status, body))
    }
}

use crate::application_port::AuthError;
use crate::domain_model::{ApiRequest, ApiResponse};
use crate::domain_port::IdentityTransport;
use futures_util::future::BoxFuture;
use std::sync::Mutex;

type Handler = Box<dyn Fn(ApiRequest) -> BoxFuture<'static, Result<ApiResponse, AuthError>> + Send + Sync>;

/// In-process stand-in for the identity service. Every request is recorded and
/// answered by the supplied handler.
pub struct FakeIdentityTransport {
    handler: Handler,
    sent: Mutex<Vec<ApiRequest>>,
}

impl FakeIdentityTransport {
    pub fn new<F>(handler: F) -> Self
    where
        F: Fn(ApiRequest) -> BoxFuture<'static, Result<ApiResponse, AuthError>> + Send + Sync + 'static,
    {
        Self {
            handler: Box::new(handler),
            sent: Mutex::new(Vec::new()),
        }
    }

    /// Every request sent so far, in order.
    pub fn sent(&self) -> Vec<ApiRequest> {
        self.sent.lock().map(|s| s.clone()).unwrap_or_default()
    }

    /// Requests sent to `route` (query string ignored).
    pub fn sent_to(&self, route: &str) -> Vec<ApiRequest> {
        self.sent()
            .into_iter()
            .filter(|r| r.route() == route)
            .collect()
    }
}

#[async_trait::async_trait]
impl IdentityTransport for FakeIdentityTransport {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, AuthError> {
        if let Ok(mut sent) = self.sent.lock() {
            sent.push(request.clone());
        }
        (self.handler)(request).await
    }
}

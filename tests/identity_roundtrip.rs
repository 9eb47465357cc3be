use serde_json::{Value, json};
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokenwarden::application_port::*;
use tokenwarden::client::Client;
use tokenwarden::domain_model::{ApiRequest, IdentityPaths, Profile};
use tokenwarden::settings::{Authorizer, Identity, Log, Settings, Storage, parse_settings};
use warp::Filter;
use warp::http::{Method, StatusCode};
use warp::hyper::body::Bytes;
use warp::path::FullPath;

#[derive(Debug, Clone)]
struct Seen {
    path: String,
    authorization: Option<String>,
    request_id: Option<String>,
}

/// Identity service stand-in. Accepts one access token at a time; `R1`
/// renews to `A2`.
#[derive(Default)]
struct Stub {
    valid_access: Mutex<String>,
    refresh_calls: AtomicUsize,
    seen: Mutex<Vec<Seen>>,
}

impl Stub {
    fn expire_access(&self) {
        *self.valid_access.lock().unwrap() = String::new();
    }

    fn seen_at(&self, path: &str) -> Vec<Seen> {
        self.seen
            .lock()
            .unwrap()
            .iter()
            .filter(|s| s.path == path)
            .cloned()
            .collect()
    }

    async fn respond(&self, method: &Method, path: &str, authorization: Option<&str>, body: &Bytes) -> (StatusCode, Value) {
        let body: Value = serde_json::from_slice(body).unwrap_or(Value::Null);
        let valid = format!("Bearer {}", self.valid_access.lock().unwrap());
        let authorized = authorization == Some(valid.as_str()) && valid != "Bearer ";

        match (method.as_str(), path) {
            ("POST", "/authtoken") => {
                if body["username"] == "trainer1" && body["password"] == "Secret123!" {
                    *self.valid_access.lock().unwrap() = "A1".to_string();
                    (StatusCode::OK, json!({ "access": "A1", "refresh": "R1" }))
                } else {
                    (
                        StatusCode::UNAUTHORIZED,
                        json!({ "detail": "No active account found with the given credentials" }),
                    )
                }
            }
            ("POST", "/authtokenrefresh") => {
                self.refresh_calls.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(20)).await;
                if body["refresh"] == "R1" {
                    *self.valid_access.lock().unwrap() = "A2".to_string();
                    (StatusCode::OK, json!({ "access": "A2" }))
                } else {
                    (StatusCode::UNAUTHORIZED, json!({ "detail": "Token is invalid or expired" }))
                }
            }
            ("GET", "/health/") => (StatusCode::OK, json!({ "status": "ok" })),
            ("GET", "/api/pokemon/") => (StatusCode::OK, json!({ "count": 0, "results": [] })),
            _ if !authorized => (
                StatusCode::UNAUTHORIZED,
                json!({ "detail": "Given token not valid for any token type" }),
            ),
            ("GET", "/auth/me/") => (
                StatusCode::OK,
                json!({
                    "id": 1,
                    "username": "trainer1",
                    "email": "trainer1@example.com",
                    "is_staff": false,
                    "date_joined": "2024-01-15T09:30:00Z",
                }),
            ),
            ("GET", "/auth/users/") => (
                StatusCode::FORBIDDEN,
                json!({ "detail": "You do not have permission to perform this action." }),
            ),
            _ => (StatusCode::NOT_FOUND, json!({ "detail": "Not found." })),
        }
    }
}

struct TestServer {
    base_url: String,
    stub: Arc<Stub>,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        let stub = Arc::new(Stub::default());
        let state = stub.clone();
        let routes = warp::method()
            .and(warp::path::full())
            .and(warp::header::optional::<String>("authorization"))
            .and(warp::header::optional::<String>("x-request-id"))
            .and(warp::body::bytes())
            .and_then(
                move |method: Method,
                      path: FullPath,
                      authorization: Option<String>,
                      request_id: Option<String>,
                      body: Bytes| {
                    let state = state.clone();
                    async move {
                        state.seen.lock().unwrap().push(Seen {
                            path: path.as_str().to_string(),
                            authorization: authorization.clone(),
                            request_id,
                        });
                        let (status, value) = state
                            .respond(&method, path.as_str(), authorization.as_deref(), &body)
                            .await;
                        Ok::<_, warp::Rejection>(warp::reply::with_status(
                            warp::reply::json(&value),
                            status,
                        ))
                    }
                },
            );

        // Bind to an ephemeral port.
        let (addr, server) = warp::serve(routes).bind_ephemeral(([127, 0, 0, 1], 0));
        let handle = tokio::spawn(server);

        Self {
            base_url: format!("http://{}", addr),
            stub,
            handle,
        }
    }

    fn settings(&self, dir: &std::path::Path) -> Settings {
        Settings {
            identity: Identity {
                backend: "real".to_string(),
                base_url: self.base_url.clone(),
                timeout_secs: 5,
                paths: IdentityPaths::default(),
            },
            storage: Storage {
                backend: "file".to_string(),
                key: "tokenwarden.auth".to_string(),
                legacy_keys: vec!["tokenwarden-auth".to_string()],
                dir: Some(dir.to_string_lossy().into_owned()),
                redis_url: None,
                prefix: "tokenwarden".to_string(),
            },
            authorizer: Authorizer {
                public_paths: Vec::new(),
                public_prefixes: vec!["/api/pokemon/".to_string()],
            },
            log: Log {
                filter: "info".to_string(),
            },
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn trainer_login() -> LoginInput {
    LoginInput {
        username: "trainer1".to_string(),
        password: "Secret123!".to_string(),
    }
}

fn stored_payload(dir: &std::path::Path) -> Value {
    let raw = std::fs::read_to_string(dir.join("tokenwarden.auth.json")).unwrap();
    serde_json::from_str(&raw).unwrap()
}

#[tokio::test]
async fn login_refresh_and_retry_over_http() {
    let server = TestServer::spawn().await;
    let dir = tempfile::tempdir().unwrap();
    let client = Client::try_new(&server.settings(dir.path())).await.unwrap();

    let profile: Profile = client.auth_service.login(trainer_login()).await.unwrap();
    assert_eq!(profile.username, "trainer1");
    assert_eq!(stored_payload(dir.path())["access"], "A1");
    assert_eq!(stored_payload(dir.path())["user"]["username"], "trainer1");

    server.stub.expire_access();
    let refreshed = client.auth_service.fetch_current_user().await.unwrap();
    assert_eq!(refreshed, profile);

    assert_eq!(server.stub.refresh_calls.load(Ordering::SeqCst), 1);
    let profile_calls = server.stub.seen_at("/auth/me/");
    assert_eq!(
        profile_calls.last().unwrap().authorization.as_deref(),
        Some("Bearer A2")
    );
    let payload = stored_payload(dir.path());
    assert_eq!(payload["access"], "A2");
    assert_eq!(payload["refresh"], "R1");
}

#[tokio::test]
async fn session_survives_restart() {
    let server = TestServer::spawn().await;
    let dir = tempfile::tempdir().unwrap();
    {
        let client = Client::try_new(&server.settings(dir.path())).await.unwrap();
        client.auth_service.login(trainer_login()).await.unwrap();
    }

    let client = Client::try_new(&server.settings(dir.path())).await.unwrap();
    let session = client
        .auth_service
        .rehydrate_from_storage()
        .await
        .unwrap()
        .unwrap();

    assert_eq!(session.access_token.as_str(), "A1");
    assert!(client.auth_service.is_authenticated());
    assert_eq!(
        client.auth_service.current_user().map(|p| p.username),
        Some("trainer1".to_string())
    );
}

#[tokio::test]
async fn legacy_session_is_migrated_and_revalidated() {
    let server = TestServer::spawn().await;
    let dir = tempfile::tempdir().unwrap();
    {
        let client = Client::try_new(&server.settings(dir.path())).await.unwrap();
        client.auth_service.login(trainer_login()).await.unwrap();
    }
    std::fs::remove_file(dir.path().join("tokenwarden.auth.json")).unwrap();
    std::fs::write(
        dir.path().join("tokenwarden-auth.json"),
        json!({ "access": "A1", "refresh": "R1" }).to_string(),
    )
    .unwrap();

    let client = Client::try_new(&server.settings(dir.path())).await.unwrap();
    client.auth_service.rehydrate_from_storage().await.unwrap();
    client.wait_for_revalidation().await;

    assert!(!dir.path().join("tokenwarden-auth.json").exists());
    assert_eq!(stored_payload(dir.path())["user"]["username"], "trainer1");
    assert!(client.auth_service.current_user().is_some());
}

#[tokio::test]
async fn forbidden_and_public_calls_leave_session_alone() {
    let server = TestServer::spawn().await;
    let dir = tempfile::tempdir().unwrap();
    let client = Client::try_new(&server.settings(dir.path())).await.unwrap();
    client.auth_service.login(trainer_login()).await.unwrap();

    let result = client.user_admin_service.list_users().await;
    assert!(matches!(result, Err(AuthError::Forbidden)));
    assert!(client.auth_service.is_authenticated());

    let authorizer = client.authorizer.as_ref().unwrap();
    let health = authorizer.execute(ApiRequest::get("/health/")).await.unwrap();
    assert_eq!(health.status, 200);
    assert_eq!(server.stub.seen_at("/health/")[0].authorization, None);
    assert_eq!(server.stub.seen_at("/authtoken")[0].authorization, None);
    assert_eq!(server.stub.refresh_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn identity_and_app_paths_share_the_server_root() {
    let server = TestServer::spawn().await;
    let dir = tempfile::tempdir().unwrap();
    let mut settings =
        parse_settings(Some(concat!(env!("CARGO_MANIFEST_DIR"), "/settings/dev.toml"))).unwrap();
    let bundled = server.settings(dir.path());
    assert_eq!(settings.identity.base_url, "http://localhost:8000");
    settings.identity.base_url = bundled.identity.base_url;
    settings.storage = bundled.storage;
    let client = Client::try_new(&settings).await.unwrap();

    client.auth_service.login(trainer_login()).await.unwrap();
    let authorizer = client.authorizer.as_ref().unwrap();
    let listing = authorizer
        .execute(ApiRequest::get("/api/pokemon/?limit=12"))
        .await
        .unwrap();

    assert_eq!(listing.status, 200);
    assert_eq!(server.stub.seen_at("/authtoken").len(), 1);
    assert_eq!(server.stub.seen_at("/api/pokemon/")[0].authorization, None);
}

#[tokio::test]
async fn rejected_refresh_logs_out() {
    let server = TestServer::spawn().await;
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("tokenwarden.auth.json"),
        json!({ "access": "OLD", "refresh": "R-OLD" }).to_string(),
    )
    .unwrap();

    let client = Client::try_new(&server.settings(dir.path())).await.unwrap();
    client.auth_service.rehydrate_from_storage().await.unwrap();
    client.wait_for_revalidation().await;

    assert!(!client.auth_service.is_authenticated());
    assert!(!dir.path().join("tokenwarden.auth.json").exists());
    let result = client.auth_service.fetch_current_user().await;
    assert!(matches!(result, Err(AuthError::SessionExpired)));
}

#[tokio::test]
async fn every_request_carries_a_fresh_request_id() {
    let server = TestServer::spawn().await;
    let dir = tempfile::tempdir().unwrap();
    let client = Client::try_new(&server.settings(dir.path())).await.unwrap();
    client.auth_service.login(trainer_login()).await.unwrap();
    client.auth_service.fetch_current_user().await.unwrap();

    let seen = server.stub.seen.lock().unwrap().clone();
    let ids: Vec<String> = seen.iter().filter_map(|s| s.request_id.clone()).collect();
    assert_eq!(ids.len(), seen.len());
    assert!(ids.iter().all(|id| id.len() == 32 && id.chars().all(|c| c.is_ascii_hexdigit())));
    assert_eq!(ids.iter().collect::<HashSet<_>>().len(), ids.len());
}

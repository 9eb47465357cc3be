use crate::application_port::*;
use crate::domain_model::*;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::sync::Mutex;

#[derive(Debug, Default)]
pub struct FakeAuthService {
    session: Mutex<Option<Session>>,
}

impl FakeAuthService {
    pub fn new() -> Self {
        Self::default()
    }

    fn current(&self) -> Option<Session> {
        match self.session.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn replace(&self, next: Option<Session>) {
        match self.session.lock() {
            Ok(mut guard) => *guard = next,
            Err(poisoned) => *poisoned.into_inner() = next,
        }
    }
}

// Minimal fake for UI development: any non-empty password logs in, and a user
// named "admin" is staff. Extend with configurable failures when needed.
#[async_trait::async_trait]
impl AuthService for FakeAuthService {
    fn is_authenticated(&self) -> bool {
        self.current().is_some()
    }

    fn is_admin(&self) -> bool {
        self.current()
            .and_then(|s| s.profile)
            .is_some_and(|p| p.is_staff)
    }

    fn current_user(&self) -> Option<Profile> {
        self.current().and_then(|s| s.profile)
    }

    async fn rehydrate_from_storage(&self) -> Result<Option<Session>, AuthError> {
        Ok(self.current())
    }

    async fn login(&self, request: LoginInput) -> Result<Profile, AuthError> {
        if request.password.is_empty() {
            self.replace(None);
            return Err(AuthError::InvalidCredentials(
                "No active account found with the given credentials".to_string(),
            ));
        }
        let profile = get_fake_profile(&request.username);
        let session = Session::new(
            AccessToken(format!("fake-access-token:{}", request.username)),
            RefreshToken(format!("fake-refresh-token:{}", request.username)),
            Some(profile.clone()),
        );
        self.replace(session);
        Ok(profile)
    }

    async fn logout(&self) {
        self.replace(None);
    }

    async fn register(&self, request: RegisterInput) -> Result<RegisteredUser, AuthError> {
        if let Some(confirm) = &request.password_confirm {
            if confirm != &request.password {
                return Err(mismatch("password_confirm"));
            }
        }
        Ok(RegisteredUser {
            id: get_fake_id(&request.username),
            username: request.username,
            email: request.email,
        })
    }

    async fn change_password(&self, request: ChangePasswordInput) -> Result<String, AuthError> {
        if !self.is_authenticated() {
            return Err(AuthError::Unauthorized);
        }
        if request.new_password != request.new_password_confirm {
            return Err(mismatch("new_password_confirm"));
        }
        Ok("Password changed.".to_string())
    }

    async fn fetch_current_user(&self) -> Result<Profile, AuthError> {
        self.current_user().ok_or(AuthError::Unauthorized)
    }
}

fn mismatch(field: &str) -> AuthError {
    AuthError::Validation(FieldErrors(BTreeMap::from([(
        field.to_string(),
        vec!["Passwords do not match.".to_string()],
    )])))
}

fn get_fake_id(username: &str) -> UserId {
    // FNV-1a, stable across runs
    let hash = username
        .bytes()
        .fold(0xcbf2_9ce4_8422_2325_u64, |h, b| {
            (h ^ u64::from(b)).wrapping_mul(0x0100_0000_01b3)
        });
    UserId(hash % 1_000_000)
}

fn get_fake_profile(username: &str) -> Profile {
    Profile {
        id: get_fake_id(username),
        username: username.to_string(),
        email: Some(format!("{}@example.com", username)),
        is_staff: username == "admin",
        date_joined: DateTime::<Utc>::UNIX_EPOCH,
    }
}

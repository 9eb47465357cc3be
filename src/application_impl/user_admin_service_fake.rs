use crate::application_port::*;
use crate::domain_model::*;
use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::Mutex;

/// In-memory user directory seeded with a single staff account.
#[derive(Debug)]
pub struct FakeUserAdminService {
    users: Mutex<BTreeMap<UserId, AdminUser>>,
}

impl FakeUserAdminService {
    pub fn new() -> Self {
        let admin = AdminUser {
            id: UserId(1),
            username: "admin".to_string(),
            email: Some("admin@example.com".to_string()),
            is_staff: true,
            is_active: true,
            date_joined: Utc::now(),
        };
        Self {
            users: Mutex::new(BTreeMap::from([(admin.id, admin)])),
        }
    }

    fn with_users<R>(&self, f: impl FnOnce(&mut BTreeMap<UserId, AdminUser>) -> R) -> R {
        match self.users.lock() {
            Ok(mut guard) => f(&mut guard),
            Err(poisoned) => f(&mut poisoned.into_inner()),
        }
    }
}

impl Default for FakeUserAdminService {
    fn default() -> Self {
        Self::new()
    }
}

fn not_found(user_id: UserId) -> AuthError {
    AuthError::Api {
        status: 404,
        detail: Some(format!("user {} not found", user_id)),
    }
}

fn invalid(field: &str, message: &str) -> AuthError {
    AuthError::Validation(FieldErrors(BTreeMap::from([(
        field.to_string(),
        vec![message.to_string()],
    )])))
}

#[async_trait::async_trait]
impl UserAdminService for FakeUserAdminService {
    async fn list_users(&self) -> Result<Vec<AdminUser>, AuthError> {
        Ok(self.with_users(|users| users.values().cloned().collect()))
    }

    async fn create_user(&self, request: CreateUserInput) -> Result<AdminUser, AuthError> {
        self.with_users(|users| -> Result<AdminUser, AuthError> {
            if users.values().any(|u| u.username == request.username) {
                return Err(invalid(
                    "username",
                    "A user with that username already exists.",
                ));
            }
            let id = users.keys().next_back().map_or(UserId(1), |id| UserId(id.0 + 1));
            let user = AdminUser {
                id,
                username: request.username,
                email: request.email,
                is_staff: request.is_staff,
                is_active: request.is_active,
                date_joined: Utc::now(),
            };
            users.insert(id, user.clone());
            Ok(user)
        })
    }

    async fn update_user(
        &self,
        user_id: UserId,
        request: UpdateUserInput,
    ) -> Result<AdminUser, AuthError> {
        self.with_users(|users| -> Result<AdminUser, AuthError> {
            let user = users.get_mut(&user_id).ok_or_else(|| not_found(user_id))?;
            if let Some(username) = request.username {
                user.username = username;
            }
            if let Some(email) = request.email {
                user.email = Some(email);
            }
            if let Some(is_staff) = request.is_staff {
                user.is_staff = is_staff;
            }
            if let Some(is_active) = request.is_active {
                user.is_active = is_active;
            }
            Ok(user.clone())
        })
    }

    async fn delete_user(&self, user_id: UserId) -> Result<(), AuthError> {
        self.with_users(|users| -> Result<(), AuthError> {
            let user = users.get(&user_id).ok_or_else(|| not_found(user_id))?;
            let staff = users.values().filter(|u| u.is_staff).count();
            if user.is_staff && staff == 1 {
                return Err(invalid("detail", "Cannot delete the last staff account."));
            }
            users.remove(&user_id);
            Ok(())
        })
    }

    async fn reset_password(
        &self,
        user_id: UserId,
        request: ResetPasswordInput,
    ) -> Result<String, AuthError> {
        if request.new_password != request.new_password_confirm {
            return Err(invalid("new_password_confirm", "Passwords do not match."));
        }
        self.with_users(|users| -> Result<String, AuthError> {
            let user = users.get(&user_id).ok_or_else(|| not_found(user_id))?;
            Ok(format!("Password reset for {}.", user.username))
        })
    }
}

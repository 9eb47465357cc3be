use serde::Deserialize;

/// Paths of the identity service endpoints, relative to its base url.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct IdentityPaths {
    pub token: String,
    pub refresh: String,
    pub profile: String,
    pub register: String,
    pub change_password: String,
    pub users: String,
    pub health: String,
}

impl Default for IdentityPaths {
    fn default() -> Self {
        Self {
            token: "/authtoken".to_string(),
            refresh: "/authtokenrefresh".to_string(),
            profile: "/auth/me/".to_string(),
            register: "/auth/register/".to_string(),
            change_password: "/auth/password/change/".to_string(),
            users: "/auth/users/".to_string(),
            health: "/health/".to_string(),
        }
    }
}

impl IdentityPaths {
    pub fn user(&self, id: impl std::fmt::Display) -> String {
        format!("{}/{}/", self.users.trim_end_matches('/'), id)
    }

    pub fn user_reset_password(&self, id: impl std::fmt::Display) -> String {
        format!("{}reset-password/", self.user(id))
    }
}

/// Endpoints that are reachable without credentials. Requests to them are
/// never decorated and their failures never trigger a refresh.
#[derive(Debug, Clone, Default)]
pub struct PublicEndpoints {
    exact: Vec<String>,
    prefixes: Vec<String>,
}

impl PublicEndpoints {
    pub fn new(exact: Vec<String>, prefixes: Vec<String>) -> Self {
        Self { exact, prefixes }
    }

    /// The token, refresh, registration and health endpoints are always public,
    /// on top of the configured lists.
    pub fn for_paths(paths: &IdentityPaths, exact: Vec<String>, prefixes: Vec<String>) -> Self {
        let mut endpoints = Self::new(exact, prefixes);
        for path in [&paths.token, &paths.refresh, &paths.register, &paths.health] {
            if !endpoints.exact.contains(path) {
                endpoints.exact.push(path.clone());
            }
        }
        endpoints
    }

    pub fn is_public(&self, route: &str) -> bool {
        self.exact.iter().any(|p| p == route)
            || self
                .prefixes
                .iter()
                .any(|p| !p.is_empty() && route.starts_with(p.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_endpoints_are_always_public() {
        let public = PublicEndpoints::for_paths(
            &IdentityPaths::default(),
            vec!["/".to_string()],
            vec!["/api/pokemon/".to_string()],
        );

        assert!(public.is_public("/authtoken"));
        assert!(public.is_public("/authtokenrefresh"));
        assert!(public.is_public("/auth/register/"));
        assert!(public.is_public("/health/"));
        assert!(public.is_public("/"));
        assert!(public.is_public("/api/pokemon/"));
        assert!(public.is_public("/api/pokemon/25/"));

        assert!(!public.is_public("/auth/me/"));
        assert!(!public.is_public("/auth/users/"));
        assert!(!public.is_public("/api/favorites/"));
    }

    #[test]
    fn user_paths() {
        let paths = IdentityPaths::default();
        assert_eq!(paths.user(3), "/auth/users/3/");
        assert_eq!(paths.user_reset_password(3), "/auth/users/3/reset-password/");
    }
}

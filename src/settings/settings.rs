use crate::domain_model::IdentityPaths;
use anyhow::{Result, anyhow};
use config::{Config, File};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub identity: Identity,
    pub storage: Storage,
    #[serde(default)]
    pub authorizer: Authorizer,
    pub log: Log,
}

#[derive(Debug, Deserialize)]
pub struct Identity {
    pub backend: String, // "fake" or "real"
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub paths: IdentityPaths,
}

#[derive(Debug, Deserialize)]
pub struct Storage {
    pub backend: String, // "memory", "file" or "redis"
    #[serde(default = "default_storage_key")]
    pub key: String,
    #[serde(default = "default_legacy_keys")]
    pub legacy_keys: Vec<String>,
    pub dir: Option<String>,
    pub redis_url: Option<String>,
    #[serde(default = "default_redis_prefix")]
    pub prefix: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct Authorizer {
    #[serde(default)]
    pub public_paths: Vec<String>,
    #[serde(default)]
    pub public_prefixes: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct Log {
    pub filter: String,
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_storage_key() -> String {
    "tokenwarden.auth".to_string()
}

fn default_legacy_keys() -> Vec<String> {
    vec!["tokenwarden-auth".to_string()]
}

fn default_redis_prefix() -> String {
    "tokenwarden".to_string()
}

#[cfg(debug_assertions)]
const SETTINGS_PATH: &str = "settings/dev.toml";
#[cfg(not(debug_assertions))]
const SETTINGS_PATH: &str = "settings/release.toml";

pub fn parse_settings(path: Option<&str>) -> Result<Settings> {
    let path = path.unwrap_or(SETTINGS_PATH);

    let settings: Settings = Config::builder()
        .add_source(File::with_name(path))
        .build()
        .map_err(|e| anyhow!(e))?
        .try_deserialize()
        .map_err(|e| anyhow!(e))?;

    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::FileFormat;

    fn parse_str(toml: &str) -> Settings {
        Config::builder()
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn minimal_file_gets_defaults() {
        let settings = parse_str(
            r#"
            [identity]
            backend = "real"
            base_url = "http://localhost:8000"

            [storage]
            backend = "memory"

            [log]
            filter = "info"
            "#,
        );

        assert_eq!(settings.identity.timeout_secs, 10);
        assert_eq!(settings.identity.paths.token, "/authtoken");
        assert_eq!(settings.storage.key, "tokenwarden.auth");
        assert_eq!(settings.storage.legacy_keys, vec!["tokenwarden-auth"]);
        assert!(settings.authorizer.public_prefixes.is_empty());
    }

    #[test]
    fn overrides_individual_paths() {
        let settings = parse_str(
            r#"
            [identity]
            backend = "real"
            base_url = "http://localhost:8000"
            paths = { profile = "/users/me/" }

            [storage]
            backend = "file"
            dir = "/tmp/tokenwarden"

            [authorizer]
            public_prefixes = ["/api/pokemon/"]

            [log]
            filter = "debug"
            "#,
        );

        assert_eq!(settings.identity.paths.profile, "/users/me/");
        assert_eq!(settings.identity.paths.refresh, "/authtokenrefresh");
        assert_eq!(settings.storage.dir.as_deref(), Some("/tmp/tokenwarden"));
        assert_eq!(settings.authorizer.public_prefixes, vec!["/api/pokemon/"]);
    }

    #[test]
    fn bundled_settings_parse() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/settings/dev.toml");
        let settings = parse_settings(Some(path)).unwrap();

        assert_eq!(settings.identity.backend, "real");
        assert_eq!(settings.identity.base_url, "http://localhost:8000");
        assert_eq!(settings.authorizer.public_prefixes, vec!["/api/pokemon/".to_string()]);
    }
}

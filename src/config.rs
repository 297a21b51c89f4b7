//! Gate configuration: JSON file, environment overrides, defaults.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::errors::GateError;
use crate::routes::{RouteTable, LOGIN_ROUTE, SET_PASSWORD_ROUTE, SIGNUP_ROUTE, UPGRADE_ROUTE};
use crate::storage::{FileTokenStore, DEFAULT_TOKEN_KEY};
use crate::structs::client::{ClientOptions, DEFAULT_API_BASE_URL, DEFAULT_REQUEST_TIMEOUT};

pub const ENV_API_URL: &str = "SUBSCRIPTION_GATE_API_URL";
pub const ENV_PORTAL_URL: &str = "SUBSCRIPTION_GATE_PORTAL_URL";
pub const ENV_TIMEOUT_SECS: &str = "SUBSCRIPTION_GATE_TIMEOUT_SECS";
pub const ENV_DEBUG: &str = "SUBSCRIPTION_GATE_DEBUG";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GateOptions {
    /// Base URL of the platform API serving `/api/client/me`.
    pub api_base_url: String,
    /// Base URL of the client portal, used when redirects open a browser.
    pub portal_base_url: String,
    /// Storage key holding the bearer token.
    pub token_key: String,
    pub login_route: String,
    pub upgrade_route: String,
    /// Public route prefixes on top of login, upgrade, signup and set-password,
    /// which are always public.
    pub public_routes: Vec<String>,
    pub request_timeout_secs: u64,
    pub debug: bool,
}

impl Default for GateOptions {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            portal_base_url: DEFAULT_API_BASE_URL.to_string(),
            token_key: DEFAULT_TOKEN_KEY.to_string(),
            login_route: LOGIN_ROUTE.to_string(),
            upgrade_route: UPGRADE_ROUTE.to_string(),
            public_routes: Vec::new(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT.as_secs(),
            debug: false,
        }
    }
}

impl GateOptions {
    pub fn from_json_str(json: &str) -> Result<Self, GateError> {
        let options: Self =
            serde_json::from_str(json).map_err(|err| GateError::InvalidConfig(err.to_string()))?;
        options.validate()?;
        Ok(options)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, GateError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .map_err(|err| GateError::InvalidConfig(format!("{}: {}", path.display(), err)))?;
        Self::from_json_str(&contents)
    }

    /// Applies `SUBSCRIPTION_GATE_*` environment variables on top of `self`.
    pub fn with_env_overrides(self) -> Result<Self, GateError> {
        self.with_overrides(|name| std::env::var(name).ok())
    }

    fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self, GateError> {
        if let Some(url) = lookup(ENV_API_URL) {
            self.api_base_url = url;
        }
        if let Some(url) = lookup(ENV_PORTAL_URL) {
            self.portal_base_url = url;
        }
        if let Some(secs) = lookup(ENV_TIMEOUT_SECS) {
            self.request_timeout_secs = secs.trim().parse().map_err(|_| {
                GateError::InvalidConfig(format!("{} must be a whole number of seconds", ENV_TIMEOUT_SECS))
            })?;
        }
        if let Some(flag) = lookup(ENV_DEBUG) {
            self.debug = matches!(flag.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on");
        }

        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<(), GateError> {
        if self.request_timeout_secs == 0 {
            return Err(GateError::InvalidConfig(
                "request_timeout_secs must be greater than zero".to_string(),
            ));
        }
        if self.token_key.trim().is_empty() {
            return Err(GateError::InvalidConfig("token_key must not be empty".to_string()));
        }
        if self.login_route.trim().is_empty() || self.upgrade_route.trim().is_empty() {
            return Err(GateError::InvalidConfig(
                "login_route and upgrade_route must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn route_table(&self) -> RouteTable {
        let base = RouteTable::new(&self.login_route, &self.upgrade_route)
            .public(SIGNUP_ROUTE)
            .public(SET_PASSWORD_ROUTE);

        self.public_routes
            .iter()
            .fold(base, |routes, prefix| routes.public(prefix))
    }

    /// Token store reading `token_key` from the JSON storage file at `path`.
    pub fn file_token_store(&self, path: impl AsRef<Path>) -> FileTokenStore {
        FileTokenStore::new(path, self.token_key.clone())
    }

    pub fn client_options(&self) -> ClientOptions {
        ClientOptions {
            base_url: self.api_base_url.clone(),
            timeout: self.request_timeout(),
            use_system_proxy: true,
            debug: self.debug,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gate::TokenStore;
    use std::collections::HashMap;

    #[test]
    fn defaults_match_client_portal() {
        let options = GateOptions::default();
        assert_eq!(options.route_table(), RouteTable::client_portal());
        assert_eq!(options.request_timeout(), Duration::from_secs(10));
        assert_eq!(options.token_key, "client_token");
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let options = GateOptions::from_json_str(
            r#"{ "api_base_url": "https://api.example.com", "public_routes": ["/client/demo"] }"#,
        )
        .unwrap();

        assert_eq!(options.api_base_url, "https://api.example.com");
        assert_eq!(options.login_route, LOGIN_ROUTE);

        let routes = options.route_table();
        assert!(routes.is_public("/client/demo/call"));
        assert!(routes.is_public("/client/signup"));
        assert!(routes.is_public("/client/set-password/abc"));
        assert!(!routes.is_public("/client/dashboard"));
    }

    #[test]
    fn empty_public_routes_keep_the_signup_flow_public() {
        let options = GateOptions::from_json_str(
            r#"{ "login_route": "/portal/sign-in", "public_routes": [] }"#,
        )
        .unwrap();

        let routes = options.route_table();
        assert!(routes.is_public("/portal/sign-in"));
        assert!(routes.is_public("/client/signup"));
        assert!(routes.is_public("/client/set-password"));
        assert!(!routes.is_public("/client/login"));
    }

    #[test]
    fn rejects_bad_json() {
        assert!(matches!(
            GateOptions::from_json_str(r#"{ "request_timeout": 5 }"#),
            Err(GateError::InvalidConfig(_))
        ));
        assert!(matches!(
            GateOptions::from_json_str(r#"{ "request_timeout_secs": 0 }"#),
            Err(GateError::InvalidConfig(_))
        ));
    }

    #[test]
    fn env_overrides() {
        let vars: HashMap<&str, &str> = [
            (ENV_API_URL, "https://api.example.com"),
            (ENV_TIMEOUT_SECS, " 3 "),
            (ENV_DEBUG, "TRUE"),
        ]
        .into_iter()
        .collect();

        let options = GateOptions::default()
            .with_overrides(|name| vars.get(name).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(options.api_base_url, "https://api.example.com");
        assert_eq!(options.portal_base_url, DEFAULT_API_BASE_URL);
        assert_eq!(options.request_timeout_secs, 3);
        assert!(options.debug);
        assert!(options.client_options().debug);

        let bad = GateOptions::default().with_overrides(|name| {
            (name == ENV_TIMEOUT_SECS).then(|| "soon".to_string())
        });
        assert!(matches!(bad, Err(GateError::InvalidConfig(_))));
    }

    #[test]
    fn reads_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gate.json");
        std::fs::write(&path, r#"{ "debug": true, "token_key": "portal_token" }"#).unwrap();

        let options = GateOptions::from_json_file(&path).unwrap();
        assert!(options.debug);
        assert_eq!(options.token_key, "portal_token");

        assert!(GateOptions::from_json_file(dir.path().join("missing.json")).is_err());

        let storage = dir.path().join("storage.json");
        std::fs::write(&storage, r#"{ "client_token": "a", "portal_token": "b" }"#).unwrap();
        assert_eq!(options.file_token_store(&storage).token().as_deref(), Some("b"));
    }
}

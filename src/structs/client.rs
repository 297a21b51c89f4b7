use super::account::{ClientAccount, MeResponse};
use crate::errors::GateError;
use crate::gate::AccountApi;
use reqwest::header::{ACCEPT, AUTHORIZATION};
use reqwest::{StatusCode, Url};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:3000";
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
pub const ME_PATH: &str = "/api/client/me";

/// Account API client. Used to look up the signed-in client's subscription.
#[derive(Debug, Clone)]
pub struct Client {
    /// Base URL of the platform API, e.g. `https://app.example.com`.
    pub base_url: Url,
    /// Whether the client should print debug statements.
    pub debug: bool,
    http: reqwest::blocking::Client,
}

/// Client options. Pass this into `Client::new()`.
#[derive(Debug, Clone)]
pub struct ClientOptions {
    pub base_url: String,
    /// Upper bound for a single request, connect included.
    pub timeout: Duration,
    /// Honour `HTTP_PROXY` and friends from the environment.
    pub use_system_proxy: bool,
    pub debug: bool,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE_URL.to_string(),
            timeout: DEFAULT_REQUEST_TIMEOUT,
            use_system_proxy: true,
            debug: false,
        }
    }
}

impl Client {
    /// Creates a new account API client.
    pub fn new(options: ClientOptions) -> Result<Self, GateError> {
        let base_url = Url::parse(options.base_url.trim_end_matches('/'))
            .or(Err(GateError::InvalidBaseUrl(options.base_url.clone())))?;

        if !matches!(base_url.scheme(), "http" | "https") || base_url.cannot_be_a_base() {
            return Err(GateError::InvalidBaseUrl(options.base_url));
        }

        let mut builder = reqwest::blocking::Client::builder()
            .timeout(options.timeout)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")));

        if !options.use_system_proxy {
            builder = builder.no_proxy();
        }

        let http = builder.build().or(Err(GateError::RequestFailed))?;

        Ok(Self {
            base_url,
            debug: options.debug,
            http,
        })
    }

    /// Fetches the account record behind `token`.
    pub fn me(&self, token: &str) -> Result<ClientAccount, GateError> {
        let response = self.api_call::<MeResponse>(ME_PATH, token)?;
        Ok(response.client)
    }

    /// Authenticated GET against the platform API.
    pub fn api_call<T: DeserializeOwned>(&self, path: &str, token: &str) -> Result<T, GateError> {
        // Append a / to path if it does not start with one
        let path = if path.starts_with('/') {
            path.to_string()
        } else {
            format!("/{}", path)
        };

        let url = Url::parse(&format!("{}{}", self.base_url.as_str().trim_end_matches('/'), path))
            .or(Err(GateError::RequestFailed))?;

        debug!(%url, "account api request");

        let response = self
            .http
            .get(url)
            .header(AUTHORIZATION, format!("Bearer {}", token))
            .header(ACCEPT, "application/json")
            .send()
            .map_err(|err| {
                if err.is_timeout() {
                    GateError::Timeout
                } else {
                    GateError::RequestFailed
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            debug!(status = status.as_u16(), "account api rejected request");
            crate::console::status(self.debug, &format!("Account API returned {}.", status));
            return Err(match status {
                StatusCode::BAD_REQUEST => GateError::BadRequest,
                StatusCode::UNAUTHORIZED => GateError::Unauthorized,
                StatusCode::FORBIDDEN => GateError::Forbidden,
                StatusCode::NOT_FOUND => GateError::NotFound,
                StatusCode::TOO_MANY_REQUESTS => GateError::RateLimited,
                StatusCode::SERVICE_UNAVAILABLE => GateError::ServiceUnavailable,
                other => GateError::ServerError(other.as_u16()),
            });
        }

        response.json::<T>().map_err(|err| {
            if err.is_timeout() {
                GateError::Timeout
            } else {
                GateError::FailedToDecode
            }
        })
    }
}

impl AccountApi for Client {
    fn fetch_account(&self, token: &str) -> Result<ClientAccount, GateError> {
        self.me(token)
    }
}

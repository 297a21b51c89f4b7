use thiserror::Error;

/// Subscription gate errors.
#[derive(Debug, Error)]
pub enum GateError {
    /// The API base URL could not be parsed or is not http(s).
    #[error("Invalid API base URL: {0}")]
    InvalidBaseUrl(String),

    /// The gate configuration could not be read or parsed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// No bearer token is stored for the viewer.
    #[error("No bearer token found.")]
    MissingToken,

    /// Failed to send a request to the account API.
    #[error("Failed to send a request to the account API.")]
    RequestFailed,

    /// The account API did not answer within the configured timeout.
    #[error("The account API request timed out.")]
    Timeout,

    /// Failed to decode the account API response.
    #[error("Failed to decode account API response.")]
    FailedToDecode,

    /// The account API returned a 400: Bad Request status code.
    #[error("Bad request.")]
    BadRequest,
    /// The account API returned a 401: Unauthorized status code.
    /// This means the bearer token is invalid or expired.
    #[error("The bearer token is not authorized.")]
    Unauthorized,
    /// The account API returned a 403: Forbidden status code.
    #[error("Access to the account is forbidden.")]
    Forbidden,
    /// The account API returned a 404: Not Found status code.
    #[error("Account not found.")]
    NotFound,
    /// The account API returned a 429: Too Many Requests status code.
    #[error("You are being rate limited.")]
    RateLimited,
    /// The account API returned a 503: Service Unavailable status code.
    #[error("The account API is unavailable.")]
    ServiceUnavailable,
    /// Any other non-success status code.
    #[error("Server error (status {0}).")]
    ServerError(u16),

    /// The navigator could not perform a redirect.
    #[error("Failed to redirect to {0}.")]
    NavigationFailed(String),
}

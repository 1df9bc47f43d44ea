//! Error types for the signed request pipeline.
//!
//! The public accessors on [`RestApiClient`](crate::api::RestApiClient)
//! collapse every failure to an absent result. Internally each failure keeps
//! its cause so the coordinator, its logs, and its tests can tell them apart.

use thiserror::Error;

/// Length, in bytes, of a decoded REST API secret.
pub const REST_API_SECRET_LENGTH: usize = 56;

/// Errors raised while assigning client configuration.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The secret did not decode to exactly [`REST_API_SECRET_LENGTH`] bytes.
    #[error("REST API secret must be {REST_API_SECRET_LENGTH} bytes, got {got}")]
    InvalidSecretLength {
        /// Number of bytes the supplied secret decoded to.
        got: usize,
    },

    /// The secret was flagged as base-64 but could not be decoded.
    #[error("REST API secret is not valid base-64: {0}")]
    InvalidSecretEncoding(String),

    /// The base URL could not be parsed.
    #[error("Invalid base URL: {0}")]
    InvalidBaseUrl(#[from] url::ParseError),

    /// The underlying HTTP client could not be built.
    #[error("HTTP client initialization failed: {0}")]
    HttpClient(String),
}

/// Classified failure of a single logical request.
///
/// # Error Categories
///
/// - **Transport**: [`Transport`](RequestError::Transport), no response was
///   obtained at all (status 0)
/// - **Authentication**: [`Unauthorized`](RequestError::Unauthorized), a 401
///   that survived the single clock resync
/// - **Server**: [`Status`](RequestError::Status), any other non-200 status
/// - **Application**: [`Application`](RequestError::Application), a 200 whose
///   body reports a status other than `"OK"` or lacks an expected field
/// - **Decode**: [`Decode`](RequestError::Decode), a 200 body that is not the
///   expected JSON
#[derive(Debug, Error)]
pub enum RequestError {
    /// The request could not be serialized or signed.
    #[error("Request encoding failed: {0}")]
    Encode(#[source] serde_json::Error),

    /// The HMAC could not be keyed.
    #[error("Request signing failed: {0}")]
    Signing(String),

    /// No HTTP response was obtained (DNS, connect, TLS or timeout failure).
    #[error("Transport failure on {route}")]
    Transport {
        /// Route the request was posted to.
        route: String,
    },

    /// The server rejected the request signature.
    ///
    /// Either the credentials are wrong or the clock is still skewed after
    /// one resync; the two cannot be told apart from the response.
    #[error("Unauthorized on {route}")]
    Unauthorized {
        /// Route the request was posted to.
        route: String,
    },

    /// The server answered with a status other than 200 or 401.
    #[error("Server returned {status} on {route}")]
    Status {
        /// Route the request was posted to.
        route: String,
        /// HTTP status code of the final response.
        status: u16,
    },

    /// The response was well formed but reported a failure.
    #[error("Application error: {0}")]
    Application(String),

    /// The 200 response body could not be decoded.
    #[error("Response decode failed: {0}")]
    Decode(#[source] serde_json::Error),
}

impl RequestError {
    /// Returns `true` for failures where no response was received.
    pub fn is_transport(&self) -> bool {
        matches!(self, RequestError::Transport { .. })
    }
}

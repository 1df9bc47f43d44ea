//! Signed transport for the Speed Sentry REST API.
//!
//! # Architecture
//!
//! - [`signer`] - time-bucketed HMAC-SHA256 over the JSON request body
//! - [`Transport`] / [`HttpTransport`] - a single blocking POST, reporting
//!   "no response" as status 0 instead of an error
//! - [`ClockSync`] - unsigned `/td/` exchange that re-learns the server's
//!   clock offset
//! - [`RequestCoordinator`] - signs, posts and, on a 401, resyncs the clock
//!   and retries exactly once
//!
//! Every call blocks the calling thread. The per-request timeout bounds each
//! HTTP exchange separately, so one logical call can take up to three
//! timeouts (request, resync, retry).
//!
//! # Example
//!
//! ```rust,no_run
//! use serde_json::json;
//! use speed_sentry::http::{RequestCoordinator, RestApiSecret};
//!
//! # fn example() -> Result<(), anyhow::Error> {
//! let secret = RestApiSecret::from_base64("...")?;
//! let coordinator = RequestCoordinator::new("customer-id", secret)?;
//! let reply = coordinator.send_json(&json!({"monitor_id": 12}), "/v1/monitors/get")?;
//! println!("{}", reply["status"]);
//! # Ok(())
//! # }
//! ```

mod clock;
mod clock_sync;
mod coordinator;
mod error;
pub mod signer;
mod transport;

#[cfg(test)]
pub(crate) mod testing;

pub use clock::{Clock, FixedClock, SystemClock};
pub use clock_sync::{ClockDelta, ClockDeltaSink, ClockSync, NoopSink, TIME_DELTA_KEY, TIME_DELTA_ROUTE};
pub use coordinator::{BinaryResponse, DEFAULT_TIMEOUT, RequestCoordinator};
pub use error::{ConfigError, REST_API_SECRET_LENGTH, RequestError};
pub use signer::{RestApiSecret, Signature, SignedEnvelope};
pub use transport::{CLIENT_NAME, DEFAULT_AUTHORITY, HttpTransport, Transport, TransportResult, user_agent};

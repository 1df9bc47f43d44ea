//! Signed request dispatch with one-shot clock resynchronization.
//!
//! A logical request moves through `Sent`, then either finishes or, on a 401,
//! runs one [`ClockSync`] and is signed and sent exactly once more. The
//! second answer is final whatever it is, so a call costs at most three
//! round trips.

use std::fmt;
use std::time::Duration;

use log::{debug, warn};
use serde::Serialize;
use serde_json::Value;

use super::clock::{Clock, SystemClock};
use super::clock_sync::{ClockDelta, ClockDeltaSink, ClockSync};
use super::error::{ConfigError, RequestError};
use super::signer::{self, RestApiSecret, SignedEnvelope};
use super::transport::{self, HttpTransport, Transport, TransportResult};
use crate::logging::mask_string;

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(20);

const STATUS_OK: u16 = 200;
const STATUS_UNAUTHORIZED: u16 = 401;

/// Raw body and content type of a binary route such as the latency plot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryResponse {
    pub body: Vec<u8>,
    pub content_type: String,
}

impl BinaryResponse {
    /// `true` when the server sent an image rather than a JSON error body.
    pub fn is_image(&self) -> bool {
        self.content_type.starts_with("image/")
    }
}

/// Orchestrates signing, transport and clock resynchronization.
pub struct RequestCoordinator {
    transport: Box<dyn Transport>,
    clock: Box<dyn Clock>,
    customer_identifier: String,
    secret: RestApiSecret,
    timeout: Duration,
    clock_delta: ClockDelta,
}

impl RequestCoordinator {
    /// Creates a coordinator talking to the production service.
    pub fn new(customer_identifier: impl Into<String>, secret: RestApiSecret) -> Result<Self, ConfigError> {
        let transport = HttpTransport::with_default_authority()?;
        Ok(Self::with_transport(customer_identifier, secret, transport, SystemClock))
    }

    /// Creates a coordinator with injected transport and clock.
    pub fn with_transport(
        customer_identifier: impl Into<String>,
        secret: RestApiSecret,
        transport: impl Transport + 'static,
        clock: impl Clock + 'static,
    ) -> Self {
        Self {
            transport: Box::new(transport),
            clock: Box::new(clock),
            customer_identifier: customer_identifier.into(),
            secret,
            timeout: DEFAULT_TIMEOUT,
            clock_delta: ClockDelta::default(),
        }
    }

    pub fn customer_identifier(&self) -> &str {
        &self.customer_identifier
    }

    pub fn set_customer_identifier(&mut self, customer_identifier: impl Into<String>) {
        self.customer_identifier = customer_identifier.into();
    }

    pub fn set_secret(&mut self, secret: RestApiSecret) {
        self.secret = secret;
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = timeout;
    }

    pub fn clock_delta(&self) -> &ClockDelta {
        &self.clock_delta
    }

    pub fn set_clock_delta_sink(&self, sink: Option<Box<dyn ClockDeltaSink>>) {
        self.clock_delta.set_sink(sink);
    }

    /// Runs one clock resynchronization against the server.
    pub fn resync(&self) -> bool {
        ClockSync::new(self.transport.as_ref(), self.clock.as_ref()).refresh(
            &self.clock_delta,
            &self.user_agent(),
            self.timeout,
        )
    }

    /// Sends a signed request, retrying once after a resync on 401.
    ///
    /// Returns the final transport result untouched; status 0 is never
    /// retried.
    pub fn exchange<T: Serialize + ?Sized>(&self, message: &T, route: &str) -> Result<TransportResult, RequestError> {
        let first = self.post_signed(message, route)?;
        if first.status_code != STATUS_UNAUTHORIZED {
            return Ok(first);
        }

        debug!(route = route; "Signature rejected, resynchronizing clock");
        if !self.resync() {
            return Ok(first);
        }

        self.post_signed(message, route)
    }

    /// Sends a signed request and decodes a 200 response as JSON.
    pub fn send_json<T: Serialize + ?Sized>(&self, message: &T, route: &str) -> Result<Value, RequestError> {
        let result = self.exchange(message, route)?;
        let body = Self::require_success(result, route)?.body.unwrap_or_default();
        serde_json::from_slice(&body).map_err(|e| {
            warn!(route = route, error:% = e; "Response is not valid JSON");
            RequestError::Decode(e)
        })
    }

    /// Sends a signed request and returns a 200 response body verbatim.
    pub fn send_binary<T: Serialize + ?Sized>(&self, message: &T, route: &str) -> Result<BinaryResponse, RequestError> {
        let result = self.exchange(message, route)?;
        let result = Self::require_success(result, route)?;
        Ok(BinaryResponse {
            body: result.body.unwrap_or_default(),
            content_type: result.content_type.unwrap_or_default(),
        })
    }

    fn post_signed<T: Serialize + ?Sized>(&self, message: &T, route: &str) -> Result<TransportResult, RequestError> {
        let clock_delta = self.clock_delta.get();
        let signature = signer::sign(message, &self.secret, clock_delta, self.clock.unix_time())?;
        let payload = SignedEnvelope::new(&self.customer_identifier, &signature)
            .to_bytes()
            .map_err(RequestError::Encode)?;

        debug!(
            route = route,
            customer:% = mask_string(&self.customer_identifier),
            clock_delta = clock_delta;
            "Posting signed request"
        );
        Ok(self.transport.post(route, &self.user_agent(), &payload, self.timeout))
    }

    fn require_success(result: TransportResult, route: &str) -> Result<TransportResult, RequestError> {
        let route = route.to_string();
        let err = match result.status_code {
            STATUS_OK => return Ok(result),
            0 => RequestError::Transport { route },
            STATUS_UNAUTHORIZED => RequestError::Unauthorized { route },
            status => RequestError::Status { route, status },
        };
        warn!(error:% = err; "Request failed");
        Err(err)
    }

    fn user_agent(&self) -> String {
        transport::user_agent(&self.customer_identifier)
    }
}

impl fmt::Debug for RequestCoordinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestCoordinator")
            .field("customer_identifier", &mask_string(&self.customer_identifier))
            .field("timeout", &self.timeout)
            .field("clock_delta", &self.clock_delta)
            .finish_non_exhaustive()
    }
}

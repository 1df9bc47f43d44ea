//! Clock delta bookkeeping and the `/td/` resynchronization exchange.

use std::fmt;
use std::sync::Mutex;
use std::time::Duration;

use log::{info, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::clock::Clock;
use super::error::RequestError;
use super::transport::Transport;

/// Route returning the server's view of our clock offset.
pub const TIME_DELTA_ROUTE: &str = "/td/";

/// Key handed to the [`ClockDeltaSink`] alongside the new delta.
pub const TIME_DELTA_KEY: &str = "inesonic_rest_time_delta";

/// Receives every clock delta accepted from the server so it can be persisted.
pub trait ClockDeltaSink: Send + Sync {
    fn store(&self, key: &str, value: i64);
}

impl<F> ClockDeltaSink for F
where
    F: Fn(&str, i64) + Send + Sync,
{
    fn store(&self, key: &str, value: i64) {
        self(key, value)
    }
}

/// Sink used when the caller does not persist the delta.
#[derive(Debug, Default)]
pub struct NoopSink;

impl ClockDeltaSink for NoopSink {
    fn store(&self, _key: &str, _value: i64) {}
}

struct DeltaState {
    value: i64,
    sink: Option<Box<dyn ClockDeltaSink>>,
}

/// Server-minus-local clock offset in seconds, with an optional persistence sink.
///
/// Updates coming from the server store the value and notify the sink inside
/// one critical section, so a concurrent reader never observes the sink
/// running ahead of the stored value.
pub struct ClockDelta {
    state: Mutex<DeltaState>,
}

impl ClockDelta {
    pub fn new(initial: i64) -> Self {
        Self {
            state: Mutex::new(DeltaState {
                value: initial,
                sink: None,
            }),
        }
    }

    pub fn get(&self) -> i64 {
        self.lock().value
    }

    /// Seeds the delta, typically from a cached value. The sink is not called.
    pub fn set(&self, value: i64) {
        self.lock().value = value;
    }

    /// Stores a delta reported by the server and notifies the sink.
    pub fn update(&self, value: i64) {
        let mut state = self.lock();
        state.value = value;
        if let Some(sink) = &state.sink {
            sink.store(TIME_DELTA_KEY, value);
        }
    }

    pub fn set_sink(&self, sink: Option<Box<dyn ClockDeltaSink>>) {
        self.lock().sink = sink;
    }

    pub fn has_sink(&self) -> bool {
        self.lock().sink.is_some()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, DeltaState> {
        // The state is a plain scalar, so a poisoned lock still holds a usable value.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for ClockDelta {
    fn default() -> Self {
        Self::new(0)
    }
}

impl fmt::Debug for ClockDelta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.lock();
        f.debug_struct("ClockDelta")
            .field("value", &state.value)
            .field("has_sink", &state.sink.is_some())
            .finish()
    }
}

#[derive(Debug, Serialize)]
struct TimeDeltaRequest {
    timestamp: i64,
}

#[derive(Debug, Deserialize)]
struct TimeDeltaResponse {
    status: Option<String>,
    time_delta: Option<Value>,
}

/// Performs the unsigned clock agreement exchange.
pub struct ClockSync<'a> {
    transport: &'a dyn Transport,
    clock: &'a dyn Clock,
}

impl<'a> ClockSync<'a> {
    pub fn new(transport: &'a dyn Transport, clock: &'a dyn Clock) -> Self {
        Self { transport, clock }
    }

    /// Fetches the server's time delta and stores it in `delta`.
    ///
    /// Returns `false`, leaving `delta` and its sink untouched, on any failure.
    pub fn refresh(&self, delta: &ClockDelta, user_agent: &str, timeout: Duration) -> bool {
        match self.fetch_time_delta(user_agent, timeout) {
            Ok(value) => {
                delta.update(value);
                info!(time_delta = value; "Clock delta updated");
                true
            },
            Err(e) => {
                warn!(error:% = e; "Clock delta refresh failed");
                false
            },
        }
    }

    /// Asks the server for its clock offset relative to ours.
    pub fn fetch_time_delta(&self, user_agent: &str, timeout: Duration) -> Result<i64, RequestError> {
        let request = TimeDeltaRequest {
            timestamp: self.clock.unix_time(),
        };
        let payload = serde_json::to_vec(&request).map_err(RequestError::Encode)?;

        let result = self.transport.post(TIME_DELTA_ROUTE, user_agent, &payload, timeout);
        match result.status_code {
            0 => {
                return Err(RequestError::Transport {
                    route: TIME_DELTA_ROUTE.to_string(),
                });
            },
            200 => {},
            status => {
                return Err(RequestError::Status {
                    route: TIME_DELTA_ROUTE.to_string(),
                    status,
                });
            },
        }

        let body = result.body.unwrap_or_default();
        let response: TimeDeltaResponse = serde_json::from_slice(&body).map_err(RequestError::Decode)?;

        if response.status.as_deref() != Some("OK") {
            return Err(RequestError::Application(format!(
                "time delta status {:?}",
                response.status.unwrap_or_default()
            )));
        }

        // Only a JSON integer is accepted; floats and strings are rejected.
        match response.time_delta {
            Some(Value::Number(n)) if n.is_i64() => n
                .as_i64()
                .ok_or_else(|| RequestError::Application("time_delta out of range".to_string())),
            Some(other) => Err(RequestError::Application(format!("time_delta is not an integer: {}", other))),
            None => Err(RequestError::Application("time_delta missing".to_string())),
        }
    }
}

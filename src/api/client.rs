//! Typed accessors for the Speed Sentry REST API.
//!
//! Every accessor signs its request through the [`RequestCoordinator`] and
//! returns `None` (or `false`) on any failure: transport errors, rejected
//! signatures, non-200 statuses, undecodable bodies and replies whose
//! `status` is not `"OK"` all look the same to the caller. The cause is
//! logged. Callers that need it can go through
//! [`RestApiClient::coordinator`] directly.

use std::time::Duration;

use log::{debug, warn};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value, json};
use url::Url;

use super::routes;
use super::types::{
    Capabilities, LatencyListing, LatencyPlotSettings, MonitorOrder, MonitorSettings, MultipleListing,
};
use crate::http::{
    BinaryResponse, Clock, ClockDeltaSink, ConfigError, HttpTransport, RequestCoordinator, RequestError,
    RestApiSecret, SystemClock, Transport,
};

const STATUS_FIELD: &str = "status";
const STATUS_OK: &str = "OK";

type JsonObject = Map<String, Value>;

/// Client for the Speed Sentry REST API.
///
/// # Example
///
/// ```rust,no_run
/// use speed_sentry::api::RestApiClient;
/// use speed_sentry::http::RestApiSecret;
///
/// # fn example() -> Result<(), anyhow::Error> {
/// let secret = RestApiSecret::from_base64("...")?;
/// let client = RestApiClient::new("customer-id", secret)?;
///
/// match client.events_list(0, 0) {
///     Some(events) => println!("{}", events),
///     None => eprintln!("Could not fetch events"),
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct RestApiClient {
    coordinator: RequestCoordinator,
}

impl RestApiClient {
    /// Creates a client for the production service.
    pub fn new(customer_identifier: impl Into<String>, secret: RestApiSecret) -> Result<Self, ConfigError> {
        Ok(Self {
            coordinator: RequestCoordinator::new(customer_identifier, secret)?,
        })
    }

    /// Creates a client for a service hosted at `base_url`.
    pub fn with_base_url(
        base_url: Url,
        customer_identifier: impl Into<String>,
        secret: RestApiSecret,
    ) -> Result<Self, ConfigError> {
        let transport = HttpTransport::new(base_url)?;
        Ok(Self::with_transport(customer_identifier, secret, transport, SystemClock))
    }

    /// Creates a client with injected transport and clock.
    pub fn with_transport(
        customer_identifier: impl Into<String>,
        secret: RestApiSecret,
        transport: impl Transport + 'static,
        clock: impl Clock + 'static,
    ) -> Self {
        Self {
            coordinator: RequestCoordinator::with_transport(customer_identifier, secret, transport, clock),
        }
    }

    pub fn coordinator(&self) -> &RequestCoordinator {
        &self.coordinator
    }

    pub fn customer_identifier(&self) -> &str {
        self.coordinator.customer_identifier()
    }

    pub fn set_customer_identifier(&mut self, customer_identifier: impl Into<String>) {
        self.coordinator.set_customer_identifier(customer_identifier);
    }

    /// Replaces the REST API secret.
    ///
    /// Returns `false` and keeps the current secret unless `secret` decodes to
    /// exactly 56 bytes.
    pub fn set_rest_api_secret(&mut self, secret: impl AsRef<[u8]>, is_base64_encoded: bool) -> bool {
        match RestApiSecret::parse(secret.as_ref(), is_base64_encoded) {
            Ok(secret) => {
                self.coordinator.set_secret(secret);
                true
            },
            Err(e) => {
                warn!(error:% = e; "Rejected REST API secret");
                false
            },
        }
    }

    pub fn timeout(&self) -> Duration {
        self.coordinator.timeout()
    }

    pub fn set_timeout(&mut self, timeout: Duration) {
        self.coordinator.set_timeout(timeout);
    }

    pub fn time_delta(&self) -> i64 {
        self.coordinator.clock_delta().get()
    }

    /// Seeds the clock delta, e.g. from a value persisted by a sink.
    pub fn set_time_delta(&self, time_delta: i64) {
        self.coordinator.clock_delta().set(time_delta);
    }

    /// Installs a sink that receives every clock delta learned from the server.
    pub fn set_time_delta_sink(&self, sink: impl ClockDeltaSink + 'static) {
        self.coordinator.set_clock_delta_sink(Some(Box::new(sink)));
    }

    pub fn clear_time_delta_sink(&self) {
        self.coordinator.set_clock_delta_sink(None);
    }

    pub fn has_time_delta_sink(&self) -> bool {
        self.coordinator.clock_delta().has_sink()
    }

    /// Forces a clock resynchronization.
    pub fn refresh_time_delta(&self) -> bool {
        self.coordinator.resync()
    }

    pub fn capabilities_get(&self) -> Option<Capabilities> {
        self.fetch_field(routes::CAPABILITIES_GET, &json!([]), "capabilities")
    }

    pub fn hosts_get(&self, host_scheme_id: i64) -> Option<Value> {
        self.fetch_field(routes::HOSTS_GET, &json!({"host_scheme_id": host_scheme_id}), "host_scheme")
    }

    pub fn hosts_list(&self) -> Option<Value> {
        self.fetch_field(routes::HOSTS_LIST, &json!([]), "host_schemes")
    }

    pub fn monitors_get(&self, monitor_id: i64) -> Option<Value> {
        self.fetch_field(routes::MONITORS_GET, &json!({"monitor_id": monitor_id}), "monitor")
    }

    pub fn monitors_list(&self, order_by: MonitorOrder) -> Option<Value> {
        self.fetch_field(routes::MONITORS_LIST, &json!({"order_by": order_by}), "monitors")
    }

    /// Replaces the customer's monitors.
    ///
    /// Returns an empty array on success and the server's `errors` value,
    /// untouched, when the update was refused. `None` means the exchange
    /// itself failed or the refusal carried no errors.
    pub fn monitors_update(&self, monitors: &[MonitorSettings]) -> Option<Value> {
        let mut response = self.respond(routes::MONITORS_UPDATE, monitors)?;
        let status = response.get(STATUS_FIELD)?;
        if status == STATUS_OK {
            return Some(Value::Array(Vec::new()));
        }

        match take_field(&mut response, "errors")? {
            Value::Null => None,
            errors => Some(errors),
        }
    }

    /// Returns the description of a region.
    pub fn regions_get(&self, region_id: i64) -> Option<String> {
        let region: Value = self.fetch_field(routes::REGIONS_GET, &json!({"region_id": region_id}), "region")?;
        region.get("description")?.as_str().map(str::to_string)
    }

    pub fn regions_list(&self) -> Option<Value> {
        self.fetch_field(routes::REGIONS_LIST, &json!([]), "regions")
    }

    pub fn events_get(&self, event_id: i64) -> Option<Value> {
        self.fetch_field(routes::EVENTS_GET, &json!({"event_id": event_id}), "event")
    }

    /// Lists events from `start_timestamp`. An `end_timestamp` of 0 means "now".
    pub fn events_list(&self, start_timestamp: i64, end_timestamp: i64) -> Option<Value> {
        let mut request = JsonObject::new();
        request.insert("start_timestamp".into(), json!(start_timestamp));
        if end_timestamp != 0 {
            request.insert("end_timestamp".into(), json!(end_timestamp));
        }

        self.fetch_field(routes::EVENTS_LIST, &request, "events")
    }

    /// Creates a custom event of type 1 to 10. A `monitor_id` of 0 ties the
    /// event to the first monitor.
    pub fn events_create(&self, event_type: i64, message: &str, monitor_id: i64) -> bool {
        let mut request = JsonObject::new();
        request.insert("type".into(), json!(event_type));
        request.insert("message".into(), json!(message));
        if monitor_id != 0 {
            request.insert("monitor_id".into(), json!(monitor_id));
        }

        self.succeeded(routes::EVENTS_CREATE, &request)
    }

    pub fn status_get(&self, monitor_id: i64) -> Option<Value> {
        self.fetch_field(routes::STATUS_GET, &json!({"monitor_id": monitor_id}), "monitor_status")
    }

    pub fn status_list(&self) -> Option<Value> {
        self.fetch_field(routes::STATUS_LIST, &json!([]), "monitor_status")
    }

    /// Fetches monitors, hosts, events and status in one round trip.
    pub fn multiple_list(&self) -> Option<MultipleListing> {
        let mut response = self.respond_ok(routes::MULTIPLE_LIST, &json!([]))?;
        Some(MultipleListing {
            monitors: take_field(&mut response, "monitors")?,
            authorities: take_field(&mut response, "host_schemes")?,
            events: take_field(&mut response, "events")?,
            status: take_field(&mut response, "monitor_status")?,
        })
    }

    /// Lists latency samples. Zero-valued arguments are left out of the request.
    pub fn latency_list(
        &self,
        monitor_id: i64,
        region_id: i64,
        start_timestamp: i64,
        end_timestamp: i64,
    ) -> Option<LatencyListing> {
        let mut request = JsonObject::new();
        request.insert("start_timestamp".into(), json!(start_timestamp));
        if end_timestamp != 0 {
            request.insert("end_timestamp".into(), json!(end_timestamp));
        }
        if monitor_id != 0 {
            request.insert("monitor_id".into(), json!(monitor_id));
        }
        if region_id != 0 {
            request.insert("region_id".into(), json!(region_id));
        }

        let mut response = self.respond_ok(routes::LATENCY_LIST, &request)?;
        Some(LatencyListing {
            recent: take_field(&mut response, "recent")?,
            aggregated: take_field(&mut response, "aggregated")?,
        })
    }

    /// Renders a latency plot.
    ///
    /// On success the body is the image; when the server could not render it
    /// the body is a JSON error document, see [`BinaryResponse::is_image`].
    pub fn latency_plot(&self, settings: &LatencyPlotSettings) -> Option<BinaryResponse> {
        absent_on_error(
            routes::LATENCY_PLOT,
            self.coordinator.send_binary(settings, routes::LATENCY_PLOT),
        )
    }

    /// Enables or disables maintenance mode.
    pub fn customer_pause(&self, pause: bool) -> bool {
        self.succeeded(routes::CUSTOMER_PAUSE, &json!({"pause": pause}))
    }

    fn respond<R: Serialize + ?Sized>(&self, route: &str, request: &R) -> Option<JsonObject> {
        let response = absent_on_error(route, self.coordinator.send_json(request, route))?;
        match response {
            Value::Object(map) => Some(map),
            _ => {
                warn!(route = route; "Response is not a JSON object");
                None
            },
        }
    }

    fn respond_ok<R: Serialize + ?Sized>(&self, route: &str, request: &R) -> Option<JsonObject> {
        let response = self.respond(route, request)?;
        match response.get(STATUS_FIELD) {
            Some(status) if status == STATUS_OK => Some(response),
            status => {
                warn!(route = route, status:? = status; "Request refused");
                None
            },
        }
    }

    fn succeeded<R: Serialize + ?Sized>(&self, route: &str, request: &R) -> bool {
        self.respond_ok(route, request).is_some()
    }

    fn fetch_field<R: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        route: &str,
        request: &R,
        field: &str,
    ) -> Option<T> {
        let mut response = self.respond_ok(route, request)?;
        let value = take_field(&mut response, field)?;
        serde_json::from_value(value)
            .map_err(|e| warn!(route = route, field = field, error:% = e; "Unexpected field shape"))
            .ok()
    }
}

fn take_field(response: &mut JsonObject, field: &str) -> Option<Value> {
    let value = response.remove(field);
    if value.is_none() {
        debug!(field = field; "Response field missing");
    }
    value
}

fn absent_on_error<T>(route: &str, result: Result<T, RequestError>) -> Option<T> {
    result
        .map_err(|e| debug!(route = route, error:% = e; "Request produced no result"))
        .ok()
}

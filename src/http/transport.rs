//! Single-shot blocking HTTP POST.
//!
//! A [`Transport`] never returns an error: a failed exchange is reported as
//! a [`TransportResult`] with status 0 so the coordinator can treat it as
//! terminal without inspecting error types.

use std::sync::Arc;
use std::time::Duration;

use log::{debug, warn};
use reqwest::blocking::Client;
use reqwest::header::{CONTENT_TYPE, USER_AGENT};
use reqwest::redirect::Policy;
use url::Url;

use super::error::ConfigError;

/// Default service authority.
pub const DEFAULT_AUTHORITY: &str = "https://rest.1.speed-sentry.com";

/// Prefix of the `User-Agent` header; the customer identifier follows it.
pub const CLIENT_NAME: &str = "Rust API";

const MAX_REDIRECTS: usize = 5;

/// Status code, body and content type of one HTTP exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResult {
    /// HTTP status, or 0 when no response was obtained.
    pub status_code: u16,
    pub body: Option<Vec<u8>>,
    /// Lower-cased `Content-Type`, empty when the header was absent.
    pub content_type: Option<String>,
}

impl TransportResult {
    /// The exchange did not complete at all.
    pub fn failed() -> Self {
        Self {
            status_code: 0,
            body: None,
            content_type: None,
        }
    }

    pub fn new(status_code: u16, body: impl Into<Vec<u8>>, content_type: &str) -> Self {
        Self {
            status_code,
            body: Some(body.into()),
            content_type: Some(content_type.to_lowercase()),
        }
    }

    pub fn is_failure(&self) -> bool {
        self.status_code == 0
    }
}

/// Something that can POST a JSON payload to a route on the service.
pub trait Transport: Send + Sync {
    fn post(&self, route: &str, user_agent: &str, payload: &[u8], timeout: Duration) -> TransportResult;
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn post(&self, route: &str, user_agent: &str, payload: &[u8], timeout: Duration) -> TransportResult {
        (**self).post(route, user_agent, payload, timeout)
    }
}

/// Builds the `User-Agent` header value for a customer.
pub fn user_agent(customer_identifier: &str) -> String {
    format!("{} {}", CLIENT_NAME, customer_identifier)
}

/// [`Transport`] backed by a blocking `reqwest` client.
pub struct HttpTransport {
    base_url: Url,
    client: Client,
}

impl HttpTransport {
    pub fn new(base_url: Url) -> Result<Self, ConfigError> {
        let client = Client::builder()
            .redirect(Policy::limited(MAX_REDIRECTS))
            .build()
            .map_err(|e| ConfigError::HttpClient(e.to_string()))?;

        Ok(Self { base_url, client })
    }

    pub fn with_default_authority() -> Result<Self, ConfigError> {
        Self::new(Url::parse(DEFAULT_AUTHORITY)?)
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, route: &str) -> Result<Url, url::ParseError> {
        let base = self.base_url.as_str().trim_end_matches('/');
        Url::parse(&format!("{}{}", base, route))
    }
}

impl Transport for HttpTransport {
    fn post(&self, route: &str, user_agent: &str, payload: &[u8], timeout: Duration) -> TransportResult {
        let url = match self.endpoint(route) {
            Ok(url) => url,
            Err(e) => {
                warn!(route = route, error:% = e; "Could not build request URL");
                return TransportResult::failed();
            },
        };

        // Content-Length is derived from the body by reqwest.
        let request = self
            .client
            .post(url)
            .header(CONTENT_TYPE, "application/json")
            .header(USER_AGENT, user_agent)
            .timeout(timeout)
            .body(payload.to_vec());

        let response = match request.send() {
            Ok(response) => response,
            Err(e) => {
                warn!(route = route, error:% = e; "Request did not complete");
                return TransportResult::failed();
            },
        };

        let status_code = response.status().as_u16();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_lowercase)
            .unwrap_or_default();

        match response.bytes() {
            Ok(body) => {
                debug!(route = route, status = status_code, bytes = body.len(); "Response received");
                TransportResult {
                    status_code,
                    body: Some(body.to_vec()),
                    content_type: Some(content_type),
                }
            },
            Err(e) => {
                warn!(route = route, status = status_code, error:% = e; "Response body could not be read");
                TransportResult {
                    status_code,
                    body: None,
                    content_type: None,
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_string, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn post_blocking(base: String, route: &'static str, payload: &'static [u8]) -> TransportResult {
        let transport = HttpTransport::new(Url::parse(&base).unwrap()).unwrap();
        transport.post(route, &user_agent("cust-42"), payload, Duration::from_secs(5))
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_post_sends_headers_and_body() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/hosts/list"))
            .and(header("content-type", "application/json"))
            .and(header("user-agent", "Rust API cust-42"))
            .and(body_string(r#"{"cid":"x"}"#))
            .respond_with(
                ResponseTemplate::new(200).set_body_raw(r#"{"status":"OK"}"#.as_bytes().to_vec(), "Application/JSON"),
            )
            .expect(1)
            .mount(&mock_server)
            .await;

        let base = mock_server.uri();
        let result = tokio::task::spawn_blocking(move || post_blocking(base, "/v1/hosts/list", br#"{"cid":"x"}"#))
            .await
            .unwrap();

        assert_eq!(result.status_code, 200);
        assert_eq!(result.body.as_deref(), Some(&br#"{"status":"OK"}"#[..]));
        assert_eq!(result.content_type.as_deref(), Some("application/json"));

        let requests = mock_server.received_requests().await.unwrap();
        let content_length = requests[0].headers.get("content-length").unwrap().to_str().unwrap();
        assert_eq!(content_length, "11");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_post_reports_error_status_with_body() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&mock_server)
            .await;

        let base = mock_server.uri();
        let result = tokio::task::spawn_blocking(move || post_blocking(base, "/v1/status/list", b"{}"))
            .await
            .unwrap();

        assert_eq!(result.status_code, 401);
        assert_eq!(result.body.as_deref(), Some(&b""[..]));
        assert_eq!(result.content_type.as_deref(), Some(""));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_post_connection_refused_is_status_zero() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        drop(listener);

        let result = tokio::task::spawn_blocking(move || post_blocking(base, "/td/", b"{}"))
            .await
            .unwrap();

        assert_eq!(result, TransportResult::failed());
        assert!(result.is_failure());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_post_times_out_as_status_zero() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
            .mount(&mock_server)
            .await;

        let base = mock_server.uri();
        let result = tokio::task::spawn_blocking(move || {
            let transport = HttpTransport::new(Url::parse(&base).unwrap()).unwrap();
            transport.post("/v1/hosts/list", "Rust API c", b"[]", Duration::from_millis(200))
        })
        .await
        .unwrap();

        assert!(result.is_failure());
    }

    #[test]
    fn test_endpoint_appends_route_to_base_path() {
        let transport = HttpTransport::new(Url::parse("https://example.com/staging/").unwrap()).unwrap();
        assert_eq!(
            transport.endpoint("/v1/monitors/get").unwrap().as_str(),
            "https://example.com/staging/v1/monitors/get"
        );
    }
}

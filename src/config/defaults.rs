use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::api::RestApiClient;
use crate::cli::{ApplyArgs, ConnectionArgs};
use crate::http::{DEFAULT_AUTHORITY, DEFAULT_TIMEOUT, RestApiSecret};
use crate::persist::{FileClockDeltaSink, load_time_delta};

/// Key of the settings table in the configuration file.
pub const CLIENT_SECTION: &str = "client";

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ClientSettings {
    pub base_url: String,
    pub customer_identifier: String,
    /// Base-64 encoded secret.
    pub rest_api_secret: Option<String>,
    pub timeout_secs: u64,
    pub time_delta: i64,
    /// Read and write the clock delta through `time_delta_file`.
    pub persist_time_delta: bool,
    pub time_delta_file: Option<PathBuf>,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_AUTHORITY.to_string(),
            customer_identifier: String::new(),
            rest_api_secret: None,
            timeout_secs: DEFAULT_TIMEOUT.as_secs(),
            time_delta: 0,
            persist_time_delta: true,
            time_delta_file: Some(PathBuf::from("data/time_delta.json")),
        }
    }
}

impl ApplyArgs for ClientSettings {
    fn apply_connection(&mut self, args: &ConnectionArgs) {
        if let Some(base_url) = &args.base_url {
            self.base_url = base_url.clone();
        }
        if let Some(customer_identifier) = &args.customer_identifier {
            self.customer_identifier = customer_identifier.clone();
        }
        if let Some(secret) = &args.rest_api_secret {
            self.rest_api_secret = Some(secret.clone());
        }
        if let Some(timeout_secs) = args.timeout_secs {
            self.timeout_secs = timeout_secs;
        }
        if let Some(time_delta_file) = &args.time_delta_file {
            self.time_delta_file = Some(time_delta_file.clone());
        }
        if args.no_persist_time_delta {
            self.persist_time_delta = false;
        }
    }
}

impl ClientSettings {
    /// Builds a client from these settings, seeding the clock delta from
    /// `time_delta_file` when it holds a value and persisting updates to it.
    /// Both are skipped when `persist_time_delta` is off.
    pub fn build_client(&self) -> Result<RestApiClient> {
        if self.customer_identifier.is_empty() {
            anyhow::bail!("customer_identifier is not configured");
        }
        let encoded = self
            .rest_api_secret
            .as_deref()
            .context("rest_api_secret is not configured")?;
        let secret = RestApiSecret::from_base64(encoded).context("Invalid rest_api_secret")?;
        let base_url = Url::parse(&self.base_url).context("Invalid base_url")?;

        let mut client = RestApiClient::with_base_url(base_url, self.customer_identifier.clone(), secret)?;
        client.set_timeout(Duration::from_secs(self.timeout_secs));

        let mut time_delta = self.time_delta;
        if let Some(path) = self.time_delta_file.as_ref().filter(|_| self.persist_time_delta) {
            if let Some(stored) = load_time_delta(path)? {
                debug!(path:% = path.display(), time_delta = stored; "Loaded stored clock delta");
                time_delta = stored;
            }
            client.set_time_delta_sink(FileClockDeltaSink::new(path));
        }
        client.set_time_delta(time_delta);

        info!(base_url = self.base_url.as_str(), timeout_secs = self.timeout_secs; "Client configured");
        Ok(client)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;
    use tempfile::tempdir;

    fn settings_with_secret() -> ClientSettings {
        ClientSettings {
            base_url: "http://localhost:9".to_string(),
            customer_identifier: "cust-7".to_string(),
            rest_api_secret: Some(STANDARD.encode([7u8; 56])),
            time_delta_file: None,
            ..Default::default()
        }
    }

    #[test]
    fn test_connection_args_override_settings() {
        let mut settings = ClientSettings::default();
        let args = ConnectionArgs {
            base_url: Some("http://127.0.0.1:1234".to_string()),
            customer_identifier: Some("abc".to_string()),
            timeout_secs: Some(3),
            no_persist_time_delta: true,
            ..Default::default()
        };

        settings.apply_connection(&args);

        assert_eq!(settings.base_url, "http://127.0.0.1:1234");
        assert_eq!(settings.customer_identifier, "abc");
        assert_eq!(settings.timeout_secs, 3);
        assert!(!settings.persist_time_delta);
        assert!(settings.rest_api_secret.is_none());
    }

    #[test]
    fn test_build_client_applies_settings() {
        let mut settings = settings_with_secret();
        settings.timeout_secs = 7;
        settings.time_delta = 12;

        let client = settings.build_client().unwrap();

        assert_eq!(client.customer_identifier(), "cust-7");
        assert_eq!(client.timeout(), Duration::from_secs(7));
        assert_eq!(client.time_delta(), 12);
        assert!(!client.has_time_delta_sink());
    }

    #[test]
    fn test_build_client_prefers_stored_delta() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("delta.json");
        std::fs::write(&path, r#"{"inesonic_rest_time_delta": -30}"#).unwrap();

        let mut settings = settings_with_secret();
        settings.time_delta = 12;
        settings.time_delta_file = Some(path);

        let client = settings.build_client().unwrap();

        assert_eq!(client.time_delta(), -30);
        assert!(client.has_time_delta_sink());
    }

    #[test]
    fn test_build_client_without_persistence_ignores_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("delta.json");
        std::fs::write(&path, r#"{"inesonic_rest_time_delta": -30}"#).unwrap();

        let mut settings = settings_with_secret();
        settings.time_delta = 12;
        settings.time_delta_file = Some(path);
        settings.persist_time_delta = false;

        let client = settings.build_client().unwrap();

        assert_eq!(client.time_delta(), 12);
        assert!(!client.has_time_delta_sink());
    }

    #[test]
    fn test_build_client_requires_credentials() {
        let mut settings = settings_with_secret();
        settings.rest_api_secret = None;
        assert!(settings.build_client().is_err());

        let mut settings = settings_with_secret();
        settings.rest_api_secret = Some(STANDARD.encode([1u8; 40]));
        assert!(settings.build_client().is_err());

        let mut settings = settings_with_secret();
        settings.customer_identifier.clear();
        assert!(settings.build_client().is_err());
    }
}

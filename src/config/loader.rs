use std::{fs, fs::File, io::Write, path::Path};

use anyhow::{Context, Result};
use config::{Config, Environment};
use log::info;

use super::defaults::{CLIENT_SECTION, ClientSettings};

pub fn get_default_config() -> &'static str {
    include_str!("../../config/config.toml")
}

/// Loads client settings from `path`, layering `SPEED_SENTRY_*` environment
/// variables on top. A default file is written first if `path` is missing.
pub fn load_configuration(path: &Path) -> Result<ClientSettings> {
    if !path.exists() {
        let sources = get_default_config();
        write_config_to(path, sources).context("Could not create default config")?;
        info!(path:% = path.display(); "Created new configuration file");
    }

    let filename = path.to_str().context("Invalid config file path")?;

    let cfg = Config::builder()
        .add_source(config::File::with_name(filename))
        .add_source(Environment::with_prefix("SPEED_SENTRY").prefix_separator("_").separator("__"))
        .build()
        .context("Could not build config")?;

    match cfg.get::<ClientSettings>(CLIENT_SECTION) {
        Ok(settings) => Ok(settings),
        Err(config::ConfigError::NotFound(_)) => Ok(ClientSettings::default()),
        Err(e) => Err(e).context("Could not read client configuration"),
    }
}

pub fn write_config_to(path: &Path, source: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("Failed to create parent directories")?;
    };

    let mut file = File::create(path).context("Failed to create config file")?;
    file.write_all(source.as_bytes())
        .context("Failed to write config content")?;
    file.write_all(b"\n").context("Failed to write newline")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_is_created_from_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let settings = load_configuration(&path).unwrap();

        assert!(path.exists());
        assert_eq!(settings.base_url, "https://rest.1.speed-sentry.com");
        assert_eq!(settings.timeout_secs, 20);
        assert_eq!(settings.time_delta, 0);
        assert!(settings.rest_api_secret.is_none());
        assert_eq!(settings.time_delta_file, Some(PathBuf::from("data/time_delta.json")));
    }

    #[test]
    fn test_values_are_read_from_client_table() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        write_config_to(
            &path,
            r#"
[client]
base_url = "http://localhost:8080"
customer_identifier = "cust-1"
timeout_secs = 5
time_delta = -3
"#,
        )
        .unwrap();

        let settings = load_configuration(&path).unwrap();

        assert_eq!(settings.base_url, "http://localhost:8080");
        assert_eq!(settings.customer_identifier, "cust-1");
        assert_eq!(settings.timeout_secs, 5);
        assert_eq!(settings.time_delta, -3);
        assert!(settings.persist_time_delta);
        // Fields absent from the file keep their defaults.
        assert_eq!(settings.time_delta_file, Some(PathBuf::from("data/time_delta.json")));
    }

    #[test]
    fn test_persistence_can_be_switched_off() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        write_config_to(&path, "[client]\npersist_time_delta = false").unwrap();

        let settings = load_configuration(&path).unwrap();

        assert!(!settings.persist_time_delta);
    }

    #[test]
    fn test_file_without_client_table_uses_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        write_config_to(&path, "[other]\nvalue = 1").unwrap();

        let settings = load_configuration(&path).unwrap();

        assert_eq!(settings.timeout_secs, 20);
        assert!(settings.customer_identifier.is_empty());
    }

    #[test]
    fn test_malformed_value_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        write_config_to(&path, "[client]\ntimeout_secs = \"soon\"").unwrap();

        assert!(load_configuration(&path).is_err());
    }
}

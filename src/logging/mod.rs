//! Logging setup for the command-line front end and PII masking helpers.
//!
//! The library only emits records through the `log` facade, with structured
//! key-values. Binaries decide where they go by calling [`init_logging`].

pub mod structured_console_encoder;

use std::path::Path;
use std::sync::OnceLock;

use anyhow::{Context, Result};
use log::{debug, info};
use log4rs::{
    Config,
    config::{Deserializers, RawConfig},
};

use crate::logging::structured_console_encoder::StructuredConsoleEncoderDeserializer;

/// External configuration looked up in the working directory.
pub const LOG_CONFIG_FILE: &str = "log4rs.yml";

const REVEAL_PII_VAR: &str = "REVEAL_PII";

fn deserializers() -> Deserializers {
    let mut deserializers = Deserializers::default();
    deserializers.insert("structured_console", StructuredConsoleEncoderDeserializer);
    deserializers
}

/// Initializes `log4rs` from `config_path` if given, else from
/// [`LOG_CONFIG_FILE`] if present, else from the embedded defaults.
pub fn init_logging(config_path: Option<&Path>) -> Result<()> {
    let path = config_path.unwrap_or_else(|| Path::new(LOG_CONFIG_FILE));

    if path.exists() {
        log4rs::init_file(path, deserializers())
            .with_context(|| format!("Failed to load logging configuration {}", path.display()))?;
        info!(path:% = path.display(); "Logging initialized from external configuration");
        return Ok(());
    }

    let config = embedded_config()?;
    log4rs::init_config(config).context("Failed to initialize logging from embedded config")?;

    debug!("Logging initialized from embedded defaults (no external log4rs.yml found)");
    Ok(())
}

fn embedded_config() -> Result<Config> {
    let yaml_content = include_str!("../../resources/default_log4rs.yml");
    let raw_config: RawConfig =
        serde_yaml::from_str(yaml_content).context("Embedded logging configuration is invalid YAML")?;

    let (appenders, errors) = raw_config.appenders_lossy(&deserializers());
    if !errors.is_empty() {
        anyhow::bail!("Errors parsing embedded appenders: {:?}", errors);
    }

    Config::builder()
        .appenders(appenders)
        .loggers(raw_config.loggers())
        .build(raw_config.root())
        .context("Failed to build logging config")
}

fn reveal_pii() -> bool {
    static REVEAL_PII_CACHE: OnceLock<bool> = OnceLock::new();

    *REVEAL_PII_CACHE.get_or_init(|| {
        std::env::var(REVEAL_PII_VAR)
            .map(|v| {
                let val = v.to_lowercase();
                val == "true" || val == "1"
            })
            .unwrap_or(false)
    })
}

/// Masks an identifier, keeping only its first and last four characters.
/// If REVEAL_PII is true, returns the original string.
pub fn mask_string(s: &str) -> String {
    if reveal_pii() {
        return s.to_string();
    }
    mask(s)
}

fn mask(s: &str) -> String {
    let chars: Vec<char> = s.chars().collect();
    if chars.len() <= 8 {
        return "***".to_string();
    }

    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}...{}", head, tail)
}

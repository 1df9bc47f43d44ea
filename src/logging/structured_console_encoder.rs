use log::{
    Record,
    kv::{Error, Key, Value, VisitSource},
};
use log4rs::encode::pattern::PatternEncoder;
use log4rs::encode::{Color, Encode, Style, Write};
use serde::Deserialize;
use std::io;

const DEFAULT_PATTERN: &str = "{d(%Y-%m-%d %H:%M:%S)} {h({l:5})} {t} {m}";
const REDACTED: &str = "<redacted>";

#[derive(Debug, Deserialize)]
pub struct StructuredConsoleEncoderConfig {
    pub pattern: Option<String>,
    /// Record keys whose values are never written out.
    #[serde(default)]
    pub redact: Vec<String>,
}

/// Pattern encoder that appends the record's key-values as ` key=value`.
#[derive(Debug)]
pub struct StructuredConsoleEncoder {
    delegate: PatternEncoder,
    redact: Vec<String>,
}

impl StructuredConsoleEncoder {
    pub fn new(pattern: &str, redact: Vec<String>) -> Self {
        Self {
            delegate: PatternEncoder::new(pattern),
            redact,
        }
    }
}

impl Encode for StructuredConsoleEncoder {
    fn encode(&self, w: &mut dyn Write, record: &Record) -> anyhow::Result<()> {
        self.delegate.encode(w, record)?;

        let mut visitor = KeyValueWriter {
            writer: w,
            redact: &self.redact,
            io_err: None,
        };

        if let Err(kv_err) = record.key_values().visit(&mut visitor) {
            if let Some(io_err) = visitor.io_err {
                return Err(io_err.into());
            }
            write!(w, " [KV Error: {}]", kv_err)?;
        }

        w.write_all(b"\n")?;
        Ok(())
    }
}

struct KeyValueWriter<'a> {
    writer: &'a mut dyn Write,
    redact: &'a [String],
    io_err: Option<io::Error>,
}

impl KeyValueWriter<'_> {
    fn write_pair(&mut self, key: &Key<'_>, value: &Value<'_>) -> io::Result<()> {
        self.writer.set_style(Style::new().text(Color::Cyan))?;
        write!(self.writer, " {}=", key)?;
        self.writer.set_style(&Style::default())?;

        if self.redact.iter().any(|k| k == key.as_str()) {
            write!(self.writer, "{}", REDACTED)
        } else {
            write!(self.writer, "{}", value)
        }
    }
}

impl<'kvs> VisitSource<'kvs> for KeyValueWriter<'_> {
    fn visit_pair(&mut self, key: Key<'kvs>, value: Value<'kvs>) -> Result<(), Error> {
        if let Err(e) = self.write_pair(&key, &value) {
            self.io_err = Some(e);
            return Err(Error::msg("io error during visit"));
        }
        Ok(())
    }
}

pub struct StructuredConsoleEncoderDeserializer;

impl log4rs::config::Deserialize for StructuredConsoleEncoderDeserializer {
    type Trait = dyn Encode;
    type Config = StructuredConsoleEncoderConfig;

    fn deserialize(
        &self,
        config: StructuredConsoleEncoderConfig,
        _: &log4rs::config::Deserializers,
    ) -> anyhow::Result<Box<dyn Encode>> {
        let pattern = config.pattern.as_deref().unwrap_or(DEFAULT_PATTERN);
        Ok(Box::new(StructuredConsoleEncoder::new(pattern, config.redact)))
    }
}

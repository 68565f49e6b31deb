//! INI file configuration adapter.
//!
//! Values that are present but fail to parse fall back to the caller's
//! default with a warning naming the file, section and key.

use crate::domain::error::MemeindexError;
use crate::ports::config_port::ConfigPort;
use configparser::ini::Ini;
use std::path::Path;
use tracing::warn;

pub struct FileConfigAdapter {
    config: Ini,
    source: String,
}

impl FileConfigAdapter {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, MemeindexError> {
        let source = path.as_ref().display().to_string();
        let mut config = Ini::new();
        config
            .load(path.as_ref())
            .map_err(|reason| MemeindexError::ConfigParse {
                file: source.clone(),
                reason,
            })?;
        Ok(Self { config, source })
    }

    pub fn from_string(content: &str) -> Result<Self, MemeindexError> {
        let source = "<inline>".to_string();
        let mut config = Ini::new();
        config
            .read(content.to_string())
            .map_err(|reason| MemeindexError::ConfigParse {
                file: source.clone(),
                reason,
            })?;
        Ok(Self { config, source })
    }

    fn or_default<T>(
        &self,
        section: &str,
        key: &str,
        parsed: Result<Option<T>, String>,
        default: T,
    ) -> T {
        match parsed {
            Ok(Some(value)) => value,
            Ok(None) => default,
            Err(reason) => {
                warn!(file = %self.source, section, key, %reason, "ignoring unparseable config value");
                default
            }
        }
    }

    fn parse_bool(value: &str) -> Result<bool, String> {
        match value.trim().to_lowercase().as_str() {
            "true" | "yes" | "on" | "1" => Ok(true),
            "false" | "no" | "off" | "0" => Ok(false),
            other => Err(format!("not a boolean: {other}")),
        }
    }
}

impl ConfigPort for FileConfigAdapter {
    fn get_string(&self, section: &str, key: &str) -> Option<String> {
        self.config.get(section, key)
    }

    fn get_bool(&self, section: &str, key: &str, default: bool) -> bool {
        let parsed = self
            .config
            .get(section, key)
            .map(|v| Self::parse_bool(&v))
            .transpose();
        self.or_default(section, key, parsed, default)
    }
}

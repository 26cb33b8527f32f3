//! INI file configuration adapter.

use crate::domain::error::ForestError;
use crate::ports::config_port::ConfigPort;
use configparser::ini::Ini;
use std::path::Path;

#[derive(Debug)]
pub struct FileConfigAdapter {
    config: Ini,
}

impl FileConfigAdapter {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ForestError> {
        let path = path.as_ref();
        let mut config = Ini::new();
        config.load(path).map_err(|reason| ForestError::ConfigParse {
            file: path.display().to_string(),
            reason,
        })?;
        Ok(Self { config })
    }

    pub fn from_string(content: &str) -> Result<Self, ForestError> {
        let mut config = Ini::new();
        config
            .read(content.to_string())
            .map_err(|reason| ForestError::ConfigParse {
                file: "<string>".to_string(),
                reason,
            })?;
        Ok(Self { config })
    }

    fn parse_bool(value: &str) -> Option<bool> {
        match value.to_lowercase().as_str() {
            "true" | "yes" | "on" | "1" => Some(true),
            "false" | "no" | "off" | "0" => Some(false),
            _ => None,
        }
    }

    /// Parse a present value with `parse`, naming the expected kind when it fails.
    fn parse_value<T>(
        &self,
        section: &str,
        key: &str,
        default: T,
        expected: &str,
        parse: impl FnOnce(&str) -> Option<T>,
    ) -> Result<T, ForestError> {
        let Some(raw) = self.config.get(section, key) else {
            return Ok(default);
        };
        let raw = raw.trim();
        parse(raw).ok_or_else(|| ForestError::ConfigInvalid {
            section: section.to_string(),
            key: key.to_string(),
            reason: format!("expected {expected}, got {raw:?}"),
        })
    }
}

impl ConfigPort for FileConfigAdapter {
    fn get_string(&self, section: &str, key: &str) -> Option<String> {
        self.config.get(section, key)
    }

    fn get_int(&self, section: &str, key: &str, default: i64) -> Result<i64, ForestError> {
        self.parse_value(section, key, default, "an integer", |v| v.parse().ok())
    }

    fn get_double(&self, section: &str, key: &str, default: f64) -> Result<f64, ForestError> {
        self.parse_value(section, key, default, "a number", |v| {
            v.parse::<f64>().ok().filter(|x| x.is_finite())
        })
    }

    fn get_bool(&self, section: &str, key: &str, default: bool) -> Result<bool, ForestError> {
        self.parse_value(section, key, default, "a boolean", Self::parse_bool)
    }
}

//! Parameters from the process environment.

use swirl_core::{ConfigError, ParamSource};

/// Reads parameters from environment variables, optionally prefixed.
///
/// A variable that is unset is [`ConfigError::Missing`]; one that does
/// not parse as a float is [`ConfigError::NotNumeric`].
#[derive(Clone, Debug, Default)]
pub struct EnvParams {
    prefix: String,
}

impl EnvParams {
    /// Look parameters up under their bare names (`Re`, `Sc`, ...).
    pub fn new() -> Self {
        Self::default()
    }

    /// Look parameters up as `{prefix}{name}`.
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }
}

impl ParamSource for EnvParams {
    fn get(&self, name: &str) -> Result<f64, ConfigError> {
        let key = format!("{}{}", self.prefix, name);
        let raw = match std::env::var(&key) {
            Ok(raw) => raw,
            Err(std::env::VarError::NotPresent) => {
                return Err(ConfigError::Missing { name: key });
            }
            Err(std::env::VarError::NotUnicode(v)) => {
                return Err(ConfigError::NotNumeric {
                    name: key,
                    value: v.to_string_lossy().into_owned(),
                });
            }
        };
        raw.trim()
            .parse::<f64>()
            .map_err(|_| ConfigError::NotNumeric { name: key, value: raw })
    }
}

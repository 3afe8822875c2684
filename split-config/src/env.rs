// Environment variable loading

use crate::{ConfigError, Result};
use std::collections::HashMap;
use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Environment variable loader
///
/// Reads the process environment, or a fixed map when built with
/// [`EnvLoader::from_map`].
pub struct EnvLoader {
    prefix: Option<String>,
    vars: Option<HashMap<String, String>>,
}

impl EnvLoader {
    /// Create a new environment loader
    pub fn new(prefix: Option<String>) -> Self {
        Self { prefix, vars: None }
    }

    /// Create a loader over a fixed set of variables
    pub fn from_map<I, K, V>(vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            prefix: None,
            vars: Some(vars.into_iter().map(|(k, v)| (k.into(), v.into())).collect()),
        }
    }

    /// Load `.env` from the working directory into the process environment
    ///
    /// A missing file is not an error.
    pub fn load_dotenv() -> Result<()> {
        match dotenvy::dotenv() {
            Ok(_) => Ok(()),
            Err(e) if e.not_found() => Ok(()),
            Err(e) => Err(ConfigError::LoadError(e.to_string())),
        }
    }

    fn full_key(&self, key: &str) -> String {
        if let Some(ref prefix) = self.prefix {
            format!("{}_{}", prefix, key.to_uppercase())
        } else {
            key.to_uppercase()
        }
    }

    /// Load a specific environment variable
    pub fn load_var(&self, key: &str) -> Result<String> {
        let full_key = self.full_key(key);

        match &self.vars {
            Some(vars) => vars
                .get(&full_key)
                .cloned()
                .ok_or(ConfigError::KeyNotFound(full_key)),
            None => env::var(&full_key).map_err(ConfigError::EnvError),
        }
    }

    /// Load a variable, treating unset and empty as absent
    pub fn load_optional(&self, key: &str) -> Option<String> {
        self.load_var(key).ok().filter(|v| !v.is_empty())
    }

    /// Load with default value
    pub fn load_var_or(&self, key: &str, default: &str) -> String {
        self.load_optional(key)
            .unwrap_or_else(|| default.to_string())
    }

    /// Load and parse a variable, absent if unset
    pub fn load_parsed<T>(&self, key: &str) -> Result<Option<T>>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        match self.load_optional(key) {
            Some(raw) => raw.trim().parse::<T>().map(Some).map_err(|e| {
                ConfigError::ParseError(format!("{}={:?}: {}", self.full_key(key), raw, e))
            }),
            None => Ok(None),
        }
    }

    /// Load a duration given in whole seconds
    pub fn load_duration_secs(&self, key: &str) -> Result<Option<Duration>> {
        Ok(self.load_parsed::<u64>(key)?.map(Duration::from_secs))
    }

    /// Load a boolean flag (`1`/`true`/`0`/`false`)
    pub fn load_flag(&self, key: &str) -> Result<Option<bool>> {
        match self.load_optional(key) {
            Some(raw) => match raw.trim().to_lowercase().as_str() {
                "1" | "true" | "yes" => Ok(Some(true)),
                "0" | "false" | "no" => Ok(Some(false)),
                _ => Err(ConfigError::ParseError(format!(
                    "{}={:?}: expected a boolean",
                    self.full_key(key),
                    raw
                ))),
            },
            None => Ok(None),
        }
    }
}

impl Default for EnvLoader {
    fn default() -> Self {
        Self::new(None)
    }
}

//! Copy strategy selector.
use std::fmt;
use std::str::FromStr;

use crate::error::{ConfigError, Result};

/// How the copy pass treats previously-applied configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyStrategy {
    /// Copy on every invocation.
    CopyAlways,
    /// Copy only when the sentinel marker is absent.
    CopyOnce,
}

impl CopyStrategy {
    /// Parse an optional raw selector; an absent value is an error.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::BadConfigStrategy`] for a missing or
    /// unrecognised value.
    pub fn from_setting(value: Option<&str>) -> Result<Self> {
        value.map_or(Err(ConfigError::BadConfigStrategy { value: None }), str::parse)
    }

    /// The literal selector value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CopyAlways => "COPY_ALWAYS",
            Self::CopyOnce => "COPY_ONCE",
        }
    }
}

impl FromStr for CopyStrategy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "COPY_ALWAYS" => Ok(Self::CopyAlways),
            "COPY_ONCE" => Ok(Self::CopyOnce),
            other => Err(ConfigError::BadConfigStrategy {
                value: Some(other.to_string()),
            }),
        }
    }
}

impl fmt::Display for CopyStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

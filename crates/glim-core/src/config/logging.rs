//! Logging configuration.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Crates whose own `info` output drowns out the service logs.
const QUIET_TARGETS: &[&str] = &["sqlx=warn", "hyper=warn", "rustls=warn"];

/// Output encoding of log lines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable, multi-line.
    #[default]
    Pretty,
    /// One JSON object per line.
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown log format '{other}', expected pretty or json")),
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pretty => write!(f, "pretty"),
            Self::Json => write!(f, "json"),
        }
    }
}

/// Logging and tracing configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Base level or full filter directive, e.g. `"debug"` or
    /// `"info,glim_ldap=trace"`.
    #[serde(default = "default_level")]
    pub level: String,
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            format: LogFormat::default(),
        }
    }
}

impl LoggingConfig {
    /// Filter directive for the subscriber. Dependency noise is capped at
    /// `warn` unless the level already names those targets.
    pub fn directive(&self) -> String {
        let level = self.level.trim().to_ascii_lowercase();
        let mut directive = if level.is_empty() { default_level() } else { level };
        for quiet in QUIET_TARGETS {
            let target = quiet.split('=').next().unwrap_or_default();
            if !directive.contains(target) {
                directive.push(',');
                directive.push_str(quiet);
            }
        }
        directive
    }
}

fn default_level() -> String {
    "info".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directive_quiets_dependencies() {
        let config = LoggingConfig::default();
        assert_eq!(config.directive(), "info,sqlx=warn,hyper=warn,rustls=warn");

        let config = LoggingConfig {
            level: "DEBUG,sqlx=debug".to_string(),
            format: LogFormat::Json,
        };
        assert_eq!(config.directive(), "debug,sqlx=debug,hyper=warn,rustls=warn");
    }

    #[test]
    fn test_parse_format() {
        assert_eq!("JSON".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert!("xml".parse::<LogFormat>().is_err());
    }
}

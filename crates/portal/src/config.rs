use std::path::PathBuf;
use std::time::Duration;

use meranti_simulator::latency::LatencyProfile;

/// Portal configuration loaded from environment variables.
///
/// Every field has a default suitable for a local demo run.
#[derive(Debug, Clone, PartialEq)]
pub struct PortalConfig {
    /// Directory holding the history and conversation JSON files.
    pub data_dir: PathBuf,
    /// Multiplier for simulated latency (`0` = instant).
    pub latency_scale: f64,
    /// Maximum random extra delay per simulated call.
    pub latency_jitter: Duration,
    /// Emit logs as JSON lines instead of human-readable text.
    pub log_json: bool,
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(".meranti"),
            latency_scale: 1.0,
            latency_jitter: Duration::ZERO,
            log_json: false,
        }
    }
}

impl PortalConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                     | Default    |
    /// |-----------------------------|------------|
    /// | `MERANTI_DATA_DIR`          | `.meranti` |
    /// | `MERANTI_LATENCY_SCALE`     | `1.0`      |
    /// | `MERANTI_LATENCY_JITTER_MS` | `0`        |
    /// | `MERANTI_LOG_JSON`          | `false`    |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let data_dir = lookup("MERANTI_DATA_DIR")
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or(defaults.data_dir);

        let latency_scale = match lookup("MERANTI_LATENCY_SCALE") {
            Some(raw) => {
                let scale: f64 = raw.trim().parse().map_err(|_| invalid("MERANTI_LATENCY_SCALE", &raw))?;
                if !scale.is_finite() || scale < 0.0 {
                    return Err(invalid("MERANTI_LATENCY_SCALE", &raw));
                }
                scale
            }
            None => defaults.latency_scale,
        };

        let latency_jitter = match lookup("MERANTI_LATENCY_JITTER_MS") {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .map(Duration::from_millis)
                .map_err(|_| invalid("MERANTI_LATENCY_JITTER_MS", &raw))?,
            None => defaults.latency_jitter,
        };

        let log_json = match lookup("MERANTI_LOG_JSON") {
            Some(raw) => parse_flag(&raw).ok_or_else(|| invalid("MERANTI_LOG_JSON", &raw))?,
            None => defaults.log_json,
        };

        Ok(Self {
            data_dir,
            latency_scale,
            latency_jitter,
            log_json,
        })
    }

    pub fn latency_profile(&self) -> LatencyProfile {
        LatencyProfile::with_scale(self.latency_scale).with_jitter(self.latency_jitter)
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}

fn invalid(var: &'static str, value: &str) -> ConfigError {
    ConfigError::Invalid {
        var,
        value: value.to_string(),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {var}: {value:?}")]
    Invalid { var: &'static str, value: String },
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use assert_matches::assert_matches;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<PortalConfig, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        PortalConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn defaults_when_unset() {
        assert_eq!(load(&[]).unwrap(), PortalConfig::default());
    }

    #[test]
    fn reads_all_vars() {
        let config = load(&[
            ("MERANTI_DATA_DIR", "/tmp/meranti"),
            ("MERANTI_LATENCY_SCALE", "0"),
            ("MERANTI_LATENCY_JITTER_MS", "250"),
            ("MERANTI_LOG_JSON", "TRUE"),
        ])
        .unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/tmp/meranti"));
        assert_eq!(config.latency_scale, 0.0);
        assert_eq!(config.latency_jitter, Duration::from_millis(250));
        assert!(config.log_json);
        assert_eq!(config.latency_profile().scale(), 0.0);
        assert_eq!(config.latency_profile().jitter(), Duration::from_millis(250));
    }

    #[test]
    fn rejects_bad_values() {
        assert_matches!(
            load(&[("MERANTI_LATENCY_SCALE", "fast")]),
            Err(ConfigError::Invalid { var: "MERANTI_LATENCY_SCALE", .. })
        );
        assert_matches!(
            load(&[("MERANTI_LATENCY_SCALE", "-1")]),
            Err(ConfigError::Invalid { .. })
        );
        assert_matches!(
            load(&[("MERANTI_LATENCY_JITTER_MS", "1.5")]),
            Err(ConfigError::Invalid { var: "MERANTI_LATENCY_JITTER_MS", .. })
        );
        assert_matches!(
            load(&[("MERANTI_LOG_JSON", "maybe")]),
            Err(ConfigError::Invalid { var: "MERANTI_LOG_JSON", .. })
        );
    }
}

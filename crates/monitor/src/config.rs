//! Monitor configuration loaded from environment variables.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use aquawatch_core::dedup::DEFAULT_DEDUP_WINDOW_MS;
use aquawatch_core::ThresholdConfig;
use aquawatch_events::router::DEFAULT_DEVICE_NAME;
use aquawatch_pipeline::cache::DEFAULT_CACHE_TTL_SECS;
use aquawatch_pipeline::OrchestratorConfig;

const DEFAULT_POLL_INTERVAL_SECS: u64 = 60;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{var} has an invalid value: {value}")]
    Invalid { var: &'static str, value: String },

    #[error("Neither READINGS_URL nor READINGS_WS_URL is set")]
    NoSource,

    #[error("Failed to read thresholds from {path}: {message}")]
    Thresholds { path: String, message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// HTTP endpoint polled for reading batches.
    pub readings_url: Option<String>,
    /// WebSocket endpoint pushing reading batches.
    pub readings_ws_url: Option<String>,
    pub poll_interval: Duration,
    pub dedup_window_ms: i64,
    pub cache_ttl_secs: i64,
    pub thresholds_path: Option<PathBuf>,
    /// Postgres URL. Alerts are kept in memory when unset.
    pub database_url: Option<String>,
    /// Webhook for notifications. Notifications are only logged when unset.
    pub notify_webhook_url: Option<String>,
    pub device_name: String,
    /// Parameters whose warning-level alerts are dropped.
    pub muted_parameters: Vec<String>,
    pub log_format: LogFormat,
}

impl MonitorConfig {
    /// Load configuration from the process environment.
    ///
    /// | Env Var              | Default        |
    /// |----------------------|----------------|
    /// | `READINGS_URL`       | --             |
    /// | `READINGS_WS_URL`    | --             |
    /// | `POLL_INTERVAL_SECS` | `60`           |
    /// | `DEDUP_WINDOW_MS`    | `300000`       |
    /// | `CACHE_TTL_SECS`     | `30`           |
    /// | `THRESHOLDS_PATH`    | built-in table |
    /// | `DATABASE_URL`       | in-memory      |
    /// | `NOTIFY_WEBHOOK_URL` | log only       |
    /// | `DEVICE_NAME`        | `sensor-node`  |
    /// | `MUTED_PARAMETERS`   | none           |
    /// | `LOG_FORMAT`         | `text`         |
    ///
    /// At least one of `READINGS_URL` and `READINGS_WS_URL` must be set.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |var: &str| lookup(var).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let readings_url = get("READINGS_URL");
        let readings_ws_url = get("READINGS_WS_URL");
        if readings_url.is_none() && readings_ws_url.is_none() {
            return Err(ConfigError::NoSource);
        }

        let poll_interval_secs: u64 =
            parse_or("POLL_INTERVAL_SECS", get("POLL_INTERVAL_SECS"), DEFAULT_POLL_INTERVAL_SECS)?;
        if poll_interval_secs == 0 {
            return Err(ConfigError::Invalid {
                var: "POLL_INTERVAL_SECS",
                value: "0".into(),
            });
        }

        let log_format = match get("LOG_FORMAT").as_deref() {
            None | Some("text") => LogFormat::Text,
            Some("json") => LogFormat::Json,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    var: "LOG_FORMAT",
                    value: other.to_string(),
                })
            }
        };

        Ok(Self {
            readings_url,
            readings_ws_url,
            poll_interval: Duration::from_secs(poll_interval_secs),
            dedup_window_ms: parse_or("DEDUP_WINDOW_MS", get("DEDUP_WINDOW_MS"), DEFAULT_DEDUP_WINDOW_MS)?,
            cache_ttl_secs: parse_or("CACHE_TTL_SECS", get("CACHE_TTL_SECS"), DEFAULT_CACHE_TTL_SECS)?,
            thresholds_path: get("THRESHOLDS_PATH").map(PathBuf::from),
            database_url: get("DATABASE_URL"),
            notify_webhook_url: get("NOTIFY_WEBHOOK_URL"),
            device_name: get("DEVICE_NAME").unwrap_or_else(|| DEFAULT_DEVICE_NAME.to_string()),
            muted_parameters: get("MUTED_PARAMETERS")
                .map(|v| {
                    v.split(',')
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty())
                        .collect()
                })
                .unwrap_or_default(),
            log_format,
        })
    }

    pub fn orchestrator_config(&self) -> OrchestratorConfig {
        OrchestratorConfig {
            dedup_window: chrono::Duration::milliseconds(self.dedup_window_ms),
            cache_ttl: chrono::Duration::seconds(self.cache_ttl_secs),
            device_name: self.device_name.clone(),
            ..Default::default()
        }
    }

    /// Threshold table from `THRESHOLDS_PATH`, or the built-in defaults.
    pub fn load_thresholds(&self) -> Result<ThresholdConfig, ConfigError> {
        let Some(path) = &self.thresholds_path else {
            return Ok(ThresholdConfig::default());
        };
        let thresholds_error = |message: String| ConfigError::Thresholds {
            path: path.display().to_string(),
            message,
        };

        let raw = std::fs::read_to_string(path).map_err(|e| thresholds_error(e.to_string()))?;
        ThresholdConfig::from_json_str(&raw).map_err(|e| thresholds_error(e.to_string()))
    }
}

fn parse_or<T: FromStr>(var: &'static str, raw: Option<String>, default: T) -> Result<T, ConfigError> {
    match raw {
        None => Ok(default),
        Some(value) => value
            .parse()
            .map_err(|_| ConfigError::Invalid { var, value }),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use assert_matches::assert_matches;

    use super::*;

    fn load(pairs: &[(&str, &str)]) -> Result<MonitorConfig, ConfigError> {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        MonitorConfig::from_lookup(|var| env.get(var).cloned())
    }

    #[test]
    fn defaults_apply() {
        let config = load(&[("READINGS_URL", "http://localhost:8080/readings")]).unwrap();
        assert_eq!(config.poll_interval, Duration::from_secs(60));
        assert_eq!(config.dedup_window_ms, 300_000);
        assert_eq!(config.cache_ttl_secs, 30);
        assert_eq!(config.device_name, "sensor-node");
        assert_eq!(config.log_format, LogFormat::Text);
        assert!(config.database_url.is_none());
        assert!(config.muted_parameters.is_empty());
    }

    #[test]
    fn requires_a_source() {
        assert_matches!(load(&[]), Err(ConfigError::NoSource));
        assert_matches!(load(&[("READINGS_URL", "  ")]), Err(ConfigError::NoSource));
    }

    #[test]
    fn invalid_numbers_are_reported() {
        let err = load(&[("READINGS_WS_URL", "ws://x"), ("DEDUP_WINDOW_MS", "soon")]).unwrap_err();
        assert_matches!(err, ConfigError::Invalid { var: "DEDUP_WINDOW_MS", .. });

        let err = load(&[("READINGS_WS_URL", "ws://x"), ("POLL_INTERVAL_SECS", "0")]).unwrap_err();
        assert_matches!(err, ConfigError::Invalid { var: "POLL_INTERVAL_SECS", .. });
    }

    #[test]
    fn overrides_are_parsed() {
        let config = load(&[
            ("READINGS_WS_URL", "ws://localhost:9000/live"),
            ("POLL_INTERVAL_SECS", "15"),
            ("DEDUP_WINDOW_MS", "60000"),
            ("MUTED_PARAMETERS", "turbidity, rain,"),
            ("LOG_FORMAT", "json"),
        ])
        .unwrap();
        assert_eq!(config.poll_interval, Duration::from_secs(15));
        assert_eq!(config.muted_parameters, vec!["turbidity", "rain"]);
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(
            config.orchestrator_config().dedup_window,
            chrono::Duration::milliseconds(60_000)
        );
    }

    #[test]
    fn missing_thresholds_file_is_an_error() {
        let config = load(&[
            ("READINGS_URL", "http://x"),
            ("THRESHOLDS_PATH", "/nonexistent/thresholds.json"),
        ])
        .unwrap();
        assert_matches!(config.load_thresholds(), Err(ConfigError::Thresholds { .. }));
    }
}

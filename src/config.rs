// src/config.rs
use serde::Deserialize;
use std::path::Path;

/// Tunables read from `labtrace.json` next to the executable.
///
/// Every field has a default, so a partial file (or none at all) is fine;
/// a malformed file is logged and ignored rather than aborting startup.
#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Pause between accepted samples, in milliseconds.
    pub sample_interval_ms: u64,
    /// Pause before re-polling a device that had no data ready.
    pub idle_poll_ms: u64,
    /// Sliding window length for the outlier filter.
    pub filter_window: usize,
    /// Deviation threshold in standard deviations.
    pub filter_k: f64,
    /// Simulator output range.
    pub sim_min: f64,
    pub sim_max: f64,
    /// Serial line speed.
    pub baud_rate: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            sample_interval_ms: 100,
            idle_poll_ms: 10,
            filter_window: 10,
            filter_k: 3.0,
            sim_min: 0.0,
            sim_max: 100.0,
            baud_rate: 9600,
        }
    }
}

impl AppConfig {
    pub fn load_or_default(path: &Path) -> Self {
        let Ok(text) = std::fs::read_to_string(path) else {
            return Self::default();
        };
        match serde_json::from_str(&text) {
            Ok(config) => config,
            Err(e) => {
                log::warn!("ignoring malformed config {}: {e}", path.display());
                Self::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_remaining_defaults() {
        let config: AppConfig = serde_json::from_str(r#"{"filter_k": 2.5}"#).unwrap();
        assert_eq!(config.filter_k, 2.5);
        assert_eq!(config.filter_window, 10);
        assert_eq!(config.sample_interval_ms, 100);
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let config = AppConfig::load_or_default(Path::new("does-not-exist.json"));
        assert_eq!(config.baud_rate, 9600);
        assert_eq!(config.sim_max, 100.0);
    }
}

use std::time::Duration;

use serde_with::{serde_as, DurationMilliSeconds};

#[serde_as]
#[derive(Debug, Clone, PartialEq)]
#[derive(serde::Deserialize, serde::Serialize)]
#[serde(default)] // if we add new fields, give them default values when deserializing old configs
pub struct MonitorConfig {
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    #[serde(rename = "structural_interval_ms")]
    pub structural_interval: Duration,
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    #[serde(rename = "binding_interval_ms")]
    pub binding_interval: Duration,
    /// Minimum time between two binding passes.
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    #[serde(rename = "throttle_window_ms")]
    pub throttle_window: Duration,

    /// Consecutive binding passes after which the monitor disables itself.
    pub max_consecutive_fixes: u32,
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    #[serde(rename = "cooldown_ms")]
    pub cooldown: Duration,
    /// More unbound candidates than this in a single scan and the scan binds nothing.
    pub sanity_threshold: usize,
    /// A shipment count change larger than this resets the cache and counters.
    pub structural_reset_delta: usize,
    pub cache_capacity: usize,

    pub trace_classifications: bool,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            structural_interval: Duration::from_millis(2000),
            binding_interval: Duration::from_millis(500),
            throttle_window: Duration::from_millis(1000),
            max_consecutive_fixes: 5,
            cooldown: Duration::from_secs(120),
            sanity_threshold: 50,
            structural_reset_delta: 5,
            cache_capacity: 500,
            trace_classifications: false,
        }
    }
}

#[cfg(test)]
mod monitor_config_tests {
    use super::*;

    #[test]
    fn durations_are_milliseconds() {
        // given
        let json = r#"{ "cooldown_ms": 1500, "sanity_threshold": 10 }"#;

        // when
        let config: MonitorConfig = serde_json::from_str(json).unwrap();

        // then
        assert_eq!(config, MonitorConfig {
            cooldown: Duration::from_millis(1500),
            sanity_threshold: 10,
            ..MonitorConfig::default()
        });
    }
}

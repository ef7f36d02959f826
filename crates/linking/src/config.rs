use std::time::Duration;

use serde_with::{serde_as, DurationMilliSeconds};

#[serde_as]
#[derive(Debug, Clone, PartialEq)]
#[derive(serde::Deserialize, serde::Serialize)]
#[serde(default)] // if we add new fields, give them default values when deserializing old configs
pub struct AutoLinkConfig {
    /// Plan items applied before the longer inter-batch delay.
    pub batch_size: usize,
    pub max_products_per_shipment: usize,

    #[serde_as(as = "DurationMilliSeconds<u64>")]
    #[serde(rename = "item_delay_ms")]
    pub item_delay: Duration,
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    #[serde(rename = "batch_delay_ms")]
    pub batch_delay: Duration,
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    #[serde(rename = "phase_delay_ms")]
    pub phase_delay: Duration,

    /// How long validation waits for the store and catalog to become ready.
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    #[serde(rename = "readiness_timeout_ms")]
    pub readiness_timeout: Duration,
}

impl AutoLinkConfig {
    /// A zero batch size is treated as one.
    pub fn effective_batch_size(&self) -> usize {
        self.batch_size.max(1)
    }

    /// No delays at all, for callers that do not share a thread with a view.
    pub fn without_delays(self) -> Self {
        Self {
            item_delay: Duration::ZERO,
            batch_delay: Duration::ZERO,
            phase_delay: Duration::ZERO,
            ..self
        }
    }
}

impl Default for AutoLinkConfig {
    fn default() -> Self {
        Self {
            batch_size: 5,
            max_products_per_shipment: 3,
            item_delay: Duration::from_millis(50),
            batch_delay: Duration::from_millis(200),
            phase_delay: Duration::from_millis(100),
            readiness_timeout: Duration::from_secs(5),
        }
    }
}

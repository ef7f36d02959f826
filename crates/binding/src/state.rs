use std::collections::HashSet;
use std::time::Duration;

use indexmap::IndexMap;
use tokio::time::Instant;

use crate::config::MonitorConfig;
use crate::control::{ControlAction, ControlId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlBindingRecord {
    pub control_id: ControlId,
    pub action: ControlAction,
    pub bound_at: Instant,
}

/// Bounded, insertion ordered, the oldest record is evicted when full.
#[derive(Debug, Clone)]
pub struct FixedControlsCache {
    records: IndexMap<ControlId, ControlBindingRecord>,
    capacity: usize,
}

impl FixedControlsCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            records: IndexMap::new(),
            capacity: capacity.max(1),
        }
    }

    pub fn insert(&mut self, record: ControlBindingRecord) {
        if !self
            .records
            .contains_key(&record.control_id)
            && self.records.len() >= self.capacity
        {
            self.records.shift_remove_index(0);
        }
        self.records
            .insert(record.control_id, record);
    }

    pub fn contains(&self, control_id: &ControlId) -> bool {
        self.records
            .contains_key(control_id)
    }

    pub fn get(&self, control_id: &ControlId) -> Option<&ControlBindingRecord> {
        self.records.get(control_id)
    }

    /// Drops records for controls that are no longer present, returns how many were dropped.
    pub fn retain_present(&mut self, present: &HashSet<ControlId>) -> usize {
        let before = self.records.len();
        self.records
            .retain(|control_id, _| present.contains(control_id));
        before - self.records.len()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }
}

/// Owned by a single [`crate::monitor::BindingMonitor`], lives as long as the view session.
#[derive(Debug, Clone)]
pub struct MonitorState {
    pub enabled: bool,
    pub consecutive_fix_count: u32,
    pub last_fix_timestamp: Option<Instant>,
    pub throttle_window: Duration,
    pub fixed_controls_cache: FixedControlsCache,

    /// Set while the loop guard has the monitor disabled.
    pub disabled_until: Option<Instant>,
    pub last_shipment_count: Option<usize>,
}

impl MonitorState {
    pub fn new(config: &MonitorConfig) -> Self {
        Self {
            enabled: true,
            consecutive_fix_count: 0,
            last_fix_timestamp: None,
            throttle_window: config.throttle_window,
            fixed_controls_cache: FixedControlsCache::new(config.cache_capacity),
            disabled_until: None,
            last_shipment_count: None,
        }
    }

    /// Clears the cache and zeroes the counters, the enabled flag is left alone.
    pub fn reset(&mut self) {
        self.fixed_controls_cache.clear();
        self.consecutive_fix_count = 0;
        self.last_fix_timestamp = None;
    }

    pub fn is_throttled(&self, now: Instant) -> bool {
        self.last_fix_timestamp
            .is_some_and(|last| now.saturating_duration_since(last) < self.throttle_window)
    }
}

#[cfg(test)]
mod fixed_controls_cache_tests {
    use super::*;

    fn record(id: u64, bound_at: Instant) -> ControlBindingRecord {
        ControlBindingRecord {
            control_id: ControlId(id),
            action: ControlAction::Link,
            bound_at,
        }
    }

    #[test]
    fn oldest_record_is_evicted_when_full() {
        // given
        let now = Instant::now();
        let mut cache = FixedControlsCache::new(2);

        // when
        cache.insert(record(1, now));
        cache.insert(record(2, now));
        cache.insert(record(3, now));

        // then
        assert_eq!(cache.len(), 2);
        assert!(!cache.contains(&ControlId(1)));
        assert!(cache.contains(&ControlId(3)));
    }

    #[test]
    fn absent_controls_are_pruned() {
        // given
        let now = Instant::now();
        let mut cache = FixedControlsCache::new(10);
        for id in 1..=4 {
            cache.insert(record(id, now));
        }

        // when
        let pruned = cache.retain_present(&HashSet::from([ControlId(2), ControlId(4), ControlId(9)]));

        // then
        assert_eq!(pruned, 2);
        assert_eq!(cache.len(), 2);
        assert!(cache.contains(&ControlId(4)));
    }

    #[test]
    fn throttled_within_the_window() {
        // given
        let now = Instant::now();
        let mut state = MonitorState::new(&MonitorConfig::default());

        // when
        state.last_fix_timestamp = Some(now);

        // then
        assert!(state.is_throttled(now + Duration::from_millis(999)));
        assert!(!state.is_throttled(now + Duration::from_millis(1000)));
    }
}

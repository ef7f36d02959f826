use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{oneshot, Notify};
use tokio::time::{interval, Instant, MissedTickBehavior};
use tracing::{debug, info, trace, warn};

use crate::classifier::ControlClassifier;
use crate::config::MonitorConfig;
use crate::control::ControlId;
use crate::state::{ControlBindingRecord, MonitorState};
use crate::view::{BindingHandler, BindingView, CommandDispatcher, ControlCommand};

/// Used as the end of a cooldown too long to represent.
const FAR_FUTURE: Duration = Duration::from_secs(60 * 60 * 24 * 365 * 30);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StructuralScanOutcome {
    /// First observation, nothing to compare with.
    Initial,
    Unchanged,
    Changed { previous: usize, current: usize },
    /// Changed by more than the reset delta, cache and counters were reset.
    Reset { previous: usize, current: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingScanOutcome {
    /// The loop guard has the monitor disabled.
    Disabled,
    Throttled,
    NothingToBind,
    Bound(usize),
    /// Too many unbound candidates, nothing was bound.
    SkippedRegeneration(usize),
    /// This pass reached the consecutive fix limit, the monitor is now disabled.
    Tripped { bound: usize },
}

/// Scans a view for unbound linking controls and binds them, with a loop guard.
pub struct BindingMonitor {
    config: MonitorConfig,
    classifier: ControlClassifier,
    dispatcher: Arc<dyn CommandDispatcher>,
    state: MonitorState,
}

impl BindingMonitor {
    pub fn new(config: MonitorConfig, dispatcher: Arc<dyn CommandDispatcher>) -> Self {
        Self {
            classifier: ControlClassifier::new(config.trace_classifications),
            state: MonitorState::new(&config),
            config,
            dispatcher,
        }
    }

    pub fn state(&self) -> &MonitorState {
        &self.state
    }

    /// Compares the shipment count with the last observation, refreshes derived views on change.
    pub fn structural_scan(&mut self, view: &dyn BindingView, now: Instant) -> StructuralScanOutcome {
        let present = view
            .controls()
            .iter()
            .map(|control| control.id)
            .collect::<HashSet<ControlId>>();
        let pruned = self
            .state
            .fixed_controls_cache
            .retain_present(&present);
        if pruned > 0 {
            debug!(
                "Pruned binding records. pruned: {}, remaining: {}",
                pruned,
                self.state.fixed_controls_cache.len()
            );
        }

        let current = view.shipment_count();
        let Some(previous) = self
            .state
            .last_shipment_count
            .replace(current)
        else {
            return StructuralScanOutcome::Initial;
        };

        if previous == current {
            return StructuralScanOutcome::Unchanged;
        }

        view.request_refresh();

        if previous.abs_diff(current) > self.config.structural_reset_delta {
            info!(
                "Shipment count changed, resetting bindings. previous: {}, current: {}, at: {:?}",
                previous, current, now
            );
            self.state.reset();
            return StructuralScanOutcome::Reset {
                previous,
                current,
            };
        }

        debug!("Shipment count changed. previous: {}, current: {}", previous, current);
        StructuralScanOutcome::Changed {
            previous,
            current,
        }
    }

    pub fn binding_scan(&mut self, view: &dyn BindingView, now: Instant) -> BindingScanOutcome {
        if !self.state.enabled {
            match self.state.disabled_until {
                Some(until) if now >= until => self.resume(),
                _ => return BindingScanOutcome::Disabled,
            }
        }

        if self.state.is_throttled(now) {
            trace!("Binding scan throttled.");
            return BindingScanOutcome::Throttled;
        }

        let candidates = view
            .controls()
            .into_iter()
            .filter(|control| !control.bound && !self.state.fixed_controls_cache.contains(&control.id))
            .filter_map(|control| {
                let action = self.classifier.classify(&control).ok()?;
                let shipment_id = control.row_shipment_id?;
                Some((control.id, ControlCommand {
                    action,
                    shipment_id,
                }))
            })
            .collect::<Vec<_>>();

        if candidates.len() > self.config.sanity_threshold {
            warn!(
                "Too many unbound linking controls, skipping binding. candidates: {}, threshold: {}",
                candidates.len(),
                self.config.sanity_threshold
            );
            return match self.record_fix_pass(now) {
                true => BindingScanOutcome::Tripped {
                    bound: 0,
                },
                false => BindingScanOutcome::SkippedRegeneration(candidates.len()),
            };
        }

        if candidates.is_empty() {
            self.state.consecutive_fix_count = self
                .state
                .consecutive_fix_count
                .saturating_sub(1);
            return BindingScanOutcome::NothingToBind;
        }

        let mut bound = 0;
        for (control_id, command) in candidates {
            let action = command.action;
            let handler = BindingHandler::new(command, self.dispatcher.clone());
            match view.bind(control_id, handler) {
                Ok(()) => {
                    self.state
                        .fixed_controls_cache
                        .insert(ControlBindingRecord {
                            control_id,
                            action,
                            bound_at: now,
                        });
                    bound += 1;
                }
                Err(error) => {
                    debug!("Binding skipped. control: {}, reason: {}", control_id, error);
                }
            }
        }
        debug!("Bound controls. bound: {}, cached: {}", bound, self.state.fixed_controls_cache.len());

        match self.record_fix_pass(now) {
            true => BindingScanOutcome::Tripped {
                bound,
            },
            false => BindingScanOutcome::Bound(bound),
        }
    }

    /// Returns true if the pass tripped the loop guard.
    fn record_fix_pass(&mut self, now: Instant) -> bool {
        self.state.last_fix_timestamp = Some(now);
        self.state.consecutive_fix_count += 1;

        if self.state.consecutive_fix_count < self.config.max_consecutive_fixes {
            return false;
        }

        let until = now
            .checked_add(self.config.cooldown)
            .unwrap_or(now + FAR_FUTURE);
        warn!(
            "Binding loop detected, disabling monitor. consecutive_fixes: {}, cooldown: {:?}",
            self.state.consecutive_fix_count, self.config.cooldown
        );
        self.state.enabled = false;
        self.state.disabled_until = Some(until);

        true
    }

    fn resume(&mut self) {
        info!("Cooldown elapsed, resuming monitor.");
        self.state.reset();
        self.state.enabled = true;
        self.state.disabled_until = None;
    }

    /// Runs both scans on their intervals until `shutdown` resolves.
    ///
    /// A notification on `view_changed` triggers an immediate binding scan, still subject to the
    /// throttle window and the loop guard.
    pub async fn run(&mut self, view: &dyn BindingView, view_changed: &Notify, mut shutdown: oneshot::Receiver<()>) {
        let mut structural = interval(
            self.config
                .structural_interval
                .max(Duration::from_millis(1)),
        );
        let mut binding = interval(
            self.config
                .binding_interval
                .max(Duration::from_millis(1)),
        );
        structural.set_missed_tick_behavior(MissedTickBehavior::Delay);
        binding.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(
            "Binding monitor started. structural_interval: {:?}, binding_interval: {:?}",
            self.config.structural_interval, self.config.binding_interval
        );

        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                _ = structural.tick() => {
                    self.structural_scan(view, Instant::now());
                }
                _ = binding.tick() => {
                    self.binding_scan(view, Instant::now());
                }
                _ = view_changed.notified() => {
                    debug!("View changed.");
                    self.binding_scan(view, Instant::now());
                }
            }
        }

        info!("Binding monitor stopped.");
    }
}

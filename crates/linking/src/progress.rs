use std::ops::RangeInclusive;

/// Receives `(percent, message)` updates, percent is on a single 0-100 scale for the whole run.
pub trait ProgressSink: Send + Sync {
    fn report(&self, percent: u8, message: &str);
}

impl<F> ProgressSink for F
where
    F: Fn(u8, &str) + Send + Sync,
{
    fn report(&self, percent: u8, message: &str) {
        self(percent, message)
    }
}

/// Discards all updates.
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn report(&self, _percent: u8, _message: &str) {}
}

/// The phases of an auto-link run, each owns a contiguous slice of the progress scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[derive(strum_macros::Display, strum_macros::EnumIter)]
pub enum AutoLinkPhase {
    Validate,
    Analyze,
    Plan,
    Execute,
    Persist,
    Finalize,
}

impl AutoLinkPhase {
    pub const fn range(&self) -> RangeInclusive<u8> {
        match self {
            AutoLinkPhase::Validate => 0..=15,
            AutoLinkPhase::Analyze => 15..=30,
            AutoLinkPhase::Plan => 30..=45,
            AutoLinkPhase::Execute => 45..=75,
            AutoLinkPhase::Persist => 75..=90,
            AutoLinkPhase::Finalize => 90..=100,
        }
    }

    pub fn start(&self) -> u8 {
        *self.range().start()
    }

    pub fn end(&self) -> u8 {
        *self.range().end()
    }

    /// Maps `done` of `total` units of work into this phase's slice, rounding down.
    pub fn percent_at(&self, done: usize, total: usize) -> u8 {
        if total == 0 {
            return self.end();
        }
        let done = done.min(total);
        let span = (self.end() - self.start()) as usize;

        self.start() + (span * done / total) as u8
    }
}

//! Presentation-side collaborators, the core reports through these and never renders anything itself.

use shipping::Shipment;
use tracing::warn;

use crate::index::LinkIndex;

/// Fire-and-forget user notifications.
pub trait Notifier: Send + Sync {
    fn success(&self, message: &str);
    fn error(&self, message: &str);

    /// A non-fatal problem, the run still reports success.
    fn warning(&self, message: &str) {
        warn!("{}", message);
    }
}

/// Used when no real notification sink is available, writes synchronously to stderr.
#[derive(Debug, Default)]
pub struct AlertNotifier;

impl Notifier for AlertNotifier {
    fn success(&self, message: &str) {
        eprintln!("{}", message);
    }

    fn error(&self, message: &str) {
        eprintln!("Error: {}", message);
    }

    fn warning(&self, message: &str) {
        eprintln!("Warning: {}", message);
    }
}

/// Asks the presentation layer to re-render the derived lists.
pub trait ViewRefresh: Send + Sync {
    fn refresh(&self, index: &LinkIndex) -> anyhow::Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[derive(strum_macros::Display)]
#[strum(serialize_all = "lowercase")]
pub enum EditorMode {
    Manage,
    Add,
}

/// Opens the presentation layer's product editor for a shipment.
pub trait ProductEditor: Send + Sync {
    fn open(&self, shipment: &Shipment, mode: EditorMode) -> anyhow::Result<()>;
}

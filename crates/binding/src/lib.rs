//! Keeps the product-linking controls of a continuously regenerated view bound to their handlers.
//!
//! The [`classifier::ControlClassifier`] decides which controls are linking controls, the
//! [`monitor::BindingMonitor`] scans the view, binds them, and suspends itself when the view is
//! regenerated faster than bindings can stabilize.

pub mod classifier;
pub mod config;
pub mod control;
pub mod dispatch;
pub mod monitor;
pub mod state;
pub mod view;
pub mod vocabulary;


pub use classifier::{ControlClassifier, Rejection};
pub use config::MonitorConfig;
pub use control::{ControlAction, ControlDescriptor, ControlId};
pub use monitor::{BindingMonitor, BindingScanOutcome, StructuralScanOutcome};
pub use state::{ControlBindingRecord, MonitorState};
pub use view::{BindError, BindingHandler, BindingView, CommandDispatcher, ControlCommand};

//! Automatic association of catalog products with unlinked shipments.
//!
//! The [`orchestrator::AutoLinker`] sequences a run through six phases, see [`progress::AutoLinkPhase`].
//! Planning is done by the [`planner::SelectionPlanner`], application by the [`execution::ExecutionEngine`].

pub mod cancel;
pub mod config;
pub mod execution;
pub mod hooks;
pub mod index;
pub mod orchestrator;
pub mod planner;
pub mod progress;

pub use cancel::CancelToken;
pub use config::AutoLinkConfig;
pub use execution::{ExecutionResult, ItemFailure, MergeLinker, ProductLinker};
pub use orchestrator::{AutoLinkError, AutoLinkReport, AutoLinker, ErrorCategory, PrerequisiteError, RunScope, Terminal};
pub use planner::{LinkingPlanItem, PlannedProduct, SelectionPlanner};
pub use progress::{AutoLinkPhase, ProgressSink};

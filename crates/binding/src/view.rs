use std::fmt::{Debug, Formatter};
use std::sync::Arc;

use shipping::ShipmentId;
use thiserror::Error;

use crate::control::{ControlAction, ControlDescriptor, ControlId};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BindError {
    #[error("Control no longer exists. control: {0}")]
    ControlGone(ControlId),
    #[error("Control is already bound. control: {0}")]
    AlreadyBound(ControlId),
}

/// What a bound control asks for when it is activated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlCommand {
    pub action: ControlAction,
    pub shipment_id: ShipmentId,
}

/// Routes commands from bound controls to the orchestrator entry points.
pub trait CommandDispatcher: Send + Sync {
    fn dispatch(&self, command: ControlCommand);
}

/// The handler attached to a bound control.
#[derive(Clone)]
pub struct BindingHandler {
    command: ControlCommand,
    dispatcher: Arc<dyn CommandDispatcher>,
}

impl BindingHandler {
    pub fn new(command: ControlCommand, dispatcher: Arc<dyn CommandDispatcher>) -> Self {
        Self {
            command,
            dispatcher,
        }
    }

    pub fn command(&self) -> &ControlCommand {
        &self.command
    }

    /// Called by the view when the control is activated.
    pub fn invoke(&self) {
        self.dispatcher
            .dispatch(self.command.clone());
    }
}

impl Debug for BindingHandler {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BindingHandler")
            .field("command", &self.command)
            .finish_non_exhaustive()
    }
}

/// The presentation layer as seen by the binding monitor.
pub trait BindingView: Send + Sync {
    /// A snapshot of the controls currently in the view.
    fn controls(&self) -> Vec<ControlDescriptor>;

    fn shipment_count(&self) -> usize;

    fn bind(&self, control_id: ControlId, handler: BindingHandler) -> Result<(), BindError>;

    /// Re-render the derived lists, e.g. unlinked shipments and per-product link counts.
    fn request_refresh(&self);
}

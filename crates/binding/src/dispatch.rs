use std::sync::Arc;

use linking::{AutoLinker, CancelToken, ProgressSink, RunScope};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::control::ControlAction;
use crate::view::{CommandDispatcher, ControlCommand};

/// Queues commands for [`serve_commands`].
#[derive(Clone)]
pub struct ChannelDispatcher {
    sender: mpsc::UnboundedSender<ControlCommand>,
}

impl ChannelDispatcher {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<ControlCommand>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (
            Self {
                sender,
            },
            receiver,
        )
    }
}

impl CommandDispatcher for ChannelDispatcher {
    fn dispatch(&self, command: ControlCommand) {
        debug!("Dispatching command. action: {}, shipment: {}", command.action, command.shipment_id);
        if let Err(error) = self.sender.send(command) {
            warn!("Command dropped, nothing is serving commands. command: {:?}", error.0);
        }
    }
}

/// Handles commands one at a time until every dispatcher has been dropped.
///
/// Errors are already reported to the user by the [`AutoLinker`], here they are only logged.
/// Returns the number of commands handled.
pub async fn serve_commands(
    mut receiver: mpsc::UnboundedReceiver<ControlCommand>,
    auto_linker: Arc<AutoLinker>,
    progress: Arc<dyn ProgressSink>,
    cancel: CancelToken,
) -> usize {
    let mut handled = 0;

    while let Some(command) = receiver.recv().await {
        handled += 1;
        let ControlCommand {
            action,
            shipment_id,
        } = command;

        match action {
            ControlAction::Link => {
                match auto_linker
                    .run(RunScope::Shipments(vec![shipment_id.clone()]), progress.as_ref(), &cancel)
                    .await
                {
                    Ok(report) => info!(
                        "Linked from control. shipment: {}, terminal: {}, products: {}",
                        shipment_id, report.terminal, report.execution.total_products
                    ),
                    Err(error) => warn!("Link command failed. shipment: {}, error: {}", shipment_id, error),
                }
            }
            ControlAction::Manage => {
                if let Err(error) = auto_linker.manage_products(&shipment_id) {
                    warn!("Manage command failed. shipment: {}, error: {}", shipment_id, error);
                }
            }
            ControlAction::Add => {
                if let Err(error) = auto_linker.add_products(&shipment_id) {
                    warn!("Add command failed. shipment: {}, error: {}", shipment_id, error);
                }
            }
        }
    }

    info!("Command queue closed. handled: {}", handled);
    handled
}

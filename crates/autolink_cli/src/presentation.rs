//! Terminal stand-ins for the presentation hooks.

use linking::hooks::ViewRefresh;
use linking::index::LinkIndex;
use linking::ProgressSink;
use tracing::{debug, info};

pub(crate) struct LogProgress;

impl ProgressSink for LogProgress {
    fn report(&self, percent: u8, message: &str) {
        info!("Progress. percent: {}, message: {}", percent, message);
    }
}

/// There are no derived lists to re-render, the refreshed index is logged instead.
pub(crate) struct LogViewRefresh;

impl ViewRefresh for LogViewRefresh {
    fn refresh(&self, index: &LinkIndex) -> anyhow::Result<()> {
        info!(
            "Refreshed link index. linked_shipments: {}, unlinked_shipments: {}",
            index.linked_shipments,
            index.unlinked_shipments.len()
        );
        for (product_id, stats) in index.link_counts.iter() {
            debug!(
                "Product links. product: {}, shipments: {}, quantity: {}",
                product_id, stats.shipments, stats.quantity
            );
        }
        Ok(())
    }
}

use std::time::Duration;

use shipping::{LinkError, LinkOutcome, Product, ProductId, Shipment, ShipmentId};
use stores::catalog::Catalog;
use stores::shipments::{ShipmentStore, ShipmentUpdate, StoreError};
use thiserror::Error;
use tracing::{debug, info, trace, warn};

use crate::cancel::{pause, CancelToken};
use crate::config::AutoLinkConfig;
use crate::planner::LinkingPlanItem;
use crate::progress::{AutoLinkPhase, ProgressSink};

/// The linking capability, applies one product to an in-memory copy of a shipment.
pub trait ProductLinker: Send + Sync {
    fn link(&self, shipment: &mut Shipment, product: &Product, quantity: u32) -> Result<LinkOutcome, LinkError>;
}

/// Links by merging, at most one entry per product, see [`Shipment::link_product`].
#[derive(Debug, Default)]
pub struct MergeLinker;

impl ProductLinker for MergeLinker {
    fn link(&self, shipment: &mut Shipment, product: &Product, quantity: u32) -> Result<LinkOutcome, LinkError> {
        shipment.link_product(product, quantity)
    }
}

#[derive(Error, Debug)]
pub enum ItemError {
    #[error("Shipment not found. shipment: {0}")]
    ShipmentVanished(ShipmentId),

    #[error("Product not in catalog. shipment: {shipment}, product: {product}")]
    ProductNotInCatalog { shipment: ShipmentId, product: ProductId },

    #[error(transparent)]
    Link(#[from] LinkError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemFailure {
    pub shipment_id: ShipmentId,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionResult {
    pub success_count: usize,
    pub failure_count: usize,
    /// Product entries applied by successful items.
    pub total_products: usize,
    pub errors: Vec<ItemFailure>,
    /// Set when the run was cancelled before every item was processed.
    pub cancelled: bool,
}

impl ExecutionResult {
    pub fn processed(&self) -> usize {
        self.success_count + self.failure_count
    }
}

/// Applies a plan to the store, item by item, in batches.
pub struct ExecutionEngine<'a> {
    store: &'a dyn ShipmentStore,
    catalog: &'a Catalog,
    linker: &'a dyn ProductLinker,
    batch_size: usize,
    item_delay: Duration,
    batch_delay: Duration,
}

impl<'a> ExecutionEngine<'a> {
    pub fn new(
        store: &'a dyn ShipmentStore,
        catalog: &'a Catalog,
        linker: &'a dyn ProductLinker,
        config: &AutoLinkConfig,
    ) -> Self {
        Self {
            store,
            catalog,
            linker,
            batch_size: config.effective_batch_size(),
            item_delay: config.item_delay,
            batch_delay: config.batch_delay,
        }
    }

    /// Items are applied in plan order, a failed item is recorded and processing continues.
    ///
    /// Progress is reported after every item, mapped into the execute phase.
    pub async fn execute(
        &self,
        plan: &[LinkingPlanItem],
        progress: &dyn ProgressSink,
        cancel: &CancelToken,
    ) -> ExecutionResult {
        let mut result = ExecutionResult::default();
        let total = plan.len();

        info!("Executing plan. items: {}, batch_size: {}", total, self.batch_size);

        'batches: for (batch_index, batch) in plan
            .chunks(self.batch_size)
            .enumerate()
        {
            if batch_index > 0 && pause(self.batch_delay, cancel).await.is_err() {
                result.cancelled = true;
                break;
            }

            for (item_index, item) in batch.iter().enumerate() {
                let interrupted = match item_index {
                    0 => cancel.is_cancelled(),
                    _ => pause(self.item_delay, cancel)
                        .await
                        .is_err(),
                };
                if interrupted {
                    result.cancelled = true;
                    break 'batches;
                }

                match self.apply_item(item) {
                    Ok(applied) => {
                        result.success_count += 1;
                        result.total_products += applied;
                    }
                    Err(error) => {
                        warn!("Linking failed. shipment: {}, error: {}", item.shipment_id, error);
                        result.failure_count += 1;
                        result.errors.push(ItemFailure {
                            shipment_id: item.shipment_id.clone(),
                            message: error.to_string(),
                        });
                    }
                }

                let done = result.processed();
                progress.report(
                    AutoLinkPhase::Execute.percent_at(done, total),
                    &format!("{}/{} processed, {} successes", done, total, result.success_count),
                );
            }
        }

        if result.cancelled {
            info!("Execution cancelled. processed: {}, total: {}", result.processed(), total);
        }

        result
    }

    /// Returns the number of product entries applied.
    fn apply_item(&self, item: &LinkingPlanItem) -> Result<usize, ItemError> {
        let mut shipment = self
            .store
            .get(&item.shipment_id)
            .ok_or_else(|| ItemError::ShipmentVanished(item.shipment_id.clone()))?;

        for planned in item.products.iter() {
            let product =
                self.catalog
                    .get(&planned.product_id)
                    .ok_or_else(|| ItemError::ProductNotInCatalog {
                        shipment: item.shipment_id.clone(),
                        product: planned.product_id.clone(),
                    })?;

            let outcome = self
                .linker
                .link(&mut shipment, product, planned.quantity)?;
            trace!(
                "Linked product. shipment: {}, product: {}, outcome: {:?}",
                item.shipment_id,
                product.id,
                outcome
            );
        }

        match self
            .store
            .update(&item.shipment_id, ShipmentUpdate::products(shipment.products))
        {
            Ok(updated) => {
                debug!(
                    "Applied plan item. shipment: {}, products: {}",
                    updated.id,
                    updated.products.len()
                );
                Ok(item.products.len())
            }
            Err(StoreError::ShipmentNotFound(id)) => Err(ItemError::ShipmentVanished(id)),
            Err(error) => Err(error.into()),
        }
    }
}

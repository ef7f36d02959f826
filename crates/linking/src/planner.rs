use std::ops::RangeInclusive;

use rand::seq::SliceRandom;
use rand::Rng;
use shipping::{Product, ProductId, Shipment, ShipmentId, ShipmentType};
use thiserror::Error;
use tracing::{debug, trace};

#[derive(Debug, Clone, PartialEq)]
pub struct PlannedProduct {
    pub product_id: ProductId,
    pub quantity: u32,
    pub expected_value: f64,
}

/// A proposed, not yet applied, set of product/quantity pairs for one shipment.
#[derive(Debug, Clone, PartialEq)]
pub struct LinkingPlanItem {
    pub shipment_id: ShipmentId,
    /// Never empty.
    pub products: Vec<PlannedProduct>,
    pub expected_value: f64,
}

/// Raised while computing a quantity, the product is dropped from the plan.
#[derive(Error, Debug, PartialEq)]
pub enum QuantityError {
    #[error("Product specifications are missing or malformed. product: {0}")]
    MalformedSpecifications(ProductId),
}

/// How many products a shipment of the given type should receive.
pub fn target_range(kind: ShipmentType) -> RangeInclusive<usize> {
    match kind {
        ShipmentType::Container => 2..=3,
        ShipmentType::Awb => 1..=2,
        ShipmentType::Bl => 2..=3,
        ShipmentType::Lcl => 1..=3,
        ShipmentType::Parcel | ShipmentType::Other => 1..=2,
    }
}

/// Base unit count, the more valuable the product the fewer units.
pub fn base_units(value: f64) -> u32 {
    if value > 1000.0 {
        3
    } else if value > 500.0 {
        5
    } else if value > 100.0 {
        8
    } else {
        12
    }
}

pub fn type_multiplier(kind: ShipmentType) -> f64 {
    match kind {
        ShipmentType::Container => 1.5,
        ShipmentType::Awb => 0.6,
        ShipmentType::Lcl => 0.8,
        _ => 1.0,
    }
}

/// The upper bound for a quantity draw, never less than 1.
pub fn max_quantity(value: f64, kind: ShipmentType) -> u32 {
    let scaled = (base_units(value) as f64 * type_multiplier(kind)).floor() as u32;
    scaled.max(1)
}

/// Decides which products, and how many of each, to propose for each unlinked shipment.
///
/// The only impurity is the random source, inject a seeded one for deterministic plans.
pub struct SelectionPlanner<R> {
    rng: R,
    max_products_per_shipment: usize,
}

impl<R: Rng> SelectionPlanner<R> {
    pub fn new(rng: R, max_products_per_shipment: usize) -> Self {
        Self {
            rng,
            max_products_per_shipment,
        }
    }

    /// Shipments that end up with no plannable products are omitted.
    pub fn plan(&mut self, unlinked: &[Shipment], products: &[Product]) -> Vec<LinkingPlanItem> {
        let plan = unlinked
            .iter()
            .filter_map(|shipment| self.plan_shipment(shipment, products))
            .collect::<Vec<_>>();

        debug!(
            "Planned links. shipments: {}, planned: {}, products: {}",
            unlinked.len(),
            plan.len(),
            plan.iter()
                .map(|item| item.products.len())
                .sum::<usize>()
        );

        plan
    }

    pub fn plan_shipment(&mut self, shipment: &Shipment, products: &[Product]) -> Option<LinkingPlanItem> {
        let target = self
            .rng
            .random_range(target_range(shipment.kind))
            .min(products.len())
            .min(self.max_products_per_shipment);

        if target == 0 {
            trace!("Nothing to plan. shipment: {}", shipment.id);
            return None;
        }

        // shuffle so the selection does not correlate with catalog order
        let mut candidates = products.iter().collect::<Vec<_>>();
        candidates.shuffle(&mut self.rng);

        let planned = candidates
            .into_iter()
            .take(target)
            .filter_map(|product| match self.quantity_for(product, shipment.kind) {
                Ok(quantity) => Some(PlannedProduct {
                    product_id: product.id.clone(),
                    quantity,
                    expected_value: quantity as f64 * product.valid_specifications().map_or(0.0, |it| it.value),
                }),
                Err(error) => {
                    debug!("Skipping product. shipment: {}, reason: {}", shipment.id, error);
                    None
                }
            })
            .collect::<Vec<_>>();

        if planned.is_empty() {
            return None;
        }

        let expected_value = planned
            .iter()
            .map(|planned| planned.expected_value)
            .sum();

        Some(LinkingPlanItem {
            shipment_id: shipment.id.clone(),
            products: planned,
            expected_value,
        })
    }

    pub fn quantity_for(&mut self, product: &Product, kind: ShipmentType) -> Result<u32, QuantityError> {
        let specifications = product
            .valid_specifications()
            .ok_or_else(|| QuantityError::MalformedSpecifications(product.id.clone()))?;

        let max = max_quantity(specifications.value, kind);

        Ok(self.rng.random_range(1..=max))
    }
}

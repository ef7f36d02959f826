use indexmap::IndexMap;
use shipping::{ProductId, Shipment, ShipmentId};
use stores::catalog::Catalog;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProductLinkStats {
    /// Number of shipments the product is linked to.
    pub shipments: usize,
    /// Sum of the linked quantities.
    pub quantity: u64,
}

/// Indexes derived from the shipment list, recomputed after each run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinkIndex {
    /// In catalog order, products that are linked but no longer in the catalog come last.
    pub link_counts: IndexMap<ProductId, ProductLinkStats>,
    pub unlinked_shipments: Vec<ShipmentId>,
    pub linked_shipments: usize,
}

impl LinkIndex {
    pub fn build(shipments: &[Shipment], catalog: &Catalog) -> Self {
        let mut link_counts = catalog
            .products()
            .map(|product| (product.id.clone(), ProductLinkStats::default()))
            .collect::<IndexMap<_, _>>();

        let mut unlinked_shipments = vec![];
        let mut linked_shipments = 0;

        for shipment in shipments {
            if shipment.is_unlinked() {
                unlinked_shipments.push(shipment.id.clone());
                continue;
            }
            linked_shipments += 1;

            for linked in shipment.products.iter() {
                let stats = link_counts
                    .entry(linked.product_id.clone())
                    .or_default();
                stats.shipments += 1;
                stats.quantity += linked.quantity as u64;
            }
        }

        Self {
            link_counts,
            unlinked_shipments,
            linked_shipments,
        }
    }

    pub fn stats(&self, product_id: &ProductId) -> ProductLinkStats {
        self.link_counts
            .get(product_id)
            .copied()
            .unwrap_or_default()
    }
}

use std::sync::Arc;

use anyhow::Context;
use cli::args::OutputFormatArg;
use linking::index::LinkIndex;
use shipping::{ProductId, ShipmentId, ShipmentType};
use stores::catalog::{load_catalog, Catalog, CatalogOrigin};
use stores::kv::{FileKeyValueStore, KeyValueStore};
use stores::shipments::{InMemoryShipmentStore, ShipmentStore};
use tracing::{info, Level};

use crate::opts::ReportArgs;

#[derive(Debug, PartialEq, serde::Serialize)]
struct ProductLinksRow {
    product_id: ProductId,
    product_name: Option<String>,
    shipments: usize,
    quantity: u64,
}

#[derive(Debug, PartialEq, serde::Serialize)]
struct LinkReport {
    shipment_type: Option<ShipmentType>,
    shipments: usize,
    linked_shipments: usize,
    unlinked_shipments: Vec<ShipmentId>,
    products: Vec<ProductLinksRow>,
}

#[tracing::instrument(level = Level::DEBUG)]
pub(crate) fn report(args: ReportArgs) -> anyhow::Result<()> {
    let durable: Arc<dyn KeyValueStore> = Arc::new(FileKeyValueStore::new(args.store.store_dir.clone()));
    let store = InMemoryShipmentStore::load(durable.clone())
        .with_context(|| format!("Loading shipments. directory: {}", args.store.store_dir.display()))?;

    let catalog = match load_catalog(&[CatalogOrigin::Durable], Some(durable.as_ref())) {
        Ok(loaded) => loaded.catalog,
        Err(_) => {
            info!("No stored catalog, reporting linked products only");
            Catalog::default()
        }
    };

    let shipment_type = args.shipment_type.map(ShipmentType::from);
    let shipments = store
        .list()
        .into_iter()
        .filter(|shipment| shipment_type.map_or(true, |kind| shipment.kind == kind))
        .collect::<Vec<_>>();

    let link_report = build_report(shipment_type, shipments.len(), &LinkIndex::build(&shipments, &catalog), &catalog);

    match args.format {
        OutputFormatArg::Text => print_text(&link_report),
        OutputFormatArg::Json => println!("{}", serde_json::to_string_pretty(&link_report)?),
    }

    Ok(())
}

fn build_report(
    shipment_type: Option<ShipmentType>,
    shipments: usize,
    index: &LinkIndex,
    catalog: &Catalog,
) -> LinkReport {
    let products = index
        .link_counts
        .iter()
        .map(|(product_id, stats)| ProductLinksRow {
            product_id: product_id.clone(),
            product_name: catalog
                .get(product_id)
                .map(|product| product.name.clone()),
            shipments: stats.shipments,
            quantity: stats.quantity,
        })
        .collect();

    LinkReport {
        shipment_type,
        shipments,
        linked_shipments: index.linked_shipments,
        unlinked_shipments: index.unlinked_shipments.clone(),
        products,
    }
}

fn print_text(report: &LinkReport) {
    if let Some(kind) = report.shipment_type {
        println!("Type: {}", kind);
    }
    println!("Shipments: {}", report.shipments);
    println!("Linked shipments: {}", report.linked_shipments);
    println!("Unlinked shipments: {}", report.unlinked_shipments.len());
    for shipment_id in report.unlinked_shipments.iter() {
        println!("  {}", shipment_id);
    }
    println!("Products:");
    for row in report.products.iter() {
        println!(
            "  {} ({}): shipments: {}, quantity: {}",
            row.product_id,
            row.product_name
                .as_deref()
                .unwrap_or("not in catalog"),
            row.shipments,
            row.quantity
        );
    }
}

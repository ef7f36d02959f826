use std::sync::Arc;

use anyhow::Context;
use linking::{AutoLinkReport, AutoLinker, CancelToken, MergeLinker, RunScope, Terminal};
use rand::rngs::SmallRng;
use rand::SeedableRng;
use shipping::ShipmentId;
use stores::catalog::{load_catalog, store_catalog, CatalogOrigin};
use stores::kv::{FileKeyValueStore, KeyValueStore};
use stores::shipments::InMemoryShipmentStore;
use tracing::{info, warn, Level};

use crate::config::CliConfig;
use crate::opts::LinkArgs;
use crate::presentation::{LogProgress, LogViewRefresh};

/// Used for sample generation when no seed is given, so repeated sample runs produce the same catalog.
const DEFAULT_SAMPLE_SEED: u64 = 42;

#[tracing::instrument(level = Level::DEBUG)]
pub(crate) async fn link(args: LinkArgs) -> anyhow::Result<()> {
    let config = CliConfig::load(args.config.as_deref())?;
    let auto_link_config = config.auto_link_for(&args);

    let durable: Arc<dyn KeyValueStore> = Arc::new(FileKeyValueStore::new(args.store.store_dir.clone()));
    let store = InMemoryShipmentStore::load(durable.clone())
        .with_context(|| format!("Loading shipments. directory: {}", args.store.store_dir.display()))?;

    let origins = catalog_origins(&args);
    let loaded = load_catalog(&origins, Some(durable.as_ref()))?;
    if loaded.origin != CatalogOrigin::Durable {
        if let Err(error) = store_catalog(durable.as_ref(), &loaded.catalog) {
            warn!("Unable to store catalog. error: {:?}", error);
        }
    }

    let rng = match args.seed {
        Some(seed) => SmallRng::seed_from_u64(seed),
        None => SmallRng::from_os_rng(),
    };

    let auto_linker = AutoLinker::new(auto_link_config)
        .with_store(Arc::new(store))
        .with_catalog(Arc::new(loaded.catalog))
        .with_linker(Arc::new(MergeLinker))
        .with_view_refresh(Arc::new(LogViewRefresh))
        .with_rng(rng);

    let scope = match args.shipment.is_empty() {
        true => RunScope::All,
        false => RunScope::Shipments(
            args.shipment
                .iter()
                .map(|id| ShipmentId::from(id.as_str()))
                .collect(),
        ),
    };

    let cancel = CancelToken::new();
    let ctrl_c = tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c()
                .await
                .is_ok()
            {
                info!("Interrupted, cancelling auto-link run");
                cancel.cancel();
            }
        }
    });

    let result = auto_linker
        .run(scope, &LogProgress, &cancel)
        .await;
    ctrl_c.abort();

    let report = result.map_err(|error| anyhow::anyhow!(error.user_message()))?;
    print_report(&report);

    Ok(())
}

fn catalog_origins(args: &LinkArgs) -> Vec<CatalogOrigin> {
    let mut origins = vec![];
    if let Some(source) = &args.catalog {
        origins.push(CatalogOrigin::Feed(source.clone()));
    }
    origins.push(CatalogOrigin::Durable);
    if args.sample_products > 0 {
        origins.push(CatalogOrigin::Sample {
            count: args.sample_products,
            seed: args.seed.unwrap_or(DEFAULT_SAMPLE_SEED),
        });
    }
    origins
}

fn print_report(report: &AutoLinkReport) {
    match report.terminal {
        Terminal::NothingToDo => {
            println!("All shipments already have products linked.");
        }
        Terminal::Success | Terminal::Cancelled => {
            let execution = &report.execution;
            println!("Result: {}", report.terminal);
            println!("Unlinked shipments: {}", report.unlinked_shipments);
            println!("Planned shipments: {}", report.planned_shipments);
            println!("Linked shipments: {}", execution.success_count);
            println!("Failed shipments: {}", execution.failure_count);
            println!("Products linked: {}", execution.total_products);
            for failure in execution.errors.iter() {
                println!("Failure: {}: {}", failure.shipment_id, failure.message);
            }
        }
    }
    for warning in report.warnings.iter() {
        println!("Warning: {}", warning);
    }
}

use std::fmt::{Display, Formatter};

use anyhow::Context;
use async_trait::async_trait;
use indexmap::IndexMap;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use shipping::{Product, ProductId, Specifications};
use thiserror::Error;
use tracing::{info, warn, Level};

use crate::kv::KeyValueStore;
use crate::products::{load_products, ProductsSource};
use crate::shipments::StoreError;

pub const PRODUCTS_KEY: &str = "products";

/// The contract the linking engine depends on for the product catalog.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    fn list(&self) -> Vec<Product>;

    /// Resolves once the catalog has been loaded.
    async fn wait_ready(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

/// A loaded catalog, products are kept in source order.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    products: IndexMap<ProductId, Product>,
}

impl Catalog {
    /// Later duplicates of an id replace earlier ones.
    pub fn new(products: Vec<Product>) -> Self {
        let products = products
            .into_iter()
            .map(|product| (product.id.clone(), product))
            .collect::<IndexMap<_, _>>();

        Self {
            products,
        }
    }

    pub fn get(&self, id: &ProductId) -> Option<&Product> {
        self.products.get(id)
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    pub fn products(&self) -> impl Iterator<Item = &Product> {
        self.products.values()
    }
}

#[async_trait]
impl CatalogSource for Catalog {
    fn list(&self) -> Vec<Product> {
        self.products
            .values()
            .cloned()
            .collect()
    }
}

/// Where a catalog can be loaded from.
#[derive(Debug, Clone, PartialEq)]
pub enum CatalogOrigin {
    /// A CSV feed.
    Feed(ProductsSource),
    /// The products previously stored under [`PRODUCTS_KEY`].
    Durable,
    /// A generated set of products.
    Sample { count: usize, seed: u64 },
}

impl Display for CatalogOrigin {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            CatalogOrigin::Feed(source) => write!(f, "feed ({})", source),
            CatalogOrigin::Durable => f.write_str("durable store"),
            CatalogOrigin::Sample {
                count,
                seed,
            } => write!(f, "sample (count: {}, seed: {})", count, seed),
        }
    }
}

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("No catalog source provided any products. tried: [{}]", .0.iter().map(ToString::to_string).collect::<Vec<_>>().join(", "))]
    NoProducts(Vec<CatalogOrigin>),
}

#[derive(Debug)]
pub struct LoadedCatalog {
    pub catalog: Catalog,
    pub origin: CatalogOrigin,
}

/// Try each origin in turn, the first one that yields a non-empty catalog wins.
///
/// A failing origin is logged and skipped.
#[tracing::instrument(level = Level::DEBUG, skip(durable))]
pub fn load_catalog(
    origins: &[CatalogOrigin],
    durable: Option<&dyn KeyValueStore>,
) -> Result<LoadedCatalog, CatalogError> {
    for origin in origins {
        let result = match origin {
            CatalogOrigin::Feed(source) => load_products(source),
            CatalogOrigin::Durable => match durable {
                Some(durable) => load_durable_products(durable),
                None => Ok(vec![]),
            },
            CatalogOrigin::Sample {
                count,
                seed,
            } => Ok(generate_sample_products(*count, *seed)),
        };

        match result {
            Ok(products) if !products.is_empty() => {
                info!("Loaded catalog. origin: {}, products: {}", origin, products.len());
                return Ok(LoadedCatalog {
                    catalog: Catalog::new(products),
                    origin: origin.clone(),
                });
            }
            Ok(_) => {
                info!("Catalog origin has no products. origin: {}", origin);
            }
            Err(error) => {
                warn!("Unable to load catalog. origin: {}, error: {:?}", origin, error);
            }
        }
    }

    Err(CatalogError::NoProducts(origins.to_vec()))
}

fn load_durable_products(durable: &dyn KeyValueStore) -> anyhow::Result<Vec<Product>> {
    let Some(content) = durable.get(PRODUCTS_KEY)? else {
        return Ok(vec![]);
    };

    serde_json::from_slice::<Vec<Product>>(&content).with_context(|| "Deserializing stored products".to_string())
}

pub fn store_catalog(durable: &dyn KeyValueStore, catalog: &Catalog) -> anyhow::Result<()> {
    let content = serde_json::to_vec_pretty(&catalog.list())?;
    durable.put(PRODUCTS_KEY, &content)?;

    info!("Stored catalog. products: {}", catalog.len());
    Ok(())
}

const SAMPLE_NAMES: [&str; 10] = [
    "Espresso machine",
    "Olive oil (case)",
    "Ceramic tiles",
    "Bicycle frame",
    "Leather bag",
    "Marble slab",
    "Wine (case)",
    "Textile roll",
    "Spare parts kit",
    "Printer cartridges",
];

/// Deterministic for a given `seed`.
pub fn generate_sample_products(count: usize, seed: u64) -> Vec<Product> {
    let mut rng = SmallRng::seed_from_u64(seed);

    (0..count)
        .map(|index| {
            let name = SAMPLE_NAMES[index % SAMPLE_NAMES.len()];
            let number = index + 1;

            Product::new(
                ProductId::from(format!("SAMPLE-{:03}", number)),
                name.to_string(),
                format!("SKU-{:05}", rng.random_range(10000..100000)),
                Specifications {
                    weight: (rng.random_range(0.5..500.0_f64) * 10.0).round() / 10.0,
                    volume: (rng.random_range(0.01..5.0_f64) * 100.0).round() / 100.0,
                    value: rng.random_range(20..2500) as f64,
                },
            )
        })
        .collect()
}

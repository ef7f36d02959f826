use anyhow::{anyhow, Context, Error};
use shipping::Product;
use tracing::Level;
use tracing::{info, trace};
use util::source::Source;

use crate::csv::ProductRecord;

pub type ProductsSource = Source;

#[tracing::instrument(level = Level::DEBUG)]
pub fn load_products(source: &ProductsSource) -> Result<Vec<Product>, Error> {
    info!("Loading products. source: {}", source);

    let path = source
        .path()
        .map_err(|error| anyhow!("Unsupported source type. cause: {:?}", error))?;

    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path.clone())
        .with_context(|| format!("Error reading products. file: {}", path.display()))?;

    let mut products: Vec<Product> = vec![];

    for result in csv_reader.deserialize() {
        let record: ProductRecord = result.with_context(|| "Deserializing product record".to_string())?;

        trace!("{:?}", record);

        let product = record
            .build_product()
            .with_context(|| format!("Building product from record. record: {:?}", record))?;

        products.push(product);
    }
    Ok(products)
}

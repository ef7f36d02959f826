use anyhow::{bail, Error};
use shipping::{Product, ProductId, Specifications};

#[derive(Debug, serde::Deserialize, serde::Serialize)]
#[serde(rename_all(deserialize = "PascalCase", serialize = "PascalCase"))]
pub struct ProductRecord {
    pub id: String,
    pub name: String,
    pub sku: String,
    pub weight: Option<f64>,
    pub volume: Option<f64>,
    pub value: Option<f64>,
}

impl ProductRecord {
    /// Missing unit values are not an error here, such a product is loaded without specifications
    /// and the planner will skip it.
    pub fn build_product(&self) -> Result<Product, Error> {
        if self.id.trim().is_empty() {
            bail!("Product id is empty. name: '{}'", self.name)
        }

        let specifications = match (self.weight, self.volume, self.value) {
            (Some(weight), Some(volume), Some(value)) => Some(Specifications {
                weight,
                volume,
                value,
            }),
            _ => None,
        };

        Ok(Product {
            id: ProductId::from(self.id.trim()),
            name: self.name.clone(),
            sku: self.sku.clone(),
            specifications,
        })
    }
}

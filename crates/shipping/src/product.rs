use std::fmt::{Display, Formatter};

#[derive(Debug, Clone)]
#[derive(Hash, PartialEq, Eq, PartialOrd, Ord)]
#[derive(serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct ProductId(String);

impl ProductId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for ProductId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ProductId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for ProductId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Unit values of a product.
#[derive(Debug, Clone, Copy, PartialEq)]
#[derive(serde::Serialize, serde::Deserialize)]
pub struct Specifications {
    pub weight: f64,
    pub volume: f64,
    pub value: f64,
}

impl Specifications {
    /// Catalog feeds are not validated on load, a negative or non-finite number is possible.
    pub fn is_well_formed(&self) -> bool {
        [self.weight, self.volume, self.value]
            .iter()
            .all(|it| it.is_finite() && *it >= 0.0)
    }
}

/// A catalog entry.
///
/// Products are read-only for the duration of an auto-link run.
#[derive(Debug, Clone, PartialEq)]
#[derive(serde::Serialize, serde::Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub sku: String,

    /// `None` when the source did not provide the values, such products cannot be linked.
    #[serde(default)]
    pub specifications: Option<Specifications>,
}

impl Product {
    pub fn new(id: ProductId, name: String, sku: String, specifications: Specifications) -> Self {
        Self {
            id,
            name,
            sku,
            specifications: Some(specifications),
        }
    }

    /// Returns the specifications, if present and well-formed.
    pub fn valid_specifications(&self) -> Option<&Specifications> {
        self.specifications
            .as_ref()
            .filter(|specifications| specifications.is_well_formed())
    }
}

#[cfg(feature = "testing")]
impl Default for Product {
    fn default() -> Self {
        Self {
            id: ProductId::from("P-DEFAULT"),
            name: "Default Product".to_string(),
            sku: "SKU-DEFAULT".to_string(),
            specifications: Some(Specifications {
                weight: 1.0,
                volume: 0.5,
                value: 100.0,
            }),
        }
    }
}

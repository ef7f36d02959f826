use std::fmt::{Display, Formatter};

use thiserror::Error;

use crate::product::{Product, ProductId};

#[derive(Debug, Clone)]
#[derive(Hash, PartialEq, Eq, PartialOrd, Ord)]
#[derive(serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct ShipmentId(String);

impl ShipmentId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for ShipmentId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ShipmentId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for ShipmentId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[derive(serde::Serialize, serde::Deserialize)]
#[derive(strum_macros::Display, strum_macros::EnumString, strum_macros::EnumIter)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum ShipmentType {
    Container,
    Awb,
    Bl,
    Lcl,
    Parcel,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[derive(serde::Serialize, serde::Deserialize)]
pub struct Route {
    pub origin: String,
    pub destination: String,
}

/// A product linked to a shipment.
///
/// The unit values are copied from the [`Product`] at link time so that existing links are not
/// affected by later catalog edits.
#[derive(Debug, Clone, PartialEq)]
#[derive(serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkedProduct {
    pub product_id: ProductId,
    pub product_name: String,
    pub sku: String,
    pub quantity: u32,
    pub weight: f64,
    pub volume: f64,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq)]
#[derive(serde::Serialize, serde::Deserialize)]
pub struct Shipment {
    pub id: ShipmentId,
    pub number: String,
    #[serde(rename = "type")]
    pub kind: ShipmentType,
    #[serde(default)]
    pub route: Route,

    /// At most one entry per product.
    #[serde(default)]
    pub products: Vec<LinkedProduct>,
}

#[derive(Error, Debug, PartialEq)]
pub enum LinkError {
    #[error("Quantity must be positive. product: {0}")]
    ZeroQuantity(ProductId),

    #[error("Product specifications are missing or malformed. product: {0}")]
    MalformedSpecifications(ProductId),

    #[error("Quantity overflow. product: {product}, current: {current}, additional: {additional}")]
    QuantityOverflow {
        product: ProductId,
        current: u32,
        additional: u32,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkOutcome {
    Added,
    Incremented { previous: u32, current: u32 },
}

impl Shipment {
    pub fn new(id: ShipmentId, number: String, kind: ShipmentType, route: Route) -> Self {
        Self {
            id,
            number,
            kind,
            route,
            products: vec![],
        }
    }

    pub fn is_unlinked(&self) -> bool {
        self.products.is_empty()
    }

    pub fn find_linked_product(&self, product_id: &ProductId) -> Option<&LinkedProduct> {
        self.products
            .iter()
            .find(|linked| linked.product_id.eq(product_id))
    }

    /// Link `quantity` units of `product` to this shipment.
    ///
    /// If the product is already linked the quantity of the existing entry is increased instead of
    /// adding a second entry.
    pub fn link_product(&mut self, product: &Product, quantity: u32) -> Result<LinkOutcome, LinkError> {
        if quantity == 0 {
            return Err(LinkError::ZeroQuantity(product.id.clone()));
        }

        let specifications = product
            .valid_specifications()
            .ok_or_else(|| LinkError::MalformedSpecifications(product.id.clone()))?;

        match self
            .products
            .iter_mut()
            .find(|linked| linked.product_id.eq(&product.id))
        {
            Some(existing) => {
                let previous = existing.quantity;
                existing.quantity = previous
                    .checked_add(quantity)
                    .ok_or_else(|| LinkError::QuantityOverflow {
                        product: product.id.clone(),
                        current: previous,
                        additional: quantity,
                    })?;

                Ok(LinkOutcome::Incremented {
                    previous,
                    current: existing.quantity,
                })
            }
            None => {
                self.products.push(LinkedProduct {
                    product_id: product.id.clone(),
                    product_name: product.name.clone(),
                    sku: product.sku.clone(),
                    quantity,
                    weight: specifications.weight,
                    volume: specifications.volume,
                    value: specifications.value,
                });

                Ok(LinkOutcome::Added)
            }
        }
    }
}

#[cfg(feature = "testing")]
impl Default for Shipment {
    fn default() -> Self {
        Self {
            id: ShipmentId::from("S-DEFAULT"),
            number: "DEFAULT-0001".to_string(),
            kind: ShipmentType::Other,
            route: Route {
                origin: "Genova".to_string(),
                destination: "Rotterdam".to_string(),
            },
            products: vec![],
        }
    }
}

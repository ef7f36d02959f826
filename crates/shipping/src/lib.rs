pub mod product;
pub mod shipment;

pub use product::{Product, ProductId, Specifications};
pub use shipment::{LinkError, LinkOutcome, LinkedProduct, Route, Shipment, ShipmentId, ShipmentType};

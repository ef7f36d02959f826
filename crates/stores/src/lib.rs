/// Stores are for loading/storing the shipment and catalog data.
///
/// The core only depends on the [`shipments::ShipmentStore`] and [`catalog::CatalogSource`] contracts,
/// durable state is mirrored to a [`kv::KeyValueStore`].
///
/// Example store backends:
/// * Files (e.g. JSON, CSV).
/// * Remote (e.g. REST).
/// * Databases.
/// * Etc.
pub mod catalog;
pub mod csv;
pub mod kv;
pub mod products;
pub mod shipments;

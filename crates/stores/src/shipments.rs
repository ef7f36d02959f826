use std::sync::Arc;

use async_trait::async_trait;
use indexmap::IndexMap;
use parking_lot::RwLock;
use shipping::{LinkedProduct, Route, Shipment, ShipmentId};
use thiserror::Error;
use tracing::{debug, info, Level};

use crate::kv::{KeyValueStore, KeyValueStoreError};

pub const SHIPMENTS_KEY: &str = "shipments";

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Shipment not found. shipment: {0}")]
    ShipmentNotFound(ShipmentId),

    #[error("Store unavailable. reason: {0}")]
    Unavailable(String),

    #[error("Durable store error. cause: {0}")]
    Durable(#[from] KeyValueStoreError),

    #[error("Serialization error. cause: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// A partial update, `None` fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShipmentUpdate {
    pub number: Option<String>,
    pub route: Option<Route>,
    pub products: Option<Vec<LinkedProduct>>,
}

impl ShipmentUpdate {
    pub fn products(products: Vec<LinkedProduct>) -> Self {
        Self {
            products: Some(products),
            ..Self::default()
        }
    }

    fn apply(self, shipment: &mut Shipment) {
        if let Some(number) = self.number {
            shipment.number = number;
        }
        if let Some(route) = self.route {
            shipment.route = route;
        }
        if let Some(products) = self.products {
            shipment.products = products;
        }
    }
}

/// The contract the linking engine depends on.
///
/// Implementations must serialize mutations, `update` is the only way the engine writes.
#[async_trait]
pub trait ShipmentStore: Send + Sync {
    fn list(&self) -> Vec<Shipment>;

    fn get(&self, id: &ShipmentId) -> Option<Shipment>;

    fn update(&self, id: &ShipmentId, update: ShipmentUpdate) -> Result<Shipment, StoreError>;

    /// Mirrors the current state to durable storage.
    async fn persist(&self) -> Result<(), StoreError>;

    /// Resolves once the store can serve requests.
    async fn wait_ready(&self) -> Result<(), StoreError> {
        Ok(())
    }

    fn count(&self) -> usize {
        self.list().len()
    }
}

/// Shipments held in memory, in insertion order, with an optional durable mirror.
pub struct InMemoryShipmentStore {
    shipments: RwLock<IndexMap<ShipmentId, Shipment>>,
    mirror: Option<Arc<dyn KeyValueStore>>,
}

impl InMemoryShipmentStore {
    pub fn new(shipments: Vec<Shipment>) -> Self {
        let shipments = shipments
            .into_iter()
            .map(|shipment| (shipment.id.clone(), shipment))
            .collect::<IndexMap<_, _>>();

        Self {
            shipments: RwLock::new(shipments),
            mirror: None,
        }
    }

    pub fn with_mirror(mut self, mirror: Arc<dyn KeyValueStore>) -> Self {
        self.mirror = Some(mirror);
        self
    }

    /// Load the shipments previously persisted to `mirror`, a missing key is an empty store.
    #[tracing::instrument(level = Level::DEBUG, skip(mirror))]
    pub fn load(mirror: Arc<dyn KeyValueStore>) -> Result<Self, StoreError> {
        let shipments = match mirror.get(SHIPMENTS_KEY)? {
            Some(content) => serde_json::from_slice::<Vec<Shipment>>(&content)?,
            None => vec![],
        };
        info!("Loaded shipments. count: {}", shipments.len());

        Ok(Self::new(shipments).with_mirror(mirror))
    }

    pub fn insert(&self, shipment: Shipment) -> Option<Shipment> {
        self.shipments
            .write()
            .insert(shipment.id.clone(), shipment)
    }

    pub fn remove(&self, id: &ShipmentId) -> Option<Shipment> {
        self.shipments
            .write()
            .shift_remove(id)
    }
}

#[async_trait]
impl ShipmentStore for InMemoryShipmentStore {
    fn list(&self) -> Vec<Shipment> {
        self.shipments
            .read()
            .values()
            .cloned()
            .collect()
    }

    fn get(&self, id: &ShipmentId) -> Option<Shipment> {
        self.shipments
            .read()
            .get(id)
            .cloned()
    }

    fn update(&self, id: &ShipmentId, update: ShipmentUpdate) -> Result<Shipment, StoreError> {
        let mut shipments = self.shipments.write();
        let shipment = shipments
            .get_mut(id)
            .ok_or_else(|| StoreError::ShipmentNotFound(id.clone()))?;

        update.apply(shipment);
        debug!("Updated shipment. shipment: {}, products: {}", id, shipment.products.len());

        Ok(shipment.clone())
    }

    async fn persist(&self) -> Result<(), StoreError> {
        let Some(mirror) = &self.mirror else {
            debug!("No durable mirror configured, nothing to persist.");
            return Ok(());
        };

        let content = serde_json::to_vec_pretty(&self.list())?;
        mirror.put(SHIPMENTS_KEY, &content)?;

        Ok(())
    }

    fn count(&self) -> usize {
        self.shipments.read().len()
    }
}

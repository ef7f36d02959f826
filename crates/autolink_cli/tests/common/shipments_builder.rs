use serde::Serialize;

#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TestLinkedProduct {
    pub product_id: String,
    pub product_name: String,
    pub sku: String,
    pub quantity: u32,
    pub weight: f64,
    pub volume: f64,
    pub value: f64,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct TestRoute {
    pub origin: String,
    pub destination: String,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct TestShipment {
    pub id: String,
    pub number: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub route: TestRoute,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub products: Vec<TestLinkedProduct>,
}

impl TestShipment {
    pub fn new(id: &str, kind: &str) -> Self {
        Self {
            id: id.to_string(),
            number: format!("NUM-{}", id),
            kind: kind.to_string(),
            route: TestRoute {
                origin: "Genova".to_string(),
                destination: "Rotterdam".to_string(),
            },
            products: vec![],
        }
    }

    pub fn with_product(mut self, product: TestLinkedProduct) -> Self {
        self.products.push(product);
        self
    }
}

#[derive(Default)]
pub struct ShipmentsBuilder {
    shipments: Vec<TestShipment>,
}

impl ShipmentsBuilder {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn with_shipments(mut self, shipments: &[TestShipment]) -> Self {
        self.shipments = Vec::from(shipments);
        self
    }

    pub fn as_string(&self) -> String {
        let mut buffer = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"  ");
        let mut ser = serde_json::Serializer::with_formatter(&mut buffer, formatter);

        self.shipments
            .serialize(&mut ser)
            .expect("ok");

        String::from_utf8(buffer).unwrap()
    }
}

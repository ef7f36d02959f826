pub mod shipments_builder;

#[macro_use]
extern crate util;

pub mod common;

/// A context, which will be dropped when the test is completed.
mod context {
    use std::fs;
    use std::path::PathBuf;

    use tempfile::{tempdir, TempDir};
    use util::test::build_temp_file;

    #[derive(Debug)]
    pub struct Context {
        pub temp_dir: TempDir,

        pub trace_log_arg: String,
        pub store_dir_arg: String,
        pub test_trace_log_path: PathBuf,
        pub store_dir: PathBuf,
    }

    impl Context {
        pub fn new() -> Self {
            let temp_dir = tempdir().unwrap();

            let (test_trace_log_path, _test_trace_log_file_name) = build_temp_file(&temp_dir, "trace", "log");
            let trace_log_arg = format!(
                "--trace {}",
                test_trace_log_path
                    .to_str()
                    .unwrap()
            );

            let mut store_dir = PathBuf::from(temp_dir.path());
            store_dir.push("store");
            fs::create_dir_all(&store_dir).unwrap();

            let store_dir_arg = format!("--store-dir {}", store_dir.to_str().unwrap());

            Context {
                temp_dir,
                trace_log_arg,
                store_dir_arg,
                test_trace_log_path,
                store_dir,
            }
        }

        pub fn write_store_file(&self, key: &str, content: &str) {
            fs::write(self.store_file_path(key), content).unwrap();
        }

        pub fn store_file_path(&self, key: &str) -> PathBuf {
            self.store_dir
                .join(format!("{}.json", key))
        }

        /// Returns the path argument, e.g. `"--catalog /tmp/.../products.csv"`.
        pub fn write_temp_file(&self, arg: &str, prefix: &str, extension: &str, content: &str) -> String {
            let (path, _file_name) = build_temp_file(&self.temp_dir, prefix, extension);
            fs::write(&path, content).unwrap();

            format!("{} {}", arg, path.to_str().unwrap())
        }

        pub fn trace_content(&self) -> String {
            let trace_content = fs::read_to_string(&self.test_trace_log_path).unwrap();
            println!("{}", trace_content);
            trace_content
        }
    }

    impl Drop for Context {
        fn drop(&mut self) {
            println!(
                "destroying context. temp_dir: {}",
                self.temp_dir.path().to_str().unwrap()
            );
        }
    }
}

mod link {
    use std::fs::read_to_string;

    use assert_cmd::Command;
    use shipping::{ProductId, Shipment, ShipmentId};
    use stores::test::{ProductsCSVBuilder, TestProductRecord};
    use util::test::{prepare_args, print};

    use crate::common::shipments_builder::{ShipmentsBuilder, TestLinkedProduct, TestShipment};
    use crate::context::Context;

    fn product_record(id: &str, name: &str, weight: &str, volume: &str, value: &str) -> TestProductRecord {
        TestProductRecord {
            id: id.to_string(),
            name: name.to_string(),
            sku: format!("SKU-{}", id),
            weight: weight.to_string(),
            volume: volume.to_string(),
            value: value.to_string(),
        }
    }

    fn products_csv() -> String {
        ProductsCSVBuilder::new()
            .with_items(&[
                product_record("P-1", "Pallet", "20", "1.2", "300"),
                product_record("P-2", "Olive oil (case)", "12", "0.02", "90"),
                product_record("P-3", "Marble slab", "400", "0.5", "1200"),
                product_record("P-4", "Unmeasured", "", "", ""),
            ])
            .as_string()
    }

    fn linked_pallet(quantity: u32) -> TestLinkedProduct {
        TestLinkedProduct {
            product_id: "P-1".to_string(),
            product_name: "Pallet".to_string(),
            sku: "SKU-P-1".to_string(),
            quantity,
            weight: 20.0,
            volume: 1.2,
            value: 300.0,
        }
    }

    fn shipments_json() -> String {
        ShipmentsBuilder::new()
            .with_shipments(&[
                TestShipment::new("S-1", "container"),
                TestShipment::new("S-2", "parcel").with_product(linked_pallet(2)),
                TestShipment::new("S-3", "awb"),
            ])
            .as_string()
    }

    fn stored_shipments(ctx: &Context) -> anyhow::Result<Vec<Shipment>> {
        let content = read_to_string(ctx.store_file_path("shipments"))?;
        println!("{}", content);
        Ok(serde_json::from_str(&content)?)
    }

    #[test]
    fn links_every_unlinked_shipment_from_a_feed() -> Result<(), anyhow::Error> {
        // given
        let ctx = Context::new();
        ctx.write_store_file("shipments", &shipments_json());
        let catalog_arg = ctx.write_temp_file("--catalog", "products", "csv", &products_csv());

        // and
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_autolink_cli"));

        // and
        let args = prepare_args(vec![
            ctx.trace_log_arg.as_str(),
            "-vvv",
            "link",
            ctx.store_dir_arg.as_str(),
            catalog_arg.as_str(),
            "--seed 7",
            "--no-delays",
        ]);
        println!("args: {:?}", args);

        // when
        cmd.args(args)
            // then
            .assert()
            .success()
            .stderr(print("stderr"))
            .stdout(print("stdout"))
            .stdout(predicates::str::contains("Linked shipments: 2"));

        // and
        let trace_content = ctx.trace_content();

        assert_contains_inorder!(trace_content, [
            "Loaded shipments. count: 3",
            "Loaded catalog. origin: feed",
            "Stored key. key: 'products'",
            "Analyzed shipments. unlinked: 2, eligible_products: 3, catalog: 4",
            "Executing plan. items: 2",
            "Stored key. key: 'shipments'",
            "Auto-link completed. successes: 2, failures: 0",
        ]);

        // and
        let shipments = stored_shipments(&ctx)?;
        assert_eq!(shipments.len(), 3);
        for shipment in shipments.iter() {
            assert!(!shipment.is_unlinked(), "shipment: {}", shipment.id);
            assert!(
                shipment
                    .products
                    .iter()
                    .all(|linked| linked.quantity >= 1 && linked.product_id != ProductId::from("P-4"))
            );
        }

        // and the already linked shipment is untouched
        let untouched = shipments
            .iter()
            .find(|shipment| shipment.id == ShipmentId::from("S-2"))
            .unwrap();
        assert_eq!(untouched.products.len(), 1);
        assert_eq!(untouched.products[0].quantity, 2);

        // and the catalog is kept for the next run
        assert!(ctx.store_file_path("products").exists());

        Ok(())
    }

    #[test]
    fn second_run_has_nothing_to_do() -> Result<(), anyhow::Error> {
        // given
        let ctx = Context::new();
        ctx.write_store_file("shipments", &shipments_json());
        let catalog_arg = ctx.write_temp_file("--catalog", "products", "csv", &products_csv());

        let first_args = prepare_args(vec![
            ctx.store_dir_arg.as_str(),
            catalog_arg.as_str(),
            "--no-delays",
        ]);
        Command::new(env!("CARGO_BIN_EXE_autolink_cli"))
            .arg("link")
            .args(first_args)
            .assert()
            .success();
        let after_first_run = stored_shipments(&ctx)?;

        // and
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_autolink_cli"));

        // and no feed, the stored catalog is used
        let args = prepare_args(vec![
            ctx.trace_log_arg.as_str(),
            "-vvv",
            "link",
            ctx.store_dir_arg.as_str(),
            "--no-delays",
        ]);

        // when
        cmd.args(args)
            // then
            .assert()
            .success()
            .stderr(print("stderr"))
            .stdout(print("stdout"))
            .stdout(predicates::str::contains("All shipments already have products linked."));

        // and
        let trace_content = ctx.trace_content();

        assert_contains_inorder!(trace_content, [
            "Loaded catalog. origin: durable store",
            "Analyzed shipments. unlinked: 0",
        ]);

        // and
        assert_eq!(stored_shipments(&ctx)?, after_first_run);

        Ok(())
    }

    #[test]
    fn scoped_run_only_links_the_named_shipment() -> Result<(), anyhow::Error> {
        // given
        let ctx = Context::new();
        ctx.write_store_file("shipments", &shipments_json());

        // and
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_autolink_cli"));

        // and
        let args = prepare_args(vec![
            "link",
            ctx.store_dir_arg.as_str(),
            "--sample-products 6",
            "--seed 3",
            "--shipment S-3",
            "--no-delays",
        ]);

        // when
        cmd.args(args)
            // then
            .assert()
            .success()
            .stderr(print("stderr"))
            .stdout(print("stdout"));

        // and
        let shipments = stored_shipments(&ctx)?;
        let linked = shipments
            .iter()
            .filter(|shipment| !shipment.is_unlinked())
            .map(|shipment| shipment.id.to_string())
            .collect::<Vec<_>>();
        assert_eq!(linked, vec!["S-2", "S-3"]);

        Ok(())
    }

    #[test]
    fn fails_without_any_catalog() -> Result<(), anyhow::Error> {
        // given
        let ctx = Context::new();
        ctx.write_store_file("shipments", &shipments_json());

        // and
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_autolink_cli"));

        // and
        let args = prepare_args(vec!["link", ctx.store_dir_arg.as_str(), "--no-delays"]);

        // when
        cmd.args(args)
            // then
            .assert()
            .failure()
            .stderr(print("stderr"))
            .stderr(predicates::str::contains("No catalog source provided any products"));

        Ok(())
    }

    #[test]
    fn fails_with_an_empty_store() -> Result<(), anyhow::Error> {
        // given
        let ctx = Context::new();
        let catalog_arg = ctx.write_temp_file("--catalog", "products", "csv", &products_csv());

        // and
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_autolink_cli"));

        // and
        let args = prepare_args(vec![
            "link",
            ctx.store_dir_arg.as_str(),
            catalog_arg.as_str(),
            "--no-delays",
        ]);

        // when
        cmd.args(args)
            // then
            .assert()
            .failure()
            .stderr(print("stderr"))
            .stderr(predicates::str::contains("Auto-linking cannot start: Shipment store is empty."));

        Ok(())
    }
}

mod report {
    use assert_cmd::Command;
    use indoc::indoc;
    use util::test::{prepare_args, print};

    use crate::context::Context;

    const SHIPMENTS: &str = indoc! {r#"
        [
          {
            "id": "S-1",
            "number": "MSCU1234567",
            "type": "container",
            "route": { "origin": "Genova", "destination": "Rotterdam" }
          },
          {
            "id": "S-2",
            "number": "176-12345675",
            "type": "awb",
            "route": { "origin": "Milano", "destination": "New York" },
            "products": [
              {
                "productId": "P-1",
                "productName": "Pallet",
                "sku": "SKU-P-1",
                "quantity": 4,
                "weight": 20.0,
                "volume": 1.2,
                "value": 300.0
              }
            ]
          }
        ]
    "#};

    #[test]
    fn json_report() -> Result<(), anyhow::Error> {
        // given
        let ctx = Context::new();
        ctx.write_store_file("shipments", SHIPMENTS);

        // and
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_autolink_cli"));

        // and
        let args = prepare_args(vec!["report", ctx.store_dir_arg.as_str(), "--format json"]);

        // when
        let assert = cmd
            .args(args)
            // then
            .assert()
            .success()
            .stderr(print("stderr"))
            .stdout(print("stdout"));

        // and
        let report: serde_json::Value = serde_json::from_slice(&assert.get_output().stdout)?;

        assert_eq!(report["shipments"], 2);
        assert_eq!(report["linked_shipments"], 1);
        assert_eq!(report["unlinked_shipments"], serde_json::json!(["S-1"]));
        assert_eq!(
            report["products"],
            serde_json::json!([
                { "product_id": "P-1", "product_name": null, "shipments": 1, "quantity": 4 }
            ])
        );

        Ok(())
    }

    #[test]
    fn text_report_filtered_by_type() -> Result<(), anyhow::Error> {
        // given
        let ctx = Context::new();
        ctx.write_store_file("shipments", SHIPMENTS);

        // and
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_autolink_cli"));

        // and
        let args = prepare_args(vec!["report", ctx.store_dir_arg.as_str(), "--type container"]);

        // when
        cmd.args(args)
            // then
            .assert()
            .success()
            .stderr(print("stderr"))
            .stdout(print("stdout"))
            .stdout(predicates::str::contains(indoc! {"
                Type: container
                Shipments: 1
                Linked shipments: 0
                Unlinked shipments: 1
                  S-1
            "}));

        Ok(())
    }
}

mod classify {
    use assert_cmd::Command;
    use indoc::indoc;
    use util::test::{prepare_args, print};

    use crate::context::Context;

    const CONTROLS: &str = indoc! {r#"
        [
          { "id": 1, "label": "Gestisci prodotti", "row_shipment_id": "S-1" },
          { "id": 2, "label": "Chiudi", "row_shipment_id": "S-1" },
          { "id": 3, "label": "Add", "icon_marker": "fa-box", "row_shipment_id": "S-2" },
          { "id": 4, "label": "Gestisci prodotti", "in_overlay": true, "row_shipment_id": "S-1" },
          { "id": 5, "label": "Aggiungi prodotto" }
        ]
    "#};

    #[test]
    fn classifies_each_control() -> Result<(), anyhow::Error> {
        // given
        let ctx = Context::new();
        let controls_arg = ctx.write_temp_file("--controls", "controls", "json", CONTROLS);

        // and
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_autolink_cli"));

        // and
        let args = prepare_args(vec![
            ctx.trace_log_arg.as_str(),
            "-vvv",
            "classify",
            controls_arg.as_str(),
        ]);

        // when
        cmd.args(args)
            // then
            .assert()
            .success()
            .stderr(print("stderr"))
            .stdout(print("stdout"))
            .stdout(predicates::str::contains(indoc! {"
                #1 'Gestisci prodotti': manage
                #2 'Chiudi': rejected, Control matches an excluded term. term: 'chiudi'
                #3 'Add': add
                #4 'Gestisci prodotti': rejected, Control is inside an overlay
                #5 'Aggiungi prodotto': rejected, Control is not inside a shipment row
            "}));

        // and
        let trace_content = ctx.trace_content();

        assert_contains_inorder!(trace_content, ["Classified controls. controls: 5, linking: 2"]);

        Ok(())
    }
}

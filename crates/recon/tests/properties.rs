// Property-based tests for aggregation, reconciliation and cleaning.
// CI: 256 cases (default). Soak: PROPTEST_CASES=10000 cargo test --release

use std::collections::HashSet;

use proptest::prelude::*;
use qwtt_recon::aggregate::aggregate_table;
use qwtt_recon::config::ReconConfig;
use qwtt_recon::model::{NormalizedKey, ReconInput, Table};
use qwtt_recon::normalize::KeyNormalizer;
use qwtt_recon::{clean, run};

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

fn config_256() -> ProptestConfig {
    ProptestConfig {
        cases: std::env::var("PROPTEST_CASES")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(256),
        failure_persistence: None,
        ..ProptestConfig::default()
    }
}

// ---------------------------------------------------------------------------
// Generators
// ---------------------------------------------------------------------------

/// SKU spellings that collide after normalization, plus blanks.
fn arb_sku() -> impl Strategy<Value = String> {
    prop_oneof![
        4 => prop::sample::select(vec!["A1", "a1", "`A1", " A1 ", "B2", "b2", "C3", "D4", "E5"])
            .prop_map(String::from),
        1 => Just(String::new()),
    ]
}

/// Quantity cell: mostly integers, sometimes fractional, text, or empty.
fn arb_qty() -> impl Strategy<Value = String> {
    prop_oneof![
        6 => r"-?[0-9]{1,4}",
        1 => r"[0-9]{1,3}\.[0-9]",
        1 => r"[a-z]{1,4}",
        1 => Just(String::new()),
    ]
}

fn arb_inventory() -> impl Strategy<Value = Vec<(String, String)>> {
    prop::collection::vec((arb_sku(), arb_qty()), 0..24)
}

fn arb_orders() -> impl Strategy<Value = Vec<(String, String, String)>> {
    let market = prop::sample::select(vec!["Flipkart", "Amazon", " Flipkart "]).prop_map(String::from);
    prop::collection::vec((market, arb_sku(), arb_qty()), 0..24)
}

fn inventory_table(rows: &[(String, String)]) -> Table {
    let mut t = Table::new(vec!["sku".into(), "old_quantity".into()]);
    for (sku, qty) in rows {
        t.push_row(vec![sku.clone(), qty.clone()]);
    }
    t
}

fn orders_table(rows: &[(String, String, String)]) -> Table {
    let mut t = Table::new(vec!["Marketplace".into(), "SKU".into(), "Quantity".into()]);
    for (market, sku, qty) in rows {
        t.push_row(vec![market.clone(), sku.clone(), qty.clone()]);
    }
    t
}

/// Master covering some SKUs, one of them with a blank brand.
fn master_table() -> Table {
    Table::from_csv_reader(
        "EasycomSKU,Brand Manager,Brand,Product Name,FNS,Vendor SKU,CP\n\
         A1,Asha,Acme,Widget,F1,V1,2.5\n\
         B2,Ravi,,Gadget,F2,V2,1\n\
         C3,Ravi,Bolt,Gizmo,F3,V3,x\n"
            .as_bytes(),
    )
    .unwrap()
}

fn input(orders: &[(String, String, String)], inventory: &[(String, String)]) -> ReconInput {
    ReconInput {
        orders: orders_table(orders),
        inventory: inventory_table(inventory),
        master: master_table(),
    }
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(config_256())]

    /// Inventory quantity is conserved: the total row equals the aggregated
    /// inventory sum, and equals the sum of the detail rows.
    #[test]
    fn inventory_total_is_conserved(orders in arb_orders(), inventory in arb_inventory()) {
        let input = input(&orders, &inventory);
        let outcome = run(&ReconConfig::default(), &input).unwrap();

        let stock = aggregate_table(&input.inventory, 0, 1, &KeyNormalizer::default(), |_| true);
        let rows_sum: i64 = outcome.report.rows.iter().map(|r| r.inventory_qty.value).sum();
        prop_assert_eq!(outcome.report.total.inventory_qty.value, stock.measure_sum());
        prop_assert_eq!(outcome.report.total.inventory_qty.value, rows_sum);

        let sales_sum: i64 = outcome.report.rows.iter().map(|r| r.sales_qty.value).sum();
        prop_assert_eq!(outcome.report.total.sales_qty.value, sales_sum);
    }

    /// Shuffling order and inventory rows does not change the report.
    #[test]
    fn report_is_independent_of_row_order(
        orders in arb_orders(),
        inventory in arb_inventory(),
        seed in any::<u64>(),
    ) {
        let forward = run(&ReconConfig::default(), &input(&orders, &inventory)).unwrap();

        let mut orders_rev = orders.clone();
        let mut inventory_rot = inventory.clone();
        orders_rev.reverse();
        if !inventory_rot.is_empty() {
            let k = (seed % inventory_rot.len() as u64) as usize;
            inventory_rot.rotate_left(k);
        }
        let shuffled = run(&ReconConfig::default(), &input(&orders_rev, &inventory_rot)).unwrap();

        prop_assert_eq!(forward.report, shuffled.report);
        prop_assert_eq!(forward.diagnostics.sales_only, shuffled.diagnostics.sales_only);
    }

    /// One detail row per distinct non-blank inventory key, never more.
    #[test]
    fn one_row_per_inventory_key(orders in arb_orders(), inventory in arb_inventory()) {
        let outcome = run(&ReconConfig::default(), &input(&orders, &inventory)).unwrap();
        let normalizer = KeyNormalizer::default();
        let keys: HashSet<String> = inventory
            .iter()
            .filter_map(|(sku, _)| match normalizer.normalize(sku) {
                NormalizedKey::Sku(k) => Some(k),
                NormalizedKey::Empty => None,
            })
            .collect();
        prop_assert_eq!(outcome.report.len(), keys.len());

        let mut seen = HashSet::new();
        for row in &outcome.report.rows {
            prop_assert!(seen.insert(row.sku.to_lowercase()), "duplicate row {}", row.sku);
        }
    }

    /// Detail rows are sorted ascending by sales quantity.
    #[test]
    fn rows_sorted_by_sales(orders in arb_orders(), inventory in arb_inventory()) {
        let outcome = run(&ReconConfig::default(), &input(&orders, &inventory)).unwrap();
        for pair in outcome.report.rows.windows(2) {
            prop_assert!(pair[0].sales_qty.value <= pair[1].sales_qty.value);
        }
    }

    /// Cleaning twice is the same as cleaning once, and the total row survives.
    #[test]
    fn cleaning_is_idempotent(orders in arb_orders(), inventory in arb_inventory()) {
        let outcome = run(&ReconConfig::default(), &input(&orders, &inventory)).unwrap();
        let once = clean(&outcome.report);
        let twice = clean(&once.report);

        prop_assert_eq!(&once.report, &twice.report);
        prop_assert_eq!(&once.report.total, &outcome.report.total);
        prop_assert!(once.rows_after <= once.rows_before);
        for row in &once.report.rows {
            for column in &once.report.columns {
                prop_assert!(!row.is_incomplete(*column));
            }
        }
    }
}

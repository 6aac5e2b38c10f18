use std::collections::{BTreeMap, HashMap};

use proptest::prelude::*;

use cl_core::config::{Engine, PipelineConfig};
use cl_core::sales::{Product, ProductClass, TopProduct, Transaction};
use cl_core::Money;
use cl_datasets::{sample, Dataset, DatasetError};
use cl_runtime::run;

fn classes(names: &[(u64, &str)]) -> Vec<ProductClass> {
    names
        .iter()
        .map(|&(id, name)| ProductClass { product_class_id: id, product_class_name: name.to_string() })
        .collect()
}

fn product(product_id: u64, name: &str, price: Money, class_id: u64) -> Product {
    Product {
        product_id,
        product_name: name.to_string(),
        retail_price: Some(price),
        product_class_id: class_id,
    }
}

fn transactions(rows: &[(u64, u32)]) -> Vec<Transaction> {
    rows.iter()
        .enumerate()
        .map(|(i, &(product_id, quantity))| Transaction {
            transaction_id: i as u64 + 1,
            product_id,
            quantity: Some(quantity),
        })
        .collect()
}

fn row(class: &str, rank: u32, name: &str, value: i64) -> TopProduct {
    TopProduct {
        product_class_name: class.to_string(),
        rank,
        product_name: name.to_string(),
        sales_value: Money::from(value),
    }
}

fn run_with(dataset: &Dataset, engine: Engine, workers: usize) -> Vec<TopProduct> {
    let cfg = PipelineConfig { engine, workers, ..PipelineConfig::default() };
    run(dataset, &cfg).expect("pipeline run").rows
}

fn abc_dataset() -> Dataset {
    Dataset {
        transactions: transactions(&[(1, 3), (2, 1), (1, 2), (2, 5), (3, 1)]),
        products: vec![
            product(1, "A", Money::from(10), 1),
            product(2, "B", Money::from(5), 1),
            product(3, "C", Money::from(20), 2),
        ],
        product_classes: classes(&[(1, "X"), (2, "Y")]),
    }
}

#[test]
fn abc_scenario_on_every_engine() {
    let expected = vec![row("X", 1, "A", 50), row("X", 2, "B", 30), row("Y", 1, "C", 20)];
    let dataset = abc_dataset();
    assert_eq!(run_with(&dataset, Engine::Batch, 1), expected);
    assert_eq!(run_with(&dataset, Engine::Dataflow, 1), expected);
    assert_eq!(run_with(&dataset, Engine::Dataflow, 3), expected);
}

#[test]
fn sales_tie_goes_to_lower_quantity() {
    // P: 4 x 10 = 40, Q: 8 x 5 = 40
    let dataset = Dataset {
        transactions: transactions(&[(1, 8), (2, 4)]),
        products: vec![product(1, "Q", Money::from(5), 1), product(2, "P", Money::from(10), 1)],
        product_classes: classes(&[(1, "X")]),
    };
    let expected = vec![row("X", 1, "P", 40), row("X", 2, "Q", 40)];
    assert_eq!(run_with(&dataset, Engine::Batch, 1), expected);
    assert_eq!(run_with(&dataset, Engine::Dataflow, 2), expected);
}

#[test]
fn unknown_product_contributes_nothing() {
    let mut dataset = abc_dataset();
    let baseline = run_with(&dataset, Engine::Batch, 1);
    dataset.transactions.push(Transaction { transaction_id: 99, product_id: 42, quantity: Some(1000) });

    for engine in [Engine::Batch, Engine::Dataflow] {
        let cfg = PipelineConfig { engine, ..PipelineConfig::default() };
        let report = run(&dataset, &cfg).unwrap();
        assert_eq!(report.rows, baseline);
        assert_eq!(report.metrics.transactions_excluded, 1);
    }
}

#[test]
fn duplicate_product_ids_are_rejected_by_every_engine() {
    let mut dataset = Dataset {
        transactions: transactions(&[(1, 2)]),
        products: vec![product(1, "A", Money::from(10), 1)],
        product_classes: classes(&[(1, "X")]),
    };
    dataset.products.push(product(1, "A", Money::from(12), 1));

    for engine in [Engine::Batch, Engine::Dataflow] {
        let cfg = PipelineConfig { engine, ..PipelineConfig::default() };
        let err = run(&dataset, &cfg).unwrap_err();
        let err = err.downcast_ref::<DatasetError>().expect("dataset error");
        assert!(matches!(err, DatasetError::DuplicateKey { entity: "product", id: 1 }));
    }
}

#[test]
fn duplicate_class_ids_are_rejected() {
    let mut dataset = abc_dataset();
    dataset.product_classes.push(ProductClass { product_class_id: 2, product_class_name: "Z".to_string() });
    assert!(run(&dataset, &PipelineConfig::default()).is_err());
}

#[test]
fn fractional_prices_sum_exactly() {
    let dataset = Dataset {
        transactions: transactions(&[(1, 1); 10]),
        products: vec![product(1, "Dime", Money::new(1, 1), 1)],
        product_classes: classes(&[(1, "Coins")]),
    };
    let rows = run_with(&dataset, Engine::Dataflow, 1);
    assert_eq!(rows[0].sales_value, Money::ONE);
}

#[test]
fn sample_dataset_engines_agree() {
    let dataset = sample();
    let batch = run_with(&dataset, Engine::Batch, 1);
    assert!(!batch.is_empty());
    assert_eq!(run_with(&dataset, Engine::Dataflow, 1), batch);
    assert_eq!(run_with(&dataset, Engine::Dataflow, 4), batch);
}

#[test]
fn sample_snack_tie_and_exclusions() {
    let report = run(&sample(), &PipelineConfig { engine: Engine::Batch, ..PipelineConfig::default() }).unwrap();
    let snacks: Vec<_> = report
        .rows
        .iter()
        .filter(|r| r.product_class_name == "Snack Foods")
        .map(|r| (r.rank, r.product_name.as_str()))
        .collect();
    assert_eq!(snacks, vec![(1, "Best Choice Corn Chips"), (2, "Fort West Potato Chips")]);
    assert!(report.rows.iter().all(|r| r.product_name != "Orphan Tuna"));
    let canned: Vec<_> = report
        .rows
        .iter()
        .filter(|r| r.product_class_name == "Canned Goods")
        .map(|r| (r.rank, r.product_name.as_str(), r.sales_value))
        .collect();
    assert_eq!(canned, vec![(1, "Bravo Canned Peas", Money::new(267, 2))]);
}

#[test]
fn top_k_is_configurable() {
    let dataset = abc_dataset();
    let cfg = PipelineConfig { top_k: 1, ..PipelineConfig::default() };
    let rows = run(&dataset, &cfg).unwrap().rows;
    assert_eq!(rows, vec![row("X", 1, "A", 50), row("Y", 1, "C", 20)]);
}

fn arb_dataset() -> impl Strategy<Value = Dataset> {
    // class ids are 0..n, products may point past them
    let class_names = prop::collection::btree_set("[A-Z]{1,3}", 1..4);
    let products = prop::collection::vec((0u64..5, 1i64..500), 1..12);
    let txns = prop::collection::vec((0u64..14, 1u32..6), 0..60);
    (class_names, products, txns).prop_map(|(class_names, products, txns)| {
        let product_classes = class_names
            .into_iter()
            .enumerate()
            .map(|(id, name)| ProductClass { product_class_id: id as u64, product_class_name: name })
            .collect();
        let products = products
            .into_iter()
            .enumerate()
            .map(|(i, (class_id, cents))| Product {
                product_id: i as u64,
                product_name: format!("p{i}"),
                retail_price: Some(Money::new(cents, 2)),
                product_class_id: class_id,
            })
            .collect();
        Dataset { transactions: transactions(&txns), products, product_classes }
    })
}

/// Exact Σ quantity * price per product name, over transactions that join.
fn expected_totals(dataset: &Dataset) -> HashMap<String, (Money, u64)> {
    let class_ids: Vec<u64> = dataset.product_classes.iter().map(|c| c.product_class_id).collect();
    let mut totals = HashMap::new();
    for txn in &dataset.transactions {
        let Some(product) = dataset.products.iter().find(|p| p.product_id == txn.product_id) else {
            continue;
        };
        if !class_ids.contains(&product.product_class_id) {
            continue;
        }
        let (Some(price), Some(qty)) = (product.retail_price, txn.quantity) else {
            continue;
        };
        let entry = totals.entry(product.product_name.clone()).or_insert((Money::ZERO, 0u64));
        entry.0 += price * Money::from(qty);
        entry.1 += u64::from(qty);
    }
    totals
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn engines_agree_and_rows_respect_ranking(dataset in arb_dataset(), workers in 1usize..4) {
        let batch = run_with(&dataset, Engine::Batch, 1);
        let dataflow = run_with(&dataset, Engine::Dataflow, workers);
        prop_assert_eq!(&batch, &dataflow);
        prop_assert_eq!(run_with(&dataset, Engine::Batch, 1), batch.clone());

        let totals = expected_totals(&dataset);
        let mut by_class: BTreeMap<&str, Vec<&TopProduct>> = BTreeMap::new();
        for row in &batch {
            let (sales, _) = totals[&row.product_name];
            prop_assert_eq!(row.sales_value, sales);
            by_class.entry(row.product_class_name.as_str()).or_default().push(row);
        }

        // report order: class name, then rank
        let keys: Vec<_> = batch.iter().map(|r| (r.product_class_name.clone(), r.rank)).collect();
        let mut sorted = keys.clone();
        sorted.sort();
        prop_assert_eq!(keys, sorted);

        for rows in by_class.values() {
            let ranks: Vec<u32> = rows.iter().map(|r| r.rank).collect();
            prop_assert!(ranks == vec![1] || ranks == vec![1, 2]);
            if let [first, second] = rows.as_slice() {
                prop_assert!(first.sales_value >= second.sales_value);
                if first.sales_value == second.sales_value {
                    prop_assert!(totals[&first.product_name].1 <= totals[&second.product_name].1);
                }
            }
        }
    }
}

//! Built-in deterministic dataset used when no source directory is given.

use rust_decimal::Decimal;

use cl_core::sales::{Product, ProductClass, Transaction};
use cl_core::{ProductClassId, ProductId};

use crate::Dataset;

const CLASSES: &[(ProductClassId, &str)] = &[
    (1, "Beverages"),
    (2, "Dairy"),
    (3, "Snack Foods"),
    (4, "Canned Goods"),
];

// (id, name, price in ten-thousandths, class)
const PRODUCTS: &[(ProductId, &str, Option<i64>, ProductClassId)] = &[
    (101, "Good Imported Beer", Some(2_4900), 1),
    (102, "Portsmouth Light Beer", Some(1_9950), 1),
    (103, "Excellent Cola", Some(1_2475), 1),
    (201, "Club Whole Milk", Some(3_1900), 2),
    (202, "Booker Cheddar Cheese", Some(4_7850), 2),
    (203, "Carlson String Cheese", Some(0_9570), 2),
    (301, "Fort West Potato Chips", Some(1_5000), 3),
    (302, "Best Choice Corn Chips", Some(2_5000), 3),
    (303, "Nationeel Mini Pretzels", None, 3),
    (401, "Bravo Canned Peas", Some(0_8900), 4),
    // class 9 is not in the catalog
    (901, "Orphan Tuna", Some(3_0000), 9),
];

pub fn sample() -> Dataset {
    let product_classes = CLASSES
        .iter()
        .map(|&(product_class_id, name)| ProductClass {
            product_class_id,
            product_class_name: name.to_string(),
        })
        .collect();

    let products = PRODUCTS
        .iter()
        .map(|&(product_id, name, price, product_class_id)| Product {
            product_id,
            product_name: name.to_string(),
            retail_price: price.map(|p| Decimal::new(p, 4)),
            product_class_id,
        })
        .collect();

    Dataset { transactions: transactions(), products, product_classes }
}

/// Deterministic mix of sales. Corn chips and potato chips tie on value
/// (30.00) with different quantities.
fn transactions() -> Vec<Transaction> {
    let mut rows: Vec<(ProductId, Option<u32>)> = Vec::new();
    for i in 0..40u32 {
        rows.push((101, Some(1 + i % 3)));
        rows.push((102, Some(2 + i % 2)));
        if i % 4 == 0 {
            rows.push((103, Some(6)));
        }
        rows.push((201 + u64::from(i % 3), Some(1 + i % 4)));
    }
    rows.extend([
        (301, Some(12)),
        (301, Some(8)),
        (302, Some(7)),
        (302, Some(5)),
        (303, Some(50)),
        (401, None),
        (401, Some(3)),
        (901, Some(10)),
        (999, Some(4)),
    ]);

    rows.into_iter()
        .enumerate()
        .map(|(index, (product_id, quantity))| Transaction {
            transaction_id: index as u64 + 1,
            product_id,
            quantity,
        })
        .collect()
}

//! Join & valuation: transactions ⋈ products ⋈ product classes, with
//! `sales_value = quantity * retail_price`. Unmatched keys and missing
//! quantities or prices drop the row.

use std::collections::HashMap;

use differential_dataflow::lattice::Lattice;
use differential_dataflow::operators::Join;
use differential_dataflow::Collection;
use timely::dataflow::Scope;
use tracing::debug;

use cl_core::sales::{PricedProduct, Product, ProductClass, Transaction, ValuedTransaction};
use cl_core::{ProductClassId, ProductId};

/// Resolves the catalog into priced products keyed by id.
fn priced_catalog(products: &[Product], classes: &[ProductClass]) -> HashMap<ProductId, PricedProduct> {
    let classes: HashMap<ProductClassId, &ProductClass> =
        classes.iter().map(|c| (c.product_class_id, c)).collect();

    products
        .iter()
        .filter_map(|product| {
            let priced = classes
                .get(&product.product_class_id)
                .and_then(|class| PricedProduct::resolve(product, class));
            if priced.is_none() {
                debug!(product_id = product.product_id, "product has no class or price; excluded");
            }
            priced.map(|p| (p.product_id, p))
        })
        .collect()
}

pub fn value_transactions(
    transactions: &[Transaction],
    products: &[Product],
    classes: &[ProductClass],
) -> Vec<ValuedTransaction> {
    let catalog = priced_catalog(products, classes);

    transactions
        .iter()
        .filter_map(|txn| {
            let valued = catalog.get(&txn.product_id).and_then(|p| p.value(txn));
            if valued.is_none() {
                debug!(
                    transaction_id = txn.transaction_id,
                    product_id = txn.product_id,
                    "transaction did not join; excluded"
                );
            }
            valued
        })
        .collect()
}

pub fn valued_collection<G>(
    transactions: &Collection<G, Transaction, isize>,
    products: &Collection<G, Product, isize>,
    classes: &Collection<G, ProductClass, isize>,
) -> Collection<G, ValuedTransaction, isize>
where
    G: Scope,
    G::Timestamp: Lattice + Ord,
{
    let classes = classes.map(|class| (class.product_class_id, class));

    // (product_id, priced product) for every product with a class and a price
    let priced = products
        .map(|product| (product.product_class_id, product))
        .join(&classes)
        .flat_map(|(_class_id, (product, class))| PricedProduct::resolve(&product, &class))
        .map(|priced| (priced.product_id, priced));

    transactions
        .map(|txn| (txn.product_id, txn))
        .join(&priced)
        .flat_map(|(_product_id, (txn, priced))| priced.value(&txn))
}

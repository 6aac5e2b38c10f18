use std::collections::BTreeMap;

use differential_dataflow::lattice::Lattice;
use differential_dataflow::operators::Reduce;
use differential_dataflow::Collection;
use timely::dataflow::Scope;

use cl_core::sales::{ProductAggregate, ProductKey, ValuedTransaction};
use cl_core::Money;

/// One aggregate per product present in `valued`, ordered by product key.
/// A product whose totals overflow is dropped.
pub fn aggregate_products(valued: &[ValuedTransaction]) -> Vec<ProductAggregate> {
    let mut totals: BTreeMap<ProductKey, Option<(Money, u64)>> = BTreeMap::new();
    for row in valued {
        let entry = totals.entry(row.group_key()).or_insert(Some((Money::ZERO, 0)));
        *entry = entry.and_then(|(sales, quantity)| {
            Some((sales.checked_add(row.sales_value)?, quantity.checked_add(u64::from(row.quantity))?))
        });
    }

    totals
        .into_iter()
        .filter_map(|(key, totals)| {
            totals.map(|(sales, quantity)| ProductAggregate::from_totals(key, sales, quantity))
        })
        .collect()
}

/// Sums `(value, quantity)` pairs weighted by their multiplicity; `None` on overflow.
fn weighted_totals(inputs: &[(&(Money, u64), isize)]) -> Option<(Money, u64)> {
    let mut sales = Money::ZERO;
    let mut quantity: u64 = 0;
    // identical (value, quantity) pairs arrive once with a multiplicity
    for (pair, count) in inputs.iter() {
        let (value, qty) = **pair;
        let count = u64::try_from(*count).ok()?;
        sales = sales.checked_add(value.checked_mul(Money::from(count))?)?;
        quantity = quantity.checked_add(qty.checked_mul(count)?)?;
    }
    Some((sales, quantity))
}

pub fn aggregate_collection<G>(
    valued: &Collection<G, ValuedTransaction, isize>,
) -> Collection<G, ProductAggregate, isize>
where
    G: Scope,
    G::Timestamp: Lattice + Ord,
{
    valued
        .map(|row| (row.group_key(), (row.sales_value, u64::from(row.quantity))))
        .reduce(|_key, inputs, output| {
            if let Some(totals) = weighted_totals(inputs) {
                output.push((totals, 1isize));
            }
        })
        .map(|(key, (sales, quantity))| ProductAggregate::from_totals(key, sales, quantity))
}

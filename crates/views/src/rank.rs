use std::collections::BTreeMap;

use differential_dataflow::lattice::Lattice;
use differential_dataflow::operators::Reduce;
use differential_dataflow::Collection;
use timely::dataflow::Scope;

use cl_core::sales::{output_order, ranking_order, ProductAggregate, RankedProduct, TopProduct};
use cl_core::{ProductClassId, Rank};

use crate::TopKConfig;

/// Ranks one class partition: 1..n, no gaps, no shared ranks.
fn rank_partition(mut products: Vec<ProductAggregate>) -> Vec<RankedProduct> {
    products.sort_by(ranking_order);
    products
        .into_iter()
        .enumerate()
        .map(|(index, product)| RankedProduct { rank: (index + 1) as Rank, product })
        .collect()
}

/// Ranks every product within its class, without the top-K cut.
pub fn rank_products(aggregates: Vec<ProductAggregate>) -> Vec<RankedProduct> {
    let mut partitions: BTreeMap<ProductClassId, Vec<ProductAggregate>> = BTreeMap::new();
    for aggregate in aggregates {
        partitions.entry(aggregate.product_class_id).or_default().push(aggregate);
    }
    partitions.into_values().flat_map(rank_partition).collect()
}

pub fn top_products(aggregates: Vec<ProductAggregate>, cfg: TopKConfig) -> Vec<TopProduct> {
    let kept = rank_products(aggregates)
        .into_iter()
        .filter(|ranked| (ranked.rank as usize) <= cfg.k)
        .collect();
    finalize(kept)
}

/// Sorts ranked rows into report order and projects the output columns.
pub fn finalize(mut ranked: Vec<RankedProduct>) -> Vec<TopProduct> {
    ranked.sort_by(output_order);
    ranked.into_iter().map(TopProduct::from).collect()
}

pub fn top_k_by_class<G>(
    aggregates: &Collection<G, ProductAggregate, isize>,
    cfg: TopKConfig,
) -> Collection<G, RankedProduct, isize>
where
    G: Scope,
    G::Timestamp: Lattice + Ord,
{
    let k = cfg.k;
    aggregates
        .map(|aggregate| (aggregate.product_class_id, aggregate))
        .reduce(move |_class_id, inputs, output| {
            let mut products = Vec::with_capacity(inputs.len());
            for (product, count) in inputs.iter() {
                if *count > 0 {
                    products.push((*product).clone());
                }
            }
            for ranked in rank_partition(products).into_iter().take(k) {
                output.push((ranked, 1isize));
            }
        })
        .map(|(_class_id, ranked)| ranked)
}

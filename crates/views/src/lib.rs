//! View builders for the top-products report: join & valuation, per-product
//! aggregation and per-class top-K ranking.
//!
//! Every stage comes in two forms that must agree row for row: a batch
//! function over slices, and a differential dataflow operator chain.

pub mod aggregate;
pub mod rank;
pub mod valuation;

pub use aggregate::{aggregate_collection, aggregate_products};
pub use rank::{finalize, rank_products, top_k_by_class, top_products};
pub use valuation::{value_transactions, valued_collection};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TopKConfig {
    pub k: usize,
}

impl Default for TopKConfig {
    fn default() -> Self {
        Self { k: 2 }
    }
}

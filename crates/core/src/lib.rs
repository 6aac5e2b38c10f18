//! Core types for Class Leaders: sales records, derived rows and pipeline configuration.

pub mod config;
pub mod sales;

pub type TransactionId = u64;
pub type ProductId = u64;
pub type ProductClassId = u64;
pub type Quantity = u32;
pub type Rank = u32;

/// Exact decimal amount used for prices and sales values.
pub type Money = rust_decimal::Decimal;

#[derive(thiserror::Error, Debug)]
pub enum CoreError {
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Config(String),
    #[error("unknown engine `{0}` (expected `dataflow` or `batch`)")]
    UnknownEngine(String),
}

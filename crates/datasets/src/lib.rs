//! Input datasets: JSON loading from a directory and a built-in sample.

use std::collections::HashSet;
use std::fs;
use std::hash::Hash;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::info;

use cl_core::sales::{Product, ProductClass, Transaction};

pub mod sample;

pub use sample::sample;

pub const TRANSACTIONS_FILE: &str = "transactions.json";
pub const PRODUCTS_FILE: &str = "products.json";
pub const PRODUCT_CLASSES_FILE: &str = "product_classes.json";

pub type Result<T> = std::result::Result<T, DatasetError>;

#[derive(thiserror::Error, Debug)]
pub enum DatasetError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("duplicate {entity} id {id}")]
    DuplicateKey { entity: &'static str, id: u64 },
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Dataset {
    pub transactions: Vec<Transaction>,
    pub products: Vec<Product>,
    pub product_classes: Vec<ProductClass>,
}

impl Dataset {
    /// Builds a dataset, rejecting duplicate catalog ids.
    pub fn new(
        transactions: Vec<Transaction>,
        products: Vec<Product>,
        product_classes: Vec<ProductClass>,
    ) -> Result<Self> {
        let dataset = Self { transactions, products, product_classes };
        dataset.validate()?;
        Ok(dataset)
    }

    /// Product and product class ids must be unique; the joins rely on it.
    pub fn validate(&self) -> Result<()> {
        ensure_unique("product", self.products.iter().map(|p| p.product_id))?;
        ensure_unique("product class", self.product_classes.iter().map(|c| c.product_class_id))
    }

    /// Loads `transactions.json`, `products.json` and `product_classes.json` from `dir`.
    pub fn load_dir(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        let dataset = Self::new(
            read_json(&dir.join(TRANSACTIONS_FILE))?,
            read_json(&dir.join(PRODUCTS_FILE))?,
            read_json(&dir.join(PRODUCT_CLASSES_FILE))?,
        )?;
        info!(
            dir = %dir.display(),
            transactions = dataset.transactions.len(),
            products = dataset.products.len(),
            product_classes = dataset.product_classes.len(),
            "dataset loaded"
        );
        Ok(dataset)
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let raw = fs::read_to_string(path)
        .map_err(|source| DatasetError::Io { path: path.to_path_buf(), source })?;
    serde_json::from_str(&raw).map_err(|source| DatasetError::Json { path: path.to_path_buf(), source })
}

fn ensure_unique<K>(entity: &'static str, ids: impl Iterator<Item = K>) -> Result<()>
where
    K: Copy + Eq + Hash + Into<u64>,
{
    let mut seen = HashSet::new();
    for id in ids {
        if !seen.insert(id) {
            return Err(DatasetError::DuplicateKey { entity, id: id.into() });
        }
    }
    Ok(())
}

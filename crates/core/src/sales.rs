use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::{Money, ProductClassId, ProductId, Quantity, Rank, TransactionId};

/// One sale event. A missing quantity keeps the row out of every join.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Transaction {
    pub transaction_id: TransactionId,
    pub product_id: ProductId,
    pub quantity: Option<Quantity>,
}

/// Catalog entry. A missing retail price keeps the product out of every join.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Product {
    pub product_id: ProductId,
    pub product_name: String,
    pub retail_price: Option<Money>,
    pub product_class_id: ProductClassId,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ProductClass {
    pub product_class_id: ProductClassId,
    pub product_class_name: String,
}

/// A product resolved against its class, ready to value transactions.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PricedProduct {
    pub product_id: ProductId,
    pub product_name: String,
    pub retail_price: Money,
    pub product_class_id: ProductClassId,
    pub product_class_name: String,
}

impl PricedProduct {
    /// Returns `None` when the product has no price or belongs to another class.
    pub fn resolve(product: &Product, class: &ProductClass) -> Option<Self> {
        if product.product_class_id != class.product_class_id {
            return None;
        }
        let retail_price = product.retail_price?;
        Some(Self {
            product_id: product.product_id,
            product_name: product.product_name.clone(),
            retail_price,
            product_class_id: class.product_class_id,
            product_class_name: class.product_class_name.clone(),
        })
    }

    /// Values a transaction of this product. `None` for a missing quantity, a
    /// foreign product or a sales value that overflows.
    pub fn value(&self, txn: &Transaction) -> Option<ValuedTransaction> {
        if txn.product_id != self.product_id {
            return None;
        }
        let quantity = txn.quantity?;
        let sales_value = sales_value(quantity, self.retail_price)?;
        Some(ValuedTransaction {
            transaction_id: txn.transaction_id,
            product_id: self.product_id,
            quantity,
            product_name: self.product_name.clone(),
            retail_price: self.retail_price,
            product_class_id: self.product_class_id,
            product_class_name: self.product_class_name.clone(),
            sales_value,
        })
    }
}

/// `quantity * retail_price`, or `None` past the decimal range.
pub fn sales_value(quantity: Quantity, retail_price: Money) -> Option<Money> {
    retail_price.checked_mul(Money::from(quantity))
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ValuedTransaction {
    pub transaction_id: TransactionId,
    pub product_id: ProductId,
    pub quantity: Quantity,
    pub product_name: String,
    pub retail_price: Money,
    pub product_class_id: ProductClassId,
    pub product_class_name: String,
    pub sales_value: Money,
}

impl ValuedTransaction {
    pub fn group_key(&self) -> ProductKey {
        ProductKey {
            product_id: self.product_id,
            product_name: self.product_name.clone(),
            product_class_id: self.product_class_id,
            product_class_name: self.product_class_name.clone(),
        }
    }
}

/// Grouping key of the aggregation stage. Every field past `product_id` is
/// functionally dependent on it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ProductKey {
    pub product_id: ProductId,
    pub product_name: String,
    pub product_class_id: ProductClassId,
    pub product_class_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ProductAggregate {
    pub product_id: ProductId,
    pub product_name: String,
    pub product_class_id: ProductClassId,
    pub product_class_name: String,
    pub total_sales: Money,
    pub total_quantity: u64,
}

impl ProductAggregate {
    pub fn from_totals(key: ProductKey, total_sales: Money, total_quantity: u64) -> Self {
        Self {
            product_id: key.product_id,
            product_name: key.product_name,
            product_class_id: key.product_class_id,
            product_class_name: key.product_class_name,
            total_sales,
            total_quantity,
        }
    }
}

/// Order used to rank products inside a class: sales descending, quantity
/// ascending, then product id ascending so equal pairs still rank reproducibly.
pub fn ranking_order(a: &ProductAggregate, b: &ProductAggregate) -> Ordering {
    b.total_sales
        .cmp(&a.total_sales)
        .then_with(|| a.total_quantity.cmp(&b.total_quantity))
        .then_with(|| a.product_id.cmp(&b.product_id))
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RankedProduct {
    pub rank: Rank,
    pub product: ProductAggregate,
}

/// Output order: class name, class id for classes sharing a name, then rank.
pub fn output_order(a: &RankedProduct, b: &RankedProduct) -> Ordering {
    a.product
        .product_class_name
        .cmp(&b.product.product_class_name)
        .then_with(|| a.product.product_class_id.cmp(&b.product.product_class_id))
        .then_with(|| a.rank.cmp(&b.rank))
}

/// Result row of the report.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TopProduct {
    pub product_class_name: String,
    pub rank: Rank,
    pub product_name: String,
    pub sales_value: Money,
}

impl From<RankedProduct> for TopProduct {
    fn from(ranked: RankedProduct) -> Self {
        Self {
            product_class_name: ranked.product.product_class_name,
            rank: ranked.rank,
            product_name: ranked.product.product_name,
            sales_value: ranked.product.total_sales,
        }
    }
}

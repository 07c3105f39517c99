//! Cart line items.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::catalog::Product;
use super::id::{LineItemId, ProductId};
use super::owner::OwnerId;

/// One product + variant + quantity entry in a shopper's cart.
///
/// `GET /api/cart/{owner}` returns these with the product embedded so a
/// cart can be rendered without a second catalog lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    pub id: LineItemId,
    #[serde(rename = "userId")]
    pub owner_id: OwnerId,
    pub product_id: ProductId,
    /// Always at least 1.
    pub quantity: u32,
    #[serde(default)]
    pub size: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    pub product: Product,
}

impl LineItem {
    /// Quantity times the product's effective price.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.product.effective_price() * Decimal::from(self.quantity)
    }

    /// Human-readable variant label, e.g. "Navy / M".
    #[must_use]
    pub fn variant_label(&self) -> Option<String> {
        match (self.color.as_deref(), self.size.as_deref()) {
            (Some(color), Some(size)) => Some(format!("{color} / {size}")),
            (Some(one), None) | (None, Some(one)) => Some(one.to_string()),
            (None, None) => None,
        }
    }
}

/// Body of `POST /api/cart`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewLineItem {
    #[serde(rename = "userId")]
    pub owner_id: OwnerId,
    pub product_id: ProductId,
    pub quantity: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl NewLineItem {
    /// A single unit of a product with no variant selected.
    #[must_use]
    pub const fn single(owner_id: OwnerId, product_id: ProductId) -> Self {
        Self {
            owner_id,
            product_id,
            quantity: 1,
            size: None,
            color: None,
        }
    }
}

/// Body of `PATCH /api/cart/{id}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuantityUpdate {
    pub quantity: u32,
}

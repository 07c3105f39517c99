//! Read-only catalog types: products and categories.
//!
//! These mirror the backend's `products` and `categories` tables. The wire
//! format is camelCase JSON with prices as plain numbers.

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};

use super::id::{CategoryId, ProductId};
use super::price::Price;

/// A product as served by `GET /api/products`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub slug: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub sale_price: Option<Decimal>,
    pub category_id: CategoryId,
    #[serde(default, deserialize_with = "flag_or_false")]
    pub featured: bool,
    #[serde(default, deserialize_with = "flag_or_false")]
    pub best_seller: bool,
    #[serde(default, deserialize_with = "flag_or_false")]
    pub new_arrival: bool,
    #[serde(default = "default_in_stock", deserialize_with = "flag_or_true")]
    pub in_stock: bool,
    #[serde(default)]
    pub colors: Option<Vec<String>>,
    #[serde(default)]
    pub sizes: Option<Vec<String>>,
    pub image: String,
}

impl Product {
    /// The price a shopper pays: the sale price when set, else the list price.
    #[must_use]
    pub fn effective_price(&self) -> Decimal {
        self.sale_price.unwrap_or(self.price)
    }

    /// Whether the product is currently discounted.
    #[must_use]
    pub const fn is_on_sale(&self) -> bool {
        self.sale_price.is_some()
    }

    /// The shopper-facing price in the store currency.
    #[must_use]
    pub fn display_price(&self) -> Price {
        Price::usd(self.effective_price())
    }

    /// Color options, empty when the product has none.
    #[must_use]
    pub fn color_options(&self) -> &[String] {
        self.colors.as_deref().unwrap_or_default()
    }

    /// Size options, empty when the product has none.
    #[must_use]
    pub fn size_options(&self) -> &[String] {
        self.sizes.as_deref().unwrap_or_default()
    }
}

/// A product category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
}

const fn default_in_stock() -> bool {
    true
}

// Flag columns are nullable with a default, so `null` means "use the default".
fn flag_or_false<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    Ok(Option::<bool>::deserialize(deserializer)?.unwrap_or(false))
}

fn flag_or_true<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    Ok(Option::<bool>::deserialize(deserializer)?.unwrap_or(true))
}

//! Cart display data and cart-sidebar actions.

use std::ops::Deref;

use maison_core::{LineItem, LineItemId, Price};
use rust_decimal::Decimal;
use tracing::instrument;

use super::Notice;
use crate::error::{SyncError, add_breadcrumb};
use crate::sync::{CartCache, Confidence, Tracked};

/// Cart line display data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartItemView {
    pub id: LineItemId,
    pub slug: String,
    pub name: String,
    pub variant_title: Option<String>,
    pub quantity: u32,
    pub price: String,
    pub line_price: String,
    pub image: String,
    pub confidence: Confidence,
}

/// Cart display data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartView {
    pub items: Vec<CartItemView>,
    pub subtotal: String,
    pub item_count: u32,
}

impl CartView {
    /// Create an empty cart.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            subtotal: format_price(Decimal::ZERO),
            item_count: 0,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl From<&[Tracked<LineItem>]> for CartView {
    fn from(items: &[Tracked<LineItem>]) -> Self {
        Self {
            items: items.iter().map(CartItemView::from).collect(),
            subtotal: format_price(subtotal(items)),
            item_count: items.iter().map(|item| item.quantity).sum(),
        }
    }
}

impl From<&Tracked<LineItem>> for CartItemView {
    fn from(item: &Tracked<LineItem>) -> Self {
        Self {
            id: item.id,
            slug: item.product.slug.clone(),
            name: item.product.name.clone(),
            variant_title: item.variant_label(),
            quantity: item.quantity,
            price: item.product.display_price().display(),
            line_price: format_price(item.line_total()),
            image: item.product.image.clone(),
            confidence: item.confidence,
        }
    }
}

/// Format an amount in the store currency, e.g. `$40.00`.
#[must_use]
pub fn format_price(amount: Decimal) -> String {
    Price::usd(amount).display()
}

/// Sum of quantity times effective price over every line.
#[must_use]
pub fn subtotal<T: Deref<Target = LineItem>>(items: &[T]) -> Decimal {
    items.iter().map(|item| item.line_total()).sum()
}

/// Change a line's quantity from the cart sidebar.
///
/// The cache shows the new quantity immediately; this waits for the backend
/// and returns a notice only if the change had to be rolled back.
#[instrument(skip(cart))]
pub async fn change_quantity(cart: &CartCache, id: LineItemId, quantity: u32) -> Option<Notice> {
    let confirmation = match cart.update_quantity(id, quantity) {
        Ok(Some(confirmation)) => confirmation,
        Ok(None) => return None,
        Err(e) => return Some(quantity_failed(&e)),
    };

    let line_item_id = id.to_string();
    let new_quantity = quantity.to_string();
    add_breadcrumb(
        "cart",
        "Changed quantity",
        Some(&[
            ("line_item_id", line_item_id.as_str()),
            ("quantity", new_quantity.as_str()),
        ]),
    );

    confirmation.wait().await.err().map(|e| quantity_failed(&e))
}

/// Remove a line from the cart sidebar.
#[instrument(skip(cart))]
pub async fn remove_item(cart: &CartCache, id: LineItemId) -> Option<Notice> {
    let result = match cart.remove(id) {
        Ok(confirmation) => confirmation.wait().await,
        Err(e) => Err(e),
    };

    match result {
        Ok(()) => {
            let line_item_id = id.to_string();
            add_breadcrumb("cart", "Removed item", Some(&[("line_item_id", line_item_id.as_str())]));
            None
        }
        Err(e) => {
            tracing::warn!(error = %e, "Remove from cart failed");
            Some(Notice::error(
                "Failed to remove item",
                "There was a problem removing this item from your cart.",
            ))
        }
    }
}

/// Empty the cart.
#[instrument(skip(cart))]
pub async fn clear(cart: &CartCache) -> Notice {
    match cart.clear().await {
        Ok(()) => {
            add_breadcrumb("cart", "Cleared cart", None);
            Notice::success("Cart cleared", "Your cart is now empty.")
        }
        Err(e) => {
            tracing::warn!(error = %e, "Clear cart failed");
            Notice::error("Action failed", "There was a problem clearing your cart.")
        }
    }
}

fn quantity_failed(error: &SyncError) -> Notice {
    tracing::warn!(error = %error, "Quantity change failed");
    Notice::error(
        "Failed to update quantity",
        "There was a problem updating this item. The previous quantity was restored.",
    )
}

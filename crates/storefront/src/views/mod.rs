//! Helpers for consumer views.
//!
//! Views render the reflection caches and call their mutations; they never
//! talk to the store client directly. The flows here are the page-level
//! actions (add to cart, wishlist toggle, quantity change, remove) and return
//! a [`Notice`] for the shopper instead of an error, the way a toast would.

pub mod cart;
mod notice;
pub mod product;
pub mod shop;
pub mod wishlist;

pub use cart::{CartItemView, CartView, format_price, subtotal};
pub use notice::{Notice, NoticeKind};
pub use product::VariantSelection;
pub use shop::{ShopFilter, filter_products, similar_products};

use thiserror::Error;

/// A product selection that cannot be added to the cart.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Please select a size")]
    MissingSize,

    #[error("Please select a color")]
    MissingColor,

    #[error("Quantity must be at least 1, got {0}")]
    InvalidQuantity(u32),

    /// The chosen size or color is not offered for this product.
    #[error("{0:?} is not an option for this product")]
    UnknownOption(String),
}

impl ValidationError {
    /// Longer text for the notice shown to the shopper.
    #[must_use]
    pub const fn description(&self) -> &'static str {
        match self {
            Self::MissingSize => "Size selection is required before adding to cart.",
            Self::MissingColor => "Color selection is required before adding to cart.",
            Self::InvalidQuantity(_) => "Choose a quantity of at least one.",
            Self::UnknownOption(_) => "Choose one of the listed options.",
        }
    }
}

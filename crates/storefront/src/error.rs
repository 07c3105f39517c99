//! Errors raised by the reflection caches, plus Sentry helpers.
//!
//! Remote failures arrive as [`StoreError`] and are wrapped in [`SyncError`]
//! so callers of a cache only ever match on one type.

use maison_core::{LineItemId, ProductId};
use thiserror::Error;

use crate::api::StoreError;

/// Error type for cart and wishlist cache operations.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The remote call failed.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// The line item is not in the local snapshot.
    #[error("Line item {0} is not in the cart")]
    UnknownLineItem(LineItemId),

    /// The product is not in the local wishlist snapshot.
    #[error("Product {0} is not in the wishlist")]
    NotInWishlist(ProductId),

    /// The mutation queue worker has stopped.
    #[error("Mutation queue is closed")]
    QueueClosed,
}

impl SyncError {
    /// Whether the failure came from the network or backend rather than
    /// from the local snapshot.
    #[must_use]
    pub const fn is_remote(&self) -> bool {
        matches!(self, Self::Store(_))
    }
}

/// Result type alias for `SyncError`.
pub type Result<T> = std::result::Result<T, SyncError>;

/// Add a breadcrumb for shopper actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of cart and
/// wishlist actions leading up to an error. A no-op when Sentry is not
/// initialized.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("cart", "Changed quantity", Some(&[("line_item_id", "12")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}

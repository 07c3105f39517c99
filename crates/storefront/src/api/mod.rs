//! Remote store and catalog clients for the storefront backend.
//!
//! # Architecture
//!
//! - The backend is the source of truth; the reflection caches in
//!   [`crate::sync`] only mirror it
//! - Cart and wishlist access sits behind the [`CartStore`] and
//!   [`WishlistStore`] traits so caches can be driven by fakes in tests
//! - [`StoreClient`] is the `reqwest` implementation of both traits
//! - [`CatalogClient`] serves read-only product data, cached in memory via
//!   `moka`
//!
//! # Failure contract
//!
//! `fetch_*` methods never fail: any transport error, non-success status, or
//! undecodable body is logged and turned into an empty list so a view always
//! has something to render. Every other call returns [`StoreError`] once, with
//! no retry.
//!
//! # Example
//!
//! ```rust,ignore
//! use maison_storefront::api::{CartStore, StoreClient};
//!
//! let client = StoreClient::new(&config)?;
//! let items = client.fetch_cart(&config.owner_id).await;
//! ```

mod cache;
mod catalog;
mod client;

pub use catalog::CatalogClient;
pub use client::StoreClient;

use async_trait::async_trait;
use maison_core::{
    LineItem, LineItemId, NewLineItem, NewWishlistEntry, OwnerId, ProductId, WishlistEntry,
};
use thiserror::Error;

/// Errors that can occur when talking to the storefront backend.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Transport failure: connection refused, reset, timed out.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The backend answered with a non-success status.
    #[error("Request failed: {status} - {message}")]
    Request { status: u16, message: String },

    /// A catalog lookup by slug matched nothing. Cart and wishlist calls
    /// report a 404 as `Request` like any other status.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Response body did not match the expected shape.
    #[error("Decode error: {0}")]
    Decode(String),

    /// An endpoint URL could not be built.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl StoreError {
    /// HTTP status for `Request` errors.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Request { status, .. } => Some(*status),
            Self::NotFound(_) => Some(404),
            _ => None,
        }
    }
}

/// Cart endpoint family: `/api/cart`.
///
/// Mutating calls return `StoreError::Request` for any non-success status.
#[async_trait]
pub trait CartStore: Send + Sync {
    /// All line items for an owner. Fails softly to an empty list.
    async fn fetch_cart(&self, owner: &OwnerId) -> Vec<LineItem>;

    /// Create a line item; the backend assigns its id and embeds the product.
    async fn create_line_item(&self, item: &NewLineItem) -> Result<LineItem, StoreError>;

    /// Set the quantity of one line item.
    async fn update_line_item(&self, id: LineItemId, quantity: u32) -> Result<(), StoreError>;

    /// Delete one line item.
    async fn remove_line_item(&self, id: LineItemId) -> Result<(), StoreError>;

    /// Delete every line item for an owner.
    async fn clear_cart(&self, owner: &OwnerId) -> Result<(), StoreError>;
}

/// Wishlist endpoint family: `/api/wishlist`.
///
/// Mutating calls return `StoreError::Request` for any non-success status.
#[async_trait]
pub trait WishlistStore: Send + Sync {
    /// All wishlist entries for an owner. Fails softly to an empty list.
    async fn fetch_wishlist(&self, owner: &OwnerId) -> Vec<WishlistEntry>;

    /// Create a wishlist entry; the backend assigns its id.
    async fn create_wishlist_entry(
        &self,
        entry: &NewWishlistEntry,
    ) -> Result<WishlistEntry, StoreError>;

    /// Delete the entry for an (owner, product) pair.
    async fn remove_wishlist_entry(
        &self,
        owner: &OwnerId,
        product_id: ProductId,
    ) -> Result<(), StoreError>;
}

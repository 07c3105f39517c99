//! Maison storefront client library.
//!
//! Keeps a shopper's cart and wishlist in sync with the storefront backend:
//! changes show up locally at once and are reconciled with the server in the
//! background. See [`sync`] for the protocol.
//!
//! The usual entry point is [`StorefrontSession`]:
//!
//! ```rust,ignore
//! let config = StorefrontConfig::from_env()?;
//! let session = StorefrontSession::connect(&config)?;
//! let items = session.cart().snapshot().await;
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod config;
pub mod error;
pub mod session;
pub mod sync;
pub mod views;

pub use api::{CartStore, CatalogClient, StoreClient, StoreError, WishlistStore};
pub use config::{ConfigError, StorefrontConfig};
pub use error::SyncError;
pub use session::StorefrontSession;
pub use sync::{CartCache, Confidence, Confirmation, LoadPhase, Tracked, WishlistCache};

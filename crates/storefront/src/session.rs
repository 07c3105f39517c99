//! Per-shopper service object.

use std::sync::Arc;

use maison_core::OwnerId;
use tracing::info;

use crate::api::{CartStore, CatalogClient, StoreClient, StoreError, WishlistStore};
use crate::config::StorefrontConfig;
use crate::sync::{CartCache, WishlistCache};

/// The cart and wishlist caches for one owner, plus the catalog client.
///
/// Stores are injected, never looked up, so tests can build a session over
/// in-memory fakes and the owner is always explicit.
pub struct StorefrontSession {
    cart_store: Arc<dyn CartStore>,
    wishlist_store: Arc<dyn WishlistStore>,
    catalog: Option<CatalogClient>,
    cart: CartCache,
    wishlist: WishlistCache,
}

impl StorefrontSession {
    /// Create a session over the given stores.
    ///
    /// Both caches start uninitialized; the first read of each fetches it.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    #[must_use]
    pub fn new(
        cart_store: Arc<dyn CartStore>,
        wishlist_store: Arc<dyn WishlistStore>,
        owner: OwnerId,
    ) -> Self {
        let cart = CartCache::new(Arc::clone(&cart_store), owner.clone());
        let wishlist = WishlistCache::new(Arc::clone(&wishlist_store), owner);

        Self {
            cart_store,
            wishlist_store,
            catalog: None,
            cart,
            wishlist,
        }
    }

    /// Create a session talking to the configured backend over HTTP.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built from the
    /// configuration.
    pub fn connect(config: &StorefrontConfig) -> Result<Self, StoreError> {
        let client = StoreClient::new(config)?;
        let catalog = CatalogClient::new(client.clone(), config.catalog_cache_ttl);
        let store = Arc::new(client);

        let mut session = Self::new(
            Arc::clone(&store) as Arc<dyn CartStore>,
            store as Arc<dyn WishlistStore>,
            config.owner_id.clone(),
        );
        session.catalog = Some(catalog);
        Ok(session)
    }

    /// Attach a catalog client.
    #[must_use]
    pub fn with_catalog(mut self, catalog: CatalogClient) -> Self {
        self.catalog = Some(catalog);
        self
    }

    /// Rebuild both caches for a different owner.
    ///
    /// The old caches are dropped; their queued mutations still run to
    /// completion against the old owner.
    pub fn switch_owner(&mut self, owner: OwnerId) {
        if &owner == self.owner() {
            return;
        }
        info!(from = %self.owner(), to = %owner, "Switching owner");
        self.cart = CartCache::new(Arc::clone(&self.cart_store), owner.clone());
        self.wishlist = WishlistCache::new(Arc::clone(&self.wishlist_store), owner);
    }

    #[must_use]
    pub fn owner(&self) -> &OwnerId {
        self.cart.owner()
    }

    #[must_use]
    pub const fn cart(&self) -> &CartCache {
        &self.cart
    }

    #[must_use]
    pub const fn wishlist(&self) -> &WishlistCache {
        &self.wishlist
    }

    /// The catalog client, if the session was built with one.
    #[must_use]
    pub const fn catalog(&self) -> Option<&CatalogClient> {
        self.catalog.as_ref()
    }
}

//! Read-only catalog client.
//!
//! Catalog data changes rarely and is shared by every view, so responses are
//! cached with `moka` (TTL from configuration, 5 minutes by default). Cart and
//! wishlist data is never cached here; it lives in the reflection caches.

use std::sync::Arc;
use std::time::Duration;

use maison_core::{Category, Product};
use moka::future::Cache;
use tracing::{debug, instrument};

use super::cache::{CacheKey, CacheValue};
use super::{StoreClient, StoreError};

/// Client for the catalog endpoints (`/api/products`, `/api/categories`).
#[derive(Clone)]
pub struct CatalogClient {
    inner: Arc<CatalogClientInner>,
}

struct CatalogClientInner {
    store: StoreClient,
    cache: Cache<CacheKey, CacheValue>,
}

impl CatalogClient {
    /// Create a catalog client sharing the store client's connection pool.
    #[must_use]
    pub fn new(store: StoreClient, ttl: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(ttl)
            .build();

        Self {
            inner: Arc::new(CatalogClientInner { store, cache }),
        }
    }

    /// Drop every cached response.
    pub fn invalidate_all(&self) {
        self.inner.cache.invalidate_all();
    }

    /// Get all products.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn products(&self) -> Result<Vec<Product>, StoreError> {
        self.product_list(CacheKey::Products, &["api", "products"])
            .await
    }

    /// Get products flagged as bestsellers.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn bestsellers(&self) -> Result<Vec<Product>, StoreError> {
        self.product_list(CacheKey::Bestsellers, &["api", "products", "bestsellers"])
            .await
    }

    /// Get products flagged as new arrivals.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn new_arrivals(&self) -> Result<Vec<Product>, StoreError> {
        self.product_list(CacheKey::NewArrivals, &["api", "products", "new-arrivals"])
            .await
    }

    /// Get a product by its slug.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if no product has this slug, or another
    /// error if the API request fails.
    #[instrument(skip(self), fields(slug = %slug))]
    pub async fn product_by_slug(&self, slug: &str) -> Result<Product, StoreError> {
        let key = CacheKey::Product(slug.to_string());

        if let Some(CacheValue::Product(product)) = self.inner.cache.get(&key).await {
            debug!("Cache hit for product");
            return Ok(*product);
        }

        let url = self.inner.store.endpoint(&["api", "products", slug])?;
        let product: Product = self
            .inner
            .store
            .get_json(url)
            .await
            .map_err(|e| match e {
                StoreError::Request { status: 404, .. } => {
                    StoreError::NotFound(format!("product {slug}"))
                }
                other => other,
            })?;

        self.inner
            .cache
            .insert(key, CacheValue::Product(Box::new(product.clone())))
            .await;

        Ok(product)
    }

    /// Get all categories.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn categories(&self) -> Result<Vec<Category>, StoreError> {
        if let Some(CacheValue::Categories(categories)) =
            self.inner.cache.get(&CacheKey::Categories).await
        {
            debug!("Cache hit for categories");
            return Ok(categories);
        }

        let url = self.inner.store.endpoint(&["api", "categories"])?;
        let categories: Vec<Category> = self.inner.store.get_json(url).await?;

        self.inner
            .cache
            .insert(
                CacheKey::Categories,
                CacheValue::Categories(categories.clone()),
            )
            .await;

        Ok(categories)
    }

    async fn product_list(
        &self,
        key: CacheKey,
        segments: &[&str],
    ) -> Result<Vec<Product>, StoreError> {
        if let Some(CacheValue::Products(products)) = self.inner.cache.get(&key).await {
            debug!(key = ?key, "Cache hit for product list");
            return Ok(products);
        }

        let url = self.inner.store.endpoint(segments)?;
        let products: Vec<Product> = self.inner.store.get_json(url).await?;

        self.inner
            .cache
            .insert(key, CacheValue::Products(products.clone()))
            .await;

        Ok(products)
    }
}

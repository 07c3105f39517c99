//! HTTP implementation of the cart and wishlist stores.
//!
//! Uses `reqwest` with a cookie store so session credentials travel with
//! every request, like the browser client's `credentials: 'include'`.

use std::sync::Arc;

use async_trait::async_trait;
use maison_core::{
    LineItem, LineItemId, NewLineItem, NewWishlistEntry, OwnerId, ProductId, QuantityUpdate,
    WishlistEntry,
};
use reqwest::header::{COOKIE, HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument, warn};
use url::Url;

use super::{CartStore, StoreError, WishlistStore};
use crate::config::StorefrontConfig;

/// Longest slice of an error body kept in logs and errors.
const MAX_ERROR_BODY: usize = 200;

/// Client for the storefront backend's REST API.
///
/// Cheap to clone; clones share one connection pool and cookie jar.
#[derive(Clone)]
pub struct StoreClient {
    inner: Arc<StoreClientInner>,
}

struct StoreClientInner {
    client: reqwest::Client,
    base_url: Url,
}

impl std::fmt::Debug for StoreClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreClient")
            .field("base_url", &self.inner.base_url.as_str())
            .finish_non_exhaustive()
    }
}

impl StoreClient {
    /// Create a new store client.
    ///
    /// # Errors
    ///
    /// Returns error if the session cookie is not a valid header value or the
    /// HTTP client fails to build.
    pub fn new(config: &StorefrontConfig) -> Result<Self, StoreError> {
        let mut headers = HeaderMap::new();

        if let Some(cookie) = &config.session_cookie {
            let mut value = HeaderValue::from_str(cookie.expose_secret())
                .map_err(|e| StoreError::Decode(format!("Invalid session cookie: {e}")))?;
            value.set_sensitive(true);
            headers.insert(COOKIE, value);
        }

        let mut builder = reqwest::Client::builder()
            .cookie_store(true)
            .default_headers(headers);
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            inner: Arc::new(StoreClientInner {
                client: builder.build()?,
                base_url: config.api_url.clone(),
            }),
        })
    }

    /// The backend base URL.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    /// Build an endpoint URL from path segments, percent-encoding each one.
    pub(crate) fn endpoint(&self, segments: &[&str]) -> Result<Url, StoreError> {
        let mut url = self.inner.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| StoreError::InvalidUrl(url::ParseError::RelativeUrlWithCannotBeABaseBase))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// GET a JSON body.
    pub(crate) async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, StoreError> {
        let response = self.inner.client.get(url).send().await?;
        let response = check_status(response).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| StoreError::Decode(e.to_string()))
    }

    /// Send a JSON body and decode the JSON reply.
    async fn send_json<B: Serialize + Sync, T: DeserializeOwned>(
        &self,
        method: reqwest::Method,
        url: Url,
        body: &B,
    ) -> Result<T, StoreError> {
        let response = self
            .inner
            .client
            .request(method, url)
            .json(body)
            .send()
            .await?;
        let response = check_status(response).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| StoreError::Decode(e.to_string()))
    }

    /// Send a request whose reply body is ignored.
    async fn send_unit<B: Serialize + Sync>(
        &self,
        method: reqwest::Method,
        url: Url,
        body: Option<&B>,
    ) -> Result<(), StoreError> {
        let mut request = self.inner.client.request(method, url);
        if let Some(body) = body {
            request = request.json(body);
        }
        check_status(request.send().await?).await?;
        Ok(())
    }

    /// GET a list, turning every failure into an empty list.
    async fn fetch_list<T: DeserializeOwned>(&self, segments: &[&str]) -> Vec<T> {
        let result = match self.endpoint(segments) {
            Ok(url) => self.get_json::<Vec<T>>(url).await,
            Err(e) => Err(e),
        };

        match result {
            Ok(items) => {
                debug!(count = items.len(), "Fetched collection");
                items
            }
            Err(e) => {
                warn!(error = %e, "Collection fetch failed, rendering empty");
                Vec::new()
            }
        }
    }
}

/// Map every non-success status, 404 included, to `StoreError::Request`.
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, StoreError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = body.chars().take(MAX_ERROR_BODY).collect::<String>();
    debug!(status = %status, body = %message, "Backend returned non-success status");

    Err(StoreError::Request {
        status: status.as_u16(),
        message,
    })
}

#[async_trait]
impl CartStore for StoreClient {
    #[instrument(skip(self), fields(owner = %owner))]
    async fn fetch_cart(&self, owner: &OwnerId) -> Vec<LineItem> {
        self.fetch_list(&["api", "cart", owner.as_str()]).await
    }

    #[instrument(skip(self, item), fields(owner = %item.owner_id, product_id = %item.product_id))]
    async fn create_line_item(&self, item: &NewLineItem) -> Result<LineItem, StoreError> {
        let url = self.endpoint(&["api", "cart"])?;
        self.send_json(reqwest::Method::POST, url, item).await
    }

    #[instrument(skip(self), fields(id = %id))]
    async fn update_line_item(&self, id: LineItemId, quantity: u32) -> Result<(), StoreError> {
        let url = self.endpoint(&["api", "cart", &id.to_string()])?;
        self.send_unit(reqwest::Method::PATCH, url, Some(&QuantityUpdate { quantity }))
            .await
    }

    #[instrument(skip(self), fields(id = %id))]
    async fn remove_line_item(&self, id: LineItemId) -> Result<(), StoreError> {
        let url = self.endpoint(&["api", "cart", &id.to_string()])?;
        self.send_unit::<()>(reqwest::Method::DELETE, url, None).await
    }

    #[instrument(skip(self), fields(owner = %owner))]
    async fn clear_cart(&self, owner: &OwnerId) -> Result<(), StoreError> {
        let url = self.endpoint(&["api", "cart", "clear", owner.as_str()])?;
        self.send_unit::<()>(reqwest::Method::DELETE, url, None).await
    }
}

#[async_trait]
impl WishlistStore for StoreClient {
    #[instrument(skip(self), fields(owner = %owner))]
    async fn fetch_wishlist(&self, owner: &OwnerId) -> Vec<WishlistEntry> {
        self.fetch_list(&["api", "wishlist", owner.as_str()]).await
    }

    #[instrument(skip(self, entry), fields(owner = %entry.owner_id, product_id = %entry.product_id))]
    async fn create_wishlist_entry(
        &self,
        entry: &NewWishlistEntry,
    ) -> Result<WishlistEntry, StoreError> {
        let url = self.endpoint(&["api", "wishlist"])?;
        self.send_json(reqwest::Method::POST, url, entry).await
    }

    #[instrument(skip(self), fields(owner = %owner, product_id = %product_id))]
    async fn remove_wishlist_entry(
        &self,
        owner: &OwnerId,
        product_id: ProductId,
    ) -> Result<(), StoreError> {
        let url = self.endpoint(&["api", "wishlist", owner.as_str(), &product_id.to_string()])?;
        self.send_unit::<()>(reqwest::Method::DELETE, url, None).await
    }
}

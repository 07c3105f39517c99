//! Integration tests for the Maison storefront client.
//!
//! Tests drive the real `StoreClient`, caches, and catalog client against
//! [`MockBackend`], an in-memory axum server bound to an ephemeral port.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p maison-integration-tests
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! let backend = MockBackend::spawn().await;
//! backend.add_product(product(10, "linen-shirt", 40));
//! let session = StorefrontSession::connect(&backend.config(OwnerId::guest()))?;
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::collections::HashSet;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use axum::extract::{Path, State};
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use maison_core::{
    Category, CategoryId, LineItem, LineItemId, NewLineItem, NewWishlistEntry, OwnerId, Product,
    ProductId, QuantityUpdate, WishlistEntry, WishlistEntryId,
};
use maison_storefront::StorefrontConfig;
use rust_decimal::Decimal;
use secrecy::SecretString;
use serde_json::json;
use tokio::sync::Semaphore;

/// Backend routes that can be made to fail with a 500.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    FetchCart,
    CreateLineItem,
    UpdateLineItem,
    RemoveLineItem,
    ClearCart,
    FetchWishlist,
    CreateWishlistEntry,
    RemoveWishlistEntry,
    Products,
}

#[derive(Default)]
struct BackendState {
    categories: Vec<Category>,
    products: Vec<Product>,
    cart: Vec<LineItem>,
    wishlist: Vec<WishlistEntry>,
    next_id: i32,
    failing: HashSet<Route>,
    /// `METHOD /path` of every request, in arrival order.
    requests: Vec<String>,
    cookies: Vec<String>,
}

#[derive(Clone)]
struct AppState {
    backend: Arc<Mutex<BackendState>>,
    /// When set, mutating handlers wait for a permit before answering.
    gate: Option<Arc<Semaphore>>,
}

impl AppState {
    fn lock(&self) -> MutexGuard<'_, BackendState> {
        self.backend.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn pass_gate(&self) {
        if let Some(gate) = &self.gate
            && let Ok(permit) = gate.acquire().await
        {
            permit.forget();
        }
    }

    /// Record the request and decide whether it fails.
    fn record(&self, method: &Method, uri: &Uri, headers: &HeaderMap, route: Route) -> Result<(), Response> {
        let mut state = self.lock();
        state.requests.push(format!("{method} {}", uri.path()));
        if let Some(cookie) = headers.get(axum::http::header::COOKIE).and_then(|v| v.to_str().ok()) {
            state.cookies.push(cookie.to_string());
        }
        if state.failing.contains(&route) {
            return Err((StatusCode::INTERNAL_SERVER_ERROR, "injected failure").into_response());
        }
        Ok(())
    }
}

/// In-memory storefront backend.
pub struct MockBackend {
    addr: SocketAddr,
    state: AppState,
}

/// A product in category 1 with no options.
#[must_use]
pub fn product(id: i32, slug: &str, price: i64) -> Product {
    Product {
        id: ProductId::new(id),
        slug: slug.to_string(),
        name: slug.replace('-', " "),
        description: None,
        price: Decimal::new(price, 0),
        sale_price: None,
        category_id: CategoryId::new(1),
        featured: false,
        best_seller: false,
        new_arrival: false,
        in_stock: true,
        colors: None,
        sizes: None,
        image: format!("/img/{slug}.jpg"),
    }
}

#[must_use]
pub fn category(id: i32, slug: &str) -> Category {
    Category {
        id: CategoryId::new(id),
        name: slug.to_string(),
        slug: slug.to_string(),
        description: None,
        image: None,
    }
}

impl MockBackend {
    /// Start a backend that answers immediately.
    ///
    /// # Panics
    ///
    /// Panics if no local port can be bound.
    pub async fn spawn() -> Self {
        Self::start(None).await
    }

    /// Start a backend whose mutating routes wait for a permit on the
    /// returned semaphore before answering.
    ///
    /// # Panics
    ///
    /// Panics if no local port can be bound.
    pub async fn spawn_gated() -> (Self, Arc<Semaphore>) {
        let gate = Arc::new(Semaphore::new(0));
        (Self::start(Some(Arc::clone(&gate))).await, gate)
    }

    #[allow(clippy::expect_used)]
    async fn start(gate: Option<Arc<Semaphore>>) -> Self {
        let state = AppState {
            backend: Arc::default(),
            gate,
        };

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind mock backend");
        let addr = listener.local_addr().expect("Failed to read local address");

        let app = router(state.clone());
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self { addr, state }
    }

    /// Base URL of the running backend.
    #[allow(clippy::expect_used)]
    #[must_use]
    pub fn url(&self) -> url::Url {
        url::Url::parse(&format!("http://{}/", self.addr)).expect("valid socket url")
    }

    /// Client configuration pointing at this backend.
    #[must_use]
    pub fn config(&self, owner: OwnerId) -> StorefrontConfig {
        StorefrontConfig::new(self.url(), owner)
    }

    /// Client configuration that also sends a session cookie.
    #[must_use]
    pub fn config_with_cookie(&self, owner: OwnerId, cookie: &str) -> StorefrontConfig {
        let mut config = self.config(owner);
        config.session_cookie = Some(SecretString::from(cookie.to_string()));
        config
    }

    pub fn add_category(&self, category: Category) {
        self.state.lock().categories.push(category);
    }

    pub fn add_product(&self, product: Product) {
        self.state.lock().products.push(product);
    }

    /// Put a line item directly into the backend's cart table.
    ///
    /// # Panics
    ///
    /// Panics if the product was not added first.
    #[allow(clippy::expect_used)]
    pub fn seed_line_item(&self, owner: &OwnerId, product_id: ProductId, quantity: u32) -> LineItemId {
        let mut state = self.state.lock();
        let product = state
            .products
            .iter()
            .find(|p| p.id == product_id)
            .cloned()
            .expect("seeded line item needs a known product");
        state.next_id += 1;
        let id = LineItemId::new(state.next_id);
        state.cart.push(LineItem {
            id,
            owner_id: owner.clone(),
            product_id,
            quantity,
            size: None,
            color: None,
            product,
        });
        id
    }

    pub fn seed_wishlist_entry(&self, owner: &OwnerId, product_id: ProductId) {
        let mut state = self.state.lock();
        state.next_id += 1;
        let id = WishlistEntryId::new(state.next_id);
        state.wishlist.push(WishlistEntry {
            id,
            owner_id: owner.clone(),
            product_id,
            product: None,
        });
    }

    pub fn fail(&self, route: Route) {
        self.state.lock().failing.insert(route);
    }

    pub fn recover(&self, route: Route) {
        self.state.lock().failing.remove(&route);
    }

    /// Every request received, as `METHOD /path`.
    #[must_use]
    pub fn requests(&self) -> Vec<String> {
        self.state.lock().requests.clone()
    }

    /// Requests matching a method and path exactly.
    #[must_use]
    pub fn count(&self, request: &str) -> usize {
        self.state.lock().requests.iter().filter(|r| *r == request).count()
    }

    /// `Cookie` headers received, in arrival order.
    #[must_use]
    pub fn cookies(&self) -> Vec<String> {
        self.state.lock().cookies.clone()
    }

    /// Quantity of a line item as the backend holds it.
    #[must_use]
    pub fn quantity(&self, id: LineItemId) -> Option<u32> {
        self.state
            .lock()
            .cart
            .iter()
            .find(|item| item.id == id)
            .map(|item| item.quantity)
    }

    /// Number of cart lines the backend holds for an owner.
    #[must_use]
    pub fn cart_len(&self, owner: &OwnerId) -> usize {
        self.state.lock().cart.iter().filter(|item| &item.owner_id == owner).count()
    }
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/categories", get(list_categories))
        .route("/api/products", get(list_products))
        .route("/api/products/bestsellers", get(bestsellers))
        .route("/api/products/new-arrivals", get(new_arrivals))
        .route("/api/products/{slug}", get(product_by_slug))
        .route("/api/cart", post(create_line_item))
        .route("/api/cart/clear/{owner}", delete(clear_cart))
        .route(
            "/api/cart/{key}",
            get(fetch_cart).patch(update_line_item).delete(remove_line_item),
        )
        .route("/api/wishlist", post(create_wishlist_entry))
        .route("/api/wishlist/{owner}", get(fetch_wishlist))
        .route("/api/wishlist/{owner}/{product_id}", delete(remove_wishlist_entry))
        .with_state(state)
}

// =============================================================================
// Catalog
// =============================================================================

async fn list_categories(State(state): State<AppState>) -> Json<Vec<Category>> {
    Json(state.lock().categories.clone())
}

async fn list_products(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
) -> Response {
    if let Err(response) = state.record(&method, &uri, &headers, Route::Products) {
        return response;
    }
    Json(state.lock().products.clone()).into_response()
}

async fn bestsellers(State(state): State<AppState>) -> Json<Vec<Product>> {
    let products = state.lock().products.iter().filter(|p| p.best_seller).cloned().collect();
    Json(products)
}

async fn new_arrivals(State(state): State<AppState>) -> Json<Vec<Product>> {
    let products = state.lock().products.iter().filter(|p| p.new_arrival).cloned().collect();
    Json(products)
}

async fn product_by_slug(State(state): State<AppState>, Path(slug): Path<String>) -> Response {
    let found = state.lock().products.iter().find(|p| p.slug == slug).cloned();
    found.map_or_else(
        || (StatusCode::NOT_FOUND, Json(json!({ "message": "Product not found" }))).into_response(),
        |product| Json(product).into_response(),
    )
}

// =============================================================================
// Cart
// =============================================================================

async fn fetch_cart(
    State(state): State<AppState>,
    Path(owner): Path<String>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
) -> Response {
    if let Err(response) = state.record(&method, &uri, &headers, Route::FetchCart) {
        return response;
    }
    let items: Vec<LineItem> = state
        .lock()
        .cart
        .iter()
        .filter(|item| item.owner_id.as_str() == owner)
        .cloned()
        .collect();
    Json(items).into_response()
}

async fn create_line_item(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    Json(body): Json<NewLineItem>,
) -> Response {
    state.pass_gate().await;
    if let Err(response) = state.record(&method, &uri, &headers, Route::CreateLineItem) {
        return response;
    }

    let mut backend = state.lock();
    let Some(product) = backend.products.iter().find(|p| p.id == body.product_id).cloned() else {
        return (StatusCode::BAD_REQUEST, "unknown product").into_response();
    };
    backend.next_id += 1;
    let item = LineItem {
        id: LineItemId::new(backend.next_id),
        owner_id: body.owner_id,
        product_id: body.product_id,
        quantity: body.quantity,
        size: body.size,
        color: body.color,
        product,
    };
    backend.cart.push(item.clone());
    (StatusCode::CREATED, Json(item)).into_response()
}

async fn update_line_item(
    State(state): State<AppState>,
    Path(key): Path<String>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    Json(body): Json<QuantityUpdate>,
) -> Response {
    state.pass_gate().await;
    if let Err(response) = state.record(&method, &uri, &headers, Route::UpdateLineItem) {
        return response;
    }
    let Ok(id) = key.parse::<LineItemId>() else {
        return StatusCode::BAD_REQUEST.into_response();
    };

    let mut backend = state.lock();
    match backend.cart.iter_mut().find(|item| item.id == id) {
        Some(item) => {
            item.quantity = body.quantity;
            Json(item.clone()).into_response()
        }
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn remove_line_item(
    State(state): State<AppState>,
    Path(key): Path<String>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
) -> Response {
    state.pass_gate().await;
    if let Err(response) = state.record(&method, &uri, &headers, Route::RemoveLineItem) {
        return response;
    }
    let Ok(id) = key.parse::<LineItemId>() else {
        return StatusCode::BAD_REQUEST.into_response();
    };
    state.lock().cart.retain(|item| item.id != id);
    StatusCode::NO_CONTENT.into_response()
}

async fn clear_cart(
    State(state): State<AppState>,
    Path(owner): Path<String>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
) -> Response {
    state.pass_gate().await;
    if let Err(response) = state.record(&method, &uri, &headers, Route::ClearCart) {
        return response;
    }
    state.lock().cart.retain(|item| item.owner_id.as_str() != owner);
    StatusCode::NO_CONTENT.into_response()
}

// =============================================================================
// Wishlist
// =============================================================================

async fn fetch_wishlist(
    State(state): State<AppState>,
    Path(owner): Path<String>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
) -> Response {
    if let Err(response) = state.record(&method, &uri, &headers, Route::FetchWishlist) {
        return response;
    }
    let backend = state.lock();
    let entries: Vec<WishlistEntry> = backend
        .wishlist
        .iter()
        .filter(|entry| entry.owner_id.as_str() == owner)
        .map(|entry| WishlistEntry {
            product: backend.products.iter().find(|p| p.id == entry.product_id).cloned(),
            ..entry.clone()
        })
        .collect();
    Json(entries).into_response()
}

async fn create_wishlist_entry(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    Json(body): Json<NewWishlistEntry>,
) -> Response {
    state.pass_gate().await;
    if let Err(response) = state.record(&method, &uri, &headers, Route::CreateWishlistEntry) {
        return response;
    }

    let mut backend = state.lock();
    backend.next_id += 1;
    let entry = WishlistEntry {
        id: WishlistEntryId::new(backend.next_id),
        owner_id: body.owner_id,
        product_id: body.product_id,
        product: None,
    };
    backend.wishlist.push(entry.clone());
    (StatusCode::CREATED, Json(entry)).into_response()
}

async fn remove_wishlist_entry(
    State(state): State<AppState>,
    Path((owner, product_id)): Path<(String, i32)>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
) -> Response {
    state.pass_gate().await;
    if let Err(response) = state.record(&method, &uri, &headers, Route::RemoveWishlistEntry) {
        return response;
    }
    let product_id = ProductId::new(product_id);
    state
        .lock()
        .wishlist
        .retain(|entry| !(entry.owner_id.as_str() == owner && entry.product_id == product_id));
    StatusCode::NO_CONTENT.into_response()
}

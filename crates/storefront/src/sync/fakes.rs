//! In-memory store used by the cache tests.
//!
//! Records every call, can fail chosen operations, and can hold mutating
//! calls in flight until the test releases them through a semaphore.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use maison_core::{
    CategoryId, LineItem, LineItemId, NewLineItem, NewWishlistEntry, OwnerId, Product, ProductId,
    WishlistEntry, WishlistEntryId,
};
use rust_decimal::Decimal;
use tokio::sync::Semaphore;

use crate::api::{CartStore, StoreError, WishlistStore};

/// A recorded call against the fake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Call {
    FetchCart,
    CreateLineItem(ProductId),
    UpdateLineItem(LineItemId, u32),
    RemoveLineItem(LineItemId),
    ClearCart,
    FetchWishlist,
    CreateWishlistEntry(ProductId),
    RemoveWishlistEntry(ProductId),
}

/// Operations that can be made to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum Op {
    Fetch,
    Create,
    Update,
    Remove,
    Clear,
}

#[derive(Default)]
struct FakeState {
    products: Vec<Product>,
    cart: Vec<LineItem>,
    wishlist: Vec<WishlistEntry>,
    next_id: i32,
    calls: Vec<Call>,
    failing: HashSet<Op>,
}

#[derive(Default)]
pub(crate) struct FakeStore {
    state: Mutex<FakeState>,
    gate: Option<Arc<Semaphore>>,
}

/// A product priced in whole dollars.
pub(crate) fn product(id: i32, price: i64, sale_price: Option<i64>) -> Product {
    Product {
        id: ProductId::new(id),
        slug: format!("product-{id}"),
        name: format!("Product {id}"),
        description: None,
        price: Decimal::new(price, 0),
        sale_price: sale_price.map(|p| Decimal::new(p, 0)),
        category_id: CategoryId::new(1),
        featured: false,
        best_seller: false,
        new_arrival: false,
        in_stock: true,
        colors: None,
        sizes: None,
        image: format!("/img/{id}.jpg"),
    }
}

fn not_found(message: String) -> StoreError {
    StoreError::Request {
        status: 404,
        message,
    }
}

impl FakeStore {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// A fake whose mutating calls wait for a permit on the returned gate.
    pub(crate) fn gated() -> (Arc<Self>, Arc<Semaphore>) {
        let gate = Arc::new(Semaphore::new(0));
        let store = Self {
            state: Mutex::default(),
            gate: Some(Arc::clone(&gate)),
        };
        (Arc::new(store), gate)
    }

    fn state(&self) -> std::sync::MutexGuard<'_, FakeState> {
        crate::sync::lock_state(&self.state)
    }

    pub(crate) fn add_product(&self, product: Product) {
        self.state().products.push(product);
    }

    /// Seed a line item directly on the "server".
    pub(crate) fn seed_line_item(&self, owner: &OwnerId, product: Product, quantity: u32) -> LineItemId {
        let mut state = self.state();
        state.next_id += 1;
        let id = LineItemId::new(state.next_id);
        state.cart.push(LineItem {
            id,
            owner_id: owner.clone(),
            product_id: product.id,
            quantity,
            size: None,
            color: None,
            product,
        });
        id
    }

    /// Seed a wishlist entry directly on the "server".
    pub(crate) fn seed_wishlist_entry(&self, owner: &OwnerId, product_id: ProductId) {
        let mut state = self.state();
        state.next_id += 1;
        let id = WishlistEntryId::new(state.next_id);
        state.wishlist.push(WishlistEntry {
            id,
            owner_id: owner.clone(),
            product_id,
            product: None,
        });
    }

    pub(crate) fn fail(&self, op: Op) {
        self.state().failing.insert(op);
    }

    pub(crate) fn recover(&self, op: Op) {
        self.state().failing.remove(&op);
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.state().calls.clone()
    }

    pub(crate) fn count(&self, call: &Call) -> usize {
        self.state().calls.iter().filter(|c| *c == call).count()
    }

    pub(crate) fn server_quantity(&self, id: LineItemId) -> Option<u32> {
        self.state()
            .cart
            .iter()
            .find(|item| item.id == id)
            .map(|item| item.quantity)
    }

    async fn pass_gate(&self) {
        if let Some(gate) = &self.gate
            && let Ok(permit) = gate.acquire().await
        {
            permit.forget();
        }
    }

    /// Record a call and report whether it should fail.
    fn record(&self, call: Call, op: Op) -> Result<(), StoreError> {
        let mut state = self.state();
        state.calls.push(call);
        if state.failing.contains(&op) {
            return Err(StoreError::Request {
                status: 500,
                message: "injected failure".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl CartStore for FakeStore {
    async fn fetch_cart(&self, owner: &OwnerId) -> Vec<LineItem> {
        if self.record(Call::FetchCart, Op::Fetch).is_err() {
            return Vec::new();
        }
        self.state()
            .cart
            .iter()
            .filter(|item| &item.owner_id == owner)
            .cloned()
            .collect()
    }

    async fn create_line_item(&self, item: &NewLineItem) -> Result<LineItem, StoreError> {
        self.pass_gate().await;
        self.record(Call::CreateLineItem(item.product_id), Op::Create)?;

        let mut state = self.state();
        let product = state
            .products
            .iter()
            .find(|p| p.id == item.product_id)
            .cloned()
            .ok_or_else(|| not_found(format!("product {}", item.product_id)))?;
        state.next_id += 1;
        let created = LineItem {
            id: LineItemId::new(state.next_id),
            owner_id: item.owner_id.clone(),
            product_id: item.product_id,
            quantity: item.quantity,
            size: item.size.clone(),
            color: item.color.clone(),
            product,
        };
        state.cart.push(created.clone());
        Ok(created)
    }

    async fn update_line_item(&self, id: LineItemId, quantity: u32) -> Result<(), StoreError> {
        self.pass_gate().await;
        self.record(Call::UpdateLineItem(id, quantity), Op::Update)?;

        let mut state = self.state();
        let item = state
            .cart
            .iter_mut()
            .find(|item| item.id == id)
            .ok_or_else(|| not_found(format!("line item {id}")))?;
        item.quantity = quantity;
        Ok(())
    }

    async fn remove_line_item(&self, id: LineItemId) -> Result<(), StoreError> {
        self.pass_gate().await;
        self.record(Call::RemoveLineItem(id), Op::Remove)?;
        self.state().cart.retain(|item| item.id != id);
        Ok(())
    }

    async fn clear_cart(&self, owner: &OwnerId) -> Result<(), StoreError> {
        self.pass_gate().await;
        self.record(Call::ClearCart, Op::Clear)?;
        self.state().cart.retain(|item| &item.owner_id != owner);
        Ok(())
    }
}

#[async_trait]
impl WishlistStore for FakeStore {
    async fn fetch_wishlist(&self, owner: &OwnerId) -> Vec<WishlistEntry> {
        if self.record(Call::FetchWishlist, Op::Fetch).is_err() {
            return Vec::new();
        }
        self.state()
            .wishlist
            .iter()
            .filter(|entry| &entry.owner_id == owner)
            .cloned()
            .collect()
    }

    async fn create_wishlist_entry(
        &self,
        entry: &NewWishlistEntry,
    ) -> Result<WishlistEntry, StoreError> {
        self.pass_gate().await;
        self.record(Call::CreateWishlistEntry(entry.product_id), Op::Create)?;

        let mut state = self.state();
        state.next_id += 1;
        let created = WishlistEntry {
            id: WishlistEntryId::new(state.next_id),
            owner_id: entry.owner_id.clone(),
            product_id: entry.product_id,
            product: None,
        };
        state.wishlist.push(created.clone());
        Ok(created)
    }

    async fn remove_wishlist_entry(
        &self,
        owner: &OwnerId,
        product_id: ProductId,
    ) -> Result<(), StoreError> {
        self.pass_gate().await;
        self.record(Call::RemoveWishlistEntry(product_id), Op::Remove)?;
        self.state()
            .wishlist
            .retain(|entry| !(&entry.owner_id == owner && entry.product_id == product_id));
        Ok(())
    }
}

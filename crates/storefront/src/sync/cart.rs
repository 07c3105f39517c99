//! Cart reflection cache.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use maison_core::{LineItem, LineItemId, NewLineItem, OwnerId, ProductId};
use tracing::{debug, info, instrument, warn};

use super::queue::{Confirmation, MutationQueue};
use super::{Confidence, LoadPhase, Tracked, lock_state};
use crate::api::{CartStore, StoreError};
use crate::error::{Result, SyncError};

/// In-memory mirror of one owner's cart.
///
/// Cheap to clone; clones share the snapshot and the mutation queue.
#[derive(Clone)]
pub struct CartCache {
    inner: Arc<CartInner>,
}

struct CartInner {
    store: Arc<dyn CartStore>,
    owner: OwnerId,
    state: Mutex<CartState>,
    /// Serializes first loads so concurrent readers share one fetch.
    load_lock: tokio::sync::Mutex<()>,
    queue: MutationQueue,
}

#[derive(Default)]
struct CartState {
    phase: LoadPhase,
    items: Vec<Tracked<LineItem>>,
    /// Last quantity the backend reported or acknowledged, per line item.
    confirmed: HashMap<LineItemId, u32>,
    /// Optimistic edits whose remote call has not finished, in issue order.
    pending: Vec<PendingEdit>,
    next_revision: u64,
    /// Bumped whenever the snapshot is replaced wholesale.
    epoch: u64,
}

struct PendingEdit {
    revision: u64,
    kind: Edit,
}

enum Edit {
    SetQuantity { id: LineItemId, quantity: u32 },
    Remove { item: LineItem, position: usize },
}

impl Edit {
    const fn line_item_id(&self) -> LineItemId {
        match self {
            Self::SetQuantity { id, .. } => *id,
            Self::Remove { item, .. } => item.id,
        }
    }
}

impl CartState {
    fn position(&self, id: LineItemId) -> Option<usize> {
        self.items.iter().position(|t| t.id == id)
    }

    fn revision(&mut self) -> u64 {
        self.next_revision += 1;
        self.next_revision
    }

    /// Replace the snapshot with server data, then re-apply edits the server
    /// has not seen yet so they stay visible.
    fn replace(&mut self, items: Vec<LineItem>) {
        self.epoch += 1;
        self.confirmed = items.iter().map(|item| (item.id, item.quantity)).collect();
        self.items = items.into_iter().map(Tracked::confirmed).collect();

        for edit in &self.pending {
            match &edit.kind {
                Edit::SetQuantity { id, quantity } => {
                    if let Some(tracked) = self.items.iter_mut().find(|t| t.id == *id) {
                        tracked.value.quantity = *quantity;
                        tracked.confidence = Confidence::Pending;
                    }
                }
                Edit::Remove { item, .. } => self.items.retain(|t| t.id != item.id),
            }
        }
    }

    /// Resolve a pending edit once its remote call has finished.
    fn settle(&mut self, revision: u64, succeeded: bool) {
        let Some(index) = self.pending.iter().position(|e| e.revision == revision) else {
            return;
        };
        let edit = self.pending.remove(index);
        let id = edit.kind.line_item_id();
        let superseded = self.pending.iter().any(|e| e.kind.line_item_id() == id);

        match (edit.kind, succeeded) {
            (Edit::SetQuantity { quantity, .. }, true) => {
                self.confirmed.insert(id, quantity);
                if !superseded && let Some(tracked) = self.items.iter_mut().find(|t| t.id == id) {
                    tracked.confidence = Confidence::Confirmed;
                }
            }
            (Edit::SetQuantity { .. }, false) => {
                if superseded {
                    return;
                }
                let baseline = self.confirmed.get(&id).copied();
                if let Some(tracked) = self.items.iter_mut().find(|t| t.id == id) {
                    if let Some(quantity) = baseline {
                        tracked.value.quantity = quantity;
                    }
                    tracked.confidence = Confidence::Failed;
                }
            }
            (Edit::Remove { .. }, true) => {
                self.confirmed.remove(&id);
            }
            (Edit::Remove { mut item, position }, false) => {
                if superseded || self.position(id).is_some() {
                    return;
                }
                if let Some(&quantity) = self.confirmed.get(&id) {
                    item.quantity = quantity;
                }
                let at = position.min(self.items.len());
                self.items.insert(at, Tracked::failed(item));
            }
        }
    }
}

impl CartInner {
    fn state(&self) -> MutexGuard<'_, CartState> {
        lock_state(&self.state)
    }
}

impl CartCache {
    /// Create an empty, uninitialized cache for an owner.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime (the mutation queue worker is
    /// spawned here).
    #[must_use]
    pub fn new(store: Arc<dyn CartStore>, owner: OwnerId) -> Self {
        let queue = MutationQueue::spawn("cart", &owner);
        Self {
            inner: Arc::new(CartInner {
                store,
                owner,
                state: Mutex::default(),
                load_lock: tokio::sync::Mutex::new(()),
                queue,
            }),
        }
    }

    /// The owner this cache mirrors.
    #[must_use]
    pub fn owner(&self) -> &OwnerId {
        &self.inner.owner
    }

    /// Current load phase.
    #[must_use]
    pub fn phase(&self) -> LoadPhase {
        self.inner.state().phase
    }

    /// Whether a fetch is in flight.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.phase() == LoadPhase::Loading
    }

    /// Number of optimistic edits still waiting on the backend.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.inner.state().pending.len()
    }

    /// The snapshot as currently held, without fetching.
    #[must_use]
    pub fn current(&self) -> Vec<Tracked<LineItem>> {
        self.inner.state().items.clone()
    }

    /// The snapshot, fetching it first if this cache has not loaded yet.
    pub async fn snapshot(&self) -> Vec<Tracked<LineItem>> {
        self.ensure_loaded().await;
        self.current()
    }

    /// Mark the snapshot stale; the next [`snapshot`](Self::snapshot) refetches.
    /// Stale entries stay visible until then.
    pub fn invalidate(&self) {
        self.inner.state().phase = LoadPhase::Uninitialized;
    }

    /// Refetch and return the snapshot.
    pub async fn refresh(&self) -> Vec<Tracked<LineItem>> {
        self.invalidate();
        self.snapshot().await
    }

    #[instrument(skip(self), fields(owner = %self.inner.owner))]
    async fn ensure_loaded(&self) {
        if self.phase() == LoadPhase::Ready {
            return;
        }

        let _load = self.inner.load_lock.lock().await;
        let epoch = {
            let mut state = self.inner.state();
            if state.phase == LoadPhase::Ready {
                return;
            }
            state.phase = LoadPhase::Loading;
            state.epoch
        };

        let items = self.inner.store.fetch_cart(&self.inner.owner).await;

        let mut state = self.inner.state();
        // A clear or add finished while we were fetching; its data is newer.
        if state.epoch == epoch {
            debug!(count = items.len(), "Cart loaded");
            state.replace(items);
        }
        state.phase = LoadPhase::Ready;
    }

    /// Add a product to the cart.
    ///
    /// Not optimistic: waits for the backend to create the line item, then
    /// refetches the cart so the embedded product and server-assigned id are
    /// exact. On failure the snapshot is left untouched.
    ///
    /// # Errors
    ///
    /// Returns `SyncError::Store` if the create call fails.
    #[instrument(skip(self), fields(owner = %self.inner.owner))]
    pub async fn add(
        &self,
        product_id: ProductId,
        quantity: u32,
        size: Option<String>,
        color: Option<String>,
    ) -> Result<LineItem> {
        let request = NewLineItem {
            owner_id: self.inner.owner.clone(),
            product_id,
            quantity,
            size,
            color,
        };

        let inner = Arc::clone(&self.inner);
        let created = self
            .inner
            .queue
            .submit(async move {
                let created = inner.store.create_line_item(&request).await?;
                let items = inner.store.fetch_cart(&inner.owner).await;
                let mut state = inner.state();
                state.replace(items);
                state.phase = LoadPhase::Ready;
                Ok(created)
            })?
            .wait()
            .await
            .inspect_err(|e| warn!(error = %e, "Failed to add item to cart"))?;

        info!(line_item_id = %created.id, "Added item to cart");
        Ok(created)
    }

    /// Set a line item's quantity.
    ///
    /// Optimistic: the snapshot shows the new quantity as soon as this returns,
    /// before the backend has answered. Quantities below 1 are ignored and
    /// return `Ok(None)` without touching the snapshot or the network.
    ///
    /// If the remote update fails the quantity reverts to the last confirmed
    /// value (unless a newer edit of the same line is queued) and the entry is
    /// tagged [`Confidence::Failed`].
    ///
    /// # Errors
    ///
    /// Returns `SyncError::UnknownLineItem` if the id is not in the snapshot.
    #[instrument(skip(self), fields(owner = %self.inner.owner))]
    pub fn update_quantity(&self, id: LineItemId, quantity: u32) -> Result<Option<Confirmation>> {
        if quantity < 1 {
            debug!("Ignoring quantity below 1");
            return Ok(None);
        }

        let mut state = self.inner.state();
        let index = state.position(id).ok_or(SyncError::UnknownLineItem(id))?;
        if let Some(tracked) = state.items.get_mut(index) {
            tracked.value.quantity = quantity;
            tracked.confidence = Confidence::Pending;
        }
        let revision = state.revision();
        state.pending.push(PendingEdit {
            revision,
            kind: Edit::SetQuantity { id, quantity },
        });

        let inner = Arc::clone(&self.inner);
        let submitted = self.inner.queue.submit(async move {
            let result = inner.store.update_line_item(id, quantity).await;
            if let Err(e) = &result {
                warn!(error = %e, line_item_id = %id, "Quantity update failed, rolling back");
            }
            inner.state().settle(revision, result.is_ok());
            result
        });

        match submitted {
            Ok(confirmation) => Ok(Some(confirmation)),
            Err(e) => {
                state.settle(revision, false);
                Err(e)
            }
        }
    }

    /// Change a line item's quantity by `delta`, reading the current value
    /// under the same lock that applies the change so rapid calls compose.
    ///
    /// Returns `Ok(None)` when the result would be below 1.
    ///
    /// # Errors
    ///
    /// Returns `SyncError::UnknownLineItem` if the id is not in the snapshot.
    pub fn adjust_quantity(&self, id: LineItemId, delta: i64) -> Result<Option<Confirmation>> {
        let current = {
            let state = self.inner.state();
            let index = state.position(id).ok_or(SyncError::UnknownLineItem(id))?;
            state.items.get(index).map_or(0, |t| t.quantity)
        };

        let target = i64::from(current).saturating_add(delta);
        match u32::try_from(target) {
            Ok(quantity) => self.update_quantity(id, quantity),
            Err(_) => Ok(None),
        }
    }

    /// Remove a line item.
    ///
    /// Optimistic: the item leaves the snapshot before this returns. If the
    /// remote delete fails the item is put back at its old position, tagged
    /// [`Confidence::Failed`].
    ///
    /// # Errors
    ///
    /// Returns `SyncError::UnknownLineItem` if the id is not in the snapshot.
    #[instrument(skip(self), fields(owner = %self.inner.owner))]
    pub fn remove(&self, id: LineItemId) -> Result<Confirmation> {
        let mut state = self.inner.state();
        let position = state.position(id).ok_or(SyncError::UnknownLineItem(id))?;
        let item = state.items.remove(position).into_inner();
        let revision = state.revision();
        state.pending.push(PendingEdit {
            revision,
            kind: Edit::Remove { item, position },
        });

        let inner = Arc::clone(&self.inner);
        let submitted = self.inner.queue.submit(async move {
            let result = inner.store.remove_line_item(id).await;
            if let Err(e) = &result {
                warn!(error = %e, line_item_id = %id, "Remove failed, restoring item");
            }
            inner.state().settle(revision, result.is_ok());
            result
        });

        submitted.inspect_err(|_| state.settle(revision, false))
    }

    /// Remove every line item.
    ///
    /// Not optimistic: the snapshot is emptied only after the backend
    /// confirms; on failure it keeps every item. Edits issued while the clear
    /// is in flight still reach the backend, but a failure among them never
    /// restores a line into the cleared snapshot.
    ///
    /// # Errors
    ///
    /// Returns `SyncError::Store` if the bulk delete fails.
    #[instrument(skip(self), fields(owner = %self.inner.owner))]
    pub async fn clear(&self) -> Result<()> {
        let inner = Arc::clone(&self.inner);
        self.inner
            .queue
            .submit(async move {
                inner.store.clear_cart(&inner.owner).await?;
                let mut state = inner.state();
                state.epoch += 1;
                state.items.clear();
                state.confirmed.clear();
                // Edits queued behind the clear target lines that no longer
                // exist; their outcome must not touch the emptied snapshot.
                state.pending.clear();
                state.phase = LoadPhase::Ready;
                Ok::<(), StoreError>(())
            })?
            .wait()
            .await
            .inspect_err(|e| warn!(error = %e, "Failed to clear cart"))?;

        info!("Cleared cart");
        Ok(())
    }

    /// Total number of units across all lines.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.inner
            .state()
            .items
            .iter()
            .map(|t| t.quantity)
            .sum()
    }
}

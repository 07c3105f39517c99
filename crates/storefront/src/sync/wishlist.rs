//! Wishlist reflection cache.

use std::sync::{Arc, Mutex, MutexGuard};

use maison_core::{NewWishlistEntry, OwnerId, ProductId, WishlistEntry};
use tracing::{debug, info, instrument, warn};

use super::queue::{Confirmation, MutationQueue};
use super::{LoadPhase, Tracked, lock_state};
use crate::api::WishlistStore;
use crate::error::{Result, SyncError};

/// In-memory mirror of one owner's wishlist.
#[derive(Clone)]
pub struct WishlistCache {
    inner: Arc<WishlistInner>,
}

struct WishlistInner {
    store: Arc<dyn WishlistStore>,
    owner: OwnerId,
    state: Mutex<WishlistState>,
    load_lock: tokio::sync::Mutex<()>,
    queue: MutationQueue,
}

#[derive(Default)]
struct WishlistState {
    phase: LoadPhase,
    entries: Vec<Tracked<WishlistEntry>>,
    /// Removals not yet acknowledged, with the position each entry held.
    pending: Vec<PendingRemoval>,
    next_revision: u64,
    epoch: u64,
}

struct PendingRemoval {
    revision: u64,
    entry: WishlistEntry,
    position: usize,
}

impl WishlistState {
    fn position(&self, product_id: ProductId) -> Option<usize> {
        self.entries.iter().position(|t| t.product_id == product_id)
    }

    fn replace(&mut self, entries: Vec<WishlistEntry>) {
        self.epoch += 1;
        self.entries = entries
            .into_iter()
            .filter(|entry| !self.pending.iter().any(|p| p.entry.product_id == entry.product_id))
            .map(Tracked::confirmed)
            .collect();
    }

    fn settle(&mut self, revision: u64, succeeded: bool) {
        let Some(index) = self.pending.iter().position(|p| p.revision == revision) else {
            return;
        };
        let removal = self.pending.remove(index);
        if succeeded || self.position(removal.entry.product_id).is_some() {
            return;
        }
        let at = removal.position.min(self.entries.len());
        self.entries.insert(at, Tracked::failed(removal.entry));
    }
}

impl WishlistInner {
    fn state(&self) -> MutexGuard<'_, WishlistState> {
        lock_state(&self.state)
    }
}

impl WishlistCache {
    /// Create an empty, uninitialized cache for an owner.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    #[must_use]
    pub fn new(store: Arc<dyn WishlistStore>, owner: OwnerId) -> Self {
        let queue = MutationQueue::spawn("wishlist", &owner);
        Self {
            inner: Arc::new(WishlistInner {
                store,
                owner,
                state: Mutex::default(),
                load_lock: tokio::sync::Mutex::new(()),
                queue,
            }),
        }
    }

    #[must_use]
    pub fn owner(&self) -> &OwnerId {
        &self.inner.owner
    }

    #[must_use]
    pub fn phase(&self) -> LoadPhase {
        self.inner.state().phase
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.phase() == LoadPhase::Loading
    }

    /// The snapshot as currently held, without fetching.
    #[must_use]
    pub fn current(&self) -> Vec<Tracked<WishlistEntry>> {
        self.inner.state().entries.clone()
    }

    /// The snapshot, fetching it first if needed.
    pub async fn snapshot(&self) -> Vec<Tracked<WishlistEntry>> {
        self.ensure_loaded().await;
        self.current()
    }

    /// Mark the snapshot stale without discarding it.
    pub fn invalidate(&self) {
        self.inner.state().phase = LoadPhase::Uninitialized;
    }

    pub async fn refresh(&self) -> Vec<Tracked<WishlistEntry>> {
        self.invalidate();
        self.snapshot().await
    }

    /// Whether the product is in the snapshot as currently held.
    ///
    /// Never fetches; an unloaded cache reports `false`.
    #[must_use]
    pub fn is_in_wishlist(&self, product_id: ProductId) -> bool {
        self.inner.state().position(product_id).is_some()
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

        let entries = self.inner.store.fetch_wishlist(&self.inner.owner).await;

        let mut state = self.inner.state();
        if state.epoch == epoch {
            debug!(count = entries.len(), "Wishlist loaded");
            state.replace(entries);
        }
        state.phase = LoadPhase::Ready;
    }

    /// Add a product to the wishlist, then refetch.
    ///
    /// Callers check [`is_in_wishlist`](Self::is_in_wishlist) first; the
    /// backend is not relied on to reject duplicates.
    ///
    /// # Errors
    ///
    /// Returns `SyncError::Store` if the create call fails. The snapshot is
    /// left unchanged in that case.
    #[instrument(skip(self), fields(owner = %self.inner.owner))]
    pub async fn add(&self, product_id: ProductId) -> Result<WishlistEntry> {
        let request = NewWishlistEntry {
            owner_id: self.inner.owner.clone(),
            product_id,
        };

        let inner = Arc::clone(&self.inner);
        let created = self
            .inner
            .queue
            .submit(async move {
                let created = inner.store.create_wishlist_entry(&request).await?;
                let entries = inner.store.fetch_wishlist(&inner.owner).await;
                let mut state = inner.state();
                state.replace(entries);
                state.phase = LoadPhase::Ready;
                Ok(created)
            })?
            .wait()
            .await
            .inspect_err(|e| warn!(error = %e, "Failed to add to wishlist"))?;

        info!(%product_id, "Added to wishlist");
        Ok(created)
    }

    /// Remove a product from the wishlist.
    ///
    /// Optimistic: the entry leaves the snapshot before this returns and is
    /// restored, tagged failed, if the remote delete fails.
    ///
    /// # Errors
    ///
    /// Returns `SyncError::NotInWishlist` if the product is not in the snapshot.
    #[instrument(skip(self), fields(owner = %self.inner.owner))]
    pub fn remove(&self, product_id: ProductId) -> Result<Confirmation> {
        let mut state = self.inner.state();
        let position = state
            .position(product_id)
            .ok_or(SyncError::NotInWishlist(product_id))?;
        let entry = state.entries.remove(position).into_inner();
        state.next_revision += 1;
        let revision = state.next_revision;
        state.pending.push(PendingRemoval {
            revision,
            entry,
            position,
        });

        let inner = Arc::clone(&self.inner);
        let submitted = self.inner.queue.submit(async move {
            let result = inner
                .store
                .remove_wishlist_entry(&inner.owner, product_id)
                .await;
            if let Err(e) = &result {
                warn!(error = %e, %product_id, "Wishlist remove failed, restoring entry");
            }
            inner.state().settle(revision, result.is_ok());
            result
        });

        submitted.inspect_err(|_| state.settle(revision, false))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::sync::Confidence;
    use crate::sync::fakes::{Call, FakeStore, Op};

    fn owner() -> OwnerId {
        OwnerId::guest()
    }

    async fn loaded(store: &Arc<FakeStore>) -> WishlistCache {
        let cache = WishlistCache::new(Arc::clone(store) as Arc<dyn WishlistStore>, owner());
        cache.snapshot().await;
        cache
    }

    #[tokio::test]
    async fn test_unloaded_cache_reports_not_in_wishlist() {
        let store = FakeStore::new();
        store.seed_wishlist_entry(&owner(), ProductId::new(5));
        let cache = WishlistCache::new(Arc::clone(&store) as Arc<dyn WishlistStore>, owner());

        assert!(!cache.is_in_wishlist(ProductId::new(5)));
        cache.snapshot().await;
        assert!(cache.is_in_wishlist(ProductId::new(5)));
    }

    #[tokio::test]
    async fn test_add_refetches_and_sets_membership() {
        let store = FakeStore::new();
        let cache = loaded(&store).await;

        let entry = cache.add(ProductId::new(5)).await.unwrap();
        assert_eq!(entry.product_id, ProductId::new(5));
        assert!(cache.is_in_wishlist(ProductId::new(5)));
        assert_eq!(cache.current().len(), 1);
        assert_eq!(store.count(&Call::FetchWishlist), 2);
    }

    #[tokio::test]
    async fn test_membership_false_while_add_in_flight() {
        let (store, gate) = FakeStore::gated();
        let cache = loaded(&store).await;

        let adding = {
            let cache = cache.clone();
            tokio::spawn(async move { cache.add(ProductId::new(5)).await })
        };
        tokio::task::yield_now().await;
        assert!(!cache.is_in_wishlist(ProductId::new(5)));

        gate.add_permits(1);
        adding.await.unwrap().unwrap();
        assert!(cache.is_in_wishlist(ProductId::new(5)));
    }

    #[tokio::test]
    async fn test_failed_add_leaves_snapshot() {
        let store = FakeStore::new();
        let cache = loaded(&store).await;
        store.fail(Op::Create);

        assert!(cache.add(ProductId::new(5)).await.is_err());
        assert!(!cache.is_in_wishlist(ProductId::new(5)));
        assert_eq!(store.count(&Call::FetchWishlist), 1);
    }

    #[tokio::test]
    async fn test_remove_is_immediate() {
        let (store, gate) = FakeStore::gated();
        store.seed_wishlist_entry(&owner(), ProductId::new(5));
        let cache = loaded(&store).await;

        let confirmation = cache.remove(ProductId::new(5)).unwrap();
        assert!(!cache.is_in_wishlist(ProductId::new(5)));

        gate.add_permits(1);
        confirmation.wait().await.unwrap();
        assert!(!cache.is_in_wishlist(ProductId::new(5)));
        assert_eq!(store.count(&Call::RemoveWishlistEntry(ProductId::new(5))), 1);
    }

    #[tokio::test]
    async fn test_failed_remove_restores_entry() {
        let store = FakeStore::new();
        store.seed_wishlist_entry(&owner(), ProductId::new(5));
        store.seed_wishlist_entry(&owner(), ProductId::new(6));
        let cache = loaded(&store).await;
        store.fail(Op::Remove);

        let confirmation = cache.remove(ProductId::new(5)).unwrap();
        assert!(confirmation.wait().await.is_err());

        let snapshot = cache.current();
        assert_eq!(snapshot[0].product_id, ProductId::new(5));
        assert_eq!(snapshot[0].confidence, Confidence::Failed);
        assert_eq!(snapshot[1].confidence, Confidence::Confirmed);
    }

    #[tokio::test]
    async fn test_remove_missing_product() {
        let store = FakeStore::new();
        let cache = loaded(&store).await;
        let err = cache.remove(ProductId::new(9)).unwrap_err();
        assert!(matches!(err, SyncError::NotInWishlist(_)));
        assert!(store.calls().iter().all(|c| *c == Call::FetchWishlist));
    }

    #[tokio::test]
    async fn test_failed_fetch_yields_empty() {
        let store = FakeStore::new();
        store.seed_wishlist_entry(&owner(), ProductId::new(5));
        store.fail(Op::Fetch);
        let cache = loaded(&store).await;

        assert!(cache.current().is_empty());
        assert_eq!(cache.phase(), LoadPhase::Ready);
    }

    #[tokio::test]
    async fn test_entries_are_scoped_to_owner() {
        let store = FakeStore::new();
        let other = OwnerId::parse("shopper-2").unwrap();
        store.seed_wishlist_entry(&other, ProductId::new(5));
        let cache = loaded(&store).await;

        assert!(!cache.is_in_wishlist(ProductId::new(5)));
        assert!(!cache.is_loading());
    }
}

//! Local reflection caches for the cart and wishlist.
//!
//! Each cache mirrors one owner's remote collection and applies the
//! optimistic-update protocol:
//!
//! | Operation        | Local snapshot                          | Remote call            |
//! |------------------|-----------------------------------------|------------------------|
//! | first read       | `Uninitialized → Loading → Ready`       | `fetch_*` (soft fail)  |
//! | add              | refetched after the create succeeds     | awaited                |
//! | update quantity  | changed before the call returns         | queued                 |
//! | remove           | stripped before the call returns        | queued                 |
//! | clear (cart)     | emptied only after the delete succeeds  | awaited                |
//!
//! Every remote mutation runs through a per-cache [`queue`] so calls reach
//! the backend in the order they were issued. Optimistic entries carry a
//! [`Confidence`] tag; when the confirming call fails the change is rolled
//! back to the last server-confirmed value and tagged [`Confidence::Failed`].

pub mod cart;
mod queue;
pub mod wishlist;

#[cfg(test)]
pub(crate) mod fakes;

pub use cart::CartCache;
pub use queue::Confirmation;
pub use wishlist::WishlistCache;

use std::ops::Deref;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Load state of a cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadPhase {
    /// Never fetched, or invalidated since the last fetch.
    #[default]
    Uninitialized,
    /// A fetch is in flight.
    Loading,
    /// The snapshot reflects a completed fetch plus local mutations.
    Ready,
}

/// How far the local copy of an entry can be trusted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confidence {
    /// Changed locally; the confirming call has not finished.
    Pending,
    /// Matches what the backend last reported or acknowledged.
    Confirmed,
    /// The confirming call failed and the change was rolled back.
    Failed,
}

/// An entry of a cache snapshot with its confidence tag.
#[derive(Debug, Clone, PartialEq)]
pub struct Tracked<T> {
    pub value: T,
    pub confidence: Confidence,
}

impl<T> Tracked<T> {
    pub(crate) const fn confirmed(value: T) -> Self {
        Self {
            value,
            confidence: Confidence::Confirmed,
        }
    }

    pub(crate) const fn failed(value: T) -> Self {
        Self {
            value,
            confidence: Confidence::Failed,
        }
    }

    /// Whether a confirming call is still outstanding.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.confidence == Confidence::Pending
    }

    /// Unwrap the entry.
    pub fn into_inner(self) -> T {
        self.value
    }
}

impl<T> Deref for Tracked<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.value
    }
}

/// Lock a cache's state. The state is only touched in short synchronous
/// sections, so a poisoned lock still holds a usable snapshot.
pub(crate) fn lock_state<S>(state: &Mutex<S>) -> MutexGuard<'_, S> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

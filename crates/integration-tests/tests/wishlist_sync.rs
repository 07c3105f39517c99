//! Wishlist cache against the HTTP store client and the mock backend.

#![allow(clippy::unwrap_used)]

use maison_core::{OwnerId, ProductId};
use maison_integration_tests::{MockBackend, Route, product};
use maison_storefront::{Confidence, StorefrontSession};

fn guest() -> OwnerId {
    OwnerId::guest()
}

#[tokio::test]
async fn test_add_refetches_and_holds_product() {
    let backend = MockBackend::spawn().await;
    backend.add_product(product(5, "silk-scarf", 35));

    let session = StorefrontSession::connect(&backend.config(guest())).unwrap();
    let wishlist = session.wishlist();
    assert!(wishlist.snapshot().await.is_empty());

    wishlist.add(ProductId::new(5)).await.unwrap();

    let entries = wishlist.current();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].product_id, ProductId::new(5));
    // The refetch carries the embedded product the create reply lacked.
    assert_eq!(entries[0].product.as_ref().map(|p| p.slug.as_str()), Some("silk-scarf"));
    assert_eq!(backend.count("GET /api/wishlist/guest-user"), 2);
}

#[tokio::test]
async fn test_membership_false_until_add_completes() {
    let (backend, gate) = MockBackend::spawn_gated().await;
    backend.add_product(product(5, "silk-scarf", 35));

    let session = StorefrontSession::connect(&backend.config(guest())).unwrap();
    session.wishlist().snapshot().await;

    let wishlist = session.wishlist().clone();
    let adding = tokio::spawn(async move { wishlist.add(ProductId::new(5)).await });
    tokio::task::yield_now().await;
    assert!(!session.wishlist().is_in_wishlist(ProductId::new(5)));

    gate.add_permits(1);
    adding.await.unwrap().unwrap();
    assert!(session.wishlist().is_in_wishlist(ProductId::new(5)));
}

#[tokio::test]
async fn test_remove_uses_owner_and_product_path() {
    let backend = MockBackend::spawn().await;
    backend.seed_wishlist_entry(&guest(), ProductId::new(5));

    let session = StorefrontSession::connect(&backend.config(guest())).unwrap();
    session.wishlist().snapshot().await;

    let confirmation = session.wishlist().remove(ProductId::new(5)).unwrap();
    assert!(!session.wishlist().is_in_wishlist(ProductId::new(5)));
    confirmation.wait().await.unwrap();

    assert_eq!(backend.count("DELETE /api/wishlist/guest-user/5"), 1);
    assert!(session.wishlist().refresh().await.is_empty());
}

#[tokio::test]
async fn test_failed_remove_restores_entry() {
    let backend = MockBackend::spawn().await;
    backend.seed_wishlist_entry(&guest(), ProductId::new(5));
    backend.fail(Route::RemoveWishlistEntry);

    let session = StorefrontSession::connect(&backend.config(guest())).unwrap();
    session.wishlist().snapshot().await;

    let confirmation = session.wishlist().remove(ProductId::new(5)).unwrap();
    assert!(confirmation.wait().await.is_err());

    let entries = session.wishlist().current();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].confidence, Confidence::Failed);
    assert!(session.wishlist().is_in_wishlist(ProductId::new(5)));
}

#[tokio::test]
async fn test_failed_fetch_yields_empty_wishlist() {
    let backend = MockBackend::spawn().await;
    backend.seed_wishlist_entry(&guest(), ProductId::new(5));
    backend.fail(Route::FetchWishlist);

    let session = StorefrontSession::connect(&backend.config(guest())).unwrap();
    assert!(session.wishlist().snapshot().await.is_empty());

    backend.recover(Route::FetchWishlist);
    assert_eq!(session.wishlist().refresh().await.len(), 1);
}

#[tokio::test]
async fn test_switch_owner_loads_other_wishlist() {
    let backend = MockBackend::spawn().await;
    let alice = OwnerId::parse("alice").unwrap();
    backend.seed_wishlist_entry(&alice, ProductId::new(7));

    let mut session = StorefrontSession::connect(&backend.config(guest())).unwrap();
    assert!(session.wishlist().snapshot().await.is_empty());

    session.switch_owner(alice);
    assert!(session.wishlist().snapshot().await.len() == 1);
    assert!(session.wishlist().is_in_wishlist(ProductId::new(7)));
}

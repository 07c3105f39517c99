//! Cart cache against the HTTP store client and the mock backend.

#![allow(clippy::unwrap_used)]

use maison_core::{OwnerId, ProductId};
use maison_integration_tests::{MockBackend, Route, product};
use maison_storefront::views::subtotal;
use maison_storefront::{Confidence, LoadPhase, StorefrontSession, SyncError};
use rust_decimal::Decimal;

fn guest() -> OwnerId {
    OwnerId::guest()
}

#[tokio::test]
async fn test_snapshot_fetches_owner_cart() {
    let backend = MockBackend::spawn().await;
    backend.add_product(product(10, "linen-shirt", 20));
    backend.seed_line_item(&guest(), ProductId::new(10), 2);
    backend.seed_line_item(&OwnerId::parse("someone-else").unwrap(), ProductId::new(10), 5);

    let session = StorefrontSession::connect(&backend.config(guest())).unwrap();
    let items = session.cart().snapshot().await;

    assert_eq!(items.len(), 1);
    assert_eq!(items[0].quantity, 2);
    assert_eq!(items[0].product.slug, "linen-shirt");
    assert_eq!(backend.count("GET /api/cart/guest-user"), 1);
}

#[tokio::test]
async fn test_failed_fetch_yields_empty_cart() {
    let backend = MockBackend::spawn().await;
    backend.fail(Route::FetchCart);

    let session =
        StorefrontSession::connect(&backend.config(OwnerId::parse("new-owner").unwrap())).unwrap();

    assert!(session.cart().snapshot().await.is_empty());
    assert_eq!(session.cart().phase(), LoadPhase::Ready);
}

#[tokio::test]
async fn test_unreachable_backend_yields_empty_cart() {
    let backend = MockBackend::spawn().await;
    let mut config = backend.config(guest());
    config.api_url = url::Url::parse("http://127.0.0.1:9/").unwrap();

    let session = StorefrontSession::connect(&config).unwrap();
    assert!(session.cart().snapshot().await.is_empty());
}

#[tokio::test]
async fn test_quantity_change_is_visible_before_backend_answers() {
    let (backend, gate) = MockBackend::spawn_gated().await;
    backend.add_product(product(10, "linen-shirt", 20));
    let id = backend.seed_line_item(&guest(), ProductId::new(10), 2);

    let session = StorefrontSession::connect(&backend.config(guest())).unwrap();
    let cart = session.cart();
    assert_eq!(subtotal(&cart.snapshot().await), Decimal::new(40, 0));

    let confirmation = cart.update_quantity(id, 3).unwrap().unwrap();
    assert_eq!(subtotal(&cart.current()), Decimal::new(60, 0));
    assert_eq!(backend.quantity(id), Some(2));

    gate.add_permits(1);
    confirmation.wait().await.unwrap();
    assert_eq!(backend.quantity(id), Some(3));
    assert_eq!(cart.current()[0].confidence, Confidence::Confirmed);
}

#[tokio::test]
async fn test_quantity_below_one_sends_nothing() {
    let backend = MockBackend::spawn().await;
    backend.add_product(product(10, "linen-shirt", 20));
    let id = backend.seed_line_item(&guest(), ProductId::new(10), 1);

    let session = StorefrontSession::connect(&backend.config(guest())).unwrap();
    session.cart().snapshot().await;

    assert!(session.cart().update_quantity(id, 0).unwrap().is_none());
    assert_eq!(session.cart().current()[0].quantity, 1);
    assert!(!backend.requests().iter().any(|r| r.starts_with("PATCH")));
}

#[tokio::test]
async fn test_failed_quantity_change_rolls_back() {
    let backend = MockBackend::spawn().await;
    backend.add_product(product(10, "linen-shirt", 20));
    let id = backend.seed_line_item(&guest(), ProductId::new(10), 2);
    backend.fail(Route::UpdateLineItem);

    let session = StorefrontSession::connect(&backend.config(guest())).unwrap();
    session.cart().snapshot().await;

    let err = session.cart().update_quantity(id, 7).unwrap().unwrap().wait().await.unwrap_err();
    assert!(matches!(
        err,
        SyncError::Store(maison_storefront::StoreError::Request { status: 500, .. })
    ));

    let items = session.cart().current();
    assert_eq!(items[0].quantity, 2);
    assert_eq!(items[0].confidence, Confidence::Failed);
}

#[tokio::test]
async fn test_mutations_reach_backend_in_issue_order() {
    let (backend, gate) = MockBackend::spawn_gated().await;
    backend.add_product(product(10, "linen-shirt", 20));
    backend.add_product(product(11, "wool-coat", 90));
    let shirt = backend.seed_line_item(&guest(), ProductId::new(10), 1);
    let coat = backend.seed_line_item(&guest(), ProductId::new(11), 1);

    let session = StorefrontSession::connect(&backend.config(guest())).unwrap();
    let cart = session.cart();
    cart.snapshot().await;

    let first = cart.adjust_quantity(shirt, 1).unwrap().unwrap();
    let second = cart.remove(coat).unwrap();
    let third = cart.adjust_quantity(shirt, 1).unwrap().unwrap();

    gate.add_permits(3);
    first.wait().await.unwrap();
    second.wait().await.unwrap();
    third.wait().await.unwrap();

    let mutations: Vec<String> = backend
        .requests()
        .into_iter()
        .filter(|r| !r.starts_with("GET"))
        .collect();
    assert_eq!(
        mutations,
        vec![
            format!("PATCH /api/cart/{shirt}"),
            format!("DELETE /api/cart/{coat}"),
            format!("PATCH /api/cart/{shirt}"),
        ]
    );
    assert_eq!(backend.quantity(shirt), Some(3));
    assert_eq!(backend.quantity(coat), None);
}

#[tokio::test]
async fn test_remove_is_immediate_and_restored_on_failure() {
    let backend = MockBackend::spawn().await;
    backend.add_product(product(10, "linen-shirt", 20));
    let id = backend.seed_line_item(&guest(), ProductId::new(10), 1);
    backend.fail(Route::RemoveLineItem);

    let session = StorefrontSession::connect(&backend.config(guest())).unwrap();
    session.cart().snapshot().await;

    let confirmation = session.cart().remove(id).unwrap();
    assert!(session.cart().current().is_empty());

    assert!(confirmation.wait().await.is_err());
    let items = session.cart().current();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].confidence, Confidence::Failed);
}

#[tokio::test]
async fn test_add_refetches_with_embedded_product() {
    let backend = MockBackend::spawn().await;
    backend.add_product(product(10, "linen-shirt", 20));

    let session = StorefrontSession::connect(&backend.config(guest())).unwrap();
    session.cart().snapshot().await;

    let created = session
        .cart()
        .add(ProductId::new(10), 2, Some("M".to_string()), Some("Sand".to_string()))
        .await
        .unwrap();

    let items = session.cart().current();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].id, created.id);
    assert_eq!(items[0].variant_label().as_deref(), Some("Sand / M"));
    assert_eq!(backend.count("GET /api/cart/guest-user"), 2);
}

#[tokio::test]
async fn test_failed_add_leaves_snapshot_unchanged() {
    let backend = MockBackend::spawn().await;
    backend.add_product(product(10, "linen-shirt", 20));
    backend.fail(Route::CreateLineItem);

    let session = StorefrontSession::connect(&backend.config(guest())).unwrap();
    session.cart().snapshot().await;

    assert!(session.cart().add(ProductId::new(10), 1, None, None).await.is_err());
    assert!(session.cart().current().is_empty());
}

#[tokio::test]
async fn test_clear_empties_only_after_confirmation() {
    let (backend, gate) = MockBackend::spawn_gated().await;
    backend.add_product(product(10, "linen-shirt", 20));
    backend.seed_line_item(&guest(), ProductId::new(10), 1);
    backend.seed_line_item(&guest(), ProductId::new(10), 2);

    let session = StorefrontSession::connect(&backend.config(guest())).unwrap();
    session.cart().snapshot().await;

    let cart = session.cart().clone();
    let clearing = tokio::spawn(async move { cart.clear().await });
    tokio::task::yield_now().await;
    assert_eq!(session.cart().current().len(), 2);

    gate.add_permits(1);
    clearing.await.unwrap().unwrap();
    assert!(session.cart().current().is_empty());
    assert_eq!(backend.cart_len(&guest()), 0);
    assert_eq!(backend.count("DELETE /api/cart/clear/guest-user"), 1);
}

#[tokio::test]
async fn test_edits_queued_behind_clear_do_not_resurrect_lines() {
    let (backend, gate) = MockBackend::spawn_gated().await;
    backend.add_product(product(10, "linen-shirt", 20));
    let first = backend.seed_line_item(&guest(), ProductId::new(10), 1);
    let second = backend.seed_line_item(&guest(), ProductId::new(10), 2);

    let session = StorefrontSession::connect(&backend.config(guest())).unwrap();
    session.cart().snapshot().await;

    let cart = session.cart().clone();
    let clearing = tokio::spawn(async move { cart.clear().await });
    tokio::task::yield_now().await;
    let removing = session.cart().remove(first).unwrap();
    let updating = session.cart().update_quantity(second, 4).unwrap().unwrap();
    backend.fail(Route::RemoveLineItem);

    gate.add_permits(3);
    clearing.await.unwrap().unwrap();
    assert!(removing.wait().await.is_err());
    // The line is gone on the backend, so the update is a 404.
    assert!(matches!(
        updating.wait().await,
        Err(SyncError::Store(maison_storefront::StoreError::Request { status: 404, .. }))
    ));

    assert!(session.cart().current().is_empty());
    assert_eq!(session.cart().item_count(), 0);
    assert_eq!(subtotal(&session.cart().current()), Decimal::ZERO);
    assert_eq!(backend.cart_len(&guest()), 0);
}

#[tokio::test]
async fn test_failed_clear_keeps_items() {
    let backend = MockBackend::spawn().await;
    backend.add_product(product(10, "linen-shirt", 20));
    backend.seed_line_item(&guest(), ProductId::new(10), 1);
    backend.fail(Route::ClearCart);

    let session = StorefrontSession::connect(&backend.config(guest())).unwrap();
    session.cart().snapshot().await;

    assert!(session.cart().clear().await.is_err());
    assert_eq!(session.cart().current().len(), 1);
    assert_eq!(backend.cart_len(&guest()), 1);
}

#[tokio::test]
async fn test_session_cookie_sent_with_requests() {
    let backend = MockBackend::spawn().await;
    let session =
        StorefrontSession::connect(&backend.config_with_cookie(guest(), "sid=abc123")).unwrap();

    session.cart().snapshot().await;
    assert_eq!(backend.cookies(), vec!["sid=abc123".to_string()]);
}

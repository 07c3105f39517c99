//! `maison cart` commands.

use maison_core::LineItemId;
use maison_storefront::StorefrontSession;
use maison_storefront::views::{self, CartView, VariantSelection};

use super::{CommandError, product_by_slug, report};

/// Print every line with its price, then the subtotal.
#[allow(clippy::print_stdout)]
pub async fn show(session: &StorefrontSession) -> Result<(), CommandError> {
    let items = session.cart().snapshot().await;
    let view = CartView::from(items.as_slice());

    if view.is_empty() {
        println!("Your cart is empty");
        return Ok(());
    }

    for item in &view.items {
        let variant = item
            .variant_title
            .as_deref()
            .map(|v| format!(" ({v})"))
            .unwrap_or_default();
        println!(
            "#{:<6} {}{} x{} @ {} = {}",
            item.id, item.name, variant, item.quantity, item.price, item.line_price
        );
    }
    println!("{} items, subtotal {}", view.item_count, view.subtotal);
    Ok(())
}

/// Add a product, defaulting size and color to the product's first options.
pub async fn add(
    session: &StorefrontSession,
    slug: &str,
    quantity: u32,
    size: Option<String>,
    color: Option<String>,
) -> Result<(), CommandError> {
    let product = product_by_slug(session, slug).await?;

    let defaults = VariantSelection::defaults_for(&product);
    let selection = VariantSelection {
        size: size.or(defaults.size),
        color: color.or(defaults.color),
        quantity,
    };

    report(views::product::add_to_cart(session.cart(), &product, &selection).await)
}

pub async fn set_quantity(
    session: &StorefrontSession,
    id: LineItemId,
    quantity: u32,
) -> Result<(), CommandError> {
    session.cart().snapshot().await;
    if quantity < 1 {
        tracing::warn!("Quantity must be at least 1; use `cart remove` to drop a line");
        return Ok(());
    }

    match views::cart::change_quantity(session.cart(), id, quantity).await {
        Some(notice) => report(notice),
        None => show(session).await,
    }
}

pub async fn remove(session: &StorefrontSession, id: LineItemId) -> Result<(), CommandError> {
    session.cart().snapshot().await;
    match views::cart::remove_item(session.cart(), id).await {
        Some(notice) => report(notice),
        None => show(session).await,
    }
}

pub async fn clear(session: &StorefrontSession) -> Result<(), CommandError> {
    report(views::cart::clear(session.cart()).await)
}

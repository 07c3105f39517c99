//! `maison wishlist` commands.

use maison_storefront::StorefrontSession;
use maison_storefront::views::{self, Notice};

use super::{CommandError, product_by_slug, report};

#[allow(clippy::print_stdout)]
pub async fn show(session: &StorefrontSession) -> Result<(), CommandError> {
    let entries = session.wishlist().snapshot().await;
    if entries.is_empty() {
        println!("Your wishlist is empty");
        return Ok(());
    }

    for entry in &entries {
        match &entry.product {
            Some(product) => println!("{:<6} {} {}", product.id, product.name, product.display_price()),
            None => println!("{:<6}", entry.product_id),
        }
    }
    Ok(())
}

pub async fn add(session: &StorefrontSession, slug: &str) -> Result<(), CommandError> {
    let product = product_by_slug(session, slug).await?;
    let wishlist = session.wishlist();
    wishlist.snapshot().await;

    if wishlist.is_in_wishlist(product.id) {
        return report(Notice::success(
            "Already in wishlist",
            format!("{} is already in your wishlist.", product.name),
        ));
    }
    report(views::wishlist::toggle(wishlist, &product).await)
}

pub async fn remove(session: &StorefrontSession, slug: &str) -> Result<(), CommandError> {
    let product = product_by_slug(session, slug).await?;
    session.wishlist().snapshot().await;
    report(views::wishlist::remove(session.wishlist(), product.id).await)
}

pub async fn toggle(session: &StorefrontSession, slug: &str) -> Result<(), CommandError> {
    let product = product_by_slug(session, slug).await?;
    session.wishlist().snapshot().await;
    report(views::wishlist::toggle(session.wishlist(), &product).await)
}

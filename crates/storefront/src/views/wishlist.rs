//! Wishlist toggle and wishlist page actions.

use maison_core::{Product, ProductId};
use tracing::instrument;

use super::Notice;
use crate::error::add_breadcrumb;
use crate::sync::{CartCache, WishlistCache};

/// Toggle a product's wishlist membership from a product card or page.
#[instrument(skip(wishlist, product), fields(product_id = %product.id))]
pub async fn toggle(wishlist: &WishlistCache, product: &Product) -> Notice {
    let product_id = product.id.to_string();

    if wishlist.is_in_wishlist(product.id) {
        let result = match wishlist.remove(product.id) {
            Ok(confirmation) => confirmation.wait().await,
            Err(e) => Err(e),
        };
        return match result {
            Ok(()) => {
                add_breadcrumb("wishlist", "Removed from wishlist", Some(&[("product_id", product_id.as_str())]));
                Notice::success(
                    "Removed from wishlist",
                    format!("{} has been removed from your wishlist.", product.name),
                )
            }
            Err(e) => action_failed(&e),
        };
    }

    match wishlist.add(product.id).await {
        Ok(_) => {
            add_breadcrumb("wishlist", "Added to wishlist", Some(&[("product_id", product_id.as_str())]));
            Notice::success(
                "Added to wishlist",
                format!("{} has been added to your wishlist.", product.name),
            )
        }
        Err(e) => action_failed(&e),
    }
}

/// Remove an entry from the wishlist page.
#[instrument(skip(wishlist))]
pub async fn remove(wishlist: &WishlistCache, product_id: ProductId) -> Notice {
    let result = match wishlist.remove(product_id) {
        Ok(confirmation) => confirmation.wait().await,
        Err(e) => Err(e),
    };

    match result {
        Ok(()) => Notice::success(
            "Removed from wishlist",
            "The item has been removed from your wishlist.",
        ),
        Err(e) => {
            tracing::warn!(error = %e, "Wishlist remove failed");
            Notice::error(
                "Action failed",
                "There was a problem removing this item from your wishlist.",
            )
        }
    }
}

/// Add one unit of a wishlisted product to the cart, with no size or color.
#[instrument(skip(cart))]
pub async fn move_to_cart(cart: &CartCache, product_id: ProductId) -> Notice {
    match cart.add(product_id, 1, None, None).await {
        Ok(_) => Notice::success("Added to cart", "The item has been added to your cart."),
        Err(e) => {
            tracing::warn!(error = %e, "Add to cart from wishlist failed");
            Notice::error(
                "Failed to add to cart",
                "There was a problem adding this item to your cart.",
            )
        }
    }
}

fn action_failed(error: &crate::error::SyncError) -> Notice {
    tracing::warn!(error = %error, "Wishlist toggle failed");
    Notice::error("Action failed", "There was a problem with your request.")
}

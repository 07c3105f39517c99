//! Wishlist entries.

use serde::{Deserialize, Serialize};

use super::catalog::Product;
use super::id::{ProductId, WishlistEntryId};
use super::owner::OwnerId;

/// One saved-product reference. No quantity, no variant.
///
/// The backend may embed the product snapshot; when it does, it is kept so
/// the wishlist page can render without a catalog lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WishlistEntry {
    pub id: WishlistEntryId,
    #[serde(rename = "userId")]
    pub owner_id: OwnerId,
    pub product_id: ProductId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product: Option<Product>,
}

/// Body of `POST /api/wishlist`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewWishlistEntry {
    #[serde(rename = "userId")]
    pub owner_id: OwnerId,
    pub product_id: ProductId,
}

//! Core types for Maison.
//!
//! This module provides type-safe wrappers for the storefront domain.

pub mod cart;
pub mod catalog;
pub mod id;
pub mod owner;
pub mod price;
pub mod wishlist;

pub use cart::{LineItem, NewLineItem, QuantityUpdate};
pub use catalog::{Category, Product};
pub use id::*;
pub use owner::{OwnerId, OwnerIdError};
pub use price::{CurrencyCode, Price};
pub use wishlist::{NewWishlistEntry, WishlistEntry};

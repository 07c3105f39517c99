//! Maison Core - Shared types library.
//!
//! This crate provides the domain types used across all Maison components:
//! - `storefront` - Remote store client, cart/wishlist reflection caches
//! - `cli` - Command-line driver for the storefront client
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no HTTP clients, no async.
//! This keeps it lightweight and lets the integration test backend share the
//! exact wire types the client decodes.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, owner identity, prices, catalog, cart and wishlist entities

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;

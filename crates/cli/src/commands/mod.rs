//! Subcommand implementations.
//!
//! Each command drives the same view flows a storefront page would, then
//! prints the result. Failures surface as [`CommandError`].

pub mod cart;
pub mod catalog;
pub mod wishlist;

use maison_core::Product;
use maison_storefront::views::Notice;
use maison_storefront::{CatalogClient, StoreError, StorefrontConfig, StorefrontSession};
use thiserror::Error;

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CommandError {
    /// The HTTP client could not be built.
    #[error("Failed to connect: {0}")]
    Connect(#[source] StoreError),

    /// A catalog request failed.
    #[error("Catalog error: {0}")]
    Catalog(#[from] StoreError),

    /// The session was built without a catalog client.
    #[error("No catalog client configured")]
    NoCatalog,

    /// A view flow reported a failure to the shopper.
    #[error("{0}")]
    Action(Notice),
}

/// Build a session with a catalog client.
pub fn connect(config: &StorefrontConfig) -> Result<StorefrontSession, CommandError> {
    tracing::debug!(owner = %config.owner_id, api_url = %config.api_url, "Connecting");
    StorefrontSession::connect(config).map_err(CommandError::Connect)
}

fn catalog(session: &StorefrontSession) -> Result<&CatalogClient, CommandError> {
    session.catalog().ok_or(CommandError::NoCatalog)
}

async fn product_by_slug(session: &StorefrontSession, slug: &str) -> Result<Product, CommandError> {
    Ok(catalog(session)?.product_by_slug(slug).await?)
}

/// Print a successful notice, or turn a failed one into an error.
#[allow(clippy::print_stdout)]
fn report(notice: Notice) -> Result<(), CommandError> {
    if notice.is_error() {
        return Err(CommandError::Action(notice));
    }
    println!("{notice}");
    Ok(())
}

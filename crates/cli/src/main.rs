//! Maison CLI - shop the storefront from a terminal.
//!
//! # Usage
//!
//! ```bash
//! # Show the cart for the configured owner
//! maison cart show
//!
//! # Add a product by slug, choosing a size
//! maison cart add linen-shirt --size M
//!
//! # Change a line's quantity, or remove it
//! maison cart set 12 3
//! maison cart remove 12
//!
//! # Toggle a product on the wishlist for another owner
//! maison --owner shopper-42 wishlist toggle linen-shirt
//!
//! # Browse the catalog
//! maison catalog products --filter sale --category tops
//! ```
//!
//! # Environment Variables
//!
//! See `maison_storefront::config`; `MAISON_API_URL` is required.

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use maison_core::{LineItemId, OwnerId};
use maison_storefront::StorefrontConfig;
use maison_storefront::views::ShopFilter;
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

use commands::CommandError;

#[derive(Parser)]
#[command(name = "maison")]
#[command(author, version, about = "Maison storefront CLI")]
struct Cli {
    /// Owner whose cart and wishlist to use (overrides `MAISON_OWNER_ID`)
    #[arg(long, global = true)]
    owner: Option<OwnerId>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// View and change the cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// View and change the wishlist
    Wishlist {
        #[command(subcommand)]
        action: WishlistAction,
    },
    /// Browse products and categories
    Catalog {
        #[command(subcommand)]
        action: CatalogAction,
    },
}

#[derive(Subcommand)]
enum CartAction {
    /// List cart lines and the subtotal
    Show,
    /// Add a product by slug
    Add {
        slug: String,

        #[arg(short, long, default_value_t = 1)]
        quantity: u32,

        /// Size (defaults to the product's first size)
        #[arg(short, long)]
        size: Option<String>,

        /// Color (defaults to the product's first color)
        #[arg(short, long)]
        color: Option<String>,
    },
    /// Set a line's quantity
    Set { line_item: LineItemId, quantity: u32 },
    /// Remove a line
    Remove { line_item: LineItemId },
    /// Remove every line
    Clear,
}

#[derive(Subcommand)]
enum WishlistAction {
    /// List wishlisted products
    Show,
    /// Add a product by slug
    Add { slug: String },
    /// Remove a product by slug
    Remove { slug: String },
    /// Add the product if absent, remove it if present
    Toggle { slug: String },
}

#[derive(Subcommand)]
enum CatalogAction {
    /// List products
    Products {
        /// `all`, `new-arrivals`, `bestsellers`, or `sale`
        #[arg(short, long, default_value_t = ShopFilter::All)]
        filter: ShopFilter,

        /// Category slug
        #[arg(short, long)]
        category: Option<String>,
    },
    /// Show one product and similar products
    Product { slug: String },
    /// List categories
    Categories,
    /// List bestsellers
    Bestsellers,
    /// List new arrivals
    NewArrivals,
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &StorefrontConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry_environment
                .clone()
                .map(std::borrow::Cow::Owned),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    tracing::info!("Sentry initialized");
    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "maison_storefront=info,maison=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match StorefrontConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            init_tracing();
            tracing::error!("Failed to load configuration: {e}");
            std::process::exit(2);
        }
    };

    // Sentry must be initialized before the tracing subscriber
    let _sentry_guard = init_sentry(&config);
    init_tracing();

    if let Err(e) = run(cli, config).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli, mut config: StorefrontConfig) -> Result<(), CommandError> {
    if let Some(owner) = cli.owner {
        config.owner_id = owner;
    }
    let session = commands::connect(&config)?;

    match cli.command {
        Commands::Cart { action } => match action {
            CartAction::Show => commands::cart::show(&session).await,
            CartAction::Add {
                slug,
                quantity,
                size,
                color,
            } => commands::cart::add(&session, &slug, quantity, size, color).await,
            CartAction::Set {
                line_item,
                quantity,
            } => commands::cart::set_quantity(&session, line_item, quantity).await,
            CartAction::Remove { line_item } => commands::cart::remove(&session, line_item).await,
            CartAction::Clear => commands::cart::clear(&session).await,
        },
        Commands::Wishlist { action } => match action {
            WishlistAction::Show => commands::wishlist::show(&session).await,
            WishlistAction::Add { slug } => commands::wishlist::add(&session, &slug).await,
            WishlistAction::Remove { slug } => commands::wishlist::remove(&session, &slug).await,
            WishlistAction::Toggle { slug } => commands::wishlist::toggle(&session, &slug).await,
        },
        Commands::Catalog { action } => match action {
            CatalogAction::Products { filter, category } => {
                commands::catalog::products(&session, filter, category.as_deref()).await
            }
            CatalogAction::Product { slug } => commands::catalog::product(&session, &slug).await,
            CatalogAction::Categories => commands::catalog::categories(&session).await,
            CatalogAction::Bestsellers => commands::catalog::bestsellers(&session).await,
            CatalogAction::NewArrivals => commands::catalog::new_arrivals(&session).await,
        },
    }
}

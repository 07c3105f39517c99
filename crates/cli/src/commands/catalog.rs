//! `maison catalog` commands.

use maison_core::Product;
use maison_storefront::StorefrontSession;
use maison_storefront::views::{ShopFilter, filter_products, similar_products};

use super::{CommandError, catalog};

#[allow(clippy::print_stdout)]
fn print_products<'a>(products: impl IntoIterator<Item = &'a Product>) {
    for product in products {
        let sale = if product.is_on_sale() {
            format!(" (was {})", maison_storefront::views::format_price(product.price))
        } else {
            String::new()
        };
        let stock = if product.in_stock { "" } else { " [sold out]" };
        println!(
            "{:<24} {:<32} {}{}{}",
            product.slug,
            product.name,
            product.display_price(),
            sale,
            stock
        );
    }
}

pub async fn products(
    session: &StorefrontSession,
    filter: ShopFilter,
    category: Option<&str>,
) -> Result<(), CommandError> {
    let client = catalog(session)?;
    let products = client.products().await?;
    let categories = if category.is_some() {
        client.categories().await?
    } else {
        Vec::new()
    };

    print_products(filter_products(&products, &categories, filter, category));
    Ok(())
}

#[allow(clippy::print_stdout)]
pub async fn product(session: &StorefrontSession, slug: &str) -> Result<(), CommandError> {
    let client = catalog(session)?;
    let product = client.product_by_slug(slug).await?;

    print_products([&product]);
    if let Some(description) = &product.description {
        println!("\n{description}");
    }
    if !product.size_options().is_empty() {
        println!("Sizes: {}", product.size_options().join(", "));
    }
    if !product.color_options().is_empty() {
        println!("Colors: {}", product.color_options().join(", "));
    }

    let all = client.products().await?;
    let similar = similar_products(&product, &all);
    if !similar.is_empty() {
        println!("\nYou may also like:");
        print_products(similar);
    }
    Ok(())
}

#[allow(clippy::print_stdout)]
pub async fn categories(session: &StorefrontSession) -> Result<(), CommandError> {
    for category in catalog(session)?.categories().await? {
        println!("{:<24} {}", category.slug, category.name);
    }
    Ok(())
}

pub async fn bestsellers(session: &StorefrontSession) -> Result<(), CommandError> {
    print_products(&catalog(session)?.bestsellers().await?);
    Ok(())
}

pub async fn new_arrivals(session: &StorefrontSession) -> Result<(), CommandError> {
    print_products(&catalog(session)?.new_arrivals().await?);
    Ok(())
}

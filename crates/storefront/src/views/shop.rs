//! Shop listing filters and related products.

use std::fmt;
use std::str::FromStr;

use maison_core::{Category, Product};

/// Listing filter on the shop page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ShopFilter {
    #[default]
    All,
    NewArrivals,
    Bestsellers,
    Sale,
}

impl ShopFilter {
    /// Query-string form, e.g. `new-arrivals`.
    #[must_use]
    pub const fn slug(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::NewArrivals => "new-arrivals",
            Self::Bestsellers => "bestsellers",
            Self::Sale => "sale",
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::All => "All Products",
            Self::NewArrivals => "New Arrivals",
            Self::Bestsellers => "Bestsellers",
            Self::Sale => "Sale",
        }
    }

    #[must_use]
    pub const fn matches(self, product: &Product) -> bool {
        match self {
            Self::All => true,
            Self::NewArrivals => product.new_arrival,
            Self::Bestsellers => product.best_seller,
            Self::Sale => product.is_on_sale(),
        }
    }
}

impl fmt::Display for ShopFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for ShopFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(Self::All),
            "new-arrivals" => Ok(Self::NewArrivals),
            "bestsellers" => Ok(Self::Bestsellers),
            "sale" => Ok(Self::Sale),
            other => Err(format!(
                "unknown filter {other:?} (expected all, new-arrivals, bestsellers, or sale)"
            )),
        }
    }
}

/// Products shown on the shop page for a filter and optional category slug.
///
/// A category slug that matches no category does not narrow the listing.
#[must_use]
pub fn filter_products<'a>(
    products: &'a [Product],
    categories: &[Category],
    filter: ShopFilter,
    category_slug: Option<&str>,
) -> Vec<&'a Product> {
    let category_id = category_slug
        .and_then(|slug| categories.iter().find(|c| c.slug == slug))
        .map(|c| c.id);

    products
        .iter()
        .filter(|p| category_id.is_none_or(|id| p.category_id == id))
        .filter(|p| filter.matches(p))
        .collect()
}

/// Up to four other products from the same category.
#[must_use]
pub fn similar_products<'a>(product: &Product, all: &'a [Product]) -> Vec<&'a Product> {
    all.iter()
        .filter(|p| p.category_id == product.category_id && p.id != product.id)
        .take(4)
        .collect()
}

//! Product detail page: variant selection and add to cart.

use maison_core::Product;
use tracing::instrument;

use super::{Notice, ValidationError};
use crate::error::add_breadcrumb;
use crate::sync::CartCache;

/// Size, color, and quantity chosen on the product page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantSelection {
    pub size: Option<String>,
    pub color: Option<String>,
    pub quantity: u32,
}

impl Default for VariantSelection {
    fn default() -> Self {
        Self {
            size: None,
            color: None,
            quantity: 1,
        }
    }
}

impl VariantSelection {
    /// The selection a product page opens with: first color, first size,
    /// quantity 1.
    #[must_use]
    pub fn defaults_for(product: &Product) -> Self {
        Self {
            size: product.size_options().first().cloned(),
            color: product.color_options().first().cloned(),
            quantity: 1,
        }
    }

    /// Check the selection against the options the product offers.
    ///
    /// # Errors
    ///
    /// Returns a `ValidationError` if a required size or color is missing,
    /// a chosen option is not offered, or the quantity is zero.
    pub fn validate(&self, product: &Product) -> Result<(), ValidationError> {
        if self.quantity < 1 {
            return Err(ValidationError::InvalidQuantity(self.quantity));
        }
        check_option(self.size.as_deref(), product.size_options(), ValidationError::MissingSize)?;
        check_option(self.color.as_deref(), product.color_options(), ValidationError::MissingColor)
    }
}

fn check_option(
    chosen: Option<&str>,
    offered: &[String],
    missing: ValidationError,
) -> Result<(), ValidationError> {
    match chosen {
        None if offered.is_empty() => Ok(()),
        None => Err(missing),
        Some(value) if offered.is_empty() || offered.iter().any(|o| o == value) => Ok(()),
        Some(value) => Err(ValidationError::UnknownOption(value.to_string())),
    }
}

/// Validate the selection and add the product to the cart.
#[instrument(skip(cart, product), fields(product_id = %product.id))]
pub async fn add_to_cart(cart: &CartCache, product: &Product, selection: &VariantSelection) -> Notice {
    if let Err(e) = selection.validate(product) {
        return Notice::error(e.to_string(), e.description());
    }

    let result = cart
        .add(
            product.id,
            selection.quantity,
            selection.size.clone(),
            selection.color.clone(),
        )
        .await;

    match result {
        Ok(_) => {
            let product_id = product.id.to_string();
            add_breadcrumb("cart", "Added to cart", Some(&[("product_id", product_id.as_str())]));
            Notice::success(
                "Added to cart",
                format!("{} has been added to your cart.", product.name),
            )
        }
        Err(e) => {
            tracing::warn!(error = %e, "Add to cart failed");
            Notice::error(
                "Failed to add to cart",
                "There was a problem adding this item to your cart.",
            )
        }
    }
}

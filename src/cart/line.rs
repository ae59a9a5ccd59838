use std::num::NonZeroU32;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Product details the storefront knows when a shopper adds something to the cart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartItem {
    pub product_id: String,
    pub name: String,
    pub unit_price: Decimal,
    pub size_variant: Option<String>,
    pub image_ref: String,
}

impl CartItem {
    pub fn new(product_id: impl Into<String>, name: impl Into<String>, unit_price: Decimal) -> Self {
        Self {
            product_id: product_id.into(),
            name: name.into(),
            unit_price,
            size_variant: None,
            image_ref: String::new(),
        }
    }

    pub fn with_size(mut self, size: impl Into<String>) -> Self {
        self.size_variant = Some(size.into());
        self
    }

    pub fn with_image(mut self, image_ref: impl Into<String>) -> Self {
        self.image_ref = image_ref.into();
        self
    }
}

/// One distinct product + size entry in the cart.
///
/// `quantity` is never zero while the line is held by a [`CartStore`](super::CartStore).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub product_id: String,
    pub name: String,
    pub unit_price: Decimal,
    pub quantity: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size_variant: Option<String>,
    #[serde(default)]
    pub image_ref: String,
}

impl CartLine {
    pub fn new(item: CartItem, quantity: NonZeroU32) -> Self {
        Self {
            product_id: item.product_id,
            name: item.name,
            unit_price: item.unit_price,
            quantity: quantity.get(),
            size_variant: item.size_variant,
            image_ref: item.image_ref,
        }
    }

    pub fn matches(&self, product_id: &str, size_variant: Option<&str>) -> bool {
        self.product_id == product_id && self.size_variant.as_deref() == size_variant
    }

    /// Unit price × quantity, clamped at `Decimal::MAX`.
    pub fn line_total(&self) -> Decimal {
        self.unit_price.saturating_mul(Decimal::from(self.quantity))
    }

    /// Unit price × quantity, or `None` when the product overflows.
    pub fn checked_line_total(&self) -> Option<Decimal> {
        self.unit_price.checked_mul(Decimal::from(self.quantity))
    }
}

//! Line item types.

use serde::{Deserialize, Serialize};

use crate::ids::ProductId;

/// One product entry in the cart, with its accumulated quantity.
///
/// Field names are the persisted snapshot's wire names.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LineItem {
    /// Product ID, unique within a cart.
    pub id: ProductId,
    /// Product title (denormalized for display).
    pub title: String,
    /// Product image URL.
    pub image_url: String,
    /// Unit price.
    pub price: f64,
    /// Quantity, always at least 1 while the item is in a cart.
    pub quantity: u32,
}

impl LineItem {
    /// Price times quantity.
    pub fn total(&self) -> f64 {
        self.price * f64::from(self.quantity)
    }
}

/// A product as offered to [`Cart::add`](crate::Cart::add): a line item
/// without a quantity.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewLineItem {
    pub id: ProductId,
    pub title: String,
    pub image_url: String,
    pub price: f64,
}

impl NewLineItem {
    /// Create a new product entry.
    pub fn new(
        id: impl Into<ProductId>,
        title: impl Into<String>,
        image_url: impl Into<String>,
        price: f64,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            image_url: image_url.into(),
            price,
        }
    }

    /// Turn into a cart line with the given quantity.
    pub fn with_quantity(self, quantity: u32) -> LineItem {
        LineItem {
            id: self.id,
            title: self.title,
            image_url: self.image_url,
            price: self.price,
            quantity,
        }
    }
}

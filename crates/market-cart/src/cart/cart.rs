//! The cart collection.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cart::{LineItem, NewLineItem};
use crate::error::CartError;
use crate::ids::ProductId;

/// An ordered collection of line items keyed by product ID.
///
/// Insertion order is display order. No two items share an ID and every item
/// has a quantity of at least 1. Serializes as a bare JSON array of items.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<LineItem>", into = "Vec<LineItem>")]
pub struct Cart {
    items: Vec<LineItem>,
}

/// Reasons a list of items cannot form a cart.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InvalidCart {
    #[error("duplicate item {0}")]
    DuplicateItem(ProductId),

    #[error("item {0} has quantity 0")]
    ZeroQuantity(ProductId),
}

impl Cart {
    /// Create an empty cart.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a product.
    ///
    /// Re-adding a product already in the cart increases its quantity by 1
    /// instead of duplicating the row; a new product is appended with
    /// quantity 1. Returns the item's resulting quantity.
    ///
    /// A price that is not finite is rejected: JSON has no encoding for it.
    pub fn add(&mut self, item: NewLineItem) -> Result<u32, CartError> {
        if !item.price.is_finite() {
            return Err(CartError::InvalidPrice(item.id));
        }

        if let Some(existing) = self.items.iter_mut().find(|i| i.id == item.id) {
            existing.quantity = existing
                .quantity
                .checked_add(1)
                .ok_or_else(|| CartError::QuantityOverflow(item.id.clone()))?;
            return Ok(existing.quantity);
        }

        self.items.push(item.with_quantity(1));
        Ok(1)
    }

    /// Increase an item's quantity by 1. Returns the new quantity.
    pub fn increment(&mut self, id: &ProductId) -> Result<u32, CartError> {
        let item = self
            .items
            .iter_mut()
            .find(|i| &i.id == id)
            .ok_or_else(|| CartError::ItemNotFound(id.clone()))?;

        item.quantity = item
            .quantity
            .checked_add(1)
            .ok_or_else(|| CartError::QuantityOverflow(id.clone()))?;
        Ok(item.quantity)
    }

    /// Decrease an item's quantity by 1, removing it when it reaches 0.
    ///
    /// Returns the new quantity, or `None` if the item was removed.
    pub fn decrement(&mut self, id: &ProductId) -> Result<Option<u32>, CartError> {
        let index = self
            .items
            .iter()
            .position(|i| &i.id == id)
            .ok_or_else(|| CartError::ItemNotFound(id.clone()))?;

        if self.items[index].quantity > 1 {
            self.items[index].quantity -= 1;
            Ok(Some(self.items[index].quantity))
        } else {
            self.items.remove(index);
            Ok(None)
        }
    }

    /// Clear all items from the cart.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Get an item by ID.
    pub fn get(&self, id: &ProductId) -> Option<&LineItem> {
        self.items.iter().find(|i| &i.id == id)
    }

    /// Items in display order.
    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    /// Iterate over items in display order.
    pub fn iter(&self) -> std::slice::Iter<'_, LineItem> {
        self.items.iter()
    }

    /// Get total item count (sum of quantities).
    pub fn item_count(&self) -> u64 {
        self.items.iter().map(|i| u64::from(i.quantity)).sum()
    }

    /// Get number of distinct lines.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Check if cart is empty.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Sum of price times quantity over all items.
    pub fn subtotal(&self) -> f64 {
        self.items.iter().map(LineItem::total).sum()
    }
}

impl TryFrom<Vec<LineItem>> for Cart {
    type Error = InvalidCart;

    fn try_from(items: Vec<LineItem>) -> Result<Self, Self::Error> {
        for (index, item) in items.iter().enumerate() {
            if item.quantity == 0 {
                return Err(InvalidCart::ZeroQuantity(item.id.clone()));
            }
            if items[..index].iter().any(|other| other.id == item.id) {
                return Err(InvalidCart::DuplicateItem(item.id.clone()));
            }
        }
        Ok(Self { items })
    }
}

impl From<Cart> for Vec<LineItem> {
    fn from(cart: Cart) -> Self {
        cart.items
    }
}

impl<'a> IntoIterator for &'a Cart {
    type Item = &'a LineItem;
    type IntoIter = std::slice::Iter<'a, LineItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

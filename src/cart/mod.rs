//! Client-held shopping cart.
//!
//! [`CartStore`] owns the ordered line sequence and writes it through a
//! [`CartStorage`] after every mutation. Storage failures never escape as
//! errors: the store falls back to an empty cart and reports
//! [`SaveOutcome::ResetToEmpty`] so the UI can tell the shopper.

mod line;
mod storage;

use std::num::NonZeroU32;

use rust_decimal::Decimal;

pub use line::{CartItem, CartLine};
pub use storage::{CART_STORAGE_KEY, CartStorage, FileStorage, MemoryStorage, StorageError};

/// Result of writing the cart after a mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    Saved,
    /// Persisting failed; the in-memory cart was emptied.
    ResetToEmpty,
}

/// What happened when the store was hydrated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Nothing stored yet.
    Empty,
    Restored { lines: usize },
    /// Stored data was unreadable; the cart starts empty.
    ResetToEmpty,
}

#[derive(Debug)]
pub struct CartStore<S> {
    lines: Vec<CartLine>,
    storage: S,
    load_outcome: LoadOutcome,
}

impl<S: CartStorage> CartStore<S> {
    /// Hydrate a store from `storage`, or start empty when nothing usable is stored.
    pub fn open(mut storage: S) -> Self {
        let mut dropped = false;
        let (lines, load_outcome) = match storage.load() {
            Ok(Some(lines)) => {
                // Zero-quantity lines can only come from hand-edited storage.
                let stored = lines.len();
                let lines: Vec<CartLine> = lines.into_iter().filter(|l| l.quantity > 0).collect();
                dropped = lines.len() != stored;
                let count = lines.len();
                (lines, LoadOutcome::Restored { lines: count })
            }
            Ok(None) => (Vec::new(), LoadOutcome::Empty),
            Err(err) => {
                tracing::warn!(error = %err, "cart storage unreadable, starting with an empty cart");
                if let Err(err) = storage.clear() {
                    tracing::warn!(error = %err, "failed to discard unreadable cart");
                }
                (Vec::new(), LoadOutcome::ResetToEmpty)
            }
        };

        let mut store = Self {
            lines,
            storage,
            load_outcome,
        };
        if dropped && store.persist() == SaveOutcome::ResetToEmpty {
            store.load_outcome = LoadOutcome::ResetToEmpty;
        }

        tracing::debug!(outcome = ?store.load_outcome, "cart hydrated");
        store
    }

    pub fn load_outcome(&self) -> LoadOutcome {
        self.load_outcome
    }

    /// Merge `quantity` into the line for `(product_id, size_variant)`, or
    /// append a new line.
    pub fn add_item(&mut self, item: CartItem, quantity: NonZeroU32) -> SaveOutcome {
        let existing = self
            .lines
            .iter_mut()
            .find(|line| line.matches(&item.product_id, item.size_variant.as_deref()));

        match existing {
            Some(line) => line.quantity = line.quantity.saturating_add(quantity.get()),
            None => self.lines.push(CartLine::new(item, quantity)),
        }

        self.persist()
    }

    /// Set the quantity of a line. A quantity below one removes the line;
    /// an unknown line is left alone.
    pub fn update_quantity(
        &mut self,
        product_id: &str,
        size_variant: Option<&str>,
        quantity: u32,
    ) -> SaveOutcome {
        if quantity < 1 {
            return self.remove_item(product_id, size_variant);
        }

        match self.find_mut(product_id, size_variant) {
            Some(line) => line.quantity = quantity,
            None => return SaveOutcome::Saved,
        }

        self.persist()
    }

    pub fn remove_item(&mut self, product_id: &str, size_variant: Option<&str>) -> SaveOutcome {
        let before = self.lines.len();
        self.lines.retain(|line| !line.matches(product_id, size_variant));
        if self.lines.len() == before {
            return SaveOutcome::Saved;
        }

        self.persist()
    }

    pub fn clear(&mut self) -> SaveOutcome {
        self.lines.clear();
        self.persist()
    }

    /// Σ(unit price × quantity) over the current lines.
    pub fn total_price(&self) -> Decimal {
        self.lines
            .iter()
            .fold(Decimal::ZERO, |sum, line| sum.saturating_add(line.line_total()))
    }

    /// Number of distinct lines.
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Sum of all quantities, as shown on the cart badge.
    pub fn item_count(&self) -> u64 {
        self.lines.iter().map(|line| u64::from(line.quantity)).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn get(&self, product_id: &str, size_variant: Option<&str>) -> Option<&CartLine> {
        self.lines
            .iter()
            .find(|line| line.matches(product_id, size_variant))
    }

    /// Owned copy of the lines for an order submission.
    pub fn snapshot(&self) -> Vec<CartLine> {
        self.lines.clone()
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    fn find_mut(&mut self, product_id: &str, size_variant: Option<&str>) -> Option<&mut CartLine> {
        self.lines
            .iter_mut()
            .find(|line| line.matches(product_id, size_variant))
    }

    fn persist(&mut self) -> SaveOutcome {
        let result = if self.lines.is_empty() {
            self.storage.clear()
        } else {
            self.storage.save(&self.lines)
        };

        match result {
            Ok(()) => SaveOutcome::Saved,
            Err(err) => {
                tracing::warn!(error = %err, "failed to persist cart, resetting to empty");
                self.lines.clear();
                if let Err(err) = self.storage.clear() {
                    tracing::warn!(error = %err, "failed to clear cart storage");
                }
                SaveOutcome::ResetToEmpty
            }
        }
    }
}

//! Session cart state.
//!
//! A [`CartStore`] owns the ordered list of [`CartLine`]s for one session and
//! keeps it in sync with a durable slot ([`KeyValueStore`]).
//!
//! # Lifecycle
//!
//! ```text
//! Uninitialized --hydrate()--> Ready
//! ```
//!
//! A store starts `Uninitialized`. Mutations requested before hydration are
//! queued and replayed on top of the persisted cart, so a returning
//! customer's saved cart is never overwritten by an empty in-memory default.
//! Nothing is written to the slot until hydration has read it.
//!
//! Once `Ready`, every mutation updates memory first and then writes the
//! whole cart back to the slot.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::product::Product;
use crate::storage::KeyValueStore;
use crate::types::{Price, ProductId};

/// Slot key holding the serialized cart.
pub const CART_SLOT_KEY: &str = "cart";

/// Errors produced by cart operations and snapshot decoding.
#[derive(Debug, Error)]
pub enum CartError {
    /// A product with a negative price was offered to the cart.
    #[error("product {0} has a negative price")]
    NegativePrice(ProductId),

    /// The persisted snapshot is not valid JSON for the cart schema.
    #[error("malformed cart snapshot: {0}")]
    Malformed(#[from] serde_json::Error),

    /// The persisted snapshot holds a line with quantity zero.
    #[error("cart snapshot has a zero quantity line for product {0}")]
    ZeroQuantity(ProductId),

    /// The persisted snapshot lists the same product twice.
    #[error("cart snapshot lists product {0} more than once")]
    DuplicateLine(ProductId),
}

/// A product snapshot taken at add-time plus a quantity (always >= 1).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    #[serde(flatten)]
    pub product: Product,
    pub quantity: u32,
}

impl CartLine {
    /// The product id this line is keyed by.
    #[must_use]
    pub const fn id(&self) -> ProductId {
        self.product.id
    }

    /// Snapshot price multiplied by quantity.
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.product.price * self.quantity
    }
}

/// Hydration state of a [`CartStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    /// The durable slot has not been read yet.
    Uninitialized,
    /// The durable slot has been read; mutations persist immediately.
    Ready,
}

#[derive(Debug, Clone)]
enum CartOp {
    Add(Product),
    Remove(ProductId),
    Clear,
}

/// What to do with the slot after an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PersistIntent {
    Write,
    Discard,
}

/// The authoritative cart for one session.
#[derive(Debug)]
pub struct CartStore<S> {
    storage: S,
    lines: Vec<CartLine>,
    lifecycle: Lifecycle,
    pending: Vec<CartOp>,
}

impl<S: KeyValueStore> CartStore<S> {
    /// Create an uninitialized store over `storage`.
    ///
    /// Call [`hydrate`](Self::hydrate) before reading totals.
    #[must_use]
    pub const fn new(storage: S) -> Self {
        Self {
            storage,
            lines: Vec::new(),
            lifecycle: Lifecycle::Uninitialized,
            pending: Vec::new(),
        }
    }

    /// Create a store and hydrate it straight away.
    #[must_use]
    pub fn hydrated(storage: S) -> Self {
        let mut store = Self::new(storage);
        store.hydrate();
        store
    }

    /// Read the durable slot and move to [`Lifecycle::Ready`].
    ///
    /// Corrupt snapshots hydrate as an empty cart and the slot is removed.
    /// Operations queued while uninitialized are replayed on top of the
    /// loaded cart and persisted once. Hydrating twice is a no-op.
    pub fn hydrate(&mut self) {
        if self.lifecycle == Lifecycle::Ready {
            return;
        }

        self.lines = self.load();
        self.lifecycle = Lifecycle::Ready;

        let pending = std::mem::take(&mut self.pending);
        if pending.is_empty() {
            return;
        }

        let replayed = pending.len();
        let mut intent = PersistIntent::Write;
        for op in pending {
            intent = self.apply(op);
        }
        debug!(replayed, lines = self.lines.len(), "replayed cart operations queued before hydration");
        self.persist(intent);
    }

    /// Re-read the durable slot, replacing the in-memory cart.
    ///
    /// Used when another writer (a second tab sharing the session) may have
    /// changed the slot. Has no effect before hydration.
    pub fn reload_from_storage(&mut self) {
        if self.lifecycle == Lifecycle::Ready {
            self.lines = self.load();
        }
    }

    /// Add one unit of `product`.
    ///
    /// An existing line for the same id has its quantity incremented and
    /// keeps its original snapshot; otherwise a new line with quantity 1 is
    /// appended.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::NegativePrice`] if the product's price is below
    /// zero. The cart is left unchanged.
    pub fn add_to_cart(&mut self, product: Product) -> Result<(), CartError> {
        if product.price.is_negative() {
            warn!(product_id = %product.id, price = %product.price, "rejecting negative price");
            return Err(CartError::NegativePrice(product.id));
        }
        self.dispatch(CartOp::Add(product));
        Ok(())
    }

    /// Remove one unit of `product_id`.
    ///
    /// The line disappears when its quantity reaches zero. Unknown ids are
    /// ignored.
    pub fn remove_from_cart(&mut self, product_id: ProductId) {
        self.dispatch(CartOp::Remove(product_id));
    }

    /// Empty the cart and delete the durable slot.
    pub fn clear_cart(&mut self) {
        self.dispatch(CartOp::Clear);
    }

    /// Cart lines in first-add order.
    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    /// The line for `product_id`, if present.
    #[must_use]
    pub fn line(&self, product_id: ProductId) -> Option<&CartLine> {
        self.lines.iter().find(|line| line.id() == product_id)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Sum of quantities across all lines.
    #[must_use]
    pub fn total_items(&self) -> u64 {
        self.lines.iter().map(|line| u64::from(line.quantity)).sum()
    }

    /// Sum of snapshot price times quantity across all lines.
    #[must_use]
    pub fn total_price(&self) -> Price {
        self.lines.iter().map(CartLine::line_total).sum()
    }

    #[must_use]
    pub const fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    /// The backing slot store.
    #[must_use]
    pub const fn storage(&self) -> &S {
        &self.storage
    }

    /// Mutable access to the backing slot store, for draining journals.
    pub const fn storage_mut(&mut self) -> &mut S {
        &mut self.storage
    }

    /// Consume the cart and return the backing slot store.
    #[must_use]
    pub fn into_storage(self) -> S {
        self.storage
    }

    fn dispatch(&mut self, op: CartOp) {
        match self.lifecycle {
            Lifecycle::Uninitialized => {
                debug!(?op, "cart not hydrated yet, queueing operation");
                self.pending.push(op);
            }
            Lifecycle::Ready => {
                let intent = self.apply(op);
                self.persist(intent);
            }
        }
    }

    fn apply(&mut self, op: CartOp) -> PersistIntent {
        match op {
            CartOp::Add(product) => {
                if let Some(line) = self.lines.iter_mut().find(|line| line.id() == product.id) {
                    line.quantity = line.quantity.saturating_add(1);
                } else {
                    self.lines.push(CartLine {
                        product,
                        quantity: 1,
                    });
                }
                PersistIntent::Write
            }
            CartOp::Remove(product_id) => {
                if let Some(line) = self.lines.iter_mut().find(|line| line.id() == product_id) {
                    line.quantity = line.quantity.saturating_sub(1);
                }
                self.lines.retain(|line| line.quantity > 0);
                PersistIntent::Write
            }
            CartOp::Clear => {
                self.lines.clear();
                PersistIntent::Discard
            }
        }
    }

    fn persist(&mut self, intent: PersistIntent) {
        match intent {
            PersistIntent::Write => match encode_cart(&self.lines) {
                Ok(snapshot) => self.storage.set(CART_SLOT_KEY, snapshot),
                Err(e) => warn!(error = %e, "failed to serialize cart, slot left unchanged"),
            },
            PersistIntent::Discard => self.storage.remove(CART_SLOT_KEY),
        }
    }

    fn load(&mut self) -> Vec<CartLine> {
        let Some(raw) = self.storage.get(CART_SLOT_KEY) else {
            return Vec::new();
        };

        match decode_cart(&raw) {
            Ok(lines) => lines,
            Err(e) => {
                warn!(error = %e, "discarding unreadable cart snapshot");
                self.storage.remove(CART_SLOT_KEY);
                Vec::new()
            }
        }
    }
}

/// Serialize cart lines into the slot format.
///
/// # Errors
///
/// Returns [`CartError::Malformed`] if serialization fails.
pub fn encode_cart(lines: &[CartLine]) -> Result<String, CartError> {
    Ok(serde_json::to_string(lines)?)
}

/// Parse and validate a slot snapshot.
///
/// # Errors
///
/// Returns an error if the snapshot is not valid JSON for the cart schema,
/// contains a zero quantity, or lists a product id twice.
pub fn decode_cart(raw: &str) -> Result<Vec<CartLine>, CartError> {
    let lines: Vec<CartLine> = serde_json::from_str(raw)?;

    for (index, line) in lines.iter().enumerate() {
        if line.quantity == 0 {
            return Err(CartError::ZeroQuantity(line.id()));
        }
        if lines.iter().take(index).any(|earlier| earlier.id() == line.id()) {
            return Err(CartError::DuplicateLine(line.id()));
        }
    }

    Ok(lines)
}

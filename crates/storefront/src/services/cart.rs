//! Session-backed cart.
//!
//! Each request builds a [`CartStore`] over a [`JournaledStore`] seeded from
//! the session's cart slot, hydrates it, lets the handler mutate it, and then
//! replays the journaled slot writes against the session. Hydration of a
//! corrupt slot journals a removal, so even read-only requests commit.

use hello_shop_core::{CART_SLOT_KEY, CartLine, CartStore, JournaledStore, Price, SlotOp};
use serde::Serialize;
use tower_sessions::Session;
use tracing::debug;

/// A cart loaded from the request session.
pub struct SessionCart {
    session: Session,
    store: CartStore<JournaledStore>,
}

impl SessionCart {
    /// Load and hydrate the cart from the session.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store cannot be read.
    pub async fn load(session: &Session) -> Result<Self, tower_sessions::session::Error> {
        let mut slot = JournaledStore::new();
        if let Some(raw) = session.get::<String>(CART_SLOT_KEY).await? {
            slot.seed(CART_SLOT_KEY, raw);
        }

        Ok(Self {
            session: session.clone(),
            store: CartStore::hydrated(slot),
        })
    }

    #[must_use]
    pub const fn cart(&self) -> &CartStore<JournaledStore> {
        &self.store
    }

    pub const fn cart_mut(&mut self) -> &mut CartStore<JournaledStore> {
        &mut self.store
    }

    /// Flush the recorded slot writes to the session and return the cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store cannot be written.
    pub async fn commit(mut self) -> Result<CartStore<JournaledStore>, tower_sessions::session::Error> {
        let journal = self.store.storage_mut().take_journal();
        debug!(writes = journal.len(), "committing cart slot");

        for op in journal {
            match op {
                SlotOp::Set { key, value } => self.session.insert(&key, value).await?,
                SlotOp::Remove { key } => {
                    self.session.remove::<String>(&key).await?;
                }
            }
        }

        Ok(self.store)
    }
}

/// JSON view of a cart.
#[derive(Debug, Clone, Serialize)]
pub struct CartView {
    pub items: Vec<CartLineView>,
    pub total_items: u64,
    pub total_price: Price,
}

/// JSON view of one cart line.
#[derive(Debug, Clone, Serialize)]
pub struct CartLineView {
    #[serde(flatten)]
    pub line: CartLine,
    pub line_total: Price,
    /// First displayable image, or the placeholder.
    pub image: String,
}

impl<S> From<&CartStore<S>> for CartView
where
    S: hello_shop_core::KeyValueStore,
{
    fn from(cart: &CartStore<S>) -> Self {
        Self {
            items: cart
                .lines()
                .iter()
                .map(|line| CartLineView {
                    line: line.clone(),
                    line_total: line.line_total(),
                    image: line
                        .product
                        .display_images()
                        .into_iter()
                        .next()
                        .unwrap_or_default(),
                })
                .collect(),
            total_items: cart.total_items(),
            total_price: cart.total_price(),
        }
    }
}

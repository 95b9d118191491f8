//! # Cyberday Testing
//!
//! In-memory implementations of the `cyberday-core` client traits, plus an
//! offer builder, for exercising the broker, node and consumer cores without
//! a network.
//!
//! The mocks are scripted: tests flip their behavior switches (down,
//! unreachable, slow) to stage quorum failures, push failures and
//! reconnection scenarios.
//!
//! ## Example
//!
//! ```
//! use cyberday_testing::{offer, mocks::MockStorageNode};
//! use cyberday_core::StorageNodeClient;
//!
//! # tokio_test::block_on(async {
//! let node = MockStorageNode::new("DB1");
//! let ack = node.store(&offer("A").build()).await?;
//! assert!(ack.ok);
//! assert_eq!(node.offer_count(), 1);
//! # Ok::<(), cyberday_core::ClientError>(())
//! # });
//! ```

use cyberday_core::Offer;

pub mod mocks;

/// Start building a test offer with the given id and benign defaults.
#[must_use]
pub fn offer(offer_id: &str) -> OfferBuilder {
    OfferBuilder {
        offer: Offer {
            offer_id: offer_id.to_string(),
            product_id: format!("P-{offer_id}"),
            store: "Riploy".to_string(),
            category: "Moda".to_string(),
            product: "Parka".to_string(),
            discount_price: 1_000,
            stock: 5,
            date: "2026-11-27".to_string(),
            client_id: "Riploy".to_string(),
            timestamp: 1_790_000_000,
        },
    }
}

/// Fluent builder over a default valid [`Offer`].
#[derive(Clone, Debug)]
pub struct OfferBuilder {
    offer: Offer,
}

impl OfferBuilder {
    /// Set the category.
    #[must_use]
    pub fn category(mut self, category: &str) -> Self {
        self.offer.category = category.to_string();
        self
    }

    /// Set the store.
    #[must_use]
    pub fn store(mut self, store: &str) -> Self {
        self.offer.store = store.to_string();
        self
    }

    /// Set the discounted price.
    #[must_use]
    pub const fn price(mut self, discount_price: u32) -> Self {
        self.offer.discount_price = discount_price;
        self
    }

    /// Set the stock.
    #[must_use]
    pub const fn stock(mut self, stock: u32) -> Self {
        self.offer.stock = stock;
        self
    }

    /// Set the emit timestamp.
    #[must_use]
    pub const fn timestamp(mut self, timestamp: i64) -> Self {
        self.offer.timestamp = timestamp;
        self
    }

    /// Set the originating producer.
    #[must_use]
    pub fn client(mut self, client_id: &str) -> Self {
        self.offer.client_id = client_id.to_string();
        self
    }

    /// Finish building.
    #[must_use]
    pub fn build(self) -> Offer {
        self.offer
    }
}

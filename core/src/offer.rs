//! The [`Offer`] entity and its admission rules.
//!
//! An offer is an immutable advertisement of a discounted product. It is the
//! single replicated entity in the system: the broker deduplicates on
//! `offer_id`, storage nodes key their maps by it, and consumers use it to
//! suppress duplicate log rows after a reconnection.
//!
//! # Example
//!
//! ```
//! use cyberday_core::offer::Offer;
//!
//! let offer = Offer {
//!     offer_id: "Riploy-5f3a".to_string(),
//!     product_id: "P-001".to_string(),
//!     store: "Riploy".to_string(),
//!     category: "Moda".to_string(),
//!     product: "Parka".to_string(),
//!     discount_price: 19_990,
//!     stock: 5,
//!     date: "2026-11-27".to_string(),
//!     client_id: "Riploy".to_string(),
//!     timestamp: 1_790_000_000,
//! };
//!
//! assert!(offer.validate().is_ok());
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The closed category vocabulary.
///
/// An offer whose `category` is not one of these exact strings is rejected at
/// ingest. The list mirrors the retail catalog taxonomy and is a stable
/// contract with producers.
pub const VALID_CATEGORIES: [&str; 12] = [
    "Electrónica",
    "Moda",
    "Hogar",
    "Deportes",
    "Belleza",
    "Infantil",
    "Computación",
    "Electrodomésticos",
    "Herramientas",
    "Juguetes",
    "Automotriz",
    "Mascotas",
];

/// Reasons an offer is refused admission.
///
/// These are data errors, not transport errors: the RPC carrying the offer
/// still succeeds and the reason travels back in the reply body.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InvalidOffer {
    /// The offer carries no id, so it cannot be deduplicated or replicated.
    #[error("offer id is empty")]
    EmptyOfferId,

    /// Offers must advertise at least one unit.
    #[error("stock must be greater than zero")]
    ZeroStock,

    /// The category is outside the closed vocabulary.
    #[error("unknown category '{0}'")]
    UnknownCategory(String),
}

/// An immutable advertisement of a discounted product.
///
/// `offer_id` uniquely identifies an offer across the cluster: two offers
/// with the same id are the same offer, which makes overwrites on replica
/// nodes harmless and retries idempotent.
///
/// Field names are the canonical wire names; the struct serializes directly
/// as the body of `SubmitOffer`, `Store` and `DeliverOffer` requests.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Offer {
    /// Globally unique opaque identifier; the idempotence and replication key.
    pub offer_id: String,
    /// Catalog identifier of the discounted product.
    pub product_id: String,
    /// Store the offer originates from.
    pub store: String,
    /// Category; must belong to [`VALID_CATEGORIES`].
    pub category: String,
    /// Human-readable product name.
    pub product: String,
    /// Discounted price in minor currency units.
    pub discount_price: u32,
    /// Units available; strictly positive for any persisted offer.
    pub stock: u32,
    /// Calendar date of emission, `YYYY-MM-DD`.
    pub date: String,
    /// Originating producer identity.
    pub client_id: String,
    /// Wall-clock seconds since epoch at producer emit time.
    pub timestamp: i64,
}

impl Offer {
    /// Check the admission rules: non-empty id, positive stock, known category.
    ///
    /// Validation is independent of the idempotence check and runs before it,
    /// so a duplicate invalid offer is rejected on every submission.
    ///
    /// # Errors
    ///
    /// Returns the first violated rule as an [`InvalidOffer`].
    pub fn validate(&self) -> Result<(), InvalidOffer> {
        if self.offer_id.is_empty() {
            return Err(InvalidOffer::EmptyOfferId);
        }
        if self.stock == 0 {
            return Err(InvalidOffer::ZeroStock);
        }
        if !VALID_CATEGORIES.contains(&self.category.as_str()) {
            return Err(InvalidOffer::UnknownCategory(self.category.clone()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn offer() -> Offer {
        Offer {
            offer_id: "Riploy-1".to_string(),
            product_id: "P-001".to_string(),
            store: "Riploy".to_string(),
            category: "Moda".to_string(),
            product: "Parka".to_string(),
            discount_price: 19_990,
            stock: 5,
            date: "2026-11-27".to_string(),
            client_id: "Riploy".to_string(),
            timestamp: 1_790_000_000,
        }
    }

    #[test]
    fn valid_offer_passes() {
        assert!(offer().validate().is_ok());
    }

    #[test]
    fn empty_id_is_rejected() {
        let mut o = offer();
        o.offer_id = String::new();
        assert_eq!(o.validate(), Err(InvalidOffer::EmptyOfferId));
    }

    #[test]
    fn zero_stock_is_rejected_and_one_is_accepted() {
        let mut o = offer();
        o.stock = 0;
        assert_eq!(o.validate(), Err(InvalidOffer::ZeroStock));
        o.stock = 1;
        assert!(o.validate().is_ok());
    }

    #[test]
    fn unknown_category_is_rejected() {
        let mut o = offer();
        o.category = "Jardinería".to_string();
        assert_eq!(
            o.validate(),
            Err(InvalidOffer::UnknownCategory("Jardinería".to_string()))
        );
    }

    #[test]
    fn every_vocabulary_category_is_accepted() {
        for category in VALID_CATEGORIES {
            let mut o = offer();
            o.category = category.to_string();
            assert!(o.validate().is_ok(), "category {category} should pass");
        }
    }

    #[test]
    fn wire_field_names_are_canonical() {
        let value = serde_json::to_value(offer()).unwrap_or_default();
        for field in [
            "offer_id",
            "product_id",
            "store",
            "category",
            "product",
            "discount_price",
            "stock",
            "date",
            "client_id",
            "timestamp",
        ] {
            assert!(value.get(field).is_some(), "missing wire field {field}");
        }
    }

    proptest! {
        // Validation rejects exactly when one of the three rules is violated.
        #[test]
        fn rejects_iff_a_rule_is_violated(
            id in ".{0,12}",
            stock in 0u32..10,
            category in prop_oneof![
                Just("Moda".to_string()),
                Just("Hogar".to_string()),
                Just("NoSuchCategory".to_string()),
                ".{1,8}",
            ],
        ) {
            let mut o = offer();
            o.offer_id = id.clone();
            o.stock = stock;
            o.category = category.clone();

            let should_reject = id.is_empty()
                || stock == 0
                || !VALID_CATEGORIES.contains(&category.as_str());
            prop_assert_eq!(o.validate().is_err(), should_reject);
        }
    }
}

//! Consumer subscription filters.
//!
//! A consumer subscribes with constraints on category, store and maximum
//! price. External CSVs and the register wire message encode "unconstrained"
//! as the literal token `null`; internally that sentinel is converted at the
//! boundary into the typed [`FieldFilter::Any`], so matching code never
//! compares against magic strings.

use crate::offer::Offer;
use serde::{Deserialize, Serialize};

/// The sentinel token external encodings use for "unconstrained".
pub const UNCONSTRAINED: &str = "null";

/// A constraint on a single string-valued offer field.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldFilter {
    /// Matches every value.
    Any,
    /// Matches values contained in the set.
    OneOf(Vec<String>),
}

impl FieldFilter {
    /// Build a filter from a sentinel-encoded list.
    ///
    /// An empty list, or a list whose first element is the `null` token,
    /// means unconstrained. This preserves the CSV-loader contract, where an
    /// unconstrained field arrives as the one-element list `["null"]`.
    #[must_use]
    pub fn from_sentinel_list(values: &[String]) -> Self {
        match values.first() {
            None => Self::Any,
            Some(first) if first == UNCONSTRAINED => Self::Any,
            _ => Self::OneOf(values.to_vec()),
        }
    }

    /// Render the filter back into its sentinel-encoded wire form.
    #[must_use]
    pub fn to_sentinel_list(&self) -> Vec<String> {
        match self {
            Self::Any => vec![UNCONSTRAINED.to_string()],
            Self::OneOf(values) => values.clone(),
        }
    }

    /// Whether `value` satisfies the constraint.
    #[must_use]
    pub fn matches(&self, value: &str) -> bool {
        match self {
            Self::Any => true,
            Self::OneOf(values) => values.iter().any(|v| v == value),
        }
    }
}

/// A consumer's full subscription constraint.
///
/// An offer is delivered to a consumer when all three constraints hold.
/// `max_price == 0` means unlimited.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionFilter {
    /// Category constraint.
    pub categories: FieldFilter,
    /// Store constraint.
    pub stores: FieldFilter,
    /// Inclusive price ceiling in minor units; 0 disables the ceiling.
    pub max_price: u32,
}

impl SubscriptionFilter {
    /// A filter that matches every offer.
    #[must_use]
    pub const fn any() -> Self {
        Self {
            categories: FieldFilter::Any,
            stores: FieldFilter::Any,
            max_price: 0,
        }
    }

    /// Build a filter from sentinel-encoded wire fields.
    #[must_use]
    pub fn from_sentinel(categories: &[String], stores: &[String], max_price: u32) -> Self {
        Self {
            categories: FieldFilter::from_sentinel_list(categories),
            stores: FieldFilter::from_sentinel_list(stores),
            max_price,
        }
    }

    /// The match predicate: category, store and price ceiling must all hold.
    #[must_use]
    pub fn matches(&self, offer: &Offer) -> bool {
        if !self.categories.matches(&offer.category) {
            return false;
        }
        if !self.stores.matches(&offer.store) {
            return false;
        }
        if self.max_price > 0 && offer.discount_price > self.max_price {
            return false;
        }
        true
    }
}

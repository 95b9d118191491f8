//! The shared consumer-preferences CSV.
//!
//! One row per consumer: `consumer_id,categories,stores,max_price`.
//! Multi-valued fields are `;`-separated and the literal token `null`
//! encodes "unconstrained". The sentinel lists are kept as loaded — they
//! travel verbatim on the register wire message — and the typed
//! [`SubscriptionFilter`] is derived at the boundary.

use cyberday_core::SubscriptionFilter;
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

/// Failures loading a consumer's preferences.
#[derive(Error, Debug)]
pub enum PreferencesError {
    /// The file could not be read or a row could not be parsed.
    #[error("failed to read preferences: {0}")]
    Csv(#[from] csv::Error),

    /// No row matches the requested consumer.
    #[error("consumer {0} not found in preferences file")]
    NotFound(String),
}

#[derive(Debug, Deserialize)]
struct PreferencesRow {
    consumer_id: String,
    categories: String,
    stores: String,
    max_price: String,
}

/// One consumer's subscription preferences, as loaded from the CSV.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Preferences {
    /// The consumer's identity.
    pub consumer_id: String,
    /// Sentinel-encoded category list.
    pub categories: Vec<String>,
    /// Sentinel-encoded store list.
    pub stores: Vec<String>,
    /// Price ceiling; 0 = unlimited.
    pub max_price: u32,
}

impl Preferences {
    /// Load the row for `consumer_id` from the preferences CSV.
    ///
    /// # Errors
    ///
    /// Returns [`PreferencesError::NotFound`] when no row matches, or an
    /// I/O or parse error for an unreadable file.
    pub fn load(path: &Path, consumer_id: &str) -> Result<Self, PreferencesError> {
        let mut reader = csv::Reader::from_path(path)?;

        for row in reader.deserialize::<PreferencesRow>() {
            let row = row?;
            if row.consumer_id != consumer_id {
                continue;
            }
            return Ok(Self {
                consumer_id: row.consumer_id,
                categories: split_sentinel(&row.categories),
                stores: split_sentinel(&row.stores),
                max_price: row.max_price.parse().unwrap_or(0),
            });
        }

        Err(PreferencesError::NotFound(consumer_id.to_string()))
    }

    /// The typed filter these preferences encode.
    #[must_use]
    pub fn filter(&self) -> SubscriptionFilter {
        SubscriptionFilter::from_sentinel(&self.categories, &self.stores, self.max_price)
    }
}

/// Split a `;`-separated field, preserving the `null` sentinel as the
/// one-element list `["null"]`.
fn split_sentinel(field: &str) -> Vec<String> {
    if field == "null" {
        vec!["null".to_string()]
    } else {
        field.split(';').map(str::to_string).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cyberday_core::FieldFilter;
    use std::io::Write as _;

    #[allow(clippy::expect_used)] // Panics: Test will fail on fixture errors
    fn fixture(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().expect("temp file should be created");
        file.write_all(contents.as_bytes())
            .expect("fixture should be written");
        file
    }

    const CSV: &str = "\
consumer_id,categories,stores,max_price
C-E1,Electrónica;Computación,null,100000
C-M1,Moda,Riploy;Parisio,null
C-H1,null,null,0
";

    #[test]
    #[allow(clippy::expect_used)] // Panics: Test will fail if the row is missing
    fn loads_constrained_row() {
        let file = fixture(CSV);
        let prefs = Preferences::load(file.path(), "C-E1").expect("row should load");
        assert_eq!(prefs.categories, vec!["Electrónica", "Computación"]);
        assert_eq!(prefs.stores, vec!["null"]);
        assert_eq!(prefs.max_price, 100_000);

        let filter = prefs.filter();
        assert_eq!(
            filter.categories,
            FieldFilter::OneOf(vec!["Electrónica".to_string(), "Computación".to_string()])
        );
        assert_eq!(filter.stores, FieldFilter::Any);
    }

    #[test]
    #[allow(clippy::expect_used)] // Panics: Test will fail if the row is missing
    fn null_price_means_unlimited() {
        let file = fixture(CSV);
        let prefs = Preferences::load(file.path(), "C-M1").expect("row should load");
        assert_eq!(prefs.max_price, 0);
        assert_eq!(
            prefs.filter().stores,
            FieldFilter::OneOf(vec!["Riploy".to_string(), "Parisio".to_string()])
        );
    }

    #[test]
    #[allow(clippy::expect_used)] // Panics: Test will fail if the row is missing
    fn fully_unconstrained_row() {
        let file = fixture(CSV);
        let prefs = Preferences::load(file.path(), "C-H1").expect("row should load");
        let filter = prefs.filter();
        assert_eq!(filter.categories, FieldFilter::Any);
        assert_eq!(filter.stores, FieldFilter::Any);
        assert_eq!(filter.max_price, 0);
    }

    #[test]
    fn unknown_consumer_is_not_found() {
        let file = fixture(CSV);
        let result = Preferences::load(file.path(), "C-X9");
        assert!(matches!(result, Err(PreferencesError::NotFound(id)) if id == "C-X9"));
    }
}

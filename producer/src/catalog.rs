//! The producer catalog CSV.
//!
//! Header row, then `product_id,store,category,product,base_price,stock`.
//! Rows are kept raw at load time; [`RawRow::prepare`] applies the local
//! pre-checks (mirroring the broker's admission rules) so the submit loop
//! can skip-and-count bad rows the way the broker would reject them.

use cyberday_core::VALID_CATEGORIES;
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

/// Failures loading the catalog file.
#[derive(Error, Debug)]
pub enum CatalogError {
    /// The file could not be read or a row could not be parsed.
    #[error("failed to read catalog: {0}")]
    Csv(#[from] csv::Error),
}

/// Why a row was skipped locally instead of submitted.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RowSkip {
    /// Category outside the closed vocabulary.
    #[error("unknown category '{0}'")]
    UnknownCategory(String),

    /// `base_price` did not parse as a non-negative integer.
    #[error("unparsable base price '{0}'")]
    BadPrice(String),

    /// `stock` did not parse as an integer.
    #[error("unparsable stock '{0}'")]
    BadStock(String),

    /// Stock of zero; nothing to offer.
    #[error("product out of stock")]
    OutOfStock,
}

/// One catalog row as read from disk, numbers still unparsed.
#[derive(Clone, Debug, Deserialize)]
pub struct RawRow {
    /// Catalog identifier.
    pub product_id: String,
    /// Originating store.
    pub store: String,
    /// Claimed category, checked against the vocabulary on prepare.
    pub category: String,
    /// Product name.
    pub product: String,
    /// Undiscounted price, minor units.
    pub base_price: String,
    /// Available units.
    pub stock: String,
}

impl RawRow {
    /// Apply the local pre-checks and parse the numeric fields.
    ///
    /// # Errors
    ///
    /// Returns the [`RowSkip`] reason for rows the broker would refuse.
    pub fn prepare(&self) -> Result<CatalogEntry, RowSkip> {
        if !VALID_CATEGORIES.contains(&self.category.as_str()) {
            return Err(RowSkip::UnknownCategory(self.category.clone()));
        }
        let base_price: u32 = self
            .base_price
            .trim()
            .parse()
            .map_err(|_| RowSkip::BadPrice(self.base_price.clone()))?;
        let stock: u32 = self
            .stock
            .trim()
            .parse()
            .map_err(|_| RowSkip::BadStock(self.stock.clone()))?;
        if stock == 0 {
            return Err(RowSkip::OutOfStock);
        }

        Ok(CatalogEntry {
            product_id: self.product_id.clone(),
            store: self.store.clone(),
            category: self.category.clone(),
            product: self.product.clone(),
            base_price,
            stock,
        })
    }
}

/// A catalog row that passed the local pre-checks.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CatalogEntry {
    /// Catalog identifier.
    pub product_id: String,
    /// Originating store.
    pub store: String,
    /// Vocabulary category.
    pub category: String,
    /// Product name.
    pub product: String,
    /// Undiscounted price, minor units.
    pub base_price: u32,
    /// Available units, strictly positive.
    pub stock: u32,
}

/// A loaded catalog.
pub struct Catalog {
    /// Raw rows in file order.
    pub rows: Vec<RawRow>,
}

impl Catalog {
    /// Load the catalog CSV at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError`] when the file cannot be read or a row
    /// cannot be parsed into its six columns.
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let mut reader = csv::Reader::from_path(path)?;
        let rows = reader
            .deserialize::<RawRow>()
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { rows })
    }
}

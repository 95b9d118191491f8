//! The consumer's personal offer log.
//!
//! One CSV file per consumer (`<consumer_id>.csv`), one row appended per
//! received offer, header written when the file is created. The log is the
//! consumer's durable record; the in-memory id set in the service guards it
//! against duplicate rows during re-sync.

use cyberday_core::Offer;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use thiserror::Error;

const HEADER: [&str; 9] = [
    "offer_id",
    "product_id",
    "store",
    "category",
    "product",
    "discount_price",
    "stock",
    "date",
    "timestamp",
];

/// Failures appending to the log.
#[derive(Error, Debug)]
pub enum LogError {
    /// The log file could not be opened or created.
    #[error("failed to open offer log: {0}")]
    Io(#[from] std::io::Error),

    /// A row could not be written.
    #[error("failed to append offer row: {0}")]
    Csv(#[from] csv::Error),
}

/// Append-only CSV log for one consumer.
pub struct OfferLog {
    path: PathBuf,
}

impl OfferLog {
    /// A log at `<dir>/<consumer_id>.csv`.
    #[must_use]
    pub fn new(consumer_id: &str, dir: &Path) -> Self {
        Self {
            path: dir.join(format!("{consumer_id}.csv")),
        }
    }

    /// The log's location.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one offer row, writing the header first on a fresh file.
    ///
    /// # Errors
    ///
    /// Returns [`LogError`] when the file cannot be opened or written.
    pub fn append(&self, offer: &Offer) -> Result<(), LogError> {
        let fresh = !self.path.exists();
        let file = OpenOptions::new()
            .append(true)
            .create(true)
            .open(&self.path)?;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);

        if fresh {
            writer.write_record(HEADER)?;
        }
        writer.write_record([
            offer.offer_id.as_str(),
            offer.product_id.as_str(),
            offer.store.as_str(),
            offer.category.as_str(),
            offer.product.as_str(),
            &offer.discount_price.to_string(),
            &offer.stock.to_string(),
            offer.date.as_str(),
            &offer.timestamp.to_string(),
        ])?;
        writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cyberday_testing::offer;

    #[test]
    #[allow(clippy::expect_used)] // Panics: Test will fail on log errors
    fn header_is_written_once() {
        let dir = tempfile::tempdir().expect("tempdir should be created");
        let log = OfferLog::new("C-E1", dir.path());

        log.append(&offer("A").build()).expect("append should work");
        log.append(&offer("B").build()).expect("append should work");

        let contents = std::fs::read_to_string(log.path()).expect("log should be readable");
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("offer_id,product_id,store"));
        assert!(lines[1].starts_with("A,"));
        assert!(lines[2].starts_with("B,"));
    }

    #[test]
    #[allow(clippy::expect_used)] // Panics: Test will fail on log errors
    fn file_name_is_the_consumer_id() {
        let dir = tempfile::tempdir().expect("tempdir should be created");
        let log = OfferLog::new("C-H2", dir.path());
        log.append(&offer("A").build()).expect("append should work");
        assert!(dir.path().join("C-H2.csv").exists());
    }
}

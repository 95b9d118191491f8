//! # Cyberday Producer
//!
//! Streams a store's catalog into the broker as time-bounded offers: each
//! catalog row gets a random 10-50% discount, a unique offer id, today's
//! date and the current timestamp, then travels through `SubmitOffer`.
//! Rows the broker would refuse anyway (unknown category, non-positive
//! stock, unparsable numbers) are skipped locally and counted.

pub mod catalog;
pub mod submit;

pub use catalog::{Catalog, CatalogEntry};
pub use submit::{run_catalog, ProducerSummary};

//! # Cyberday Consumer
//!
//! A subscriber process: registers its preferences with the broker,
//! receives matching offers over a push endpoint, and appends each one to a
//! personal CSV log. After a (simulated) disconnection it reconciles by
//! fetching the quorum-merged history and appending only the offers it has
//! not seen — at-least-once delivery with consumer-side dedup by
//! `offer_id`.

pub mod config;
pub mod http;
pub mod log;
pub mod preferences;
pub mod service;

pub use config::ConsumerConfig;
pub use preferences::Preferences;
pub use service::ConsumerService;

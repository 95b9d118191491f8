//! The submit loop: discount, identify, pace, send.

use crate::catalog::{Catalog, CatalogEntry};
use chrono::Utc;
use cyberday_core::{BrokerClient, ClientError, Offer};
use cyberday_runtime::{retry_with_policy, RetryPolicy};
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;

/// Discount range applied to `base_price`: 10% to 50% off.
const DISCOUNT_RANGE: std::ops::Range<f64> = 0.10..0.50;
/// Pause between rows, randomized within this range.
const PACE_MS: std::ops::Range<u64> = 500..2000;

/// Terminal tallies for one catalog run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ProducerSummary {
    /// Rows read from the catalog.
    pub attempted: usize,
    /// Offers the broker accepted.
    pub accepted: usize,
    /// Rows skipped locally plus offers the broker refused.
    pub rejected: usize,
}

/// Turn a prepared catalog entry into a submittable offer.
///
/// The offer id is `<producer>-<uuid>`, globally unique so retries and
/// replication dedupe cleanly.
#[must_use]
pub fn make_offer(entry: &CatalogEntry, producer: &str) -> Offer {
    let discount = rand::thread_rng().gen_range(DISCOUNT_RANGE);
    let discount_price = (f64::from(entry.base_price) * (1.0 - discount)) as u32;
    let now = Utc::now();

    Offer {
        offer_id: format!("{producer}-{}", uuid::Uuid::new_v4()),
        product_id: entry.product_id.clone(),
        store: entry.store.clone(),
        category: entry.category.clone(),
        product: entry.product.clone(),
        discount_price,
        stock: entry.stock,
        date: now.format("%Y-%m-%d").to_string(),
        client_id: producer.to_string(),
        timestamp: now.timestamp(),
    }
}

/// Stream the whole catalog into the broker.
///
/// Bad rows are skipped locally and counted as rejected. Each submission is
/// retried on transport failure (the broker may still be coming up), and
/// the loop pauses a random 500-2000 ms between rows to spread load.
pub async fn run_catalog(
    broker: Arc<dyn BrokerClient>,
    catalog: &Catalog,
    producer: &str,
) -> ProducerSummary {
    let retry = RetryPolicy::fixed(10, Duration::from_secs(3));
    let mut summary = ProducerSummary::default();

    for row in &catalog.rows {
        summary.attempted += 1;

        let entry = match row.prepare() {
            Ok(entry) => entry,
            Err(skip) => {
                summary.rejected += 1;
                tracing::warn!(
                    producer,
                    product_id = %row.product_id,
                    reason = %skip,
                    "catalog row skipped"
                );
                continue;
            }
        };

        let offer = make_offer(&entry, producer);
        let result: Result<_, ClientError> =
            retry_with_policy(retry, || broker.submit_offer(&offer)).await;

        match result {
            Ok(ack) if ack.ok => {
                summary.accepted += 1;
                tracing::info!(
                    producer,
                    offer_id = %offer.offer_id,
                    product = %offer.product,
                    price = offer.discount_price,
                    "offer accepted"
                );
            }
            Ok(ack) => {
                summary.rejected += 1;
                tracing::warn!(
                    producer,
                    offer_id = %offer.offer_id,
                    message = %ack.message,
                    "offer refused"
                );
            }
            Err(error) => {
                summary.rejected += 1;
                tracing::error!(
                    producer,
                    offer_id = %offer.offer_id,
                    %error,
                    "offer submission failed"
                );
            }
        }

        let pace = rand::thread_rng().gen_range(PACE_MS);
        tokio::time::sleep(Duration::from_millis(pace)).await;
    }

    tracing::info!(
        producer,
        attempted = summary.attempted,
        accepted = summary.accepted,
        rejected = summary.rejected,
        "catalog run complete"
    );
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::RawRow;
    use cyberday_testing::mocks::MockBroker;

    fn entry() -> CatalogEntry {
        CatalogEntry {
            product_id: "P-001".to_string(),
            store: "Riploy".to_string(),
            category: "Moda".to_string(),
            product: "Parka".to_string(),
            base_price: 10_000,
            stock: 3,
        }
    }

    #[test]
    fn discount_stays_in_range() {
        for _ in 0..200 {
            let offer = make_offer(&entry(), "Riploy");
            // 10-50% off 10_000, floored to whole minor units.
            assert!(offer.discount_price >= 5_000);
            assert!(offer.discount_price <= 9_000);
            assert!(offer.validate().is_ok());
        }
    }

    #[test]
    fn offer_ids_are_unique_and_prefixed() {
        let a = make_offer(&entry(), "Riploy");
        let b = make_offer(&entry(), "Riploy");
        assert_ne!(a.offer_id, b.offer_id);
        assert!(a.offer_id.starts_with("Riploy-"));
    }

    #[tokio::test(start_paused = true)]
    async fn bad_rows_are_skipped_and_good_rows_submitted() {
        let broker = Arc::new(MockBroker::new());
        let catalog = Catalog {
            rows: vec![
                RawRow {
                    product_id: "P-001".to_string(),
                    store: "Riploy".to_string(),
                    category: "Moda".to_string(),
                    product: "Parka".to_string(),
                    base_price: "10000".to_string(),
                    stock: "3".to_string(),
                },
                RawRow {
                    product_id: "P-002".to_string(),
                    store: "Riploy".to_string(),
                    category: "NoExiste".to_string(),
                    product: "Pala".to_string(),
                    base_price: "5000".to_string(),
                    stock: "2".to_string(),
                },
            ],
        };

        let summary = run_catalog(Arc::clone(&broker) as _, &catalog, "Riploy").await;
        assert_eq!(
            summary,
            ProducerSummary {
                attempted: 2,
                accepted: 1,
                rejected: 1
            }
        );
        assert_eq!(broker.submitted().len(), 1);
        assert_eq!(broker.submitted()[0].product_id, "P-001");
    }
}

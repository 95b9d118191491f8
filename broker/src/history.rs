//! Quorum reads: reconstructing history for reconnecting consumers.

use crate::cluster::READ_QUORUM;
use crate::dispatcher::Broker;
use cyberday_core::wire::HistoryReply;
use cyberday_core::Offer;
use std::collections::HashMap;

/// Caller id storage nodes see on broker-initiated reads.
const BROKER_READER_ID: &str = "broker";

impl Broker {
    /// Handle one `FetchHistory`.
    ///
    /// Reads every believed-live node in parallel and waits for all of them
    /// (each call carries its own deadline). With fewer than R successful
    /// replies the view could miss acknowledged writes, so an empty reply
    /// is returned instead of a partial one — `R + W > N` only holds when
    /// the read side actually overlaps the write quorum.
    ///
    /// Successful replies are union-merged by `offer_id`; offers are
    /// immutable, so colliding values are equivalent and last-writer-wins
    /// is safe. If the caller is a registered consumer the merged set is
    /// narrowed by its filter.
    pub async fn fetch_history(&self, consumer_id: &str) -> HistoryReply {
        let targets = self.cluster.believed_live();

        let reads = targets.into_iter().map(|node| async move {
            let client = node.client();
            match client.read_all(BROKER_READER_ID, 0).await {
                Ok(reply) => {
                    node.record_read(true);
                    Some(reply)
                }
                Err(error) => {
                    tracing::warn!(
                        node_id = %node.node_id(),
                        %error,
                        "history read failed"
                    );
                    node.record_read(false);
                    None
                }
            }
        });

        let replies: Vec<HistoryReply> = futures::future::join_all(reads)
            .await
            .into_iter()
            .flatten()
            .collect();

        if replies.len() < READ_QUORUM {
            metrics::counter!("cyberday_history_quorum_unreached").increment(1);
            tracing::warn!(
                consumer_id,
                replies = replies.len(),
                required = READ_QUORUM,
                "read quorum unreached, returning empty history"
            );
            return HistoryReply::default();
        }

        let mut merged: HashMap<String, Offer> = HashMap::new();
        for reply in replies {
            for offer in reply.offers {
                merged.insert(offer.offer_id.clone(), offer);
            }
        }

        let filter = self
            .consumers
            .get(consumer_id)
            .map(|registration| registration.filter.clone());

        let offers: Vec<Offer> = merged
            .into_values()
            .filter(|offer| filter.as_ref().is_none_or(|f| f.matches(offer)))
            .collect();

        tracing::info!(
            consumer_id,
            offers = offers.len(),
            "history served"
        );
        HistoryReply {
            offers,
            node_id: String::new(),
        }
    }
}

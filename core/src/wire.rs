//! Request and reply bodies for the broker, storage-node and consumer
//! HTTP surfaces.
//!
//! Field names are the canonical wire names; every body is plain JSON.
//! Data-level failures (invalid offer, quorum unreached, node inactive) ride
//! inside these replies with `ok = false` — the HTTP exchange itself still
//! succeeds. Only transport failures surface as request errors.

use crate::offer::Offer;
use serde::{Deserialize, Serialize};

/// Reply to `SubmitOffer`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OfferAck {
    /// Whether the offer was accepted (or already processed).
    pub ok: bool,
    /// Human-readable outcome: acceptance, rejection reason, or duplicate note.
    pub message: String,
}

impl OfferAck {
    /// An accepting ack with the given message.
    #[must_use]
    pub fn accepted(message: impl Into<String>) -> Self {
        Self {
            ok: true,
            message: message.into(),
        }
    }

    /// A rejecting ack with the given reason.
    #[must_use]
    pub fn rejected(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            message: message.into(),
        }
    }
}

/// Body of `RegisterConsumer`.
///
/// Category and store lists are sentinel-encoded: the one-element list
/// `["null"]` means unconstrained, preserving the preferences-CSV contract.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterConsumerRequest {
    /// Consumer identity, e.g. `C-E1`.
    pub consumer_id: String,
    /// Sentinel-encoded category constraint.
    pub categories: Vec<String>,
    /// Sentinel-encoded store constraint.
    pub stores: Vec<String>,
    /// Inclusive price ceiling; 0 = unlimited.
    pub max_price: u32,
    /// Address the broker pushes deliveries to.
    pub address: String,
}

/// Reply to `RegisterConsumer`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterAck {
    /// Whether the registration was recorded.
    pub ok: bool,
    /// Outcome detail.
    pub message: String,
}

/// Body of `FetchHistory`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchHistoryRequest {
    /// The consumer asking for its missed offers.
    pub consumer_id: String,
}

/// Reply to `FetchHistory` and to a storage node's `ReadAll`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryReply {
    /// The merged (broker) or local (node) offer set, in no particular order.
    pub offers: Vec<Offer>,
    /// Answering node id; empty in broker replies.
    #[serde(default)]
    pub node_id: String,
}

/// Reply to a storage node's `Store`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreAck {
    /// Whether the offer was persisted on this node.
    pub ok: bool,
    /// Answering node id, so the quorum collector can attribute acks.
    pub node_id: String,
    /// Outcome detail.
    pub message: String,
}

/// Body of a storage node's `ReadAll`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadAllRequest {
    /// Identity of the caller (broker or a recovering peer).
    pub node_id: String,
    /// Only offers with `timestamp >= since_ts` are returned; 0 = everything.
    pub since_ts: i64,
}

/// Body of a storage node's `Reconcile` (anti-entropy push).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconcileRequest {
    /// The pushing node.
    pub source_node: String,
    /// Full offer snapshot of the pushing node.
    pub offers: Vec<Offer>,
}

/// Reply to `Reconcile`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconcileAck {
    /// Whether the push was merged.
    pub ok: bool,
    /// How many previously-absent offers the recipient inserted.
    pub new_count: u32,
}

/// Reply to a consumer's `DeliverOffer`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliverAck {
    /// Whether the consumer ingested the offer.
    pub ok: bool,
    /// Answering consumer id.
    pub node_id: String,
    /// Outcome detail.
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[allow(clippy::expect_used)] // Panics: Test will fail if deserialization fails
    fn history_reply_tolerates_missing_node_id() {
        let reply: HistoryReply =
            serde_json::from_str(r#"{"offers":[]}"#).expect("reply should deserialize");
        assert!(reply.offers.is_empty());
        assert!(reply.node_id.is_empty());
    }

    #[test]
    fn offer_ack_constructors() {
        assert!(OfferAck::accepted("ok").ok);
        assert!(!OfferAck::rejected("bad").ok);
    }
}

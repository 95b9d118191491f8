//! # Cyberday Transport
//!
//! HTTP/JSON implementations of the client traits in `cyberday-core`.
//!
//! Every service exposes its operations as `POST` endpoints with JSON
//! bodies; the clients here are thin wrappers over a shared
//! [`reqwest::Client`] that attach the per-call deadlines the system
//! prescribes (2 s writes, 3 s reads, 5 s gossip, 2 s deliveries) and map
//! transport failures into [`ClientError`]. Data-level refusals arrive as
//! ordinary `ok = false` reply bodies and are not errors at this layer.
//!
//! One client per target, held for the owning process's lifetime. There is
//! no pooling beyond what `reqwest` does internally.

pub mod broker;
pub mod consumer;
pub mod node;

pub use broker::HttpBrokerClient;
pub use consumer::HttpConsumerClient;
pub use node::HttpStorageNodeClient;

use cyberday_core::ClientError;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;

/// Per-operation deadlines.
///
/// Defaults follow the system contract: writes resolve fast so the quorum
/// round stays bounded, reads get a little longer, gossip pushes the
/// longest.
#[derive(Clone, Copy, Debug)]
pub struct Deadlines {
    /// `Store` calls to a node.
    pub store: Duration,
    /// `ReadAll` calls to a node.
    pub read_all: Duration,
    /// `Reconcile` pushes between nodes.
    pub reconcile: Duration,
    /// `DeliverOffer` pushes to a consumer.
    pub deliver: Duration,
    /// Producer-facing `SubmitOffer`.
    pub submit: Duration,
    /// Consumer-facing `RegisterConsumer`.
    pub register: Duration,
    /// Consumer-facing `FetchHistory`.
    pub history: Duration,
}

impl Default for Deadlines {
    fn default() -> Self {
        Self {
            store: Duration::from_secs(2),
            read_all: Duration::from_secs(3),
            reconcile: Duration::from_secs(5),
            deliver: Duration::from_secs(2),
            submit: Duration::from_secs(5),
            register: Duration::from_secs(5),
            history: Duration::from_secs(10),
        }
    }
}

/// POST `body` to `url` and decode the JSON reply, within `deadline`.
pub(crate) async fn post_json<B, R>(
    client: &reqwest::Client,
    url: &str,
    body: &B,
    deadline: Duration,
) -> Result<R, ClientError>
where
    B: Serialize + ?Sized,
    R: DeserializeOwned,
{
    let response = client
        .post(url)
        .timeout(deadline)
        .json(body)
        .send()
        .await
        .map_err(|e| {
            if e.is_timeout() {
                ClientError::DeadlineElapsed(deadline.as_millis() as u64)
            } else {
                ClientError::Transport(e.to_string())
            }
        })?;

    let status = response.status();
    if !status.is_success() {
        return Err(ClientError::Transport(format!(
            "{url} answered {status}"
        )));
    }

    response
        .json::<R>()
        .await
        .map_err(|e| ClientError::InvalidReply(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_deadlines_follow_the_contract() {
        let d = Deadlines::default();
        assert_eq!(d.store, Duration::from_secs(2));
        assert_eq!(d.read_all, Duration::from_secs(3));
        assert_eq!(d.reconcile, Duration::from_secs(5));
        assert_eq!(d.deliver, Duration::from_secs(2));
    }
}

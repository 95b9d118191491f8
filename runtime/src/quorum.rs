//! W-of-N quorum collection for parallel fan-out writes.
//!
//! The broker replicates each accepted offer to every storage node it
//! believes live, but only needs W acknowledgements to proceed. The
//! collector here resolves as soon as W successes arrive, on an aggregate
//! deadline, or when every call has reported — whichever comes first.
//!
//! Calls are spawned as independent tasks, so a call still in flight when
//! the collector resolves keeps running on its own timer. Its outcome is
//! discarded here, but side effects inside the call (per-node counters,
//! logging) still happen. The gossip layer heals any node whose write never
//! landed.
//!
//! Collection never happens under a lock: callers snapshot whatever state
//! they need, build the call futures, and hand them over.

use std::time::Duration;
use tokio::sync::mpsc;

/// What a quorum collection round observed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct QuorumOutcome {
    /// Successful acknowledgements received before resolution.
    pub acks: usize,
    /// Total replies (success or failure) received before resolution.
    pub replies: usize,
    /// How many calls were issued.
    pub attempted: usize,
}

impl QuorumOutcome {
    /// Whether the round gathered at least `quorum` acknowledgements.
    #[must_use]
    pub const fn reached(&self, quorum: usize) -> bool {
        self.acks >= quorum
    }
}

/// Issue `calls` in parallel and resolve once `quorum` of them succeed.
///
/// Each call reports `true` for an acknowledged write and `false` for a
/// refusal or transport failure; per-call deadlines are the call's own
/// responsibility. Resolution happens on the first of:
///
/// - `quorum` successes,
/// - every call reporting,
/// - `deadline` elapsing.
///
/// Calls still in flight at resolution continue as detached tasks.
pub async fn collect_write_quorum<I, F>(
    calls: I,
    quorum: usize,
    deadline: Duration,
) -> QuorumOutcome
where
    I: IntoIterator<Item = F>,
    F: std::future::Future<Output = bool> + Send + 'static,
{
    let (tx, mut rx) = mpsc::unbounded_channel();

    let mut attempted = 0usize;
    for call in calls {
        attempted += 1;
        let tx = tx.clone();
        tokio::spawn(async move {
            let ok = call.await;
            // The collector may have resolved already; the result is then
            // nobody's business but the call's own side effects.
            let _ = tx.send(ok);
        });
    }
    drop(tx);

    let mut acks = 0usize;
    let mut replies = 0usize;

    let timer = tokio::time::sleep(deadline);
    tokio::pin!(timer);

    loop {
        tokio::select! {
            reply = rx.recv() => match reply {
                Some(ok) => {
                    replies += 1;
                    if ok {
                        acks += 1;
                        if acks >= quorum {
                            break;
                        }
                    }
                }
                None => break,
            },
            () = &mut timer => {
                tracing::warn!(
                    acks,
                    replies,
                    attempted,
                    deadline_ms = deadline.as_millis(),
                    "quorum collection hit aggregate deadline"
                );
                break;
            }
        }
    }

    metrics::counter!("cyberday_quorum_rounds").increment(1);
    QuorumOutcome {
        acks,
        replies,
        attempted,
    }
}

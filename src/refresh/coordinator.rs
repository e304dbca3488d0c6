//! Background dispatch with single delivery back to the UI loop.

use std::collections::HashMap;
use std::fmt::Debug;
use std::future::Future;
use std::hash::Hash;

use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::AbortHandle;
use tracing::{debug, trace};

use super::SequenceLedger;

/// Identifies one triggered request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ticket<K> {
    pub key: K,
    pub seq: u64,
}

/// A finished request that is still current and should be applied.
#[derive(Debug)]
pub struct Outcome<K, T> {
    pub key: K,
    pub seq: u64,
    /// The payload, or the producer's error rendered for display.
    pub result: Result<T, String>,
}

#[derive(Debug)]
struct Delivery<K, T> {
    key: K,
    seq: u64,
    exclusive: bool,
    /// `None` when the producer was aborted after being superseded.
    result: Option<Result<T, String>>,
}

/// Runs producers on a tokio runtime and hands their outcomes back to a
/// single consumer.
///
/// The coordinator itself lives on the presentation side: it is not `Sync`
/// and is only touched by the UI loop. Producers own nothing shared; they
/// receive their inputs by value and return a payload.
///
/// # Example
///
/// ```
/// use brickwatch::refresh::RefreshCoordinator;
///
/// # tokio_test::block_on(async {
/// let mut coordinator = RefreshCoordinator::new(tokio::runtime::Handle::current());
/// coordinator.trigger("health", true, async { Ok::<_, anyhow::Error>(42) });
///
/// let outcome = coordinator.recv().await.unwrap();
/// assert_eq!(outcome.result, Ok(42));
/// # });
/// ```
pub struct RefreshCoordinator<K, T> {
    runtime: Handle,
    tx: mpsc::UnboundedSender<Delivery<K, T>>,
    rx: mpsc::UnboundedReceiver<Delivery<K, T>>,
    ledger: SequenceLedger<K>,
    /// Abort handle of the newest exclusive producer per key.
    in_flight: HashMap<K, (u64, AbortHandle)>,
    outstanding: HashMap<K, usize>,
}

impl<K, T> Debug for RefreshCoordinator<K, T>
where
    K: Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefreshCoordinator")
            .field("ledger", &self.ledger)
            .field("outstanding", &self.outstanding)
            .finish()
    }
}

impl<K, T> RefreshCoordinator<K, T>
where
    K: Hash + Eq + Clone + Debug + Send + 'static,
    T: Send + 'static,
{
    /// Create a coordinator that spawns producers on `runtime`.
    pub fn new(runtime: Handle) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            runtime,
            tx,
            rx,
            ledger: SequenceLedger::new(),
            in_flight: HashMap::new(),
            outstanding: HashMap::new(),
        }
    }

    /// Start `producer` in the background for `key`.
    ///
    /// With `exclusive` set, the new request supersedes every earlier one
    /// for the same key: their results will be dropped, and a producer still
    /// running is aborted.
    pub fn trigger<F>(&mut self, key: K, exclusive: bool, producer: F) -> Ticket<K>
    where
        F: Future<Output = anyhow::Result<T>> + Send + 'static,
    {
        let seq = self.ledger.begin(&key);

        if exclusive {
            if let Some((old_seq, handle)) = self.in_flight.remove(&key) {
                debug!(?key, old_seq, seq, "superseding in-flight refresh");
                handle.abort();
            }
        }

        let task = self.runtime.spawn(producer);
        if exclusive {
            self.in_flight.insert(key.clone(), (seq, task.abort_handle()));
        }
        *self.outstanding.entry(key.clone()).or_default() += 1;

        debug!(?key, seq, exclusive, "refresh triggered");

        let tx = self.tx.clone();
        let delivery_key = key.clone();
        self.runtime.spawn(async move {
            let result = match task.await {
                Ok(Ok(payload)) => Some(Ok(payload)),
                Ok(Err(err)) => Some(Err(format!("{:#}", err))),
                Err(err) if err.is_cancelled() => None,
                Err(err) => Some(Err(format!("refresh task failed: {}", err))),
            };
            // The receiver only goes away on shutdown.
            let _ = tx.send(Delivery {
                key: delivery_key,
                seq,
                exclusive,
                result,
            });
        });

        Ticket { key, seq }
    }

    /// Whether any request for `key` has not come back yet.
    pub fn is_pending(&self, key: &K) -> bool {
        self.outstanding.get(key).copied().unwrap_or(0) > 0
    }

    /// Take every outcome that has arrived, without blocking.
    ///
    /// Outcomes are returned in arrival order; superseded ones are skipped.
    pub fn drain(&mut self) -> Vec<Outcome<K, T>> {
        let mut outcomes = Vec::new();
        while let Ok(delivery) = self.rx.try_recv() {
            if let Some(outcome) = self.settle(delivery) {
                outcomes.push(outcome);
            }
        }
        outcomes
    }

    /// Wait for the next current outcome.
    ///
    /// Returns `None` once nothing is outstanding.
    pub async fn recv(&mut self) -> Option<Outcome<K, T>> {
        loop {
            if self.outstanding.values().all(|&n| n == 0) {
                return None;
            }
            let delivery = self.rx.recv().await?;
            if let Some(outcome) = self.settle(delivery) {
                return Some(outcome);
            }
        }
    }

    fn settle(&mut self, delivery: Delivery<K, T>) -> Option<Outcome<K, T>> {
        let Delivery {
            key,
            seq,
            exclusive,
            result,
        } = delivery;

        if let Some(count) = self.outstanding.get_mut(&key) {
            *count = count.saturating_sub(1);
        }
        if self.in_flight.get(&key).map(|(s, _)| *s) == Some(seq) {
            self.in_flight.remove(&key);
        }

        let Some(result) = result else {
            trace!(?key, seq, "aborted refresh settled");
            return None;
        };

        if !self.ledger.accept(&key, seq, exclusive) {
            trace!(?key, seq, "discarding stale refresh result");
            return None;
        }

        debug!(?key, seq, ok = result.is_ok(), "refresh delivered");
        Some(Outcome { key, seq, result })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use anyhow::anyhow;
    use tokio::time::sleep;

    fn coordinator() -> RefreshCoordinator<&'static str, u32> {
        RefreshCoordinator::new(Handle::current())
    }

    #[tokio::test]
    async fn test_success_is_delivered() {
        let mut c = coordinator();
        let ticket = c.trigger("health", true, async { Ok(7) });

        let outcome = c.recv().await.unwrap();
        assert_eq!(outcome.key, "health");
        assert_eq!(outcome.seq, ticket.seq);
        assert_eq!(outcome.result, Ok(7));
        assert!(c.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_failure_is_captured() {
        let mut c = coordinator();
        c.trigger("health", true, async { Err(anyhow!("auth expired")) });

        let outcome = c.recv().await.unwrap();
        assert_eq!(outcome.result, Err("auth expired".to_string()));
    }

    #[tokio::test]
    async fn test_panic_is_captured() {
        let mut c = coordinator();
        c.trigger("health", true, async {
            if true {
                panic!("probe exploded");
            }
            Ok(1)
        });

        let outcome = c.recv().await.unwrap();
        assert!(outcome.result.unwrap_err().contains("refresh task failed"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_newest_exclusive_request_wins() {
        let mut c = coordinator();
        c.trigger("health", true, async {
            sleep(Duration::from_millis(10)).await;
            Ok(1)
        });
        c.trigger("health", true, async {
            sleep(Duration::from_millis(500)).await;
            Ok(2)
        });
        let third = c.trigger("health", true, async {
            sleep(Duration::from_millis(50)).await;
            Ok(3)
        });

        let outcome = c.recv().await.unwrap();
        assert_eq!(outcome.seq, third.seq);
        assert_eq!(outcome.result, Ok(3));

        assert!(c.recv().await.is_none());
        assert!(!c.is_pending(&"health"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_superseded_failure_is_dropped() {
        let mut c = coordinator();
        c.trigger("clusters", true, async {
            sleep(Duration::from_millis(10)).await;
            Err(anyhow!("timeout"))
        });
        c.trigger("clusters", true, async { Ok(5) });

        let outcome = c.recv().await.unwrap();
        assert_eq!(outcome.result, Ok(5));
        assert!(c.recv().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_non_exclusive_requests_all_deliver() {
        let mut c = coordinator();
        c.trigger("action", false, async {
            sleep(Duration::from_millis(20)).await;
            Ok(1)
        });
        c.trigger("action", false, async { Ok(2) });

        let first = c.recv().await.unwrap();
        let second = c.recv().await.unwrap();
        assert_eq!(first.result, Ok(2));
        assert_eq!(second.result, Ok(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_keys_do_not_supersede_each_other() {
        let mut c = coordinator();
        c.trigger("health", true, async {
            sleep(Duration::from_millis(20)).await;
            Ok(1)
        });
        c.trigger("clusters", true, async { Ok(2) });

        let mut keys = vec![c.recv().await.unwrap().key, c.recv().await.unwrap().key];
        keys.sort();
        assert_eq!(keys, vec!["clusters", "health"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_pending_tracking_and_drain() {
        let mut c = coordinator();
        assert!(!c.is_pending(&"health"));
        assert!(c.drain().is_empty());

        c.trigger("health", true, async {
            sleep(Duration::from_millis(30)).await;
            Ok(9)
        });
        assert!(c.is_pending(&"health"));
        assert!(c.drain().is_empty());

        sleep(Duration::from_millis(40)).await;
        // Let the delivery task run.
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }

        let outcomes = c.drain();
        assert_eq!(outcomes.len(), 1);
        assert_eq!(outcomes[0].result, Ok(9));
        assert!(!c.is_pending(&"health"));
    }
}

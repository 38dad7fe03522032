//! Fan-out of encoded server messages to every connected client.

use std::sync::Arc;
use tokio::sync::broadcast;

/// Cloneable publisher over a bounded broadcast channel.
///
/// Publishing never waits on subscribers. A subscriber that falls more than
/// the channel capacity behind skips the oldest messages and is told how
/// many it lost.
#[derive(Debug, Clone)]
pub struct Broadcaster {
    tx: broadcast::Sender<Arc<str>>,
}

impl Broadcaster {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Send to every current subscriber. Returns how many received it.
    pub fn publish(&self, message: Arc<str>) -> usize {
        // An error only means nobody is listening.
        self.tx.send(message).unwrap_or(0)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Arc<str>> {
        self.tx.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::broadcast::error::RecvError;

    #[tokio::test]
    async fn publish_without_subscribers_is_harmless() {
        let b = Broadcaster::new(4);
        assert_eq!(b.publish("x".into()), 0);
    }

    #[tokio::test]
    async fn slow_subscriber_lags_without_blocking_others() {
        let b = Broadcaster::new(2);
        let mut slow = b.subscribe();
        let mut fast = b.subscribe();

        for i in 0..5 {
            assert_eq!(b.publish(Arc::from(i.to_string())), 2);
            assert_eq!(fast.recv().await.unwrap().as_ref(), i.to_string());
        }

        assert!(matches!(slow.recv().await, Err(RecvError::Lagged(3))));
        assert_eq!(slow.recv().await.unwrap().as_ref(), "3");
        assert_eq!(slow.recv().await.unwrap().as_ref(), "4");
    }
}

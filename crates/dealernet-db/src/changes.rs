//! # Change Feed
//!
//! Every committed document write is announced on a broadcast channel.
//!
//! ```text
//! DocumentStore::commit ──► ChangeFeed::publish ──┬──► recompute subscriber
//!                                                 └──► (any other listener)
//! ```
//!
//! Subscribers decide which collections they care about; see
//! [`Collection::triggers_recompute`].

use tokio::sync::broadcast;
use tracing::trace;

use crate::document::Collection;

/// Buffered changes per subscriber before it starts lagging.
pub const DEFAULT_FEED_CAPACITY: usize = 1024;

/// One written document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionChange {
    pub collection: Collection,
    pub document_id: String,
}

/// Fan-out of committed writes.
#[derive(Debug, Clone)]
pub struct ChangeFeed {
    sender: broadcast::Sender<CollectionChange>,
}

impl ChangeFeed {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        ChangeFeed { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<CollectionChange> {
        self.sender.subscribe()
    }

    /// Announces a change. Having no subscribers is not an error.
    pub fn publish(&self, change: CollectionChange) {
        trace!(collection = %change.collection, id = %change.document_id, "Publishing change");
        let _ = self.sender.send(change);
    }
}

impl Default for ChangeFeed {
    fn default() -> Self {
        ChangeFeed::new(DEFAULT_FEED_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_publish_reaches_subscribers() {
        let feed = ChangeFeed::default();
        let mut rx = feed.subscribe();

        feed.publish(CollectionChange {
            collection: Collection::Sales,
            document_id: "s-1".to_string(),
        });

        let change = rx.recv().await.unwrap();
        assert_eq!(change.collection, Collection::Sales);
        assert_eq!(change.document_id, "s-1");
    }

    #[test]
    fn test_publish_without_subscribers() {
        ChangeFeed::new(4).publish(CollectionChange {
            collection: Collection::Goals,
            document_id: "g".to_string(),
        });
    }
}

use tokio::sync::broadcast;

use crate::models::notification::Notice;

/// Capacity of the notice channel. Slow subscribers skip the oldest
/// notices rather than blocking publishers.
const CHANNEL_CAPACITY: usize = 64;

/// Fan-out of transient notices to whoever is listening (e.g. the SSE
/// stream behind the console's toast area).
#[derive(Clone)]
pub struct Notifier {
    tx: broadcast::Sender<Notice>,
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new()
    }
}

impl Notifier {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { tx }
    }

    /// Publish a notice. Having no subscriber is not an error.
    pub fn publish(&self, notice: Notice) {
        tracing::debug!(title = %notice.title, level = ?notice.level, "notice");
        if self.tx.send(notice).is_err() {
            tracing::trace!("no notice subscribers");
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notice> {
        self.tx.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::notification::NoticeLevel;

    #[tokio::test]
    async fn test_subscribers_receive_in_order() {
        let notifier = Notifier::new();
        let mut rx = notifier.subscribe();
        notifier.publish(Notice::service_created("Orders"));
        notifier.publish(Notice::rejected("Create service", "name too short"));

        let first = rx.recv().await.unwrap();
        assert_eq!(first.title, "Service created");
        assert_eq!(first.description, "Orders has been created successfully.");
        let second = rx.recv().await.unwrap();
        assert_eq!(second.level, NoticeLevel::Failure);
        assert_eq!(second.title, "Create service failed");
    }

    #[test]
    fn test_publish_without_subscribers_is_fine() {
        let notifier = Notifier::new();
        assert_eq!(notifier.subscriber_count(), 0);
        notifier.publish(Notice::role_deleted("Viewer"));
    }
}

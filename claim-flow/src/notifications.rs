use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::{
    error::Result,
    model::{AppNotification, IdGenerator, NewNotification},
    storage::NotificationRepository,
};

/// How many notifications are kept; older ones are dropped on insert.
pub const NOTIFICATION_CAP: usize = 20;

/// User-facing event feed, newest first and capped at [`NOTIFICATION_CAP`]
#[derive(Clone)]
pub struct NotificationCenter {
    repository: Arc<dyn NotificationRepository>,
    ids: Arc<IdGenerator>,
}

impl NotificationCenter {
    pub fn new(repository: Arc<dyn NotificationRepository>) -> Self {
        Self {
            repository,
            ids: Arc::new(IdGenerator::new()),
        }
    }

    pub async fn add(&self, notification: NewNotification) -> Result<AppNotification> {
        let notification = AppNotification {
            id: self.ids.notification_id(),
            title: notification.title,
            message: notification.message,
            kind: notification.kind,
            timestamp: Utc::now(),
            read: false,
            claim_id: notification.claim_id,
        };
        self.repository.prepend(notification.clone()).await?;
        self.repository.retain_latest(NOTIFICATION_CAP).await?;

        debug!(
            notification_id = %notification.id,
            kind = ?notification.kind,
            claim_id = ?notification.claim_id,
            title = %notification.title,
            "Notification recorded"
        );
        Ok(notification)
    }

    /// Record a notification as a side effect; storage failures are logged, not returned.
    pub async fn record(&self, notification: NewNotification) {
        let title = notification.title.clone();
        if let Err(e) = self.add(notification).await {
            warn!(title = %title, error = %e, "Failed to record notification");
        }
    }

    pub async fn list(&self) -> Result<Vec<AppNotification>> {
        self.repository.list().await
    }

    pub async fn mark_read(&self, id: &str) -> Result<bool> {
        self.repository.mark_read(id).await
    }

    pub async fn clear(&self) -> Result<()> {
        self.repository.clear().await
    }

    pub async fn unread_count(&self) -> Result<usize> {
        Ok(self.list().await?.iter().filter(|n| !n.read).count())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::NotificationKind;
    use crate::storage::InMemoryNotificationRepository;

    fn center() -> NotificationCenter {
        NotificationCenter::new(Arc::new(InMemoryNotificationRepository::new()))
    }

    #[tokio::test]
    async fn never_exceeds_cap_and_keeps_newest() {
        let center = center();
        for i in 0..(NOTIFICATION_CAP + 7) {
            center
                .add(NewNotification::info(format!("n{i}"), "msg"))
                .await
                .unwrap();
            assert!(center.list().await.unwrap().len() <= NOTIFICATION_CAP);
        }

        let list = center.list().await.unwrap();
        assert_eq!(list.len(), NOTIFICATION_CAP);
        assert_eq!(list[0].title, format!("n{}", NOTIFICATION_CAP + 6));
        assert_eq!(list[NOTIFICATION_CAP - 1].title, "n7");
    }

    #[tokio::test]
    async fn clear_then_add_leaves_one() {
        let center = center();
        center.add(NewNotification::info("a", "a")).await.unwrap();
        center.add(NewNotification::info("b", "b")).await.unwrap();
        center.clear().await.unwrap();
        center.add(NewNotification::error("c", "c")).await.unwrap();

        let list = center.list().await.unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].kind, NotificationKind::Error);
        assert!(!list[0].read);
    }

    #[tokio::test]
    async fn mark_read_updates_unread_count() {
        let center = center();
        let first = center.add(NewNotification::info("a", "a")).await.unwrap();
        center.add(NewNotification::info("b", "b")).await.unwrap();
        assert_eq!(center.unread_count().await.unwrap(), 2);

        assert!(center.mark_read(&first.id).await.unwrap());
        assert_eq!(center.unread_count().await.unwrap(), 1);
        assert!(!center.mark_read("notif_unknown").await.unwrap());
    }
}

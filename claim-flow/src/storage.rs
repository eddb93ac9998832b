use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::{
    error::Result,
    model::{AppNotification, Claim},
};

/// Persistence for claim records
#[async_trait]
pub trait ClaimRepository: Send + Sync {
    /// Insert or overwrite a claim by id
    async fn save(&self, claim: &Claim) -> Result<()>;
    async fn find_by_id(&self, id: &str) -> Result<Option<Claim>>;
    /// All claims, newest submission first
    async fn list_ordered_by_date(&self) -> Result<Vec<Claim>>;
}

/// Persistence for notifications, kept newest first
#[async_trait]
pub trait NotificationRepository: Send + Sync {
    async fn prepend(&self, notification: AppNotification) -> Result<()>;
    async fn list(&self) -> Result<Vec<AppNotification>>;
    /// Returns false when no notification has this id
    async fn mark_read(&self, id: &str) -> Result<bool>;
    async fn clear(&self) -> Result<()>;
    /// Drop everything but the `keep` most recent notifications
    async fn retain_latest(&self, keep: usize) -> Result<()>;
}

/// In-memory implementation of ClaimRepository
#[derive(Default)]
pub struct InMemoryClaimRepository {
    claims: Arc<DashMap<String, Claim>>,
}

impl InMemoryClaimRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ClaimRepository for InMemoryClaimRepository {
    async fn save(&self, claim: &Claim) -> Result<()> {
        self.claims.insert(claim.id.clone(), claim.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Claim>> {
        Ok(self.claims.get(id).map(|entry| entry.clone()))
    }

    async fn list_ordered_by_date(&self) -> Result<Vec<Claim>> {
        let mut claims: Vec<Claim> = self.claims.iter().map(|entry| entry.clone()).collect();
        claims.sort_by(|a, b| {
            b.submission_date
                .cmp(&a.submission_date)
                .then_with(|| b.id.cmp(&a.id))
        });
        Ok(claims)
    }
}

/// In-memory implementation of NotificationRepository
#[derive(Default)]
pub struct InMemoryNotificationRepository {
    notifications: RwLock<Vec<AppNotification>>,
}

impl InMemoryNotificationRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl NotificationRepository for InMemoryNotificationRepository {
    async fn prepend(&self, notification: AppNotification) -> Result<()> {
        self.notifications.write().await.insert(0, notification);
        Ok(())
    }

    async fn list(&self) -> Result<Vec<AppNotification>> {
        Ok(self.notifications.read().await.clone())
    }

    async fn mark_read(&self, id: &str) -> Result<bool> {
        let mut notifications = self.notifications.write().await;
        match notifications.iter_mut().find(|n| n.id == id) {
            Some(notification) => {
                notification.read = true;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn clear(&self) -> Result<()> {
        self.notifications.write().await.clear();
        Ok(())
    }

    async fn retain_latest(&self, keep: usize) -> Result<()> {
        self.notifications.write().await.truncate(keep);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ClaimStatus, NewClaim, NotificationKind};
    use chrono::{Duration, Utc};

    fn claim(id: &str, minutes_ago: i64) -> Claim {
        Claim::from_submission(
            id.to_string(),
            NewClaim {
                claimant_name: "Jane Doe".into(),
                policy_number: "POL-12345".into(),
                incident_date: "2024-01-01".into(),
                incident_description: "Burst pipe in the kitchen".into(),
                ..Default::default()
            },
            Utc::now() - Duration::minutes(minutes_ago),
        )
    }

    fn notification(id: &str) -> AppNotification {
        AppNotification {
            id: id.to_string(),
            title: "t".into(),
            message: "m".into(),
            kind: NotificationKind::Info,
            timestamp: Utc::now(),
            read: false,
            claim_id: None,
        }
    }

    #[tokio::test]
    async fn claims_are_listed_newest_first() {
        let repo = InMemoryClaimRepository::new();
        repo.save(&claim("old", 30)).await.unwrap();
        repo.save(&claim("new", 1)).await.unwrap();
        repo.save(&claim("middle", 10)).await.unwrap();

        let ids: Vec<String> = repo
            .list_ordered_by_date()
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.id)
            .collect();
        assert_eq!(ids, vec!["new", "middle", "old"]);
    }

    #[tokio::test]
    async fn save_overwrites_by_id() {
        let repo = InMemoryClaimRepository::new();
        let mut c = claim("clm_1", 0);
        repo.save(&c).await.unwrap();
        c.status = ClaimStatus::Approved;
        repo.save(&c).await.unwrap();

        let stored = repo.find_by_id("clm_1").await.unwrap().unwrap();
        assert_eq!(stored.status, ClaimStatus::Approved);
        assert_eq!(repo.list_ordered_by_date().await.unwrap().len(), 1);
        assert!(repo.find_by_id("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn notifications_prepend_mark_and_trim() {
        let repo = InMemoryNotificationRepository::new();
        for i in 0..4 {
            repo.prepend(notification(&format!("n{i}"))).await.unwrap();
        }
        assert!(repo.mark_read("n1").await.unwrap());
        assert!(!repo.mark_read("nope").await.unwrap());

        repo.retain_latest(2).await.unwrap();
        let list = repo.list().await.unwrap();
        let ids: Vec<&str> = list.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["n3", "n2"]);

        repo.clear().await.unwrap();
        assert!(repo.list().await.unwrap().is_empty());
    }
}

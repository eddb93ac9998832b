pub mod ai;
pub mod context;
pub mod dashboard;
pub mod demo;
pub mod error;
pub mod graph;
pub mod manager;
pub mod media;
pub mod model;
pub mod notifications;
pub mod storage;
pub mod storage_postgres;
pub mod task;
pub mod tasks;
pub mod validation;
pub mod workflow;

// Re-export commonly used types
pub use ai::{AiError, AiFlows, OpenRouterFlows, ScriptedAiFlows};
pub use context::Context;
pub use dashboard::{AdminReport, DashboardSummary, RiskBand};
pub use error::{FlowError, Result};
pub use graph::{ExecutionSummary, Graph, GraphBuilder};
pub use manager::ClaimManager;
pub use model::{AppNotification, Claim, ClaimStatus, NewClaim, NewNotification};
pub use notifications::{NOTIFICATION_CAP, NotificationCenter};
pub use storage::{
    ClaimRepository, InMemoryClaimRepository, InMemoryNotificationRepository,
    NotificationRepository,
};
pub use storage_postgres::{PostgresClaimRepository, PostgresNotificationRepository};
pub use task::{NextAction, Task, TaskResult};
pub use validation::ValidationErrors;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn manager(ai: ScriptedAiFlows) -> ClaimManager {
        ClaimManager::new(
            Arc::new(InMemoryClaimRepository::new()),
            Arc::new(InMemoryNotificationRepository::new()),
            Arc::new(ai),
        )
    }

    #[tokio::test]
    async fn test_submit_then_review_claim() {
        let manager = manager(ScriptedAiFlows::new());
        manager.seed(demo::demo_claims()).await.unwrap();

        let form = NewClaim {
            claimant_name: "Jane Doe".to_string(),
            policy_number: "POL-12345".to_string(),
            incident_date: "2024-01-01".to_string(),
            incident_description: "Hail damaged the roof".to_string(),
            ..Default::default()
        };
        form.validate().unwrap();

        let claim = manager.submit_claim(form).await.unwrap();
        assert_eq!(claim.status, ClaimStatus::Pending);

        let claims = manager.list_claims().await.unwrap();
        assert_eq!(claims.len(), 3);
        assert_eq!(claims[0].id, claim.id);

        manager
            .update_claim_status(&claim.id, ClaimStatus::Approved, Some("Verified".into()))
            .await
            .unwrap();

        let summary = manager.dashboard_summary().await.unwrap();
        assert_eq!(summary.total_claims, 3);
        assert_eq!(summary.approved_claims, 2);
        assert_eq!(summary.pending_claims, 1);
        assert_eq!(summary.unread_notifications, 3);

        let notifications = manager.list_notifications().await.unwrap();
        manager
            .mark_notification_as_read(&notifications[0].id)
            .await
            .unwrap();
        assert_eq!(manager.unread_notification_count().await.unwrap(), 2);

        manager.clear_notifications().await.unwrap();
        manager
            .add_notification(NewNotification::info("Hello", "World"))
            .await
            .unwrap();
        assert_eq!(manager.list_notifications().await.unwrap().len(), 1);
    }
}

use async_trait::async_trait;
use rand::Rng;
use std::sync::Arc;
use tracing::info;

use super::{pipeline_keys, submission_from};
use crate::{
    context::Context,
    error::Result,
    model::{
        ConsistencyDetail, ConsistencyFinding, ConsistencyReport, ConsistencyStatus, ExtractedInfo,
        NewClaim, NewNotification, short_claim_id,
    },
    notifications::NotificationCenter,
    task::{NextAction, Task, TaskResult},
};

/// Produces a cross-document consistency report for a submitted claim
pub trait ConsistencyChecker: Send + Sync {
    fn check(&self, submission: &NewClaim, extracted: &ExtractedInfo) -> ConsistencyReport;
}

/// Placeholder checker: no documents are actually compared. It flips a coin and
/// fabricates a matching or mismatching value for one randomly chosen field.
pub struct SimulatedConsistencyChecker {
    consistent_probability: f64,
}

impl SimulatedConsistencyChecker {
    pub fn new() -> Self {
        Self::with_probability(0.6)
    }

    pub fn with_probability(consistent_probability: f64) -> Self {
        Self {
            consistent_probability: consistent_probability.clamp(0.0, 1.0),
        }
    }
}

impl Default for SimulatedConsistencyChecker {
    fn default() -> Self {
        Self::new()
    }
}

impl ConsistencyChecker for SimulatedConsistencyChecker {
    fn check(&self, submission: &NewClaim, _extracted: &ExtractedInfo) -> ConsistencyReport {
        let candidates = [
            ("Incident Date", submission.incident_date.as_str()),
            ("Policy Number", submission.policy_number.as_str()),
            ("Claimant Name", submission.claimant_name.as_str()),
        ];

        let mut rng = rand::rng();
        let consistent = rng.random_bool(self.consistent_probability);
        let (field, value_a) = candidates[rng.random_range(0..candidates.len())];
        let document_b = submission
            .document_name
            .clone()
            .unwrap_or_else(|| "Supporting Document".to_string());

        let (value_b, finding, status, summary) = if consistent {
            (
                value_a.to_string(),
                ConsistencyFinding::Match,
                ConsistencyStatus::Consistent,
                format!("{field} matches between the claim form and {document_b}."),
            )
        } else {
            (
                format!("{value_a} (differs)"),
                ConsistencyFinding::Mismatch,
                ConsistencyStatus::Inconsistent,
                format!("{field} does not match between the claim form and {document_b}."),
            )
        };

        ConsistencyReport {
            status,
            summary,
            details: Some(vec![ConsistencyDetail {
                document_a: "Claim Form".to_string(),
                document_b,
                field: field.to_string(),
                value_a: value_a.to_string(),
                value_b,
                finding,
            }]),
        }
    }
}

/// Step three: only reached when extraction and fraud assessment both succeeded.
pub struct ConsistencyCheckTask {
    checker: Arc<dyn ConsistencyChecker>,
    notifications: NotificationCenter,
}

impl ConsistencyCheckTask {
    pub fn new(checker: Arc<dyn ConsistencyChecker>, notifications: NotificationCenter) -> Self {
        Self {
            checker,
            notifications,
        }
    }
}

#[async_trait]
impl Task for ConsistencyCheckTask {
    async fn run(&self, context: Context) -> Result<TaskResult> {
        let (claim_id, submission) = submission_from(&context).await?;
        let extracted: ExtractedInfo = context
            .get(pipeline_keys::EXTRACTED_INFO)
            .await
            .unwrap_or_default();

        let report = self.checker.check(&submission, &extracted);
        info!(
            claim_id = %claim_id,
            task_id = %self.id(),
            status = %report.status,
            "Consistency check complete"
        );

        context.set(pipeline_keys::CONSISTENCY_REPORT, &report).await?;
        self.notifications
            .record(
                NewNotification::info(
                    "Consistency Check Complete",
                    format!(
                        "Consistency check for claim #{}... finished: {}.",
                        short_claim_id(&claim_id),
                        report.status
                    ),
                )
                .for_claim(&claim_id),
            )
            .await;

        Ok(TaskResult::new_with_status(
            NextAction::End,
            format!("Consistency: {}", report.status),
        ))
    }
}

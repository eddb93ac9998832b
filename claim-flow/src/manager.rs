//! Claim/notification state manager.
//!
//! [`ClaimManager`] is the single owner of claim and notification state. It is
//! built once with its repositories and AI flows and shared behind an `Arc`.
//!
//! Failures in the AI steps never abort a submission: the affected field is
//! left empty and an error notification is recorded. Only a failure to persist
//! the assembled claim makes [`ClaimManager::submit_claim`] return `None`.

use chrono::Utc;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::{
    ai::{AiFlows, QaRequest},
    context::Context,
    dashboard::{AdminReport, DashboardSummary},
    error::{FlowError, Result},
    graph::Graph,
    model::{
        AppNotification, Claim, ClaimStatus, ConsistencyReport, ExtractedInfo, FraudAssessment,
        IdGenerator, NewClaim, NewNotification, short_claim_id,
    },
    notifications::NotificationCenter,
    storage::{ClaimRepository, NotificationRepository},
    tasks::{ConsistencyChecker, SimulatedConsistencyChecker, pipeline_keys},
    workflow::build_submission_pipeline,
};

pub const EMPTY_QUESTION_ANSWER: &str = "Please type a question.";
pub const NO_DOCUMENT_ANSWER: &str = "This claim does not have a document to ask questions about.";

pub struct ClaimManager {
    claims: Arc<dyn ClaimRepository>,
    notifications: NotificationCenter,
    ai: Arc<dyn AiFlows>,
    pipeline: Graph,
    ids: IdGenerator,
}

impl ClaimManager {
    pub fn new(
        claims: Arc<dyn ClaimRepository>,
        notifications: Arc<dyn NotificationRepository>,
        ai: Arc<dyn AiFlows>,
    ) -> Self {
        Self::with_consistency_checker(
            claims,
            notifications,
            ai,
            Arc::new(SimulatedConsistencyChecker::new()),
        )
    }

    pub fn with_consistency_checker(
        claims: Arc<dyn ClaimRepository>,
        notifications: Arc<dyn NotificationRepository>,
        ai: Arc<dyn AiFlows>,
        checker: Arc<dyn ConsistencyChecker>,
    ) -> Self {
        let notifications = NotificationCenter::new(notifications);
        let pipeline = build_submission_pipeline(ai.clone(), checker, notifications.clone());
        Self {
            claims,
            notifications,
            ai,
            pipeline,
            ids: IdGenerator::new(),
        }
    }

    /// Run the AI pipeline for a new claim and persist the result.
    ///
    /// Returns `None` (after recording an error notification) when the claim
    /// could not be assembled or stored.
    pub async fn submit_claim(&self, submission: NewClaim) -> Option<Claim> {
        let claim_id = self.ids.claim_id();
        info!(claim_id = %claim_id, claimant = %submission.claimant_name, "Submitting claim");

        match self.try_submit(claim_id.clone(), submission).await {
            Ok(claim) => {
                self.notifications
                    .record(
                        NewNotification::success(
                            "Claim Submitted",
                            format!(
                                "New claim #{}... by {} received.",
                                short_claim_id(&claim.id),
                                claim.claimant_name
                            ),
                        )
                        .for_claim(&claim.id),
                    )
                    .await;
                info!(claim_id = %claim.id, "Claim submitted");
                Some(claim)
            }
            Err(e) => {
                error!(claim_id = %claim_id, error = %e, "Claim submission failed");
                self.notifications
                    .record(NewNotification::error(
                        "Claim Submission Failed",
                        "There was an error submitting the claim.",
                    ))
                    .await;
                None
            }
        }
    }

    async fn try_submit(&self, claim_id: String, submission: NewClaim) -> Result<Claim> {
        let submitted_at = Utc::now();

        let context = Context::new();
        context.set(pipeline_keys::CLAIM_ID, &claim_id).await?;
        context.set(pipeline_keys::SUBMISSION, &submission).await?;

        let summary = self.pipeline.execute(context.clone()).await?;
        for step in &summary.steps {
            info!(
                claim_id = %claim_id,
                task_id = %step.task_id,
                status = ?step.status_message,
                "Pipeline step finished"
            );
        }

        let mut claim = Claim::from_submission(claim_id, submission, submitted_at);
        claim.extracted_info = context
            .get::<ExtractedInfo>(pipeline_keys::EXTRACTED_INFO)
            .await;
        claim.fraud_assessment = context
            .get::<FraudAssessment>(pipeline_keys::FRAUD_ASSESSMENT)
            .await;
        claim.consistency_report = context
            .get::<ConsistencyReport>(pipeline_keys::CONSISTENCY_REPORT)
            .await;

        self.claims.save(&claim).await?;
        self.claims
            .find_by_id(&claim.id)
            .await?
            .ok_or_else(|| FlowError::ClaimNotPersisted(claim.id.clone()))
    }

    /// Overwrite a claim's status (and notes, when non-empty notes are given).
    ///
    /// Any status may follow any other. Concurrent updates are last-write-wins.
    /// Returns `Ok(None)` for an unknown id.
    pub async fn update_claim_status(
        &self,
        claim_id: &str,
        status: ClaimStatus,
        notes: Option<String>,
    ) -> Result<Option<Claim>> {
        let Some(mut claim) = self.claims.find_by_id(claim_id).await? else {
            warn!(claim_id = %claim_id, "Status update for unknown claim");
            return Ok(None);
        };

        let previous = claim.status;
        claim.status = status;
        if let Some(notes) = notes.filter(|n| !n.trim().is_empty()) {
            claim.notes = Some(notes);
        }
        claim.last_updated_date = Utc::now();
        self.claims.save(&claim).await?;
        let stored = self
            .claims
            .find_by_id(claim_id)
            .await?
            .ok_or_else(|| FlowError::ClaimNotPersisted(claim_id.to_string()))?;

        info!(
            claim_id = %claim_id,
            from = %previous,
            to = %status,
            "Claim status updated"
        );
        self.notifications
            .record(
                NewNotification::info(
                    "Claim Updated",
                    format!(
                        "Claim #{}... status changed to {}.",
                        short_claim_id(claim_id),
                        status
                    ),
                )
                .for_claim(claim_id),
            )
            .await;

        Ok(Some(stored))
    }

    pub async fn get_claim_by_id(&self, claim_id: &str) -> Result<Option<Claim>> {
        self.claims.find_by_id(claim_id).await
    }

    /// All claims, newest submission first.
    pub async fn list_claims(&self) -> Result<Vec<Claim>> {
        self.claims.list_ordered_by_date().await
    }

    pub async fn dashboard_summary(&self) -> Result<DashboardSummary> {
        let claims = self.list_claims().await?;
        let unread = self.notifications.unread_count().await?;
        Ok(DashboardSummary::build(&claims, unread))
    }

    pub async fn admin_report(&self) -> Result<AdminReport> {
        Ok(AdminReport::build(&self.list_claims().await?))
    }

    /// Store claims as-is, e.g. demo data loaded at startup.
    pub async fn seed(&self, claims: Vec<Claim>) -> Result<usize> {
        let count = claims.len();
        for claim in &claims {
            self.claims.save(claim).await?;
        }
        info!(count, "Seeded claims");
        Ok(count)
    }

    /// Ask a free-text question about a claim document. Never fails: problems are
    /// turned into a user-facing answer.
    pub async fn ask_question_on_document(
        &self,
        document_uri: Option<&str>,
        question: &str,
        claim_id: Option<&str>,
    ) -> String {
        let question = question.trim();
        if question.is_empty() {
            return EMPTY_QUESTION_ANSWER.to_string();
        }
        let Some(document_uri) = document_uri.filter(|uri| !uri.is_empty()) else {
            return NO_DOCUMENT_ANSWER.to_string();
        };

        info!(claim_id = ?claim_id, "Answering question on document");
        let request = QaRequest {
            document_data_uri: document_uri.to_string(),
            question: question.to_string(),
        };

        match self.ai.qa_on_document(request).await {
            Ok(response) => response.answer,
            Err(e) => {
                error!(claim_id = ?claim_id, error = %e, "Document Q&A failed");
                let mut notification = NewNotification::error(
                    "Question Failed",
                    "The AI could not answer a question about the document.",
                );
                notification.claim_id = claim_id.map(str::to_string);
                self.notifications.record(notification).await;
                format!("Sorry, the question could not be answered right now: {e}")
            }
        }
    }

    pub async fn add_notification(&self, notification: NewNotification) -> Result<AppNotification> {
        self.notifications.add(notification).await
    }

    pub async fn list_notifications(&self) -> Result<Vec<AppNotification>> {
        self.notifications.list().await
    }

    pub async fn mark_notification_as_read(&self, notification_id: &str) -> Result<bool> {
        self.notifications.mark_read(notification_id).await
    }

    pub async fn clear_notifications(&self) -> Result<()> {
        self.notifications.clear().await
    }

    pub async fn unread_notification_count(&self) -> Result<usize> {
        self.notifications.unread_count().await
    }
}

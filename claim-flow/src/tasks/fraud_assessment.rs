use async_trait::async_trait;
use std::sync::Arc;
use tracing::{error, info};

use super::{pipeline_keys, submission_from};
use crate::{
    ai::{AiFlows, FraudAssessmentRequest},
    context::Context,
    error::Result,
    model::{ExtractedInfo, NewClaim, NewNotification},
    notifications::NotificationCenter,
    task::{NextAction, Task, TaskResult},
};

/// Narrative handed to the fraud flow: the claim's descriptive fields plus the
/// JSON of whatever extraction produced.
pub fn build_claim_narrative(submission: &NewClaim, extracted: Option<&ExtractedInfo>) -> String {
    let extracted_json = extracted
        .and_then(|info| serde_json::to_string(info).ok())
        .unwrap_or_else(|| "{}".to_string());
    format!(
        "{} - {}. Policy: {}. Incident Date: {}. Extracted Info: {}",
        submission.claimant_name,
        submission.incident_description,
        submission.policy_number,
        submission.incident_date,
        extracted_json
    )
}

/// Step two: score the claim's fraud risk from its narrative and media.
pub struct FraudAssessmentTask {
    ai: Arc<dyn AiFlows>,
    notifications: NotificationCenter,
}

impl FraudAssessmentTask {
    pub fn new(ai: Arc<dyn AiFlows>, notifications: NotificationCenter) -> Self {
        Self { ai, notifications }
    }
}

#[async_trait]
impl Task for FraudAssessmentTask {
    async fn run(&self, context: Context) -> Result<TaskResult> {
        let (claim_id, submission) = submission_from(&context).await?;
        let extracted: Option<ExtractedInfo> = context.get(pipeline_keys::EXTRACTED_INFO).await;

        info!(claim_id = %claim_id, task_id = %self.id(), "Starting fraud assessment");

        let request = FraudAssessmentRequest {
            claim_details: build_claim_narrative(&submission, extracted.as_ref()),
            supporting_document_uri: submission.document_uri.clone(),
            image_evidence_uris: submission.image_uris.clone(),
            video_evidence_uri: submission.video_uri.clone(),
            claim_history: None,
        };

        let outcome = self
            .ai
            .assess_fraud_risk(request)
            .await
            .map_err(|e| e.to_string())
            .and_then(|mut assessment| {
                if !assessment.risk_score.is_finite() {
                    return Err(format!("risk score is not a number: {}", assessment.risk_score));
                }
                assessment.risk_score = assessment.risk_score.clamp(0.0, 1.0);
                Ok(assessment)
            });

        match outcome {
            Ok(assessment) => {
                info!(
                    claim_id = %claim_id,
                    risk_score = assessment.risk_score,
                    indicator_count = assessment.fraud_indicators.len(),
                    "Fraud assessment complete"
                );
                context.set(pipeline_keys::FRAUD_ASSESSMENT, &assessment).await?;
                self.notifications
                    .record(
                        NewNotification::info(
                            "Fraud Assessment Complete",
                            format!(
                                "Risk score: {:.2} for claim by {}.",
                                assessment.risk_score, submission.claimant_name
                            ),
                        )
                        .for_claim(&claim_id),
                    )
                    .await;
                Ok(TaskResult::new_with_status(
                    NextAction::Continue,
                    format!("Risk score {:.2}", assessment.risk_score),
                ))
            }
            Err(e) => {
                error!(claim_id = %claim_id, error = %e, "Fraud assessment failed");
                self.notifications
                    .record(
                        NewNotification::error(
                            "Fraud Assessment Failed",
                            format!("Could not assess fraud risk for {}.", submission.claimant_name),
                        )
                        .for_claim(&claim_id),
                    )
                    .await;
                Ok(TaskResult::new_with_status(
                    NextAction::Continue,
                    "Fraud assessment failed",
                ))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ExtractedField;

    #[test]
    fn narrative_embeds_fields_and_extraction() {
        let submission = NewClaim {
            claimant_name: "Jane Doe".into(),
            policy_number: "POL-12345".into(),
            incident_date: "2024-01-01".into(),
            incident_description: "Hail damage".into(),
            ..Default::default()
        };
        assert_eq!(
            build_claim_narrative(&submission, None),
            "Jane Doe - Hail damage. Policy: POL-12345. Incident Date: 2024-01-01. Extracted Info: {}"
        );

        let mut info = ExtractedInfo::default();
        info.0.insert("roof".into(), ExtractedField::text("damaged"));
        let narrative = build_claim_narrative(&submission, Some(&info));
        assert!(narrative.ends_with(r#"Extracted Info: {"roof":{"value":"damaged"}}"#));
    }
}

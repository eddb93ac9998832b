// Claim submission pipeline steps
pub mod consistency_check;
pub mod document_extraction;
pub mod fraud_assessment;

pub use consistency_check::{ConsistencyCheckTask, ConsistencyChecker, SimulatedConsistencyChecker};
pub use document_extraction::{DocumentExtractionTask, parse_extracted_info};
pub use fraud_assessment::{FraudAssessmentTask, build_claim_narrative};

use crate::{context::Context, error::FlowError, model::NewClaim};

/// Keys shared between pipeline tasks
pub mod pipeline_keys {
    pub const SUBMISSION: &str = "submission";
    pub const CLAIM_ID: &str = "claim_id";
    pub const EXTRACTED_INFO: &str = "extracted_info";
    pub const EXTRACTION_SUCCEEDED: &str = "extraction_succeeded";
    pub const FRAUD_ASSESSMENT: &str = "fraud_assessment";
    pub const CONSISTENCY_REPORT: &str = "consistency_report";
}

pub(crate) async fn submission_from(context: &Context) -> Result<(String, NewClaim), FlowError> {
    let claim_id: String = context
        .get(pipeline_keys::CLAIM_ID)
        .await
        .ok_or_else(|| FlowError::ContextError("claim_id not found".to_string()))?;
    let submission: NewClaim = context
        .get(pipeline_keys::SUBMISSION)
        .await
        .ok_or_else(|| FlowError::ContextError("submission not found".to_string()))?;
    Ok((claim_id, submission))
}

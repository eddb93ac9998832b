use std::sync::Arc;

use crate::{
    ai::AiFlows,
    graph::{Graph, GraphBuilder},
    model::ExtractedInfo,
    notifications::NotificationCenter,
    task::Task,
    tasks::{
        ConsistencyCheckTask, ConsistencyChecker, DocumentExtractionTask, FraudAssessmentTask,
        pipeline_keys,
    },
};

/// Extraction → fraud assessment → (consistency check, when both succeeded).
pub fn build_submission_pipeline(
    ai: Arc<dyn AiFlows>,
    checker: Arc<dyn ConsistencyChecker>,
    notifications: NotificationCenter,
) -> Graph {
    let extraction_task = Arc::new(DocumentExtractionTask::new(ai.clone(), notifications.clone()));
    let extraction_id = extraction_task.id().to_string();

    let fraud_task = Arc::new(FraudAssessmentTask::new(ai, notifications.clone()));
    let fraud_id = fraud_task.id().to_string();

    let consistency_task = Arc::new(ConsistencyCheckTask::new(checker, notifications));
    let consistency_id = consistency_task.id().to_string();

    GraphBuilder::new("claim_submission")
        .add_task(extraction_task)
        .add_task(fraud_task)
        .add_task(consistency_task)
        .add_edge(&extraction_id, &fraud_id)
        .add_conditional_edge(&fraud_id, &consistency_id, |context| {
            let extracted = context
                .get_sync::<bool>(pipeline_keys::EXTRACTION_SUCCEEDED)
                .unwrap_or(false)
                && context
                    .get_sync::<ExtractedInfo>(pipeline_keys::EXTRACTED_INFO)
                    .is_some_and(|info| !info.is_parsing_error());
            extracted && context.contains(pipeline_keys::FRAUD_ASSESSMENT)
        })
        .build()
}

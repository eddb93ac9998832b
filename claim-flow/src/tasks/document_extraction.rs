use async_trait::async_trait;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{error, info, warn};

use super::{pipeline_keys, submission_from};
use crate::{
    ai::{AiFlows, ExtractDocumentRequest, strip_code_fence},
    context::Context,
    error::Result,
    media::{DocumentType, is_attachable},
    model::{ExtractedField, ExtractedInfo, NewNotification},
    notifications::NotificationCenter,
    task::{NextAction, Task, TaskResult},
};

/// Parse the extraction flow's JSON text into field entries.
///
/// Values may be bare (`"policyNumber": "123"`) or carry a bounding box
/// (`"policyNumber": {"value": "123", "boundingBox": {...}}`).
pub fn parse_extracted_info(json: &str) -> std::result::Result<ExtractedInfo, String> {
    let value: Value = serde_json::from_str(strip_code_fence(json)).map_err(|e| e.to_string())?;
    let Value::Object(entries) = value else {
        return Err("extracted information is not a JSON object".to_string());
    };

    let fields = entries
        .into_iter()
        .map(|(key, value)| {
            let field = match &value {
                Value::Object(map) if map.contains_key("value") => {
                    serde_json::from_value::<ExtractedField>(value.clone()).unwrap_or(ExtractedField {
                        value,
                        bounding_box: None,
                    })
                }
                _ => ExtractedField {
                    value,
                    bounding_box: None,
                },
            };
            (key, field)
        })
        .collect::<BTreeMap<_, _>>();

    Ok(ExtractedInfo(fields))
}

/// Step one: pull structured fields out of the attached document.
pub struct DocumentExtractionTask {
    ai: Arc<dyn AiFlows>,
    notifications: NotificationCenter,
}

impl DocumentExtractionTask {
    pub fn new(ai: Arc<dyn AiFlows>, notifications: NotificationCenter) -> Self {
        Self { ai, notifications }
    }
}

#[async_trait]
impl Task for DocumentExtractionTask {
    async fn run(&self, context: Context) -> Result<TaskResult> {
        let (claim_id, submission) = submission_from(&context).await?;
        context.set(pipeline_keys::EXTRACTION_SUCCEEDED, false).await?;

        let Some((document_name, document_uri)) = submission.document() else {
            info!(claim_id = %claim_id, task_id = %self.id(), "No document attached, skipping extraction");
            return Ok(TaskResult::new_with_status(
                NextAction::Continue,
                "No document attached",
            ));
        };

        let document_type = DocumentType::infer(document_name);
        let processable = is_attachable(document_uri);

        info!(
            claim_id = %claim_id,
            task_id = %self.id(),
            document_type = %document_type.label(),
            directly_processable = processable,
            "Starting document extraction"
        );

        let request = ExtractDocumentRequest {
            document_data_uri: document_uri.to_string(),
            document_type: document_type.label().to_string(),
            document_name: Some(document_name.to_string()),
            is_directly_processable_media: Some(processable),
        };

        let response = match self.ai.extract_document_information(request).await {
            Ok(response) => response,
            Err(e) => {
                error!(claim_id = %claim_id, error = %e, "Document extraction failed");
                self.notifications
                    .record(
                        NewNotification::error(
                            "Document Processing Failed",
                            format!("AI could not extract info from {document_name}."),
                        )
                        .for_claim(&claim_id),
                    )
                    .await;
                return Ok(TaskResult::new_with_status(
                    NextAction::Continue,
                    "Document extraction failed",
                ));
            }
        };

        if response.extracted_fields_json.trim().is_empty() {
            warn!(claim_id = %claim_id, "Extraction returned no information");
            return Ok(TaskResult::new_with_status(
                NextAction::Continue,
                "Document extraction returned nothing",
            ));
        }

        match parse_extracted_info(&response.extracted_fields_json) {
            Ok(info) => {
                info!(claim_id = %claim_id, field_count = info.len(), "Document information extracted");
                context.set(pipeline_keys::EXTRACTED_INFO, &info).await?;
                context.set(pipeline_keys::EXTRACTION_SUCCEEDED, true).await?;
                self.notifications
                    .record(
                        NewNotification::success(
                            "Document Processed",
                            format!("Info extracted from {document_name}."),
                        )
                        .for_claim(&claim_id),
                    )
                    .await;
                Ok(TaskResult::new_with_status(
                    NextAction::Continue,
                    format!("Extracted {} fields", info.len()),
                ))
            }
            Err(parse_error) => {
                warn!(claim_id = %claim_id, error = %parse_error, "Failed to parse extracted information");
                context
                    .set(
                        pipeline_keys::EXTRACTED_INFO,
                        ExtractedInfo::parsing_error(
                            "Failed to parse AI response for extracted information.",
                        ),
                    )
                    .await?;
                self.notifications
                    .record(
                        NewNotification::error(
                            "Document Parsing Error",
                            format!("Could not parse extracted info for {document_name}. Invalid JSON."),
                        )
                        .for_claim(&claim_id),
                    )
                    .await;
                Ok(TaskResult::new_with_status(
                    NextAction::Continue,
                    "Extracted information was not valid JSON",
                ))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_bare_and_boxed_values() {
        let info = parse_extracted_info(
            r#"{
                "policyNumber": "POL-1",
                "vehicle": {"make": "Toyota", "model": "Camry"},
                "claimantName": {"value": "Jane Doe", "boundingBox": {"x": 0.1, "y": 0.2, "width": 0.3, "height": 0.05, "page": 1}}
            }"#,
        )
        .unwrap();

        assert_eq!(info.len(), 3);
        assert_eq!(info.get("policyNumber").unwrap().value, json!("POL-1"));
        assert_eq!(info.get("vehicle").unwrap().value["make"], "Toyota");
        let boxed = info.get("claimantName").unwrap();
        assert_eq!(boxed.value, json!("Jane Doe"));
        assert_eq!(boxed.bounding_box.as_ref().unwrap().page, 1);
    }

    #[test]
    fn rejects_invalid_json_and_non_objects() {
        assert!(parse_extracted_info("{not json").is_err());
        assert!(parse_extracted_info("[1, 2]").is_err());
        assert!(parse_extracted_info("```json\n{\"a\": \"b\"}\n```").is_ok());
    }
}

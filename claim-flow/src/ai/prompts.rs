use super::{ExtractDocumentRequest, FraudAssessmentRequest};
use crate::media::{is_attachable, mime_type_of};

pub const EXTRACTION_PREAMBLE: &str = r#"You are an expert document processor specializing in extracting information from insurance claim documents.

Extract all relevant information from the document based on its type. Be as comprehensive as possible.

Respond with ONLY this JSON (no explanation, no additional text):
{
  "extractedInformation": "<a JSON string encoding a key-value object>"
}

Each key of the encoded object is a field name. Each value is either a plain string or an object:
{ "value": "<string or nested object>", "boundingBox": { "x": 0.1, "y": 0.2, "width": 0.3, "height": 0.05, "page": 1 } }
Coordinates are normalized to 0-1 and pages are 1-indexed. Omit boundingBox when the location is unknown.

Example value for "extractedInformation":
"{\"policyNumber\": \"1234567890\", \"claimantName\": \"John Doe\", \"dateOfAccident\": \"2024-01-01\"}"
"#;

pub const FRAUD_PREAMBLE: &str = r#"You are an expert fraud analyst specializing in insurance claims.

Analyze the provided claim details, supporting document, image evidence, video evidence, and claim history to assess the risk of fraud.
Provide a risk score between 0 and 1, where 1 indicates the highest risk.
Highlight any specific fraud indicators or suspicious patterns.
If image or video evidence is provided and it influences your assessment, briefly mention what you observed in the media.

Respond with ONLY this JSON (no explanation, no additional text):
{
  "riskScore": 0.25,
  "fraudIndicators": ["indicator one", "indicator two"],
  "summary": "summary of the assessment"
}
"#;

pub const QA_PREAMBLE: &str = r#"You are a helpful AI assistant. Answer the user's question based *solely* on the content of the provided document.
Do not use any external knowledge. If the answer cannot be found within the document, clearly state that the information is not present in the document.

Respond with ONLY this JSON (no explanation, no additional text):
{
  "answer": "your answer"
}
"#;

pub fn extraction_prompt(request: &ExtractDocumentRequest) -> String {
    let mut prompt = format!(
        "{EXTRACTION_PREAMBLE}\nDocument Type: {}\n",
        request.document_type
    );
    if let Some(name) = &request.document_name {
        prompt.push_str(&format!("Document Name: {name}\n"));
    }
    if request.is_directly_processable_media == Some(false) {
        prompt.push_str(
            "The document content could not be attached as media. Extract what can be inferred from its name and type, and return an empty object if nothing can be extracted.\n",
        );
    } else {
        prompt.push_str("Document: (attached)\n");
    }
    prompt
}

/// How one piece of evidence is described to the model.
fn evidence_line(uri: Option<&str>) -> String {
    match uri {
        None => "None".to_string(),
        Some(uri) if is_attachable(uri) => "(attached)".to_string(),
        Some(uri) => format!(
            "provided as {}, not attached; its content is unavailable",
            mime_type_of(uri).unwrap_or("unknown media")
        ),
    }
}

pub fn fraud_prompt(request: &FraudAssessmentRequest) -> String {
    let images = request.image_evidence_uris.as_deref().unwrap_or_default();
    let attached = images.iter().filter(|uri| is_attachable(uri)).count();
    let images_line = match (attached, images.len() - attached) {
        (0, 0) => "None".to_string(),
        (attached, 0) => format!("{attached} image(s) attached"),
        (attached, withheld) => {
            format!("{attached} image(s) attached, {withheld} could not be attached")
        }
    };
    format!(
        "Claim Details: {}\nSupporting Document: {}\nImage Evidence: {}\nVideo Evidence: {}\nClaim History: {}",
        request.claim_details,
        evidence_line(request.supporting_document_uri.as_deref()),
        images_line,
        evidence_line(request.video_evidence_uri.as_deref()),
        request.claim_history.as_deref().unwrap_or("None"),
    )
}

pub fn qa_prompt(question: &str) -> String {
    format!(
        "{QA_PREAMBLE}\nDocument: (attached)\n\nUser's Question:\n\"{question}\"\n\nBased *only* on the document provided, what is the answer?"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extraction_prompt_mentions_unprocessable_media() {
        let prompt = extraction_prompt(&ExtractDocumentRequest {
            document_data_uri: "data:application/zip;base64,AA==".into(),
            document_type: "ZIP Archive".into(),
            document_name: Some("bundle.zip".into()),
            is_directly_processable_media: Some(false),
        });
        assert!(prompt.contains("Document Type: ZIP Archive"));
        assert!(prompt.contains("Document Name: bundle.zip"));
        assert!(prompt.contains("could not be attached"));
    }

    #[test]
    fn fraud_prompt_lists_evidence() {
        let prompt = fraud_prompt(&FraudAssessmentRequest {
            claim_details: "Jane Doe - hail".into(),
            image_evidence_uris: Some(vec![
                "data:image/png;base64,AA==".into(),
                "https://placehold.co/600x400.png".into(),
            ]),
            ..Default::default()
        });
        assert!(prompt.contains("Claim Details: Jane Doe - hail"));
        assert!(prompt.contains("2 image(s) attached"));
        assert!(prompt.contains("Video Evidence: None"));
        assert!(prompt.contains("Claim History: None"));
    }

    #[test]
    fn fraud_prompt_names_media_that_cannot_be_attached() {
        let prompt = fraud_prompt(&FraudAssessmentRequest {
            claim_details: "Jane Doe - hail".into(),
            supporting_document_uri: Some(
                "data:application/vnd.openxmlformats-officedocument.wordprocessingml.document;base64,AA=="
                    .into(),
            ),
            video_evidence_uri: Some("data:video/mp4;base64,AA==".into()),
            ..Default::default()
        });
        assert!(prompt.contains(
            "Supporting Document: provided as application/vnd.openxmlformats-officedocument.wordprocessingml.document, not attached"
        ));
        assert!(prompt.contains("Video Evidence: provided as video/mp4, not attached"));
    }
}

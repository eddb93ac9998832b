//! Request/response contracts for the three generative-AI flows.
//!
//! The reasoning itself lives with the external model; this module only shapes
//! requests and parses replies. [`AiFlows`] is the seam the pipeline depends on.

mod openrouter;
mod prompts;
mod scripted;

use async_trait::async_trait;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use thiserror::Error;

use crate::media::is_attachable;
use crate::model::FraudAssessment;

pub use openrouter::{
    DEFAULT_BASE_URL, DEFAULT_MODEL, OpenRouterFlows, TextTransport, get_llm_agent,
};
pub use scripted::{RecordedCall, ScriptedAiFlows};

#[derive(Debug, Error)]
pub enum AiError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("LLM API request failed with status {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Malformed model reply: {0}")]
    MalformedResponse(String),

    #[error("Agent prompt failed: {0}")]
    Prompt(String),

    #[error("{0}")]
    Unavailable(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractDocumentRequest {
    pub document_data_uri: String,
    pub document_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_directly_processable_media: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractDocumentResponse {
    /// JSON text that should parse into an extracted-field map
    pub extracted_fields_json: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FraudAssessmentRequest {
    pub claim_details: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supporting_document_uri: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_evidence_uris: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_evidence_uri: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub claim_history: Option<String>,
}

impl FraudAssessmentRequest {
    /// Evidence the model can receive inline, paired with the file name to send.
    /// Office documents, archives and video are left out.
    pub fn attachable_media(&self) -> Vec<(&str, Option<&'static str>)> {
        let document = self
            .supporting_document_uri
            .as_deref()
            .map(|uri| (uri, Some("supporting-document")));
        let images = self
            .image_evidence_uris
            .iter()
            .flatten()
            .map(|uri| (uri.as_str(), None));
        let video = self
            .video_evidence_uri
            .as_deref()
            .map(|uri| (uri, Some("video-evidence")));

        document
            .into_iter()
            .chain(images)
            .chain(video)
            .filter(|(uri, _)| is_attachable(uri))
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QaRequest {
    pub document_data_uri: String,
    pub question: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QaResponse {
    pub answer: String,
}

/// The three AI flows. Each call is a single request/response; nothing retries.
#[async_trait]
pub trait AiFlows: Send + Sync {
    async fn extract_document_information(
        &self,
        request: ExtractDocumentRequest,
    ) -> Result<ExtractDocumentResponse, AiError>;

    async fn assess_fraud_risk(
        &self,
        request: FraudAssessmentRequest,
    ) -> Result<FraudAssessment, AiError>;

    async fn qa_on_document(&self, request: QaRequest) -> Result<QaResponse, AiError>;
}

/// Strip a surrounding markdown code fence, if the model added one.
pub fn strip_code_fence(reply: &str) -> &str {
    let trimmed = reply.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let body = rest.split_once('\n').map(|(_, body)| body).unwrap_or(rest);
    body.strip_suffix("```").unwrap_or(body).trim()
}

/// Parse a model reply into a typed output shape.
pub fn parse_json_reply<T: DeserializeOwned>(reply: &str) -> Result<T, AiError> {
    serde_json::from_str(strip_code_fence(reply))
        .map_err(|e| AiError::MalformedResponse(format!("{e}: {}", truncate(reply, 200))))
}

fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}…", &text[..idx]),
        None => text.to_string(),
    }
}

use async_trait::async_trait;
use reqwest::Client;
use rig::{agent::Agent, client::CompletionClient, completion::Prompt, providers::openrouter};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{debug, info};

use super::{
    AiError, AiFlows, ExtractDocumentRequest, ExtractDocumentResponse, FraudAssessmentRequest,
    QaRequest, QaResponse, parse_json_reply, prompts,
};
use crate::media::media_part;
use crate::model::FraudAssessment;

pub const DEFAULT_BASE_URL: &str = "https://openrouter.ai/api/v1";
pub const DEFAULT_MODEL: &str = "openai/gpt-4.1-mini";

const EXTRACTION_MAX_TOKENS: u32 = 4000;
const FRAUD_MAX_TOKENS: u32 = 2000;
const QA_MAX_TOKENS: u32 = 1000;

/// Build a text-only rig agent on OpenRouter with the given preamble.
pub fn get_llm_agent(
    api_key: &str,
    model: &str,
    preamble: &str,
) -> Agent<openrouter::CompletionModel> {
    let client = openrouter::Client::new(api_key);
    client.agent(model).preamble(preamble).build()
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExtractionEnvelope {
    extracted_information: Value,
}

/// How a fraud assessment with nothing to attach reaches the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextTransport {
    /// A rig agent on the OpenRouter provider. It always targets OpenRouter's
    /// own host and sends no `response_format`; replies are parsed leniently.
    Agent,
    /// A JSON-mode chat-completions call against the configured base URL
    ChatCompletions,
}

/// [`AiFlows`] backed by OpenRouter chat completions.
///
/// Flows carrying media send a multimodal request with the attachable
/// attachments inlined as content parts. A fraud assessment with nothing to
/// attach uses the configured [`TextTransport`].
#[derive(Clone)]
pub struct OpenRouterFlows {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    text_transport: TextTransport,
}

impl OpenRouterFlows {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            text_transport: TextTransport::Agent,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Point every request at another OpenAI-compatible endpoint. The rig
    /// provider cannot follow, so text-only calls switch to
    /// [`TextTransport::ChatCompletions`] as well.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self.text_transport = TextTransport::ChatCompletions;
        self
    }

    pub fn with_text_transport(mut self, text_transport: TextTransport) -> Self {
        self.text_transport = text_transport;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn text_transport(&self) -> TextTransport {
        self.text_transport
    }

    /// Send one chat-completion request and return the assistant's text.
    async fn call_openrouter_api(
        &self,
        content: Vec<Value>,
        max_tokens: u32,
    ) -> Result<String, AiError> {
        let payload = json!({
            "model": self.model,
            "messages": [
                {
                    "role": "user",
                    "content": content
                }
            ],
            "max_tokens": max_tokens,
            "response_format": { "type": "json_object" }
        });

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AiError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let response_json: Value = response.json().await?;
        let content = response_json["choices"][0]["message"]["content"]
            .as_str()
            .ok_or_else(|| AiError::MalformedResponse("Invalid response format from LLM".into()))?;

        debug!(reply_length = content.len(), "LLM reply received");
        Ok(content.to_string())
    }
}

#[async_trait]
impl AiFlows for OpenRouterFlows {
    async fn extract_document_information(
        &self,
        request: ExtractDocumentRequest,
    ) -> Result<ExtractDocumentResponse, AiError> {
        info!(
            document_type = %request.document_type,
            document_name = ?request.document_name,
            "Requesting document extraction"
        );

        let mut content = vec![json!({
            "type": "text",
            "text": prompts::extraction_prompt(&request)
        })];
        if request.is_directly_processable_media != Some(false) {
            content.push(media_part(
                &request.document_data_uri,
                request.document_name.as_deref(),
            ));
        }

        let reply = self.call_openrouter_api(content, EXTRACTION_MAX_TOKENS).await?;
        let envelope: ExtractionEnvelope = parse_json_reply(&reply)?;

        let extracted_fields_json = match envelope.extracted_information {
            Value::String(text) => text,
            other @ Value::Object(_) => other.to_string(),
            other => {
                return Err(AiError::MalformedResponse(format!(
                    "extractedInformation must be a string, got {other}"
                )));
            }
        };

        Ok(ExtractDocumentResponse {
            extracted_fields_json,
        })
    }

    async fn assess_fraud_risk(
        &self,
        request: FraudAssessmentRequest,
    ) -> Result<FraudAssessment, AiError> {
        let prompt = prompts::fraud_prompt(&request);

        let media = request.attachable_media();

        let reply = if media.is_empty() && self.text_transport == TextTransport::Agent {
            info!("Requesting text-only fraud assessment");
            let agent = get_llm_agent(&self.api_key, &self.model, prompts::FRAUD_PREAMBLE);
            agent
                .prompt(prompt.as_str())
                .await
                .map_err(|e| AiError::Prompt(e.to_string()))?
        } else {
            info!(attachment_count = media.len(), "Requesting fraud assessment");
            let mut content = vec![json!({
                "type": "text",
                "text": format!("{}\n{}", prompts::FRAUD_PREAMBLE, prompt)
            })];
            content.extend(media.iter().map(|(uri, file_name)| media_part(uri, *file_name)));
            self.call_openrouter_api(content, FRAUD_MAX_TOKENS).await?
        };

        parse_json_reply(&reply)
    }

    async fn qa_on_document(&self, request: QaRequest) -> Result<QaResponse, AiError> {
        info!(question_length = request.question.len(), "Requesting document Q&A");

        let content = vec![
            json!({
                "type": "text",
                "text": prompts::qa_prompt(&request.question)
            }),
            media_part(&request.document_data_uri, Some("document")),
        ];

        let reply = self.call_openrouter_api(content, QA_MAX_TOKENS).await?;
        parse_json_reply(&reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Json, Router, http::StatusCode, routing::post};
    use std::sync::{Arc, Mutex};

    /// Serve a fake `/chat/completions` that always answers with `reply`, and
    /// keep the last request body.
    async fn fake_endpoint(reply: &'static str, status: StatusCode) -> (String, Arc<Mutex<Value>>) {
        let seen = Arc::new(Mutex::new(Value::Null));
        let seen_in_handler = seen.clone();
        let app = Router::new().route(
            "/chat/completions",
            post(move |Json(body): Json<Value>| {
                let seen = seen_in_handler.clone();
                async move {
                    *seen.lock().unwrap() = body;
                    (
                        status,
                        Json(json!({ "choices": [ { "message": { "content": reply } } ] })),
                    )
                }
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (format!("http://{addr}"), seen)
    }

    #[tokio::test]
    async fn extraction_sends_document_and_unwraps_envelope() {
        let (base_url, seen) = fake_endpoint(
            r#"{"extractedInformation": "{\"policyNumber\": \"POL-1\"}"}"#,
            StatusCode::OK,
        )
        .await;
        let flows = OpenRouterFlows::new("test-key").with_base_url(base_url);

        let response = flows
            .extract_document_information(ExtractDocumentRequest {
                document_data_uri: "data:application/pdf;base64,aGVsbG8=".into(),
                document_type: "PDF Document".into(),
                document_name: Some("report.pdf".into()),
                is_directly_processable_media: Some(true),
            })
            .await
            .unwrap();

        assert_eq!(response.extracted_fields_json, r#"{"policyNumber": "POL-1"}"#);
        let body = seen.lock().unwrap().clone();
        assert_eq!(body["model"], DEFAULT_MODEL);
        assert_eq!(body["messages"][0]["content"][1]["type"], "file");
    }

    #[tokio::test]
    async fn fraud_assessment_with_images_uses_multimodal_request() {
        let (base_url, seen) = fake_endpoint(
            r#"{"riskScore": 0.3, "fraudIndicators": ["late report"], "summary": "low"}"#,
            StatusCode::OK,
        )
        .await;
        let flows = OpenRouterFlows::new("test-key").with_base_url(base_url);

        let assessment = flows
            .assess_fraud_risk(FraudAssessmentRequest {
                claim_details: "Jane Doe - hail".into(),
                image_evidence_uris: Some(vec!["data:image/png;base64,aGVsbG8=".into()]),
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(assessment.risk_score, 0.3);
        assert_eq!(assessment.fraud_indicators, vec!["late report"]);
        let body = seen.lock().unwrap().clone();
        assert_eq!(body["messages"][0]["content"][1]["type"], "image_url");
    }

    #[tokio::test]
    async fn fraud_assessment_withholds_unattachable_media() {
        let (base_url, seen) = fake_endpoint(
            r#"{"riskScore": 0.2, "fraudIndicators": [], "summary": "low"}"#,
            StatusCode::OK,
        )
        .await;
        let flows = OpenRouterFlows::new("test-key").with_base_url(base_url);

        flows
            .assess_fraud_risk(FraudAssessmentRequest {
                claim_details: "Jane Doe - hail".into(),
                supporting_document_uri: Some(
                    "data:application/vnd.openxmlformats-officedocument.wordprocessingml.document;base64,aGVsbG8="
                        .into(),
                ),
                video_evidence_uri: Some("data:video/mp4;base64,aGVsbG8=".into()),
                ..Default::default()
            })
            .await
            .unwrap();

        let body = seen.lock().unwrap().clone();
        let parts = body["messages"][0]["content"].as_array().unwrap().clone();
        assert_eq!(parts.len(), 1);
        assert!(parts.iter().all(|part| part["type"] != "file"));
        let text = parts[0]["text"].as_str().unwrap();
        assert!(text.contains("Video Evidence: provided as video/mp4, not attached"));
        assert_eq!(body["response_format"]["type"], "json_object");
    }

    #[tokio::test]
    async fn fraud_assessment_attaches_pdf_next_to_withheld_video() {
        let (base_url, seen) = fake_endpoint(
            r#"{"riskScore": 0.2, "fraudIndicators": [], "summary": "low"}"#,
            StatusCode::OK,
        )
        .await;
        let flows = OpenRouterFlows::new("test-key").with_base_url(base_url);

        flows
            .assess_fraud_risk(FraudAssessmentRequest {
                claim_details: "Jane Doe - hail".into(),
                supporting_document_uri: Some("data:application/pdf;base64,aGVsbG8=".into()),
                video_evidence_uri: Some("data:video/mp4;base64,aGVsbG8=".into()),
                ..Default::default()
            })
            .await
            .unwrap();

        let body = seen.lock().unwrap().clone();
        let parts = body["messages"][0]["content"].as_array().unwrap().clone();
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[1]["type"], "file");
        assert_eq!(parts[1]["file"]["filename"], "supporting-document");
    }

    #[test]
    fn text_transport_follows_the_endpoint() {
        let flows = OpenRouterFlows::new("test-key");
        assert_eq!(flows.text_transport(), TextTransport::Agent);

        let flows = flows.with_base_url("http://127.0.0.1:9/");
        assert_eq!(flows.text_transport(), TextTransport::ChatCompletions);

        let flows = flows.with_text_transport(TextTransport::Agent);
        assert_eq!(flows.text_transport(), TextTransport::Agent);
    }

    #[tokio::test]
    async fn non_success_status_is_an_api_error() {
        let (base_url, _) = fake_endpoint("{}", StatusCode::TOO_MANY_REQUESTS).await;
        let flows = OpenRouterFlows::new("test-key").with_base_url(base_url);

        let err = flows
            .qa_on_document(QaRequest {
                document_data_uri: "data:application/pdf;base64,aGVsbG8=".into(),
                question: "Who is the claimant?".into(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AiError::Api { status: 429, .. }));
    }

    /// Usage: OPENROUTER_API_KEY=key cargo test live_text_only_fraud_assessment
    #[tokio::test]
    async fn live_text_only_fraud_assessment() {
        let Ok(api_key) = std::env::var("OPENROUTER_API_KEY") else {
            println!("Skipping test - set OPENROUTER_API_KEY environment variable");
            return;
        };
        let flows = OpenRouterFlows::new(api_key);
        assert_eq!(flows.text_transport(), TextTransport::Agent);

        let result = flows
            .assess_fraud_risk(FraudAssessmentRequest {
                claim_details: "Jane Doe - Hail damaged the roof. Policy: POL-12345. Incident Date: 2024-01-01. Extracted Info: {}".into(),
                ..Default::default()
            })
            .await;
        match result {
            Ok(assessment) => assert!(assessment.risk_score.is_finite()),
            Err(e) => println!("Live fraud assessment failed: {e}"),
        }
    }

    /// Usage: OPENROUTER_API_KEY=key cargo test live_qa_on_document
    #[tokio::test]
    async fn live_qa_on_document() {
        let Ok(api_key) = std::env::var("OPENROUTER_API_KEY") else {
            println!("Skipping test - set OPENROUTER_API_KEY environment variable");
            return;
        };
        let flows = OpenRouterFlows::new(api_key);
        let result = flows
            .qa_on_document(QaRequest {
                document_data_uri: "https://placehold.co/600x400.png".into(),
                question: "What text is shown in the image?".into(),
            })
            .await;
        match result {
            Ok(answer) => assert!(!answer.answer.trim().is_empty()),
            Err(e) => println!("Live Q&A call failed: {e}"),
        }
    }
}

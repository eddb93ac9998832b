use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::Mutex;

use super::{
    AiError, AiFlows, ExtractDocumentRequest, ExtractDocumentResponse, FraudAssessmentRequest,
    QaRequest, QaResponse,
};
use crate::model::FraudAssessment;

/// A request seen by [`ScriptedAiFlows`]
#[derive(Debug, Clone, PartialEq)]
pub enum RecordedCall {
    Extract(ExtractDocumentRequest),
    Fraud(FraudAssessmentRequest),
    Qa(QaRequest),
}

#[derive(Clone)]
enum Reply<T> {
    Ok(T),
    Fail(String),
}

impl<T: Clone> Reply<T> {
    fn produce(&self) -> Result<T, AiError> {
        match self {
            Reply::Ok(value) => Ok(value.clone()),
            Reply::Fail(message) => Err(AiError::Unavailable(message.clone())),
        }
    }
}

/// Offline [`AiFlows`] with fixed replies and a log of every call.
#[derive(Clone)]
pub struct ScriptedAiFlows {
    extraction: Reply<String>,
    fraud: Reply<FraudAssessment>,
    answer: Reply<String>,
    calls: Arc<Mutex<Vec<RecordedCall>>>,
}

impl Default for ScriptedAiFlows {
    fn default() -> Self {
        Self {
            extraction: Reply::Ok(r#"{"claimantName": "Jane Doe"}"#.to_string()),
            fraud: Reply::Ok(FraudAssessment {
                risk_score: 0.12,
                fraud_indicators: vec![],
                summary: "No indicators of fraud found.".to_string(),
            }),
            answer: Reply::Ok("The document does not say.".to_string()),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl ScriptedAiFlows {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw text returned as `extractedFieldsJson`.
    pub fn with_extraction(mut self, extracted_fields_json: impl Into<String>) -> Self {
        self.extraction = Reply::Ok(extracted_fields_json.into());
        self
    }

    pub fn failing_extraction(mut self, message: impl Into<String>) -> Self {
        self.extraction = Reply::Fail(message.into());
        self
    }

    pub fn with_fraud(mut self, assessment: FraudAssessment) -> Self {
        self.fraud = Reply::Ok(assessment);
        self
    }

    pub fn failing_fraud(mut self, message: impl Into<String>) -> Self {
        self.fraud = Reply::Fail(message.into());
        self
    }

    pub fn with_answer(mut self, answer: impl Into<String>) -> Self {
        self.answer = Reply::Ok(answer.into());
        self
    }

    pub fn failing_answer(mut self, message: impl Into<String>) -> Self {
        self.answer = Reply::Fail(message.into());
        self
    }

    pub async fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().await.clone()
    }

    async fn record(&self, call: RecordedCall) {
        self.calls.lock().await.push(call);
    }
}

#[async_trait]
impl AiFlows for ScriptedAiFlows {
    async fn extract_document_information(
        &self,
        request: ExtractDocumentRequest,
    ) -> Result<ExtractDocumentResponse, AiError> {
        self.record(RecordedCall::Extract(request)).await;
        self.extraction
            .produce()
            .map(|extracted_fields_json| ExtractDocumentResponse {
                extracted_fields_json,
            })
    }

    async fn assess_fraud_risk(
        &self,
        request: FraudAssessmentRequest,
    ) -> Result<FraudAssessment, AiError> {
        self.record(RecordedCall::Fraud(request)).await;
        self.fraud.produce()
    }

    async fn qa_on_document(&self, request: QaRequest) -> Result<QaResponse, AiError> {
        self.record(RecordedCall::Qa(request)).await;
        self.answer.produce().map(|answer| QaResponse { answer })
    }
}

//! Claim and notification records shared by the pipeline, storage and HTTP layers.
//!
//! JSON field names are camelCase so records round-trip unchanged between the
//! API, the JSONB claim bodies in Postgres and the scripted test fixtures.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};

/// Key of the sentinel entry stored when the extraction reply is not valid JSON.
pub const PARSING_ERROR_KEY: &str = "parsingError";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClaimStatus {
    Pending,
    #[serde(rename = "Under Review")]
    UnderReview,
    Approved,
    Rejected,
    #[serde(rename = "Information Requested")]
    InformationRequested,
}

impl ClaimStatus {
    pub const ALL: [ClaimStatus; 5] = [
        ClaimStatus::Pending,
        ClaimStatus::UnderReview,
        ClaimStatus::Approved,
        ClaimStatus::Rejected,
        ClaimStatus::InformationRequested,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            ClaimStatus::Pending => "Pending",
            ClaimStatus::UnderReview => "Under Review",
            ClaimStatus::Approved => "Approved",
            ClaimStatus::Rejected => "Rejected",
            ClaimStatus::InformationRequested => "Information Requested",
        }
    }
}

impl fmt::Display for ClaimStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ClaimStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ClaimStatus::ALL
            .into_iter()
            .find(|status| status.label().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown claim status: {s}"))
    }
}

/// Normalized rectangle locating an extracted value on a document page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    /// 1-indexed
    pub page: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedField {
    /// A string or a nested object
    pub value: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bounding_box: Option<BoundingBox>,
}

impl ExtractedField {
    pub fn text(value: impl Into<String>) -> Self {
        Self {
            value: Value::String(value.into()),
            bounding_box: None,
        }
    }
}

/// Field name to extracted value, as produced by the document extraction flow.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExtractedInfo(pub BTreeMap<String, ExtractedField>);

impl ExtractedInfo {
    pub fn parsing_error(message: impl Into<String>) -> Self {
        let mut fields = BTreeMap::new();
        fields.insert(PARSING_ERROR_KEY.to_string(), ExtractedField::text(message));
        Self(fields)
    }

    pub fn is_parsing_error(&self) -> bool {
        self.0.contains_key(PARSING_ERROR_KEY)
    }

    pub fn get(&self, field: &str) -> Option<&ExtractedField> {
        self.0.get(field)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FraudAssessment {
    /// 0 is no risk, 1 the highest
    pub risk_score: f64,
    #[serde(default)]
    pub fraud_indicators: Vec<String>,
    pub summary: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConsistencyStatus {
    #[serde(rename = "Not Run")]
    NotRun,
    Consistent,
    Inconsistent,
    Partial,
}

impl fmt::Display for ConsistencyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ConsistencyStatus::NotRun => "Not Run",
            ConsistencyStatus::Consistent => "Consistent",
            ConsistencyStatus::Inconsistent => "Inconsistent",
            ConsistencyStatus::Partial => "Partial",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConsistencyFinding {
    Match,
    Mismatch,
    #[serde(rename = "Missing in A")]
    MissingInA,
    #[serde(rename = "Missing in B")]
    MissingInB,
    #[serde(rename = "Not Compared")]
    NotCompared,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsistencyDetail {
    pub document_a: String,
    pub document_b: String,
    pub field: String,
    pub value_a: String,
    pub value_b: String,
    pub finding: ConsistencyFinding,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsistencyReport {
    pub status: ConsistencyStatus,
    pub summary: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<ConsistencyDetail>>,
}

/// Intake payload for a new claim. Attachments are inline data URIs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewClaim {
    pub claimant_name: String,
    pub policy_number: String,
    pub incident_date: String,
    pub incident_description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_uri: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_names: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_uris: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_uri: Option<String>,
}

impl NewClaim {
    /// The attached document, if both its name and content are present.
    pub fn document(&self) -> Option<(&str, &str)> {
        match (&self.document_name, &self.document_uri) {
            (Some(name), Some(uri)) if !uri.is_empty() => Some((name.as_str(), uri.as_str())),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Claim {
    pub id: String,
    pub claimant_name: String,
    pub policy_number: String,
    pub incident_date: String,
    pub incident_description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_uri: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_names: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_uris: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_uri: Option<String>,
    pub status: ClaimStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extracted_info: Option<ExtractedInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fraud_assessment: Option<FraudAssessment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub consistency_report: Option<ConsistencyReport>,
    pub submission_date: DateTime<Utc>,
    pub last_updated_date: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Claim {
    /// Build a freshly submitted claim; status is always `Pending`.
    pub fn from_submission(id: String, form: NewClaim, submitted_at: DateTime<Utc>) -> Self {
        Self {
            id,
            claimant_name: form.claimant_name,
            policy_number: form.policy_number,
            incident_date: form.incident_date,
            incident_description: form.incident_description,
            document_name: form.document_name,
            document_uri: form.document_uri,
            image_names: form.image_names,
            image_uris: form.image_uris,
            video_name: form.video_name,
            video_uri: form.video_uri,
            status: ClaimStatus::Pending,
            extracted_info: None,
            fraud_assessment: None,
            consistency_report: None,
            submission_date: submitted_at,
            last_updated_date: submitted_at,
            notes: None,
        }
    }

    pub fn risk_score(&self) -> Option<f64> {
        self.fraud_assessment.as_ref().map(|a| a.risk_score)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppNotification {
    pub id: String,
    pub title: String,
    pub message: String,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub timestamp: DateTime<Utc>,
    pub read: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub claim_id: Option<String>,
}

/// Caller-supplied part of a notification; id, timestamp and read flag are stamped on insert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewNotification {
    pub title: String,
    pub message: String,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub claim_id: Option<String>,
}

impl NewNotification {
    pub fn new(kind: NotificationKind, title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
            kind,
            claim_id: None,
        }
    }

    pub fn info(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(NotificationKind::Info, title, message)
    }

    pub fn success(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(NotificationKind::Success, title, message)
    }

    pub fn error(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(NotificationKind::Error, title, message)
    }

    pub fn for_claim(mut self, claim_id: impl Into<String>) -> Self {
        self.claim_id = Some(claim_id.into());
        self
    }
}

/// Generates `clm_…` and `notif_…` identifiers: a millisecond timestamp plus a
/// process-wide counter, with a random base36 suffix on claim ids.
#[derive(Debug, Default)]
pub struct IdGenerator {
    counter: AtomicU64,
}

impl IdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn claim_id(&self) -> String {
        let n = self.counter.fetch_add(1, Ordering::Relaxed) + 1;
        format!(
            "clm_{}_{}_{}",
            Utc::now().timestamp_millis(),
            n,
            random_base36(5)
        )
    }

    pub fn notification_id(&self) -> String {
        let n = self.counter.fetch_add(1, Ordering::Relaxed) + 1;
        format!("notif_{}_{}", Utc::now().timestamp_millis(), n)
    }
}

fn random_base36(len: usize) -> String {
    use rand::Rng;
    const ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    let mut rng = rand::rng();
    (0..len)
        .map(|_| ALPHABET[rng.random_range(0..ALPHABET.len())] as char)
        .collect()
}

/// First twelve characters of a claim id, as shown in notification messages.
pub fn short_claim_id(id: &str) -> &str {
    match id.char_indices().nth(12) {
        Some((idx, _)) => &id[..idx],
        None => id,
    }
}

use chrono::{DateTime, NaiveDate};
use serde::Serialize;
use std::fmt;

use crate::media::{DataUri, is_remote_url};
use crate::model::NewClaim;

pub const MAX_DOCUMENT_BYTES: usize = 5 * 1024 * 1024;
pub const MAX_IMAGE_BYTES: usize = 2 * 1024 * 1024;
pub const MAX_IMAGES: usize = 5;
pub const ALLOWED_IMAGE_TYPES: [&str; 4] = ["image/jpeg", "image/png", "image/gif", "image/webp"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

/// Every problem found in an intake payload
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationErrors {
    pub errors: Vec<FieldError>,
}

impl ValidationErrors {
    fn push(&mut self, field: &'static str, message: impl Into<String>) {
        self.errors.push(FieldError {
            field,
            message: message.into(),
        });
    }

    pub fn has(&self, field: &str) -> bool {
        self.errors.iter().any(|e| e.field == field)
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .errors
            .iter()
            .map(|e| format!("{}: {}", e.field, e.message))
            .collect();
        f.write_str(&parts.join("; "))
    }
}

impl std::error::Error for ValidationErrors {}

/// Accepts `YYYY-MM-DD` or a full RFC 3339 timestamp.
pub fn is_valid_incident_date(value: &str) -> bool {
    let value = value.trim();
    NaiveDate::parse_from_str(value, "%Y-%m-%d").is_ok() || DateTime::parse_from_rfc3339(value).is_ok()
}

impl NewClaim {
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::default();

        if self.claimant_name.trim().chars().count() < 2 {
            errors.push("claimantName", "Claimant name must be at least 2 characters.");
        }
        if self.policy_number.trim().chars().count() < 5 {
            errors.push("policyNumber", "Policy number must be at least 5 characters.");
        }
        if !is_valid_incident_date(&self.incident_date) {
            errors.push("incidentDate", "Invalid date format.");
        }
        if self.incident_description.trim().chars().count() < 10 {
            errors.push("incidentDescription", "Description must be at least 10 characters.");
        }

        if let Some(uri) = &self.document_uri {
            if self.document_name.as_deref().is_none_or(|n| n.trim().is_empty()) {
                errors.push("documentName", "A document name is required with a document.");
            }
            match attachment_size(uri) {
                Err(message) => errors.push("documentUri", message),
                Ok(Some(size)) if size > MAX_DOCUMENT_BYTES => errors.push(
                    "documentUri",
                    format!("Max document file size is {}MB.", MAX_DOCUMENT_BYTES / (1024 * 1024)),
                ),
                Ok(_) => {}
            }
        }

        let image_uris = self.image_uris.as_deref().unwrap_or_default();
        let image_names = self.image_names.as_deref().unwrap_or_default();
        if image_uris.len() > MAX_IMAGES {
            errors.push("imageUris", format!("You can upload a maximum of {MAX_IMAGES} images."));
        }
        if !image_names.is_empty() && image_names.len() != image_uris.len() {
            errors.push("imageNames", "Each image needs exactly one name.");
        }
        for uri in image_uris {
            if let Some(data) = DataUri::parse(uri) {
                if !ALLOWED_IMAGE_TYPES.contains(&data.mime_type.to_ascii_lowercase().as_str()) {
                    errors.push("imageUris", "Only JPG, PNG, GIF, WEBP images are allowed.");
                    continue;
                }
            }
            match attachment_size(uri) {
                Err(message) => errors.push("imageUris", message),
                Ok(Some(size)) if size > MAX_IMAGE_BYTES => errors.push(
                    "imageUris",
                    format!("Each image must be {}MB or less.", MAX_IMAGE_BYTES / (1024 * 1024)),
                ),
                Ok(_) => {}
            }
        }

        if let Some(uri) = &self.video_uri {
            if let Err(message) = attachment_size(uri) {
                errors.push("videoUri", message);
            }
        }

        if errors.errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Decoded size of an inline attachment, `None` for remote URLs.
fn attachment_size(uri: &str) -> Result<Option<usize>, String> {
    if is_remote_url(uri) {
        return Ok(None);
    }
    let data = DataUri::parse(uri).ok_or_else(|| "Attachments must be data URIs.".to_string())?;
    if !data.is_base64 {
        return Err("Attachments must be base64 encoded.".to_string());
    }
    data.decoded_len()
        .map(Some)
        .ok_or_else(|| "Attachment is not valid base64.".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::{Engine as _, engine::general_purpose::STANDARD};

    fn valid_claim() -> NewClaim {
        NewClaim {
            claimant_name: "Jane Doe".into(),
            policy_number: "POL-12345".into(),
            incident_date: "2024-03-02".into(),
            incident_description: "Rear-ended at a traffic light".into(),
            ..Default::default()
        }
    }

    #[test]
    fn accepts_minimal_claim() {
        assert!(valid_claim().validate().is_ok());
    }

    #[test]
    fn collects_all_field_errors() {
        let claim = NewClaim {
            claimant_name: "J".into(),
            policy_number: "P1".into(),
            incident_date: "yesterday".into(),
            incident_description: "short".into(),
            ..Default::default()
        };
        let errors = claim.validate().unwrap_err();
        assert_eq!(errors.errors.len(), 4);
        for field in ["claimantName", "policyNumber", "incidentDate", "incidentDescription"] {
            assert!(errors.has(field), "missing error for {field}");
        }
    }

    #[test]
    fn rejects_oversized_document() {
        let payload = STANDARD.encode(vec![0u8; MAX_DOCUMENT_BYTES + 1]);
        let claim = NewClaim {
            document_name: Some("big.pdf".into()),
            document_uri: Some(format!("data:application/pdf;base64,{payload}")),
            ..valid_claim()
        };
        assert!(claim.validate().unwrap_err().has("documentUri"));
    }

    #[test]
    fn rejects_disallowed_image_type_and_too_many_images() {
        let png = "data:image/png;base64,aGVsbG8=".to_string();
        let claim = NewClaim {
            image_uris: Some(vec![png.clone(); 6]),
            ..valid_claim()
        };
        assert!(claim.validate().unwrap_err().has("imageUris"));

        let claim = NewClaim {
            image_names: Some(vec!["a.bmp".into()]),
            image_uris: Some(vec!["data:image/bmp;base64,aGVsbG8=".into()]),
            ..valid_claim()
        };
        let errors = claim.validate().unwrap_err();
        assert!(errors.to_string().contains("Only JPG, PNG, GIF, WEBP"));
    }

    #[test]
    fn accepts_rfc3339_incident_date() {
        assert!(is_valid_incident_date("2023-10-16T10:00:00Z"));
        assert!(!is_valid_incident_date("2023-13-40"));
    }
}

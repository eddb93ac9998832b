//! Sample claims loaded when the service starts with demo data enabled.

use chrono::{DateTime, TimeZone, Utc};

use crate::model::{Claim, ClaimStatus, ExtractedField, ExtractedInfo, FraudAssessment};

fn at(year: i32, month: u32, day: u32, hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, hour, minute, 0)
        .single()
        .unwrap_or_default()
}

pub fn demo_claims() -> Vec<Claim> {
    let placeholder = "https://placehold.co/600x400.png".to_string();

    let mut extracted = ExtractedInfo::default();
    extracted
        .0
        .insert("Vehicle Model".into(), ExtractedField::text("Toyota Camry"));
    extracted
        .0
        .insert("Damage Area".into(), ExtractedField::text("Rear Bumper"));

    vec![
        Claim {
            id: "clm_001".into(),
            claimant_name: "Alice Wonderland".into(),
            policy_number: "POL-12345".into(),
            incident_date: "2023-10-15".into(),
            incident_description: "Minor fender bender in parking lot. Scratches on rear bumper."
                .into(),
            document_name: Some("accident_report.pdf".into()),
            document_uri: None,
            image_names: Some(vec![
                "bumper_scratch.jpg".into(),
                "overall_damage.jpg".into(),
            ]),
            image_uris: Some(vec![placeholder.clone(), placeholder.clone()]),
            video_name: Some("dashcam_clip.mp4".into()),
            video_uri: Some(placeholder),
            status: ClaimStatus::Approved,
            extracted_info: Some(extracted),
            fraud_assessment: Some(FraudAssessment {
                risk_score: 0.1,
                fraud_indicators: vec!["Low impact collision".into()],
                summary: "Low fraud risk.".into(),
            }),
            consistency_report: None,
            submission_date: at(2023, 10, 16, 10, 0),
            last_updated_date: at(2023, 10, 18, 14, 30),
            notes: Some("Standard procedure, photos clear.".into()),
        },
        Claim {
            id: "clm_002".into(),
            claimant_name: "Bob The Builder".into(),
            policy_number: "POL-67890".into(),
            incident_date: "2023-11-01".into(),
            incident_description:
                "Water damage due to burst pipe in kitchen. Affects flooring and cabinets.".into(),
            document_name: Some("plumber_report.pdf".into()),
            document_uri: None,
            image_names: None,
            image_uris: None,
            video_name: None,
            video_uri: None,
            status: ClaimStatus::Pending,
            extracted_info: None,
            fraud_assessment: None,
            consistency_report: None,
            submission_date: at(2023, 11, 2, 9, 15),
            last_updated_date: at(2023, 11, 2, 9, 15),
            notes: None,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn demo_claims_are_well_formed() {
        let claims = demo_claims();
        assert_eq!(claims.len(), 2);
        assert_eq!(claims[0].status, ClaimStatus::Approved);
        assert_eq!(claims[0].risk_score(), Some(0.1));
        assert_eq!(
            claims[1].submission_date.to_rfc3339(),
            "2023-11-02T09:15:00+00:00"
        );
        assert!(claims.iter().all(|c| c.submission_date <= c.last_updated_date));
    }
}

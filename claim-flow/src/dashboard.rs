//! Read-only aggregates over the claim list for the dashboard and admin report.

use serde::Serialize;

use crate::model::{Claim, ClaimStatus, ConsistencyStatus, short_claim_id};

pub const HIGH_RISK_THRESHOLD: f64 = 0.7;
pub const MEDIUM_RISK_THRESHOLD: f64 = 0.4;
pub const RECENT_CLAIMS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RiskBand {
    High,
    Medium,
    Low,
    Unassessed,
}

impl RiskBand {
    pub fn from_score(score: Option<f64>) -> Self {
        match score {
            Some(s) if s >= HIGH_RISK_THRESHOLD => RiskBand::High,
            Some(s) if s >= MEDIUM_RISK_THRESHOLD => RiskBand::Medium,
            Some(_) => RiskBand::Low,
            None => RiskBand::Unassessed,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimOverview {
    pub id: String,
    pub short_id: String,
    pub claimant_name: String,
    pub status: ClaimStatus,
    pub risk_score: Option<f64>,
    pub risk_band: RiskBand,
}

impl From<&Claim> for ClaimOverview {
    fn from(claim: &Claim) -> Self {
        Self {
            id: claim.id.clone(),
            short_id: short_claim_id(&claim.id).to_string(),
            claimant_name: claim.claimant_name.clone(),
            status: claim.status,
            risk_score: claim.risk_score(),
            risk_band: RiskBand::from_score(claim.risk_score()),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub total_claims: usize,
    pub approved_claims: usize,
    /// Pending or under review
    pub pending_claims: usize,
    pub high_risk_claims: usize,
    pub unread_notifications: usize,
    pub recent_claims: Vec<ClaimOverview>,
}

impl DashboardSummary {
    /// `claims` must already be ordered newest first.
    pub fn build(claims: &[Claim], unread_notifications: usize) -> Self {
        Self {
            total_claims: claims.len(),
            approved_claims: claims
                .iter()
                .filter(|c| c.status == ClaimStatus::Approved)
                .count(),
            pending_claims: claims
                .iter()
                .filter(|c| matches!(c.status, ClaimStatus::Pending | ClaimStatus::UnderReview))
                .count(),
            high_risk_claims: claims
                .iter()
                .filter(|c| RiskBand::from_score(c.risk_score()) == RiskBand::High)
                .count(),
            unread_notifications,
            recent_claims: claims.iter().take(RECENT_CLAIMS).map(ClaimOverview::from).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminReportRow {
    #[serde(flatten)]
    pub overview: ClaimOverview,
    pub fraud_indicators: Vec<String>,
    pub extracted_field_count: usize,
    pub consistency: Option<ConsistencyStatus>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminReport {
    pub rows: Vec<AdminReportRow>,
}

impl AdminReport {
    pub fn build(claims: &[Claim]) -> Self {
        let rows = claims
            .iter()
            .map(|claim| AdminReportRow {
                overview: ClaimOverview::from(claim),
                fraud_indicators: claim
                    .fraud_assessment
                    .as_ref()
                    .map(|f| f.fraud_indicators.clone())
                    .unwrap_or_default(),
                extracted_field_count: claim
                    .extracted_info
                    .as_ref()
                    .filter(|info| !info.is_parsing_error())
                    .map(|info| info.len())
                    .unwrap_or(0),
                consistency: claim.consistency_report.as_ref().map(|r| r.status),
            })
            .collect();
        Self { rows }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::demo::demo_claims;
    use crate::model::FraudAssessment;

    #[test]
    fn bands_follow_thresholds() {
        assert_eq!(RiskBand::from_score(Some(0.7)), RiskBand::High);
        assert_eq!(RiskBand::from_score(Some(0.69)), RiskBand::Medium);
        assert_eq!(RiskBand::from_score(Some(0.4)), RiskBand::Medium);
        assert_eq!(RiskBand::from_score(Some(0.0)), RiskBand::Low);
        assert_eq!(RiskBand::from_score(None), RiskBand::Unassessed);
    }

    #[test]
    fn summary_counts_statuses_and_risk() {
        let mut claims = demo_claims();
        let mut risky = claims[1].clone();
        risky.id = "clm_003".into();
        risky.status = ClaimStatus::UnderReview;
        risky.fraud_assessment = Some(FraudAssessment {
            risk_score: 0.85,
            fraud_indicators: vec!["Inconsistent dates".into()],
            summary: "High risk".into(),
        });
        claims.insert(0, risky);

        let summary = DashboardSummary::build(&claims, 3);
        assert_eq!(summary.total_claims, 3);
        assert_eq!(summary.approved_claims, 1);
        assert_eq!(summary.pending_claims, 2);
        assert_eq!(summary.high_risk_claims, 1);
        assert_eq!(summary.unread_notifications, 3);
        assert_eq!(summary.recent_claims[0].id, "clm_003");

        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["recentClaims"][0]["riskBand"], "High");
    }

    #[test]
    fn admin_report_lists_every_claim() {
        let report = AdminReport::build(&demo_claims());
        assert_eq!(report.rows.len(), 2);
        assert_eq!(report.rows[0].extracted_field_count, 2);
        assert_eq!(report.rows[0].fraud_indicators, vec!["Low impact collision"]);
        assert_eq!(report.rows[1].overview.risk_band, RiskBand::Unassessed);

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["rows"][1]["claimantName"], "Bob The Builder");
    }
}

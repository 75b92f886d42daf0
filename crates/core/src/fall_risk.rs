//! Fall-risk scoring.
//!
//! Turns a patient's assessed risk factors into per-factor alerts and an aggregate weighted
//! score. Scoring and alert building are pure; [`FallRiskService`] persists generated alerts.

use crate::constants::{PATIENT_ID_INDEX, RISK_ALERTS_COLLECTION};
use crate::error::CareResult;
use crate::store::{KeyValueStore, StoredRecord};
use careguard_uuid::RecordId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Points added at or above which a patient is high risk.
pub const HIGH_RISK_THRESHOLD: f64 = 50.0;
/// Points added at or above which a patient is medium risk.
pub const MEDIUM_RISK_THRESHOLD: f64 = 25.0;

/// Assessed risk factor type. Unrecognised types are kept verbatim.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RiskFactorType {
    Sedatives,
    CognitiveImpairment,
    VisionProblems,
    MobilityIssues,
    Other(String),
}

impl RiskFactorType {
    pub fn as_str(&self) -> &str {
        match self {
            RiskFactorType::Sedatives => "SEDATIVES",
            RiskFactorType::CognitiveImpairment => "COGNITIVE_IMPAIRMENT",
            RiskFactorType::VisionProblems => "VISION_PROBLEMS",
            RiskFactorType::MobilityIssues => "MOBILITY_ISSUES",
            RiskFactorType::Other(raw) => raw,
        }
    }

    pub fn is_recognised(&self) -> bool {
        !matches!(self, RiskFactorType::Other(_))
    }

    /// Base points before the severity multiplier.
    pub fn base_points(&self) -> f64 {
        match self {
            RiskFactorType::Sedatives => 30.0,
            RiskFactorType::CognitiveImpairment | RiskFactorType::MobilityIssues => 25.0,
            RiskFactorType::VisionProblems => 20.0,
            RiskFactorType::Other(_) => 10.0,
        }
    }

    fn alert_message(&self) -> Option<&'static str> {
        match self {
            RiskFactorType::Sedatives => Some(
                "Patient is on sedatives: supervise transfers and walking, check for drowsiness \
                 and dizziness before standing",
            ),
            RiskFactorType::CognitiveImpairment => Some(
                "Patient has cognitive impairment: may not recall safety instructions, \
                 increase supervision and keep the call bell within reach",
            ),
            RiskFactorType::VisionProblems => Some(
                "Patient has vision problems: keep rooms well lit, clear walkways and ensure \
                 glasses are worn",
            ),
            RiskFactorType::MobilityIssues => Some(
                "Patient has mobility issues: assist with transfers and keep walking aids within \
                 reach",
            ),
            RiskFactorType::Other(_) => None,
        }
    }
}

impl From<String> for RiskFactorType {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "SEDATIVES" => RiskFactorType::Sedatives,
            "COGNITIVE_IMPAIRMENT" => RiskFactorType::CognitiveImpairment,
            "VISION_PROBLEMS" => RiskFactorType::VisionProblems,
            "MOBILITY_ISSUES" => RiskFactorType::MobilityIssues,
            _ => RiskFactorType::Other(raw),
        }
    }
}

impl From<RiskFactorType> for String {
    fn from(value: RiskFactorType) -> Self {
        match value {
            RiskFactorType::Other(raw) => raw,
            known => known.as_str().to_owned(),
        }
    }
}

impl fmt::Display for RiskFactorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    pub fn multiplier(&self) -> f64 {
        match self {
            Severity::High => 1.5,
            Severity::Medium => 1.0,
            Severity::Low => 0.5,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskFactor {
    #[serde(rename = "type")]
    pub factor_type: RiskFactorType,
    pub severity: Severity,
    #[serde(default)]
    pub notes: String,
    #[serde(default = "Utc::now")]
    pub assessed_at: DateTime<Utc>,
}

impl RiskFactor {
    pub fn new(factor_type: RiskFactorType, severity: Severity) -> Self {
        Self {
            factor_type,
            severity,
            notes: String::new(),
            assessed_at: Utc::now(),
        }
    }
}

/// The patient projection the scorer needs.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Patient {
    pub id: String,
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub risk_factors: Vec<RiskFactor>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskAlert {
    pub id: RecordId,
    pub patient_id: String,
    pub risk_type: RiskFactorType,
    pub severity: Severity,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

impl StoredRecord for RiskAlert {
    const COLLECTION: &'static str = RISK_ALERTS_COLLECTION;
    const INDEXES: &'static [&'static str] = &[PATIENT_ID_INDEX];

    fn record_id(&self) -> RecordId {
        self.id
    }

    fn index_value(&self, index: &str) -> Option<String> {
        match index {
            PATIENT_ID_INDEX => Some(self.patient_id.clone()),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn from_total(total: f64) -> Self {
        if total >= HIGH_RISK_THRESHOLD {
            RiskLevel::High
        } else if total >= MEDIUM_RISK_THRESHOLD {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }
}

/// Points contributed by one factor.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FactorScore {
    #[serde(rename = "type")]
    pub factor_type: RiskFactorType,
    pub severity: Severity,
    pub score: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskScore {
    pub total: f64,
    pub level: RiskLevel,
    pub factors: Vec<FactorScore>,
}

pub fn calculate_risk_score(patient: &Patient) -> RiskScore {
    let factors: Vec<FactorScore> = patient
        .risk_factors
        .iter()
        .map(|factor| FactorScore {
            factor_type: factor.factor_type.clone(),
            severity: factor.severity,
            score: factor.factor_type.base_points() * factor.severity.multiplier(),
        })
        .collect();
    let total = factors.iter().map(|f| f.score).sum();

    RiskScore {
        total,
        level: RiskLevel::from_total(total),
        factors,
    }
}

/// One alert per recognised factor, in factor order.
pub fn build_risk_alerts(patient: &Patient, now: DateTime<Utc>) -> Vec<RiskAlert> {
    patient
        .risk_factors
        .iter()
        .filter_map(|factor| {
            let message = factor.factor_type.alert_message()?;
            Some(RiskAlert {
                id: RecordId::new(),
                patient_id: patient.id.clone(),
                risk_type: factor.factor_type.clone(),
                severity: factor.severity,
                message: message.to_owned(),
                created_at: now,
            })
        })
        .collect()
}

/// Generates and persists fall-risk alerts.
#[derive(Clone)]
pub struct FallRiskService {
    store: Arc<dyn KeyValueStore<RiskAlert>>,
}

impl FallRiskService {
    pub fn new(store: Arc<dyn KeyValueStore<RiskAlert>>) -> Self {
        Self { store }
    }

    /// Builds fresh alerts and writes each one as it is produced.
    ///
    /// A storage failure stops the batch; alerts already written stay written.
    pub async fn get_risk_alerts(&self, patient: &Patient) -> CareResult<Vec<RiskAlert>> {
        let alerts = build_risk_alerts(patient, Utc::now());
        for alert in &alerts {
            self.store.put(alert).await?;
        }

        let skipped = patient
            .risk_factors
            .iter()
            .filter(|factor| !factor.factor_type.is_recognised())
            .count();
        if skipped > 0 {
            tracing::debug!(
                "{} unrecognised risk factor(s) for patient {} produced no alert",
                skipped,
                patient.id
            );
        }
        tracing::info!(
            "generated {} fall-risk alert(s) for patient {}",
            alerts.len(),
            patient.id
        );

        Ok(alerts)
    }

    /// Persisted alerts, newest first.
    pub async fn list_alerts(&self, patient_id: Option<&str>) -> CareResult<Vec<RiskAlert>> {
        let mut alerts = match patient_id {
            Some(pid) => self.store.get_by_index(PATIENT_ID_INDEX, pid).await?,
            None => self.store.get_all().await?,
        };
        alerts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(alerts)
    }
}

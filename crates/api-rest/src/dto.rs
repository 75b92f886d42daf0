//! Request and response bodies.
//!
//! Engine types carry no OpenAPI derives, so bodies that embed them document those fields as
//! plain strings or objects.

use careguard_core::fall_risk::{FactorScore, RiskFactor, RiskLevel};
use careguard_core::history::{CareEventType, HistoryStats, SyncStatus};
use careguard_core::restraint::{JustificationForm, RestraintStatus, Strategy};
use careguard_core::{
    CareEvent, CareEventPatch, ErrorKind, NewCareEvent, Patient, Restraint, RestraintType,
    RiskAlert, RiskScore, ValidationResult,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use utoipa::{IntoParams, ToSchema};

#[derive(Serialize, Deserialize, ToSchema)]
pub struct HealthRes {
    pub ok: bool,
    pub message: String,
}

/// Error body for every non-2xx engine outcome.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorRes {
    pub code: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub details: Option<Value>,
}

#[derive(Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ValidationRes {
    pub is_valid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    pub error_code: Option<ErrorKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl From<ValidationResult> for ValidationRes {
    fn from(result: ValidationResult) -> Self {
        Self {
            is_valid: result.is_valid,
            error_code: result.error_code,
            message: result.message,
        }
    }
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct BedElevationReq {
    pub degrees: f64,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct AdherenceWindowReq {
    #[schema(value_type = String, format = DateTime)]
    pub scheduled: DateTime<Utc>,
    #[schema(value_type = String, format = DateTime)]
    pub actual: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AdherenceWindowRes {
    pub within_window: bool,
    pub window_minutes: i64,
}

/// A restraint as submitted by a caller. Identity and timestamps are assigned server-side.
#[derive(Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RestraintReq {
    pub patient_id: String,
    #[serde(rename = "type", default)]
    #[schema(value_type = Option<String>)]
    pub restraint_type: Option<RestraintType>,
    pub specific_type: String,
    #[serde(default)]
    pub justification: Option<String>,
    #[serde(default)]
    pub alternatives: Vec<String>,
    #[serde(default)]
    pub authorized_by: String,
    #[serde(default)]
    #[schema(value_type = Option<String>, format = DateTime)]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default)]
    #[schema(value_type = Option<String>, format = DateTime)]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(default)]
    #[schema(value_type = Vec<String>)]
    pub review_schedule: Vec<DateTime<Utc>>,
    #[serde(default)]
    #[schema(value_type = Option<String>)]
    pub status: Option<RestraintStatus>,
}

impl RestraintReq {
    pub fn into_restraint(self) -> Restraint {
        let mut restraint = Restraint::new(self.patient_id, self.specific_type)
            .with_alternatives(self.alternatives)
            .authorized_by(self.authorized_by);
        restraint.restraint_type = self.restraint_type;
        restraint.justification = self.justification;
        restraint.end_time = self.end_time;
        restraint.review_schedule = self.review_schedule;
        if let Some(start_time) = self.start_time {
            restraint.start_time = start_time;
        }
        if let Some(status) = self.status {
            restraint.status = status;
        }
        restraint
    }
}

#[derive(Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RestraintValidationRes {
    #[schema(value_type = String)]
    pub restraint_type: RestraintType,
    pub is_valid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    pub error_code: Option<ErrorKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RestraintRes {
    #[schema(value_type = Object)]
    pub restraint: Restraint,
    #[schema(value_type = Object)]
    pub justification_form: JustificationForm,
}

#[derive(Serialize, ToSchema)]
pub struct AlternativesRes {
    #[schema(value_type = Vec<Object>)]
    pub strategies: Vec<Strategy>,
}

#[derive(Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PatientReq {
    pub id: String,
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    #[schema(value_type = Vec<Object>)]
    pub risk_factors: Vec<RiskFactor>,
}

impl From<PatientReq> for Patient {
    fn from(req: PatientReq) -> Self {
        Patient {
            id: req.id,
            full_name: req.full_name,
            risk_factors: req.risk_factors,
        }
    }
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct RiskScoreRes {
    pub total: f64,
    #[schema(value_type = String)]
    pub level: RiskLevel,
    #[schema(value_type = Vec<Object>)]
    pub factors: Vec<FactorScore>,
}

impl From<RiskScore> for RiskScoreRes {
    fn from(score: RiskScore) -> Self {
        Self {
            total: score.total,
            level: score.level,
            factors: score.factors,
        }
    }
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct RiskAlertsRes {
    #[schema(value_type = Vec<Object>)]
    pub alerts: Vec<RiskAlert>,
}

#[derive(Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewEventReq {
    #[serde(default)]
    pub patient_id: String,
    #[schema(value_type = String)]
    pub event_type: CareEventType,
    #[serde(default)]
    #[schema(value_type = Option<String>, format = DateTime)]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub performed_by: String,
    #[serde(default)]
    #[schema(value_type = Option<String>)]
    pub sync_status: Option<SyncStatus>,
    #[serde(default)]
    #[schema(value_type = Object)]
    pub metadata: Map<String, Value>,
}

impl From<NewEventReq> for NewCareEvent {
    fn from(req: NewEventReq) -> Self {
        NewCareEvent {
            patient_id: req.patient_id,
            event_type: req.event_type,
            timestamp: req.timestamp.unwrap_or_else(Utc::now),
            performed_by: req.performed_by,
            sync_status: req.sync_status,
            metadata: req.metadata,
        }
    }
}

/// Fields that may change on a recent event. Unknown keys, including `id` and `createdAt`, are
/// ignored.
#[derive(Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EventPatchReq {
    #[serde(default)]
    pub patient_id: Option<String>,
    #[serde(default)]
    #[schema(value_type = Option<String>)]
    pub event_type: Option<CareEventType>,
    #[serde(default)]
    #[schema(value_type = Option<String>, format = DateTime)]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub performed_by: Option<String>,
    #[serde(default)]
    #[schema(value_type = Option<String>)]
    pub sync_status: Option<SyncStatus>,
    #[serde(default)]
    #[schema(value_type = Option<Object>)]
    pub metadata: Option<Map<String, Value>>,
}

impl From<EventPatchReq> for CareEventPatch {
    fn from(req: EventPatchReq) -> Self {
        CareEventPatch {
            patient_id: req.patient_id,
            event_type: req.event_type,
            timestamp: req.timestamp,
            performed_by: req.performed_by,
            sync_status: req.sync_status,
            metadata: req.metadata,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct CareEventRes {
    #[schema(value_type = Object)]
    pub event: CareEvent,
}

#[derive(Serialize, ToSchema)]
pub struct HistoryRes {
    #[schema(value_type = Vec<Object>)]
    pub events: Vec<CareEvent>,
}

#[derive(Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HistoryStatsRes {
    pub total_events: usize,
    pub events_by_type: BTreeMap<String, usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>, format = DateTime)]
    pub oldest_event: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>, format = DateTime)]
    pub newest_event: Option<DateTime<Utc>>,
}

impl From<HistoryStats> for HistoryStatsRes {
    fn from(stats: HistoryStats) -> Self {
        Self {
            total_events: stats.total_events,
            events_by_type: stats.events_by_type,
            oldest_event: stats.oldest_event,
            newest_event: stats.newest_event,
        }
    }
}

/// Query for `GET /history`. Dates accept RFC 3339 or `YYYY-MM-DD`.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct HistoryQuery {
    pub patient_id: Option<String>,
    pub event_type: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
    /// `ASC` or `DESC` (default).
    pub order: Option<String>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ExportQuery {
    /// `JSON` (default) or `CSV`.
    pub format: Option<String>,
    pub patient_id: Option<String>,
    /// `ASC` (default) or `DESC`.
    pub order: Option<String>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct StatsQuery {
    pub patient_id: Option<String>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct AlternativesQuery {
    pub patient_id: Option<String>,
    #[serde(rename = "type")]
    #[param(value_type = Option<String>)]
    pub restraint_type: Option<RestraintType>,
}

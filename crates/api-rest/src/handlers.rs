//! Route handlers. Each one delegates to a single engine operation.

use crate::dto::{
    AdherenceWindowReq, AdherenceWindowRes, AlternativesQuery, AlternativesRes, BedElevationReq,
    CareEventRes, ErrorRes, EventPatchReq, ExportQuery, HealthRes, HistoryQuery, HistoryRes,
    HistoryStatsRes, NewEventReq, PatientReq, RestraintReq, RestraintRes, RestraintValidationRes,
    RiskAlertsRes, RiskScoreRes, StatsQuery, ValidationRes,
};
use crate::error::{ApiError, JsonBody};
use crate::AppState;
use axum::{
    extract::{Path as AxumPath, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json},
};
use careguard_core::constants::ADHERENCE_WINDOW_MINUTES;
use careguard_core::fall_risk::calculate_risk_score;
use careguard_core::history::{
    export_history_with_timestamps, ExportFormat, HistoryFilter, SortOrder,
};
use careguard_core::restraint::{
    classify_restraint, evaluate_restraint, get_alternative_strategies, require_justification,
    StrategyContext,
};
use careguard_core::validation::{
    parse_date, validate_adherence_window, validate_bed_elevation, DateRange,
};
use careguard_core::{CareError, CareResult, Patient, RecordId};
use chrono::{DateTime, Utc};

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
/// Liveness probe for monitoring and load balancers.
#[axum::debug_handler]
pub async fn health(State(_state): State<AppState>) -> Json<HealthRes> {
    Json(HealthRes {
        ok: true,
        message: "CareGuard REST API is alive".into(),
    })
}

#[utoipa::path(
    post,
    path = "/validation/bed-elevation",
    request_body = BedElevationReq,
    responses(
        (status = 200, description = "Validation outcome", body = ValidationRes)
    )
)]
#[axum::debug_handler]
pub async fn bed_elevation(
    State(_state): State<AppState>,
    JsonBody(req): JsonBody<BedElevationReq>,
) -> Json<ValidationRes> {
    Json(validate_bed_elevation(req.degrees).into())
}

#[utoipa::path(
    post,
    path = "/validation/adherence-window",
    request_body = AdherenceWindowReq,
    responses(
        (status = 200, description = "Whether the dose was given inside the window", body = AdherenceWindowRes)
    )
)]
#[axum::debug_handler]
pub async fn adherence_window(
    State(_state): State<AppState>,
    JsonBody(req): JsonBody<AdherenceWindowReq>,
) -> Json<AdherenceWindowRes> {
    Json(AdherenceWindowRes {
        within_window: validate_adherence_window(req.scheduled, req.actual),
        window_minutes: ADHERENCE_WINDOW_MINUTES,
    })
}

#[utoipa::path(
    post,
    path = "/restraints/validate",
    request_body = RestraintReq,
    responses(
        (status = 200, description = "Classified type and validation outcome", body = RestraintValidationRes)
    )
)]
/// Classifies and validates a restraint without storing it.
#[axum::debug_handler]
pub async fn validate_restraint(
    State(_state): State<AppState>,
    JsonBody(req): JsonBody<RestraintReq>,
) -> Json<RestraintValidationRes> {
    let mut restraint = req.into_restraint();
    let restraint_type = classify_restraint(&restraint);
    restraint.restraint_type = Some(restraint_type);

    let result = evaluate_restraint(&restraint).to_validation_result();
    Json(RestraintValidationRes {
        restraint_type,
        is_valid: result.is_valid,
        error_code: result.error_code,
        message: result.message,
    })
}

#[utoipa::path(
    post,
    path = "/restraints",
    request_body = RestraintReq,
    responses(
        (status = 201, description = "Restraint accepted and recorded", body = RestraintRes),
        (status = 409, description = "Chemical restraint blocked", body = ErrorRes),
        (status = 422, description = "Justification or alternatives missing", body = ErrorRes),
        (status = 500, description = "Storage failure", body = ErrorRes)
    )
)]
/// Records a restraint if it passes every compliance check.
///
/// # Errors
/// Returns `409 Conflict` for behavioural chemical restraint and `422 Unprocessable Entity` when
/// the justification or alternatives are missing.
#[axum::debug_handler]
pub async fn record_restraint(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<RestraintReq>,
) -> Result<(StatusCode, Json<RestraintRes>), ApiError> {
    let restraint = state
        .engine
        .restraints
        .record_restraint(req.into_restraint())
        .await?;
    let justification_form = require_justification(&restraint);

    Ok((
        StatusCode::CREATED,
        Json(RestraintRes {
            restraint,
            justification_form,
        }),
    ))
}

#[utoipa::path(
    get,
    path = "/restraints/alternatives",
    params(AlternativesQuery),
    responses(
        (status = 200, description = "Non-restrictive care strategies", body = AlternativesRes)
    )
)]
#[axum::debug_handler]
pub async fn alternatives(
    State(_state): State<AppState>,
    Query(query): Query<AlternativesQuery>,
) -> Json<AlternativesRes> {
    let context = StrategyContext {
        patient_id: query.patient_id,
        restraint_type: query.restraint_type,
    };
    Json(AlternativesRes {
        strategies: get_alternative_strategies(&context),
    })
}

#[utoipa::path(
    post,
    path = "/fall-risk/score",
    request_body = PatientReq,
    responses(
        (status = 200, description = "Weighted fall-risk score", body = RiskScoreRes)
    )
)]
#[axum::debug_handler]
pub async fn risk_score(
    State(_state): State<AppState>,
    JsonBody(req): JsonBody<PatientReq>,
) -> Json<RiskScoreRes> {
    let patient = Patient::from(req);
    Json(calculate_risk_score(&patient).into())
}

#[utoipa::path(
    post,
    path = "/fall-risk/alerts",
    request_body = PatientReq,
    responses(
        (status = 200, description = "Alerts generated and stored", body = RiskAlertsRes),
        (status = 500, description = "Storage failure", body = ErrorRes)
    )
)]
#[axum::debug_handler]
pub async fn risk_alerts(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<PatientReq>,
) -> Result<Json<RiskAlertsRes>, ApiError> {
    let patient = Patient::from(req);
    let alerts = state.engine.fall_risk.get_risk_alerts(&patient).await?;
    Ok(Json(RiskAlertsRes { alerts }))
}

#[utoipa::path(
    get,
    path = "/history",
    params(HistoryQuery),
    responses(
        (status = 200, description = "Matching care events in order", body = HistoryRes),
        (status = 400, description = "Bad filter", body = ErrorRes),
        (status = 500, description = "Storage failure", body = ErrorRes)
    )
)]
#[axum::debug_handler]
pub async fn list_history(
    State(state): State<AppState>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<HistoryRes>, ApiError> {
    let (filter, order) = history_filter(query)?;
    let events = state
        .engine
        .history
        .get_filtered_history(&filter, order)
        .await?;
    Ok(Json(HistoryRes { events }))
}

#[utoipa::path(
    post,
    path = "/history",
    request_body = NewEventReq,
    responses(
        (status = 201, description = "Care event recorded", body = CareEventRes),
        (status = 400, description = "Missing patient or performer", body = ErrorRes),
        (status = 500, description = "Storage failure", body = ErrorRes)
    )
)]
#[axum::debug_handler]
pub async fn record_event(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<NewEventReq>,
) -> Result<(StatusCode, Json<CareEventRes>), ApiError> {
    let event = state.engine.history.record_event(req.into()).await?;
    Ok((StatusCode::CREATED, Json(CareEventRes { event })))
}

#[utoipa::path(
    patch,
    path = "/history/{id}",
    request_body = EventPatchReq,
    params(("id" = String, Path, description = "Care event id (32 hex characters)")),
    responses(
        (status = 200, description = "Merged care event", body = CareEventRes),
        (status = 400, description = "Malformed id", body = ErrorRes),
        (status = 404, description = "No such care event", body = ErrorRes),
        (status = 409, description = "Care event is older than 24 hours", body = ErrorRes)
    )
)]
#[axum::debug_handler]
pub async fn update_event(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
    JsonBody(req): JsonBody<EventPatchReq>,
) -> Result<Json<CareEventRes>, ApiError> {
    let id = parse_id(&id)?;
    let event = state.engine.history.update_event(&id, req.into()).await?;
    Ok(Json(CareEventRes { event }))
}

#[utoipa::path(
    delete,
    path = "/history/{id}",
    params(("id" = String, Path, description = "Care event id (32 hex characters)")),
    responses(
        (status = 204, description = "Care event deleted"),
        (status = 400, description = "Malformed id", body = ErrorRes),
        (status = 404, description = "No such care event", body = ErrorRes),
        (status = 409, description = "Care event is older than 24 hours", body = ErrorRes)
    )
)]
#[axum::debug_handler]
pub async fn delete_event(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_id(&id)?;
    state.engine.history.delete_event(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/history/export",
    params(ExportQuery),
    responses(
        (status = 200, description = "Rendered JSON array or CSV text", body = String),
        (status = 400, description = "Unknown format", body = ErrorRes),
        (status = 500, description = "Storage or export failure", body = ErrorRes)
    )
)]
#[axum::debug_handler]
pub async fn export_history(
    State(state): State<AppState>,
    Query(query): Query<ExportQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let format = parse_or_default::<ExportFormat>(query.format.as_deref())?;
    let order = match query.order.as_deref() {
        Some(raw) => raw.parse::<SortOrder>()?,
        None => SortOrder::Asc,
    };

    let events = state
        .engine
        .history
        .get_history(query.patient_id.as_deref(), order)
        .await?;
    let export = export_history_with_timestamps(&events, format)?;

    Ok((
        [(header::CONTENT_TYPE, export.format.content_type())],
        export.data,
    ))
}

#[utoipa::path(
    get,
    path = "/history/stats",
    params(StatsQuery),
    responses(
        (status = 200, description = "Audit trail summary", body = HistoryStatsRes),
        (status = 500, description = "Storage failure", body = ErrorRes)
    )
)]
#[axum::debug_handler]
pub async fn history_stats(
    State(state): State<AppState>,
    Query(query): Query<StatsQuery>,
) -> Result<Json<HistoryStatsRes>, ApiError> {
    let stats = state
        .engine
        .history
        .get_history_stats(query.patient_id.as_deref())
        .await?;
    Ok(Json(stats.into()))
}

fn parse_id(raw: &str) -> CareResult<RecordId> {
    RecordId::parse(raw).map_err(|e| CareError::invalid_format(e.to_string()))
}

fn parse_or_default<T>(raw: Option<&str>) -> CareResult<T>
where
    T: std::str::FromStr<Err = CareError> + Default,
{
    raw.map(str::parse::<T>)
        .transpose()
        .map(Option::unwrap_or_default)
}

fn parse_bound(raw: &str) -> CareResult<DateTime<Utc>> {
    parse_date(raw).ok_or_else(|| CareError::invalid_format(format!("invalid date '{raw}'")))
}

/// Builds the engine filter from query parameters. A single date bound leaves the other side
/// open.
fn history_filter(query: HistoryQuery) -> CareResult<(HistoryFilter, SortOrder)> {
    let date_range = match (query.start.as_deref(), query.end.as_deref()) {
        (None, None) => None,
        (start, end) => {
            let start = start.map(parse_bound).transpose()?;
            let end = end.map(parse_bound).transpose()?;
            Some(DateRange::new(
                start.unwrap_or(DateTime::<Utc>::MIN_UTC),
                end.unwrap_or(DateTime::<Utc>::MAX_UTC),
            )?)
        }
    };

    let filter = HistoryFilter {
        patient_id: query.patient_id,
        event_type: query.event_type.as_deref().map(str::parse).transpose()?,
        date_range,
    };
    let order = parse_or_default::<SortOrder>(query.order.as_deref())?;

    Ok((filter, order))
}

#[cfg(test)]
mod tests {
    use super::*;
    use careguard_core::history::CareEventType;

    #[test]
    fn test_history_filter_parses_query() {
        let query = HistoryQuery {
            patient_id: Some("patient-1".into()),
            event_type: Some("medication".into()),
            start: Some("2026-04-01".into()),
            end: None,
            order: Some("asc".into()),
        };

        let (filter, order) = history_filter(query).unwrap();
        assert_eq!(filter.event_type, Some(CareEventType::Medication));
        assert_eq!(order, SortOrder::Asc);
        let range = filter.date_range.unwrap();
        assert_eq!(range.start(), parse_date("2026-04-01").unwrap());
        assert_eq!(range.end(), DateTime::<Utc>::MAX_UTC);
    }

    #[test]
    fn test_history_filter_rejects_bad_values() {
        let bad_date = HistoryQuery {
            start: Some("yesterday".into()),
            ..HistoryQuery::default()
        };
        assert!(history_filter(bad_date).is_err());

        let inverted = HistoryQuery {
            start: Some("2026-05-02".into()),
            end: Some("2026-05-01".into()),
            ..HistoryQuery::default()
        };
        assert!(history_filter(inverted).is_err());

        let bad_order = HistoryQuery {
            order: Some("newest".into()),
            ..HistoryQuery::default()
        };
        assert!(history_filter(bad_order).is_err());
    }

    #[test]
    fn test_defaults_when_query_is_empty() {
        let (filter, order) = history_filter(HistoryQuery::default()).unwrap();
        assert_eq!(filter, HistoryFilter::default());
        assert_eq!(order, SortOrder::Desc);
    }
}

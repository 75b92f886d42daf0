//! # API REST
//!
//! REST API implementation for CareGuard.
//!
//! Handles:
//! - HTTP endpoints with axum
//! - OpenAPI/Swagger documentation
//! - REST-specific concerns (JSON bodies, status mapping, CORS)
//!
//! All rules live in `careguard-core`; handlers only translate requests and errors.

#![warn(rust_2018_idioms)]

pub mod dto;
pub mod error;
pub mod handlers;

use axum::{
    routing::{get, patch, post},
    Router,
};
use careguard_core::CareEngine;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Application state shared by every handler.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<CareEngine>,
}

impl AppState {
    pub fn new(engine: CareEngine) -> Self {
        Self {
            engine: Arc::new(engine),
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::health,
        handlers::bed_elevation,
        handlers::adherence_window,
        handlers::validate_restraint,
        handlers::record_restraint,
        handlers::alternatives,
        handlers::risk_score,
        handlers::risk_alerts,
        handlers::list_history,
        handlers::record_event,
        handlers::update_event,
        handlers::delete_event,
        handlers::export_history,
        handlers::history_stats,
    ),
    components(schemas(
        dto::HealthRes,
        dto::ErrorRes,
        dto::ValidationRes,
        dto::BedElevationReq,
        dto::AdherenceWindowReq,
        dto::AdherenceWindowRes,
        dto::RestraintReq,
        dto::RestraintValidationRes,
        dto::RestraintRes,
        dto::AlternativesRes,
        dto::PatientReq,
        dto::RiskScoreRes,
        dto::RiskAlertsRes,
        dto::NewEventReq,
        dto::EventPatchReq,
        dto::CareEventRes,
        dto::HistoryRes,
        dto::HistoryStatsRes,
    ))
)]
pub struct ApiDoc;

/// Builds the router with Swagger UI at `/swagger-ui`.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/validation/bed-elevation", post(handlers::bed_elevation))
        .route(
            "/validation/adherence-window",
            post(handlers::adherence_window),
        )
        .route("/restraints", post(handlers::record_restraint))
        .route("/restraints/validate", post(handlers::validate_restraint))
        .route("/restraints/alternatives", get(handlers::alternatives))
        .route("/fall-risk/score", post(handlers::risk_score))
        .route("/fall-risk/alerts", post(handlers::risk_alerts))
        .route(
            "/history",
            get(handlers::list_history).post(handlers::record_event),
        )
        .route("/history/export", get(handlers::export_history))
        .route("/history/stats", get(handlers::history_stats))
        .route(
            "/history/:id",
            patch(handlers::update_event).delete(handlers::delete_event),
        )
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Binds `addr` and serves the API until the process stops.
///
/// # Errors
/// Returns an error if the address cannot be bound or the server fails while running.
pub async fn serve(addr: &str, state: AppState) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("++ CareGuard REST listening on {}", addr);
    axum::serve(listener, app(state)).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, Method, Request, StatusCode};
    use http_body_util::BodyExt;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn test_app() -> Router {
        app(AppState::new(CareEngine::in_memory()))
    }

    async fn send(
        app: &Router,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Vec<u8>) {
        let mut builder = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(value) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(value.to_string())
            }
            None => Body::empty(),
        };

        let response = app
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, bytes.to_vec())
    }

    async fn send_json(
        app: &Router,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let (status, bytes) = send(app, method, uri, body).await;
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = send_json(&test_app(), Method::GET, "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["ok"], true);
    }

    #[tokio::test]
    async fn test_bed_elevation_validation() {
        let app = test_app();

        let (status, body) = send_json(
            &app,
            Method::POST,
            "/validation/bed-elevation",
            Some(json!({"degrees": 45})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["isValid"], false);
        assert_eq!(body["errorCode"], "VALIDATION_BED_ELEVATION");

        let (_, body) = send_json(
            &app,
            Method::POST,
            "/validation/bed-elevation",
            Some(json!({"degrees": 30})),
        )
        .await;
        assert_eq!(body["isValid"], true);
    }

    #[tokio::test]
    async fn test_unreadable_body_uses_error_body() {
        let app = test_app();

        let (status, body) = send_json(
            &app,
            Method::POST,
            "/validation/bed-elevation",
            Some(json!({"degrees": "abc"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "VALIDATION_INVALID_FORMAT");
        assert!(body["message"].as_str().unwrap().contains("invalid request body"));

        let request = Request::builder()
            .method(Method::POST)
            .uri("/history")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{ not json"))
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["code"], "VALIDATION_INVALID_FORMAT");
    }

    #[tokio::test]
    async fn test_adherence_window() {
        let (status, body) = send_json(
            &test_app(),
            Method::POST,
            "/validation/adherence-window",
            Some(json!({
                "scheduled": "2026-03-01T08:00:00Z",
                "actual": "2026-03-01T09:30:00Z"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["withinWindow"], true);
        assert_eq!(body["windowMinutes"], 90);
    }

    #[tokio::test]
    async fn test_validate_restraint_classifies_and_blocks() {
        let (status, body) = send_json(
            &test_app(),
            Method::POST,
            "/restraints/validate",
            Some(json!({
                "patientId": "patient-1",
                "specificType": "Sedante lorazepam",
                "justification": "Paciente agitado y no coopera",
                "alternatives": ["Música"]
            })),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["restraintType"], "CHEMICAL");
        assert_eq!(body["isValid"], false);
        assert_eq!(body["errorCode"], "BUSINESS_CHEMICAL_RESTRAINT_BLOCKED");
    }

    #[tokio::test]
    async fn test_record_restraint_statuses() {
        let app = test_app();

        let (status, body) = send_json(
            &app,
            Method::POST,
            "/restraints",
            Some(json!({
                "patientId": "patient-1",
                "type": "CHEMICAL",
                "specificType": "Benzodiacepina diazepam",
                "justification": "Trastorno de ansiedad clínica diagnosticado",
                "alternatives": ["Técnicas de respiración"],
                "authorizedBy": "Dra. Ruiz"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["restraint"]["type"], "CHEMICAL");
        assert_eq!(body["justificationForm"]["authorizedBy"], "Dra. Ruiz");

        let (status, body) = send_json(
            &app,
            Method::POST,
            "/restraints",
            Some(json!({
                "patientId": "patient-1",
                "type": "CHEMICAL",
                "specificType": "Sedative",
                "justification": "Aggressive behavior at night",
                "alternatives": ["Music"]
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["code"], "BUSINESS_CHEMICAL_RESTRAINT_BLOCKED");

        let (status, body) = send_json(
            &app,
            Method::POST,
            "/restraints",
            Some(json!({
                "patientId": "patient-1",
                "specificType": "Bed rail",
                "justification": "Fell twice"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["code"], "BUSINESS_JUSTIFICATION_REQUIRED");
    }

    #[tokio::test]
    async fn test_alternatives() {
        let (status, body) = send_json(
            &test_app(),
            Method::GET,
            "/restraints/alternatives?type=CHEMICAL",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["strategies"].as_array().unwrap().len() >= 3);
    }

    #[tokio::test]
    async fn test_fall_risk_score_and_alerts() {
        let app = test_app();
        let patient = json!({
            "id": "patient-4",
            "fullName": "José Pérez",
            "riskFactors": [
                {"type": "SEDATIVES", "severity": "HIGH", "notes": "", "assessedAt": "2026-03-01T09:00:00Z"},
                {"type": "MOBILITY_ISSUES", "severity": "MEDIUM", "notes": "", "assessedAt": "2026-03-01T09:00:00Z"},
                {"type": "RECENT_SURGERY", "severity": "LOW", "notes": "", "assessedAt": "2026-03-01T09:00:00Z"}
            ]
        });

        let (status, body) =
            send_json(&app, Method::POST, "/fall-risk/score", Some(patient.clone())).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total"], 75.0);
        assert_eq!(body["level"], "HIGH");

        let (status, body) =
            send_json(&app, Method::POST, "/fall-risk/alerts", Some(patient)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["alerts"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_history_lifecycle() {
        let app = test_app();

        let (status, created) = send_json(
            &app,
            Method::POST,
            "/history",
            Some(json!({
                "patientId": "patient-1",
                "eventType": "MEDICATION",
                "timestamp": "2026-04-01T08:00:00.250Z",
                "performedBy": "nurse-ana",
                "metadata": {"drug": "paracetamol", "mg": 500}
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let id = created["event"]["id"].as_str().unwrap().to_string();

        let (status, body) = send_json(
            &app,
            Method::GET,
            "/history?patientId=patient-1&eventType=MEDICATION&start=2026-04-01",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["events"].as_array().unwrap().len(), 1);

        let (status, body) = send_json(
            &app,
            Method::PATCH,
            &format!("/history/{id}"),
            Some(json!({"syncStatus": "SYNCED", "id": "ignored"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["event"]["syncStatus"], "SYNCED");
        assert_eq!(body["event"]["id"], id);

        let (status, body) = send_json(&app, Method::GET, "/history/stats", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["totalEvents"], 1);
        assert_eq!(body["eventsByType"]["MEDICATION"], 1);

        let (status, bytes) = send(&app, Method::GET, "/history/export?format=csv", None).await;
        assert_eq!(status, StatusCode::OK);
        let csv = String::from_utf8(bytes).unwrap();
        assert!(csv.starts_with("ID,Patient ID,Event Type"));
        assert!(csv.contains("2026-04-01T08:00:00.250Z"));

        let (status, _) = send(&app, Method::DELETE, &format!("/history/{id}"), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, body) =
            send_json(&app, Method::DELETE, &format!("/history/{id}"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], "VALIDATION_REQUIRED_FIELD");
    }

    #[tokio::test]
    async fn test_history_rejects_bad_input() {
        let app = test_app();

        let (status, body) = send_json(
            &app,
            Method::POST,
            "/history",
            Some(json!({"eventType": "NOTE", "performedBy": "nurse-ana"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "VALIDATION_REQUIRED_FIELD");

        let (status, body) = send_json(&app, Method::DELETE, "/history/not-an-id", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "VALIDATION_INVALID_FORMAT");

        let (status, _) =
            send_json(&app, Method::GET, "/history/export?format=xml", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}

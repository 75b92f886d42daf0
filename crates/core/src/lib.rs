//! # CareGuard Core
//!
//! Clinical safety rules and audit trail for at-home geriatric care.
//!
//! This crate contains the engine only:
//! - Validation primitives shared by every module
//! - Restraint compliance (classification, behavioural chemical-restraint blocking,
//!   non-restrictive alternatives)
//! - Fall-risk scoring and alerts
//! - The immutable care-event history with filtering and export
//! - The key-value store interface plus in-memory and sharded JSON-file implementations
//!
//! **No API concerns**: HTTP servers and command-line parsing belong in `api-rest` and
//! `careguard-cli`.

pub mod config;
pub mod constants;
pub mod error;
pub mod fall_risk;
pub mod history;
pub mod restraint;
pub mod store;
pub mod validation;

pub use careguard_uuid::RecordId;
pub use config::CoreConfig;
pub use error::{CareError, CareResult, ErrorKind};
pub use fall_risk::{FallRiskService, Patient, RiskAlert, RiskScore};
pub use history::{CareEvent, CareEventPatch, HistoryStore, NewCareEvent};
pub use restraint::{Restraint, RestraintDecision, RestraintService, RestraintType};
pub use store::{JsonFileStore, KeyValueStore, MemoryStore, StoreError};
pub use validation::ValidationResult;

use std::sync::Arc;

/// The engine's services wired to one backing store.
///
/// Built once at startup and shared behind `Arc`; every service is cheap to clone.
#[derive(Clone)]
pub struct CareEngine {
    pub restraints: RestraintService,
    pub fall_risk: FallRiskService,
    pub history: HistoryStore,
}

impl CareEngine {
    /// Opens the JSON-file collections under the configured data directory, creating them if
    /// needed.
    ///
    /// # Errors
    ///
    /// Returns `SYSTEM_STORAGE_FAILURE` if a collection directory cannot be created.
    pub async fn open(cfg: &CoreConfig) -> CareResult<Self> {
        let data_dir = cfg.data_dir();
        let restraints = JsonFileStore::<Restraint>::open(data_dir).await?;
        let alerts = JsonFileStore::<RiskAlert>::open(data_dir).await?;
        let events = JsonFileStore::<CareEvent>::open(data_dir).await?;

        tracing::info!("opened care data at {}", data_dir.display());

        Ok(Self {
            restraints: RestraintService::new(Arc::new(restraints)),
            fall_risk: FallRiskService::new(Arc::new(alerts)),
            history: HistoryStore::new(Arc::new(events)),
        })
    }

    /// An engine over in-process stores.
    pub fn in_memory() -> Self {
        Self {
            restraints: RestraintService::new(Arc::new(MemoryStore::<Restraint>::new())),
            fall_risk: FallRiskService::new(Arc::new(MemoryStore::<RiskAlert>::new())),
            history: HistoryStore::new(Arc::new(MemoryStore::<CareEvent>::new())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::{CareEventType, SortOrder};
    use chrono::Utc;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_open_creates_collections_and_persists_events() {
        let temp = TempDir::new().unwrap();
        let cfg = CoreConfig::new(temp.path().join("care_data")).unwrap();

        let engine = CareEngine::open(&cfg).await.unwrap();
        for collection in [
            constants::CARE_EVENTS_COLLECTION,
            constants::RESTRAINTS_COLLECTION,
            constants::RISK_ALERTS_COLLECTION,
        ] {
            assert!(cfg.collection_dir(collection).is_dir(), "{collection}");
        }

        let event = engine
            .history
            .record_event(NewCareEvent {
                patient_id: "patient-1".into(),
                event_type: CareEventType::Repositioning,
                timestamp: Utc::now(),
                performed_by: "nurse-ana".into(),
                sync_status: None,
                metadata: Default::default(),
            })
            .await
            .unwrap();

        let reopened = CareEngine::open(&cfg).await.unwrap();
        let history = reopened
            .history
            .get_history(Some("patient-1"), SortOrder::Desc)
            .await
            .unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].id, event.id);
        assert_eq!(history[0].timestamp, event.timestamp);
    }
}

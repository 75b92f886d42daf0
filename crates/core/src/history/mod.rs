//! Immutable care-event history.
//!
//! The audit trail is append-mostly. A care event may be edited or deleted only during the first
//! 24 hours after it was created; from then on [`is_immutable`] is the single authority that locks
//! it. Retrieval is chronological by event `timestamp` and filters compose with logical AND.

pub mod export;
pub mod filter;

pub use export::{export_history_with_timestamps, ExportFormat, HistoryExport};
pub use filter::{filter_by_date_range, filter_by_event_type, sort_events, HistoryFilter, SortOrder};

use crate::constants::{
    CARE_EVENTS_COLLECTION, EVENT_TYPE_INDEX, IMMUTABILITY_WINDOW_HOURS, PATIENT_ID_INDEX,
};
use crate::error::{CareError, CareResult};
use crate::store::{KeyValueStore, StoredRecord};
use crate::validation::validate_required_field;
use careguard_uuid::RecordId;
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CareEventType {
    Medication,
    VitalSigns,
    Repositioning,
    Hygiene,
    Nutrition,
    FallRiskAssessment,
    Restraint,
    Incident,
    Note,
}

impl CareEventType {
    pub const ALL: [CareEventType; 9] = [
        CareEventType::Medication,
        CareEventType::VitalSigns,
        CareEventType::Repositioning,
        CareEventType::Hygiene,
        CareEventType::Nutrition,
        CareEventType::FallRiskAssessment,
        CareEventType::Restraint,
        CareEventType::Incident,
        CareEventType::Note,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CareEventType::Medication => "MEDICATION",
            CareEventType::VitalSigns => "VITAL_SIGNS",
            CareEventType::Repositioning => "REPOSITIONING",
            CareEventType::Hygiene => "HYGIENE",
            CareEventType::Nutrition => "NUTRITION",
            CareEventType::FallRiskAssessment => "FALL_RISK_ASSESSMENT",
            CareEventType::Restraint => "RESTRAINT",
            CareEventType::Incident => "INCIDENT",
            CareEventType::Note => "NOTE",
        }
    }
}

impl fmt::Display for CareEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CareEventType {
    type Err = CareError;

    fn from_str(s: &str) -> CareResult<Self> {
        let wanted = s.trim().to_ascii_uppercase().replace('-', "_");
        CareEventType::ALL
            .into_iter()
            .find(|t| t.as_str() == wanted)
            .ok_or_else(|| CareError::invalid_format(format!("unknown event type '{s}'")))
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SyncStatus {
    #[default]
    Pending,
    Synced,
    Error,
}

impl SyncStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncStatus::Pending => "PENDING",
            SyncStatus::Synced => "SYNCED",
            SyncStatus::Error => "ERROR",
        }
    }
}

/// One entry in the audit trail.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CareEvent {
    pub id: RecordId,
    pub patient_id: String,
    pub event_type: CareEventType,
    pub timestamp: DateTime<Utc>,
    pub performed_by: String,
    #[serde(default)]
    pub sync_status: SyncStatus,
    /// Arbitrary JSON; round-trips unchanged through storage and export.
    #[serde(default)]
    pub metadata: Map<String, Value>,
    pub created_at: DateTime<Utc>,
}

impl CareEvent {
    /// A pending event created now.
    pub fn new(
        patient_id: impl Into<String>,
        event_type: CareEventType,
        performed_by: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id: RecordId::new(),
            patient_id: patient_id.into(),
            event_type,
            timestamp,
            performed_by: performed_by.into(),
            sync_status: SyncStatus::Pending,
            metadata: Map::new(),
            created_at: Utc::now(),
        }
    }
}

impl StoredRecord for CareEvent {
    const COLLECTION: &'static str = CARE_EVENTS_COLLECTION;
    const INDEXES: &'static [&'static str] = &[PATIENT_ID_INDEX, EVENT_TYPE_INDEX];

    fn record_id(&self) -> RecordId {
        self.id
    }

    fn index_value(&self, index: &str) -> Option<String> {
        match index {
            PATIENT_ID_INDEX => Some(self.patient_id.clone()),
            EVENT_TYPE_INDEX => Some(self.event_type.as_str().to_string()),
            _ => None,
        }
    }
}

/// Input to [`HistoryStore::record_event`]. Identity and creation time are assigned on write.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCareEvent {
    #[serde(default)]
    pub patient_id: String,
    pub event_type: CareEventType,
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub performed_by: String,
    #[serde(default)]
    pub sync_status: Option<SyncStatus>,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

/// Partial update of a care event. `id` and `createdAt` are not patchable.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CareEventPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patient_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_type: Option<CareEventType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub performed_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sync_status: Option<SyncStatus>,
    /// Replaces the whole metadata map when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
}

impl CareEventPatch {
    pub fn apply(self, event: &mut CareEvent) {
        if let Some(patient_id) = self.patient_id {
            event.patient_id = patient_id;
        }
        if let Some(event_type) = self.event_type {
            event.event_type = event_type;
        }
        if let Some(timestamp) = self.timestamp {
            event.timestamp = timestamp;
        }
        if let Some(performed_by) = self.performed_by {
            event.performed_by = performed_by;
        }
        if let Some(sync_status) = self.sync_status {
            event.sync_status = sync_status;
        }
        if let Some(metadata) = self.metadata {
            event.metadata = metadata;
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryStats {
    pub total_events: usize,
    /// Counts keyed by the event type's wire name.
    pub events_by_type: BTreeMap<String, usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oldest_event: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub newest_event: Option<DateTime<Utc>>,
}

/// ISO-8601 UTC with millisecond precision, e.g. `2026-03-01T08:00:00.000Z`.
pub fn iso_timestamp(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub fn is_immutable(event: &CareEvent) -> bool {
    is_immutable_at(event, Utc::now())
}

/// True once `now - createdAt` reaches the immutability window.
pub fn is_immutable_at(event: &CareEvent, now: DateTime<Utc>) -> bool {
    now - event.created_at >= Duration::hours(IMMUTABILITY_WINDOW_HOURS)
}

/// Audit-trail service over a care-event collection.
#[derive(Clone)]
pub struct HistoryStore {
    store: Arc<dyn KeyValueStore<CareEvent>>,
}

impl HistoryStore {
    pub fn new(store: Arc<dyn KeyValueStore<CareEvent>>) -> Self {
        Self { store }
    }

    /// Validates and appends a new event.
    ///
    /// # Errors
    ///
    /// `VALIDATION_REQUIRED_FIELD` if `patientId` or `performedBy` is blank, or
    /// `SYSTEM_STORAGE_FAILURE` if the write fails.
    pub async fn record_event(&self, new_event: NewCareEvent) -> CareResult<CareEvent> {
        validate_required_field(new_event.patient_id.as_str(), "patientId").into_result()?;
        validate_required_field(new_event.performed_by.as_str(), "performedBy").into_result()?;

        let mut event = CareEvent::new(
            new_event.patient_id,
            new_event.event_type,
            new_event.performed_by,
            new_event.timestamp,
        );
        event.sync_status = new_event.sync_status.unwrap_or_default();
        event.metadata = new_event.metadata;

        self.store.put(&event).await?;
        tracing::info!(
            "recorded {} event {} for patient {}",
            event.event_type,
            event.id,
            event.patient_id
        );

        Ok(event)
    }

    pub async fn get_event(&self, id: &RecordId) -> CareResult<Option<CareEvent>> {
        Ok(self.store.get_by_id(id).await?)
    }

    /// All events, or one patient's, ordered by `timestamp`.
    pub async fn get_history(
        &self,
        patient_id: Option<&str>,
        order: SortOrder,
    ) -> CareResult<Vec<CareEvent>> {
        let mut events = match patient_id {
            Some(pid) => self.store.get_by_index(PATIENT_ID_INDEX, pid).await?,
            None => self.store.get_all().await?,
        };
        sort_events(&mut events, order);

        tracing::debug!("loaded {} care event(s)", events.len());
        Ok(events)
    }

    pub async fn get_filtered_history(
        &self,
        filter: &HistoryFilter,
        order: SortOrder,
    ) -> CareResult<Vec<CareEvent>> {
        let events = self
            .get_history(filter.patient_id.as_deref(), order)
            .await?;
        Ok(filter.apply(events))
    }

    /// Merges `patch` into a mutable event and persists it.
    ///
    /// # Errors
    ///
    /// - [`CareError::NotFound`] if no event has this id.
    /// - [`CareError::HistoricalRecordImmutable`] once the event is 24 hours old.
    pub async fn update_event(&self, id: &RecordId, patch: CareEventPatch) -> CareResult<CareEvent> {
        let mut event = self.load_mutable(id).await?;
        patch.apply(&mut event);

        self.store.put(&event).await?;
        tracing::info!("updated care event {}", event.id);

        Ok(event)
    }

    /// Deletes a mutable event. Immutable events are left untouched.
    pub async fn delete_event(&self, id: &RecordId) -> CareResult<()> {
        self.load_mutable(id).await?;

        self.store.delete_by_id(id).await?;
        tracing::info!("deleted care event {}", id);

        Ok(())
    }

    pub async fn get_history_stats(&self, patient_id: Option<&str>) -> CareResult<HistoryStats> {
        let events = self.get_history(patient_id, SortOrder::Asc).await?;

        let mut events_by_type = BTreeMap::new();
        for event in &events {
            *events_by_type
                .entry(event.event_type.as_str().to_string())
                .or_insert(0) += 1;
        }

        Ok(HistoryStats {
            total_events: events.len(),
            events_by_type,
            oldest_event: events.first().map(|e| e.timestamp),
            newest_event: events.last().map(|e| e.timestamp),
        })
    }

    async fn load_mutable(&self, id: &RecordId) -> CareResult<CareEvent> {
        let event = self
            .store
            .get_by_id(id)
            .await?
            .ok_or(CareError::NotFound {
                entity: "care event",
                id: *id,
            })?;

        if is_immutable(&event) {
            tracing::warn!(
                "rejected change to care event {} created at {}",
                event.id,
                iso_timestamp(&event.created_at)
            );
            return Err(CareError::HistoricalRecordImmutable {
                id: event.id,
                created_at: event.created_at,
            });
        }

        Ok(event)
    }
}

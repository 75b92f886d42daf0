//! Constants used throughout the engine.
//!
//! Clinical thresholds live here alongside storage names so the rules and their tests read
//! from a single place.

/// Tolerance either side of a scheduled medication time, in minutes (inclusive).
pub const ADHERENCE_WINDOW_MINUTES: i64 = 90;

/// Age after which a care event is locked against edits and deletion, in hours.
pub const IMMUTABILITY_WINDOW_HOURS: i64 = 24;

/// Lowest permitted head-of-bed elevation, in degrees.
pub const MIN_BED_ELEVATION_DEGREES: f64 = 0.0;

/// Highest permitted head-of-bed elevation, in degrees.
pub const MAX_BED_ELEVATION_DEGREES: f64 = 30.0;

/// Minimum trimmed length of a free-text justification, in characters.
pub const MIN_JUSTIFICATION_CHARS: usize = 3;

/// Default directory for record storage when no explicit directory is configured.
pub const DEFAULT_DATA_DIR: &str = "care_data";

/// Collection name for care events (the audit trail).
pub const CARE_EVENTS_COLLECTION: &str = "care_events";

/// Collection name for accepted restraint records.
pub const RESTRAINTS_COLLECTION: &str = "restraints";

/// Collection name for generated fall-risk alerts.
pub const RISK_ALERTS_COLLECTION: &str = "risk_alerts";

/// Index over the owning patient, shared by every collection.
pub const PATIENT_ID_INDEX: &str = "patientId";

/// Index over care event type.
pub const EVENT_TYPE_INDEX: &str = "eventType";

/// Header row of the CSV history export.
pub const CSV_EXPORT_HEADER: &str =
    "ID,Patient ID,Event Type,Timestamp,Performed By,Sync Status,Created At";

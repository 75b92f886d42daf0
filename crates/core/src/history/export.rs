//! Timestamp-preserving export of care events.
//!
//! Both formats render `timestamp` and `createdAt` as ISO-8601 UTC strings with millisecond
//! precision. CSV values are joined without quoting, so callers must not export values that
//! contain commas.

use super::{iso_timestamp, CareEvent};
use crate::constants::CSV_EXPORT_HEADER;
use crate::error::{CareError, CareResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::str::FromStr;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ExportFormat {
    #[default]
    Json,
    Csv,
}

impl ExportFormat {
    pub fn content_type(&self) -> &'static str {
        match self {
            ExportFormat::Json => "application/json",
            ExportFormat::Csv => "text/csv; charset=utf-8",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = CareError;

    fn from_str(s: &str) -> CareResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(ExportFormat::Json),
            "csv" => Ok(ExportFormat::Csv),
            other => Err(CareError::invalid_format(format!(
                "unknown export format '{other}', expected JSON or CSV"
            ))),
        }
    }
}

/// Rendered export plus the source events, kept verbatim for round-trip checks.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryExport {
    pub format: ExportFormat,
    pub data: String,
    pub events: Vec<CareEvent>,
}

pub fn export_history_with_timestamps(
    events: &[CareEvent],
    format: ExportFormat,
) -> CareResult<HistoryExport> {
    let data = match format {
        ExportFormat::Json => to_json(events)?,
        ExportFormat::Csv => to_csv(events),
    };

    tracing::debug!("exported {} care event(s) as {:?}", events.len(), format);

    Ok(HistoryExport {
        format,
        data,
        events: events.to_vec(),
    })
}

fn to_json(events: &[CareEvent]) -> CareResult<String> {
    let rows = events
        .iter()
        .map(|event| -> CareResult<Value> {
            let mut value = serde_json::to_value(event).map_err(CareError::Export)?;
            if let Value::Object(fields) = &mut value {
                fields.insert("timestamp".into(), iso_timestamp(&event.timestamp).into());
                fields.insert("createdAt".into(), iso_timestamp(&event.created_at).into());
            }
            Ok(value)
        })
        .collect::<CareResult<Vec<Value>>>()?;

    serde_json::to_string_pretty(&rows).map_err(CareError::Export)
}

fn to_csv(events: &[CareEvent]) -> String {
    let mut lines = Vec::with_capacity(events.len() + 1);
    lines.push(CSV_EXPORT_HEADER.to_string());

    for event in events {
        lines.push(
            [
                event.id.to_string(),
                event.patient_id.clone(),
                event.event_type.as_str().to_string(),
                iso_timestamp(&event.timestamp),
                event.performed_by.clone(),
                event.sync_status.as_str().to_string(),
                iso_timestamp(&event.created_at),
            ]
            .join(","),
        );
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::{CareEventType, SyncStatus};
    use chrono::{DateTime, TimeZone, Utc};
    use serde_json::json;

    fn event(millis: i64) -> CareEvent {
        let ts = Utc.timestamp_millis_opt(millis).unwrap();
        let mut event = CareEvent::new("patient-3", CareEventType::VitalSigns, "nurse-ana", ts);
        event.created_at = ts + chrono::Duration::milliseconds(250);
        event
    }

    #[test]
    fn test_json_export_round_trips_timestamps_to_the_millisecond() {
        let mut first = event(1_775_000_000_123);
        first.metadata.insert(
            "vitals".into(),
            json!({"bp": [120, 80], "pulse": 72, "notes": null, "ok": true}),
        );
        let events = vec![first, event(1_775_000_100_007)];

        let export = export_history_with_timestamps(&events, ExportFormat::Json).unwrap();
        let parsed: Vec<Value> = serde_json::from_str(&export.data).unwrap();

        assert_eq!(parsed.len(), events.len());
        for (row, original) in parsed.iter().zip(&events) {
            let ts = row["timestamp"].as_str().unwrap();
            let created = row["createdAt"].as_str().unwrap();
            assert!(ts.ends_with('Z'));
            assert_eq!(ts.len(), "2026-01-01T00:00:00.000Z".len());

            let ts: DateTime<Utc> = ts.parse().unwrap();
            let created: DateTime<Utc> = created.parse().unwrap();
            assert_eq!(ts.timestamp_millis(), original.timestamp.timestamp_millis());
            assert_eq!(
                created.timestamp_millis(),
                original.created_at.timestamp_millis()
            );
            assert_eq!(row["id"], original.id.to_string());
            assert_eq!(row["eventType"], "VITAL_SIGNS");
        }
        assert_eq!(parsed[0]["metadata"]["vitals"]["bp"], json!([120, 80]));
        assert_eq!(export.events, events);
    }

    #[test]
    fn test_csv_export_has_fixed_header_and_one_row_per_event() {
        let mut events = vec![event(1_775_000_000_000), event(1_775_000_060_000)];
        events[1].sync_status = SyncStatus::Synced;

        let export = export_history_with_timestamps(&events, ExportFormat::Csv).unwrap();
        let lines: Vec<&str> = export.data.lines().collect();

        assert_eq!(
            lines[0],
            "ID,Patient ID,Event Type,Timestamp,Performed By,Sync Status,Created At"
        );
        assert_eq!(lines.len(), 3);

        let cols: Vec<&str> = lines[2].split(',').collect();
        assert_eq!(cols.len(), 7);
        assert_eq!(cols[0], events[1].id.to_string());
        assert_eq!(cols[2], "VITAL_SIGNS");
        assert_eq!(cols[3], iso_timestamp(&events[1].timestamp));
        assert_eq!(cols[5], "SYNCED");
    }

    #[test]
    fn test_empty_export() {
        let json = export_history_with_timestamps(&[], ExportFormat::Json).unwrap();
        assert_eq!(json.data, "[]");

        let csv = export_history_with_timestamps(&[], ExportFormat::Csv).unwrap();
        assert_eq!(csv.data, CSV_EXPORT_HEADER);
    }

    #[test]
    fn test_format_parsing() {
        assert_eq!("csv".parse::<ExportFormat>().unwrap(), ExportFormat::Csv);
        assert_eq!("JSON".parse::<ExportFormat>().unwrap(), ExportFormat::Json);
        assert!("xml".parse::<ExportFormat>().is_err());
    }
}

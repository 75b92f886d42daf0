//! Ordering and filtering over the audit trail. Everything here is pure.

use super::{CareEvent, CareEventType};
use crate::error::{CareError, CareResult};
use crate::validation::DateRange;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Chronological direction by event `timestamp`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl FromStr for SortOrder {
    type Err = CareError;

    fn from_str(s: &str) -> CareResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            other => Err(CareError::invalid_format(format!(
                "unknown sort order '{other}', expected ASC or DESC"
            ))),
        }
    }
}

/// Criteria combined with logical AND. Unset criteria match everything.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct HistoryFilter {
    pub patient_id: Option<String>,
    pub event_type: Option<CareEventType>,
    pub date_range: Option<DateRange>,
}

impl HistoryFilter {
    pub fn for_patient(patient_id: impl Into<String>) -> Self {
        Self {
            patient_id: Some(patient_id.into()),
            ..Self::default()
        }
    }

    pub fn with_event_type(mut self, event_type: CareEventType) -> Self {
        self.event_type = Some(event_type);
        self
    }

    pub fn with_date_range(mut self, range: DateRange) -> Self {
        self.date_range = Some(range);
        self
    }

    /// Applies the type and date criteria. `patient_id` is resolved by the store index.
    pub(crate) fn apply(&self, mut events: Vec<CareEvent>) -> Vec<CareEvent> {
        if let Some(event_type) = self.event_type {
            events = filter_by_event_type(events, event_type);
        }
        if let Some(range) = &self.date_range {
            events = filter_by_date_range(events, range);
        }
        events
    }
}

/// Stable sort by `timestamp`; equal timestamps keep their input order.
pub fn sort_events(events: &mut [CareEvent], order: SortOrder) {
    match order {
        SortOrder::Asc => events.sort_by(|a, b| a.timestamp.cmp(&b.timestamp)),
        SortOrder::Desc => events.sort_by(|a, b| b.timestamp.cmp(&a.timestamp)),
    }
}

pub fn filter_by_event_type(events: Vec<CareEvent>, event_type: CareEventType) -> Vec<CareEvent> {
    events
        .into_iter()
        .filter(|e| e.event_type == event_type)
        .collect()
}

/// Keeps events whose `timestamp` falls inside `range`, bounds included.
pub fn filter_by_date_range(events: Vec<CareEvent>, range: &DateRange) -> Vec<CareEvent> {
    events
        .into_iter()
        .filter(|e| range.contains(e.timestamp))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn at(hour: u32, event_type: CareEventType) -> CareEvent {
        let ts = Utc.with_ymd_and_hms(2026, 4, 10, hour, 0, 0).unwrap();
        let mut event = CareEvent::new("patient-1", event_type, "nurse-ana", ts);
        event.created_at = ts;
        event
    }

    #[test]
    fn test_sort_order_parses_case_insensitively() {
        assert_eq!("asc".parse::<SortOrder>().unwrap(), SortOrder::Asc);
        assert_eq!("DESC".parse::<SortOrder>().unwrap(), SortOrder::Desc);
        assert!("sideways".parse::<SortOrder>().is_err());
        assert_eq!(SortOrder::default(), SortOrder::Desc);
    }

    #[test]
    fn test_sort_is_stable_for_equal_timestamps() {
        let first = at(9, CareEventType::Medication);
        let second = at(9, CareEventType::Hygiene);
        let later = at(11, CareEventType::Note);
        let mut events = vec![first.clone(), later.clone(), second.clone()];

        sort_events(&mut events, SortOrder::Asc);
        assert_eq!(events, vec![first.clone(), second.clone(), later.clone()]);

        sort_events(&mut events, SortOrder::Desc);
        assert_eq!(events, vec![later, first, second]);
    }

    #[test]
    fn test_date_range_is_inclusive() {
        let events = vec![
            at(8, CareEventType::Medication),
            at(10, CareEventType::Medication),
            at(12, CareEventType::Medication),
        ];
        let start = events[0].timestamp;
        let end = events[1].timestamp;
        let range = DateRange::new(start, end).unwrap();

        let kept = filter_by_date_range(events, &range);
        assert_eq!(kept.len(), 2);
    }

    #[test]
    fn test_filter_combines_criteria_with_and() {
        let events = vec![
            at(8, CareEventType::Medication),
            at(9, CareEventType::VitalSigns),
            at(20, CareEventType::Medication),
        ];
        let start = events[0].timestamp - Duration::minutes(1);
        let range = DateRange::new(start, start + Duration::hours(3)).unwrap();
        let filter = HistoryFilter::default()
            .with_event_type(CareEventType::Medication)
            .with_date_range(range);

        let kept = filter.apply(events.clone());
        assert_eq!(kept, vec![events[0].clone()]);

        assert_eq!(HistoryFilter::default().apply(events.clone()), events);
    }
}

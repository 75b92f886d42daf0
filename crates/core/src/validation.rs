//! Validation primitives.
//!
//! Stateless checks applied to candidate records before they are persisted. Each check returns a
//! [`ValidationResult`]; [`ValidationResult::into_result`] lifts a failure into a [`CareError`]
//! for callers that propagate with `?`.

use crate::constants::{
    ADHERENCE_WINDOW_MINUTES, MAX_BED_ELEVATION_DEGREES, MIN_BED_ELEVATION_DEGREES,
    MIN_JUSTIFICATION_CHARS,
};
use crate::error::{CareError, CareResult, ErrorKind};
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Outcome of a single validation check.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    pub is_valid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_code: Option<ErrorKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ValidationResult {
    pub fn valid() -> Self {
        Self {
            is_valid: true,
            error_code: None,
            message: None,
        }
    }

    pub fn invalid(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            is_valid: false,
            error_code: Some(kind),
            message: Some(message.into()),
        }
    }

    /// Converts a failed result into [`CareError::Rule`].
    pub fn into_result(self) -> CareResult<()> {
        if self.is_valid {
            return Ok(());
        }

        let kind = self.error_code.unwrap_or(ErrorKind::ValidationInvalidFormat);
        let message = self.message.unwrap_or_else(|| kind.to_string());
        Err(CareError::rule(kind, message))
    }
}

/// A value that can be checked for presence by [`validate_required_field`].
pub trait FieldValue {
    /// False for absent values, blank strings and empty lists.
    fn is_present(&self) -> bool;
}

impl FieldValue for str {
    fn is_present(&self) -> bool {
        !self.trim().is_empty()
    }
}

impl FieldValue for String {
    fn is_present(&self) -> bool {
        self.as_str().is_present()
    }
}

impl<T> FieldValue for [T] {
    fn is_present(&self) -> bool {
        !self.is_empty()
    }
}

impl<T> FieldValue for Vec<T> {
    fn is_present(&self) -> bool {
        !self.is_empty()
    }
}

impl<T: FieldValue> FieldValue for Option<T> {
    fn is_present(&self) -> bool {
        self.as_ref().is_some_and(FieldValue::is_present)
    }
}

impl<T: FieldValue + ?Sized> FieldValue for &T {
    fn is_present(&self) -> bool {
        (**self).is_present()
    }
}

impl FieldValue for serde_json::Value {
    fn is_present(&self) -> bool {
        match self {
            serde_json::Value::Null => false,
            serde_json::Value::String(s) => s.is_present(),
            serde_json::Value::Array(items) => !items.is_empty(),
            _ => true,
        }
    }
}

/// Fails with `VALIDATION_REQUIRED_FIELD` when `value` is absent, blank or an empty list.
pub fn validate_required_field<V: FieldValue + ?Sized>(
    value: &V,
    field_name: &str,
) -> ValidationResult {
    if value.is_present() {
        ValidationResult::valid()
    } else {
        ValidationResult::invalid(
            ErrorKind::ValidationRequiredField,
            format!("{field_name} is required"),
        )
    }
}

/// True when `actual` falls within the adherence window around `scheduled`.
///
/// The window is symmetric and both edges are inclusive.
pub fn validate_adherence_window(scheduled: DateTime<Utc>, actual: DateTime<Utc>) -> bool {
    let drift_ms = (actual - scheduled).num_milliseconds().abs();
    drift_ms <= ADHERENCE_WINDOW_MINUTES * 60 * 1_000
}

/// Checks a head-of-bed elevation against the closed interval `[0, 30]` degrees.
pub fn validate_bed_elevation(degrees: f64) -> ValidationResult {
    if !degrees.is_finite() {
        return ValidationResult::invalid(
            ErrorKind::ValidationInvalidFormat,
            "Bed elevation must be a number",
        );
    }

    if degrees < MIN_BED_ELEVATION_DEGREES {
        return ValidationResult::invalid(
            ErrorKind::ValidationBedElevation,
            "Bed elevation cannot be negative",
        );
    }

    if degrees > MAX_BED_ELEVATION_DEGREES {
        return ValidationResult::invalid(
            ErrorKind::ValidationBedElevation,
            format!(
                "Bed elevation cannot exceed {} degrees",
                MAX_BED_ELEVATION_DEGREES
            ),
        );
    }

    ValidationResult::valid()
}

/// Parses an RFC 3339 timestamp or a plain `YYYY-MM-DD` date (taken as UTC midnight).
pub fn parse_date(input: &str) -> Option<DateTime<Utc>> {
    let input = input.trim();

    if let Ok(ts) = DateTime::parse_from_rfc3339(input) {
        return Some(ts.with_timezone(&Utc));
    }

    NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
}

/// Fails with `VALIDATION_INVALID_FORMAT` when either bound is not a date or `start > end`.
pub fn validate_date_range(start: &str, end: &str) -> ValidationResult {
    match (parse_date(start), parse_date(end)) {
        (Some(start), Some(end)) if start <= end => ValidationResult::valid(),
        (Some(_), Some(_)) => ValidationResult::invalid(
            ErrorKind::ValidationInvalidFormat,
            "Start date must not be after end date",
        ),
        _ => ValidationResult::invalid(ErrorKind::ValidationInvalidFormat, "Invalid date format"),
    }
}

/// Inclusive time interval used to filter the audit trail.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawDateRange")]
pub struct DateRange {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

#[derive(Deserialize)]
struct RawDateRange {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl TryFrom<RawDateRange> for DateRange {
    type Error = CareError;

    fn try_from(raw: RawDateRange) -> CareResult<Self> {
        DateRange::new(raw.start, raw.end)
    }
}

impl DateRange {
    /// # Errors
    ///
    /// Returns a `VALIDATION_INVALID_FORMAT` rule error if `start > end`.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> CareResult<Self> {
        if start > end {
            return Err(CareError::invalid_format(
                "Start date must not be after end date",
            ));
        }
        Ok(Self { start, end })
    }

    /// Builds a range from two textual dates, applying [`validate_date_range`].
    pub fn parse(start: &str, end: &str) -> CareResult<Self> {
        validate_date_range(start, end).into_result()?;
        match (parse_date(start), parse_date(end)) {
            (Some(start), Some(end)) => Self::new(start, end),
            _ => Err(CareError::invalid_format("Invalid date format")),
        }
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start <= instant && instant <= self.end
    }
}

/// Checks a free-text justification: present, at least three characters once trimmed, and
/// carrying real words rather than only symbols.
pub fn validate_justification(text: Option<&str>, field_name: &str) -> ValidationResult {
    let required = validate_required_field(&text, field_name);
    if !required.is_valid {
        return required;
    }

    let trimmed = text.unwrap_or_default().trim();
    if trimmed.chars().count() < MIN_JUSTIFICATION_CHARS {
        return ValidationResult::invalid(
            ErrorKind::BusinessJustificationRequired,
            format!("{field_name} must be at least {MIN_JUSTIFICATION_CHARS} characters"),
        );
    }

    if !trimmed.chars().any(char::is_alphanumeric) {
        return ValidationResult::invalid(
            ErrorKind::BusinessJustificationRequired,
            format!("{field_name} must contain a meaningful explanation"),
        );
    }

    ValidationResult::valid()
}

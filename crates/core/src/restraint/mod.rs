//! Restraint compliance.
//!
//! Every restraint record passes through a small state machine before it may be persisted:
//!
//! ```text
//!             classify (fill unset type)
//! candidate ─────────────────────────────► evaluate ─┬─► Accepted
//!                                                    ├─► Blocked            (chemical, behavioural use)
//!                                                    └─► Rejected(reason)   (justification / alternatives)
//! ```
//!
//! `Blocked` has no override inside the engine. Only a person re-documenting the restraint (for
//! example with a qualifying medical indication) can change the outcome on a later call.

pub mod keywords;
pub mod strategies;

pub use strategies::{Strategy, StrategyCategory, STRATEGY_CATALOG};

use crate::constants::{PATIENT_ID_INDEX, RESTRAINTS_COLLECTION};
use crate::error::{CareError, CareResult, ErrorKind};
use crate::store::{KeyValueStore, StoredRecord};
use crate::validation::{validate_justification, ValidationResult};
use careguard_uuid::RecordId;
use chrono::{DateTime, Utc};
use keywords::{IntentSignal, CHEMICAL_INTENT_KEYWORDS, RESTRAINT_TYPE_KEYWORDS};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Message returned when a chemical restraint is used to manage behaviour.
pub const CHEMICAL_RESTRAINT_BLOCKED_MESSAGE: &str = "Chemical restraints (sedatives) cannot be \
used for behavioral management. Document and apply non-pharmacological alternatives such as \
distraction, communication or environmental changes instead.";

/// Message returned when no alternatives have been documented.
pub const ALTERNATIVES_REQUIRED_MESSAGE: &str =
    "At least one non-restrictive alternative must be documented (alternatives tried before restraint)";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RestraintType {
    Chemical,
    Mechanical,
    Environmental,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RestraintStatus {
    #[default]
    Active,
    UnderReview,
    Discontinued,
}

/// A restraint applied to a patient.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Restraint {
    #[serde(default)]
    pub id: RecordId,
    pub patient_id: String,
    /// Unset at intake until [`classify_restraint`] derives it.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub restraint_type: Option<RestraintType>,
    pub specific_type: String,
    #[serde(default)]
    pub justification: Option<String>,
    #[serde(default)]
    pub alternatives: Vec<String>,
    #[serde(default)]
    pub authorized_by: String,
    #[serde(default = "Utc::now")]
    pub start_time: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub review_schedule: Vec<DateTime<Utc>>,
    #[serde(default)]
    pub status: RestraintStatus,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

impl Restraint {
    /// A fresh, unclassified, active restraint starting now.
    pub fn new(patient_id: impl Into<String>, specific_type: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: RecordId::new(),
            patient_id: patient_id.into(),
            restraint_type: None,
            specific_type: specific_type.into(),
            justification: None,
            alternatives: Vec::new(),
            authorized_by: String::new(),
            start_time: now,
            end_time: None,
            review_schedule: Vec::new(),
            status: RestraintStatus::Active,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_type(mut self, restraint_type: RestraintType) -> Self {
        self.restraint_type = Some(restraint_type);
        self
    }

    pub fn with_justification(mut self, justification: impl Into<String>) -> Self {
        self.justification = Some(justification.into());
        self
    }

    pub fn with_alternatives<I, S>(mut self, alternatives: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.alternatives = alternatives.into_iter().map(Into::into).collect();
        self
    }

    pub fn authorized_by(mut self, authorized_by: impl Into<String>) -> Self {
        self.authorized_by = authorized_by.into();
        self
    }
}

impl StoredRecord for Restraint {
    const COLLECTION: &'static str = RESTRAINTS_COLLECTION;
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

/// Terminal state of a restraint evaluation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RestraintDecision {
    Accepted,
    /// Chemical restraint used for behavioural control. Not overridable.
    Blocked { message: String },
    Rejected { kind: ErrorKind, message: String },
}

impl RestraintDecision {
    pub fn is_accepted(&self) -> bool {
        matches!(self, RestraintDecision::Accepted)
    }

    pub fn to_validation_result(&self) -> ValidationResult {
        match self {
            RestraintDecision::Accepted => ValidationResult::valid(),
            RestraintDecision::Blocked { message } => {
                ValidationResult::invalid(ErrorKind::BusinessChemicalRestraintBlocked, message)
            }
            RestraintDecision::Rejected { kind, message } => {
                ValidationResult::invalid(*kind, message)
            }
        }
    }

    pub fn into_result(self) -> CareResult<()> {
        match self {
            RestraintDecision::Accepted => Ok(()),
            RestraintDecision::Blocked { message } => Err(CareError::rule(
                ErrorKind::BusinessChemicalRestraintBlocked,
                message,
            )),
            RestraintDecision::Rejected { kind, message } => Err(CareError::rule(kind, message)),
        }
    }
}

/// Form the caller presents so a responsible person signs off on a restraint.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JustificationForm {
    pub restraint_id: RecordId,
    pub justification: Option<String>,
    pub alternatives: Vec<String>,
    pub authorized_by: String,
    pub timestamp: DateTime<Utc>,
}

/// Context for [`get_alternative_strategies`]. The catalog is currently returned in full.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StrategyContext {
    pub patient_id: Option<String>,
    #[serde(rename = "type")]
    pub restraint_type: Option<RestraintType>,
}

/// Returns the assigned type, or derives one from `specificType` when unset.
///
/// Never reclassifies: an assigned type always wins. Unmatched text defaults to mechanical.
pub fn classify_restraint(restraint: &Restraint) -> RestraintType {
    restraint.restraint_type.unwrap_or_else(|| {
        keywords::first_match(RESTRAINT_TYPE_KEYWORDS, &restraint.specific_type)
            .unwrap_or(RestraintType::Mechanical)
    })
}

/// True when a chemical restraint appears to target behaviour rather than a medical indication.
///
/// Medical keywords win over behavioural ones; text matching neither is permitted.
pub fn is_chemical_restraint_for_behavior(restraint: &Restraint) -> bool {
    let text = format!(
        "{} {}",
        restraint.justification.as_deref().unwrap_or_default(),
        restraint.specific_type
    );

    if keywords::matches_tag(CHEMICAL_INTENT_KEYWORDS, &text, &IntentSignal::Medical) {
        return false;
    }

    keywords::matches_tag(CHEMICAL_INTENT_KEYWORDS, &text, &IntentSignal::Behavioral)
}

/// Runs the ordered restraint checks and returns the terminal state.
pub fn evaluate_restraint(restraint: &Restraint) -> RestraintDecision {
    let justification =
        validate_justification(restraint.justification.as_deref(), "justification");
    if !justification.is_valid {
        return RestraintDecision::Rejected {
            kind: ErrorKind::BusinessJustificationRequired,
            message: justification
                .message
                .unwrap_or_else(|| "justification is required".into()),
        };
    }

    if classify_restraint(restraint) == RestraintType::Chemical
        && is_chemical_restraint_for_behavior(restraint)
    {
        return RestraintDecision::Blocked {
            message: CHEMICAL_RESTRAINT_BLOCKED_MESSAGE.into(),
        };
    }

    if !restraint.alternatives.iter().any(|a| !a.trim().is_empty()) {
        return RestraintDecision::Rejected {
            kind: ErrorKind::BusinessJustificationRequired,
            message: ALTERNATIVES_REQUIRED_MESSAGE.into(),
        };
    }

    RestraintDecision::Accepted
}

pub fn validate_restraint(restraint: &Restraint) -> ValidationResult {
    evaluate_restraint(restraint).to_validation_result()
}

/// The full strategy catalog; always non-empty with every category represented.
pub fn get_alternative_strategies(_context: &StrategyContext) -> Vec<Strategy> {
    STRATEGY_CATALOG.to_vec()
}

pub fn require_justification(restraint: &Restraint) -> JustificationForm {
    require_justification_at(restraint, Utc::now())
}

pub fn require_justification_at(restraint: &Restraint, now: DateTime<Utc>) -> JustificationForm {
    JustificationForm {
        restraint_id: restraint.id,
        justification: restraint.justification.clone(),
        alternatives: restraint.alternatives.clone(),
        authorized_by: restraint.authorized_by.clone(),
        timestamp: now,
    }
}

/// Classifies, evaluates and persists restraint records.
#[derive(Clone)]
pub struct RestraintService {
    store: Arc<dyn KeyValueStore<Restraint>>,
}

impl RestraintService {
    pub fn new(store: Arc<dyn KeyValueStore<Restraint>>) -> Self {
        Self { store }
    }

    /// Classifies and evaluates `restraint`, persisting it only when accepted.
    ///
    /// # Errors
    ///
    /// - `BUSINESS_CHEMICAL_RESTRAINT_BLOCKED` for behavioural chemical restraint.
    /// - `BUSINESS_JUSTIFICATION_REQUIRED` for a missing justification or alternatives.
    /// - `SYSTEM_STORAGE_FAILURE` if the write fails.
    pub async fn record_restraint(&self, mut restraint: Restraint) -> CareResult<Restraint> {
        let restraint_type = classify_restraint(&restraint);
        restraint.restraint_type = Some(restraint_type);

        let decision = evaluate_restraint(&restraint);
        if let RestraintDecision::Blocked { .. } = decision {
            tracing::warn!(
                "blocked chemical restraint {} for patient {}",
                restraint.id,
                restraint.patient_id
            );
        }
        decision.into_result()?;

        restraint.updated_at = Utc::now();
        self.store.put(&restraint).await?;
        tracing::info!(
            "recorded {:?} restraint {} for patient {}",
            restraint_type,
            restraint.id,
            restraint.patient_id
        );

        Ok(restraint)
    }

    /// Accepted restraints, newest start first.
    pub async fn list_restraints(&self, patient_id: Option<&str>) -> CareResult<Vec<Restraint>> {
        let mut restraints = match patient_id {
            Some(pid) => self.store.get_by_index(PATIENT_ID_INDEX, pid).await?,
            None => self.store.get_all().await?,
        };
        restraints.sort_by(|a, b| b.start_time.cmp(&a.start_time));
        Ok(restraints)
    }
}

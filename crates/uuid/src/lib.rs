//! Record identifiers and sharded-path utilities.
//!
//! Every record the engine persists (care events, restraints, risk alerts) is keyed by a
//! *canonical* UUID: **32 lowercase hexadecimal characters**, no hyphens.
//!
//! This crate provides:
//! - [`RecordId`], a wrapper that guarantees the canonical format once constructed.
//! - The sharding rule used by file-backed stores to place a record on disk.
//!
//! ## Canonical form
//! - Length: 32
//! - Characters: `0-9` and `a-f` only
//! - Example: `550e8400e29b41d4a716446655440000`
//!
//! Externally supplied identifiers (CLI arguments, REST path segments) must already be canonical;
//! use [`RecordId::parse`] to validate them. Hyphenated or uppercase forms are rejected rather than
//! normalised.
//!
//! ## Sharded layout
//! For a canonical id `u`, a record lives under:
//! `collection_dir/<u[0..2]>/<u[2..4]>/<u>.json`
//!
//! This keeps directory fan-out bounded as the audit trail grows.

mod service;

pub use service::{RecordId, Uuid};

/// Error type for identifier operations.
#[derive(Debug, thiserror::Error)]
pub enum UuidError {
    /// Invalid input provided
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Result type for identifier operations.
pub type UuidResult<T> = Result<T, UuidError>;

//! Record normalization
//!
//! Maps decoded rows into the canonical `ContactRecord` shape. Required
//! columns are matched by exact, case-sensitive name; a required column
//! that is absent or empty fails the row. No phone-format validation and
//! no trimming happen here.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::decode::{DecodedRow, FieldMap};

/// Required source column for the contact's first name
pub const FIELD_FIRST_NAME: &str = "FirstName";
/// Required source column for the contact's phone number
pub const FIELD_PHONE: &str = "Phone";
/// Optional source column for free-form notes
pub const FIELD_NOTES: &str = "Notes";

/// A normalized contact record, immutable once created
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactRecord {
    pub first_name: String,
    pub phone: String,
    pub notes: String,
}

/// A row that failed normalization
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RowError {
    /// A required column is absent or empty on this row
    #[error("row {row}: missing required field '{field}'")]
    MissingRequiredField { row: usize, field: &'static str },

    /// The decoder could not read this row at all
    #[error("row {row}: {reason}")]
    Malformed { row: usize, reason: String },
}

impl RowError {
    pub fn row(&self) -> usize {
        match self {
            RowError::MissingRequiredField { row, .. } | RowError::Malformed { row, .. } => *row,
        }
    }

    pub fn field(&self) -> Option<&'static str> {
        match self {
            RowError::MissingRequiredField { field, .. } => Some(field),
            RowError::Malformed { .. } => None,
        }
    }
}

/// Diagnostic reported for a skipped row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RowDiagnostic {
    pub row: usize,
    pub field: Option<String>,
    pub reason: String,
}

impl From<&RowError> for RowDiagnostic {
    fn from(err: &RowError) -> Self {
        RowDiagnostic {
            row: err.row(),
            field: err.field().map(str::to_string),
            reason: err.to_string(),
        }
    }
}

/// What to do with a row that fails normalization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RowPolicy {
    /// Any invalid row aborts the entire ingestion (the default)
    #[default]
    RejectBatch,
    /// Invalid rows are dropped and reported; valid rows proceed
    SkipRow,
}

impl RowPolicy {
    /// Parse a policy name as accepted by the upload boundary
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "reject" => Some(RowPolicy::RejectBatch),
            "skip" => Some(RowPolicy::SkipRow),
            _ => None,
        }
    }
}

/// Successfully normalized rows plus diagnostics for skipped ones
#[derive(Debug, Default)]
pub struct NormalizedBatch {
    pub records: Vec<ContactRecord>,
    pub skipped: Vec<RowDiagnostic>,
}

/// Normalize one decoded field map
pub fn normalize_row(index: usize, fields: &FieldMap) -> Result<ContactRecord, RowError> {
    let first_name = required_field(index, fields, FIELD_FIRST_NAME)?;
    let phone = required_field(index, fields, FIELD_PHONE)?;
    let notes = fields.get(FIELD_NOTES).cloned().unwrap_or_default();

    Ok(ContactRecord {
        first_name,
        phone,
        notes,
    })
}

/// Fold a decoded row stream into a normalized batch under `policy`.
///
/// With `RejectBatch`, the first invalid row (including rows the decoder
/// flagged as anomalies) fails the whole call. With `SkipRow`, invalid rows
/// become diagnostics and valid rows accumulate.
pub fn normalize_all(
    rows: impl Iterator<Item = DecodedRow>,
    policy: RowPolicy,
) -> Result<NormalizedBatch, RowError> {
    let mut batch = NormalizedBatch::default();

    for row in rows {
        let result = match &row.fields {
            Ok(fields) => normalize_row(row.index, fields),
            Err(anomaly) => Err(RowError::Malformed {
                row: row.index,
                reason: anomaly.0.clone(),
            }),
        };

        match result {
            Ok(record) => batch.records.push(record),
            Err(err) => match policy {
                RowPolicy::RejectBatch => return Err(err),
                RowPolicy::SkipRow => batch.skipped.push(RowDiagnostic::from(&err)),
            },
        }
    }

    Ok(batch)
}

fn required_field(
    index: usize,
    fields: &FieldMap,
    field: &'static str,
) -> Result<String, RowError> {
    match fields.get(field) {
        Some(value) if !value.is_empty() => Ok(value.clone()),
        _ => Err(RowError::MissingRequiredField { row: index, field }),
    }
}

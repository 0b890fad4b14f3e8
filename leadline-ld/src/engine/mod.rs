//! List distribution engine
//!
//! The batch pipeline behind an upload: decode the file into rows,
//! normalize them into contact records, partition the records across the
//! owner's roster, persist every assignment, and report the grouped batch
//! summary. The engine never touches HTTP types; the boundary hands it an
//! owner id, a roster snapshot, and the file bytes.

pub mod decode;
pub mod normalize;
pub mod partition;
pub mod store;
pub mod summary;

use std::io::{Read, Seek};

use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

pub use decode::{decode, DecodeError, DecodedRow, FieldMap, FileFormat, RowStream};
pub use normalize::{
    normalize_all, normalize_row, ContactRecord, NormalizedBatch, RowDiagnostic, RowError,
    RowPolicy,
};
pub use partition::{partition, AgentRef, AgentShare, PartitionError};
pub use store::{Assignment, AssignmentStore, SqliteAssignmentStore, StoreError};
pub use summary::{summarize_batch, summarize_history, DistributionSummary};

/// Ingestion failures, one variant per abort cause
#[derive(Debug, Error)]
pub enum IngestError {
    /// Format rejected or file unreadable; nothing was persisted
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// A row failed validation under the reject-batch policy; nothing was
    /// persisted
    #[error(transparent)]
    InvalidRow(#[from] RowError),

    /// The owner's roster is empty; nothing was persisted
    #[error("No agents available for distribution")]
    NoAgentsAvailable,

    /// The store failed; rows written before the failure remain persisted
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<PartitionError> for IngestError {
    fn from(err: PartitionError) -> Self {
        match err {
            PartitionError::NoAgentsAvailable => IngestError::NoAgentsAvailable,
        }
    }
}

/// Per-upload configuration
#[derive(Debug, Clone, Copy, Default)]
pub struct IngestOptions {
    pub policy: RowPolicy,
}

/// Outcome of one completed ingestion
#[derive(Debug)]
pub struct IngestReport {
    pub batch_id: Uuid,
    pub persisted: usize,
    pub summaries: Vec<DistributionSummary>,
    pub skipped: Vec<RowDiagnostic>,
}

/// Run the full pipeline for one uploaded file.
///
/// `roster` is an immutable snapshot taken by the caller before the call;
/// a concurrent roster change does not affect an ingestion already in
/// flight. The empty-roster case fails before any row is read.
pub async fn ingest<S, R>(
    store: &S,
    roster: &[AgentRef],
    owner_id: &str,
    data: R,
    format: FileFormat,
    options: IngestOptions,
) -> Result<IngestReport, IngestError>
where
    S: AssignmentStore + ?Sized,
    R: Read + Seek + Send + 'static + Clone,
{
    if roster.is_empty() {
        return Err(IngestError::NoAgentsAvailable);
    }

    let batch_id = Uuid::new_v4();
    debug!(%batch_id, owner = owner_id, ?format, "starting ingestion");

    // Decode and normalize interleave: the row stream is pulled lazily
    let rows = decode(data, format)?;
    let batch = normalize_all(rows, options.policy)?;

    let shares = partition(batch.records, roster)?;
    let saved = store.persist_all(owner_id, batch_id, &shares).await?;
    let summaries = summarize_batch(&shares);

    info!(
        %batch_id,
        owner = owner_id,
        persisted = saved.len(),
        skipped = batch.skipped.len(),
        agents = summaries.len(),
        "ingestion complete"
    );

    Ok(IngestReport {
        batch_id,
        persisted: saved.len(),
        summaries,
        skipped: batch.skipped,
    })
}

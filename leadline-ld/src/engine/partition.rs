//! Balanced record partitioning
//!
//! Splits an ordered record batch across an ordered agent roster. The split
//! is deterministic: with `n` records and `k` agents, every agent receives
//! `n / k` records and the first `n % k` agents in roster order receive one
//! extra. Records keep their input order and each agent's share is a
//! contiguous block of it, so concatenating the shares in roster order
//! reproduces the input exactly.

use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use super::ContactRecord;

/// Partitioning errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PartitionError {
    /// The roster is empty; nothing can be distributed
    #[error("No agents available for distribution")]
    NoAgentsAvailable,
}

/// Read-only roster snapshot entry, in roster order
#[derive(Debug, Clone, Serialize)]
pub struct AgentRef {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

/// One agent's contiguous share of a batch
#[derive(Debug, Clone)]
pub struct AgentShare<T = ContactRecord> {
    pub agent: AgentRef,
    pub items: Vec<T>,
}

/// Partition `records` across `roster`, preserving both orders.
///
/// The empty-roster check happens before any record is touched. An agent
/// whose computed share is zero still appears in the result with an empty
/// item list.
pub fn partition<T>(
    records: Vec<T>,
    roster: &[AgentRef],
) -> Result<Vec<AgentShare<T>>, PartitionError> {
    if roster.is_empty() {
        return Err(PartitionError::NoAgentsAvailable);
    }

    let n = records.len();
    let k = roster.len();
    let base = n / k;
    let remainder = n % k;

    let mut items = records.into_iter();
    let shares = roster
        .iter()
        .enumerate()
        .map(|(i, agent)| {
            let take = base + usize::from(i < remainder);
            AgentShare {
                agent: agent.clone(),
                items: items.by_ref().take(take).collect(),
            }
        })
        .collect();

    Ok(shares)
}

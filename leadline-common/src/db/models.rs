//! Database models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A worker agent belonging to one owner's roster
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Agent {
    pub guid: String,
    pub owner_id: String,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A persisted contact-record assignment, joined with agent identity
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct AssignedItem {
    pub guid: String,
    pub owner_id: String,
    pub agent_id: String,
    pub agent_name: String,
    pub agent_email: String,
    pub batch_id: String,
    pub position: i64,
    pub first_name: String,
    pub phone: String,
    pub notes: String,
    pub created_at: DateTime<Utc>,
}

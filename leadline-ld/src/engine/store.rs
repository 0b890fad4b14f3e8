//! Assignment persistence
//!
//! The engine writes through the `AssignmentStore` capability trait so any
//! backend satisfying it is acceptable; the service ships the sqlite
//! implementation. Writes are per record with no batch atomicity: a failure
//! partway through leaves the earlier rows persisted and the caller reports
//! the batch as partial.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use thiserror::Error;
use uuid::Uuid;

use leadline_common::db::AssignedItem;

use super::{AgentShare, ContactRecord};

/// Store adapter errors
#[derive(Debug, Error)]
pub enum StoreError {
    /// Persistence backend unreachable or failing
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// A persistence-level uniqueness or reference rule was violated
    #[error("Constraint violation: {0}")]
    Constraint(String),
}

/// One persisted `(record, owner, agent)` tuple
#[derive(Debug, Clone)]
pub struct Assignment {
    pub id: Uuid,
    pub owner_id: String,
    pub agent_id: Uuid,
    pub batch_id: Uuid,
    pub position: i64,
    pub record: ContactRecord,
    pub created_at: DateTime<Utc>,
}

/// Capability set the engine needs from a persistence backend
#[async_trait]
pub trait AssignmentStore: Send + Sync {
    /// Persist every record of every share, in share order. Returns the
    /// created assignments. Not atomic across the batch.
    async fn persist_all(
        &self,
        owner_id: &str,
        batch_id: Uuid,
        shares: &[AgentShare],
    ) -> Result<Vec<Assignment>, StoreError>;

    /// All persisted assignments for `owner_id` joined with agent identity,
    /// in insertion order, optionally filtered to one agent.
    async fn query(
        &self,
        owner_id: &str,
        agent_filter: Option<Uuid>,
    ) -> Result<Vec<AssignedItem>, StoreError>;
}

/// sqlite-backed store over the shared service pool
#[derive(Clone)]
pub struct SqliteAssignmentStore {
    pool: SqlitePool,
}

impl SqliteAssignmentStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AssignmentStore for SqliteAssignmentStore {
    async fn persist_all(
        &self,
        owner_id: &str,
        batch_id: Uuid,
        shares: &[AgentShare],
    ) -> Result<Vec<Assignment>, StoreError> {
        let mut saved = Vec::new();
        let mut position: i64 = 0;

        for share in shares {
            for record in &share.items {
                let assignment = Assignment {
                    id: Uuid::new_v4(),
                    owner_id: owner_id.to_string(),
                    agent_id: share.agent.id,
                    batch_id,
                    position,
                    record: record.clone(),
                    created_at: Utc::now(),
                };

                sqlx::query(
                    r#"
                    INSERT INTO list_items
                        (guid, owner_id, agent_id, batch_id, position,
                         first_name, phone, notes, created_at)
                    VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
                    "#,
                )
                .bind(assignment.id.to_string())
                .bind(&assignment.owner_id)
                .bind(assignment.agent_id.to_string())
                .bind(assignment.batch_id.to_string())
                .bind(assignment.position)
                .bind(&assignment.record.first_name)
                .bind(&assignment.record.phone)
                .bind(&assignment.record.notes)
                .bind(assignment.created_at)
                .execute(&self.pool)
                .await
                .map_err(map_sqlx_error)?;

                saved.push(assignment);
                position += 1;
            }
        }

        Ok(saved)
    }

    async fn query(
        &self,
        owner_id: &str,
        agent_filter: Option<Uuid>,
    ) -> Result<Vec<AssignedItem>, StoreError> {
        let mut sql = String::from(
            r#"
            SELECT li.guid, li.owner_id, li.agent_id,
                   a.name AS agent_name, a.email AS agent_email,
                   li.batch_id, li.position, li.first_name, li.phone, li.notes,
                   li.created_at
            FROM list_items li
            JOIN agents a ON a.guid = li.agent_id
            WHERE li.owner_id = ?
            "#,
        );
        if agent_filter.is_some() {
            sql.push_str(" AND li.agent_id = ?");
        }
        sql.push_str(" ORDER BY li.rowid");

        let mut query = sqlx::query_as::<_, AssignedItem>(&sql).bind(owner_id);
        if let Some(agent_id) = agent_filter {
            query = query.bind(agent_id.to_string());
        }

        query.fetch_all(&self.pool).await.map_err(map_sqlx_error)
    }
}

fn map_sqlx_error(e: sqlx::Error) -> StoreError {
    use sqlx::error::ErrorKind;

    match &e {
        sqlx::Error::Database(db) => match db.kind() {
            ErrorKind::UniqueViolation
            | ErrorKind::ForeignKeyViolation
            | ErrorKind::NotNullViolation
            | ErrorKind::CheckViolation => StoreError::Constraint(db.message().to_string()),
            _ => StoreError::Unavailable(e.to_string()),
        },
        _ => StoreError::Unavailable(e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::AgentRef;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn memory_pool() -> SqlitePool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        sqlx::query("PRAGMA foreign_keys = ON")
            .execute(&pool)
            .await
            .unwrap();
        leadline_common::db::create_tables(&pool).await.unwrap();
        pool
    }

    async fn insert_agent(pool: &SqlitePool, owner: &str, name: &str) -> AgentRef {
        let id = Uuid::new_v4();
        let email = format!("{}@example.com", name.to_lowercase());
        sqlx::query(
            "INSERT INTO agents (guid, owner_id, name, email, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(id.to_string())
        .bind(owner)
        .bind(name)
        .bind(&email)
        .bind(Utc::now())
        .bind(Utc::now())
        .execute(pool)
        .await
        .unwrap();

        AgentRef {
            id,
            name: name.to_string(),
            email,
        }
    }

    fn record(first_name: &str, phone: &str) -> ContactRecord {
        ContactRecord {
            first_name: first_name.to_string(),
            phone: phone.to_string(),
            notes: String::new(),
        }
    }

    #[tokio::test]
    async fn persisted_rows_round_trip_in_insertion_order() {
        let pool = memory_pool().await;
        let agent_a = insert_agent(&pool, "owner-1", "Asha").await;
        let agent_b = insert_agent(&pool, "owner-1", "Ben").await;
        let store = SqliteAssignmentStore::new(pool);

        let shares = vec![
            AgentShare {
                agent: agent_a.clone(),
                items: vec![record("One", "555-0001"), record("Two", "555-0002")],
            },
            AgentShare {
                agent: agent_b.clone(),
                items: vec![record("Three", "555-0003")],
            },
        ];

        let batch_id = Uuid::new_v4();
        let saved = store
            .persist_all("owner-1", batch_id, &shares)
            .await
            .unwrap();
        assert_eq!(saved.len(), 3);

        let items = store.query("owner-1", None).await.unwrap();
        assert_eq!(items.len(), 3);
        let names: Vec<&str> = items.iter().map(|i| i.first_name.as_str()).collect();
        assert_eq!(names, vec!["One", "Two", "Three"]);
        assert_eq!(items[0].agent_name, "Asha");
        assert_eq!(items[2].agent_name, "Ben");
        assert!(items.iter().all(|i| i.batch_id == batch_id.to_string()));

        let filtered = store.query("owner-1", Some(agent_b.id)).await.unwrap();
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].first_name, "Three");
    }

    #[tokio::test]
    async fn unknown_agent_reference_is_a_constraint_violation() {
        let pool = memory_pool().await;
        let store = SqliteAssignmentStore::new(pool);

        let shares = vec![AgentShare {
            agent: AgentRef {
                id: Uuid::new_v4(),
                name: "Ghost".to_string(),
                email: "ghost@example.com".to_string(),
            },
            items: vec![record("One", "555-0001")],
        }];

        let err = store
            .persist_all("owner-1", Uuid::new_v4(), &shares)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Constraint(_)));
    }

    #[tokio::test]
    async fn owners_are_isolated() {
        let pool = memory_pool().await;
        let agent = insert_agent(&pool, "owner-1", "Asha").await;
        let store = SqliteAssignmentStore::new(pool);

        let shares = vec![AgentShare {
            agent,
            items: vec![record("One", "555-0001")],
        }];
        store
            .persist_all("owner-1", Uuid::new_v4(), &shares)
            .await
            .unwrap();

        assert_eq!(store.query("owner-2", None).await.unwrap().len(), 0);
    }
}

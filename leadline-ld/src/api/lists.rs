//! List upload and retrieval
//!
//! The upload handler is the boundary in front of the distribution engine:
//! it takes the multipart file, snapshots the owner's roster, runs the
//! pipeline, and returns the batch summary. Retrieval endpoints read back
//! persisted assignments joined with agent identity.

use std::io::Cursor;

use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Serialize;
use sqlx::SqlitePool;
use uuid::Uuid;

use leadline_common::db::{get_setting, Agent, AssignedItem, SETTING_INGEST_ON_INVALID};

use crate::api::agents::fetch_roster;
use crate::api::{ListResponse, OwnerId};
use crate::engine::{
    self, summarize_history, AgentRef, AssignmentStore, DistributionSummary, FileFormat,
    IngestOptions, RowDiagnostic, RowPolicy, SqliteAssignmentStore,
};
use crate::error::{ApiError, ApiResult};
use crate::AppState;

/// Response for a completed upload: the summary covers only this batch
#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub success: bool,
    pub batch_id: String,
    pub persisted: usize,
    pub skipped_count: usize,
    pub skipped: Vec<RowDiagnostic>,
    pub data: Vec<DistributionSummary>,
}

/// Response for the lifetime grouped summary
#[derive(Debug, Serialize)]
pub struct SummaryResponse {
    pub success: bool,
    pub data: Vec<DistributionSummary>,
}

/// POST /api/lists/upload
///
/// Multipart form: a required `file` part (.csv, .xlsx, or .xls) and an
/// optional `on_invalid` part (`reject` | `skip`) overriding the configured
/// row policy.
pub async fn upload_list(
    State(state): State<AppState>,
    owner: OwnerId,
    mut multipart: Multipart,
) -> ApiResult<impl IntoResponse> {
    let mut file: Option<(String, Vec<u8>)> = None;
    let mut policy_override: Option<RowPolicy> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("malformed multipart body: {}", e)))?
    {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("file") => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("failed to read upload: {}", e)))?;
                file = Some((file_name, bytes.to_vec()));
            }
            Some("on_invalid") => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("failed to read field: {}", e)))?;
                policy_override = Some(RowPolicy::from_name(&value).ok_or_else(|| {
                    ApiError::BadRequest(format!("unknown on_invalid value: {}", value))
                })?);
            }
            _ => {}
        }
    }

    let (file_name, bytes) =
        file.ok_or_else(|| ApiError::BadRequest("Please upload a file".to_string()))?;
    let format = FileFormat::from_name(&file_name).map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let policy = match policy_override {
        Some(policy) => policy,
        None => default_policy(&state.db).await?,
    };

    // Roster snapshot for this upload; a concurrent roster edit does not
    // affect an ingestion already in flight
    let roster = fetch_roster(&state.db, &owner.0).await?;
    let roster: Vec<AgentRef> = roster.iter().map(agent_ref).collect::<ApiResult<_>>()?;

    let store = SqliteAssignmentStore::new(state.db.clone());
    let report = engine::ingest(
        &store,
        &roster,
        &owner.0,
        Cursor::new(bytes),
        format,
        IngestOptions { policy },
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(UploadResponse {
            success: true,
            batch_id: report.batch_id.to_string(),
            persisted: report.persisted,
            skipped_count: report.skipped.len(),
            skipped: report.skipped,
            data: report.summaries,
        }),
    ))
}

/// GET /api/lists
pub async fn get_lists(
    State(state): State<AppState>,
    owner: OwnerId,
) -> ApiResult<Json<ListResponse<AssignedItem>>> {
    let store = SqliteAssignmentStore::new(state.db.clone());
    let items = store.query(&owner.0, None).await?;
    Ok(Json(ListResponse::new(items)))
}

/// GET /api/lists/agent/:agent_id
pub async fn get_lists_by_agent(
    State(state): State<AppState>,
    owner: OwnerId,
    Path(agent_id): Path<String>,
) -> ApiResult<Json<ListResponse<AssignedItem>>> {
    let agent_id = Uuid::parse_str(&agent_id)
        .map_err(|_| ApiError::BadRequest("invalid agent id".to_string()))?;

    // 404 for agents that don't exist or belong to another owner
    let exists: bool =
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM agents WHERE guid = ? AND owner_id = ?)")
            .bind(agent_id.to_string())
            .bind(&owner.0)
            .fetch_one(&state.db)
            .await
            .map_err(leadline_common::Error::from)?;
    if !exists {
        return Err(ApiError::NotFound("Agent not found".to_string()));
    }

    let store = SqliteAssignmentStore::new(state.db.clone());
    let items = store.query(&owner.0, Some(agent_id)).await?;
    Ok(Json(ListResponse::new(items)))
}

/// GET /api/lists/summary
///
/// Lifetime view: every persisted assignment for the owner, grouped by
/// agent. Distinct from the per-upload summary returned by the upload call.
pub async fn get_summary(
    State(state): State<AppState>,
    owner: OwnerId,
) -> ApiResult<Json<SummaryResponse>> {
    let store = SqliteAssignmentStore::new(state.db.clone());
    let items = store.query(&owner.0, None).await?;

    Ok(Json(SummaryResponse {
        success: true,
        data: summarize_history(&items),
    }))
}

async fn default_policy(db: &SqlitePool) -> ApiResult<RowPolicy> {
    let value = get_setting(db, SETTING_INGEST_ON_INVALID)
        .await
        .map_err(ApiError::Common)?;

    Ok(value
        .as_deref()
        .and_then(RowPolicy::from_name)
        .unwrap_or_default())
}

fn agent_ref(agent: &Agent) -> ApiResult<AgentRef> {
    let id = Uuid::parse_str(&agent.guid)
        .map_err(|_| ApiError::Internal(format!("corrupt agent id: {}", agent.guid)))?;

    Ok(AgentRef {
        id,
        name: agent.name.clone(),
        email: agent.email.clone(),
    })
}

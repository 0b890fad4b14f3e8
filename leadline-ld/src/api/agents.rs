//! Agent roster CRUD
//!
//! Agents are owner-scoped reference data for the distribution engine.
//! Roster order is creation order, which is why every roster read sorts by
//! `(created_at, guid)`.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use sqlx::SqlitePool;
use uuid::Uuid;

use leadline_common::db::Agent;

use crate::api::{ListResponse, OwnerId};
use crate::error::{ApiError, ApiResult};
use crate::AppState;

/// Fetch the owner's roster in roster order
pub async fn fetch_roster(db: &SqlitePool, owner_id: &str) -> ApiResult<Vec<Agent>> {
    let agents = sqlx::query_as::<_, Agent>(
        "SELECT * FROM agents WHERE owner_id = ? ORDER BY created_at, guid",
    )
    .bind(owner_id)
    .fetch_all(db)
    .await
    .map_err(leadline_common::Error::from)?;

    Ok(agents)
}

async fn fetch_agent(db: &SqlitePool, owner_id: &str, guid: &str) -> ApiResult<Agent> {
    sqlx::query_as::<_, Agent>("SELECT * FROM agents WHERE guid = ? AND owner_id = ?")
        .bind(guid)
        .bind(owner_id)
        .fetch_optional(db)
        .await
        .map_err(leadline_common::Error::from)?
        .ok_or_else(|| ApiError::NotFound("Agent not found".to_string()))
}

#[derive(Debug, Deserialize)]
pub struct CreateAgentRequest {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateAgentRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

/// GET /api/agents
pub async fn get_agents(
    State(state): State<AppState>,
    owner: OwnerId,
) -> ApiResult<Json<ListResponse<Agent>>> {
    let agents = fetch_roster(&state.db, &owner.0).await?;
    Ok(Json(ListResponse::new(agents)))
}

/// GET /api/agents/:id
pub async fn get_agent(
    State(state): State<AppState>,
    owner: OwnerId,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let agent = fetch_agent(&state.db, &owner.0, &id).await?;
    Ok(Json(json!({ "success": true, "data": agent })))
}

/// POST /api/agents
pub async fn create_agent(
    State(state): State<AppState>,
    owner: OwnerId,
    Json(request): Json<CreateAgentRequest>,
) -> ApiResult<impl IntoResponse> {
    if request.name.is_empty() {
        return Err(ApiError::BadRequest("Please add a name".to_string()));
    }
    if request.email.is_empty() {
        return Err(ApiError::BadRequest("Please add an email".to_string()));
    }

    let now = Utc::now();
    let agent = Agent {
        guid: Uuid::new_v4().to_string(),
        owner_id: owner.0,
        name: request.name,
        email: request.email,
        phone: request.phone,
        created_at: now,
        updated_at: now,
    };

    sqlx::query(
        r#"
        INSERT INTO agents (guid, owner_id, name, email, phone, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&agent.guid)
    .bind(&agent.owner_id)
    .bind(&agent.name)
    .bind(&agent.email)
    .bind(&agent.phone)
    .bind(agent.created_at)
    .bind(agent.updated_at)
    .execute(&state.db)
    .await
    .map_err(duplicate_email_error)?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "data": agent })),
    ))
}

/// PUT /api/agents/:id
pub async fn update_agent(
    State(state): State<AppState>,
    owner: OwnerId,
    Path(id): Path<String>,
    Json(request): Json<UpdateAgentRequest>,
) -> ApiResult<impl IntoResponse> {
    let mut agent = fetch_agent(&state.db, &owner.0, &id).await?;

    if let Some(name) = request.name {
        if name.is_empty() {
            return Err(ApiError::BadRequest("Please add a name".to_string()));
        }
        agent.name = name;
    }
    if let Some(email) = request.email {
        if email.is_empty() {
            return Err(ApiError::BadRequest("Please add an email".to_string()));
        }
        agent.email = email;
    }
    if let Some(phone) = request.phone {
        agent.phone = Some(phone);
    }
    agent.updated_at = Utc::now();

    sqlx::query(
        "UPDATE agents SET name = ?, email = ?, phone = ?, updated_at = ? WHERE guid = ? AND owner_id = ?",
    )
    .bind(&agent.name)
    .bind(&agent.email)
    .bind(&agent.phone)
    .bind(agent.updated_at)
    .bind(&agent.guid)
    .bind(&agent.owner_id)
    .execute(&state.db)
    .await
    .map_err(duplicate_email_error)?;

    Ok(Json(json!({ "success": true, "data": agent })))
}

/// DELETE /api/agents/:id
///
/// Refused while assignments still reference the agent; deleting would
/// strand those list items.
pub async fn delete_agent(
    State(state): State<AppState>,
    owner: OwnerId,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let agent = fetch_agent(&state.db, &owner.0, &id).await?;

    let assigned: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM list_items WHERE agent_id = ? AND owner_id = ?",
    )
    .bind(&agent.guid)
    .bind(&owner.0)
    .fetch_one(&state.db)
    .await
    .map_err(leadline_common::Error::from)?;

    if assigned > 0 {
        return Err(ApiError::Conflict(format!(
            "Agent still has {} assigned list items",
            assigned
        )));
    }

    sqlx::query("DELETE FROM agents WHERE guid = ? AND owner_id = ?")
        .bind(&agent.guid)
        .bind(&owner.0)
        .execute(&state.db)
        .await
        .map_err(leadline_common::Error::from)?;

    Ok(Json(json!({ "success": true, "data": {} })))
}

fn duplicate_email_error(e: sqlx::Error) -> ApiError {
    if let sqlx::Error::Database(db) = &e {
        if matches!(db.kind(), sqlx::error::ErrorKind::UniqueViolation) {
            return ApiError::Conflict("Email already exists".to_string());
        }
    }
    ApiError::Common(leadline_common::Error::from(e))
}

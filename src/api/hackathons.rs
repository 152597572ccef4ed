use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde_json::{json, Value};

use super::{db_error, json_error, parse_id, JsonError};
use crate::models::{Hackathon, ListFilter, ScrapeRequest, ScrapeResponse, SuccessResponse};
use crate::pipeline::{run_scrape, ScrapeError};
use crate::state::AppState;

/// POST /scrape - Search the web through the provider and upsert the results.
///
/// The body is optional; without one the configured default query is used.
pub async fn scrape(
    State(state): State<AppState>,
    payload: Result<Option<Json<ScrapeRequest>>, JsonRejection>,
) -> (StatusCode, Json<ScrapeResponse>) {
    let req = match payload {
        Ok(Some(Json(req))) => req,
        Ok(None) => ScrapeRequest::default(),
        Err(rejection) => {
            tracing::warn!("Rejected search request: {rejection}");
            return (
                StatusCode::BAD_REQUEST,
                Json(ScrapeResponse::failed(rejection.body_text())),
            );
        }
    };

    match run_scrape(&state, req.query.as_deref()).await {
        Ok(outcome) => {
            tracing::info!(
                "Search {:?} stored {} hackathons ({} new)",
                outcome.query,
                outcome.stored(),
                outcome.created
            );
            (
                StatusCode::OK,
                Json(ScrapeResponse {
                    success: true,
                    count: outcome.stored(),
                    created: outcome.created,
                    updated: outcome.updated,
                    dropped: outcome.dropped,
                    error: None,
                }),
            )
        }
        Err(e) => {
            let status = match &e {
                ScrapeError::Provider(_) => StatusCode::BAD_GATEWAY,
                ScrapeError::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
                ScrapeError::NoResults => StatusCode::OK,
            };
            (status, Json(ScrapeResponse::failed(e.to_string())))
        }
    }
}

/// GET /api/hackathons - All stored hackathons, newest writes first
pub async fn list(
    State(state): State<AppState>,
    Query(filter): Query<ListFilter>,
) -> Result<Json<Vec<Hackathon>>, JsonError> {
    let hackathons = state.store.list(&filter).await.map_err(db_error)?;
    Ok(Json(hackathons))
}

/// GET /api/hackathons/:id
pub async fn get_one(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Hackathon>, JsonError> {
    let not_found = || json_error(StatusCode::NOT_FOUND, "Hackathon not found");
    let id = parse_id(&id).ok_or_else(not_found)?;
    state
        .store
        .get(id)
        .await
        .map_err(db_error)?
        .map(Json)
        .ok_or_else(not_found)
}

/// POST /delete/:id
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SuccessResponse>, JsonError> {
    let not_found = || json_error(StatusCode::NOT_FOUND, "Hackathon not found");
    let id = parse_id(&id).ok_or_else(not_found)?;

    if !state.store.delete(id).await.map_err(db_error)? {
        return Err(not_found());
    }

    tracing::info!("Deleted hackathon {id}");
    Ok(Json(SuccessResponse {
        success: true,
        error: None,
    }))
}

/// GET /health
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

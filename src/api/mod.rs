pub mod hackathons;
pub mod pages;

use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::db::DbError;
use crate::models::SuccessResponse;
use crate::state::AppState;

/// Build the full HTTP surface: HTML pages plus the JSON API.
pub fn router(state: AppState) -> Router {
    Router::new()
        // Pages
        .route("/", get(pages::index))
        .route("/hackathon/{id}", get(pages::detail))
        .route("/edit/{id}", get(pages::edit))
        .route("/update/{id}", post(pages::update))
        // JSON API
        .route("/scrape", post(hackathons::scrape))
        .route("/delete/{id}", post(hackathons::delete))
        .route("/api/hackathons", get(hackathons::list))
        .route("/api/hackathons/{id}", get(hackathons::get_one))
        .route("/health", get(hackathons::health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub type JsonError = (StatusCode, Json<SuccessResponse>);

pub(crate) fn json_error(status: StatusCode, message: impl Into<String>) -> JsonError {
    (
        status,
        Json(SuccessResponse {
            success: false,
            error: Some(message.into()),
        }),
    )
}

pub(crate) fn db_error(e: DbError) -> JsonError {
    tracing::error!("Database operation failed: {e}");
    let status = match e {
        DbError::NotFound(_) => StatusCode::NOT_FOUND,
        DbError::Conflict(_) => StatusCode::CONFLICT,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    json_error(status, e.to_string())
}

/// Path ids that are not UUIDs can never match a record.
pub(crate) fn parse_id(raw: &str) -> Option<Uuid> {
    Uuid::parse_str(raw.trim()).ok()
}

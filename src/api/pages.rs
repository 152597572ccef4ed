use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::Form;

use super::parse_id;
use crate::db::DbError;
use crate::models::{HackathonForm, ListFilter};
use crate::state::AppState;
use crate::views;

/// GET / - Listing page with search and filter forms
pub async fn index(State(state): State<AppState>, Query(filter): Query<ListFilter>) -> Response {
    let last = state.last_scrape();
    match state.store.list(&filter).await {
        Ok(hackathons) => Html(views::index_page(
            &hackathons,
            &filter,
            last.as_ref(),
            &state.config.default_query,
            None,
        ))
        .into_response(),
        Err(e) => {
            tracing::error!("Failed to load hackathons: {e}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Html(views::index_page(
                    &[],
                    &filter,
                    last.as_ref(),
                    &state.config.default_query,
                    Some("Failed to load hackathons"),
                )),
            )
                .into_response()
        }
    }
}

/// GET /hackathon/:id - Unknown ids go back to the listing
pub async fn detail(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let Some(id) = parse_id(&id) else {
        return Redirect::to("/").into_response();
    };
    match state.store.get(id).await {
        Ok(Some(h)) => Html(views::detail_page(&h)).into_response(),
        Ok(None) => Redirect::to("/").into_response(),
        Err(e) => {
            tracing::error!("Failed to load hackathon {id}: {e}");
            Redirect::to("/").into_response()
        }
    }
}

/// GET /edit/:id
pub async fn edit(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let Some(id) = parse_id(&id) else {
        return Redirect::to("/").into_response();
    };
    match state.store.get(id).await {
        Ok(Some(h)) => Html(views::edit_page(id, &HackathonForm::from(&h), None)).into_response(),
        Ok(None) => Redirect::to("/").into_response(),
        Err(e) => {
            tracing::error!("Failed to load hackathon {id} for editing: {e}");
            Redirect::to("/").into_response()
        }
    }
}

/// POST /update/:id - Save the edit form, then show the record
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Form(form): Form<HackathonForm>,
) -> Response {
    let Some(id) = parse_id(&id) else {
        return Redirect::to("/").into_response();
    };

    let update = match form.clone().into_update() {
        Ok(update) => update,
        Err(message) => {
            return (
                StatusCode::BAD_REQUEST,
                Html(views::edit_page(id, &form, Some(&message))),
            )
                .into_response();
        }
    };

    match state.store.update(id, &update).await {
        Ok(_) => {
            tracing::info!("Updated hackathon {id}");
            Redirect::to(&format!("/hackathon/{id}")).into_response()
        }
        Err(DbError::NotFound(_)) => Redirect::to("/").into_response(),
        Err(DbError::Conflict(message)) => (
            StatusCode::CONFLICT,
            Html(views::edit_page(id, &form, Some(&message))),
        )
            .into_response(),
        Err(e) => {
            tracing::error!("Failed to update hackathon {id}: {e}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Html(views::error_page("Failed to save changes")),
            )
                .into_response()
        }
    }
}

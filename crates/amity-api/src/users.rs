use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use amity_core::{Page, SearchResult};
use amity_types::api::Claims;

use crate::error::{ApiError, ApiResult};
use crate::{AppState, default_page, default_per_page};

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub search: Option<String>,
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_per_page")]
    pub per_page: u32,
}

/// An email query returns one detailed profile (404 when absent); anything
/// else returns a page of summaries filtered by block visibility.
pub async fn search_users(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Query(params): Query<SearchParams>,
) -> ApiResult<Response> {
    let viewer = claims.sub;
    let page = Page::new(params.page, params.per_page);

    // Run the blocking DB query off the async runtime
    let shared = state.clone();
    let result = tokio::task::spawn_blocking(move || {
        shared.search.search(viewer, params.search.as_deref(), page)
    })
    .await
    .map_err(ApiError::internal)??;

    Ok(match result {
        SearchResult::Profile(detail) => Json(detail).into_response(),
        SearchResult::Page(listing) => Json(listing).into_response(),
    })
}

pub async fn block_user(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(user_id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    state.blocks.block(claims.sub, user_id, chrono::Utc::now())?;
    Ok(Json(json!({ "message": "Blocked Successfully" })))
}

pub async fn unblock_user(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(user_id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    state.blocks.unblock(claims.sub, user_id)?;
    Ok(Json(json!({ "message": "User is unblocked" })))
}

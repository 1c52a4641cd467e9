use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use uuid::Uuid;

use amity_core::ListView;
use amity_types::api::{Claims, FriendRequestView};

use crate::error::{ApiError, ApiResult};
use crate::{AppState, PageParams};

pub async fn send_request(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(user_id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let request = state
        .requests
        .submit(claims.sub, user_id, chrono::Utc::now())?;
    Ok(Json(FriendRequestView::from(request)))
}

pub async fn accept_request(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(request_id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    state
        .requests
        .accept(request_id, claims.sub, chrono::Utc::now())?;
    Ok(StatusCode::OK)
}

pub async fn reject_request(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(request_id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    state
        .requests
        .reject(request_id, claims.sub, chrono::Utc::now())?;
    Ok(StatusCode::OK)
}

/// Received pending requests, served through the list cache: a hit returns
/// the stored page; a miss computes, stores, then returns.
pub async fn pending_requests(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Query(params): Query<PageParams>,
) -> ApiResult<Response> {
    let user = claims.sub;
    let page = params.to_page();

    if let Some(hit) = state.cache.get(ListView::PendingRequests, user, page) {
        return Ok(Json(hit).into_response());
    }

    let shared = state.clone();
    let fresh = tokio::task::spawn_blocking(move || shared.requests.pending_for(user, page))
        .await
        .map_err(ApiError::internal)??;

    let payload = serde_json::to_value(&fresh).map_err(ApiError::internal)?;
    state
        .cache
        .put(ListView::PendingRequests, user, page, payload.clone());
    Ok(Json(payload).into_response())
}

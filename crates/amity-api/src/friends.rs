use axum::{
    Extension, Json,
    extract::{Query, State},
    response::{IntoResponse, Response},
};

use amity_core::ListView;
use amity_types::api::Claims;

use crate::error::{ApiError, ApiResult};
use crate::{AppState, PageParams};

/// Confirmed friends of the authenticated user, served through the list cache.
pub async fn list_friends(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Query(params): Query<PageParams>,
) -> ApiResult<Response> {
    let user = claims.sub;
    let page = params.to_page();

    if let Some(hit) = state.cache.get(ListView::Friends, user, page) {
        return Ok(Json(hit).into_response());
    }

    let shared = state.clone();
    let fresh = tokio::task::spawn_blocking(move || shared.graph.friends_of(user, page))
        .await
        .map_err(ApiError::internal)??;

    let payload = serde_json::to_value(&fresh).map_err(ApiError::internal)?;
    state.cache.put(ListView::Friends, user, page, payload.clone());
    Ok(Json(payload).into_response())
}

use std::sync::Arc;

use axum::{
    Json,
    extract::{Query, State},
    response::IntoResponse,
};

use crate::server::AppState;
use crate::server::dto::RedirectParams;
use crate::server::response::{ApiError, ApiResponse, StoreOptionExt, StoreResultExt};

pub async fn list_redirects(
    State(state): State<Arc<AppState>>,
    Query(params): Query<RedirectParams>,
) -> impl IntoResponse {
    let redirects = state
        .store
        .list_redirects(&params.site)
        .api_err("Failed to list redirects")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(redirects)))
}

/// Looks up the forwarding target for an old path. Chains are collapsed at
/// write time, so one hop is always enough.
pub async fn resolve_redirect(
    State(state): State<Arc<AppState>>,
    Query(params): Query<RedirectParams>,
) -> impl IntoResponse {
    let path = params
        .path
        .as_deref()
        .ok_or_else(|| ApiError::bad_request("Missing 'path' parameter"))?;

    let redirect = state
        .store
        .find_redirect(&params.site, path)
        .api_err("Failed to resolve redirect")?
        .or_not_found("No redirect for path")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(redirect)))
}

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use uuid::Uuid;

use crate::server::AppState;
use crate::server::dto::{CreateSiteRequest, CursorParams};
use crate::server::response::{
    ApiError, ApiResponse, DEFAULT_PAGE_SIZE, PaginatedResponse, StoreOptionExt, StoreResultExt,
    paginate,
};
use crate::server::validation::validate_site_name;
use crate::types::Site;

pub async fn create_site(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateSiteRequest>,
) -> impl IntoResponse {
    let store = state.store.as_ref();

    validate_site_name(&req.name)?;
    if req.domain.trim().is_empty() {
        return Err(ApiError::bad_request("Site domain cannot be empty"));
    }

    if store
        .get_site_by_name(&req.name)
        .api_err("Failed to check site")?
        .is_some()
    {
        return Err(ApiError::conflict("Site already exists"));
    }

    let site = Site {
        id: Uuid::new_v4().to_string(),
        name: req.name,
        domain: req.domain,
        created_at: Utc::now(),
    };

    store.create_site(&site).api_err("Failed to create site")?;

    Ok::<_, ApiError>((StatusCode::CREATED, Json(ApiResponse::success(site))))
}

pub async fn get_site(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let site = state
        .resolver
        .site(&id)
        .api_err("Failed to get site")?
        .or_not_found("Site not found")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(site)))
}

pub async fn list_sites(
    State(state): State<Arc<AppState>>,
    Query(params): Query<CursorParams>,
) -> impl IntoResponse {
    let cursor = params.cursor.as_deref().unwrap_or("");

    let sites = state
        .store
        .list_sites(cursor, DEFAULT_PAGE_SIZE + 1)
        .api_err("Failed to list sites")?;

    let (sites, next_cursor, has_more) =
        paginate(sites, DEFAULT_PAGE_SIZE as usize, |s| s.name.clone());

    Ok::<_, ApiError>(Json(PaginatedResponse::new(sites, next_cursor, has_more)))
}

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;

use crate::server::AppState;
use crate::server::dto::UpsertContentRequest;
use crate::server::response::{ApiError, ApiResponse, StoreOptionExt, StoreResultExt};
use crate::server::validation::{validate_title, validate_type_tag};
use crate::store::slug::validate_slug;
use crate::types::{ContentItem, ContentRef};

pub async fn upsert_content(
    State(state): State<Arc<AppState>>,
    Path((type_tag, id)): Path<(String, i64)>,
    Json(req): Json<UpsertContentRequest>,
) -> impl IntoResponse {
    let store = state.store.as_ref();

    validate_type_tag(&type_tag)?;
    validate_title(&req.title)?;
    if let Some(slug) = &req.slug {
        validate_slug(slug).api_err("Invalid slug")?;
    }

    let target = ContentRef::new(type_tag.clone(), id);
    let existing = store
        .get_content_item(&target)
        .api_err("Failed to check content")?;

    let now = Utc::now();
    let item = ContentItem {
        type_tag,
        id,
        title: req.title,
        slug: req.slug,
        created_at: existing.as_ref().map_or(now, |e| e.created_at),
        updated_at: now,
    };

    store
        .upsert_content_item(&item)
        .api_err("Failed to save content")?;
    state.resolver.invalidate_content(&target);

    let status = if existing.is_some() {
        StatusCode::OK
    } else {
        StatusCode::CREATED
    };
    Ok::<_, ApiError>((status, Json(ApiResponse::success(item))))
}

pub async fn get_content(
    State(state): State<Arc<AppState>>,
    Path((type_tag, id)): Path<(String, i64)>,
) -> impl IntoResponse {
    let item = state
        .resolver
        .content(&ContentRef::new(type_tag, id))
        .api_err("Failed to get content")?
        .or_not_found("Content not found")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(item)))
}

pub async fn delete_content(
    State(state): State<Arc<AppState>>,
    Path((type_tag, id)): Path<(String, i64)>,
) -> impl IntoResponse {
    let target = ContentRef::new(type_tag, id);
    let deleted = state
        .store
        .delete_content_item(&target)
        .api_err("Failed to delete content")?;

    if !deleted {
        return Err(ApiError::not_found("Content not found"));
    }
    state.resolver.invalidate_content(&target);

    Ok::<_, ApiError>(StatusCode::NO_CONTENT)
}

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
use crate::server::dto::{
    CreatePlacementRequest, CursorParams, PlacementDetailResponse, PlacementUrlParams,
    PlacementUrlResponse, TopHitsParams, UpdatePlacementRequest,
};
use crate::server::response::{
    ApiError, ApiResponse, DEFAULT_PAGE_SIZE, PaginatedResponse, StoreOptionExt, StoreResultExt,
    paginate,
};
use crate::server::validation::{clamp_limit, validate_type_tag};
use crate::types::{ContentRef, Placement};

pub async fn create_placement(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreatePlacementRequest>,
) -> impl IntoResponse {
    let store = state.store.as_ref();

    validate_type_tag(&req.target_type)?;
    state
        .resolver
        .category(&req.category_id)
        .api_err("Failed to get category")?
        .or_not_found("Category not found")?;

    let target = ContentRef::new(req.target_type.clone(), req.target_id);
    if store
        .find_placement(&req.category_id, &target)
        .api_err("Failed to check placement")?
        .is_some()
    {
        return Err(ApiError::conflict("Target already placed in category"));
    }

    let now = Utc::now();
    let placement = Placement {
        id: Uuid::new_v4().to_string(),
        target_type: req.target_type,
        target_id: req.target_id,
        category_id: req.category_id,
        publish_from: req.publish_from.unwrap_or(now),
        publish_to: req.publish_to,
        slug: req.slug.unwrap_or_default(),
        is_static: req.is_static,
        created_at: now,
        updated_at: now,
    };

    let placement = store
        .save_placement(&placement, &state.default_site_id, &state.scheme)
        .api_err("Failed to create placement")?;
    state.resolver.invalidate_placement(&placement.id);

    Ok::<_, ApiError>((StatusCode::CREATED, Json(ApiResponse::success(placement))))
}

pub async fn get_placement(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let store = state.store.as_ref();

    let placement = store
        .get_placement(&id)
        .api_err("Failed to get placement")?
        .or_not_found("Placement not found")?;

    let url = state
        .resolver
        .placement_url(&id, false)
        .api_err("Failed to build placement URL")?;
    let hits = store
        .get_hit_count(&id)
        .api_err("Failed to get hit count")?
        .map_or(0, |hc| hc.hits);

    let is_active = placement.is_active(Utc::now());
    Ok::<_, ApiError>(Json(ApiResponse::success(PlacementDetailResponse {
        placement,
        url,
        is_active,
        hits,
    })))
}

pub async fn update_placement(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<UpdatePlacementRequest>,
) -> impl IntoResponse {
    let store = state.store.as_ref();

    let mut placement = store
        .get_placement(&id)
        .api_err("Failed to get placement")?
        .or_not_found("Placement not found")?;

    if let Some(category_id) = req.category_id {
        state
            .resolver
            .category(&category_id)
            .api_err("Failed to get category")?
            .or_not_found("Category not found")?;
        placement.category_id = category_id;
    }
    if let Some(publish_from) = req.publish_from {
        placement.publish_from = publish_from;
    }
    if let Some(publish_to) = req.publish_to {
        placement.publish_to = Some(publish_to);
    }
    if let Some(slug) = req.slug {
        placement.slug = slug;
    }
    if let Some(is_static) = req.is_static {
        placement.is_static = is_static;
    }

    let placement = store
        .save_placement(&placement, &state.default_site_id, &state.scheme)
        .api_err("Failed to update placement")?;
    state.resolver.invalidate_placement(&id);

    Ok::<_, ApiError>(Json(ApiResponse::success(placement)))
}

pub async fn delete_placement(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let deleted = state
        .store
        .delete_placement(&id)
        .api_err("Failed to delete placement")?;

    if !deleted {
        return Err(ApiError::not_found("Placement not found"));
    }
    state.resolver.invalidate_placement(&id);

    Ok::<_, ApiError>(StatusCode::NO_CONTENT)
}

pub async fn get_placement_url(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(params): Query<PlacementUrlParams>,
) -> impl IntoResponse {
    let url = if params.prefer_cross_site {
        // Cross-site form is rarely requested; skip the memo rather than
        // cache both variants.
        state
            .store
            .placement_url(&id, &state.default_site_id, &state.scheme, true)
    } else {
        state.resolver.placement_url(&id, false)
    }
    .api_err("Placement not found")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(PlacementUrlResponse { url })))
}

pub async fn describe_placement(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let description = state
        .resolver
        .describe_placement(&id)
        .api_err("Placement not found")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(description)))
}

pub async fn record_hit(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let hit_count = state
        .store
        .record_hit(&id)
        .api_err("Placement not found")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(hit_count)))
}

pub async fn get_hit_count(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let hit_count = state
        .store
        .get_hit_count(&id)
        .api_err("Failed to get hit count")?
        .or_not_found("Placement not found")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(hit_count)))
}

pub async fn top_hits(
    State(state): State<Arc<AppState>>,
    Query(params): Query<TopHitsParams>,
) -> impl IntoResponse {
    let hit_counts = state
        .store
        .top_hit_counts(clamp_limit(params.limit))
        .api_err("Failed to list hit counts")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(hit_counts)))
}

pub async fn list_category_placements(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(params): Query<CursorParams>,
) -> impl IntoResponse {
    let cursor = params.cursor.as_deref().unwrap_or("");

    let placements = state
        .store
        .list_category_placements(&id, cursor, DEFAULT_PAGE_SIZE + 1)
        .api_err("Failed to list placements")?;

    let (placements, next_cursor, has_more) =
        paginate(placements, DEFAULT_PAGE_SIZE as usize, |p| {
            p.publish_from.to_rfc3339()
        });

    Ok::<_, ApiError>(Json(PaginatedResponse::new(
        placements,
        next_cursor,
        has_more,
    )))
}

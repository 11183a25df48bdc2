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
use crate::server::dto::{ActiveListingsParams, CreateListingRequest, UpdateListingRequest};
use crate::server::response::{ApiError, ApiResponse, StoreOptionExt, StoreResultExt};
use crate::server::validation::clamp_limit;
use crate::types::Listing;

pub async fn create_listing(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateListingRequest>,
) -> impl IntoResponse {
    let store = state.store.as_ref();

    if let (Some(from), Some(to)) = (req.priority_from, req.priority_to) {
        if to < from {
            return Err(ApiError::bad_request(
                "Priority window cannot end before it starts",
            ));
        }
    }
    if req.remove_after_priority && req.priority_to.is_none() {
        return Err(ApiError::bad_request(
            "remove_after_priority requires a priority_to",
        ));
    }

    let listing = Listing {
        id: Uuid::new_v4().to_string(),
        placement_id: req.placement_id,
        category_id: req.category_id,
        publish_from: req.publish_from.unwrap_or_else(Utc::now),
        priority_from: req.priority_from,
        priority_to: req.priority_to,
        priority_value: req.priority_value,
        remove_after_priority: req.remove_after_priority,
        is_commercial: req.is_commercial,
        created_at: Utc::now(),
    };

    store
        .save_listing(&listing)
        .api_err("Placement or category not found")?;

    Ok::<_, ApiError>((StatusCode::CREATED, Json(ApiResponse::success(listing))))
}

pub async fn update_listing(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<UpdateListingRequest>,
) -> impl IntoResponse {
    let store = state.store.as_ref();

    let mut listing = store
        .get_listing(&id)
        .api_err("Failed to get listing")?
        .or_not_found("Listing not found")?;

    if let Some(publish_from) = req.publish_from {
        listing.publish_from = publish_from;
    }
    if let Some(priority_from) = req.priority_from {
        listing.priority_from = priority_from;
    }
    if let Some(priority_to) = req.priority_to {
        listing.priority_to = priority_to;
    }
    if let Some(priority_value) = req.priority_value {
        listing.priority_value = priority_value;
    }
    if let Some(remove_after_priority) = req.remove_after_priority {
        listing.remove_after_priority = remove_after_priority;
    }
    if let Some(is_commercial) = req.is_commercial {
        listing.is_commercial = is_commercial;
    }

    if let (Some(from), Some(to)) = (listing.priority_from, listing.priority_to) {
        if to < from {
            return Err(ApiError::bad_request(
                "Priority window cannot end before it starts",
            ));
        }
    }
    if listing.remove_after_priority && listing.priority_to.is_none() {
        return Err(ApiError::bad_request(
            "remove_after_priority requires a priority_to",
        ));
    }

    store
        .save_listing(&listing)
        .api_err("Failed to update listing")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(listing)))
}

pub async fn get_listing(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let listing = state
        .store
        .get_listing(&id)
        .api_err("Failed to get listing")?
        .or_not_found("Listing not found")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(listing)))
}

pub async fn delete_listing(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let deleted = state
        .store
        .delete_listing(&id)
        .api_err("Failed to delete listing")?;

    if !deleted {
        return Err(ApiError::not_found("Listing not found"));
    }

    Ok::<_, ApiError>(StatusCode::NO_CONTENT)
}

/// Listings currently visible in a category, promoted first. `at` pins the
/// evaluation instant for reproducible reads.
pub async fn list_active_listings(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(params): Query<ActiveListingsParams>,
) -> impl IntoResponse {
    state
        .resolver
        .category(&id)
        .api_err("Failed to get category")?
        .or_not_found("Category not found")?;

    let now = params.at.unwrap_or_else(Utc::now);
    let listings = state
        .store
        .list_active_listings(&id, now, params.commercial, clamp_limit(params.limit))
        .api_err("Failed to list listings")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(listings)))
}

pub async fn list_placement_listings(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let listings = state
        .store
        .list_placement_listings(&id)
        .api_err("Failed to list listings")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(listings)))
}

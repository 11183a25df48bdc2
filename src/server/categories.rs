use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use serde::Serialize;
use uuid::Uuid;

use crate::server::AppState;
use crate::server::dto::{
    CategoryPathParams, CreateCategoryRequest, ListCategoriesParams, UpdateCategoryRequest,
};
use crate::server::response::{
    ApiError, ApiResponse, DEFAULT_PAGE_SIZE, PaginatedResponse, StoreOptionExt, StoreResultExt,
    paginate,
};
use crate::server::validation::validate_title;
use crate::types::Category;

#[derive(Debug, Serialize)]
pub struct CategoryWithName {
    #[serde(flatten)]
    pub category: Category,
    /// `site/path` display name, memoized by the resolver.
    pub display_name: String,
}

pub async fn create_category(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateCategoryRequest>,
) -> impl IntoResponse {
    let store = state.store.as_ref();

    validate_title(&req.title)?;
    state
        .resolver
        .site(&req.site_id)
        .api_err("Failed to get site")?
        .or_not_found("Site not found")?;

    let now = Utc::now();
    let category = Category {
        id: Uuid::new_v4().to_string(),
        site_id: req.site_id,
        title: req.title,
        slug: req.slug,
        parent_id: req.parent_id,
        path: String::new(),
        description: req.description,
        created_at: now,
        updated_at: now,
    };

    let category = store
        .save_category(&category)
        .api_err("Failed to create category")?;
    state.resolver.invalidate_categories();

    Ok::<_, ApiError>((StatusCode::CREATED, Json(ApiResponse::success(category))))
}

pub async fn get_category(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let category = state
        .resolver
        .category(&id)
        .api_err("Failed to get category")?
        .or_not_found("Category not found")?;

    let display_name = state
        .resolver
        .category_display_name(&id)
        .api_err("Failed to resolve category site")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(CategoryWithName {
        category,
        display_name,
    })))
}

pub async fn get_category_by_path(
    State(state): State<Arc<AppState>>,
    Query(params): Query<CategoryPathParams>,
) -> impl IntoResponse {
    let category = state
        .resolver
        .category_by_path(&params.site, &params.path)
        .api_err("Failed to get category")?
        .or_not_found("Category not found")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(category)))
}

pub async fn update_category(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<UpdateCategoryRequest>,
) -> impl IntoResponse {
    let store = state.store.as_ref();

    let mut category = store
        .get_category(&id)
        .api_err("Failed to get category")?
        .or_not_found("Category not found")?;

    if let Some(title) = req.title {
        validate_title(&title)?;
        category.title = title;
    }
    if let Some(slug) = req.slug {
        category.slug = slug;
    }
    if let Some(parent_id) = req.parent_id {
        category.parent_id = Some(parent_id);
    }
    if let Some(description) = req.description {
        category.description = Some(description);
    }

    let category = store
        .save_category(&category)
        .api_err("Failed to update category")?;
    state.resolver.invalidate_categories();

    Ok::<_, ApiError>(Json(ApiResponse::success(category)))
}

pub async fn delete_category(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let deleted = state
        .store
        .delete_category(&id)
        .api_err("Failed to delete category")?;

    if !deleted {
        return Err(ApiError::not_found("Category not found"));
    }
    state.resolver.invalidate_categories();

    Ok::<_, ApiError>(StatusCode::NO_CONTENT)
}

pub async fn list_categories(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListCategoriesParams>,
) -> impl IntoResponse {
    let cursor = params.cursor.as_deref().unwrap_or("");

    let categories = state
        .store
        .list_categories(&params.site, cursor, DEFAULT_PAGE_SIZE + 1)
        .api_err("Failed to list categories")?;

    let (categories, next_cursor, has_more) =
        paginate(categories, DEFAULT_PAGE_SIZE as usize, |c| c.path.clone());

    Ok::<_, ApiError>(Json(PaginatedResponse::new(
        categories,
        next_cursor,
        has_more,
    )))
}

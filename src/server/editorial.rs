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
    CreateAuthorRequest, CreateRelatedRequest, CreateSourceRequest, CursorParams,
};
use crate::server::response::{
    ApiError, ApiResponse, DEFAULT_PAGE_SIZE, PaginatedResponse, StoreOptionExt, StoreResultExt,
    paginate,
};
use crate::server::validation::validate_type_tag;
use crate::store::slug::{derive_slug, validate_slug};
use crate::types::{Author, ContentRef, Related, Source};

pub async fn create_author(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateAuthorRequest>,
) -> impl IntoResponse {
    let store = state.store.as_ref();

    if req.name.trim().is_empty() {
        return Err(ApiError::bad_request("Author name cannot be empty"));
    }
    let slug = match req.slug {
        Some(slug) => {
            validate_slug(&slug).api_err("Invalid slug")?;
            slug
        }
        None => derive_slug(&req.name).api_err("Author name yields no usable slug")?,
    };

    if store
        .get_author_by_slug(&slug)
        .api_err("Failed to check author")?
        .is_some()
    {
        return Err(ApiError::conflict("Author already exists"));
    }

    let author = Author {
        id: Uuid::new_v4().to_string(),
        name: req.name,
        slug,
        description: req.description,
        text: req.text,
        created_at: Utc::now(),
    };

    store
        .create_author(&author)
        .api_err("Failed to create author")?;

    Ok::<_, ApiError>((StatusCode::CREATED, Json(ApiResponse::success(author))))
}

pub async fn get_author(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let author = state
        .store
        .get_author(&id)
        .api_err("Failed to get author")?
        .or_not_found("Author not found")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(author)))
}

pub async fn list_authors(
    State(state): State<Arc<AppState>>,
    Query(params): Query<CursorParams>,
) -> impl IntoResponse {
    let cursor = params.cursor.as_deref().unwrap_or("");

    let authors = state
        .store
        .list_authors(cursor, DEFAULT_PAGE_SIZE + 1)
        .api_err("Failed to list authors")?;

    let (authors, next_cursor, has_more) =
        paginate(authors, DEFAULT_PAGE_SIZE as usize, |a| a.slug.clone());

    Ok::<_, ApiError>(Json(PaginatedResponse::new(authors, next_cursor, has_more)))
}

pub async fn delete_author(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let deleted = state
        .store
        .delete_author(&id)
        .api_err("Failed to delete author")?;

    if !deleted {
        return Err(ApiError::not_found("Author not found"));
    }

    Ok::<_, ApiError>(StatusCode::NO_CONTENT)
}

pub async fn create_source(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateSourceRequest>,
) -> impl IntoResponse {
    if req.name.trim().is_empty() {
        return Err(ApiError::bad_request("Source name cannot be empty"));
    }

    let source = Source {
        id: Uuid::new_v4().to_string(),
        name: req.name,
        url: req.url,
        description: req.description,
        created_at: Utc::now(),
    };

    state
        .store
        .create_source(&source)
        .api_err("Source already exists")?;

    Ok::<_, ApiError>((StatusCode::CREATED, Json(ApiResponse::success(source))))
}

pub async fn get_source(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let source = state
        .store
        .get_source(&id)
        .api_err("Failed to get source")?
        .or_not_found("Source not found")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(source)))
}

pub async fn list_sources(
    State(state): State<Arc<AppState>>,
    Query(params): Query<CursorParams>,
) -> impl IntoResponse {
    let cursor = params.cursor.as_deref().unwrap_or("");

    let sources = state
        .store
        .list_sources(cursor, DEFAULT_PAGE_SIZE + 1)
        .api_err("Failed to list sources")?;

    let (sources, next_cursor, has_more) =
        paginate(sources, DEFAULT_PAGE_SIZE as usize, |s| s.name.clone());

    Ok::<_, ApiError>(Json(PaginatedResponse::new(sources, next_cursor, has_more)))
}

pub async fn delete_source(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let deleted = state
        .store
        .delete_source(&id)
        .api_err("Failed to delete source")?;

    if !deleted {
        return Err(ApiError::not_found("Source not found"));
    }

    Ok::<_, ApiError>(StatusCode::NO_CONTENT)
}

pub async fn create_related(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateRelatedRequest>,
) -> impl IntoResponse {
    validate_type_tag(&req.source_type)?;
    validate_type_tag(&req.target_type)?;
    if req.source_type == req.target_type && req.source_id == req.target_id {
        return Err(ApiError::bad_request("Content cannot relate to itself"));
    }

    let related = Related {
        id: Uuid::new_v4().to_string(),
        source_type: req.source_type,
        source_id: req.source_id,
        target_type: req.target_type,
        target_id: req.target_id,
        created_at: Utc::now(),
    };

    state
        .store
        .create_related(&related)
        .api_err("Relation already exists")?;

    Ok::<_, ApiError>((StatusCode::CREATED, Json(ApiResponse::success(related))))
}

pub async fn list_related(
    State(state): State<Arc<AppState>>,
    Path((type_tag, id)): Path<(String, i64)>,
) -> impl IntoResponse {
    let related = state
        .store
        .list_related_for_source(&ContentRef::new(type_tag, id))
        .api_err("Failed to list related content")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(related)))
}

pub async fn delete_related(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let deleted = state
        .store
        .delete_related(&id)
        .api_err("Failed to delete relation")?;

    if !deleted {
        return Err(ApiError::not_found("Relation not found"));
    }

    Ok::<_, ApiError>(StatusCode::NO_CONTENT)
}

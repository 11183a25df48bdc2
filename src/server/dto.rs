use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::Placement;

#[derive(Debug, Deserialize)]
pub struct CreateSiteRequest {
    pub name: String,
    pub domain: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateCategoryRequest {
    pub site_id: String,
    pub title: String,
    pub slug: String,
    #[serde(default)]
    pub parent_id: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// Partial update; absent fields keep their current value. The parent can
/// be changed but not cleared, the root never moves anyway.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateCategoryRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub parent_id: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpsertContentRequest {
    pub title: String,
    #[serde(default)]
    pub slug: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreatePlacementRequest {
    pub target_type: String,
    pub target_id: i64,
    pub category_id: String,
    #[serde(default)]
    pub publish_from: Option<DateTime<Utc>>,
    #[serde(default)]
    pub publish_to: Option<DateTime<Utc>>,
    /// Empty or absent means "derive from the target".
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub is_static: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdatePlacementRequest {
    #[serde(default)]
    pub category_id: Option<String>,
    #[serde(default)]
    pub publish_from: Option<DateTime<Utc>>,
    #[serde(default)]
    pub publish_to: Option<DateTime<Utc>>,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub is_static: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct CreateListingRequest {
    pub placement_id: String,
    pub category_id: String,
    #[serde(default)]
    pub publish_from: Option<DateTime<Utc>>,
    #[serde(default)]
    pub priority_from: Option<DateTime<Utc>>,
    #[serde(default)]
    pub priority_to: Option<DateTime<Utc>>,
    #[serde(default)]
    pub priority_value: Option<i64>,
    #[serde(default)]
    pub remove_after_priority: bool,
    #[serde(default)]
    pub is_commercial: bool,
}

/// Partial update; absent fields keep their current value. Priority
/// fields come as explicit nulls to clear them.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateListingRequest {
    #[serde(default)]
    pub publish_from: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "double_option")]
    pub priority_from: Option<Option<DateTime<Utc>>>,
    #[serde(default, deserialize_with = "double_option")]
    pub priority_to: Option<Option<DateTime<Utc>>>,
    #[serde(default, deserialize_with = "double_option")]
    pub priority_value: Option<Option<i64>>,
    #[serde(default)]
    pub remove_after_priority: Option<bool>,
    #[serde(default)]
    pub is_commercial: Option<bool>,
}

/// Distinguishes an absent field (keep) from an explicit null (clear).
fn double_option<'de, T, D>(de: D) -> Result<Option<Option<T>>, D::Error>
where
    T: serde::Deserialize<'de>,
    D: serde::Deserializer<'de>,
{
    serde::Deserialize::deserialize(de).map(Some)
}

#[derive(Debug, Deserialize)]
pub struct CreateAuthorRequest {
    pub name: String,
    /// Derived from the name when absent.
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateSourceRequest {
    pub name: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateRelatedRequest {
    pub source_type: String,
    pub source_id: i64,
    pub target_type: String,
    pub target_id: i64,
}

#[derive(Debug, Default, Deserialize)]
pub struct CursorParams {
    #[serde(default)]
    pub cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ListCategoriesParams {
    pub site: String,
    #[serde(default)]
    pub cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CategoryPathParams {
    pub site: String,
    #[serde(default)]
    pub path: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct ActiveListingsParams {
    /// Evaluation instant; defaults to the current time.
    #[serde(default)]
    pub at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub commercial: Option<bool>,
    #[serde(default)]
    pub limit: Option<i32>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PlacementUrlParams {
    #[serde(default)]
    pub prefer_cross_site: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct TopHitsParams {
    #[serde(default)]
    pub limit: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct RedirectParams {
    pub site: String,
    #[serde(default)]
    pub path: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PlacementUrlResponse {
    pub url: String,
}

#[derive(Debug, Serialize)]
pub struct PlacementDetailResponse {
    #[serde(flatten)]
    pub placement: Placement,
    pub url: String,
    pub is_active: bool,
    pub hits: i64,
}

mod schema;
pub mod slug;
mod sqlite;

pub use sqlite::SqliteStore;

use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::types::*;

/// Store defines the database interface.
///
/// Multi-step operations (`save_category`, `save_placement`) are atomic:
/// either the whole sequence commits or none of it does.
pub trait Store: Send + Sync {
    fn initialize(&self) -> Result<()>;

    // Site operations
    fn create_site(&self, site: &Site) -> Result<()>;
    fn get_site(&self, id: &str) -> Result<Option<Site>>;
    fn get_site_by_name(&self, name: &str) -> Result<Option<Site>>;
    fn list_sites(&self, cursor: &str, limit: i32) -> Result<Vec<Site>>;

    // Category operations. save_category recomputes the materialized path
    // and cascades path changes to every descendant in the same
    // transaction. Returns the category as persisted.
    fn save_category(&self, category: &Category) -> Result<Category>;
    fn get_category(&self, id: &str) -> Result<Option<Category>>;
    fn get_category_by_path(&self, site_id: &str, path: &str) -> Result<Option<Category>>;
    fn list_categories(&self, site_id: &str, cursor: &str, limit: i32) -> Result<Vec<Category>>;
    fn delete_category(&self, id: &str) -> Result<bool>;

    // Content item operations (the placeable objects)
    fn upsert_content_item(&self, item: &ContentItem) -> Result<()>;
    fn get_content_item(&self, target: &ContentRef) -> Result<Option<ContentItem>>;
    fn delete_content_item(&self, target: &ContentRef) -> Result<bool>;

    // Placement operations. save_placement derives an empty slug from the
    // target, generates/collapses redirects when the canonical URL changes,
    // and guarantees a hit counter exists, all in one transaction.
    fn save_placement(
        &self,
        placement: &Placement,
        default_site_id: &str,
        scheme: &str,
    ) -> Result<Placement>;
    fn get_placement(&self, id: &str) -> Result<Option<Placement>>;
    fn find_placement(&self, category_id: &str, target: &ContentRef) -> Result<Option<Placement>>;
    fn list_category_placements(
        &self,
        category_id: &str,
        cursor: &str,
        limit: i32,
    ) -> Result<Vec<Placement>>;
    fn placement_url(
        &self,
        id: &str,
        default_site_id: &str,
        scheme: &str,
        prefer_cross_site: bool,
    ) -> Result<String>;
    /// Human-readable display string; degrades to a sentinel when the
    /// target no longer resolves instead of erroring.
    fn describe_placement(&self, id: &str) -> Result<String>;
    fn delete_placement(&self, id: &str) -> Result<bool>;

    // Listing operations
    fn save_listing(&self, listing: &Listing) -> Result<()>;
    fn get_listing(&self, id: &str) -> Result<Option<Listing>>;
    /// Listings visible in a category at `now`: the underlying placement is
    /// active, the listing itself has started, and listings whose priority
    /// expired with `remove_after_priority` set are treated as absent.
    /// Promoted listings come first (highest priority value), then recency.
    fn list_active_listings(
        &self,
        category_id: &str,
        now: DateTime<Utc>,
        commercial: Option<bool>,
        limit: i32,
    ) -> Result<Vec<Listing>>;
    fn list_placement_listings(&self, placement_id: &str) -> Result<Vec<Listing>>;
    fn delete_listing(&self, id: &str) -> Result<bool>;

    // Hit count operations
    fn record_hit(&self, placement_id: &str) -> Result<HitCount>;
    fn get_hit_count(&self, placement_id: &str) -> Result<Option<HitCount>>;
    fn top_hit_counts(&self, limit: i32) -> Result<Vec<HitCount>>;

    // Redirect operations
    fn find_redirect(&self, site_id: &str, old_path: &str) -> Result<Option<Redirect>>;
    fn list_redirects(&self, site_id: &str) -> Result<Vec<Redirect>>;

    // Author operations
    fn create_author(&self, author: &Author) -> Result<()>;
    fn get_author(&self, id: &str) -> Result<Option<Author>>;
    fn get_author_by_slug(&self, slug: &str) -> Result<Option<Author>>;
    fn list_authors(&self, cursor: &str, limit: i32) -> Result<Vec<Author>>;
    fn delete_author(&self, id: &str) -> Result<bool>;

    // Source operations
    fn create_source(&self, source: &Source) -> Result<()>;
    fn get_source(&self, id: &str) -> Result<Option<Source>>;
    fn list_sources(&self, cursor: &str, limit: i32) -> Result<Vec<Source>>;
    fn delete_source(&self, id: &str) -> Result<bool>;

    // Related content operations
    fn create_related(&self, related: &Related) -> Result<()>;
    fn list_related_for_source(&self, source: &ContentRef) -> Result<Vec<Related>>;
    fn delete_related(&self, id: &str) -> Result<bool>;

    fn close(&self) -> Result<()>;
}

//! Cache-backed read path on top of the store.
//!
//! Handlers resolve sites, categories and content through a [`Resolver`]
//! so repeated lookups of the same hot objects (the category tree above
//! all) stay off the database. Write paths invalidate through the same
//! object before reporting success.

use std::sync::Arc;

use crate::cache::{CATEGORY_TAG, CachedEntity, ObjectCache, SITE_TAG};
use crate::error::{Error, Result};
use crate::store::Store;
use crate::types::{Category, ContentItem, ContentRef, Site};

/// Reserved tag for placement-derived memos (URLs, descriptions).
const PLACEMENT_TAG: &str = "core.placement";

pub struct Resolver {
    store: Arc<dyn Store>,
    cache: ObjectCache,
    default_site_id: String,
    scheme: String,
}

impl Resolver {
    pub fn new(store: Arc<dyn Store>, default_site_id: &str, scheme: &str) -> Self {
        Self {
            store,
            cache: ObjectCache::new(),
            default_site_id: default_site_id.to_string(),
            scheme: scheme.to_string(),
        }
    }

    pub fn site(&self, id: &str) -> Result<Option<Site>> {
        let store = &self.store;
        let entry = self.cache.get_or_load(SITE_TAG, id, || {
            Ok(store.get_site(id)?.map(CachedEntity::Site))
        })?;
        Ok(entry.and_then(|e| e.as_site().cloned()))
    }

    pub fn category(&self, id: &str) -> Result<Option<Category>> {
        let store = &self.store;
        let entry = self.cache.get_or_load(CATEGORY_TAG, id, || {
            Ok(store.get_category(id)?.map(CachedEntity::Category))
        })?;
        Ok(entry.and_then(|e| e.as_category().cloned()))
    }

    /// Path lookups share the category tag, so any category write flushes
    /// them along with the id-keyed entries.
    pub fn category_by_path(&self, site_id: &str, path: &str) -> Result<Option<Category>> {
        let store = &self.store;
        let key = format!("path:{site_id}:{path}");
        let entry = self.cache.get_or_load(CATEGORY_TAG, &key, || {
            Ok(store
                .get_category_by_path(site_id, path)?
                .map(CachedEntity::Category))
        })?;
        Ok(entry.and_then(|e| e.as_category().cloned()))
    }

    pub fn content(&self, target: &ContentRef) -> Result<Option<ContentItem>> {
        let store = &self.store;
        let id = target.id.to_string();
        let entry = self.cache.get_or_load(&target.type_tag, &id, || {
            Ok(store.get_content_item(target)?.map(CachedEntity::Content))
        })?;
        Ok(entry.and_then(|e| e.as_content().cloned()))
    }

    /// Human-readable name of a category: `site/path`, or just the site
    /// name for the root. Memoized per category.
    pub fn category_display_name(&self, id: &str) -> Result<String> {
        let key = format!("{CATEGORY_TAG}:{id}:display");
        self.cache.memoize(&key, || {
            let category = self.category(id)?.ok_or(Error::NotFound)?;
            let site = self.site(&category.site_id)?.ok_or(Error::NotFound)?;
            if category.path.is_empty() {
                Ok(site.name)
            } else {
                Ok(format!("{}/{}", site.name, category.path))
            }
        })
    }

    /// Canonical URL of a placement, memoized until the placement or the
    /// category tree changes.
    pub fn placement_url(&self, id: &str, prefer_cross_site: bool) -> Result<String> {
        let key = format!("{PLACEMENT_TAG}:{id}:url:{prefer_cross_site}");
        self.cache.memoize(&key, || {
            self.store
                .placement_url(id, &self.default_site_id, &self.scheme, prefer_cross_site)
        })
    }

    pub fn describe_placement(&self, id: &str) -> Result<String> {
        let key = format!("{PLACEMENT_TAG}:{id}:describe");
        self.cache
            .memoize(&key, || self.store.describe_placement(id))
    }

    pub fn invalidate_site(&self, id: &str) {
        self.cache.invalidate(SITE_TAG, id);
        // Display names and URLs embed site data.
        self.cache.invalidate_type(CATEGORY_TAG);
        self.cache.invalidate_type(PLACEMENT_TAG);
    }

    /// Category writes cascade paths to descendants, so the whole tag is
    /// flushed rather than one entry.
    pub fn invalidate_categories(&self) {
        self.cache.invalidate_type(CATEGORY_TAG);
        self.cache.invalidate_type(PLACEMENT_TAG);
    }

    pub fn invalidate_content(&self, target: &ContentRef) {
        self.cache
            .invalidate(&target.type_tag, &target.id.to_string());
        self.cache.invalidate_type(PLACEMENT_TAG);
    }

    pub fn invalidate_placement(&self, id: &str) {
        self.cache.invalidate(PLACEMENT_TAG, id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::SqliteStore;
    use chrono::Utc;
    use tempfile::TempDir;
    use uuid::Uuid;

    fn setup() -> (TempDir, Arc<SqliteStore>, Site) {
        let temp = TempDir::new().unwrap();
        let store = Arc::new(SqliteStore::new(temp.path().join("test.db")).unwrap());
        store.initialize().unwrap();
        let site = Site {
            id: "s-1".to_string(),
            name: "news-site".to_string(),
            domain: "example.com".to_string(),
            created_at: Utc::now(),
        };
        store.create_site(&site).unwrap();
        (temp, store, site)
    }

    fn category(store: &SqliteStore, site: &Site, slug: &str, parent: Option<&str>) -> Category {
        store
            .save_category(&Category {
                id: Uuid::new_v4().to_string(),
                site_id: site.id.clone(),
                title: slug.to_string(),
                slug: slug.to_string(),
                parent_id: parent.map(str::to_string),
                path: String::new(),
                description: None,
                created_at: Utc::now(),
                updated_at: Utc::now(),
            })
            .unwrap()
    }

    #[test]
    fn test_category_resolution_is_cached() {
        let (_temp, store, site) = setup();
        let root = category(&store, &site, "home", None);
        let sports = category(&store, &site, "sports", Some(&root.id));

        let resolver = Resolver::new(store.clone(), &site.id, "http");
        assert_eq!(resolver.category(&sports.id).unwrap().unwrap().path, "sports");

        // a write behind the cache's back is not observed...
        let mut renamed = sports.clone();
        renamed.slug = "sport".to_string();
        store.save_category(&renamed).unwrap();
        assert_eq!(resolver.category(&sports.id).unwrap().unwrap().path, "sports");

        // ...until the category tag is flushed
        resolver.invalidate_categories();
        assert_eq!(resolver.category(&sports.id).unwrap().unwrap().path, "sport");
    }

    #[test]
    fn test_path_lookup_flushed_with_category_tag() {
        let (_temp, store, site) = setup();
        let root = category(&store, &site, "home", None);
        category(&store, &site, "sports", Some(&root.id));

        let resolver = Resolver::new(store.clone(), &site.id, "http");
        assert!(resolver.category_by_path(&site.id, "sports").unwrap().is_some());

        resolver.invalidate_categories();
        assert!(resolver.category_by_path(&site.id, "sports").unwrap().is_some());
        assert!(resolver.category_by_path(&site.id, "nope").unwrap().is_none());
    }

    #[test]
    fn test_display_name() {
        let (_temp, store, site) = setup();
        let root = category(&store, &site, "home", None);
        let sports = category(&store, &site, "sports", Some(&root.id));
        let football = category(&store, &site, "football", Some(&sports.id));

        let resolver = Resolver::new(store, &site.id, "http");
        assert_eq!(resolver.category_display_name(&root.id).unwrap(), "news-site");
        assert_eq!(
            resolver.category_display_name(&football.id).unwrap(),
            "news-site/sports/football"
        );
        assert!(matches!(
            resolver.category_display_name("missing"),
            Err(Error::NotFound)
        ));
    }

    #[test]
    fn test_missing_content_stays_a_miss() {
        let (_temp, store, site) = setup();
        let resolver = Resolver::new(store.clone(), &site.id, "http");

        let target = ContentRef::new("article", 7);
        assert!(resolver.content(&target).unwrap().is_none());

        store
            .upsert_content_item(&ContentItem {
                type_tag: "article".to_string(),
                id: 7,
                title: "Late arrival".to_string(),
                slug: Some("late-arrival".to_string()),
                created_at: Utc::now(),
                updated_at: Utc::now(),
            })
            .unwrap();

        // Ok(None) was never cached, so the next lookup sees the row.
        assert!(resolver.content(&target).unwrap().is_some());
    }
}

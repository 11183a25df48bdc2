//! Process-wide read-through cache for frequently resolved objects.
//!
//! Entries are keyed by `(type_tag, id)` and live until explicitly
//! invalidated; there is no TTL. Writers must invalidate before they
//! report success, and a reader racing a write may briefly observe a
//! stale value, which is tolerated.
//!
//! Built-in entities use the reserved `core.*` tags so they cannot
//! collide with user-defined content type tags.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::error::Result;
use crate::types::{Category, ContentItem, Site};

/// Tag under which categories are cached.
pub const CATEGORY_TAG: &str = "core.category";
/// Tag under which sites are cached.
pub const SITE_TAG: &str = "core.site";

#[derive(Debug, Clone)]
pub enum CachedEntity {
    Site(Site),
    Category(Category),
    Content(ContentItem),
}

impl CachedEntity {
    #[must_use]
    pub fn as_site(&self) -> Option<&Site> {
        match self {
            CachedEntity::Site(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_category(&self) -> Option<&Category> {
        match self {
            CachedEntity::Category(c) => Some(c),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_content(&self) -> Option<&ContentItem> {
        match self {
            CachedEntity::Content(c) => Some(c),
            _ => None,
        }
    }
}

type Key = (String, String);

#[derive(Default)]
pub struct ObjectCache {
    objects: RwLock<HashMap<Key, Arc<CachedEntity>>>,
    lists: RwLock<HashMap<Key, Arc<Vec<CachedEntity>>>>,
    memos: RwLock<HashMap<String, String>>,
}

impl ObjectCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached object for `(type_tag, id)`, loading and storing
    /// it on a miss. A loader returning `Ok(None)` is not cached, so a
    /// dangling reference stays a miss.
    pub fn get_or_load<F>(
        &self,
        type_tag: &str,
        id: &str,
        loader: F,
    ) -> Result<Option<Arc<CachedEntity>>>
    where
        F: FnOnce() -> Result<Option<CachedEntity>>,
    {
        let key = (type_tag.to_string(), id.to_string());
        if let Some(hit) = self.objects.read().unwrap_or_else(|e| e.into_inner()).get(&key) {
            return Ok(Some(Arc::clone(hit)));
        }

        let Some(loaded) = loader()? else {
            return Ok(None);
        };
        let entry = Arc::new(loaded);
        self.objects
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(key, Arc::clone(&entry));
        Ok(Some(entry))
    }

    /// Read-through for filtered collections, keyed by `(type_tag, filter)`.
    pub fn get_or_load_list<F>(
        &self,
        type_tag: &str,
        filter: &str,
        loader: F,
    ) -> Result<Arc<Vec<CachedEntity>>>
    where
        F: FnOnce() -> Result<Vec<CachedEntity>>,
    {
        let key = (type_tag.to_string(), filter.to_string());
        if let Some(hit) = self.lists.read().unwrap_or_else(|e| e.into_inner()).get(&key) {
            return Ok(Arc::clone(hit));
        }

        let entry = Arc::new(loader()?);
        self.lists
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(key, Arc::clone(&entry));
        Ok(entry)
    }

    /// Memoizes a derived string under an explicit key. Keys follow the
    /// `type_tag:id:...` shape so entity invalidation clears them.
    pub fn memoize<F>(&self, key: &str, f: F) -> Result<String>
    where
        F: FnOnce() -> Result<String>,
    {
        if let Some(hit) = self.memos.read().unwrap_or_else(|e| e.into_inner()).get(key) {
            return Ok(hit.clone());
        }

        let value = f()?;
        self.memos
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(key.to_string(), value.clone());
        Ok(value)
    }

    /// Drops the entry for one entity, any cached lists of its type, and
    /// any memoized strings derived from it.
    pub fn invalidate(&self, type_tag: &str, id: &str) {
        let key = (type_tag.to_string(), id.to_string());
        self.objects
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&key);
        self.lists
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .retain(|(tag, _), _| tag != type_tag);
        let memo_prefix = format!("{type_tag}:{id}");
        self.memos
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .retain(|k, _| !k.starts_with(&memo_prefix));
    }

    /// Drops every entry of one type.
    pub fn invalidate_type(&self, type_tag: &str) {
        self.objects
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .retain(|(tag, _), _| tag != type_tag);
        self.lists
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .retain(|(tag, _), _| tag != type_tag);
        let memo_prefix = format!("{type_tag}:");
        self.memos
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .retain(|k, _| !k.starts_with(&memo_prefix));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn site(id: &str, domain: &str) -> CachedEntity {
        CachedEntity::Site(Site {
            id: id.to_string(),
            name: id.to_string(),
            domain: domain.to_string(),
            created_at: Utc::now(),
        })
    }

    #[test]
    fn test_get_or_load_hits_after_first_load() {
        let cache = ObjectCache::new();
        let mut loads = 0;

        for _ in 0..3 {
            let entry = cache
                .get_or_load(SITE_TAG, "s-1", || {
                    loads += 1;
                    Ok(Some(site("s-1", "example.com")))
                })
                .unwrap()
                .unwrap();
            assert_eq!(entry.as_site().unwrap().domain, "example.com");
        }
        assert_eq!(loads, 1);
    }

    #[test]
    fn test_missing_object_not_cached() {
        let cache = ObjectCache::new();
        let mut loads = 0;

        for _ in 0..2 {
            let entry = cache
                .get_or_load(SITE_TAG, "nope", || {
                    loads += 1;
                    Ok(None)
                })
                .unwrap();
            assert!(entry.is_none());
        }
        // a dangling reference is re-resolved every time
        assert_eq!(loads, 2);
    }

    #[test]
    fn test_invalidate_forces_reload() {
        let cache = ObjectCache::new();

        let first = cache
            .get_or_load(SITE_TAG, "s-1", || Ok(Some(site("s-1", "old.example.com"))))
            .unwrap()
            .unwrap();
        assert_eq!(first.as_site().unwrap().domain, "old.example.com");

        cache.invalidate(SITE_TAG, "s-1");

        let second = cache
            .get_or_load(SITE_TAG, "s-1", || Ok(Some(site("s-1", "new.example.com"))))
            .unwrap()
            .unwrap();
        assert_eq!(second.as_site().unwrap().domain, "new.example.com");
    }

    #[test]
    fn test_invalidate_entity_clears_type_lists_and_memos() {
        let cache = ObjectCache::new();

        cache
            .get_or_load_list(SITE_TAG, "all", || {
                Ok(vec![site("s-1", "a.example.com"), site("s-2", "b.example.com")])
            })
            .unwrap();
        cache
            .memoize("core.site:s-1:display", || Ok("Site One".to_string()))
            .unwrap();

        cache.invalidate(SITE_TAG, "s-1");

        let mut list_loads = 0;
        cache
            .get_or_load_list(SITE_TAG, "all", || {
                list_loads += 1;
                Ok(vec![])
            })
            .unwrap();
        assert_eq!(list_loads, 1);

        let mut memo_loads = 0;
        cache
            .memoize("core.site:s-1:display", || {
                memo_loads += 1;
                Ok("Site One".to_string())
            })
            .unwrap();
        assert_eq!(memo_loads, 1);
    }

    #[test]
    fn test_invalidate_type_scoped_to_tag() {
        let cache = ObjectCache::new();

        cache
            .get_or_load(SITE_TAG, "s-1", || Ok(Some(site("s-1", "a.example.com"))))
            .unwrap();
        cache
            .get_or_load("article", "1", || {
                Ok(Some(CachedEntity::Content(ContentItem {
                    type_tag: "article".to_string(),
                    id: 1,
                    title: "First".to_string(),
                    slug: None,
                    created_at: Utc::now(),
                    updated_at: Utc::now(),
                })))
            })
            .unwrap();

        cache.invalidate_type("article");

        let mut site_loads = 0;
        cache
            .get_or_load(SITE_TAG, "s-1", || {
                site_loads += 1;
                Ok(Some(site("s-1", "a.example.com")))
            })
            .unwrap();
        assert_eq!(site_loads, 0, "site entry must survive article invalidation");

        let mut article_loads = 0;
        cache
            .get_or_load("article", "1", || {
                article_loads += 1;
                Ok(None)
            })
            .unwrap();
        assert_eq!(article_loads, 1);
    }
}

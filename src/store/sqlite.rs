use std::path::Path;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, Row, params};
use uuid::Uuid;

use super::Store;
use super::schema::SCHEMA;
use super::slug::validate_slug;
use crate::error::{Error, Result};
use crate::types::*;
use crate::url;

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let conn = Connection::open(db_path)?;

        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.pragma_update(None, "journal_mode", "WAL")?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Returns a guard to the underlying database connection.
    /// This allows consuming applications to execute custom SQL.
    pub fn connection(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn()
    }
}

fn parse_datetime(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|_| {
            // Handle SQLite's default datetime format: "YYYY-MM-DD HH:MM:SS"
            chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .unwrap_or_else(|e| {
            tracing::error!("Invalid datetime in database: '{}' - {}", s, e);
            Utc::now()
        })
}

fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339()
}

/// Maps unique-index violations to AlreadyExists; everything else passes
/// through as a database error.
fn map_constraint(e: rusqlite::Error) -> Error {
    match e {
        rusqlite::Error::SqliteFailure(err, _)
            if err.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            Error::AlreadyExists
        }
        e => Error::from(e),
    }
}

fn site_from_row(row: &Row) -> rusqlite::Result<Site> {
    Ok(Site {
        id: row.get(0)?,
        name: row.get(1)?,
        domain: row.get(2)?,
        created_at: parse_datetime(&row.get::<_, String>(3)?),
    })
}

fn category_from_row(row: &Row) -> rusqlite::Result<Category> {
    Ok(Category {
        id: row.get(0)?,
        site_id: row.get(1)?,
        title: row.get(2)?,
        slug: row.get(3)?,
        parent_id: row.get(4)?,
        path: row.get(5)?,
        description: row.get(6)?,
        created_at: parse_datetime(&row.get::<_, String>(7)?),
        updated_at: parse_datetime(&row.get::<_, String>(8)?),
    })
}

fn content_from_row(row: &Row) -> rusqlite::Result<ContentItem> {
    Ok(ContentItem {
        type_tag: row.get(0)?,
        id: row.get(1)?,
        title: row.get(2)?,
        slug: row.get(3)?,
        created_at: parse_datetime(&row.get::<_, String>(4)?),
        updated_at: parse_datetime(&row.get::<_, String>(5)?),
    })
}

fn placement_from_row(row: &Row) -> rusqlite::Result<Placement> {
    Ok(Placement {
        id: row.get(0)?,
        target_type: row.get(1)?,
        target_id: row.get(2)?,
        category_id: row.get(3)?,
        publish_from: parse_datetime(&row.get::<_, String>(4)?),
        publish_to: row.get::<_, Option<String>>(5)?.map(|s| parse_datetime(&s)),
        slug: row.get(6)?,
        is_static: row.get(7)?,
        created_at: parse_datetime(&row.get::<_, String>(8)?),
        updated_at: parse_datetime(&row.get::<_, String>(9)?),
    })
}

fn listing_from_row(row: &Row) -> rusqlite::Result<Listing> {
    Ok(Listing {
        id: row.get(0)?,
        placement_id: row.get(1)?,
        category_id: row.get(2)?,
        publish_from: parse_datetime(&row.get::<_, String>(3)?),
        priority_from: row.get::<_, Option<String>>(4)?.map(|s| parse_datetime(&s)),
        priority_to: row.get::<_, Option<String>>(5)?.map(|s| parse_datetime(&s)),
        priority_value: row.get(6)?,
        remove_after_priority: row.get(7)?,
        is_commercial: row.get(8)?,
        created_at: parse_datetime(&row.get::<_, String>(9)?),
    })
}

const SITE_COLS: &str = "id, name, domain, created_at";
const CATEGORY_COLS: &str =
    "id, site_id, title, slug, parent_id, path, description, created_at, updated_at";
const CONTENT_COLS: &str = "type_tag, id, title, slug, created_at, updated_at";
const PLACEMENT_COLS: &str = "id, target_type, target_id, category_id, publish_from, publish_to, slug, is_static, created_at, updated_at";
const LISTING_COLS: &str = "id, placement_id, category_id, publish_from, priority_from, priority_to, priority_value, remove_after_priority, is_commercial, created_at";

fn site_by_id(conn: &Connection, id: &str) -> Result<Option<Site>> {
    conn.query_row(
        &format!("SELECT {SITE_COLS} FROM sites WHERE id = ?1"),
        params![id],
        site_from_row,
    )
    .optional()
    .map_err(Error::from)
}

fn category_by_id(conn: &Connection, id: &str) -> Result<Option<Category>> {
    conn.query_row(
        &format!("SELECT {CATEGORY_COLS} FROM categories WHERE id = ?1"),
        params![id],
        category_from_row,
    )
    .optional()
    .map_err(Error::from)
}

fn content_by_ref(conn: &Connection, target: &ContentRef) -> Result<Option<ContentItem>> {
    conn.query_row(
        &format!("SELECT {CONTENT_COLS} FROM content_items WHERE type_tag = ?1 AND id = ?2"),
        params![target.type_tag, target.id],
        content_from_row,
    )
    .optional()
    .map_err(Error::from)
}

fn placement_by_id(conn: &Connection, id: &str) -> Result<Option<Placement>> {
    conn.query_row(
        &format!("SELECT {PLACEMENT_COLS} FROM placements WHERE id = ?1"),
        params![id],
        placement_from_row,
    )
    .optional()
    .map_err(Error::from)
}

/// Canonical URL plus the owning site id for a placement, straight from
/// the given connection (usable mid-transaction).
fn canonical_url_for(
    conn: &Connection,
    placement: &Placement,
    default_site_id: &str,
    scheme: &str,
) -> Result<(String, String)> {
    let category = category_by_id(conn, &placement.category_id)?.ok_or(Error::NotFound)?;
    let site = site_by_id(conn, &category.site_id)?.ok_or(Error::NotFound)?;
    let url = url::placement_url(placement, &category, &site, default_site_id, scheme, false);
    Ok((url, site.id))
}

impl Store for SqliteStore {
    fn initialize(&self) -> Result<()> {
        self.conn().execute_batch(SCHEMA)?;
        Ok(())
    }

    // Site operations

    fn create_site(&self, site: &Site) -> Result<()> {
        self.conn()
            .execute(
                "INSERT INTO sites (id, name, domain, created_at) VALUES (?1, ?2, ?3, ?4)",
                params![
                    site.id,
                    site.name,
                    site.domain,
                    format_datetime(&site.created_at)
                ],
            )
            .map_err(map_constraint)?;
        Ok(())
    }

    fn get_site(&self, id: &str) -> Result<Option<Site>> {
        site_by_id(&self.conn(), id)
    }

    fn get_site_by_name(&self, name: &str) -> Result<Option<Site>> {
        let conn = self.conn();
        conn.query_row(
            &format!("SELECT {SITE_COLS} FROM sites WHERE name = ?1"),
            params![name],
            site_from_row,
        )
        .optional()
        .map_err(Error::from)
    }

    fn list_sites(&self, cursor: &str, limit: i32) -> Result<Vec<Site>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {SITE_COLS} FROM sites WHERE name > ?1 ORDER BY name LIMIT ?2"
        ))?;

        let rows = stmt.query_map(params![cursor, limit], site_from_row)?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    // Category operations

    fn save_category(&self, category: &Category) -> Result<Category> {
        validate_slug(&category.slug)?;

        let mut conn = self.conn();
        let tx = conn.transaction()?;

        let existing = category_by_id(&tx, &category.id)?;

        // Recompute the materialized path from the parent.
        let path = match &category.parent_id {
            Some(parent_id) => {
                let parent = category_by_id(&tx, parent_id)?.ok_or(Error::NotFound)?;
                if parent.site_id != category.site_id {
                    return Err(Error::BadRequest(
                        "Parent category must belong to the same site".to_string(),
                    ));
                }
                if let Some(old) = &existing {
                    if old.path.is_empty() {
                        // every category on the site descends from the root
                        return Err(Error::BadRequest(
                            "Cannot reparent the root category".to_string(),
                        ));
                    }
                    if parent.id == old.id
                        || parent.path.starts_with(&format!("{}/", old.path))
                        || parent.path == old.path
                    {
                        return Err(Error::BadRequest(
                            "Cannot move category under itself or its descendants".to_string(),
                        ));
                    }
                }
                if parent.path.is_empty() {
                    category.slug.clone()
                } else {
                    format!("{}/{}", parent.path, category.slug)
                }
            }
            None => String::new(),
        };

        let now = Utc::now();
        let mut saved = category.clone();
        saved.path = path.clone();
        saved.updated_at = now;

        match &existing {
            None => {
                saved.created_at = now;
                tx.execute(
                    "INSERT INTO categories (id, site_id, title, slug, parent_id, path, description, created_at, updated_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                    params![
                        saved.id,
                        saved.site_id,
                        saved.title,
                        saved.slug,
                        saved.parent_id,
                        saved.path,
                        saved.description,
                        format_datetime(&now),
                        format_datetime(&now),
                    ],
                )
                .map_err(map_constraint)?;
            }
            Some(old) => {
                saved.created_at = old.created_at;
                tx.execute(
                    "UPDATE categories SET title = ?1, slug = ?2, parent_id = ?3, path = ?4, description = ?5, updated_at = ?6
                     WHERE id = ?7",
                    params![
                        saved.title,
                        saved.slug,
                        saved.parent_id,
                        saved.path,
                        saved.description,
                        format_datetime(&now),
                        saved.id,
                    ],
                )
                .map_err(map_constraint)?;

                if old.path != saved.path && !old.path.is_empty() {
                    // Cascade to descendants in ascending path order so
                    // ancestors are rewritten before their children.
                    let old_prefix = format!("{}/", old.path);
                    let descendants: Vec<(String, String)> = {
                        let mut stmt = tx.prepare(
                            "SELECT id, path FROM categories WHERE site_id = ?1 AND path LIKE ?2 ORDER BY path",
                        )?;
                        let rows = stmt.query_map(
                            params![saved.site_id, format!("{}%", old_prefix)],
                            |row| Ok((row.get(0)?, row.get(1)?)),
                        )?;
                        rows.collect::<std::result::Result<Vec<_>, _>>()?
                    };

                    for (child_id, child_path) in descendants {
                        let suffix = &child_path[old.path.len()..]; // starts with '/'
                        let new_child_path = if saved.path.is_empty() {
                            suffix.trim_start_matches('/').to_string()
                        } else {
                            format!("{}{}", saved.path, suffix)
                        };
                        tx.execute(
                            "UPDATE categories SET path = ?1, updated_at = ?2 WHERE id = ?3",
                            params![new_child_path, format_datetime(&now), child_id],
                        )
                        .map_err(map_constraint)?;
                    }
                }
            }
        }

        tx.commit()?;
        Ok(saved)
    }

    fn get_category(&self, id: &str) -> Result<Option<Category>> {
        category_by_id(&self.conn(), id)
    }

    fn get_category_by_path(&self, site_id: &str, path: &str) -> Result<Option<Category>> {
        let conn = self.conn();
        conn.query_row(
            &format!("SELECT {CATEGORY_COLS} FROM categories WHERE site_id = ?1 AND path = ?2"),
            params![site_id, path],
            category_from_row,
        )
        .optional()
        .map_err(Error::from)
    }

    fn list_categories(&self, site_id: &str, cursor: &str, limit: i32) -> Result<Vec<Category>> {
        let conn = self.conn();
        // the root category has an empty path, so an empty cursor means "from the start"
        let mut stmt = conn.prepare(&format!(
            "SELECT {CATEGORY_COLS} FROM categories
             WHERE site_id = ?1 AND (?2 = '' OR path > ?2) ORDER BY path LIMIT ?3"
        ))?;

        let rows = stmt.query_map(params![site_id, cursor, limit], category_from_row)?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn delete_category(&self, id: &str) -> Result<bool> {
        let conn = self.conn();

        let children: i32 = conn.query_row(
            "SELECT COUNT(*) FROM categories WHERE parent_id = ?1",
            params![id],
            |row| row.get(0),
        )?;
        if children > 0 {
            return Err(Error::Conflict(
                "Category has child categories".to_string(),
            ));
        }

        let placed: i32 = conn.query_row(
            "SELECT (SELECT COUNT(*) FROM placements WHERE category_id = ?1)
                  + (SELECT COUNT(*) FROM listings WHERE category_id = ?1)",
            params![id],
            |row| row.get(0),
        )?;
        if placed > 0 {
            return Err(Error::Conflict(
                "Category has placements or listings".to_string(),
            ));
        }

        let rows = conn.execute("DELETE FROM categories WHERE id = ?1", params![id])?;
        Ok(rows > 0)
    }

    // Content item operations

    fn upsert_content_item(&self, item: &ContentItem) -> Result<()> {
        if let Some(slug) = &item.slug {
            validate_slug(slug)?;
        }
        self.conn().execute(
            "INSERT INTO content_items (type_tag, id, title, slug, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT (type_tag, id) DO UPDATE SET
                title = excluded.title,
                slug = excluded.slug,
                updated_at = excluded.updated_at",
            params![
                item.type_tag,
                item.id,
                item.title,
                item.slug,
                format_datetime(&item.created_at),
                format_datetime(&Utc::now()),
            ],
        )?;
        Ok(())
    }

    fn get_content_item(&self, target: &ContentRef) -> Result<Option<ContentItem>> {
        content_by_ref(&self.conn(), target)
    }

    fn delete_content_item(&self, target: &ContentRef) -> Result<bool> {
        let rows = self.conn().execute(
            "DELETE FROM content_items WHERE type_tag = ?1 AND id = ?2",
            params![target.type_tag, target.id],
        )?;
        Ok(rows > 0)
    }

    // Placement operations

    fn save_placement(
        &self,
        placement: &Placement,
        default_site_id: &str,
        scheme: &str,
    ) -> Result<Placement> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;

        let now = Utc::now();
        let mut saved = placement.clone();
        saved.updated_at = now;

        if saved.slug.is_empty() {
            let target = content_by_ref(
                &tx,
                &ContentRef::new(saved.target_type.clone(), saved.target_id),
            )?
            .ok_or(Error::NotFound)?;
            saved.slug = target
                .slug
                .clone()
                .unwrap_or_else(|| saved.target_id.to_string());
        } else {
            validate_slug(&saved.slug)?;
        }

        let existing = placement_by_id(&tx, &saved.id)?;

        // The previous canonical URL has to be computed before mutation. A
        // placement whose old category row is gone simply produces no
        // redirect.
        let old_url = match &existing {
            Some(old) => match canonical_url_for(&tx, old, default_site_id, scheme) {
                Ok(parts) => Some(parts),
                Err(Error::NotFound) => None,
                Err(e) => return Err(e),
            },
            None => None,
        };

        match &existing {
            None => {
                saved.created_at = now;
                tx.execute(
                    "INSERT INTO placements (id, target_type, target_id, category_id, publish_from, publish_to, slug, is_static, created_at, updated_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                    params![
                        saved.id,
                        saved.target_type,
                        saved.target_id,
                        saved.category_id,
                        format_datetime(&saved.publish_from),
                        saved.publish_to.as_ref().map(format_datetime),
                        saved.slug,
                        saved.is_static,
                        format_datetime(&now),
                        format_datetime(&now),
                    ],
                )
                .map_err(map_constraint)?;
            }
            Some(old) => {
                saved.created_at = old.created_at;
                tx.execute(
                    "UPDATE placements SET target_type = ?1, target_id = ?2, category_id = ?3, publish_from = ?4, publish_to = ?5, slug = ?6, is_static = ?7, updated_at = ?8
                     WHERE id = ?9",
                    params![
                        saved.target_type,
                        saved.target_id,
                        saved.category_id,
                        format_datetime(&saved.publish_from),
                        saved.publish_to.as_ref().map(format_datetime),
                        saved.slug,
                        saved.is_static,
                        format_datetime(&now),
                        saved.id,
                    ],
                )
                .map_err(map_constraint)?;
            }
        }

        let (new_url, _) = canonical_url_for(&tx, &saved, default_site_id, scheme)?;

        if let Some((old_url, old_site_id)) = old_url {
            if old_url != new_url && !new_url.is_empty() && !old_url.is_empty() {
                let redirect_id = Uuid::new_v4().to_string();
                tx.execute(
                    "INSERT INTO redirects (id, site_id, old_path, new_path, created_at)
                     VALUES (?1, ?2, ?3, ?4, ?5)
                     ON CONFLICT (site_id, old_path) DO UPDATE SET new_path = excluded.new_path",
                    params![
                        redirect_id,
                        old_site_id,
                        old_url,
                        new_url,
                        format_datetime(&now)
                    ],
                )?;
                let redirect_id: String = tx.query_row(
                    "SELECT id FROM redirects WHERE site_id = ?1 AND old_path = ?2",
                    params![old_site_id, old_url],
                    |row| row.get(0),
                )?;

                // Collapse chains: anything that pointed at the old path now
                // points directly at the new one.
                tx.execute(
                    "UPDATE redirects SET new_path = ?1 WHERE site_id = ?2 AND new_path = ?3 AND id != ?4",
                    params![new_url, old_site_id, old_url, redirect_id],
                )?;
            }
        }

        // Hit counter exists from the first save on; never reset on update.
        tx.execute(
            "INSERT OR IGNORE INTO hit_counts (placement_id, hits, last_seen) VALUES (?1, 1, ?2)",
            params![saved.id, format_datetime(&now)],
        )?;

        tx.commit()?;
        Ok(saved)
    }

    fn get_placement(&self, id: &str) -> Result<Option<Placement>> {
        placement_by_id(&self.conn(), id)
    }

    fn find_placement(&self, category_id: &str, target: &ContentRef) -> Result<Option<Placement>> {
        let conn = self.conn();
        conn.query_row(
            &format!(
                "SELECT {PLACEMENT_COLS} FROM placements
                 WHERE category_id = ?1 AND target_type = ?2 AND target_id = ?3"
            ),
            params![category_id, target.type_tag, target.id],
            placement_from_row,
        )
        .optional()
        .map_err(Error::from)
    }

    fn list_category_placements(
        &self,
        category_id: &str,
        cursor: &str,
        limit: i32,
    ) -> Result<Vec<Placement>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {PLACEMENT_COLS} FROM placements
             WHERE category_id = ?1 AND (?2 = '' OR publish_from < ?2)
             ORDER BY publish_from DESC LIMIT ?3"
        ))?;

        let rows = stmt.query_map(params![category_id, cursor, limit], placement_from_row)?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn placement_url(
        &self,
        id: &str,
        default_site_id: &str,
        scheme: &str,
        prefer_cross_site: bool,
    ) -> Result<String> {
        let conn = self.conn();
        let placement = placement_by_id(&conn, id)?.ok_or(Error::NotFound)?;
        let category = category_by_id(&conn, &placement.category_id)?.ok_or(Error::NotFound)?;
        let site = site_by_id(&conn, &category.site_id)?.ok_or(Error::NotFound)?;
        Ok(url::placement_url(
            &placement,
            &category,
            &site,
            default_site_id,
            scheme,
            prefer_cross_site,
        ))
    }

    fn describe_placement(&self, id: &str) -> Result<String> {
        let conn = self.conn();
        let placement = placement_by_id(&conn, id)?.ok_or(Error::NotFound)?;

        let target = content_by_ref(
            &conn,
            &ContentRef::new(placement.target_type.clone(), placement.target_id),
        )?;
        let Some(target) = target else {
            return Ok("broken placement".to_string());
        };

        let category = category_by_id(&conn, &placement.category_id)?.ok_or(Error::NotFound)?;
        let site = site_by_id(&conn, &category.site_id)?.ok_or(Error::NotFound)?;
        Ok(format!(
            "{} placed in {}/{}",
            target.title, site.name, category.path
        ))
    }

    fn delete_placement(&self, id: &str) -> Result<bool> {
        let rows = self
            .conn()
            .execute("DELETE FROM placements WHERE id = ?1", params![id])?;
        Ok(rows > 0)
    }

    // Listing operations

    fn save_listing(&self, listing: &Listing) -> Result<()> {
        let conn = self.conn();

        placement_by_id(&conn, &listing.placement_id)?.ok_or(Error::NotFound)?;
        category_by_id(&conn, &listing.category_id)?.ok_or(Error::NotFound)?;

        conn.execute(
            "INSERT INTO listings (id, placement_id, category_id, publish_from, priority_from, priority_to, priority_value, remove_after_priority, is_commercial, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
             ON CONFLICT (id) DO UPDATE SET
                placement_id = excluded.placement_id,
                category_id = excluded.category_id,
                publish_from = excluded.publish_from,
                priority_from = excluded.priority_from,
                priority_to = excluded.priority_to,
                priority_value = excluded.priority_value,
                remove_after_priority = excluded.remove_after_priority,
                is_commercial = excluded.is_commercial",
            params![
                listing.id,
                listing.placement_id,
                listing.category_id,
                format_datetime(&listing.publish_from),
                listing.priority_from.as_ref().map(format_datetime),
                listing.priority_to.as_ref().map(format_datetime),
                listing.priority_value,
                listing.remove_after_priority,
                listing.is_commercial,
                format_datetime(&listing.created_at),
            ],
        )?;
        Ok(())
    }

    fn get_listing(&self, id: &str) -> Result<Option<Listing>> {
        let conn = self.conn();
        conn.query_row(
            &format!("SELECT {LISTING_COLS} FROM listings WHERE id = ?1"),
            params![id],
            listing_from_row,
        )
        .optional()
        .map_err(Error::from)
    }

    fn list_active_listings(
        &self,
        category_id: &str,
        now: DateTime<Utc>,
        commercial: Option<bool>,
        limit: i32,
    ) -> Result<Vec<Listing>> {
        let conn = self.conn();
        let now = format_datetime(&now);

        // Expired-and-removable listings are filtered here, not deleted:
        // the rows persist but the query layer treats them as absent.
        let mut stmt = conn.prepare(&format!(
            "SELECT l.{}
             FROM listings l
             JOIN placements p ON p.id = l.placement_id
             WHERE l.category_id = ?1
               AND l.publish_from <= ?2
               AND p.publish_from < ?2
               AND (p.publish_to IS NULL OR p.publish_to > ?2)
               AND NOT (l.remove_after_priority = 1 AND l.priority_to IS NOT NULL AND l.priority_to < ?2)
               AND (?3 IS NULL OR l.is_commercial = ?3)
             ORDER BY
               CASE WHEN l.priority_value IS NOT NULL
                     AND (l.priority_from IS NULL OR l.priority_from <= ?2)
                     AND (l.priority_to IS NULL OR l.priority_to >= ?2)
                    THEN l.priority_value ELSE -1 END DESC,
               l.publish_from DESC
             LIMIT ?4",
            LISTING_COLS.replace(", ", ", l.")
        ))?;

        let rows = stmt.query_map(
            params![category_id, now, commercial, limit],
            listing_from_row,
        )?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn list_placement_listings(&self, placement_id: &str) -> Result<Vec<Listing>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {LISTING_COLS} FROM listings WHERE placement_id = ?1 ORDER BY publish_from DESC"
        ))?;

        let rows = stmt.query_map(params![placement_id], listing_from_row)?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn delete_listing(&self, id: &str) -> Result<bool> {
        let rows = self
            .conn()
            .execute("DELETE FROM listings WHERE id = ?1", params![id])?;
        Ok(rows > 0)
    }

    // Hit count operations

    fn record_hit(&self, placement_id: &str) -> Result<HitCount> {
        let conn = self.conn();
        let now = format_datetime(&Utc::now());
        let rows = conn.execute(
            "UPDATE hit_counts SET hits = hits + 1, last_seen = ?1 WHERE placement_id = ?2",
            params![now, placement_id],
        )?;
        if rows == 0 {
            return Err(Error::NotFound);
        }

        conn.query_row(
            "SELECT placement_id, hits, last_seen FROM hit_counts WHERE placement_id = ?1",
            params![placement_id],
            |row| {
                Ok(HitCount {
                    placement_id: row.get(0)?,
                    hits: row.get(1)?,
                    last_seen: parse_datetime(&row.get::<_, String>(2)?),
                })
            },
        )
        .map_err(Error::from)
    }

    fn get_hit_count(&self, placement_id: &str) -> Result<Option<HitCount>> {
        let conn = self.conn();
        conn.query_row(
            "SELECT placement_id, hits, last_seen FROM hit_counts WHERE placement_id = ?1",
            params![placement_id],
            |row| {
                Ok(HitCount {
                    placement_id: row.get(0)?,
                    hits: row.get(1)?,
                    last_seen: parse_datetime(&row.get::<_, String>(2)?),
                })
            },
        )
        .optional()
        .map_err(Error::from)
    }

    fn top_hit_counts(&self, limit: i32) -> Result<Vec<HitCount>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT placement_id, hits, last_seen FROM hit_counts
             ORDER BY hits DESC, last_seen DESC LIMIT ?1",
        )?;

        let rows = stmt.query_map(params![limit], |row| {
            Ok(HitCount {
                placement_id: row.get(0)?,
                hits: row.get(1)?,
                last_seen: parse_datetime(&row.get::<_, String>(2)?),
            })
        })?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    // Redirect operations

    fn find_redirect(&self, site_id: &str, old_path: &str) -> Result<Option<Redirect>> {
        let conn = self.conn();
        conn.query_row(
            "SELECT id, site_id, old_path, new_path, created_at FROM redirects
             WHERE site_id = ?1 AND old_path = ?2",
            params![site_id, old_path],
            |row| {
                Ok(Redirect {
                    id: row.get(0)?,
                    site_id: row.get(1)?,
                    old_path: row.get(2)?,
                    new_path: row.get(3)?,
                    created_at: parse_datetime(&row.get::<_, String>(4)?),
                })
            },
        )
        .optional()
        .map_err(Error::from)
    }

    fn list_redirects(&self, site_id: &str) -> Result<Vec<Redirect>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT id, site_id, old_path, new_path, created_at FROM redirects
             WHERE site_id = ?1 ORDER BY old_path",
        )?;

        let rows = stmt.query_map(params![site_id], |row| {
            Ok(Redirect {
                id: row.get(0)?,
                site_id: row.get(1)?,
                old_path: row.get(2)?,
                new_path: row.get(3)?,
                created_at: parse_datetime(&row.get::<_, String>(4)?),
            })
        })?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    // Author operations

    fn create_author(&self, author: &Author) -> Result<()> {
        validate_slug(&author.slug)?;
        self.conn()
            .execute(
                "INSERT INTO authors (id, name, slug, description, text, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    author.id,
                    author.name,
                    author.slug,
                    author.description,
                    author.text,
                    format_datetime(&author.created_at),
                ],
            )
            .map_err(map_constraint)?;
        Ok(())
    }

    fn get_author(&self, id: &str) -> Result<Option<Author>> {
        let conn = self.conn();
        conn.query_row(
            "SELECT id, name, slug, description, text, created_at FROM authors WHERE id = ?1",
            params![id],
            author_from_row,
        )
        .optional()
        .map_err(Error::from)
    }

    fn get_author_by_slug(&self, slug: &str) -> Result<Option<Author>> {
        let conn = self.conn();
        conn.query_row(
            "SELECT id, name, slug, description, text, created_at FROM authors WHERE slug = ?1",
            params![slug],
            author_from_row,
        )
        .optional()
        .map_err(Error::from)
    }

    fn list_authors(&self, cursor: &str, limit: i32) -> Result<Vec<Author>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT id, name, slug, description, text, created_at FROM authors
             WHERE slug > ?1 ORDER BY slug LIMIT ?2",
        )?;

        let rows = stmt.query_map(params![cursor, limit], author_from_row)?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn delete_author(&self, id: &str) -> Result<bool> {
        let rows = self
            .conn()
            .execute("DELETE FROM authors WHERE id = ?1", params![id])?;
        Ok(rows > 0)
    }

    // Source operations

    fn create_source(&self, source: &Source) -> Result<()> {
        self.conn()
            .execute(
                "INSERT INTO sources (id, name, url, description, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    source.id,
                    source.name,
                    source.url,
                    source.description,
                    format_datetime(&source.created_at),
                ],
            )
            .map_err(map_constraint)?;
        Ok(())
    }

    fn get_source(&self, id: &str) -> Result<Option<Source>> {
        let conn = self.conn();
        conn.query_row(
            "SELECT id, name, url, description, created_at FROM sources WHERE id = ?1",
            params![id],
            source_from_row,
        )
        .optional()
        .map_err(Error::from)
    }

    fn list_sources(&self, cursor: &str, limit: i32) -> Result<Vec<Source>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT id, name, url, description, created_at FROM sources
             WHERE name > ?1 ORDER BY name LIMIT ?2",
        )?;

        let rows = stmt.query_map(params![cursor, limit], source_from_row)?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn delete_source(&self, id: &str) -> Result<bool> {
        let rows = self
            .conn()
            .execute("DELETE FROM sources WHERE id = ?1", params![id])?;
        Ok(rows > 0)
    }

    // Related content operations

    fn create_related(&self, related: &Related) -> Result<()> {
        self.conn()
            .execute(
                "INSERT INTO related (id, source_type, source_id, target_type, target_id, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    related.id,
                    related.source_type,
                    related.source_id,
                    related.target_type,
                    related.target_id,
                    format_datetime(&related.created_at),
                ],
            )
            .map_err(map_constraint)?;
        Ok(())
    }

    fn list_related_for_source(&self, source: &ContentRef) -> Result<Vec<Related>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT id, source_type, source_id, target_type, target_id, created_at FROM related
             WHERE source_type = ?1 AND source_id = ?2 ORDER BY created_at",
        )?;

        let rows = stmt.query_map(params![source.type_tag, source.id], |row| {
            Ok(Related {
                id: row.get(0)?,
                source_type: row.get(1)?,
                source_id: row.get(2)?,
                target_type: row.get(3)?,
                target_id: row.get(4)?,
                created_at: parse_datetime(&row.get::<_, String>(5)?),
            })
        })?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn delete_related(&self, id: &str) -> Result<bool> {
        let rows = self
            .conn()
            .execute("DELETE FROM related WHERE id = ?1", params![id])?;
        Ok(rows > 0)
    }

    fn close(&self) -> Result<()> {
        Ok(())
    }
}

fn author_from_row(row: &Row) -> rusqlite::Result<Author> {
    Ok(Author {
        id: row.get(0)?,
        name: row.get(1)?,
        slug: row.get(2)?,
        description: row.get(3)?,
        text: row.get(4)?,
        created_at: parse_datetime(&row.get::<_, String>(5)?),
    })
}

fn source_from_row(row: &Row) -> rusqlite::Result<Source> {
    Ok(Source {
        id: row.get(0)?,
        name: row.get(1)?,
        url: row.get(2)?,
        description: row.get(3)?,
        created_at: parse_datetime(&row.get::<_, String>(4)?),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    const SCHEME: &str = "http";

    fn test_store() -> (TempDir, SqliteStore) {
        let temp = TempDir::new().unwrap();
        let store = SqliteStore::new(temp.path().join("test.db")).unwrap();
        store.initialize().unwrap();
        (temp, store)
    }

    fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap()
    }

    fn make_site(store: &SqliteStore, name: &str, domain: &str) -> Site {
        let site = Site {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            domain: domain.to_string(),
            created_at: Utc::now(),
        };
        store.create_site(&site).unwrap();
        site
    }

    fn make_category(
        store: &SqliteStore,
        site: &Site,
        slug: &str,
        parent: Option<&Category>,
    ) -> Category {
        let category = Category {
            id: Uuid::new_v4().to_string(),
            site_id: site.id.clone(),
            title: slug.to_string(),
            slug: slug.to_string(),
            parent_id: parent.map(|p| p.id.clone()),
            path: String::new(),
            description: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        store.save_category(&category).unwrap()
    }

    fn make_content(
        store: &SqliteStore,
        type_tag: &str,
        id: i64,
        title: &str,
        slug: Option<&str>,
    ) -> ContentItem {
        let item = ContentItem {
            type_tag: type_tag.to_string(),
            id,
            title: title.to_string(),
            slug: slug.map(str::to_string),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        store.upsert_content_item(&item).unwrap();
        item
    }

    fn new_placement(category: &Category, item: &ContentItem, slug: &str) -> Placement {
        Placement {
            id: Uuid::new_v4().to_string(),
            target_type: item.type_tag.clone(),
            target_id: item.id,
            category_id: category.id.clone(),
            publish_from: at(2024, 3, 5),
            publish_to: None,
            slug: slug.to_string(),
            is_static: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_initialize_creates_tables() {
        let (_temp, store) = test_store();

        let conn = store.conn();
        let tables: Vec<String> = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<std::result::Result<Vec<_>, _>>()
            .unwrap();

        for table in [
            "sites",
            "categories",
            "content_items",
            "placements",
            "listings",
            "hit_counts",
            "redirects",
            "authors",
            "sources",
            "related",
        ] {
            assert!(tables.contains(&table.to_string()), "missing {table}");
        }
    }

    #[test]
    fn test_category_paths_three_levels() {
        let (_temp, store) = test_store();
        let site = make_site(&store, "news-site", "example.com");

        let root = make_category(&store, &site, "home", None);
        assert_eq!(root.path, "");

        let sports = make_category(&store, &site, "sports", Some(&root));
        assert_eq!(sports.path, "sports");

        let football = make_category(&store, &site, "football", Some(&sports));
        assert_eq!(football.path, "sports/football");

        let by_path = store
            .get_category_by_path(&site.id, "sports/football")
            .unwrap()
            .unwrap();
        assert_eq!(by_path.id, football.id);
    }

    #[test]
    fn test_category_rename_cascades_to_descendants() {
        let (_temp, store) = test_store();
        let site = make_site(&store, "news-site", "example.com");

        let root = make_category(&store, &site, "home", None);
        let sports = make_category(&store, &site, "sports", Some(&root));
        let football = make_category(&store, &site, "football", Some(&sports));
        let premier = make_category(&store, &site, "premier-league", Some(&football));

        let mut renamed = sports.clone();
        renamed.slug = "sport".to_string();
        let renamed = store.save_category(&renamed).unwrap();
        assert_eq!(renamed.path, "sport");

        let football = store.get_category(&football.id).unwrap().unwrap();
        assert_eq!(football.path, "sport/football");
        let premier = store.get_category(&premier.id).unwrap().unwrap();
        assert_eq!(premier.path, "sport/football/premier-league");
    }

    #[test]
    fn test_category_reparent_cascades_to_descendants() {
        let (_temp, store) = test_store();
        let site = make_site(&store, "news-site", "example.com");

        let root = make_category(&store, &site, "home", None);
        let sports = make_category(&store, &site, "sports", Some(&root));
        let culture = make_category(&store, &site, "culture", Some(&root));
        let football = make_category(&store, &site, "football", Some(&sports));
        let premier = make_category(&store, &site, "premier-league", Some(&football));

        let mut moved = football.clone();
        moved.parent_id = Some(culture.id.clone());
        let moved = store.save_category(&moved).unwrap();
        assert_eq!(moved.path, "culture/football");

        let premier = store.get_category(&premier.id).unwrap().unwrap();
        assert_eq!(premier.path, "culture/football/premier-league");
    }

    #[test]
    fn test_category_duplicate_path_conflict() {
        let (_temp, store) = test_store();
        let site = make_site(&store, "news-site", "example.com");

        let root = make_category(&store, &site, "home", None);
        make_category(&store, &site, "sports", Some(&root));

        let dup = Category {
            id: Uuid::new_v4().to_string(),
            site_id: site.id.clone(),
            title: "Sports Again".to_string(),
            slug: "sports".to_string(),
            parent_id: Some(root.id.clone()),
            path: String::new(),
            description: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        assert!(matches!(
            store.save_category(&dup),
            Err(Error::AlreadyExists)
        ));

        // a second root collides on the empty path too
        let second_root = Category {
            parent_id: None,
            slug: "other-home".to_string(),
            ..dup
        };
        assert!(matches!(
            store.save_category(&second_root),
            Err(Error::AlreadyExists)
        ));
    }

    #[test]
    fn test_category_cycle_guard() {
        let (_temp, store) = test_store();
        let site = make_site(&store, "news-site", "example.com");

        let root = make_category(&store, &site, "home", None);
        let sports = make_category(&store, &site, "sports", Some(&root));
        let football = make_category(&store, &site, "football", Some(&sports));

        let mut cyclic = sports.clone();
        cyclic.parent_id = Some(football.id.clone());
        assert!(matches!(
            store.save_category(&cyclic),
            Err(Error::BadRequest(_))
        ));

        let mut self_parent = sports.clone();
        self_parent.parent_id = Some(sports.id.clone());
        assert!(matches!(
            store.save_category(&self_parent),
            Err(Error::BadRequest(_))
        ));

        let mut moved_root = root.clone();
        moved_root.parent_id = Some(sports.id.clone());
        assert!(matches!(
            store.save_category(&moved_root),
            Err(Error::BadRequest(_))
        ));
    }

    #[test]
    fn test_placement_slug_derived_from_target() {
        let (_temp, store) = test_store();
        let site = make_site(&store, "news-site", "example.com");
        let root = make_category(&store, &site, "home", None);
        let sports = make_category(&store, &site, "sports", Some(&root));

        let with_slug = make_content(&store, "article", 1, "Big Match", Some("big-match"));
        let saved = store
            .save_placement(&new_placement(&sports, &with_slug, ""), &site.id, SCHEME)
            .unwrap();
        assert_eq!(saved.slug, "big-match");

        let without_slug = make_content(&store, "article", 7, "Untitled", None);
        let saved = store
            .save_placement(&new_placement(&sports, &without_slug, ""), &site.id, SCHEME)
            .unwrap();
        assert_eq!(saved.slug, "7");

        // placing a target that does not resolve fails up front
        let ghost = ContentItem {
            type_tag: "article".to_string(),
            id: 999,
            title: String::new(),
            slug: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        assert!(matches!(
            store.save_placement(&new_placement(&sports, &ghost, ""), &site.id, SCHEME),
            Err(Error::NotFound)
        ));
    }

    #[test]
    fn test_placement_unique_per_category_and_target() {
        let (_temp, store) = test_store();
        let site = make_site(&store, "news-site", "example.com");
        let root = make_category(&store, &site, "home", None);
        let sports = make_category(&store, &site, "sports", Some(&root));
        let item = make_content(&store, "article", 1, "Big Match", Some("big-match"));

        store
            .save_placement(&new_placement(&sports, &item, ""), &site.id, SCHEME)
            .unwrap();

        assert!(matches!(
            store.save_placement(&new_placement(&sports, &item, "other"), &site.id, SCHEME),
            Err(Error::AlreadyExists)
        ));
    }

    #[test]
    fn test_placement_hit_count_created_once() {
        let (_temp, store) = test_store();
        let site = make_site(&store, "news-site", "example.com");
        let root = make_category(&store, &site, "home", None);
        let sports = make_category(&store, &site, "sports", Some(&root));
        let item = make_content(&store, "article", 1, "Big Match", Some("big-match"));

        let saved = store
            .save_placement(&new_placement(&sports, &item, ""), &site.id, SCHEME)
            .unwrap();

        let hc = store.get_hit_count(&saved.id).unwrap().unwrap();
        assert_eq!(hc.hits, 1);

        let hc = store.record_hit(&saved.id).unwrap();
        assert_eq!(hc.hits, 2);

        // re-saving the placement must not reset the counter
        let mut updated = saved.clone();
        updated.publish_to = Some(at(2030, 1, 1));
        store.save_placement(&updated, &site.id, SCHEME).unwrap();

        let hc = store.get_hit_count(&saved.id).unwrap().unwrap();
        assert_eq!(hc.hits, 2);
    }

    #[test]
    fn test_record_hit_missing_counter() {
        let (_temp, store) = test_store();
        assert!(matches!(store.record_hit("nope"), Err(Error::NotFound)));
    }

    #[test]
    fn test_top_hit_counts_ordering() {
        let (_temp, store) = test_store();
        let site = make_site(&store, "news-site", "example.com");
        let root = make_category(&store, &site, "home", None);
        let sports = make_category(&store, &site, "sports", Some(&root));

        let a = make_content(&store, "article", 1, "A", Some("a"));
        let b = make_content(&store, "article", 2, "B", Some("b"));
        let pa = store
            .save_placement(&new_placement(&sports, &a, ""), &site.id, SCHEME)
            .unwrap();
        let pb = store
            .save_placement(&new_placement(&sports, &b, ""), &site.id, SCHEME)
            .unwrap();

        store.record_hit(&pb.id).unwrap();
        store.record_hit(&pb.id).unwrap();

        let top = store.top_hit_counts(10).unwrap();
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].placement_id, pb.id);
        assert_eq!(top[0].hits, 3);
        assert_eq!(top[1].placement_id, pa.id);
    }

    #[test]
    fn test_placement_url_through_store() {
        let (_temp, store) = test_store();
        let site = make_site(&store, "news-site", "example.com");
        let root = make_category(&store, &site, "home", None);
        let sports = make_category(&store, &site, "sports", Some(&root));
        let football = make_category(&store, &site, "football", Some(&sports));
        let item = make_content(&store, "article", 1, "Big Match", Some("big-match"));

        let nested = store
            .save_placement(&new_placement(&football, &item, ""), &site.id, SCHEME)
            .unwrap();
        assert_eq!(
            store
                .placement_url(&nested.id, &site.id, SCHEME, false)
                .unwrap(),
            "/sports/football/2024/3/5/articles/big-match/"
        );

        let rooted = store
            .save_placement(&new_placement(&root, &item, ""), &site.id, SCHEME)
            .unwrap();
        assert_eq!(
            store
                .placement_url(&rooted.id, &site.id, SCHEME, false)
                .unwrap(),
            "/2024/3/5/articles/big-match/"
        );

        assert_eq!(
            store
                .placement_url(&nested.id, "some-other-site", SCHEME, false)
                .unwrap(),
            "http://example.com/sports/football/2024/3/5/articles/big-match/"
        );
    }

    #[test]
    fn test_url_change_creates_and_collapses_redirects() {
        let (_temp, store) = test_store();
        let site = make_site(&store, "news-site", "example.com");
        let root = make_category(&store, &site, "home", None);
        let sports = make_category(&store, &site, "sports", Some(&root));
        let item = make_content(&store, "article", 1, "Big Match", Some("big-match"));

        let saved = store
            .save_placement(&new_placement(&sports, &item, ""), &site.id, SCHEME)
            .unwrap();
        let url_a = store
            .placement_url(&saved.id, &site.id, SCHEME, false)
            .unwrap();

        let mut renamed = saved.clone();
        renamed.slug = "bigger-match".to_string();
        let renamed = store.save_placement(&renamed, &site.id, SCHEME).unwrap();
        let url_b = store
            .placement_url(&renamed.id, &site.id, SCHEME, false)
            .unwrap();
        assert_ne!(url_a, url_b);

        let redirect = store.find_redirect(&site.id, &url_a).unwrap().unwrap();
        assert_eq!(redirect.new_path, url_b);

        // second rename: the old redirect is repointed, no chains remain
        let mut renamed_again = renamed.clone();
        renamed_again.slug = "biggest-match".to_string();
        let renamed_again = store
            .save_placement(&renamed_again, &site.id, SCHEME)
            .unwrap();
        let url_c = store
            .placement_url(&renamed_again.id, &site.id, SCHEME, false)
            .unwrap();

        let redirects = store.list_redirects(&site.id).unwrap();
        assert_eq!(redirects.len(), 2);
        for r in &redirects {
            assert_eq!(r.new_path, url_c, "redirect {} still chains", r.old_path);
        }

        // saving without any URL change adds nothing
        store
            .save_placement(&renamed_again, &site.id, SCHEME)
            .unwrap();
        assert_eq!(store.list_redirects(&site.id).unwrap().len(), 2);
    }

    #[test]
    fn test_describe_placement_degrades_when_target_gone() {
        let (_temp, store) = test_store();
        let site = make_site(&store, "news-site", "example.com");
        let root = make_category(&store, &site, "home", None);
        let sports = make_category(&store, &site, "sports", Some(&root));
        let item = make_content(&store, "article", 1, "Big Match", Some("big-match"));

        let saved = store
            .save_placement(&new_placement(&sports, &item, ""), &site.id, SCHEME)
            .unwrap();
        assert_eq!(
            store.describe_placement(&saved.id).unwrap(),
            "Big Match placed in news-site/sports"
        );

        store.delete_content_item(&item.content_ref()).unwrap();
        assert_eq!(
            store.describe_placement(&saved.id).unwrap(),
            "broken placement"
        );
    }

    #[test]
    fn test_active_listings_filtering_and_ordering() {
        let (_temp, store) = test_store();
        let site = make_site(&store, "news-site", "example.com");
        let root = make_category(&store, &site, "home", None);
        let sports = make_category(&store, &site, "sports", Some(&root));
        let front = make_category(&store, &site, "front", Some(&root));
        let now = at(2024, 6, 1);

        let mut placements = Vec::new();
        for i in 0..5 {
            let item = make_content(&store, "article", i, &format!("A{i}"), None);
            let mut p = new_placement(&sports, &item, "");
            p.publish_from = at(2024, 1, 1 + i as u32);
            placements.push(store.save_placement(&p, &site.id, SCHEME).unwrap());
        }

        let listing = |i: usize, publish_from: DateTime<Utc>| Listing {
            id: Uuid::new_v4().to_string(),
            placement_id: placements[i].id.clone(),
            category_id: front.id.clone(),
            publish_from,
            priority_from: None,
            priority_to: None,
            priority_value: None,
            remove_after_priority: false,
            is_commercial: false,
            created_at: Utc::now(),
        };

        // plain, started
        let plain = listing(0, at(2024, 5, 1));
        store.save_listing(&plain).unwrap();

        // promoted, lower priority
        let mut promoted_low = listing(1, at(2024, 5, 2));
        promoted_low.priority_value = Some(10);
        promoted_low.priority_from = Some(at(2024, 5, 1));
        promoted_low.priority_to = Some(at(2024, 7, 1));
        store.save_listing(&promoted_low).unwrap();

        // promoted, higher priority
        let mut promoted_high = listing(2, at(2024, 4, 1));
        promoted_high.priority_value = Some(20);
        store.save_listing(&promoted_high).unwrap();

        // not started yet
        let future = listing(3, at(2024, 7, 1));
        store.save_listing(&future).unwrap();

        // priority expired with remove_after_priority: treated as absent
        let mut removed = listing(4, at(2024, 5, 3));
        removed.priority_value = Some(99);
        removed.priority_to = Some(at(2024, 5, 20));
        removed.remove_after_priority = true;
        store.save_listing(&removed).unwrap();

        let active = store
            .list_active_listings(&front.id, now, None, 50)
            .unwrap();
        let ids: Vec<&str> = active.iter().map(|l| l.id.as_str()).collect();
        assert_eq!(
            ids,
            vec![
                promoted_high.id.as_str(),
                promoted_low.id.as_str(),
                plain.id.as_str()
            ]
        );

        // the soft-removed row still exists
        assert!(store.get_listing(&removed.id).unwrap().is_some());
    }

    #[test]
    fn test_active_listings_respect_placement_window() {
        let (_temp, store) = test_store();
        let site = make_site(&store, "news-site", "example.com");
        let root = make_category(&store, &site, "home", None);
        let sports = make_category(&store, &site, "sports", Some(&root));
        let now = at(2024, 6, 1);

        let item = make_content(&store, "article", 1, "Expired", None);
        let mut p = new_placement(&sports, &item, "");
        p.publish_from = at(2024, 1, 1);
        p.publish_to = Some(at(2024, 2, 1));
        let p = store.save_placement(&p, &site.id, SCHEME).unwrap();

        let l = Listing {
            id: Uuid::new_v4().to_string(),
            placement_id: p.id.clone(),
            category_id: sports.id.clone(),
            publish_from: at(2024, 1, 1),
            priority_from: None,
            priority_to: None,
            priority_value: None,
            remove_after_priority: false,
            is_commercial: false,
            created_at: Utc::now(),
        };
        store.save_listing(&l).unwrap();

        assert!(store
            .list_active_listings(&sports.id, now, None, 50)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_active_listings_commercial_filter() {
        let (_temp, store) = test_store();
        let site = make_site(&store, "news-site", "example.com");
        let root = make_category(&store, &site, "home", None);
        let sports = make_category(&store, &site, "sports", Some(&root));
        let now = at(2024, 6, 1);

        for (i, commercial) in [(1, false), (2, true)] {
            let item = make_content(&store, "article", i, &format!("A{i}"), None);
            let p = store
                .save_placement(&new_placement(&sports, &item, ""), &site.id, SCHEME)
                .unwrap();
            store
                .save_listing(&Listing {
                    id: format!("l-{i}"),
                    placement_id: p.id,
                    category_id: sports.id.clone(),
                    publish_from: at(2024, 1, 1),
                    priority_from: None,
                    priority_to: None,
                    priority_value: None,
                    remove_after_priority: false,
                    is_commercial: commercial,
                    created_at: Utc::now(),
                })
                .unwrap();
        }

        let all = store
            .list_active_listings(&sports.id, now, None, 50)
            .unwrap();
        assert_eq!(all.len(), 2);

        let commercial = store
            .list_active_listings(&sports.id, now, Some(true), 50)
            .unwrap();
        assert_eq!(commercial.len(), 1);
        assert_eq!(commercial[0].id, "l-2");

        let editorial = store
            .list_active_listings(&sports.id, now, Some(false), 50)
            .unwrap();
        assert_eq!(editorial.len(), 1);
        assert_eq!(editorial[0].id, "l-1");
    }

    #[test]
    fn test_author_crud_and_duplicate_slug() {
        let (_temp, store) = test_store();

        let author = Author {
            id: Uuid::new_v4().to_string(),
            name: "Jane Doe".to_string(),
            slug: "jane-doe".to_string(),
            description: None,
            text: None,
            created_at: Utc::now(),
        };
        store.create_author(&author).unwrap();

        let fetched = store.get_author_by_slug("jane-doe").unwrap().unwrap();
        assert_eq!(fetched.name, "Jane Doe");

        let dup = Author {
            id: Uuid::new_v4().to_string(),
            ..author.clone()
        };
        assert!(matches!(
            store.create_author(&dup),
            Err(Error::AlreadyExists)
        ));

        assert!(store.delete_author(&author.id).unwrap());
        assert!(store.get_author(&author.id).unwrap().is_none());
    }

    #[test]
    fn test_related_associations() {
        let (_temp, store) = test_store();

        let related = Related {
            id: Uuid::new_v4().to_string(),
            source_type: "article".to_string(),
            source_id: 1,
            target_type: "gallery".to_string(),
            target_id: 9,
            created_at: Utc::now(),
        };
        store.create_related(&related).unwrap();

        let dup = Related {
            id: Uuid::new_v4().to_string(),
            ..related.clone()
        };
        assert!(matches!(
            store.create_related(&dup),
            Err(Error::AlreadyExists)
        ));

        let found = store
            .list_related_for_source(&ContentRef::new("article", 1))
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].target_type, "gallery");

        assert!(store.delete_related(&related.id).unwrap());
        assert!(store
            .list_related_for_source(&ContentRef::new("article", 1))
            .unwrap()
            .is_empty());
    }
}

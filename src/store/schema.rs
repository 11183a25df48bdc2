pub const SCHEMA: &str = r#"
-- Sites partition the category trees; one of them is the default site
CREATE TABLE IF NOT EXISTS sites (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL UNIQUE,
    domain TEXT NOT NULL,
    created_at TEXT DEFAULT (datetime('now'))
);

-- Category tree with a materialized path: '' for the root, 'a/b/c' below.
-- The path is recomputed on save and cascaded to descendants.
CREATE TABLE IF NOT EXISTS categories (
    id TEXT PRIMARY KEY,
    site_id TEXT NOT NULL REFERENCES sites(id) ON DELETE CASCADE,
    title TEXT NOT NULL,
    slug TEXT NOT NULL,
    parent_id TEXT REFERENCES categories(id),
    path TEXT NOT NULL,
    description TEXT,
    created_at TEXT DEFAULT (datetime('now')),
    updated_at TEXT DEFAULT (datetime('now')),

    UNIQUE(site_id, path)
);

-- Placeable content objects. Placements reference these weakly by
-- (type_tag, id); deleting a row leaves dangling placements by design.
CREATE TABLE IF NOT EXISTS content_items (
    type_tag TEXT NOT NULL,
    id INTEGER NOT NULL,
    title TEXT NOT NULL,
    slug TEXT,
    created_at TEXT DEFAULT (datetime('now')),
    updated_at TEXT DEFAULT (datetime('now')),
    PRIMARY KEY (type_tag, id)
);

-- Primary placement of a content object in a category
CREATE TABLE IF NOT EXISTS placements (
    id TEXT PRIMARY KEY,
    target_type TEXT NOT NULL,
    target_id INTEGER NOT NULL,
    category_id TEXT NOT NULL REFERENCES categories(id),
    publish_from TEXT NOT NULL,
    publish_to TEXT,
    slug TEXT NOT NULL,
    is_static INTEGER NOT NULL DEFAULT 0,
    created_at TEXT DEFAULT (datetime('now')),
    updated_at TEXT DEFAULT (datetime('now')),

    UNIQUE(category_id, target_type, target_id)
);

-- Secondary placements with independent priority scheduling
CREATE TABLE IF NOT EXISTS listings (
    id TEXT PRIMARY KEY,
    placement_id TEXT NOT NULL REFERENCES placements(id) ON DELETE CASCADE,
    category_id TEXT NOT NULL REFERENCES categories(id),
    publish_from TEXT NOT NULL,
    priority_from TEXT,
    priority_to TEXT,
    priority_value INTEGER,
    remove_after_priority INTEGER NOT NULL DEFAULT 0,
    is_commercial INTEGER NOT NULL DEFAULT 0,
    created_at TEXT DEFAULT (datetime('now'))
);

-- One counter per placement, created alongside it
CREATE TABLE IF NOT EXISTS hit_counts (
    placement_id TEXT PRIMARY KEY REFERENCES placements(id) ON DELETE CASCADE,
    hits INTEGER NOT NULL DEFAULT 1,
    last_seen TEXT NOT NULL
);

-- Canonical URL changes map old paths to new ones; chains are collapsed
CREATE TABLE IF NOT EXISTS redirects (
    id TEXT PRIMARY KEY,
    site_id TEXT NOT NULL REFERENCES sites(id) ON DELETE CASCADE,
    old_path TEXT NOT NULL,
    new_path TEXT NOT NULL,
    created_at TEXT DEFAULT (datetime('now')),

    UNIQUE(site_id, old_path)
);

CREATE TABLE IF NOT EXISTS authors (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    slug TEXT NOT NULL UNIQUE,
    description TEXT,
    text TEXT,
    created_at TEXT DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS sources (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL UNIQUE,
    url TEXT,
    description TEXT,
    created_at TEXT DEFAULT (datetime('now'))
);

-- Directed related-content associations between content objects
CREATE TABLE IF NOT EXISTS related (
    id TEXT PRIMARY KEY,
    source_type TEXT NOT NULL,
    source_id INTEGER NOT NULL,
    target_type TEXT NOT NULL,
    target_id INTEGER NOT NULL,
    created_at TEXT DEFAULT (datetime('now')),

    UNIQUE(source_type, source_id, target_type, target_id)
);

-- Create indexes
CREATE INDEX IF NOT EXISTS idx_categories_site ON categories(site_id);
CREATE INDEX IF NOT EXISTS idx_categories_parent ON categories(parent_id);
CREATE INDEX IF NOT EXISTS idx_placements_category ON placements(category_id);
CREATE INDEX IF NOT EXISTS idx_placements_publish_from ON placements(publish_from);
CREATE INDEX IF NOT EXISTS idx_listings_category ON listings(category_id);
CREATE INDEX IF NOT EXISTS idx_listings_placement ON listings(placement_id);
CREATE INDEX IF NOT EXISTS idx_redirects_new_path ON redirects(site_id, new_path);
CREATE INDEX IF NOT EXISTS idx_related_source ON related(source_type, source_id);
"#;

//! Canonical URL construction for placements.
//!
//! The path shape depends on whether the placement is static or dated and
//! on whether its category is the site root:
//!
//! - dated, nested:  `/<category-path>/<YYYY>/<M>/<D>/<types>/<slug>/`
//! - dated, root:    `/<YYYY>/<M>/<D>/<types>/<slug>/`
//! - static, nested: `/<category-path>/static/<types>/<slug>/`
//! - static, root:   `/static/<types>/<slug>/`
//!
//! Month and day are not zero-padded. When the category belongs to a site
//! other than the configured default (or the caller asks for it), the URL
//! is absolute.

use chrono::Datelike;

use crate::types::{Category, Placement, Site};

/// Pluralized, slugified URL segment for a content type tag:
/// `article` -> `articles`, `photo gallery` -> `photo-galleries`.
#[must_use]
pub fn content_type_segment(type_tag: &str) -> String {
    slug::slugify(pluralize(type_tag))
}

fn pluralize(word: &str) -> String {
    let lower = word.trim().to_ascii_lowercase();
    if lower.ends_with('s')
        || lower.ends_with('x')
        || lower.ends_with('z')
        || lower.ends_with("ch")
        || lower.ends_with("sh")
    {
        format!("{lower}es")
    } else if let Some(stem) = lower.strip_suffix('y') {
        match stem.chars().last() {
            Some(c) if !"aeiou".contains(c) => format!("{stem}ies"),
            _ => format!("{lower}s"),
        }
    } else {
        format!("{lower}s")
    }
}

/// Builds the canonical URL for a placement. `site` is the site the
/// category belongs to; the result is absolute when that differs from
/// `default_site_id` or when `prefer_cross_site` is set.
#[must_use]
pub fn placement_url(
    placement: &Placement,
    category: &Category,
    site: &Site,
    default_site_id: &str,
    scheme: &str,
    prefer_cross_site: bool,
) -> String {
    let types = content_type_segment(&placement.target_type);

    let mut url = String::from("/");
    if !category.is_root() {
        url.push_str(&category.path);
        url.push('/');
    }

    if placement.is_static {
        url.push_str("static/");
    } else {
        let from = placement.publish_from;
        url.push_str(&format!(
            "{}/{}/{}/",
            from.year(),
            from.month(),
            from.day()
        ));
    }

    url.push_str(&types);
    url.push('/');
    url.push_str(&placement.slug);
    url.push('/');

    if site.id != default_site_id || prefer_cross_site {
        format!("{scheme}://{}{url}", site.domain)
    } else {
        url
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn site(id: &str, domain: &str) -> Site {
        Site {
            id: id.to_string(),
            name: id.to_string(),
            domain: domain.to_string(),
            created_at: Utc::now(),
        }
    }

    fn category(path: &str, parent: Option<&str>) -> Category {
        Category {
            id: "cat-1".to_string(),
            site_id: "site-1".to_string(),
            title: "Category".to_string(),
            slug: path.rsplit('/').next().unwrap_or("").to_string(),
            parent_id: parent.map(str::to_string),
            path: path.to_string(),
            description: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn placement(slug: &str, is_static: bool) -> Placement {
        Placement {
            id: "p-1".to_string(),
            target_type: "article".to_string(),
            target_id: 7,
            category_id: "cat-1".to_string(),
            publish_from: Utc.with_ymd_and_hms(2024, 3, 5, 8, 0, 0).unwrap(),
            publish_to: None,
            slug: slug.to_string(),
            is_static,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_dated_nested_category() {
        let url = placement_url(
            &placement("big-match", false),
            &category("sports/football", Some("cat-0")),
            &site("site-1", "example.com"),
            "site-1",
            "http",
            false,
        );
        assert_eq!(url, "/sports/football/2024/3/5/articles/big-match/");
    }

    #[test]
    fn test_dated_root_category_omits_path() {
        let url = placement_url(
            &placement("big-match", false),
            &category("", None),
            &site("site-1", "example.com"),
            "site-1",
            "http",
            false,
        );
        assert_eq!(url, "/2024/3/5/articles/big-match/");
    }

    #[test]
    fn test_static_nested_category() {
        let url = placement_url(
            &placement("about-us", true),
            &category("company", Some("cat-0")),
            &site("site-1", "example.com"),
            "site-1",
            "http",
            false,
        );
        assert_eq!(url, "/company/static/articles/about-us/");
    }

    #[test]
    fn test_static_root_category() {
        let url = placement_url(
            &placement("about-us", true),
            &category("", None),
            &site("site-1", "example.com"),
            "site-1",
            "http",
            false,
        );
        assert_eq!(url, "/static/articles/about-us/");
    }

    #[test]
    fn test_cross_site_is_absolute() {
        let url = placement_url(
            &placement("big-match", false),
            &category("sports", Some("cat-0")),
            &site("site-2", "other.example.com"),
            "site-1",
            "http",
            false,
        );
        assert_eq!(
            url,
            "http://other.example.com/sports/2024/3/5/articles/big-match/"
        );
    }

    #[test]
    fn test_prefer_cross_site_forces_absolute() {
        let url = placement_url(
            &placement("big-match", false),
            &category("sports", Some("cat-0")),
            &site("site-1", "example.com"),
            "site-1",
            "https",
            true,
        );
        assert_eq!(
            url,
            "https://example.com/sports/2024/3/5/articles/big-match/"
        );
    }

    #[test]
    fn test_content_type_segment() {
        assert_eq!(content_type_segment("article"), "articles");
        assert_eq!(content_type_segment("gallery"), "galleries");
        assert_eq!(content_type_segment("quiz"), "quizes");
        assert_eq!(content_type_segment("photo essay"), "photo-essays");
    }
}

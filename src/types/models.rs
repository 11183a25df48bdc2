use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Site {
    pub id: String,
    pub name: String,
    pub domain: String,
    pub created_at: DateTime<Utc>,
}

/// Node in the category tree. `path` is the materialized path from the
/// root category: empty for the root itself, `slug` for children of the
/// root, `parent.path + "/" + slug` below that. Unique per `(site, path)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub site_id: String,
    pub title: String,
    pub slug: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Category {
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }
}

/// Binding of a content object to its primary category plus a visibility
/// window. The canonical URL of the target is derived from the placement.
/// Unique per `(category, target)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Placement {
    pub id: String,
    pub target_type: String,
    pub target_id: i64,
    pub category_id: String,
    pub publish_from: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub publish_to: Option<DateTime<Utc>>,
    pub slug: String,
    pub is_static: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Placement {
    /// Visible iff `now` is past `publish_from` and before `publish_to`
    /// (open-ended when `publish_to` is unset).
    #[must_use]
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        now > self.publish_from && self.publish_to.is_none_or(|to| now < to)
    }
}

/// Secondary categorization of a placed object, with an independent
/// priority window. Many listings may point at one placement, one per
/// extra category.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Listing {
    pub id: String,
    pub placement_id: String,
    pub category_id: String,
    pub publish_from: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority_from: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority_to: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority_value: Option<i64>,
    /// Hide the listing from queries once the priority window expires.
    /// The row itself persists.
    pub remove_after_priority: bool,
    pub is_commercial: bool,
    pub created_at: DateTime<Utc>,
}

impl Listing {
    /// Promoted iff a priority value is set and `now` falls inside the
    /// priority window (both bounds optional).
    #[must_use]
    pub fn is_promoted(&self, now: DateTime<Utc>) -> bool {
        self.priority_value.is_some()
            && self.priority_from.is_none_or(|from| from <= now)
            && self.priority_to.is_none_or(|to| now <= to)
    }
}

/// Per-placement view counter, created alongside the placement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HitCount {
    pub placement_id: String,
    pub hits: i64,
    pub last_seen: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Redirect {
    pub id: String,
    pub site_id: String,
    pub old_path: String,
    pub new_path: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Author {
    pub id: String,
    pub name: String,
    pub slug: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Source {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Directed association between two content objects ("related articles").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Related {
    pub id: String,
    pub source_type: String,
    pub source_id: i64,
    pub target_type: String,
    pub target_id: i64,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap()
    }

    fn placement(from: DateTime<Utc>, to: Option<DateTime<Utc>>) -> Placement {
        Placement {
            id: "p-1".to_string(),
            target_type: "article".to_string(),
            target_id: 1,
            category_id: "c-1".to_string(),
            publish_from: from,
            publish_to: to,
            slug: "slug".to_string(),
            is_static: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_is_active_window() {
        let p = placement(at(2024, 3, 5), Some(at(2024, 3, 10)));
        assert!(!p.is_active(at(2024, 3, 4)));
        assert!(!p.is_active(at(2024, 3, 5))); // exactly at publish_from
        assert!(p.is_active(at(2024, 3, 7)));
        assert!(!p.is_active(at(2024, 3, 10))); // exactly at publish_to
        assert!(!p.is_active(at(2024, 3, 12)));
    }

    #[test]
    fn test_is_active_open_ended() {
        let p = placement(at(2024, 3, 5), None);
        assert!(!p.is_active(at(2024, 3, 4)));
        assert!(p.is_active(at(2024, 3, 6)));
        assert!(p.is_active(at(2030, 1, 1)));
    }

    fn listing(
        value: Option<i64>,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> Listing {
        Listing {
            id: "l-1".to_string(),
            placement_id: "p-1".to_string(),
            category_id: "c-1".to_string(),
            publish_from: at(2024, 1, 1),
            priority_from: from,
            priority_to: to,
            priority_value: value,
            remove_after_priority: false,
            is_commercial: false,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_is_promoted_requires_value() {
        let l = listing(None, Some(at(2024, 3, 1)), Some(at(2024, 3, 10)));
        assert!(!l.is_promoted(at(2024, 3, 5)));
    }

    #[test]
    fn test_is_promoted_window_bounds_inclusive() {
        let l = listing(Some(10), Some(at(2024, 3, 1)), Some(at(2024, 3, 10)));
        assert!(!l.is_promoted(at(2024, 2, 28)));
        assert!(l.is_promoted(at(2024, 3, 1)));
        assert!(l.is_promoted(at(2024, 3, 10)));
        assert!(!l.is_promoted(at(2024, 3, 11)));
    }

    #[test]
    fn test_is_promoted_open_ended() {
        let l = listing(Some(1), None, None);
        assert!(l.is_promoted(at(2020, 1, 1)));
        assert!(l.is_promoted(at(2035, 1, 1)));
    }
}

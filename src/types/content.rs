use serde::{Deserialize, Serialize};

/// Weak polymorphic reference to a content object: a type tag plus an id.
/// Holding a `ContentRef` implies nothing about the target's lifetime;
/// resolution may come back empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentRef {
    pub type_tag: String,
    pub id: i64,
}

impl ContentRef {
    pub fn new(type_tag: impl Into<String>, id: i64) -> Self {
        Self {
            type_tag: type_tag.into(),
            id,
        }
    }
}

impl std::fmt::Display for ContentRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.type_tag, self.id)
    }
}

/// The minimal surface a placement target has to expose: an optional slug
/// and a type tag that can be pluralized into a URL segment. Anything
/// registered in the content table is placeable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentItem {
    pub type_tag: String,
    pub id: i64,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl ContentItem {
    #[must_use]
    pub fn content_ref(&self) -> ContentRef {
        ContentRef::new(self.type_tag.clone(), self.id)
    }
}

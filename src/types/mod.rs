mod content;
mod models;

pub use content::{ContentItem, ContentRef};
pub use models::*;

pub mod categories;
pub mod content;
pub mod dto;
pub mod editorial;
pub mod listings;
pub mod placements;
pub mod redirects;
pub mod response;
mod router;
pub mod sites;
pub mod validation;

pub use router::{AppState, create_router};

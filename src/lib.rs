//! # Masthead
//!
//! A placement server for content sites: categories form a tree per site,
//! content objects are placed into categories with visibility windows, and
//! placements can be listed in further categories with promotion priorities.
//! Canonical URLs, redirects for moved content, and hit counting come along
//! for free. Usable both as a standalone binary and as a library.
//!
//! ## Library Usage
//!
//! ```toml
//! [dependencies]
//! masthead = { version = "0.0", default-features = false }
//! ```
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use masthead::server::{AppState, create_router};
//! use masthead::store::SqliteStore;
//!
//! let store = SqliteStore::new("./data/masthead.db").unwrap();
//! store.initialize().unwrap();
//!
//! let state = Arc::new(AppState::new(Arc::new(store), "my-site-id", "https"));
//! let router = create_router(state);
//! // Serve with axum...
//! ```
//!
//! ## Feature Flags
//!
//! - `cli` (default): Includes the binary entrypoint's CLI dependencies.
//!   Disable with `default-features = false`.

pub mod cache;
pub mod config;
pub mod error;
pub mod resolver;
pub mod server;
pub mod store;
pub mod types;
pub mod url;

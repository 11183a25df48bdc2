use std::sync::Arc;
use std::time::Instant;

use axum::extract::Request;
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::{
    Router,
    routing::{delete, get, post, put},
};

use super::{categories, content, editorial, listings, placements, redirects, sites};
use crate::resolver::Resolver;
use crate::store::Store;

pub struct AppState {
    pub store: Arc<dyn Store>,
    pub resolver: Resolver,
    /// Placements under this site render relative URLs; every other site
    /// gets absolute ones.
    pub default_site_id: String,
    pub scheme: String,
}

impl AppState {
    #[must_use]
    pub fn new(store: Arc<dyn Store>, default_site_id: &str, scheme: &str) -> Self {
        let resolver = Resolver::new(Arc::clone(&store), default_site_id, scheme);
        Self {
            store,
            resolver,
            default_site_id: default_site_id.to_string(),
            scheme: scheme.to_string(),
        }
    }
}

async fn health() -> &'static str {
    "OK"
}

async fn log_request(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let start = Instant::now();

    let response = next.run(request).await;

    let latency = start.elapsed();
    let status = response.status();

    tracing::info!(
        "{} {} {} {}ms",
        method,
        uri.path(),
        status.as_u16(),
        latency.as_millis()
    );

    response
}

fn api_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/sites", post(sites::create_site))
        .route("/sites", get(sites::list_sites))
        .route("/sites/{id}", get(sites::get_site))
        .route("/categories", post(categories::create_category))
        .route("/categories", get(categories::list_categories))
        .route("/categories/by-path", get(categories::get_category_by_path))
        .route("/categories/{id}", get(categories::get_category))
        .route("/categories/{id}", put(categories::update_category))
        .route("/categories/{id}", delete(categories::delete_category))
        .route(
            "/categories/{id}/listings",
            get(listings::list_active_listings),
        )
        .route(
            "/categories/{id}/placements",
            get(placements::list_category_placements),
        )
        .route("/content/{type_tag}/{id}", put(content::upsert_content))
        .route("/content/{type_tag}/{id}", get(content::get_content))
        .route("/content/{type_tag}/{id}", delete(content::delete_content))
        .route(
            "/content/{type_tag}/{id}/related",
            get(editorial::list_related),
        )
        .route("/placements", post(placements::create_placement))
        .route("/placements/{id}", get(placements::get_placement))
        .route("/placements/{id}", put(placements::update_placement))
        .route("/placements/{id}", delete(placements::delete_placement))
        .route("/placements/{id}/url", get(placements::get_placement_url))
        .route(
            "/placements/{id}/describe",
            get(placements::describe_placement),
        )
        .route("/placements/{id}/hit", post(placements::record_hit))
        .route("/placements/{id}/hits", get(placements::get_hit_count))
        .route(
            "/placements/{id}/listings",
            get(listings::list_placement_listings),
        )
        .route("/hits/top", get(placements::top_hits))
        .route("/listings", post(listings::create_listing))
        .route("/listings/{id}", get(listings::get_listing))
        .route("/listings/{id}", put(listings::update_listing))
        .route("/listings/{id}", delete(listings::delete_listing))
        .route("/redirects", get(redirects::list_redirects))
        .route("/redirects/resolve", get(redirects::resolve_redirect))
        .route("/authors", post(editorial::create_author))
        .route("/authors", get(editorial::list_authors))
        .route("/authors/{id}", get(editorial::get_author))
        .route("/authors/{id}", delete(editorial::delete_author))
        .route("/sources", post(editorial::create_source))
        .route("/sources", get(editorial::list_sources))
        .route("/sources/{id}", get(editorial::get_source))
        .route("/sources/{id}", delete(editorial::delete_source))
        .route("/related", post(editorial::create_related))
        .route("/related/{id}", delete(editorial::delete_related))
}

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .nest("/api/v1", api_router())
        .layer(middleware::from_fn(log_request))
        .with_state(state)
}

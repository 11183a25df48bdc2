use std::fs;
use std::sync::Arc;

use chrono::Utc;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use masthead::config::ServerConfig;
use masthead::server::{AppState, create_router};
use masthead::store::{SqliteStore, Store};
use masthead::types::{Category, Site};

#[derive(Parser)]
#[command(name = "masthead")]
#[command(about = "A content placement and listing server", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the server
    Serve {
        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Port to bind to
        #[arg(long, short, default_value = "8080")]
        port: u16,

        /// Data directory for the database
        #[arg(long, default_value = "./data")]
        data_dir: String,

        /// Name of the default site, created on first start
        #[arg(long, default_value = "default")]
        site: String,

        /// Domain of the default site
        #[arg(long, default_value = "localhost:8080")]
        domain: String,

        /// Scheme used when building absolute cross-site URLs
        #[arg(long, default_value = "http")]
        scheme: String,
    },
}

/// Looks up the default site by name, creating it together with its root
/// category on first start.
fn ensure_default_site(store: &SqliteStore, name: &str, domain: &str) -> anyhow::Result<Site> {
    if let Some(site) = store.get_site_by_name(name)? {
        return Ok(site);
    }

    let now = Utc::now();
    let site = Site {
        id: Uuid::new_v4().to_string(),
        name: name.to_string(),
        domain: domain.to_string(),
        created_at: now,
    };
    store.create_site(&site)?;

    store.save_category(&Category {
        id: Uuid::new_v4().to_string(),
        site_id: site.id.clone(),
        title: "Home".to_string(),
        slug: "home".to_string(),
        parent_id: None,
        path: String::new(),
        description: None,
        created_at: now,
        updated_at: now,
    })?;

    info!("Created default site '{}' ({})", site.name, site.domain);
    Ok(site)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("masthead=info".parse()?))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve {
            host,
            port,
            data_dir,
            site,
            domain,
            scheme,
        } => {
            let config = ServerConfig {
                host,
                port,
                data_dir: data_dir.into(),
                default_site: site,
                default_domain: domain,
                public_scheme: scheme,
            };

            fs::create_dir_all(&config.data_dir)?;

            let store = SqliteStore::new(config.db_path())?;
            store.initialize()?;

            let site = ensure_default_site(&store, &config.default_site, &config.default_domain)?;
            info!("Serving site '{}' ({})", site.name, site.domain);

            let state = Arc::new(AppState::new(
                Arc::new(store),
                &site.id,
                &config.public_scheme,
            ));

            let app = create_router(state);
            let addr = config.socket_addr()?;

            info!("Starting server on {}", addr);

            let listener = tokio::net::TcpListener::bind(addr).await?;
            axum::serve(listener, app).await?;
        }
    }

    Ok(())
}

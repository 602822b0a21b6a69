//! yatube-rs server entry point.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use fred::prelude::*;
use sea_orm::DatabaseConnection;
use tokio::signal;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use yatube_common::{Config, LocalStorage};
use yatube_core::{CreateGroupInput, GroupService};
use yatube_db::repositories::GroupRepository;
use yatube_web::{AppState, CacheStore, MemoryCacheStore, RedisCacheStore};

/// Requests taking longer than this are answered with 408.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// yatube blogging server.
#[derive(Parser)]
#[command(name = "yatube", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run migrations and serve (the default).
    Serve,
    /// Run pending migrations and exit.
    Migrate,
    /// Create a group posts can be filed under.
    CreateGroup {
        /// URL label, letters, digits, `-` and `_`.
        #[arg(long)]
        slug: String,
        /// Display title.
        #[arg(long)]
        title: String,
        /// What the group is about.
        #[arg(long, default_value = "")]
        description: String,
    },
}

/// Waits for a shutdown signal (SIGINT or SIGTERM).
///
/// On Unix systems, this listens for both SIGINT (Ctrl+C) and SIGTERM.
/// On Windows, this only listens for Ctrl+C.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received SIGINT, initiating graceful shutdown...");
        },
        () = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown...");
        },
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "yatube_server=debug,yatube_web=debug,yatube_core=debug,tower_http=debug".into()),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::load()?;

    let db = yatube_db::init(&config).await?;
    info!("Connected to database");

    info!("Running database migrations...");
    yatube_db::migrate(&db).await?;
    info!("Migrations completed");

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(config, db).await,
        Command::Migrate => Ok(()),
        Command::CreateGroup {
            slug,
            title,
            description,
        } => {
            let groups = GroupService::new(GroupRepository::new(Arc::new(db)));
            let group = groups
                .create(CreateGroupInput {
                    slug,
                    title,
                    description,
                })
                .await?;
            info!(group_id = %group.id, slug = %group.slug, "Created group");
            Ok(())
        }
    }
}

/// Connect the page cache: Redis when configured, in-process otherwise.
async fn page_cache(config: &Config) -> Result<Arc<dyn CacheStore>, Box<dyn std::error::Error>> {
    let Some(redis) = &config.redis else {
        info!("Using in-process page cache");
        return Ok(Arc::new(MemoryCacheStore::new()));
    };

    info!("Connecting to Redis...");
    let fred_config = fred::types::config::Config::from_url(&redis.url)?;
    let client = fred::clients::Client::new(fred_config, None, None, None);
    client.connect();
    client.wait_for_connect().await?;
    info!("Connected to Redis page cache");

    Ok(Arc::new(RedisCacheStore::new(
        Arc::new(client),
        redis.prefix.clone(),
    )))
}

async fn serve(
    config: Config,
    db: DatabaseConnection,
) -> Result<(), Box<dyn std::error::Error>> {
    let storage = Arc::new(LocalStorage::new(
        config.media.base_path.clone(),
        config.media.base_url.clone(),
    ));
    let cache = page_cache(&config).await?;

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    let state = AppState::new(Arc::new(db), config, storage, cache);

    let app = yatube_web::app(state)
        .layer(TimeoutLayer::new(REQUEST_TIMEOUT))
        .layer(TraceLayer::new_for_http());

    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

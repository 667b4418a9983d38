//! # MotoCar Ads Binary
//!
//! The entry point that assembles the application based on compile-time features.
//!
//! ```bash
//! # Serve the API (default)
//! motocar-ads
//!
//! # Grant the admin role to an existing account
//! motocar-ads promote-admin ada@example.com
//! ```

use std::sync::Arc;

use actix_files::Files;
use actix_web::{web, App, HttpServer};
use anyhow::Context;
use clap::{Parser, Subcommand};
use mc_api::middleware::{cors_policy, standard_middleware};
use mc_api::{configure_routes, AppState};
use mc_config::{AppConfig, LogConfig};
use mc_core::{ProfileRepo, Role};
use secrecy::ExposeSecret;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[cfg(not(all(feature = "db-sqlite", feature = "storage-local", feature = "auth-simple")))]
compile_error!(
    "motocar-ads needs one plugin per port: enable db-sqlite, storage-local and auth-simple"
);

// Feature-gated imports
#[cfg(feature = "db-sqlite")]
use mc_db_sqlite::SqliteMarketplaceRepo;

#[cfg(feature = "storage-local")]
use mc_storage_local::LocalMediaStore;

#[cfg(feature = "auth-simple")]
use mc_auth_simple::SimpleAuthProvider;

#[derive(Parser)]
#[command(name = "motocar-ads")]
#[command(version, about = "MotoCar Ads marketplace server")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP API (the default)
    Serve,
    /// Give an existing account the admin role
    PromoteAdmin {
        /// E-mail the account signed up with
        email: String,
    },
}

fn init_tracing(log: &LogConfig) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log.filter));
    let registry = tracing_subscriber::registry().with(env_filter);
    if log.json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::load().context("loading configuration")?;
    init_tracing(&config.log);

    // 1. Initialize Database Implementation
    let repo = Arc::new(
        SqliteMarketplaceRepo::new(config.database.url.expose_secret())
            .await
            .context("initialising SQLite")?,
    );

    match cli.command.unwrap_or(Command::Serve) {
        Command::PromoteAdmin { email } => promote_admin(repo.as_ref(), &email).await,
        Command::Serve => serve(config, repo).await,
    }
}

async fn promote_admin(profiles: &dyn ProfileRepo, email: &str) -> anyhow::Result<()> {
    let profile = profiles
        .find_profile_by_email(email)
        .await?
        .with_context(|| format!("no account registered with {email}"))?;

    if profile.role == Role::Admin {
        info!(user_id = %profile.id, "already an administrator");
        return Ok(());
    }
    profiles.set_role(profile.id, Role::Admin).await?;
    info!(user_id = %profile.id, email = %profile.email, "promoted to administrator");
    Ok(())
}

async fn serve(config: AppConfig, repo: Arc<SqliteMarketplaceRepo>) -> anyhow::Result<()> {
    // 2. Initialize Storage Implementation
    let bucket_dir = config.storage.root.join(&config.storage.bucket);
    std::fs::create_dir_all(&bucket_dir)
        .with_context(|| format!("creating {}", bucket_dir.display()))?;
    let store = Arc::new(LocalMediaStore::new(
        config.storage.root.clone(),
        config.storage.bucket.clone(),
        config.storage.public_prefix.clone(),
    ));

    // 3. Initialize Auth Implementation
    let ttl = chrono::Duration::hours(config.auth.session_ttl_hours);
    let auth = match &config.auth.credentials_path {
        Some(path) => {
            SimpleAuthProvider::with_credentials_file(repo.clone(), ttl, path.clone()).await?
        }
        None => SimpleAuthProvider::new(repo.clone(), ttl),
    };

    // 4. Wrap in AppState (dynamic dispatch over the ports)
    let state = web::Data::new(AppState::new(repo.clone(), repo, store, Arc::new(auth)));

    let media_mount = format!(
        "{}/{}",
        config.storage.public_prefix.trim_end_matches('/'),
        config.storage.bucket
    );
    let (host, port) = config.bind_address();
    info!("MotoCar Ads starting on http://{host}:{port}");

    HttpServer::new(move || {
        App::new()
            .wrap(standard_middleware())
            .wrap(cors_policy())
            .app_data(state.clone())
            .service(Files::new(&media_mount, &bucket_dir))
            .configure(configure_routes)
    })
    .bind((host, port))?
    .run()
    .await?;

    Ok(())
}

use std::net::SocketAddr;

use clap::{Parser, Subcommand};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tokio::signal;
use tracing_subscriber::EnvFilter;

use usermgmt::bootstrap::{self, AdminSeed};
use usermgmt::config::Config;

#[derive(Parser)]
#[command(name = "usermgmt", version, about = "User management API server")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run migrations and serve the HTTP API (default)
    Serve,
    /// Create the initial admin account if it does not exist
    CreateAdmin {
        #[arg(long, default_value = bootstrap::DEFAULT_ADMIN_EMAIL)]
        email: String,
        #[arg(long, default_value = bootstrap::DEFAULT_ADMIN_PASSWORD)]
        password: String,
        #[arg(long, default_value = bootstrap::DEFAULT_ADMIN_NAME)]
        full_name: String,
    },
    /// Delete expired refresh tokens and their blacklist entries
    FlushExpiredTokens,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let config = Config::from_env()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .init();

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.database_url)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;
    tracing::info!("Migrations applied");

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(pool, config).await,
        Command::CreateAdmin {
            email,
            password,
            full_name,
        } => {
            match bootstrap::create_admin(&pool, &email, &password, &full_name).await? {
                AdminSeed::Created(user) => println!("Successfully created admin user: {}", user.email),
                AdminSeed::AlreadyExists(user) => println!("Admin user {} already exists", user.email),
            }
            Ok(())
        }
        Command::FlushExpiredTokens => flush_expired_tokens(&pool).await,
    }
}

async fn serve(pool: PgPool, config: Config) -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!("Starting user management API");

    let addr = SocketAddr::new(config.host, config.port);
    let app = usermgmt::build_app(pool, config);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn flush_expired_tokens(pool: &PgPool) -> Result<(), Box<dyn std::error::Error>> {
    let removed = usermgmt::db::tokens::flush_expired(pool).await?;
    tracing::info!(removed, "flushed expired tokens");
    println!("Removed {removed} expired tokens");
    Ok(())
}

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
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}

use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use usuarios_panel::config::ServerConfig;
use usuarios_panel::server::{AppState, create_router};
use usuarios_panel::store::{SqliteStore, Store};
use usuarios_panel::types::Role;

#[derive(Parser)]
#[command(name = "usuarios-panel")]
#[command(about = "Admin API for the usuarios table", long_about = None)]
struct Cli {
    /// TOML config file; flags and environment variables override it
    #[arg(long, global = true, env = "PANEL_CONFIG")]
    config: Option<PathBuf>,

    /// SQLite database file
    #[arg(long, global = true, env = "DB_PATH")]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the server
    Serve {
        /// Host to bind to
        #[arg(long, env = "HOST")]
        host: Option<String>,

        /// Port to bind to
        #[arg(long, short, env = "PORT")]
        port: Option<u16>,

        /// Comma-separated origins allowed by CORS (default: any)
        #[arg(long, env = "ALLOWED_ORIGINS", value_delimiter = ',')]
        allowed_origins: Option<Vec<String>>,
    },

    /// Create the database schema and the permission row
    Init {
        /// Initial role; only "admin" makes the API writable
        #[arg(long, default_value = Role::VIEWER)]
        role: String,

        /// Overwrite an existing permission row
        #[arg(long)]
        force: bool,
    },

    /// Inspect or change the global permission role
    Role {
        #[command(subcommand)]
        command: RoleCommands,
    },
}

#[derive(Subcommand)]
enum RoleCommands {
    /// Print the current role
    Show,

    /// Replace the current role
    Set {
        /// New role, e.g. "admin" or "viewer"
        role: String,
    },
}

fn load_config(path: Option<&Path>, db: Option<PathBuf>) -> anyhow::Result<ServerConfig> {
    let mut config = match path {
        Some(path) => ServerConfig::from_file(path)?,
        None => ServerConfig::default(),
    };
    if let Some(db) = db {
        config.db_path = db;
    }
    Ok(config)
}

fn open_store(config: &ServerConfig) -> anyhow::Result<SqliteStore> {
    if let Some(parent) = config.db_path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
    }
    let store = SqliteStore::new(&config.db_path)?;
    store.initialize()?;
    Ok(store)
}

fn run_init(config: &ServerConfig, role: String, force: bool) -> anyhow::Result<()> {
    let store = open_store(config)?;

    if let Some(existing) = store.get_role()? {
        if !force {
            bail!(
                "Database already initialized with role '{existing}'. Use --force to overwrite or 'usuarios-panel role set'."
            );
        }
    }

    let role = Role::new(role);
    store.set_role(&role)?;

    println!("Initialized {}", config.db_path.display());
    println!("Role: {role}");
    if !role.is_admin() {
        println!("The API is read-only. Run 'usuarios-panel role set admin' to allow writes.");
    }

    Ok(())
}

fn run_role(config: &ServerConfig, command: RoleCommands) -> anyhow::Result<()> {
    let store = open_store(config)?;

    match command {
        RoleCommands::Show => {
            let Some(role) = store.get_role()? else {
                bail!("Permission row not configured. Run 'usuarios-panel init' first.");
            };
            println!("{role}");
        }
        RoleCommands::Set { role } => {
            let role = Role::new(role);
            store.set_role(&role)?;
            println!("Role set to '{role}'");
            println!("Running servers pick this up within their permission cache TTL.");
        }
    }

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

async fn run_serve(config: ServerConfig) -> anyhow::Result<()> {
    config.validate()?;

    let store = open_store(&config)?;
    if store.get_role()?.is_none() {
        tracing::warn!(
            "permisos has no row; writes will fail until 'usuarios-panel init' or 'role set' is run"
        );
    }

    let state = Arc::new(AppState::new(Arc::new(store), &config));
    let sweeper = state.limiter.spawn_sweeper();

    let app = create_router(state);
    let addr = config.socket_addr()?;

    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    sweeper.abort();
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("usuarios_panel=info".parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = load_config(cli.config.as_deref(), cli.db)?;

    match cli.command {
        Commands::Serve {
            host,
            port,
            allowed_origins,
        } => {
            if let Some(host) = host {
                config.host = host;
            }
            if let Some(port) = port {
                config.port = port;
            }
            if let Some(origins) = allowed_origins {
                config.allowed_origins = origins
                    .into_iter()
                    .map(|o| o.trim().to_string())
                    .filter(|o| !o.is_empty())
                    .collect();
            }
            run_serve(config).await?;
        }
        Commands::Init { role, force } => run_init(&config, role, force)?,
        Commands::Role { command } => run_role(&config, command)?,
    }

    Ok(())
}

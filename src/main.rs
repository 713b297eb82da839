use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use match_notes::api::state::AppState;
use match_notes::api::{build_router, cors_layer};
use match_notes::calculate::{self, OpponentQuery};
use match_notes::config::AppConfig;
use match_notes::models::UserId;
use match_notes::storage::{JsonlStore, RecordSource, StorageConfig};

#[derive(Parser)]
#[command(name = "match-notes")]
#[command(about = "Practice and match journal with win/loss analytics")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(long, default_value = "./config.toml")]
    config: PathBuf,

    /// Data directory path (overrides the config file)
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,

    /// Output logs as JSON
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the API server
    Serve {
        /// Bind address
        #[arg(long)]
        host: Option<String>,

        /// Port number
        #[arg(long)]
        port: Option<u16>,
    },

    /// Print a user's overview, or the detail against one opponent
    Stats {
        /// User id
        #[arg(long)]
        user: String,

        /// Opponent name (exact match)
        #[arg(long)]
        opponent: Option<String>,
    },

    /// Print a user's opponent summaries
    Opponents {
        /// User id
        #[arg(long)]
        user: String,

        /// Case-insensitive name filter
        #[arg(long)]
        search: Option<String>,

        /// Maximum number of opponents
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Print the resolved configuration (file, environment and flags) as TOML
    ShowConfig,

    /// Write the built-in note types to the master table
    SeedNoteTypes {
        /// Replace existing rows
        #[arg(long)]
        overwrite: bool,
    },
}

fn init_tracing(level: &str, json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

fn parse_user(raw: &str) -> Result<UserId> {
    UserId::parse(raw).with_context(|| format!("invalid user id: {:?}", raw))
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load(&cli.config)
        .with_context(|| format!("loading {}", cli.config.display()))?;
    if let Some(dir) = cli.data_dir {
        config.data_dir = dir;
    }

    init_tracing(cli.log_level.as_deref().unwrap_or(&config.log_level), cli.json_logs);
    tracing::info!("Starting match-notes v{}", env!("CARGO_PKG_VERSION"));

    let store = JsonlStore::new(StorageConfig::new(config.data_dir.clone()));

    match cli.command {
        Commands::Serve { host, port } => {
            let ttl = config
                .cache
                .note_type_ttl()
                .context("invalid note type TTL")?;
            let state = AppState::new(store, ttl, config.stats.clone());
            let app = build_router(state).layer(cors_layer(&config.server.cors_origin));

            let addr = format!(
                "{}:{}",
                host.unwrap_or(config.server.host),
                port.unwrap_or(config.server.port)
            );
            let listener = tokio::net::TcpListener::bind(&addr).await?;
            tracing::info!("Listening on http://{}", addr);
            axum::serve(listener, app).await?;
        }
        Commands::Stats { user, opponent } => {
            let user = parse_user(&user)?;
            match opponent {
                Some(name) => {
                    let records = store.records_against(&user, &name).await?;
                    match calculate::opponent_detail(&name, &records) {
                        Some(detail) => print_json(&detail)?,
                        None => anyhow::bail!("no matches against {:?}", name),
                    }
                }
                None => {
                    let records = store.records_with_result(&user).await?;
                    print_json(&calculate::overview(&records))?;
                }
            }
        }
        Commands::Opponents { user, search, limit } => {
            let user = parse_user(&user)?;
            let query = OpponentQuery {
                search,
                limit: config.stats.opponent_limit(limit),
            };
            let records = store.records_with_result(&user).await?;
            print_json(&calculate::list_opponents(&records, &query))?;
        }
        Commands::ShowConfig => {
            print!("{}", config.to_toml()?);
        }
        Commands::SeedNoteTypes { overwrite } => {
            let written = store.seed_note_types(overwrite)?;
            if written == 0 {
                tracing::info!("Note types already present; use --overwrite to replace them");
            } else {
                tracing::info!("Wrote {} note types", written);
            }
        }
    }

    Ok(())
}

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use guardian_stats::api::{build_router, state::AppState};
use guardian_stats::config::AppConfig;
use guardian_stats::engine::StatsEngine;
use guardian_stats::models::{Character, Metric, Player, PlayerId};
use guardian_stats::snapshot::SnapshotCache;
use guardian_stats::storage::{JsonlReader, JsonlRecordStore, StorageConfig};

#[derive(Parser)]
#[command(name = "guardian-stats")]
#[command(about = "Destiny 2 player population statistics and leaderboards")]
#[command(version)]
struct Cli {
    /// Path to config file
    #[arg(long, default_value = "./config.toml")]
    config: PathBuf,

    /// Data directory (overrides the config file)
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Log level (overrides the config file)
    #[arg(long)]
    log_level: Option<String>,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP API server
    Serve {
        #[arg(long)]
        host: Option<String>,

        #[arg(long)]
        port: Option<u16>,
    },

    /// Print the population snapshot
    Snapshot {
        /// Recompute even if the stored snapshot is fresh
        #[arg(long)]
        force: bool,
    },

    /// Print a leaderboard
    Leaderboard {
        /// power_level, triumph_score or play_time
        #[arg(long, default_value = "power_level")]
        category: String,

        #[arg(long)]
        limit: Option<u32>,

        /// Also report this player's rank
        #[arg(long)]
        player: Option<String>,
    },

    /// Run the class ANOVA and the power/triumph correlation
    HypothesisTests,

    /// Print the badge catalog, or the badges one player has earned
    Badges {
        #[arg(long)]
        player: Option<String>,
    },

    /// Validate JSONL exports and write them into the data directory
    Import {
        #[arg(long)]
        players: PathBuf,

        #[arg(long)]
        characters: PathBuf,
    },
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn build_engine(config: &AppConfig) -> Result<StatsEngine> {
    let storage = StorageConfig::new(config.data_dir.clone());
    let ttl = config.stats.snapshot_ttl()?;
    let backend = config.stats.stats_backend()?;
    tracing::info!(
        "Using {} backend, snapshot TTL {}s",
        backend.name(),
        ttl.num_seconds()
    );

    Ok(StatsEngine::new(
        Arc::new(JsonlRecordStore::new(storage.clone())),
        SnapshotCache::with_persistence(ttl, storage.snapshot_path()),
        backend,
        config.stats.engine_settings(),
    ))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load_or_default(&cli.config)
        .with_context(|| format!("loading config from {:?}", cli.config))?;
    if let Some(dir) = cli.data_dir.clone() {
        config.data_dir = dir;
    }
    if let Some(level) = cli.log_level.clone() {
        config.log_level = level;
    }

    // Initialize tracing
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(cli.json_logs.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!cli.json_logs).then(tracing_subscriber::fmt::layer))
        .init();

    tracing::info!("Starting guardian-stats v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Commands::Serve { host, port } => {
            let engine = Arc::new(build_engine(&config)?);
            let state = AppState::new(engine, config.server.cors_origin.clone());
            let app = build_router(state);

            let host = host.unwrap_or(config.server.host);
            let port = port.unwrap_or(config.server.port);
            let addr = format!("{}:{}", host, port);
            let listener = tokio::net::TcpListener::bind(&addr).await?;
            tracing::info!("Listening on http://{}", addr);
            axum::serve(listener, app).await?;
        }
        Commands::Snapshot { force } => {
            let engine = build_engine(&config)?;
            let snapshot = if force {
                engine.refresh_snapshot(Utc::now()).await?
            } else {
                engine.get_snapshot(Utc::now()).await?
            };
            print_json(snapshot.as_ref())?;
        }
        Commands::Leaderboard {
            category,
            limit,
            player,
        } => {
            let category: Metric = category.parse().map_err(anyhow::Error::msg)?;
            let engine = build_engine(&config)?;
            let player = player.map(PlayerId::from);
            let board = engine.get_leaderboard(category, limit, player.as_ref())?;
            print_json(&board)?;
        }
        Commands::HypothesisTests => {
            let engine = build_engine(&config)?;
            let tests = engine.get_all_hypothesis_tests(Utc::now())?;
            if let Some(reason) = tests.class_anova.reason() {
                tracing::warn!("Class ANOVA not completed: {}", reason);
            }
            if let Some(reason) = tests.light_triumph_correlation.reason() {
                tracing::warn!("Correlation not completed: {}", reason);
            }
            print_json(&tests)?;
        }
        Commands::Badges { player } => {
            let engine = build_engine(&config)?;
            match player {
                Some(id) => {
                    let id = PlayerId::from(id);
                    let badges = engine
                        .compute_badges(&id, Utc::now())
                        .await?
                        .with_context(|| format!("player {} not found", id))?;
                    print_json(&badges)?;
                }
                None => print_json(&engine.badge_catalog())?,
            }
        }
        Commands::Import {
            players,
            characters,
        } => {
            let players: Vec<Player> = JsonlReader::new(players.clone())
                .read_strict()
                .with_context(|| format!("reading players from {:?}", players))?;
            let characters: Vec<Character> = JsonlReader::new(characters.clone())
                .read_strict()
                .with_context(|| format!("reading characters from {:?}", characters))?;

            let store = JsonlRecordStore::new(StorageConfig::new(config.data_dir.clone()));
            let (p, c) = store.import(&players, &characters)?;
            tracing::info!("Imported {} players and {} characters into {:?}", p, c, config.data_dir);
        }
    }

    Ok(())
}

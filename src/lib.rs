//! attsync library root.
//! Exposes CLI parser, high-level run() function, and internal modules.

pub mod api;
pub mod cli;
pub mod config;
pub mod core;
pub mod db;
pub mod device;
pub mod errors;
pub mod models;
pub mod ui;
pub mod utils;

use clap::Parser;
use cli::parser::{Cli, Commands};
use config::Config;
use errors::AppResult;

/// Central command dispatcher
pub fn dispatch(cli: &Cli, cfg: &Config) -> AppResult<()> {
    // Bare invocation performs a full sync, the cron-friendly default.
    let Some(command) = cli.command.as_ref() else {
        return cli::commands::sync::handle(cfg);
    };

    match command {
        Commands::Init => cli::commands::init::handle(cli),
        Commands::Sync => cli::commands::sync::handle(cfg),
        Commands::Pull => cli::commands::pull::handle(cfg),
        Commands::Send => cli::commands::send::handle(cfg),
        Commands::List { .. } => cli::commands::list::handle(command, cfg),
        Commands::Log { .. } => cli::commands::log::handle(command, cfg),
        Commands::Db { .. } => cli::commands::db::handle(command, cfg),
        Commands::Config { .. } => cli::commands::config::handle(command, cfg),
        Commands::Backup { .. } => cli::commands::backup::handle(command, cfg),
    }
}

/// Entry point used by main.rs
pub fn run() -> AppResult<()> {
    // 1️⃣ parse CLI
    let cli = Cli::parse();

    // 2️⃣ load config ONCE; an explicit --config wins over the default path
    let mut cfg = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    // 3️⃣ apply a DB override from the command line
    if let Some(custom_db) = &cli.db {
        cfg.database = utils::path::expand_tilde(custom_db)
            .to_string_lossy()
            .to_string();
    }

    // 4️⃣ logging: RUST_LOG still wins over the configured level
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(cfg.log_level.as_str()),
    )
    .format_timestamp_secs()
    .try_init()
    .ok();

    // 5️⃣ hand everything to the dispatcher
    dispatch(&cli, &cfg)
}

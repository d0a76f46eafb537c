use crate::config::Config;
use crate::db::log;
use crate::errors::AppResult;

use crate::cli::parser::Cli;
use crate::db::initialize::init_db;
use rusqlite::Connection;

/// Handle the `init` command
///
/// This initializes:
///  - the config directory (if missing)
///  - the configuration file
///  - the SQLite outbox database
///  - all pending DB migrations
pub fn handle(cli: &Cli) -> AppResult<()> {
    //
    // 1️⃣ PREPARE CONFIGURATION
    //
    // Config::init_all creates:
    //   ~/.attsync/
    //   ~/.attsync/attsync.conf
    // and records the configured DB path.
    //

    if let Some(custom) = &cli.db {
        Config::init_all(Some(custom.clone()))?;
    } else {
        Config::init_all(None)?;
    }

    let path = Config::config_file();
    let cfg = Config::load()?;
    let db_path = cfg.database.clone();

    println!("⚙️  Initializing attsync…");
    println!("📄 Config file : {}", path.display());
    println!("🗄️  Database   : {}", &db_path);

    //
    // 2️⃣ OPEN DB
    //
    let conn = Connection::open(&db_path)?;

    //
    // 3️⃣ INITIALIZE DB (tables + migrations)
    //
    init_db(&conn)?;

    println!("✅ Database initialized at {}", &db_path);

    //
    // 4️⃣ INTERNAL LOG (non blocking)
    //
    if let Err(e) = log::record(&conn, "init", &db_path, "Database initialized") {
        eprintln!("⚠️ Failed to write internal log: {}", e);
    }

    println!("🎉 attsync initialization completed!");
    Ok(())
}

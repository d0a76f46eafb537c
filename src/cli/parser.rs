use clap::{Parser, Subcommand};

/// Command-line interface definition for attsync
/// CLI application to sync attendance terminals into SQLite and forward
/// the punches to an HTTP endpoint
#[derive(Parser)]
#[command(
    name = "attsync",
    version = env!("CARGO_PKG_VERSION"),
    about = "Pull attendance punches from a terminal into a durable SQLite outbox and push them to an HTTP API",
    long_about = None
)]
pub struct Cli {
    /// Override database path (useful for tests or custom DB)
    #[arg(global = true, long = "db")]
    pub db: Option<String>,

    /// Use an alternative configuration file
    #[arg(global = true, long = "config", value_name = "FILE")]
    pub config: Option<String>,

    /// Without a subcommand a full sync (pull + send) is performed.
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize the database and configuration
    Init,

    /// Pull from the terminal, then send pending events (the default)
    Sync,

    /// Pull the terminal log into the local outbox, without sending
    Pull,

    /// Send pending outbox events, without touching the terminal log
    Send,

    /// List outbox events
    List {
        #[arg(long = "unsent", help = "Show only events not yet delivered")]
        unsent: bool,

        #[arg(long, default_value_t = 50, help = "Maximum rows to show")]
        limit: u32,
    },

    /// Print or manage the internal log table
    Log {
        #[arg(long = "print", help = "Print rows from the internal log table")]
        print: bool,

        #[arg(long, default_value_t = 50, help = "Maximum rows to show")]
        limit: u32,
    },

    /// Manage the database (migrations, integrity checks, etc.)
    Db {
        #[arg(long = "migrate", help = "Run pending database migrations")]
        migrate: bool,

        #[arg(long = "check", help = "Check database integrity")]
        check: bool,

        #[arg(long = "vacuum", help = "Optimize the database using VACUUM")]
        vacuum: bool,

        #[arg(long = "info", help = "Show database information")]
        info: bool,
    },

    /// Show or validate the effective configuration
    Config {
        #[arg(long = "print", help = "Print the current configuration")]
        print_config: bool,

        #[arg(long = "check", help = "Check the configuration for problems")]
        check: bool,
    },

    /// Create a backup copy of the database
    Backup {
        #[arg(long, value_name = "FILE")]
        file: String,

        #[arg(long)]
        compress: bool,

        #[arg(long, short = 'f', help = "Overwrite the destination if it exists")]
        force: bool,
    },
}

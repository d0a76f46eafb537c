use crate::cli::parser::Commands;
use crate::config::Config;
use crate::core::log::LogLogic;
use crate::db::initialize::init_db;
use crate::db::pool::DbPool;
use crate::errors::AppResult;
use crate::ui::messages::info;

pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    if let Commands::Log { print, limit } = cmd {
        if *print {
            let mut pool = DbPool::new(&cfg.database)?;
            init_db(&pool.conn)?;
            LogLogic::print_log(&mut pool, *limit)?;
        } else {
            info("Nothing to do: pass --print to show the log");
        }
    }

    Ok(())
}

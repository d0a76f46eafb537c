use crate::cli::parser::Commands;
use crate::config::Config;
use crate::core::list::ListLogic;
use crate::db::initialize::init_db;
use crate::db::pool::DbPool;
use crate::errors::AppResult;

pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    if let Commands::List { unsent, limit } = cmd {
        let mut pool = DbPool::new(&cfg.database)?;
        init_db(&pool.conn)?;

        ListLogic::print_events(&mut pool, *limit, *unsent)?;
    }

    Ok(())
}

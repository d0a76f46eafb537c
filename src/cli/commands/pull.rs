use crate::config::Config;
use crate::core::normalize::MapRules;
use crate::core::sync;
use crate::db::initialize::init_db;
use crate::db::pool::DbPool;
use crate::device::Fetcher;
use crate::device::zk::ZkTerminal;
use crate::errors::AppResult;
use std::time::Duration;

/// Handle the `pull` command: stage the terminal log locally, send nothing.
pub fn handle(cfg: &Config) -> AppResult<()> {
    let mut pool = DbPool::new(&cfg.database)?;
    init_db(&pool.conn)?;

    let fetcher = Fetcher::new(
        ZkTerminal::from_config(cfg),
        cfg.fetch_retries,
        Duration::from_millis(cfg.fetch_retry_delay_ms),
    );
    let rules = MapRules::from_config(cfg);

    sync::pull_phase(&fetcher, &rules, &mut pool)?;

    Ok(())
}

use crate::api::ApiClient;
use crate::config::Config;
use crate::core::sync;
use crate::db::initialize::init_db;
use crate::db::pool::DbPool;
use crate::device::Fetcher;
use crate::device::zk::ZkTerminal;
use crate::errors::AppResult;
use crate::ui::messages::success;
use std::time::Duration;

/// Handle the `sync` command (also the default when no command is given):
/// pull from the terminal, push pending events, optionally clear the
/// terminal log afterwards.
pub fn handle(cfg: &Config) -> AppResult<()> {
    let mut pool = DbPool::new(&cfg.database)?;
    init_db(&pool.conn)?;

    let fetcher = Fetcher::new(
        ZkTerminal::from_config(cfg),
        cfg.fetch_retries,
        Duration::from_millis(cfg.fetch_retry_delay_ms),
    );
    let client = ApiClient::from_config(cfg)?;

    let summary = sync::run_sync(&mut pool, cfg, &fetcher, &client)?;

    success(format!(
        "Sync complete: fetched {}, staged {}, sent {}",
        summary.fetched, summary.inserted, summary.sent
    ));

    Ok(())
}

use crate::api::ApiClient;
use crate::config::Config;
use crate::core::sync;
use crate::db::initialize::init_db;
use crate::db::pool::DbPool;
use crate::device::Fetcher;
use crate::device::zk::ZkTerminal;
use crate::errors::AppResult;
use std::time::Duration;

/// Handle the `send` command: push pending outbox events, pull nothing.
///
/// When clearing the terminal log is enabled it still happens here: the
/// staged events just moved out, so the terminal copy is now redundant.
pub fn handle(cfg: &Config) -> AppResult<()> {
    let mut pool = DbPool::new(&cfg.database)?;
    init_db(&pool.conn)?;

    let client = ApiClient::from_config(cfg)?;
    let sent = sync::push_phase(&mut pool, &client, cfg.batch_limit)?;

    if cfg.clear_device_log && sent > 0 {
        let fetcher = Fetcher::new(
            ZkTerminal::from_config(cfg),
            cfg.fetch_retries,
            Duration::from_millis(cfg.fetch_retry_delay_ms),
        );
        sync::clear_after_push(&fetcher, &mut pool);
    }

    Ok(())
}

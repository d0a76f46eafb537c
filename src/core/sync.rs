use crate::api::ApiClient;
use crate::config::Config;
use crate::core::normalize::{self, MapRules};
use crate::db::pool::DbPool;
use crate::db::{log as audit, queries};
use crate::device::{Fetcher, Terminal};
use crate::errors::AppResult;
use crate::models::{DeliveryOutcome, NormalizedEvent};
use crate::ui::messages::{error, info, success, warning};

/// What one run did, for the closing summary line.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub fetched: usize,
    pub inserted: usize,
    pub sent: usize,
}

/// Pull the terminal log, normalize it and stage it into the outbox.
///
/// Returns (records fetched, rows actually inserted). A terminal that
/// cannot be reached simply contributes zero records; staging is additive
/// and re-pulls never duplicate rows.
pub fn pull_phase<T: Terminal>(
    fetcher: &Fetcher<T>,
    rules: &MapRules,
    pool: &mut DbPool,
) -> AppResult<(usize, usize)> {
    log::info!("pulling attendance from {}", fetcher.describe());

    let raw = fetcher.fetch();
    let fetched = raw.len();

    let events = normalize::normalize_all(&raw, rules);
    let dropped = fetched - events.len();
    if dropped > 0 {
        warning(format!(
            "{dropped} record(s) could not be normalized and were skipped"
        ));
    }

    let inserted = queries::insert_batch(&mut pool.conn, &events)?;

    audit::record(
        &pool.conn,
        "pull",
        &fetcher.describe(),
        &format!("fetched {fetched}, staged {inserted} new"),
    )?;

    success(format!(
        "Fetched {fetched} record(s), staged {inserted} new"
    ));

    Ok((fetched, inserted))
}

/// Push pending events to the server, oldest first.
///
/// Each event is settled on its own: a rejection or an exhausted retry
/// budget leaves that row pending and the loop moves on. Only a confirmed
/// delivery (or a server-side duplicate) flips a row to sent.
pub fn push_phase(pool: &mut DbPool, client: &ApiClient, limit: u32) -> AppResult<usize> {
    let pending = queries::fetch_unsent(&pool.conn, limit)?;
    if pending.is_empty() {
        info("Outbox is empty, nothing to push");
        return Ok(0);
    }

    log::info!("pushing {} pending event(s)", pending.len());

    let mut sent = 0usize;
    for event in &pending {
        let payload = NormalizedEvent::new(event.subject_id.clone(), event.event_time.clone());

        match client.deliver(&payload) {
            DeliveryOutcome::Delivered { remote_id }
            | DeliveryOutcome::AlreadyKnown { remote_id } => {
                if queries::mark_sent(&pool.conn, event.id, &remote_id)? {
                    sent += 1;
                } else {
                    // Can happen when a crashed run is replayed; the row
                    // already carries its remote id and stays as it is.
                    warning(format!("event {} was already marked sent", event.id));
                }
            }
            DeliveryOutcome::Rejected { detail } => {
                warning(format!(
                    "event {} ({} @ {}) rejected: {detail}",
                    event.id, event.subject_id, event.event_time
                ));
            }
            DeliveryOutcome::Exhausted {
                attempts,
                last_error,
            } => {
                error(format!(
                    "event {} still pending after {attempts} attempt(s): {last_error}",
                    event.id
                ));
            }
        }
    }

    audit::record(
        &pool.conn,
        "push",
        "",
        &format!("sent {sent} of {} pending", pending.len()),
    )?;

    success(format!("Sent {sent} of {} pending event(s)", pending.len()));

    Ok(sent)
}

/// Best-effort wipe of the terminal log once a push moved data out.
///
/// Failure here is only logged: the events are safe in the outbox and on
/// the server, the terminal just keeps some already-synced history around.
pub fn clear_after_push<T: Terminal>(fetcher: &Fetcher<T>, pool: &mut DbPool) {
    match fetcher.clear_log() {
        Ok(()) => {
            if let Err(e) = audit::record(
                &pool.conn,
                "clear_log",
                &fetcher.describe(),
                "Terminal log cleared after push",
            ) {
                log::debug!("could not audit the terminal clear: {e}");
            }
            success("Terminal log cleared");
        }
        Err(e) => warning(format!("Could not clear terminal log: {e}")),
    }
}

/// Full pull-then-push cycle; the default when no subcommand is given.
pub fn run_sync<T: Terminal>(
    pool: &mut DbPool,
    cfg: &Config,
    fetcher: &Fetcher<T>,
    client: &ApiClient,
) -> AppResult<RunSummary> {
    let rules = MapRules::from_config(cfg);

    let (fetched, inserted) = pull_phase(fetcher, &rules, pool)?;
    let sent = push_phase(pool, client, cfg.batch_limit)?;

    if cfg.clear_device_log && sent > 0 {
        clear_after_push(fetcher, pool);
    }

    Ok(RunSummary {
        fetched,
        inserted,
        sent,
    })
}

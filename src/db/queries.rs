use crate::db::models::LogLine;
use crate::db::pool::DbPool;
use crate::errors::AppResult;
use crate::models::{AttendanceEvent, NormalizedEvent};
use rusqlite::params;
use rusqlite::{Connection, Result, Row};

pub fn map_row(row: &Row) -> Result<AttendanceEvent> {
    Ok(AttendanceEvent {
        id: row.get("id")?,
        subject_id: row.get("subject_id")?,
        event_time: row.get("event_time")?,
        remote_id: row.get("remote_id")?,
        sent_at: row.get("sent_at")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

/// Stage a batch of normalized events into the outbox.
///
/// Runs in a single transaction. Rows colliding on (subject_id, event_time)
/// are silently skipped, so re-pulling an unchanged terminal log is harmless.
/// Returns the number of rows actually inserted.
pub fn insert_batch(conn: &mut Connection, events: &[NormalizedEvent]) -> AppResult<usize> {
    if events.is_empty() {
        return Ok(0);
    }

    let tx = conn.transaction()?;
    let mut inserted = 0usize;
    {
        let mut stmt = tx.prepare_cached(
            "INSERT OR IGNORE INTO attendance_events (subject_id, event_time)
             VALUES (?1, ?2)",
        )?;

        for ev in events {
            // Belt and braces: the normalizer never emits these, but the
            // outbox must not accept them from any caller either.
            if ev.subject_id.is_empty() || ev.event_time.is_empty() {
                continue;
            }
            inserted += stmt.execute(params![ev.subject_id, ev.event_time])?;
        }
    }
    tx.commit()?;

    Ok(inserted)
}

/// Load pending events, oldest first, capped at `limit`.
pub fn fetch_unsent(conn: &Connection, limit: u32) -> AppResult<Vec<AttendanceEvent>> {
    let mut stmt = conn.prepare(
        "SELECT * FROM attendance_events
         WHERE remote_id IS NULL
         ORDER BY event_time ASC, id ASC
         LIMIT ?1",
    )?;

    let rows = stmt.query_map([limit], map_row)?;

    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    Ok(out)
}

/// Record a successful delivery for one event.
///
/// The `remote_id IS NULL` guard makes this a one-way transition: once an
/// event carries a remote identifier it is never overwritten, so replaying
/// a push after a crash cannot downgrade an already-sent row.
/// Returns true when the row was actually updated.
pub fn mark_sent(conn: &Connection, id: i64, remote_id: &str) -> AppResult<bool> {
    let changed = conn.execute(
        "UPDATE attendance_events
         SET remote_id = ?1,
             sent_at = datetime('now'),
             updated_at = datetime('now')
         WHERE id = ?2 AND remote_id IS NULL",
        params![remote_id, id],
    )?;
    Ok(changed == 1)
}

/// Load events for display, newest first.
pub fn list_events(
    conn: &Connection,
    limit: u32,
    only_unsent: bool,
) -> AppResult<Vec<AttendanceEvent>> {
    let sql = if only_unsent {
        "SELECT * FROM attendance_events
         WHERE remote_id IS NULL
         ORDER BY event_time DESC, id DESC
         LIMIT ?1"
    } else {
        "SELECT * FROM attendance_events
         ORDER BY event_time DESC, id DESC
         LIMIT ?1"
    };

    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map([limit], map_row)?;

    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    Ok(out)
}

/// Load recent audit log lines, newest first.
pub fn load_log(pool: &mut DbPool, limit: u32) -> AppResult<Vec<LogLine>> {
    let mut stmt = pool.conn.prepare(
        "SELECT date, operation, target, message FROM log
         ORDER BY id DESC
         LIMIT ?1",
    )?;

    let rows = stmt.query_map([limit], |row| {
        Ok(LogLine {
            date: row.get(0)?,
            operation: row.get(1)?,
            target: row.get(2)?,
            message: row.get(3)?,
        })
    })?;

    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }

    Ok(out)
}

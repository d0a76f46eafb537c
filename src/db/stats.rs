use crate::db::pool::DbPool;
use crate::utils::colors::{CYAN, GREEN, GREY, RESET, YELLOW};
use rusqlite::OptionalExtension;
use std::fs;

pub fn print_db_info(pool: &mut DbPool, db_path: &str) -> rusqlite::Result<()> {
    println!();

    //
    // 1) FILE SIZE
    //
    let file_size = fs::metadata(db_path).map(|m| m.len()).unwrap_or(0);
    let file_mb = (file_size as f64) / (1024.0 * 1024.0);

    println!("{}• File:{} {}{}{}", CYAN, RESET, YELLOW, db_path, RESET);
    println!("{}• Size:{} {:.2} MB", CYAN, RESET, file_mb);

    //
    // 2) EVENT COUNTS
    //
    let total: i64 = pool
        .conn
        .query_row("SELECT COUNT(*) FROM attendance_events", [], |row| {
            row.get(0)
        })?;
    let pending: i64 = pool.conn.query_row(
        "SELECT COUNT(*) FROM attendance_events WHERE remote_id IS NULL",
        [],
        |row| row.get(0),
    )?;

    println!(
        "{}• Total events:{} {}{}{}",
        CYAN, RESET, GREEN, total, RESET
    );
    println!(
        "{}• Sent:{}         {}{}{}",
        CYAN,
        RESET,
        GREEN,
        total - pending,
        RESET
    );
    println!(
        "{}• Pending:{}      {}{}{}",
        CYAN, RESET, YELLOW, pending, RESET
    );

    //
    // 3) TIME RANGE
    //
    let first_time: Option<String> = pool
        .conn
        .query_row(
            "SELECT event_time FROM attendance_events ORDER BY event_time ASC LIMIT 1",
            [],
            |row| row.get(0),
        )
        .optional()?;

    let last_time: Option<String> = pool
        .conn
        .query_row(
            "SELECT event_time FROM attendance_events ORDER BY event_time DESC LIMIT 1",
            [],
            |row| row.get(0),
        )
        .optional()?;

    let fmt_first = first_time.unwrap_or_else(|| format!("{GREY}--{RESET}"));
    let fmt_last = last_time.unwrap_or_else(|| format!("{GREY}--{RESET}"));

    println!("{}• Time range:{}", CYAN, RESET);
    println!("    from: {}", fmt_first);
    println!("    to:   {}", fmt_last);

    //
    // 4) OLDEST PENDING
    //
    let oldest_pending: Option<String> = pool
        .conn
        .query_row(
            "SELECT event_time FROM attendance_events
             WHERE remote_id IS NULL
             ORDER BY event_time ASC LIMIT 1",
            [],
            |row| row.get(0),
        )
        .optional()?;

    if let Some(t) = oldest_pending {
        println!("{}• Oldest pending:{} {}{}{}", CYAN, RESET, YELLOW, t, RESET);
    }

    println!();
    Ok(())
}

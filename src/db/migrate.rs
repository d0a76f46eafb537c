use crate::ui::messages::{success, warning};
use rusqlite::{Connection, Error, OptionalExtension, Result};

const LEGACY_MIGRATION: &str = "20250601_0001_attendance_logs_to_events";

/// Ensure that the `log` table exists with the modern schema.
fn ensure_log_table(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS log (
            id        INTEGER PRIMARY KEY AUTOINCREMENT,
            date      TEXT NOT NULL,
            operation TEXT NOT NULL,
            target    TEXT DEFAULT '',
            message   TEXT NOT NULL
        );
        "#,
    )?;
    Ok(())
}

fn table_exists(conn: &Connection, name: &str) -> Result<bool> {
    let mut stmt =
        conn.prepare("SELECT name FROM sqlite_master WHERE type='table' AND name=?1")?;
    let exists: Option<String> = stmt.query_row([name], |row| row.get(0)).optional()?;
    Ok(exists.is_some())
}

fn migration_applied(conn: &Connection, version: &str) -> Result<bool> {
    let mut chk = conn.prepare(
        "SELECT 1 FROM log
         WHERE operation = 'migration_applied' AND target = ?1
         LIMIT 1",
    )?;
    Ok(chk.query_row([version], |_| Ok(())).optional()?.is_some())
}

fn record_migration(conn: &Connection, version: &str, message: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO log (date, operation, target, message)
         VALUES (datetime('now'), 'migration_applied', ?1, ?2)",
        [version, message],
    )?;
    Ok(())
}

/// Create the `attendance_events` outbox table with the modern schema.
///
/// `UNIQUE(subject_id, event_time)` is the dedup key: re-pulling the same
/// terminal records must never produce a second row. A sent event keeps its
/// `remote_id` forever, so the partial index only covers the pending rows.
fn create_attendance_events_table(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS attendance_events (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            subject_id  TEXT NOT NULL,
            event_time  TEXT NOT NULL,
            remote_id   TEXT,
            sent_at     TEXT,
            created_at  TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at  TEXT NOT NULL DEFAULT (datetime('now')),
            UNIQUE(subject_id, event_time)
        );

        CREATE INDEX IF NOT EXISTS idx_attendance_unsent
            ON attendance_events(event_time) WHERE remote_id IS NULL;
        CREATE INDEX IF NOT EXISTS idx_attendance_subject
            ON attendance_events(subject_id, event_time);
        "#,
    )?;
    Ok(())
}

/// Copy rows from the pre-0.3 `attendance_logs` table and drop it.
fn migrate_legacy_attendance_logs(conn: &Connection) -> Result<()> {
    if migration_applied(conn, LEGACY_MIGRATION)? {
        return Ok(());
    }

    warning("Legacy attendance_logs table detected — importing rows...");

    conn.execute_batch(
        r#"
        PRAGMA foreign_keys=OFF;
        BEGIN;

        INSERT OR IGNORE INTO attendance_events
            (subject_id, event_time, remote_id, sent_at, created_at, updated_at)
        SELECT user_id,
               record_time,
               server_id,
               sent_at,
               COALESCE(created_at, datetime('now')),
               COALESCE(updated_at, datetime('now'))
        FROM attendance_logs;

        DROP TABLE attendance_logs;

        COMMIT;
        PRAGMA foreign_keys=ON;
        "#,
    )?;

    record_migration(
        conn,
        LEGACY_MIGRATION,
        "Imported attendance_logs rows into attendance_events",
    )?;

    success("Imported legacy rows into attendance_events.");

    Ok(())
}

fn backup_before_migration(db_path: &str) -> Result<()> {
    use chrono::Local;
    use std::fs::{self, File};
    use std::io::Write;
    use zip::CompressionMethod;
    use zip::ZipWriter;
    use zip::write::FileOptions;

    let backup_name = format!(
        "{}-backup_db_pre_migration.zip",
        Local::now().format("%Y%m%d_%H%M%S")
    );

    let parent = std::path::Path::new(db_path)
        .parent()
        .map(|p| p.to_path_buf())
        .unwrap_or_else(|| std::path::PathBuf::from("."));
    let backup_path = parent.join(&backup_name);

    let file = File::create(&backup_path).map_err(|e| {
        Error::ToSqlConversionFailure(Box::new(std::io::Error::new(
            e.kind(),
            format!("Backup failed (create): {}", e),
        )))
    })?;

    let mut zip = ZipWriter::new(file);

    let options: FileOptions<'_, ()> =
        FileOptions::default().compression_method(CompressionMethod::Deflated);

    zip.start_file("database.sqlite", options).map_err(|e| {
        Error::ToSqlConversionFailure(Box::new(std::io::Error::other(format!(
            "Backup failed (start_file): {}",
            e
        ))))
    })?;

    let db_content = fs::read(db_path).map_err(|e| {
        Error::ToSqlConversionFailure(Box::new(std::io::Error::other(format!(
            "Backup failed (read): {}",
            e
        ))))
    })?;

    zip.write_all(&db_content).map_err(|e| {
        Error::ToSqlConversionFailure(Box::new(std::io::Error::other(format!(
            "Backup failed (write_all): {}",
            e
        ))))
    })?;

    zip.finish().map_err(|e| {
        Error::ToSqlConversionFailure(Box::new(std::io::Error::other(format!(
            "Backup failed (finish): {}",
            e
        ))))
    })?;

    success(format!("📦 Backup created: {}", backup_path.display()));
    Ok(())
}

/// Public entry point: run all pending migrations.
///
/// Invoked from db::init_db().
pub fn run_pending_migrations(conn: &Connection) -> Result<()> {
    // 1) Ensure log table
    ensure_log_table(conn)?;

    // 2) Detect legacy schema (< 0.3.0)
    let legacy_logs_exists = table_exists(conn, "attendance_logs")?;

    // 3) If legacy → perform PRE-MIGRATION BACKUP
    if legacy_logs_exists {
        warning("Legacy schema detected — creating safety backup before migration...");

        let db_path: String = conn
            .query_row("PRAGMA database_list;", [], |row| row.get::<_, String>(2))
            .unwrap_or_default();

        if !db_path.is_empty() {
            backup_before_migration(&db_path)?;
        } else {
            warning("Could not determine DB path — backup skipped.");
        }
    }

    // 4) Ensure the outbox table and its indexes
    create_attendance_events_table(conn)?;

    // 5) Import and drop the legacy table
    if legacy_logs_exists {
        migrate_legacy_attendance_logs(conn)?;
    }

    Ok(())
}

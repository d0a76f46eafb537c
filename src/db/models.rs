//! Database row models for the internal audit log.
//! These are thin wrappers around SQLite rows.

#[derive(Debug, Clone)]
pub struct LogLine {
    pub date: String,
    pub operation: String,
    pub target: String,
    pub message: String,
}

use crate::errors::AppResult;
use crate::models::RawRecord;

pub mod fetch;
pub mod zk;

pub use fetch::Fetcher;

/// One live connection to an attendance terminal.
///
/// Capture is paused around the log read so the firmware does not append
/// records mid-transfer. Callers are expected to re-enable capture and
/// close the session even when a read failed; `Fetcher` does exactly that.
pub trait TerminalSession {
    /// Stop the terminal from registering new punches.
    fn disable_capture(&mut self) -> AppResult<()>;

    /// Resume normal operation.
    fn enable_capture(&mut self) -> AppResult<()>;

    /// Download the attendance log as raw records.
    fn read_records(&mut self) -> AppResult<Vec<RawRecord>>;

    /// Wipe the attendance log on the terminal.
    fn clear_log(&mut self) -> AppResult<()>;

    /// Say goodbye to the terminal.
    fn close(&mut self) -> AppResult<()>;
}

/// A connectable attendance terminal.
pub trait Terminal {
    type Session: TerminalSession;

    fn connect(&self) -> AppResult<Self::Session>;

    /// Short label for log lines, typically `host:port`.
    fn describe(&self) -> String;
}

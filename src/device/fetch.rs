use crate::device::{Terminal, TerminalSession};
use crate::errors::AppResult;
use crate::models::RawRecord;
use crate::utils::Backoff;
use std::time::Duration;

/// Pulls the attendance log from a terminal, retrying over flaky links.
///
/// Terminals sit on shop-floor networks and drop connections routinely, so
/// a failed pull is an ordinary event here, not an error: `fetch` comes
/// back with an empty batch and the rest of the run carries on with what
/// is already staged in the outbox.
pub struct Fetcher<T: Terminal> {
    terminal: T,
    retries: u32,
    backoff: Backoff,
}

/// Closes the session when it goes out of scope, re-enabling live capture
/// first when asked to. Teardown runs on every exit path, a failed read
/// included, and must never mask the read outcome; a terminal left with
/// capture disabled eats punches.
struct SessionGuard<S: TerminalSession> {
    session: S,
    resume_capture: bool,
}

impl<S: TerminalSession> Drop for SessionGuard<S> {
    fn drop(&mut self) {
        if self.resume_capture
            && let Err(e) = self.session.enable_capture()
        {
            log::debug!("failed to re-enable capture: {e}");
        }
        if let Err(e) = self.session.close() {
            log::debug!("failed to close terminal session: {e}");
        }
    }
}

impl<T: Terminal> Fetcher<T> {
    pub fn new(terminal: T, retries: u32, retry_delay: Duration) -> Self {
        Self {
            terminal,
            retries: retries.max(1),
            backoff: Backoff::fixed(retry_delay),
        }
    }

    pub fn describe(&self) -> String {
        self.terminal.describe()
    }

    /// Download everything the terminal holds.
    ///
    /// An empty log is retried like a failure: some firmware revisions
    /// return nothing on the first read after a reconnect.
    pub fn fetch(&self) -> Vec<RawRecord> {
        for attempt in 1..=self.retries {
            match self.try_fetch() {
                Ok(records) if !records.is_empty() => return records,
                Ok(_) => {
                    log::warn!(
                        "terminal {} returned no records (attempt {attempt}/{})",
                        self.terminal.describe(),
                        self.retries
                    );
                }
                Err(e) => {
                    log::warn!(
                        "terminal {} read failed (attempt {attempt}/{}): {e}",
                        self.terminal.describe(),
                        self.retries
                    );
                }
            }
            if attempt < self.retries {
                self.backoff.wait_after(attempt);
            }
        }
        Vec::new()
    }

    fn try_fetch(&self) -> AppResult<Vec<RawRecord>> {
        let mut guard = SessionGuard {
            session: self.terminal.connect()?,
            resume_capture: true,
        };
        // Pausing capture is best-effort: the log is still readable with
        // capture live, and a punch landing mid-read collapses in the
        // outbox when it is seen again.
        if let Err(e) = guard.session.disable_capture() {
            log::warn!("failed to pause capture: {e}");
        }
        guard.session.read_records()
    }

    /// Wipe the terminal log. Uses a fresh session; capture stays on.
    pub fn clear_log(&self) -> AppResult<()> {
        let mut guard = SessionGuard {
            session: self.terminal.connect()?,
            resume_capture: false,
        };
        guard.session.clear_log()
    }
}

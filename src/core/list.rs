use crate::db::pool::DbPool;
use crate::db::queries;
use crate::errors::AppResult;
use crate::ui::messages::info;
use crate::utils::colors::{BOLD, GREY, RESET, colorize_sent};

pub struct ListLogic;

impl ListLogic {
    /// Print outbox rows, newest first.
    ///
    /// Column widths follow the data; colors are applied after padding so
    /// the escape codes never skew the alignment.
    pub fn print_events(pool: &mut DbPool, limit: u32, only_unsent: bool) -> AppResult<()> {
        let events = queries::list_events(&pool.conn, limit, only_unsent)?;

        if events.is_empty() {
            if only_unsent {
                info("No pending events in the outbox");
            } else {
                info("The outbox is empty");
            }
            return Ok(());
        }

        let id_w = events
            .iter()
            .map(|e| e.id.to_string().len())
            .max()
            .unwrap_or(2)
            .max(2);
        let subj_w = events
            .iter()
            .map(|e| e.subject_id.len())
            .max()
            .unwrap_or(7)
            .max(7);
        let time_w = events
            .iter()
            .map(|e| e.event_time.len())
            .max()
            .unwrap_or(10)
            .max(10);
        let sent_w = events
            .iter()
            .map(|e| e.sent_at.as_deref().unwrap_or("--").len())
            .max()
            .unwrap_or(7)
            .max(7);

        println!();
        println!(
            "{BOLD}{:>id_w$}  {:<subj_w$}  {:<time_w$}  {:<sent_w$}  {}{RESET}",
            "ID", "SUBJECT", "EVENT TIME", "SENT AT", "REMOTE"
        );

        let mut pending = 0usize;
        let total = events.len();

        for e in events {
            let sent = e.is_sent();
            if !sent {
                pending += 1;
            }

            let time_cell = colorize_sent(&format!("{:<time_w$}", e.event_time), sent);
            let sent_cell = match &e.sent_at {
                Some(ts) => format!("{:<sent_w$}", ts),
                None => format!("{GREY}{:<sent_w$}{RESET}", "--"),
            };
            let remote_cell = match &e.remote_id {
                Some(id) => id.clone(),
                None => format!("{GREY}--{RESET}"),
            };

            println!(
                "{:>id_w$}  {:<subj_w$}  {}  {}  {}",
                e.id, e.subject_id, time_cell, sent_cell, remote_cell
            );
        }

        println!();
        println!("{total} event(s), {pending} pending");

        Ok(())
    }
}

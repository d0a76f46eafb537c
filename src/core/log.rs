use crate::db::models::LogLine;
use crate::db::pool::DbPool;
use crate::db::queries;
use crate::errors::AppResult;
use ansi_term::Colour;

/// ANSI color for each audit operation
fn color_for_operation(op: &str) -> Colour {
    match op {
        "pull" => Colour::Green,
        "push" => Colour::Cyan,
        "clear_log" => Colour::Red,
        "backup" => Colour::Blue,
        "migration_applied" => Colour::Purple,
        "init" => Colour::RGB(255, 153, 51), // arancione
        _ => Colour::White,
    }
}

fn display_date(raw: &str) -> String {
    chrono::DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.format("%FT%T%:z").to_string())
        .unwrap_or_else(|_| raw.to_string())
}

/// Long targets (usually file paths) get shortened for the table.
fn short_target(target: &str) -> String {
    if target.chars().count() > 40 {
        let mut s: String = target.chars().take(37).collect();
        s.push_str("...");
        s
    } else {
        target.to_string()
    }
}

fn label(line: &LogLine) -> String {
    if line.target.is_empty() {
        line.operation.clone()
    } else {
        format!("{} ({})", line.operation, short_target(&line.target))
    }
}

pub struct LogLogic;

impl LogLogic {
    /// Print the most recent audit lines, oldest of the batch on top.
    pub fn print_log(pool: &mut DbPool, limit: u32) -> AppResult<()> {
        let mut entries = queries::load_log(pool, limit)?;
        entries.reverse(); // stored newest first, read top-down chronologically

        if entries.is_empty() {
            println!("📜 Internal log is empty");
            return Ok(());
        }

        // Widths are computed on the plain strings; color is applied last
        // so the escape codes never enter the padding math.
        let date_w = entries
            .iter()
            .map(|l| display_date(&l.date).len())
            .max()
            .unwrap_or(19);
        let op_w = entries.iter().map(|l| label(l).len()).max().unwrap_or(10);

        println!("📜 Internal log:\n");

        for line in entries {
            let date = display_date(&line.date);
            let plain = label(&line);
            let padding = " ".repeat(op_w.saturating_sub(plain.len()));

            let colored_op = color_for_operation(&line.operation)
                .paint(line.operation.as_str())
                .to_string();
            let rest = if line.target.is_empty() {
                String::new()
            } else {
                format!(" ({})", short_target(&line.target))
            };

            println!(
                "{:<date_w$} | {}{}{} => {}",
                date, colored_op, rest, padding, line.message
            );
        }

        Ok(())
    }
}

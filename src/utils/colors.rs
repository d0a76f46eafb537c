/// ANSI color helper utilities for terminal output.
pub const RESET: &str = "\x1b[0m";
pub const BOLD: &str = "\x1b[1m";

pub const GREY: &str = "\x1b[90m";

pub const RED: &str = "\x1b[31m";
pub const GREEN: &str = "\x1b[32m";
pub const YELLOW: &str = "\x1b[33m";
pub const BLUE: &str = "\x1b[34m";
pub const CYAN: &str = "\x1b[36m";

/// Colorize a sent/unsent marker: green when delivered, yellow when pending.
pub fn colorize_sent(value: &str, sent: bool) -> String {
    if sent {
        format!("{GREEN}{value}{RESET}")
    } else {
        format!("{YELLOW}{value}{RESET}")
    }
}

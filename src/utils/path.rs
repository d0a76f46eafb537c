//! Path helpers for values coming from the config file.

use std::path::PathBuf;

/// Expand a leading `~/` to the user's home directory, so a configured
/// `database: ~/punches.sqlite` lands where the operator expects it.
/// Anything else passes through untouched.
pub fn expand_tilde(path: &str) -> PathBuf {
    if path.starts_with("~/")
        && let Some(home) = dirs::home_dir()
    {
        return home.join(path.trim_start_matches("~/"));
    }
    PathBuf::from(path)
}

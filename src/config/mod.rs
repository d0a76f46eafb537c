use crate::errors::{AppError, AppResult};
use crate::utils::path::expand_tilde;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::str::FromStr;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Host or IP address of the attendance terminal
    #[serde(default = "default_device_host")]
    pub device_host: String,
    #[serde(default = "default_device_port")]
    pub device_port: u16,
    /// Socket timeout towards the terminal, in seconds
    #[serde(default = "default_device_timeout_secs")]
    pub device_timeout_secs: u64,
    /// How many connection attempts before giving up a pull
    #[serde(default = "default_fetch_retries")]
    pub fetch_retries: u32,
    /// Pause between connection attempts, in milliseconds
    #[serde(default = "default_fetch_retry_delay_ms")]
    pub fetch_retry_delay_ms: u64,
    /// Path of the SQLite outbox database
    #[serde(default = "default_database")]
    pub database: String,
    /// Endpoint receiving the attendance events
    #[serde(default = "default_api_url")]
    pub api_url: String,
    /// Shared secret sent along with every event; empty = omitted
    #[serde(default)]
    pub api_secret: String,
    /// Wipe the terminal log after a fully successful push
    #[serde(default)]
    pub clear_device_log: bool,
    /// Maximum number of events pushed per run
    #[serde(default = "default_batch_limit")]
    pub batch_limit: u32,
    #[serde(default = "default_http_timeout_secs")]
    pub http_timeout_secs: u64,
    /// Attempts per event on transient HTTP failures
    #[serde(default = "default_http_retries")]
    pub http_retries: u32,
    /// Base pause between HTTP attempts, grows linearly, in milliseconds
    #[serde(default = "default_http_retry_base_ms")]
    pub http_retry_base_ms: u64,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Field names probed, in order, for the subject identifier
    #[serde(default = "default_subject_keys")]
    pub subject_keys: Vec<String>,
    /// Field names probed, in order, for the event timestamp
    #[serde(default = "default_time_keys")]
    pub time_keys: Vec<String>,
}

fn default_device_host() -> String {
    "192.168.1.201".to_string()
}
fn default_device_port() -> u16 {
    4370
}
fn default_device_timeout_secs() -> u64 {
    12
}
fn default_fetch_retries() -> u32 {
    3
}
fn default_fetch_retry_delay_ms() -> u64 {
    1200
}
fn default_database() -> String {
    Config::database_file().to_string_lossy().to_string()
}
fn default_api_url() -> String {
    "http://localhost:8000/api/v1/attendance".to_string()
}
fn default_batch_limit() -> u32 {
    500
}
fn default_http_timeout_secs() -> u64 {
    15
}
fn default_http_retries() -> u32 {
    3
}
fn default_http_retry_base_ms() -> u64 {
    1000
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_subject_keys() -> Vec<String> {
    [
        "user_id",
        "userid",
        "uid",
        "user",
        "enrollNumber",
        "enroll_number",
        "pin",
        "PIN",
        "id",
        "UserID",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}
fn default_time_keys() -> Vec<String> {
    [
        "timestamp",
        "time",
        "record_time",
        "recordtime",
        "attTime",
        "checkTime",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            device_host: default_device_host(),
            device_port: default_device_port(),
            device_timeout_secs: default_device_timeout_secs(),
            fetch_retries: default_fetch_retries(),
            fetch_retry_delay_ms: default_fetch_retry_delay_ms(),
            database: default_database(),
            api_url: default_api_url(),
            api_secret: String::new(),
            clear_device_log: false,
            batch_limit: default_batch_limit(),
            http_timeout_secs: default_http_timeout_secs(),
            http_retries: default_http_retries(),
            http_retry_base_ms: default_http_retry_base_ms(),
            log_level: default_log_level(),
            subject_keys: default_subject_keys(),
            time_keys: default_time_keys(),
        }
    }
}

impl Config {
    /// Return the standard configuration directory depending on the platform
    pub fn config_dir() -> PathBuf {
        if cfg!(target_os = "windows") {
            let appdata = env::var("APPDATA").unwrap_or_else(|_| ".".to_string());
            PathBuf::from(appdata).join("attsync")
        } else {
            let home = env::var("HOME").unwrap_or_else(|_| ".".to_string());
            PathBuf::from(home).join(".attsync")
        }
    }

    /// Return the full path of the config file
    pub fn config_file() -> PathBuf {
        Self::config_dir().join("attsync.conf")
    }

    /// Return the full path of the SQLite database
    pub fn database_file() -> PathBuf {
        Self::config_dir().join("attendance.sqlite")
    }

    /// Load configuration from the default location, or defaults if absent.
    /// Environment overrides are applied on top of whatever was read.
    pub fn load() -> AppResult<Self> {
        Self::load_from(Self::config_file())
    }

    /// Load configuration from an explicit file path
    pub fn load_from<P: AsRef<Path>>(path: P) -> AppResult<Self> {
        let path = path.as_ref();

        let mut cfg: Config = if path.exists() {
            let content = fs::read_to_string(path).map_err(|_| AppError::ConfigLoad)?;
            serde_yaml::from_str(&content)
                .map_err(|e| AppError::Config(format!("{}: {e}", path.display())))?
        } else {
            Config::default()
        };

        cfg.apply_env()?;
        cfg.database = expand_tilde(&cfg.database).to_string_lossy().to_string();
        Ok(cfg)
    }

    /// Apply ATTSYNC_* environment overrides on top of the loaded values
    pub fn apply_env(&mut self) -> AppResult<()> {
        override_from_env(&mut self.device_host, "ATTSYNC_DEVICE_HOST")?;
        override_from_env(&mut self.device_port, "ATTSYNC_DEVICE_PORT")?;
        override_from_env(&mut self.device_timeout_secs, "ATTSYNC_DEVICE_TIMEOUT_SECS")?;
        override_from_env(&mut self.fetch_retries, "ATTSYNC_FETCH_RETRIES")?;
        override_from_env(&mut self.fetch_retry_delay_ms, "ATTSYNC_FETCH_RETRY_DELAY_MS")?;
        override_from_env(&mut self.database, "ATTSYNC_DB")?;
        override_from_env(&mut self.api_url, "ATTSYNC_API_URL")?;
        override_from_env(&mut self.api_secret, "ATTSYNC_API_SECRET")?;
        override_from_env(&mut self.batch_limit, "ATTSYNC_BATCH_LIMIT")?;
        override_from_env(&mut self.http_timeout_secs, "ATTSYNC_HTTP_TIMEOUT_SECS")?;
        override_from_env(&mut self.http_retries, "ATTSYNC_HTTP_RETRIES")?;
        override_from_env(&mut self.http_retry_base_ms, "ATTSYNC_HTTP_RETRY_BASE_MS")?;
        override_from_env(&mut self.log_level, "ATTSYNC_LOG_LEVEL")?;

        if let Ok(raw) = env::var("ATTSYNC_CLEAR_DEVICE_LOG") {
            self.clear_device_log =
                matches!(raw.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on");
        }

        Ok(())
    }

    /// Sanity-check the loaded values; returns one message per problem found
    pub fn check(&self) -> Vec<String> {
        let mut problems = Vec::new();

        if self.device_host.trim().is_empty() {
            problems.push("device_host is empty".to_string());
        }
        if self.api_url.trim().is_empty() {
            problems.push("api_url is empty".to_string());
        } else if !self.api_url.starts_with("http://") && !self.api_url.starts_with("https://") {
            problems.push(format!("api_url does not look like a URL: {}", self.api_url));
        }
        if self.batch_limit == 0 {
            problems.push("batch_limit must be at least 1".to_string());
        }
        if self.fetch_retries == 0 {
            problems.push("fetch_retries must be at least 1".to_string());
        }
        if self.http_retries == 0 {
            problems.push("http_retries must be at least 1".to_string());
        }
        if self.subject_keys.is_empty() {
            problems.push("subject_keys is empty, no record can be normalized".to_string());
        }
        if self.time_keys.is_empty() {
            problems.push("time_keys is empty, no record can be normalized".to_string());
        }

        problems
    }

    /// Initialize configuration and database files
    pub fn init_all(custom_name: Option<String>) -> AppResult<()> {
        let dir = Self::config_dir();
        fs::create_dir_all(&dir)?;

        // DB name: user provided or default
        let db_path = if let Some(name) = custom_name {
            let p = expand_tilde(&name);
            if p.is_absolute() {
                p
            } else {
                dir.join(p)
            }
        } else {
            Self::database_file()
        };

        let config = Config {
            database: db_path.to_string_lossy().to_string(),
            ..Config::default()
        };

        // Write config file
        let yaml = serde_yaml::to_string(&config).map_err(|_| AppError::ConfigSave)?;
        let mut file = fs::File::create(Self::config_file())?;
        file.write_all(yaml.as_bytes())?;
        println!("✅ Config file: {:?}", Self::config_file());

        // Create empty DB file if not exists
        if !db_path.exists() {
            fs::File::create(&db_path)?;
        }

        println!("✅ Database:    {:?}", db_path);

        Ok(())
    }
}

/// Replace `slot` with the parsed value of `var` when the variable is set.
/// Parse failures surface as configuration errors without echoing the value.
fn override_from_env<T>(slot: &mut T, var: &str) -> AppResult<()>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    if let Ok(raw) = env::var(var) {
        *slot = raw
            .parse()
            .map_err(|e| AppError::Config(format!("invalid value for {var}: {e}")))?;
    }
    Ok(())
}

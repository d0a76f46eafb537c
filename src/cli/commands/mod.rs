pub mod backup;
pub mod config;
pub mod db;
pub mod init;
pub mod list;
pub mod log;
pub mod pull;
pub mod send;
pub mod sync;

pub mod backoff;
pub mod colors;
pub mod path;

pub use backoff::Backoff;

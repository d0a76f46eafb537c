pub mod backup;
pub mod list;
pub mod log;
pub mod normalize;
pub mod sync;

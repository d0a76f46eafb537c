pub mod event;
pub mod outcome;
pub mod record;

pub use event::{AttendanceEvent, NormalizedEvent};
pub use outcome::DeliveryOutcome;
pub use record::{RawRecord, RawValue};

/// A persisted attendance punch.
///
/// One row in `attendance_events`. The pair (`subject_id`, `event_time`) is
/// unique across the table; `remote_id` doubles as the delivery marker and
/// is never cleared once set.
#[derive(Debug, Clone)]
pub struct AttendanceEvent {
    pub id: i64,
    pub subject_id: String,         // ⇔ attendance_events.subject_id (TEXT)
    pub event_time: String,         // ⇔ attendance_events.event_time (TEXT, ISO8601)
    pub remote_id: Option<String>,  // ⇔ attendance_events.remote_id (TEXT NULL)
    pub sent_at: Option<String>,    // ⇔ attendance_events.sent_at (TEXT NULL)
    pub created_at: String,         // ⇔ attendance_events.created_at
    pub updated_at: String,         // ⇔ attendance_events.updated_at
}

impl AttendanceEvent {
    pub fn is_sent(&self) -> bool {
        self.remote_id.is_some()
    }
}

/// A normalized (subject, time) pair produced by the normalizer and consumed
/// by the store's batch insert. Not persisted on its own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedEvent {
    pub subject_id: String,
    pub event_time: String,
}

impl NormalizedEvent {
    pub fn new(subject_id: impl Into<String>, event_time: impl Into<String>) -> Self {
        Self {
            subject_id: subject_id.into(),
            event_time: event_time.into(),
        }
    }
}

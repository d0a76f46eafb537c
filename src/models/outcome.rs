/// Classification of a single delivery attempt series against the remote API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// 2xx with a usable identifier: the event is recorded server-side.
    Delivered { remote_id: String },

    /// 409: the server already knows this event. Treated as delivered so the
    /// local row still gets its marker (placeholder id when the body has none).
    AlreadyKnown { remote_id: String },

    /// Permanent per-record failure (422, or a 2xx body with no identifier).
    /// Never retried within a run.
    Rejected { detail: String },

    /// Every attempt failed transiently (network error or unexpected status).
    /// The row stays unsent and is picked up again on the next run.
    Exhausted { attempts: u32, last_error: String },
}

impl DeliveryOutcome {
    /// The server identifier to persist, when the outcome counts as sent.
    pub fn remote_id(&self) -> Option<&str> {
        match self {
            DeliveryOutcome::Delivered { remote_id }
            | DeliveryOutcome::AlreadyKnown { remote_id } => Some(remote_id),
            _ => None,
        }
    }
}

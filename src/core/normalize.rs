use crate::config::Config;
use crate::models::{NormalizedEvent, RawRecord, RawValue};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

/// Field-probing rules used to turn heterogeneous terminal records into
/// normalized events. Keys are tried in order; firmware revisions disagree
/// wildly on what they call the subject and the timestamp.
#[derive(Debug, Clone)]
pub struct MapRules {
    pub subject_keys: Vec<String>,
    pub time_keys: Vec<String>,
}

impl Default for MapRules {
    fn default() -> Self {
        Config::default().into()
    }
}

impl From<Config> for MapRules {
    fn from(cfg: Config) -> Self {
        Self {
            subject_keys: cfg.subject_keys,
            time_keys: cfg.time_keys,
        }
    }
}

impl MapRules {
    pub fn from_config(cfg: &Config) -> Self {
        Self {
            subject_keys: cfg.subject_keys.clone(),
            time_keys: cfg.time_keys.clone(),
        }
    }
}

/// Normalize one raw terminal record, or discard it.
///
/// The subject is the first candidate field carrying a non-null value; a
/// null merely moves the probe to the next candidate. The timestamp field
/// is different: the first candidate key that is present wins outright,
/// even when its value turns out to be unusable.
pub fn normalize(record: &RawRecord, rules: &MapRules) -> Option<NormalizedEvent> {
    let mut subject: Option<String> = None;
    for key in &rules.subject_keys {
        if let Some(v) = record.get(key)
            && !v.is_null()
        {
            subject = v.to_subject_string();
            break;
        }
    }
    let subject = subject?;
    let subject = subject.trim();
    if subject.is_empty() {
        return None;
    }

    let mut time_value: Option<&RawValue> = None;
    for key in &rules.time_keys {
        if let Some(v) = record.get(key) {
            time_value = Some(v);
            break;
        }
    }

    let event_time = canonical_timestamp(time_value?)?;

    Some(NormalizedEvent::new(subject, event_time))
}

/// Reduce a raw timestamp value to the canonical form stored in the outbox.
///
/// Offset-aware strings are rewritten as RFC 3339 with an explicit offset.
/// Naive strings are kept naive; the terminal clock's zone is unknowable
/// here and guessing one would corrupt the data. Strings that match no
/// known shape pass through trimmed, so the server still gets a chance to
/// interpret them. Epoch numbers become UTC instants.
pub fn canonical_timestamp(value: &RawValue) -> Option<String> {
    const NAIVE_OUT: &str = "%Y-%m-%dT%H:%M:%S";

    match value {
        RawValue::Null => None,
        RawValue::Time(t) => Some(t.format(NAIVE_OUT).to_string()),
        RawValue::Int(secs) => {
            let dt = DateTime::<Utc>::from_timestamp(*secs, 0)?;
            Some(format!("{}Z", dt.format(NAIVE_OUT)))
        }
        RawValue::Float(secs) => {
            if !secs.is_finite() {
                return None;
            }
            // Sub-second precision is dropped, terminals do not keep it.
            let dt = DateTime::<Utc>::from_timestamp(*secs as i64, 0)?;
            Some(format!("{}Z", dt.format(NAIVE_OUT)))
        }
        RawValue::Text(raw) => {
            let raw = raw.trim();
            if raw.is_empty() {
                return None;
            }

            if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
                return Some(dt.to_rfc3339());
            }

            const NAIVE_IN: [&str; 4] = [
                "%Y-%m-%dT%H:%M:%S%.f",
                "%Y-%m-%d %H:%M:%S%.f",
                "%Y-%m-%dT%H:%M",
                "%Y-%m-%d %H:%M",
            ];
            for fmt in NAIVE_IN {
                if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
                    return Some(dt.format(NAIVE_OUT).to_string());
                }
            }

            if let Ok(d) = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                && let Some(dt) = d.and_hms_opt(0, 0, 0)
            {
                return Some(dt.format(NAIVE_OUT).to_string());
            }

            // Unrecognized shape: hand it over as-is rather than losing
            // the punch. The receiving side may know this firmware.
            Some(raw.to_string())
        }
    }
}

/// Normalize a whole pull, silently dropping unusable records.
pub fn normalize_all(records: &[RawRecord], rules: &MapRules) -> Vec<NormalizedEvent> {
    records
        .iter()
        .filter_map(|r| normalize(r, rules))
        .collect()
}

use crate::config::Config;
use crate::errors::{AppError, AppResult};
use crate::models::{DeliveryOutcome, NormalizedEvent};
use crate::utils::Backoff;
use reqwest::StatusCode;
use reqwest::blocking::Client;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use serde_json::Value;
use std::time::Duration;

/// Blocking client for the attendance intake endpoint.
///
/// One POST per event. The server is the authority on duplicates and
/// validity; this client only classifies its answers and paces retries,
/// it never decides on its own that an event made it across.
pub struct ApiClient {
    http: Client,
    url: String,
    secret: String,
    retries: u32,
    backoff: Backoff,
}

enum Attempt {
    Final(DeliveryOutcome),
    Transient(String),
}

impl ApiClient {
    pub fn from_config(cfg: &Config) -> AppResult<Self> {
        if cfg.api_url.trim().is_empty() {
            return Err(AppError::Config("api_url is not configured".to_string()));
        }

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let http = Client::builder()
            .timeout(Duration::from_secs(cfg.http_timeout_secs))
            .default_headers(headers)
            .user_agent(concat!("attsync/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            url: cfg.api_url.clone(),
            secret: cfg.api_secret.clone(),
            retries: cfg.http_retries.max(1),
            backoff: Backoff::linear(Duration::from_millis(cfg.http_retry_base_ms)),
        })
    }

    /// Deliver one event, retrying transient failures.
    ///
    /// Every failure mode comes back as an outcome rather than an error:
    /// the push loop decides what an outcome means for the outbox row.
    pub fn deliver(&self, event: &NormalizedEvent) -> DeliveryOutcome {
        let mut payload = serde_json::json!({
            "subject_id": event.subject_id,
            "time": event.event_time,
        });
        if !self.secret.is_empty() {
            payload["shared_secret"] = Value::String(self.secret.clone());
        }

        let mut last_error = String::new();
        for attempt in 1..=self.retries {
            match self.post_once(&payload) {
                Attempt::Final(outcome) => return outcome,
                Attempt::Transient(detail) => {
                    log::warn!(
                        "delivery attempt {attempt}/{} failed: {detail}",
                        self.retries
                    );
                    last_error = detail;
                }
            }
            if attempt < self.retries {
                self.backoff.wait_after(attempt);
            }
        }

        DeliveryOutcome::Exhausted {
            attempts: self.retries,
            last_error,
        }
    }

    fn post_once(&self, payload: &Value) -> Attempt {
        let response = match self.http.post(&self.url).json(payload).send() {
            Ok(r) => r,
            Err(e) => return Attempt::Transient(format!("request failed: {e}")),
        };

        let status = response.status();
        let body = response.text().unwrap_or_default();

        if status.is_success() {
            return match extract_remote_id(&body) {
                Some(id) => Attempt::Final(DeliveryOutcome::Delivered { remote_id: id }),
                // A success without an identifier cannot be marked sent;
                // leaving the row pending is the safe reading of it.
                None => Attempt::Final(DeliveryOutcome::Rejected {
                    detail: format!("{status} response carried no identifier"),
                }),
            };
        }

        match status {
            StatusCode::CONFLICT => {
                // A conflict identifier must come out of the JSON document;
                // free-text bodies get the placeholder.
                let remote_id = json_remote_id(&body).unwrap_or_else(|| "DUPLICATE".to_string());
                Attempt::Final(DeliveryOutcome::AlreadyKnown { remote_id })
            }
            StatusCode::UNPROCESSABLE_ENTITY => Attempt::Final(DeliveryOutcome::Rejected {
                detail: format!("{status}: {}", short_body(&body)),
            }),
            _ => Attempt::Transient(format!("server answered {status}")),
        }
    }
}

/// Pull the server-side identifier out of a success body.
///
/// Prefers the JSON fields `res_id` then `id`; otherwise the trimmed raw
/// body stands in, some deployments answer with a bare identifier.
fn extract_remote_id(body: &str) -> Option<String> {
    if let Some(id) = json_remote_id(body) {
        return Some(id);
    }

    let raw = body.trim();
    if raw.is_empty() {
        None
    } else {
        Some(raw.to_string())
    }
}

/// Identifier from a JSON body, `res_id` preferred over `id`.
fn json_remote_id(body: &str) -> Option<String> {
    let json = serde_json::from_str::<Value>(body).ok()?;
    for key in ["res_id", "id"] {
        match json.get(key) {
            Some(Value::String(s)) if !s.trim().is_empty() => {
                return Some(s.trim().to_string());
            }
            Some(Value::Number(n)) => return Some(n.to_string()),
            _ => {}
        }
    }
    None
}

/// Keep rejection details log-sized.
fn short_body(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.chars().count() > 300 {
        let mut s: String = trimmed.chars().take(300).collect();
        s.push_str("...");
        s
    } else {
        trimmed.to_string()
    }
}

use attsync::api::ApiClient;
use attsync::models::{DeliveryOutcome, NormalizedEvent};

mod common;
use common::{StubResponse, dead_url, spawn_stub, test_config};

fn event() -> NormalizedEvent {
    NormalizedEvent::new("7", "2025-03-01T08:00:00")
}

fn client_for(url: &str, retries: u32) -> ApiClient {
    let cfg = test_config("unused.sqlite", url, retries);
    ApiClient::from_config(&cfg).expect("build client")
}

#[test]
fn test_created_with_res_id_is_delivered() {
    let stub = spawn_stub(vec![StubResponse::new(201, r#"{"res_id": "srv-101"}"#)]);
    let client = client_for(&stub.url, 3);

    let outcome = client.deliver(&event());
    assert_eq!(
        outcome,
        DeliveryOutcome::Delivered {
            remote_id: "srv-101".to_string()
        }
    );

    let bodies = stub.finish();
    assert_eq!(bodies.len(), 1);
    assert!(bodies[0].contains(r#""subject_id":"7""#));
    assert!(bodies[0].contains(r#""time":"2025-03-01T08:00:00""#));
    assert!(
        !bodies[0].contains("shared_secret"),
        "no secret configured, none must be sent"
    );
}

#[test]
fn test_numeric_id_field_is_accepted() {
    let stub = spawn_stub(vec![StubResponse::new(200, r#"{"id": 77}"#)]);
    let client = client_for(&stub.url, 3);

    let outcome = client.deliver(&event());
    assert_eq!(outcome.remote_id(), Some("77"));
}

#[test]
fn test_bare_body_stands_in_as_identifier() {
    // Some deployments answer 200 with just the record id as text
    let stub = spawn_stub(vec![StubResponse::new(200, "555")]);
    let client = client_for(&stub.url, 3);

    let outcome = client.deliver(&event());
    assert_eq!(
        outcome,
        DeliveryOutcome::Delivered {
            remote_id: "555".to_string()
        }
    );
}

#[test]
fn test_success_without_identifier_is_rejected() {
    let stub = spawn_stub(vec![StubResponse::new(200, "")]);
    let client = client_for(&stub.url, 3);

    let outcome = client.deliver(&event());
    match outcome {
        DeliveryOutcome::Rejected { detail } => {
            assert!(detail.contains("no identifier"), "detail was: {detail}")
        }
        other => panic!("expected Rejected, got {other:?}"),
    }
    // One scripted response, one request: no retry on this outcome
    assert_eq!(stub.finish().len(), 1);
}

#[test]
fn test_conflict_with_id_is_already_known() {
    let stub = spawn_stub(vec![StubResponse::new(409, r#"{"id": "srv-9"}"#)]);
    let client = client_for(&stub.url, 3);

    let outcome = client.deliver(&event());
    assert_eq!(
        outcome,
        DeliveryOutcome::AlreadyKnown {
            remote_id: "srv-9".to_string()
        }
    );
}

#[test]
fn test_conflict_without_id_uses_duplicate_marker() {
    let stub = spawn_stub(vec![StubResponse::new(409, "")]);
    let client = client_for(&stub.url, 3);

    let outcome = client.deliver(&event());
    assert_eq!(
        outcome,
        DeliveryOutcome::AlreadyKnown {
            remote_id: "DUPLICATE".to_string()
        }
    );
}

#[test]
fn test_conflict_with_free_text_body_still_uses_duplicate_marker() {
    // Unlike a 2xx body, conflict text never stands in as the identifier
    let stub = spawn_stub(vec![StubResponse::new(409, "record already on file")]);
    let client = client_for(&stub.url, 3);

    let outcome = client.deliver(&event());
    assert_eq!(
        outcome,
        DeliveryOutcome::AlreadyKnown {
            remote_id: "DUPLICATE".to_string()
        }
    );
}

#[test]
fn test_validation_failure_is_final_after_one_attempt() {
    let stub = spawn_stub(vec![StubResponse::new(
        422,
        r#"{"detail": "time is unparseable"}"#,
    )]);
    let client = client_for(&stub.url, 5);

    let outcome = client.deliver(&event());
    match outcome {
        DeliveryOutcome::Rejected { detail } => {
            assert!(detail.contains("422"), "detail was: {detail}");
            assert!(detail.contains("unparseable"), "detail was: {detail}");
        }
        other => panic!("expected Rejected, got {other:?}"),
    }

    let bodies = stub.finish();
    assert_eq!(bodies.len(), 1, "422 must not be retried");
}

#[test]
fn test_server_errors_exhaust_the_retry_budget() {
    let stub = spawn_stub(vec![
        StubResponse::new(500, "boom"),
        StubResponse::new(503, "still down"),
    ]);
    let client = client_for(&stub.url, 2);

    let outcome = client.deliver(&event());
    match outcome {
        DeliveryOutcome::Exhausted {
            attempts,
            last_error,
        } => {
            assert_eq!(attempts, 2);
            assert!(last_error.contains("503"), "last error was: {last_error}");
        }
        other => panic!("expected Exhausted, got {other:?}"),
    }

    assert_eq!(stub.finish().len(), 2);
}

#[test]
fn test_unreachable_server_exhausts_without_panicking() {
    let client = client_for(&dead_url(), 2);

    let outcome = client.deliver(&event());
    match outcome {
        DeliveryOutcome::Exhausted { attempts, .. } => assert_eq!(attempts, 2),
        other => panic!("expected Exhausted, got {other:?}"),
    }
}

#[test]
fn test_shared_secret_rides_along_when_configured() {
    let stub = spawn_stub(vec![StubResponse::new(200, r#"{"res_id": "1"}"#)]);
    let mut cfg = test_config("unused.sqlite", &stub.url, 2);
    cfg.api_secret = "hunter2".to_string();
    let client = ApiClient::from_config(&cfg).expect("build client");

    client.deliver(&event());

    let bodies = stub.finish();
    assert!(bodies[0].contains(r#""shared_secret":"hunter2""#));
}

#[test]
fn test_blank_api_url_refuses_to_build() {
    let cfg = test_config("unused.sqlite", "   ", 1);
    assert!(ApiClient::from_config(&cfg).is_err());
}

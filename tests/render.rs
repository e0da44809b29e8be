mod support;

use flapi::connection::BusyPolicy;
use flapi::models::deliverable::RenderDeliverable;
use flapi::models::options::NewSceneOptions;
use flapi::models::status::OpStatus;
use flapi::poller::{wait_for_render, CancelToken, PollOptions};
use flapi::{Config, Connection, FlapiError};
use serde_json::json;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use support::{err, handle, method, ok, MockService};

const SETUP_ID: i64 = 201;
const SCENE_ID: i64 = 202;
const PROCESSOR_ID: i64 = 301;

fn scene_options() -> NewSceneOptions {
    NewSceneOptions {
        format: "HD 1920x1080".to_owned(),
        colourspace: "ACES_lin".to_owned(),
        ..Default::default()
    }
}

/// Responder for a well-behaved render: two Active polls, then Done.
fn render_responder() -> impl FnMut(&serde_json::Value) -> serde_json::Value + Send + 'static {
    let mut polls = 0;
    move |request| match method(request) {
        "connect" => ok(json!(1)),
        "forget" => ok(json!(null)),
        "Scene.temporary_scene" => ok(handle("Scene", SCENE_ID)),
        "RenderSetup.create" => ok(handle("RenderSetup", SETUP_ID)),
        "RenderSetup.set_scene" => ok(json!(null)),
        "RenderSetup.add_deliverable" => ok(json!(null)),
        "RenderProcessor.get" => ok(handle("RenderProcessor", PROCESSOR_ID)),
        "RenderProcessor.start" => ok(json!(null)),
        "RenderProcessor.get_progress" => {
            polls += 1;
            if polls <= 2 {
                ok(json!({
                    "Status": "Active",
                    "Total": 48,
                    "Complete": 16 * polls,
                    "Remaining": 48 - 16 * polls,
                    "Progress": polls as f64 / 3.0,
                }))
            } else {
                ok(json!({
                    "Status": "Done",
                    "Total": 48,
                    "Complete": 48,
                    "Remaining": 0,
                    "Failed": 0,
                    "Progress": 1.0,
                }))
            }
        }
        "RenderProcessor.get_log" => ok(json!([
            { "Message": "Render complete", "Detail": "48 frames" }
        ])),
        other => err(1, other),
    }
}

#[test]
fn render_pipeline_reaches_done() {
    let service = MockService::spawn(render_responder());
    let mut conn = Connection::connect(&service.config()).unwrap();

    let scene = conn.temporary_scene(&scene_options()).unwrap();
    let setup = conn.create_render_setup().unwrap();
    conn.render_set_scene(&setup, &scene).unwrap();
    conn.add_deliverable(&setup, &RenderDeliverable::default())
        .unwrap();

    let processor = conn.render_processor().unwrap();
    conn.start_render(&processor, &setup).unwrap();

    let mut seen = Vec::new();
    let outcome = wait_for_render(
        &mut conn,
        &processor,
        &PollOptions::with_interval(Duration::from_millis(20)),
        |status| seen.push(status.clone()),
    )
    .unwrap();

    assert_eq!(outcome.status.status, OpStatus::Done);
    assert_eq!(outcome.status.complete, outcome.status.total);
    assert_eq!(outcome.status.failed, 0);
    assert!(outcome.status.error.is_none());
    assert_eq!(outcome.log.len(), 1);
    assert_eq!(seen.len(), 2); // the two Active snapshots

    // The log is fetched exactly once, after the terminal state.
    assert_eq!(service.requests_for("RenderProcessor.get_log").len(), 1);
    conn.close();
}

#[test]
fn processor_handle_is_cached() {
    let service = MockService::spawn(render_responder());
    let mut conn = Connection::connect(&service.config()).unwrap();

    let first = conn.render_processor().unwrap();
    let second = conn.render_processor().unwrap();
    assert_eq!(first, second);
    assert_eq!(service.requests_for("RenderProcessor.get").len(), 1);
    conn.close();
}

#[test]
fn incomplete_scene_options_never_reach_the_server() {
    let service = MockService::spawn(render_responder());
    let mut conn = Connection::connect(&service.config()).unwrap();

    let options = NewSceneOptions {
        colourspace: "ACES_lin".to_owned(),
        ..Default::default()
    };
    assert!(matches!(
        conn.temporary_scene(&options),
        Err(FlapiError::InvalidOptions(_))
    ));
    assert!(service.requests_for("Scene.temporary_scene").is_empty());
    conn.close();
}

#[test]
fn wrong_handle_tag_is_rejected_client_side() {
    let service = MockService::spawn(render_responder());
    let mut conn = Connection::connect(&service.config()).unwrap();

    let setup = conn.create_render_setup().unwrap();
    match conn.render_set_scene(&setup, &setup) {
        Err(FlapiError::TypeMismatch { .. }) => {}
        other => panic!("expected type mismatch, got {:?}", other),
    }
    assert!(service.requests_for("RenderSetup.set_scene").is_empty());
    conn.close();
}

#[test]
fn busy_processor_is_rejected_by_default() {
    let service = MockService::spawn(|request| match method(request) {
        "connect" => ok(json!(1)),
        "forget" => ok(json!(null)),
        "RenderSetup.create" => ok(handle("RenderSetup", SETUP_ID)),
        "RenderProcessor.get" => ok(handle("RenderProcessor", PROCESSOR_ID)),
        "RenderProcessor.start" => err(409, "processor is busy"),
        other => err(1, other),
    });

    let mut conn = Connection::connect(&service.config()).unwrap();
    let setup = conn.create_render_setup().unwrap();
    let processor = conn.render_processor().unwrap();
    assert!(matches!(
        conn.start_render(&processor, &setup),
        Err(FlapiError::AlreadyRunning)
    ));
    conn.close();
}

#[test]
fn preempt_policy_stops_then_restarts() {
    let service = MockService::spawn({
        let mut starts = 0;
        move |request| match method(request) {
            "connect" => ok(json!(1)),
            "forget" => ok(json!(null)),
            "RenderSetup.create" => ok(handle("RenderSetup", SETUP_ID)),
            "RenderProcessor.get" => ok(handle("RenderProcessor", PROCESSOR_ID)),
            "RenderProcessor.stop" => ok(json!(null)),
            "RenderProcessor.start" => {
                starts += 1;
                if starts == 1 {
                    err(409, "processor is busy")
                } else {
                    ok(json!(null))
                }
            }
            other => err(1, other),
        }
    });

    let config = Config {
        busy_policy: BusyPolicy::Preempt,
        ..service.config()
    };
    let mut conn = Connection::connect(&config).unwrap();
    let setup = conn.create_render_setup().unwrap();
    let processor = conn.render_processor().unwrap();
    conn.start_render(&processor, &setup).unwrap();

    assert_eq!(service.requests_for("RenderProcessor.stop").len(), 1);
    assert_eq!(service.requests_for("RenderProcessor.start").len(), 2);
    conn.close();
}

#[test]
fn poller_respects_the_interval() {
    let interval = Duration::from_millis(50);
    let arrivals: Arc<Mutex<Vec<Instant>>> = Arc::new(Mutex::new(Vec::new()));
    let service = MockService::spawn({
        let arrivals = arrivals.clone();
        let mut polls = 0;
        move |request| match method(request) {
            "connect" => ok(json!(1)),
            "forget" => ok(json!(null)),
            "RenderProcessor.get" => ok(handle("RenderProcessor", PROCESSOR_ID)),
            "RenderProcessor.get_progress" => {
                arrivals.lock().unwrap().push(Instant::now());
                polls += 1;
                if polls < 3 {
                    ok(json!({ "Status": "Active", "Total": 10, "Complete": polls }))
                } else {
                    ok(json!({ "Status": "Done", "Total": 10, "Complete": 10 }))
                }
            }
            "RenderProcessor.get_log" => ok(json!([])),
            other => err(1, other),
        }
    });

    let mut conn = Connection::connect(&service.config()).unwrap();
    let processor = conn.render_processor().unwrap();
    wait_for_render(&mut conn, &processor, &PollOptions::with_interval(interval), |_| {})
        .unwrap();
    conn.close();

    let arrivals = arrivals.lock().unwrap();
    assert_eq!(arrivals.len(), 3);
    for pair in arrivals.windows(2) {
        assert!(
            pair[1] - pair[0] >= interval,
            "status calls closer together than the polling interval"
        );
    }
}

#[test]
fn cancelled_token_stops_the_poller() {
    let service = MockService::spawn(|request| match method(request) {
        "connect" => ok(json!(1)),
        "forget" => ok(json!(null)),
        "RenderProcessor.get" => ok(handle("RenderProcessor", PROCESSOR_ID)),
        "RenderProcessor.get_progress" => {
            ok(json!({ "Status": "Active", "Total": 10, "Complete": 1 }))
        }
        other => err(1, other),
    });

    let mut conn = Connection::connect(&service.config()).unwrap();
    let processor = conn.render_processor().unwrap();

    let token = CancelToken::new();
    token.cancel();
    let options = PollOptions {
        interval: Duration::from_millis(20),
        deadline: None,
        cancel: Some(token),
    };
    match wait_for_render(&mut conn, &processor, &options, |_| {}) {
        Err(FlapiError::Cancelled) => {}
        other => panic!("expected cancelled, got {:?}", other.map(|_| ())),
    }
    // Cancellation is checked before the wait, so only one status call.
    assert_eq!(service.requests_for("RenderProcessor.get_progress").len(), 1);
    conn.close();
}

#[test]
fn deadline_turns_into_timeout() {
    let service = MockService::spawn(|request| match method(request) {
        "connect" => ok(json!(1)),
        "forget" => ok(json!(null)),
        "RenderProcessor.get" => ok(handle("RenderProcessor", PROCESSOR_ID)),
        "RenderProcessor.get_progress" => {
            ok(json!({ "Status": "Queued", "Total": 10, "Complete": 0 }))
        }
        other => err(1, other),
    });

    let mut conn = Connection::connect(&service.config()).unwrap();
    let processor = conn.render_processor().unwrap();

    let options = PollOptions {
        interval: Duration::from_millis(30),
        deadline: Some(Duration::from_millis(100)),
        cancel: None,
    };
    match wait_for_render(&mut conn, &processor, &options, |_| {}) {
        Err(FlapiError::Timeout) => {}
        other => panic!("expected timeout, got {:?}", other.map(|_| ())),
    }
    conn.close();
}

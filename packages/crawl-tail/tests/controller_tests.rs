//! Start/tail orchestration tests.
//!
//! Most tests drive the controller with the scripted client and an instant
//! sleeper; the last section runs a full job against a mock HTTP backend.

use std::time::Duration;

use crawl_tail::testing::{InstantSleeper, MockJobClient};
use crawl_tail::{
    Cursor, CursorKind, HttpJobClient, JobConfig, JobController, JobPreset, JobStatus, LogBatch,
    LogView, LoopState, Placeholder, StartAck, StartError, StatusPanel, TailError, TailExit,
    TailResponse, TickOutcome,
};
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn job_offset_config() -> JobConfig {
    JobPreset::VrainSelenium
        .config("http://localhost:8000")
        .unwrap()
        .with_poll_interval(Duration::from_millis(900))
}

fn since_config() -> JobConfig {
    JobPreset::VrainHtml.config("http://localhost:8000").unwrap()
}

fn controller(
    config: &JobConfig,
    client: MockJobClient,
) -> JobController<MockJobClient, LogView, StatusPanel> {
    JobController::new(
        config,
        client,
        LogView::new(config.max_log_lines),
        StatusPanel::default(),
    )
}

fn job(offset: u64) -> Cursor {
    Cursor::JobHandle {
        job_id: "J1".to_string(),
        offset,
    }
}

// =============================================================================
// Tail scenarios
// =============================================================================

#[tokio::test]
async fn lines_render_and_next_tail_uses_returned_offset() {
    let client = MockJobClient::new()
        .with_job_id("J1")
        .with_lines(&["a", "b"], job(12), true);
    let controller = controller(&job_offset_config(), client);

    let run = controller.start().await.expect("start succeeds");
    assert_eq!(run.poll_once().await, TickOutcome::Continue);
    assert_eq!(run.poll_once().await, TickOutcome::Continue);

    controller.with_renderer(|view| assert_eq!(view.lines(), vec!["a", "b"]));
    assert_eq!(controller.client().tail_calls(), vec![job(0), job(12)]);
    assert_eq!(controller.cursor(), Some(job(12)));
}

#[tokio::test]
async fn empty_batch_keeps_placeholder_and_busy_indicator() {
    let client = MockJobClient::new().with_lines(&[], Cursor::SinceToken(0), true);
    let controller = controller(&since_config(), client);

    let run = controller.start().await.unwrap();
    assert_eq!(run.poll_once().await, TickOutcome::Continue);

    controller.with_renderer(|view| {
        assert!(view.lines().is_empty());
        assert_eq!(view.placeholder(), Some(Placeholder::Waiting));
    });
    controller.with_reflector(|panel| {
        assert!(panel.spinner_visible);
        assert!(panel.start_disabled);
    });
}

#[tokio::test]
async fn finished_job_stops_loop_and_reenables_start() {
    let client = MockJobClient::new()
        .with_lines(&["working"], Cursor::SinceToken(1), true)
        .with_lines(&["done"], Cursor::SinceToken(2), false);
    let controller = controller(&since_config(), client);
    let sleeper = InstantSleeper::new();

    let run = controller.start().await.unwrap();
    let exit = run.run(sleeper.clone()).await;

    assert_eq!(exit, TailExit::Completed);
    assert_eq!(controller.state(), LoopState::Stopped);
    controller.with_renderer(|view| assert_eq!(view.lines(), vec!["working", "done"]));
    controller.with_reflector(|panel| {
        assert!(!panel.spinner_visible);
        assert!(!panel.start_disabled);
    });
    assert_eq!(controller.client().tail_calls().len(), 2);
    assert_eq!(sleeper.waits(), vec![Duration::from_millis(900)]);
}

#[tokio::test]
async fn run_polls_immediately_then_once_per_interval() {
    let client = MockJobClient::new()
        .with_lines(&[], Cursor::SinceToken(0), true)
        .with_lines(&[], Cursor::SinceToken(0), true)
        .with_lines(&[], Cursor::SinceToken(0), true)
        .with_lines(&["bye"], Cursor::SinceToken(1), false);
    let config = since_config().with_poll_interval(Duration::from_millis(250));
    let controller = controller(&config, client);
    let sleeper = InstantSleeper::new();

    let run = controller.start().await.unwrap();
    run.run(sleeper.clone()).await;

    assert_eq!(controller.client().tail_calls().len(), 4);
    assert_eq!(sleeper.waits(), vec![Duration::from_millis(250); 3]);
}

#[tokio::test]
async fn tail_failure_renders_error_line_and_retries_same_cursor() {
    let client = MockJobClient::new()
        .with_job_id("J1")
        .with_tail(Err(TailError::Status { status: 503 }))
        .with_lines(&["recovered"], job(4), false);
    let controller = controller(&job_offset_config(), client);

    let run = controller.start().await.unwrap();
    let exit = run.run(InstantSleeper::new()).await;

    assert_eq!(exit, TailExit::Completed);
    controller.with_renderer(|view| {
        assert_eq!(view.lines(), vec!["[ERROR] HTTP 503", "recovered"]);
    });
    assert_eq!(controller.client().tail_calls(), vec![job(0), job(0)]);
}

#[tokio::test]
async fn first_poll_updates_output_size() {
    let client = MockJobClient::new().with_tail(Ok(TailResponse {
        batch: LogBatch {
            lines: vec!["Saved 40 rows".to_string()],
            next_cursor: Cursor::SinceToken(1),
        },
        status: JobStatus {
            running: true,
            last_output_size_mb: Some(1.5),
            ..JobStatus::default()
        },
    }));
    let controller = controller(&since_config(), client);

    let run = controller.start().await.unwrap();
    run.poll_once().await;

    controller.with_reflector(|panel| assert_eq!(panel.output_size, "1.5 MB"));
}

// =============================================================================
// Start handling
// =============================================================================

#[tokio::test]
async fn start_failure_reverts_to_idle_without_tailing() {
    let client = MockJobClient::new().with_start(Err(StartError::BadResponse(
        "HTTP 500: <h1>Server Error</h1>".to_string(),
    )));
    let controller = controller(&job_offset_config(), client);

    let err = controller.start().await.err().expect("start fails");

    assert!(matches!(err, StartError::BadResponse(_)));
    assert_eq!(controller.state(), LoopState::Idle);
    assert!(controller.client().tail_calls().is_empty());
    controller.with_reflector(|panel| {
        assert!(!panel.spinner_visible);
        assert!(!panel.start_disabled);
        let error = panel.error.as_deref().unwrap();
        assert!(error.starts_with("Start crawl failed:"), "got {}", error);
    });
}

#[tokio::test]
async fn job_offset_start_without_job_id_is_a_failure() {
    let client = MockJobClient::new().with_start(Ok(Default::default()));
    let controller = controller(&job_offset_config(), client);

    let err = controller.start().await.err().expect("start fails");

    assert!(matches!(err, StartError::BadResponse(_)));
    assert_eq!(controller.state(), LoopState::Idle);
    controller.with_reflector(|panel| assert!(!panel.start_disabled));
}

#[tokio::test]
async fn missing_start_endpoint_sends_no_request() {
    let config = JobConfig::new(
        "tail only",
        url::Url::parse("http://localhost:8000/logs/tail/").unwrap(),
    );
    let controller = controller(&config, MockJobClient::new());

    let err = controller.start().await.err().expect("start fails");

    assert!(matches!(err, StartError::NotConfigured));
    assert_eq!(controller.client().start_calls(), 0);
    controller.with_reflector(|panel| {
        assert_eq!(panel.error.as_deref(), Some("Start endpoint is not configured."));
        assert!(!panel.spinner_visible);
    });
}

#[tokio::test]
async fn restart_supersedes_previous_run() {
    let client = MockJobClient::new()
        .with_job_id("J1")
        .with_job_id("J2")
        .with_lines(&["from J1"], job(3), true);
    let controller = controller(&job_offset_config(), client);

    let first = controller.start().await.unwrap();
    assert_eq!(first.poll_once().await, TickOutcome::Continue);

    let second = controller.start().await.unwrap();
    assert!(second.generation() > first.generation());

    // The old run exits without issuing another request
    assert_eq!(first.poll_once().await, TickOutcome::Superseded);
    assert_eq!(controller.client().tail_calls().len(), 1);

    second.poll_once().await;
    let calls = controller.client().tail_calls();
    assert_eq!(
        calls.last(),
        Some(&Cursor::JobHandle {
            job_id: "J2".to_string(),
            offset: 0
        })
    );

    // A restart resets the view to the waiting placeholder
    controller.with_renderer(|view| assert!(view.lines().is_empty()));
    assert_eq!(controller.client().start_calls(), 2);
}

#[tokio::test]
async fn rejected_restart_keeps_live_run_polling() {
    let client = MockJobClient::new()
        .with_job_id("J1")
        .with_start(Err(StartError::Rejected(
            "Job is already running.".to_string(),
        )))
        .with_lines(&["page 1"], job(3), true)
        .with_lines(&["page 2"], job(5), true);
    let controller = controller(&job_offset_config(), client);

    let run = controller.start().await.unwrap();
    assert_eq!(run.poll_once().await, TickOutcome::Continue);
    let generation = controller.generation();

    let err = controller.start().await.err().expect("restart is rejected");
    assert_eq!(err.to_string(), "Job is already running.");

    assert_eq!(controller.state(), LoopState::Polling);
    assert_eq!(controller.generation(), generation);
    controller.with_reflector(|panel| {
        assert!(panel.spinner_visible);
        assert!(panel.start_disabled);
        assert_eq!(
            panel.error.as_deref(),
            Some("Start crawl failed: Job is already running.")
        );
    });

    // The running job's tail carries on from where it was
    assert_eq!(run.poll_once().await, TickOutcome::Continue);
    assert_eq!(controller.client().tail_calls(), vec![job(0), job(3)]);
    controller.with_renderer(|view| assert_eq!(view.lines(), vec!["page 1", "page 2"]));
}

#[tokio::test]
async fn superseded_run_exits_from_its_loop() {
    let client = MockJobClient::new();
    let controller = controller(&since_config(), client);

    let first = controller.start().await.unwrap();
    let _second = controller.start().await.unwrap();

    assert_eq!(first.run(InstantSleeper::new()).await, TailExit::Superseded);
}

#[tokio::test]
async fn clear_log_does_not_touch_the_loop() {
    let client = MockJobClient::new()
        .with_lines(&["one", "two"], Cursor::SinceToken(2), true)
        .with_lines(&["three"], Cursor::SinceToken(3), true);
    let controller = controller(&since_config(), client);

    let run = controller.start().await.unwrap();
    run.poll_once().await;

    controller.clear_log();
    controller.with_renderer(|view| {
        assert!(view.lines().is_empty());
        assert_eq!(view.placeholder(), Some(Placeholder::Cleared));
    });
    assert_eq!(controller.state(), LoopState::Polling);

    run.poll_once().await;
    controller.with_renderer(|view| assert_eq!(view.lines(), vec!["three"]));
    assert_eq!(controller.cursor(), Some(Cursor::SinceToken(3)));
}

#[tokio::test]
async fn start_snapshot_is_reflected_before_first_tail() {
    let client = MockJobClient::new().with_start(Ok(StartAck {
        job_id: None,
        message: Some("Started".to_string()),
        snapshot: Some(JobStatus {
            running: false,
            last_output_size_mb: Some(3.0),
            ..JobStatus::default()
        }),
    }));
    let controller = controller(&since_config(), client);

    let _run = controller.start().await.unwrap();

    controller.with_reflector(|panel| {
        assert!(panel.spinner_visible);
        assert_eq!(panel.output_size, "3 MB");
    });
    assert_eq!(controller.cursor().map(|c| c.kind()), Some(CursorKind::Since));
}

// =============================================================================
// End to end over HTTP
// =============================================================================

#[tokio::test]
async fn selenium_job_runs_to_completion() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/crawl-vrain-selenium/start/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ok": true,
            "job_id": "J1"
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/crawl-vrain-selenium/tail/"))
        .and(query_param("offset", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ok": true,
            "job_id": "J1",
            "lines": ["a", "b"],
            "offset": 12,
            "done": false,
            "is_running": true
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/crawl-vrain-selenium/tail/"))
        .and(query_param("offset", "12"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ok": true,
            "job_id": "J1",
            "lines": ["done"],
            "offset": 13,
            "done": true,
            "is_running": false,
            "last_returncode": 0,
            "last_size_mb": 0.5
        })))
        .expect(1)
        .mount(&server)
        .await;

    let config = JobPreset::VrainSelenium.config(&server.uri()).unwrap();
    let controller = JobController::new(
        &config,
        HttpJobClient::new(config.clone()),
        LogView::new(config.max_log_lines),
        StatusPanel::default(),
    );

    let run = controller.start().await.expect("start succeeds");
    let exit = run.run(InstantSleeper::new()).await;

    assert_eq!(exit, TailExit::Completed);
    controller.with_renderer(|view| assert_eq!(view.lines(), vec!["a", "b", "done"]));
    controller.with_reflector(|panel| {
        assert!(!panel.spinner_visible);
        assert_eq!(panel.last_return_code, Some(0));
        assert_eq!(panel.output_size, "0.5 MB");
    });
}

#[tokio::test]
async fn server_error_on_start_creates_no_tail_loop() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/crawl-vrain-selenium/start/"))
        .respond_with(ResponseTemplate::new(500).set_body_string("Internal Server Error"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/crawl-vrain-selenium/tail/"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let config = JobPreset::VrainSelenium.config(&server.uri()).unwrap();
    let controller = JobController::new(
        &config,
        HttpJobClient::new(config.clone()),
        LogView::new(config.max_log_lines),
        StatusPanel::default(),
    );

    assert!(controller.start().await.is_err());
    assert_eq!(controller.state(), LoopState::Idle);
    controller.with_reflector(|panel| {
        assert!(!panel.start_disabled);
        assert!(panel.error.is_some());
    });
}

//! Serving and shutdown behaviour of a running exporter.

use std::time::{Duration, Instant};

use axum::{routing::get, Router};
use redis_exporter::lifecycle::{
    signals, LifecycleError, LifecycleState, ServerLifecycle, TerminationSignal, SHUTDOWN_TIMEOUT,
};
use redis_exporter::net::listener;

mod common;

#[tokio::test]
async fn scrape_then_interrupt_stops_within_bound() {
    let running = common::start(&common::local_config()).await;
    let client = common::http_client();
    let url = format!("http://{}/metrics", running.addr);

    let response = client.get(&url).send().await.unwrap();
    assert_eq!(response.status(), 200);
    let body = response.text().await.unwrap();
    assert!(body.contains("tokio_runtime_workers"), "{body}");
    assert!(body.contains("redis_exporter_build_info"), "{body}");
    if cfg!(target_os = "linux") {
        assert!(body.contains("process_"), "{body}");
    }

    let started = Instant::now();
    assert!(running.signals.deliver(TerminationSignal::Interrupt));
    let (result, state) = running.task.await.unwrap();
    result.unwrap();
    assert_eq!(state, LifecycleState::Stopped);
    assert!(started.elapsed() < SHUTDOWN_TIMEOUT);

    let err = common::http_client().get(&url).send().await.unwrap_err();
    assert!(err.is_connect(), "{err:?}");
}

#[tokio::test]
async fn second_signal_does_not_start_another_shutdown() {
    let running = common::start(&common::local_config()).await;

    assert!(running.signals.deliver(TerminationSignal::Terminate));
    assert!(!running.signals.deliver(TerminationSignal::Interrupt));

    let (result, state) = running.task.await.unwrap();
    result.unwrap();
    assert_eq!(state, LifecycleState::Stopped);
    assert!(!running.signals.deliver(TerminationSignal::Interrupt));
}

#[tokio::test]
async fn redis_only_scrape_has_no_process_series() {
    let mut config = common::local_config();
    config.features.redis_only_metrics = true;
    let running = common::start(&config).await;

    let body = common::http_client()
        .get(format!("http://{}/metrics", running.addr))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(!body.contains("process_"), "{body}");
    assert!(body.contains("redis_exporter_scrapes_total 1"), "{body}");

    running.signals.deliver(TerminationSignal::Interrupt);
    running.task.await.unwrap().0.unwrap();
}

#[tokio::test]
async fn basic_auth_protects_metrics() {
    let mut config = common::local_config();
    config.web.basic_auth_username = "prom".to_string();
    config.web.basic_auth_password = "pw".to_string();
    let running = common::start(&config).await;
    let client = common::http_client();
    let url = format!("http://{}/metrics", running.addr);

    let response = client.get(&url).send().await.unwrap();
    assert_eq!(response.status(), 401);
    assert!(response.headers().contains_key("www-authenticate"));

    let response = client.get(&url).basic_auth("prom", Some("nope")).send().await.unwrap();
    assert_eq!(response.status(), 401);

    let response = client.get(&url).basic_auth("prom", Some("pw")).send().await.unwrap();
    assert_eq!(response.status(), 200);

    running.signals.deliver(TerminationSignal::Interrupt);
    running.task.await.unwrap().0.unwrap();
}

#[tokio::test]
async fn in_flight_request_past_bound_is_a_shutdown_timeout() {
    let app = Router::new().route(
        "/slow",
        get(|| async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            "done"
        }),
    );
    let bound = Duration::from_millis(300);
    let mut lifecycle = ServerLifecycle::new(listener::bind("127.0.0.1:0").unwrap(), app, None)
        .with_shutdown_timeout(bound);
    let addr = lifecycle.start().await.unwrap();

    let slow = tokio::spawn(async move {
        common::http_client()
            .get(format!("http://{addr}/slow"))
            .send()
            .await
    });
    tokio::time::sleep(Duration::from_millis(200)).await;

    let (tx, rx) = signals::channel();
    tx.deliver(TerminationSignal::Terminate);
    let started = Instant::now();
    let result = lifecycle.run(rx).await;

    assert!(matches!(result, Err(LifecycleError::ShutdownTimeout(d)) if d == bound));
    assert_eq!(lifecycle.state(), LifecycleState::Failed);
    assert!(started.elapsed() < Duration::from_secs(3));
    slow.abort();
}

#[tokio::test]
async fn quick_in_flight_request_finishes_during_drain() {
    let app = Router::new().route(
        "/brief",
        get(|| async {
            tokio::time::sleep(Duration::from_millis(300)).await;
            "done"
        }),
    );
    let mut lifecycle = ServerLifecycle::new(listener::bind("127.0.0.1:0").unwrap(), app, None)
        .with_shutdown_timeout(Duration::from_secs(5));
    let addr = lifecycle.start().await.unwrap();

    let brief = tokio::spawn(async move {
        common::http_client()
            .get(format!("http://{addr}/brief"))
            .send()
            .await
            .unwrap()
            .text()
            .await
            .unwrap()
    });
    tokio::time::sleep(Duration::from_millis(100)).await;

    let (tx, rx) = signals::channel();
    tx.deliver(TerminationSignal::Interrupt);
    lifecycle.run(rx).await.unwrap();

    assert_eq!(brief.await.unwrap(), "done");
}

#![allow(clippy::unwrap_used)]
// Multi-light behaviour against one wiremock server per simulated light.

use std::time::{Duration, Instant};

use indexmap::IndexMap;
use serde_json::json;
use wiremock::matchers::{body_json, method};
use wiremock::{Mock, MockServer, ResponseTemplate};

use keylight::api::device_client::DeviceClient;
use keylight::control::{Applied, Command, ControlService, Property, Step};
use keylight::error::{AppError, DeviceError};
use keylight::focus::Direction;
use keylight::models::light_state::{Brightness, Kelvin};
use keylight::router::{CommandRouter, Effect, Input, Outcome, Session};
use keylight::settings::{Settings, SettingsStore};

// ── Helpers ─────────────────────────────────────────────────────────

fn service() -> ControlService {
    ControlService::new(DeviceClient::new().unwrap())
}

fn state_body(on: u8, brightness: u8, temperature: u16) -> serde_json::Value {
    json!({"lights": [{"on": on, "brightness": brightness, "temperature": temperature}]})
}

async fn light_reading(brightness: u8, temperature: u16) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(state_body(1, brightness, temperature)),
        )
        .mount(&server)
        .await;
    server
}

async fn unreadable_light() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    server
}

async fn expect_put(server: &MockServer, body: serde_json::Value, status: u16, times: u64) {
    Mock::given(method("PUT"))
        .and(body_json(body))
        .respond_with(ResponseTemplate::new(status))
        .expect(times)
        .mount(server)
        .await;
}

fn address(server: &MockServer) -> String {
    server.address().to_string()
}

fn settings_with(servers: &[&MockServer], last_brightness: i64) -> Settings {
    let lights: IndexMap<String, String> = servers
        .iter()
        .enumerate()
        .map(|(i, server)| (format!("Light {}", i + 1), address(server)))
        .collect();
    Settings {
        lights,
        last_brightness,
        last_temperature: 4000,
        last_selected_light: None,
    }
}

fn store_with(dir: &tempfile::TempDir, settings: &Settings) -> SettingsStore {
    let store = SettingsStore::new(dir.path().join("config.json"));
    store.save(settings).unwrap();
    store
}

fn args(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

// ── ControlService ──────────────────────────────────────────────────

#[tokio::test]
async fn test_equalize_skips_unreadable_lights_in_average() {
    let a = light_reading(40, 250).await;
    let b = light_reading(60, 250).await;
    let c = unreadable_light().await;
    for server in [&a, &b, &c] {
        expect_put(server, json!({"lights": [{"brightness": 50}]}), 200, 1).await;
    }

    let addresses = vec![address(&a), address(&b), address(&c)];
    let summary = service()
        .apply(Command::Equalize(Property::Brightness), &addresses)
        .await
        .unwrap();

    assert_eq!(summary.succeeded, 3);
    assert_eq!(summary.failed, 0);
    assert_eq!(
        summary.applied.get(&address(&c)),
        Some(&Applied::Brightness(Brightness::new(50).unwrap()))
    );
}

#[tokio::test]
async fn test_equalize_with_nothing_readable_writes_nothing() {
    let a = unreadable_light().await;
    let b = unreadable_light().await;
    for server in [&a, &b] {
        expect_put(server, json!({"lights": [{"brightness": 50}]}), 200, 0).await;
    }

    let err = service()
        .apply(
            Command::Equalize(Property::Brightness),
            &[address(&a), address(&b)],
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NoTargets(_)));
}

#[tokio::test]
async fn test_adjust_is_relative_to_each_light() {
    let a = light_reading(40, 250).await;
    let b = light_reading(98, 250).await;
    let c = unreadable_light().await;
    expect_put(&a, json!({"lights": [{"brightness": 45}]}), 200, 1).await;
    expect_put(&b, json!({"lights": [{"brightness": 100}]}), 200, 1).await;
    expect_put(&c, json!({"lights": [{"brightness": 5}]}), 200, 0).await;

    let summary = service()
        .apply(
            Command::Adjust(Property::Brightness, Step::Increase),
            &[address(&a), address(&b), address(&c)],
        )
        .await
        .unwrap();

    assert_eq!(summary.succeeded, 2);
    assert_eq!(summary.failed, 1);
    assert!(matches!(
        summary.errors.get(&address(&c)),
        Some(DeviceError::Offline(_))
    ));
}

#[tokio::test]
async fn test_temperature_decrease_clamps_at_warmest() {
    // 333 on the wire reads back as 3003K.
    let a = light_reading(50, 333).await;
    expect_put(&a, json!({"lights": [{"temperature": 345}]}), 200, 1).await;

    let summary = service()
        .apply(
            Command::Adjust(Property::Temperature, Step::Decrease),
            &[address(&a)],
        )
        .await
        .unwrap();
    assert_eq!(
        summary.applied.get(&address(&a)),
        Some(&Applied::Temperature(Kelvin::new(2900).unwrap()))
    );
}

#[tokio::test]
async fn test_one_offline_light_does_not_stop_the_rest() {
    let a = MockServer::start().await;
    let b = MockServer::start().await;
    expect_put(&a, json!({"lights": [{"on": 1}]}), 200, 1).await;
    expect_put(&b, json!({"lights": [{"on": 1}]}), 503, 1).await;

    let summary = service()
        .apply(Command::TurnOn, &[address(&a), address(&b)])
        .await
        .unwrap();
    assert_eq!(summary.succeeded, 1);
    assert_eq!(summary.errors.get(&address(&b)), Some(&DeviceError::Rejected(503)));
}

#[tokio::test]
async fn test_slow_lights_are_contacted_concurrently() {
    let mut servers = Vec::new();
    for _ in 0..3 {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(body_json(json!({"lights": [{"on": 1}]})))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(800)))
            .expect(1)
            .mount(&server)
            .await;
        servers.push(server);
    }
    let addresses: Vec<String> = servers.iter().map(address).collect();

    let started = Instant::now();
    let summary = service().apply(Command::TurnOn, &addresses).await.unwrap();
    let elapsed = started.elapsed();

    assert_eq!(summary.succeeded, 3);
    assert!(
        elapsed < Duration::from_millis(1800),
        "three 800ms lights took {elapsed:?}"
    );
}

#[tokio::test]
async fn test_shared_address_is_contacted_once() {
    let a = MockServer::start().await;
    expect_put(&a, json!({"lights": [{"on": 0}]}), 200, 1).await;

    let summary = service()
        .apply(Command::TurnOff, &[address(&a), address(&a)])
        .await
        .unwrap();
    assert_eq!(summary.succeeded, 1);
    assert_eq!(summary.failed, 0);
    assert_eq!(summary.applied.get(&address(&a)), Some(&Applied::Power(false)));
}

// ── CommandRouter ───────────────────────────────────────────────────

#[tokio::test]
async fn test_partial_failure_keeps_persisted_brightness() {
    let a = MockServer::start().await;
    let b = MockServer::start().await;
    let c = MockServer::start().await;
    expect_put(&a, json!({"lights": [{"brightness": 80}]}), 200, 1).await;
    expect_put(&b, json!({"lights": [{"brightness": 80}]}), 200, 1).await;
    expect_put(&c, json!({"lights": [{"brightness": 80}]}), 500, 1).await;

    let dir = tempfile::tempdir().unwrap();
    let store = store_with(&dir, &settings_with(&[&a, &b, &c], 30));
    let mut router = CommandRouter::new(store.clone(), service());

    let instruction = router.parse(&args(&["bright", "80"])).unwrap();
    let outcome = router.execute(instruction).await.unwrap();

    match outcome {
        Outcome::Applied { summary, .. } => {
            assert_eq!(summary.succeeded, 2);
            assert_eq!(summary.failed, 1);
        }
        other => panic!("expected Applied, got: {other:?}"),
    }
    assert_eq!(store.load().last_brightness, 30);
}

#[tokio::test]
async fn test_complete_success_persists_default() {
    let a = MockServer::start().await;
    let b = MockServer::start().await;
    for server in [&a, &b] {
        expect_put(server, json!({"lights": [{"temperature": 200}]}), 200, 1).await;
    }

    let dir = tempfile::tempdir().unwrap();
    let store = store_with(&dir, &settings_with(&[&a, &b], 30));
    let mut router = CommandRouter::new(store.clone(), service());

    let instruction = router.parse(&args(&["temp", "5000"])).unwrap();
    router.execute(instruction).await.unwrap();

    let saved = store.load();
    assert_eq!(saved.last_temperature, 5000);
    assert_eq!(saved.last_brightness, 30);
}

#[tokio::test]
async fn test_failed_single_light_is_an_error() {
    let a = MockServer::start().await;
    expect_put(&a, json!({"lights": [{"on": 0}]}), 400, 1).await;

    let dir = tempfile::tempdir().unwrap();
    let store = store_with(&dir, &settings_with(&[&a], 30));
    let mut router = CommandRouter::new(store, service());

    let instruction = router.parse(&args(&["Light 1", "off"])).unwrap();
    match router.execute(instruction).await {
        Err(AppError::Device { name, source }) => {
            assert_eq!(name, "Light 1");
            assert_eq!(source, DeviceError::Rejected(400));
        }
        other => panic!("expected Device error, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_bare_identifier_fast_toggles() {
    let a = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(state_body(1, 50, 250)))
        .mount(&a)
        .await;
    expect_put(&a, json!({"lights": [{"on": 0}]}), 200, 1).await;

    let dir = tempfile::tempdir().unwrap();
    let store = store_with(&dir, &settings_with(&[&a], 30));
    let mut router = CommandRouter::new(store, service());

    let instruction = router.parse(&args(&["1"])).unwrap();
    match router.execute(instruction).await.unwrap() {
        Outcome::Toggled { target, on } => {
            assert_eq!(target.name, "Light 1");
            assert!(!on);
        }
        other => panic!("expected Toggled, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_status_reports_offline_lights() {
    let a = light_reading(70, 200).await;
    let b = unreadable_light().await;

    let dir = tempfile::tempdir().unwrap();
    let store = store_with(&dir, &settings_with(&[&a, &b], 30));
    let mut router = CommandRouter::new(store, service());

    let instruction = router.parse(&args(&["status"])).unwrap();
    let Outcome::Status(statuses) = router.execute(instruction).await.unwrap() else {
        panic!("expected Status");
    };
    assert_eq!(statuses.len(), 2);
    assert_eq!(statuses[0].target.name, "Light 1");
    assert_eq!(statuses[0].state.as_ref().unwrap().temperature.value(), 5000);
    assert!(statuses[1].state.is_err());
}

#[tokio::test]
async fn test_detect_on_fresh_machine_saves_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    let mut router = CommandRouter::new(SettingsStore::new(&path), service());

    let mut found = IndexMap::new();
    found.insert("Key Light".to_string(), "10.0.0.40".to_string());
    assert!(router.replace_lights(found).unwrap());

    let saved: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(saved["lights"]["Key Light"], "10.0.0.40");
    assert_eq!(saved["lastBrightness"], 50);
    assert_eq!(saved["lastTemperature"], 4000);
}

// ── Session ─────────────────────────────────────────────────────────

#[tokio::test]
async fn test_session_commits_brightness_to_selected_light() {
    let a = MockServer::start().await;
    let b = MockServer::start().await;
    expect_put(&a, json!({"lights": [{"brightness": 35}]}), 200, 0).await;
    expect_put(&b, json!({"lights": [{"brightness": 35}]}), 200, 1).await;

    let dir = tempfile::tempdir().unwrap();
    let settings = settings_with(&[&a, &b], 40);
    let store = store_with(&dir, &settings);
    let mut session = Session::new(store.clone(), settings, service());

    session.dispatch(Input::SelectOrdinal(2)).await;
    assert_eq!(session.message(), "✓ Controlling Light 2");
    session.dispatch(Input::Move(Direction::Down)).await;
    session.dispatch(Input::Move(Direction::Left)).await;
    session.dispatch(Input::Activate).await;

    assert_eq!(session.message(), "✓ Brightness set to 35%");
    assert_eq!(store.load().last_brightness, 35);
}

#[tokio::test]
async fn test_session_ignores_missing_ordinal() {
    let a = MockServer::start().await;
    expect_put(&a, json!({"lights": [{"on": 1}]}), 200, 1).await;

    let dir = tempfile::tempdir().unwrap();
    let settings = settings_with(&[&a], 40);
    let store = store_with(&dir, &settings);
    let mut session = Session::new(store, settings, service());

    session.dispatch(Input::SelectOrdinal(3)).await;
    session.dispatch(Input::Move(Direction::Right)).await;
    session.dispatch(Input::Move(Direction::Right)).await;
    session.dispatch(Input::Activate).await;
    assert_eq!(session.message(), "✓ Lights turned on");
}

#[tokio::test]
async fn test_session_discovery_replaces_and_persists() {
    let dir = tempfile::tempdir().unwrap();
    let settings = Settings::default();
    let store = store_with(&dir, &settings);
    let mut session = Session::new(store.clone(), settings, service());

    assert_eq!(session.dispatch(Input::Discover).await, Effect::StartDiscovery);
    assert_eq!(session.dispatch(Input::Discover).await, Effect::None);
    let before = session.registry().version();

    let mut found = IndexMap::new();
    found.insert("Key Light".to_string(), "10.0.0.40".to_string());
    session.finish_discovery(Ok(found));

    assert_eq!(session.message(), "✓ Discovered 1 light(s)");
    assert_eq!(session.registry().version(), before + 1);
    assert_eq!(store.load().lights.get("Key Light").unwrap(), "10.0.0.40");
    assert!(!session.update_statuses(before, Vec::new()));

    session.finish_discovery(Ok(IndexMap::new()));
    assert_eq!(session.message(), "⚠ No lights found");
    assert_eq!(session.registry().len(), 1);
}

#[tokio::test]
async fn test_session_quit() {
    let dir = tempfile::tempdir().unwrap();
    let settings = Settings::default();
    let store = store_with(&dir, &settings);
    let mut session = Session::new(store, settings, service());
    assert_eq!(session.dispatch(Input::Quit).await, Effect::Quit);
}

#[tokio::test]
async fn test_session_toggle_turns_on_unreadable_lights() {
    let a = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(state_body(1, 50, 250)))
        .mount(&a)
        .await;
    expect_put(&a, json!({"lights": [{"on": 0}]}), 200, 1).await;
    let b = unreadable_light().await;
    expect_put(&b, json!({"lights": [{"on": 1}]}), 200, 1).await;

    let dir = tempfile::tempdir().unwrap();
    let settings = settings_with(&[&a, &b], 40);
    let store = store_with(&dir, &settings);
    let mut session = Session::new(store, settings, service());

    assert_eq!(session.dispatch(Input::Activate).await, Effect::None);
    assert_eq!(session.message(), "✓ 2 light(s) toggled");
}

#![allow(clippy::unwrap_used)]
// Integration tests for `DeviceClient` using wiremock.

use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use keylight::api::device_client::DeviceClient;
use keylight::error::DeviceError;
use keylight::models::light_state::{Brightness, Kelvin, LightPatch};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, DeviceClient, String) {
    let server = MockServer::start().await;
    let address = server.address().to_string();
    (server, DeviceClient::new().unwrap(), address)
}

fn state_body(on: u8, brightness: u8, temperature: u16) -> serde_json::Value {
    json!({
        "numberOfLights": 1,
        "lights": [{"on": on, "brightness": brightness, "temperature": temperature}]
    })
}

// ── Read ────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_read_first_light() {
    let (server, client, address) = setup().await;

    Mock::given(method("GET"))
        .and(path("/elgato/lights"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "numberOfLights": 2,
            "lights": [
                {"on": 1, "brightness": 40, "temperature": 250},
                {"on": 0, "brightness": 90, "temperature": 143}
            ]
        })))
        .mount(&server)
        .await;

    let state = client.read(&address).await.unwrap();
    assert!(state.on);
    assert_eq!(state.brightness.value(), 40);
    assert_eq!(state.temperature.value(), 4000);
}

#[tokio::test]
async fn test_read_non_ok_is_offline() {
    let (server, client, address) = setup().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let result = client.read(&address).await;
    assert!(
        matches!(result, Err(DeviceError::Offline(_))),
        "expected Offline, got: {result:?}"
    );
}

#[tokio::test]
async fn test_read_empty_or_garbled_is_offline() {
    let (server, client, address) = setup().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"lights": []})))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
        .with_priority(2)
        .mount(&server)
        .await;

    assert!(matches!(client.read(&address).await, Err(DeviceError::Offline(_))));
    assert!(matches!(client.read(&address).await, Err(DeviceError::Offline(_))));
}

#[tokio::test]
async fn test_read_times_out() {
    let (server, client, address) = setup().await;
    let client = client.with_timeouts(Duration::from_millis(100), Duration::from_millis(100));

    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(state_body(1, 50, 250))
                .set_delay(Duration::from_millis(500)),
        )
        .mount(&server)
        .await;

    assert!(matches!(client.read(&address).await, Err(DeviceError::Offline(_))));
}

#[tokio::test]
async fn test_unreachable_address_is_offline() {
    let client = DeviceClient::new()
        .unwrap()
        .with_timeouts(Duration::from_millis(200), Duration::from_millis(200));
    // Port 9 (discard) on localhost is not served in the test environment.
    let result = client.read("127.0.0.1:9").await;
    assert!(matches!(result, Err(DeviceError::Offline(_))));
}

// ── Write ───────────────────────────────────────────────────────────

#[tokio::test]
async fn test_write_sends_only_present_fields() {
    let (server, client, address) = setup().await;

    Mock::given(method("PUT"))
        .and(path("/elgato/lights"))
        .and(body_json(json!({"lights": [{"temperature": 200}]})))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let patch = LightPatch::temperature(Kelvin::new(5000).unwrap());
    client.write(&address, &patch).await.unwrap();
}

#[tokio::test]
async fn test_write_non_ok_is_rejected() {
    let (server, client, address) = setup().await;

    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(400))
        .mount(&server)
        .await;

    let patch = LightPatch::brightness(Brightness::new(60).unwrap());
    assert_eq!(
        client.write(&address, &patch).await,
        Err(DeviceError::Rejected(400))
    );
}

// ── Toggle ──────────────────────────────────────────────────────────

#[tokio::test]
async fn test_toggle_slow_inverts_power() {
    let (server, client, address) = setup().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(state_body(1, 50, 250)))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(body_json(json!({"lights": [{"on": 0}]})))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    assert!(!client.toggle_slow(&address).await.unwrap());
}

#[tokio::test]
async fn test_toggle_slow_switches_on_when_unreadable() {
    let (server, client, address) = setup().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(body_json(json!({"lights": [{"on": 1}]})))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    assert!(client.toggle_slow(&address).await.unwrap());
}

#[tokio::test]
async fn test_toggle_fast_recovers_on_third_attempt() {
    let (server, client, address) = setup().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(2)
        .with_priority(1)
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(state_body(0, 50, 250)))
        .with_priority(2)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(body_json(json!({"lights": [{"on": 1}]})))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    assert!(client.toggle_fast(&address).await.unwrap());
}

#[tokio::test]
async fn test_toggle_fast_gives_up_after_three_attempts() {
    let (server, client, address) = setup().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .expect(3)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    match client.toggle_fast(&address).await {
        Err(DeviceError::Exhausted { attempts, last }) => {
            assert_eq!(attempts, 3);
            assert!(matches!(*last, DeviceError::Offline(_)));
        }
        other => panic!("expected Exhausted, got: {other:?}"),
    }
}

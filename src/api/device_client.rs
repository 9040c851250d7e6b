use std::net::{Ipv6Addr, SocketAddr};
use std::time::Duration;

use tracing::{debug, warn};

use super::response::{LightsResponse, LightsUpdate};
use super::retry::RetryPolicy;
use crate::error::{AppError, DeviceError};
use crate::models::light_state::{DeviceState, LightPatch};

pub const DEFAULT_PORT: u16 = 9123;
const LIGHTS_PATH: &str = "/elgato/lights";

const READ_TIMEOUT: Duration = Duration::from_secs(2);
const WRITE_TIMEOUT: Duration = Duration::from_secs(2);
const FAST_TOGGLE_RETRY: RetryPolicy = RetryPolicy::new(3, Duration::from_millis(100));

/// HTTP client for the per-fixture control API. Cheap to clone; clones share
/// the connection pool.
#[derive(Debug, Clone)]
pub struct DeviceClient {
    client: reqwest::Client,
    read_timeout: Duration,
    write_timeout: Duration,
}

impl DeviceClient {
    pub fn new() -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("keylight/", env!("CARGO_PKG_VERSION")))
            .no_proxy()
            .build()?;
        Ok(Self::with_client(client))
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self {
            client,
            read_timeout: READ_TIMEOUT,
            write_timeout: WRITE_TIMEOUT,
        }
    }

    pub fn with_timeouts(mut self, read: Duration, write: Duration) -> Self {
        self.read_timeout = read;
        self.write_timeout = write;
        self
    }

    /// Fetch the state of the first light reported at `address`.
    pub async fn read(&self, address: &str) -> Result<DeviceState, DeviceError> {
        let url = lights_url(address);
        debug!(%url, "GET");

        let response = self
            .client
            .get(&url)
            .timeout(self.read_timeout)
            .send()
            .await
            .map_err(|e| DeviceError::Offline(e.to_string()))?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            return Err(DeviceError::Offline(format!("unexpected status {status}")));
        }

        let body: LightsResponse = response
            .json()
            .await
            .map_err(|e| DeviceError::Offline(format!("undecodable response: {e}")))?;

        let state = body
            .lights
            .into_iter()
            .next()
            .map(|light| light.into_state())
            .ok_or_else(|| DeviceError::Offline("no lights in response".into()))?;

        debug!(address, ?state, "read state");
        Ok(state)
    }

    /// Send a partial update. Only the fields present in `patch` are written.
    pub async fn write(&self, address: &str, patch: &LightPatch) -> Result<(), DeviceError> {
        let url = lights_url(address);
        let body = LightsUpdate::from(patch);
        debug!(%url, ?patch, "PUT");

        let response = self
            .client
            .put(&url)
            .timeout(self.write_timeout)
            .json(&body)
            .send()
            .await
            .map_err(|e| DeviceError::Offline(e.to_string()))?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            warn!(address, %status, "device rejected update");
            return Err(DeviceError::Rejected(status.as_u16()));
        }
        Ok(())
    }

    /// Read the current power state, invert it and write it back. If the read
    /// fails the light is switched on. Returns the power state written.
    pub async fn toggle_slow(&self, address: &str) -> Result<bool, DeviceError> {
        RetryPolicy::once()
            .run(|_| self.toggle_attempt(address, true))
            .await
    }

    /// Strict read-invert-write, retried sequentially. Meant for single
    /// physical button presses where a stale read must not force the light on.
    pub async fn toggle_fast(&self, address: &str) -> Result<bool, DeviceError> {
        FAST_TOGGLE_RETRY
            .run(|_| self.toggle_attempt(address, false))
            .await
    }

    async fn toggle_attempt(
        &self,
        address: &str,
        on_if_unreadable: bool,
    ) -> Result<bool, DeviceError> {
        let target = match self.read(address).await {
            Ok(state) => !state.on,
            Err(err) if on_if_unreadable => {
                debug!(address, error = %err, "state unreadable, switching on");
                true
            }
            Err(err) => return Err(err),
        };
        self.write(address, &LightPatch::power(target)).await?;
        Ok(target)
    }
}

/// Build the control URL for an address. A bare host uses the default port;
/// `host:port` and `[v6]:port` are used as given.
pub fn lights_url(address: &str) -> String {
    if address.parse::<SocketAddr>().is_ok() {
        return format!("http://{address}{LIGHTS_PATH}");
    }
    if let Ok(v6) = address.parse::<Ipv6Addr>() {
        return format!("http://[{v6}]:{DEFAULT_PORT}{LIGHTS_PATH}");
    }
    if let Some((host, port)) = address.rsplit_once(':') {
        if !host.contains(':') && port.parse::<u16>().is_ok() {
            return format!("http://{address}{LIGHTS_PATH}");
        }
    }
    format!("http://{address}:{DEFAULT_PORT}{LIGHTS_PATH}")
}

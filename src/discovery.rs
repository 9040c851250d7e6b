use std::net::Ipv4Addr;
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use indexmap::IndexMap;
use tokio::time::Instant;
use tracing::{debug, info};

use crate::error::AppError;

/// mDNS service type advertised by Elgato lights.
pub const SERVICE_NAME: &str = "_elg._tcp.local";

/// Budget for discovery started from the interactive session.
pub const SESSION_BUDGET: Duration = Duration::from_secs(3);
/// Budget for `keylight detect` and the first-run bootstrap.
pub const BLOCKING_BUDGET: Duration = Duration::from_secs(2);

/// Finds lights on the local network, returning name → address.
#[async_trait]
pub trait Discovery: Send + Sync {
    async fn discover(&self, budget: Duration) -> Result<IndexMap<String, String>, AppError>;
}

/// Browses mDNS for [`SERVICE_NAME`] until the budget runs out.
#[derive(Debug, Clone, Default)]
pub struct MdnsDiscovery;

impl MdnsDiscovery {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Discovery for MdnsDiscovery {
    async fn discover(&self, budget: Duration) -> Result<IndexMap<String, String>, AppError> {
        info!(?budget, service = SERVICE_NAME, "discovering lights");
        let found = tokio::task::spawn_blocking(move || browse(budget))
            .await
            .map_err(|e| AppError::Discovery(format!("discovery task failed: {e}")))??;
        info!(count = found.len(), "discovery finished");
        Ok(found)
    }
}

/// The mDNS stream is driven on a blocking thread so the caller's future
/// stays `Send`.
fn browse(budget: Duration) -> Result<IndexMap<String, String>, AppError> {
    let deadline = Instant::now() + budget;
    let query_interval = (budget / 2).max(Duration::from_millis(500));
    let stream = mdns::discover::all(SERVICE_NAME, query_interval)
        .map_err(|e| AppError::Discovery(e.to_string()))?
        .listen();

    futures::executor::block_on(async move {
        futures::pin_mut!(stream);
        let mut found = IndexMap::new();
        while let Ok(Some(response)) = tokio::time::timeout_at(deadline, stream.next()).await {
            let response = match response {
                Ok(response) => response,
                Err(e) => {
                    debug!(error = %e, "ignoring bad mDNS response");
                    continue;
                }
            };
            let records: Vec<&mdns::Record> = response.records().collect();
            if let Some((name, ip)) = light_from_records(&records) {
                debug!(%name, %ip, "found light");
                found.insert(name, ip.to_string());
            }
        }
        Ok(found)
    })
}

/// Pair the advertised instance name with the first IPv4 address in one
/// response.
fn light_from_records(records: &[&mdns::Record]) -> Option<(String, Ipv4Addr)> {
    let name = records.iter().find_map(|record| match &record.kind {
        mdns::RecordKind::PTR(target) => instance_name(target),
        _ => None,
    })?;
    let ip = records.iter().find_map(|record| match &record.kind {
        mdns::RecordKind::A(addr) => Some(*addr),
        _ => None,
    })?;
    Some((name, ip))
}

/// `Key Light Air 1A2B._elg._tcp.local` → `Key Light Air 1A2B`.
pub fn instance_name(ptr: &str) -> Option<String> {
    let ptr = ptr.trim_end_matches('.');
    let instance = ptr.strip_suffix(SERVICE_NAME)?.strip_suffix('.')?;
    if instance.is_empty() {
        return None;
    }
    Some(instance.replace("\\ ", " "))
}

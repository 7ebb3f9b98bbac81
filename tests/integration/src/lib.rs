//! Shared fixtures for the browser console integration tests
//!
//! Tests register the fake native host in a temporary manifest directory and
//! drive it through the real relay stack.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use console_relay::{ChannelManager, NativeHostConnector, RelayClient, RelayMessage, RelayRouter};
use serde_json::json;
use tempfile::TempDir;
use tokio::sync::broadcast;

pub const HOST_NAME: &str = "com.example.browser_console_test";
pub const ORIGIN: &str = "chrome-extension://abcdefghijklmnop/";

const EVENT_TIMEOUT: Duration = Duration::from_secs(10);

/// A temporary manifest directory with the fake host registered in it
pub struct HostRegistration {
    pub dir: TempDir,
}

impl HostRegistration {
    /// Register `executable` as `HOST_NAME`, allowing `ORIGIN`
    pub fn new(executable: &Path) -> Self {
        Self::with_manifest(
            HOST_NAME,
            json!({
                "name": HOST_NAME,
                "description": "Fake native host",
                "path": executable,
                "type": "stdio",
                "allowed_origins": [ORIGIN],
            }),
        )
    }

    /// Write an arbitrary manifest under `<file_stem>.json`
    pub fn with_manifest(file_stem: &str, manifest: serde_json::Value) -> Self {
        let dir = tempfile::tempdir().expect("Failed to create manifest dir");
        let path = dir.path().join(format!("{}.json", file_stem));
        std::fs::write(&path, manifest.to_string()).expect("Failed to write manifest");
        Self { dir }
    }

    pub fn manifest_dirs(&self) -> Vec<PathBuf> {
        vec![self.dir.path().to_path_buf()]
    }
}

/// A running relay wired to a connector
pub struct Relay {
    pub channel: Arc<ChannelManager>,
    pub client: RelayClient,
    pub events: broadcast::Receiver<RelayMessage>,
}

impl Relay {
    /// Start a relay that resolves hosts through `registration`
    pub fn start(registration: &HostRegistration, origin: Option<&str>) -> Self {
        Self::start_for(HOST_NAME, registration, origin)
    }

    pub fn start_for(host_name: &str, registration: &HostRegistration, origin: Option<&str>) -> Self {
        let connector = NativeHostConnector::new(
            registration.manifest_dirs(),
            origin.map(str::to_string),
        );
        let channel = Arc::new(ChannelManager::new(host_name, Arc::new(connector), 64));
        let (router, client) = RelayRouter::new(Arc::clone(&channel), 64);
        let events = client.subscribe();
        tokio::spawn(router.run());

        Self {
            channel,
            client,
            events,
        }
    }

    /// Wait for the next relay broadcast
    pub async fn next_event(&mut self) -> RelayMessage {
        tokio::time::timeout(EVENT_TIMEOUT, self.events.recv())
            .await
            .expect("Timed out waiting for relay event")
            .expect("Relay event stream closed")
    }
}

/// Initialise test logging once; honours `RUST_LOG`
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

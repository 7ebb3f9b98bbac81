//! Native host registration lookup and launch

use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{ChildStderr, Command};
use tracing::{debug, info};

use super::transport::{Connector, Port};
use crate::config::Config;
use crate::error::{Error, Result};

/// Only transport type native hosts can register
const STDIO_TRANSPORT: &str = "stdio";

/// Native messaging host manifest (`<name>.json`)
#[derive(Debug, Clone, Deserialize)]
pub struct HostManifest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub path: PathBuf,
    #[serde(rename = "type")]
    pub transport: String,
    #[serde(default)]
    pub allowed_origins: Vec<String>,
}

impl HostManifest {
    /// Read and parse a manifest file
    pub async fn load(path: &Path) -> Result<Self> {
        let content = tokio::fs::read(path).await?;
        serde_json::from_slice(&content).map_err(|e| Error::InvalidManifest {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }

    /// Check that the manifest registers `host_name` and admits `origin`
    pub fn validate(&self, manifest_path: &Path, host_name: &str, origin: Option<&str>) -> Result<()> {
        let invalid = |message: String| Error::InvalidManifest {
            path: manifest_path.display().to_string(),
            message,
        };

        if self.name != host_name {
            return Err(invalid(format!(
                "registered name {:?} does not match {:?}",
                self.name, host_name
            )));
        }
        if self.transport != STDIO_TRANSPORT {
            return Err(invalid(format!("unsupported host type {:?}", self.transport)));
        }
        if self.path.as_os_str().is_empty() {
            return Err(invalid("empty host path".to_string()));
        }
        if let Some(origin) = origin {
            if !self.allowed_origins.iter().any(|allowed| allowed == origin) {
                return Err(Error::AccessForbidden(origin.to_string()));
            }
        }
        Ok(())
    }

    /// Host executable; relative paths resolve against the manifest directory
    pub fn executable(&self, manifest_path: &Path) -> PathBuf {
        if self.path.is_absolute() {
            return self.path.clone();
        }
        manifest_path
            .parent()
            .map(|dir| dir.join(&self.path))
            .unwrap_or_else(|| self.path.clone())
    }
}

/// Validate a native messaging host name.
///
/// Names contain lowercase alphanumerics, `_` and `.` only, and neither
/// start nor end with a dot nor contain two dots in a row.
pub fn validate_host_name(name: &str) -> Result<()> {
    let valid_chars = name
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '.');

    if name.is_empty()
        || !valid_chars
        || name.starts_with('.')
        || name.ends_with('.')
        || name.contains("..")
    {
        return Err(Error::InvalidHostName(name.to_string()));
    }
    Ok(())
}

/// Connector that launches registered native hosts as child processes
pub struct NativeHostConnector {
    manifest_dirs: Vec<PathBuf>,
    origin: Option<String>,
}

impl NativeHostConnector {
    /// Create a connector searching `manifest_dirs` in order
    pub fn new(manifest_dirs: Vec<PathBuf>, origin: Option<String>) -> Self {
        Self {
            manifest_dirs,
            origin,
        }
    }

    /// Create a connector from relay configuration
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.manifest_search_path(), config.origin.clone())
    }

    /// Find the first manifest registered for `host_name`
    pub async fn find_manifest(&self, host_name: &str) -> Result<(PathBuf, HostManifest)> {
        let file_name = format!("{}.json", host_name);

        for dir in &self.manifest_dirs {
            let candidate = dir.join(&file_name);
            if tokio::fs::try_exists(&candidate).await.unwrap_or(false) {
                debug!("Found manifest for {} at {}", host_name, candidate.display());
                let manifest = HostManifest::load(&candidate).await?;
                return Ok((candidate, manifest));
            }
        }

        Err(Error::HostNotFound(host_name.to_string()))
    }

    fn spawn(&self, host_name: &str, executable: &Path) -> Result<Port> {
        let mut cmd = Command::new(executable);
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        if let Some(dir) = executable.parent() {
            cmd.current_dir(dir);
        }
        if let Some(origin) = &self.origin {
            cmd.arg(origin);
        }

        let mut child = cmd
            .spawn()
            .map_err(|e| Error::SpawnFailed(format!("{}: {}", executable.display(), e)))?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| Error::SpawnFailed("stdin not captured".to_string()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| Error::SpawnFailed("stdout not captured".to_string()))?;
        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(forward_stderr(host_name.to_string(), stderr));
        }

        info!(
            "Started native host {} (pid {:?})",
            host_name,
            child.id()
        );

        Ok(Port::new(Box::new(stdout), Box::new(stdin)).with_process(child))
    }
}

#[async_trait]
impl Connector for NativeHostConnector {
    async fn connect(&self, host_name: &str) -> Result<Port> {
        validate_host_name(host_name)?;

        let (manifest_path, manifest) = self.find_manifest(host_name).await?;
        manifest.validate(&manifest_path, host_name, self.origin.as_deref())?;

        let executable = manifest.executable(&manifest_path);
        self.spawn(host_name, &executable)
    }
}

/// Stream host diagnostics into the log
async fn forward_stderr(host_name: String, stderr: ChildStderr) {
    let mut lines = BufReader::new(stderr).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        debug!(host = %host_name, "stderr: {}", line);
    }
}

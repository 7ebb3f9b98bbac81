//! Relay configuration

use std::path::PathBuf;

use serde::Deserialize;

/// Environment variable prefix for every configuration key
pub const ENV_PREFIX: &str = "BROWSER_CONSOLE";

/// Relay configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Registered native messaging host name.
    /// Must match the `name` field of the host's own manifest.
    #[serde(default = "default_host_name")]
    pub host_name: String,

    /// Extra directories searched for `<host_name>.json` before the
    /// browser's default native messaging directories
    #[serde(default)]
    pub manifest_dirs: Vec<PathBuf>,

    /// Caller origin (e.g. `chrome-extension://<id>/`).
    /// When set it must appear in the manifest's `allowed_origins` and is
    /// passed to the host as its first argument.
    #[serde(default)]
    pub origin: Option<String>,

    /// Capacity of the channel and relay event broadcasts
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,

    /// Log file path; the terminal owns stdout/stderr
    #[serde(default = "default_log_file")]
    pub log_file: PathBuf,

    /// Log format: "text" or "json"
    #[serde(default = "default_log_format")]
    pub log_format: String,
}

fn default_host_name() -> String {
    "com.example.browser_console".to_string()
}

fn default_event_capacity() -> usize {
    64
}

fn default_log_file() -> PathBuf {
    std::env::temp_dir().join("browser-console.log")
}

fn default_log_format() -> String {
    "text".to_string()
}

impl Config {
    /// Load configuration from an optional config file and environment variables
    ///
    /// The file is named by `BROWSER_CONSOLE_CONFIG` and defaults to
    /// `browser-console.toml` in the working directory. Environment
    /// variables (`BROWSER_CONSOLE_HOST_NAME`, ...) override the file.
    pub fn load() -> anyhow::Result<Self> {
        let file = std::env::var(format!("{}_CONFIG", ENV_PREFIX))
            .unwrap_or_else(|_| "browser-console.toml".to_string());

        let settings = config::Config::builder()
            .add_source(config::File::with_name(&file).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("manifest_dirs"),
            )
            .build()?;

        let config: Config = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Check values that serde cannot
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.host_name.trim().is_empty() {
            anyhow::bail!("host_name must not be empty");
        }
        if self.event_capacity == 0 {
            anyhow::bail!("event_capacity must be greater than zero");
        }
        match self.log_format.as_str() {
            "text" | "json" => Ok(()),
            other => anyhow::bail!("unknown log_format: {}", other),
        }
    }

    /// Directories searched for host manifests, configured ones first
    pub fn manifest_search_path(&self) -> Vec<PathBuf> {
        let mut paths = self.manifest_dirs.clone();
        for dir in default_manifest_dirs() {
            if !paths.contains(&dir) {
                paths.push(dir);
            }
        }
        paths
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host_name: default_host_name(),
            manifest_dirs: Vec::new(),
            origin: None,
            event_capacity: default_event_capacity(),
            log_file: default_log_file(),
            log_format: default_log_format(),
        }
    }
}

/// Per-user then system-wide native messaging directories of Chrome and Chromium
#[cfg(target_os = "macos")]
fn default_manifest_dirs() -> Vec<PathBuf> {
    let mut paths = Vec::new();
    if let Some(base) = dirs::config_dir() {
        paths.push(base.join("Google/Chrome/NativeMessagingHosts"));
        paths.push(base.join("Chromium/NativeMessagingHosts"));
    }
    paths.push(PathBuf::from("/Library/Google/Chrome/NativeMessagingHosts"));
    paths.push(PathBuf::from("/Library/Application Support/Chromium/NativeMessagingHosts"));
    paths
}

/// Per-user then system-wide native messaging directories of Chrome and Chromium
#[cfg(all(unix, not(target_os = "macos")))]
fn default_manifest_dirs() -> Vec<PathBuf> {
    let mut paths = Vec::new();
    if let Some(base) = dirs::config_dir() {
        paths.push(base.join("google-chrome/NativeMessagingHosts"));
        paths.push(base.join("chromium/NativeMessagingHosts"));
    }
    paths.push(PathBuf::from("/etc/opt/chrome/native-messaging-hosts"));
    paths.push(PathBuf::from("/etc/chromium/native-messaging-hosts"));
    paths
}

// Windows registers hosts in the registry; only configured directories apply there.
#[cfg(not(unix))]
fn default_manifest_dirs() -> Vec<PathBuf> {
    Vec::new()
}

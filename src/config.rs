use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub recognition: RecognitionConfig,
    pub storage: StorageConfig,
    pub webhook: WebhookConfig,
    pub collector: CollectorConfig,
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RecognitionConfig {
    /// Base URL of the batch speech-recognition service.
    pub endpoint: String,
    /// API key (or set MEETSCRIBE_RECOGNITION_KEY environment variable).
    pub api_key: String,
    /// Recognizer resource invoked for batch jobs.
    pub recognizer: String,
    /// BCP-47 language code used for every job.
    pub language: String,
    pub min_speaker_count: u32,
    pub max_speaker_count: u32,
    /// Per-request timeout in seconds for start/status calls.
    pub timeout_secs: u64,
}

impl fmt::Debug for RecognitionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecognitionConfig")
            .field("endpoint", &self.endpoint)
            .field("api_key", &"[REDACTED]")
            .field("recognizer", &self.recognizer)
            .field("language", &self.language)
            .field("min_speaker_count", &self.min_speaker_count)
            .field("max_speaker_count", &self.max_speaker_count)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Base URL of the object store the recognition service writes results to.
    pub endpoint: String,
    /// API key (or set MEETSCRIBE_STORAGE_KEY environment variable).
    pub api_key: String,
    /// Per-request timeout in seconds for fetch/list calls.
    pub timeout_secs: u64,
}

impl fmt::Debug for StorageConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StorageConfig")
            .field("endpoint", &self.endpoint)
            .field("api_key", &"[REDACTED]")
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WebhookConfig {
    /// Bearer token sent with every callback (or set MEETSCRIBE_WEBHOOK_TOKEN).
    pub token: String,
    /// Callback POST timeout in seconds.
    pub timeout_secs: u64,
}

impl fmt::Debug for WebhookConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WebhookConfig")
            .field("token", &"[REDACTED]")
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectorConfig {
    /// Seconds to sleep between result-object probes.
    pub poll_interval_secs: u64,
    /// Total seconds to wait for the result object before giving up.
    pub wait_budget_secs: u64,
}

// --- Default implementations ---

impl Default for Config {
    fn default() -> Self {
        Self {
            recognition: RecognitionConfig::default(),
            storage: StorageConfig::default(),
            webhook: WebhookConfig::default(),
            collector: CollectorConfig::default(),
        }
    }
}

impl Default for RecognitionConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            api_key: String::new(),
            recognizer: String::new(),
            language: "en-US".to_string(),
            min_speaker_count: 1,
            max_speaker_count: 6,
            timeout_secs: 30,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            api_key: String::new(),
            timeout_secs: 30,
        }
    }
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            token: String::new(),
            timeout_secs: 30,
        }
    }
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: 10,
            wait_budget_secs: 300,
        }
    }
}

// --- Config loading ---

impl Config {
    /// Load config and return the resolved file path (if any).
    pub fn load_with_path(path: Option<&Path>) -> anyhow::Result<(Self, Option<PathBuf>)> {
        // 1. Check explicit path
        if let Some(p) = path {
            let content = std::fs::read_to_string(p).map_err(|e| {
                anyhow::anyhow!("Failed to read config file {}: {}", p.display(), e)
            })?;
            let config: Config = toml::from_str(&content)?;
            return Ok((config, Some(p.to_path_buf())));
        }

        // 2. Check beside the executable
        if let Ok(exe_path) = std::env::current_exe() {
            let beside_exe = exe_path.parent().map(|p| p.join("meetscribe.toml"));
            if let Some(p) = beside_exe {
                if p.exists() {
                    let content = std::fs::read_to_string(&p)?;
                    let config: Config = toml::from_str(&content)?;
                    return Ok((config, Some(p)));
                }
            }
        }

        // 3. Check platform config directory (e.g. ~/.config/meetscribe/config.toml)
        if let Some(config_dir) = dirs::config_dir() {
            let platform_config = config_dir.join("meetscribe").join("config.toml");
            if platform_config.exists() {
                let content = std::fs::read_to_string(&platform_config)?;
                let config: Config = toml::from_str(&content)?;
                return Ok((config, Some(platform_config)));
            }
        }

        // 4. Fall back to defaults
        tracing::info!("No config file found, using defaults");
        Ok((Config::default(), None))
    }

    /// Load config (without tracking the resolved path).
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        Self::load_with_path(path).map(|(config, _)| config)
    }

    /// Generate a default config file with all fields and inline documentation.
    pub fn generate_default_commented() -> String {
        r#"# meetscribe configuration
# Each process invocation handles one transcription trigger message; the
# three clients below are built once per invocation from these settings.

[recognition]
# Base URL of the batch speech-recognition service.
# endpoint = "https://speech.example.com"
# API key (or set MEETSCRIBE_RECOGNITION_KEY environment variable).
# api_key = ""
# Recognizer resource invoked for batch jobs.
# recognizer = "meetings"
# Language used for every job.
language = "en-US"
# Speaker diarization bounds passed to the recognizer.
min_speaker_count = 1
max_speaker_count = 6
# Per-request timeout in seconds for start/status calls.
timeout_secs = 30

[storage]
# Base URL of the object store the recognition service writes results to.
# endpoint = "https://storage.example.com"
# API key (or set MEETSCRIBE_STORAGE_KEY environment variable).
# api_key = ""
# Per-request timeout in seconds for fetch/list calls.
timeout_secs = 30

[webhook]
# Bearer token sent with every callback (or set MEETSCRIBE_WEBHOOK_TOKEN).
# token = ""
# Callback POST timeout in seconds.
timeout_secs = 30

[collector]
# Seconds to sleep between probes for the result object.
poll_interval_secs = 10
# Total seconds to wait for the result object before the job fails.
wait_budget_secs = 300
"#
        .to_string()
    }
}

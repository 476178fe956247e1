use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};

use crate::config::Config;
use crate::job::TriggerMessage;
use crate::orchestrate::{self, Clients};

/// Read a trigger message from a file, or from stdin when no path is given.
pub fn read_trigger(payload: Option<&Path>) -> Result<TriggerMessage> {
    let raw = match payload {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read trigger payload {}", path.display()))?,
        None => {
            let mut buffer = String::new();
            std::io::stdin()
                .read_to_string(&mut buffer)
                .context("Failed to read trigger payload from stdin")?;
            buffer
        }
    };
    serde_json::from_str(&raw).context("Failed to parse trigger message JSON")
}

/// Process one trigger message end to end.
pub fn handle(config: &Config, payload: Option<&Path>) -> Result<()> {
    let message = read_trigger(payload)?;
    let clients = Clients::from_config(config)?;
    orchestrate::handle_trigger(&clients, config, &message)
}

/// Parse and validate a trigger message without any side effects.
pub fn validate(payload: Option<&Path>) -> Result<()> {
    let message = read_trigger(payload)?;
    message.job.validate()?;
    match &message.operation_name {
        Some(name) => println!("ok: job {} polls operation {}", message.job.job_id, name),
        None => println!("ok: job {} is a submission", message.job.job_id),
    }
    Ok(())
}

/// Write a commented default config file.
pub fn init_config(path: Option<&Path>) -> Result<()> {
    let target = path.unwrap_or_else(|| Path::new("meetscribe.toml"));
    if target.exists() {
        anyhow::bail!("Refusing to overwrite existing config: {}", target.display());
    }
    std::fs::write(target, Config::generate_default_commented())
        .with_context(|| format!("Failed to write config to {}", target.display()))?;
    println!("Wrote default config: {}", target.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_payload(dir: &TempDir, content: &str) -> std::path::PathBuf {
        let path = dir.path().join("trigger.json");
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_read_trigger_from_file() {
        let tmp = TempDir::new().unwrap();
        let path = write_payload(
            &tmp,
            r#"{
                "jobId": "job123",
                "meetingId": "meeting456",
                "nestId": "nest789",
                "audioUri": "store://uploads/job123/audio.wav",
                "outputUri": "store://results/job123/",
                "callbackUrl": "https://app.example.com/hooks/transcription"
            }"#,
        );
        let message = read_trigger(Some(&path)).unwrap();
        assert_eq!(message.job.job_id, "job123");
        assert!(message.operation_name.is_none());
    }

    #[test]
    fn test_read_trigger_missing_file_errors() {
        let tmp = TempDir::new().unwrap();
        let result = read_trigger(Some(&tmp.path().join("absent.json")));
        assert!(result.is_err());
    }

    #[test]
    fn test_read_trigger_invalid_json_errors() {
        let tmp = TempDir::new().unwrap();
        let path = write_payload(&tmp, "not json");
        let result = read_trigger(Some(&path));
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_rejects_incomplete_payload() {
        let tmp = TempDir::new().unwrap();
        let path = write_payload(&tmp, r#"{"jobId": "job123"}"#);
        let result = validate(Some(&path));
        assert!(result.is_err());
    }

    #[test]
    fn test_init_config_writes_parseable_file() {
        let tmp = TempDir::new().unwrap();
        let target = tmp.path().join("meetscribe.toml");
        init_config(Some(&target)).unwrap();

        let config = Config::load(Some(&target)).unwrap();
        assert_eq!(config.collector.poll_interval_secs, 10);
    }

    #[test]
    fn test_init_config_refuses_overwrite() {
        let tmp = TempDir::new().unwrap();
        let target = tmp.path().join("meetscribe.toml");
        std::fs::write(&target, "# existing").unwrap();
        let result = init_config(Some(&target));
        assert!(result.is_err());
    }
}

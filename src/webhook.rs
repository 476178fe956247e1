use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::config::WebhookConfig;
use crate::job::JobRequest;
use crate::transcript::{Speaker, TranscriptionResult, Utterance};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CallbackStatus {
    Processing,
    Completed,
    Error,
}

impl std::fmt::Display for CallbackStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Processing => write!(f, "processing"),
            Self::Completed => write!(f, "completed"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Body POSTed to the caller's callback URL. Exactly one terminal payload
/// (`completed` or `error`) should reach the caller per job; `processing`
/// payloads are advisory.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallbackPayload {
    pub job_id: String,
    pub meeting_id: String,
    pub nest_id: String,
    pub status: CallbackStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transcript: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speakers: Option<Vec<Speaker>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub utterances: Option<Vec<Utterance>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CallbackPayload {
    fn base(job: &JobRequest, status: CallbackStatus) -> Self {
        Self {
            job_id: job.job_id.clone(),
            meeting_id: job.meeting_id.clone(),
            nest_id: job.nest_id.clone(),
            status,
            transcript: None,
            speakers: None,
            utterances: None,
            error: None,
        }
    }

    pub fn processing(job: &JobRequest) -> Self {
        Self::base(job, CallbackStatus::Processing)
    }

    pub fn completed(job: &JobRequest, result: TranscriptionResult) -> Self {
        let mut payload = Self::base(job, CallbackStatus::Completed);
        payload.transcript = Some(result.transcript);
        payload.speakers = Some(result.speakers);
        payload.utterances = Some(result.utterances);
        payload
    }

    pub fn error(job: &JobRequest, message: impl Into<String>) -> Self {
        let mut payload = Self::base(job, CallbackStatus::Error);
        payload.error = Some(message.into());
        payload
    }
}

/// Posts status payloads to the caller-supplied callback URL. Delivery is
/// fire-and-forget from the orchestrator's perspective: failures are logged
/// by the caller, never retried in-process.
pub struct WebhookClient {
    token: String,
    client: reqwest::blocking::Client,
}

impl std::fmt::Debug for WebhookClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebhookClient")
            .field("token", &"[REDACTED]")
            .finish()
    }
}

impl WebhookClient {
    pub fn from_config(config: &WebhookConfig) -> Result<Self> {
        let token = if !config.token.is_empty() {
            config.token.clone()
        } else {
            std::env::var("MEETSCRIBE_WEBHOOK_TOKEN").context(
                "Webhook token not configured. \
                 Set [webhook] token or MEETSCRIBE_WEBHOOK_TOKEN",
            )?
        };

        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { token, client })
    }

    /// POST one payload to the callback URL. Non-2xx responses surface as
    /// errors carrying the status code and (best effort) response body.
    pub fn notify(&self, callback_url: &str, payload: &CallbackPayload) -> Result<()> {
        let response = self
            .client
            .post(callback_url)
            .bearer_auth(&self.token)
            .json(payload)
            .send()
            .with_context(|| format!("Failed to POST callback to {}", callback_url))?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response
                .text()
                .unwrap_or_else(|_| "unable to read response body".to_string());
            anyhow::bail!(
                "Callback endpoint returned HTTP {}: {}",
                status.as_u16(),
                error_body
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job() -> JobRequest {
        JobRequest {
            job_id: "job123".to_string(),
            meeting_id: "meeting456".to_string(),
            nest_id: "nest789".to_string(),
            audio_uri: "store://uploads/job123/audio.wav".to_string(),
            output_uri: "store://results/job123/".to_string(),
            callback_url: "https://app.example.com/hooks/transcription".to_string(),
        }
    }

    #[test]
    fn test_processing_payload_shape() {
        let payload = CallbackPayload::processing(&job());
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["jobId"], "job123");
        assert_eq!(json["meetingId"], "meeting456");
        assert_eq!(json["nestId"], "nest789");
        assert_eq!(json["status"], "processing");
        assert!(json.get("transcript").is_none());
        assert!(json.get("error").is_none());
    }

    #[test]
    fn test_completed_payload_carries_result() {
        let result = TranscriptionResult {
            transcript: "hello world".to_string(),
            speakers: vec![Speaker {
                speaker_tag: 1,
                display_label: "Speaker 1".to_string(),
                total_speech_seconds: 1.1,
                word_count: 2,
            }],
            utterances: vec![Utterance {
                word: "hello".to_string(),
                start_time: 0.0,
                end_time: 0.5,
                speaker_tag: 1,
                confidence: Some(0.9),
            }],
        };
        let payload = CallbackPayload::completed(&job(), result);
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["status"], "completed");
        assert_eq!(json["transcript"], "hello world");
        assert_eq!(json["speakers"][0]["speakerTag"], 1);
        assert_eq!(json["speakers"][0]["displayLabel"], "Speaker 1");
        assert_eq!(json["utterances"][0]["word"], "hello");
        assert!(json.get("error").is_none());
    }

    #[test]
    fn test_error_payload_shape() {
        let payload = CallbackPayload::error(&job(), "result file creation timed out");
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["status"], "error");
        assert_eq!(json["error"], "result file creation timed out");
        assert!(json.get("transcript").is_none());
        assert!(json.get("speakers").is_none());
    }

    #[test]
    fn test_status_display_matches_wire_value() {
        for status in [
            CallbackStatus::Processing,
            CallbackStatus::Completed,
            CallbackStatus::Error,
        ] {
            let wire = serde_json::to_string(&status).unwrap();
            assert_eq!(wire, format!("\"{}\"", status));
        }
    }

    #[test]
    fn test_from_config_with_token() {
        let client = WebhookClient::from_config(&WebhookConfig {
            token: "hook-token".to_string(),
            ..Default::default()
        });
        assert!(client.is_ok());
    }

    #[test]
    fn test_debug_redacts_token() {
        let client = WebhookClient::from_config(&WebhookConfig {
            token: "hook-token".to_string(),
            ..Default::default()
        })
        .unwrap();
        let debug_output = format!("{:?}", client);
        assert!(!debug_output.contains("hook-token"));
        assert!(debug_output.contains("[REDACTED]"));
    }
}

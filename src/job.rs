use serde::{Deserialize, Serialize};

/// One transcription request, reconstructed from each inbound trigger
/// message. Never persisted here; the caller owns the durable job record.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct JobRequest {
    pub job_id: String,
    pub meeting_id: String,
    pub nest_id: String,
    pub audio_uri: String,
    pub output_uri: String,
    pub callback_url: String,
}

/// Inbound trigger message. The first delivery carries no operation name
/// (submission); scheduled re-deliveries carry the name the caller recorded
/// after submission, and drive polling.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TriggerMessage {
    #[serde(flatten)]
    pub job: JobRequest,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operation_name: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum JobError {
    #[error("invalid job request: missing required field `{0}`")]
    MissingField(&'static str),
}

impl JobRequest {
    /// Reject a request with any missing or blank field. Validation failures
    /// must produce no external calls, so this runs before any client is used.
    pub fn validate(&self) -> Result<(), JobError> {
        let fields = [
            ("audioUri", &self.audio_uri),
            ("jobId", &self.job_id),
            ("meetingId", &self.meeting_id),
            ("nestId", &self.nest_id),
            ("outputUri", &self.output_uri),
            ("callbackUrl", &self.callback_url),
        ];
        for (name, value) in fields {
            if value.trim().is_empty() {
                return Err(JobError::MissingField(name));
            }
        }
        Ok(())
    }
}

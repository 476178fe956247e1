use anyhow::{Context, Result};
use serde::Serialize;

use crate::config::RecognitionConfig;
use crate::recognize::operation::{Operation, OperationEnvelope};

/// Request body for starting a batch recognition operation. Decoding and
/// feature settings are fixed policy; only the language and diarization
/// bounds come from config.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchRecognizeRequest {
    pub config: RecognitionSettings,
    pub files: Vec<InputFile>,
    pub output_config: OutputConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecognitionSettings {
    pub language_codes: Vec<String>,
    pub features: RecognitionFeatures,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecognitionFeatures {
    pub enable_word_confidence: bool,
    pub enable_word_time_offsets: bool,
    pub enable_automatic_punctuation: bool,
    pub diarization_config: DiarizationConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiarizationConfig {
    pub min_speaker_count: u32,
    pub max_speaker_count: u32,
}

#[derive(Debug, Serialize)]
pub struct InputFile {
    pub uri: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputConfig {
    pub uri: String,
}

/// Thin adapter for the batch speech-recognition service.
pub struct RecognitionClient {
    endpoint: String,
    api_key: String,
    recognizer: String,
    client: reqwest::blocking::Client,
}

impl std::fmt::Debug for RecognitionClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecognitionClient")
            .field("endpoint", &self.endpoint)
            .field("api_key", &"[REDACTED]")
            .field("recognizer", &self.recognizer)
            .finish()
    }
}

impl RecognitionClient {
    pub fn from_config(config: &RecognitionConfig) -> Result<Self> {
        if config.endpoint.is_empty() {
            anyhow::bail!(
                "Recognition endpoint not configured. \
                 Set [recognition] endpoint in meetscribe.toml"
            );
        }
        if config.recognizer.is_empty() {
            anyhow::bail!(
                "Recognizer not configured. \
                 Set [recognition] recognizer in meetscribe.toml"
            );
        }

        let api_key = if !config.api_key.is_empty() {
            config.api_key.clone()
        } else {
            std::env::var("MEETSCRIBE_RECOGNITION_KEY").context(
                "Recognition API key not configured. \
                 Set [recognition] api_key or MEETSCRIBE_RECOGNITION_KEY",
            )?
        };

        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            api_key,
            recognizer: config.recognizer.clone(),
            client,
        })
    }

    /// Start a batch recognition operation and return its handle name.
    pub fn start_batch(&self, request: &BatchRecognizeRequest) -> Result<String> {
        let url = format!(
            "{}/v1/recognizers/{}:batchRecognize",
            self.endpoint, self.recognizer
        );

        tracing::info!("Starting batch recognition via {}", self.recognizer);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .context("Failed to send batch recognition request")?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response
                .text()
                .unwrap_or_else(|_| "unable to read response body".to_string());
            anyhow::bail!(
                "Recognition service returned HTTP {}: {}",
                status.as_u16(),
                error_body
            );
        }

        let operation = response
            .json::<OperationEnvelope>()
            .context("Failed to parse batch recognition response")?
            .into_operation()?;

        if operation.name.is_empty() {
            anyhow::bail!("Recognition service returned an operation without a name");
        }
        Ok(operation.name)
    }

    /// Fetch the current state of an operation by name. Read-only against
    /// provider state, safe to repeat.
    pub fn get_operation(&self, name: &str) -> Result<Operation> {
        let path = if name.starts_with("operations/") {
            name.to_string()
        } else {
            format!("operations/{}", name)
        };
        let url = format!("{}/v1/{}", self.endpoint, path);

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.api_key)
            .send()
            .with_context(|| format!("Failed to fetch operation {}", name))?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response
                .text()
                .unwrap_or_else(|_| "unable to read response body".to_string());
            anyhow::bail!(
                "Operation status check returned HTTP {}: {}",
                status.as_u16(),
                error_body
            );
        }

        response
            .json::<OperationEnvelope>()
            .with_context(|| format!("Failed to parse operation {}", name))?
            .into_operation()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn configured() -> RecognitionConfig {
        RecognitionConfig {
            endpoint: "https://speech.example.com/".to_string(),
            api_key: "test-key".to_string(),
            recognizer: "meetings".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_from_config_missing_endpoint() {
        let config = RecognitionConfig {
            recognizer: "meetings".to_string(),
            api_key: "test-key".to_string(),
            ..Default::default()
        };
        let result = RecognitionClient::from_config(&config);
        assert!(result.is_err());
        assert!(
            result.unwrap_err().to_string().contains("endpoint"),
            "Error should mention endpoint"
        );
    }

    #[test]
    fn test_from_config_missing_recognizer() {
        let config = RecognitionConfig {
            endpoint: "https://speech.example.com".to_string(),
            api_key: "test-key".to_string(),
            ..Default::default()
        };
        let result = RecognitionClient::from_config(&config);
        assert!(result.is_err());
        assert!(
            result.unwrap_err().to_string().contains("recognizer"),
            "Error should mention recognizer"
        );
    }

    #[test]
    fn test_from_config_trims_trailing_slash() {
        let client = RecognitionClient::from_config(&configured()).unwrap();
        assert_eq!(client.endpoint, "https://speech.example.com");
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let client = RecognitionClient::from_config(&configured()).unwrap();
        let debug_output = format!("{:?}", client);
        assert!(!debug_output.contains("test-key"));
        assert!(debug_output.contains("[REDACTED]"));
    }

    #[test]
    fn test_batch_request_serializes_camel_case() {
        let request = BatchRecognizeRequest {
            config: RecognitionSettings {
                language_codes: vec!["en-US".to_string()],
                features: RecognitionFeatures {
                    enable_word_confidence: true,
                    enable_word_time_offsets: true,
                    enable_automatic_punctuation: true,
                    diarization_config: DiarizationConfig {
                        min_speaker_count: 1,
                        max_speaker_count: 6,
                    },
                },
            },
            files: vec![InputFile {
                uri: "store://uploads/job123/audio.wav".to_string(),
            }],
            output_config: OutputConfig {
                uri: "store://results/job123/".to_string(),
            },
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["config"]["languageCodes"][0], "en-US");
        assert_eq!(json["config"]["features"]["enableWordConfidence"], true);
        assert_eq!(
            json["config"]["features"]["diarizationConfig"]["maxSpeakerCount"],
            6
        );
        assert_eq!(json["files"][0]["uri"], "store://uploads/job123/audio.wav");
        assert_eq!(json["outputConfig"]["uri"], "store://results/job123/");
    }
}

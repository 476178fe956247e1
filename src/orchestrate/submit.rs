use anyhow::Result;

use crate::config::RecognitionConfig;
use crate::job::JobRequest;
use crate::recognize::client::{
    BatchRecognizeRequest, DiarizationConfig, InputFile, OutputConfig, RecognitionFeatures,
    RecognitionSettings,
};
use crate::recognize::RecognitionClient;

/// Start recognition for a validated job and return the operation handle.
///
/// No retry happens here: re-delivery of the submission message drives
/// retries externally, so starting must stay safe to repeat (the caller
/// guards against duplicate submissions per job id upstream).
pub fn submit(
    recognition: &RecognitionClient,
    job: &JobRequest,
    config: &RecognitionConfig,
) -> Result<String> {
    let request = build_request(job, config);
    recognition.start_batch(&request)
}

/// Word confidence, word timing, and punctuation are always on; the
/// recognizer needs them to produce the utterance-level output downstream
/// consumers expect.
fn build_request(job: &JobRequest, config: &RecognitionConfig) -> BatchRecognizeRequest {
    BatchRecognizeRequest {
        config: RecognitionSettings {
            language_codes: vec![config.language.clone()],
            features: RecognitionFeatures {
                enable_word_confidence: true,
                enable_word_time_offsets: true,
                enable_automatic_punctuation: true,
                diarization_config: DiarizationConfig {
                    min_speaker_count: config.min_speaker_count,
                    max_speaker_count: config.max_speaker_count,
                },
            },
        },
        files: vec![InputFile {
            uri: job.audio_uri.clone(),
        }],
        output_config: OutputConfig {
            uri: job.output_uri.clone(),
        },
    }
}

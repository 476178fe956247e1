use serde::{Deserialize, Serialize};

/// Tag assigned to words the provider left unattributed.
pub const DEFAULT_SPEAKER_TAG: u32 = 0;

/// Normalized output of one transcription job. Derived deterministically
/// from the raw provider JSON and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptionResult {
    pub transcript: String,
    pub speakers: Vec<Speaker>,
    pub utterances: Vec<Utterance>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Speaker {
    pub speaker_tag: u32,
    pub display_label: String,
    pub total_speech_seconds: f64,
    pub word_count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Utterance {
    pub word: String,
    pub start_time: f64,
    pub end_time: f64,
    pub speaker_tag: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}

// --- Raw provider result file ---

/// Result document the recognition service writes to the object store:
/// `{ results: [ { alternatives: [ { transcript, words: [...] } ] } ] }`.
#[derive(Debug, Deserialize)]
pub struct RawResultFile {
    #[serde(default)]
    results: Vec<RawResult>,
}

#[derive(Debug, Deserialize)]
struct RawResult {
    #[serde(default)]
    alternatives: Vec<RawAlternative>,
}

#[derive(Debug, Deserialize)]
struct RawAlternative {
    #[serde(default)]
    transcript: Option<String>,
    #[serde(default)]
    words: Vec<RawWord>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawWord {
    #[serde(default)]
    word: String,
    #[serde(default, deserialize_with = "lenient_seconds")]
    start_time: f64,
    #[serde(default, deserialize_with = "lenient_seconds")]
    end_time: f64,
    #[serde(default)]
    speaker_tag: Option<u32>,
    #[serde(default, deserialize_with = "lenient_opt_seconds")]
    confidence: Option<f64>,
}

/// The provider serializes durations as either a JSON number or a string
/// like "1.200s" depending on the call path; both normalize to f64 seconds.
#[derive(Deserialize)]
#[serde(untagged)]
enum SecondsValue {
    Number(f64),
    Text(String),
}

impl SecondsValue {
    fn into_seconds<E: serde::de::Error>(self) -> Result<f64, E> {
        match self {
            SecondsValue::Number(n) => Ok(n),
            SecondsValue::Text(s) => s
                .trim()
                .trim_end_matches('s')
                .parse::<f64>()
                .map_err(|_| E::custom(format!("invalid duration value: {:?}", s))),
        }
    }
}

fn lenient_seconds<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    SecondsValue::deserialize(deserializer)?.into_seconds()
}

fn lenient_opt_seconds<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    match Option::<SecondsValue>::deserialize(deserializer)? {
        Some(value) => value.into_seconds().map(Some),
        None => Ok(None),
    }
}

impl RawResultFile {
    /// Normalize the raw provider document.
    ///
    /// The transcript is the top alternative of every result entry,
    /// space-joined; utterances keep provider order; speakers are built in
    /// first-seen order, accumulating speech seconds and word counts per tag.
    pub fn into_transcription_result(self) -> TranscriptionResult {
        let mut parts: Vec<String> = Vec::new();
        let mut utterances: Vec<Utterance> = Vec::new();

        for result in self.results {
            let Some(alternative) = result.alternatives.into_iter().next() else {
                continue;
            };
            if let Some(text) = alternative.transcript {
                let text = text.trim().to_string();
                if !text.is_empty() {
                    parts.push(text);
                }
            }
            for word in alternative.words {
                utterances.push(Utterance {
                    word: word.word,
                    start_time: word.start_time,
                    end_time: word.end_time,
                    speaker_tag: word.speaker_tag.unwrap_or(DEFAULT_SPEAKER_TAG),
                    confidence: word.confidence,
                });
            }
        }

        let mut speakers: Vec<Speaker> = Vec::new();
        for utterance in &utterances {
            let duration = utterance.end_time - utterance.start_time;
            match speakers
                .iter_mut()
                .find(|s| s.speaker_tag == utterance.speaker_tag)
            {
                Some(speaker) => {
                    speaker.total_speech_seconds += duration;
                    speaker.word_count += 1;
                }
                None => speakers.push(Speaker {
                    speaker_tag: utterance.speaker_tag,
                    display_label: format!("Speaker {}", utterance.speaker_tag),
                    total_speech_seconds: duration,
                    word_count: 1,
                }),
            }
        }

        TranscriptionResult {
            transcript: parts.join(" "),
            speakers,
            utterances,
        }
    }
}

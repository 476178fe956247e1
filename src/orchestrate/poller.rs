use anyhow::Result;

use crate::recognize::{Operation, RecognitionClient};

/// What one status check concluded about a job. `InProgress` is not an
/// error; the next external trigger re-checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    InProgress,
    Failed { message: String },
    Succeeded,
}

/// Classify a fetched operation. Pure function so the state machine is
/// testable without a provider.
///
/// Failures can surface at two levels: on the operation itself, or inside
/// an individual per-file result. The provider does not promise to lift
/// per-file failures to the top, so both are checked; the first per-file
/// error encountered (provider map order) wins.
pub fn classify(operation: &Operation) -> PollOutcome {
    if !operation.done {
        return PollOutcome::InProgress;
    }
    if let Some(error) = &operation.error {
        return PollOutcome::Failed {
            message: error.describe(),
        };
    }
    if let Some(response) = &operation.response {
        for (uri, file_result) in &response.results {
            if let Some(error) = &file_result.error {
                tracing::warn!("Recognition failed for input {}: {}", uri, error.describe());
                return PollOutcome::Failed {
                    message: error.describe(),
                };
            }
        }
    }
    PollOutcome::Succeeded
}

/// Fetch the operation by name and classify it. Read-only side effects,
/// safe to run concurrently with another instance of itself.
pub fn check_status(recognition: &RecognitionClient, operation_name: &str) -> Result<PollOutcome> {
    let operation = recognition.get_operation(operation_name)?;
    Ok(classify(&operation))
}

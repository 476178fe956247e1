use anyhow::Context;

use crate::config::CollectorConfig;
use crate::store::{parse_storage_uri, StoreClient, StoreLocation};
use crate::transcript::{RawResultFile, TranscriptionResult};

/// Extension the recognition service uses for result objects.
const RESULT_EXTENSION: &str = ".json";

#[derive(Debug, thiserror::Error)]
pub enum CollectError {
    /// The wait budget ran out without the result object appearing.
    #[error("result file creation timed out")]
    Timeout,
    /// Any store or parse failure other than "not found yet".
    #[error(transparent)]
    Fatal(#[from] anyhow::Error),
}

/// Wait for the result object under `output_uri` to materialize, then parse
/// and normalize it.
///
/// Store writes by the recognition service are not synchronously visible
/// after the operation completes, so absence is retried on a fixed interval
/// until the wait budget runs out. Re-reading the same object is
/// side-effect-free, so a concurrent or re-delivered invocation is safe.
pub fn collect(
    store: &StoreClient,
    output_uri: &str,
    job_id: &str,
    config: &CollectorConfig,
) -> Result<TranscriptionResult, CollectError> {
    let location =
        parse_storage_uri(output_uri).with_context(|| format!("Bad output uri for job {}", job_id))?;

    let interval_secs = config.poll_interval_secs.max(1);
    let rounds = probe_rounds(config);

    for attempt in 0..=rounds {
        if attempt > 0 {
            std::thread::sleep(std::time::Duration::from_secs(interval_secs));
        }
        match probe(store, &location)? {
            Some(bytes) => {
                let raw: RawResultFile = serde_json::from_slice(&bytes)
                    .with_context(|| format!("Failed to parse result object for job {}", job_id))?;
                tracing::info!("Collected result for job {} ({} bytes)", job_id, bytes.len());
                return Ok(raw.into_transcription_result());
            }
            None => {
                tracing::debug!(
                    "Result not yet visible for job {} (attempt {}/{})",
                    job_id,
                    attempt + 1,
                    rounds + 1
                );
            }
        }
    }

    Err(CollectError::Timeout)
}

/// Number of sleeps between probes; total probes are `probe_rounds + 1`.
fn probe_rounds(config: &CollectorConfig) -> u64 {
    config.wait_budget_secs / config.poll_interval_secs.max(1)
}

/// One visibility probe: exact-key fetch first, then a prefix listing for
/// anything with the result extension. `None` means not materialized yet.
fn probe(store: &StoreClient, location: &StoreLocation) -> anyhow::Result<Option<Vec<u8>>> {
    if let Some(bytes) = store.fetch_object(&location.bucket, &location.key)? {
        return Ok(Some(bytes));
    }
    let names = store.list_objects(&location.bucket, &location.key)?;
    match select_result_object(&names) {
        Some(name) => store.fetch_object(&location.bucket, name),
        None => Ok(None),
    }
}

fn select_result_object(names: &[String]) -> Option<&str> {
    names
        .iter()
        .find(|name| name.ends_with(RESULT_EXTENSION))
        .map(String::as_str)
}

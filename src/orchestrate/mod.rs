pub mod collector;
pub mod poller;
pub mod submit;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::config::Config;
use crate::job::{JobRequest, TriggerMessage};
use crate::recognize::RecognitionClient;
use crate::store::StoreClient;
use crate::webhook::{CallbackPayload, WebhookClient};
use collector::CollectError;
use poller::PollOutcome;

/// The three long-lived external clients, built once per process and passed
/// into every stage. They hold no mutable state.
#[derive(Debug)]
pub struct Clients {
    pub recognition: RecognitionClient,
    pub store: StoreClient,
    pub webhook: WebhookClient,
}

impl Clients {
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self {
            recognition: RecognitionClient::from_config(&config.recognition)?,
            store: StoreClient::from_config(&config.storage)?,
            webhook: WebhookClient::from_config(&config.webhook)?,
        })
    }
}

/// Printed to stdout after a successful submission so the triggering system
/// can record the handle and include it in later deliveries.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SubmissionReceipt<'a> {
    operation_name: &'a str,
}

/// Process one trigger message to its conclusion for this invocation.
///
/// A message without an operation name is a submission; one with a name is
/// a poll. Validation runs before any external call, so a malformed request
/// produces no recognition start, no store read, and no callback.
pub fn handle_trigger(clients: &Clients, config: &Config, message: &TriggerMessage) -> Result<()> {
    message.job.validate()?;

    match &message.operation_name {
        None => handle_submission(clients, config, &message.job),
        Some(operation_name) => handle_poll(clients, config, &message.job, operation_name),
    }
}

fn handle_submission(clients: &Clients, config: &Config, job: &JobRequest) -> Result<()> {
    match submit::submit(&clients.recognition, job, &config.recognition) {
        Ok(operation_name) => {
            tracing::info!(
                "Started recognition for job {}: {}",
                job.job_id,
                operation_name
            );
            deliver(clients, job, CallbackPayload::processing(job));
            let receipt = SubmissionReceipt {
                operation_name: &operation_name,
            };
            println!("{}", serde_json::to_string(&receipt)?);
            Ok(())
        }
        Err(e) => {
            tracing::error!("Failed to start recognition for job {}: {:#}", job.job_id, e);
            deliver(clients, job, CallbackPayload::error(job, format!("{:#}", e)));
            Err(e).with_context(|| format!("Recognition start failed for job {}", job.job_id))
        }
    }
}

fn handle_poll(
    clients: &Clients,
    config: &Config,
    job: &JobRequest,
    operation_name: &str,
) -> Result<()> {
    // A failed status fetch is not a job failure: no callback, surface the
    // error and let the next scheduled delivery retry the check.
    let outcome = poller::check_status(&clients.recognition, operation_name)
        .with_context(|| format!("Status check failed for job {}", job.job_id))?;

    match outcome {
        PollOutcome::InProgress => {
            tracing::info!(
                "Operation {} still in progress for job {}",
                operation_name,
                job.job_id
            );
            Ok(())
        }
        PollOutcome::Failed { message } => {
            tracing::error!("Recognition failed for job {}: {}", job.job_id, message);
            deliver(clients, job, CallbackPayload::error(job, message));
            Ok(())
        }
        PollOutcome::Succeeded => {
            tracing::info!(
                "Operation {} complete for job {}, collecting result",
                operation_name,
                job.job_id
            );
            match collector::collect(&clients.store, &job.output_uri, &job.job_id, &config.collector)
            {
                Ok(result) => {
                    deliver(clients, job, CallbackPayload::completed(job, result));
                    Ok(())
                }
                Err(CollectError::Timeout) => {
                    tracing::error!("Result collection timed out for job {}", job.job_id);
                    deliver(
                        clients,
                        job,
                        CallbackPayload::error(job, CollectError::Timeout.to_string()),
                    );
                    Ok(())
                }
                Err(CollectError::Fatal(e)) => {
                    tracing::error!("Result collection failed for job {}: {:#}", job.job_id, e);
                    deliver(clients, job, CallbackPayload::error(job, format!("{:#}", e)));
                    Ok(())
                }
            }
        }
    }
}

/// Fire-and-forget callback delivery. A failed POST is logged with its
/// cause and otherwise dropped; the caller's redelivery of the trigger
/// re-runs the flow, and the receiver deduplicates by job id.
fn deliver(clients: &Clients, job: &JobRequest, payload: CallbackPayload) {
    let status = payload.status;
    match clients.webhook.notify(&job.callback_url, &payload) {
        Ok(()) => {
            tracing::info!("Delivered {} callback for job {}", status, job.job_id);
        }
        Err(e) => {
            tracing::error!(
                "Failed to deliver {} callback for job {}: {:#}",
                status,
                job.job_id,
                e
            );
        }
    }
}

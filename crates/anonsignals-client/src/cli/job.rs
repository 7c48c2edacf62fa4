use super::commands::{JobAction, OutputFormat};
use super::utils::print_json;
use anonsignals_client::{CancellationToken, ClientConfig, RelayerClient, TerminalStatus, VkCache};
use anonsignals_types::{AnonError, AnonResult, SubmissionJob};
use serde_json::json;

pub async fn handle_job(
    action: JobAction,
    config: &ClientConfig,
    format: &OutputFormat,
    cancel: &CancellationToken,
) -> AnonResult<()> {
    let relayer = RelayerClient::from_config(config, VkCache::new())?;

    match action {
        JobAction::Status { job_id } => {
            let reply = relayer.status(&job_id).await?;
            match format {
                OutputFormat::Json => print_json(&reply.raw)?,
                OutputFormat::Text => println!("{}: {}", reply.job_id, reply.status),
            }
        }
        JobAction::Wait { job_id, max_attempts, interval_ms } => {
            let mut policy = relayer.polling().clone();
            if let Some(attempts) = max_attempts {
                policy.max_attempts = attempts;
            }
            if let Some(interval) = interval_ms {
                policy.interval_ms = interval;
            }
            if policy.max_attempts == 0 {
                return Err(AnonError::Config("--max-attempts must be at least 1".into()));
            }

            let mut job = SubmissionJob::submitted(job_id);
            let terminal = relayer.poll_with(&mut job, &policy, cancel).await?;

            match format {
                OutputFormat::Json => print_json(&json!({
                    "jobId": job.job_id,
                    "status": job.status.to_string(),
                    "observations": job.observations,
                    "raw": terminal.reply().map(|r| &r.raw),
                }))?,
                OutputFormat::Text => println!("{}: {}", job.job_id, job.status),
            }

            match terminal {
                TerminalStatus::TimedOut { attempts } => {
                    return Err(AnonError::VerificationTimeout { attempts })
                }
                TerminalStatus::Failed(_) | TerminalStatus::Rejected(_) => {
                    return Err(AnonError::RelayerRejected(format!(
                        "Job {} ended with status {}",
                        job.job_id, job.status
                    )))
                }
                TerminalStatus::Finalized(_) | TerminalStatus::Aggregated(_) => {}
            }
        }
    }
    Ok(())
}

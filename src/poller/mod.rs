//! # Mockup Generation Job Poller
//!
//! Orchestrates the upstream submit-then-poll protocol behind a single
//! synchronous call. Submission happens exactly once; if the immediate
//! response is already terminal no poll is issued. Otherwise a bounded loop
//! checks the task at a fixed interval, exiting on the first terminal state or
//! when the attempt budget runs out.
//!
//! A budget exhaustion is a [`PrintgateError::Timeout`] carrying the task key,
//! distinct from a hard failure, so the caller can resume polling out-of-band.
//! The inter-poll delay is a cooperative `tokio::time::sleep`: no worker is
//! held hostage for the wait, and dropping the future stops the loop promptly
//! (the upstream task itself is not cancelled).

use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::ProviderConfig;
use crate::error::{PrintgateError, Result};
use crate::provider::{Mockup, MockupProvider, MockupRequest, TaskState, TaskStatus};

pub struct JobPoller {
    provider: Arc<dyn MockupProvider>,
    poll_interval: Duration,
    max_attempts: u32,
}

impl JobPoller {
    pub fn new(provider: Arc<dyn MockupProvider>, config: &ProviderConfig) -> Self {
        Self {
            provider,
            poll_interval: config.poll_interval(),
            max_attempts: config.max_poll_attempts,
        }
    }

    /// Submit a generation request and wait for its terminal state.
    ///
    /// Worst-case wall time is `max_attempts * poll_interval` (about ten
    /// seconds at the defaults); callers needing a hard deadline should wrap
    /// this in an outer timeout no longer than that bound.
    pub async fn generate_and_await(&self, request: &MockupRequest) -> Result<Vec<Mockup>> {
        let submitted = self.provider.create_task(request).await?;
        let task_key = submitted.task_key.clone();

        info!(
            task_key = %task_key,
            product_id = request.product_id,
            "mockup generation task submitted"
        );

        if submitted.state.is_terminal() {
            debug!(task_key = %task_key, "task terminal at submission, no polling needed");
            return Self::resolve(submitted);
        }

        // Sequential poll loop for this task; concurrent tasks poll
        // independently with no shared state
        for attempt in 1..=self.max_attempts {
            tokio::time::sleep(self.poll_interval).await;

            let status = self.provider.task_status(&task_key).await?;
            match status.state {
                TaskState::Completed => {
                    info!(
                        task_key = %task_key,
                        attempts = attempt,
                        mockups = status.mockups.len(),
                        "mockup generation completed"
                    );
                    return Ok(status.mockups);
                }
                TaskState::Failed => {
                    return Err(Self::failed(&task_key, status.error));
                }
                TaskState::Pending => {
                    debug!(
                        task_key = %task_key,
                        attempt = attempt,
                        max_attempts = self.max_attempts,
                        "task still pending"
                    );
                }
            }
        }

        warn!(
            task_key = %task_key,
            attempts = self.max_attempts,
            "poll budget exhausted, reporting timeout"
        );
        Err(PrintgateError::Timeout { task_id: task_key })
    }

    /// Turn a terminal task snapshot into the call result
    fn resolve(status: TaskStatus) -> Result<Vec<Mockup>> {
        match status.state {
            TaskState::Completed => Ok(status.mockups),
            _ => Err(Self::failed(&status.task_key, status.error)),
        }
    }

    fn failed(task_key: &str, error: Option<String>) -> PrintgateError {
        PrintgateError::upstream(format!(
            "mockup generation failed (task {task_key}): {}",
            error.unwrap_or_else(|| "no detail from provider".to_string())
        ))
    }
}

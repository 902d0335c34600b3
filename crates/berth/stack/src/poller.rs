//! Stack status poller
//!
//! Each tick describes the stack once and classifies the reported status:
//!
//! | provider answer              | step                              |
//! |------------------------------|-----------------------------------|
//! | not found                    | retry (shares the retry budget)   |
//! | any other error              | stop with [`StackError::Provider`] |
//! | status in the success set    | stop with outputs                 |
//! | status in the failure set    | stop with [`StackError::Failed`]   |
//! | anything else                | retry until the budget runs out   |

use crate::config::PollConfig;
use crate::error::{StackError, StackResult};
use berth_provider::StackApi;
use berth_types::{StackDescription, StackOutputs, StackState};
use serde::Serialize;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

/// A stack that reached terminal success
#[derive(Debug, Clone, Serialize)]
pub struct StackCompletion {
    /// The described stack whose name matched the request
    pub stack: StackDescription,
    /// Its outputs, flattened
    pub outputs: StackOutputs,
    /// Poll iteration on which success was observed
    pub iterations: u32,
}

/// Outcome of a single poll
#[derive(Debug, Clone)]
pub enum PollStep {
    /// Still pending or not yet visible; poll again with `next_iteration`
    Retry {
        state: StackState,
        next_iteration: u32,
    },
    Succeeded(StackCompletion),
    Failed { status: String },
    /// Still pending when the iteration count reached the budget
    TimedOut { iterations: u32 },
}

/// Polls a stack until it settles
#[derive(Clone)]
pub struct StackPoller {
    api: Arc<dyn StackApi>,
    config: PollConfig,
}

impl StackPoller {
    pub fn new(api: Arc<dyn StackApi>, config: PollConfig) -> Self {
        Self { api, config }
    }

    pub fn config(&self) -> &PollConfig {
        &self.config
    }

    /// Poll `name` until it reaches a terminal state.
    ///
    /// Waits between polls race against `cancel`, so a cancelled token ends
    /// the wait without another describe.
    #[instrument(skip(self, cancel), fields(stack = %name))]
    pub async fn wait(&self, name: &str, cancel: &CancellationToken) -> StackResult<StackCompletion> {
        let mut iteration = 0;

        loop {
            if cancel.is_cancelled() {
                return Err(StackError::Cancelled {
                    stack: name.to_string(),
                });
            }

            match self.poll_once(name, iteration).await? {
                PollStep::Retry {
                    state,
                    next_iteration,
                } => {
                    info!(
                        stack = %name,
                        status = %state,
                        iteration = iteration,
                        interval_secs = self.config.interval_secs,
                        "Stack operation still pending, polling again"
                    );

                    tokio::select! {
                        biased;
                        _ = cancel.cancelled() => {
                            warn!(stack = %name, iteration = iteration, "Stack wait cancelled");
                            return Err(StackError::Cancelled { stack: name.to_string() });
                        }
                        _ = tokio::time::sleep(self.config.interval()) => {}
                    }

                    iteration = next_iteration;
                }
                PollStep::Succeeded(completion) => {
                    info!(
                        stack = %name,
                        status = %completion.stack.status,
                        iterations = completion.iterations,
                        "Stack operation completed"
                    );
                    return Ok(completion);
                }
                PollStep::Failed { status } => {
                    warn!(stack = %name, status = %status, "Stack in failed state, not retrying");
                    return Err(StackError::Failed {
                        stack: name.to_string(),
                        status,
                    });
                }
                PollStep::TimedOut { iterations } => {
                    warn!(
                        stack = %name,
                        iterations = iterations,
                        "Timed out waiting for stack operation to complete"
                    );
                    return Err(StackError::Timeout {
                        stack: name.to_string(),
                        iterations,
                    });
                }
            }
        }
    }

    /// Describe the stack once and decide the next step.
    ///
    /// Provider errors other than not-found end polling.
    pub async fn poll_once(&self, name: &str, iteration: u32) -> StackResult<PollStep> {
        let (state, stacks) = match self.api.describe_stacks(name).await {
            Ok(stacks) => {
                let state = stacks
                    .iter()
                    .find(|s| s.name == name)
                    .map(StackDescription::state)
                    .unwrap_or(StackState::Nonexistent);
                (state, stacks)
            }
            Err(err) if err.is_not_found() => {
                debug!(stack = %name, iteration = iteration, "Stack not visible yet");
                (StackState::Nonexistent, Vec::new())
            }
            Err(err) => return Err(StackError::provider(name, err)),
        };

        let step = match state {
            StackState::Succeeded(_) => {
                // A succeeded state implies a matching stack was described
                let stack = stacks
                    .iter()
                    .find(|s| s.name == name)
                    .cloned()
                    .ok_or_else(|| StackError::NotFound {
                        stack: name.to_string(),
                    })?;
                PollStep::Succeeded(StackCompletion {
                    outputs: StackOutputs::from_matching(name, &stacks),
                    stack,
                    iterations: iteration,
                })
            }
            StackState::Failed(status) => PollStep::Failed { status },
            pending @ (StackState::Pending(_) | StackState::Nonexistent) => {
                if iteration >= self.config.max_retries {
                    PollStep::TimedOut {
                        iterations: iteration,
                    }
                } else {
                    PollStep::Retry {
                        state: pending,
                        next_iteration: iteration + 1,
                    }
                }
            }
        };

        Ok(step)
    }
}

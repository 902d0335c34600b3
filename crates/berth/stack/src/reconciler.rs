//! Stack reconciler
//!
//! The provider has no upsert. The reconciler tries an update first and
//! falls back to create when the stack does not exist; "no updates" is a
//! no-op that still goes through polling so the caller always receives the
//! settled stack's outputs.

use crate::config::PollConfig;
use crate::error::{StackError, StackResult};
use crate::poller::{StackCompletion, StackPoller};
use berth_provider::StackApi;
use berth_types::StackRequest;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};

/// Which provider operation the reconciliation ended up issuing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReconcileAction {
    Updated,
    Created,
    /// The stack already matched the request
    Unchanged,
}

impl fmt::Display for ReconcileAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ReconcileAction::Updated => "updated",
            ReconcileAction::Created => "created",
            ReconcileAction::Unchanged => "unchanged",
        };
        f.write_str(name)
    }
}

/// Result of a successful reconciliation
#[derive(Debug, Clone, Serialize)]
pub struct Reconciliation {
    pub action: ReconcileAction,
    pub completion: StackCompletion,
}

/// Converges a stack onto a request and waits for it to settle
#[derive(Clone)]
pub struct StackReconciler {
    api: Arc<dyn StackApi>,
    poller: StackPoller,
}

impl StackReconciler {
    pub fn new(api: Arc<dyn StackApi>, config: PollConfig) -> Self {
        let poller = StackPoller::new(api.clone(), config);
        Self { api, poller }
    }

    pub fn poller(&self) -> &StackPoller {
        &self.poller
    }

    /// Update or create the stack, then poll it to a terminal state.
    ///
    /// Create and update failures are not retried.
    #[instrument(skip(self, request, cancel), fields(stack = %request.name(), provider = %self.api.name()))]
    pub async fn reconcile(
        &self,
        request: &StackRequest,
        cancel: &CancellationToken,
    ) -> StackResult<Reconciliation> {
        let name = request.name();
        info!(stack = %name, "Updating stack");

        let action = match self.api.update_stack(request).await {
            Ok(()) => {
                info!(stack = %name, "Stack update started");
                ReconcileAction::Updated
            }
            Err(err) if err.is_no_updates() => {
                info!(stack = %name, "No updates to be performed");
                ReconcileAction::Unchanged
            }
            Err(err) if err.is_not_found() => {
                info!(stack = %name, "Stack does not exist, creating it");
                self.api
                    .create_stack(request)
                    .await
                    .map_err(|e| StackError::provider(name, e))?;
                info!(stack = %name, "Stack creation started");
                ReconcileAction::Created
            }
            Err(err) => {
                warn!(stack = %name, error = %err, "Stack update rejected");
                return Err(StackError::provider(name, err));
            }
        };

        let completion = self.poller.wait(name, cancel).await?;
        Ok(Reconciliation { action, completion })
    }
}

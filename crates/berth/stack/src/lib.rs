//! Berth stack convergence
//!
//! Drives a declarative infrastructure stack to a requested template and waits
//! for the provider to settle:
//!
//! - [`StackReconciler`] simulates an upsert on top of separate update and
//!   create operations
//! - [`StackPoller`] polls status at a fixed interval until a terminal state,
//!   a retry budget, or cancellation
//! - [`ClusterLookup`] resolves the outputs of a stack that must already exist
//!
//! Callers must serialise reconciliations per stack name; nothing here guards
//! against two runs converging the same stack concurrently.
//!
//! ## Usage
//!
//! ```no_run
//! use berth_provider::InMemoryStackApi;
//! use berth_stack::{PollConfig, StackReconciler};
//! use berth_types::{Capability, StackRequest};
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let api = Arc::new(InMemoryStackApi::new());
//! let reconciler = StackReconciler::new(api, PollConfig::default());
//!
//! let request = StackRequest::new("app-x-dev", serde_json::json!({"Resources": {}}))
//!     .with_capability(Capability::Iam);
//! let result = reconciler.reconcile(&request, &CancellationToken::new()).await?;
//! println!("{:?}: {:?}", result.action, result.completion.outputs);
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![cfg_attr(feature = "strict-docs", warn(missing_docs))]
#![cfg_attr(not(feature = "strict-docs"), allow(missing_docs))]

pub mod config;
pub mod error;
pub mod lookup;
pub mod poller;
pub mod reconciler;

pub use config::PollConfig;
pub use error::{StackError, StackResult};
pub use lookup::ClusterLookup;
pub use poller::{PollStep, StackCompletion, StackPoller};
pub use reconciler::{ReconcileAction, Reconciliation, StackReconciler};

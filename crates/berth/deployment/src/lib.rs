//! Berth deployment orchestration
//!
//! Deploys one application to one environment per call:
//!
//! 1. resolve the cluster stack's outputs (cluster name, load balancer
//!    security group)
//! 2. look for an existing application stack and carry its task role forward
//! 3. register a task definition, reconcile the application stack and
//!    create or update the service
//!
//! Every deployment ends in exactly one [`DeploymentEvent::Completed`] or
//! [`DeploymentEvent::Failed`] event and the same outcome is returned to the
//! caller.

#![deny(unsafe_code)]
#![cfg_attr(feature = "strict-docs", warn(missing_docs))]
#![cfg_attr(not(feature = "strict-docs"), allow(missing_docs))]

pub mod catalog;
pub mod error;
pub mod events;
pub mod orchestrator;
pub mod release;
pub mod template;

pub use catalog::{AppCatalog, AppConfig, EnvironmentConfig, ResourceTag, Target};
pub use error::{DeployError, DeployResult};
pub use events::{DeploymentEvent, DeploymentEventEnvelope};
pub use orchestrator::{DeployRequest, DeploymentOrchestrator, DeploymentReport};

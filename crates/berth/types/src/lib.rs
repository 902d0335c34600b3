//! Berth core types
//!
//! The data model shared by every berth crate: declarative stack requests and
//! the provider's view of stack state, task definition revisions, service
//! specifications, and the error taxonomy reported by provider adapters.
//!
//! Nothing here talks to a provider. Stack state is always a view onto
//! provider-side records and is re-fetched by the poller on every tick.

#![deny(unsafe_code)]
#![cfg_attr(feature = "strict-docs", warn(missing_docs))]
#![cfg_attr(not(feature = "strict-docs"), allow(missing_docs))]

pub mod error;
pub mod service;
pub mod stack;
pub mod task;

pub use error::{ProviderError, ProviderErrorKind, ProviderResult};
pub use service::{
    ClusterSummary, DeploymentConfiguration, LoadBalancerBinding, ServiceSpec, ServiceSummary,
    ServiceUpdate,
};
pub use stack::{
    Capability, StackDescription, StackOutput, StackOutputs, StackParameter, StackRequest,
    StackState, FAILED_STATUSES, SUCCEEDED_STATUSES,
};
pub use task::{
    ContainerDefinition, EnvironmentVariable, LogConfiguration, PortMapping, TaskDefinitionRef,
    TaskDefinitionSpec,
};

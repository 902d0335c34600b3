//! Berth service publication
//!
//! Publishes a release onto the scheduler in two non-transactional phases:
//! a new task definition revision is registered, then the owning stack is
//! reconciled and the scheduled service is created or, on every later
//! deployment, updated to the new revision.
//!
//! The service is managed directly rather than through the stack because
//! stack operations touching services were observed to hang. The price is
//! that create-only fields (role, load balancers, desired count, deployment
//! configuration) cannot be changed after the first deployment.

#![deny(unsafe_code)]
#![cfg_attr(feature = "strict-docs", warn(missing_docs))]
#![cfg_attr(not(feature = "strict-docs"), allow(missing_docs))]

pub mod blueprint;
pub mod error;
pub mod publisher;

pub use blueprint::{Release, ServiceBlueprint};
pub use error::{PublishError, PublishResult};
pub use publisher::{Publication, ServiceAction, ServicePublisher};

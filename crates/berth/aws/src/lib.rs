//! Berth AWS adapters
//!
//! Implements [`berth_provider::StackApi`] on CloudFormation and
//! [`berth_provider::SchedulingApi`] on ECS. Each adapter owns its own SDK
//! client built from an explicit region and profile; nothing is read from
//! process-wide client configuration after construction.
//!
//! Provider errors are classified by structured error code first. The
//! CloudFormation "no updates" and "does not exist" conditions share a
//! `ValidationError` code and ECS reports a duplicate create as an
//! `InvalidParameterException`, so those still fall back to message text.

#![deny(unsafe_code)]
#![cfg_attr(feature = "strict-docs", warn(missing_docs))]
#![cfg_attr(not(feature = "strict-docs"), allow(missing_docs))]

pub mod cloudformation;
pub mod config;
pub mod ecs;
pub mod error;

pub use cloudformation::AwsStackApi;
pub use config::AwsSettings;
pub use ecs::AwsSchedulingApi;
pub use error::{classify_cloudformation, classify_ecs};

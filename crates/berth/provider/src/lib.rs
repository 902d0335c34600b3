//! Berth provider capabilities
//!
//! The two provider API surfaces the deployment core depends on, expressed as
//! async traits so that real adapters (`berth-aws`) and the in-memory
//! simulations in [`memory`] are interchangeable.
//!
//! ## Architectural Boundaries
//!
//! - `berth-provider` owns: the capability contracts and simulated providers
//! - `berth-aws` owns: mapping the contracts onto a concrete cloud SDK
//! - `berth-stack` / `berth-service` own: every decision made on top of them
//!
//! Implementations classify failures into [`berth_types::ProviderErrorKind`];
//! they never retry on their own.

#![deny(unsafe_code)]
#![cfg_attr(feature = "strict-docs", warn(missing_docs))]
#![cfg_attr(not(feature = "strict-docs"), allow(missing_docs))]

pub mod api;
pub mod memory;

pub use api::{SchedulingApi, StackApi};
pub use memory::{
    InMemorySchedulingApi, InMemoryStackApi, SchedulingCall, SchedulingOperation, StackCall,
    StackOperation,
};

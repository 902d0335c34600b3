//! In-memory simulated providers
//!
//! Used by tests and by the CLI's `memory` provider for dry runs. Both
//! simulations keep a journal of every call they receive and accept injected
//! failures per operation.

mod scheduling;
mod stack;

pub use scheduling::{InMemorySchedulingApi, SchedulingCall, SchedulingOperation};
pub use stack::{InMemoryStackApi, StackCall, StackOperation};

use std::sync::{Mutex, MutexGuard};

/// Append-only record of calls received by a simulated provider
#[derive(Debug)]
pub(crate) struct Journal<T>(Mutex<Vec<T>>);

impl<T: Clone> Journal<T> {
    pub(crate) fn new() -> Self {
        Self(Mutex::new(Vec::new()))
    }

    pub(crate) fn record(&self, call: T) {
        self.lock().push(call);
    }

    pub(crate) fn snapshot(&self) -> Vec<T> {
        self.lock().clone()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<T>> {
        // A panicking test thread must not hide the calls made before it
        self.0.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

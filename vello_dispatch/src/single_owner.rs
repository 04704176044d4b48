// Copyright 2025 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Debug-only check that a context is used from the thread that created it.

#[cfg(debug_assertions)]
use std::thread::{self, ThreadId};

/// Remembers the creating thread in debug builds. Zero-sized otherwise.
#[derive(Clone, Debug)]
pub(crate) struct SingleOwner {
    #[cfg(debug_assertions)]
    owner: ThreadId,
}

impl SingleOwner {
    pub(crate) fn new() -> Self {
        Self {
            #[cfg(debug_assertions)]
            owner: thread::current().id(),
        }
    }

    /// Panics in debug builds when called from another thread.
    #[inline]
    #[track_caller]
    pub(crate) fn assert_owner(&self) {
        #[cfg(debug_assertions)]
        assert_eq!(
            self.owner,
            thread::current().id(),
            "context used from a thread other than its owner"
        );
    }
}

impl Default for SingleOwner {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn owner_thread_passes() {
        SingleOwner::new().assert_owner();
    }

    #[cfg(debug_assertions)]
    #[test]
    fn other_threads_are_caught() {
        let guard = SingleOwner::new();
        let result = std::thread::spawn(move || {
            std::panic::catch_unwind(|| guard.assert_owner()).is_err()
        })
        .join()
        .unwrap();
        assert!(result);
    }
}

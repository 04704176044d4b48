// Copyright 2025 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Where flushed work goes.

use std::cell::{Ref, RefCell};
use std::fmt;
use std::rc::Rc;
use std::sync::Arc;

use crate::draw_target::{self, RecordedBatch};
use crate::render_target::{RenderTarget, RenderTargetId};

/// The recorded work of one closed draw target.
#[derive(Clone, Debug, PartialEq)]
pub struct Submission {
    /// The target the batches draw into.
    pub render_target: Arc<RenderTarget>,
    /// Batches in recording order.
    pub batches: Vec<RecordedBatch>,
    /// Render targets whose earlier submissions must execute first.
    pub dependencies: Vec<RenderTargetId>,
}

impl Submission {
    /// An earlier batch the batch at `index` may be merged into.
    ///
    /// Only the last few batches are considered, and the search stops at the
    /// first incompatible batch that overlaps, since drawing past it would
    /// change the result. `None` when nothing qualifies.
    pub fn combine_candidate(&self, index: usize) -> Option<usize> {
        draw_target::combine_candidate(&self.batches, index)
    }
}

/// Receives submissions when a [`Context`](crate::Context) flushes.
///
/// Submissions arrive in the order their draw targets were created.
pub trait CommandSink {
    /// Take one submission.
    fn submit(&mut self, submission: Submission);
}

impl fmt::Debug for dyn CommandSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("dyn CommandSink")
    }
}

/// A sink that keeps every submission in memory.
///
/// Clones share the same storage, so a clone kept by the caller sees what the
/// context submitted.
#[derive(Clone, Debug, Default)]
pub struct RecordingSink {
    submissions: Rc<RefCell<Vec<Submission>>>,
}

impl RecordingSink {
    /// An empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything submitted so far.
    pub fn submissions(&self) -> Ref<'_, Vec<Submission>> {
        self.submissions.borrow()
    }

    /// Take everything submitted so far, leaving the sink empty.
    pub fn take(&self) -> Vec<Submission> {
        self.submissions.take()
    }

    /// Number of submissions so far.
    pub fn len(&self) -> usize {
        self.submissions.borrow().len()
    }

    /// Whether nothing was submitted yet.
    pub fn is_empty(&self) -> bool {
        self.submissions.borrow().is_empty()
    }
}

impl CommandSink for RecordingSink {
    fn submit(&mut self, submission: Submission) {
        self.submissions.borrow_mut().push(submission);
    }
}

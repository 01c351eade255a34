//! End-of-cycle update pump.
//!
//! Caret and review cursor moves can arrive many times per processing cycle.
//! Instead of forwarding each one, the handler records the latest move in
//! the [`UpdatePump`] and [`VisionHandler::pump_cycle`] flushes it once.
//!
//! A cycle runs, in order:
//!
//! 1. calls queued with [`VisionHandler::call_after`]
//! 2. the pending review update
//! 3. the pending caret update, dropped if its object died
//! 4. one refresh of the assigned highlighter

use horizon_vision_core::logging::{span_names, targets};
use horizon_vision_core::{AccessibleId, PerfSpan};

use crate::handler::VisionHandler;
use crate::role::{Context, Role};

/// Pending deferred updates. At most one of each kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdatePump {
    pending_review: Option<Context>,
    pending_caret: Option<AccessibleId>,
}

impl UpdatePump {
    /// Create an empty pump.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a review move. A later mark replaces an earlier one.
    pub fn mark_review(&mut self, context: Context) {
        self.pending_review = Some(context);
    }

    /// Record a caret move. A later mark replaces an earlier one.
    ///
    /// The object is held as a non-owning handle; if it dies before the
    /// flush, the update is dropped.
    pub fn mark_caret(&mut self, object: AccessibleId) {
        self.pending_caret = Some(object);
    }

    /// Take the pending review context.
    pub fn take_review(&mut self) -> Option<Context> {
        self.pending_review.take()
    }

    /// Take the pending caret object.
    pub fn take_caret(&mut self) -> Option<AccessibleId> {
        self.pending_caret.take()
    }

    /// The pending review context, if any.
    pub fn pending_review(&self) -> Option<Context> {
        self.pending_review
    }

    /// The pending caret object, if any.
    pub fn pending_caret(&self) -> Option<AccessibleId> {
        self.pending_caret
    }

    /// Whether any update is pending.
    pub fn has_pending(&self) -> bool {
        self.pending_review.is_some() || self.pending_caret.is_some()
    }

    /// Drop every pending update.
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

/// What happened to the pending caret update in a cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CaretFlush {
    /// Nothing was pending.
    #[default]
    Idle,
    /// The caret object was still alive and its update was pushed.
    Flushed,
    /// The caret object died before the flush.
    Dropped,
}

/// Summary of one pump cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// Number of deferred calls run.
    pub deferred_calls: usize,
    /// The review context flushed, if any.
    pub review: Option<Context>,
    /// Outcome of the caret flush.
    pub caret: CaretFlush,
    /// Whether a highlighter was refreshed.
    pub refreshed: bool,
}

impl VisionHandler {
    /// Run one end-of-cycle flush.
    ///
    /// Call once per iteration of the host's event loop, after every event
    /// of that iteration has been handled.
    pub fn pump_cycle(&mut self) -> CycleReport {
        self.affinity.debug_assert_same_thread();
        let _perf = PerfSpan::new(span_names::PUMP_CYCLE);

        // Calls queued while these run wait for the next cycle.
        let deferred = std::mem::take(&mut self.deferred);
        let mut report = CycleReport {
            deferred_calls: deferred.len(),
            ..CycleReport::default()
        };
        for call in deferred {
            call(self);
        }

        report.review = self.flush_review();
        report.caret = self.flush_caret();
        report.refreshed = self.refresh_highlighter();
        tracing::trace!(target: targets::PUMP, ?report, "pump cycle complete");
        report
    }

    fn flush_review(&mut self) -> Option<Context> {
        let context = self.pump.take_review()?;
        if context.is_review() {
            self.track_magnifier(context, None);
        }
        for positioned in [Context::Navigator, Context::Review] {
            self.update_highlighter(positioned, None);
        }
        Some(context)
    }

    fn flush_caret(&mut self) -> CaretFlush {
        let Some(object) = self.pump.take_caret() else {
            return CaretFlush::Idle;
        };
        if !self.objects.is_alive(object) {
            tracing::debug!(target: targets::PUMP, "caret object died before flush, dropping update");
            return CaretFlush::Dropped;
        }
        self.update_now(Context::Caret, Some(object));
        CaretFlush::Flushed
    }

    fn refresh_highlighter(&mut self) -> bool {
        let Some(instance) = self.assignments[Role::Highlighter.index()]
            .and_then(|id| self.instances.get_mut(id))
        else {
            return false;
        };
        if let Err(err) = instance.refresh() {
            tracing::warn!(target: targets::PUMP, %err, "highlighter refresh failed");
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use slotmap::KeyData;

    use super::*;

    #[test]
    fn test_latest_mark_wins() {
        let mut pump = UpdatePump::new();
        assert!(!pump.has_pending());
        pump.mark_review(Context::Review);
        pump.mark_review(Context::Navigator);
        assert_eq!(pump.take_review(), Some(Context::Navigator));
        assert_eq!(pump.take_review(), None);
    }

    #[test]
    fn test_clear() {
        let mut pump = UpdatePump::new();
        pump.mark_review(Context::Review);
        pump.mark_caret(AccessibleId::from(KeyData::from_ffi(1)));
        assert!(pump.has_pending());
        pump.clear();
        assert_eq!(pump, UpdatePump::default());
    }
}

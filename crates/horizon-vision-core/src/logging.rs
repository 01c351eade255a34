//! Logging facilities for Horizon Vision.
//!
//! Horizon Vision uses the `tracing` crate for instrumentation. To see logs,
//! install a tracing subscriber in your application:
//!
//! ```ignore
//! fn main() {
//!     tracing_subscriber::fmt()
//!         .with_env_filter("horizon_vision=debug")
//!         .init();
//! }
//! ```
//!
//! Provider lifecycle transitions are logged at `debug`, per-event rectangle
//! updates at `trace`. Failures that the engine recovers from on its own
//! (a provider that fails to start from configuration, a teardown error) are
//! logged at `warn` or `error` and never surfaced to the caller.

/// Span names used throughout Horizon Vision for tracing.
pub mod span_names {
    /// A `set_provider` role assignment.
    pub const SET_PROVIDER: &str = "horizon_vision::set_provider";
    /// One end-of-cycle pump flush.
    pub const PUMP_CYCLE: &str = "horizon_vision::pump_cycle";
    /// Handler teardown.
    pub const TERMINATE: &str = "horizon_vision::terminate";
}

/// Target names for log filtering.
///
/// Use these with `tracing` directives to filter logs by subsystem.
pub mod targets {
    /// Engine-wide target.
    pub const VISION: &str = "horizon_vision";
    /// Vision handler (role assignment, event routing).
    pub const HANDLER: &str = "horizon_vision::handler";
    /// Provider instance lifecycle.
    pub const INSTANCE: &str = "horizon_vision::instance";
    /// Provider registry.
    pub const REGISTRY: &str = "horizon_vision::registry";
    /// Update pump.
    pub const PUMP: &str = "horizon_vision::pump";
    /// Configuration.
    pub const CONFIG: &str = "horizon_vision::config";
    /// Built-in providers.
    pub const PROVIDERS: &str = "horizon_vision::providers";
}

/// A guard that keeps a tracing span entered until dropped.
///
/// Useful for measuring how long an operation held the event thread.
#[derive(Debug)]
pub struct PerfSpan {
    #[allow(dead_code)]
    span: tracing::span::EnteredSpan,
}

impl PerfSpan {
    /// Create a new performance span.
    ///
    /// The span will be active until the guard is dropped.
    pub fn new(name: &'static str) -> Self {
        let span = tracing::debug_span!(target: "horizon_vision::perf", "perf", operation = name);
        Self {
            span: span.entered(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_perf_span() {
        // Just ensure it compiles and doesn't panic
        let _span = PerfSpan::new(span_names::PUMP_CYCLE);
        tracing::debug!(target: targets::VISION, operation = "test", "inside perf span");
    }

    #[test]
    fn test_targets_share_prefix() {
        for target in [
            targets::HANDLER,
            targets::INSTANCE,
            targets::REGISTRY,
            targets::PUMP,
            targets::CONFIG,
            targets::PROVIDERS,
        ] {
            assert!(target.starts_with(targets::VISION));
        }
    }
}

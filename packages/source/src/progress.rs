//! Progress reporting for long preprocessing runs.
//!
//! Preprocessing code reports through [`ProgressCallback`] and never knows
//! how (or whether) progress is rendered. Terminal progress bars live in
//! `water_route_cli_utils`.

/// Sink for progress updates of one long-running operation.
///
/// Must be `Send + Sync`: rayon workers and tokio tasks report into the
/// same shared sink.
pub trait ProgressCallback: Send + Sync {
    /// Set the total expected units of work.
    fn set_total(&self, total: u64);

    /// Advance progress by `delta` units.
    fn inc(&self, delta: u64);

    /// Replace the message shown next to the indicator.
    fn set_message(&self, msg: String);

    /// Mark the operation as complete.
    fn finish(&self, msg: String);
}

/// Discards all progress updates.
pub struct NullProgress;

impl ProgressCallback for NullProgress {
    fn set_total(&self, _total: u64) {}
    fn inc(&self, _delta: u64) {}
    fn set_message(&self, _msg: String) {}
    fn finish(&self, _msg: String) {}
}

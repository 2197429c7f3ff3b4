use std::sync::Arc;

/// A caller-defined unit of scan work. Implementations carry whatever
/// command/target parameters their backend needs; the orchestrator itself
/// only ever reads the label.
pub trait Task: Send + Sync + 'static {
    /// Caller-assigned identity, unique among live tasks. The orchestrator
    /// does not police uniqueness; a duplicate label voids the at-most-once
    /// callback guarantee for that label.
    fn label(&self) -> &str;
}

/// Completion notification, fired at most once per task label. `success`
/// reports whether the orchestration completed the container's lifecycle and
/// retrieved its results; the scan tool's own exit code lives in the
/// persisted record.
///
/// The callback runs on orchestrator threads while internal locks are held:
/// it must not call `enqueue` or `shutdown` synchronously. Hand follow-up
/// work to your own channel or queue instead.
pub type CompletionCallback<T> = Arc<dyn Fn(&T, bool) + Send + Sync>;

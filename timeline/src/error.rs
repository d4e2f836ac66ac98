use thiserror::Error;

/// Errors surfaced by the public API of a [`Timeline`](crate::Timeline).
///
/// Most failure modes described by the data model are deliberately *not*
/// constructed errors: a rollback past the ends of recorded history is a
/// silent no-op (see [`Timeline::reset_state`](crate::Timeline::reset_state)),
/// and a panicking recompute/reducer/listener unwinds through
/// `update_node_value`/`fetch_node_value` rather than being caught and
/// wrapped. Those policies are documented on the variants below even though
/// the variants themselves are never returned, so the enum stays a complete
/// map of this crate's failure modes for callers who want to reason about
/// (or wrap) them.
#[derive(Error, Debug)]
pub enum TimelineError {
    /// Raised by any API that requires the ambient (global) timeline when
    /// [`Timeline::initialize`](crate::Timeline::initialize) has not been
    /// called, or when it was called more than once.
    #[error("no timeline has been initialized in this process")]
    UninitializedTimeline,

    /// A global timeline was already installed when `initialize` was called
    /// again.
    #[error("a timeline has already been initialized in this process")]
    AlreadyInitialized,

    /// Documents the policy for a user-supplied `recompute`, reducer, or
    /// listener that panics: the panic unwinds out of `update_node_value` or
    /// `fetch_node_value` rather than being caught. Catching would require
    /// `catch_unwind` plus `UnwindSafe` bounds on arbitrary user closures,
    /// which this crate does not impose. This variant is never constructed;
    /// it exists so the error type documents the behavior for host
    /// applications that want to wrap calls in `catch_unwind` themselves.
    #[error("a user-supplied computation panicked during propagation")]
    UserComputationFailure,

    /// Documents that rolling back to a frame with no recorded snapshot is a
    /// silent no-op, not an error — it lets callers walk `rollback_state`/
    /// `next_state` past the ends of history without special-casing the
    /// boundary. Never constructed.
    #[error("the requested frame has no recorded snapshot")]
    HistoryMiss,

    /// Documents that `rollback_state`/`next_state`/`reset_state` are silent
    /// no-ops when the timeline was built with `time_travel: false`. Never
    /// constructed.
    #[error("time travel is not enabled on this timeline")]
    UnsupportedOperation,
}

use std::{any::Any, future::Future, pin::Pin, rc::Rc};

use crate::timeline::{Timeline, TimelineInner};

// `RecomputeFn` takes `&Timeline`, not `&mut TimelineInner`: a recompute may
// need to sample an arbitrary `Behavior` (e.g. `gate`), and a node-valued
// behavior samples through `Timeline::fetch_node_value`, which takes and
// releases the coarse lock itself. Handing recompute a `&mut TimelineInner`
// that is already borrowed from an outer call would make that nested sample
// a second, overlapping `RefCell::borrow_mut` and panic; going through
// `&Timeline` keeps every lock acquisition short-lived and non-overlapping,
// the same discipline `update_node_value` uses for listener invocation.

slotmap::new_key_type! {
    /// Opaque, generational identifier for a node in a [`Timeline`](crate::Timeline).
    ///
    /// A `NodeId` from one timeline is never valid in another, and a stale id
    /// from a disposed timeline cannot alias a live node — the same guarantee
    /// `slotmap` gives `leptos_reactive`'s own node ids.
    pub struct NodeId;
}

pub(crate) type RawValue = Rc<dyn Any>;

/// Reads the current values of a node's declared parents out of the timeline
/// and produces the node's new raw value. Captured at node-construction time;
/// must be pure with respect to anything it reads through the timeline.
pub(crate) type RecomputeFn = Rc<dyn Fn(&Timeline) -> RawValue>;

/// Runs once per external update for nodes that requested it, before step 1
/// of the *next* update — this is how event nodes fall back to `None`.
pub(crate) type OnNextFrame = Box<dyn FnMut(&mut TimelineInner)>;

/// Runs during `reset_state`, after the node's raw value has been restored
/// from the snapshot, so a fold node can truncate and replay its internal
/// event log.
pub(crate) type OnRollback = Box<dyn FnMut(&mut TimelineInner, u64)>;

/// A user-registered synchronous listener. Takes the owning [`Timeline`]
/// handle — not `&TimelineInner` — because a listener is allowed to call
/// back into `send`/`set` on the same thread (reentrancy); it is invoked
/// with no `RefCell` borrow of `TimelineInner` held, so it is free to
/// re-lock the timeline itself.
pub(crate) type SyncListener = Rc<dyn Fn(&Timeline, &RawValue)>;

pub(crate) type AsyncListenerFuture = Pin<Box<dyn Future<Output = ()>>>;
pub(crate) type AsyncListener = Rc<dyn Fn(RawValue) -> AsyncListenerFuture>;

/// A token returned from listener registration, used to unregister later.
/// Never a raw pointer back from listener to node — the same discipline
/// `flatten`'s outer-state subscription needs, and for the same reason:
/// inner state must be able to outlive a torn-down outer subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncListenerToken(pub(crate) NodeId, pub(crate) usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AsyncListenerToken(pub(crate) NodeId, pub(crate) usize);

/// One vertex in the reactive graph.
///
/// Nodes do not know their children; the timeline owns the adjacency, so a
/// node never holds a back-reference that could keep a cycle alive.
pub(crate) struct Node {
    pub(crate) value: RawValue,
    pub(crate) dirty: bool,
    /// `None` for input (leaf) nodes — their value is only ever written by
    /// `update_node_value`, never pulled through a parent recompute.
    pub(crate) recompute: Option<RecomputeFn>,
    pub(crate) on_next_frame: Option<OnNextFrame>,
    pub(crate) on_rollback: Option<OnRollback>,
    pub(crate) label: Option<String>,
    /// Whether writes to this node bump the frame counter and are logged to
    /// the event trace when time travel is enabled.
    pub(crate) external: bool,
    pub(crate) sync_listeners: Vec<Option<SyncListener>>,
    pub(crate) async_listeners: Vec<Option<AsyncListener>>,
}

impl Node {
    pub(crate) fn has_listeners(&self) -> bool {
        self.sync_listeners.iter().any(Option::is_some)
            || self.async_listeners.iter().any(Option::is_some)
    }
}

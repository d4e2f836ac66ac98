#![forbid(unsafe_code)]

use std::{
    cell::RefCell,
    fmt::{self, Debug},
    rc::Rc,
    sync::OnceLock,
};

use indexmap::IndexSet;
use parking_lot::ReentrantMutex;
use rustc_hash::{FxHashMap, FxHashSet};
use slotmap::{SecondaryMap, SlotMap};
use tracing::instrument;

use crate::{
    error::TimelineError,
    node::{
        AsyncListener, AsyncListenerToken, Node, OnNextFrame, OnRollback,
        RawValue, RecomputeFn, SyncListener, SyncListenerToken,
    },
    NodeId,
};

/// Plain configuration passed to [`Timeline::initialize`].
///
/// The core has no filesystem or environment concerns of its own — there is
/// no config *file* format here — but this derives `Debug, Clone, Default`
/// so a host application's own config layer can deserialize one and pass it
/// straight through.
#[derive(Debug, Clone, Copy, Default)]
pub struct TimelineConfig {
    /// Enables frame snapshots, the event trace, and `rollback_state`/
    /// `next_state`/`reset_state`. Disabled, those three become silent
    /// no-ops and no snapshot bookkeeping is paid for.
    pub time_travel: bool,
    /// When true, a derived node with neither sync nor async listeners is
    /// marked dirty but not recomputed until something actually samples it.
    /// When false, every derived node recomputes eagerly as its parents
    /// change, regardless of whether anything observes it.
    pub lazy: bool,
    /// Gates the crate's own verbose `tracing` spans in addition to
    /// whatever filter the host's subscriber applies, so a single timeline
    /// can be opted into chatty tracing without a global log-level change.
    pub debug: bool,
}

pub(crate) struct ExternalEvent {
    pub(crate) node: NodeId,
    pub(crate) value: RawValue,
}

impl Debug for ExternalEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExternalEvent").field("node", &self.node).finish()
    }
}

struct Snapshot {
    /// Value plus dirty flag, so a lazy derived node that was never sampled
    /// before the snapshot was taken is restored still dirty rather than
    /// resurrected with its untyped placeholder marked clean.
    values: FxHashMap<NodeId, (RawValue, bool)>,
    children: FxHashMap<NodeId, Vec<NodeId>>,
}

/// Lazily constructed background producer for a [`Timeline`]'s clock. See
/// [`Timeline::clock`].
pub type ClockFactory =
    Box<dyn Fn(&Timeline) -> crate::event::Event<std::time::Duration>>;

/// The shared, mutation-guarded state of a [`Timeline`].
///
/// This is the single coarse lock's payload: node creation, adjacency
/// edits, `fetch_node_value`, `update_node_value`, and `reset_state` all run
/// with this borrowed mutably, so none of those operations can observe a
/// half-updated graph from another call.
pub(crate) struct TimelineInner {
    pub(crate) nodes: SlotMap<NodeId, Node>,
    pub(crate) children: SecondaryMap<NodeId, Vec<NodeId>>,
    pub(crate) external_nodes: FxHashSet<NodeId>,
    pub(crate) latest_frame: u64,
    pub(crate) current_frame: u64,
    pub(crate) event_trace: Vec<ExternalEvent>,
    history: FxHashMap<u64, Snapshot>,
    pending_next_frame: Vec<NodeId>,
    update_depth: u32,
    pub(crate) config: TimelineConfig,
    pub(crate) paused: Option<NodeId>,
    pub(crate) clock: Option<NodeId>,
    clock_factory: Option<ClockFactory>,
}

impl TimelineInner {
    fn new(config: TimelineConfig, clock_factory: Option<ClockFactory>) -> Self {
        Self {
            nodes: SlotMap::with_key(),
            children: SecondaryMap::new(),
            external_nodes: FxHashSet::default(),
            latest_frame: 0,
            current_frame: 0,
            event_trace: Vec::new(),
            history: FxHashMap::default(),
            pending_next_frame: Vec::new(),
            update_depth: 0,
            config,
            paused: None,
            clock: None,
            clock_factory,
        }
    }

    pub(crate) fn node(&self, id: NodeId) -> &Node {
        self.nodes.get(id).expect("dangling NodeId used against its timeline")
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut Node {
        self.nodes
            .get_mut(id)
            .expect("dangling NodeId used against its timeline")
    }

    fn children_of(&self, id: NodeId) -> &[NodeId] {
        self.children.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    // ---- node factories --------------------------------------------------

    pub(crate) fn create_node(
        &mut self,
        initial: RawValue,
        external: bool,
        on_next_frame: Option<OnNextFrame>,
        on_rollback: Option<OnRollback>,
        label: Option<String>,
    ) -> NodeId {
        let id = self.nodes.insert(Node {
            value: initial,
            dirty: false,
            recompute: None,
            on_next_frame,
            on_rollback,
            label,
            external,
            sync_listeners: Vec::new(),
            async_listeners: Vec::new(),
        });
        self.children.insert(id, Vec::new());
        if external {
            self.external_nodes.insert(id);
        }
        id
    }

    /// Registers `child` as a dependent of every id in `parents`, created
    /// dirty: derived nodes compute their first value lazily on the first
    /// read, the same way `leptos_reactive` creates memos already-dirty
    /// rather than eagerly evaluating them at construction.
    pub(crate) fn create_derived_node(
        &mut self,
        parents: &[NodeId],
        recompute: RecomputeFn,
        on_next_frame: Option<OnNextFrame>,
        label: Option<String>,
    ) -> NodeId {
        let id = self.nodes.insert(Node {
            value: Rc::new(()),
            dirty: true,
            recompute: Some(recompute),
            on_next_frame,
            on_rollback: None,
            label,
            external: false,
            sync_listeners: Vec::new(),
            async_listeners: Vec::new(),
        });
        self.children.insert(id, Vec::new());
        for parent in parents {
            self.children
                .entry(*parent)
                .expect("parent NodeId not registered in adjacency table")
                .or_default()
                .push(id);
        }
        id
    }

    // ---- listeners --------------------------------------------------------

    pub(crate) fn register_sync_listener(
        &mut self,
        node: NodeId,
        listener: SyncListener,
    ) -> SyncListenerToken {
        let slot = self.node_mut(node).sync_listeners.len();
        self.node_mut(node).sync_listeners.push(Some(listener));
        SyncListenerToken(node, slot)
    }

    pub(crate) fn unregister_sync_listener(&mut self, token: SyncListenerToken) {
        if let Some(slot) = self.node_mut(token.0).sync_listeners.get_mut(token.1) {
            *slot = None;
        }
    }

    pub(crate) fn register_async_listener(
        &mut self,
        node: NodeId,
        listener: AsyncListener,
    ) -> AsyncListenerToken {
        let slot = self.node_mut(node).async_listeners.len();
        self.node_mut(node).async_listeners.push(Some(listener));
        AsyncListenerToken(node, slot)
    }

    pub(crate) fn unregister_async_listener(&mut self, token: AsyncListenerToken) {
        if let Some(slot) = self.node_mut(token.0).async_listeners.get_mut(token.1) {
            *slot = None;
        }
    }

    /// Installs (or replaces) a node's `on_next_frame` hook after creation —
    /// needed because the hook usually closes over the very `NodeId` the
    /// factory call that creates it hasn't returned yet.
    pub(crate) fn set_on_next_frame(&mut self, id: NodeId, hook: OnNextFrame) {
        self.node_mut(id).on_next_frame = Some(hook);
    }

    /// Installs (or replaces) a node's `on_rollback` hook after creation, for
    /// the same reason as [`TimelineInner::set_on_next_frame`].
    pub(crate) fn set_on_rollback(&mut self, id: NodeId, hook: OnRollback) {
        self.node_mut(id).on_rollback = Some(hook);
    }

    // ---- read / write contract ---------------------------------------------

    pub(crate) fn queued_sync_listeners(&self, id: NodeId) -> Vec<SyncListener> {
        self.node(id).sync_listeners.iter().flatten().cloned().collect()
    }

    pub(crate) fn queued_async_listeners(&self, id: NodeId) -> Vec<AsyncListener> {
        self.node(id).async_listeners.iter().flatten().cloned().collect()
    }

    pub(crate) fn begin_update(&mut self) -> bool {
        self.update_depth += 1;
        self.update_depth == 1
    }

    pub(crate) fn end_update(&mut self) {
        self.update_depth -= 1;
    }

    pub(crate) fn take_pending_next_frame(&mut self) -> Vec<NodeId> {
        std::mem::take(&mut self.pending_next_frame)
    }

    pub(crate) fn run_on_next_frame_hook(&mut self, id: NodeId) {
        if let Some(mut hook) = self.node_mut(id).on_next_frame.take() {
            hook(self);
            self.node_mut(id).on_next_frame = Some(hook);
        }
    }

    pub(crate) fn write_external_value(&mut self, id: NodeId, new_value: RawValue, internal: bool) {
        self.node_mut(id).value = new_value.clone();
        if !internal && self.config.time_travel && self.external_nodes.contains(&id) {
            self.latest_frame += 1;
            self.current_frame = self.latest_frame;
            self.event_trace.push(ExternalEvent { node: id, value: new_value });
        }
    }

    pub(crate) fn queue_self_on_next_frame(&mut self, id: NodeId) {
        if self.node(id).on_next_frame.is_some() {
            self.pending_next_frame.push(id);
        }
    }

    pub(crate) fn maybe_persist_snapshot(&mut self, is_outermost: bool) {
        if is_outermost && self.update_depth == 0 && self.config.time_travel {
            self.persist_snapshot();
        }
    }

    /// Marks the whole subtree reachable from `root` dirty so any later
    /// `fetch_node_value` pulls correctly, and collects — in first-seen
    /// (roughly topological) order — the subset that is actually observed
    /// and therefore must recompute and fire its listeners now. This
    /// mirrors `leptos_reactive::Runtime`'s `mark_dirty` + `run_effects`
    /// split: one unconditional marking pass followed by a pass that only
    /// touches observed nodes, rather than the literal reading of
    /// "propagation does not descend further" in the node-update contract,
    /// which would leave unobserved nodes downstream of a lazy node
    /// permanently stale once something eventually samples them.
    pub(crate) fn mark_dirty_subtree(&mut self, id: NodeId, pending: &mut IndexSet<NodeId>) {
        let children = self.children_of(id).to_vec();
        for child in children {
            if self.node(child).dirty {
                // Already marked on this pass (diamond merge); no need to
                // revisit its own children again.
                continue;
            }
            if self.node(child).on_next_frame.is_some() {
                self.pending_next_frame.push(child);
            }
            self.node_mut(child).dirty = true;

            let eager = !self.config.lazy || self.node(child).has_listeners();
            if eager {
                pending.insert(child);
            }
            self.mark_dirty_subtree(child, pending);
        }
    }

    // ---- snapshot / rollback -----------------------------------------------

    fn persist_snapshot(&mut self) {
        let values = self
            .nodes
            .iter()
            .filter(|(id, _)| Some(*id) != self.paused)
            .map(|(id, node)| (id, (node.value.clone(), node.dirty)))
            .collect();
        let children = self
            .children
            .iter()
            .map(|(id, kids)| (id, kids.clone()))
            .collect();
        self.history.insert(self.latest_frame, Snapshot { values, children });
    }

    /// Restores the graph to the state recorded at `frame`. A frame with no
    /// recorded snapshot is a silent no-op, and so is any call while time
    /// travel is disabled — this lets callers freely walk
    /// `rollback_state`/`next_state` past the ends of history.
    #[instrument(level = "trace", skip_all, fields(frame))]
    pub(crate) fn reset_state(&mut self, frame: u64) {
        if !self.config.time_travel {
            return;
        }
        let Some(snapshot) = self.history.get(&frame) else {
            return;
        };
        let values = snapshot.values.clone();
        let children = snapshot.children.clone();

        for (id, (value, dirty)) in &values {
            if Some(*id) == self.paused {
                continue;
            }
            let node = self.node_mut(*id);
            node.value = value.clone();
            node.dirty = *dirty;
        }
        for (id, kids) in children {
            self.children.insert(id, kids);
        }

        let rollback_ids: Vec<NodeId> = self
            .nodes
            .iter()
            .filter(|(_, node)| node.on_rollback.is_some())
            .map(|(id, _)| id)
            .collect();
        for id in rollback_ids {
            if let Some(mut hook) = self.node_mut(id).on_rollback.take() {
                hook(self, frame);
                self.node_mut(id).on_rollback = Some(hook);
            }
        }

        self.latest_frame = frame;
        self.current_frame = frame;
    }

    pub(crate) fn rollback_state(&mut self) {
        if self.latest_frame == 0 {
            return;
        }
        self.reset_state(self.latest_frame - 1);
    }

    pub(crate) fn next_state(&mut self) {
        self.reset_state(self.latest_frame + 1);
    }

    // ---- paused / clock -------------------------------------------------

    pub(crate) fn ensure_paused(&mut self) -> NodeId {
        if let Some(id) = self.paused {
            return id;
        }
        let id = self.create_node(Rc::new(false), false, None, None, Some("paused".into()));
        self.paused = Some(id);
        id
    }
}

/// A push-pull reactive dependency graph: the owner of every node, the
/// adjacency between them, and — when enabled — the frame history that
/// backs time travel.
///
/// Cloning a `Timeline` is cheap and shares the same graph (it is a handle
/// around an `Rc`): every clone observes the same nodes. The single coarse
/// lock is a [`parking_lot::ReentrantMutex`] rather than a plain
/// [`std::sync::Mutex`] because a synchronous listener is allowed to call
/// back into `send`/`set` on the same thread while the timeline is already
/// locked for the update that invoked it; a plain mutex would deadlock on
/// that path. Locking from a second, genuinely concurrent thread still
/// blocks as a normal mutex would.
#[derive(Clone)]
pub struct Timeline(Rc<ReentrantMutex<RefCell<TimelineInner>>>);

static CURRENT: OnceLock<Timeline> = OnceLock::new();

impl Timeline {
    /// Creates a new, freestanding timeline. Most programs want
    /// [`Timeline::initialize`] instead, which also installs it as the
    /// ambient "current" timeline; this constructor exists for tests that
    /// want isolation without touching the global slot.
    pub fn new(config: TimelineConfig) -> Self {
        Self::with_clock_factory(config, None)
    }

    /// Like [`Timeline::new`], but additionally installs the factory used to
    /// lazily construct this timeline's clock event on first access (see
    /// [`Timeline::clock`]).
    pub fn with_clock_factory(
        config: TimelineConfig,
        clock_factory: Option<ClockFactory>,
    ) -> Self {
        Timeline(Rc::new(ReentrantMutex::new(RefCell::new(TimelineInner::new(
            config,
            clock_factory,
        )))))
    }

    /// Creates a new timeline and installs it as the process-wide "current"
    /// timeline. Fails with [`TimelineError::AlreadyInitialized`] if one was
    /// already installed, rather than silently replacing it.
    pub fn initialize(config: TimelineConfig) -> Result<Timeline, TimelineError> {
        Self::initialize_with_clock_factory(config, None)
    }

    /// Like [`Timeline::initialize`], additionally installing a clock
    /// factory. See [`Timeline::clock`].
    pub fn initialize_with_clock_factory(
        config: TimelineConfig,
        clock_factory: Option<ClockFactory>,
    ) -> Result<Timeline, TimelineError> {
        let timeline = Self::with_clock_factory(config, clock_factory);
        CURRENT
            .set(timeline.clone())
            .map_err(|_| TimelineError::AlreadyInitialized)?;
        Ok(timeline)
    }

    /// Fetches the process-wide "current" timeline installed by
    /// [`Timeline::initialize`].
    pub fn current() -> Result<Timeline, TimelineError> {
        CURRENT.get().cloned().ok_or(TimelineError::UninitializedTimeline)
    }

    pub(crate) fn with_inner<T>(&self, f: impl FnOnce(&mut TimelineInner) -> T) -> T {
        let guard = self.0.lock();
        let mut inner = guard.borrow_mut();
        f(&mut inner)
    }

    /// `true` if time travel (frame snapshots, rollback, the event trace)
    /// is enabled on this timeline.
    pub fn time_travel_enabled(&self) -> bool {
        self.with_inner(|inner| inner.config.time_travel)
    }

    /// Rolls the graph back to the frame immediately before `latest_frame`.
    /// A silent no-op at the start of history or with time travel disabled.
    pub fn rollback_state(&self) {
        self.with_inner(TimelineInner::rollback_state);
    }

    /// Advances the graph to the frame immediately after `latest_frame`.
    /// A silent no-op at the end of history or with time travel disabled.
    pub fn next_state(&self) {
        self.with_inner(TimelineInner::next_state);
    }

    /// Restores the graph to the state recorded at `frame`. A silent no-op
    /// if no snapshot was recorded for that frame, or with time travel
    /// disabled.
    pub fn reset_state(&self, frame: u64) {
        self.with_inner(|inner| inner.reset_state(frame));
    }

    /// The most recent frame number reached by any external update (or by
    /// time travel navigation).
    pub fn latest_frame(&self) -> u64 {
        self.with_inner(|inner| inner.latest_frame)
    }

    /// The number of nodes currently registered as external (i.e. whose
    /// updates advance the frame counter when time travel is enabled).
    pub fn external_node_count(&self) -> usize {
        self.with_inner(|inner| inner.external_nodes.len())
    }

    /// The external node ids currently registered, exposed for debuggers and
    /// tests per the engine's external-interface contract.
    pub fn external_nodes(&self) -> Vec<NodeId> {
        self.with_inner(|inner| inner.external_nodes.iter().copied().collect())
    }

    /// A copy of the external-event trace recorded so far, as `(node,
    /// frame)` pairs in the order the events occurred — exposed for
    /// debuggers and tests, not consumed internally.
    pub fn event_trace(&self) -> Vec<(NodeId, u64)> {
        self.with_inner(|inner| {
            inner
                .event_trace
                .iter()
                .enumerate()
                .map(|(i, event)| (event.node, i as u64 + 1))
                .collect()
        })
    }

    /// Returns (lazily constructing it on first access) this timeline's
    /// clock event, driven by the factory supplied to
    /// [`Timeline::with_clock_factory`]/[`Timeline::initialize_with_clock_factory`].
    ///
    /// Panics if no clock factory was supplied — the core never assumes a
    /// concrete tick source; callers that want a clock must inject one.
    pub fn clock(&self) -> crate::event::Event<std::time::Duration> {
        let existing = self.with_inner(|inner| inner.clock);
        if let Some(id) = existing {
            return crate::event::Event::from_parts(self.clone(), id);
        }
        let factory = self
            .with_inner(|inner| inner.clock_factory.take())
            .expect("Timeline::clock() called but no clock factory was injected");
        let event = factory(self);
        self.with_inner(|inner| {
            inner.clock = Some(event.node_id());
            inner.clock_factory = Some(factory);
        });
        event
    }

    /// The `paused` internal state consulted by [`crate::event::Event::gate`]
    /// built-in conveniences; lazily constructed on first access, starting
    /// `false`.
    pub fn paused(&self) -> crate::state::State<bool> {
        let id = self.with_inner(TimelineInner::ensure_paused);
        crate::state::State::from_parts(self.clone(), id)
    }

    // ---- node construction / listener registration, re-exposed for event.rs/state.rs ----

    pub(crate) fn create_node(
        &self,
        initial: RawValue,
        external: bool,
        on_next_frame: Option<OnNextFrame>,
        on_rollback: Option<OnRollback>,
        label: Option<String>,
    ) -> NodeId {
        self.with_inner(|inner| inner.create_node(initial, external, on_next_frame, on_rollback, label))
    }

    pub(crate) fn create_derived_node(
        &self,
        parents: &[NodeId],
        recompute: RecomputeFn,
        on_next_frame: Option<OnNextFrame>,
        label: Option<String>,
    ) -> NodeId {
        self.with_inner(|inner| inner.create_derived_node(parents, recompute, on_next_frame, label))
    }

    pub(crate) fn register_sync_listener(&self, node: NodeId, listener: SyncListener) -> SyncListenerToken {
        self.with_inner(|inner| inner.register_sync_listener(node, listener))
    }

    pub(crate) fn unregister_sync_listener(&self, token: SyncListenerToken) {
        self.with_inner(|inner| inner.unregister_sync_listener(token));
    }

    pub(crate) fn register_async_listener(&self, node: NodeId, listener: AsyncListener) -> AsyncListenerToken {
        self.with_inner(|inner| inner.register_async_listener(node, listener))
    }

    pub(crate) fn unregister_async_listener(&self, token: AsyncListenerToken) {
        self.with_inner(|inner| inner.unregister_async_listener(token));
    }

    pub(crate) fn set_on_next_frame(&self, id: NodeId, hook: OnNextFrame) {
        self.with_inner(|inner| inner.set_on_next_frame(id, hook));
    }

    pub(crate) fn set_on_rollback(&self, id: NodeId, hook: OnRollback) {
        self.with_inner(|inner| inner.set_on_rollback(id, hook));
    }

    /// The single entry point for any reader: recompute on demand if dirty,
    /// otherwise return the cached value. Called both by external samplers
    /// and, recursively, by a derived node's own `recompute` closure when it
    /// reads its parents — this is what makes laziness transitive. Structured
    /// as short, non-overlapping `with_inner` borrows around the actual
    /// `recompute(self)` call, which runs with no borrow held, so a
    /// recompute that samples another node (directly, or through a `Behavior`
    /// such as `gate`'s condition) never nests a `RefCell` borrow.
    #[instrument(level = "trace", skip_all, fields(node = ?id))]
    pub(crate) fn fetch_node_value(&self, id: NodeId) -> RawValue {
        let dirty = self.with_inner(|inner| inner.node(id).dirty);
        if !dirty {
            return self.with_inner(|inner| inner.node(id).value.clone());
        }
        let recompute = self.with_inner(|inner| {
            inner
                .node(id)
                .recompute
                .clone()
                .expect("a dirty node with no recompute closure is an input node, which is never marked dirty")
        });
        let value = recompute(self);
        self.with_inner(|inner| {
            let node = inner.node_mut(id);
            node.value = value.clone();
            node.dirty = false;
        });
        value
    }

    pub(crate) fn node_label(&self, id: NodeId) -> Option<String> {
        self.with_inner(|inner| inner.node(id).label.clone())
    }

    /// The update entry point described in the crate docs' eight-step
    /// contract. Structured as alternating short `with_inner` borrows and
    /// listener invocations made with no borrow held, so that a sync
    /// listener is free to call back into `send`/`set` (reentering this
    /// same function on the same thread) without ever nesting a `RefCell`
    /// borrow.
    #[instrument(level = "trace", skip(self, new_value), fields(node = ?id, internal))]
    pub(crate) fn update_node_value(&self, id: NodeId, new_value: RawValue, internal: bool) {
        let is_outermost = self.with_inner(TimelineInner::begin_update);

        if !internal {
            self.run_queued_next_frame_hooks();
        }

        self.with_inner(|inner| inner.write_external_value(id, new_value.clone(), internal));

        self.fire_listeners(id, &new_value);

        if !internal {
            self.with_inner(|inner| inner.queue_self_on_next_frame(id));
        }

        self.propagate(id);

        self.with_inner(|inner| {
            inner.end_update();
            inner.maybe_persist_snapshot(is_outermost);
        });
    }

    fn run_queued_next_frame_hooks(&self) {
        let queued = self.with_inner(TimelineInner::take_pending_next_frame);
        for id in queued {
            self.with_inner(|inner| inner.run_on_next_frame_hook(id));
        }
    }

    fn fire_listeners(&self, id: NodeId, value: &RawValue) {
        let sync_listeners = self.with_inner(|inner| inner.queued_sync_listeners(id));
        for listener in sync_listeners {
            listener(self, value);
        }
        let async_listeners = self.with_inner(|inner| inner.queued_async_listeners(id));
        for listener in async_listeners {
            timeline_executor::Executor::spawn_local(listener(value.clone()));
        }
    }

    /// Marks the reachable subtree dirty, then recomputes and fires
    /// listeners for the observed subset, each one with no borrow held so a
    /// listener can reenter `update_node_value`. See
    /// `TimelineInner::mark_dirty_subtree` for the laziness policy.
    fn propagate(&self, root: NodeId) {
        let pending = self.with_inner(|inner| {
            let mut pending = IndexSet::new();
            inner.mark_dirty_subtree(root, &mut pending);
            pending
        });
        for id in pending {
            let dirty = self.with_inner(|inner| inner.node(id).dirty);
            if dirty {
                let value = self.fetch_node_value(id);
                self.fire_listeners(id, &value);
            }
        }
    }
}

impl Debug for Timeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.with_inner(|inner| {
            f.debug_struct("Timeline")
                .field("nodes", &inner.nodes.len())
                .field("latest_frame", &inner.latest_frame)
                .field("config", &inner.config)
                .finish()
        })
    }
}

pub(crate) fn downcast<T: 'static>(value: RawValue) -> Rc<T> {
    value
        .downcast::<T>()
        .unwrap_or_else(|_| panic!("node value type mismatch for {}", std::any::type_name::<T>()))
}

pub(crate) fn erase<T: 'static>(value: T) -> RawValue {
    Rc::new(value)
}

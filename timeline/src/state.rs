//! Stepwise current values.
//!
//! A `State<A>` wraps a node whose raw value is always present (unlike
//! [`crate::event::Event`], which is absent outside the frame it fires).

use std::{cell::RefCell, marker::PhantomData, rc::Rc};

use crate::{
    event::{install_reset_to_none, Event, EventState},
    node::{NodeId, OnRollback, RawValue, RecomputeFn, SyncListener, SyncListenerToken},
    timeline::{downcast, erase, Timeline, TimelineInner},
    TimelineError,
};

fn current_timeline() -> Result<Timeline, TimelineError> {
    Timeline::current()
}

/// A handle onto a node whose value is always present. Cheap to clone.
pub struct State<A> {
    timeline: Timeline,
    node: NodeId,
    _marker: PhantomData<fn() -> A>,
}

impl<A> Clone for State<A> {
    fn clone(&self) -> Self {
        State { timeline: self.timeline.clone(), node: self.node, _marker: PhantomData }
    }
}

impl<A: 'static> State<A> {
    pub(crate) fn from_parts(timeline: Timeline, node: NodeId) -> Self {
        State { timeline, node, _marker: PhantomData }
    }

    /// The underlying node id.
    pub fn node_id(&self) -> NodeId {
        self.node
    }

    /// Samples the current value.
    pub fn value(&self) -> A
    where
        A: Clone,
    {
        (*downcast::<A>(self.timeline.fetch_node_value(self.node))).clone()
    }

    /// Registers a synchronous listener, invoked with the new value every
    /// time this state changes. A node with any sync or async listener
    /// attached recomputes as soon as its parents change rather than
    /// waiting for the next explicit sample.
    pub fn on_change<F>(&self, f: F) -> SyncListenerToken
    where
        F: Fn(&A) + 'static,
    {
        let listener: SyncListener = Rc::new(move |_timeline: &Timeline, value: &RawValue| {
            f(downcast::<A>(value.clone()).as_ref());
        });
        self.timeline.register_sync_listener(self.node, listener)
    }

    /// Unregisters a listener previously returned from [`State::on_change`].
    pub fn unlisten(&self, token: SyncListenerToken) {
        self.timeline.unregister_sync_listener(token);
    }

    /// A new state whose value is always `f` applied to this one's.
    pub fn map<B: 'static>(&self, f: impl Fn(&A) -> B + 'static) -> State<B> {
        let parent = self.node;
        let recompute: RecomputeFn = Rc::new(move |timeline: &Timeline| {
            let v = downcast::<A>(timeline.fetch_node_value(parent));
            erase(f(v.as_ref()))
        });
        let id = self.timeline.create_derived_node(&[parent], recompute, None, None);
        State::from_parts(self.timeline.clone(), id)
    }

    /// Combines this state with one other into a new derived state.
    pub fn combine_with<B: 'static, C: 'static>(
        &self,
        other: &State<B>,
        f: impl Fn(&A, &B) -> C + 'static,
    ) -> State<C> {
        let (pa, pb) = (self.node, other.node);
        let recompute: RecomputeFn = Rc::new(move |timeline: &Timeline| {
            let a = downcast::<A>(timeline.fetch_node_value(pa));
            let b = downcast::<B>(timeline.fetch_node_value(pb));
            erase(f(a.as_ref(), b.as_ref()))
        });
        let id = self.timeline.create_derived_node(&[pa, pb], recompute, None, None);
        State::from_parts(self.timeline.clone(), id)
    }

    /// Combines this state with two others into a new derived state.
    pub fn combine3<B: 'static, C: 'static, R: 'static>(
        &self,
        b: &State<B>,
        c: &State<C>,
        f: impl Fn(&A, &B, &C) -> R + 'static,
    ) -> State<R> {
        let (pa, pb, pc) = (self.node, b.node, c.node);
        let recompute: RecomputeFn = Rc::new(move |timeline: &Timeline| {
            let a = downcast::<A>(timeline.fetch_node_value(pa));
            let b = downcast::<B>(timeline.fetch_node_value(pb));
            let c = downcast::<C>(timeline.fetch_node_value(pc));
            erase(f(a.as_ref(), b.as_ref(), c.as_ref()))
        });
        let id = self.timeline.create_derived_node(&[pa, pb, pc], recompute, None, None);
        State::from_parts(self.timeline.clone(), id)
    }

    /// Combines this state with three others into a new derived state.
    pub fn combine4<B: 'static, C: 'static, D: 'static, R: 'static>(
        &self,
        b: &State<B>,
        c: &State<C>,
        d: &State<D>,
        f: impl Fn(&A, &B, &C, &D) -> R + 'static,
    ) -> State<R> {
        let (pa, pb, pc, pd) = (self.node, b.node, c.node, d.node);
        let recompute: RecomputeFn = Rc::new(move |timeline: &Timeline| {
            let a = downcast::<A>(timeline.fetch_node_value(pa));
            let b = downcast::<B>(timeline.fetch_node_value(pb));
            let c = downcast::<C>(timeline.fetch_node_value(pc));
            let d = downcast::<D>(timeline.fetch_node_value(pd));
            erase(f(a.as_ref(), b.as_ref(), c.as_ref(), d.as_ref()))
        });
        let id = self.timeline.create_derived_node(&[pa, pb, pc, pd], recompute, None, None);
        State::from_parts(self.timeline.clone(), id)
    }

    /// Combines this state with four others into a new derived state.
    pub fn combine5<B: 'static, C: 'static, D: 'static, E: 'static, R: 'static>(
        &self,
        b: &State<B>,
        c: &State<C>,
        d: &State<D>,
        e: &State<E>,
        f: impl Fn(&A, &B, &C, &D, &E) -> R + 'static,
    ) -> State<R> {
        let (pa, pb, pc, pd, pe) = (self.node, b.node, c.node, d.node, e.node);
        let recompute: RecomputeFn = Rc::new(move |timeline: &Timeline| {
            let a = downcast::<A>(timeline.fetch_node_value(pa));
            let b = downcast::<B>(timeline.fetch_node_value(pb));
            let c = downcast::<C>(timeline.fetch_node_value(pc));
            let d = downcast::<D>(timeline.fetch_node_value(pd));
            let e = downcast::<E>(timeline.fetch_node_value(pe));
            erase(f(a.as_ref(), b.as_ref(), c.as_ref(), d.as_ref(), e.as_ref()))
        });
        let id = self.timeline.create_derived_node(&[pa, pb, pc, pd, pe], recompute, None, None);
        State::from_parts(self.timeline.clone(), id)
    }

    /// Combines a homogeneous list of states into one, fed as a slice to
    /// `combine` in list order.
    pub fn combine_all(states: &[State<A>], combine: impl Fn(&[A]) -> A + 'static) -> State<A>
    where
        A: Clone,
    {
        assert!(!states.is_empty(), "State::combine_all requires at least one state");
        let timeline = states[0].timeline.clone();
        let parents: Vec<NodeId> = states.iter().map(State::node_id).collect();
        let recompute: RecomputeFn = {
            let parents = parents.clone();
            Rc::new(move |timeline: &Timeline| {
                let values: Vec<A> = parents
                    .iter()
                    .map(|&id| (*downcast::<A>(timeline.fetch_node_value(id))).clone())
                    .collect();
                erase(combine(&values))
            })
        };
        let id = timeline.create_derived_node(&parents, recompute, None, None);
        State::from_parts(timeline, id)
    }

    /// Shorthand for `self.map(f).flatten()`.
    pub fn flat_map<B: 'static>(&self, f: impl Fn(&A) -> State<B> + 'static) -> State<B>
    where
        B: Clone,
    {
        self.map(f).flatten()
    }

    /// An event that fires with this state's new value on every update.
    pub fn updated(&self) -> Event<A>
    where
        A: Clone,
    {
        let parent = self.node;
        let recompute: RecomputeFn = Rc::new(move |timeline: &Timeline| {
            let v = downcast::<A>(timeline.fetch_node_value(parent));
            erase(EventState::Fired((*v).clone()))
        });
        let id = self.timeline.create_derived_node(&[parent], recompute, None, None);
        install_reset_to_none::<A>(&self.timeline, id);
        Event::from_parts(self.timeline.clone(), id)
    }

    /// Creates a fold node: starts at `initial`, and on every frame in which
    /// `event` fires `Fired(v)`, becomes `reducer(current, v)`. When the
    /// owning timeline has time travel enabled, every consumed occurrence is
    /// appended to an internal log (keyed by the frame it fired on) so
    /// `on_rollback` can truncate the log to the target frame and replay
    /// `reducer` from `initial`, rather than needing the timeline to keep a
    /// separate undo stack per fold.
    pub fn fold<E: Clone + 'static>(
        initial: A,
        event: &Event<E>,
        reducer: impl Fn(&A, &E) -> A + 'static,
    ) -> State<A>
    where
        A: Clone,
    {
        let timeline = event.timeline_handle();
        let id = timeline.create_node(erase(initial.clone()), false, None, None, None);

        let reducer = Rc::new(reducer);
        let log: Rc<RefCell<Vec<(u64, E)>>> = Rc::new(RefCell::new(Vec::new()));

        let listener: SyncListener = {
            let reducer = reducer.clone();
            let log = log.clone();
            Rc::new(move |timeline: &Timeline, value: &RawValue| {
                if let EventState::Fired(v) = downcast::<EventState<E>>(value.clone()).as_ref() {
                    log.borrow_mut().push((timeline.latest_frame(), v.clone()));
                    let current = downcast::<A>(timeline.fetch_node_value(id));
                    let next = reducer(current.as_ref(), v);
                    timeline.update_node_value(id, erase(next), true);
                }
            })
        };
        timeline.register_sync_listener(event.node_id(), listener);

        let rollback: OnRollback = {
            let reducer = reducer.clone();
            let log = log.clone();
            Box::new(move |inner: &mut TimelineInner, frame: u64| {
                let mut entries = log.borrow_mut();
                entries.retain(|(f, _)| *f <= frame);
                let mut acc = initial.clone();
                for (_, v) in entries.iter() {
                    acc = reducer(&acc, v);
                }
                let node = inner.node_mut(id);
                node.value = erase(acc);
                node.dirty = false;
            })
        };
        timeline.set_on_rollback(id, rollback);

        State::from_parts(timeline, id)
    }

    /// Mutable internal state that replaces its value with `event`'s
    /// payload every time it fires. Built as a fold with a replace reducer.
    pub fn hold(initial: A, event: &Event<A>) -> State<A>
    where
        A: Clone,
    {
        State::fold(initial, event, |_, v: &A| v.clone())
    }

    /// A state that never changes.
    pub fn constant(value: A) -> Result<State<A>, TimelineError> {
        let timeline = current_timeline()?;
        Ok(Self::constant_on(&timeline, value))
    }

    /// Like [`State::constant`], against an explicit timeline.
    pub fn constant_on(timeline: &Timeline, value: A) -> State<A> {
        let id = timeline.create_node(erase(value), false, None, None, None);
        State::from_parts(timeline.clone(), id)
    }
}

impl<B: 'static> State<State<B>> {
    /// Flattens a state-of-states into a state that always tracks whichever
    /// inner state is current: a sync listener on the outer node unregisters
    /// the previous inner subscription and installs a new one each time the
    /// outer value changes, using a token (never a raw back-pointer) so the
    /// torn-down subscription can't outlive the inner state it pointed at.
    pub fn flatten(&self) -> State<B>
    where
        B: Clone,
    {
        let timeline = self.timeline.clone();
        let initial_inner = self.value();
        let flat_id = timeline.create_node(erase(initial_inner.value()), false, None, None, None);

        let inner_token: Rc<RefCell<Option<SyncListenerToken>>> =
            Rc::new(RefCell::new(None));

        let subscribe_inner: Rc<dyn Fn(&State<B>)> = {
            let timeline = timeline.clone();
            let inner_token = inner_token.clone();
            Rc::new(move |inner_state: &State<B>| {
                if let Some(token) = inner_token.borrow_mut().take() {
                    timeline.unregister_sync_listener(token);
                }
                let listener: SyncListener = Rc::new(move |timeline: &Timeline, value: &RawValue| {
                    let v = downcast::<B>(value.clone());
                    timeline.update_node_value(flat_id, erase((*v).clone()), true);
                });
                let token = timeline.register_sync_listener(inner_state.node_id(), listener);
                *inner_token.borrow_mut() = Some(token);
                let current = timeline.fetch_node_value(inner_state.node_id());
                timeline.update_node_value(flat_id, current, true);
            })
        };

        subscribe_inner(&initial_inner);

        let outer_listener: SyncListener = {
            let subscribe_inner = subscribe_inner.clone();
            Rc::new(move |_timeline: &Timeline, value: &RawValue| {
                let inner_state = downcast::<State<B>>(value.clone());
                subscribe_inner(&inner_state);
            })
        };
        timeline.register_sync_listener(self.node, outer_listener);

        State::from_parts(timeline, flat_id)
    }
}

/// A [`State`] whose value an external producer can drive with
/// [`MutableState::set`].
pub struct MutableState<A> {
    state: State<A>,
}

impl<A> Clone for MutableState<A> {
    fn clone(&self) -> Self {
        MutableState { state: self.state.clone() }
    }
}

impl<A: 'static> std::ops::Deref for MutableState<A> {
    type Target = State<A>;

    fn deref(&self) -> &State<A> {
        &self.state
    }
}

impl<A: 'static> MutableState<A> {
    /// Writes a new value for the current frame: this node is external, so
    /// a time-travel-enabled timeline advances its frame counter.
    pub fn set(&self, value: A) {
        self.state.timeline.update_node_value(self.state.node, erase(value), false);
    }
}

/// Creates a mutable state on the ambient timeline.
pub fn mutable_state_of<A: 'static>(
    value: A,
    label: Option<&str>,
) -> Result<MutableState<A>, TimelineError> {
    Ok(mutable_state_on(&current_timeline()?, value, label))
}

/// Like [`mutable_state_of`], against an explicit timeline.
pub fn mutable_state_on<A: 'static>(
    timeline: &Timeline,
    value: A,
    label: Option<&str>,
) -> MutableState<A> {
    let id = timeline.create_node(erase(value), true, None, None, label.map(str::to_string));
    MutableState { state: State::from_parts(timeline.clone(), id) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{event::broadcast_event_on, timeline::TimelineConfig};

    #[test]
    fn combine_with_sums_two_states() {
        let timeline = Timeline::new(TimelineConfig::default());
        let a = mutable_state_on(&timeline, 1, None);
        let b = mutable_state_on(&timeline, 2, None);
        let s = a.combine_with(&b, |x, y| x + y);

        assert_eq!(s.value(), 3);
        a.set(10);
        assert_eq!(s.value(), 12);
    }

    #[test]
    fn lazy_map_not_evaluated_until_sampled() {
        let timeline = Timeline::new(TimelineConfig { lazy: true, ..TimelineConfig::default() });
        let a = mutable_state_on(&timeline, 1, None);
        let evaluated = Rc::new(RefCell::new(false));
        let flag = evaluated.clone();
        let m = a.map(move |v| {
            *flag.borrow_mut() = true;
            *v
        });

        a.set(2);
        assert!(!*evaluated.borrow());
        assert_eq!(m.value(), 2);
        assert!(*evaluated.borrow());
    }

    #[test]
    fn listened_map_evaluates_without_an_explicit_read() {
        let timeline = Timeline::new(TimelineConfig { lazy: true, ..TimelineConfig::default() });
        let a = mutable_state_on(&timeline, 1, None);
        let evaluated = Rc::new(RefCell::new(false));
        let flag = evaluated.clone();
        let m = a.map(move |v| {
            *flag.borrow_mut() = true;
            *v
        });
        let _token = m.on_change(|_| {});

        a.set(2);
        assert!(*evaluated.borrow(), "attaching a listener should force eager recompute");
    }

    #[test]
    fn counter_fold_tracks_increments_and_decrements() {
        #[derive(Clone)]
        enum CounterEvent {
            Inc,
            Dec,
        }

        let timeline = Timeline::new(TimelineConfig::default());
        let events = broadcast_event_on::<CounterEvent>(&timeline, None);
        let count = State::fold(0i32, &events, |acc, e| match e {
            CounterEvent::Inc => acc + 1,
            CounterEvent::Dec => acc - 1,
        });

        events.send(CounterEvent::Inc);
        events.send(CounterEvent::Inc);
        events.send(CounterEvent::Dec);
        assert_eq!(count.value(), 1);
    }

    #[test]
    fn rollback_replays_fold() {
        #[derive(Clone)]
        enum CounterEvent {
            Inc,
        }

        let timeline = Timeline::new(TimelineConfig { time_travel: true, ..TimelineConfig::default() });
        let events = broadcast_event_on::<CounterEvent>(&timeline, None);
        let count = State::fold(0i32, &events, |acc, _| acc + 1);

        events.send(CounterEvent::Inc);
        events.send(CounterEvent::Inc);
        events.send(CounterEvent::Inc);
        assert_eq!(count.value(), 3);

        timeline.rollback_state();
        timeline.rollback_state();
        assert_eq!(count.value(), 1);
    }

    #[test]
    fn flatten_tracks_current_inner_state() {
        let timeline = Timeline::new(TimelineConfig::default());
        let inner_a = mutable_state_on(&timeline, 1, None);
        let inner_b = mutable_state_on(&timeline, 100, None);
        let selector = mutable_state_on(&timeline, (*inner_a).clone(), None);
        let flat = selector.flatten();

        assert_eq!(flat.value(), 1);
        inner_a.set(2);
        assert_eq!(flat.value(), 2);

        selector.set((*inner_b).clone());
        assert_eq!(flat.value(), 100);
        inner_a.set(3);
        assert_eq!(flat.value(), 100);
    }
}

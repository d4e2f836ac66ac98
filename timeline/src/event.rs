//! Discrete occurrences.
//!
//! An `Event<A>` wraps a node whose raw value is always an [`EventState<A>`]
//! — present only in the frame it fires, `None` everywhere else.

use std::{cell::RefCell, marker::PhantomData, rc::Rc};

use crate::{
    node::{
        AsyncListener, AsyncListenerToken, NodeId, OnNextFrame, RawValue, RecomputeFn, SyncListener,
        SyncListenerToken,
    },
    timeline::{downcast, erase, Timeline},
    TimelineError,
};

/// The value carried by an event node: either it fired this frame, or it
/// didn't. `None` is the resting value, restored before every external
/// update that doesn't re-fire the event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventState<A> {
    Fired(A),
    None,
}

impl<A> EventState<A> {
    pub fn map<B>(self, f: impl FnOnce(A) -> B) -> EventState<B> {
        match self {
            EventState::Fired(v) => EventState::Fired(f(v)),
            EventState::None => EventState::None,
        }
    }

    pub fn fired(self) -> Option<A> {
        match self {
            EventState::Fired(v) => Some(v),
            EventState::None => None,
        }
    }
}

/// Resolves a frame in which more than one merged parent fired at once.
pub trait MergeStrategy<A> {
    /// `fired` is the values of every parent that fired this frame, in
    /// parent-registration order, and is never empty.
    fn merge(&self, fired: Vec<A>) -> A;
}

/// The default [`MergeStrategy`]: the first (leftmost) parent to fire wins.
#[derive(Debug, Clone, Copy, Default)]
pub struct Leftmost;

impl<A> MergeStrategy<A> for Leftmost {
    fn merge(&self, mut fired: Vec<A>) -> A {
        fired.remove(0)
    }
}

pub(crate) fn install_reset_to_none<A: 'static>(timeline: &Timeline, id: NodeId) {
    let hook: OnNextFrame = Box::new(move |inner| {
        let node = inner.node_mut(id);
        node.value = erase(EventState::<A>::None);
        node.dirty = false;
    });
    timeline.set_on_next_frame(id, hook);
}

/// A handle onto an event-valued node. Cheap to clone — it is a timeline
/// handle plus a [`NodeId`], not the node's storage itself.
pub struct Event<A> {
    timeline: Timeline,
    node: NodeId,
    _marker: PhantomData<fn() -> A>,
}

impl<A> Clone for Event<A> {
    fn clone(&self) -> Self {
        Event { timeline: self.timeline.clone(), node: self.node, _marker: PhantomData }
    }
}

impl<A: 'static> Event<A> {
    pub(crate) fn from_parts(timeline: Timeline, node: NodeId) -> Self {
        Event { timeline, node, _marker: PhantomData }
    }

    /// The underlying node id, exposed for debuggers and for callers wiring
    /// up raw `Timeline` APIs directly.
    pub fn node_id(&self) -> NodeId {
        self.node
    }

    pub(crate) fn timeline_handle(&self) -> Timeline {
        self.timeline.clone()
    }

    /// Samples the current occurrence. `EventState::None` outside the frame
    /// this event fired in.
    pub fn sample(&self) -> EventState<A>
    where
        A: Clone,
    {
        (*downcast::<EventState<A>>(self.timeline.fetch_node_value(self.node))).clone()
    }

    /// Registers a synchronous listener, invoked with the fired value every
    /// time this event fires (skipped on the frames where it is `None`).
    /// Runs in registration order alongside this node's other sync
    /// listeners, before children propagate. A node with any sync or async
    /// listener attached loses its laziness: it recomputes as soon as a
    /// parent changes rather than waiting for the next explicit sample.
    pub fn on_fire<F>(&self, f: F) -> SyncListenerToken
    where
        A: Clone,
        F: Fn(&A) + 'static,
    {
        let listener: SyncListener = Rc::new(move |_timeline: &Timeline, value: &RawValue| {
            if let EventState::Fired(v) = downcast::<EventState<A>>(value.clone()).as_ref() {
                f(v);
            }
        });
        self.timeline.register_sync_listener(self.node, listener)
    }

    /// Unregisters a listener previously returned from [`Event::on_fire`].
    pub fn unlisten(&self, token: SyncListenerToken) {
        self.timeline.unregister_sync_listener(token);
    }

    /// Unregisters an async listener previously returned from
    /// [`Event::collect`].
    pub fn uncollect(&self, token: AsyncListenerToken) {
        self.timeline.unregister_async_listener(token);
    }

    /// A new event whose occurrence is `f` applied to this event's, `None`
    /// preserved as `None`.
    pub fn map<B: 'static>(&self, f: impl Fn(&A) -> B + 'static) -> Event<B> {
        let parent = self.node;
        let recompute: RecomputeFn = Rc::new(move |timeline: &Timeline| {
            let parent_value = downcast::<EventState<A>>(timeline.fetch_node_value(parent));
            let mapped = match parent_value.as_ref() {
                EventState::Fired(v) => EventState::Fired(f(v)),
                EventState::None => EventState::None,
            };
            erase(mapped)
        });
        let id = self.timeline.create_derived_node(&[parent], recompute, None, None);
        install_reset_to_none::<B>(&self.timeline, id);
        Event::from_parts(self.timeline.clone(), id)
    }

    /// A new event that only passes through occurrences for which `p`
    /// holds.
    pub fn filter(&self, p: impl Fn(&A) -> bool + 'static) -> Event<A>
    where
        A: Clone,
    {
        let parent = self.node;
        let recompute: RecomputeFn = Rc::new(move |timeline: &Timeline| {
            let parent_value = downcast::<EventState<A>>(timeline.fetch_node_value(parent));
            let filtered = match parent_value.as_ref() {
                EventState::Fired(v) if p(v) => EventState::Fired(v.clone()),
                _ => EventState::None,
            };
            erase(filtered)
        });
        let id = self.timeline.create_derived_node(&[parent], recompute, None, None);
        install_reset_to_none::<A>(&self.timeline, id);
        Event::from_parts(self.timeline.clone(), id)
    }

    /// A new event that only passes through occurrences while `behavior`
    /// samples `false`.
    ///
    /// Note the polarity: this blocks the occurrence when the behavior is
    /// `true`, the opposite of the more common reading of "gate". That is
    /// the long-standing behavior of this operator and is preserved here
    /// deliberately rather than flipped to the more intuitive sense.
    pub fn gate<B>(&self, behavior: B) -> Event<A>
    where
        A: Clone,
        B: crate::behavior::Behavior<bool> + 'static,
    {
        let parent = self.node;
        let recompute: RecomputeFn = Rc::new(move |timeline: &Timeline| {
            let parent_value = downcast::<EventState<A>>(timeline.fetch_node_value(parent));
            let gated = match parent_value.as_ref() {
                EventState::Fired(v) if !behavior.sample() => EventState::Fired(v.clone()),
                _ => EventState::None,
            };
            erase(gated)
        });
        let id = self.timeline.create_derived_node(&[parent], recompute, None, None);
        install_reset_to_none::<A>(&self.timeline, id);
        Event::from_parts(self.timeline.clone(), id)
    }

    /// Combines several events of the same type with the default
    /// [`Leftmost`] strategy. See [`Event::merged_with`].
    pub fn merged(events: &[Event<A>]) -> Event<A>
    where
        A: Clone,
    {
        Event::merged_with(Leftmost, events)
    }

    /// Combines several events of the same type into one: fires
    /// `Fired(strategy.merge(fired_values))` in any frame where at least one
    /// parent fires, `None` otherwise.
    pub fn merged_with<S>(strategy: S, events: &[Event<A>]) -> Event<A>
    where
        A: Clone,
        S: MergeStrategy<A> + 'static,
    {
        assert!(!events.is_empty(), "Event::merged_with requires at least one event");
        let timeline = events[0].timeline.clone();
        let parents: Vec<NodeId> = events.iter().map(Event::node_id).collect();
        let strategy = Rc::new(strategy);
        let recompute: RecomputeFn = {
            let parents = parents.clone();
            Rc::new(move |timeline: &Timeline| {
                let fired: Vec<A> = parents
                    .iter()
                    .filter_map(|&id| match downcast::<EventState<A>>(timeline.fetch_node_value(id)).as_ref() {
                        EventState::Fired(v) => Some(v.clone()),
                        EventState::None => None,
                    })
                    .collect();
                let merged = if fired.is_empty() {
                    EventState::None
                } else {
                    EventState::Fired(strategy.merge(fired))
                };
                erase(merged)
            })
        };
        let id = timeline.create_derived_node(&parents, recompute, None, None);
        install_reset_to_none::<A>(&timeline, id);
        Event::from_parts(timeline, id)
    }

    /// Registers an async callback invoked with the unwrapped value every
    /// time this event fires; `None` frames are skipped silently.
    pub fn collect<F>(&self, f: F) -> AsyncListenerToken
    where
        A: Clone,
        F: FnMut(A) + 'static,
    {
        let callback = Rc::new(RefCell::new(f));
        let listener: AsyncListener = Rc::new(move |value: RawValue| {
            let callback = callback.clone();
            Box::pin(async move {
                if let EventState::Fired(v) = downcast::<EventState<A>>(value).as_ref() {
                    (*callback.borrow_mut())(v.clone());
                }
            })
        });
        self.timeline.register_async_listener(self.node, listener)
    }
}

/// An [`Event`] that an external producer can drive with [`BroadcastEvent::send`].
pub struct BroadcastEvent<A> {
    event: Event<A>,
}

impl<A> Clone for BroadcastEvent<A> {
    fn clone(&self) -> Self {
        BroadcastEvent { event: self.event.clone() }
    }
}

impl<A: 'static> std::ops::Deref for BroadcastEvent<A> {
    type Target = Event<A>;

    fn deref(&self) -> &Event<A> {
        &self.event
    }
}

impl<A: 'static> BroadcastEvent<A> {
    /// Fires this event with `value` for the current frame: writes the new
    /// raw value, bumps the frame counter (this node is external), fires
    /// listeners, and propagates to children.
    pub fn send(&self, value: A) {
        self.event.timeline.update_node_value(self.event.node, erase(EventState::Fired(value)), false);
    }
}

fn new_event_node<A: 'static>(timeline: &Timeline, external: bool, label: Option<&str>) -> Event<A> {
    let id = timeline.create_node(erase(EventState::<A>::None), external, None, None, label.map(str::to_string));
    install_reset_to_none::<A>(timeline, id);
    Event::from_parts(timeline.clone(), id)
}

fn current_timeline() -> Result<Timeline, TimelineError> {
    Timeline::current()
}

/// Creates an event on the ambient timeline whose occurrences are driven
/// externally with [`BroadcastEvent::send`]. Registers the node as external,
/// so every `send` advances the frame counter when time travel is enabled.
pub fn broadcast_event<A: 'static>(label: Option<&str>) -> Result<BroadcastEvent<A>, TimelineError> {
    Ok(broadcast_event_on(&current_timeline()?, label))
}

/// Like [`broadcast_event`], against an explicit timeline rather than the
/// ambient one.
pub fn broadcast_event_on<A: 'static>(timeline: &Timeline, label: Option<&str>) -> BroadcastEvent<A> {
    BroadcastEvent { event: new_event_node(timeline, true, label) }
}

/// Like [`broadcast_event`], but the node is not registered as external: a
/// `send` does not advance the frame counter. Used by the timeline itself
/// (and by derived-node plumbing such as fold replay) for updates that must
/// be observed as happening within the current frame.
pub fn internal_broadcast_event<A: 'static>(label: Option<&str>) -> Result<BroadcastEvent<A>, TimelineError> {
    Ok(internal_broadcast_event_on(&current_timeline()?, label))
}

/// Like [`internal_broadcast_event`], against an explicit timeline.
pub fn internal_broadcast_event_on<A: 'static>(timeline: &Timeline, label: Option<&str>) -> BroadcastEvent<A> {
    BroadcastEvent { event: new_event_node(timeline, false, label) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timeline::TimelineConfig;

    #[test]
    fn event_resets_to_none_after_firing_frame() {
        let timeline = Timeline::new(TimelineConfig::default());
        let e = broadcast_event_on::<i32>(&timeline, None);
        let last = e.map(|v| *v);

        assert_eq!(last.sample(), EventState::None);
        e.send(7);
        assert_eq!(last.sample(), EventState::Fired(7));

        // Any other external update rolls the previous frame's occurrence
        // back to `None` before the new one is processed.
        let other = broadcast_event_on::<i32>(&timeline, None);
        other.send(1);
        assert_eq!(last.sample(), EventState::None);
    }

    #[test]
    fn filter_drops_non_matching_occurrences() {
        let timeline = Timeline::new(TimelineConfig::default());
        let e = broadcast_event_on::<i32>(&timeline, None);
        let evens = e.filter(|v| v % 2 == 0);

        e.send(3);
        assert_eq!(evens.sample(), EventState::None);
        e.send(4);
        assert_eq!(evens.sample(), EventState::Fired(4));
    }

    #[test]
    fn on_fire_sees_only_fired_frames_until_unlistened() {
        let timeline = Timeline::new(TimelineConfig::default());
        let e = broadcast_event_on::<i32>(&timeline, None);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let recorded = seen.clone();
        let token = e.on_fire(move |v| recorded.borrow_mut().push(*v));

        e.send(1);
        let other = broadcast_event_on::<i32>(&timeline, None);
        other.send(0);
        e.send(2);
        assert_eq!(*seen.borrow(), vec![1, 2]);

        e.unlisten(token);
        e.send(3);
        assert_eq!(*seen.borrow(), vec![1, 2]);
    }

    #[test]
    fn merged_leftmost_breaks_ties() {
        let timeline = Timeline::new(TimelineConfig::default());
        let a = broadcast_event_on::<i32>(&timeline, None);
        let b = broadcast_event_on::<i32>(&timeline, None);
        let merged = Event::merged(&[(*a).clone(), (*b).clone()]);

        a.send(1);
        assert_eq!(merged.sample(), EventState::Fired(1));
    }
}

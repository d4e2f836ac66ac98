//! A push-pull reactive dependency graph: a directed acyclic graph of
//! reactive values ("nodes") that propagates updates from inputs to
//! dependents with lazy recomputation and, optionally, frame-by-frame
//! rollback.
//!
//! Three kinds of reactive value sit on top of the graph:
//!
//! - [`event::Event`] — a value that exists only at discrete instants.
//! - [`state::State`] — a stepwise function of time with an always-present
//!   current value.
//! - [`behavior::Behavior`] — an abstract sampled value, not necessarily a
//!   graph node at all.
//!
//! The graph itself ([`Timeline`]) owns every node, the adjacency between
//! them, and — when `TimelineConfig::time_travel` is set — the frame history
//! that backs [`Timeline::rollback_state`]/[`Timeline::next_state`].
//!
//! This crate has no opinion about where updates come from or how async
//! listeners are scheduled: producers call [`event::BroadcastEvent::send`] or
//! [`state::MutableState::set`], and asynchronous dispatch goes through the
//! executor-agnostic `timeline_executor` crate rather than any one async
//! runtime.

mod error;
mod node;
mod timeline;

pub mod behavior;
pub mod event;
pub mod state;

pub use error::TimelineError;
pub use node::{AsyncListenerToken, NodeId, SyncListenerToken};
pub use timeline::{ClockFactory, Timeline, TimelineConfig};

pub use behavior::Behavior;
pub use event::{
    broadcast_event, broadcast_event_on, internal_broadcast_event, internal_broadcast_event_on,
    BroadcastEvent, Event, EventState, Leftmost, MergeStrategy,
};
pub use state::{mutable_state_of, mutable_state_on, MutableState, State};

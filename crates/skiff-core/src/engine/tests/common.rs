use super::*;

/// Starting time for every test clock.
pub(super) const T0: Timestamp = 1_000_000;

pub(super) fn test_engine() -> (QueueEngine, ManualClock) {
    test_engine_with_config(EngineConfig::default())
}

pub(super) fn test_engine_with_config(config: EngineConfig) -> (QueueEngine, ManualClock) {
    let clock = ManualClock::new(T0);
    let engine = QueueEngine::new(config, Arc::new(clock.clone())).unwrap();
    (engine, clock)
}

/// Helper: enqueue with default options.
pub(super) fn enqueue(engine: &mut QueueEngine, topic: &str, payload: &[u8]) -> Message {
    engine
        .enqueue(topic, payload.to_vec(), EnqueueOptions::default())
        .unwrap()
}

/// Helper: enqueue with a retry budget of `max_attempts`.
pub(super) fn enqueue_with_attempts(
    engine: &mut QueueEngine,
    topic: &str,
    payload: &[u8],
    max_attempts: u32,
) -> Message {
    engine
        .enqueue(
            topic,
            payload.to_vec(),
            EnqueueOptions::default().max_attempts(max_attempts),
        )
        .unwrap()
}

/// Helper: reserve and insist something comes back.
pub(super) fn reserve_some(engine: &mut QueueEngine, topic: &str) -> Message {
    engine
        .reserve(topic, None)
        .unwrap()
        .unwrap_or_else(|| panic!("expected a message on topic {topic}"))
}

/// Helper: assert the message is in exactly one live structure, or none.
pub(super) fn assert_state(engine: &QueueEngine, msg_id: &MessageId, expected: State) {
    let pending = engine
        .pending_messages(None)
        .unwrap()
        .iter()
        .any(|m| m.id == *msg_id);
    let inflight = engine
        .inflight_messages(None)
        .unwrap()
        .iter()
        .any(|m| m.id == *msg_id);
    let dead = engine
        .dead_letter_messages(None)
        .unwrap()
        .iter()
        .filter(|m| m.id == *msg_id)
        .count();

    let actual = match (pending, inflight, dead) {
        (true, false, 0) => State::Pending,
        (false, true, 0) => State::Inflight,
        (false, false, 1) => State::DeadLettered,
        (false, false, 0) => State::Gone,
        other => panic!("message {msg_id} is in an inconsistent state: {other:?}"),
    };
    assert_eq!(actual, expected, "message {msg_id}");
}

#[derive(Debug, PartialEq, Eq)]
pub(super) enum State {
    Pending,
    Inflight,
    DeadLettered,
    Gone,
}

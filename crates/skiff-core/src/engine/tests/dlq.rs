use super::*;

/// Helper: enqueue one message on `topic` and reject it straight to the
/// dead-letter store.
fn dead_letter_one(engine: &mut QueueEngine, topic: &str, payload: &[u8]) -> MessageId {
    let msg = enqueue(engine, topic, payload);
    let reserved = reserve_some(engine, topic);
    assert_eq!(reserved.id, msg.id);
    engine
        .nack(&msg.id, NackOptions::reject().error("bad payload"))
        .unwrap();
    msg.id
}

#[test]
fn dead_letters_are_kept_per_topic() {
    let (mut engine, _clock) = test_engine();
    let a = dead_letter_one(&mut engine, "a", b"a");
    let b = dead_letter_one(&mut engine, "b", b"b");

    let only_a: Vec<MessageId> = engine
        .dead_letter_messages(Some("a"))
        .unwrap()
        .iter()
        .map(|m| m.id)
        .collect();
    assert_eq!(only_a, vec![a]);

    let all: Vec<MessageId> = engine
        .dead_letter_messages(None)
        .unwrap()
        .iter()
        .map(|m| m.id)
        .collect();
    assert_eq!(all, vec![a, b]);
}

#[test]
fn dead_letter_keeps_message_fields() {
    let (mut engine, clock) = test_engine();
    let msg = engine
        .enqueue(
            "orders",
            b"body".to_vec(),
            EnqueueOptions::default()
                .max_attempts(3)
                .metadata("tenant", "acme"),
        )
        .unwrap();
    reserve_some(&mut engine, "orders");
    clock.advance(Duration::from_millis(42));
    engine
        .nack(&msg.id, NackOptions::reject().error("schema mismatch"))
        .unwrap();

    let dead = &engine.dead_letter_messages(Some("orders")).unwrap()[0];
    assert_eq!(dead.topic, "orders");
    assert_eq!(dead.payload, b"body");
    assert_eq!(dead.max_attempts, 3);
    assert_eq!(dead.metadata, msg.metadata);
    assert_eq!(dead.created_at, T0);
    assert_eq!(dead.failed_at, T0 + 42);
}

#[test]
fn dead_lettered_messages_are_not_live() {
    let (mut engine, _clock) = test_engine();
    let id = dead_letter_one(&mut engine, "orders", b"p");

    assert!(engine.pending_messages(Some("orders")).unwrap().is_empty());
    assert!(engine.inflight_messages(Some("orders")).unwrap().is_empty());
    assert_eq!(engine.ack(&id).unwrap_err(), QueueError::NotInflight(id));
    assert_eq!(
        engine.extend_ack_deadline(&id, Duration::from_secs(1)).unwrap_err(),
        QueueError::NotInflight(id)
    );
}

#[test]
fn redrive_moves_dead_letters_back_with_fresh_attempts() {
    let (mut engine, clock) = test_engine();
    let id = dead_letter_one(&mut engine, "orders", b"p");
    clock.advance(Duration::from_millis(10));

    assert_eq!(engine.redrive("orders", 0).unwrap(), 1);
    assert!(engine.dead_letter_messages(Some("orders")).unwrap().is_empty());

    let msg = reserve_some(&mut engine, "orders");
    assert_eq!(msg.id, id);
    assert_eq!(msg.attempts, 1);
    assert_eq!(msg.created_at, T0);
    assert_eq!(msg.last_error.as_deref(), Some("bad payload"));
}

#[test]
fn redrive_respects_count_and_order() {
    let (mut engine, _clock) = test_engine();
    let ids: Vec<MessageId> = (0..3u8)
        .map(|i| dead_letter_one(&mut engine, "orders", &[i]))
        .collect();

    assert_eq!(engine.redrive("orders", 2).unwrap(), 2);

    let left: Vec<MessageId> = engine
        .dead_letter_messages(Some("orders"))
        .unwrap()
        .iter()
        .map(|m| m.id)
        .collect();
    assert_eq!(left, vec![ids[2]]);
    assert_eq!(reserve_some(&mut engine, "orders").id, ids[0]);
    assert_eq!(reserve_some(&mut engine, "orders").id, ids[1]);
}

#[test]
fn redrive_empty_topic_moves_nothing() {
    let (mut engine, _clock) = test_engine();
    assert_eq!(engine.redrive("nothing-here", 0).unwrap(), 0);
    assert!(matches!(
        engine.redrive(" ", 0),
        Err(QueueError::InvalidArgument(_))
    ));
}

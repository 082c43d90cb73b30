use super::*;

#[test]
fn reserve_leases_message_and_counts_attempt() {
    let (mut engine, _clock) = test_engine();
    let msg = enqueue(&mut engine, "orders", b"p1");

    let reserved = engine
        .reserve("orders", Some(Duration::from_secs(10)))
        .unwrap()
        .expect("message should be eligible");

    assert_eq!(reserved.id, msg.id);
    assert_eq!(reserved.attempts, 1);
    assert_eq!(reserved.ack_deadline, Some(T0 + 10_000));
    assert!(!msg.is_inflight());
    assert!(reserved.is_inflight());
    assert_state(&engine, &msg.id, State::Inflight);
}

#[test]
fn reserve_uses_default_ack_timeout() {
    let (mut engine, _clock) = test_engine();
    enqueue(&mut engine, "orders", b"p1");

    let reserved = reserve_some(&mut engine, "orders");
    assert_eq!(
        engine.config().default_ack_timeout(),
        Duration::from_millis(EngineConfig::DEFAULT_ACK_TIMEOUT_MS)
    );
    assert_eq!(
        reserved.ack_deadline,
        Some(T0 + EngineConfig::DEFAULT_ACK_TIMEOUT_MS)
    );
}

#[test]
fn reserve_unknown_topic_returns_none() {
    let (mut engine, _clock) = test_engine();
    assert_eq!(engine.reserve("never-used", None).unwrap(), None);
}

#[test]
fn reserve_empty_topic_name_is_invalid() {
    let (mut engine, _clock) = test_engine();
    let err = engine.reserve("", None).unwrap_err();
    assert!(matches!(err, QueueError::InvalidArgument(_)), "got {err:?}");
}

#[test]
fn reserve_zero_ack_timeout_is_invalid() {
    let (mut engine, _clock) = test_engine();
    let msg = enqueue(&mut engine, "orders", b"p1");

    let err = engine.reserve("orders", Some(Duration::ZERO)).unwrap_err();
    assert!(matches!(err, QueueError::InvalidArgument(_)), "got {err:?}");
    // The failed call must not have leased anything
    assert_state(&engine, &msg.id, State::Pending);
}

#[test]
fn reserve_sub_millisecond_ack_timeout_is_invalid() {
    let (mut engine, _clock) = test_engine();
    let msg = enqueue(&mut engine, "orders", b"p1");

    let err = engine
        .reserve("orders", Some(Duration::from_micros(500)))
        .unwrap_err();
    assert!(matches!(err, QueueError::InvalidArgument(_)), "got {err:?}");
    assert_state(&engine, &msg.id, State::Pending);

    // Without the clock moving, a valid lease is not handed out again
    let reserved = engine
        .reserve("orders", Some(Duration::from_millis(1)))
        .unwrap()
        .unwrap();
    assert_eq!(reserved.ack_deadline, Some(T0 + 1));
    assert!(engine.reserve("orders", None).unwrap().is_none());
}

#[test]
fn reserve_does_not_return_same_message_twice() {
    let (mut engine, _clock) = test_engine();
    enqueue(&mut engine, "orders", b"p1");

    reserve_some(&mut engine, "orders");
    assert_eq!(engine.reserve("orders", None).unwrap(), None);
}

#[test]
fn delayed_message_becomes_eligible_after_delay() {
    // enqueue with delay 10 → reserve is empty → advance ≥ 10 → reserve returns it
    let (mut engine, clock) = test_engine();
    let msg = engine
        .enqueue(
            "t",
            b"P".to_vec(),
            EnqueueOptions::default().delay(Duration::from_millis(10)),
        )
        .unwrap();

    assert_eq!(engine.reserve("t", None).unwrap(), None);

    clock.advance(Duration::from_millis(9));
    assert_eq!(engine.reserve("t", None).unwrap(), None);

    clock.advance(Duration::from_millis(1));
    let reserved = reserve_some(&mut engine, "t");
    assert_eq!(reserved.id, msg.id);
    assert_eq!(reserved.payload, b"P");
}

#[test]
fn delayed_head_blocks_nothing_behind_it_that_is_later() {
    let (mut engine, clock) = test_engine();
    engine
        .enqueue(
            "t",
            b"late".to_vec(),
            EnqueueOptions::default().delay(Duration::from_millis(50)),
        )
        .unwrap();
    let early = engine
        .enqueue(
            "t",
            b"early".to_vec(),
            EnqueueOptions::default().delay(Duration::from_millis(20)),
        )
        .unwrap();

    clock.advance(Duration::from_millis(30));
    let reserved = reserve_some(&mut engine, "t");
    assert_eq!(reserved.id, early.id);
    assert_eq!(engine.reserve("t", None).unwrap(), None);
}

#[test]
fn earlier_available_at_is_reserved_first() {
    let (mut engine, clock) = test_engine();
    let later = engine
        .enqueue(
            "t",
            b"2".to_vec(),
            EnqueueOptions::default().delay(Duration::from_millis(5)),
        )
        .unwrap();
    let sooner = engine
        .enqueue(
            "t",
            b"1".to_vec(),
            EnqueueOptions::default().delay(Duration::from_millis(1)),
        )
        .unwrap();

    clock.advance(Duration::from_millis(10));
    assert_eq!(reserve_some(&mut engine, "t").id, sooner.id);
    assert_eq!(reserve_some(&mut engine, "t").id, later.id);
}

#[test]
fn equal_available_at_is_fifo() {
    let (mut engine, _clock) = test_engine();
    let ids: Vec<MessageId> = (0..5)
        .map(|i| enqueue(&mut engine, "t", &[i]).id)
        .collect();

    let reserved: Vec<MessageId> = (0..5).map(|_| reserve_some(&mut engine, "t").id).collect();
    assert_eq!(reserved, ids);
}

#[test]
fn topics_are_independent() {
    let (mut engine, _clock) = test_engine();
    let a = enqueue(&mut engine, "a", b"a");
    let b = enqueue(&mut engine, "b", b"b");

    assert_eq!(reserve_some(&mut engine, "b").id, b.id);
    assert_eq!(engine.reserve("b", None).unwrap(), None);
    assert_eq!(reserve_some(&mut engine, "a").id, a.id);
}

#[test]
fn requeued_message_goes_behind_newer_same_instant_message() {
    let (mut engine, _clock) = test_engine();
    let first = enqueue(&mut engine, "t", b"first");
    let reserved = reserve_some(&mut engine, "t");
    assert_eq!(reserved.id, first.id);

    // Enqueued at the same instant the nack will reschedule `first` to
    let second = enqueue(&mut engine, "t", b"second");
    engine.nack(&first.id, NackOptions::default()).unwrap();

    assert_eq!(reserve_some(&mut engine, "t").id, second.id);
    assert_eq!(reserve_some(&mut engine, "t").id, first.id);
}

//! Stream subsystem tests driven through the engine.

use pretty_assertions::assert_eq;

use rill_ir::StreamSource;
use rill_value::Value;

use crate::evaluator::RunState;
use crate::tests::{engine, engine_with_node};

#[test]
fn test_time_stream_reevaluates_on_push() {
    let (mut engine, time_node) = engine_with_node(|a| {
        let interval = a.number_with_unit(100.0, "ms");
        let time = a.stream(StreamSource::Time, &[interval]);
        let t = a.bind("t", time);
        let t_ref = a.reference("t");
        (a.block(&[t, t_ref]), time)
    });

    assert_eq!(engine.evaluate(), Value::number_with_unit(0.0, "ms"));

    let id = engine.stream_for_node(time_node).unwrap();
    engine.push(id, Value::number_with_unit(100.0, "ms"));
    assert_eq!(engine.latest_value(), Value::number_with_unit(100.0, "ms"));

    engine.push(id, Value::number_with_unit(200.0, "ms"));
    assert_eq!(engine.latest_value(), Value::number_with_unit(200.0, "ms"));
    assert_eq!(engine.history().pass_count(), 3);
}

#[test]
fn test_changed_reports_triggering_stream() {
    let (mut engine, time_node) = engine_with_node(|a| {
        let time = a.stream(StreamSource::Time, &[]);
        let t = a.bind("t", time);
        let t_ref = a.reference("t");
        let changed = a.changed(t_ref);
        (a.block(&[t, changed]), time)
    });

    // Program start is not a stream change.
    assert_eq!(engine.evaluate(), Value::bool(false));

    let id = engine.stream_for_node(time_node).unwrap();
    engine.push(id, Value::number_with_unit(50.0, "ms"));
    assert_eq!(engine.latest_value(), Value::bool(true));
}

#[test]
fn test_pushes_queue_while_paused() {
    let (mut engine, time_node) = engine_with_node(|a| {
        let time = a.stream(StreamSource::Time, &[]);
        let t = a.bind("t", time);
        let t_ref = a.reference("t");
        (a.block(&[t, t_ref]), time)
    });
    engine.evaluate();
    let id = engine.stream_for_node(time_node).unwrap();

    engine.pause();
    engine.push(id, Value::number_with_unit(1.0, "ms"));
    engine.push(id, Value::number_with_unit(2.0, "ms"));
    assert_eq!(engine.history().pass_count(), 1);

    // Draining preserves observed order, one pass per change.
    engine.play();
    assert_eq!(engine.history().pass_count(), 3);
    assert_eq!(engine.latest_value(), Value::number_with_unit(2.0, "ms"));
}

#[test]
fn test_changed_streams_are_ordered() {
    let (mut engine, time_node) = engine_with_node(|a| {
        let time = a.stream(StreamSource::Time, &[]);
        let t = a.bind("t", time);
        let t_ref = a.reference("t");
        (a.block(&[t, t_ref]), time)
    });
    engine.evaluate();
    let id = engine.stream_for_node(time_node).unwrap();
    engine.push(id, Value::number_with_unit(1.0, "ms"));
    engine.push(id, Value::number_with_unit(2.0, "ms"));

    let changes = engine.changed_streams();
    assert_eq!(changes.len(), 2);
    assert_eq!(changes[0].pass, 1);
    assert_eq!(changes[0].value, Value::number_with_unit(1.0, "ms"));
    assert_eq!(changes[1].pass, 2);
}

#[test]
fn test_pass_determinism() {
    let build = |a: &mut rill_ir::NodeArena| {
        let time = a.stream(StreamSource::Time, &[]);
        let t = a.bind("t", time);
        let t_ref = a.reference("t");
        let hundred = a.number_with_unit(100.0, "ms");
        let sum = a.binary(rill_ir::BinaryOp::Add, t_ref, hundred);
        (a.block(&[t, sum]), time)
    };
    let pushes = [
        Value::number_with_unit(10.0, "ms"),
        Value::number_with_unit(20.0, "ms"),
        Value::number_with_unit(30.0, "ms"),
    ];

    let mut results: Vec<Vec<Value>> = Vec::new();
    for _ in 0..2 {
        let (mut engine, time_node) = engine_with_node(build);
        engine.evaluate();
        let id = engine.stream_for_node(time_node).unwrap();
        for push in &pushes {
            engine.push(id, push.clone());
        }
        results.push(
            engine
                .history()
                .passes()
                .iter()
                .filter_map(|p| p.final_value.clone())
                .collect(),
        );
    }
    assert_eq!(results[0], results[1]);
    assert_eq!(results[0].len(), 4);
}

#[test]
fn test_misconfigured_stream_reads_as_none() {
    let mut engine = engine(|a| {
        let bad = a.text("fast");
        let time = a.stream(StreamSource::Time, &[bad]);
        let t = a.bind("t", time);
        let t_ref = a.reference("t");
        a.block(&[t, t_ref])
    });
    // Creation failure yields none, not a halt.
    assert_eq!(engine.evaluate(), Value::none());
    assert_eq!(engine.state(), RunState::Completed);
    assert_eq!(engine.streams_created(), 0);
}

#[test]
fn test_random_never_triggers_a_pass() {
    let (mut engine, random_node) = engine_with_node(|a| {
        let min = a.number(0.0);
        let max = a.number(10.0);
        let seed = a.number(7.0);
        let random = a.stream(StreamSource::Random, &[min, max, seed]);
        let r = a.bind("r", random);
        let r_ref = a.reference("r");
        (a.block(&[r, r_ref]), random)
    });
    engine.evaluate();
    assert_eq!(engine.history().pass_count(), 1);

    let id = engine.stream_for_node(random_node).unwrap();
    engine.push(id, Value::number(5.0));
    assert_eq!(engine.history().pass_count(), 1);
}

#[test]
fn test_random_reads_fresh_per_read() {
    // Two reads of one random stream in one pass draw two values.
    let (mut engine, random_node) = engine_with_node(|a| {
        let min = a.number(0.0);
        let max = a.number(10.0);
        let seed = a.number(7.0);
        let random = a.stream(StreamSource::Random, &[min, max, seed]);
        let r = a.bind("r", random);
        let first = a.reference("r");
        let second = a.reference("r");
        let pair = a.list_of(&[first, second]);
        (a.block(&[r, pair]), random)
    });
    engine.evaluate();
    let id = engine.stream_for_node(random_node).unwrap();
    let drawn = engine.streams().get(id).unwrap().values().len();
    // One draw at creation plus one per read.
    assert_eq!(drawn, 3);
}

#[test]
fn test_stop_is_idempotent_and_final() {
    let (mut engine, time_node) = engine_with_node(|a| {
        let time = a.stream(StreamSource::Time, &[]);
        let t = a.bind("t", time);
        let t_ref = a.reference("t");
        (a.block(&[t, t_ref]), time)
    });
    engine.evaluate();
    let id = engine.stream_for_node(time_node).unwrap();

    engine.stop();
    engine.stop();
    assert_eq!(engine.state(), RunState::Stopped);
    assert!(!engine.is_playing());

    // Pushes after teardown are dropped.
    engine.push(id, Value::number_with_unit(1.0, "ms"));
    assert_eq!(engine.history().pass_count(), 1);
}

#[test]
fn test_observers_see_stream_changes() {
    use std::cell::RefCell;
    use std::rc::Rc;

    let (mut engine, time_node) = engine_with_node(|a| {
        let time = a.stream(StreamSource::Time, &[]);
        let t = a.bind("t", time);
        let t_ref = a.reference("t");
        (a.block(&[t, t_ref]), time)
    });
    engine.evaluate();

    let notices = Rc::new(RefCell::new(Vec::new()));
    let sink = notices.clone();
    let handle = engine.observe(Box::new(move |notice| {
        sink.borrow_mut().push(notice.clone());
    }));

    let id = engine.stream_for_node(time_node).unwrap();
    engine.push(id, Value::number_with_unit(5.0, "ms"));
    assert!(!notices.borrow().is_empty());

    let seen = notices.borrow().len();
    assert!(engine.ignore(handle));
    engine.push(id, Value::number_with_unit(6.0, "ms"));
    assert_eq!(notices.borrow().len(), seen);
}

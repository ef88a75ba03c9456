//! Reaction cache and re-evaluation tests.

use pretty_assertions::assert_eq;

use rill_ir::{BinaryOp, NodeArena, NodeId, StreamSource};
use rill_value::{ExceptionKind, Value};

use crate::evaluator::RunState;
use crate::tests::{engine, engine_with_node};

/// `t: Time  0 … ∆t … previous + 1` - a counter that increments on every
/// tick.
fn counter_program(a: &mut NodeArena) -> (NodeId, NodeId) {
    let time = a.stream(StreamSource::Time, &[]);
    let t = a.bind("t", time);
    let initial = a.number(0.0);
    let t_ref = a.reference("t");
    let condition = a.changed(t_ref);
    let prev = a.previous();
    let one = a.number(1.0);
    let next = a.binary(BinaryOp::Add, prev, one);
    let reaction = a.reaction(initial, condition, next);
    (a.block(&[t, reaction]), time)
}

#[test]
fn test_reaction_starts_at_initial_value() {
    let (mut engine, _) = engine_with_node(counter_program);
    assert_eq!(engine.evaluate(), Value::number(0.0));
}

#[test]
fn test_reaction_fires_on_stream_change() {
    let (mut engine, time_node) = engine_with_node(counter_program);
    engine.evaluate();
    let id = engine.stream_for_node(time_node).unwrap();

    engine.push(id, Value::number_with_unit(100.0, "ms"));
    assert_eq!(engine.latest_value(), Value::number(1.0));

    engine.push(id, Value::number_with_unit(200.0, "ms"));
    engine.push(id, Value::number_with_unit(300.0, "ms"));
    assert_eq!(engine.latest_value(), Value::number(3.0));
}

#[test]
fn test_one_stream_per_reaction_node() {
    let (mut engine, time_node) = engine_with_node(counter_program);
    engine.evaluate();
    let id = engine.stream_for_node(time_node).unwrap();

    for i in 1..=5 {
        engine.push(id, Value::number_with_unit(f64::from(i) * 100.0, "ms"));
    }
    // Six passes, two streams: the time input and one reaction stream.
    assert_eq!(engine.history().pass_count(), 6);
    assert_eq!(engine.streams_created(), 2);
}

#[test]
fn test_reaction_without_stream_condition_never_fires() {
    // The condition is constant, and nothing else triggers passes, so the
    // reaction can never fire.
    let mut engine = engine(|a| {
        let initial = a.number(0.0);
        let condition = a.boolean(true);
        let next = a.number(99.0);
        a.reaction(initial, condition, next)
    });
    assert_eq!(engine.evaluate(), Value::number(0.0));
    assert_eq!(engine.evaluate(), Value::number(0.0));
    assert_eq!(engine.history().pass_count(), 1);
}

#[test]
fn test_unfired_condition_keeps_current_value() {
    // A reaction re-checks its condition every pass; a false condition
    // reads the existing stream value.
    let (mut engine, time_node) = engine_with_node(|a| {
        let time = a.stream(StreamSource::Time, &[]);
        let t = a.bind("t", time);
        let initial = a.number(5.0);
        let condition = a.boolean(false);
        let next = a.number(99.0);
        let reaction = a.reaction(initial, condition, next);
        (a.block(&[t, reaction]), time)
    });
    assert_eq!(engine.evaluate(), Value::number(5.0));

    let id = engine.stream_for_node(time_node).unwrap();
    engine.push(id, Value::number_with_unit(100.0, "ms"));
    assert_eq!(engine.latest_value(), Value::number(5.0));
    assert_eq!(engine.streams_created(), 2);
}

#[test]
fn test_previous_value_feeds_next() {
    // next = previous: the value never moves, however many ticks arrive.
    let (mut engine, time_node) = engine_with_node(|a| {
        let time = a.stream(StreamSource::Time, &[]);
        let t = a.bind("t", time);
        let initial = a.number(5.0);
        let t_ref = a.reference("t");
        let condition = a.changed(t_ref);
        let next = a.previous();
        let reaction = a.reaction(initial, condition, next);
        (a.block(&[t, reaction]), time)
    });
    engine.evaluate();
    let id = engine.stream_for_node(time_node).unwrap();
    engine.push(id, Value::number_with_unit(100.0, "ms"));
    engine.push(id, Value::number_with_unit(200.0, "ms"));
    assert_eq!(engine.latest_value(), Value::number(5.0));
}

#[test]
fn test_previous_outside_reaction_is_unbound() {
    let mut engine = engine(|a| a.previous());
    let value = engine.evaluate();
    match value {
        Value::Exception(e) => {
            assert!(matches!(e.kind, ExceptionKind::UnboundName { .. }));
        }
        other => panic!("expected exception, got {other:?}"),
    }
}

#[test]
fn test_condition_error_halts_later_pass_only() {
    // The condition only runs once the stream exists, so the first pass
    // completes and the second halts.
    let (mut engine, time_node) = engine_with_node(|a| {
        let time = a.stream(StreamSource::Time, &[]);
        let t = a.bind("t", time);
        let initial = a.number(0.0);
        let condition = a.number(1.0); // not a boolean
        let next = a.number(2.0);
        let reaction = a.reaction(initial, condition, next);
        (a.block(&[t, reaction]), time)
    });
    assert_eq!(engine.evaluate(), Value::number(0.0));
    assert_eq!(engine.state(), RunState::Completed);

    let id = engine.stream_for_node(time_node).unwrap();
    engine.push(id, Value::number_with_unit(100.0, "ms"));
    assert_eq!(engine.state(), RunState::Halted);
    assert!(engine.latest_value().is_exception());

    // The first pass's record is untouched.
    let first = &engine.history().passes()[0];
    assert_eq!(first.final_value, Some(Value::number(0.0)));
    assert!(!first.halted);
}

#[test]
fn test_transient_halt_recovers_on_next_change() {
    // A halting pass does not poison the run: the next stream change
    // retries from the top.
    let (mut engine, time_node) = engine_with_node(|a| {
        let time = a.stream(StreamSource::Time, &[]);
        let t = a.bind("t", time);
        let t_ref = a.reference("t");
        let limit = a.number_with_unit(150.0, "ms");
        let over = a.binary(BinaryOp::Gt, t_ref, limit);
        let yes = a.number(1.0);
        let bad = a.number_with_unit(1.0, "px");
        let worse = a.number_with_unit(1.0, "ms");
        let no = a.binary(BinaryOp::Add, bad, worse); // incompatible units
        let choice = a.conditional(over, yes, no);
        (a.block(&[t, choice]), time)
    });
    // Pass 0: t = 0ms, not over the limit, halts on the unit mismatch.
    assert!(engine.evaluate().is_exception());

    // Pass 1: t = 200ms, takes the healthy branch.
    let id = engine.stream_for_node(time_node).unwrap();
    engine.push(id, Value::number_with_unit(200.0, "ms"));
    assert_eq!(engine.latest_value(), Value::number(1.0));
    assert_eq!(engine.state(), RunState::Completed);
}

//! Tests for stream configuration and the registry.

use pretty_assertions::assert_eq;

use rill_ir::{NodeId, StreamSource};
use rill_value::Value;

use crate::stream::{Edge, StreamConfig, StreamOrigin, StreamRegistry};

#[test]
fn test_time_config() {
    let config =
        StreamConfig::parse(StreamSource::Time, &[Value::number_with_unit(100.0, "ms")]).unwrap();
    assert_eq!(config.interval, Some(100.0));
}

#[test]
fn test_time_config_rejects_non_number() {
    assert!(StreamConfig::parse(StreamSource::Time, &[Value::text("fast")]).is_err());
    assert!(StreamConfig::parse(StreamSource::Time, &[Value::number(0.0)]).is_err());
}

#[test]
fn test_key_config() {
    let config = StreamConfig::parse(
        StreamSource::Key,
        &[Value::text("a"), Value::bool(false)],
    )
    .unwrap();
    assert_eq!(config.key.as_deref(), Some("a"));
    assert_eq!(config.edge, Edge::Up);
}

#[test]
fn test_random_config_range() {
    let config = StreamConfig::parse(
        StreamSource::Random,
        &[Value::number(1.0), Value::number(6.0)],
    )
    .unwrap();
    assert_eq!((config.min, config.max), (1.0, 6.0));

    assert!(StreamConfig::parse(
        StreamSource::Random,
        &[Value::number(6.0), Value::number(1.0)]
    )
    .is_err());
}

#[test]
fn test_sources_without_configuration() {
    assert!(StreamConfig::parse(StreamSource::Pointer, &[]).is_ok());
    assert!(StreamConfig::parse(StreamSource::Pointer, &[Value::number(1.0)]).is_err());
}

#[test]
fn test_input_stream_seeding() {
    let mut registry = StreamRegistry::new();
    let id = registry.create_input(
        NodeId::new(0),
        StreamSource::Time,
        StreamConfig::default(),
    );
    let stream = registry.get(id).unwrap();
    assert_eq!(stream.origin(), StreamOrigin::Input(StreamSource::Time));
    assert!(stream.is_reactive());
    assert_eq!(stream.current(), Value::number_with_unit(0.0, "ms"));
}

#[test]
fn test_reaction_streams_do_not_request_passes() {
    let mut registry = StreamRegistry::new();
    let id = registry.create_reaction(NodeId::new(1), Value::number(5.0));
    assert!(!registry.get(id).unwrap().is_reactive());
}

#[test]
fn test_emit_appends_history() {
    let mut registry = StreamRegistry::new();
    let id = registry.create_input(
        NodeId::new(0),
        StreamSource::Mic,
        StreamConfig::default(),
    );
    registry.get_mut(id).unwrap().emit(Value::number(40.0));
    registry.get_mut(id).unwrap().emit(Value::number(80.0));
    let stream = registry.get(id).unwrap();
    assert_eq!(stream.values().len(), 3);
    assert_eq!(stream.current(), Value::number(80.0));
}

#[test]
fn test_seeded_random_reads_are_deterministic() {
    let config = || {
        StreamConfig::parse(
            StreamSource::Random,
            &[Value::number(0.0), Value::number(100.0), Value::number(7.0)],
        )
        .unwrap()
    };
    let mut a = StreamRegistry::new();
    let a_id = a.create_input(NodeId::new(0), StreamSource::Random, config());
    let mut b = StreamRegistry::new();
    let b_id = b.create_input(NodeId::new(0), StreamSource::Random, config());

    let a_values: Vec<Value> = (0..4).map(|_| a.read_current(a_id)).collect();
    let b_values: Vec<Value> = (0..4).map(|_| b.read_current(b_id)).collect();
    assert_eq!(a_values, b_values);
}

#[test]
fn test_random_regenerates_per_read() {
    let mut registry = StreamRegistry::new();
    let config = StreamConfig::parse(
        StreamSource::Random,
        &[Value::number(0.0), Value::number(100.0), Value::number(7.0)],
    )
    .unwrap();
    let id = registry.create_input(NodeId::new(0), StreamSource::Random, config);
    let before = registry.get(id).unwrap().values().len();
    let _ = registry.read_current(id);
    let _ = registry.read_current(id);
    // Every read draws (and records) a fresh value.
    assert_eq!(registry.get(id).unwrap().values().len(), before + 2);
}

#[test]
fn test_stop_all_is_idempotent() {
    let mut registry = StreamRegistry::new();
    let id = registry.create_input(
        NodeId::new(0),
        StreamSource::Key,
        StreamConfig::default(),
    );
    registry.stop_all();
    registry.stop_all();
    assert!(!registry.get(id).unwrap().is_active());
    assert_eq!(registry.created(), 1);
}

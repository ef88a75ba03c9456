//! Typed external-input streams.
//!
//! A stream models one time-varying input (clock ticks, key events, pointer
//! position, button edges, microphone amplitude, randomness, simulated
//! motion) or one reaction's evolving value. Streams live in a registry
//! arena owned by one evaluator per program run; everything else refers to
//! them by [`StreamId`], never by pointer.
//!
//! External sources push raw values through the host; pushes are queued by
//! the evaluator and drained between passes, so a push never interrupts a
//! pass in progress.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use rill_ir::{NodeId, StreamSource};
use rill_value::exception::{malformed_container, type_mismatch, Exception};
use rill_value::{StreamId, Value};

/// Edge direction for key/button sources.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum Edge {
    /// Fire on press.
    #[default]
    Down,
    /// Fire on release.
    Up,
}

/// Recognized stream configuration options.
///
/// Parsed from the already-evaluated configuration values of a stream
/// input expression; options a source does not recognize are rejected so a
/// misconfigured stream fails creation (and reads as none) instead of
/// silently ignoring its options.
#[derive(Clone, Debug, Default)]
pub struct StreamConfig {
    /// Tick interval in milliseconds (Time).
    pub interval: Option<f64>,
    /// Target key filter (Key).
    pub key: Option<String>,
    /// Edge direction (Key, Button).
    pub edge: Edge,
    /// Numeric range (Random).
    pub min: f64,
    pub max: f64,
    /// Fixed seed (Random); unseeded streams draw from entropy.
    pub seed: Option<u64>,
}

impl StreamConfig {
    /// Parse configuration values for a source.
    pub fn parse(source: StreamSource, args: &[Value]) -> Result<StreamConfig, Exception> {
        let mut config = StreamConfig {
            min: 0.0,
            max: 1.0,
            ..StreamConfig::default()
        };
        match source {
            StreamSource::Time => {
                for arg in args {
                    match arg {
                        Value::Number(n) if n.magnitude > 0.0 => {
                            config.interval = Some(n.magnitude);
                        }
                        other => {
                            return Err(type_mismatch("tick interval", other.kind_label()));
                        }
                    }
                }
            }
            StreamSource::Key => {
                for arg in args {
                    match arg {
                        Value::Text(key) => config.key = Some((**key).clone()),
                        Value::Bool(down) => {
                            config.edge = if *down { Edge::Down } else { Edge::Up };
                        }
                        other => {
                            return Err(type_mismatch("key filter", other.kind_label()));
                        }
                    }
                }
            }
            StreamSource::Button => {
                for arg in args {
                    match arg {
                        Value::Bool(down) => {
                            config.edge = if *down { Edge::Down } else { Edge::Up };
                        }
                        other => {
                            return Err(type_mismatch("edge direction", other.kind_label()));
                        }
                    }
                }
            }
            StreamSource::Random => {
                let mut numbers = args.iter().filter_map(|a| match a {
                    Value::Number(n) => Some(n.magnitude),
                    _ => None,
                });
                if args.iter().any(|a| !matches!(a, Value::Number(_))) {
                    return Err(type_mismatch("number", "non-number configuration"));
                }
                if let Some(min) = numbers.next() {
                    config.min = min;
                }
                if let Some(max) = numbers.next() {
                    config.max = max;
                }
                if let Some(seed) = numbers.next() {
                    config.seed = Some(seed as u64);
                }
                if config.min > config.max {
                    return Err(malformed_container("random range is inverted"));
                }
            }
            StreamSource::Pointer | StreamSource::Mic | StreamSource::Motion => {
                if !args.is_empty() {
                    return Err(malformed_container(format!(
                        "{} takes no configuration",
                        source.label()
                    )));
                }
            }
        }
        Ok(config)
    }
}

/// What a stream was created for.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum StreamOrigin {
    /// Program-level external input.
    Input(StreamSource),
    /// A reaction expression's evolving value.
    Reaction,
}

/// One stream: identity, configuration, and the ordered history of emitted
/// values (the last is the current value).
pub struct Stream {
    id: StreamId,
    /// Defining syntax node; the stream's identity across passes.
    node: NodeId,
    origin: StreamOrigin,
    config: StreamConfig,
    values: Vec<Value>,
    active: bool,
    rng: Option<StdRng>,
}

impl Stream {
    pub fn id(&self) -> StreamId {
        self.id
    }

    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn origin(&self) -> StreamOrigin {
        self.origin
    }

    pub fn config(&self) -> &StreamConfig {
        &self.config
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Whether changes to this stream request a new evaluation pass.
    pub fn is_reactive(&self) -> bool {
        match self.origin {
            StreamOrigin::Input(source) => source.is_reactive(),
            // Reaction streams change during passes; they never start one.
            StreamOrigin::Reaction => false,
        }
    }

    /// Ordered history of emitted values.
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Current (most recently emitted) value.
    pub fn current(&self) -> Value {
        self.values.last().cloned().unwrap_or(Value::None)
    }

    /// Append a newly emitted value.
    pub fn emit(&mut self, value: Value) {
        tracing::trace!(stream = self.id.raw(), %value, "emit");
        self.values.push(value);
    }

    pub fn stop(&mut self) {
        self.active = false;
    }
}

/// Arena of streams owned by one evaluator.
#[derive(Default)]
pub struct StreamRegistry {
    streams: Vec<Stream>,
    /// Lifetime creation counter (reaction-cache stability is observable
    /// here: N passes over one reaction node create one stream).
    created: u64,
}

impl StreamRegistry {
    pub fn new() -> Self {
        StreamRegistry::default()
    }

    fn next_id(&self) -> StreamId {
        StreamId::new(u32::try_from(self.streams.len()).unwrap_or(u32::MAX))
    }

    /// Create a program-level input stream seeded with its source's initial
    /// value.
    pub fn create_input(
        &mut self,
        node: NodeId,
        source: StreamSource,
        config: StreamConfig,
    ) -> StreamId {
        let id = self.next_id();
        let mut rng = match (source, config.seed) {
            (StreamSource::Random, Some(seed)) => Some(StdRng::seed_from_u64(seed)),
            (StreamSource::Random, None) => Some(StdRng::from_entropy()),
            _ => None,
        };
        let initial = match source {
            StreamSource::Time => Value::number_with_unit(0.0, "ms"),
            StreamSource::Key => Value::text(""),
            StreamSource::Pointer => {
                Value::list(vec![Value::number(0.0), Value::number(0.0)])
            }
            StreamSource::Button => Value::bool(false),
            StreamSource::Mic | StreamSource::Motion => Value::number(0.0),
            StreamSource::Random => {
                let range = config.min..=config.max;
                rng.as_mut()
                    .map_or(Value::None, |r| Value::number(r.gen_range(range)))
            }
        };
        tracing::debug!(stream = id.raw(), source = source.label(), "create input stream");
        self.streams.push(Stream {
            id,
            node,
            origin: StreamOrigin::Input(source),
            config,
            values: vec![initial],
            active: true,
            rng,
        });
        self.created += 1;
        id
    }

    /// Create a reaction stream seeded with its initial value.
    pub fn create_reaction(&mut self, node: NodeId, initial: Value) -> StreamId {
        let id = self.next_id();
        tracing::debug!(stream = id.raw(), node = node.raw(), "create reaction stream");
        self.streams.push(Stream {
            id,
            node,
            origin: StreamOrigin::Reaction,
            config: StreamConfig::default(),
            values: vec![initial],
            active: true,
            rng: None,
        });
        self.created += 1;
        id
    }

    pub fn get(&self, id: StreamId) -> Option<&Stream> {
        self.streams.get(id.index())
    }

    pub fn get_mut(&mut self, id: StreamId) -> Option<&mut Stream> {
        self.streams.get_mut(id.index())
    }

    /// Read a stream's current value.
    ///
    /// The random source regenerates on every read (and records the drawn
    /// value in its history); every other stream returns its last emitted
    /// value.
    pub fn read_current(&mut self, id: StreamId) -> Value {
        let Some(stream) = self.streams.get_mut(id.index()) else {
            return Value::None;
        };
        if let Some(rng) = stream.rng.as_mut() {
            let range = stream.config.min..=stream.config.max;
            let drawn = Value::number(rng.gen_range(range));
            stream.values.push(drawn.clone());
            return drawn;
        }
        stream.current()
    }

    /// Streams created over the registry's lifetime.
    pub fn created(&self) -> u64 {
        self.created
    }

    pub fn len(&self) -> usize {
        self.streams.len()
    }

    pub fn is_empty(&self) -> bool {
        self.streams.is_empty()
    }

    /// Stop every stream. Idempotent.
    pub fn stop_all(&mut self) {
        for stream in &mut self.streams {
            stream.stop();
        }
    }
}

#[cfg(test)]
mod tests;

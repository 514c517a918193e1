use std::collections::BTreeMap;

use super::ids::ScenarioId;
use super::port::{Direction, Port};

/// Per-scenario execution time and memory footprint of an actor when bound
/// to a particular processor type. The resource-allocation layer (outside
/// the core) reads these through read-only accessors.
#[derive(Debug, Clone, Default)]
pub struct ProcessorRequirements {
    exec_time: BTreeMap<ScenarioId, u32>,
    memory: BTreeMap<ScenarioId, u64>,
}

impl ProcessorRequirements {
    pub fn set_exec_time(&mut self, scenario: ScenarioId, time: u32) {
        self.exec_time.insert(scenario, time);
    }

    pub fn exec_time(&self, scenario: ScenarioId) -> u32 {
        self.exec_time.get(&scenario).copied().unwrap_or(0)
    }

    pub fn set_memory(&mut self, scenario: ScenarioId, bytes: u64) {
        self.memory.insert(scenario, bytes);
    }

    pub fn memory(&self, scenario: ScenarioId) -> u64 {
        self.memory.get(&scenario).copied().unwrap_or(0)
    }
}

/// An actor: a firing node in a scenario graph.
#[derive(Debug, Clone)]
pub struct Actor {
    name: String,
    actor_type: String,
    ports: Vec<Port>,
    processors: BTreeMap<String, ProcessorRequirements>,
    default_processor: Option<String>,
    /// Per-scenario repetition count, only meaningful for weakly consistent
    /// graphs; strongly consistent graphs derive it from the repetition
    /// vector instead.
    repetitions: BTreeMap<ScenarioId, u32>,
}

impl Actor {
    pub fn new(name: impl Into<String>, actor_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            actor_type: actor_type.into(),
            ports: Vec::new(),
            processors: BTreeMap::new(),
            default_processor: None,
            repetitions: BTreeMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn actor_type(&self) -> &str {
        &self.actor_type
    }

    pub fn ports(&self) -> &[Port] {
        &self.ports
    }

    pub fn ports_mut(&mut self) -> &mut [Port] {
        &mut self.ports
    }

    /// Appends a port, returning its slot index within this actor.
    pub fn add_port(&mut self, port: Port) -> u16 {
        let slot = self.ports.len() as u16;
        self.ports.push(port);
        slot
    }

    pub fn ports_with_direction(&self, direction: Direction) -> impl Iterator<Item = (u16, &Port)> {
        self.ports
            .iter()
            .enumerate()
            .filter(move |(_, p)| p.direction() == direction)
            .map(|(i, p)| (i as u16, p))
    }

    pub fn processor(&self, processor_type: &str) -> Option<&ProcessorRequirements> {
        self.processors.get(processor_type)
    }

    pub fn processor_mut(&mut self, processor_type: impl Into<String>) -> &mut ProcessorRequirements {
        self.processors.entry(processor_type.into()).or_default()
    }

    pub fn set_default_processor_type(&mut self, processor_type: impl Into<String>) {
        self.default_processor = Some(processor_type.into());
    }

    pub fn default_processor_type(&self) -> Option<&str> {
        self.default_processor.as_deref()
    }

    /// Execution time on the default processor type for `scenario`.
    pub fn exec_time(&self, scenario: ScenarioId) -> u32 {
        self.default_processor
            .as_deref()
            .and_then(|ty| self.processors.get(ty))
            .map(|p| p.exec_time(scenario))
            .unwrap_or(0)
    }

    pub fn set_repetitions(&mut self, scenario: ScenarioId, count: u32) {
        self.repetitions.insert(scenario, count);
    }

    pub fn repetitions(&self, scenario: ScenarioId) -> Option<u32> {
        self.repetitions.get(&scenario).copied()
    }
}

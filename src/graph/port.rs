use std::collections::BTreeMap;

use super::ids::ScenarioId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    In,
    Out,
}

/// A port on an actor. Carries a per-scenario firing rate; unset scenarios
/// default to rate 0 (treated as "no contribution" by the firing rule).
#[derive(Debug, Clone)]
pub struct Port {
    name: String,
    direction: Direction,
    rates: BTreeMap<ScenarioId, u32>,
}

impl Port {
    pub fn new(name: impl Into<String>, direction: Direction) -> Self {
        Self {
            name: name.into(),
            direction,
            rates: BTreeMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn set_rate(&mut self, scenario: ScenarioId, rate: u32) {
        self.rates.insert(scenario, rate);
    }

    pub fn rate(&self, scenario: ScenarioId) -> u32 {
        self.rates.get(&scenario).copied().unwrap_or(0)
    }

    /// The full per-scenario rate map, for callers (e.g. the strong-bounding
    /// rewrite) that need to duplicate a port's rates onto another port.
    pub fn rates(&self) -> &BTreeMap<ScenarioId, u32> {
        &self.rates
    }
}

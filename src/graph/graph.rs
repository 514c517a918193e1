use crate::error::{Error, Result};

use super::fsm::Fsm;
use super::ids::{ScenarioGraphId, ScenarioId};
use super::scenario::Scenario;
use super::scenario_graph::ScenarioGraph;

/// The top-level container: a named aggregate of scenario graphs,
/// scenarios, an FSM, a default scenario, and an (optional) throughput
/// constraint. Owns its scenarios and scenario graphs and FSM exclusively;
/// a `Scenario` holds a non-owning reference (a [`ScenarioGraphId`]) to its
/// scenario graph, and an FSM state holds a non-owning reference (a
/// [`ScenarioId`]) to its scenario.
///
/// Because every cross-reference here is a dense index rather than a
/// pointer, `#[derive(Clone)]` already satisfies the cloning contract:
/// cloning the vectors never invalidates the indices into them.
#[derive(Debug, Clone)]
pub struct Graph {
    name: String,
    scenario_graphs: Vec<ScenarioGraph>,
    scenarios: Vec<Scenario>,
    fsm: Fsm,
    default_scenario: ScenarioId,
    throughput_constraint: Option<f64>,
}

impl Graph {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            scenario_graphs: Vec::new(),
            scenarios: Vec::new(),
            fsm: Fsm::new(),
            default_scenario: ScenarioId(0),
            throughput_constraint: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn add_scenario_graph(&mut self, graph: ScenarioGraph) -> ScenarioGraphId {
        let id = ScenarioGraphId(self.scenario_graphs.len());
        self.scenario_graphs.push(graph);
        id
    }

    /// Adds a scenario. The first scenario added becomes the default
    /// scenario's placeholder until [`Self::set_default_scenario`] is
    /// called explicitly; the default scenario is never referenced by the
    /// FSM.
    pub fn add_scenario(&mut self, scenario: Scenario) -> ScenarioId {
        let id = ScenarioId(self.scenarios.len());
        self.scenarios.push(scenario);
        id
    }

    pub fn set_default_scenario(&mut self, scenario: ScenarioId) {
        self.default_scenario = scenario;
    }

    pub fn default_scenario(&self) -> ScenarioId {
        self.default_scenario
    }

    pub fn set_throughput_constraint(&mut self, constraint: f64) {
        self.throughput_constraint = Some(constraint);
    }

    pub fn throughput_constraint(&self) -> Option<f64> {
        self.throughput_constraint
    }

    pub fn scenario_graphs(&self) -> &[ScenarioGraph] {
        &self.scenario_graphs
    }

    pub fn scenario_graphs_mut(&mut self) -> &mut [ScenarioGraph] {
        &mut self.scenario_graphs
    }

    pub fn scenarios(&self) -> &[Scenario] {
        &self.scenarios
    }

    pub fn scenario(&self, id: ScenarioId) -> &Scenario {
        &self.scenarios[id.index()]
    }

    pub fn scenario_graph(&self, id: ScenarioGraphId) -> &ScenarioGraph {
        &self.scenario_graphs[id.index()]
    }

    /// The scenario graph backing `scenario`.
    pub fn graph_of(&self, scenario: ScenarioId) -> &ScenarioGraph {
        self.scenario_graph(self.scenario(scenario).scenario_graph())
    }

    pub fn fsm(&self) -> &Fsm {
        &self.fsm
    }

    pub fn fsm_mut(&mut self) -> &mut Fsm {
        &mut self.fsm
    }

    pub fn scenario_by_name(&self, name: &str) -> Result<ScenarioId> {
        self.scenarios
            .iter()
            .position(|s| s.name() == name)
            .map(ScenarioId)
            .ok_or_else(|| Error::NotFound {
                kind: "scenario",
                name: name.to_string(),
            })
    }

    /// Validates structural invariants of every scenario graph.
    pub fn validate(&self) -> Result<()> {
        for sg in &self.scenario_graphs {
            sg.validate()?;
        }
        Ok(())
    }
}

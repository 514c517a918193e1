use super::ids::ScenarioGraphId;

/// A named reference to a scenario graph, plus the "useful progress"
/// reward attributed to one execution of this scenario.
#[derive(Debug, Clone)]
pub struct Scenario {
    name: String,
    scenario_graph: ScenarioGraphId,
    reward: f64,
}

impl Scenario {
    pub fn new(name: impl Into<String>, scenario_graph: ScenarioGraphId) -> Self {
        Self {
            name: name.into(),
            scenario_graph,
            reward: 1.0,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn scenario_graph(&self) -> ScenarioGraphId {
        self.scenario_graph
    }

    pub fn reward(&self) -> f64 {
        self.reward
    }

    pub fn set_reward(&mut self, reward: f64) {
        debug_assert!(reward >= 0.0, "scenario reward must be non-negative");
        self.reward = reward;
    }
}

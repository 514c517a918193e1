use super::ids::{FsmStateId, ScenarioId};

#[derive(Debug, Clone)]
pub struct FsmState {
    scenario: ScenarioId,
}

impl FsmState {
    pub fn new(scenario: ScenarioId) -> Self {
        Self { scenario }
    }

    pub fn scenario(&self) -> ScenarioId {
        self.scenario
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: FsmStateId,
    pub to: FsmStateId,
}

/// The scenario finite state machine. Executing it from the initial state
/// yields an infinite sequence of scenarios; the initial state's own
/// scenario is never emitted — the first emitted scenario is the one
/// labelling the destination of the first taken transition.
#[derive(Debug, Clone, Default)]
pub struct Fsm {
    states: Vec<FsmState>,
    transitions: Vec<Transition>,
    initial: FsmStateId,
}

impl Fsm {
    pub fn new() -> Self {
        Self {
            states: Vec::new(),
            transitions: Vec::new(),
            initial: FsmStateId(0),
        }
    }

    pub fn add_state(&mut self, scenario: ScenarioId) -> FsmStateId {
        let id = FsmStateId(self.states.len());
        self.states.push(FsmState::new(scenario));
        id
    }

    pub fn add_transition(&mut self, from: FsmStateId, to: FsmStateId) {
        self.transitions.push(Transition { from, to });
    }

    pub fn set_initial_state(&mut self, state: FsmStateId) {
        self.initial = state;
    }

    pub fn initial_state(&self) -> FsmStateId {
        self.initial
    }

    pub fn states(&self) -> &[FsmState] {
        &self.states
    }

    pub fn state(&self, id: FsmStateId) -> &FsmState {
        &self.states[id.index()]
    }

    pub fn transitions(&self) -> &[Transition] {
        &self.transitions
    }

    /// Transitions leaving `state`, in insertion order.
    pub fn outgoing(&self, state: FsmStateId) -> impl Iterator<Item = &Transition> {
        self.transitions.iter().filter(move |t| t.from == state)
    }
}

/// Builds the infinite periodic FSM obtained by looping forever through
/// `sequence`: one state per entry, a transition from each to the next,
/// and the last back to the first. Used to sanity-check a reported
/// critical scenario sequence: reinserting it this
/// way and re-running the throughput algorithm should reproduce the
/// original throughput.
pub fn from_periodic_scenarios(sequence: &[ScenarioId]) -> Fsm {
    let mut fsm = Fsm::new();
    let states: Vec<FsmStateId> = sequence.iter().map(|&s| fsm.add_state(s)).collect();
    for i in 0..states.len() {
        fsm.add_transition(states[i], states[(i + 1) % states.len()]);
    }
    if let Some(&first) = states.first() {
        fsm.set_initial_state(first);
    }
    fsm
}

//! Numeric (timestamped-token) state exploration: simulate firings on
//! concrete max-plus timestamps, normalize after each iteration, and
//! detect recurrence to derive throughput without ever building an
//! explicit matrix.

use std::collections::{HashMap, VecDeque};

use crate::cancel::CancellationToken;
use crate::error::{Error, Result};
use crate::graph::{ActorId, Direction, PortId, ScenarioGraph, ScenarioId};
use crate::maxplus::MPTime;
use crate::repetition;

use super::digest_timestamps;

/// Direction of firing: `Forward` consumes from input ports and produces to
/// output ports (the ordinary semantics); `Backward` is the symmetric
/// algorithm used as a second opinion on throughput, swapping
/// the roles of input and output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Orientation {
    Forward,
    Backward,
}

impl Orientation {
    fn consume_side(self) -> Direction {
        match self {
            Orientation::Forward => Direction::In,
            Orientation::Backward => Direction::Out,
        }
    }

    fn produce_side(self) -> Direction {
        match self {
            Orientation::Forward => Direction::Out,
            Orientation::Backward => Direction::In,
        }
    }
}

/// Result of a single-scenario numeric exploration: throughput, the
/// max-plus eigenvalue (equal to `1/throughput` for a single scenario),
/// and the eigenvector recovered by the smoothing iteration.
#[derive(Debug, Clone, PartialEq)]
pub struct StateSpaceResult {
    pub throughput: f64,
    pub eigenvalue: MPTime,
    pub eigenvector: Vec<MPTime>,
}

/// Forward numeric exploration: throughput of `g` in scenario
/// `s` via timestamped-token simulation to a recurrent normalized state.
pub fn explore_forward(
    g: &ScenarioGraph,
    s: ScenarioId,
    scenario_name: &str,
    cancel: &CancellationToken,
) -> Result<StateSpaceResult> {
    explore(g, s, scenario_name, Orientation::Forward, cancel)
}

/// Backward numeric exploration: symmetric to [`explore_forward`],
/// consuming from output ports and producing toward input ports. Agrees
/// with the forward throughput for any consistent single-scenario graph.
pub fn explore_backward(
    g: &ScenarioGraph,
    s: ScenarioId,
    scenario_name: &str,
    cancel: &CancellationToken,
) -> Result<StateSpaceResult> {
    explore(g, s, scenario_name, Orientation::Backward, cancel)
}

/// Simulation state: one FIFO of timestamps per channel, plus the
/// accumulated normalization offset and iteration counter.
struct State {
    fifos: Vec<VecDeque<MPTime>>,
    timestamp: f64,
    count: u64,
}

impl State {
    /// Canonical serialization for recurrence-detection hashing: channel
    /// iteration order, then FIFO order, then the timestamp's bit pattern.
    fn normalized_snapshot(&self) -> Vec<u64> {
        self.fifos.iter().flatten().map(|t| t.to_bits()).collect()
    }
}

fn explore(
    g: &ScenarioGraph,
    s: ScenarioId,
    scenario_name: &str,
    orientation: Orientation,
    cancel: &CancellationToken,
) -> Result<StateSpaceResult> {
    let repetitions = repetition::try_repetition_vector(g, s, scenario_name)?;

    let mut state = State {
        fifos: g.channels().iter().map(|c| vec![0.0; c.initial_tokens() as usize].into()).collect(),
        timestamp: 0.0,
        count: 0,
    };

    let mut schedule: Option<Vec<ActorId>> = None;
    let mut visited: HashMap<Vec<u64>, (u64, f64)> = HashMap::new();
    visited.insert(state.normalized_snapshot(), (state.count, state.timestamp));

    loop {
        cancel.check()?;
        match &schedule {
            Some(order) => replay(g, s, orientation, order, &mut state.fifos),
            None => {
                let order = run_iteration(g, s, orientation, &repetitions, &mut state.fifos, scenario_name)?;
                schedule = Some(order);
            }
        };

        let m = state
            .fifos
            .iter()
            .flatten()
            .copied()
            .fold(MPTime::NEG_INFINITY, f64::max);
        if m.is_finite() {
            for fifo in state.fifos.iter_mut() {
                for t in fifo.iter_mut() {
                    *t -= m;
                }
            }
            state.timestamp += m;
        }
        state.count += 1;

        let snapshot = state.normalized_snapshot();
        if let Some(&(y_count, y_timestamp)) = visited.get(&snapshot) {
            let throughput = (state.count - y_count) as f64 / (state.timestamp - y_timestamp);
            log::debug!(
                "recurrent state found for scenario '{scenario_name}' after {} iterations (throughput {throughput})",
                state.count
            );
            let eigen = eigenvector(g, s, orientation, &repetitions, scenario_name, cancel)?;
            return Ok(StateSpaceResult {
                throughput,
                eigenvalue: eigen.0,
                eigenvector: eigen.1,
            });
        }
        visited.insert(snapshot, (state.count, state.timestamp));
    }
}

/// Runs one full iteration (every actor fired `r[a]` times), recording the
/// fired-actor sequence for later replay.
fn run_iteration(
    g: &ScenarioGraph,
    s: ScenarioId,
    orientation: Orientation,
    repetitions: &[u32],
    fifos: &mut [VecDeque<MPTime>],
    scenario_name: &str,
) -> Result<Vec<ActorId>> {
    let mut remaining = repetitions.to_vec();
    let total: u32 = remaining.iter().sum();
    let mut order = Vec::with_capacity(total as usize);

    for _ in 0..total {
        let actor = find_fireable(g, s, orientation, &remaining, fifos).ok_or_else(|| Error::Deadlock {
            scenario: scenario_name.to_string(),
            state_digest: digest_timestamps(fifos.iter().flatten()),
        })?;
        fire(g, s, orientation, actor, fifos);
        remaining[actor.index()] -= 1;
        order.push(actor);
    }
    Ok(order)
}

/// Replays a previously recorded firing order verbatim.
fn replay(g: &ScenarioGraph, s: ScenarioId, orientation: Orientation, order: &[ActorId], fifos: &mut [VecDeque<MPTime>]) {
    for &actor in order {
        fire(g, s, orientation, actor, fifos);
    }
}

fn find_fireable(
    g: &ScenarioGraph,
    s: ScenarioId,
    orientation: Orientation,
    remaining: &[u32],
    fifos: &[VecDeque<MPTime>],
) -> Option<ActorId> {
    'actors: for (i, count) in remaining.iter().enumerate() {
        if *count == 0 {
            continue;
        }
        let a = ActorId(i);
        for (slot, port) in g.actor(a).ports_with_direction(orientation.consume_side()) {
            let rate = port.rate(s) as usize;
            if rate == 0 {
                continue;
            }
            let port_id = PortId { actor: a, slot };
            let channel = g.channel_of(port_id).expect("connected port");
            // Same physical FIFO either way; backward firing just pops from
            // the opposite end (see `fire`), so availability is still its
            // current length.
            if fifos[channel.index()].len() < rate {
                continue 'actors;
            }
        }
        return Some(a);
    }
    None
}

fn fire(g: &ScenarioGraph, s: ScenarioId, orientation: Orientation, actor: ActorId, fifos: &mut [VecDeque<MPTime>]) {
    let mut consumed = Vec::new();
    for (slot, port) in g.actor(actor).ports_with_direction(orientation.consume_side()) {
        let rate = port.rate(s) as usize;
        if rate == 0 {
            continue;
        }
        let port_id = PortId { actor, slot };
        let channel = g.channel_of(port_id).expect("connected port");
        for _ in 0..rate {
            let t = match orientation {
                Orientation::Forward => fifos[channel.index()].pop_front().expect("fireable precondition"),
                Orientation::Backward => fifos[channel.index()].pop_back().expect("fireable precondition"),
            };
            consumed.push(t);
        }
    }
    let fire_time = consumed.into_iter().fold(MPTime::NEG_INFINITY, f64::max);
    let exec_time = g.actor(actor).exec_time(s) as f64;
    let produced = fire_time + exec_time;

    for (slot, port) in g.actor(actor).ports_with_direction(orientation.produce_side()) {
        let rate = port.rate(s) as usize;
        if rate == 0 {
            continue;
        }
        let port_id = PortId { actor, slot };
        let channel = g.channel_of(port_id).expect("connected port");
        for _ in 0..rate {
            match orientation {
                Orientation::Forward => fifos[channel.index()].push_back(produced),
                Orientation::Backward => fifos[channel.index()].push_front(produced),
            }
        }
    }
}

/// Iterates the smoothing recursion (componentwise mean against the
/// previous normalized state) until consecutive states agree, yielding the
/// max-plus eigenvector and eigenvalue.
fn eigenvector(
    g: &ScenarioGraph,
    s: ScenarioId,
    orientation: Orientation,
    repetitions: &[u32],
    scenario_name: &str,
    cancel: &CancellationToken,
) -> Result<(MPTime, Vec<MPTime>)> {
    let mut fifos: Vec<VecDeque<MPTime>> =
        g.channels().iter().map(|c| vec![0.0; c.initial_tokens() as usize].into()).collect();
    let mut previous: Vec<MPTime> = fifos.iter().flatten().copied().collect();
    let mut eigenvalue = 0.0;

    const MAX_ITERATIONS: usize = 10_000;
    for _ in 0..MAX_ITERATIONS {
        cancel.check()?;
        run_iteration(g, s, orientation, repetitions, &mut fifos, scenario_name)?;
        let raw: Vec<MPTime> = fifos.iter().flatten().copied().collect();
        let m = raw.iter().copied().fold(MPTime::NEG_INFINITY, f64::max);
        let normalized: Vec<MPTime> = raw.iter().map(|t| t - m).collect();
        eigenvalue = m;

        let smoothed: Vec<MPTime> = normalized
            .iter()
            .zip(previous.iter())
            .map(|(a, b)| (a + b) / 2.0)
            .collect();

        let mut idx = 0;
        for fifo in fifos.iter_mut() {
            for slot in fifo.iter_mut() {
                *slot = smoothed[idx];
                idx += 1;
            }
        }

        if vectors_close(&smoothed, &previous) {
            return Ok((eigenvalue, smoothed));
        }
        previous = smoothed;
    }
    Ok((eigenvalue, previous))
}

fn vectors_close(a: &[MPTime], b: &[MPTime]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| (x - y).abs() < 1e-9)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{Actor, Channel, Direction as Dir, Port, ScenarioGraph};

    /// Self-loop actor A, one initial token, rates 1/1, exec time 3.
    /// Expected: throughput = 1/3, eigenvalue = 3, eigenvector = [0].
    fn self_loop_graph() -> (ScenarioGraph, ScenarioId) {
        let mut sg = ScenarioGraph::new("s3");
        let s = ScenarioId(0);
        let mut a = Actor::new("A", "t");
        a.add_port(Port::new("out", Dir::Out));
        a.add_port(Port::new("in", Dir::In));
        let a_id = sg.add_actor(a);
        sg.actor_mut(a_id).ports_mut()[0].set_rate(s, 1);
        sg.actor_mut(a_id).ports_mut()[1].set_rate(s, 1);
        sg.actor_mut(a_id).processor_mut("cpu").set_exec_time(s, 3);
        sg.actor_mut(a_id).set_default_processor_type("cpu");
        let src = PortId { actor: a_id, slot: 0 };
        let dst = PortId { actor: a_id, slot: 1 };
        let mut c = Channel::new("self", src, dst);
        c.set_initial_tokens(1);
        c.add_persistent_initial_name("tok").unwrap();
        sg.add_channel(c);
        (sg, s)
    }

    #[test]
    fn self_loop_single_scenario_throughput() {
        let (sg, s) = self_loop_graph();
        let cancel = CancellationToken::new();
        let result = explore_forward(&sg, s, "s3", &cancel).unwrap();
        assert!((result.throughput - 1.0 / 3.0).abs() < 1e-9);
        assert_eq!(result.eigenvalue, 3.0);
        assert_eq!(result.eigenvector, vec![0.0]);
    }

    #[test]
    fn backward_and_forward_agree() {
        let (sg, s) = self_loop_graph();
        let cancel = CancellationToken::new();
        let forward = explore_forward(&sg, s, "s3", &cancel).unwrap();
        let backward = explore_backward(&sg, s, "s3", &cancel).unwrap();
        assert!((forward.throughput - backward.throughput).abs() < 1e-9);
    }

    #[test]
    fn cancellation_is_observed() {
        let (sg, s) = self_loop_graph();
        let cancel = CancellationToken::new();
        cancel.cancel();
        assert_eq!(explore_forward(&sg, s, "s3", &cancel), Err(Error::Cancelled));
    }
}

//! Symbolic state-space exploration via a token-FIFO simulation that
//! carries full basis vectors instead of scalars, so a single pass yields
//! the whole max-plus matrix.

use std::collections::VecDeque;

use crate::error::{Error, Result};
use crate::graph::{ActorId, Direction, PortId, ScenarioGraph, ScenarioId};
use crate::maxplus::{MPMatrix, MPVector};
use crate::repetition;

use super::digest_timestamps;

/// Computes the max-plus matrix `M` of `g` under scenario `s`: for any
/// vector `v` of initial-token timestamps, `M ⊗ v` gives the timestamps of
/// the persistent tokens remaining after one iteration of the scenario's
/// repetition vector.
///
/// `scenario_name` is used only to label errors.
pub fn explore_symbolic(g: &ScenarioGraph, s: ScenarioId, scenario_name: &str) -> Result<MPMatrix> {
    let repetitions = repetition::try_repetition_vector(g, s, scenario_name)?;
    let n_initial = g.total_initial_tokens();

    let mut fifos: Vec<VecDeque<MPVector>> = g.channels().iter().map(|_| VecDeque::new()).collect();
    let mut base = 0usize;
    for (ci, channel) in g.channels().iter().enumerate() {
        for k in 0..channel.initial_tokens() as usize {
            fifos[ci].push_back(MPVector::unit(n_initial, base + k));
        }
        base += channel.initial_tokens() as usize;
    }

    let mut remaining = repetitions;
    let total_fires: u32 = remaining.iter().sum();
    let mut fired = 0u32;

    while fired < total_fires {
        let actor = find_fireable(g, s, &remaining, &fifos).ok_or_else(|| Error::Deadlock {
            scenario: scenario_name.to_string(),
            state_digest: digest_fifos(&fifos),
        })?;
        fire(g, s, actor, &mut fifos, n_initial);
        remaining[actor.index()] -= 1;
        fired += 1;
    }

    // Weakly-consistent scenario graphs declare a nonzero total final-token
    // count; strongly-consistent ones don't, because "final = initial" is
    // implied rather than modelled.
    let is_weak = g.total_final_tokens() > 0;
    let total_rows = if is_weak { g.total_final_tokens() } else { n_initial };

    let mut raw = MPMatrix::bottom(total_rows, n_initial);
    let mut row_base = 0usize;
    for (ci, channel) in g.channels().iter().enumerate() {
        let expected = if is_weak {
            channel.final_tokens() as usize
        } else {
            channel.initial_tokens() as usize
        };
        debug_assert_eq!(
            fifos[ci].len(),
            expected,
            "channel '{}' ended with {} tokens, expected {}",
            channel.name(),
            fifos[ci].len(),
            expected
        );
        for (k, token) in fifos[ci].iter().enumerate() {
            for col in 0..n_initial {
                raw.set(row_base + k, col, token.get(col));
            }
        }
        row_base += expected;
    }

    let final_order = if is_weak {
        g.persistent_final_order()
    } else {
        g.persistent_initial_order()
    };
    let initial_order = g.persistent_initial_order();
    let matrix = raw.submatrix(&final_order, &initial_order);
    log::debug!(
        "extracted {}x{} max-plus matrix for scenario '{scenario_name}'",
        matrix.rows(),
        matrix.cols()
    );
    Ok(matrix)
}

/// Scans actors in insertion order and returns the first one whose input
/// channels all hold at least `rate` tokens, if any.
fn find_fireable(
    g: &ScenarioGraph,
    s: ScenarioId,
    remaining: &[u32],
    fifos: &[VecDeque<MPVector>],
) -> Option<ActorId> {
    'actors: for (i, count) in remaining.iter().enumerate() {
        if *count == 0 {
            continue;
        }
        let a = ActorId(i);
        for (slot, port) in g.actor(a).ports_with_direction(Direction::In) {
            let rate = port.rate(s) as usize;
            if rate == 0 {
                continue;
            }
            let port_id = PortId { actor: a, slot };
            let channel = g.channel_of(port_id).expect("connected input port");
            if fifos[channel.index()].len() < rate {
                continue 'actors;
            }
        }
        return Some(a);
    }
    None
}

/// Fires `actor` once under `scenario`: consumes `rate` symbolic tokens per
/// input port, combines them via pointwise max, shifts by the actor's
/// execution time, and pushes the result `rate` times per output port.
fn fire(g: &ScenarioGraph, s: ScenarioId, actor: ActorId, fifos: &mut [VecDeque<MPVector>], n: usize) {
    let mut consumed = Vec::new();
    for (slot, port) in g.actor(actor).ports_with_direction(Direction::In) {
        let rate = port.rate(s) as usize;
        if rate == 0 {
            continue;
        }
        let port_id = PortId { actor, slot };
        let channel = g.channel_of(port_id).expect("connected input port");
        for _ in 0..rate {
            consumed.push(fifos[channel.index()].pop_front().expect("fireable precondition"));
        }
    }
    let fire_vector = MPVector::maximum(consumed.iter(), n);
    let exec_time = g.actor(actor).exec_time(s) as f64;
    let produced = fire_vector.shift(exec_time);

    for (slot, port) in g.actor(actor).ports_with_direction(Direction::Out) {
        let rate = port.rate(s) as usize;
        if rate == 0 {
            continue;
        }
        let port_id = PortId { actor, slot };
        let channel = g.channel_of(port_id).expect("connected output port");
        for _ in 0..rate {
            fifos[channel.index()].push_back(produced.clone());
        }
    }
}

fn digest_fifos(fifos: &[VecDeque<MPVector>]) -> u64 {
    digest_timestamps(fifos.iter().flat_map(|f| f.iter()).flat_map(|t| t.as_slice().iter()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{Actor, Channel, Port, ScenarioGraph};

    /// Self-loop actor A, one initial token, rates 1/1, exec time 3.
    /// Expected matrix: the 1x1 matrix [3.0].
    fn self_loop_graph() -> (ScenarioGraph, ScenarioId) {
        let mut sg = ScenarioGraph::new("s3");
        let s = ScenarioId(0);
        let mut a = Actor::new("A", "t");
        a.add_port(Port::new("out", Direction::Out));
        a.add_port(Port::new("in", Direction::In));
        let a_id = sg.add_actor(a);
        sg.actor_mut(a_id).ports_mut()[0].set_rate(s, 1);
        sg.actor_mut(a_id).ports_mut()[1].set_rate(s, 1);
        sg.actor_mut(a_id)
            .processor_mut("cpu")
            .set_exec_time(s, 3);
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
    fn self_loop_matrix_is_single_entry_exec_time() {
        let (sg, s) = self_loop_graph();
        let m = explore_symbolic(&sg, s, "s3").unwrap();
        assert_eq!(m.shape(), (1, 1));
        assert_eq!(m.get(0, 0), 3.0);
    }

    #[test]
    fn inconsistent_scenario_reports_inconsistent_error() {
        let mut sg = ScenarioGraph::new("bad");
        let s = ScenarioId(0);
        let mut a = Actor::new("A", "t");
        a.add_port(Port::new("out", Direction::Out));
        let a_id = sg.add_actor(a);
        let mut b = Actor::new("B", "t");
        b.add_port(Port::new("in", Direction::In));
        let b_id = sg.add_actor(b);
        sg.actor_mut(a_id).ports_mut()[0].set_rate(s, 2);
        sg.actor_mut(b_id).ports_mut()[0].set_rate(s, 0);
        let src = PortId { actor: a_id, slot: 0 };
        let dst = PortId { actor: b_id, slot: 0 };
        sg.add_channel(Channel::new("ab", src, dst));

        assert_eq!(
            explore_symbolic(&sg, s, "bad"),
            Err(Error::Inconsistent {
                scenario: "bad".to_string()
            })
        );
    }
}

//! Repetition-vector computation and consistency check via rational
//! fraction propagation over the actor-connection graph.

use crate::error::{Error, Result};
use crate::graph::{ActorId, PortId, ScenarioGraph, ScenarioId};
use crate::rational::Fraction;

/// Computes the repetition vector of `g` for scenario `s`: a strictly
/// positive integer vector with gcd 1 when the graph is rate-balanced, or
/// the all-zero vector when it is not.
pub fn compute_repetition_vector(g: &ScenarioGraph, s: ScenarioId) -> Vec<u32> {
    let n = g.actors().len();
    let mut fractions: Vec<Option<Fraction>> = vec![None; n];

    for i in 0..n {
        if fractions[i].is_none() {
            fractions[i] = Some(Fraction::new(1, 1));
            propagate(g, s, &mut fractions, ActorId(i));
        }
    }

    finalize(&fractions)
}

/// `true` iff `compute_repetition_vector` would return a non-zero vector.
pub fn is_consistent(g: &ScenarioGraph, s: ScenarioId) -> bool {
    compute_repetition_vector(g, s).first().copied().unwrap_or(0) != 0
}

/// Like [`compute_repetition_vector`] but surfaces inconsistency as
/// [`Error::Inconsistent`] instead of the zero-vector sentinel, for callers
/// that treat it as fatal.
pub fn try_repetition_vector(
    g: &ScenarioGraph,
    s: ScenarioId,
    scenario_name: &str,
) -> Result<Vec<u32>> {
    let r = compute_repetition_vector(g, s);
    if r.first().copied().unwrap_or(0) == 0 {
        log::debug!("scenario '{scenario_name}' is not rate-balanced");
        Err(Error::Inconsistent {
            scenario: scenario_name.to_string(),
        })
    } else {
        log::trace!("repetition vector for scenario '{scenario_name}': {r:?}");
        Ok(r)
    }
}

/// Recursively propagates the firing ratio from `a` to every actor reachable
/// over the undirected connection graph, marking the whole vector
/// inconsistent on the first conflicting re-derivation.
fn propagate(g: &ScenarioGraph, s: ScenarioId, fractions: &mut [Option<Fraction>], a: ActorId) {
    let fraction_a = match fractions[a.index()] {
        Some(f) if !f.is_inconsistent() => f,
        _ => return,
    };

    for slot in 0..g.actor(a).ports().len() {
        let port_id = PortId {
            actor: a,
            slot: slot as u16,
        };
        let channel_id = match g.channel_of(port_id) {
            Some(c) => c,
            None => continue,
        };
        let channel = g.channel(channel_id);
        let other_port_id = if channel.src() == port_id {
            channel.dst()
        } else {
            channel.src()
        };
        let b = other_port_id.actor;

        let rate_a = g.port(port_id).rate(s) as i64;
        let rate_b = g.port(other_port_id).rate(s) as i64;
        let ratio = Fraction::new(rate_a, rate_b);
        let fraction_b = fraction_a.mul(&ratio);
        let known = fractions[b.index()];

        match known {
            Some(k) if k != fraction_b => {
                for f in fractions.iter_mut() {
                    *f = Some(Fraction::inconsistent());
                }
                return;
            }
            Some(_) => {}
            None => {
                fractions[b.index()] = Some(fraction_b);
                propagate(g, s, fractions, b);
                if fractions[b.index()].is_some_and(|f| f.is_inconsistent()) {
                    return;
                }
            }
        }
    }
}

/// Converts fractions to the smallest positive integer vector, or the zero
/// vector if any actor's fraction is unreached or the inconsistency
/// sentinel.
fn finalize(fractions: &[Option<Fraction>]) -> Vec<u32> {
    let n = fractions.len();
    let mut l: i64 = 1;
    for f in fractions {
        match f {
            Some(f) if !f.is_inconsistent() => l = crate::rational::lcm(l, f.denominator()),
            _ => return vec![0; n],
        }
    }

    let mut r: Vec<i64> = fractions
        .iter()
        .map(|f| {
            let f = f.expect("checked Some above");
            f.numerator() * l / f.denominator()
        })
        .collect();

    let mut g = r[0];
    for &x in &r[1..] {
        g = crate::rational::gcd(g, x);
    }
    let g = g.max(1);
    for x in r.iter_mut() {
        *x /= g;
    }

    r.into_iter().map(|x| x as u32).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{Actor, Channel, Direction, Port, ScenarioGraph, ScenarioId};

    /// A --(out=2)--> B (in=3), no initial tokens. Expected [3, 2].
    fn sdf_consistent() -> ScenarioGraph {
        let mut sg = ScenarioGraph::new("s1");
        let s = ScenarioId(0);
        let mut a = Actor::new("A", "t");
        a.add_port(Port::new("out", Direction::Out));
        let a_id = sg.add_actor(a);
        let mut b = Actor::new("B", "t");
        b.add_port(Port::new("in", Direction::In));
        let b_id = sg.add_actor(b);

        let src = PortId { actor: a_id, slot: 0 };
        let dst = PortId { actor: b_id, slot: 0 };
        sg.actor_mut(a_id).ports_mut()[0].set_rate(s, 2);
        sg.actor_mut(b_id).ports_mut()[0].set_rate(s, 3);
        sg.add_channel(Channel::new("ab", src, dst));
        sg
    }

    #[test]
    fn two_actor_sdf_pair_is_consistent() {
        let sg = sdf_consistent();
        let s = ScenarioId(0);
        assert!(is_consistent(&sg, s));
        assert_eq!(compute_repetition_vector(&sg, s), vec![3, 2]);
    }

    /// Adding a parallel channel B -> A with rates B.out=1, A.in=1 forces A
    /// to be both rate-2-out and rate-1-in simultaneously relative to B,
    /// which is inconsistent.
    #[test]
    fn conflicting_parallel_channel_is_inconsistent() {
        let mut sg = sdf_consistent();
        let s = ScenarioId(0);
        let a_id = sg.actor_by_name("A").unwrap();
        let b_id = sg.actor_by_name("B").unwrap();
        let out_slot = sg.actor_mut(b_id).add_port(Port::new("out2", Direction::Out));
        let in_slot = sg.actor_mut(a_id).add_port(Port::new("in2", Direction::In));
        sg.actor_mut(b_id).ports_mut()[out_slot as usize].set_rate(s, 1);
        sg.actor_mut(a_id).ports_mut()[in_slot as usize].set_rate(s, 1);
        let src = PortId { actor: b_id, slot: out_slot };
        let dst = PortId { actor: a_id, slot: in_slot };
        sg.add_channel(Channel::new("ba", src, dst));

        assert!(!is_consistent(&sg, s));
        assert_eq!(compute_repetition_vector(&sg, s), vec![0, 0]);
    }

    #[test]
    fn self_loop_actor_is_trivially_consistent() {
        let mut sg = ScenarioGraph::new("self");
        let s = ScenarioId(0);
        let mut a = Actor::new("A", "t");
        a.add_port(Port::new("out", Direction::Out));
        a.add_port(Port::new("in", Direction::In));
        let a_id = sg.add_actor(a);
        sg.actor_mut(a_id).ports_mut()[0].set_rate(s, 1);
        sg.actor_mut(a_id).ports_mut()[1].set_rate(s, 1);
        let src = PortId { actor: a_id, slot: 0 };
        let dst = PortId { actor: a_id, slot: 1 };
        sg.add_channel(Channel::new("self", src, dst));

        assert_eq!(compute_repetition_vector(&sg, s), vec![1]);
    }
}

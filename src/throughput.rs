//! Throughput algorithms: Maximum Cycle Mean on the combined
//! matrix-labelled automaton for strongly consistent graphs, and Maximum
//! Cycle Ratio with rewards (plus critical-cycle extraction) on the full
//! automaton for weakly consistent graphs.

use std::collections::{BTreeSet, HashMap};

use crate::automaton::{edge_labeled_automaton, AutomatonVariant, MatrixAutomaton};
use crate::cancel::CancellationToken;
use crate::error::{Error, Result};
use crate::explore::explore_symbolic;
use crate::graph::{Graph, ScenarioGraph, ScenarioId};
use crate::maxplus::{MPMatrix, MPTime, MINUS_INFINITY};

/// Strong-case persistent-token consistency check: every scenario's
/// underlying scenario graph must declare the same set of persistent
/// initial-token names, the canonical set the first scenario establishes.
/// Grounded on `thrutils.cc::computeMaxPlusMatricesFromScenarios`, which
/// indexes every scenario graph's own persistent-token map by one
/// graph-level canonical name list (`g->getPersistentTokens()`) — a name
/// missing from a particular scenario graph's map silently mis-indexes
/// there, whereas here it is reported as `Error::PersistentTokenMismatch`.
fn check_persistent_token_consistency(graph: &Graph) -> Result<()> {
    let mut canonical: Option<BTreeSet<&str>> = None;
    for i in 0..graph.scenarios().len() {
        let id = ScenarioId(i);
        let names: BTreeSet<&str> = graph
            .graph_of(id)
            .channels()
            .iter()
            .flat_map(|c| c.persistent_initial_names())
            .map(String::as_str)
            .collect();
        match &canonical {
            None => canonical = Some(names),
            Some(expected) if *expected != names => {
                return Err(Error::PersistentTokenMismatch {
                    scenario: graph.scenario(id).name().to_string(),
                });
            }
            _ => {}
        }
    }
    Ok(())
}

/// Computes, per scenario of `graph`, the max-plus matrix of its scenario
/// graph, keyed by scenario name for automaton labelling.
/// When the `parallel` feature is enabled this fans out across scenarios
/// with rayon, since per-scenario matrix extraction is embarrassingly
/// parallel and order-independent.
fn scenario_matrices(graph: &Graph) -> Result<HashMap<String, MPMatrix>> {
    let ids: Vec<ScenarioId> = (0..graph.scenarios().len()).map(ScenarioId).collect();

    #[cfg(feature = "parallel")]
    {
        use rayon::prelude::*;
        ids.into_par_iter().map(|id| compute_one(graph, id)).collect()
    }
    #[cfg(not(feature = "parallel"))]
    {
        ids.into_iter().map(|id| compute_one(graph, id)).collect()
    }
}

fn compute_one(graph: &Graph, id: ScenarioId) -> Result<(String, MPMatrix)> {
    let scenario = graph.scenario(id);
    let matrix = explore_symbolic(graph.graph_of(id), id, scenario.name())?;
    Ok((scenario.name().to_string(), matrix))
}

/// Scenario-consistency test: the persistent initial- and
/// final-token name sets of a scenario graph must coincide (the weak case
/// requires them to line up positionally across the FSM's sequencing), or
/// the automaton cannot be built. A scenario graph with no declared final
/// tokens follows the strongly-consistent convention "final = initial"
/// and trivially passes.
fn check_scenario_consistency(sg: &ScenarioGraph) -> Result<()> {
    if sg.total_final_tokens() == 0 {
        return Ok(());
    }
    let mut initial: Vec<&str> = sg
        .channels()
        .iter()
        .flat_map(|c| c.persistent_initial_names())
        .map(String::as_str)
        .collect();
    let mut finals: Vec<&str> = sg
        .channels()
        .iter()
        .flat_map(|c| c.persistent_final_names())
        .map(String::as_str)
        .collect();
    initial.sort_unstable();
    finals.sort_unstable();
    if initial != finals {
        return Err(Error::InconsistentScenarioGraph {
            scenario: sg.name().to_string(),
            reason: "persistent initial- and final-token name sets do not match".to_string(),
        });
    }
    Ok(())
}

/// Strongly consistent throughput: builds the combined
/// matrix-labelled automaton, expands it into a scalar max-plus automaton
/// over `(state, token)` pairs, and returns `1 / MCM`.
pub fn strongly_consistent_throughput(
    graph: &Graph,
    variant: AutomatonVariant,
    cancel: &CancellationToken,
) -> Result<f64> {
    check_persistent_token_consistency(graph)?;
    let matrices = scenario_matrices(graph)?;
    let edge_labeled = edge_labeled_automaton(graph).minimize();
    cancel.check()?;
    let automaton = MatrixAutomaton::build(&edge_labeled, &matrices, variant)?;
    let scalar = ScalarGraph::expand(&automaton, |_| 1.0);
    cancel.check()?;
    let mcm = scalar.delay.mcm();
    log::debug!("MCM = {mcm}, throughput = {}", 1.0 / mcm);
    Ok(1.0 / mcm)
}

/// Result of the weakly consistent throughput pipeline: the throughput
/// figure, the underlying Maximum Cycle Ratio, and the critical scenario
/// sequence that achieves it.
#[derive(Debug, Clone, PartialEq)]
pub struct CriticalCycleReport {
    pub throughput: f64,
    pub mcr: MPTime,
    pub critical_sequence: Vec<String>,
}

/// Weakly consistent throughput via Maximum Cycle Ratio: builds
/// the *full* matrix-labelled automaton (every original edge kept, so the
/// critical cycle can be projected back to scenario labels), searches for
/// the MCR with Lawler's parametric method, and reconstructs the cycle that
/// achieves it.
pub fn weakly_consistent_throughput(graph: &Graph, cancel: &CancellationToken) -> Result<CriticalCycleReport> {
    for sg in graph.scenario_graphs() {
        check_scenario_consistency(sg)?;
    }
    let matrices = scenario_matrices(graph)?;
    let edge_labeled = edge_labeled_automaton(graph).minimize();
    cancel.check()?;
    let automaton = MatrixAutomaton::build(&edge_labeled, &matrices, AutomatonVariant::Full)?;
    let reward_of = |name: &str| {
        graph
            .scenario_by_name(name)
            .map(|id| graph.scenario(id).reward())
            .unwrap_or(1.0)
    };
    let scalar = ScalarGraph::expand(&automaton, reward_of);
    cancel.check()?;

    let mcr = max_cycle_ratio(&scalar);
    let cycle = scalar.critical_cycle(mcr);
    let critical_sequence = scalar.project_scenarios(&automaton, &cycle);
    log::debug!(
        "MCR = {mcr}, throughput = {}, critical sequence = {critical_sequence:?}",
        1.0 / mcr
    );

    Ok(CriticalCycleReport {
        throughput: 1.0 / mcr,
        mcr,
        critical_sequence,
    })
}

/// The matrix-labelled automaton expanded into a plain scalar weighted
/// graph over `(state, token)` pairs: edge `(q, i) -> (q', j)`
/// carries weight `matrix[j][i]` (so that `M ⊗ v` reads as "vector entry
/// `j` is reached from entry `i`"), the reward of the original automaton
/// edge it came from, and that edge's index for cycle projection.
struct ScalarGraph {
    n: usize,
    delay: MPMatrix,
    reward: Vec<f64>,
    origin: Vec<Option<usize>>,
}

impl ScalarGraph {
    fn index(token_dim: usize, state: usize, token: usize) -> usize {
        state * token_dim + token
    }

    fn expand(automaton: &MatrixAutomaton, reward_of: impl Fn(&str) -> f64) -> Self {
        let token_dim = automaton.token_dim();
        let n = automaton.state_count() * token_dim;
        let mut delay = MPMatrix::bottom(n, n);
        let mut reward = vec![0.0; n * n];
        let mut origin: Vec<Option<usize>> = vec![None; n * n];

        for (edge_idx, edge) in automaton.edges().iter().enumerate() {
            let from_state = edge.from.index();
            let to_state = edge.to.index();
            let r = edge.scenarios.first().map(|s| reward_of(s)).unwrap_or(1.0);
            for j in 0..token_dim {
                for i in 0..token_dim {
                    let w = edge.matrix.get(j, i);
                    if w == MINUS_INFINITY {
                        continue;
                    }
                    let from = Self::index(token_dim, from_state, i);
                    let to = Self::index(token_dim, to_state, j);
                    let cell = from * n + to;
                    if w > delay.get(from, to) {
                        delay.set(from, to, w);
                        reward[cell] = r;
                        origin[cell] = Some(edge_idx);
                    }
                }
            }
        }

        Self { n, delay, reward, origin }
    }

    /// Reconstructs a directed cycle (as a sequence of scalar node indices,
    /// first node repeated at the end implicitly) whose mean weight under
    /// `delay(u,v) - lambda * reward(u,v)` is (approximately) zero — the
    /// cycle that achieves the Maximum Cycle Ratio `lambda`.
    fn critical_cycle(&self, lambda: MPTime) -> Vec<usize> {
        let n = self.n;
        if n == 0 {
            return Vec::new();
        }
        let w = weighted_matrix(&self.delay, &self.reward, n, lambda);

        let mut best: Option<(f64, usize, usize, usize)> = None; // (ratio, source, v, k)
        let mut tables: Vec<(Vec<Vec<MPTime>>, Vec<Vec<Option<usize>>>)> = Vec::with_capacity(n);
        for source in 0..n {
            let (d, pred) = karp_with_predecessors(&w, source);
            for v in 0..n {
                if d[n][v] == MINUS_INFINITY {
                    continue;
                }
                for k in 0..n {
                    if d[k][v] == MINUS_INFINITY {
                        continue;
                    }
                    let ratio = (d[n][v] - d[k][v]) / (n - k) as f64;
                    if best.is_none_or(|(b, ..)| ratio > b) {
                        best = Some((ratio, source, v, k));
                    }
                }
            }
            tables.push((d, pred));
        }

        let (_, source, v, k) = match best {
            Some(b) => b,
            None => return Vec::new(),
        };
        let (_, pred) = &tables[source];

        let mut path = Vec::new();
        let mut seen_at: HashMap<usize, usize> = HashMap::new();
        let mut level = n;
        let mut node = v;
        loop {
            if let Some(&idx) = seen_at.get(&node) {
                let mut cycle = path[idx..].to_vec();
                cycle.reverse();
                return cycle;
            }
            seen_at.insert(node, path.len());
            path.push(node);
            if level == k {
                return Vec::new();
            }
            node = pred[level][node].expect("predecessor exists along a finite Karp walk");
            level -= 1;
        }
    }

    /// Projects a cycle of scalar nodes back to the sequence of scenario
    /// names labelling the automaton edges it traversed.
    fn project_scenarios(&self, automaton: &MatrixAutomaton, cycle: &[usize]) -> Vec<String> {
        if cycle.is_empty() {
            return Vec::new();
        }
        let mut out = Vec::with_capacity(cycle.len());
        for idx in 0..cycle.len() {
            let u = cycle[idx];
            let v = cycle[(idx + 1) % cycle.len()];
            let edge_idx = self.origin[u * self.n + v].expect("cycle edge must have a recorded origin");
            out.push(automaton.edges()[edge_idx].scenarios[0].clone());
        }
        out
    }
}

fn weighted_matrix(delay: &MPMatrix, reward: &[f64], n: usize, lambda: f64) -> MPMatrix {
    let mut m = MPMatrix::bottom(n, n);
    for u in 0..n {
        for v in 0..n {
            let d = delay.get(u, v);
            if d == MINUS_INFINITY {
                continue;
            }
            m.set(u, v, d - lambda * reward[u * n + v]);
        }
    }
    m
}

/// Karp's `n`-step walk DP from a fixed source, with predecessors recorded
/// so a concrete critical cycle can be reconstructed afterward. This is the
/// same recurrence as [`MPMatrix::mcm`]'s internal helper, generalized to
/// arbitrary (non-max-plus) real edge weights for the parametric MCR search
/// and extended with predecessor bookkeeping.
fn karp_with_predecessors(w: &MPMatrix, source: usize) -> (Vec<Vec<MPTime>>, Vec<Vec<Option<usize>>>) {
    let n = w.rows();
    let mut d = vec![vec![MINUS_INFINITY; n]; n + 1];
    let mut pred = vec![vec![None; n]; n + 1];
    d[0][source] = 0.0;
    for k in 1..=n {
        for v in 0..n {
            let mut best = MINUS_INFINITY;
            let mut best_u = None;
            for u in 0..n {
                if d[k - 1][u] == MINUS_INFINITY {
                    continue;
                }
                let wt = w.get(u, v);
                if wt == MINUS_INFINITY {
                    continue;
                }
                let candidate = d[k - 1][u] + wt;
                if candidate > best {
                    best = candidate;
                    best_u = Some(u);
                }
            }
            d[k][v] = best;
            pred[k][v] = best_u;
        }
    }
    (d, pred)
}

/// Maximum Cycle Ratio via Lawler's parametric search: binary search on
/// `lambda` for the value at which the maximum cycle mean of
/// `delay - lambda * reward` is zero.
fn max_cycle_ratio(scalar: &ScalarGraph) -> MPTime {
    let n = scalar.n;
    if n == 0 {
        return MINUS_INFINITY;
    }
    let max_delay = scalar
        .delay
        .mcm()
        .abs()
        .max(1.0);
    let mut lo = 0.0_f64;
    let mut hi = max_delay * 4.0;
    for _ in 0..100 {
        let mid = (lo + hi) / 2.0;
        let w = weighted_matrix(&scalar.delay, &scalar.reward, n, mid);
        if w.mcm() >= 0.0 {
            lo = mid;
        } else {
            hi = mid;
        }
    }
    lo
}

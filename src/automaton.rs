//! Scenario automaton construction: the FSM becomes an edge-labelled
//! automaton, then a minimized one, then a max-plus-matrix-labelled one
//! ready for MCM/MCR.

use std::collections::HashMap;

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;

use crate::graph::{Fsm, Graph};
use crate::maxplus::MPMatrix;

/// Stage 1: one state per FSM state (same index), edges labelled by the
/// name of the scenario at the *destination* state. The FSM's own initial
/// state's scenario is never emitted as a label.
#[derive(Debug, Clone)]
pub struct EdgeLabeledAutomaton {
    graph: DiGraph<(), String>,
    initial: NodeIndex,
}

impl EdgeLabeledAutomaton {
    /// Builds Stage 1 directly from a [`Fsm`], naming destination scenarios
    /// via `scenario_name`.
    pub fn from_fsm(fsm: &Fsm, scenario_name: impl Fn(crate::graph::ScenarioId) -> String) -> Self {
        let mut graph = DiGraph::new();
        let nodes: Vec<NodeIndex> = (0..fsm.states().len()).map(|_| graph.add_node(())).collect();
        for t in fsm.transitions() {
            let label = scenario_name(fsm.state(t.to).scenario());
            graph.add_edge(nodes[t.from.index()], nodes[t.to.index()], label);
        }
        let initial = nodes[fsm.initial_state().index()];
        Self { graph, initial }
    }

    pub fn state_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn initial(&self) -> NodeIndex {
        self.initial
    }

    /// Outgoing `(target, label)` pairs of `state`, in insertion order.
    pub fn outgoing(&self, state: NodeIndex) -> impl Iterator<Item = (NodeIndex, &str)> {
        self.graph
            .edges(state)
            .map(|e| (e.target(), e.weight().as_str()))
    }

    /// Stage 2: Hopcroft-style partition refinement over the edge-label
    /// alphabet. Determinization is deliberately skipped; states are merged only when
    /// they are indistinguishable by the labelled transitions they offer,
    /// which is exactly the bisimulation partition-refinement fixpoint.
    pub fn minimize(&self) -> EdgeLabeledAutomaton {
        let n = self.graph.node_count();
        let mut block_of: Vec<usize> = vec![0; n];

        loop {
            // Signature of a state: sorted (label, target-block) pairs.
            let mut signatures: Vec<Vec<(String, usize)>> = Vec::with_capacity(n);
            for v in self.graph.node_indices() {
                let mut sig: Vec<(String, usize)> = self
                    .graph
                    .edges(v)
                    .map(|e| (e.weight().clone(), block_of[e.target().index()]))
                    .collect();
                sig.sort();
                signatures.push(sig);
            }

            let mut refined: HashMap<(usize, Vec<(String, usize)>), usize> = HashMap::new();
            let mut next_block_of = vec![0usize; n];
            for v in 0..n {
                let key = (block_of[v], signatures[v].clone());
                let next_id = refined.len();
                let block = *refined.entry(key).or_insert(next_id);
                next_block_of[v] = block;
            }

            if next_block_of == block_of {
                break;
            }
            block_of = next_block_of;
        }

        let block_count = block_of.iter().copied().max().map_or(0, |m| m + 1);
        let mut graph = DiGraph::new();
        let nodes: Vec<NodeIndex> = (0..block_count).map(|_| graph.add_node(())).collect();

        let mut seen_edges: std::collections::HashSet<(usize, usize, String)> = std::collections::HashSet::new();
        for v in self.graph.node_indices() {
            for e in self.graph.edges(v) {
                let from = block_of[v.index()];
                let to = block_of[e.target().index()];
                let key = (from, to, e.weight().clone());
                if seen_edges.insert(key.clone()) {
                    graph.add_edge(nodes[from], nodes[to], key.2);
                }
            }
        }

        let initial = nodes[block_of[self.initial.index()]];
        log::debug!(
            "minimized scenario automaton from {} to {} states",
            self.state_count(),
            block_count
        );
        EdgeLabeledAutomaton { graph, initial }
    }
}

/// Whether a matrix-labelled automaton keeps every original edge with its
/// own scenario matrix (`Full`, needed for critical-cycle extraction), or
/// folds parallel edges between a state pair into a single pointwise-max
/// matrix (`Combined`, the default and usual choice for plain throughput).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutomatonVariant {
    Combined,
    Full,
}

/// A single transition of the matrix-labelled automaton (Stage 3).
#[derive(Debug, Clone)]
pub struct MatrixEdge {
    pub from: NodeIndex,
    pub to: NodeIndex,
    pub matrix: MPMatrix,
    /// The scenario(s) folded into this edge. A single name for `Full`;
    /// every scenario that was pointwise-maxed together for `Combined`.
    pub scenarios: Vec<String>,
}

/// The minimized edge-labelled automaton relabelled with the max-plus
/// matrix of the scenario (or scenarios) on each edge.
#[derive(Debug, Clone)]
pub struct MatrixAutomaton {
    state_count: usize,
    initial: NodeIndex,
    edges: Vec<MatrixEdge>,
    /// Dimension `N` shared by every matrix on this automaton.
    token_dim: usize,
}

impl MatrixAutomaton {
    pub fn state_count(&self) -> usize {
        self.state_count
    }

    pub fn initial(&self) -> NodeIndex {
        self.initial
    }

    pub fn edges(&self) -> &[MatrixEdge] {
        &self.edges
    }

    pub fn token_dim(&self) -> usize {
        self.token_dim
    }

    /// Builds a matrix-labelled automaton from a minimized edge-labelled
    /// automaton and the per-scenario matrices of the symbolic exploration.
    /// Every matrix must have the same shape (`token_dim x token_dim`);
    /// mismatches surface as [`Error::DimensionMismatch`].
    pub fn build(
        edge_labeled: &EdgeLabeledAutomaton,
        matrices: &HashMap<String, MPMatrix>,
        variant: AutomatonVariant,
    ) -> crate::error::Result<Self> {
        let token_dim = matrices.values().next().map(|m| m.rows()).unwrap_or(0);
        for m in matrices.values() {
            if m.shape() != (token_dim, token_dim) {
                return Err(crate::error::Error::DimensionMismatch {
                    op: "scenario matrices must share one shape for automaton labelling",
                    lhs: (token_dim, token_dim),
                    rhs: m.shape(),
                });
            }
        }

        let edges = match variant {
            AutomatonVariant::Full => edge_labeled
                .graph
                .edge_indices()
                .map(|e| {
                    let (from, to) = edge_labeled.graph.edge_endpoints(e).expect("edge exists");
                    let label = &edge_labeled.graph[e];
                    let matrix = matrices.get(label).cloned().ok_or_else(|| crate::error::Error::NotFound {
                        kind: "scenario matrix",
                        name: label.clone(),
                    })?;
                    Ok(MatrixEdge {
                        from,
                        to,
                        matrix,
                        scenarios: vec![label.clone()],
                    })
                })
                .collect::<crate::error::Result<Vec<_>>>()?,
            AutomatonVariant::Combined => {
                // "First-edge-wins-then-max":
                // fold every parallel edge between an ordered state pair
                // into one, initializing the accumulator with the first
                // edge encountered in iteration order and then taking the
                // pointwise maximum of the rest. The result is identical
                // to a plain fold-max over all parallel edges since ⊕ is
                // commutative and associative; this only documents which
                // edge the implementation happens to start from.
                let mut combined: HashMap<(NodeIndex, NodeIndex), MatrixEdge> = HashMap::new();
                for e in edge_labeled.graph.edge_indices() {
                    let (from, to) = edge_labeled.graph.edge_endpoints(e).expect("edge exists");
                    let label = &edge_labeled.graph[e];
                    let matrix = matrices.get(label).cloned().ok_or_else(|| crate::error::Error::NotFound {
                        kind: "scenario matrix",
                        name: label.clone(),
                    })?;
                    match combined.get_mut(&(from, to)) {
                        None => {
                            combined.insert(
                                (from, to),
                                MatrixEdge {
                                    from,
                                    to,
                                    matrix,
                                    scenarios: vec![label.clone()],
                                },
                            );
                        }
                        Some(existing) => {
                            existing.matrix = existing.matrix.maximum(&matrix)?;
                            existing.scenarios.push(label.clone());
                        }
                    }
                }
                combined.into_values().collect()
            }
        };

        Ok(Self {
            state_count: edge_labeled.state_count(),
            initial: edge_labeled.initial(),
            edges,
            token_dim,
        })
    }
}

/// Convenience: builds the Stage-1/2 edge-labelled automaton directly from
/// a top-level [`Graph`]'s FSM.
pub fn edge_labeled_automaton(graph: &Graph) -> EdgeLabeledAutomaton {
    EdgeLabeledAutomaton::from_fsm(graph.fsm(), |s| graph.scenario(s).name().to_string())
}

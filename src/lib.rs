//! FSM-SADF (Scenario-Aware Dataflow with explicit FSM scenario sequencing)
//! throughput analysis.
//!
//! This crate is a pure in-memory analysis core: build a
//! [`Graph`], run the repetition-vector, state-space, and throughput
//! algorithms below, and hand the result to whatever reporting or
//! resource-allocation layer the caller has. It does not parse XML, render
//! HTML, bind actors to processors, or touch the filesystem — those concerns
//! live outside this crate.
//!
//! ## Core Types
//!
//! - [`Graph`] — top-level aggregate of scenario graphs, scenarios, and the FSM
//! - [`ScenarioGraph`] — actors, ports, and channels for one scenario graph
//! - [`maxplus::MPMatrix`] / [`maxplus::MPVector`] — max-plus (ℝ∪{−∞}, max, +) arithmetic
//! - [`rational::Fraction`] — exact rational arithmetic backing the repetition vector
//!
//! ## Analysis Pipeline
//!
//! - [`repetition::compute_repetition_vector`] — per-scenario firing counts
//! - [`explore::explore_symbolic`] — per-scenario max-plus matrix
//! - [`explore::ensure_strongly_bounded`] — strong-bounding rewrite
//! - [`automaton`] — FSM to edge-labelled to minimized to matrix-labelled
//! scenario automaton
//! - [`explore::explore_forward`] / [`explore::explore_backward`] — concrete
//! timestamped-token exploration and single-scenario throughput/eigenvector
//! - [`throughput::strongly_consistent_throughput`] /
//! [`throughput::weakly_consistent_throughput`] — MCM/MCR throughput and
//! critical-cycle extraction
//!
//! Every operation that walks a graph takes a [`cancel::CancellationToken`]
//! and returns [`error::Result`]; the core never panics on caller-triggerable
//! input and never logs on the caller's behalf.

pub mod automaton;
pub mod cancel;
pub mod error;
pub mod explore;
pub mod graph;
pub mod maxplus;
pub mod rational;
pub mod repetition;
pub mod throughput;

pub use cancel::CancellationToken;
pub use error::{Error, Result};
pub use graph::{
    Actor, ActorId, Channel, ChannelId, Direction, Fsm, FsmState, FsmStateId, Graph, Port, PortId,
    ProcessorRequirements, Scenario, ScenarioGraph, ScenarioGraphId, ScenarioId, StorageDistribution, Transition,
};
pub use maxplus::{oplus, otimes, MPMatrix, MPTime, MPVector, MINUS_INFINITY};
pub use rational::Fraction;

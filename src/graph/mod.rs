//! The FSM-SADF data model: actors, ports, channels, scenario
//! graphs, scenarios, the scenario FSM, storage distributions, and the
//! top-level graph that aggregates them.

pub mod actor;
pub mod channel;
pub mod fsm;
pub mod graph;
pub mod ids;
pub mod port;
pub mod scenario;
pub mod scenario_graph;
pub mod storage;

pub use actor::{Actor, ProcessorRequirements};
pub use channel::Channel;
pub use fsm::{from_periodic_scenarios, Fsm, FsmState, Transition};
pub use graph::Graph;
pub use ids::{ActorId, ChannelId, FsmStateId, PortId, ScenarioGraphId, ScenarioId};
pub use port::{Direction, Port};
pub use scenario::Scenario;
pub use scenario_graph::ScenarioGraph;
pub use storage::StorageDistribution;

//! Strong-bounding rewrite: injects a synthetic "sync" actor tied into one
//! existing channel of each scenario graph so that otherwise-independent
//! initial-token components are forced into a single connected component,
//! without changing reported throughput.

use std::collections::BTreeSet;

use crate::graph::{Actor, Channel, ChannelId, Direction, Graph, Port, PortId, ScenarioGraph, ScenarioId};

/// Returns a clone of `g` in which every scenario graph has been rewritten
/// to be strongly bounded. Never mutates `g`.
pub fn ensure_strongly_bounded(g: &Graph) -> Graph {
    let mut rewritten = g.clone();
    for sg in rewritten.scenario_graphs_mut() {
        inject_sync_actor(sg);
    }
    rewritten
}

fn inject_sync_actor(sg: &mut ScenarioGraph) {
    if sg.channels().is_empty() {
        return;
    }
    let cf = sg.channel(ChannelId(0)).clone();
    let src_actor = cf.src().actor;
    let dst_actor = cf.dst().actor;
    let src_rates = sg.port(cf.src()).rates().clone();
    let dst_rates = sg.port(cf.dst()).rates().clone();
    let scenarios: BTreeSet<ScenarioId> = src_rates.keys().chain(dst_rates.keys()).copied().collect();

    let mut sync = Actor::new("sync-actor", "sync");
    let sync_out = sync.add_port(Port::new("sync-out", Direction::Out));
    let sync_in = sync.add_port(Port::new("sync-in", Direction::In));
    let sync_from_src = sync.add_port(Port::new("sync-from-src", Direction::In));
    let sync_to_dst = sync.add_port(Port::new("sync-to-dst", Direction::Out));
    for &s in &scenarios {
        sync.ports_mut()[sync_out as usize].set_rate(s, 1);
        sync.ports_mut()[sync_in as usize].set_rate(s, 1);
        sync.ports_mut()[sync_from_src as usize].set_rate(s, 1);
        sync.ports_mut()[sync_to_dst as usize].set_rate(s, 1);
        sync.processor_mut("sync").set_exec_time(s, 0);
    }
    sync.set_default_processor_type("sync");
    let sync_id = sg.add_actor(sync);

    // Self-edge carrying the single persistent synchronization token.
    let mut self_edge = Channel::new(
        "sync-selfedge",
        PortId { actor: sync_id, slot: sync_out },
        PortId { actor: sync_id, slot: sync_in },
    );
    self_edge.set_initial_tokens(1);
    self_edge
        .add_persistent_initial_name("sync-selfedge-persistent-token")
        .expect("fresh channel has room for one persistent name");
    sg.add_channel(self_edge);

    // Extra output on the original source actor, firing in lockstep with
    // its real output and feeding the sync actor.
    let extra_src_slot = sg
        .actor_mut(src_actor)
        .add_port(Port::new("sync-extra-out", Direction::Out));
    for (&s, &rate) in &src_rates {
        sg.actor_mut(src_actor).ports_mut()[extra_src_slot as usize].set_rate(s, rate);
    }
    let mut sync_src_edge = Channel::new(
        "sync-src",
        PortId { actor: src_actor, slot: extra_src_slot },
        PortId { actor: sync_id, slot: sync_from_src },
    );
    sync_src_edge.set_initial_tokens(0);
    sg.add_channel(sync_src_edge);

    // Extra input on the original destination actor, fed by the sync actor
    // and carrying a copy of the chosen channel's initial tokens.
    let extra_dst_slot = sg
        .actor_mut(dst_actor)
        .add_port(Port::new("sync-extra-in", Direction::In));
    for (&s, &rate) in &dst_rates {
        sg.actor_mut(dst_actor).ports_mut()[extra_dst_slot as usize].set_rate(s, rate);
    }
    let mut sync_dst_edge = Channel::new(
        "sync-dst",
        PortId { actor: sync_id, slot: sync_to_dst },
        PortId { actor: dst_actor, slot: extra_dst_slot },
    );
    let initial = cf.initial_tokens();
    sync_dst_edge.set_initial_tokens(initial);
    for j in 0..initial {
        sync_dst_edge
            .add_persistent_initial_name(format!("sync-dst-persistent-{j}"))
            .expect("token count matches names added");
    }
    sg.add_channel(sync_dst_edge);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{Graph, Scenario};
    use crate::repetition;

    /// Two non-interacting self-loop rings of period 2 and 3 in one
    /// scenario graph, i.e. two disjoint initial-token components.
    fn two_ring_graph() -> (Graph, ScenarioId) {
        let mut g = Graph::new("s6");
        let s = ScenarioId(0);
        let sc = Scenario::new("only", crate::graph::ScenarioGraphId(0));
        g.add_scenario(sc);

        let mut sg = ScenarioGraph::new("rings");
        let mut a = Actor::new("A", "t");
        a.add_port(Port::new("out", Direction::Out));
        a.add_port(Port::new("in", Direction::In));
        let a_id = sg.add_actor(a);
        sg.actor_mut(a_id).ports_mut()[0].set_rate(s, 1);
        sg.actor_mut(a_id).ports_mut()[1].set_rate(s, 1);
        sg.actor_mut(a_id).processor_mut("cpu").set_exec_time(s, 2);
        sg.actor_mut(a_id).set_default_processor_type("cpu");
        let mut ca = Channel::new(
            "ring-a",
            PortId { actor: a_id, slot: 0 },
            PortId { actor: a_id, slot: 1 },
        );
        ca.set_initial_tokens(1);
        ca.add_persistent_initial_name("tok-a").unwrap();
        sg.add_channel(ca);

        let mut b = Actor::new("B", "t");
        b.add_port(Port::new("out", Direction::Out));
        b.add_port(Port::new("in", Direction::In));
        let b_id = sg.add_actor(b);
        sg.actor_mut(b_id).ports_mut()[0].set_rate(s, 1);
        sg.actor_mut(b_id).ports_mut()[1].set_rate(s, 1);
        sg.actor_mut(b_id).processor_mut("cpu").set_exec_time(s, 3);
        sg.actor_mut(b_id).set_default_processor_type("cpu");
        let mut cb = Channel::new(
            "ring-b",
            PortId { actor: b_id, slot: 0 },
            PortId { actor: b_id, slot: 1 },
        );
        cb.set_initial_tokens(1);
        cb.add_persistent_initial_name("tok-b").unwrap();
        sg.add_channel(cb);

        g.add_scenario_graph(sg);
        g.fsm_mut().add_state(s);
        g.fsm_mut().set_initial_state(crate::graph::FsmStateId(0));
        (g, s)
    }

    #[test]
    fn injected_graph_remains_structurally_valid() {
        let (g, _) = two_ring_graph();
        let rewritten = ensure_strongly_bounded(&g);
        assert!(rewritten.validate().is_ok());
    }

    #[test]
    fn injected_graph_has_one_more_actor_and_three_more_channels() {
        let (g, _) = two_ring_graph();
        let before_actors = g.scenario_graphs()[0].actors().len();
        let before_channels = g.scenario_graphs()[0].channels().len();
        let rewritten = ensure_strongly_bounded(&g);
        let sg = &rewritten.scenario_graphs()[0];
        assert_eq!(sg.actors().len(), before_actors + 1);
        assert_eq!(sg.channels().len(), before_channels + 3);
    }

    #[test]
    fn repetition_vector_is_still_consistent_after_rewrite() {
        let (g, s) = two_ring_graph();
        let rewritten = ensure_strongly_bounded(&g);
        let sg = &rewritten.scenario_graphs()[0];
        assert!(repetition::is_consistent(sg, s));
    }
}

use fsmsadf::automaton::AutomatonVariant;
use fsmsadf::graph::{Actor, Channel, Direction, Fsm, Port, PortId, Scenario, ScenarioGraph};
use fsmsadf::{automaton, explore, repetition, throughput, CancellationToken, Graph, MPMatrix, ScenarioId};

criterion::criterion_main!(benches);
criterion::criterion_group! {
    name = benches;
    config = criterion::Criterion::default()
        .without_plots()
        .noise_threshold(3.0)
        .significance_level(0.01)
        .sample_size(10)
        .measurement_time(std::time::Duration::from_secs(1));
    targets =
        computing_self_loop_repetition_vector,
        multiplying_max_plus_matrices,
        computing_max_cycle_mean,
        exploring_self_loop_symbolically,
        exploring_self_loop_numerically,
        minimizing_two_scenario_automaton,
        computing_two_scenario_throughput,
}

/// A self-loop actor `A` with one initial token, rates 1/1 — a minimal but
/// representative scenario graph for micro-benchmarking the per-scenario
/// pipeline stages.
fn self_loop_graph(exec_time: u32) -> (ScenarioGraph, ScenarioId) {
    let mut sg = ScenarioGraph::new("bench");
    let s = ScenarioId(0);
    let mut a = Actor::new("A", "t");
    a.add_port(Port::new("out", Direction::Out));
    a.add_port(Port::new("in", Direction::In));
    let a_id = sg.add_actor(a);
    sg.actor_mut(a_id).ports_mut()[0].set_rate(s, 1);
    sg.actor_mut(a_id).ports_mut()[1].set_rate(s, 1);
    sg.actor_mut(a_id).processor_mut("cpu").set_exec_time(s, exec_time);
    sg.actor_mut(a_id).set_default_processor_type("cpu");
    let src = PortId { actor: a_id, slot: 0 };
    let dst = PortId { actor: a_id, slot: 1 };
    let mut c = Channel::new("self", src, dst);
    c.set_initial_tokens(1);
    c.add_persistent_initial_name("tok").unwrap();
    sg.add_channel(c);
    (sg, s)
}

/// A two-scenario FSM fixture: one self-loop actor, scenarios `s1`
/// (exec 2) and `s2` (exec 5), FSM `q0(s1) -> q1(s2) -> q0`.
fn two_scenario_fsm_graph() -> Graph {
    let mut g = Graph::new("bench");
    let mut sg = ScenarioGraph::new("sg");
    let s1 = ScenarioId(0);
    let s2 = ScenarioId(1);
    let mut a = Actor::new("A", "t");
    a.add_port(Port::new("out", Direction::Out));
    a.add_port(Port::new("in", Direction::In));
    let a_id = sg.add_actor(a);
    for s in [s1, s2] {
        sg.actor_mut(a_id).ports_mut()[0].set_rate(s, 1);
        sg.actor_mut(a_id).ports_mut()[1].set_rate(s, 1);
    }
    sg.actor_mut(a_id).processor_mut("cpu").set_exec_time(s1, 2);
    sg.actor_mut(a_id).processor_mut("cpu").set_exec_time(s2, 5);
    sg.actor_mut(a_id).set_default_processor_type("cpu");
    let src = PortId { actor: a_id, slot: 0 };
    let dst = PortId { actor: a_id, slot: 1 };
    let mut c = Channel::new("self", src, dst);
    c.set_initial_tokens(1);
    c.add_persistent_initial_name("tok").unwrap();
    sg.add_channel(c);

    let sg_id = g.add_scenario_graph(sg);
    g.add_scenario(Scenario::new("s1", sg_id));
    g.add_scenario(Scenario::new("s2", sg_id));

    let mut fsm = Fsm::new();
    let q0 = fsm.add_state(s1);
    let q1 = fsm.add_state(s2);
    fsm.add_transition(q0, q1);
    fsm.add_transition(q1, q0);
    fsm.set_initial_state(q0);
    *g.fsm_mut() = fsm;
    g
}

fn computing_self_loop_repetition_vector(c: &mut criterion::Criterion) {
    let (sg, s) = self_loop_graph(3);
    c.bench_function("repetition vector of a self-loop scenario graph", |b| {
        b.iter(|| repetition::compute_repetition_vector(&sg, s))
    });
}

fn multiplying_max_plus_matrices(c: &mut criterion::Criterion) {
    let n = 64;
    let mut a = MPMatrix::bottom(n, n);
    let mut bmat = MPMatrix::bottom(n, n);
    for r in 0..n {
        for col in 0..n {
            a.set(r, col, ((r + col) % 7) as f64);
            bmat.set(r, col, ((r * col) % 5) as f64);
        }
    }
    c.bench_function("multiply two 64x64 max-plus matrices", |b| b.iter(|| a.mul(&bmat).unwrap()));
}

fn computing_max_cycle_mean(c: &mut criterion::Criterion) {
    let n = 32;
    let mut a = MPMatrix::bottom(n, n);
    for i in 0..n {
        a.set(i, (i + 1) % n, (i % 5) as f64);
    }
    c.bench_function("compute MCM of a 32-node cycle graph", |b| b.iter(|| a.mcm()));
}

fn exploring_self_loop_symbolically(c: &mut criterion::Criterion) {
    let (sg, s) = self_loop_graph(3);
    c.bench_function("derive the max-plus matrix of a self-loop scenario", |b| {
        b.iter(|| explore::explore_symbolic(&sg, s, "bench").unwrap())
    });
}

fn exploring_self_loop_numerically(c: &mut criterion::Criterion) {
    let (sg, s) = self_loop_graph(3);
    let cancel = CancellationToken::new();
    c.bench_function("numeric state exploration of a self-loop scenario", |b| {
        b.iter(|| explore::explore_forward(&sg, s, "bench", &cancel).unwrap())
    });
}

fn minimizing_two_scenario_automaton(c: &mut criterion::Criterion) {
    let g = two_scenario_fsm_graph();
    let edge_labeled = automaton::edge_labeled_automaton(&g);
    c.bench_function("minimize a two-state edge-labelled scenario automaton", |b| b.iter(|| edge_labeled.minimize()));
}

fn computing_two_scenario_throughput(c: &mut criterion::Criterion) {
    let g = two_scenario_fsm_graph();
    let cancel = CancellationToken::new();
    c.bench_function("strongly consistent throughput of a two-scenario FSM", |b| {
        b.iter(|| throughput::strongly_consistent_throughput(&g, AutomatonVariant::Combined, &cancel).unwrap())
    });
}

//! End-to-end scenarios for the three solver flavors.

use std::collections::HashSet;

use mapf_milp::detector::{detect_conflict, DEFAULT_TOLERANCE};
use mapf_milp::paths::{AgentItinerary, DiscreteItinerary};
use mapf_milp::scenario;
use mapf_milp::{
    mapf_continuous_time, mapf_continuous_time_dynamic_conflict, mapf_discrete_time, MapfError,
    Network, VertexVisit,
};

fn assert_conflict_free(paths: &[AgentItinerary]) {
    assert_eq!(detect_conflict(paths, DEFAULT_TOLERANCE, true), None);
}

fn arrival_sum(paths: &[AgentItinerary]) -> f64 {
    paths.iter().map(|path| path.arrival()).sum()
}

#[test]
fn continuous_parallel_lines_are_independent() {
    let config = scenario::parallel_lines(3).unwrap();
    let solution = mapf_continuous_time(&config).unwrap();

    for (i, path) in solution.paths.iter().enumerate() {
        assert_eq!(path.vertex_sequence(), vec![i, 3 + i]);
        // Departure 0, unit dwell at the source, unit travel.
        assert!((path.arrival() - 2.0).abs() < 1e-4);
    }
    assert_conflict_free(&solution.paths);

    // Per agent: one edge, two vertices, arrival time 2.
    assert!((solution.objective - 3.0 * 5.0).abs() < 1e-3);
}

#[test]
fn continuous_resolve_is_idempotent() {
    let config = scenario::parallel_lines(3).unwrap();
    let first = mapf_continuous_time(&config).unwrap();
    let second = mapf_continuous_time(&config).unwrap();
    assert!((first.objective - second.objective).abs() < 1e-6);
}

#[test]
fn lp_relaxation_matches_integral_optimum_on_disjoint_lanes() {
    let config = scenario::parallel_lines(3).unwrap();
    let integral = mapf_continuous_time(&config).unwrap();

    let mut relaxed_config = config.clone();
    relaxed_config.integer = false;
    let relaxed = mapf_continuous_time(&relaxed_config).unwrap();

    // The relaxation is a lower bound; on disjoint lanes the flow polytope
    // is integral, so the bound is tight.
    assert!(relaxed.objective <= integral.objective + 1e-4);
    assert!((relaxed.objective - integral.objective).abs() < 1e-3);
}

#[test]
fn continuous_two_branch_merge_serializes_the_shared_corridor() {
    let config = scenario::two_branch_merge().unwrap();
    let solution = mapf_continuous_time(&config).unwrap();

    let sequences: Vec<_> = solution
        .paths
        .iter()
        .map(|path| path.vertex_sequence())
        .collect();
    assert_eq!(
        sequences,
        vec![vec![0, 1, 5, 6], vec![3, 1, 5, 7], vec![7, 5, 1, 2]]
    );
    assert_conflict_free(&solution.paths);
    assert!(arrival_sum(&solution.paths) <= 21.0 + 1e-3);
}

#[test]
fn dynamic_two_branch_merge_generates_cuts_and_converges() {
    let config = scenario::two_branch_merge().unwrap();
    let solution = mapf_continuous_time_dynamic_conflict(&config).unwrap();

    let sequences: Vec<_> = solution
        .paths
        .iter()
        .map(|path| path.vertex_sequence())
        .collect();
    assert_eq!(
        sequences,
        vec![vec![0, 1, 5, 6], vec![3, 1, 5, 7], vec![7, 5, 1, 2]]
    );
    assert_conflict_free(&solution.paths);
    assert!(arrival_sum(&solution.paths) <= 21.1);

    // The three routes all funnel through vertices 1 and 5, so the loop
    // cannot exit on the conflict-free relaxation.
    assert!(solution.stats.milp_solves >= 2);
    assert!(solution.stats.vertex_cuts + solution.stats.edge_cuts >= 1);
}

#[test]
fn dynamic_parallel_lines_skip_the_timing_model() {
    let config = scenario::parallel_lines(4).unwrap();
    let solution = mapf_continuous_time_dynamic_conflict(&config).unwrap();

    assert_eq!(solution.stats.milp_solves, 1);
    assert_eq!(solution.stats.vertex_cuts, 0);
    assert_conflict_free(&solution.paths);
    for (i, path) in solution.paths.iter().enumerate() {
        assert_eq!(path.vertex_sequence(), vec![i, 4 + i]);
        assert!((path.arrival() - 2.0).abs() < 1e-6);
    }
}

#[test]
fn continuous_star_linearizes_hub_visits() {
    let config = scenario::directional_star(3).unwrap();
    let solution = mapf_continuous_time(&config).unwrap();

    assert_conflict_free(&solution.paths);
    for (i, path) in solution.paths.iter().enumerate() {
        assert_eq!(path.vertex_sequence(), vec![1 + i, 0, 4 + i]);
    }

    // Three two-unit dwells at the hub cannot overlap, so the last agent
    // enters the hub at 6 or later and arrives at 9 or later.
    let makespan = solution
        .paths
        .iter()
        .map(|path| path.arrival())
        .fold(0.0, f64::max);
    assert!(makespan >= 9.0 - 1e-3);
}

#[test]
fn heuristic_cuts_stay_conflict_free_on_the_star() {
    let mut config = scenario::directional_star(3).unwrap();
    config.heuristic_conflict = true;
    let solution = mapf_continuous_time_dynamic_conflict(&config).unwrap();

    // Heuristic mode only promises feasibility, not optimality.
    assert_conflict_free(&solution.paths);
    for (i, path) in solution.paths.iter().enumerate() {
        assert_eq!(path.vertex_sequence(), vec![1 + i, 0, 4 + i]);
    }
}

#[test]
fn dynamic_grid_cross_generates_vertex_cuts() {
    let config = scenario::grid_cross().unwrap();
    let solution = mapf_continuous_time_dynamic_conflict(&config).unwrap();

    assert_conflict_free(&solution.paths);
    assert!(solution.stats.vertex_cuts >= 1);
}

#[test]
fn continuous_grid_cross_is_conflict_free() {
    let config = scenario::grid_cross().unwrap();
    let solution = mapf_continuous_time(&config).unwrap();
    assert_conflict_free(&solution.paths);
}

#[test]
fn dynamic_wheel_pass_uses_direct_edges() {
    let config = scenario::wheel_pass(4).unwrap();
    let solution = mapf_continuous_time_dynamic_conflict(&config).unwrap();

    assert_conflict_free(&solution.paths);
    for (path, agent) in solution.paths.iter().zip(&config.agents) {
        assert_eq!(path.vertex_sequence(), vec![agent.source, agent.target]);
    }
    // One shift around the wheel needs at most one ordering per vertex.
    assert!(solution.stats.vertex_cuts + solution.stats.edge_cuts <= 8);
}

#[test]
fn undersized_big_m_surfaces_as_a_solver_error() {
    let mut config = scenario::parallel_lines(2).unwrap();
    // Arrivals need to reach 2.0; a horizon of 0.5 cuts them all off.
    config.big_m = Some(0.5);
    assert!(mapf_continuous_time(&config).is_err());
}

#[test]
fn discrete_departure_beyond_horizon_is_rejected() {
    let mut config = scenario::parallel_lines(2).unwrap();
    config.agents[0].departure = 10.0;
    let err = mapf_discrete_time(&config).unwrap_err();
    assert!(matches!(err, MapfError::HorizonTooSmall { agent: 0, .. }));
}

/// Vertex cells occupied by an agent: dwells plus the head vertex of every
/// traversed edge, matching the discrete conflict rows.
fn vertex_cells(path: &DiscreteItinerary) -> HashSet<(usize, usize)> {
    path.vertices
        .iter()
        .copied()
        .chain(path.edges.iter().map(|&(t, (_, v))| (t, v)))
        .collect()
}

fn edge_cells(path: &DiscreteItinerary) -> HashSet<(usize, usize, usize)> {
    path.edges.iter().map(|&(t, (u, v))| (t, u, v)).collect()
}

fn swap_cells(path: &DiscreteItinerary) -> HashSet<(usize, usize, usize)> {
    path.edges
        .iter()
        .map(|&(t, (u, v))| (t, u.min(v), u.max(v)))
        .collect()
}

fn assert_discrete_disjoint(paths: &[DiscreteItinerary]) {
    for i in 0..paths.len() {
        for j in i + 1..paths.len() {
            assert!(
                vertex_cells(&paths[i]).is_disjoint(&vertex_cells(&paths[j])),
                "agents {i} and {j} share a vertex cell"
            );
            assert!(
                edge_cells(&paths[i]).is_disjoint(&edge_cells(&paths[j])),
                "agents {i} and {j} share an edge cell"
            );
            assert!(
                swap_cells(&paths[i]).is_disjoint(&swap_cells(&paths[j])),
                "agents {i} and {j} swap an edge"
            );
        }
    }
}

#[test]
fn discrete_parallel_lines_pay_per_step() {
    let config = scenario::parallel_lines(3).unwrap();
    let solution = mapf_discrete_time(&config).unwrap();

    // Unit costs and per-step exclusivity: every agent pays exactly one unit
    // per step over the whole horizon of |E| = 6 steps.
    assert!((solution.objective - 18.0).abs() < 1e-3);
    assert_discrete_disjoint(&solution.paths);

    for (i, path) in solution.paths.iter().enumerate() {
        let lane: Vec<_> = path
            .edges
            .iter()
            .filter(|&&(_, e)| e == (i, 3 + i))
            .collect();
        assert_eq!(lane.len(), 1, "agent {i} should take its lane exactly once");
    }
}

#[test]
fn discrete_diamond_crossing_stays_disjoint() {
    let network = Network::undirected(4, &[(0, 1), (1, 2), (2, 3), (3, 0)]).unwrap();
    let config = mapf_milp::MapfConfig::new(network, &[0, 1], &[2, 3]).unwrap();
    let solution = mapf_discrete_time(&config).unwrap();

    assert!((solution.objective - 16.0).abs() < 1e-3);
    assert_discrete_disjoint(&solution.paths);

    for (path, agent) in solution.paths.iter().zip(&config.agents) {
        let visited: Vec<_> = path.vertices.iter().map(|&(_, v)| v).collect();
        assert!(visited.contains(&agent.target));
    }
}

#[test]
fn discrete_vertex_binding_marches_without_slack() {
    let mut config = scenario::parallel_lines(3).unwrap();
    config.vertex_binding = true;
    let solution = mapf_discrete_time(&config).unwrap();

    // In binding mode an agent departs at its departure step, pays its lane
    // edge, pays the arrival vertex, and is gone; nothing dwells over the
    // rest of the horizon.
    assert!((solution.objective - 6.0).abs() < 1e-3);
    assert_discrete_disjoint(&solution.paths);

    for (i, path) in solution.paths.iter().enumerate() {
        assert_eq!(path.edges, vec![(0, (i, 3 + i))]);
        assert_eq!(path.vertices, vec![(1, 3 + i)]);
    }
}

#[test]
fn discrete_forced_vertex_payment_stays_feasible() {
    let mut config = scenario::parallel_lines(3).unwrap();
    config.vertex_visit = VertexVisit::Yes;
    let horizon = config.effective_time_duration();
    let solution = mapf_discrete_time(&config).unwrap();

    // Forcing the dwell after every inbound edge changes nothing about the
    // per-step payment total on disjoint lanes.
    assert!((solution.objective - 18.0).abs() < 1e-3);
    assert_discrete_disjoint(&solution.paths);

    for path in &solution.paths {
        // Every traversal is followed by a paid dwell at its head vertex.
        for &(t, (_, v)) in &path.edges {
            if t + 1 < horizon {
                assert!(path.vertices.contains(&(t + 1, v)));
            }
        }
    }
}

#[test]
fn discrete_free_pass_through_stays_disjoint() {
    let network = Network::undirected(4, &[(0, 1), (1, 2), (2, 3), (3, 0)]).unwrap();
    let mut config = mapf_milp::MapfConfig::new(network, &[0, 1], &[2, 3]).unwrap();
    config.vertex_visit = VertexVisit::No;
    let solution = mapf_discrete_time(&config).unwrap();

    // Dropping the payment rule relaxes the model; exclusivity still makes
    // every agent pay one unit per step.
    assert!((solution.objective - 16.0).abs() < 1e-3);
    assert_discrete_disjoint(&solution.paths);

    for (path, agent) in solution.paths.iter().zip(&config.agents) {
        let visited: Vec<_> = path.vertices.iter().map(|&(_, v)| v).collect();
        assert!(visited.contains(&agent.target));
    }
}

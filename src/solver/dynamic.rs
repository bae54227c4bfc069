use std::collections::HashMap;
use std::time::Instant;

use good_lp::{constraint, variable, ProblemVariables, Solution, SolverModel, Variable};
use good_lp::WithInitialSolution;
use tracing::{debug, info};

use crate::detector::{
    detect_edge_conflict, detect_vertex_conflict, overlaps, Conflict, DEFAULT_TOLERANCE,
};
use crate::error::MapfError;
use crate::model::vars::{SelectionVars, TimingVars};
use crate::model::{connectivity, objective, timing};
use crate::network::Edge;
use crate::paths::{
    analytic_timing, parse_continuous, parse_selection_walks, AgentItinerary, DynamicSolution,
};
use crate::problem::MapfConfig;
use crate::stat::SolveStats;

/// A pairwise ordering constraint generated from an observed conflict.
///
/// Disjunctive cuts re-materialize with a fresh binary pointer on every
/// rebuild; `Before` cuts are unconditional, used when the conflict vertex is
/// the waiting agent's target or when heuristic mode commits to one branch.
#[derive(Debug, Clone, Copy)]
enum Cut {
    VertexOrder {
        vertex: usize,
        first: usize,
        second: usize,
        exit_first: Edge,
        exit_second: Edge,
    },
    VertexBefore {
        vertex: usize,
        waiter: usize,
        leaver: usize,
        leaver_exit: Edge,
    },
    EdgeOrder {
        first: usize,
        second: usize,
        edge_first: Edge,
        edge_second: Edge,
    },
    EdgeBefore {
        waiter: usize,
        leaver: usize,
        waiter_edge: Edge,
        leaver_edge: Edge,
    },
}

impl Cut {
    fn needs_pointer(&self) -> bool {
        matches!(self, Cut::VertexOrder { .. } | Cut::EdgeOrder { .. })
    }
}

/// Variable values of the previous iteration, keyed the same way the bundles
/// key their variables so a rebuilt model can be warm-started.
struct Snapshot {
    x: HashMap<(usize, Edge), f64>,
    y: HashMap<(usize, usize), f64>,
    t_v: HashMap<(usize, usize), f64>,
    t_e: HashMap<(usize, Edge), f64>,
    pointers: Vec<Option<f64>>,
}

/// Continuous-time MAPF by lazy cut generation.
///
/// Solves the conflict-free cost relaxation first; if the parallel shortest
/// paths are already vertex- and edge-disjoint their analytic timing is the
/// answer. Otherwise the timing model is built and the loop alternates
/// solving, detecting the first conflict, and appending one ordering cut,
/// until the detector is silent. Constraints only accumulate, so the best
/// objective tightens monotonically.
pub fn mapf_continuous_time_dynamic_conflict(
    config: &MapfConfig,
) -> Result<DynamicSolution, MapfError> {
    config.validate()?;
    let start = Instant::now();
    let mut stats = SolveStats::default();

    let (walks, relaxed_objective) = solve_relaxation(config, &mut stats)?;

    let vertex_visits: Vec<Vec<usize>> = config
        .agents
        .iter()
        .zip(&walks)
        .map(|(agent, walk)| {
            std::iter::once(agent.source)
                .chain(walk.iter().map(|&(_, v)| v))
                .collect()
        })
        .collect();
    if overlaps(&vertex_visits).is_empty() && overlaps(&walks).is_empty() {
        info!("parallel shortest paths are disjoint; no timing model needed");
        stats.time_ms = start.elapsed().as_millis() as usize;
        return Ok(DynamicSolution {
            paths: analytic_timing(config, &walks),
            objective: relaxed_objective,
            stats,
        });
    }

    let big_m = config.effective_big_m();
    let epsilon = config.effective_epsilon();
    let mut cuts: Vec<Cut> = Vec::new();
    let mut warm: Option<Snapshot> = None;

    loop {
        let (paths, snapshot, objective_value) =
            solve_timed(config, &cuts, warm.as_ref(), big_m, epsilon, &mut stats)?;

        if let Some(conflict) = detect_vertex_conflict(&paths, DEFAULT_TOLERANCE) {
            debug!(?conflict, cuts = cuts.len(), "resolving vertex conflict");
            cuts.push(vertex_cut(config, &paths, &conflict, &snapshot, epsilon));
            stats.vertex_cuts += 1;
            warm = Some(snapshot);
            continue;
        }

        if let Some(conflict) =
            detect_edge_conflict(&paths, DEFAULT_TOLERANCE, config.swap_constraint)
        {
            debug!(?conflict, cuts = cuts.len(), "resolving edge conflict");
            if let Conflict::Edge { swap: true, .. } = conflict {
                stats.swap_cuts += 1;
            }
            cuts.push(edge_cut(config, &conflict, &snapshot, epsilon));
            stats.edge_cuts += 1;
            warm = Some(snapshot);
            continue;
        }

        stats.time_ms = start.elapsed().as_millis() as usize;
        info!(
            objective = objective_value,
            milp_solves = stats.milp_solves,
            vertex_cuts = stats.vertex_cuts,
            edge_cuts = stats.edge_cuts,
            "dynamic-conflict loop converged"
        );
        return Ok(DynamicSolution {
            paths,
            objective: objective_value,
            stats,
        });
    }
}

/// Cost-only relaxation: connectivity and the selection objective, no
/// timing. Returns the per-agent walks and the relaxed objective.
fn solve_relaxation(
    config: &MapfConfig,
    stats: &mut SolveStats,
) -> Result<(Vec<Vec<Edge>>, f64), MapfError> {
    let mut problem = ProblemVariables::new();
    let selection = SelectionVars::new(&mut problem, config);
    let total_cost = objective::selection_cost(config, &selection);
    let mut milp = super::into_model(problem, total_cost, config.timeout);
    connectivity::install(&mut milp, config, &selection);

    let solved = milp.solve()?;
    stats.milp_solves += 1;
    let walks = parse_selection_walks(&solved, config, &selection)?;
    let objective_value = objective::selection_cost_value(&solved, config, &selection);
    Ok((walks, objective_value))
}

/// One iteration of the loop: rebuild the timing model with every
/// accumulated cut, warm-start from the previous values, solve, and parse.
fn solve_timed(
    config: &MapfConfig,
    cuts: &[Cut],
    warm: Option<&Snapshot>,
    big_m: f64,
    epsilon: f64,
    stats: &mut SolveStats,
) -> Result<(Vec<AgentItinerary>, Snapshot, f64), MapfError> {
    let mut problem = ProblemVariables::new();
    let selection = SelectionVars::new(&mut problem, config);
    let times = TimingVars::new(&mut problem, config, big_m);
    let pointers: Vec<Option<Variable>> = cuts
        .iter()
        .map(|cut| {
            cut.needs_pointer().then(|| {
                problem.add(if config.integer {
                    variable().binary()
                } else {
                    variable().min(0.0).max(1.0)
                })
            })
        })
        .collect();

    let total_cost =
        objective::selection_cost(config, &selection) + objective::arrival_times(config, &times);
    let mut milp = super::into_model(problem, total_cost, config.timeout);

    connectivity::install(&mut milp, config, &selection);
    timing::install(&mut milp, config, &selection, &times, big_m);
    for (cut, pointer) in cuts.iter().zip(&pointers) {
        install_cut(&mut milp, &times, cut, *pointer, big_m, epsilon);
    }

    if let Some(snapshot) = warm {
        milp = milp.with_initial_solution(initial_values(&selection, &times, &pointers, snapshot));
    }

    let solved = milp.solve()?;
    stats.milp_solves += 1;

    let paths = parse_continuous(&solved, config, &selection, &times);
    let snapshot = take_snapshot(&solved, &selection, &times, &pointers);
    let objective_value = objective::selection_cost_value(&solved, config, &selection)
        + objective::arrival_value(&solved, config, &times);
    Ok((paths, snapshot, objective_value))
}

fn install_cut(
    model: &mut impl SolverModel,
    times: &TimingVars,
    cut: &Cut,
    pointer: Option<Variable>,
    big_m: f64,
    epsilon: f64,
) {
    match *cut {
        Cut::VertexOrder {
            vertex,
            first,
            second,
            exit_first,
            exit_second,
        } => {
            let delta = pointer.unwrap();
            let arrive_first = times.vertex(first, vertex);
            let arrive_second = times.vertex(second, vertex);
            let leave_first = times.edge(first, exit_first);
            let leave_second = times.edge(second, exit_second);
            model.add_constraint(constraint!(
                arrive_first >= leave_second + epsilon - big_m * delta
            ));
            model.add_constraint(constraint!(
                arrive_second >= leave_first + epsilon - big_m + big_m * delta
            ));
        }
        Cut::VertexBefore {
            vertex,
            waiter,
            leaver,
            leaver_exit,
        } => {
            let arrive = times.vertex(waiter, vertex);
            let leave = times.edge(leaver, leaver_exit);
            model.add_constraint(constraint!(arrive >= leave + epsilon));
        }
        Cut::EdgeOrder {
            first,
            second,
            edge_first,
            edge_second,
        } => {
            let delta = pointer.unwrap();
            let enter_first = times.edge(first, edge_first);
            let enter_second = times.edge(second, edge_second);
            let done_first = times.vertex(first, edge_first.1);
            let done_second = times.vertex(second, edge_second.1);
            model.add_constraint(constraint!(
                enter_first >= done_second + epsilon - big_m * delta
            ));
            model.add_constraint(constraint!(
                enter_second >= done_first + epsilon - big_m + big_m * delta
            ));
        }
        Cut::EdgeBefore {
            waiter,
            leaver,
            waiter_edge,
            leaver_edge,
        } => {
            let enter = times.edge(waiter, waiter_edge);
            let done = times.vertex(leaver, leaver_edge.1);
            model.add_constraint(constraint!(enter >= done + epsilon));
        }
    }
}

/// Ordering cut for a vertex conflict. The agents' selected outbound edges
/// come from the incumbent paths; an agent whose target is the contested
/// vertex never leaves it, so the other agent must pass first,
/// unconditionally.
fn vertex_cut(
    config: &MapfConfig,
    paths: &[AgentItinerary],
    conflict: &Conflict,
    snapshot: &Snapshot,
    epsilon: f64,
) -> Cut {
    let &Conflict::Vertex {
        vertex,
        agent_1,
        agent_2,
    } = conflict
    else {
        unreachable!()
    };

    let exit_1 = exit_edge(&paths[agent_1], vertex);
    let exit_2 = exit_edge(&paths[agent_2], vertex);
    match (exit_1, exit_2) {
        (None, Some(exit)) => Cut::VertexBefore {
            vertex,
            waiter: agent_1,
            leaver: agent_2,
            leaver_exit: exit,
        },
        (Some(exit), None) => Cut::VertexBefore {
            vertex,
            waiter: agent_2,
            leaver: agent_1,
            leaver_exit: exit,
        },
        (Some(exit_1), Some(exit_2)) => {
            if config.heuristic_conflict {
                // Commit to the ordering that is cheapest to satisfy under
                // the incumbent solution.
                let wait_1 = violation(
                    snapshot.t_e[&(agent_2, exit_2)] + epsilon - snapshot.t_v[&(agent_1, vertex)],
                );
                let wait_2 = violation(
                    snapshot.t_e[&(agent_1, exit_1)] + epsilon - snapshot.t_v[&(agent_2, vertex)],
                );
                if wait_1 <= wait_2 {
                    Cut::VertexBefore {
                        vertex,
                        waiter: agent_1,
                        leaver: agent_2,
                        leaver_exit: exit_2,
                    }
                } else {
                    Cut::VertexBefore {
                        vertex,
                        waiter: agent_2,
                        leaver: agent_1,
                        leaver_exit: exit_1,
                    }
                }
            } else {
                Cut::VertexOrder {
                    vertex,
                    first: agent_1,
                    second: agent_2,
                    exit_first: exit_1,
                    exit_second: exit_2,
                }
            }
        }
        // Distinct targets are enforced at validation, so at most one agent
        // can park on the contested vertex.
        (None, None) => unreachable!(),
    }
}

/// Ordering cut for an edge or swap conflict; for a swap the second agent's
/// constraint is built against the reversed edge.
fn edge_cut(config: &MapfConfig, conflict: &Conflict, snapshot: &Snapshot, epsilon: f64) -> Cut {
    let &Conflict::Edge {
        edge,
        agent_1,
        agent_2,
        swap,
    } = conflict
    else {
        unreachable!()
    };

    let edge_1 = edge;
    let edge_2 = if swap { (edge.1, edge.0) } else { edge };
    if config.heuristic_conflict {
        let wait_1 =
            violation(snapshot.t_v[&(agent_2, edge_2.1)] + epsilon - snapshot.t_e[&(agent_1, edge_1)]);
        let wait_2 =
            violation(snapshot.t_v[&(agent_1, edge_1.1)] + epsilon - snapshot.t_e[&(agent_2, edge_2)]);
        if wait_1 <= wait_2 {
            Cut::EdgeBefore {
                waiter: agent_1,
                leaver: agent_2,
                waiter_edge: edge_1,
                leaver_edge: edge_2,
            }
        } else {
            Cut::EdgeBefore {
                waiter: agent_2,
                leaver: agent_1,
                waiter_edge: edge_2,
                leaver_edge: edge_1,
            }
        }
    } else {
        Cut::EdgeOrder {
            first: agent_1,
            second: agent_2,
            edge_first: edge_1,
            edge_second: edge_2,
        }
    }
}

fn exit_edge(path: &AgentItinerary, vertex: usize) -> Option<Edge> {
    path.edges
        .iter()
        .find(|&&(_, (u, _))| u == vertex)
        .map(|&(_, e)| e)
}

fn violation(gap: f64) -> f64 {
    gap.max(0.0)
}

fn initial_values(
    selection: &SelectionVars,
    times: &TimingVars,
    pointers: &[Option<Variable>],
    snapshot: &Snapshot,
) -> Vec<(Variable, f64)> {
    let mut values = Vec::new();
    for (key, &var) in &selection.x {
        if let Some(&value) = snapshot.x.get(key) {
            values.push((var, value));
        }
    }
    for (key, &var) in &selection.y {
        if let Some(&value) = snapshot.y.get(key) {
            values.push((var, value));
        }
    }
    for (key, &var) in &times.t_v {
        if let Some(&value) = snapshot.t_v.get(key) {
            values.push((var, value));
        }
    }
    for (key, &var) in &times.t_e {
        if let Some(&value) = snapshot.t_e.get(key) {
            values.push((var, value));
        }
    }
    for (pointer, previous) in pointers.iter().zip(&snapshot.pointers) {
        if let (Some(var), Some(value)) = (pointer, previous) {
            values.push((*var, *value));
        }
    }
    values
}

fn take_snapshot(
    solved: &impl Solution,
    selection: &SelectionVars,
    times: &TimingVars,
    pointers: &[Option<Variable>],
) -> Snapshot {
    Snapshot {
        x: selection
            .x
            .iter()
            .map(|(&key, &var)| (key, solved.value(var)))
            .collect(),
        y: selection
            .y
            .iter()
            .map(|(&key, &var)| (key, solved.value(var)))
            .collect(),
        t_v: times
            .t_v
            .iter()
            .map(|(&key, &var)| (key, solved.value(var)))
            .collect(),
        t_e: times
            .t_e
            .iter()
            .map(|(&key, &var)| (key, solved.value(var)))
            .collect(),
        pointers: pointers
            .iter()
            .map(|pointer| pointer.map(|var| solved.value(var)))
            .collect(),
    }
}

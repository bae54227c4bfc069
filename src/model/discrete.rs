use good_lp::{constraint, Expression, SolverModel};
use tracing::debug;

use crate::model::vars::DiscreteVars;
use crate::problem::{MapfConfig, VertexVisit};

/// Installs the time-indexed formulation: eventual departure and arrival,
/// per-step flow, per-step exclusivity, the vertex-payment knob, and the
/// one-occupant conflict rows.
pub fn install(model: &mut impl SolverModel, config: &MapfConfig, vars: &DiscreteVars) {
    let rows = install_flow(model, config, vars) + install_conflicts(model, config, vars);
    debug!(rows, "installed discrete constraints");
}

fn install_flow(model: &mut impl SolverModel, config: &MapfConfig, vars: &DiscreteVars) -> usize {
    let mut rows = 0;
    let horizon = vars.horizon;

    for agent in &config.agents {
        let a = agent.id;
        let departure = vars.departures[a];

        // The source is left exactly once over the horizon, and the target
        // entered exactly once and never left.
        let source_net: Expression = vars
            .steps(a)
            .map(|t| outflow(config, vars, a, agent.source, t) - inflow(config, vars, a, agent.source, t))
            .sum();
        model.add_constraint(constraint!(source_net == 1));

        let target_touch: Expression = vars
            .steps(a)
            .map(|t| inflow(config, vars, a, agent.target, t) + outflow(config, vars, a, agent.target, t))
            .sum();
        model.add_constraint(constraint!(target_touch == 1));
        rows += 2;

        if config.vertex_binding {
            rows += install_binding_mode(model, config, vars, a, agent.target);
        } else {
            rows += install_dwell_mode(model, config, vars, a);
        }

        // Vertex-payment policy: entering v via an inbound edge at step t
        // forces a paid dwell at t + 1.
        if !config.vertex_binding {
            for v in config.network.vertices() {
                let enforce = match config.vertex_visit {
                    VertexVisit::Yes => true,
                    VertexVisit::No => false,
                    VertexVisit::Auto => config.vertex_cost.get(a, v) > 0.0,
                };
                if !enforce {
                    continue;
                }
                for t in departure..horizon.saturating_sub(1) {
                    let incoming = inflow(config, vars, a, v, t);
                    let dwell = vars.y(a, t + 1, v);
                    model.add_constraint(constraint!(dwell >= incoming));
                    rows += 1;
                }
            }
        }
    }
    rows
}

/// Default mode: an agent at `v` at step `t` is either still at `v` at
/// `t + 1` or has started leaving on an outgoing edge at `t + 1`, and it
/// occupies exactly one vertex or edge per step.
fn install_dwell_mode(
    model: &mut impl SolverModel,
    config: &MapfConfig,
    vars: &DiscreteVars,
    a: usize,
) -> usize {
    let mut rows = 0;
    let departure = vars.departures[a];

    for v in config.network.vertices() {
        for t in departure..vars.horizon.saturating_sub(1) {
            let present = Expression::from(vars.y(a, t, v)) + inflow(config, vars, a, v, t);
            let continued =
                Expression::from(vars.y(a, t + 1, v)) + outflow(config, vars, a, v, t + 1);
            model.add_constraint(constraint!(present == continued));
            rows += 1;
        }
    }

    for t in vars.steps(a) {
        let occupied = occupancy(config, vars, a, t);
        model.add_constraint(constraint!(occupied == 1));
        rows += 1;
    }
    rows
}

/// Alternative strict coupling: each step is always-edge or always-vertex,
/// a vertex visit is exactly the step after the inbound traversal, and the
/// agent moves on immediately. The continue-equation is skipped at the
/// target, where the walk ends.
fn install_binding_mode(
    model: &mut impl SolverModel,
    config: &MapfConfig,
    vars: &DiscreteVars,
    a: usize,
    target: usize,
) -> usize {
    let mut rows = 0;
    let departure = vars.departures[a];

    for v in config.network.vertices() {
        let y_start = vars.y(a, departure, v);
        model.add_constraint(constraint!(y_start == 0));
        rows += 1;

        for t in departure + 1..vars.horizon {
            let y_t = vars.y(a, t, v);
            let entered = inflow(config, vars, a, v, t - 1);
            model.add_constraint(constraint!(y_t == entered));
            rows += 1;

            if v != target {
                let leaving = outflow(config, vars, a, v, t);
                let entered = inflow(config, vars, a, v, t - 1);
                model.add_constraint(constraint!(leaving == entered));
                rows += 1;
            }
        }
    }

    for t in vars.steps(a) {
        let visits: Expression = config
            .network
            .vertices()
            .map(|v| Expression::from(vars.y(a, t, v)))
            .sum();
        model.add_constraint(constraint!(visits <= 1));
        rows += 1;
    }
    rows
}

/// One occupant per `(v, t)` cell, per `(e, t)` cell, and per anti-parallel
/// edge pair and step.
fn install_conflicts(
    model: &mut impl SolverModel,
    config: &MapfConfig,
    vars: &DiscreteVars,
) -> usize {
    let mut rows = 0;
    let agents_at = |t: usize| {
        (0..config.num_agents()).filter(move |&a| vars.departures[a] <= t)
    };

    for t in 0..vars.horizon {
        for v in config.network.vertices() {
            let occupants: Expression = agents_at(t)
                .map(|a| Expression::from(vars.y(a, t, v)) + inflow(config, vars, a, v, t))
                .sum();
            model.add_constraint(constraint!(occupants <= 1));
            rows += 1;
        }

        for &edge in config.network.edges() {
            let travellers: Expression = agents_at(t)
                .map(|a| Expression::from(vars.x(a, t, edge)))
                .sum();
            model.add_constraint(constraint!(travellers <= 1));
            rows += 1;
        }

        if config.swap_constraint {
            for &(u, v) in config.network.edges() {
                // Canonical orientation so each anti-parallel pair gets one row.
                if u >= v || !config.network.has_reverse((u, v)) {
                    continue;
                }
                let both_directions: Expression = agents_at(t)
                    .map(|a| Expression::from(vars.x(a, t, (u, v))) + vars.x(a, t, (v, u)))
                    .sum();
                model.add_constraint(constraint!(both_directions <= 1));
                rows += 1;
            }
        }
    }
    rows
}

pub(crate) fn outflow(
    config: &MapfConfig,
    vars: &DiscreteVars,
    agent: usize,
    vertex: usize,
    step: usize,
) -> Expression {
    config
        .network
        .out_neighbors(vertex)
        .iter()
        .map(|&w| Expression::from(vars.x(agent, step, (vertex, w))))
        .sum()
}

pub(crate) fn inflow(
    config: &MapfConfig,
    vars: &DiscreteVars,
    agent: usize,
    vertex: usize,
    step: usize,
) -> Expression {
    config
        .network
        .in_neighbors(vertex)
        .iter()
        .map(|&u| Expression::from(vars.x(agent, step, (u, vertex))))
        .sum()
}

fn occupancy(config: &MapfConfig, vars: &DiscreteVars, agent: usize, step: usize) -> Expression {
    let vertices: Expression = config
        .network
        .vertices()
        .map(|v| Expression::from(vars.y(agent, step, v)))
        .sum();
    let edges: Expression = config
        .network
        .edges()
        .iter()
        .map(|&e| Expression::from(vars.x(agent, step, e)))
        .sum();
    vertices + edges
}

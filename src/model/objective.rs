use good_lp::{Expression, Solution};

use crate::model::vars::{DiscreteVars, SelectionVars, TimingVars};
use crate::problem::MapfConfig;

/// Base objective: weighted edge selections plus weighted vertex visits,
/// with costs resolved through the right-align accessors.
pub fn selection_cost(config: &MapfConfig, vars: &SelectionVars) -> Expression {
    let mut total = Expression::from(0.0);
    for agent in 0..config.num_agents() {
        for &edge in config.network.edges() {
            total += config.edge_cost.get(agent, edge) * vars.x(agent, edge);
        }
        for vertex in config.network.vertices() {
            total += config.vertex_cost.get(agent, vertex) * vars.y(agent, vertex);
        }
    }
    total
}

/// Timing term: the sum of every agent's arrival time at its own target.
/// Tighter than summing all `t` variables, which would penalize unused ones.
pub fn arrival_times(config: &MapfConfig, timing: &TimingVars) -> Expression {
    config
        .agents
        .iter()
        .map(|agent| Expression::from(timing.vertex(agent.id, agent.target)))
        .sum()
}

/// Discrete objective: per-step occupancy costs summed over the horizon.
pub fn discrete_cost(config: &MapfConfig, vars: &DiscreteVars) -> Expression {
    let mut total = Expression::from(0.0);
    for agent in 0..config.num_agents() {
        for step in vars.steps(agent) {
            for &edge in config.network.edges() {
                total += config.edge_cost.get(agent, edge) * vars.x(agent, step, edge);
            }
            for vertex in config.network.vertices() {
                total += config.vertex_cost.get(agent, vertex) * vars.y(agent, step, vertex);
            }
        }
    }
    total
}

/// Value of [`selection_cost`] under a solved model.
pub fn selection_cost_value(
    solution: &impl Solution,
    config: &MapfConfig,
    vars: &SelectionVars,
) -> f64 {
    let mut total = 0.0;
    for agent in 0..config.num_agents() {
        for &edge in config.network.edges() {
            total += config.edge_cost.get(agent, edge) * solution.value(vars.x(agent, edge));
        }
        for vertex in config.network.vertices() {
            total += config.vertex_cost.get(agent, vertex) * solution.value(vars.y(agent, vertex));
        }
    }
    total
}

/// Value of [`arrival_times`] under a solved model.
pub fn arrival_value(solution: &impl Solution, config: &MapfConfig, timing: &TimingVars) -> f64 {
    config
        .agents
        .iter()
        .map(|agent| solution.value(timing.vertex(agent.id, agent.target)))
        .sum()
}

/// Value of [`discrete_cost`] under a solved model.
pub fn discrete_cost_value(
    solution: &impl Solution,
    config: &MapfConfig,
    vars: &DiscreteVars,
) -> f64 {
    let mut total = 0.0;
    for agent in 0..config.num_agents() {
        for step in vars.steps(agent) {
            for &edge in config.network.edges() {
                total +=
                    config.edge_cost.get(agent, edge) * solution.value(vars.x(agent, step, edge));
            }
            for vertex in config.network.vertices() {
                total += config.vertex_cost.get(agent, vertex)
                    * solution.value(vars.y(agent, step, vertex));
            }
        }
    }
    total
}

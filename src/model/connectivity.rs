use good_lp::{constraint, Expression, SolverModel};
use tracing::debug;

use crate::model::vars::SelectionVars;
use crate::problem::MapfConfig;

/// Installs the flow constraints tying `x` and `y` into one simple path per
/// agent. The source and target use the unambiguous directed form: exactly
/// one edge leaves the source and none enters it, exactly one edge enters the
/// target and none leaves it.
pub fn install(model: &mut impl SolverModel, config: &MapfConfig, vars: &SelectionVars) {
    let mut rows = 0;
    for agent in &config.agents {
        let a = agent.id;

        let y_source = vars.y(a, agent.source);
        let y_target = vars.y(a, agent.target);
        model.add_constraint(constraint!(y_source == 1));
        model.add_constraint(constraint!(y_target == 1));
        rows += 2;

        let outflow_source = outflow(config, vars, a, agent.source);
        let inflow_source = inflow(config, vars, a, agent.source);
        model.add_constraint(constraint!(outflow_source == 1));
        model.add_constraint(constraint!(inflow_source == 0));

        let outflow_target = outflow(config, vars, a, agent.target);
        let inflow_target = inflow(config, vars, a, agent.target);
        model.add_constraint(constraint!(inflow_target == 1));
        model.add_constraint(constraint!(outflow_target == 0));
        rows += 4;

        for v in config.network.vertices() {
            if v != agent.source && v != agent.target {
                let out_v = outflow(config, vars, a, v);
                let in_v = inflow(config, vars, a, v);
                model.add_constraint(constraint!(out_v == in_v));
                rows += 1;
            }

            // Couple y to the inbound edges; the source is pinned above and
            // has inflow 0, so it is excluded here.
            if v != agent.source {
                let y_v = vars.y(a, v);
                let in_v = inflow(config, vars, a, v);
                model.add_constraint(constraint!(y_v == in_v));
                rows += 1;
            }
        }
    }
    debug!(rows, "installed connectivity constraints");
}

pub(crate) fn outflow(
    config: &MapfConfig,
    vars: &SelectionVars,
    agent: usize,
    vertex: usize,
) -> Expression {
    config
        .network
        .out_neighbors(vertex)
        .iter()
        .map(|&w| Expression::from(vars.x(agent, (vertex, w))))
        .sum()
}

pub(crate) fn inflow(
    config: &MapfConfig,
    vars: &SelectionVars,
    agent: usize,
    vertex: usize,
) -> Expression {
    config
        .network
        .in_neighbors(vertex)
        .iter()
        .map(|&u| Expression::from(vars.x(agent, (u, vertex))))
        .sum()
}

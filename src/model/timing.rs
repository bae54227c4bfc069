use good_lp::{constraint, SolverModel};
use tracing::debug;

use crate::model::vars::{SelectionVars, TimingVars};
use crate::problem::MapfConfig;

/// Installs the big-M arrival-time propagation.
///
/// With `y[a, v] = 1` the edge-entry bound activates as
/// `t_e >= t_v + wait_v`; with `y = 0` the `- M` term slackens it entirely.
/// The same shape propagates `t_v` across a selected edge.
pub fn install(
    model: &mut impl SolverModel,
    config: &MapfConfig,
    selection: &SelectionVars,
    timing: &TimingVars,
    big_m: f64,
) {
    let mut rows = 0;
    for agent in &config.agents {
        let a = agent.id;

        let t_source = timing.vertex(a, agent.source);
        let departure = agent.departure;
        model.add_constraint(constraint!(t_source == departure));
        rows += 1;

        for v in config.network.vertices() {
            let wait = config.vertex_wait.get(a, v);
            let t_v = timing.vertex(a, v);
            let y_v = selection.y(a, v);
            for &w in config.network.out_neighbors(v) {
                let t_e = timing.edge(a, (v, w));
                model.add_constraint(constraint!(t_e >= t_v + (wait + big_m) * y_v - big_m));
                rows += 1;
            }
        }

        for &(u, v) in config.network.edges() {
            let travel = config.edge_wait.get(a, (u, v));
            let t_e = timing.edge(a, (u, v));
            let t_arrival = timing.vertex(a, v);
            let x_e = selection.x(a, (u, v));
            model.add_constraint(constraint!(
                t_arrival >= t_e + (travel + big_m) * x_e - big_m
            ));
            rows += 1;
        }
    }
    debug!(rows, "installed timing constraints");
}

use good_lp::{constraint, SolverModel};
use itertools::Itertools;
use tracing::debug;

use crate::model::vars::{ConflictVars, TimingVars};
use crate::problem::MapfConfig;

/// Installs the static pairwise ordering disjunctions.
///
/// For every agent pair `i < j` and every vertex, either `i` enters the
/// vertex after every moment `j` may leave it (through any outgoing edge) or
/// vice-versa; the binary pointer selects which inequality is active and the
/// big-M term disables the other. Edges and anti-parallel edge pairs get the
/// analogous treatment.
pub fn install(
    model: &mut impl SolverModel,
    config: &MapfConfig,
    timing: &TimingVars,
    pointers: &ConflictVars,
    big_m: f64,
) {
    let mut rows = 0;
    for (i, j) in (0..config.num_agents()).tuple_combinations() {
        for v in config.network.vertices() {
            let delta = pointers.vertex[&(i, j, v)];
            let t_i = timing.vertex(i, v);
            let t_j = timing.vertex(j, v);
            for &w in config.network.out_neighbors(v) {
                let t_e_i = timing.edge(i, (v, w));
                let t_e_j = timing.edge(j, (v, w));
                model.add_constraint(constraint!(t_i >= t_e_j - big_m * delta));
                model.add_constraint(constraint!(t_j >= t_e_i - big_m + big_m * delta));
                rows += 2;
            }
        }

        for &(u, v) in config.network.edges() {
            let delta = pointers.edge[&(i, j, (u, v))];
            let t_e_i = timing.edge(i, (u, v));
            let t_e_j = timing.edge(j, (u, v));
            let t_i = timing.vertex(i, v);
            let t_j = timing.vertex(j, v);
            model.add_constraint(constraint!(t_e_i >= t_j - big_m * delta));
            model.add_constraint(constraint!(t_e_j >= t_i - big_m + big_m * delta));
            rows += 2;
        }

        if config.swap_constraint {
            // Every directed edge with a reverse gets its own pointer, so
            // both traversal orientations of the pair are covered.
            for &(u, v) in config.network.edges() {
                if !config.network.has_reverse((u, v)) {
                    continue;
                }
                let delta = pointers.swap[&(i, j, (u, v))];
                let enter_i = timing.edge(i, (u, v));
                let enter_j = timing.edge(j, (v, u));
                let arrive_j = timing.vertex(j, u);
                let arrive_i = timing.vertex(i, v);
                model.add_constraint(constraint!(enter_i >= arrive_j - big_m * delta));
                model.add_constraint(constraint!(enter_j >= arrive_i - big_m + big_m * delta));
                rows += 2;
            }
        }
    }
    debug!(rows, "installed static conflict constraints");
}

use std::time::Instant;

use good_lp::{ProblemVariables, SolverModel};
use tracing::info;

use crate::error::MapfError;
use crate::model::vars::{ConflictVars, SelectionVars, TimingVars};
use crate::model::{conflict, connectivity, objective, timing};
use crate::paths::{parse_continuous, ContinuousSolution};
use crate::problem::MapfConfig;

/// Continuous-time MAPF with the full static conflict encoding: every agent
/// pair gets its ordering disjunctions up front, then the model is solved
/// once.
pub fn mapf_continuous_time(config: &MapfConfig) -> Result<ContinuousSolution, MapfError> {
    config.validate()?;
    let start = Instant::now();
    let big_m = config.effective_big_m();

    let mut problem = ProblemVariables::new();
    let selection = SelectionVars::new(&mut problem, config);
    let times = TimingVars::new(&mut problem, config, big_m);
    let pointers = ConflictVars::new(&mut problem, config);

    let total_cost =
        objective::selection_cost(config, &selection) + objective::arrival_times(config, &times);
    let mut milp = super::into_model(problem, total_cost, config.timeout);

    connectivity::install(&mut milp, config, &selection);
    timing::install(&mut milp, config, &selection, &times, big_m);
    conflict::install(&mut milp, config, &times, &pointers, big_m);

    let solved = milp.solve()?;
    let paths = parse_continuous(&solved, config, &selection, &times);
    let objective_value = objective::selection_cost_value(&solved, config, &selection)
        + objective::arrival_value(&solved, config, &times);

    info!(
        objective = objective_value,
        elapsed_ms = start.elapsed().as_millis() as usize,
        "continuous-time solve finished"
    );
    Ok(ContinuousSolution {
        paths,
        objective: objective_value,
    })
}

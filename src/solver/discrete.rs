use std::time::Instant;

use good_lp::{ProblemVariables, SolverModel};
use tracing::info;

use crate::error::MapfError;
use crate::model::vars::DiscreteVars;
use crate::model::{discrete, objective};
use crate::paths::{parse_discrete, DiscreteSolution};
use crate::problem::MapfConfig;

/// Discrete-time MAPF over an unrolled horizon of
/// `config.effective_time_duration()` steps.
pub fn mapf_discrete_time(config: &MapfConfig) -> Result<DiscreteSolution, MapfError> {
    config.validate()?;
    let start = Instant::now();
    let horizon = config.effective_time_duration();

    for agent in &config.agents {
        let departure = agent.departure.floor() as usize;
        if departure >= horizon {
            return Err(MapfError::HorizonTooSmall {
                agent: agent.id,
                departure,
                horizon,
            });
        }
    }

    let mut problem = ProblemVariables::new();
    let vars = DiscreteVars::new(&mut problem, config, horizon);
    let total_cost = objective::discrete_cost(config, &vars);
    let mut milp = super::into_model(problem, total_cost, config.timeout);

    discrete::install(&mut milp, config, &vars);

    let solved = milp.solve()?;
    let paths = parse_discrete(&solved, config, &vars);
    let objective_value = objective::discrete_cost_value(&solved, config, &vars);

    info!(
        objective = objective_value,
        horizon,
        elapsed_ms = start.elapsed().as_millis() as usize,
        "discrete-time solve finished"
    );
    Ok(DiscreteSolution {
        paths,
        objective: objective_value,
    })
}

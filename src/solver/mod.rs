//! Solve drivers for the three formulation flavors.

mod continuous;
mod discrete;
mod dynamic;

pub use continuous::mapf_continuous_time;
pub use discrete::mapf_discrete_time;
pub use dynamic::mapf_continuous_time_dynamic_conflict;

use good_lp::solvers::highs::{highs, HighsProblem};
use good_lp::{Expression, ProblemVariables};

/// Hands the assembled variables and objective to HiGHS. The time limit is
/// the only backend-specific option in use; everything else goes through the
/// solver-agnostic model traits.
pub(crate) fn into_model(
    problem: ProblemVariables,
    objective: Expression,
    timeout: Option<f64>,
) -> HighsProblem {
    let mut model = problem.minimise(objective).using(highs);
    if let Some(seconds) = timeout {
        model = model.set_time_limit(seconds);
    }
    model
}

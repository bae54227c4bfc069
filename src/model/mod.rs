//! MILP constraint generation: variable bundles and the builders that
//! install connectivity, timing, conflict, discrete-time, and objective
//! fragments into a solver model.

pub mod conflict;
pub mod connectivity;
pub mod discrete;
pub mod objective;
pub mod timing;
pub mod vars;

//! Multi-agent path finding with heterogeneous costs, by reduction to
//! mixed-integer linear programming.
//!
//! Three solver flavors share the constraint-generation core:
//! continuous-time with static conflict disjunctions, discrete-time over an
//! unrolled horizon, and continuous-time with lazily generated conflict
//! cuts. Models are built with `good_lp` and solved by HiGHS.

pub mod detector;
pub mod error;
pub mod model;
pub mod network;
pub mod paths;
pub mod problem;
pub mod scenario;
pub mod solver;
pub mod stat;

pub use detector::{detect_conflict, detect_edge_conflict, detect_vertex_conflict, Conflict};
pub use error::MapfError;
pub use network::{Edge, Network};
pub use paths::{
    AgentItinerary, ContinuousSolution, DiscreteItinerary, DiscreteSolution, DynamicSolution,
};
pub use problem::{Agent, EdgeValues, MapfConfig, VertexValues, VertexVisit};
pub use solver::{
    mapf_continuous_time, mapf_continuous_time_dynamic_conflict, mapf_discrete_time,
};
pub use stat::SolveStats;

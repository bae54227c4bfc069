use good_lp::ResolutionError;
use thiserror::Error;

/// Errors surfaced by model construction and the solve drivers. All of them
/// are fatal to the current solve; there is no automatic recovery.
#[derive(Debug, Error)]
pub enum MapfError {
    #[error("{sources} sources but {targets} targets")]
    AgentCountMismatch { sources: usize, targets: usize },

    #[error("vertex {vertex} out of range for a network with {num_vertices} vertices")]
    VertexOutOfRange { vertex: usize, num_vertices: usize },

    #[error("edge ({u}, {v}) references a vertex outside 0..{num_vertices}")]
    EdgeOutOfRange {
        u: usize,
        v: usize,
        num_vertices: usize,
    },

    #[error("agents {first} and {second} share source vertex {vertex}")]
    DuplicateSource {
        vertex: usize,
        first: usize,
        second: usize,
    },

    #[error("agents {first} and {second} share target vertex {vertex}")]
    DuplicateTarget {
        vertex: usize,
        first: usize,
        second: usize,
    },

    #[error("agent {agent} has negative departure time {value}")]
    NegativeDeparture { agent: usize, value: f64 },

    #[error("{kind} value {value} for agent {agent} is negative")]
    NegativeValue {
        kind: &'static str,
        agent: usize,
        value: f64,
    },

    #[error("{kind} values have {got} entries, expected {expected}")]
    LengthMismatch {
        kind: &'static str,
        expected: usize,
        got: usize,
    },

    #[error("{kind} values are missing edge ({u}, {v})")]
    MissingEdgeValue {
        kind: &'static str,
        u: usize,
        v: usize,
    },

    #[error("agent {agent} departs at step {departure}, beyond the horizon of {horizon} steps")]
    HorizonTooSmall {
        agent: usize,
        departure: usize,
        horizon: usize,
    },

    #[error("{num_agents} agents need {needed} distinct endpoints, but the network only has {num_vertices} vertices")]
    NotEnoughEndpoints {
        num_agents: usize,
        needed: usize,
        num_vertices: usize,
    },

    #[error("agent paths overlap: {details}")]
    OverlappingPaths { details: String },

    #[error("scenario I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("scenario YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("solver returned a non-optimal status: {0}")]
    Solver(#[from] ResolutionError),

    #[error("malformed solution: {0}")]
    MalformedSolution(String),
}

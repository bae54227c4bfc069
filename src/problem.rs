use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::MapfError;
use crate::network::{Edge, Network};

/// A routed entity with a fixed source, target, and departure time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    pub id: usize,
    pub source: usize,
    pub target: usize,
    pub departure: f64,
}

/// Per-vertex values in either shared or per-agent rank.
///
/// `get` resolves `(agent, vertex)` against whichever rank is present by
/// discarding the leading agent index when the shared form is stored.
#[derive(Debug, Clone)]
pub enum VertexValues {
    Shared(Vec<f64>),
    PerAgent(Vec<Vec<f64>>),
}

impl VertexValues {
    pub fn uniform(network: &Network, value: f64) -> Self {
        VertexValues::Shared(vec![value; network.num_vertices()])
    }

    pub fn get(&self, agent: usize, vertex: usize) -> f64 {
        match self {
            VertexValues::Shared(values) => values[vertex],
            VertexValues::PerAgent(values) => values[agent][vertex],
        }
    }

    pub fn max_value(&self) -> f64 {
        self.iter_all().fold(0.0, f64::max)
    }

    fn iter_all(&self) -> Box<dyn Iterator<Item = f64> + '_> {
        match self {
            VertexValues::Shared(values) => Box::new(values.iter().copied()),
            VertexValues::PerAgent(values) => {
                Box::new(values.iter().flat_map(|row| row.iter().copied()))
            }
        }
    }

    fn validate(
        &self,
        kind: &'static str,
        num_agents: usize,
        num_vertices: usize,
    ) -> Result<(), MapfError> {
        match self {
            VertexValues::Shared(values) => {
                if values.len() != num_vertices {
                    return Err(MapfError::LengthMismatch {
                        kind,
                        expected: num_vertices,
                        got: values.len(),
                    });
                }
            }
            VertexValues::PerAgent(values) => {
                if values.len() != num_agents {
                    return Err(MapfError::LengthMismatch {
                        kind,
                        expected: num_agents,
                        got: values.len(),
                    });
                }
                for row in values {
                    if row.len() != num_vertices {
                        return Err(MapfError::LengthMismatch {
                            kind,
                            expected: num_vertices,
                            got: row.len(),
                        });
                    }
                }
            }
        }

        for (agent, value) in self.enumerate_agents() {
            if value < 0.0 {
                return Err(MapfError::NegativeValue { kind, agent, value });
            }
        }
        Ok(())
    }

    fn enumerate_agents(&self) -> Box<dyn Iterator<Item = (usize, f64)> + '_> {
        match self {
            VertexValues::Shared(values) => Box::new(values.iter().map(|&v| (0, v))),
            VertexValues::PerAgent(values) => Box::new(
                values
                    .iter()
                    .enumerate()
                    .flat_map(|(a, row)| row.iter().map(move |&v| (a, v))),
            ),
        }
    }
}

/// Per-edge values in either shared or per-agent rank, keyed by directed
/// edge. Same right-align access rule as [`VertexValues`].
#[derive(Debug, Clone)]
pub enum EdgeValues {
    Shared(HashMap<Edge, f64>),
    PerAgent(Vec<HashMap<Edge, f64>>),
}

impl EdgeValues {
    pub fn uniform(network: &Network, value: f64) -> Self {
        EdgeValues::Shared(network.edges().iter().map(|&e| (e, value)).collect())
    }

    /// Shared values from an undirected assignment: every listed edge gets
    /// the value in both directions.
    pub fn symmetric(assignments: &[(Edge, f64)]) -> Self {
        let mut values = HashMap::new();
        for &((u, v), value) in assignments {
            values.insert((u, v), value);
            values.insert((v, u), value);
        }
        EdgeValues::Shared(values)
    }

    pub fn get(&self, agent: usize, edge: Edge) -> f64 {
        match self {
            EdgeValues::Shared(values) => values[&edge],
            EdgeValues::PerAgent(values) => values[agent][&edge],
        }
    }

    pub fn max_value(&self) -> f64 {
        self.maps().flat_map(|m| m.values().copied()).fold(0.0, f64::max)
    }

    fn maps(&self) -> Box<dyn Iterator<Item = &HashMap<Edge, f64>> + '_> {
        match self {
            EdgeValues::Shared(values) => Box::new(std::iter::once(values)),
            EdgeValues::PerAgent(values) => Box::new(values.iter()),
        }
    }

    fn validate(
        &self,
        kind: &'static str,
        num_agents: usize,
        network: &Network,
    ) -> Result<(), MapfError> {
        if let EdgeValues::PerAgent(values) = self {
            if values.len() != num_agents {
                return Err(MapfError::LengthMismatch {
                    kind,
                    expected: num_agents,
                    got: values.len(),
                });
            }
        }

        for (agent, map) in self.maps().enumerate() {
            for &(u, v) in network.edges() {
                match map.get(&(u, v)) {
                    None => return Err(MapfError::MissingEdgeValue { kind, u, v }),
                    Some(&value) if value < 0.0 => {
                        return Err(MapfError::NegativeValue { kind, agent, value })
                    }
                    Some(_) => {}
                }
            }
        }
        Ok(())
    }
}

/// Payment policy for vertices entered via an inbound edge in discrete mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VertexVisit {
    /// Enforce the dwell step only where the vertex cost is positive.
    Auto,
    Yes,
    No,
}

/// Everything a single solve needs: network, agents, cost/time tensors, and
/// the formulation knobs shared by the three solver flavors.
#[derive(Debug, Clone)]
pub struct MapfConfig {
    pub network: Network,
    pub agents: Vec<Agent>,
    pub vertex_cost: VertexValues,
    pub edge_cost: EdgeValues,
    pub vertex_wait: VertexValues,
    pub edge_wait: EdgeValues,
    /// Integrality of the selection variables; `false` yields the LP
    /// relaxation, a lower bound that is not a feasible MAPF solution in
    /// general.
    pub integer: bool,
    pub swap_constraint: bool,
    /// Big-M / time horizon override. Must strictly upper-bound every
    /// feasible arrival time; `None` derives a conservative default.
    pub big_m: Option<f64>,
    /// Discrete horizon `T`; `None` defaults to the number of directed edges.
    pub time_duration: Option<usize>,
    pub vertex_binding: bool,
    pub vertex_visit: VertexVisit,
    /// Dynamic loop: replace each binary disjunction by the single cheaper
    /// ordering under the incumbent solution. Faster, possibly suboptimal.
    pub heuristic_conflict: bool,
    /// Safety gap for lazily generated ordering cuts.
    pub epsilon: Option<f64>,
    /// Solver time limit in seconds; `None` is unlimited.
    pub timeout: Option<f64>,
}

impl MapfConfig {
    /// Unit-cost, unit-wait configuration; agents depart at time zero.
    pub fn new(network: Network, sources: &[usize], targets: &[usize]) -> Result<Self, MapfError> {
        if sources.len() != targets.len() {
            return Err(MapfError::AgentCountMismatch {
                sources: sources.len(),
                targets: targets.len(),
            });
        }

        let agents = sources
            .iter()
            .zip(targets)
            .enumerate()
            .map(|(id, (&source, &target))| Agent {
                id,
                source,
                target,
                departure: 0.0,
            })
            .collect();

        let config = MapfConfig {
            vertex_cost: VertexValues::uniform(&network, 1.0),
            edge_cost: EdgeValues::uniform(&network, 1.0),
            vertex_wait: VertexValues::uniform(&network, 1.0),
            edge_wait: EdgeValues::uniform(&network, 1.0),
            network,
            agents,
            integer: true,
            swap_constraint: true,
            big_m: None,
            time_duration: None,
            vertex_binding: false,
            vertex_visit: VertexVisit::Auto,
            heuristic_conflict: false,
            epsilon: None,
            timeout: None,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn num_agents(&self) -> usize {
        self.agents.len()
    }

    /// Checks everything §7 calls input validation. Runs before any model
    /// construction; solvers refuse configurations that fail here.
    pub fn validate(&self) -> Result<(), MapfError> {
        let n = self.network.num_vertices();
        let a = self.agents.len();

        for agent in &self.agents {
            for vertex in [agent.source, agent.target] {
                if !self.network.contains_vertex(vertex) {
                    return Err(MapfError::VertexOutOfRange {
                        vertex,
                        num_vertices: n,
                    });
                }
            }
            if agent.departure < 0.0 {
                return Err(MapfError::NegativeDeparture {
                    agent: agent.id,
                    value: agent.departure,
                });
            }
        }

        let mut seen_sources: HashMap<usize, usize> = HashMap::new();
        let mut seen_targets: HashMap<usize, usize> = HashMap::new();
        for agent in &self.agents {
            if let Some(&first) = seen_sources.get(&agent.source) {
                return Err(MapfError::DuplicateSource {
                    vertex: agent.source,
                    first,
                    second: agent.id,
                });
            }
            seen_sources.insert(agent.source, agent.id);
            if let Some(&first) = seen_targets.get(&agent.target) {
                return Err(MapfError::DuplicateTarget {
                    vertex: agent.target,
                    first,
                    second: agent.id,
                });
            }
            seen_targets.insert(agent.target, agent.id);
        }

        self.vertex_cost.validate("vertex cost", a, n)?;
        self.vertex_wait.validate("vertex wait", a, n)?;
        self.edge_cost.validate("edge cost", a, &self.network)?;
        self.edge_wait.validate("edge wait", a, &self.network)?;

        if let Some(m) = self.big_m {
            let derived = self.derived_big_m();
            if m < derived {
                warn!(
                    big_m = m,
                    derived, "big-M override below the derived bound; may prune feasible solutions"
                );
            }
        }

        Ok(())
    }

    /// Effective big-M for the timing and conflict constraints.
    pub fn effective_big_m(&self) -> f64 {
        self.big_m.unwrap_or_else(|| self.derived_big_m())
    }

    /// Conservative default: `A · |E| · max(wait) + max(departure)`, with the
    /// max taken over both wait tensors so an all-zero edge-wait instance
    /// still gets a usable horizon.
    fn derived_big_m(&self) -> f64 {
        let max_wait = self.edge_wait.max_value().max(self.vertex_wait.max_value());
        let max_departure = self
            .agents
            .iter()
            .map(|agent| agent.departure)
            .fold(0.0, f64::max);
        (self.num_agents() * self.network.num_edges()) as f64 * max_wait + max_departure
    }

    /// Horizon for the discrete builder.
    pub fn effective_time_duration(&self) -> usize {
        self.time_duration.unwrap_or(self.network.num_edges())
    }

    /// Safety gap for dynamic ordering cuts: `1e-4 · min(non-zero wait)`.
    pub fn effective_epsilon(&self) -> f64 {
        if let Some(epsilon) = self.epsilon {
            return epsilon;
        }
        let min_wait = self
            .vertex_wait
            .enumerate_agents()
            .map(|(_, v)| v)
            .chain(self.edge_wait.maps().flat_map(|m| m.values().copied()))
            .filter(|&v| v > 0.0)
            .fold(f64::INFINITY, f64::min);
        if min_wait.is_finite() {
            1e-4 * min_wait
        } else {
            1e-4
        }
    }
}

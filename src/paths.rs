use std::collections::HashMap;

use good_lp::Solution;
use serde::{Deserialize, Serialize};

use crate::error::MapfError;
use crate::model::vars::{DiscreteVars, SelectionVars, TimingVars};
use crate::network::Edge;
use crate::problem::MapfConfig;
use crate::stat::SolveStats;

/// One agent's timed itinerary: `(arrival time, vertex)` pairs and
/// `(entry time, edge)` pairs, both ascending in time. `edges[k]` connects
/// `vertices[k]` to `vertices[k + 1]`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AgentItinerary {
    pub vertices: Vec<(f64, usize)>,
    pub edges: Vec<(f64, Edge)>,
}

impl AgentItinerary {
    /// The ordered vertex sequence without times.
    pub fn vertex_sequence(&self) -> Vec<usize> {
        self.vertices.iter().map(|&(_, v)| v).collect()
    }

    /// Arrival time at the last vertex of the itinerary.
    pub fn arrival(&self) -> f64 {
        self.vertices.last().map_or(0.0, |&(t, _)| t)
    }
}

/// One agent's step-indexed itinerary in discrete mode.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DiscreteItinerary {
    pub vertices: Vec<(usize, usize)>,
    pub edges: Vec<(usize, Edge)>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContinuousSolution {
    pub paths: Vec<AgentItinerary>,
    pub objective: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscreteSolution {
    pub paths: Vec<DiscreteItinerary>,
    pub objective: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DynamicSolution {
    pub paths: Vec<AgentItinerary>,
    pub objective: f64,
    pub stats: SolveStats,
}

/// Reads the timed itineraries out of a solved continuous model: vertices
/// with `y > 0.5` paired with their arrival times, edges with `x > 0.5`
/// paired with their entry times, each sorted ascending.
pub fn parse_continuous(
    solution: &impl Solution,
    config: &MapfConfig,
    selection: &SelectionVars,
    timing: &TimingVars,
) -> Vec<AgentItinerary> {
    (0..config.num_agents())
        .map(|a| {
            let mut vertices: Vec<(f64, usize)> = config
                .network
                .vertices()
                .filter(|&v| solution.value(selection.y(a, v)) > 0.5)
                .map(|v| (solution.value(timing.vertex(a, v)), v))
                .collect();
            vertices.sort_by(|lhs, rhs| lhs.0.total_cmp(&rhs.0));

            let mut edges: Vec<(f64, Edge)> = config
                .network
                .edges()
                .iter()
                .filter(|&&e| solution.value(selection.x(a, e)) > 0.5)
                .map(|&e| (solution.value(timing.edge(a, e)), e))
                .collect();
            edges.sort_by(|lhs, rhs| lhs.0.total_cmp(&rhs.0));

            AgentItinerary { vertices, edges }
        })
        .collect()
}

/// Orders the selected edges of a cost-only solve into a walk from source to
/// target. Used by the dynamic loop before any timing exists.
pub fn parse_selection_walks(
    solution: &impl Solution,
    config: &MapfConfig,
    selection: &SelectionVars,
) -> Result<Vec<Vec<Edge>>, MapfError> {
    let mut walks = Vec::with_capacity(config.num_agents());
    for agent in &config.agents {
        let mut next: HashMap<usize, usize> = HashMap::new();
        for &(u, v) in config.network.edges() {
            if solution.value(selection.x(agent.id, (u, v))) > 0.5 {
                next.insert(u, v);
            }
        }

        let mut walk = Vec::new();
        let mut current = agent.source;
        while current != agent.target {
            let &succ = next.get(&current).ok_or_else(|| {
                MapfError::MalformedSolution(format!(
                    "agent {} walk stops at vertex {} before its target",
                    agent.id, current
                ))
            })?;
            walk.push((current, succ));
            current = succ;
            if walk.len() > config.network.num_edges() {
                return Err(MapfError::MalformedSolution(format!(
                    "agent {} selection does not form a simple path",
                    agent.id
                )));
            }
        }
        walks.push(walk);
    }
    Ok(walks)
}

/// Parallel-shortest-path timing: each agent is timed independently along
/// its walk, accumulating the minimum dwell and travel durations. Only valid
/// when the walks are vertex- and edge-disjoint.
pub fn analytic_timing(config: &MapfConfig, walks: &[Vec<Edge>]) -> Vec<AgentItinerary> {
    config
        .agents
        .iter()
        .zip(walks)
        .map(|(agent, walk)| {
            let mut itinerary = AgentItinerary::default();
            let mut now = agent.departure;
            itinerary.vertices.push((now, agent.source));
            for &(u, v) in walk {
                let entry = now + config.vertex_wait.get(agent.id, u);
                let arrival = entry + config.edge_wait.get(agent.id, (u, v));
                itinerary.edges.push((entry, (u, v)));
                itinerary.vertices.push((arrival, v));
                now = arrival;
            }
            itinerary
        })
        .collect()
}

/// Reads the step-indexed itineraries out of a solved discrete model.
pub fn parse_discrete(
    solution: &impl Solution,
    config: &MapfConfig,
    vars: &DiscreteVars,
) -> Vec<DiscreteItinerary> {
    (0..config.num_agents())
        .map(|a| {
            let mut itinerary = DiscreteItinerary::default();
            for step in vars.steps(a) {
                for v in config.network.vertices() {
                    if solution.value(vars.y(a, step, v)) > 0.5 {
                        itinerary.vertices.push((step, v));
                    }
                }
                for &e in config.network.edges() {
                    if solution.value(vars.x(a, step, e)) > 0.5 {
                        itinerary.edges.push((step, e));
                    }
                }
            }
            itinerary
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::Network;
    use crate::problem::MapfConfig;

    #[test]
    fn test_analytic_timing_accumulates_waits() {
        let network = Network::undirected(3, &[(0, 1), (1, 2)]).unwrap();
        let config = MapfConfig::new(network, &[0], &[2]).unwrap();
        let walks = vec![vec![(0, 1), (1, 2)]];

        let paths = analytic_timing(&config, &walks);
        assert_eq!(paths[0].vertices, vec![(0.0, 0), (2.0, 1), (4.0, 2)]);
        assert_eq!(paths[0].edges, vec![(1.0, (0, 1)), (3.0, (1, 2))]);
        assert_eq!(paths[0].arrival(), 4.0);
        assert_eq!(paths[0].vertex_sequence(), vec![0, 1, 2]);
    }
}

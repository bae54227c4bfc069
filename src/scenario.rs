use rand::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{self, BufReader, Write};
use tracing::info;

use crate::error::MapfError;
use crate::network::Network;
use crate::problem::{EdgeValues, MapfConfig, VertexValues};

/// On-disk scenario description. Omitted cost and wait tables default to
/// all-ones; listed entries override them, symmetrically when the network is
/// undirected.
#[derive(Debug, Serialize, Deserialize)]
pub struct Scenario {
    pub num_vertices: usize,
    pub edges: Vec<(usize, usize)>,
    #[serde(default = "default_undirected")]
    pub undirected: bool,
    pub sources: Vec<usize>,
    pub targets: Vec<usize>,
    #[serde(default)]
    pub departures: Option<Vec<f64>>,
    #[serde(default)]
    pub vertex_cost: Option<Vec<f64>>,
    #[serde(default)]
    pub edge_cost: Option<Vec<(usize, usize, f64)>>,
    #[serde(default)]
    pub vertex_wait: Option<Vec<f64>>,
    #[serde(default)]
    pub edge_wait: Option<Vec<(usize, usize, f64)>>,
}

fn default_undirected() -> bool {
    true
}

impl Scenario {
    pub fn load_from_yaml(path: &str) -> Result<Scenario, MapfError> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        let scenario = serde_yaml::from_reader(reader)?;
        Ok(scenario)
    }

    pub fn write_to_yaml(&self, path: &str) -> Result<(), MapfError> {
        let file = File::create(path)?;
        let mut writer = io::BufWriter::new(file);
        let yaml_data = serde_yaml::to_string(self)?;
        writer.write_all(yaml_data.as_bytes())?;

        Ok(())
    }

    pub fn to_config(&self) -> Result<MapfConfig, MapfError> {
        let network = if self.undirected {
            Network::undirected(self.num_vertices, &self.edges)?
        } else {
            Network::directed(self.num_vertices, &self.edges)?
        };

        let mut config = MapfConfig::new(network, &self.sources, &self.targets)?;
        if let Some(departures) = &self.departures {
            if departures.len() != config.num_agents() {
                return Err(MapfError::LengthMismatch {
                    kind: "departure",
                    expected: config.num_agents(),
                    got: departures.len(),
                });
            }
            for (agent, &departure) in config.agents.iter_mut().zip(departures) {
                agent.departure = departure;
            }
        }
        if let Some(costs) = &self.vertex_cost {
            config.vertex_cost = VertexValues::Shared(costs.clone());
        }
        if let Some(waits) = &self.vertex_wait {
            config.vertex_wait = VertexValues::Shared(waits.clone());
        }
        if let Some(costs) = &self.edge_cost {
            config.edge_cost = self.edge_table(&config, costs);
        }
        if let Some(waits) = &self.edge_wait {
            config.edge_wait = self.edge_table(&config, waits);
        }
        config.validate()?;
        Ok(config)
    }

    fn edge_table(&self, config: &MapfConfig, entries: &[(usize, usize, f64)]) -> EdgeValues {
        let mut values = match EdgeValues::uniform(&config.network, 1.0) {
            EdgeValues::Shared(map) => map,
            EdgeValues::PerAgent(_) => unreachable!(),
        };
        for &(u, v, value) in entries {
            values.insert((u, v), value);
            if self.undirected {
                values.insert((v, u), value);
            }
        }
        EdgeValues::Shared(values)
    }
}

/// Two corridors merging into a shared segment: nine undirected edges, three
/// agents, strongly skewed edge costs so the cheap routes all funnel through
/// vertices 1 and 5.
pub fn two_branch_merge() -> Result<MapfConfig, MapfError> {
    let edges = [
        (0, 1),
        (1, 2),
        (1, 3),
        (1, 5),
        (2, 5),
        (3, 4),
        (4, 5),
        (5, 6),
        (5, 7),
    ];
    let network = Network::undirected(8, &edges)?;
    let mut config = MapfConfig::new(network, &[0, 3, 7], &[6, 7, 2])?;
    config.edge_cost = EdgeValues::symmetric(&[
        ((0, 1), 1.0),
        ((1, 2), 1.0),
        ((1, 3), 1.0),
        ((1, 5), 2.0),
        ((2, 5), 80.0),
        ((3, 4), 20.0),
        ((4, 5), 10.0),
        ((5, 6), 1.0),
        ((5, 7), 1.0),
    ]);
    config.validate()?;
    Ok(config)
}

/// `agents` disjoint lanes: vertex `i` connects only to vertex `agents + i`.
pub fn parallel_lines(agents: usize) -> Result<MapfConfig, MapfError> {
    let edges: Vec<_> = (0..agents).map(|i| (i, agents + i)).collect();
    let network = Network::undirected(2 * agents, &edges)?;
    let sources: Vec<_> = (0..agents).collect();
    let targets: Vec<_> = (agents..2 * agents).collect();
    MapfConfig::new(network, &sources, &targets)
}

/// Every agent routes through the central vertex 0, which carries a dwell
/// time of 2, so visits to the hub have to be linearized.
pub fn directional_star(agents: usize) -> Result<MapfConfig, MapfError> {
    let num_vertices = 2 * agents + 1;
    let mut edges = Vec::new();
    for i in 1..=agents {
        edges.push((i, 0));
        edges.push((0, agents + i));
    }
    let network = Network::undirected(num_vertices, &edges)?;
    let sources: Vec<_> = (1..=agents).collect();
    let targets: Vec<_> = (agents + 1..=2 * agents).collect();
    let mut config = MapfConfig::new(network, &sources, &targets)?;

    let mut waits = vec![1.0; num_vertices];
    waits[0] = 2.0;
    config.vertex_wait = VertexValues::Shared(waits);
    config.validate()?;
    Ok(config)
}

/// Two horizontal and two vertical corridors crossing on a 2×2 block of
/// shared intersections.
pub fn grid_cross() -> Result<MapfConfig, MapfError> {
    // Vertices 0..=1: horizontal entries, 2..=3: vertical entries,
    // 4..=5: horizontal exits, 6..=7: vertical exits, 8..=11: the crossings
    // in row-major order.
    let cross = |row: usize, column: usize| 8 + 2 * row + column;
    let mut edges = Vec::new();
    for row in 0..2 {
        edges.push((row, cross(row, 0)));
        edges.push((cross(row, 0), cross(row, 1)));
        edges.push((cross(row, 1), 4 + row));
    }
    for column in 0..2 {
        edges.push((2 + column, cross(0, column)));
        edges.push((cross(0, column), cross(1, column)));
        edges.push((cross(1, column), 6 + column));
    }
    let network = Network::undirected(12, &edges)?;
    MapfConfig::new(network, &[0, 1, 2, 3], &[4, 5, 6, 7])
}

/// Outer cycle `1..=agents` with spokes into the hub vertex 0; every agent's
/// target is its predecessor on the cycle, one shift around the wheel.
pub fn wheel_pass(agents: usize) -> Result<MapfConfig, MapfError> {
    let mut edges = Vec::new();
    for i in 1..agents {
        edges.push((i, i + 1));
    }
    edges.push((agents, 1));
    for i in 1..=agents {
        edges.push((i, 0));
    }
    let network = Network::undirected(agents + 1, &edges)?;
    let sources: Vec<_> = (1..=agents).collect();
    let mut targets = vec![agents];
    targets.extend(1..agents);
    MapfConfig::new(network, &sources, &targets)
}

/// Four-neighbor grid with randomly drawn, pairwise-distinct sources and
/// targets.
pub fn random_grid<R: Rng + ?Sized>(
    width: usize,
    height: usize,
    num_agents: usize,
    rng: &mut R,
) -> Result<MapfConfig, MapfError> {
    let num_vertices = width * height;
    if 2 * num_agents > num_vertices {
        return Err(MapfError::NotEnoughEndpoints {
            num_agents,
            needed: 2 * num_agents,
            num_vertices,
        });
    }

    let mut edges = Vec::new();
    for row in 0..height {
        for column in 0..width {
            let v = row * width + column;
            if column + 1 < width {
                edges.push((v, v + 1));
            }
            if row + 1 < height {
                edges.push((v, v + width));
            }
        }
    }
    let network = Network::undirected(num_vertices, &edges)?;

    let mut endpoints: Vec<usize> = (0..num_vertices).collect();
    endpoints.shuffle(rng);
    let sources = &endpoints[..num_agents];
    let targets = &endpoints[num_agents..2 * num_agents];

    info!("Generated random grid scenario: {sources:?} -> {targets:?}");
    MapfConfig::new(network, sources, targets)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_two_branch_merge_shape() {
        let config = two_branch_merge().unwrap();
        assert_eq!(config.network.num_vertices(), 8);
        assert_eq!(config.network.num_edges(), 18);
        assert_eq!(config.num_agents(), 3);
        assert_eq!(config.edge_cost.get(0, (2, 5)), 80.0);
        assert_eq!(config.edge_cost.get(0, (5, 2)), 80.0);
    }

    #[test]
    fn test_parallel_lines_shape() {
        let config = parallel_lines(5).unwrap();
        assert_eq!(config.network.num_vertices(), 10);
        assert_eq!(config.network.num_edges(), 10);
        for i in 0..5 {
            assert!(config.network.has_edge(i, 5 + i));
            assert_eq!(config.agents[i].source, i);
            assert_eq!(config.agents[i].target, 5 + i);
        }
    }

    #[test]
    fn test_directional_star_hub_wait() {
        let config = directional_star(3).unwrap();
        assert_eq!(config.vertex_wait.get(0, 0), 2.0);
        assert_eq!(config.vertex_wait.get(0, 1), 1.0);
        for agent in &config.agents {
            assert!(config.network.has_edge(agent.source, 0));
            assert!(config.network.has_edge(0, agent.target));
        }
    }

    #[test]
    fn test_wheel_pass_shift() {
        let config = wheel_pass(4).unwrap();
        assert_eq!(config.network.num_vertices(), 5);
        let sources: Vec<_> = config.agents.iter().map(|a| a.source).collect();
        let targets: Vec<_> = config.agents.iter().map(|a| a.target).collect();
        assert_eq!(sources, vec![1, 2, 3, 4]);
        assert_eq!(targets, vec![4, 1, 2, 3]);
        // Every source has a direct cycle edge to its target.
        for agent in &config.agents {
            assert!(config.network.has_edge(agent.source, agent.target));
        }
    }

    #[test]
    fn test_random_grid_endpoints_distinct() {
        let seed = [0u8; 32];
        let mut rng = StdRng::from_seed(seed);

        let config = random_grid(4, 4, 5, &mut rng).unwrap();
        assert_eq!(config.num_agents(), 5);
        config.validate().unwrap();

        let too_many = random_grid(2, 2, 3, &mut rng);
        assert!(too_many.is_err());
    }

    #[test]
    fn test_scenario_yaml_round_trip() {
        let scenario = Scenario {
            num_vertices: 3,
            edges: vec![(0, 1), (1, 2)],
            undirected: true,
            sources: vec![0],
            targets: vec![2],
            departures: Some(vec![1.5]),
            vertex_cost: None,
            edge_cost: Some(vec![(0, 1, 3.0)]),
            vertex_wait: None,
            edge_wait: None,
        };
        let config = scenario.to_config().unwrap();
        assert_eq!(config.agents[0].departure, 1.5);
        assert_eq!(config.edge_cost.get(0, (1, 0)), 3.0);
        assert_eq!(config.edge_cost.get(0, (1, 2)), 1.0);
    }
}

use std::collections::HashMap;

use good_lp::{variable, ProblemVariables, Variable};
use itertools::Itertools;

use crate::network::Edge;
use crate::problem::MapfConfig;

/// Path-selection variables: `x[a, (u, v)]` marks a traversed edge,
/// `y[a, v]` a visited vertex. Binary when the configuration asks for an
/// integer program, `[0, 1]` bounds otherwise.
#[derive(Debug)]
pub struct SelectionVars {
    pub x: HashMap<(usize, Edge), Variable>,
    pub y: HashMap<(usize, usize), Variable>,
}

impl SelectionVars {
    pub fn new(problem: &mut ProblemVariables, config: &MapfConfig) -> Self {
        let unit = || {
            if config.integer {
                variable().binary()
            } else {
                variable().min(0.0).max(1.0)
            }
        };

        let mut x = HashMap::new();
        let mut y = HashMap::new();
        for agent in 0..config.num_agents() {
            for &edge in config.network.edges() {
                x.insert((agent, edge), problem.add(unit()));
            }
            for vertex in config.network.vertices() {
                y.insert((agent, vertex), problem.add(unit()));
            }
        }
        SelectionVars { x, y }
    }

    pub fn x(&self, agent: usize, edge: Edge) -> Variable {
        self.x[&(agent, edge)]
    }

    pub fn y(&self, agent: usize, vertex: usize) -> Variable {
        self.y[&(agent, vertex)]
    }
}

/// Arrival-time variables for the continuous formulations: `t_v[a, v]` is the
/// arrival of agent `a` at vertex `v`, `t_e[a, (u, v)]` the moment the agent
/// enters the edge. Both live in `[0, M]`; the big-M horizon strictly
/// upper-bounds every feasible arrival time.
#[derive(Debug)]
pub struct TimingVars {
    pub t_v: HashMap<(usize, usize), Variable>,
    pub t_e: HashMap<(usize, Edge), Variable>,
}

impl TimingVars {
    pub fn new(problem: &mut ProblemVariables, config: &MapfConfig, big_m: f64) -> Self {
        let mut t_v = HashMap::new();
        let mut t_e = HashMap::new();
        for agent in 0..config.num_agents() {
            for vertex in config.network.vertices() {
                t_v.insert(
                    (agent, vertex),
                    problem.add(variable().min(0.0).max(big_m)),
                );
            }
            for &edge in config.network.edges() {
                t_e.insert((agent, edge), problem.add(variable().min(0.0).max(big_m)));
            }
        }
        TimingVars { t_v, t_e }
    }

    pub fn vertex(&self, agent: usize, vertex: usize) -> Variable {
        self.t_v[&(agent, vertex)]
    }

    pub fn edge(&self, agent: usize, edge: Edge) -> Variable {
        self.t_e[&(agent, edge)]
    }
}

/// Disjunction pointers for the static conflict builder, one per agent pair
/// and conflict point. Keyed `(i, j, ...)` with `i < j` in agent order, which
/// halves the variable count and avoids symmetric duplicates.
#[derive(Debug)]
pub struct ConflictVars {
    pub vertex: HashMap<(usize, usize, usize), Variable>,
    pub edge: HashMap<(usize, usize, Edge), Variable>,
    pub swap: HashMap<(usize, usize, Edge), Variable>,
}

impl ConflictVars {
    pub fn new(problem: &mut ProblemVariables, config: &MapfConfig) -> Self {
        let unit = || {
            if config.integer {
                variable().binary()
            } else {
                variable().min(0.0).max(1.0)
            }
        };

        let mut vertex = HashMap::new();
        let mut edge = HashMap::new();
        let mut swap = HashMap::new();
        for (i, j) in (0..config.num_agents()).tuple_combinations() {
            for v in config.network.vertices() {
                vertex.insert((i, j, v), problem.add(unit()));
            }
            for &e in config.network.edges() {
                edge.insert((i, j, e), problem.add(unit()));
                if config.swap_constraint && config.network.has_reverse(e) {
                    swap.insert((i, j, e), problem.add(unit()));
                }
            }
        }
        ConflictVars { vertex, edge, swap }
    }
}

/// Time-indexed selection variables for the discrete formulation. Variables
/// only exist for steps at or after the agent's departure.
#[derive(Debug)]
pub struct DiscreteVars {
    pub horizon: usize,
    pub departures: Vec<usize>,
    pub x: HashMap<(usize, usize, Edge), Variable>,
    pub y: HashMap<(usize, usize, usize), Variable>,
}

impl DiscreteVars {
    pub fn new(problem: &mut ProblemVariables, config: &MapfConfig, horizon: usize) -> Self {
        let unit = || {
            if config.integer {
                variable().binary()
            } else {
                variable().min(0.0).max(1.0)
            }
        };

        let departures: Vec<usize> = config
            .agents
            .iter()
            .map(|agent| agent.departure.floor() as usize)
            .collect();

        let mut x = HashMap::new();
        let mut y = HashMap::new();
        for (agent, &departure) in departures.iter().enumerate() {
            for step in departure..horizon {
                for &edge in config.network.edges() {
                    x.insert((agent, step, edge), problem.add(unit()));
                }
                for vertex in config.network.vertices() {
                    y.insert((agent, step, vertex), problem.add(unit()));
                }
            }
        }
        DiscreteVars {
            horizon,
            departures,
            x,
            y,
        }
    }

    /// Steps during which the agent is present in the model.
    pub fn steps(&self, agent: usize) -> std::ops::Range<usize> {
        self.departures[agent]..self.horizon
    }

    pub fn x(&self, agent: usize, step: usize, edge: Edge) -> Variable {
        self.x[&(agent, step, edge)]
    }

    pub fn y(&self, agent: usize, step: usize, vertex: usize) -> Variable {
        self.y[&(agent, step, vertex)]
    }
}

use std::collections::{BTreeMap, HashSet};

use crate::error::MapfError;
use crate::network::Edge;
use crate::paths::AgentItinerary;

/// Default tolerance separating "just after" from "simultaneous".
pub const DEFAULT_TOLERANCE: f64 = 1e-9;

/// A detected pairwise conflict, or the first of them in scan order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Conflict {
    Vertex {
        vertex: usize,
        agent_1: usize,
        agent_2: usize,
    },
    Edge {
        /// Directed edge as traversed by `agent_1`; for a swap conflict
        /// `agent_2` traverses the reverse direction.
        edge: Edge,
        agent_1: usize,
        agent_2: usize,
        swap: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EventKind {
    Enter,
    Leave,
}

#[derive(Debug, Clone, Copy)]
struct Event {
    time: f64,
    kind: EventKind,
    agent: usize,
    inverted: bool,
}

/// Scans every vertex's occupancy event list for two agents with
/// overlapping dwell intervals.
///
/// Leave times are reduced by `epsilon` so an agent entering exactly as
/// another leaves does not read as a conflict, and zero-length dwells are
/// dropped entirely.
pub fn detect_vertex_conflict(paths: &[AgentItinerary], epsilon: f64) -> Option<Conflict> {
    let mut events: BTreeMap<usize, Vec<Event>> = BTreeMap::new();

    for (agent, itinerary) in paths.iter().enumerate() {
        for (k, &(enter, vertex)) in itinerary.vertices.iter().enumerate() {
            match itinerary.edges.get(k) {
                // The dwell ends when the outgoing edge starts.
                Some(&(leave, _)) => {
                    if leave - enter <= epsilon {
                        continue;
                    }
                    let list = events.entry(vertex).or_default();
                    list.push(event(enter, EventKind::Enter, agent));
                    list.push(event(leave - epsilon, EventKind::Leave, agent));
                }
                // Final vertex: the agent parks there for good.
                None => {
                    events
                        .entry(vertex)
                        .or_default()
                        .push(event(enter, EventKind::Enter, agent));
                }
            }
        }
    }

    for (vertex, list) in events.iter_mut() {
        if let Some((first, second)) = scan(list) {
            return Some(Conflict::Vertex {
                vertex: *vertex,
                agent_1: first.agent,
                agent_2: second.agent,
            });
        }
    }
    None
}

/// Mirror construction on edges. With `detect_swap`, anti-parallel
/// traversals share an ascending-endpoint key and an inverted flag; a
/// conflict between two agents that disagree on the flag is a swap.
pub fn detect_edge_conflict(
    paths: &[AgentItinerary],
    epsilon: f64,
    detect_swap: bool,
) -> Option<Conflict> {
    let mut events: BTreeMap<Edge, Vec<Event>> = BTreeMap::new();

    for (agent, itinerary) in paths.iter().enumerate() {
        for (k, &(enter, (u, v))) in itinerary.edges.iter().enumerate() {
            let Some(&(leave, _)) = itinerary.vertices.get(k + 1) else {
                continue;
            };
            if leave - enter <= epsilon {
                continue;
            }
            let (key, inverted) = if detect_swap && u > v {
                ((v, u), true)
            } else {
                ((u, v), false)
            };
            let list = events.entry(key).or_default();
            list.push(Event {
                inverted,
                ..event(enter, EventKind::Enter, agent)
            });
            list.push(Event {
                inverted,
                ..event(leave - epsilon, EventKind::Leave, agent)
            });
        }
    }

    for (&(u, v), list) in events.iter_mut() {
        if let Some((first, second)) = scan(list) {
            let edge = if first.inverted { (v, u) } else { (u, v) };
            return Some(Conflict::Edge {
                edge,
                agent_1: first.agent,
                agent_2: second.agent,
                swap: first.inverted != second.inverted,
            });
        }
    }
    None
}

/// First vertex conflict, then first edge conflict.
pub fn detect_conflict(
    paths: &[AgentItinerary],
    epsilon: f64,
    detect_swap: bool,
) -> Option<Conflict> {
    detect_vertex_conflict(paths, epsilon)
        .or_else(|| detect_edge_conflict(paths, epsilon, detect_swap))
}

fn event(time: f64, kind: EventKind, agent: usize) -> Event {
    Event {
        time,
        kind,
        agent,
        inverted: false,
    }
}

/// Sorts the list and walks consecutive events: intervals from different
/// agents nest or overlap exactly when two enters (or two leaves) end up
/// adjacent, violating the alternating enter/leave order.
fn scan(list: &mut [Event]) -> Option<(Event, Event)> {
    list.sort_by(|lhs, rhs| {
        lhs.time
            .total_cmp(&rhs.time)
            .then_with(|| (lhs.kind == EventKind::Leave).cmp(&(rhs.kind == EventKind::Leave)))
    });
    list.windows(2).find_map(|pair| {
        (pair[0].kind == pair[1].kind && pair[0].agent != pair[1].agent)
            .then(|| (pair[0], pair[1]))
    })
}

/// True when the flat occupancy list mentions any item twice.
pub fn has_duplicates(values: &[usize]) -> bool {
    let mut seen = HashSet::new();
    values.iter().any(|&v| !seen.insert(v))
}

/// Items claimed by more than one agent, with the claiming agent indices.
pub fn overlaps<T: Ord + Copy>(groups: &[Vec<T>]) -> BTreeMap<T, Vec<usize>> {
    let mut claims: BTreeMap<T, Vec<usize>> = BTreeMap::new();
    for (agent, group) in groups.iter().enumerate() {
        for &item in group {
            let list = claims.entry(item).or_default();
            if list.last() != Some(&agent) {
                list.push(agent);
            }
        }
    }
    claims.retain(|_, agents| agents.len() > 1);
    claims
}

/// Fatal form of the overlap check: the error lists every contested vertex
/// and the agents colliding on it.
pub fn ensure_disjoint(visits: &[Vec<usize>]) -> Result<(), MapfError> {
    let contested = overlaps(visits);
    if contested.is_empty() {
        return Ok(());
    }
    let details = contested
        .iter()
        .map(|(vertex, agents)| {
            let agents = agents
                .iter()
                .map(|a| a.to_string())
                .collect::<Vec<_>>()
                .join(", ");
            format!("vertex {vertex} claimed by agents {agents}")
        })
        .collect::<Vec<_>>()
        .join("; ");
    Err(MapfError::OverlappingPaths { details })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn itinerary(vertices: &[(f64, usize)], edges: &[(f64, Edge)]) -> AgentItinerary {
        AgentItinerary {
            vertices: vertices.to_vec(),
            edges: edges.to_vec(),
        }
    }

    #[test]
    fn test_disjoint_dwells_pass() {
        // Both agents visit vertex 1, at separate times.
        let paths = vec![
            itinerary(&[(0.0, 0), (2.0, 1), (4.0, 2)], &[(1.0, (0, 1)), (3.0, (1, 2))]),
            itinerary(&[(4.0, 3), (6.0, 1), (8.0, 4)], &[(5.0, (3, 1)), (7.0, (1, 4))]),
        ];
        assert_eq!(detect_conflict(&paths, DEFAULT_TOLERANCE, true), None);
    }

    #[test]
    fn test_vertex_overlap_detected() {
        let paths = vec![
            itinerary(&[(0.0, 0), (2.0, 1), (5.0, 2)], &[(1.0, (0, 1)), (4.0, (1, 2))]),
            itinerary(&[(0.0, 3), (3.0, 1), (6.0, 4)], &[(2.0, (3, 1)), (5.0, (1, 4))]),
        ];
        assert_eq!(
            detect_vertex_conflict(&paths, DEFAULT_TOLERANCE),
            Some(Conflict::Vertex {
                vertex: 1,
                agent_1: 0,
                agent_2: 1
            })
        );
    }

    #[test]
    fn test_touching_intervals_pass() {
        // Agent 1 enters vertex 1 at the exact moment agent 0 starts leaving.
        let paths = vec![
            itinerary(&[(0.0, 0), (2.0, 1), (5.0, 2)], &[(1.0, (0, 1)), (4.0, (1, 2))]),
            itinerary(&[(1.0, 3), (4.0, 1), (7.0, 4)], &[(3.0, (3, 1)), (6.0, (1, 4))]),
        ];
        assert_eq!(detect_vertex_conflict(&paths, DEFAULT_TOLERANCE), None);
    }

    #[test]
    fn test_zero_length_dwell_skipped() {
        // Agent 1 passes straight through vertex 1 while agent 0 dwells
        // nearby in time; the instantaneous transit is not an occupancy.
        let paths = vec![
            itinerary(&[(0.0, 0), (2.0, 1), (6.0, 2)], &[(1.0, (0, 1)), (5.0, (1, 2))]),
            itinerary(&[(0.0, 3), (3.0, 1), (4.0, 4)], &[(3.0, (3, 1)), (3.0, (1, 4))]),
        ];
        assert_eq!(detect_vertex_conflict(&paths, DEFAULT_TOLERANCE), None);
    }

    #[test]
    fn test_parked_target_conflicts() {
        // Agent 0 parks at vertex 2; agent 1 arrives there later.
        let paths = vec![
            itinerary(&[(0.0, 0), (2.0, 2)], &[(1.0, (0, 2))]),
            itinerary(&[(0.0, 1), (5.0, 2), (8.0, 3)], &[(4.0, (1, 2)), (7.0, (2, 3))]),
        ];
        assert_eq!(
            detect_vertex_conflict(&paths, DEFAULT_TOLERANCE),
            Some(Conflict::Vertex {
                vertex: 2,
                agent_1: 0,
                agent_2: 1
            })
        );
    }

    #[test]
    fn test_edge_overlap_detected() {
        let paths = vec![
            itinerary(&[(0.0, 0), (3.0, 1)], &[(1.0, (0, 1))]),
            itinerary(&[(0.0, 2), (2.0, 0), (4.5, 1)], &[(1.0, (2, 0)), (2.5, (0, 1))]),
        ];
        assert_eq!(
            detect_edge_conflict(&paths, DEFAULT_TOLERANCE, false),
            Some(Conflict::Edge {
                edge: (0, 1),
                agent_1: 0,
                agent_2: 1,
                swap: false
            })
        );
    }

    #[test]
    fn test_swap_detected_only_when_enabled() {
        let paths = vec![
            itinerary(&[(0.0, 0), (3.0, 1)], &[(1.0, (0, 1))]),
            itinerary(&[(0.0, 1), (3.5, 0)], &[(1.5, (1, 0))]),
        ];
        assert_eq!(detect_edge_conflict(&paths, DEFAULT_TOLERANCE, false), None);
        assert_eq!(
            detect_edge_conflict(&paths, DEFAULT_TOLERANCE, true),
            Some(Conflict::Edge {
                edge: (0, 1),
                agent_1: 0,
                agent_2: 1,
                swap: true
            })
        );
    }

    #[test]
    fn test_overlap_check() {
        assert!(has_duplicates(&[1, 2, 3, 4, 5, 2, 6, 2, 4]));
        let distinct: Vec<usize> = (1..=10).collect();
        assert!(!has_duplicates(&distinct));
    }

    #[test]
    fn test_ensure_disjoint_lists_collisions() {
        let visits = vec![vec![1, 2, 3], vec![4, 2, 5], vec![6, 2, 4]];
        let err = ensure_disjoint(&visits).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("vertex 2 claimed by agents 0, 1, 2"));
        assert!(message.contains("vertex 4 claimed by agents 1, 2"));

        assert!(ensure_disjoint(&[vec![1, 2], vec![3, 4]]).is_ok());
    }
}

use std::fs::OpenOptions;
use std::io::Write;

use serde::{Deserialize, Serialize};
use tracing::error;

/// Counters collected by a single solve.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SolveStats {
    pub time_ms: usize,
    pub milp_solves: usize,
    pub vertex_cuts: usize,
    pub edge_cuts: usize,
    pub swap_cuts: usize,
}

impl SolveStats {
    /// Appends one CSV record to `path`.
    pub fn append_csv(&self, path: &str, scenario: &str, solver: &str, objective: f64) {
        let line = format!(
            "{},{},{},{},{},{},{},{}\n",
            scenario,
            solver,
            objective,
            self.time_ms,
            self.milp_solves,
            self.vertex_cuts,
            self.edge_cuts,
            self.swap_cuts
        );

        let result = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .and_then(|mut file| file.write_all(line.as_bytes()));

        if let Err(e) = result {
            error!("Failed to write to file '{}': {}", path, e);
        }
    }
}

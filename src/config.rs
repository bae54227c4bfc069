use anyhow::anyhow;
use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    name = "MAPF-MILP",
    about = "Multi-agent path finding by MILP reduction, solved with HiGHS.",
    version = "0.1"
)]
pub struct Cli {
    #[arg(
        long,
        help = "Built-in scenario: two-branch-merge, parallel-lines, star, grid-cross, wheel, random-grid",
        default_value = "two-branch-merge"
    )]
    pub scenario: String,

    #[arg(long, help = "Path to a YAML scenario file; overrides --scenario")]
    pub scenario_path: Option<String>,

    #[arg(
        long,
        help = "Solver flavor: continuous, discrete, dynamic",
        default_value = "dynamic"
    )]
    pub solver: String,

    #[arg(long, help = "Number of agents for sized scenarios", default_value_t = 4)]
    pub num_agents: usize,

    #[arg(long, help = "Grid width for the random-grid scenario", default_value_t = 4)]
    pub grid_width: usize,

    #[arg(long, help = "Grid height for the random-grid scenario", default_value_t = 4)]
    pub grid_height: usize,

    #[arg(
        long,
        help = "Seed for the random number generator",
        default_value_t = 0
    )]
    pub seed: u64,

    #[arg(long, help = "Append a CSV stats record to this file")]
    pub output_path: Option<String>,

    #[arg(long, help = "Write the solved itineraries as JSON to this file")]
    pub solution_path: Option<String>,

    #[arg(long, help = "Solver time limit in seconds")]
    pub timeout_secs: Option<f64>,

    #[arg(long, help = "Big-M override for the continuous formulations")]
    pub big_m: Option<f64>,

    #[arg(long, help = "Time horizon for the discrete formulation")]
    pub time_duration: Option<usize>,

    #[arg(
        long,
        help = "Dynamic loop: commit to the cheaper ordering instead of branching",
        default_value_t = false
    )]
    pub heuristic_conflict: bool,

    #[arg(
        long,
        help = "Drop the anti-parallel swap constraints",
        default_value_t = false
    )]
    pub no_swap: bool,

    #[arg(
        long,
        help = "Solve the LP relaxation instead of the integer program",
        default_value_t = false
    )]
    pub lp_relaxation: bool,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub scenario: String,
    pub scenario_path: Option<String>,
    pub solver: String,
    pub num_agents: usize,
    pub grid_width: usize,
    pub grid_height: usize,
    pub seed: u64,
    pub output_path: Option<String>,
    pub solution_path: Option<String>,
    pub timeout_secs: Option<f64>,
    pub big_m: Option<f64>,
    pub time_duration: Option<usize>,
    pub heuristic_conflict: bool,
    pub no_swap: bool,
    pub lp_relaxation: bool,
}

impl Config {
    pub fn new(cli: &Cli) -> Self {
        Self {
            scenario: cli.scenario.clone(),
            scenario_path: cli.scenario_path.clone(),
            solver: cli.solver.clone(),
            num_agents: cli.num_agents,
            grid_width: cli.grid_width,
            grid_height: cli.grid_height,
            seed: cli.seed,
            output_path: cli.output_path.clone(),
            solution_path: cli.solution_path.clone(),
            timeout_secs: cli.timeout_secs,
            big_m: cli.big_m,
            time_duration: cli.time_duration,
            heuristic_conflict: cli.heuristic_conflict,
            no_swap: cli.no_swap,
            lp_relaxation: cli.lp_relaxation,
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        match self.solver.as_str() {
            "continuous" | "discrete" | "dynamic" => {}
            other => {
                return Err(anyhow!(
                    "Unknown solver '{}'; expected continuous, discrete, or dynamic",
                    other
                ))
            }
        }

        if self.scenario_path.is_none() {
            match self.scenario.as_str() {
                "two-branch-merge" | "parallel-lines" | "star" | "grid-cross" | "wheel"
                | "random-grid" => {}
                other => return Err(anyhow!("Unknown scenario '{}'", other)),
            }
        }

        if self.num_agents == 0 {
            return Err(anyhow!("At least one agent is required"));
        }

        if let Some(timeout) = self.timeout_secs {
            if timeout <= 0.0 {
                return Err(anyhow!(
                    "Timeout must be positive, got {}; omit the flag for unlimited",
                    timeout
                ));
            }
        }

        Ok(())
    }
}

mod config;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::info;
use tracing_subscriber::EnvFilter;

use config::{Cli, Config};
use mapf_milp::scenario::{self, Scenario};
use mapf_milp::stat::SolveStats;
use mapf_milp::{
    mapf_continuous_time, mapf_continuous_time_dynamic_conflict, mapf_discrete_time, MapfConfig,
};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = Config::new(&cli);
    config.validate()?;

    let mut problem = build_problem(&config)?;
    problem.integer = !config.lp_relaxation;
    problem.swap_constraint = !config.no_swap;
    problem.heuristic_conflict = config.heuristic_conflict;
    problem.big_m = config.big_m;
    problem.time_duration = config.time_duration;
    problem.timeout = config.timeout_secs;

    let scenario_label = config
        .scenario_path
        .clone()
        .unwrap_or_else(|| config.scenario.clone());

    let (json, objective, stats) = match config.solver.as_str() {
        "continuous" => {
            let solution = mapf_continuous_time(&problem)?;
            info!(objective = solution.objective, "solved");
            (
                serde_json::to_string_pretty(&solution)?,
                solution.objective,
                SolveStats::default(),
            )
        }
        "discrete" => {
            let solution = mapf_discrete_time(&problem)?;
            info!(objective = solution.objective, "solved");
            (
                serde_json::to_string_pretty(&solution)?,
                solution.objective,
                SolveStats::default(),
            )
        }
        "dynamic" => {
            let solution = mapf_continuous_time_dynamic_conflict(&problem)?;
            info!(
                objective = solution.objective,
                vertex_cuts = solution.stats.vertex_cuts,
                edge_cuts = solution.stats.edge_cuts,
                "solved"
            );
            let stats = solution.stats.clone();
            (
                serde_json::to_string_pretty(&solution)?,
                solution.objective,
                stats,
            )
        }
        _ => unreachable!(),
    };

    match &config.solution_path {
        Some(path) => {
            std::fs::write(path, &json).with_context(|| format!("writing solution to {path}"))?
        }
        None => println!("{json}"),
    }

    if let Some(path) = &config.output_path {
        stats.append_csv(path, &scenario_label, &config.solver, objective);
    }

    Ok(())
}

fn build_problem(config: &Config) -> Result<MapfConfig> {
    if let Some(path) = &config.scenario_path {
        let scenario =
            Scenario::load_from_yaml(path).with_context(|| format!("loading scenario {path}"))?;
        return Ok(scenario.to_config()?);
    }

    let problem = match config.scenario.as_str() {
        "two-branch-merge" => scenario::two_branch_merge()?,
        "parallel-lines" => scenario::parallel_lines(config.num_agents)?,
        "star" => scenario::directional_star(config.num_agents)?,
        "grid-cross" => scenario::grid_cross()?,
        "wheel" => scenario::wheel_pass(config.num_agents)?,
        "random-grid" => {
            let mut rng = StdRng::seed_from_u64(config.seed);
            scenario::random_grid(
                config.grid_width,
                config.grid_height,
                config.num_agents,
                &mut rng,
            )?
        }
        other => return Err(anyhow!("Unknown scenario '{}'", other)),
    };
    Ok(problem)
}

//! Solve command - play every seed of every problem and print the solutions
//!
//! ## Architecture (4-layer granularity)
//!
//! - Level 1: run() - orchestration
//! - Level 2: load_problems(), build_run_config(), solve_all(), verify(), print_json()
//! - Level 3: replay_solution(), progress bar setup
//! - Level 4: command arguments

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;

use hexfall_core::{Problem, ScoreWeights, Solution};
use hexfall_solver::{
    decode, run_problems_with_callback, RunConfig, RunResult, SolverConfig, SolverKind,
    FAILED_SOLUTION,
};

// ============================================================================
// COMMAND ARGUMENTS (Level 4 - Configuration)
// ============================================================================

#[derive(Args, Debug)]
pub struct SolveArgs {
    /// Problem JSON file (repeatable)
    #[arg(short = 'f', long = "file", value_name = "FILE", required = true)]
    pub files: Vec<PathBuf>,

    /// Power phrase to splice into solutions (repeatable)
    #[arg(short = 'p', long = "phrase", value_name = "PHRASE")]
    pub phrases: Vec<String>,

    /// Wall-clock budget in seconds
    #[arg(short = 't', long = "time", value_name = "SECONDS")]
    pub time: Option<u64>,

    /// Memory limit in megabytes
    #[arg(short = 'm', long = "memory", value_name = "MB")]
    pub memory: Option<u64>,

    /// Worker threads (0 = one per core)
    #[arg(short = 'c', long = "cores", default_value = "0")]
    pub cores: usize,

    /// Solving strategy
    #[arg(long, value_enum, default_value = "placement")]
    pub solver: SolverKind,

    /// Tag copied into every solution
    #[arg(long)]
    pub tag: Option<String>,

    /// Placement weights JSON file
    #[arg(long, value_name = "FILE")]
    pub weights: Option<PathBuf>,

    /// Replay every produced solution and compare scores
    #[arg(long)]
    pub check: bool,

    /// Score an existing solutions file instead of solving
    #[arg(long, value_name = "FILE")]
    pub solutions: Option<PathBuf>,

    /// Pretty-print JSON output
    #[arg(long)]
    pub pretty: bool,
}

/// Replayed score of one solution
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ScoreRecord {
    problem_id: u32,
    seed: u32,
    score: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

// ============================================================================
// LEVEL 1 - ORCHESTRATION
// ============================================================================

/// Run solve command
///
/// This function reads like a table of contents:
/// 1. Load problems
/// 2. Either score given solutions, or solve every seed
/// 3. Optionally verify by replay
/// 4. Print JSON to stdout
pub fn run(args: SolveArgs) -> Result<()> {
    let problems = load_problems(&args.files)?;

    if let Some(path) = &args.solutions {
        let solutions = load_solutions(path)?;
        let records = score_solutions(&problems, &solutions);
        return print_json(&records, args.pretty);
    }

    let config = build_run_config(&args)?;
    tracing::info!(
        "Solving {} problems with {:?} solver ({} phrases)",
        problems.len(),
        config.solver.kind,
        config.phrases.len()
    );

    let results = solve_all(&problems, &config)?;
    report_summary(&results);

    if args.check {
        verify(&problems, &results)?;
    }

    let solutions: Vec<&Solution> = results.iter().map(|r| &r.solution).collect();
    print_json(&solutions, args.pretty)
}

// ============================================================================
// LEVEL 2 - PHASES
// ============================================================================

fn load_problems(files: &[PathBuf]) -> Result<Vec<Problem>> {
    files
        .iter()
        .map(|path| {
            Problem::load(path).with_context(|| format!("Failed to load problem: {}", path.display()))
        })
        .collect()
}

fn load_solutions(path: &Path) -> Result<Vec<Solution>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read solutions: {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Invalid solutions JSON: {}", path.display()))
}

fn build_run_config(args: &SolveArgs) -> Result<RunConfig> {
    let mut solver = SolverConfig::new(args.solver);
    if let Some(path) = &args.weights {
        solver = solver.with_weights(load_weights(path)?);
    }

    let mut config = RunConfig::new(solver)
        .with_cores(args.cores)
        .with_phrases(args.phrases.clone());
    if let Some(seconds) = args.time {
        config = config.with_time_limit(Duration::from_secs(seconds));
    }
    if let Some(tag) = &args.tag {
        config = config.with_tag(tag.clone());
    }
    if let Some(memory) = args.memory {
        tracing::debug!(memory_mb = memory, "memory limit recorded, not enforced");
    }
    Ok(config)
}

/// Solve with a progress bar on stderr
fn solve_all(problems: &[Problem], config: &RunConfig) -> Result<Vec<RunResult>> {
    let runs: u64 = problems.iter().map(|p| p.source_seeds.len() as u64).sum();
    let pb = progress_bar(runs)?;

    let results = run_problems_with_callback(problems, config, |result| {
        pb.inc(1);
        pb.set_message(format!(
            "problem {} seed {}: {}",
            result.solution.problem_id, result.solution.seed, result.score
        ));
    })?;

    pb.finish_and_clear();
    Ok(results)
}

/// Replay every solution and fail if a score differs from what the solver reported
fn verify(problems: &[Problem], results: &[RunResult]) -> Result<()> {
    let mut mismatches = 0;
    for result in results.iter().filter(|r| !r.failed) {
        let record = replay_solution(problems, &result.solution);
        if record.error.is_some() || record.score != result.score {
            tracing::warn!(
                "Problem {} seed {}: replay scored {} ({:?}), solver reported {}",
                record.problem_id,
                record.seed,
                record.score,
                record.error,
                result.score
            );
            mismatches += 1;
        }
    }
    if mismatches > 0 {
        bail!("{} solutions failed replay", mismatches);
    }
    tracing::info!("All {} solutions replayed", results.len());
    Ok(())
}

fn score_solutions(problems: &[Problem], solutions: &[Solution]) -> Vec<ScoreRecord> {
    solutions
        .iter()
        .map(|solution| replay_solution(problems, solution))
        .collect()
}

fn print_json<T: Serialize>(value: &T, pretty: bool) -> Result<()> {
    let json = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{}", json);
    Ok(())
}

fn report_summary(results: &[RunResult]) {
    let total: u64 = results.iter().map(|r| r.score).sum();
    let failed = results.iter().filter(|r| r.failed).count();
    tracing::info!(
        "Finished {} runs: total score {}, {} failed",
        results.len(),
        total,
        failed
    );
}

// ============================================================================
// LEVEL 3 - STEPS
// ============================================================================

/// Score one solution by replaying it on a fresh game
fn replay_solution(problems: &[Problem], solution: &Solution) -> ScoreRecord {
    let mut record = ScoreRecord {
        problem_id: solution.problem_id,
        seed: solution.seed,
        score: 0,
        error: None,
    };
    if solution.solution == FAILED_SOLUTION {
        record.error = Some("run failed".to_string());
        return record;
    }
    let Some(problem) = problems.iter().find(|p| p.id == solution.problem_id) else {
        record.error = Some("unknown problem".to_string());
        return record;
    };
    let outcome = decode(&solution.solution)
        .map_err(|e| e.to_string())
        .and_then(|actions| {
            let mut game = problem.make_game_with_seed(solution.seed).map_err(|e| e.to_string())?;
            game.replay(&actions).map_err(|e| e.to_string())
        });
    match outcome {
        Ok(report) => record.score = report.score,
        Err(error) => record.error = Some(error),
    }
    record
}

fn load_weights(path: &Path) -> Result<ScoreWeights> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read weights: {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Invalid weights JSON: {}", path.display()))
}

fn progress_bar(runs: u64) -> Result<ProgressBar> {
    let pb = ProgressBar::new(runs);
    pb.set_style(
        ProgressStyle::with_template("{spinner} {elapsed_precise} [{bar:30}] {pos}/{len} {msg}")?
            .progress_chars("=> "),
    );
    pb.enable_steady_tick(Duration::from_millis(120));
    Ok(pb)
}

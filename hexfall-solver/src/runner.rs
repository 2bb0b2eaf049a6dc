//! Runner - solves (problem, seed) pairs in parallel
//!
//! Level 1 - Orchestration
//!
//! Every run builds its own game and solver, so runs share nothing but the cancel
//! token. A failing run is contained at this boundary and reported with a sentinel
//! solution instead of aborting the batch.

use std::panic::{self, AssertUnwindSafe};
use std::time::Instant;

use hexfall_core::{Problem, Solution};
use rayon::prelude::*;

use crate::commands::{apply_phrases, encode};
use crate::config::RunConfig;
use crate::solver::{CancelToken, SolveError};

/// Solution string of a run that failed
pub const FAILED_SOLUTION: &str = "error";

/// Outcome of one completed run
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunResult {
    pub solution: Solution,
    /// Score of the played game, 0 for a failed run
    pub score: u64,
    /// Number of commands played
    pub moves: usize,
    pub failed: bool,
}

/// Solve every seed of every problem, results in input order.
///
/// Runs cut off by the time limit are left out.
pub fn run_problems(problems: &[Problem], config: &RunConfig) -> Result<Vec<RunResult>, SolveError> {
    run_problems_with_callback(problems, config, |_| {})
}

/// As [`run_problems`], calling `on_done` as each run completes
pub fn run_problems_with_callback<F>(
    problems: &[Problem],
    config: &RunConfig,
    on_done: F,
) -> Result<Vec<RunResult>, SolveError>
where
    F: Fn(&RunResult) + Sync,
{
    let jobs = prepare_jobs(problems);
    let cancel = match config.time_limit {
        Some(limit) => CancelToken::with_deadline(limit),
        None => CancelToken::new(),
    };
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.cores)
        .build()?;

    tracing::info!(
        runs = jobs.len(),
        threads = pool.current_num_threads(),
        solver = ?config.solver.kind,
        "starting batch"
    );

    let results: Vec<Option<RunResult>> = pool.install(|| {
        jobs.par_iter()
            .map(|&(problem, seed_index)| {
                let result = run_seed(&problems[problem], seed_index, config, &cancel)?;
                if let Some(result) = &result {
                    on_done(result);
                }
                Ok(result)
            })
            .collect::<Result<_, SolveError>>()
    })?;

    let total = results.len();
    let completed: Vec<RunResult> = results.into_iter().flatten().collect();
    if completed.len() < total {
        tracing::warn!(
            omitted = total - completed.len(),
            "time limit reached, unfinished runs omitted"
        );
    }
    Ok(completed)
}

/// Solve one seed of a problem. `None` when the run was cancelled.
///
/// Fails only for a seed index the problem does not have.
pub fn run_seed(
    problem: &Problem,
    seed_index: usize,
    config: &RunConfig,
    cancel: &CancelToken,
) -> Result<Option<RunResult>, SolveError> {
    let seed = problem.seed(seed_index)?;
    let start = Instant::now();

    let outcome = panic::catch_unwind(AssertUnwindSafe(|| solve_seed(problem, seed, config, cancel)));
    let result = match outcome {
        Ok(Ok((commands, score, moves))) => RunResult {
            solution: solution(problem, seed, commands, config),
            score,
            moves,
            failed: false,
        },
        Ok(Err(SolveError::Cancelled)) => {
            tracing::debug!(problem = problem.id, seed, "run cancelled");
            return Ok(None);
        }
        Ok(Err(err)) => {
            tracing::warn!(problem = problem.id, seed, error = %err, "run failed");
            failed(problem, seed, config)
        }
        Err(_) => {
            tracing::warn!(problem = problem.id, seed, "run panicked");
            failed(problem, seed, config)
        }
    };

    tracing::info!(
        problem = problem.id,
        seed,
        score = result.score,
        moves = result.moves,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "run finished"
    );
    Ok(Some(result))
}

// ============================================================================
// Level 3 - Steps
// ============================================================================

/// (problem index, seed index) for every run
fn prepare_jobs(problems: &[Problem]) -> Vec<(usize, usize)> {
    problems
        .iter()
        .enumerate()
        .flat_map(|(p, problem)| (0..problem.source_seeds.len()).map(move |s| (p, s)))
        .collect()
}

/// Play one game; commands with phrases applied, final score, command count
fn solve_seed(
    problem: &Problem,
    seed: u32,
    config: &RunConfig,
    cancel: &CancelToken,
) -> Result<(String, u64, usize), SolveError> {
    let mut game = problem.make_game_with_seed(seed)?;
    let mut solver = config.solver.build(seed);
    let actions = solver.solve(&mut game, cancel)?;
    let commands = apply_phrases(&encode(&actions), &config.phrases);
    Ok((commands, game.score(), actions.len()))
}

fn solution(problem: &Problem, seed: u32, commands: String, config: &RunConfig) -> Solution {
    Solution {
        problem_id: problem.id,
        seed,
        tag: config.tag.clone(),
        solution: commands,
    }
}

fn failed(problem: &Problem, seed: u32, config: &RunConfig) -> RunResult {
    RunResult {
        solution: solution(problem, seed, FAILED_SOLUTION.to_string(), config),
        score: 0,
        moves: 0,
        failed: true,
    }
}

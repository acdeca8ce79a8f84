//! The outer solve, spread and legalize loop.
//!
//! Block types are processed as separate runs, in the order their first
//! movable block appears in the netlist. Every type is solved once without
//! anchors before the loop starts. Each iteration then, for every run in
//! turn, re-solves the type with anchors toward its last legal locations,
//! spreads it with the [`CutSpreader`] and legalizes it with the
//! [`StrictLegalizer`]. Once all runs are legal the total HPWL is compared
//! against the best seen so far; the loop stops after a configurable number of
//! iterations without improvement.
//!
//! The placement handed back is the best legal one observed, which is never
//! worse than the incoming placement.

use crate::codes;
use crate::context::PlacementContext;
use crate::error::PlaceError;
use crate::feasibility::check_feasibility;
use crate::ids::BlockId;
use crate::legalizer::{LegalizeStats, StrictLegalizer};
use crate::locations::BlockLocationStore;
use crate::occupancy::GridOccupancy;
use crate::placement::Placement;
use crate::report;
use crate::solver::AnalyticSolver;
use crate::spreader::{CutSpreader, SpreadStats};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tessera_config::validate_config;
use tessera_device::BlockTypeId;
use tessera_diagnostics::DiagnosticSink;

/// Statistics of one block-type run inside an iteration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunStats {
    /// Outer iteration the run belongs to.
    pub iteration: usize,
    /// Seconds since placement started, at the end of the run.
    pub elapsed: f64,
    /// Seconds spent in the whole run.
    pub run_time: f64,
    /// Name of the block type.
    pub block_type: String,
    /// Number of solved rows (single blocks and macro heads).
    pub solve_blocks: usize,
    /// Seconds spent solving.
    pub solve_time: f64,
    /// Seconds spent spreading.
    pub spread_time: f64,
    /// Seconds spent legalizing.
    pub legal_time: f64,
    /// Total HPWL after solving.
    pub solved_hpwl: i64,
    /// Total HPWL after spreading, `None` if the type is not spread.
    pub spread_hpwl: Option<i64>,
    /// Total HPWL after legalizing.
    pub legal_hpwl: i64,
    /// Spreader counters, `None` if the type is not spread.
    pub spread: Option<SpreadStats>,
    /// Legalizer counters.
    pub legalize: LegalizeStats,
}

/// Statistics of one outer iteration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IterationStats {
    /// Iteration number, starting at zero.
    pub iteration: usize,
    /// Seconds since placement started, at the end of the iteration.
    pub elapsed: f64,
    /// Seconds spent in the iteration.
    pub iteration_time: f64,
    /// Legal HPWL reached by this iteration.
    pub legal_hpwl: i64,
    /// Best legal HPWL of any iteration so far.
    pub best_hpwl: i64,
    /// Consecutive iterations without improvement, this one included.
    pub stalled: usize,
}

/// Result of [`analytic_place`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlacementOutcome {
    /// The best legal placement observed.
    pub placement: Placement,
    /// Total HPWL of `placement`.
    pub hpwl: i64,
    /// Total HPWL of the incoming placement.
    pub initial_hpwl: i64,
    /// Per-iteration statistics.
    pub iterations: Vec<IterationStats>,
    /// Per-run statistics, in execution order.
    pub runs: Vec<RunStats>,
}

/// Improves the legal placement `placement` in place.
///
/// The settings in `ctx` are validated first and the incoming placement
/// must be complete and legal. On success
/// `placement` holds the best legal placement found and the returned
/// outcome carries it together with the statistics of every run and
/// iteration. Progress is reported to `sink` as placement notes.
pub fn analytic_place(
    ctx: &PlacementContext<'_>,
    placement: &mut Placement,
    sink: &DiagnosticSink,
) -> Result<PlacementOutcome, PlaceError> {
    if let Err(err) = validate_config(ctx.config) {
        sink.emit(codes::error_invalid_config(&err));
        return Err(err.into());
    }
    check_feasibility(ctx, sink)?;
    let mut occ = match GridOccupancy::from_placement(ctx, placement) {
        Ok(occ) => occ,
        Err(err) => {
            if let PlaceError::InvalidPlacement(msg) = &err {
                sink.emit(codes::error_invalid_placement(msg));
            }
            return Err(err);
        }
    };

    let netlist = ctx.netlist;
    let config = ctx.config;
    let mut store = BlockLocationStore::from_placement(placement);
    let initial_hpwl = store.total_hpwl(netlist);

    let place_blocks: Vec<BlockId> = netlist
        .block_ids()
        .filter(|&b| ctx.is_placeable(b))
        .collect();
    let run_types = run_order(ctx, &place_blocks);

    let mut outcome = PlacementOutcome {
        placement: placement.clone(),
        hpwl: initial_hpwl,
        initial_hpwl,
        iterations: Vec::new(),
        runs: Vec::new(),
    };
    if run_types.is_empty() {
        sink.emit(codes::warn_nothing_to_place());
        return Ok(outcome);
    }
    sink.emit(codes::note_started(
        place_blocks.len(),
        initial_hpwl,
        report::status_header(),
    ));

    let start = Instant::now();
    let mut rng = StdRng::seed_from_u64(config.legalizer.seed);
    let mut solver = AnalyticSolver::new(*ctx);
    for &block_type in &run_types {
        solver.build_solve_type(&mut store, &place_blocks, block_type, None);
    }

    let mut iteration = 0;
    let mut stalled = 0;
    let mut best_hpwl = i64::MAX;
    while stalled < config.analytic.stall_iterations
        && config.analytic.max_iterations.map_or(true, |max| iteration < max)
    {
        let iteration_start = Instant::now();
        let mut legal_hpwl = initial_hpwl;

        for &block_type in &run_types {
            let run_start = Instant::now();
            solver.build_solve_type(&mut store, &place_blocks, block_type, Some(iteration));
            let solve_blocks = solver.solve_blocks().to_vec();
            let solve_time = run_start.elapsed().as_secs_f64();
            let solved_hpwl = store.total_hpwl(netlist);

            let spread_start = Instant::now();
            let type_name = ctx.device.block_type_name(block_type);
            let spread = if config.spreader.skip_types.iter().any(|t| t == type_name) {
                None
            } else {
                let mut spreader = CutSpreader::new(*ctx, block_type);
                let stats = spreader.cut_spread(&mut store, &solve_blocks);
                store.update_macros(ctx.macros, ctx.device);
                if stats.unrelieved > 0 {
                    sink.emit(codes::warn_regions_overused(type_name, stats.unrelieved));
                }
                Some(stats)
            };
            let spread_hpwl = spread.map(|_| store.total_hpwl(netlist));
            let spread_time = spread_start.elapsed().as_secs_f64();

            let legal_start = Instant::now();
            let legalizer = StrictLegalizer::new(*ctx, block_type);
            let legalize =
                legalizer.strict_legalize(&mut store, &mut occ, &solve_blocks, &mut rng)?;
            store.update_macros(ctx.macros, ctx.device);
            legal_hpwl = store.total_hpwl(netlist);
            let legal_time = legal_start.elapsed().as_secs_f64();

            let stats = RunStats {
                iteration,
                elapsed: start.elapsed().as_secs_f64(),
                run_time: run_start.elapsed().as_secs_f64(),
                block_type: type_name.to_string(),
                solve_blocks: solve_blocks.len(),
                solve_time,
                spread_time,
                legal_time,
                solved_hpwl,
                spread_hpwl,
                legal_hpwl,
                spread,
                legalize,
            };
            sink.emit(codes::note_run(report::run_row(&stats)));
            outcome.runs.push(stats);
        }

        if legal_hpwl < best_hpwl {
            best_hpwl = legal_hpwl;
            stalled = 0;
        } else {
            stalled += 1;
        }
        if legal_hpwl < outcome.hpwl {
            outcome.hpwl = legal_hpwl;
            outcome.placement = occ.to_placement();
        }
        store.commit_legal();

        let stats = IterationStats {
            iteration,
            elapsed: start.elapsed().as_secs_f64(),
            iteration_time: iteration_start.elapsed().as_secs_f64(),
            legal_hpwl,
            best_hpwl,
            stalled,
        };
        sink.emit(codes::note_iteration(report::iteration_row(&stats)));
        outcome.iterations.push(stats);
        iteration += 1;
    }

    sink.emit(codes::note_finished(outcome.iterations.len(), outcome.hpwl));
    *placement = outcome.placement.clone();
    Ok(outcome)
}

/// Distinct types of `place_blocks`, in first-appearance order.
fn run_order(ctx: &PlacementContext<'_>, place_blocks: &[BlockId]) -> Vec<BlockTypeId> {
    let mut types = Vec::new();
    for &block in place_blocks {
        let block_type = ctx.netlist.block(block).block_type;
        if !types.contains(&block_type) {
            types.push(block_type);
        }
    }
    types
}

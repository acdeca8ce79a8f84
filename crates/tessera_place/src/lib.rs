//! Analytic placement engine.
//!
//! Given a device grid, a clustered netlist with rigid macros, and a legal
//! seed placement, [`analytic_place`] iteratively improves the placement's
//! half-perimeter wirelength while keeping it legal.
//!
//! # Pipeline
//!
//! 1. **Check**: every block type must fit on the device
//! 2. **Solve**: per block type, minimize a quadratic bound-to-bound
//!    wirelength model with a sparse conjugate-gradient solver
//! 3. **Spread**: recursively cut overused regions and interpolate blocks
//!    into the slots they offer
//! 4. **Legalize**: bind every block to a distinct compatible slot, macros
//!    as rigid groups
//!
//! Steps 2–4 repeat until the legal wirelength stops improving.
//!
//! # Usage
//!
//! ```ignore
//! use tessera_place::{analytic_place, random_placement, Placement, PlacementContext};
//!
//! let ctx = PlacementContext::new(&device, &netlist, &macros, &config);
//! let mut placement = Placement::new(netlist.block_count());
//! random_placement(&ctx, &mut placement, &mut rng)?;
//! let outcome = analytic_place(&ctx, &mut placement, &sink)?;
//! assert!(outcome.hpwl <= outcome.initial_hpwl);
//! ```

#![warn(missing_docs)]

pub mod codes;
pub mod context;
pub mod equation;
pub mod error;
pub mod feasibility;
pub mod ids;
pub mod legalizer;
pub mod locations;
pub mod macros;
pub mod netlist;
pub mod occupancy;
pub mod placement;
pub mod placer;
pub mod random;
pub mod report;
pub mod sites;
pub mod solver;
pub mod spreader;

#[cfg(test)]
mod test_util;

pub use context::{PinCriticality, PlacementContext};
pub use equation::EquationSystem;
pub use error::PlaceError;
pub use feasibility::check_feasibility;
pub use ids::{BlockId, MacroId, NetId, PinId};
pub use legalizer::{LegalizeStats, StrictLegalizer};
pub use locations::{Axis, BlockLocation, BlockLocationStore};
pub use macros::{MacroMember, MacroTable, PlacementMacro};
pub use netlist::{Block, ClusteredNetlist, Net, Pin, PinDirection};
pub use occupancy::GridOccupancy;
pub use placement::Placement;
pub use placer::{analytic_place, IterationStats, PlacementOutcome, RunStats};
pub use random::random_placement;
pub use report::{iteration_row, overlap_grid, placement_report, run_row, status_header};
pub use sites::CompatibleSites;
pub use solver::AnalyticSolver;
pub use spreader::{CutOutcome, CutSpreader, SpreadStats, SpreaderRegion};

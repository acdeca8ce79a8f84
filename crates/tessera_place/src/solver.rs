//! Quadratic wirelength solver using the bound-to-bound net model.
//!
//! For one block type at a time, every movable block (or macro head) of that
//! type becomes a row of a sparse system per axis. Blocks of other types and
//! fixed blocks contribute constants. Each net is reduced to weighted two-pin
//! connections between its extreme pins and every other pin, with weights
//! `1 / ((p - 1) * max(1, distance))` so the quadratic objective tracks HPWL.
//! After the first outer iteration, pseudo-connections pull each row toward
//! the block's last legal location with a strength growing with the iteration.

use crate::context::PlacementContext;
use crate::equation::EquationSystem;
use crate::ids::{BlockId, PinId};
use crate::locations::{Axis, BlockLocationStore};
use crate::netlist::PinDirection;
use tessera_device::BlockTypeId;

/// Builds and solves the per-type, per-axis quadratic systems.
pub struct AnalyticSolver<'a> {
    ctx: PlacementContext<'a>,
    rows: Vec<Option<usize>>,
    solve_blocks: Vec<BlockId>,
}

impl<'a> AnalyticSolver<'a> {
    /// Creates a solver with no rows assigned.
    pub fn new(ctx: PlacementContext<'a>) -> Self {
        Self {
            ctx,
            rows: vec![None; ctx.netlist.block_count()],
            solve_blocks: Vec::new(),
        }
    }

    /// Assigns rows to the blocks of `place_blocks` having type `block_type`.
    ///
    /// Macro members share the row of their head; every other block is a constant.
    pub fn setup_solve_blocks(&mut self, place_blocks: &[BlockId], block_type: BlockTypeId) {
        let netlist = self.ctx.netlist;
        self.rows.iter_mut().for_each(|r| *r = None);
        self.solve_blocks.clear();
        for &block in place_blocks {
            if netlist.block(block).block_type != block_type {
                continue;
            }
            self.rows[block.index()] = Some(self.solve_blocks.len());
            self.solve_blocks.push(block);
        }
        for m in self.ctx.macros.iter() {
            let head_row = self.rows[m.head().index()];
            for member in &m.members {
                self.rows[member.block.index()] = head_row;
            }
        }
    }

    /// Blocks currently being solved, in row order.
    pub fn solve_blocks(&self) -> &[BlockId] {
        &self.solve_blocks
    }

    /// The row of `block`, `None` if it is a constant in the current solve.
    pub fn row_of(&self, block: BlockId) -> Option<usize> {
        self.rows[block.index()]
    }

    /// Adds one weighted connection term for equation `eqn` and variable `var`.
    fn stamp(
        &self,
        es: &mut EquationSystem,
        store: &BlockLocationStore,
        axis: Axis,
        var: BlockId,
        eqn: BlockId,
        weight: f64,
    ) {
        let Some(eqn_row) = self.row_of(eqn) else {
            return;
        };
        match self.row_of(var) {
            Some(var_row) => {
                es.add_coeff(eqn_row, var_row, weight);
                // var is solved through its head, so its offset is a constant
                if self.ctx.macros.macro_of(var).is_some() {
                    let offset = self.ctx.macros.offset_of(var);
                    let d = match axis {
                        Axis::X => offset.dx,
                        Axis::Y => offset.dy,
                    };
                    es.add_rhs(eqn_row, -f64::from(d) * weight);
                }
            }
            None => es.add_rhs(eqn_row, -f64::from(store.pos(var, axis)) * weight),
        }
    }

    fn add_pin_to_pin(
        &self,
        es: &mut EquationSystem,
        store: &BlockLocationStore,
        axis: Axis,
        num_pins: usize,
        bound_pin: PinId,
        this_pin: PinId,
    ) {
        if this_pin == bound_pin {
            return;
        }
        let netlist = self.ctx.netlist;
        let this_blk = netlist.pin_block(this_pin);
        let bound_blk = netlist.pin_block(bound_pin);
        let distance = (store.pos(bound_blk, axis) - store.pos(this_blk, axis)).abs();
        let mut weight = 1.0 / ((num_pins - 1) as f64 * f64::from(distance.max(1)));

        if let Some(crit) = self.ctx.criticality {
            if netlist.pin(this_pin).direction == PinDirection::Sink {
                let analytic = &self.ctx.config.analytic;
                let c = crit.criticality(this_pin).clamp(0.0, 1.0);
                weight *= 1.0 + analytic.timing_weight * c.powf(analytic.criticality_exponent);
            }
        }

        self.stamp(es, store, axis, this_blk, this_blk, weight);
        self.stamp(es, store, axis, this_blk, bound_blk, -weight);
        self.stamp(es, store, axis, bound_blk, bound_blk, weight);
        self.stamp(es, store, axis, bound_blk, this_blk, -weight);
    }

    /// Fills `es` with the net model along `axis`.
    ///
    /// `anchor_iter` is the outer iteration whose legal locations anchor the
    /// rows; `None` builds the unanchored system.
    pub fn build_equations(
        &self,
        es: &mut EquationSystem,
        store: &BlockLocationStore,
        axis: Axis,
        anchor_iter: Option<usize>,
    ) {
        let netlist = self.ctx.netlist;
        let max_fanout = self.ctx.config.analytic.max_net_fanout;
        es.reset();

        for net_id in netlist.net_ids() {
            let net = netlist.net(net_id);
            if net.is_ignored || net.driver.is_none() || net.sinks.is_empty() {
                continue;
            }
            let num_pins = net.pin_count();
            if max_fanout.is_some_and(|max| num_pins > max) {
                continue;
            }

            let pos = |pin: PinId| store.pos(netlist.pin_block(pin), axis);
            let mut pins = netlist.net_pins(net_id);
            let Some(first) = pins.next() else {
                continue;
            };
            let (mut min_pin, mut max_pin) = (first, first);
            for pin in pins {
                if pos(pin) < pos(min_pin) {
                    min_pin = pin;
                }
                if pos(pin) > pos(max_pin) {
                    max_pin = pin;
                }
            }

            for pin in netlist.net_pins(net_id) {
                self.add_pin_to_pin(es, store, axis, num_pins, min_pin, pin);
                if pin != min_pin {
                    self.add_pin_to_pin(es, store, axis, num_pins, max_pin, pin);
                }
            }
        }

        if let Some(iter) = anchor_iter {
            let alpha = self.ctx.config.analytic.alpha;
            for (row, &block) in self.solve_blocks.iter().enumerate() {
                let loc = store.get(block);
                let legal = axis.of(loc.legal_loc);
                let current = axis.of(loc.loc);
                let weight = alpha * iter as f64 / f64::from((legal - current).abs().max(1));
                es.add_coeff(row, row, weight);
                es.add_rhs(row, weight * f64::from(legal));
            }
        }
    }

    /// Solves `es` warm-started from the raw coordinates and writes the result back.
    ///
    /// Raw coordinates are floored at zero; integer locations are rounded and
    /// clamped into the grid.
    pub fn solve_equations(&self, es: &EquationSystem, store: &mut BlockLocationStore, axis: Axis) {
        let mut x: Vec<f64> = self
            .solve_blocks
            .iter()
            .map(|&b| store.get(b).raw(axis))
            .collect();
        es.solve(&mut x, self.ctx.config.analytic.solver_tolerance);

        let limit = axis.extent(self.ctx.device) - 1;
        for (&block, &value) in self.solve_blocks.iter().zip(&x) {
            let loc = store.get_mut(block);
            loc.set_raw(axis, value.max(0.0));
            let snapped = ((value + 0.5).floor() as i32).clamp(0, limit);
            axis.set(&mut loc.loc, snapped);
        }
    }

    /// Runs `build_solve_iter` build/solve rounds along one axis.
    pub fn build_solve_direction(
        &self,
        store: &mut BlockLocationStore,
        axis: Axis,
        anchor_iter: Option<usize>,
    ) {
        let n = self.solve_blocks.len();
        let mut es = EquationSystem::new(n, n);
        for _ in 0..self.ctx.config.analytic.build_solve_iter {
            self.build_equations(&mut es, store, axis, anchor_iter);
            self.solve_equations(&es, store, axis);
        }
    }

    /// Solves all blocks of `block_type` along both axes, then re-derives macro members.
    ///
    /// Iteration 0 and `None` build unanchored systems.
    pub fn build_solve_type(
        &mut self,
        store: &mut BlockLocationStore,
        place_blocks: &[BlockId],
        block_type: BlockTypeId,
        iter: Option<usize>,
    ) {
        self.setup_solve_blocks(place_blocks, block_type);
        let anchor_iter = iter.filter(|&i| i > 0);
        for axis in Axis::BOTH {
            self.build_solve_direction(store, axis, anchor_iter);
        }
        store.update_macros(self.ctx.macros, self.ctx.device);
    }
}

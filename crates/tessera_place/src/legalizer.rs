//! Greedy strict legalization of one block type.
//!
//! Every solve block of the type is unbound and re-bound to a concrete slot,
//! largest macros first. Each block samples random cells in a square around
//! its spread location; the square grows when samples keep failing. Single
//! blocks explore for a while, keeping the candidate with the shortest input
//! wirelength, and may evict other single blocks of the run, which go back
//! into the queue. Macros are only placed where every member lands on a
//! compatible slot not held by another macro.

use crate::context::PlacementContext;
use crate::ids::BlockId;
use crate::locations::BlockLocationStore;
use crate::netlist::PinDirection;
use crate::occupancy::GridOccupancy;
use crate::sites::CompatibleSites;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::{BinaryHeap, HashSet};
use tessera_common::{InternalError, TesseraResult};
use tessera_device::{BlockTypeId, Loc};

/// Counters of one legalization pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegalizeStats {
    /// Heads and single blocks legalized.
    pub blocks: usize,
    /// Blocks taken off the queue, evicted ones included.
    pub attempts: usize,
    /// Blocks evicted to make room.
    pub ripped_up: usize,
    /// Rip-up radius reached at the end of the pass.
    pub ripup_radius: i32,
}

struct Pass<'s, R> {
    store: &'s mut BlockLocationStore,
    occ: &'s mut GridOccupancy,
    rng: &'s mut R,
    remaining: BinaryHeap<(usize, BlockId)>,
    scope: HashSet<BlockId>,
    ripped_up: usize,
}

/// Binds the solve blocks of one type to legal slots.
pub struct StrictLegalizer<'a> {
    ctx: PlacementContext<'a>,
    sites: CompatibleSites,
}

impl<'a> StrictLegalizer<'a> {
    /// Creates a legalizer for `block_type`.
    pub fn new(ctx: PlacementContext<'a>, block_type: BlockTypeId) -> Self {
        Self {
            ctx,
            sites: CompatibleSites::new(ctx.device, block_type),
        }
    }

    /// Legalizes `solve_blocks` (heads and single blocks of the type).
    ///
    /// On success every solve block and macro member is bound in `occ` and
    /// its integer location in `store` equals the bound slot. Exceeding the
    /// iteration caps is an internal error: it only happens when the type
    /// has fewer usable slots than blocks, which the feasibility check rules
    /// out up front.
    pub fn strict_legalize(
        &self,
        store: &mut BlockLocationStore,
        occ: &mut GridOccupancy,
        solve_blocks: &[BlockId],
        rng: &mut impl Rng,
    ) -> TesseraResult<LegalizeStats> {
        let netlist = self.ctx.netlist;
        let macros = self.ctx.macros;
        let scope: HashSet<BlockId> = solve_blocks.iter().copied().collect();

        for block in netlist.block_ids() {
            let in_scope = scope.contains(&block)
                || macros.head_of(block).is_some_and(|h| scope.contains(&h));
            if in_scope && !netlist.block(block).is_fixed {
                occ.unbind(block);
            }
        }

        let mut pass = Pass {
            store,
            occ,
            rng,
            remaining: solve_blocks
                .iter()
                .map(|&b| (macros.size_of(b), b))
                .collect(),
            scope,
            ripped_up: 0,
        };

        let max_dim = (self.sites.width() - 1).max(self.sites.height() - 1);
        let global_cap = 5000.max(8 * netlist.block_count());
        let mut ripup_radius = self.ctx.config.legalizer.initial_ripup_radius;
        let mut total_iters = 0;
        let mut attempts = 0;

        while let Some((_, block)) = pass.remaining.pop() {
            if pass.occ.is_placed(block) {
                continue;
            }
            total_iters += 1;
            attempts += 1;
            if total_iters > solve_blocks.len() {
                total_iters = 0;
                ripup_radius = max_dim.min(ripup_radius * 2);
            }
            if attempts > global_cap {
                return Err(InternalError::new(format!(
                    "strict legalization gave up after {attempts} block attempts"
                )));
            }
            self.place_block(&mut pass, block, ripup_radius, max_dim)?;
        }

        Ok(LegalizeStats {
            blocks: solve_blocks.len(),
            attempts,
            ripped_up: pass.ripped_up,
            ripup_radius,
        })
    }

    fn place_block<R: Rng>(
        &self,
        pass: &mut Pass<'_, R>,
        block: BlockId,
        ripup_radius: i32,
        max_dim: i32,
    ) -> TesseraResult<()> {
        let (w, h) = (self.sites.width(), self.sites.height());
        let block_cap = 10000.max(3 * self.ctx.netlist.block_count());
        let center = pass.store.loc(block);
        let is_macro = self.ctx.macros.macro_of(block).is_some();

        let mut radius = 0;
        let mut iter = 0usize;
        let mut iter_at_radius = 0usize;
        let mut best_len = i32::MAX;
        let mut best: Option<Loc> = None;

        loop {
            if iter > block_cap {
                return Err(InternalError::new(format!(
                    "no slot found for block '{}' after {iter} samples",
                    self.ctx.netlist.block(block).name
                )));
            }

            let nx = pass.rng.gen_range(0..2 * radius + 1) + (center.x - radius).max(0);
            let ny = pass.rng.gen_range(0..2 * radius + 1) + (center.y - radius).max(0);
            iter += 1;
            iter_at_radius += 1;

            if radius < max_dim && iter >= 10 * (radius as usize + 1) {
                radius += 1;
                while radius < max_dim && !self.sites.any_within(center.x, center.y, radius) {
                    radius += 1;
                }
                iter = 0;
                iter_at_radius = 0;
            }

            if nx < 0 || nx >= w || ny < 0 || ny >= h || self.sites.count_at(nx, ny) == 0 {
                continue;
            }

            let placed = if is_macro {
                self.try_place_macro(pass, block, nx, ny)?
            } else {
                let explore_limit = 2 * radius as usize;
                self.try_place_blk(
                    pass,
                    block,
                    (nx, ny),
                    radius > ripup_radius,
                    iter_at_radius >= explore_limit,
                    &mut best_len,
                    &mut best,
                )?
            };
            if placed {
                return Ok(());
            }
        }
    }

    /// Tries one sampled cell for a single block.
    ///
    /// While exploring, the cell only updates the best candidate. Once the
    /// exploration budget at this radius is spent, the best candidate is
    /// taken, or else the first usable slot of the cell.
    #[allow(clippy::too_many_arguments)]
    fn try_place_blk<R: Rng>(
        &self,
        pass: &mut Pass<'_, R>,
        block: BlockId,
        (nx, ny): (i32, i32),
        ripup: bool,
        exceeds_explore_limit: bool,
        best_len: &mut i32,
        best: &mut Option<Loc>,
    ) -> TesseraResult<bool> {
        if exceeds_explore_limit {
            if let Some(slot) = *best {
                self.evict(pass, slot);
                self.bind(pass, block, slot)?;
                return Ok(true);
            }
        }

        let probability = self.ctx.config.legalizer.ripup_probability;
        for &slot in self.sites.at(nx, ny) {
            let bound = pass.occ.block_at(slot);
            let considered = bound.is_none() || ripup || pass.rng.gen_bool(probability);
            if !considered {
                continue;
            }
            if let Some(other) = bound {
                if !self.can_rip_up(pass, other) {
                    continue;
                }
            }
            if !exceeds_explore_limit {
                let len = self.input_wirelength(pass.store, block, nx, ny);
                if len < *best_len {
                    *best_len = len;
                    *best = Some(slot);
                }
                break;
            }
            self.evict(pass, slot);
            self.bind(pass, block, slot)?;
            return Ok(true);
        }
        Ok(false)
    }

    /// Tries to put the macro headed by `head` with its head at a slot of `(nx, ny)`.
    fn try_place_macro<R: Rng>(
        &self,
        pass: &mut Pass<'_, R>,
        head: BlockId,
        nx: i32,
        ny: i32,
    ) -> TesseraResult<bool> {
        let macros = self.ctx.macros;
        let Some(id) = macros.macro_of(head) else {
            return Ok(false);
        };
        let members = &macros.get(id).members;

        'slots: for &slot in self.sites.at(nx, ny) {
            let mut targets = Vec::with_capacity(members.len());
            for member in members {
                let target = slot + member.offset;
                if !self.sites.at(target.x, target.y).contains(&target) {
                    continue 'slots;
                }
                if let Some(other) = pass.occ.block_at(target) {
                    if !self.can_rip_up(pass, other) {
                        continue 'slots;
                    }
                }
                targets.push((member.block, target));
            }
            for (member, target) in targets {
                self.evict(pass, target);
                self.bind(pass, member, target)?;
            }
            return Ok(true);
        }
        Ok(false)
    }

    /// Only single blocks of this pass may be evicted.
    fn can_rip_up<R>(&self, pass: &Pass<'_, R>, block: BlockId) -> bool {
        pass.scope.contains(&block)
            && self.ctx.macros.macro_of(block).is_none()
            && !self.ctx.netlist.block(block).is_fixed
    }

    fn evict<R>(&self, pass: &mut Pass<'_, R>, slot: Loc) {
        if let Some(other) = pass.occ.block_at(slot) {
            pass.occ.unbind(other);
            pass.remaining.push((1, other));
            pass.ripped_up += 1;
        }
    }

    fn bind<R>(&self, pass: &mut Pass<'_, R>, block: BlockId, slot: Loc) -> TesseraResult<()> {
        pass.occ.bind(block, slot)?;
        pass.store.get_mut(block).loc = slot;
        Ok(())
    }

    /// Manhattan distance from every driver feeding `block` to cell `(x, y)`.
    fn input_wirelength(&self, store: &BlockLocationStore, block: BlockId, x: i32, y: i32) -> i32 {
        let netlist = self.ctx.netlist;
        netlist
            .block(block)
            .pins
            .iter()
            .map(|&p| netlist.pin(p))
            .filter(|pin| pin.direction == PinDirection::Sink)
            .filter_map(|pin| pin.net)
            .map(|net| netlist.net(net))
            .filter(|net| !net.is_ignored)
            .filter_map(|net| net.driver)
            .map(|driver| store.loc(netlist.pin_block(driver)).manhattan(Loc::new(x, y, 0)))
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::placement::Placement;
    use crate::test_util::Fixture;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn bound_everywhere(fx: &Fixture, occ: &GridOccupancy, store: &BlockLocationStore) {
        for b in fx.netlist.block_ids() {
            let loc = occ.loc_of(b).expect("block left unbound");
            assert_eq!(store.loc(b), loc);
            assert!(fx.device.is_compatible(loc, fx.netlist.block(b).block_type));
        }
    }

    #[test]
    fn stacked_blocks_get_distinct_slots() {
        let mut fx = Fixture::uniform(2, 2, 1);
        let blocks = fx.chain(3);
        let placement = fx.placement(&[
            Loc::new(0, 0, 0),
            Loc::new(1, 0, 0),
            Loc::new(0, 1, 0),
        ]);
        let mut occ = GridOccupancy::from_placement(&fx.ctx(), &placement).unwrap();
        let mut store = BlockLocationStore::from_placement(&placement);
        for b in &blocks {
            store.get_mut(*b).loc = Loc::new(1, 1, 0);
        }

        let legalizer = StrictLegalizer::new(fx.ctx(), fx.clb);
        let mut rng = StdRng::seed_from_u64(7);
        let stats = legalizer
            .strict_legalize(&mut store, &mut occ, &blocks, &mut rng)
            .unwrap();

        assert_eq!(stats.blocks, 3);
        bound_everywhere(&fx, &occ, &store);
        let mut locs: Vec<Loc> = blocks.iter().map(|b| store.loc(*b)).collect();
        locs.sort();
        locs.dedup();
        assert_eq!(locs.len(), 3);
    }

    #[test]
    fn macro_is_placed_rigidly() {
        let mut fx = Fixture::uniform(3, 3, 1);
        let blocks = fx.chain(2);
        fx.add_vertical_macro(&blocks);
        let other = fx.block("x", fx.clb);
        fx.connect(other, &[blocks[0]]);
        let placement = fx.placement(&[
            Loc::new(0, 0, 0),
            Loc::new(0, 1, 0),
            Loc::new(2, 2, 0),
        ]);
        let mut occ = GridOccupancy::from_placement(&fx.ctx(), &placement).unwrap();
        let mut store = BlockLocationStore::from_placement(&placement);
        // spread result puts the head on top of the single block, member off grid
        store.get_mut(blocks[0]).loc = Loc::new(2, 2, 0);
        store.get_mut(blocks[1]).loc = Loc::new(2, 3, 0);

        let legalizer = StrictLegalizer::new(fx.ctx(), fx.clb);
        let mut rng = StdRng::seed_from_u64(1);
        legalizer
            .strict_legalize(&mut store, &mut occ, &[blocks[0], other], &mut rng)
            .unwrap();

        bound_everywhere(&fx, &occ, &store);
        let head = store.loc(blocks[0]);
        assert_eq!(store.loc(blocks[1]), Loc::new(head.x, head.y + 1, 0));
        assert_ne!(store.loc(other), head);
        assert_ne!(store.loc(other), store.loc(blocks[1]));
    }

    #[test]
    fn fixed_blocks_are_never_evicted() {
        let mut fx = Fixture::uniform(2, 1, 1);
        let blocks = fx.chain(2);
        fx.netlist.set_fixed(blocks[0], true);
        let placement = fx.placement(&[Loc::new(0, 0, 0), Loc::new(1, 0, 0)]);
        let mut occ = GridOccupancy::from_placement(&fx.ctx(), &placement).unwrap();
        let mut store = BlockLocationStore::from_placement(&placement);
        store.get_mut(blocks[1]).loc = Loc::new(0, 0, 0);

        let legalizer = StrictLegalizer::new(fx.ctx(), fx.clb);
        let mut rng = StdRng::seed_from_u64(3);
        legalizer
            .strict_legalize(&mut store, &mut occ, &blocks[1..], &mut rng)
            .unwrap();
        assert_eq!(occ.loc_of(blocks[0]), Some(Loc::new(0, 0, 0)));
        assert_eq!(occ.loc_of(blocks[1]), Some(Loc::new(1, 0, 0)));
    }

    #[test]
    fn io_blocks_find_their_column() {
        let mut fx = Fixture::columns(5, 2, &[0, 4]);
        let a = fx.block("pad_a", fx.io);
        let b = fx.block("pad_b", fx.io);
        let c = fx.block("logic", fx.clb);
        fx.connect(a, &[c]);
        fx.connect(c, &[b]);
        let placement = fx.placement(&[
            Loc::new(0, 0, 0),
            Loc::new(4, 1, 0),
            Loc::new(2, 0, 0),
        ]);
        let mut occ = GridOccupancy::from_placement(&fx.ctx(), &placement).unwrap();
        let mut store = BlockLocationStore::from_placement(&placement);
        store.get_mut(a).loc = Loc::new(2, 1, 0);
        store.get_mut(b).loc = Loc::new(2, 1, 0);

        let legalizer = StrictLegalizer::new(fx.ctx(), fx.io);
        let mut rng = StdRng::seed_from_u64(11);
        legalizer
            .strict_legalize(&mut store, &mut occ, &[a, b], &mut rng)
            .unwrap();
        bound_everywhere(&fx, &occ, &store);
        assert_ne!(store.loc(a), store.loc(b));
    }

    #[test]
    fn same_seed_same_result() {
        let run = |seed: u64| {
            let mut fx = Fixture::uniform(4, 4, 1);
            let blocks = fx.chain(6);
            let locs: Vec<Loc> = (0..6).map(|i| Loc::new(i % 4, i / 4, 0)).collect();
            let placement = fx.placement(&locs);
            let mut occ = GridOccupancy::from_placement(&fx.ctx(), &placement).unwrap();
            let mut store = BlockLocationStore::from_placement(&placement);
            for b in &blocks {
                store.get_mut(*b).loc = Loc::new(2, 2, 0);
            }
            let legalizer = StrictLegalizer::new(fx.ctx(), fx.clb);
            let mut rng = StdRng::seed_from_u64(seed);
            legalizer
                .strict_legalize(&mut store, &mut occ, &blocks, &mut rng)
                .unwrap();
            occ.to_placement()
        };
        assert_eq!(run(5), run(5));
    }

    #[test]
    fn too_few_slots_is_internal_error() {
        let mut fx = Fixture::uniform(1, 1, 1);
        let blocks = fx.chain(2);
        let mut placement = Placement::new(2);
        placement.set(blocks[0], Loc::new(0, 0, 0));
        let mut occ = GridOccupancy::new(&fx.device, 2);
        occ.bind(blocks[0], Loc::new(0, 0, 0)).unwrap();
        let mut store = BlockLocationStore::from_placement(&placement);
        // the first block is outside the pass and cannot be evicted
        let legalizer = StrictLegalizer::new(fx.ctx(), fx.clb);
        let mut rng = StdRng::seed_from_u64(1);
        let err = legalizer
            .strict_legalize(&mut store, &mut occ, &blocks[1..], &mut rng)
            .unwrap_err();
        assert!(err.to_string().starts_with("internal placer error"));
    }
}

//! Recursive cut-based spreading of one block type.
//!
//! The solver's output stacks many blocks on the same cells. The spreader
//! finds every cell holding more blocks of the type than it has compatible
//! slots, grows each such cell into a region until the region offers enough
//! slots, and then recursively bisects the regions: blocks are split by
//! their fractional coordinate, the region is split by a cut line chosen to
//! balance utilization on both sides, and each half's blocks are linearly
//! interpolated into their half.
//!
//! Regions live in an arena and are referenced by index. A region absorbed
//! by another one during growth is marked as merged and never cut.
//!
//! Macro heads carry the bounding box of their members, so a region that
//! touches any member grows to cover the whole macro and no cut line leaves
//! less room on a side than the widest macro assigned to it.

use crate::context::PlacementContext;
use crate::ids::BlockId;
use crate::locations::{Axis, BlockLocationStore};
use crate::sites::CompatibleSites;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet, VecDeque};
use tessera_device::{BlockTypeId, Rect};

/// A rectangular area being spread.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpreaderRegion {
    /// Index of the region in the arena.
    pub id: usize,
    /// Covered cells.
    pub bb: Rect,
    /// Blocks of the spread type inside, macro members counted individually.
    pub n_blks: usize,
    /// Compatible slots inside.
    pub n_tiles: usize,
}

impl SpreaderRegion {
    /// Returns `true` if the region holds more than `beta` blocks per slot.
    pub fn overused(&self, beta: f64) -> bool {
        self.n_blks as f64 > beta * self.n_tiles as f64
    }
}

/// Result of cutting one region along one axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CutOutcome {
    /// The region was split into the two child regions.
    Split(usize, usize),
    /// At most one block is left; nothing to cut.
    BaseCase,
    /// No cut line along this axis leaves slots on both sides.
    Failed,
}

/// Counters of one [`CutSpreader::cut_spread`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpreadStats {
    /// Overused regions found and cut.
    pub regions: usize,
    /// Successful bisections.
    pub splits: usize,
    /// Regions that ended with one block or none.
    pub base_cases: usize,
    /// Regions that could not be cut along either axis.
    pub failed: usize,
    /// Regions still overused after expansion reached the grid border.
    pub unrelieved: usize,
}

struct TargetCut {
    cut: i32,
    left_blks: usize,
    right_blks: usize,
    left_tiles: usize,
    right_tiles: usize,
}

/// Spreads the blocks of one type so that no region is over-utilized.
pub struct CutSpreader<'a> {
    ctx: PlacementContext<'a>,
    block_type: BlockTypeId,
    sites: CompatibleSites,
    occupancy: Vec<usize>,
    macro_extent: Vec<Rect>,
    region_at: Vec<Option<usize>>,
    blk_extents: HashMap<BlockId, Rect>,
    blks_at_location: Vec<Vec<BlockId>>,
    regions: Vec<SpreaderRegion>,
    merged: HashSet<usize>,
    retired: Vec<usize>,
}

impl<'a> CutSpreader<'a> {
    /// Creates a spreader for `block_type`.
    pub fn new(ctx: PlacementContext<'a>, block_type: BlockTypeId) -> Self {
        Self {
            ctx,
            block_type,
            sites: CompatibleSites::new(ctx.device, block_type),
            occupancy: Vec::new(),
            macro_extent: Vec::new(),
            region_at: Vec::new(),
            blk_extents: HashMap::new(),
            blks_at_location: Vec::new(),
            regions: Vec::new(),
            merged: HashSet::new(),
            retired: Vec::new(),
        }
    }

    /// Spreads `solve_blocks` (heads and single blocks of the type).
    ///
    /// Only the integer and fractional coordinates in `store` move; macro
    /// members must be re-derived by the caller afterwards.
    pub fn cut_spread(
        &mut self,
        store: &mut BlockLocationStore,
        solve_blocks: &[BlockId],
    ) -> SpreadStats {
        self.init(store, solve_blocks);
        self.find_overused_regions();
        let mut stats = SpreadStats {
            unrelieved: self.expand_regions(),
            ..SpreadStats::default()
        };

        let mut queue: VecDeque<(usize, Axis)> = self
            .regions
            .iter()
            .filter(|r| !self.is_merged(r.id))
            .map(|r| (r.id, Axis::X))
            .collect();
        stats.regions = queue.len();

        while let Some((id, axis)) = queue.pop_front() {
            match self.cut_region(store, id, axis) {
                CutOutcome::BaseCase => {
                    stats.base_cases += 1;
                    self.retired.push(id);
                }
                CutOutcome::Split(l, r) => {
                    stats.splits += 1;
                    queue.push_back((l, axis.other()));
                    queue.push_back((r, axis.other()));
                }
                CutOutcome::Failed => match self.cut_region(store, id, axis.other()) {
                    CutOutcome::Split(l, r) => {
                        stats.splits += 1;
                        queue.push_back((l, axis));
                        queue.push_back((r, axis));
                    }
                    CutOutcome::BaseCase => {
                        stats.base_cases += 1;
                        self.retired.push(id);
                    }
                    CutOutcome::Failed => {
                        stats.failed += 1;
                        self.retired.push(id);
                    }
                },
            }
        }
        stats
    }

    /// Rebuilds the occupancy, macro extents and block buckets from `store`.
    ///
    /// Occupancy counts every block of the type, fixed ones included; only
    /// `solve_blocks` are bucketed for moving.
    pub fn init(&mut self, store: &BlockLocationStore, solve_blocks: &[BlockId]) {
        let (w, h) = (self.sites.width(), self.sites.height());
        let cells = (w * h) as usize;
        self.occupancy = vec![0; cells];
        self.region_at = vec![None; cells];
        self.blks_at_location = vec![Vec::new(); cells];
        self.macro_extent = (0..w)
            .flat_map(|x| (0..h).map(move |y| Rect::unit(x, y)))
            .collect();
        self.blk_extents.clear();
        self.regions.clear();
        self.merged.clear();
        self.retired.clear();

        let netlist = self.ctx.netlist;
        let macros = self.ctx.macros;
        let of_type: Vec<BlockId> = netlist
            .block_ids()
            .filter(|b| netlist.block(*b).block_type == self.block_type)
            .collect();

        for &block in &of_type {
            let loc = store.loc(block);
            let Some(c) = self.cell_index(loc.x, loc.y) else {
                continue;
            };
            self.occupancy[c] += 1;
            if let Some(head) = macros.head_of(block) {
                self.blk_extents
                    .entry(head)
                    .and_modify(|r| r.expand_to(loc.x, loc.y))
                    .or_insert_with(|| Rect::unit(loc.x, loc.y));
            }
        }

        for &block in &of_type {
            let loc = store.loc(block);
            let (Some(head), Some(c)) = (macros.head_of(block), self.cell_index(loc.x, loc.y))
            else {
                continue;
            };
            if let Some(extent) = self.blk_extents.get(&head) {
                self.macro_extent[c] = self.macro_extent[c].union(extent);
            }
        }

        for &block in solve_blocks {
            if netlist.block(block).block_type != self.block_type {
                continue;
            }
            let loc = store.loc(block);
            if let Some(c) = self.cell_index(loc.x, loc.y) {
                self.blks_at_location[c].push(block);
            }
        }
    }

    /// The region arena, merged regions included.
    pub fn regions(&self) -> &[SpreaderRegion] {
        &self.regions
    }

    /// Regions of the last [`cut_spread`](Self::cut_spread) that were left
    /// unsplit, in retirement order.
    pub fn retired(&self) -> impl Iterator<Item = &SpreaderRegion> + '_ {
        self.retired.iter().map(|&id| &self.regions[id])
    }

    /// Returns `true` if region `id` was absorbed by another region.
    pub fn is_merged(&self, id: usize) -> bool {
        self.merged.contains(&id)
    }

    /// The region owning cell `(x, y)`.
    pub fn region_at(&self, x: i32, y: i32) -> Option<usize> {
        self.cell_index(x, y).and_then(|c| self.region_at[c])
    }

    /// Solve blocks currently bucketed at cell `(x, y)`.
    pub fn blocks_at(&self, x: i32, y: i32) -> &[BlockId] {
        match self.cell_index(x, y) {
            Some(c) => &self.blks_at_location[c],
            None => &[],
        }
    }

    fn cell_index(&self, x: i32, y: i32) -> Option<usize> {
        let (w, h) = (self.sites.width(), self.sites.height());
        (x >= 0 && y >= 0 && x < w && y < h).then(|| (x * h + y) as usize)
    }

    fn cell(&self, x: i32, y: i32) -> usize {
        (x * self.sites.height() + y) as usize
    }

    fn occ_at(&self, x: i32, y: i32) -> usize {
        self.cell_index(x, y).map_or(0, |c| self.occupancy[c])
    }

    fn tiles_at(&self, x: i32, y: i32) -> usize {
        self.sites.count_at(x, y)
    }

    fn is_overfull(&self, x: i32, y: i32) -> bool {
        self.occ_at(x, y) > self.tiles_at(x, y)
    }

    /// Grows every over-full cell into a region surrounded by cells that
    /// are not over-full, merging regions that touch.
    pub fn find_overused_regions(&mut self) {
        let (w, h) = (self.sites.width(), self.sites.height());
        for x in 0..w {
            for y in 0..h {
                let c = self.cell(x, y);
                if self.region_at[c].is_some() || !self.is_overfull(x, y) {
                    continue;
                }

                let id = self.regions.len();
                self.region_at[c] = Some(id);
                self.regions.push(SpreaderRegion {
                    id,
                    bb: Rect::unit(x, y),
                    n_blks: self.occ_at(x, y),
                    n_tiles: self.tiles_at(x, y),
                });
                self.grow_region(id, Rect::unit(x, y), true);

                loop {
                    let mut expanded = false;
                    let bb = self.regions[id].bb;
                    if bb.xmax < w - 1
                        && (bb.ymin..=bb.ymax).any(|y1| self.is_overfull(bb.xmax + 1, y1))
                    {
                        expanded = true;
                        self.grow_region(id, Rect::new(bb.xmin, bb.ymin, bb.xmax + 1, bb.ymax), false);
                    }
                    let bb = self.regions[id].bb;
                    if bb.ymax < h - 1
                        && (bb.xmin..=bb.xmax).any(|x1| self.is_overfull(x1, bb.ymax + 1))
                    {
                        expanded = true;
                        self.grow_region(id, Rect::new(bb.xmin, bb.ymin, bb.xmax, bb.ymax + 1), false);
                    }
                    if !expanded {
                        break;
                    }
                }
            }
        }
    }

    /// Grows overused regions outward until they satisfy
    /// `n_blks <= beta * n_tiles`. Returns how many stayed overused.
    pub fn expand_regions(&mut self) -> usize {
        let cfg = &self.ctx.config.spreader;
        let (beta, scale_x, scale_y) = (cfg.beta, cfg.spread_scale_x, cfg.spread_scale_y);
        let (w, h) = (self.sites.width(), self.sites.height());

        let mut queue: VecDeque<usize> = self
            .regions
            .iter()
            .filter(|r| !self.is_merged(r.id) && r.overused(beta))
            .map(|r| r.id)
            .collect();

        let mut unrelieved = 0;
        while let Some(id) = queue.pop_front() {
            if self.is_merged(id) {
                continue;
            }
            while self.regions[id].overused(beta) {
                let mut changed = false;
                for _ in 0..scale_x {
                    let bb = self.regions[id].bb;
                    if bb.xmin > 0 {
                        self.grow_region(id, Rect::new(bb.xmin - 1, bb.ymin, bb.xmax, bb.ymax), false);
                        changed = true;
                        if !self.regions[id].overused(beta) {
                            break;
                        }
                    }
                    let bb = self.regions[id].bb;
                    if bb.xmax < w - 1 {
                        self.grow_region(id, Rect::new(bb.xmin, bb.ymin, bb.xmax + 1, bb.ymax), false);
                        changed = true;
                        if !self.regions[id].overused(beta) {
                            break;
                        }
                    }
                }
                for _ in 0..scale_y {
                    let bb = self.regions[id].bb;
                    if bb.ymin > 0 {
                        self.grow_region(id, Rect::new(bb.xmin, bb.ymin - 1, bb.xmax, bb.ymax), false);
                        changed = true;
                        if !self.regions[id].overused(beta) {
                            break;
                        }
                    }
                    let bb = self.regions[id].bb;
                    if bb.ymax < h - 1 {
                        self.grow_region(id, Rect::new(bb.xmin, bb.ymin, bb.xmax, bb.ymax + 1), false);
                        changed = true;
                        if !self.regions[id].overused(beta) {
                            break;
                        }
                    }
                }
                if !changed {
                    break;
                }
            }
            if self.regions[id].overused(beta) {
                unrelieved += 1;
            }
        }
        unrelieved
    }

    /// Extends region `r` to cover `rect`, claiming the new cells.
    ///
    /// With `init`, the seed cell of a fresh region is processed even though
    /// the region already covers it.
    fn grow_region(&mut self, r: usize, rect: Rect, init: bool) {
        if !init && self.regions[r].bb.contains_rect(&rect) {
            return;
        }
        let mut old = self.regions[r].bb;
        if init {
            old.xmin += 1;
        }
        self.regions[r].bb = self.regions[r].bb.union(&rect);

        // Bounds are re-read on every step: claiming a cell can grow the
        // region again through macros and merges.
        let mut x = self.regions[r].bb.xmin;
        while x < old.xmin {
            let mut y = self.regions[r].bb.ymin;
            while y <= self.regions[r].bb.ymax {
                self.process_location(r, x, y);
                y += 1;
            }
            x += 1;
        }
        let mut x = old.xmax + 1;
        while x <= self.regions[r].bb.xmax {
            let mut y = self.regions[r].bb.ymin;
            while y <= self.regions[r].bb.ymax {
                self.process_location(r, x, y);
                y += 1;
            }
            x += 1;
        }
        let mut y = self.regions[r].bb.ymin;
        while y < old.ymin {
            let mut x = self.regions[r].bb.xmin;
            while x <= self.regions[r].bb.xmax {
                self.process_location(r, x, y);
                x += 1;
            }
            y += 1;
        }
        let mut y = old.ymax + 1;
        while y <= self.regions[r].bb.ymax {
            let mut x = self.regions[r].bb.xmin;
            while x <= self.regions[r].bb.xmax {
                self.process_location(r, x, y);
                x += 1;
            }
            y += 1;
        }
    }

    fn process_location(&mut self, r: usize, x: i32, y: i32) {
        let c = self.cell(x, y);
        match self.region_at[c] {
            None => {
                let (tiles, occ) = (self.tiles_at(x, y), self.occ_at(x, y));
                let region = &mut self.regions[r];
                region.n_tiles += tiles;
                region.n_blks += occ;
            }
            Some(other) if other != r => self.merge_regions(r, other),
            Some(_) => {}
        }
        self.region_at[c] = Some(r);
        let extent = self.macro_extent[c];
        self.grow_region(r, extent, false);
    }

    fn merge_regions(&mut self, merged: usize, mergee: usize) {
        let bb = self.regions[mergee].bb;
        for (x, y) in bb.cells() {
            let c = self.cell(x, y);
            if self.region_at[c] != Some(mergee) {
                continue;
            }
            self.region_at[c] = Some(merged);
            let (tiles, occ) = (self.tiles_at(x, y), self.occ_at(x, y));
            let region = &mut self.regions[merged];
            region.n_tiles += tiles;
            region.n_blks += occ;
        }
        self.merged.insert(mergee);
        self.grow_region(merged, bb, false);
    }

    /// Bisects region `id` across `axis` and spreads its blocks into the halves.
    pub fn cut_region(
        &mut self,
        store: &mut BlockLocationStore,
        id: usize,
        axis: Axis,
    ) -> CutOutcome {
        let region = self.regions[id];
        let mut cut_blks = Vec::new();
        for (x, y) in region.bb.cells() {
            cut_blks.extend_from_slice(&self.blks_at_location[self.cell(x, y)]);
        }
        if cut_blks.is_empty() {
            return CutOutcome::BaseCase;
        }

        let (trimmed_l, trimmed_r) = self.trim_region(store, region.bb, axis);

        if cut_blks.len() == 1 {
            self.settle_single(store, cut_blks[0], region.bb);
            return CutOutcome::BaseCase;
        }

        cut_blks.sort_by(|a, b| store.get(*a).raw(axis).total_cmp(&store.get(*b).raw(axis)));

        let (mut pivot, clearance_l, clearance_r) =
            self.initial_source_cut(&region, &cut_blks, axis);
        let Some(target) = self.initial_target_cut(
            &region,
            &cut_blks,
            pivot,
            axis,
            (trimmed_l, trimmed_r),
            (clearance_l, clearance_r),
        ) else {
            return CutOutcome::Failed;
        };

        let bb = region.bb;
        let (left_bb, right_bb) = match axis {
            Axis::X => (
                Rect::new(trimmed_l, bb.ymin, target.cut, bb.ymax),
                Rect::new(target.cut + 1, bb.ymin, trimmed_r, bb.ymax),
            ),
            Axis::Y => (
                Rect::new(bb.xmin, trimmed_l, bb.xmax, target.cut),
                Rect::new(bb.xmin, target.cut + 1, bb.xmax, trimmed_r),
            ),
        };
        let mut rl = SpreaderRegion {
            id: self.regions.len(),
            bb: left_bb,
            n_blks: target.left_blks,
            n_tiles: target.left_tiles,
        };
        let mut rr = SpreaderRegion {
            id: self.regions.len() + 1,
            bb: right_bb,
            n_blks: target.right_blks,
            n_tiles: target.right_tiles,
        };
        for child in [&rl, &rr] {
            for (x, y) in child.bb.cells() {
                let c = self.cell(x, y);
                self.region_at[c] = Some(child.id);
            }
        }

        // Shift the block split toward the emptier side while a side is overused.
        let beta = self.ctx.config.spreader.beta;
        let macros = self.ctx.macros;
        while pivot > 0 && rl.overused(beta) {
            let moved = cut_blks[pivot];
            if self.extent_along(moved, axis) > span(&rr.bb, axis) {
                break;
            }
            let size = macros.size_of(moved);
            rl.n_blks = rl.n_blks.saturating_sub(size);
            rr.n_blks += size;
            pivot -= 1;
        }
        while pivot + 1 < cut_blks.len() && rr.overused(beta) {
            let moved = cut_blks[pivot + 1];
            if self.extent_along(moved, axis) > span(&rl.bb, axis) {
                break;
            }
            let size = macros.size_of(moved);
            rl.n_blks += size;
            rr.n_blks = rr.n_blks.saturating_sub(size);
            pivot += 1;
        }

        self.linear_spread_subarea(store, &cut_blks[..=pivot], axis, rl.bb);
        self.linear_spread_subarea(store, &cut_blks[pivot + 1..], axis, rr.bb);

        self.regions.push(rl);
        self.regions.push(rr);
        CutOutcome::Split(rl.id, rr.id)
    }

    fn extent_along(&self, block: BlockId, axis: Axis) -> i32 {
        self.blk_extents
            .get(&block)
            .map_or(1, |r| span(r, axis))
    }

    fn slice_tiles(&self, bb: Rect, axis: Axis, i: i32) -> usize {
        match axis {
            Axis::X => (bb.ymin..=bb.ymax).map(|y| self.tiles_at(i, y)).sum(),
            Axis::Y => (bb.xmin..=bb.xmax).map(|x| self.tiles_at(x, i)).sum(),
        }
    }

    /// Drops boundary rows or columns without compatible slots from the cut
    /// axis and moves their blocks onto the new boundary.
    fn trim_region(&mut self, store: &mut BlockLocationStore, bb: Rect, axis: Axis) -> (i32, i32) {
        let (lo, hi) = axis_range(&bb, axis);
        let mut trimmed_l = lo;
        while trimmed_l < hi && self.slice_tiles(bb, axis, trimmed_l) == 0 {
            trimmed_l += 1;
        }
        let mut trimmed_r = hi;
        while trimmed_r > lo && self.slice_tiles(bb, axis, trimmed_r) == 0 {
            trimmed_r -= 1;
        }
        if trimmed_l > trimmed_r {
            return (lo, hi);
        }

        for (x, y) in bb.cells() {
            let coord = match axis {
                Axis::X => x,
                Axis::Y => y,
            };
            let boundary = if coord < trimmed_l {
                trimmed_l
            } else if coord > trimmed_r {
                trimmed_r
            } else {
                continue;
            };
            let (nx, ny) = match axis {
                Axis::X => (boundary, y),
                Axis::Y => (x, boundary),
            };
            let from = self.cell(x, y);
            let to = self.cell(nx, ny);
            for block in std::mem::take(&mut self.blks_at_location[from]) {
                move_block(store, block, nx, ny);
                self.blks_at_location[to].push(block);
            }
        }
        (trimmed_l, trimmed_r)
    }

    /// Puts the last block of a region on a compatible cell of the region.
    fn settle_single(&mut self, store: &mut BlockLocationStore, block: BlockId, bb: Rect) {
        let loc = store.loc(block);
        if self.tiles_at(loc.x, loc.y) > 0 {
            return;
        }
        let Some((x, y)) = bb.cells().find(|&(x, y)| self.tiles_at(x, y) > 0) else {
            return;
        };
        if let Some(old) = self.cell_index(loc.x, loc.y) {
            self.blks_at_location[old].retain(|b| *b != block);
        }
        move_block(store, block, x, y);
        let to = self.cell(x, y);
        self.blks_at_location[to].push(block);
    }

    /// Index of the last block of the left half, splitting the sorted blocks
    /// at half the region's block count, plus the largest macro extent on
    /// each side.
    fn initial_source_cut(
        &self,
        region: &SpreaderRegion,
        cut_blks: &[BlockId],
        axis: Axis,
    ) -> (usize, i32, i32) {
        let macros = self.ctx.macros;
        let mut pivot = 0;
        let mut pivot_blks = 0;
        for &block in cut_blks {
            pivot_blks += macros.size_of(block);
            if pivot_blks >= region.n_blks / 2 {
                break;
            }
            pivot += 1;
        }
        let pivot = pivot.min(cut_blks.len() - 1);

        let (mut clearance_l, mut clearance_r) = (0, 0);
        for (i, &block) in cut_blks.iter().enumerate() {
            let size = self.extent_along(block, axis);
            if i < pivot {
                clearance_l = clearance_l.max(size);
            } else {
                clearance_r = clearance_r.max(size);
            }
        }
        (pivot, clearance_l, clearance_r)
    }

    /// The cut line within the trimmed bounds minimizing the utilization
    /// difference of the halves, or `None` if no line leaves the required
    /// clearance and slots on both sides.
    fn initial_target_cut(
        &self,
        region: &SpreaderRegion,
        cut_blks: &[BlockId],
        pivot: usize,
        axis: Axis,
        (trimmed_l, trimmed_r): (i32, i32),
        (clearance_l, clearance_r): (i32, i32),
    ) -> Option<TargetCut> {
        let macros = self.ctx.macros;
        let left_blks: usize = cut_blks[..=pivot].iter().map(|b| macros.size_of(*b)).sum();
        let right_blks: usize = cut_blks[pivot + 1..].iter().map(|b| macros.size_of(*b)).sum();

        let mut left_tiles = 0i64;
        let mut right_tiles = region.n_tiles as i64;
        let mut best: Option<(i32, f64)> = None;
        for i in trimmed_l..=trimmed_r {
            let slice = self.slice_tiles(region.bb, axis, i) as i64;
            left_tiles += slice;
            right_tiles -= slice;
            if i - trimmed_l + 1 < clearance_l || trimmed_r - i + 1 < clearance_r {
                continue;
            }
            let delta = (left_blks as f64 / left_tiles.max(1) as f64
                - right_blks as f64 / right_tiles.max(1) as f64)
                .abs();
            if best.map_or(true, |(_, d)| delta < d) {
                best = Some((i, delta));
            }
        }
        let (cut, _) = best?;

        let bb = region.bb;
        let (left_bb, right_bb) = match axis {
            Axis::X => (
                Rect::new(bb.xmin, bb.ymin, cut, bb.ymax),
                Rect::new(cut + 1, bb.ymin, bb.xmax, bb.ymax),
            ),
            Axis::Y => (
                Rect::new(bb.xmin, bb.ymin, bb.xmax, cut),
                Rect::new(bb.xmin, cut + 1, bb.xmax, bb.ymax),
            ),
        };
        let count = |r: Rect| -> usize { r.cells().map(|(x, y)| self.tiles_at(x, y)).sum() };
        let left_tiles = count(left_bb);
        let right_tiles = if span(&right_bb, axis) > 0 { count(right_bb) } else { 0 };
        if left_tiles == 0 || right_tiles == 0 {
            return None;
        }
        Some(TargetCut {
            cut,
            left_blks,
            right_blks,
            left_tiles,
            right_tiles,
        })
    }

    /// Maps the sorted `blks` onto `bb` along `axis` by piecewise linear
    /// interpolation over at most `interpolation_bins` bins, then snaps
    /// their integer locations into `bb`.
    fn linear_spread_subarea(
        &mut self,
        store: &mut BlockLocationStore,
        blks: &[BlockId],
        axis: Axis,
        bb: Rect,
    ) {
        let (lo, hi) = axis_range(&bb, axis);
        let (area_l, area_r) = (f64::from(lo), f64::from(hi));
        let n = blks.len();
        if n <= 2 {
            let step = (area_r - area_l) / n as f64;
            for (i, &block) in blks.iter().enumerate() {
                store.get_mut(block).set_raw(axis, area_l + i as f64 * step);
            }
        } else {
            let k = n.min(self.ctx.config.spreader.interpolation_bins.max(1));
            let mut bounds: Vec<(usize, f64)> = Vec::with_capacity(k + 1);
            bounds.push((0, area_l));
            for i in 1..k {
                bounds.push((
                    n * i / k,
                    area_l + (area_r - area_l + 0.99) * i as f64 / k as f64,
                ));
            }
            bounds.push((n, area_r + 0.99));

            for pair in bounds.windows(2) {
                let ((first, bin_l), (end, bin_r)) = (pair[0], pair[1]);
                let group_l = store.get(blks[first]).raw(axis);
                let group_r = store.get(blks[end - 1]).raw(axis);
                let mapping = (bin_r - bin_l) / (group_r - group_l).max(1e-5);
                for &block in &blks[first..end] {
                    let pos = store.get(block).raw(axis);
                    store
                        .get_mut(block)
                        .set_raw(axis, bin_l + mapping * (pos - group_l));
                }
            }
        }

        for (x, y) in bb.cells() {
            let c = self.cell(x, y);
            self.blks_at_location[c].clear();
        }
        for &block in blks {
            let l = store.get_mut(block);
            l.loc.x = (l.raw_x.floor() as i32).clamp(bb.xmin, bb.xmax);
            l.loc.y = (l.raw_y.floor() as i32).clamp(bb.ymin, bb.ymax);
            let c = self.cell(l.loc.x, l.loc.y);
            self.blks_at_location[c].push(block);
        }
    }
}

fn axis_range(r: &Rect, axis: Axis) -> (i32, i32) {
    match axis {
        Axis::X => (r.xmin, r.xmax),
        Axis::Y => (r.ymin, r.ymax),
    }
}

fn span(r: &Rect, axis: Axis) -> i32 {
    let (lo, hi) = axis_range(r, axis);
    hi - lo + 1
}

fn move_block(store: &mut BlockLocationStore, block: BlockId, x: i32, y: i32) {
    let l = store.get_mut(block);
    l.raw_x = f64::from(x);
    l.raw_y = f64::from(y);
    l.loc.x = x;
    l.loc.y = y;
}

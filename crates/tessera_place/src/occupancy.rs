//! Device occupancy: which block is bound to which slot.
//!
//! This is the legal side of the placement state. Analytic solving and cut
//! spreading only move the working coordinates in
//! [`BlockLocationStore`](crate::locations::BlockLocationStore); the strict
//! legalizer rebinds blocks here.

use crate::context::PlacementContext;
use crate::error::PlaceError;
use crate::ids::BlockId;
use crate::placement::Placement;
use tessera_common::{InternalError, TesseraResult};
use tessera_device::{DeviceGrid, Loc};

/// Slot-level binding of blocks to the device grid.
#[derive(Debug, Clone)]
pub struct GridOccupancy {
    width: i32,
    height: i32,
    slots: Vec<Vec<Option<BlockId>>>,
    bound: Vec<Option<Loc>>,
}

impl GridOccupancy {
    /// Creates an empty occupancy for `device` and `block_count` blocks.
    pub fn new(device: &DeviceGrid, block_count: usize) -> Self {
        let mut slots = Vec::with_capacity((device.width() * device.height()) as usize);
        for x in 0..device.width() {
            for y in 0..device.height() {
                slots.push(vec![None; device.capacity_at(x, y)]);
            }
        }
        Self {
            width: device.width(),
            height: device.height(),
            slots,
            bound: vec![None; block_count],
        }
    }

    /// Binds every block of a complete, legal placement.
    ///
    /// Fails if a block is unplaced, sits on a slot that does not accept its
    /// type, shares a slot, or is a macro member away from `head + offset`.
    pub fn from_placement(
        ctx: &PlacementContext<'_>,
        placement: &Placement,
    ) -> Result<Self, PlaceError> {
        let netlist = ctx.netlist;
        if placement.len() != netlist.block_count() {
            return Err(PlaceError::InvalidPlacement(format!(
                "placement covers {} blocks, netlist has {}",
                placement.len(),
                netlist.block_count()
            )));
        }

        let mut occ = Self::new(ctx.device, netlist.block_count());
        for block in netlist.block_ids() {
            let name = &netlist.block(block).name;
            let loc = placement.loc(block).ok_or_else(|| {
                PlaceError::InvalidPlacement(format!("block '{name}' is not placed"))
            })?;
            if !ctx.device.is_compatible(loc, netlist.block(block).block_type) {
                return Err(PlaceError::InvalidPlacement(format!(
                    "block '{name}' at {loc} is on an incompatible slot"
                )));
            }
            if let Some(other) = occ.block_at(loc) {
                return Err(PlaceError::InvalidPlacement(format!(
                    "blocks '{}' and '{name}' share slot {loc}",
                    netlist.block(other).name
                )));
            }
            occ.bind(block, loc)?;
        }

        for m in ctx.macros.iter() {
            let head_loc = occ.loc_of(m.head());
            for member in &m.members {
                if occ.loc_of(member.block) != head_loc.map(|h| h + member.offset) {
                    return Err(PlaceError::InvalidPlacement(format!(
                        "macro member '{}' is not at its offset from the head",
                        netlist.block(member.block).name
                    )));
                }
            }
        }
        Ok(occ)
    }

    fn cell_index(&self, x: i32, y: i32) -> Option<usize> {
        (x >= 0 && y >= 0 && x < self.width && y < self.height)
            .then(|| (x * self.height + y) as usize)
    }

    fn slot(&self, loc: Loc) -> Option<&Option<BlockId>> {
        let cell = self.cell_index(loc.x, loc.y)?;
        usize::try_from(loc.sub_tile)
            .ok()
            .and_then(|s| self.slots[cell].get(s))
    }

    /// The block bound at `loc`.
    pub fn block_at(&self, loc: Loc) -> Option<BlockId> {
        self.slot(loc).copied().flatten()
    }

    /// Where `block` is bound.
    pub fn loc_of(&self, block: BlockId) -> Option<Loc> {
        self.bound.get(block.index()).copied().flatten()
    }

    /// Returns `true` if `block` is bound somewhere.
    pub fn is_placed(&self, block: BlockId) -> bool {
        self.loc_of(block).is_some()
    }

    /// Number of blocks bound in cell `(x, y)`.
    pub fn usage(&self, x: i32, y: i32) -> usize {
        self.cell_index(x, y)
            .map_or(0, |c| self.slots[c].iter().filter(|s| s.is_some()).count())
    }

    /// Binds `block` to the empty slot `loc`.
    pub fn bind(&mut self, block: BlockId, loc: Loc) -> TesseraResult<()> {
        if self.is_placed(block) {
            return Err(InternalError::new(format!("block {block} is already bound")));
        }
        let cell = self
            .cell_index(loc.x, loc.y)
            .ok_or_else(|| InternalError::new(format!("slot {loc} is outside the grid")))?;
        let slot = usize::try_from(loc.sub_tile)
            .ok()
            .and_then(|s| self.slots[cell].get_mut(s))
            .ok_or_else(|| InternalError::new(format!("slot {loc} does not exist")))?;
        if let Some(other) = slot {
            return Err(InternalError::new(format!(
                "slot {loc} already holds block {other}"
            )));
        }
        *slot = Some(block);
        self.bound[block.index()] = Some(loc);
        Ok(())
    }

    /// Unbinds `block`, returning the slot it left.
    pub fn unbind(&mut self, block: BlockId) -> Option<Loc> {
        let loc = self.bound.get_mut(block.index())?.take()?;
        if let Some(cell) = self.cell_index(loc.x, loc.y) {
            if let Some(slot) = self.slots[cell].get_mut(loc.sub_tile as usize) {
                *slot = None;
            }
        }
        Some(loc)
    }

    /// Snapshot of every binding.
    pub fn to_placement(&self) -> Placement {
        let mut placement = Placement::new(self.bound.len());
        for (i, loc) in self.bound.iter().enumerate() {
            if let Some(loc) = loc {
                placement.set(BlockId::from_raw(i as u32), *loc);
            }
        }
        placement
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::Fixture;

    #[test]
    fn bind_and_unbind() {
        let fx = Fixture::uniform(2, 2, 1);
        let mut occ = GridOccupancy::new(&fx.device, 2);
        let a = BlockId::from_raw(0);
        occ.bind(a, Loc::new(1, 0, 0)).unwrap();
        assert_eq!(occ.block_at(Loc::new(1, 0, 0)), Some(a));
        assert_eq!(occ.usage(1, 0), 1);
        assert_eq!(occ.unbind(a), Some(Loc::new(1, 0, 0)));
        assert!(!occ.is_placed(a));
        assert_eq!(occ.usage(1, 0), 0);
        assert_eq!(occ.unbind(a), None);
    }

    #[test]
    fn double_binding_is_internal_error() {
        let fx = Fixture::uniform(2, 2, 1);
        let mut occ = GridOccupancy::new(&fx.device, 2);
        occ.bind(BlockId::from_raw(0), Loc::new(0, 0, 0)).unwrap();
        assert!(occ.bind(BlockId::from_raw(1), Loc::new(0, 0, 0)).is_err());
        assert!(occ.bind(BlockId::from_raw(0), Loc::new(1, 1, 0)).is_err());
        assert!(occ.bind(BlockId::from_raw(1), Loc::new(0, 0, 1)).is_err());
        assert!(occ.bind(BlockId::from_raw(1), Loc::new(2, 0, 0)).is_err());
    }

    #[test]
    fn from_placement_accepts_legal_input() {
        let mut fx = Fixture::uniform(3, 3, 1);
        let blocks = fx.chain(3);
        let mut placement = Placement::new(3);
        for (i, b) in blocks.iter().enumerate() {
            placement.set(*b, Loc::new(i as i32, 0, 0));
        }
        let occ = GridOccupancy::from_placement(&fx.ctx(), &placement).unwrap();
        assert_eq!(occ.to_placement(), placement);
    }

    #[test]
    fn from_placement_rejects_shared_slot() {
        let mut fx = Fixture::uniform(3, 3, 1);
        let blocks = fx.chain(2);
        let mut placement = Placement::new(2);
        placement.set(blocks[0], Loc::new(1, 1, 0));
        placement.set(blocks[1], Loc::new(1, 1, 0));
        let err = GridOccupancy::from_placement(&fx.ctx(), &placement).unwrap_err();
        assert!(matches!(err, PlaceError::InvalidPlacement(_)));
    }

    #[test]
    fn from_placement_rejects_unplaced_block() {
        let mut fx = Fixture::uniform(3, 3, 1);
        fx.chain(2);
        let mut placement = Placement::new(2);
        placement.set(BlockId::from_raw(0), Loc::new(0, 0, 0));
        let err = GridOccupancy::from_placement(&fx.ctx(), &placement).unwrap_err();
        assert!(matches!(err, PlaceError::InvalidPlacement(_)));
    }

    #[test]
    fn from_placement_rejects_broken_macro() {
        let mut fx = Fixture::uniform(3, 3, 1);
        let blocks = fx.chain(2);
        fx.add_vertical_macro(&blocks);
        let mut placement = Placement::new(2);
        placement.set(blocks[0], Loc::new(0, 0, 0));
        placement.set(blocks[1], Loc::new(1, 0, 0));
        let err = GridOccupancy::from_placement(&fx.ctx(), &placement).unwrap_err();
        assert!(matches!(err, PlaceError::InvalidPlacement(_)));
    }
}

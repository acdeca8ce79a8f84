//! Working block coordinates of a placement run.
//!
//! Every block carries three views of its position: the integer location the
//! current phase produced, the fractional `raw` coordinate the solver and the
//! spreader work with, and the `legal_loc` of the last strict legalization,
//! which anchors the next solve.

use crate::ids::{BlockId, NetId};
use crate::macros::MacroTable;
use crate::netlist::ClusteredNetlist;
use crate::placement::Placement;
use serde::{Deserialize, Serialize};
use tessera_device::{DeviceGrid, Loc};

/// A coordinate axis of the device grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Axis {
    /// Columns.
    X,
    /// Rows.
    Y,
}

impl Axis {
    /// Both axes, x first.
    pub const BOTH: [Axis; 2] = [Axis::X, Axis::Y];

    /// The coordinate of `loc` along this axis.
    pub fn of(self, loc: Loc) -> i32 {
        match self {
            Axis::X => loc.x,
            Axis::Y => loc.y,
        }
    }

    /// Overwrites the coordinate of `loc` along this axis.
    pub fn set(self, loc: &mut Loc, value: i32) {
        match self {
            Axis::X => loc.x = value,
            Axis::Y => loc.y = value,
        }
    }

    /// Grid extent along this axis.
    pub fn extent(self, device: &DeviceGrid) -> i32 {
        match self {
            Axis::X => device.width(),
            Axis::Y => device.height(),
        }
    }

    /// The perpendicular axis.
    pub fn other(self) -> Axis {
        match self {
            Axis::X => Axis::Y,
            Axis::Y => Axis::X,
        }
    }
}

/// The three position views of one block.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BlockLocation {
    /// Integer location produced by the latest phase.
    pub loc: Loc,
    /// Location after the last strict legalization.
    pub legal_loc: Loc,
    /// Fractional x coordinate.
    pub raw_x: f64,
    /// Fractional y coordinate.
    pub raw_y: f64,
}

impl BlockLocation {
    /// A block sitting exactly at `loc` in every view.
    pub fn at(loc: Loc) -> Self {
        Self {
            loc,
            legal_loc: loc,
            raw_x: f64::from(loc.x),
            raw_y: f64::from(loc.y),
        }
    }

    /// Fractional coordinate along `axis`.
    pub fn raw(&self, axis: Axis) -> f64 {
        match axis {
            Axis::X => self.raw_x,
            Axis::Y => self.raw_y,
        }
    }

    /// Sets the fractional coordinate along `axis`.
    pub fn set_raw(&mut self, axis: Axis, value: f64) {
        match axis {
            Axis::X => self.raw_x = value,
            Axis::Y => self.raw_y = value,
        }
    }
}

/// Read/write view over every block's position during a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockLocationStore {
    locs: Vec<BlockLocation>,
}

impl BlockLocationStore {
    /// Seeds every view from a complete placement; unplaced blocks start at the origin.
    pub fn from_placement(placement: &Placement) -> Self {
        let locs = (0..placement.len())
            .map(|i| {
                let loc = placement.loc(BlockId::from_raw(i as u32)).unwrap_or_default();
                BlockLocation::at(loc)
            })
            .collect();
        Self { locs }
    }

    /// The position views of `block`.
    pub fn get(&self, block: BlockId) -> &BlockLocation {
        &self.locs[block.index()]
    }

    /// Mutable position views of `block`.
    pub fn get_mut(&mut self, block: BlockId) -> &mut BlockLocation {
        &mut self.locs[block.index()]
    }

    /// Integer location of `block`.
    pub fn loc(&self, block: BlockId) -> Loc {
        self.locs[block.index()].loc
    }

    /// Integer coordinate of `block` along `axis`.
    pub fn pos(&self, block: BlockId, axis: Axis) -> i32 {
        axis.of(self.locs[block.index()].loc)
    }

    /// Number of blocks.
    pub fn len(&self) -> usize {
        self.locs.len()
    }

    /// Returns `true` if no blocks are tracked.
    pub fn is_empty(&self) -> bool {
        self.locs.is_empty()
    }

    /// Copies the integer location into `legal_loc` for every block.
    pub fn commit_legal(&mut self) {
        for l in &mut self.locs {
            l.legal_loc = l.loc;
        }
    }

    /// Re-derives every macro member's location from its head.
    ///
    /// The head is first shifted so that no member falls off the grid, then
    /// each member is set to `head + offset`. Calling this twice in a row
    /// changes nothing the second time.
    pub fn update_macros(&mut self, macros: &MacroTable, device: &DeviceGrid) {
        for m in macros.iter() {
            let head = m.head();
            let ((lo_x, lo_y), (hi_x, hi_y)) = m.offset_bounds();
            let mut head_loc = self.loc(head);
            head_loc.x = head_loc.x.min(device.width() - 1 - hi_x).max(-lo_x);
            head_loc.y = head_loc.y.min(device.height() - 1 - hi_y).max(-lo_y);
            self.locs[head.index()].loc = head_loc;
            for member in &m.members {
                self.locs[member.block.index()].loc = head_loc + member.offset;
            }
        }
    }

    /// Half-perimeter wirelength of one net, `None` for ignored nets and nets
    /// with fewer than two pins.
    ///
    /// Each axis contributes at least 1 so that nets collapsed onto one cell
    /// still carry cost.
    pub fn net_hpwl(&self, netlist: &ClusteredNetlist, net: NetId) -> Option<i64> {
        let n = netlist.net(net);
        if n.is_ignored || n.pin_count() < 2 {
            return None;
        }
        let mut pins = netlist.net_pins(net).map(|p| self.loc(netlist.pin_block(p)));
        let first = pins.next()?;
        let (mut xmin, mut xmax, mut ymin, mut ymax) = (first.x, first.x, first.y, first.y);
        for loc in pins {
            xmin = xmin.min(loc.x);
            xmax = xmax.max(loc.x);
            ymin = ymin.min(loc.y);
            ymax = ymax.max(loc.y);
        }
        Some(i64::from((xmax - xmin).max(1)) + i64::from((ymax - ymin).max(1)))
    }

    /// Sum of [`net_hpwl`](Self::net_hpwl) over all nets.
    pub fn total_hpwl(&self, netlist: &ClusteredNetlist) -> i64 {
        netlist
            .net_ids()
            .filter_map(|net| self.net_hpwl(netlist, net))
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::Fixture;

    #[test]
    fn axis_helpers() {
        let mut loc = Loc::new(1, 2, 0);
        assert_eq!(Axis::Y.of(loc), 2);
        Axis::X.set(&mut loc, 5);
        assert_eq!(loc.x, 5);
        assert_eq!(Axis::X.other(), Axis::Y);
    }

    #[test]
    fn hpwl_uses_floor_of_one() {
        let mut fx = Fixture::uniform(4, 4, 2);
        let blocks = fx.chain(3);
        let placement = fx.placement(&[
            Loc::new(0, 0, 0),
            Loc::new(0, 0, 1),
            Loc::new(3, 2, 0),
        ]);
        let store = BlockLocationStore::from_placement(&placement);
        // net b0->b1 shares a cell: 1 + 1; net b1->b2: 3 + 2
        assert_eq!(store.total_hpwl(&fx.netlist), 7);
        assert_eq!(blocks.len(), 3);
    }

    #[test]
    fn ignored_nets_do_not_count() {
        let mut fx = Fixture::uniform(4, 4, 1);
        fx.chain(2);
        let placement = fx.placement(&[Loc::new(0, 0, 0), Loc::new(3, 3, 0)]);
        let store = BlockLocationStore::from_placement(&placement);
        assert_eq!(store.total_hpwl(&fx.netlist), 6);
        fx.netlist.set_ignored(NetId::from_raw(0), true);
        assert_eq!(store.total_hpwl(&fx.netlist), 0);
    }

    #[test]
    fn update_macros_is_idempotent() {
        let mut fx = Fixture::uniform(4, 4, 1);
        let blocks = fx.chain(3);
        fx.add_vertical_macro(&blocks);
        let placement = fx.placement(&[
            Loc::new(2, 1, 0),
            Loc::new(0, 0, 0),
            Loc::new(3, 3, 0),
        ]);
        let mut store = BlockLocationStore::from_placement(&placement);
        store.update_macros(&fx.macros, &fx.device);
        let once: Vec<Loc> = blocks.iter().map(|b| store.loc(*b)).collect();
        assert_eq!(once, vec![Loc::new(2, 1, 0), Loc::new(2, 2, 0), Loc::new(2, 3, 0)]);
        store.update_macros(&fx.macros, &fx.device);
        let twice: Vec<Loc> = blocks.iter().map(|b| store.loc(*b)).collect();
        assert_eq!(once, twice);
    }

    #[test]
    fn update_macros_keeps_members_on_grid() {
        let mut fx = Fixture::uniform(4, 4, 1);
        let blocks = fx.chain(3);
        fx.add_vertical_macro(&blocks);
        let placement = fx.placement(&[
            Loc::new(1, 3, 0),
            Loc::new(0, 0, 0),
            Loc::new(0, 1, 0),
        ]);
        let mut store = BlockLocationStore::from_placement(&placement);
        store.update_macros(&fx.macros, &fx.device);
        assert_eq!(store.loc(blocks[0]), Loc::new(1, 1, 0));
        assert_eq!(store.loc(blocks[2]), Loc::new(1, 3, 0));
        for (i, b) in blocks.iter().enumerate() {
            assert_eq!(
                store.loc(*b) - store.loc(blocks[0]),
                fx.macros.offset_of(blocks[i])
            );
        }
    }

    #[test]
    fn commit_legal_copies_locations() {
        let mut fx = Fixture::uniform(2, 2, 1);
        let blocks = fx.chain(1);
        let placement = fx.placement(&[Loc::new(0, 0, 0)]);
        let mut store = BlockLocationStore::from_placement(&placement);
        store.get_mut(blocks[0]).loc = Loc::new(1, 1, 0);
        assert_eq!(store.get(blocks[0]).legal_loc, Loc::new(0, 0, 0));
        store.commit_legal();
        assert_eq!(store.get(blocks[0]).legal_loc, Loc::new(1, 1, 0));
    }
}

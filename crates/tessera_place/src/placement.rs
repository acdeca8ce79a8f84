//! Placement snapshots exchanged with the caller.

use crate::ids::BlockId;
use serde::{Deserialize, Serialize};
use tessera_device::Loc;

/// The location of every block, as handed to and returned from the placer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Placement {
    locs: Vec<Option<Loc>>,
}

impl Placement {
    /// Creates a snapshot with `block_count` unplaced blocks.
    pub fn new(block_count: usize) -> Self {
        Self {
            locs: vec![None; block_count],
        }
    }

    /// Location of `block`, if placed.
    pub fn loc(&self, block: BlockId) -> Option<Loc> {
        self.locs.get(block.index()).copied().flatten()
    }

    /// Places `block` at `loc`.
    pub fn set(&mut self, block: BlockId, loc: Loc) {
        self.locs[block.index()] = Some(loc);
    }

    /// Removes the location of `block`.
    pub fn clear(&mut self, block: BlockId) {
        self.locs[block.index()] = None;
    }

    /// Number of blocks covered by the snapshot.
    pub fn len(&self) -> usize {
        self.locs.len()
    }

    /// Returns `true` if the snapshot covers no blocks.
    pub fn is_empty(&self) -> bool {
        self.locs.is_empty()
    }

    /// Returns whether every block has a location.
    pub fn is_fully_placed(&self) -> bool {
        self.locs.iter().all(Option::is_some)
    }

    /// Returns the number of placed blocks.
    pub fn placed_count(&self) -> usize {
        self.locs.iter().filter(|l| l.is_some()).count()
    }

    /// Iterates `(block, location)` pairs of placed blocks.
    pub fn iter(&self) -> impl Iterator<Item = (BlockId, Loc)> + '_ {
        self.locs
            .iter()
            .enumerate()
            .filter_map(|(i, l)| l.map(|l| (BlockId::from_raw(i as u32), l)))
    }
}

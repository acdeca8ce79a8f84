//! Placement macros: rigid groups of blocks moved as one.
//!
//! A macro is stored as its head plus `(member, offset)` pairs. Only the head
//! is ever solved or searched for; member locations are always derived as
//! `head + offset`.

use crate::error::PlaceError;
use crate::ids::{BlockId, MacroId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tessera_device::Offset;

/// One member of a macro.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MacroMember {
    /// The member block.
    pub block: BlockId,
    /// Displacement from the head.
    pub offset: Offset,
}

/// A rigid group of blocks. `members[0]` is the head, at offset zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacementMacro {
    /// The unique ID of this macro.
    pub id: MacroId,
    /// Members in definition order, head first.
    pub members: Vec<MacroMember>,
}

impl PlacementMacro {
    /// The head block.
    pub fn head(&self) -> BlockId {
        self.members[0].block
    }

    /// Smallest and largest `(dx, dy)` over all members.
    pub fn offset_bounds(&self) -> ((i32, i32), (i32, i32)) {
        let mut lo = (0, 0);
        let mut hi = (0, 0);
        for m in &self.members {
            lo = (lo.0.min(m.offset.dx), lo.1.min(m.offset.dy));
            hi = (hi.0.max(m.offset.dx), hi.1.max(m.offset.dy));
        }
        (lo, hi)
    }
}

/// All macros of a design with a reverse index from block to macro.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MacroTable {
    macros: Vec<PlacementMacro>,
    membership: HashMap<BlockId, (MacroId, usize)>,
}

impl MacroTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a macro. The first member must be the head with a zero offset.
    pub fn add_macro(&mut self, members: Vec<MacroMember>) -> Result<MacroId, PlaceError> {
        let Some(head) = members.first() else {
            return Err(PlaceError::InvalidMacro("macro has no members".into()));
        };
        if !head.offset.is_zero() {
            return Err(PlaceError::InvalidMacro(format!(
                "head block {} must have a zero offset",
                head.block
            )));
        }
        for (i, m) in members.iter().enumerate() {
            if self.membership.contains_key(&m.block)
                || members[..i].iter().any(|o| o.block == m.block)
            {
                return Err(PlaceError::InvalidMacro(format!(
                    "block {} belongs to more than one macro slot",
                    m.block
                )));
            }
            if members[..i].iter().any(|o| o.offset == m.offset) {
                return Err(PlaceError::InvalidMacro(format!(
                    "block {} repeats an offset of its macro",
                    m.block
                )));
            }
        }

        let id = MacroId::from_raw(self.macros.len() as u32);
        for (i, m) in members.iter().enumerate() {
            self.membership.insert(m.block, (id, i));
        }
        self.macros.push(PlacementMacro { id, members });
        Ok(id)
    }

    /// Returns the macro with the given ID.
    pub fn get(&self, id: MacroId) -> &PlacementMacro {
        &self.macros[id.index()]
    }

    /// Iterates all macros.
    pub fn iter(&self) -> impl Iterator<Item = &PlacementMacro> {
        self.macros.iter()
    }

    /// Number of macros.
    pub fn len(&self) -> usize {
        self.macros.len()
    }

    /// Returns `true` if there are no macros.
    pub fn is_empty(&self) -> bool {
        self.macros.is_empty()
    }

    /// The macro containing `block`, if any.
    pub fn macro_of(&self, block: BlockId) -> Option<MacroId> {
        self.membership.get(&block).map(|&(id, _)| id)
    }

    /// Returns `true` if `block` heads a macro.
    pub fn is_macro_head(&self, block: BlockId) -> bool {
        matches!(self.membership.get(&block), Some(&(_, 0)))
    }

    /// The head of the macro containing `block`.
    pub fn head_of(&self, block: BlockId) -> Option<BlockId> {
        self.macro_of(block).map(|id| self.get(id).head())
    }

    /// Offset of `block` from its macro head, zero for blocks outside macros.
    pub fn offset_of(&self, block: BlockId) -> Offset {
        self.membership
            .get(&block)
            .map(|&(id, i)| self.macros[id.index()].members[i].offset)
            .unwrap_or_default()
    }

    /// Number of blocks moved together with `block`: the macro size for heads, else 1.
    pub fn size_of(&self, block: BlockId) -> usize {
        match self.membership.get(&block) {
            Some(&(id, 0)) => self.macros[id.index()].members.len(),
            _ => 1,
        }
    }
}

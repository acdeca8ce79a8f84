//! Clustered netlist data structures.
//!
//! Defines the read-only netlist the placer consumes: blocks (with their
//! logical type and fixed flag), nets (one driver plus sinks), and pins
//! (block connections to nets). Placement positions live elsewhere, in
//! [`Placement`](crate::placement::Placement) snapshots and the working
//! [`BlockLocationStore`](crate::locations::BlockLocationStore).

use crate::ids::{BlockId, NetId, PinId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tessera_device::BlockTypeId;

/// The clustered netlist produced by packing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClusteredNetlist {
    /// All blocks in the netlist.
    pub blocks: Vec<Block>,
    /// All nets in the netlist.
    pub nets: Vec<Net>,
    /// All pins in the netlist.
    pub pins: Vec<Pin>,
    #[serde(skip)]
    names: HashMap<String, BlockId>,
}

impl ClusteredNetlist {
    /// Creates an empty netlist.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a block and returns its ID.
    pub fn add_block(&mut self, name: impl Into<String>, block_type: BlockTypeId) -> BlockId {
        let id = BlockId::from_raw(self.blocks.len() as u32);
        let name = name.into();
        self.names.insert(name.clone(), id);
        self.blocks.push(Block {
            id,
            name,
            block_type,
            is_fixed: false,
            pins: Vec::new(),
        });
        id
    }

    /// Adds a pin on `block` and returns its ID.
    pub fn add_pin(
        &mut self,
        block: BlockId,
        name: impl Into<String>,
        direction: PinDirection,
    ) -> PinId {
        let id = PinId::from_raw(self.pins.len() as u32);
        self.pins.push(Pin {
            id,
            name: name.into(),
            direction,
            block,
            net: None,
        });
        self.blocks[block.index()].pins.push(id);
        id
    }

    /// Adds a net and connects its pins to it.
    pub fn add_net(
        &mut self,
        name: impl Into<String>,
        driver: Option<PinId>,
        sinks: Vec<PinId>,
    ) -> NetId {
        let id = NetId::from_raw(self.nets.len() as u32);
        for pin in driver.iter().chain(sinks.iter()) {
            self.pins[pin.index()].net = Some(id);
        }
        self.nets.push(Net {
            id,
            name: name.into(),
            driver,
            sinks,
            is_ignored: false,
        });
        id
    }

    /// Marks a block as fixed: the placer never moves it.
    pub fn set_fixed(&mut self, block: BlockId, fixed: bool) {
        self.blocks[block.index()].is_fixed = fixed;
    }

    /// Marks a net as ignored (global or clock): excluded from wirelength.
    pub fn set_ignored(&mut self, net: NetId, ignored: bool) {
        self.nets[net.index()].is_ignored = ignored;
    }

    /// Returns the block with the given ID.
    pub fn block(&self, id: BlockId) -> &Block {
        &self.blocks[id.index()]
    }

    /// Returns the net with the given ID.
    pub fn net(&self, id: NetId) -> &Net {
        &self.nets[id.index()]
    }

    /// Returns the pin with the given ID.
    pub fn pin(&self, id: PinId) -> &Pin {
        &self.pins[id.index()]
    }

    /// Returns the block a pin belongs to.
    pub fn pin_block(&self, id: PinId) -> BlockId {
        self.pins[id.index()].block
    }

    /// Iterates the pins of a net, driver first.
    pub fn net_pins(&self, id: NetId) -> impl Iterator<Item = PinId> + '_ {
        let net = self.net(id);
        net.driver.into_iter().chain(net.sinks.iter().copied())
    }

    /// Returns `true` if any pin of the block is attached to a net.
    pub fn has_connections(&self, id: BlockId) -> bool {
        self.block(id)
            .pins
            .iter()
            .any(|p| self.pins[p.index()].net.is_some())
    }

    /// Iterates all block IDs in order.
    pub fn block_ids(&self) -> impl Iterator<Item = BlockId> {
        (0..self.blocks.len() as u32).map(BlockId::from_raw)
    }

    /// Iterates all net IDs in order.
    pub fn net_ids(&self) -> impl Iterator<Item = NetId> {
        (0..self.nets.len() as u32).map(NetId::from_raw)
    }

    /// Returns the number of blocks.
    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    /// Returns the number of nets.
    pub fn net_count(&self) -> usize {
        self.nets.len()
    }

    /// Looks up a block by name.
    ///
    /// The name index is not serialized; call
    /// [`rebuild_indices`](Self::rebuild_indices) after deserializing.
    pub fn block_by_name(&self, name: &str) -> Option<BlockId> {
        self.names.get(name).copied()
    }

    /// Rebuilds the name index after deserialization.
    pub fn rebuild_indices(&mut self) {
        self.names = self
            .blocks
            .iter()
            .map(|b| (b.name.clone(), b.id))
            .collect();
    }
}

/// A clustered block: the unit the placer moves.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Block {
    /// The unique ID of this block.
    pub id: BlockId,
    /// Human-readable block name.
    pub name: String,
    /// Logical type, deciding which sub-tiles accept the block.
    pub block_type: BlockTypeId,
    /// Whether the block's location is locked (e.g. constrained pads).
    pub is_fixed: bool,
    /// Pins of this block.
    pub pins: Vec<PinId>,
}

/// A net connecting one driver pin to any number of sink pins.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Net {
    /// The unique ID of this net.
    pub id: NetId,
    /// Human-readable net name.
    pub name: String,
    /// The driver pin, absent for undriven nets.
    pub driver: Option<PinId>,
    /// The sink pins.
    pub sinks: Vec<PinId>,
    /// Global or clock nets that take no part in wirelength optimization.
    pub is_ignored: bool,
}

impl Net {
    /// Number of pins including the driver.
    pub fn pin_count(&self) -> usize {
        self.sinks.len() + usize::from(self.driver.is_some())
    }
}

/// Direction of a pin relative to its net.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PinDirection {
    /// The pin drives its net (block output).
    Driver,
    /// The pin is driven by its net (block input).
    Sink,
}

/// A pin on a block.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pin {
    /// The unique ID of this pin.
    pub id: PinId,
    /// Pin name within its block.
    pub name: String,
    /// Driver or sink.
    pub direction: PinDirection,
    /// Owning block.
    pub block: BlockId,
    /// Attached net, if any.
    pub net: Option<NetId>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_block_netlist() -> (ClusteredNetlist, BlockId, BlockId, NetId) {
        let ty = BlockTypeId::from_raw(0);
        let mut nl = ClusteredNetlist::new();
        let a = nl.add_block("a", ty);
        let b = nl.add_block("b", ty);
        let out = nl.add_pin(a, "O", PinDirection::Driver);
        let inp = nl.add_pin(b, "I", PinDirection::Sink);
        let net = nl.add_net("n0", Some(out), vec![inp]);
        (nl, a, b, net)
    }

    #[test]
    fn add_net_wires_pins() {
        let (nl, a, b, net) = two_block_netlist();
        let pins: Vec<_> = nl.net_pins(net).collect();
        assert_eq!(pins.len(), 2);
        assert_eq!(nl.pin_block(pins[0]), a);
        assert_eq!(nl.pin_block(pins[1]), b);
        assert_eq!(nl.pin(pins[1]).net, Some(net));
        assert_eq!(nl.net(net).pin_count(), 2);
    }

    #[test]
    fn connections_tracked_per_block() {
        let (mut nl, a, _, _) = two_block_netlist();
        let lonely = nl.add_block("lonely", BlockTypeId::from_raw(0));
        nl.add_pin(lonely, "I", PinDirection::Sink);
        assert!(nl.has_connections(a));
        assert!(!nl.has_connections(lonely));
    }

    #[test]
    fn flags() {
        let (mut nl, a, _, net) = two_block_netlist();
        nl.set_fixed(a, true);
        nl.set_ignored(net, true);
        assert!(nl.block(a).is_fixed);
        assert!(nl.net(net).is_ignored);
    }

    #[test]
    fn undriven_net_counts_sinks_only() {
        let (mut nl, _, b, _) = two_block_netlist();
        let p = nl.add_pin(b, "I2", PinDirection::Sink);
        let net = nl.add_net("floating", None, vec![p]);
        assert_eq!(nl.net(net).pin_count(), 1);
        assert_eq!(nl.net_pins(net).count(), 1);
    }

    #[test]
    fn lookup_by_name() {
        let (nl, a, b, _) = two_block_netlist();
        assert_eq!(nl.block_by_name("a"), Some(a));
        assert_eq!(nl.block_by_name("b"), Some(b));
        assert_eq!(nl.block_by_name("c"), None);
    }

    #[test]
    fn serde_roundtrip_rebuilds_names() {
        let (nl, a, _, _) = two_block_netlist();
        let json = serde_json::to_string(&nl).unwrap();
        let mut back: ClusteredNetlist = serde_json::from_str(&json).unwrap();
        assert_eq!(back.block_by_name("a"), None);
        back.rebuild_indices();
        assert_eq!(back.block_by_name("a"), Some(a));
        assert_eq!(back.block_count(), 2);
    }
}

//! The read-only inputs shared by every phase of a placement run.

use crate::ids::PinId;
use crate::macros::MacroTable;
use crate::netlist::ClusteredNetlist;
use tessera_config::PlacerConfig;
use tessera_device::DeviceGrid;

/// Source of per-pin timing criticality in `[0, 1]`.
///
/// Implemented by the timing analyzer; the placer only reads it to strengthen
/// connections toward critical sinks.
pub trait PinCriticality {
    /// Criticality of the connection ending at sink `pin`.
    fn criticality(&self, pin: PinId) -> f64;
}

/// Borrowed device, netlist, macros and settings for one placement run.
#[derive(Clone, Copy)]
pub struct PlacementContext<'a> {
    /// The target device.
    pub device: &'a DeviceGrid,
    /// The clustered netlist.
    pub netlist: &'a ClusteredNetlist,
    /// Rigid block groups.
    pub macros: &'a MacroTable,
    /// Tunables.
    pub config: &'a PlacerConfig,
    /// Optional timing criticality provider.
    pub criticality: Option<&'a dyn PinCriticality>,
}

impl<'a> PlacementContext<'a> {
    /// Creates a context without timing information.
    pub fn new(
        device: &'a DeviceGrid,
        netlist: &'a ClusteredNetlist,
        macros: &'a MacroTable,
        config: &'a PlacerConfig,
    ) -> Self {
        Self {
            device,
            netlist,
            macros,
            config,
            criticality: None,
        }
    }

    /// Attaches a criticality provider.
    pub fn with_criticality(mut self, criticality: &'a dyn PinCriticality) -> Self {
        self.criticality = Some(criticality);
        self
    }

    /// Returns `true` if the engine moves `block`: it is not fixed, has a
    /// connected pin, and is either outside any macro or heads one.
    pub fn is_placeable(&self, block: crate::ids::BlockId) -> bool {
        !self.netlist.block(block).is_fixed
            && self.netlist.has_connections(block)
            && (self.macros.macro_of(block).is_none() || self.macros.is_macro_head(block))
    }
}

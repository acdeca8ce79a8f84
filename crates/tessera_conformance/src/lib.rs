//! Conformance test helpers for the tessera placer.
//!
//! Provides device and netlist builders plus a legality checker shared by the
//! end-to-end scenarios under `tests/`.

#![warn(missing_docs)]

use rand::rngs::StdRng;
use rand::SeedableRng;
use tessera_config::PlacerConfig;
use tessera_device::{BlockTypeId, DeviceError, DeviceGrid, Loc, Offset, TileType};
use tessera_diagnostics::{Diagnostic, DiagnosticSink};
use tessera_place::{
    analytic_place, random_placement, BlockId, ClusteredNetlist, MacroMember, MacroTable,
    PlaceError, Placement, PlacementContext, PlacementOutcome, PinDirection,
};

/// A device, a netlist and everything else one placement run borrows.
pub struct Design {
    /// The target device.
    pub device: DeviceGrid,
    /// The clustered netlist.
    pub netlist: ClusteredNetlist,
    /// Rigid block groups.
    pub macros: MacroTable,
    /// Placer settings.
    pub config: PlacerConfig,
    /// Block types in registration order.
    pub types: Vec<BlockTypeId>,
}

/// Result of [`Design::place`].
pub struct PlaceResult {
    /// The outcome on success.
    pub outcome: Result<PlacementOutcome, PlaceError>,
    /// The final placement (unchanged on failure).
    pub placement: Placement,
    /// Everything emitted to the sink.
    pub diagnostics: Vec<Diagnostic>,
}

impl Design {
    /// A `width x height` grid of single-slot tiles; column `x` accepts block
    /// type `x % type_count`. Types are named `t0`, `t1`, ...
    pub fn striped(width: i32, height: i32, type_count: usize) -> Result<Self, DeviceError> {
        let mut device = DeviceGrid::new(width, height)?;
        let types: Vec<BlockTypeId> = (0..type_count)
            .map(|i| device.add_block_type(format!("t{i}")))
            .collect();
        let mut tiles = Vec::with_capacity(type_count);
        for (i, ty) in types.iter().enumerate() {
            tiles.push(device.add_tile_type(TileType::single(format!("T{i}"), 1, &[*ty]))?);
        }
        device.fill(|x, _| Some(tiles[x as usize % type_count]))?;
        Ok(Self::from_device(device, types))
    }

    /// A `width x height` grid where every cell holds `capacity` slots of
    /// the single block type `clb`.
    pub fn uniform(width: i32, height: i32, capacity: usize) -> Result<Self, DeviceError> {
        let mut device = DeviceGrid::new(width, height)?;
        let clb = device.add_block_type("clb");
        let tile = device.add_tile_type(TileType::single("CLB", capacity, &[clb]))?;
        device.fill(|_, _| Some(tile))?;
        Ok(Self::from_device(device, vec![clb]))
    }

    fn from_device(device: DeviceGrid, types: Vec<BlockTypeId>) -> Self {
        Self {
            device,
            netlist: ClusteredNetlist::new(),
            macros: MacroTable::new(),
            config: PlacerConfig::default(),
            types,
        }
    }

    /// Borrows everything as a placement context.
    pub fn ctx(&self) -> PlacementContext<'_> {
        PlacementContext::new(&self.device, &self.netlist, &self.macros, &self.config)
    }

    /// Adds a block of the `type_index`-th registered type.
    pub fn block(&mut self, name: &str, type_index: usize) -> BlockId {
        self.netlist.add_block(name, self.types[type_index])
    }

    /// The block called `name`, if any.
    pub fn named(&self, name: &str) -> Option<BlockId> {
        self.netlist.block_by_name(name)
    }

    /// Connects `driver` to every block in `sinks` with one new net.
    pub fn connect(&mut self, driver: BlockId, sinks: &[BlockId]) {
        let n = self.netlist.net_count();
        let out = self
            .netlist
            .add_pin(driver, format!("out{n}"), PinDirection::Driver);
        let ins = sinks
            .iter()
            .map(|s| self.netlist.add_pin(*s, format!("in{n}"), PinDirection::Sink))
            .collect();
        self.netlist.add_net(format!("net{n}"), Some(out), ins);
    }

    /// `n` blocks where block `i` has type `i % types` and drives block `i + 1`.
    pub fn chain(&mut self, n: usize) -> Vec<BlockId> {
        let type_count = self.types.len();
        let blocks: Vec<BlockId> = (0..n)
            .map(|i| self.block(&format!("c{i}"), i % type_count))
            .collect();
        for pair in blocks.windows(2) {
            self.connect(pair[0], &[pair[1]]);
        }
        blocks
    }

    /// Groups `members` into a macro, the first one being the head.
    pub fn add_macro(&mut self, members: &[(BlockId, Offset)]) -> Result<(), PlaceError> {
        let members = members
            .iter()
            .map(|&(block, offset)| MacroMember { block, offset })
            .collect();
        self.macros.add_macro(members).map(|_| ())
    }

    /// A legal random placement drawn with `seed`.
    pub fn seed_placement(&self, seed: u64) -> Result<Placement, PlaceError> {
        let mut placement = Placement::new(self.netlist.block_count());
        random_placement(&self.ctx(), &mut placement, &mut StdRng::seed_from_u64(seed))?;
        Ok(placement)
    }

    /// Runs the analytic placer on `placement`.
    pub fn place(&self, mut placement: Placement) -> PlaceResult {
        let sink = DiagnosticSink::new();
        let outcome = analytic_place(&self.ctx(), &mut placement, &sink);
        PlaceResult {
            outcome,
            placement,
            diagnostics: sink.take_all(),
        }
    }

    /// Total HPWL of `placement` as the placer computes it.
    pub fn hpwl(&self, placement: &Placement) -> i64 {
        tessera_place::BlockLocationStore::from_placement(placement).total_hpwl(&self.netlist)
    }

    /// Describes the first legality violation of `placement`, if any.
    ///
    /// Checks that every block is placed on an existing, type-compatible slot
    /// no other block uses, and that macro members sit at `head + offset`.
    pub fn legality_violation(&self, placement: &Placement) -> Option<String> {
        let mut used: Vec<Loc> = Vec::new();
        for block in self.netlist.block_ids() {
            let b = self.netlist.block(block);
            let Some(loc) = placement.loc(block) else {
                return Some(format!("{} is unplaced", b.name));
            };
            if !self.device.is_compatible(loc, b.block_type) {
                return Some(format!("{} sits on incompatible slot {loc}", b.name));
            }
            if used.contains(&loc) {
                return Some(format!("{} shares slot {loc}", b.name));
            }
            used.push(loc);
        }
        for m in self.macros.iter() {
            let head = placement.loc(m.head())?;
            for member in &m.members {
                if placement.loc(member.block) != Some(head + member.offset) {
                    return Some(format!(
                        "{} is off its macro offset",
                        self.netlist.block(member.block).name
                    ));
                }
            }
        }
        None
    }
}

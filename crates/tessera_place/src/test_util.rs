//! Small device and netlist builders shared by the unit tests.

use crate::context::PlacementContext;
use crate::ids::BlockId;
use crate::macros::{MacroMember, MacroTable};
use crate::netlist::{ClusteredNetlist, PinDirection};
use crate::placement::Placement;
use tessera_config::PlacerConfig;
use tessera_device::{BlockTypeId, DeviceGrid, Loc, Offset, TileType};

pub(crate) struct Fixture {
    pub device: DeviceGrid,
    pub netlist: ClusteredNetlist,
    pub macros: MacroTable,
    pub config: PlacerConfig,
    pub clb: BlockTypeId,
    pub io: BlockTypeId,
}

impl Fixture {
    /// Every cell is a logic tile with `capacity` slots.
    pub fn uniform(width: i32, height: i32, capacity: usize) -> Self {
        Self::build(width, height, capacity, &[])
    }

    /// Logic tiles everywhere except the listed columns, which hold one io slot.
    pub fn columns(width: i32, height: i32, io_columns: &[i32]) -> Self {
        Self::build(width, height, 1, io_columns)
    }

    fn build(width: i32, height: i32, capacity: usize, io_columns: &[i32]) -> Self {
        let mut device = DeviceGrid::new(width, height).unwrap();
        let clb = device.add_block_type("clb");
        let io = device.add_block_type("io");
        let logic = device
            .add_tile_type(TileType::single("CLB", capacity, &[clb]))
            .unwrap();
        let pad = device
            .add_tile_type(TileType::single("IOB", 1, &[io]))
            .unwrap();
        device
            .fill(|x, _| Some(if io_columns.contains(&x) { pad } else { logic }))
            .unwrap();
        Self {
            device,
            netlist: ClusteredNetlist::new(),
            macros: MacroTable::new(),
            config: PlacerConfig::default(),
            clb,
            io,
        }
    }

    pub fn ctx(&self) -> PlacementContext<'_> {
        PlacementContext::new(&self.device, &self.netlist, &self.macros, &self.config)
    }

    pub fn block(&mut self, name: &str, ty: BlockTypeId) -> BlockId {
        self.netlist.add_block(name, ty)
    }

    /// Connects `driver` to every block of `sinks` with one net.
    pub fn connect(&mut self, driver: BlockId, sinks: &[BlockId]) {
        let n = self.netlist.net_count();
        let out = self
            .netlist
            .add_pin(driver, format!("O{n}"), PinDirection::Driver);
        let ins = sinks
            .iter()
            .map(|s| self.netlist.add_pin(*s, format!("I{n}"), PinDirection::Sink))
            .collect();
        self.netlist.add_net(format!("n{n}"), Some(out), ins);
    }

    /// `n` logic blocks where block `i` drives block `i + 1`.
    pub fn chain(&mut self, n: usize) -> Vec<BlockId> {
        let clb = self.clb;
        let blocks: Vec<BlockId> = (0..n).map(|i| self.block(&format!("b{i}"), clb)).collect();
        for pair in blocks.windows(2) {
            self.connect(pair[0], &[pair[1]]);
        }
        blocks
    }

    /// Stacks `blocks` vertically, the first one heading the macro.
    pub fn add_vertical_macro(&mut self, blocks: &[BlockId]) {
        let members = blocks
            .iter()
            .enumerate()
            .map(|(i, b)| MacroMember {
                block: *b,
                offset: Offset::new(0, i as i32, 0),
            })
            .collect();
        self.macros.add_macro(members).unwrap();
    }

    /// Placement putting block `i` at `locs[i]`.
    pub fn placement(&self, locs: &[Loc]) -> Placement {
        let mut placement = Placement::new(self.netlist.block_count());
        for (i, loc) in locs.iter().enumerate() {
            placement.set(BlockId::from_raw(i as u32), *loc);
        }
        placement
    }
}

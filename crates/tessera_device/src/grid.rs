//! The device grid: tile types, sub-tiles, block types and per-cell queries.

use crate::geometry::Loc;
use crate::ids::{BlockTypeId, TileTypeId};
use serde::{Deserialize, Serialize};

/// Errors raised while building a device description.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum DeviceError {
    /// A cell coordinate lies outside the grid.
    #[error("cell ({x}, {y}) is outside the {width}x{height} grid")]
    OutOfBounds {
        /// Column.
        x: i32,
        /// Row.
        y: i32,
        /// Grid width.
        width: i32,
        /// Grid height.
        height: i32,
    },
    /// A tile type ID does not exist.
    #[error("unknown tile type {0}")]
    UnknownTileType(u32),
    /// A sub-tile references an unknown block type.
    #[error("tile type '{tile}' accepts unknown block type {block_type}")]
    UnknownBlockType {
        /// Name of the offending tile type.
        tile: String,
        /// Raw ID of the missing block type.
        block_type: u32,
    },
    /// The grid has a zero dimension.
    #[error("grid dimensions must be positive, got {width}x{height}")]
    EmptyGrid {
        /// Requested width.
        width: i32,
        /// Requested height.
        height: i32,
    },
}

/// A logical block type produced by packing (e.g. `clb`, `io`, `dsp`).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockType {
    /// Type name.
    pub name: String,
}

/// A group of interchangeable slots inside a tile.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubTile {
    /// Sub-tile name.
    pub name: String,
    /// Number of slots.
    pub capacity: usize,
    /// Block types that may occupy these slots.
    pub compatible: Vec<BlockTypeId>,
}

/// A physical tile type occupying one grid cell.
///
/// Slot indices are assigned to sub-tiles in declaration order, so the first
/// sub-tile owns slots `0..capacity`, the next one continues from there.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileType {
    /// Tile type name.
    pub name: String,
    /// Sub-tiles in slot order.
    pub sub_tiles: Vec<SubTile>,
}

impl TileType {
    /// A tile with a single sub-tile of the given capacity accepting `accepts`.
    pub fn single(name: impl Into<String>, capacity: usize, accepts: &[BlockTypeId]) -> Self {
        let name = name.into();
        Self {
            sub_tiles: vec![SubTile {
                name: name.clone(),
                capacity,
                compatible: accepts.to_vec(),
            }],
            name,
        }
    }

    /// Total number of slots.
    pub fn capacity(&self) -> usize {
        self.sub_tiles.iter().map(|s| s.capacity).sum()
    }

    /// Slot indices that accept `block_type`.
    pub fn compatible_slots(&self, block_type: BlockTypeId) -> Vec<i32> {
        let mut slots = Vec::new();
        let mut first = 0i32;
        for sub_tile in &self.sub_tiles {
            let cap = sub_tile.capacity as i32;
            if sub_tile.compatible.contains(&block_type) {
                slots.extend(first..first + cap);
            }
            first += cap;
        }
        slots
    }

    /// Returns `true` if any sub-tile accepts `block_type`.
    pub fn accepts(&self, block_type: BlockTypeId) -> bool {
        self.sub_tiles
            .iter()
            .any(|s| s.capacity > 0 && s.compatible.contains(&block_type))
    }
}

/// A rectangular FPGA device.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DeviceGrid {
    width: i32,
    height: i32,
    block_types: Vec<BlockType>,
    tile_types: Vec<TileType>,
    /// Column-major cell contents; `None` is an empty cell.
    cells: Vec<Option<TileTypeId>>,
}

impl DeviceGrid {
    /// Creates an empty grid of the given size with no types registered.
    pub fn new(width: i32, height: i32) -> Result<Self, DeviceError> {
        if width <= 0 || height <= 0 {
            return Err(DeviceError::EmptyGrid { width, height });
        }
        Ok(Self {
            width,
            height,
            block_types: Vec::new(),
            tile_types: Vec::new(),
            cells: vec![None; (width * height) as usize],
        })
    }

    /// Registers a logical block type.
    pub fn add_block_type(&mut self, name: impl Into<String>) -> BlockTypeId {
        let id = BlockTypeId::from_raw(self.block_types.len() as u32);
        self.block_types.push(BlockType { name: name.into() });
        id
    }

    /// Registers a physical tile type, checking its block type references.
    pub fn add_tile_type(&mut self, tile: TileType) -> Result<TileTypeId, DeviceError> {
        for sub_tile in &tile.sub_tiles {
            if let Some(bad) = sub_tile
                .compatible
                .iter()
                .find(|b| b.index() >= self.block_types.len())
            {
                return Err(DeviceError::UnknownBlockType {
                    tile: tile.name.clone(),
                    block_type: bad.as_raw(),
                });
            }
        }
        let id = TileTypeId::from_raw(self.tile_types.len() as u32);
        self.tile_types.push(tile);
        Ok(id)
    }

    /// Puts a tile of type `tile` at cell `(x, y)`.
    pub fn set_tile(&mut self, x: i32, y: i32, tile: TileTypeId) -> Result<(), DeviceError> {
        if tile.index() >= self.tile_types.len() {
            return Err(DeviceError::UnknownTileType(tile.as_raw()));
        }
        let idx = self.cell_index(x, y).ok_or(DeviceError::OutOfBounds {
            x,
            y,
            width: self.width,
            height: self.height,
        })?;
        self.cells[idx] = Some(tile);
        Ok(())
    }

    /// Fills every cell from `f`, which returns `None` for empty cells.
    pub fn fill<F>(&mut self, mut f: F) -> Result<(), DeviceError>
    where
        F: FnMut(i32, i32) -> Option<TileTypeId>,
    {
        for x in 0..self.width {
            for y in 0..self.height {
                if let Some(tile) = f(x, y) {
                    self.set_tile(x, y, tile)?;
                }
            }
        }
        Ok(())
    }

    /// Grid width (number of columns).
    pub fn width(&self) -> i32 {
        self.width
    }

    /// Grid height (number of rows).
    pub fn height(&self) -> i32 {
        self.height
    }

    /// Returns `true` if `(x, y)` is a grid cell.
    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && x < self.width && y < self.height
    }

    fn cell_index(&self, x: i32, y: i32) -> Option<usize> {
        self.contains(x, y)
            .then(|| (x as usize) * (self.height as usize) + y as usize)
    }

    /// The tile at `(x, y)`, if the cell is inside the grid and not empty.
    pub fn tile_at(&self, x: i32, y: i32) -> Option<&TileType> {
        self.tile_type_id_at(x, y)
            .map(|id| &self.tile_types[id.index()])
    }

    /// The tile type ID at `(x, y)`.
    pub fn tile_type_id_at(&self, x: i32, y: i32) -> Option<TileTypeId> {
        self.cell_index(x, y).and_then(|idx| self.cells[idx])
    }

    /// Total slots at `(x, y)`, zero for empty or out-of-grid cells.
    pub fn capacity_at(&self, x: i32, y: i32) -> usize {
        self.tile_at(x, y).map_or(0, TileType::capacity)
    }

    /// Slot indices at `(x, y)` accepting `block_type`.
    pub fn compatible_slots(&self, x: i32, y: i32, block_type: BlockTypeId) -> Vec<i32> {
        self.tile_at(x, y)
            .map(|t| t.compatible_slots(block_type))
            .unwrap_or_default()
    }

    /// Returns `true` if `loc` is an existing slot that accepts `block_type`.
    pub fn is_compatible(&self, loc: Loc, block_type: BlockTypeId) -> bool {
        self.compatible_slots(loc.x, loc.y, block_type)
            .contains(&loc.sub_tile)
    }

    /// Every slot of the device accepting `block_type`, column by column.
    pub fn legal_locations(&self, block_type: BlockTypeId) -> Vec<Loc> {
        let mut locs = Vec::new();
        for x in 0..self.width {
            for y in 0..self.height {
                for slot in self.compatible_slots(x, y, block_type) {
                    locs.push(Loc::new(x, y, slot));
                }
            }
        }
        locs
    }

    /// All registered block types, indexed by [`BlockTypeId`].
    pub fn block_types(&self) -> &[BlockType] {
        &self.block_types
    }

    /// All registered tile types, indexed by [`TileTypeId`].
    pub fn tile_types(&self) -> &[TileType] {
        &self.tile_types
    }

    /// Name of a block type, or `"?"` if unknown.
    pub fn block_type_name(&self, id: BlockTypeId) -> &str {
        self.block_types
            .get(id.index())
            .map_or("?", |b| b.name.as_str())
    }

    /// Looks up a block type by name.
    pub fn block_type_by_name(&self, name: &str) -> Option<BlockTypeId> {
        self.block_types
            .iter()
            .position(|b| b.name == name)
            .map(|i| BlockTypeId::from_raw(i as u32))
    }
}

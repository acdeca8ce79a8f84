//! Per-type lookup of compatible slots in every grid cell.

use tessera_device::{BlockTypeId, DeviceGrid, Loc};

/// The slots accepting one block type, indexed by grid cell.
#[derive(Debug, Clone)]
pub struct CompatibleSites {
    width: i32,
    height: i32,
    cells: Vec<Vec<Loc>>,
    total: usize,
}

impl CompatibleSites {
    /// Builds the lookup for `block_type`.
    pub fn new(device: &DeviceGrid, block_type: BlockTypeId) -> Self {
        let (width, height) = (device.width(), device.height());
        let mut cells = Vec::with_capacity((width * height) as usize);
        let mut total = 0;
        for x in 0..width {
            for y in 0..height {
                let locs: Vec<Loc> = device
                    .compatible_slots(x, y, block_type)
                    .into_iter()
                    .map(|s| Loc::new(x, y, s))
                    .collect();
                total += locs.len();
                cells.push(locs);
            }
        }
        Self {
            width,
            height,
            cells,
            total,
        }
    }

    /// Grid width.
    pub fn width(&self) -> i32 {
        self.width
    }

    /// Grid height.
    pub fn height(&self) -> i32 {
        self.height
    }

    /// Compatible slots at `(x, y)`, empty outside the grid.
    pub fn at(&self, x: i32, y: i32) -> &[Loc] {
        if x < 0 || y < 0 || x >= self.width || y >= self.height {
            return &[];
        }
        &self.cells[(x * self.height + y) as usize]
    }

    /// Number of compatible slots at `(x, y)`.
    pub fn count_at(&self, x: i32, y: i32) -> usize {
        self.at(x, y).len()
    }

    /// Number of compatible slots on the whole device.
    pub fn total(&self) -> usize {
        self.total
    }

    /// Returns `true` if some cell within Chebyshev distance `radius` of
    /// `(cx, cy)` has a compatible slot.
    pub fn any_within(&self, cx: i32, cy: i32, radius: i32) -> bool {
        let x0 = (cx - radius).max(0);
        let x1 = (cx + radius).min(self.width - 1);
        let y0 = (cy - radius).max(0);
        let y1 = (cy + radius).min(self.height - 1);
        (x0..=x1).any(|x| (y0..=y1).any(|y| self.count_at(x, y) > 0))
    }
}

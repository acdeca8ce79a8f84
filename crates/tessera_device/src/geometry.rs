//! Grid coordinates, macro offsets and inclusive rectangles.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Sub};

/// A concrete slot on the device: grid cell `(x, y)` and the slot index inside its tile.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default, Serialize, Deserialize)]
pub struct Loc {
    /// Column.
    pub x: i32,
    /// Row.
    pub y: i32,
    /// Slot index within the tile at `(x, y)`.
    pub sub_tile: i32,
}

impl Loc {
    /// Creates a location.
    pub fn new(x: i32, y: i32, sub_tile: i32) -> Self {
        Self { x, y, sub_tile }
    }

    /// Manhattan distance between the grid cells of two locations.
    pub fn manhattan(self, other: Loc) -> i32 {
        (self.x - other.x).abs() + (self.y - other.y).abs()
    }
}

impl fmt::Display for Loc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.sub_tile)
    }
}

/// Fixed displacement of a macro member relative to its head.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default, Serialize, Deserialize)]
pub struct Offset {
    /// Column displacement.
    pub dx: i32,
    /// Row displacement.
    pub dy: i32,
    /// Slot index displacement.
    pub dsub: i32,
}

impl Offset {
    /// Creates an offset.
    pub fn new(dx: i32, dy: i32, dsub: i32) -> Self {
        Self { dx, dy, dsub }
    }

    /// Returns `true` for the zero offset.
    pub fn is_zero(self) -> bool {
        self == Offset::default()
    }
}

impl Add<Offset> for Loc {
    type Output = Loc;

    fn add(self, o: Offset) -> Loc {
        Loc::new(self.x + o.dx, self.y + o.dy, self.sub_tile + o.dsub)
    }
}

impl Sub<Loc> for Loc {
    type Output = Offset;

    fn sub(self, other: Loc) -> Offset {
        Offset::new(self.x - other.x, self.y - other.y, self.sub_tile - other.sub_tile)
    }
}

/// An inclusive rectangle of grid cells `[xmin, xmax] x [ymin, ymax]`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct Rect {
    /// Leftmost column.
    pub xmin: i32,
    /// Bottom row.
    pub ymin: i32,
    /// Rightmost column.
    pub xmax: i32,
    /// Top row.
    pub ymax: i32,
}

impl Rect {
    /// Creates a rectangle from its inclusive bounds.
    pub fn new(xmin: i32, ymin: i32, xmax: i32, ymax: i32) -> Self {
        Self {
            xmin,
            ymin,
            xmax,
            ymax,
        }
    }

    /// The single-cell rectangle at `(x, y)`.
    pub fn unit(x: i32, y: i32) -> Self {
        Self::new(x, y, x, y)
    }

    /// Number of columns covered.
    pub fn width(&self) -> i32 {
        self.xmax - self.xmin + 1
    }

    /// Number of rows covered.
    pub fn height(&self) -> i32 {
        self.ymax - self.ymin + 1
    }

    /// Returns `true` if cell `(x, y)` lies inside.
    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.xmin && x <= self.xmax && y >= self.ymin && y <= self.ymax
    }

    /// Returns `true` if `other` lies entirely inside.
    pub fn contains_rect(&self, other: &Rect) -> bool {
        other.xmin >= self.xmin
            && other.xmax <= self.xmax
            && other.ymin >= self.ymin
            && other.ymax <= self.ymax
    }

    /// Grows the rectangle to also cover cell `(x, y)`.
    pub fn expand_to(&mut self, x: i32, y: i32) {
        self.xmin = self.xmin.min(x);
        self.xmax = self.xmax.max(x);
        self.ymin = self.ymin.min(y);
        self.ymax = self.ymax.max(y);
    }

    /// The smallest rectangle covering both.
    pub fn union(&self, other: &Rect) -> Rect {
        Rect::new(
            self.xmin.min(other.xmin),
            self.ymin.min(other.ymin),
            self.xmax.max(other.xmax),
            self.ymax.max(other.ymax),
        )
    }

    /// Iterates over every cell, column by column.
    pub fn cells(&self) -> impl Iterator<Item = (i32, i32)> {
        let r = *self;
        (r.xmin..=r.xmax).flat_map(move |x| (r.ymin..=r.ymax).map(move |y| (x, y)))
    }
}

//! Device grid model consumed by the placer.
//!
//! A device is a `width x height` grid of cells. Each cell holds a physical
//! [`TileType`] whose [`SubTile`]s expose numbered slots, and each sub-tile
//! accepts a set of logical [`BlockType`]s. This crate only answers geometric
//! and compatibility queries; it never tracks which block sits where.

#![warn(missing_docs)]

pub mod geometry;
pub mod grid;
pub mod ids;

pub use geometry::{Loc, Offset, Rect};
pub use grid::{BlockType, DeviceError, DeviceGrid, SubTile, TileType};
pub use ids::{BlockTypeId, TileTypeId};

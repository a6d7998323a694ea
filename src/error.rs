//! Error types for voxel model construction
//!
//! Rendering itself never fails; only building a model from external tables
//! or from builder input can.

use thiserror::Error;

/// Voxel model errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum VoxelError {
    /// A model dimension was zero or exceeded the slab encoding range
    #[error("Invalid model size {x}x{y}x{z}")]
    InvalidSize { x: usize, y: usize, z: usize },

    /// An offset table had the wrong number of entries
    #[error("Offset table `{table}` has {actual} entries, expected {expected}")]
    TableLength {
        table: &'static str,
        expected: usize,
        actual: usize,
    },

    /// A column offset pointed outside the slab buffer or went backwards
    #[error("Column ({x}, {y}) offset {offset} is outside slab data of {len} bytes")]
    OffsetOutOfBounds {
        x: usize,
        y: usize,
        offset: usize,
        len: usize,
    },

    /// A slab header or color array ran past its column's end offset
    #[error("Slab at byte {offset} in column ({x}, {y}) runs past the column end")]
    TruncatedSlab { x: usize, y: usize, offset: usize },

    /// A slab had zero length
    #[error("Empty slab at byte {offset} in column ({x}, {y})")]
    EmptySlab { x: usize, y: usize, offset: usize },

    /// A slab extended below the model's height
    #[error("Slab in column ({x}, {y}) reaches z={end}, model height is {size_z}")]
    SlabOutOfRange {
        x: usize,
        y: usize,
        end: usize,
        size_z: usize,
    },

    /// Slabs in a column were not in increasing, non-overlapping z order
    #[error("Slabs in column ({x}, {y}) overlap or are out of order at z={ztop}")]
    UnorderedSlabs { x: usize, y: usize, ztop: usize },

    /// Builder coordinate outside the grid
    #[error("Voxel ({x}, {y}, {z}) is outside the model grid")]
    OutOfGrid { x: usize, y: usize, z: usize },

    /// A model needs at least one mip level
    #[error("A voxel model needs at least one mip level")]
    NoMipLevels,
}

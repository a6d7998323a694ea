/// Slab-encoded voxel model storage
///
/// Each mip level keeps the KVX-style packed layout: a flat byte buffer of
/// slabs plus two offset tables. A slab is `ztop, zleng, backface_cull`
/// followed by `zleng` palette indices. A column's slab list ends where the
/// next column's list starts; there is no terminator.
use crate::error::VoxelError;
use glam::DVec3;

/// Bytes preceding the color array of every slab
pub const SLAB_HEADER_SIZE: usize = 3;

/// Largest height a slab can address (`ztop` and `zleng` are bytes)
pub const MAX_SIZE_Z: usize = 255;

/// A run of contiguous voxels along Z within one (x, y) column.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Slab<'a> {
    pub ztop: u8,
    pub zleng: u8,
    /// Exposed-face mask: bit 0 -x, 1 +x, 2 -y, 3 +y, 4 top, 5 bottom
    pub backface_cull: u8,
    pub colors: &'a [u8],
}

impl<'a> Slab<'a> {
    /// One past the last z covered by this slab
    #[inline]
    pub fn zbottom(&self) -> usize {
        self.ztop as usize + self.zleng as usize
    }
}

/// Cursor over the slabs of one column, bounded by the column's end offset.
#[derive(Clone, Debug)]
pub struct SlabIter<'a> {
    data: &'a [u8],
    pos: usize,
    end: usize,
}

impl<'a> SlabIter<'a> {
    fn empty() -> Self {
        Self {
            data: &[],
            pos: 0,
            end: 0,
        }
    }
}

impl<'a> Iterator for SlabIter<'a> {
    type Item = Slab<'a>;

    #[inline]
    fn next(&mut self) -> Option<Slab<'a>> {
        if self.pos + SLAB_HEADER_SIZE > self.end {
            return None;
        }
        let header = &self.data[self.pos..self.pos + SLAB_HEADER_SIZE];
        let zleng = header[1] as usize;
        let colors_start = self.pos + SLAB_HEADER_SIZE;
        let colors_end = colors_start + zleng;
        if colors_end > self.end {
            return None;
        }
        let slab = Slab {
            ztop: header[0],
            zleng: header[1],
            backface_cull: header[2],
            colors: &self.data[colors_start..colors_end],
        };
        self.pos = colors_end;
        Some(slab)
    }
}

/// One resolution of a voxel model.
#[derive(Clone, Debug)]
pub struct MipLevel {
    size_x: usize,
    size_y: usize,
    size_z: usize,
    pivot: DVec3,
    /// `size_x + 1` byte offsets, one per x plus the end of the buffer
    offset_x: Vec<u32>,
    /// `size_x * (size_y + 1)` offsets relative to `offset_x[x]`
    offset_xy: Vec<u16>,
    slab_data: Vec<u8>,
}

impl MipLevel {
    /// Build a mip level from externally produced tables, validating that every
    /// column's slabs decode exactly up to the next column's start.
    pub fn new(
        size_x: usize,
        size_y: usize,
        size_z: usize,
        pivot: DVec3,
        offset_x: Vec<u32>,
        offset_xy: Vec<u16>,
        slab_data: Vec<u8>,
    ) -> Result<Self, VoxelError> {
        if size_x == 0 || size_y == 0 || size_z == 0 || size_z > MAX_SIZE_Z {
            return Err(VoxelError::InvalidSize {
                x: size_x,
                y: size_y,
                z: size_z,
            });
        }
        if offset_x.len() != size_x + 1 {
            return Err(VoxelError::TableLength {
                table: "offset_x",
                expected: size_x + 1,
                actual: offset_x.len(),
            });
        }
        if offset_xy.len() != size_x * (size_y + 1) {
            return Err(VoxelError::TableLength {
                table: "offset_xy",
                expected: size_x * (size_y + 1),
                actual: offset_xy.len(),
            });
        }

        let mip = Self {
            size_x,
            size_y,
            size_z,
            pivot,
            offset_x,
            offset_xy,
            slab_data,
        };
        mip.validate()?;
        Ok(mip)
    }

    /// A level with dimensions but no slab data; it renders as nothing.
    pub fn empty(size_x: usize, size_y: usize, size_z: usize, pivot: DVec3) -> Self {
        Self {
            size_x,
            size_y,
            size_z,
            pivot,
            offset_x: vec![0; size_x + 1],
            offset_xy: vec![0; size_x * (size_y + 1)],
            slab_data: Vec::new(),
        }
    }

    fn validate(&self) -> Result<(), VoxelError> {
        let len = self.slab_data.len();
        for x in 0..self.size_x {
            for y in 0..self.size_y {
                let start = self.column_offset(x, y);
                let end = self.column_offset(x, y + 1);
                if start > len || end > len || end < start {
                    return Err(VoxelError::OffsetOutOfBounds {
                        x,
                        y,
                        offset: start.max(end),
                        len,
                    });
                }

                let mut pos = start;
                let mut prev_bottom = 0usize;
                while pos < end {
                    if pos + SLAB_HEADER_SIZE > end {
                        return Err(VoxelError::TruncatedSlab { x, y, offset: pos });
                    }
                    let ztop = self.slab_data[pos] as usize;
                    let zleng = self.slab_data[pos + 1] as usize;
                    if zleng == 0 {
                        return Err(VoxelError::EmptySlab { x, y, offset: pos });
                    }
                    if pos + SLAB_HEADER_SIZE + zleng > end {
                        return Err(VoxelError::TruncatedSlab { x, y, offset: pos });
                    }
                    if ztop < prev_bottom {
                        return Err(VoxelError::UnorderedSlabs { x, y, ztop });
                    }
                    if ztop + zleng > self.size_z {
                        return Err(VoxelError::SlabOutOfRange {
                            x,
                            y,
                            end: ztop + zleng,
                            size_z: self.size_z,
                        });
                    }
                    prev_bottom = ztop + zleng;
                    pos += SLAB_HEADER_SIZE + zleng;
                }
            }
        }
        Ok(())
    }

    #[inline]
    fn column_offset(&self, x: usize, y: usize) -> usize {
        self.offset_x[x] as usize + self.offset_xy[x * (self.size_y + 1) + y] as usize
    }

    /// Slabs of column (x, y) in increasing z order.
    #[inline]
    pub fn slabs(&self, x: usize, y: usize) -> SlabIter<'_> {
        if x >= self.size_x || y >= self.size_y || self.slab_data.is_empty() {
            return SlabIter::empty();
        }
        SlabIter {
            data: &self.slab_data,
            pos: self.column_offset(x, y),
            end: self.column_offset(x, y + 1),
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.slab_data.is_empty()
    }

    #[inline]
    pub fn size_x(&self) -> usize {
        self.size_x
    }

    #[inline]
    pub fn size_y(&self) -> usize {
        self.size_y
    }

    #[inline]
    pub fn size_z(&self) -> usize {
        self.size_z
    }

    /// Model-local origin in fractional voxel coordinates
    #[inline]
    pub fn pivot(&self) -> DVec3 {
        self.pivot
    }

    pub fn slab_data(&self) -> &[u8] {
        &self.slab_data
    }

    pub fn offset_x(&self) -> &[u32] {
        &self.offset_x
    }

    pub fn offset_xy(&self) -> &[u16] {
        &self.offset_xy
    }
}

/// An immutable, mip-leveled voxel model. Load once and share through `Arc`.
#[derive(Clone, Debug)]
pub struct VoxelModel {
    mips: Vec<MipLevel>,
}

impl VoxelModel {
    pub fn new(mips: Vec<MipLevel>) -> Result<Self, VoxelError> {
        if mips.is_empty() {
            return Err(VoxelError::NoMipLevels);
        }
        Ok(Self { mips })
    }

    #[inline]
    pub fn num_mips(&self) -> usize {
        self.mips.len()
    }

    #[inline]
    pub fn mip(&self, level: usize) -> Option<&MipLevel> {
        self.mips.get(level)
    }

    /// Full resolution level
    #[inline]
    pub fn base(&self) -> &MipLevel {
        &self.mips[0]
    }

    pub fn mips(&self) -> &[MipLevel] {
        &self.mips
    }
}

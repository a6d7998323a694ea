/// Dense voxel grid to slab-encoded model conversion
/// Produces level 0 directly and coarser levels by 2x2x2 downsampling
use super::model::{MipLevel, VoxelModel, MAX_SIZE_Z, SLAB_HEADER_SIZE};
use crate::error::VoxelError;
use glam::DVec3;

/// Face bits stored in a slab's backface mask
pub const FACE_NEG_X: u8 = 1 << 0;
pub const FACE_POS_X: u8 = 1 << 1;
pub const FACE_NEG_Y: u8 = 1 << 2;
pub const FACE_POS_Y: u8 = 1 << 3;
pub const FACE_TOP: u8 = 1 << 4;
pub const FACE_BOTTOM: u8 = 1 << 5;

const MAX_RUN: usize = u8::MAX as usize;

/// Dense occupancy grid, z = 0 is the top of the model.
#[derive(Clone, Debug)]
struct Grid {
    size_x: usize,
    size_y: usize,
    size_z: usize,
    cells: Vec<Option<u8>>,
}

impl Grid {
    fn new(size_x: usize, size_y: usize, size_z: usize) -> Self {
        Self {
            size_x,
            size_y,
            size_z,
            cells: vec![None; size_x * size_y * size_z],
        }
    }

    #[inline]
    fn index(&self, x: usize, y: usize, z: usize) -> usize {
        (x * self.size_y + y) * self.size_z + z
    }

    #[inline]
    fn get(&self, x: usize, y: usize, z: usize) -> Option<u8> {
        self.cells[self.index(x, y, z)]
    }

    /// Solid test that treats everything outside the grid as empty
    #[inline]
    fn solid(&self, x: isize, y: isize, z: isize) -> bool {
        if x < 0 || y < 0 || z < 0 {
            return false;
        }
        let (x, y, z) = (x as usize, y as usize, z as usize);
        if x >= self.size_x || y >= self.size_y || z >= self.size_z {
            return false;
        }
        self.get(x, y, z).is_some()
    }

    fn face_mask(&self, x: usize, y: usize, z: usize) -> u8 {
        let (xi, yi, zi) = (x as isize, y as isize, z as isize);
        let mut mask = 0;
        if !self.solid(xi - 1, yi, zi) {
            mask |= FACE_NEG_X;
        }
        if !self.solid(xi + 1, yi, zi) {
            mask |= FACE_POS_X;
        }
        if !self.solid(xi, yi - 1, zi) {
            mask |= FACE_NEG_Y;
        }
        if !self.solid(xi, yi + 1, zi) {
            mask |= FACE_POS_Y;
        }
        if !self.solid(xi, yi, zi - 1) {
            mask |= FACE_TOP;
        }
        if !self.solid(xi, yi, zi + 1) {
            mask |= FACE_BOTTOM;
        }
        mask
    }

    /// Halve each dimension, keeping the most frequent color of each 2x2x2 cell.
    fn downsample(&self) -> Grid {
        let mut half = Grid::new(
            self.size_x.div_ceil(2),
            self.size_y.div_ceil(2),
            self.size_z.div_ceil(2),
        );
        let mut samples: Vec<u8> = Vec::with_capacity(8);
        for x in 0..half.size_x {
            for y in 0..half.size_y {
                for z in 0..half.size_z {
                    samples.clear();
                    for (dx, dy, dz) in CELL_CORNERS {
                        let (sx, sy, sz) = (x * 2 + dx, y * 2 + dy, z * 2 + dz);
                        if sx < self.size_x && sy < self.size_y && sz < self.size_z {
                            if let Some(color) = self.get(sx, sy, sz) {
                                samples.push(color);
                            }
                        }
                    }
                    let idx = half.index(x, y, z);
                    half.cells[idx] = most_frequent(&samples);
                }
            }
        }
        half
    }

    fn encode(&self, pivot: DVec3) -> Result<MipLevel, VoxelError> {
        let mut slab_data = Vec::new();
        let mut offset_x = Vec::with_capacity(self.size_x + 1);
        let mut offset_xy = Vec::with_capacity(self.size_x * (self.size_y + 1));

        for x in 0..self.size_x {
            let column_base = slab_data.len();
            offset_x.push(column_base as u32);
            for y in 0..self.size_y {
                offset_xy.push(relative_offset(slab_data.len(), column_base, x)?);
                self.encode_column(x, y, &mut slab_data);
            }
            offset_xy.push(relative_offset(slab_data.len(), column_base, x)?);
        }
        offset_x.push(slab_data.len() as u32);

        MipLevel::new(
            self.size_x,
            self.size_y,
            self.size_z,
            pivot,
            offset_x,
            offset_xy,
            slab_data,
        )
    }

    fn encode_column(&self, x: usize, y: usize, out: &mut Vec<u8>) {
        let mut z = 0;
        while z < self.size_z {
            if self.get(x, y, z).is_none() {
                z += 1;
                continue;
            }
            let ztop = z;
            let header = out.len();
            out.extend_from_slice(&[0; SLAB_HEADER_SIZE]);
            let mut mask = 0u8;
            while z < self.size_z && z - ztop < MAX_RUN {
                let Some(color) = self.get(x, y, z) else {
                    break;
                };
                out.push(color);
                mask |= self.face_mask(x, y, z);
                z += 1;
            }
            out[header] = ztop as u8;
            out[header + 1] = (z - ztop) as u8;
            out[header + 2] = mask;
        }
    }
}

const CELL_CORNERS: [(usize, usize, usize); 8] = [
    (0, 0, 0),
    (1, 0, 0),
    (0, 1, 0),
    (1, 1, 0),
    (0, 0, 1),
    (1, 0, 1),
    (0, 1, 1),
    (1, 1, 1),
];

fn most_frequent(samples: &[u8]) -> Option<u8> {
    let mut best: Option<(u8, usize)> = None;
    for &candidate in samples {
        let count = samples.iter().filter(|&&c| c == candidate).count();
        match best {
            Some((_, best_count)) if best_count >= count => {}
            _ => best = Some((candidate, count)),
        }
    }
    best.map(|(color, _)| color)
}

fn relative_offset(len: usize, column_base: usize, x: usize) -> Result<u16, VoxelError> {
    u16::try_from(len - column_base).map_err(|_| VoxelError::OffsetOutOfBounds {
        x,
        y: 0,
        offset: len,
        len: column_base + u16::MAX as usize,
    })
}

fn encode_level(grid: &Grid, pivot: DVec3, level: usize) -> Result<MipLevel, VoxelError> {
    grid.encode(pivot).map_err(|err| {
        log::warn!("voxel mip {} failed to encode: {}", level, err);
        err
    })
}

/// Builds a `VoxelModel` from individually placed voxels.
///
/// ```
/// use voxel_sprite_renderer::voxel::VoxelModelBuilder;
///
/// let mut builder = VoxelModelBuilder::new(2, 2, 2).unwrap();
/// builder.set(0, 0, 0, 7).unwrap();
/// let model = builder.build(2).unwrap();
/// assert_eq!(model.num_mips(), 2);
/// ```
#[derive(Clone, Debug)]
pub struct VoxelModelBuilder {
    grid: Grid,
    pivot: DVec3,
}

impl VoxelModelBuilder {
    /// Default pivot is the bottom center of the footprint.
    pub fn new(size_x: usize, size_y: usize, size_z: usize) -> Result<Self, VoxelError> {
        if size_x == 0 || size_y == 0 || size_z == 0 || size_z > MAX_SIZE_Z {
            return Err(VoxelError::InvalidSize {
                x: size_x,
                y: size_y,
                z: size_z,
            });
        }
        Ok(Self {
            grid: Grid::new(size_x, size_y, size_z),
            pivot: DVec3::new(size_x as f64 * 0.5, size_y as f64 * 0.5, size_z as f64),
        })
    }

    pub fn with_pivot(mut self, pivot: DVec3) -> Self {
        self.pivot = pivot;
        self
    }

    pub fn set(&mut self, x: usize, y: usize, z: usize, color: u8) -> Result<(), VoxelError> {
        if x >= self.grid.size_x || y >= self.grid.size_y || z >= self.grid.size_z {
            return Err(VoxelError::OutOfGrid { x, y, z });
        }
        let idx = self.grid.index(x, y, z);
        self.grid.cells[idx] = Some(color);
        Ok(())
    }

    /// Encode `num_mips` levels. Levels stop early once every dimension is 1.
    pub fn build(&self, num_mips: usize) -> Result<VoxelModel, VoxelError> {
        if num_mips == 0 {
            return Err(VoxelError::NoMipLevels);
        }
        let mut mips = Vec::with_capacity(num_mips);
        let mut grid = self.grid.clone();
        let mut pivot = self.pivot;
        mips.push(encode_level(&grid, pivot, 0)?);

        while mips.len() < num_mips && (grid.size_x > 1 || grid.size_y > 1 || grid.size_z > 1) {
            grid = grid.downsample();
            pivot *= 0.5;
            mips.push(encode_level(&grid, pivot, mips.len())?);
        }
        if mips.len() < num_mips {
            log::debug!(
                "voxel model stopped at {} of {} requested mips",
                mips.len(),
                num_mips
            );
        }
        VoxelModel::new(mips)
    }
}

/// Volumetric sprite data: slab-encoded mip levels shared by all instances
pub mod builder;
pub mod definition;
pub mod model;

pub use builder::VoxelModelBuilder;
pub use definition::VoxelDef;
pub use model::{MipLevel, Slab, SlabIter, VoxelModel, SLAB_HEADER_SIZE};

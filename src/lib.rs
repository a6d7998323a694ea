/// Voxel sprite renderer - software rendering of KVX-style voxel sprites
/// for a Doom-style column renderer
pub mod camera;
pub mod error;
pub mod perf;
pub mod rendering;
pub mod sector;
pub mod voxel;

pub use camera::{CameraController, ViewContext, MINZ};
pub use error::VoxelError;
pub use perf::{CounterSnapshot, FunctionCounters, FUNCTION_COUNTERS};
pub use rendering::{
    ClipBounds, ColormapCache, ColormapSource, CoverageBuffer, DynamicColormap, Framebuffer,
    LightingContext, OffscreenBuffer, Palette, PixelFormat, Projector, RenderConfig, RenderStyle,
    VisibleSprite, VisibleSpriteList, VoxelInstance, VoxelRasterizer, VoxelRenderer,
};
pub use sector::{HeightSector, SecPlane, Sector, WaterFakeSide};
pub use voxel::{VoxelDef, VoxelModel, VoxelModelBuilder};

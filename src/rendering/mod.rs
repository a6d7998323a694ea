/// Software voxel sprite pipeline
/// Projector -> rasterizer -> direct fills or offscreen coverage + composite
pub mod colormap;
pub mod compositor;
pub mod coverage;
pub mod fixed;
pub mod framebuffer;
pub mod light;
pub mod projector;
pub mod rasterizer;
pub mod renderer;
pub mod style;
pub mod vissprite;

pub use colormap::{ColormapCache, ColormapSource, DynamicColormap, Palette};
pub use compositor::OffscreenBuffer;
pub use coverage::{CoverageBuffer, Span};
pub use framebuffer::{ColumnDrawer, Framebuffer, PixelFormat};
pub use light::LightingContext;
pub use projector::{Projector, VoxelInstance};
pub use rasterizer::{fill_box, select_mip, ClipBounds, VoxelRasterizer};
pub use renderer::{PatchStyleScope, RenderConfig, VoxelRenderer};
pub use style::{
    ActorFlags, DrawPath, DrawerStyle, RenderFlags, RenderStyle, StyleFlags, StyleKind,
    Translation,
};
pub use vissprite::{VisibleSprite, VisibleSpriteList};

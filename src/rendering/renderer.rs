/// Per-sprite voxel rendering: style setup, rasterization and compositing
use super::compositor::OffscreenBuffer;
use super::framebuffer::{ColumnDrawer, Framebuffer, PixelFormat};
use super::rasterizer::{ClipBounds, VoxelRasterizer};
use super::style::{DrawPath, DrawerStyle};
use super::vissprite::VisibleSprite;
use crate::camera::ViewContext;

/// Renderer configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderConfig {
    /// Fullbright sprites use the unshaded colormap instead of the sector's
    pub fullbright_ignores_sector_color: bool,
    /// Draw each slab as one textured column per screen column
    pub slab_strips: bool,
    /// 4 bytes per pixel instead of palette indices
    pub true_color: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            fullbright_ignores_sector_color: false,
            slab_strips: false,
            true_color: true,
        }
    }
}

impl RenderConfig {
    pub fn pixel_format(&self) -> PixelFormat {
        if self.true_color {
            PixelFormat::TrueColor
        } else {
            PixelFormat::Paletted
        }
    }
}

/// Drawer active between style setup and teardown for one sprite.
///
/// Shades incoming colors and routes them to the frame or the offscreen
/// buffer. Dropping the scope composites whatever went offscreen.
pub struct PatchStyleScope<'a> {
    frame: &'a mut Framebuffer,
    offscreen: &'a mut OffscreenBuffer,
    style: DrawerStyle,
    path: DrawPath,
}

impl<'a> PatchStyleScope<'a> {
    /// Begin drawing with `style`. Non-direct paths get the offscreen buffers
    /// sized to the frame and cleared.
    pub fn begin(
        frame: &'a mut Framebuffer,
        offscreen: &'a mut OffscreenBuffer,
        style: DrawerStyle,
        path: DrawPath,
    ) -> Self {
        if path != DrawPath::Direct {
            offscreen.check(frame.width, frame.height, path == DrawPath::SpansOnly);
        }
        Self {
            frame,
            offscreen,
            style,
            path,
        }
    }

    pub fn path(&self) -> DrawPath {
        self.path
    }
}

impl ColumnDrawer for PatchStyleScope<'_> {
    #[inline]
    fn width(&self) -> usize {
        self.frame.width
    }

    #[inline]
    fn height(&self) -> usize {
        self.frame.height
    }

    fn fill_column(&mut self, x: usize, y: usize, count: usize, color: u8) {
        let shaded = self.style.resolve(color);
        match self.path {
            DrawPath::Direct => self.frame.fill_column(x, y, count, shaded),
            DrawPath::Offscreen => {
                let count = count.min(self.frame.height.saturating_sub(y));
                if count == 0 || x >= self.frame.width {
                    return;
                }
                self.offscreen.insert_span(x, y, y + count);
                let rgb = self.frame.palette().rgb(shaded);
                self.offscreen.fill_color(x, y, count, rgb);
            }
            DrawPath::SpansOnly => {
                let count = count.min(self.frame.height.saturating_sub(y));
                if count > 0 && x < self.frame.width {
                    self.offscreen.insert_span(x, y, y + count);
                }
            }
        }
    }
}

impl Drop for PatchStyleScope<'_> {
    fn drop(&mut self) {
        if self.path != DrawPath::Direct {
            self.offscreen.composite(&mut *self.frame, &self.style);
        }
    }
}

/// Draws projected voxel sprites; owns the offscreen resources.
#[derive(Debug, Default)]
pub struct VoxelRenderer {
    pub config: RenderConfig,
    offscreen: OffscreenBuffer,
}

impl VoxelRenderer {
    pub fn new(config: RenderConfig) -> Self {
        Self {
            config,
            offscreen: OffscreenBuffer::new(),
        }
    }

    pub fn offscreen(&self) -> &OffscreenBuffer {
        &self.offscreen
    }

    /// Draw one sprite into `frame`, clipped to `clip` and to voxel rows
    /// `[min_z, max_z)`. Returns false when nothing could be drawn.
    pub fn render(
        &mut self,
        sprite: &VisibleSprite,
        view: &ViewContext,
        clip: &ClipBounds,
        min_z: usize,
        max_z: usize,
        frame: &mut Framebuffer,
    ) -> bool {
        let Some(style) = DrawerStyle::begin(
            sprite.style,
            sprite.alpha,
            sprite.colormap.clone(),
            sprite.light,
            sprite.translation.clone(),
            sprite.fill_color,
        ) else {
            log::trace!("voxel sprite invisible with style {:?}", sprite.style);
            return false;
        };
        let path = sprite.style.draw_path(sprite.alpha);
        let rasterizer = VoxelRasterizer::new(view, self.config.slab_strips);
        let mut scope = PatchStyleScope::begin(frame, &mut self.offscreen, style, path);
        rasterizer.rasterize(sprite, clip, min_z, max_z, &mut scope)
    }

    /// Free the offscreen buffers
    pub fn shutdown(&mut self) {
        self.offscreen.release();
    }
}

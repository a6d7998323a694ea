/// Visible sprite records produced by the projector for one frame
use super::colormap::DynamicColormap;
use super::style::{RenderFlags, RenderStyle, Translation};
use crate::sector::{HeightSector, WaterFakeSide};
use crate::voxel::VoxelModel;
use glam::DVec3;
use std::sync::Arc;

/// Everything the rasterizer needs to draw one voxel sprite this frame.
#[derive(Debug, Clone)]
pub struct VisibleSprite {
    pub xscale: f64,
    pub yscale: f64,
    /// Horizontal window the sprite may draw into
    pub x1: i32,
    pub x2: i32,
    pub idepth: f64,
    pub floorclip: f64,

    pub view_pos: DVec3,
    pub view_angle: f64,
    /// Model yaw in degrees, spin included
    pub angle: f64,

    pub height_sec: Option<Arc<HeightSector>>,
    pub sector: usize,
    /// View-space depth (scaled by the focal tangent)
    pub depth: f64,
    /// Origin with the floorclip already removed
    pub gpos: DVec3,
    pub gzb: f64,
    pub gzt: f64,
    pub deltax: f64,
    pub deltay: f64,

    pub render_flags: RenderFlags,
    pub style: RenderStyle,
    pub alpha: f32,
    pub fill_color: u32,
    pub translation: Option<Arc<Translation>>,
    pub fake_side: WaterFakeSide,
    pub fake_floor: Option<usize>,
    pub fake_ceiling: Option<usize>,
    pub in_mirror: bool,

    pub voxel: Arc<VoxelModel>,
    pub colormap: Arc<DynamicColormap>,
    /// Shade row within `colormap`
    pub light: usize,
}

/// Append-only list of sprites projected this frame, in insertion order.
#[derive(Debug, Default)]
pub struct VisibleSpriteList {
    sprites: Vec<VisibleSprite>,
    /// Set once any voxel sprite was projected; read by the translucency pass
    pub drew_a_voxel: bool,
}

impl VisibleSpriteList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new frame, keeping the allocation
    pub fn clear(&mut self) {
        self.sprites.clear();
        self.drew_a_voxel = false;
    }

    pub fn push(&mut self, sprite: VisibleSprite) {
        self.sprites.push(sprite);
    }

    pub fn len(&self) -> usize {
        self.sprites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sprites.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, VisibleSprite> {
        self.sprites.iter()
    }

    pub fn as_slice(&self) -> &[VisibleSprite] {
        &self.sprites
    }
}

impl<'a> IntoIterator for &'a VisibleSpriteList {
    type Item = &'a VisibleSprite;
    type IntoIter = std::slice::Iter<'a, VisibleSprite>;

    fn into_iter(self) -> Self::IntoIter {
        self.sprites.iter()
    }
}

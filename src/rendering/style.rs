/// Render styles, sprite flags and the resolved drawer state
use super::colormap::{DynamicColormap, PALETTE_SIZE};
use bitflags::bitflags;
use std::sync::Arc;

bitflags! {
    /// Modifiers on a render style
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct StyleFlags: u32 {
        const INVERT_OVERLAY = 1 << 0;
        const INVERT_SOURCE = 1 << 1;
        const FADE_TO_BLACK = 1 << 2;
    }
}

bitflags! {
    /// Per-sprite render flags
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct RenderFlags: u32 {
        const FULLBRIGHT = 1 << 0;
    }
}

bitflags! {
    /// Actor state the projector cares about
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ActorFlags: u32 {
        /// Spawned at runtime rather than placed in the map
        const DROPPED = 1 << 0;
        /// Always drawn at full brightness
        const BRIGHT = 1 << 1;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum StyleKind {
    /// Never drawn
    None,
    #[default]
    Normal,
    /// Darkens whatever is behind the sprite's silhouette
    Fuzzy,
    Translucent,
    Add,
    /// Silhouette filled with the sprite's fill color
    Stencil,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct RenderStyle {
    pub kind: StyleKind,
    pub flags: StyleFlags,
}

impl RenderStyle {
    pub const fn new(kind: StyleKind, flags: StyleFlags) -> Self {
        Self { kind, flags }
    }

    pub const fn normal() -> Self {
        Self::new(StyleKind::Normal, StyleFlags::empty())
    }

    /// The plain additive style; its sprites always fade to black
    pub const fn add() -> Self {
        Self::new(StyleKind::Add, StyleFlags::empty())
    }

    pub const fn translucent() -> Self {
        Self::new(StyleKind::Translucent, StyleFlags::empty())
    }

    pub const fn fuzzy() -> Self {
        Self::new(StyleKind::Fuzzy, StyleFlags::empty())
    }

    pub const fn stencil() -> Self {
        Self::new(StyleKind::Stencil, StyleFlags::empty())
    }

    /// Inverting the source also inverts the overlay, so the two cancel.
    #[inline]
    pub fn inverts_colormap(&self) -> bool {
        self.flags.contains(StyleFlags::INVERT_OVERLAY)
            != self.flags.contains(StyleFlags::INVERT_SOURCE)
    }

    /// Where the rasterizer's fills have to go for this style.
    pub fn draw_path(&self, alpha: f32) -> DrawPath {
        match self.kind {
            StyleKind::None | StyleKind::Normal => DrawPath::Direct,
            StyleKind::Translucent if alpha >= 1.0 => DrawPath::Direct,
            StyleKind::Translucent | StyleKind::Add => DrawPath::Offscreen,
            StyleKind::Fuzzy | StyleKind::Stencil => DrawPath::SpansOnly,
        }
    }
}

/// How fills reach the frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawPath {
    /// Write straight into the framebuffer
    Direct,
    /// Write colors offscreen and record coverage; blend once at the end
    Offscreen,
    /// Record coverage only; the style is applied per covered span
    SpansOnly,
}

/// Color index remapping applied before the colormap (player colors etc.)
#[derive(Clone, PartialEq, Eq)]
pub struct Translation(pub [u8; PALETTE_SIZE]);

impl Translation {
    pub fn identity() -> Self {
        let mut table = [0u8; PALETTE_SIZE];
        for (i, entry) in table.iter_mut().enumerate() {
            *entry = i as u8;
        }
        Self(table)
    }

    /// Remap `len` consecutive indices starting at `from` onto `to`
    pub fn with_range(mut self, from: u8, to: u8, len: usize) -> Self {
        for i in 0..len {
            let (src, dst) = (from as usize + i, to as usize + i);
            if src < PALETTE_SIZE && dst < PALETTE_SIZE {
                self.0[src] = dst as u8;
            }
        }
        self
    }

    #[inline]
    pub fn map(&self, index: u8) -> u8 {
        self.0[index as usize]
    }
}

impl std::fmt::Debug for Translation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Translation(..)")
    }
}

/// Drawer state resolved from a sprite's style, alpha, colormap and light.
#[derive(Debug, Clone)]
pub struct DrawerStyle {
    pub kind: StyleKind,
    pub alpha: f32,
    pub colormap: Arc<DynamicColormap>,
    pub light: usize,
    pub translation: Option<Arc<Translation>>,
    /// Packed RGB used by stencil fills
    pub fill_color: u32,
}

impl DrawerStyle {
    /// Set up drawing for a style. Returns None when the style produces no
    /// visible pixels at all.
    pub fn begin(
        style: RenderStyle,
        alpha: f32,
        colormap: Arc<DynamicColormap>,
        light: usize,
        translation: Option<Arc<Translation>>,
        fill_color: u32,
    ) -> Option<Self> {
        let alpha = alpha.clamp(0.0, 1.0);
        let visible = match style.kind {
            StyleKind::None => false,
            StyleKind::Normal | StyleKind::Fuzzy => true,
            StyleKind::Translucent | StyleKind::Add | StyleKind::Stencil => alpha > 0.0,
        };
        if !visible {
            return None;
        }
        Some(Self {
            kind: style.kind,
            alpha,
            colormap,
            light,
            translation,
            fill_color,
        })
    }

    /// Translate then shade a voxel color index
    #[inline]
    pub fn resolve(&self, index: u8) -> u8 {
        let index = match &self.translation {
            Some(t) => t.map(index),
            None => index,
        };
        self.colormap.row(self.light)[index as usize]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invert_flags_cancel() {
        let overlay = RenderStyle::new(StyleKind::Normal, StyleFlags::INVERT_OVERLAY);
        let source = RenderStyle::new(StyleKind::Normal, StyleFlags::INVERT_SOURCE);
        let both = RenderStyle::new(
            StyleKind::Normal,
            StyleFlags::INVERT_OVERLAY | StyleFlags::INVERT_SOURCE,
        );
        assert!(overlay.inverts_colormap());
        assert!(source.inverts_colormap());
        assert!(!both.inverts_colormap());
    }

    #[test]
    fn blend_styles_route_off_screen() {
        assert_eq!(RenderStyle::normal().draw_path(0.3), DrawPath::Direct);
        assert_eq!(RenderStyle::translucent().draw_path(1.0), DrawPath::Direct);
        assert_eq!(RenderStyle::translucent().draw_path(0.5), DrawPath::Offscreen);
        assert_eq!(RenderStyle::add().draw_path(1.0), DrawPath::Offscreen);
        assert_eq!(RenderStyle::fuzzy().draw_path(1.0), DrawPath::SpansOnly);
        assert_eq!(RenderStyle::stencil().draw_path(1.0), DrawPath::SpansOnly);
    }

    #[test]
    fn transparent_styles_are_invisible() {
        let map = Arc::new(DynamicColormap::identity());
        let none = RenderStyle::new(StyleKind::None, StyleFlags::empty());
        assert!(DrawerStyle::begin(none, 1.0, map.clone(), 0, None, 0).is_none());
        assert!(DrawerStyle::begin(RenderStyle::translucent(), 0.0, map.clone(), 0, None, 0).is_none());
        assert!(DrawerStyle::begin(RenderStyle::fuzzy(), 0.0, map, 0, None, 0).is_some());
    }

    #[test]
    fn resolve_applies_translation_then_colormap() {
        let map = Arc::new(DynamicColormap::identity());
        let translation = Arc::new(Translation::identity().with_range(10, 100, 4));
        let style =
            DrawerStyle::begin(RenderStyle::normal(), 1.0, map, 3, Some(translation), 0).unwrap();
        assert_eq!(style.resolve(12), 102);
        assert_eq!(style.resolve(50), 50);
    }
}

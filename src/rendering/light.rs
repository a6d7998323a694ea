/// Distance-based light diminishing and the per-frame lighting state
use super::colormap::DynamicColormap;
use super::fixed::{float_to_fixed, Fixed, FRACBITS, FRACUNIT};
use crate::camera::ViewContext;
use std::sync::Arc;

/// Shade rows in every colormap
pub const NUM_COLORMAPS: usize = 32;

/// Visibility values above this no longer brighten the sprite
pub const MAX_LIGHT_VIS: f64 = 24.0;

/// Default global visibility, scaled by the focal length for sprites
pub const DEFAULT_VISIBILITY: f64 = 8.0;

/// Convert a 0..=255 sector light level to a 16.16 shade value.
#[inline]
pub fn light_to_shade(light_level: i32) -> Fixed {
    (NUM_COLORMAPS as Fixed * 2 * FRACUNIT)
        - (light_level + 12) * (FRACUNIT * NUM_COLORMAPS as Fixed / 128)
}

/// Colormap row for a visibility value and a shade.
#[inline]
pub fn palookup(visibility: f64, shade: Fixed) -> usize {
    let vis = float_to_fixed(visibility.min(MAX_LIGHT_VIS));
    ((shade - vis) >> FRACBITS).clamp(0, NUM_COLORMAPS as Fixed - 1) as usize
}

/// Lighting state refreshed once per frame by the outer renderer.
#[derive(Debug, Clone)]
pub struct LightingContext {
    /// Colormap of the sector the view is in
    pub base_colormap: Arc<DynamicColormap>,
    /// Unshaded colormap used for fullbright sprites when sector color is ignored
    pub full_normal_light: Arc<DynamicColormap>,
    /// Overrides every sprite's colormap (e.g. invulnerability)
    pub fixed_colormap: Option<Arc<DynamicColormap>>,
    /// Forces every sprite to one shade row (e.g. light amplification)
    pub fixed_light_level: Option<usize>,
    pub foggy: bool,
    pub sprite_visibility: f64,
}

impl LightingContext {
    pub fn new(
        base_colormap: Arc<DynamicColormap>,
        full_normal_light: Arc<DynamicColormap>,
        view: &ViewContext,
    ) -> Self {
        Self {
            base_colormap,
            full_normal_light,
            fixed_colormap: None,
            fixed_light_level: None,
            foggy: false,
            sprite_visibility: DEFAULT_VISIBILITY * view.focal_length_x,
        }
    }
}

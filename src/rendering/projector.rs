/// Voxel sprite projection: visibility culling and colormap resolution
///
/// Turns an actor carrying a voxel definition into a `VisibleSprite` with
/// every scene-dependent decision already made, so the rasterizer only does
/// geometry.
use super::colormap::{inverse_color, ColormapSource, DynamicColormap};
use super::fixed::Fixed;
use super::light::{light_to_shade, palookup, LightingContext};
use super::renderer::RenderConfig;
use super::style::{ActorFlags, RenderFlags, RenderStyle, StyleFlags, Translation};
use super::vissprite::{VisibleSprite, VisibleSpriteList};
use crate::camera::{ViewContext, MINZ};
use crate::count_call;
use crate::sector::{separated_by_height_sector, Sector, WaterFakeSide};
use crate::voxel::VoxelDef;
use glam::{DVec2, DVec3};
use std::sync::Arc;

/// A map actor drawn with a voxel model.
#[derive(Debug, Clone)]
pub struct VoxelInstance<'a> {
    pub position: DVec3,
    /// Degrees
    pub yaw: f64,
    /// How far the actor sinks into the floor (e.g. wading in liquid)
    pub floorclip: f64,
    pub def: &'a VoxelDef,
    pub sprite_scale: DVec2,
    pub render_flags: RenderFlags,
    pub actor_flags: ActorFlags,
    pub style: RenderStyle,
    pub alpha: f32,
    pub fill_color: u32,
    pub translation: Option<Arc<Translation>>,
    pub sector: &'a Sector,
    pub fake_side: WaterFakeSide,
    pub fake_floor: Option<usize>,
    pub fake_ceiling: Option<usize>,
    pub sprite_shade: Fixed,
}

impl<'a> VoxelInstance<'a> {
    /// Opaque, unscaled, fully lit instance
    pub fn new(position: DVec3, def: &'a VoxelDef, sector: &'a Sector) -> Self {
        Self {
            position,
            yaw: 0.0,
            floorclip: 0.0,
            def,
            sprite_scale: DVec2::ONE,
            render_flags: RenderFlags::empty(),
            actor_flags: ActorFlags::empty(),
            style: RenderStyle::normal(),
            alpha: 1.0,
            fill_color: 0,
            translation: None,
            sector,
            fake_side: WaterFakeSide::Center,
            fake_floor: None,
            fake_ceiling: None,
            sprite_shade: light_to_shade(255),
        }
    }

    pub fn with_yaw(mut self, yaw: f64) -> Self {
        self.yaw = yaw;
        self
    }

    pub fn with_style(mut self, style: RenderStyle, alpha: f32) -> Self {
        self.style = style;
        self.alpha = alpha;
        self
    }

    pub fn with_light_level(mut self, light_level: i32) -> Self {
        self.sprite_shade = light_to_shade(light_level);
        self
    }
}

/// Per-frame projection state.
pub struct Projector<'a> {
    pub view: &'a ViewContext,
    pub lighting: &'a LightingContext,
    pub colormaps: &'a dyn ColormapSource,
    pub config: &'a RenderConfig,
}

impl<'a> Projector<'a> {
    pub fn new(
        view: &'a ViewContext,
        lighting: &'a LightingContext,
        colormaps: &'a dyn ColormapSource,
        config: &'a RenderConfig,
    ) -> Self {
        Self {
            view,
            lighting,
            colormaps,
            config,
        }
    }

    /// Project `instance` and append its record to `list`.
    ///
    /// Returns false, leaving `list` untouched, when the sprite cannot be
    /// seen this frame.
    pub fn project(
        &self,
        instance: &VoxelInstance<'_>,
        current_sector: &Sector,
        list: &mut VisibleSpriteList,
    ) -> bool {
        count_call!(crate::perf::FUNCTION_COUNTERS.project_calls);
        let visible = self.try_project(instance, current_sector, list);
        if !visible {
            count_call!(crate::perf::FUNCTION_COUNTERS.project_rejected);
        }
        visible
    }

    fn try_project(
        &self,
        instance: &VoxelInstance<'_>,
        current_sector: &Sector,
        list: &mut VisibleSpriteList,
    ) -> bool {
        let view = self.view;
        let def = instance.def;
        let mut pos = instance.position;

        let local = view.to_view_space(pos);
        let (tx, tz) = (local.x, local.z);

        // too far off the side?
        if (tx / 128.0).abs() > tz.abs() {
            log::trace!("voxel at {:?} rejected: off the side", pos);
            return false;
        }

        let xscale = instance.sprite_scale.x * def.scale;
        let yscale = instance.sprite_scale.y * def.scale;
        let base = def.model.base();

        // Entirely behind the view plane, bounding radius included
        let radius = (base.size_x() as f64).hypot(base.size_y() as f64) * xscale;
        if tz < -radius * view.focal_tangent {
            log::trace!("voxel at {:?} rejected: behind view", pos);
            return false;
        }

        let pivot_z = base.pivot().z;
        let gzt = pos.z + yscale * pivot_z - instance.floorclip;
        let gzb = pos.z + yscale * (pivot_z - base.size_z() as f64);
        if gzt <= gzb {
            log::debug!("voxel at {:?} rejected: degenerate height {}..{}", pos, gzb, gzt);
            return false;
        }

        let height_sec = instance.sector.height_sec.clone();
        if let Some(hs) = &height_sec {
            if separated_by_height_sector(hs, instance.fake_side, pos.truncate(), gzt, gzb) {
                log::trace!("voxel at {:?} rejected: hidden by height sector", pos);
                return false;
            }
        }

        pos.z -= instance.floorclip;

        let mut angle = instance.yaw + def.angle_offset;
        let spin = def.spin(instance.actor_flags.contains(ActorFlags::DROPPED));
        if spin != 0 {
            angle -= view.time_ms as f64 * spin as f64 / 1000.0;
        }

        let mut render_flags = instance.render_flags;
        if instance.actor_flags.contains(ActorFlags::BRIGHT) {
            render_flags |= RenderFlags::FULLBRIGHT;
        }

        let (colormap, light) = self.resolve_colormap(instance, current_sector, render_flags, tz);

        list.push(VisibleSprite {
            xscale,
            yscale,
            x1: view.window_left,
            x2: view.window_right,
            idepth: 1.0 / MINZ,
            floorclip: instance.floorclip,
            view_pos: view.position,
            view_angle: view.angle,
            angle,
            height_sec,
            sector: instance.sector.index,
            depth: tz,
            gpos: pos,
            gzb,
            gzt,
            deltax: pos.x - view.position.x,
            deltay: pos.y - view.position.y,
            render_flags,
            style: instance.style,
            alpha: instance.alpha,
            fill_color: instance.fill_color,
            translation: instance.translation.clone(),
            fake_side: instance.fake_side,
            fake_floor: instance.fake_floor,
            fake_ceiling: instance.fake_ceiling,
            in_mirror: view.mirrored,
            voxel: def.model.clone(),
            colormap,
            light,
        });
        list.drew_a_voxel = true;
        true
    }

    /// Pick the colormap and shade row a sprite is drawn with.
    fn resolve_colormap(
        &self,
        instance: &VoxelInstance<'_>,
        current_sector: &Sector,
        render_flags: RenderFlags,
        tz: f64,
    ) -> (Arc<DynamicColormap>, usize) {
        let lighting = self.lighting;
        let style = instance.style;
        let mut invert = style.inverts_colormap();

        let mut base = lighting.base_colormap.clone();
        if current_sector.index != instance.sector.index {
            // Colormaps are not looked up per sector yet; the view sector's is used.
            log::trace!(
                "voxel in sector {} drawn with colormap of sector {}",
                instance.sector.index,
                current_sector.index
            );
        }

        // Additive sprites always fade to black
        if style == RenderStyle::add() && base.is_faded() {
            base = self.colormaps.special_lights(base.color, 0, base.desaturate);
        }

        if style.flags.contains(StyleFlags::FADE_TO_BLACK) {
            let fade = if invert {
                invert = false;
                0x00FF_FFFF
            } else {
                0
            };
            base = self.colormaps.special_lights(base.color, fade, base.desaturate);
        }

        if let Some(fixed) = &lighting.fixed_colormap {
            return (fixed.clone(), 0);
        }

        if invert {
            base = self
                .colormaps
                .special_lights(base.color, inverse_color(base.fade), base.desaturate);
        }

        if let Some(level) = lighting.fixed_light_level {
            (base, level)
        } else if !lighting.foggy && render_flags.contains(RenderFlags::FULLBRIGHT) {
            if self.config.fullbright_ignores_sector_color {
                (lighting.full_normal_light.clone(), 0)
            } else {
                (base, 0)
            }
        } else {
            let light = palookup(
                lighting.sprite_visibility / tz.max(MINZ),
                instance.sprite_shade,
            );
            (base, light)
        }
    }
}

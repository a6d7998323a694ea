//! Projection tests: visibility culling and colormap selection
use glam::DVec3;
use std::sync::Arc;
use voxel_sprite_renderer::rendering::colormap::inverse_color;
use voxel_sprite_renderer::rendering::{
    ActorFlags, RenderFlags, StyleFlags, StyleKind, Translation,
};
use voxel_sprite_renderer::*;

struct Fixture {
    view: ViewContext,
    lighting: LightingContext,
    cache: ColormapCache,
    def: VoxelDef,
    sector: Sector,
    config: RenderConfig,
}

impl Fixture {
    /// One 8-unit voxel centered on its origin, seen from the map origin
    fn new() -> Self {
        Self::with_base_fade(0)
    }

    fn with_base_fade(fade: u32) -> Self {
        let view = ViewContext::new(DVec3::ZERO, 0.0, 320, 200, 90.0, 1.0);
        let cache = ColormapCache::new(Arc::new(Palette::grayscale()));
        let base = cache.special_lights(0x00FF_FFFF, fade, 0);
        let full = cache.special_lights(0x00FF_FFFF, 0, 0);
        let lighting = LightingContext::new(base.clone(), full, &view);

        let mut builder = VoxelModelBuilder::new(1, 1, 1)
            .unwrap()
            .with_pivot(DVec3::splat(0.5));
        builder.set(0, 0, 0, 200).unwrap();
        let def = VoxelDef::new(Arc::new(builder.build(1).unwrap())).with_scale(8.0);

        Self {
            view,
            lighting,
            cache,
            def,
            sector: Sector::new(0, base),
            config: RenderConfig::default(),
        }
    }

    fn project(&self, instance: &VoxelInstance<'_>) -> Option<VisibleSprite> {
        let projector = Projector::new(&self.view, &self.lighting, &self.cache, &self.config);
        let mut list = VisibleSpriteList::new();
        if projector.project(instance, &self.sector, &mut list) {
            assert_eq!(list.len(), 1);
            list.as_slice().first().cloned()
        } else {
            assert!(list.is_empty(), "rejected sprite left a record behind");
            assert!(!list.drew_a_voxel);
            None
        }
    }

    fn instance(&self, pos: DVec3) -> VoxelInstance<'_> {
        VoxelInstance::new(pos, &self.def, &self.sector)
    }
}

fn water(floor: f64, ceiling: f64) -> HeightSector {
    HeightSector {
        floor_plane: SecPlane::flat(floor),
        ceiling_plane: SecPlane::flat(ceiling),
        fake_floor_only: false,
    }
}

// --- visibility ---

#[test]
fn sprite_far_off_the_side_is_rejected() {
    let fx = Fixture::new();
    assert!(fx.project(&fx.instance(DVec3::new(1.0, 500.0, 0.0))).is_none());
    assert!(fx.project(&fx.instance(DVec3::new(1.0, -500.0, 0.0))).is_none());
}

#[test]
fn sprite_behind_view_is_rejected() {
    let fx = Fixture::new();
    assert!(fx.project(&fx.instance(DVec3::new(-100.0, 0.0, 0.0))).is_none());
}

#[test]
fn sprite_straddling_view_plane_is_kept() {
    let fx = Fixture::new();
    // Its bounding radius still reaches in front of the camera
    let sprite = fx.project(&fx.instance(DVec3::new(-5.0, 0.0, 0.0)));
    assert!(sprite.is_some());
}

#[test]
fn fully_sunk_sprite_is_rejected() {
    let fx = Fixture::new();
    let mut instance = fx.instance(DVec3::new(64.0, 0.0, 0.0));
    instance.floorclip = 8.0;
    assert!(fx.project(&instance).is_none());

    instance.floorclip = 7.0;
    assert!(fx.project(&instance).is_some());
}

#[test]
fn viewer_above_fake_ceiling_hides_sprites_below_it() {
    let mut fx = Fixture::new();
    fx.sector = fx.sector.clone().with_height_sec(water(0.0, 128.0));
    let mut instance = fx.instance(DVec3::new(64.0, 0.0, 0.0));

    instance.fake_side = WaterFakeSide::AboveCeiling;
    assert!(fx.project(&instance).is_none());

    instance.position.z = 140.0;
    assert!(fx.project(&instance).is_some());
}

#[test]
fn viewer_below_fake_floor_hides_sprites_above_it() {
    let mut fx = Fixture::new();
    fx.sector = fx.sector.clone().with_height_sec(water(0.0, 128.0));
    let mut instance = fx.instance(DVec3::new(64.0, 0.0, 0.0));
    instance.fake_side = WaterFakeSide::BelowFloor;

    // Straddles the floor: still visible from below
    assert!(fx.project(&instance).is_some());
    instance.position.z = 20.0;
    assert!(fx.project(&instance).is_none());
}

#[test]
fn viewer_between_planes_sees_only_the_middle() {
    let mut fx = Fixture::new();
    fx.sector = fx.sector.clone().with_height_sec(water(0.0, 128.0));
    let mut instance = fx.instance(DVec3::new(64.0, 0.0, 64.0));
    assert!(fx.project(&instance).is_some());

    instance.position.z = -20.0;
    assert!(fx.project(&instance).is_none());

    instance.position.z = 200.0;
    assert!(fx.project(&instance).is_none());

    let mut floor_only = water(0.0, 128.0);
    floor_only.fake_floor_only = true;
    fx.sector = Sector::new(0, fx.lighting.base_colormap.clone()).with_height_sec(floor_only);
    let instance = VoxelInstance::new(DVec3::new(64.0, 0.0, 200.0), &fx.def, &fx.sector);
    assert!(fx.project(&instance).is_some());
}

#[test]
fn record_carries_view_and_instance_state() {
    let mut fx = Fixture::new();
    fx.view = fx.view.clone().with_mirror(true);
    let translation = Arc::new(Translation::identity().with_range(200, 100, 8));
    let mut instance = fx
        .instance(DVec3::new(64.0, 16.0, 0.0))
        .with_style(RenderStyle::translucent(), 0.25);
    instance.translation = Some(translation.clone());
    instance.fill_color = 0x00AA_BBCC;

    let sprite = fx.project(&instance).unwrap();
    assert!(sprite.in_mirror);
    assert_eq!(sprite.style, RenderStyle::translucent());
    assert_eq!(sprite.alpha, 0.25);
    assert_eq!(sprite.fill_color, 0x00AA_BBCC);
    assert!(Arc::ptr_eq(sprite.translation.as_ref().unwrap(), &translation));
    assert_eq!(sprite.deltax, 64.0);
    assert_eq!(sprite.deltay, 16.0);
    assert_eq!((sprite.x1, sprite.x2), (0, 320));
    assert!(sprite.gzt > sprite.gzb);
}

// --- colormap and light ---

#[test]
fn nearer_sprites_are_lit_brighter() {
    let fx = Fixture::new();
    let near = fx
        .project(&fx.instance(DVec3::new(64.0, 0.0, 0.0)).with_light_level(128))
        .unwrap();
    let far = fx
        .project(&fx.instance(DVec3::new(4096.0, 0.0, 0.0)).with_light_level(128))
        .unwrap();
    assert!(near.light < far.light, "near {} far {}", near.light, far.light);
    assert!(Arc::ptr_eq(&near.colormap, &fx.lighting.base_colormap));
}

#[test]
fn fixed_colormap_overrides_everything() {
    let mut fx = Fixture::new();
    let fixed = fx.cache.special_lights(0x0000_FF00, 0, 0);
    fx.lighting.fixed_colormap = Some(fixed.clone());

    let mut instance = fx
        .instance(DVec3::new(64.0, 0.0, 0.0))
        .with_style(RenderStyle::new(StyleKind::Normal, StyleFlags::INVERT_OVERLAY), 1.0)
        .with_light_level(0);
    instance.render_flags = RenderFlags::FULLBRIGHT;

    let sprite = fx.project(&instance).unwrap();
    assert!(Arc::ptr_eq(&sprite.colormap, &fixed));
    assert_eq!(sprite.light, 0);
}

#[test]
fn fixed_light_level_forces_the_row() {
    let mut fx = Fixture::new();
    fx.lighting.fixed_light_level = Some(5);
    let sprite = fx
        .project(&fx.instance(DVec3::new(2048.0, 0.0, 0.0)).with_light_level(0))
        .unwrap();
    assert_eq!(sprite.light, 5);
    assert!(Arc::ptr_eq(&sprite.colormap, &fx.lighting.base_colormap));
}

#[test]
fn fullbright_uses_row_zero_of_the_sector_colormap() {
    let fx = Fixture::new();
    let mut instance = fx.instance(DVec3::new(2048.0, 0.0, 0.0)).with_light_level(0);
    instance.actor_flags = ActorFlags::BRIGHT;

    let sprite = fx.project(&instance).unwrap();
    assert!(sprite.render_flags.contains(RenderFlags::FULLBRIGHT));
    assert_eq!(sprite.light, 0);
    assert!(Arc::ptr_eq(&sprite.colormap, &fx.lighting.base_colormap));
}

#[test]
fn fullbright_can_ignore_sector_color() {
    let mut fx = Fixture::with_base_fade(0x0040_4040);
    fx.config.fullbright_ignores_sector_color = true;
    let mut instance = fx.instance(DVec3::new(64.0, 0.0, 0.0));
    instance.render_flags = RenderFlags::FULLBRIGHT;

    let sprite = fx.project(&instance).unwrap();
    assert_eq!(sprite.light, 0);
    assert!(Arc::ptr_eq(&sprite.colormap, &fx.lighting.full_normal_light));
}

#[test]
fn fog_keeps_fullbright_sprites_shaded() {
    let mut fx = Fixture::new();
    fx.lighting.foggy = true;
    let mut instance = fx.instance(DVec3::new(64.0, 0.0, 0.0)).with_light_level(0);
    instance.render_flags = RenderFlags::FULLBRIGHT;

    let sprite = fx.project(&instance).unwrap();
    assert!(sprite.light > 0);
}

#[test]
fn inverted_styles_invert_the_fade_color() {
    let fx = Fixture::new();
    let base = fx.lighting.base_colormap.clone();

    let overlay = RenderStyle::new(StyleKind::Normal, StyleFlags::INVERT_OVERLAY);
    let sprite = fx
        .project(&fx.instance(DVec3::new(64.0, 0.0, 0.0)).with_style(overlay, 1.0))
        .unwrap();
    assert_eq!(sprite.colormap.fade, inverse_color(base.fade));

    // Inverting both the source and the overlay cancels out
    let both = RenderStyle::new(
        StyleKind::Normal,
        StyleFlags::INVERT_OVERLAY | StyleFlags::INVERT_SOURCE,
    );
    let sprite = fx
        .project(&fx.instance(DVec3::new(64.0, 0.0, 0.0)).with_style(both, 1.0))
        .unwrap();
    assert!(Arc::ptr_eq(&sprite.colormap, &base));
}

#[test]
fn fade_to_black_replaces_the_fade_color() {
    let fx = Fixture::with_base_fade(0x0040_4040);
    let style = RenderStyle::new(StyleKind::Translucent, StyleFlags::FADE_TO_BLACK);
    let sprite = fx
        .project(&fx.instance(DVec3::new(64.0, 0.0, 0.0)).with_style(style, 0.5))
        .unwrap();
    assert_eq!(sprite.colormap.fade, 0);
    assert_eq!(sprite.colormap.color, fx.lighting.base_colormap.color);
}

#[test]
fn inverted_fade_to_black_fades_to_white() {
    let fx = Fixture::with_base_fade(0x0040_4040);
    let style = RenderStyle::new(
        StyleKind::Normal,
        StyleFlags::FADE_TO_BLACK | StyleFlags::INVERT_OVERLAY,
    );
    let sprite = fx
        .project(&fx.instance(DVec3::new(64.0, 0.0, 0.0)).with_style(style, 1.0))
        .unwrap();
    // The inversion is spent on the fade color and not applied again
    assert_eq!(sprite.colormap.fade, 0x00FF_FFFF);
}

#[test]
fn plain_additive_sprites_fade_to_black() {
    let fx = Fixture::with_base_fade(0x0040_4040);
    let sprite = fx
        .project(&fx.instance(DVec3::new(64.0, 0.0, 0.0)).with_style(RenderStyle::add(), 0.5))
        .unwrap();
    assert_eq!(sprite.colormap.fade, 0);

    // Only the exact legacy additive style gets the override
    let flagged = RenderStyle::new(
        StyleKind::Add,
        StyleFlags::INVERT_SOURCE | StyleFlags::INVERT_OVERLAY,
    );
    let sprite = fx
        .project(&fx.instance(DVec3::new(64.0, 0.0, 0.0)).with_style(flagged, 0.5))
        .unwrap();
    assert_eq!(sprite.colormap.fade, 0x0040_4040);
}

#[test]
fn unfaded_additive_sprites_keep_the_sector_colormap() {
    let fx = Fixture::new();
    let sprite = fx
        .project(&fx.instance(DVec3::new(64.0, 0.0, 0.0)).with_style(RenderStyle::add(), 0.5))
        .unwrap();
    assert!(Arc::ptr_eq(&sprite.colormap, &fx.lighting.base_colormap));
}

// --- list bookkeeping ---

#[test]
fn list_flags_that_a_voxel_was_queued() {
    let fx = Fixture::new();
    let projector = Projector::new(&fx.view, &fx.lighting, &fx.cache, &fx.config);
    let mut list = VisibleSpriteList::new();

    let behind = fx.instance(DVec3::new(-500.0, 0.0, 0.0));
    assert!(!projector.project(&behind, &fx.sector, &mut list));
    assert!(!list.drew_a_voxel);

    for pos in [DVec3::new(64.0, 0.0, 0.0), DVec3::new(96.0, 8.0, 0.0)] {
        assert!(projector.project(&fx.instance(pos), &fx.sector, &mut list));
    }
    assert_eq!(list.len(), 2);
    assert!(list.drew_a_voxel);

    list.clear();
    assert!(list.is_empty());
    assert!(!list.drew_a_voxel);
}

//! Offscreen buffer lifecycle and style compositing through the renderer
use glam::DVec3;
use std::sync::Arc;
use voxel_sprite_renderer::rendering::colormap::pack_rgb;
use voxel_sprite_renderer::rendering::{
    ColumnDrawer, DrawPath, DrawerStyle, PatchStyleScope, StyleKind,
};
use voxel_sprite_renderer::*;

const WIDTH: usize = 320;
const HEIGHT: usize = 200;

fn gray(level: u32) -> u32 {
    pack_rgb(level, level, level)
}

/// One 8-unit voxel of color 200, 64 units in front of the camera, drawn
/// with `style` onto a true-color frame cleared to gray `background`.
fn render_styled(
    renderer: &mut VoxelRenderer,
    style: RenderStyle,
    alpha: f32,
    fill_color: u32,
    background: u8,
) -> (Framebuffer, bool) {
    let view = ViewContext::new(DVec3::ZERO, 0.0, WIDTH, HEIGHT, 90.0, 1.0);
    let identity = Arc::new(DynamicColormap::identity());
    let lighting = LightingContext::new(identity.clone(), identity.clone(), &view);
    let palette = Arc::new(Palette::grayscale());
    let cache = ColormapCache::new(palette.clone());
    let sector = Sector::new(0, identity);

    let mut builder = VoxelModelBuilder::new(1, 1, 1)
        .unwrap()
        .with_pivot(DVec3::splat(0.5));
    builder.set(0, 0, 0, 200).unwrap();
    let def = VoxelDef::new(Arc::new(builder.build(1).unwrap())).with_scale(8.0);

    let mut instance =
        VoxelInstance::new(DVec3::new(64.0, 0.0, 0.0), &def, &sector).with_style(style, alpha);
    instance.fill_color = fill_color;

    let config = renderer.config;
    let projector = Projector::new(&view, &lighting, &cache, &config);
    let mut list = VisibleSpriteList::new();
    assert!(projector.project(&instance, &sector, &mut list));

    let mut frame = Framebuffer::new(WIDTH, HEIGHT, PixelFormat::TrueColor, palette);
    frame.clear(background);
    let clip = ClipBounds::unclipped(WIDTH, HEIGHT);
    let drawn = renderer.render(&list.as_slice()[0], &view, &clip, 0, usize::MAX, &mut frame);
    (frame, drawn)
}

#[test]
fn opaque_translucency_draws_directly() {
    let mut renderer = VoxelRenderer::new(RenderConfig::default());
    let (frame, drawn) = render_styled(&mut renderer, RenderStyle::translucent(), 1.0, 0, 0);
    assert!(drawn);
    assert_eq!(frame.pixel_rgb(160, 100), Some(gray(200)));
    assert!(renderer.offscreen().coverage().is_none());
}

#[test]
fn translucent_sprite_blends_with_background() {
    let mut renderer = VoxelRenderer::new(RenderConfig::default());
    let (frame, _) = render_styled(&mut renderer, RenderStyle::translucent(), 0.5, 0, 0);
    assert_eq!(frame.pixel_rgb(160, 100), Some(gray(100)));
    assert_eq!(frame.pixel_rgb(149, 100), Some(gray(0)));
    assert_eq!(frame.pixel_rgb(160, 110), Some(gray(0)));
    assert!(renderer.offscreen().has_color_buffer());
}

#[test]
fn additive_sprite_saturates() {
    let mut renderer = VoxelRenderer::new(RenderConfig::default());
    let (frame, _) = render_styled(&mut renderer, RenderStyle::add(), 1.0, 0, 100);
    assert_eq!(frame.pixel_rgb(160, 100), Some(gray(255)));
    assert_eq!(frame.pixel_rgb(10, 10), Some(gray(100)));
}

#[test]
fn fuzzy_sprite_darkens_its_silhouette() {
    let mut renderer = VoxelRenderer::new(RenderConfig::default());
    let (frame, _) = render_styled(&mut renderer, RenderStyle::fuzzy(), 1.0, 0, 255);
    assert_eq!(frame.pixel_rgb(160, 100), Some(gray(255 * 26 / 32)));
    assert_eq!(frame.pixel_rgb(200, 100), Some(gray(255)));
    // Coverage only: fuzz never needs the source colors
    assert!(!renderer.offscreen().has_color_buffer());
}

#[test]
fn stencil_sprite_uses_fill_color() {
    let mut renderer = VoxelRenderer::new(RenderConfig::default());
    let red = pack_rgb(255, 0, 0);
    let (frame, _) = render_styled(&mut renderer, RenderStyle::stencil(), 1.0, red, 0);
    assert_eq!(frame.pixel_rgb(160, 100), Some(red));
    assert_eq!(frame.pixel_rgb(0, 0), Some(gray(0)));
    assert!(!renderer.offscreen().has_color_buffer());
}

#[test]
fn invisible_styles_draw_nothing() {
    let mut renderer = VoxelRenderer::new(RenderConfig::default());
    let none = RenderStyle::new(StyleKind::None, Default::default());
    let (frame, drawn) = render_styled(&mut renderer, none, 1.0, 0, 0);
    assert!(!drawn);
    assert_eq!(frame.pixel_rgb(160, 100), Some(gray(0)));

    let (frame, drawn) = render_styled(&mut renderer, RenderStyle::translucent(), 0.0, 0, 0);
    assert!(!drawn);
    assert_eq!(frame.pixel_rgb(160, 100), Some(gray(0)));
}

#[test]
fn offscreen_buffers_are_reused_and_reallocated() {
    let mut offscreen = OffscreenBuffer::new();
    assert!(offscreen.coverage().is_none());

    offscreen.check(64, 32, true);
    assert_eq!(offscreen.coverage().map(|c| c.num_columns()), Some(64));
    assert!(!offscreen.has_color_buffer());

    offscreen.check(64, 32, false);
    assert!(offscreen.has_color_buffer());
    offscreen.insert_span(3, 4, 8);
    offscreen.fill_color(3, 4, 4, 0x0012_3456);
    assert_eq!(offscreen.color_at(3, 5), Some(0x0012_3456));

    // Same size: coverage is cleared, colors are kept as scratch
    offscreen.check(64, 32, false);
    assert_eq!(offscreen.coverage().map(|c| c.spans(3).count()), Some(0));

    // New width: both buffers start over
    offscreen.check(80, 32, false);
    assert_eq!(offscreen.coverage().map(|c| c.num_columns()), Some(80));
    assert_eq!((offscreen.width(), offscreen.height()), (80, 32));
    assert_eq!(offscreen.color_at(3, 5), Some(0));
    assert_eq!(offscreen.color_at(80, 0), None);

    offscreen.release();
    assert!(offscreen.coverage().is_none());
    assert!(!offscreen.has_color_buffer());
    assert_eq!((offscreen.width(), offscreen.height()), (0, 0));
}

#[test]
fn renderer_shutdown_releases_offscreen() {
    let mut renderer = VoxelRenderer::new(RenderConfig::default());
    render_styled(&mut renderer, RenderStyle::translucent(), 0.5, 0, 0);
    assert!(renderer.offscreen().coverage().is_some());
    renderer.shutdown();
    assert!(renderer.offscreen().coverage().is_none());
}

#[test]
fn scope_composites_when_dropped() {
    let palette = Arc::new(Palette::grayscale());
    let mut frame = Framebuffer::new(8, 8, PixelFormat::TrueColor, palette);
    frame.clear(0);
    let mut offscreen = OffscreenBuffer::new();
    let style = DrawerStyle::begin(
        RenderStyle::translucent(),
        0.5,
        Arc::new(DynamicColormap::identity()),
        0,
        None,
        0,
    )
    .unwrap();

    {
        let mut scope =
            PatchStyleScope::begin(&mut frame, &mut offscreen, style, DrawPath::Offscreen);
        assert_eq!(scope.path(), DrawPath::Offscreen);
        scope.fill_column(2, 1, 3, 200);
        // Overdraw inside the sprite is resolved offscreen, not blended twice
        scope.fill_column(2, 2, 1, 200);
    }

    assert_eq!(frame.pixel_rgb(2, 0), Some(gray(0)));
    assert_eq!(frame.pixel_rgb(2, 1), Some(gray(100)));
    assert_eq!(frame.pixel_rgb(2, 2), Some(gray(100)));
    assert_eq!(frame.pixel_rgb(2, 3), Some(gray(100)));
    assert_eq!(frame.pixel_rgb(2, 4), Some(gray(0)));
}

#[test]
fn taller_viewport_after_spans_only_frame_composites_every_row() {
    let (width, short, tall) = (16, 8, 16);
    let mut offscreen = OffscreenBuffer::new();
    offscreen.check(width, short, false);
    // A fuzzy sprite at the new size skips the color buffer
    offscreen.check(width, tall, true);
    offscreen.check(width, tall, false);

    for x in 0..width {
        offscreen.insert_span(x, 0, tall);
        offscreen.fill_color(x, 0, tall, gray(200));
    }
    assert_eq!(offscreen.color_at(width - 1, tall - 1), Some(gray(200)));

    let palette = Arc::new(Palette::grayscale());
    let mut frame = Framebuffer::new(width, tall, PixelFormat::TrueColor, palette);
    frame.clear(0);
    let style = DrawerStyle::begin(
        RenderStyle::translucent(),
        0.5,
        Arc::new(DynamicColormap::identity()),
        0,
        None,
        0,
    )
    .unwrap();

    assert_eq!(offscreen.composite(&mut frame, &style), width * tall);
    assert_eq!(frame.pixel_rgb(0, 0), Some(gray(100)));
    assert_eq!(frame.pixel_rgb(width - 1, tall - 1), Some(gray(100)));
}

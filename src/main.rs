/// Voxel sprite demo
/// Handles window creation, input, and the render loop
use glam::DVec3;
use mimalloc::MiMalloc;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;
use noise::{NoiseFn, Perlin};
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Instant;
use voxel_sprite_renderer::rendering::colormap::pack_rgb;
use voxel_sprite_renderer::rendering::{ColormapSource, StyleFlags, StyleKind};
use voxel_sprite_renderer::perf::PerfTimer;
use voxel_sprite_renderer::perf_scope;
use voxel_sprite_renderer::*;
use winit::{
    event::*,
    event_loop::{ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::WindowBuilder,
};

const FOV_DEGREES: f64 = 90.0;
const MODEL_SIZE: usize = 32;
const MODEL_MIPS: usize = 4;

/// 8 hue ramps of 32 shades each; index 0 stays black
fn demo_palette() -> Palette {
    let hues: [(u32, u32, u32); 8] = [
        (255, 255, 255),
        (255, 64, 64),
        (64, 255, 64),
        (64, 96, 255),
        (255, 220, 64),
        (64, 255, 255),
        (255, 64, 255),
        (160, 110, 60),
    ];
    let mut colors = [0u32; 256];
    for (i, color) in colors.iter_mut().enumerate().skip(1) {
        let (r, g, b) = hues[i / 32];
        let level = (i % 32) as u32 + 1;
        *color = pack_rgb(r * level / 32, g * level / 32, b * level / 32);
    }
    Palette::new(colors)
}

/// A noise heightfield island, colored by height
fn build_island(seed: u32) -> Result<VoxelModel, VoxelError> {
    let perlin = Perlin::new(seed);
    let mut builder = VoxelModelBuilder::new(MODEL_SIZE, MODEL_SIZE, MODEL_SIZE)?;
    let half = MODEL_SIZE as f64 * 0.5;

    for x in 0..MODEL_SIZE {
        for y in 0..MODEL_SIZE {
            let (fx, fy) = (x as f64 - half + 0.5, y as f64 - half + 0.5);
            let falloff = 1.0 - ((fx * fx + fy * fy).sqrt() / half).min(1.0);
            let n = perlin.get([x as f64 * 0.09, y as f64 * 0.09]) * 0.5 + 0.5;
            let height = (n * falloff * MODEL_SIZE as f64 * 1.4) as usize;
            let height = height.min(MODEL_SIZE);

            for depth in 0..height {
                let z = MODEL_SIZE - 1 - depth;
                // Soil near the surface, grass below it, then gray rock
                let ramp: u8 = match depth * 4 / MODEL_SIZE {
                    0 => 7,
                    1 => 2,
                    _ => 0,
                };
                let shade = 8 + (depth * 23 / MODEL_SIZE) as u8;
                let color = if depth + 1 == height { 2 * 32 + shade } else { ramp * 32 + shade };
                builder.set(x, y, z, color)?;
            }
        }
    }
    builder.build(MODEL_MIPS)
}

struct Scene {
    palette: Arc<Palette>,
    colormaps: ColormapCache,
    sector: Sector,
    defs: Vec<VoxelDef>,
}

impl Scene {
    fn new() -> Result<Self, VoxelError> {
        let palette = Arc::new(demo_palette());
        let colormaps = ColormapCache::new(palette.clone());
        let base = colormaps.special_lights(0x00FF_FFFF, 0, 0);
        let island = Arc::new(build_island(7)?);
        let defs = vec![
            VoxelDef::new(island.clone()).with_scale(2.0),
            VoxelDef::new(island.clone()).with_scale(1.0).with_spin(45, 90),
            VoxelDef::new(island).with_scale(0.5).with_angle_offset(90.0),
        ];
        Ok(Self {
            palette,
            colormaps,
            sector: Sector::new(0, base),
            defs,
        })
    }

    /// The actors of the scene: a row of islands in assorted render styles
    fn instances(&self) -> Vec<VoxelInstance<'_>> {
        let styles = [
            (RenderStyle::normal(), 1.0),
            (RenderStyle::translucent(), 0.5),
            (RenderStyle::add(), 0.8),
            (RenderStyle::fuzzy(), 1.0),
            (RenderStyle::new(StyleKind::Normal, StyleFlags::INVERT_OVERLAY), 1.0),
        ];
        let mut instances = Vec::new();
        for (i, (style, alpha)) in styles.into_iter().enumerate() {
            let def = &self.defs[i % self.defs.len()];
            let pos = DVec3::new(160.0, (i as f64 - 2.0) * 80.0, -32.0);
            instances.push(
                VoxelInstance::new(pos, def, &self.sector)
                    .with_yaw(i as f64 * 30.0)
                    .with_style(style, alpha)
                    .with_light_level(192),
            );
        }
        instances
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    println!("=== Voxel Sprite Renderer ===");
    println!("Controls:");
    println!("  WASD - Move");
    println!("  Arrows - Turn");
    println!("  Space/Shift - Up/Down");
    println!("  T - Toggle slab strips");
    println!("  B - Toggle fullbright sector color");
    println!("  P - Log pipeline counters");
    println!("  ESC - Exit");
    println!();

    let event_loop = EventLoop::new()?;
    let window = Arc::new(
        WindowBuilder::new()
            .with_title("Voxel Sprites")
            .with_inner_size(winit::dpi::LogicalSize::new(960, 600))
            .build(&event_loop)?,
    );

    let context = softbuffer::Context::new(window.clone())?;
    let mut surface = softbuffer::Surface::new(&context, window.clone())?;

    let scene = Scene::new()?;
    let mut renderer = VoxelRenderer::new(RenderConfig::default());

    let size = window.inner_size();
    let mut framebuffer = Framebuffer::new(
        size.width.max(1) as usize,
        size.height.max(1) as usize,
        renderer.config.pixel_format(),
        scene.palette.clone(),
    );
    let mut view = ViewContext::new(
        DVec3::ZERO,
        0.0,
        framebuffer.width,
        framebuffer.height,
        FOV_DEGREES,
        1.0,
    );
    let mut controller = CameraController::new();
    let mut sprites = VisibleSpriteList::new();

    let start = Instant::now();
    let mut last_frame = Instant::now();
    let mut frame_count = 0u32;
    let mut fps_timer = Instant::now();
    let mut stats = perf::PerfStats::new();

    event_loop.run(move |event, elwt| {
        elwt.set_control_flow(ControlFlow::Poll);

        match event {
            Event::WindowEvent { event, .. } => match event {
                WindowEvent::CloseRequested => {
                    renderer.shutdown();
                    elwt.exit();
                }
                WindowEvent::Resized(new_size) => {
                    let (w, h) = (new_size.width.max(1) as usize, new_size.height.max(1) as usize);
                    framebuffer.resize(w, h);
                    view.resize(w, h, FOV_DEGREES);
                }
                WindowEvent::KeyboardInput { event, .. } => {
                    let pressed = event.state == ElementState::Pressed;

                    if let PhysicalKey::Code(keycode) = event.physical_key {
                        match keycode {
                            KeyCode::KeyW => controller.forward_pressed = pressed,
                            KeyCode::KeyS => controller.backward_pressed = pressed,
                            KeyCode::KeyA => controller.left_pressed = pressed,
                            KeyCode::KeyD => controller.right_pressed = pressed,
                            KeyCode::Space => controller.up_pressed = pressed,
                            KeyCode::ShiftLeft => controller.down_pressed = pressed,
                            KeyCode::ArrowLeft => controller.turn_left_pressed = pressed,
                            KeyCode::ArrowRight => controller.turn_right_pressed = pressed,
                            KeyCode::KeyT if pressed => {
                                renderer.config.slab_strips = !renderer.config.slab_strips;
                                log::info!("slab strips: {}", renderer.config.slab_strips);
                            }
                            KeyCode::KeyB if pressed => {
                                let config = &mut renderer.config;
                                config.fullbright_ignores_sector_color =
                                    !config.fullbright_ignores_sector_color;
                                log::info!(
                                    "fullbright ignores sector color: {}",
                                    config.fullbright_ignores_sector_color
                                );
                            }
                            KeyCode::KeyP if pressed => {
                                FUNCTION_COUNTERS.snapshot().log_report();
                                FUNCTION_COUNTERS.reset();
                            }
                            KeyCode::Escape if pressed => {
                                renderer.shutdown();
                                elwt.exit();
                            }
                            _ => {}
                        }
                    }
                }
                WindowEvent::RedrawRequested => {
                    let now = Instant::now();
                    let dt = (now - last_frame).as_secs_f64();
                    last_frame = now;
                    let frame_start = Instant::now();

                    controller.update_view(&mut view, dt);
                    view.time_ms = start.elapsed().as_millis() as u64;

                    // Projection
                    let project_start = Instant::now();
                    let full_normal = Arc::new(DynamicColormap::identity());
                    let lighting =
                        LightingContext::new(scene.sector.colormap.clone(), full_normal, &view);
                    let projector =
                        Projector::new(&view, &lighting, &scene.colormaps, &renderer.config);
                    sprites.clear();
                    for instance in scene.instances() {
                        projector.project(&instance, &scene.sector, &mut sprites);
                    }
                    stats.projection_us = project_start.elapsed().as_secs_f64() * 1e6;

                    // Far to near, as the sprite sorting pass would
                    let mut order: Vec<&VisibleSprite> = sprites.iter().collect();
                    {
                        perf_scope!("sprite sort");
                        order.sort_by(|a, b| b.depth.total_cmp(&a.depth));
                    }

                    let raster_start = Instant::now();
                    framebuffer.clear(32 * 3 + 6);
                    let clip = ClipBounds::unclipped(framebuffer.width, framebuffer.height);
                    for sprite in order {
                        renderer.render(sprite, &view, &clip, 0, usize::MAX, &mut framebuffer);
                    }
                    stats.rasterization_us = raster_start.elapsed().as_secs_f64() * 1e6;

                    let present_timer = PerfTimer::new("present");
                    let (Some(w), Some(h)) = (
                        NonZeroU32::new(framebuffer.width as u32),
                        NonZeroU32::new(framebuffer.height as u32),
                    ) else {
                        return;
                    };
                    if let Err(err) = surface.resize(w, h) {
                        log::error!("surface resize failed: {}", err);
                        return;
                    }
                    match surface.buffer_mut() {
                        Ok(mut buffer) => {
                            framebuffer.copy_to_argb(&mut buffer);
                            if let Err(err) = buffer.present() {
                                log::error!("present failed: {}", err);
                            }
                        }
                        Err(err) => log::error!("surface buffer unavailable: {}", err),
                    }
                    stats.present_us = present_timer.elapsed().as_secs_f64() * 1e6;
                    drop(present_timer);
                    stats.total_us = frame_start.elapsed().as_secs_f64() * 1e6;

                    frame_count += 1;
                    if fps_timer.elapsed().as_secs() >= 1 {
                        log::info!("FPS: {} | sprites: {}", frame_count, sprites.len());
                        stats.log_summary();
                        frame_count = 0;
                        fps_timer = Instant::now();
                    }
                }
                _ => {}
            },
            Event::AboutToWait => {
                window.request_redraw();
            }
            _ => {}
        }
    })?;
    Ok(())
}

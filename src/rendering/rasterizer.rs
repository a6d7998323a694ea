/// Voxel sprite rasterizer
/// Walks the model far-to-near and fills one screen box per voxel
///
/// There is no depth buffer: nearer columns are simply visited later, so
/// their fills overwrite (or composite over) the farther ones.
use super::fixed::{Fixed, FRACBITS};
use super::framebuffer::ColumnDrawer;
use super::vissprite::VisibleSprite;
use crate::camera::ViewContext;
use crate::voxel::{MipLevel, Slab};
use crate::count_call;
use glam::{DVec2, DVec3};

/// Fills nearer than this view-space depth are dropped
pub const FILL_MIN_DEPTH: f64 = 0.01;

/// Per-column vertical visibility left by already drawn scenery.
///
/// Row `y` of column `x` is visible when `top[x] <= y < bottom[x]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClipBounds {
    pub top: Vec<i16>,
    pub bottom: Vec<i16>,
}

impl ClipBounds {
    /// Every row of every column visible
    pub fn unclipped(width: usize, height: usize) -> Self {
        let bottom = height.min(i16::MAX as usize) as i16;
        Self {
            top: vec![0; width],
            bottom: vec![bottom; width],
        }
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.top.len().min(self.bottom.len())
    }

    pub fn set_column(&mut self, x: usize, top: i16, bottom: i16) {
        if x < self.width() {
            self.top[x] = top;
            self.bottom[x] = bottom;
        }
    }

    /// Visible rows of column `x` as `(top, bottom)`; empty outside the array.
    #[inline]
    pub fn column(&self, x: usize) -> (usize, usize) {
        if x >= self.width() {
            return (0, 0);
        }
        (self.top[x].max(0) as usize, self.bottom[x].max(0) as usize)
    }
}

/// Screen-space rectangle of a projected box, `[x1, x2) x [y1, y2)`, plus the
/// unclamped vertical edges for texture stepping.
#[derive(Debug, Clone, Copy, PartialEq)]
struct ScreenRect {
    x1: usize,
    x2: usize,
    y1: usize,
    y2: usize,
    top: i64,
    bottom: i64,
}

/// First pixel whose center lies at or past `edge`
#[inline]
fn pixel_edge(edge: f64) -> i64 {
    (edge - 0.5).ceil() as i64
}

#[inline]
fn clamp_edge(edge: i64, limit: usize) -> usize {
    edge.clamp(0, limit as i64) as usize
}

/// Project a box around `center` with world half-extent `extent_x`
/// horizontally, reaching `up` above and `down` below the center.
fn project_box(
    view: &ViewContext,
    center: DVec3,
    extent_x: f64,
    up: f64,
    down: f64,
    width: usize,
    height: usize,
) -> Option<ScreenRect> {
    let v = view.to_view_space(center);
    if v.z <= FILL_MIN_DEPTH {
        return None;
    }
    let (sx, sy) = view.project(v);
    let ext_x = extent_x / v.z * view.center_x;
    let ext_up = up / v.z * view.inv_z_to_scale;
    let ext_down = down / v.z * view.inv_z_to_scale;

    let top = pixel_edge(sy - ext_up);
    let bottom = pixel_edge(sy + ext_down);
    Some(ScreenRect {
        x1: clamp_edge(pixel_edge(sx - ext_x), width),
        x2: clamp_edge(pixel_edge(sx + ext_x), width),
        y1: clamp_edge(top, height),
        y2: clamp_edge(bottom, height),
        top,
        bottom,
    })
}

/// Fill the screen box of a world-space cube with one color.
///
/// `extent_x` and `extent_y` are world half-extents. Returns whether any
/// column was handed to the drawer.
pub fn fill_box<D: ColumnDrawer + ?Sized>(
    view: &ViewContext,
    center: DVec3,
    extent_x: f64,
    extent_y: f64,
    color: u8,
    clip: &ClipBounds,
    drawer: &mut D,
) -> bool {
    count_call!(crate::perf::FUNCTION_COUNTERS.fill_box_calls);
    let (width, height) = (drawer.width(), drawer.height());
    let Some(rect) = project_box(view, center, extent_x, extent_y, extent_y, width, height) else {
        count_call!(crate::perf::FUNCTION_COUNTERS.fill_box_rejected_depth);
        return false;
    };
    if rect.y1 >= rect.y2 {
        return false;
    }

    let mut drawn = false;
    for x in rect.x1..rect.x2 {
        let (top, bottom) = clip.column(x);
        let y1 = rect.y1.max(top);
        let y2 = rect.y2.min(bottom);
        if y1 < y2 {
            drawer.fill_column(x, y1, y2 - y1, color);
            drawn = true;
        }
    }
    drawn
}

/// Pick the mip level for a sprite `distance` units away (perpendicular to
/// the view plane) whose voxels are `xscale` units wide.
///
/// Each level halves the resolution; stop once a voxel of the level covers
/// about one pixel or the coarsest level is reached.
pub fn select_mip(distance: f64, xscale: f64, focal_length_x: f64, num_mips: usize) -> usize {
    let mut metric = distance.abs() / xscale.abs().max(f64::MIN_POSITIVE);
    let mut level = 0;
    while level + 1 < num_mips && metric >= focal_length_x {
        metric *= 0.5;
        level += 1;
    }
    level
}

/// Cells `start, start + step, ...` along one model axis
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct AxisRun {
    start: usize,
    count: usize,
    descending: bool,
}

impl AxisRun {
    fn iter(self) -> impl Iterator<Item = usize> {
        (0..self.count).map(move |i| {
            if self.descending {
                self.start - i
            } else {
                self.start + i
            }
        })
    }
}

/// Visiting order along one model axis, farthest from the camera first: the
/// cells below the camera's cell ascending, the cells above it descending,
/// then the camera's own cell.
fn axis_walk(size: usize, camera: f64) -> [AxisRun; 3] {
    let last = size.saturating_sub(1);
    let cell = if camera.is_nan() {
        0
    } else {
        (camera.floor().max(0.0) as usize).min(last)
    };
    [
        AxisRun {
            start: 0,
            count: cell,
            descending: false,
        },
        AxisRun {
            start: last,
            count: last - cell,
            descending: true,
        },
        AxisRun {
            start: cell,
            count: usize::from(size > 0),
            descending: false,
        },
    ]
}

pub struct VoxelRasterizer<'a> {
    view: &'a ViewContext,
    /// Draw whole slabs as textured columns instead of one box per voxel
    slab_strips: bool,
}

/// Model axes and origin in world space for one mip level
struct ModelFrame {
    origin: DVec3,
    axis_x: DVec2,
    axis_y: DVec2,
    xscale: f64,
    yscale: f64,
}

impl ModelFrame {
    /// World position of the center of voxel column `(x, y)`, at height 0
    #[inline]
    fn column_center(&self, x: usize, y: usize) -> DVec2 {
        self.origin.truncate()
            + self.axis_x * (x as f64 + 0.5) * self.xscale
            + self.axis_y * (y as f64 + 0.5) * self.xscale
    }

    /// World height of the top edge of voxel row `z`
    #[inline]
    fn row_top(&self, z: usize) -> f64 {
        self.origin.z - z as f64 * self.yscale
    }
}

impl<'a> VoxelRasterizer<'a> {
    pub fn new(view: &'a ViewContext, slab_strips: bool) -> Self {
        Self { view, slab_strips }
    }

    /// Draw `sprite` into `drawer`, clipped to `clip`, drawing only voxel rows
    /// in `[min_z, max_z)` (given at full resolution).
    ///
    /// Returns false when the selected mip level holds no voxels.
    pub fn rasterize<D: ColumnDrawer + ?Sized>(
        &self,
        sprite: &VisibleSprite,
        clip: &ClipBounds,
        min_z: usize,
        max_z: usize,
        drawer: &mut D,
    ) -> bool {
        count_call!(crate::perf::FUNCTION_COUNTERS.render_calls);
        let view = self.view;
        let model = &sprite.voxel;

        let to_view = view.position - sprite.gpos;
        let distance = to_view.x * view.cos + to_view.y * view.sin;
        let level = select_mip(distance, sprite.xscale, view.focal_length_x, model.num_mips());
        let Some(mip) = model.mip(level).filter(|m| !m.is_empty()) else {
            count_call!(crate::perf::FUNCTION_COUNTERS.render_skipped_empty_mip);
            log::trace!("voxel sprite skipped: mip {} is empty", level);
            return false;
        };

        let min_z = min_z >> level;
        let max_z = max_z >> level;
        let frame = Self::model_frame(sprite, mip, level);

        // Camera position in the model's column grid
        let rel = (view.position.truncate() - frame.origin.truncate()) / frame.xscale;
        let walk_x = axis_walk(mip.size_x(), rel.dot(frame.axis_x));
        let walk_y = axis_walk(mip.size_y(), rel.dot(frame.axis_y));

        for run_x in walk_x {
            if run_x.count == 0 {
                continue;
            }
            for run_y in walk_y {
                if run_y.count == 0 {
                    continue;
                }
                for x in run_x.iter() {
                    for y in run_y.iter() {
                        self.draw_column(mip, &frame, x, y, min_z, max_z, clip, drawer);
                    }
                }
            }
        }
        true
    }

    fn model_frame(sprite: &VisibleSprite, mip: &MipLevel, level: usize) -> ModelFrame {
        let factor = (1u64 << level.min(62)) as f64;
        let xscale = sprite.xscale * factor;
        let yscale = sprite.yscale * factor;
        let (sin, cos) = sprite.angle.to_radians().sin_cos();
        let axis_x = DVec2::new(sin, cos);
        let axis_y = DVec2::new(-cos, sin);
        let pivot = mip.pivot();

        let base = sprite.gpos.truncate() - (axis_x * pivot.x + axis_y * pivot.y) * xscale;
        ModelFrame {
            origin: base.extend(sprite.gpos.z + pivot.z * yscale),
            axis_x,
            axis_y,
            xscale,
            yscale,
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn draw_column<D: ColumnDrawer + ?Sized>(
        &self,
        mip: &MipLevel,
        frame: &ModelFrame,
        x: usize,
        y: usize,
        min_z: usize,
        max_z: usize,
        clip: &ClipBounds,
        drawer: &mut D,
    ) {
        let center = frame.column_center(x, y);
        // TODO: skip slabs whose backface mask hides them from this octant
        for slab in mip.slabs(x, y) {
            count_call!(crate::perf::FUNCTION_COUNTERS.slabs_visited);
            let ztop = (slab.ztop as usize).max(min_z);
            let zbottom = slab.zbottom().min(max_z);
            if ztop >= zbottom {
                continue;
            }
            if self.slab_strips {
                self.draw_strip(&slab, frame, center, ztop, zbottom, clip, drawer);
                continue;
            }
            for z in ztop..zbottom {
                let color = slab.colors[z - slab.ztop as usize];
                let voxel = center.extend(frame.row_top(z) - frame.yscale * 0.5);
                fill_box(
                    self.view,
                    voxel,
                    frame.xscale * 0.5,
                    frame.yscale * 0.5,
                    color,
                    clip,
                    drawer,
                );
            }
        }
    }

    /// Draw rows `[ztop, zbottom)` of a slab as one textured column per
    /// screen column.
    #[allow(clippy::too_many_arguments)]
    fn draw_strip<D: ColumnDrawer + ?Sized>(
        &self,
        slab: &Slab<'_>,
        frame: &ModelFrame,
        center: DVec2,
        ztop: usize,
        zbottom: usize,
        clip: &ClipBounds,
        drawer: &mut D,
    ) {
        let top_z = frame.row_top(ztop);
        let bottom_z = frame.row_top(zbottom);
        let mid = center.extend((top_z + bottom_z) * 0.5);
        let half = (top_z - bottom_z) * 0.5;
        let (width, height) = (drawer.width(), drawer.height());

        count_call!(crate::perf::FUNCTION_COUNTERS.fill_box_calls);
        let Some(rect) = project_box(self.view, mid, frame.xscale * 0.5, half, half, width, height)
        else {
            count_call!(crate::perf::FUNCTION_COUNTERS.fill_box_rejected_depth);
            return;
        };
        let rows = rect.bottom - rect.top;
        if rows <= 0 || rect.y1 >= rect.y2 {
            return;
        }

        let colors = &slab.colors[ztop - slab.ztop as usize..zbottom - slab.ztop as usize];
        let step = (((colors.len() as i64) << FRACBITS) / rows) as Fixed;
        for x in rect.x1..rect.x2 {
            let (top, bottom) = clip.column(x);
            let y1 = rect.y1.max(top);
            let y2 = rect.y2.min(bottom);
            if y1 < y2 {
                let skipped = y1 as i64 - rect.top;
                let frac = (step as i64 * skipped + (step / 2) as i64) as Fixed;
                drawer.draw_column(x, y1, y2 - y1, colors, frac, step);
            }
        }
    }
}

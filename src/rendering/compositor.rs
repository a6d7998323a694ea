/// Offscreen color buffer + coverage spans for styles that cannot be drawn
/// straight into the frame
///
/// Blending styles accumulate shaded colors offscreen while recording which
/// rows each column touched; the frame is then blended once per covered span.
use super::colormap::{pack_rgb, unpack_rgb};
use super::coverage::CoverageBuffer;
use super::framebuffer::Framebuffer;
use super::style::{DrawerStyle, StyleKind};

/// Fuzz darkens the destination to this many 32nds
const FUZZ_SHADE: u32 = 26;

#[inline]
fn lerp_rgb(dst: u32, src: u32, alpha: f32) -> u32 {
    let (dr, dg, db) = unpack_rgb(dst);
    let (sr, sg, sb) = unpack_rgb(src);
    let a = (alpha.clamp(0.0, 1.0) * 256.0) as u32;
    let mix = |d: u32, s: u32| (d * (256 - a) + s * a) >> 8;
    pack_rgb(mix(dr, sr), mix(dg, sg), mix(db, sb))
}

#[inline]
fn add_rgb(dst: u32, src: u32, alpha: f32) -> u32 {
    let (dr, dg, db) = unpack_rgb(dst);
    let (sr, sg, sb) = unpack_rgb(src);
    let a = (alpha.clamp(0.0, 1.0) * 256.0) as u32;
    // pack_rgb saturates each channel
    pack_rgb(dr + ((sr * a) >> 8), dg + ((sg * a) >> 8), db + ((sb * a) >> 8))
}

#[inline]
fn darken_rgb(dst: u32, shade: u32) -> u32 {
    let (r, g, b) = unpack_rgb(dst);
    pack_rgb(r * shade / 32, g * shade / 32, b * shade / 32)
}

/// Blend one offscreen sample (or the style's own color) over a frame pixel.
#[inline]
pub fn blend_pixel(style: &DrawerStyle, dst: u32, src: Option<u32>) -> Option<u32> {
    match style.kind {
        StyleKind::Translucent => src.map(|s| lerp_rgb(dst, s, style.alpha)),
        StyleKind::Add => src.map(|s| add_rgb(dst, s, style.alpha)),
        StyleKind::Fuzzy => Some(darken_rgb(dst, FUZZ_SHADE)),
        StyleKind::Stencil => Some(lerp_rgb(dst, style.fill_color, style.alpha)),
        StyleKind::Normal => src,
        StyleKind::None => None,
    }
}

/// Owns the coverage buffer and the optional offscreen color buffer.
///
/// Allocated lazily by `check`, reused across sprites and frames while the
/// viewport size is unchanged, and dropped by `release`.
#[derive(Debug, Default)]
pub struct OffscreenBuffer {
    coverage: Option<CoverageBuffer>,
    /// Column-major `0x00RRGGBB`, index `x * height + y`
    color: Option<Vec<u32>>,
    width: usize,
    height: usize,
}

impl OffscreenBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the buffers ready for a `width` x `height` viewport and clear the
    /// coverage. With `spans_only` the color buffer is not allocated.
    pub fn check(&mut self, width: usize, height: usize, spans_only: bool) {
        match &mut self.coverage {
            None => {
                debug_assert!(self.color.is_none(), "color buffer without coverage");
                self.coverage = Some(CoverageBuffer::new(width));
            }
            Some(coverage) if coverage.num_columns() != width => {
                log::debug!(
                    "offscreen coverage resized {} -> {} columns",
                    coverage.num_columns(),
                    width
                );
                *coverage = CoverageBuffer::new(width);
            }
            Some(coverage) => coverage.clear(),
        }

        // Colors are only valid at the size they were allocated for, even when
        // spans-only frames skipped them in between
        let resized = self.width != width || self.height != height;
        if resized && self.color.take().is_some() {
            log::debug!("offscreen color buffer dropped for {}x{}", width, height);
        }
        if !spans_only && self.color.is_none() {
            log::debug!("offscreen color buffer allocated {}x{}", width, height);
            self.color = Some(vec![0; width * height]);
        }

        self.width = width;
        self.height = height;
    }

    /// Free both buffers
    pub fn release(&mut self) {
        self.coverage = None;
        self.color = None;
        self.width = 0;
        self.height = 0;
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn coverage(&self) -> Option<&CoverageBuffer> {
        self.coverage.as_ref()
    }

    pub fn has_color_buffer(&self) -> bool {
        self.color.is_some()
    }

    /// Record rows `[y1, y2)` of column `x` as covered
    #[inline]
    pub fn insert_span(&mut self, x: usize, y1: usize, y2: usize) {
        if let Some(coverage) = &mut self.coverage {
            coverage.insert(x, y1, y2);
        }
    }

    /// Fill rows `[y, y + count)` of column `x` in the color buffer
    #[inline]
    pub fn fill_color(&mut self, x: usize, y: usize, count: usize, rgb: u32) {
        let height = self.height;
        if let Some(color) = &mut self.color {
            if x * height + y + count <= color.len() && y + count <= height {
                let start = x * height + y;
                color[start..start + count].fill(rgb);
            }
        }
    }

    pub fn color_at(&self, x: usize, y: usize) -> Option<u32> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.color
            .as_ref()
            .and_then(|c| c.get(x * self.height + y).copied())
    }

    /// Blend every covered span into `frame`. Returns the pixels written.
    pub fn composite(&self, frame: &mut Framebuffer, style: &DrawerStyle) -> usize {
        let Some(coverage) = &self.coverage else {
            return 0;
        };
        let columns = coverage.num_columns().min(frame.width);
        let rows = self.height.min(frame.height);
        let mut written = 0;

        for x in 0..columns {
            for span in coverage.spans(x) {
                for y in span.start..span.stop.min(rows) {
                    let Some(dst) = frame.pixel_rgb(x, y) else {
                        continue;
                    };
                    if let Some(out) = blend_pixel(style, dst, self.color_at(x, y)) {
                        frame.write_rgb(x, y, out);
                        written += 1;
                    }
                }
            }
        }
        log::trace!("composited {} pixels ({:?})", written, style.kind);
        written
    }
}

/// Framebuffer for software rendering
/// Either 1 byte per pixel (palette indices) or 4 bytes per pixel (ARGB)
///
/// Memory layout is row-major; column fills stride by `width`.
use super::colormap::Palette;
use super::fixed::{Fixed, FRACBITS};
use crate::count_add;
use crate::count_call;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    Paletted,
    TrueColor,
}

/// Sink for vertical runs produced by the voxel rasterizer.
///
/// Colors arrive as palette indices that have not been shaded yet; styled
/// drawers resolve them through the sprite's colormap.
pub trait ColumnDrawer {
    fn width(&self) -> usize;
    fn height(&self) -> usize;

    /// Fill `count` rows of column `x` starting at row `y` with one color.
    fn fill_column(&mut self, x: usize, y: usize, count: usize, color: u8);

    /// Draw `count` rows of column `x` sampling `source` at `frac`, advancing
    /// by `step` (16.16) per row.
    fn draw_column(
        &mut self,
        x: usize,
        y: usize,
        count: usize,
        source: &[u8],
        frac: Fixed,
        step: Fixed,
    ) {
        if source.is_empty() {
            return;
        }
        let last = source.len() - 1;
        let mut frac = frac;
        for row in y..y + count {
            let index = ((frac.max(0) >> FRACBITS) as usize).min(last);
            self.fill_column(x, row, 1, source[index]);
            frac = frac.wrapping_add(step);
        }
    }
}

pub struct Framebuffer {
    // Hot data: used for every bounds check and index calculation
    pub width: usize,
    pub height: usize,
    pub format: PixelFormat,
    palette: Arc<Palette>,
    // Only the buffer matching `format` is allocated
    indexed: Vec<u8>,
    color_buffer: Vec<u32>, // ARGB format
}

impl Framebuffer {
    pub fn new(width: usize, height: usize, format: PixelFormat, palette: Arc<Palette>) -> Self {
        let mut fb = Self {
            width,
            height,
            format,
            palette,
            indexed: Vec::new(),
            color_buffer: Vec::new(),
        };
        fb.allocate();
        fb
    }

    fn allocate(&mut self) {
        let pixel_count = self.width * self.height;
        match self.format {
            PixelFormat::Paletted => {
                self.indexed = vec![0; pixel_count];
                self.color_buffer = Vec::new();
            }
            PixelFormat::TrueColor => {
                self.indexed = Vec::new();
                self.color_buffer = vec![0xFF00_0000; pixel_count];
            }
        }
    }

    pub fn palette(&self) -> &Arc<Palette> {
        &self.palette
    }

    /// Clear every pixel to a palette color
    pub fn clear(&mut self, index: u8) {
        match self.format {
            PixelFormat::Paletted => self.indexed.fill(index),
            PixelFormat::TrueColor => self
                .color_buffer
                .fill(0xFF00_0000 | self.palette.rgb(index)),
        }
    }

    /// Resize framebuffer; contents are discarded
    pub fn resize(&mut self, width: usize, height: usize) {
        self.width = width;
        self.height = height;
        self.allocate();
    }

    #[inline]
    fn index(&self, x: usize, y: usize) -> Option<usize> {
        (x < self.width && y < self.height).then(|| y * self.width + x)
    }

    /// Palette index at a pixel (exact best match for true-color targets)
    pub fn pixel_index(&self, x: usize, y: usize) -> Option<u8> {
        let i = self.index(x, y)?;
        Some(match self.format {
            PixelFormat::Paletted => self.indexed[i],
            PixelFormat::TrueColor => self.palette.best_match(self.color_buffer[i]),
        })
    }

    /// Packed `0x00RRGGBB` at a pixel
    pub fn pixel_rgb(&self, x: usize, y: usize) -> Option<u32> {
        let i = self.index(x, y)?;
        Some(match self.format {
            PixelFormat::Paletted => self.palette.rgb(self.indexed[i]),
            PixelFormat::TrueColor => self.color_buffer[i] & 0x00FF_FFFF,
        })
    }

    /// Write a packed RGB color; paletted targets store the closest index
    #[inline]
    pub fn write_rgb(&mut self, x: usize, y: usize, rgb: u32) {
        if let Some(i) = self.index(x, y) {
            match self.format {
                PixelFormat::Paletted => self.indexed[i] = self.palette.lookup(rgb),
                PixelFormat::TrueColor => self.color_buffer[i] = 0xFF00_0000 | (rgb & 0x00FF_FFFF),
            }
        }
    }

    /// Copy the frame into an ARGB presentation buffer of the same size.
    pub fn copy_to_argb(&self, out: &mut [u32]) {
        match self.format {
            PixelFormat::Paletted => {
                for (dst, &index) in out.iter_mut().zip(&self.indexed) {
                    *dst = 0xFF00_0000 | self.palette.rgb(index);
                }
            }
            PixelFormat::TrueColor => {
                let n = out.len().min(self.color_buffer.len());
                out[..n].copy_from_slice(&self.color_buffer[..n]);
            }
        }
    }
}

impl ColumnDrawer for Framebuffer {
    #[inline]
    fn width(&self) -> usize {
        self.width
    }

    #[inline]
    fn height(&self) -> usize {
        self.height
    }

    fn fill_column(&mut self, x: usize, y: usize, count: usize, color: u8) {
        count_call!(crate::perf::FUNCTION_COUNTERS.column_fills);
        if x >= self.width || y >= self.height {
            return;
        }
        let count = count.min(self.height - y);
        count_add!(crate::perf::FUNCTION_COUNTERS.pixels_filled, count);
        let start = y * self.width + x;
        match self.format {
            PixelFormat::Paletted => {
                for px in self.indexed[start..].iter_mut().step_by(self.width).take(count) {
                    *px = color;
                }
            }
            PixelFormat::TrueColor => {
                let argb = 0xFF00_0000 | self.palette.rgb(color);
                for px in self.color_buffer[start..]
                    .iter_mut()
                    .step_by(self.width)
                    .take(count)
                {
                    *px = argb;
                }
            }
        }
    }
}

/// Palette, shaded colormaps and the colormap lookup service
///
/// Colors are packed `0x00RRGGBB`; framebuffer ARGB values add `0xFF000000`.
use super::light::NUM_COLORMAPS;
use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::Arc;

pub const PALETTE_SIZE: usize = 256;

const RGB32K_SIZE: usize = 32 * 32 * 32;

#[inline]
const fn clamp8(v: u32) -> u32 {
    if v > 255 {
        255
    } else {
        v
    }
}

#[inline]
pub const fn pack_rgb(r: u32, g: u32, b: u32) -> u32 {
    (clamp8(r) << 16) | (clamp8(g) << 8) | clamp8(b)
}

#[inline]
pub const fn unpack_rgb(color: u32) -> (u32, u32, u32) {
    ((color >> 16) & 0xFF, (color >> 8) & 0xFF, color & 0xFF)
}

/// Inverse of a fade color, used when a render style inverts the colormap
#[inline]
pub const fn inverse_color(color: u32) -> u32 {
    !color & 0x00FF_FFFF
}

/// A 256-entry palette with a 15-bit RGB best-match cache.
#[derive(Clone)]
pub struct Palette {
    colors: [u32; PALETTE_SIZE],
    rgb32k: Box<[u8]>,
}

impl std::fmt::Debug for Palette {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Palette").field("colors", &self.colors.len()).finish()
    }
}

impl Palette {
    pub fn new(colors: [u32; PALETTE_SIZE]) -> Self {
        let mut palette = Self {
            colors: colors.map(|c| c & 0x00FF_FFFF),
            rgb32k: vec![0u8; RGB32K_SIZE].into_boxed_slice(),
        };
        for r in 0..32u32 {
            for g in 0..32u32 {
                for b in 0..32u32 {
                    let target = pack_rgb(r << 3 | r >> 2, g << 3 | g >> 2, b << 3 | b >> 2);
                    palette.rgb32k[((r << 10) | (g << 5) | b) as usize] =
                        palette.best_match(target);
                }
            }
        }
        palette
    }

    /// A grayscale ramp, handy for tests and tools
    pub fn grayscale() -> Self {
        let mut colors = [0u32; PALETTE_SIZE];
        for (i, c) in colors.iter_mut().enumerate() {
            *c = pack_rgb(i as u32, i as u32, i as u32);
        }
        Self::new(colors)
    }

    #[inline]
    pub fn rgb(&self, index: u8) -> u32 {
        self.colors[index as usize]
    }

    pub fn colors(&self) -> &[u32; PALETTE_SIZE] {
        &self.colors
    }

    /// Exhaustive nearest color by squared RGB distance
    pub fn best_match(&self, color: u32) -> u8 {
        let (r, g, b) = unpack_rgb(color);
        let mut best = 0usize;
        let mut best_dist = i64::MAX;
        for (i, &c) in self.colors.iter().enumerate() {
            let (pr, pg, pb) = unpack_rgb(c);
            let dr = pr as i64 - r as i64;
            let dg = pg as i64 - g as i64;
            let db = pb as i64 - b as i64;
            let dist = dr * dr + dg * dg + db * db;
            if dist < best_dist {
                best_dist = dist;
                best = i;
                if dist == 0 {
                    break;
                }
            }
        }
        best as u8
    }

    /// Fast nearest color through the 15-bit cache
    #[inline]
    pub fn lookup(&self, color: u32) -> u8 {
        let (r, g, b) = unpack_rgb(color);
        self.rgb32k[(((r >> 3) << 10) | ((g >> 3) << 5) | (b >> 3)) as usize]
    }
}

/// A sector colormap: light tint, fade color, desaturation and the
/// `NUM_COLORMAPS` shade rows built from them.
#[derive(Debug, Clone)]
pub struct DynamicColormap {
    pub color: u32,
    pub fade: u32,
    pub desaturate: u8,
    maps: Box<[u8]>,
}

impl DynamicColormap {
    /// Returns None when `maps` is not `NUM_COLORMAPS` rows of 256 entries.
    pub fn from_maps(color: u32, fade: u32, desaturate: u8, maps: Vec<u8>) -> Option<Self> {
        if maps.len() != NUM_COLORMAPS * PALETTE_SIZE {
            return None;
        }
        Some(Self {
            color,
            fade,
            desaturate,
            maps: maps.into_boxed_slice(),
        })
    }

    /// Every row maps each index to itself: no shading at all
    pub fn identity() -> Self {
        let row: Vec<u8> = (0..PALETTE_SIZE).map(|i| i as u8).collect();
        Self {
            color: 0x00FF_FFFF,
            fade: 0,
            desaturate: 0,
            maps: row.repeat(NUM_COLORMAPS).into_boxed_slice(),
        }
    }

    /// Shade row `level`, clamped to the darkest row
    #[inline]
    pub fn row(&self, level: usize) -> &[u8] {
        let level = level.min(NUM_COLORMAPS - 1);
        &self.maps[level * PALETTE_SIZE..(level + 1) * PALETTE_SIZE]
    }

    #[inline]
    pub fn is_faded(&self) -> bool {
        self.fade & 0x00FF_FFFF != 0
    }
}

/// Resolves (light color, fade color, desaturation) to a concrete colormap.
pub trait ColormapSource {
    fn special_lights(&self, color: u32, fade: u32, desaturate: u8) -> Arc<DynamicColormap>;
}

/// Builds shade ramps against a palette on demand and memoises them.
pub struct ColormapCache {
    palette: Arc<Palette>,
    cache: RefCell<HashMap<(u32, u32, u8), Arc<DynamicColormap>>>,
}

impl ColormapCache {
    pub fn new(palette: Arc<Palette>) -> Self {
        Self {
            palette,
            cache: RefCell::new(HashMap::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.cache.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.borrow().is_empty()
    }

    fn build(&self, color: u32, fade: u32, desaturate: u8) -> DynamicColormap {
        let (lr, lg, lb) = unpack_rgb(color);
        let (fr, fg, fb) = unpack_rgb(fade);
        let desat = desaturate as u32;
        let mut maps = vec![0u8; NUM_COLORMAPS * PALETTE_SIZE];

        for (index, &base) in self.palette.colors().iter().enumerate() {
            let (mut r, mut g, mut b) = unpack_rgb(base);
            if desat > 0 {
                let gray = (r * 77 + g * 143 + b * 37) >> 8;
                r = (r * (255 - desat) + gray * desat) / 255;
                g = (g * (255 - desat) + gray * desat) / 255;
                b = (b * (255 - desat) + gray * desat) / 255;
            }
            r = r * lr / 255;
            g = g * lg / 255;
            b = b * lb / 255;

            let n = NUM_COLORMAPS as u32;
            for level in 0..NUM_COLORMAPS {
                let l = level as u32;
                let shaded = pack_rgb(
                    (r * (n - l) + fr * l) / n,
                    (g * (n - l) + fg * l) / n,
                    (b * (n - l) + fb * l) / n,
                );
                maps[level * PALETTE_SIZE + index] = self.palette.lookup(shaded);
            }
        }

        DynamicColormap {
            color,
            fade,
            desaturate,
            maps: maps.into_boxed_slice(),
        }
    }
}

impl ColormapSource for ColormapCache {
    fn special_lights(&self, color: u32, fade: u32, desaturate: u8) -> Arc<DynamicColormap> {
        let key = (color & 0x00FF_FFFF, fade & 0x00FF_FFFF, desaturate);
        if let Some(map) = self.cache.borrow().get(&key) {
            return Arc::clone(map);
        }
        let map = Arc::new(self.build(key.0, key.1, key.2));
        log::debug!(
            "built colormap light={:06x} fade={:06x} desat={}",
            key.0,
            key.1,
            key.2
        );
        self.cache.borrow_mut().insert(key, Arc::clone(&map));
        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grayscale_lookup_finds_nearest_gray() {
        let palette = Palette::grayscale();
        assert_eq!(palette.best_match(pack_rgb(100, 100, 100)), 100);
        let cached = palette.lookup(pack_rgb(100, 100, 100));
        assert!((cached as i32 - 100).abs() <= 8);
    }

    #[test]
    fn identity_rows_are_identity() {
        let map = DynamicColormap::identity();
        assert_eq!(map.row(0)[17], 17);
        assert_eq!(map.row(NUM_COLORMAPS + 5)[200], 200);
    }

    #[test]
    fn white_light_fades_toward_black() {
        let cache = ColormapCache::new(Arc::new(Palette::grayscale()));
        let map = cache.special_lights(0xFFFFFF, 0, 0);
        assert!(map.row(0)[255] > 240);
        assert!(map.row(NUM_COLORMAPS - 1)[255] < 16);
        assert!(map.row(16)[255] < map.row(0)[255]);
    }

    #[test]
    fn fade_to_white_brightens_dark_rows() {
        let cache = ColormapCache::new(Arc::new(Palette::grayscale()));
        let map = cache.special_lights(0xFFFFFF, 0xFFFFFF, 0);
        assert!(map.row(NUM_COLORMAPS - 1)[0] > 200);
    }

    #[test]
    fn cache_reuses_built_maps() {
        let cache = ColormapCache::new(Arc::new(Palette::grayscale()));
        let a = cache.special_lights(0xFFFFFF, 0, 0);
        let b = cache.special_lights(0xFFFFFF, 0, 0);
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn inverse_of_black_is_white() {
        assert_eq!(inverse_color(0), 0xFFFFFF);
        assert!(!DynamicColormap::identity().is_faded());
    }
}

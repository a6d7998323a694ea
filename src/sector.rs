/// Sector data the projector needs: planes, special height sectors and
/// the viewer's side of a fake floor/ceiling
use crate::rendering::colormap::DynamicColormap;
use glam::{DVec2, DVec3};
use std::sync::Arc;

/// Plane `a*x + b*y + c*z + d = 0` with a non-vertical normal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SecPlane {
    pub normal: DVec3,
    pub d: f64,
    neg_inv_c: f64,
}

impl SecPlane {
    pub fn new(normal: DVec3, d: f64) -> Self {
        Self {
            normal,
            d,
            neg_inv_c: -1.0 / normal.z,
        }
    }

    /// A flat plane at height `z` (normal pointing up)
    pub fn flat(z: f64) -> Self {
        Self::new(DVec3::Z, -z)
    }

    /// Height of the plane above the given map point
    #[inline]
    pub fn z_at_point(&self, pos: DVec2) -> f64 {
        (self.d + self.normal.x * pos.x + self.normal.y * pos.y) * self.neg_inv_c
    }
}

/// A height-affecting control sector (deep water, fake ceilings).
#[derive(Debug, Clone, PartialEq)]
pub struct HeightSector {
    pub floor_plane: SecPlane,
    pub ceiling_plane: SecPlane,
    /// Only the fake floor splits the world; the ceiling plane is ignored
    pub fake_floor_only: bool,
}

/// Which side of a height sector's planes the viewer is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WaterFakeSide {
    #[default]
    Center,
    BelowFloor,
    AboveCeiling,
}

#[derive(Debug, Clone)]
pub struct Sector {
    pub index: usize,
    pub height_sec: Option<Arc<HeightSector>>,
    pub colormap: Arc<DynamicColormap>,
}

impl Sector {
    pub fn new(index: usize, colormap: Arc<DynamicColormap>) -> Self {
        Self {
            index,
            height_sec: None,
            colormap,
        }
    }

    pub fn with_height_sec(mut self, height_sec: HeightSector) -> Self {
        self.height_sec = Some(Arc::new(height_sec));
        self
    }
}

/// True when a sprite spanning `[gzb, gzt]` at `pos` is cut off from the
/// viewer by the height sector's planes.
pub fn separated_by_height_sector(
    height_sec: &HeightSector,
    side: WaterFakeSide,
    pos: DVec2,
    gzt: f64,
    gzb: f64,
) -> bool {
    match side {
        WaterFakeSide::AboveCeiling => gzt < height_sec.ceiling_plane.z_at_point(pos),
        WaterFakeSide::BelowFloor => gzb >= height_sec.floor_plane.z_at_point(pos),
        WaterFakeSide::Center => {
            gzt < height_sec.floor_plane.z_at_point(pos)
                || (!height_sec.fake_floor_only
                    && gzb >= height_sec.ceiling_plane.z_at_point(pos))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn water() -> HeightSector {
        HeightSector {
            floor_plane: SecPlane::flat(0.0),
            ceiling_plane: SecPlane::flat(128.0),
            fake_floor_only: false,
        }
    }

    #[test]
    fn flat_plane_height_is_constant() {
        let plane = SecPlane::flat(32.0);
        assert!((plane.z_at_point(DVec2::new(100.0, -40.0)) - 32.0).abs() < 1e-9);
    }

    #[test]
    fn sloped_plane_rises_along_normal() {
        let plane = SecPlane::new(DVec3::new(-0.5, 0.0, 1.0).normalize(), 0.0);
        let low = plane.z_at_point(DVec2::new(0.0, 0.0));
        let high = plane.z_at_point(DVec2::new(10.0, 0.0));
        assert!(high > low);
    }

    #[test]
    fn viewer_above_ceiling_cannot_see_below_it() {
        let sec = water();
        let pos = DVec2::ZERO;
        assert!(separated_by_height_sector(&sec, WaterFakeSide::AboveCeiling, pos, 100.0, 50.0));
        assert!(!separated_by_height_sector(&sec, WaterFakeSide::AboveCeiling, pos, 140.0, 50.0));
    }

    #[test]
    fn viewer_below_floor_cannot_see_above_it() {
        let sec = water();
        let pos = DVec2::ZERO;
        assert!(separated_by_height_sector(&sec, WaterFakeSide::BelowFloor, pos, 40.0, 0.0));
        assert!(!separated_by_height_sector(&sec, WaterFakeSide::BelowFloor, pos, 40.0, -8.0));
    }

    #[test]
    fn viewer_in_between_respects_fake_floor_only() {
        let mut sec = water();
        let pos = DVec2::ZERO;
        assert!(separated_by_height_sector(&sec, WaterFakeSide::Center, pos, -4.0, -20.0));
        assert!(separated_by_height_sector(&sec, WaterFakeSide::Center, pos, 200.0, 130.0));
        sec.fake_floor_only = true;
        assert!(!separated_by_height_sector(&sec, WaterFakeSide::Center, pos, 200.0, 130.0));
    }
}

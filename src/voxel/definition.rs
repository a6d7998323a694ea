/// Per-definition voxel parameters: scale, spin and facing offset
use super::model::VoxelModel;
use std::sync::Arc;

#[derive(Clone, Debug)]
pub struct VoxelDef {
    pub model: Arc<VoxelModel>,
    /// Multiplies the actor's sprite scale
    pub scale: f64,
    /// Degrees per second for instances placed in the map
    pub placed_spin: i32,
    /// Degrees per second for instances dropped at runtime
    pub dropped_spin: i32,
    /// Added to the actor's yaw, in degrees
    pub angle_offset: f64,
}

impl VoxelDef {
    pub fn new(model: Arc<VoxelModel>) -> Self {
        Self {
            model,
            scale: 1.0,
            placed_spin: 0,
            dropped_spin: 0,
            angle_offset: 0.0,
        }
    }

    pub fn with_scale(mut self, scale: f64) -> Self {
        self.scale = scale;
        self
    }

    pub fn with_spin(mut self, placed: i32, dropped: i32) -> Self {
        self.placed_spin = placed;
        self.dropped_spin = dropped;
        self
    }

    pub fn with_angle_offset(mut self, degrees: f64) -> Self {
        self.angle_offset = degrees;
        self
    }

    /// Spin rate for an instance, selected by whether it was dropped.
    #[inline]
    pub fn spin(&self, dropped: bool) -> i32 {
        if dropped {
            self.dropped_spin
        } else {
            self.placed_spin
        }
    }
}

/// Per-frame view state shared read-only by the projector and rasterizer
/// Doom-style: yaw-only view angle, Z up, pitch expressed as a center-Y shift
use glam::DVec3;

/// Smallest view-space depth at which a sprite is still scaled
pub const MINZ: f64 = (2048.0 * 4.0) / (1u32 << 20) as f64;

#[derive(Debug, Clone)]
pub struct ViewContext {
    pub position: DVec3,
    /// View yaw in degrees, 0 looks along +X
    pub angle: f64,
    pub sin: f64,
    pub cos: f64,
    /// tan(fov / 2)
    pub focal_tangent: f64,
    pub tan_sin: f64,
    pub tan_cos: f64,

    pub view_width: usize,
    pub view_height: usize,
    pub center_x: f64,
    pub center_y: f64,
    /// Pixels per unit of depth-normalized side distance
    pub focal_length_x: f64,
    /// Vertical pixel aspect correction
    pub yaspect_mul: f64,
    pub inv_z_to_scale: f64,

    /// Rendering through a mirror flips the side axis
    pub mirrored: bool,
    /// Portal window clipping bounds recorded on each sprite
    pub window_left: i32,
    pub window_right: i32,
    /// Real-time clock used for voxel spin, in milliseconds
    pub time_ms: u64,
}

impl ViewContext {
    pub fn new(
        position: DVec3,
        angle_degrees: f64,
        view_width: usize,
        view_height: usize,
        fov_degrees: f64,
        yaspect_mul: f64,
    ) -> Self {
        let center_x = view_width as f64 * 0.5;
        let focal_tangent = (fov_degrees.to_radians() * 0.5).tan();
        let mut view = Self {
            position,
            angle: 0.0,
            sin: 0.0,
            cos: 1.0,
            focal_tangent,
            tan_sin: 0.0,
            tan_cos: focal_tangent,
            view_width,
            view_height,
            center_x,
            center_y: view_height as f64 * 0.5,
            focal_length_x: center_x / focal_tangent,
            yaspect_mul,
            inv_z_to_scale: yaspect_mul * center_x,
            mirrored: false,
            window_left: 0,
            window_right: view_width as i32,
            time_ms: 0,
        };
        view.set_angle(angle_degrees);
        view
    }

    pub fn with_time(mut self, time_ms: u64) -> Self {
        self.time_ms = time_ms;
        self
    }

    pub fn with_mirror(mut self, mirrored: bool) -> Self {
        self.mirrored = mirrored;
        self
    }

    pub fn set_angle(&mut self, angle_degrees: f64) {
        self.angle = angle_degrees.rem_euclid(360.0);
        let (sin, cos) = self.angle.to_radians().sin_cos();
        self.sin = sin;
        self.cos = cos;
        self.tan_sin = self.focal_tangent * sin;
        self.tan_cos = self.focal_tangent * cos;
    }

    /// Transform a world point into view space: (side, up, depth * focal_tangent).
    #[inline]
    pub fn to_view_space(&self, world: DVec3) -> DVec3 {
        let tr = world - self.position;
        let side = tr.x * self.sin - tr.y * self.cos;
        let depth = tr.x * self.tan_cos + tr.y * self.tan_sin;
        DVec3::new(if self.mirrored { -side } else { side }, tr.z, depth)
    }

    /// Project a view-space point to fractional screen coordinates.
    #[inline]
    pub fn project(&self, view: DVec3) -> (f64, f64) {
        (
            self.center_x + view.x / view.z * self.center_x,
            self.center_y - view.y / view.z * self.inv_z_to_scale,
        )
    }

    /// Move in the horizontal plane relative to the view angle
    pub fn move_local(&mut self, forward: f64, right: f64, up: f64) {
        self.position.x += self.cos * forward + self.sin * right;
        self.position.y += self.sin * forward - self.cos * right;
        self.position.z += up;
    }

    pub fn resize(&mut self, view_width: usize, view_height: usize, fov_degrees: f64) {
        let mut resized = Self::new(
            self.position,
            self.angle,
            view_width,
            view_height,
            fov_degrees,
            self.yaspect_mul,
        );
        resized.mirrored = self.mirrored;
        resized.time_ms = self.time_ms;
        *self = resized;
    }
}

/// Camera controller - handles input state
#[derive(Debug, Default)]
pub struct CameraController {
    pub forward_pressed: bool,
    pub backward_pressed: bool,
    pub left_pressed: bool,
    pub right_pressed: bool,
    pub up_pressed: bool,
    pub down_pressed: bool,
    pub turn_left_pressed: bool,
    pub turn_right_pressed: bool,
    pub move_speed: f64,
    pub turn_speed: f64,
}

impl CameraController {
    pub fn new() -> Self {
        Self {
            move_speed: 96.0,
            turn_speed: 120.0,
            ..Default::default()
        }
    }

    /// Update the view based on controller state
    pub fn update_view(&self, view: &mut ViewContext, dt: f64) {
        let axis = |pos: bool, neg: bool| (pos as i32 - neg as i32) as f64;

        let turn = axis(self.turn_left_pressed, self.turn_right_pressed);
        if turn != 0.0 {
            view.set_angle(view.angle + turn * self.turn_speed * dt);
        }

        let step = self.move_speed * dt;
        view.move_local(
            axis(self.forward_pressed, self.backward_pressed) * step,
            axis(self.right_pressed, self.left_pressed) * step,
            axis(self.up_pressed, self.down_pressed) * step,
        );
    }
}

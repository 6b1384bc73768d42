use eframe::egui::{Pos2, Rect, Vec2};
use glam::{Mat4, Vec3};

const NEAR_PLANE: f32 = 0.1;
const MIN_DISTANCE: f32 = 5.0;
const MAX_DISTANCE: f32 = 50.0;
const PITCH_LIMIT: f32 = 1.5;

/// Perspective camera orbiting a target point.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(in crate::app) struct OrbitCamera {
    pub yaw: f32,
    pub pitch: f32,
    pub distance: f32,
    pub target: Vec3,
    pub fov_y: f32,
}

impl Default for OrbitCamera {
    /// Looks at the origin from `(10, 10, 10)`.
    fn default() -> Self {
        let eye = Vec3::splat(10.0);
        Self {
            yaw: eye.x.atan2(eye.z),
            pitch: (eye.y / eye.length()).asin(),
            distance: eye.length(),
            target: Vec3::ZERO,
            fov_y: 50f32.to_radians(),
        }
    }
}

pub(in crate::app) struct Projected {
    pub position: Pos2,
    pub depth: f32,
    /// Screen pixels per world unit at this depth.
    pub scale: f32,
}

impl OrbitCamera {
    pub fn eye(&self) -> Vec3 {
        let (sin_yaw, cos_yaw) = self.yaw.sin_cos();
        let (sin_pitch, cos_pitch) = self.pitch.sin_cos();
        self.target
            + Vec3::new(cos_pitch * sin_yaw, sin_pitch, cos_pitch * cos_yaw) * self.distance
    }

    fn view(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye(), self.target, Vec3::Y)
    }

    /// Maps a world point into `rect`. `None` when the point is behind the
    /// near plane.
    pub fn project(&self, rect: Rect, world: Vec3) -> Option<Projected> {
        let view = self.view().transform_point3(world);
        let depth = -view.z;
        if !depth.is_finite() || depth < NEAR_PLANE {
            return None;
        }

        let focal = (rect.height() * 0.5) / (self.fov_y * 0.5).tan();
        let scale = focal / depth;
        let position = rect.center() + Vec2::new(view.x * scale, -view.y * scale);
        Some(Projected {
            position,
            depth,
            scale,
        })
    }

    pub fn orbit(&mut self, drag: Vec2) {
        self.yaw -= drag.x * 0.008;
        self.pitch = (self.pitch + drag.y * 0.008).clamp(-PITCH_LIMIT, PITCH_LIMIT);
    }

    pub fn zoom(&mut self, scroll: f32) {
        let factor = (1.0 - scroll * 0.0018).clamp(0.85, 1.15);
        self.distance = (self.distance * factor).clamp(MIN_DISTANCE, MAX_DISTANCE);
    }

    /// Shifts the target in the camera plane.
    pub fn pan(&mut self, drag: Vec2, rect: Rect) {
        let forward = (self.target - self.eye()).normalize_or_zero();
        let right = forward.cross(Vec3::Y).normalize_or_zero();
        let up = right.cross(forward);
        let units_per_pixel =
            2.0 * self.distance * (self.fov_y * 0.5).tan() / rect.height().max(1.0);
        self.target += (-right * drag.x + up * drag.y) * units_per_pixel;
    }

    pub fn focus(&mut self, point: Vec3) {
        if point.is_finite() {
            self.target = point;
        }
    }
}

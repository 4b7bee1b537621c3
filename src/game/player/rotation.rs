//! Camera look and body yaw reconciliation.
//!
//! Angles are degrees. Yaw 0 faces +Z and grows toward +X, pitch grows
//! downward, so `forward = (sin yaw · cos pitch, -sin pitch, cos yaw · cos pitch)`.
//!
//! While the player moves, the body continuously turns toward the camera
//! yaw. While idling it stays put until the camera swings more than the
//! rotation tolerance away; that opens a timed window during which the body
//! turns back, but only while the mismatch keeps the sign that opened it.

use nalgebra::{UnitQuaternion, Vector2, Vector3};

use crate::config::CameraConfig;

/// Wraps an angle into (-180, 180].
pub fn wrap_degrees(angle: f32) -> f32 {
    let a = angle.rem_euclid(360.0);
    if a > 180.0 {
        a - 360.0
    } else {
        a
    }
}

fn yaw_rotation(yaw: f32) -> UnitQuaternion<f32> {
    UnitQuaternion::from_axis_angle(&Vector3::y_axis(), yaw.to_radians())
}

#[derive(Debug, Clone)]
pub struct LookRig {
    camera_yaw: f32,
    camera_pitch: f32,
    /// Yaw the body turns toward; accumulates with horizontal look
    target_yaw: f32,
    body_yaw: f32,
    rotation_mismatch: f32,
    rotating_to_target_timer: f32,
    is_rotating_clockwise: bool,
    is_rotating_to_target: bool,
}

impl Default for LookRig {
    fn default() -> Self {
        Self::new(0.0)
    }
}

impl LookRig {
    /// Rig with camera and body both facing `yaw`.
    pub fn new(yaw: f32) -> Self {
        Self {
            camera_yaw: yaw,
            camera_pitch: 0.0,
            target_yaw: yaw,
            body_yaw: yaw,
            rotation_mismatch: 0.0,
            rotating_to_target_timer: 0.0,
            is_rotating_clockwise: false,
            is_rotating_to_target: false,
        }
    }

    pub fn camera_yaw(&self) -> f32 {
        self.camera_yaw
    }

    pub fn camera_pitch(&self) -> f32 {
        self.camera_pitch
    }

    pub fn body_yaw(&self) -> f32 {
        self.body_yaw
    }

    /// Signed body-to-camera yaw difference from the last late update.
    /// Positive when the camera is clockwise of the body.
    pub fn rotation_mismatch(&self) -> f32 {
        self.rotation_mismatch
    }

    pub fn is_rotating_to_target(&self) -> bool {
        self.is_rotating_to_target
    }

    pub fn camera_rotation(&self) -> UnitQuaternion<f32> {
        yaw_rotation(self.camera_yaw)
            * UnitQuaternion::from_axis_angle(&Vector3::x_axis(), self.camera_pitch.to_radians())
    }

    pub fn body_rotation(&self) -> UnitQuaternion<f32> {
        yaw_rotation(self.body_yaw)
    }

    pub fn body_forward(&self) -> Vector3<f32> {
        self.body_rotation() * Vector3::z()
    }

    /// Camera forward flattened onto the ground plane.
    pub fn camera_forward_xz(&self) -> Vector3<f32> {
        flatten(self.camera_rotation() * Vector3::z())
    }

    /// Camera right flattened onto the ground plane.
    pub fn camera_right_xz(&self) -> Vector3<f32> {
        flatten(self.camera_rotation() * Vector3::x())
    }

    /// Late-tick update: apply look, reconcile body yaw, recompute mismatch.
    pub fn update(&mut self, look: Vector2<f32>, idling: bool, config: &CameraConfig, dt: f32) {
        self.camera_yaw += config.look_sense_h * look.x;
        self.camera_pitch = (self.camera_pitch - config.look_sense_v * look.y)
            .clamp(-config.look_limit_v, config.look_limit_v);
        self.target_yaw += config.look_sense_h * look.x;

        let tolerance = config.rotation_tolerance;
        self.is_rotating_to_target = self.rotating_to_target_timer > 0.0;

        if !idling {
            self.rotate_body_to_target(config.player_model_rotation_speed, dt);
        } else if self.rotation_mismatch.abs() > tolerance || self.is_rotating_to_target {
            self.update_idle_rotation(tolerance, config, dt);
        }

        self.rotation_mismatch = wrap_degrees(self.camera_yaw - self.body_yaw);
    }

    fn update_idle_rotation(&mut self, tolerance: f32, config: &CameraConfig, dt: f32) {
        // A fresh excursion past the tolerance (re)opens the window
        if self.rotation_mismatch.abs() > tolerance {
            self.rotating_to_target_timer = config.rotate_to_target_time;
            self.is_rotating_clockwise = self.rotation_mismatch > tolerance;
        }
        self.rotating_to_target_timer -= dt;

        if (self.is_rotating_clockwise && self.rotation_mismatch > 0.0)
            || (!self.is_rotating_clockwise && self.rotation_mismatch < 0.0)
        {
            self.rotate_body_to_target(config.player_model_rotation_speed, dt);
        }
    }

    fn rotate_body_to_target(&mut self, speed: f32, dt: f32) {
        let t = (speed * dt).clamp(0.0, 1.0);
        self.body_yaw += wrap_degrees(self.target_yaw - self.body_yaw) * t;
    }

    /// Turns the body toward a world-space direction on the horizontal plane.
    /// Camera yaw and the body's target yaw are left alone, so the body turns
    /// back toward the camera once locomotion resumes.
    pub fn face_towards(&mut self, direction: Vector3<f32>, speed: f32, dt: f32) {
        let flat = Vector3::new(direction.x, 0.0, direction.z);
        if flat.norm_squared() < f32::EPSILON {
            return;
        }
        let desired = flat.x.atan2(flat.z).to_degrees();
        let t = (speed * dt).clamp(0.0, 1.0);
        self.body_yaw += wrap_degrees(desired - self.body_yaw) * t;
        self.rotation_mismatch = wrap_degrees(self.camera_yaw - self.body_yaw);
    }
}

fn flatten(v: Vector3<f32>) -> Vector3<f32> {
    let flat = Vector3::new(v.x, 0.0, v.z);
    flat.try_normalize(f32::EPSILON).unwrap_or_else(Vector3::zeros)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> CameraConfig {
        CameraConfig::default()
    }

    #[test]
    fn test_wrap_degrees() {
        assert_eq!(wrap_degrees(190.0), -170.0);
        assert_eq!(wrap_degrees(-190.0), 170.0);
        assert_eq!(wrap_degrees(180.0), 180.0);
        assert_eq!(wrap_degrees(720.0), 0.0);
    }

    #[test]
    fn test_camera_axes_follow_yaw() {
        let rig = LookRig::new(90.0);
        let f = rig.camera_forward_xz();
        let r = rig.camera_right_xz();
        assert!((f - Vector3::new(1.0, 0.0, 0.0)).norm() < 1e-5);
        assert!((r - Vector3::new(0.0, 0.0, -1.0)).norm() < 1e-5);
    }

    #[test]
    fn test_pitch_is_clamped_and_yaw_unbounded() {
        let cfg = config();
        let mut rig = LookRig::default();
        for _ in 0..100 {
            rig.update(Vector2::new(100.0, -100.0), false, &cfg, 1.0 / 60.0);
        }
        assert_eq!(rig.camera_pitch(), cfg.look_limit_v);
        assert!((rig.camera_yaw() - 1000.0).abs() < 1e-2);
        // Flattened forward stays unit length even when looking steeply down
        assert!((rig.camera_forward_xz().norm() - 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_idle_body_holds_within_tolerance() {
        let cfg = config();
        let mut rig = LookRig::default();
        // 60 degrees of look-away: body should not move
        rig.update(Vector2::new(600.0, 0.0), true, &cfg, 1.0 / 60.0);
        for _ in 0..60 {
            rig.update(Vector2::zeros(), true, &cfg, 1.0 / 60.0);
        }
        assert_eq!(rig.body_yaw(), 0.0);
        assert!((rig.rotation_mismatch() - 60.0).abs() < 1e-3);
        assert!(!rig.is_rotating_to_target());
    }

    #[test]
    fn test_moving_body_tracks_camera() {
        let cfg = config();
        let mut rig = LookRig::default();
        rig.update(Vector2::new(300.0, 0.0), false, &cfg, 1.0 / 60.0);
        for _ in 0..120 {
            rig.update(Vector2::zeros(), false, &cfg, 1.0 / 60.0);
        }
        assert!((rig.body_yaw() - 30.0).abs() < 0.1);
    }

    #[test]
    fn test_face_towards_turns_body_only() {
        let mut rig = LookRig::default();
        for _ in 0..200 {
            rig.face_towards(Vector3::new(-1.0, 0.5, 0.0), 5.0, 1.0 / 60.0);
        }
        assert!((rig.body_yaw() + 90.0).abs() < 0.1);
        assert_eq!(rig.camera_yaw(), 0.0);
        assert!((rig.rotation_mismatch() - 90.0).abs() < 0.1);

        // Moving again swings the body back to the untouched camera yaw
        let cfg = config();
        for _ in 0..200 {
            rig.update(Vector2::zeros(), false, &cfg, 1.0 / 60.0);
        }
        assert!(rig.body_yaw().abs() < 0.1, "body yaw {}", rig.body_yaw());
    }
}

use nalgebra::{Unit, Vector3};

use crate::game::constants::character as character_consts;

/// Capsule dimensions of a character body.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CapsuleShape {
    pub radius: f32,
    /// Total height including both hemispheres
    pub height: f32,
    pub step_offset: f32,
    /// Steepest walkable slope in degrees
    pub slope_limit: f32,
}

/// Surface reported by a shape cast.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceHit {
    pub normal: Unit<Vector3<f32>>,
    pub distance: f32,
}

/// Physics/motion integrator the locomotion core drives.
///
/// Positions are the capsule centre. Queries only see ground geometry,
/// never trigger volumes or the character itself.
pub trait CharacterMotor {
    fn position(&self) -> Vector3<f32>;

    fn shape(&self) -> CapsuleShape;

    /// Contact flag from the most recent `move_by`.
    fn is_grounded(&self) -> bool;

    /// True if a sphere at `center` overlaps ground geometry.
    fn check_sphere(&self, center: Vector3<f32>, radius: f32) -> bool;

    /// Sweeps a sphere from `origin` along `direction` up to `max_distance`.
    fn sphere_cast(
        &self,
        origin: Vector3<f32>,
        radius: f32,
        direction: Unit<Vector3<f32>>,
        max_distance: f32,
    ) -> Option<SurfaceHit>;

    /// Applies one displacement for this tick.
    fn move_by(&mut self, displacement: Vector3<f32>);

    fn set_step_offset(&mut self, step_offset: f32);
}

/// Normal of the surface under the capsule, or up when nothing is hit.
pub fn ground_normal<M: CharacterMotor + ?Sized>(motor: &M) -> Unit<Vector3<f32>> {
    let shape = motor.shape();
    let distance = shape.height / 2.0 + shape.step_offset + character_consts::NORMAL_PROBE_SKIN;
    motor
        .sphere_cast(motor.position(), shape.radius, -Vector3::y_axis(), distance)
        .map(|hit| hit.normal)
        .unwrap_or_else(Vector3::y_axis)
}

/// Angle in degrees between `normal` and world up.
pub fn slope_angle(normal: &Unit<Vector3<f32>>) -> f32 {
    normal.angle(&Vector3::y()).to_degrees()
}

/// Removes the component of `v` along `normal`.
pub fn project_on_plane(v: Vector3<f32>, normal: &Unit<Vector3<f32>>) -> Vector3<f32> {
    let n = normal.into_inner();
    v - n * v.dot(&n)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slope_angle() {
        assert!(slope_angle(&Vector3::y_axis()).abs() < 1e-4);
        let wall = Vector3::x_axis();
        assert!((slope_angle(&wall) - 90.0).abs() < 1e-4);
        let ramp = Unit::new_normalize(Vector3::new(1.0, 1.0, 0.0));
        assert!((slope_angle(&ramp) - 45.0).abs() < 1e-3);
    }

    #[test]
    fn test_project_on_plane_removes_normal_component() {
        let wall = Vector3::x_axis();
        let v = project_on_plane(Vector3::new(3.0, -2.0, 1.0), &wall);
        assert_eq!(v, Vector3::new(0.0, -2.0, 1.0));
    }
}

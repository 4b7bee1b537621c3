use nalgebra::{Unit, UnitQuaternion, Vector3};
use rapier3d::control::{CharacterAutostep, CharacterLength, KinematicCharacterController};
use rapier3d::parry::query::ShapeCastOptions;
use rapier3d::parry::shape::Ball;
use rapier3d::prelude::*;
use std::collections::{HashMap, HashSet};

use super::constants::physics as consts;
use super::player::motor::{CapsuleShape, CharacterMotor, SurfaceHit};

// Collision groups
// Characters collide with ground only; trigger regions are only seen by overlap queries
const GROUP_GROUND: Group = Group::GROUP_1;
const GROUP_CHARACTER: Group = Group::GROUP_2;
const GROUP_TRIGGER: Group = Group::GROUP_3;

/// Builds a rotation from per-axis degrees.
pub fn euler_degrees_to_quaternion(rotation: [f32; 3]) -> UnitQuaternion<f32> {
    UnitQuaternion::from_euler_angles(
        rotation[0].to_radians(),
        rotation[1].to_radians(),
        rotation[2].to_radians(),
    )
}

/// State for one capsule character
pub struct CharacterState {
    pub collider_handle: ColliderHandle,
    pub body_handle: RigidBodyHandle,
    pub shape: CapsuleShape,
    pub tag: String,
    /// Contact flag from the last move
    pub grounded: bool,
}

/// Wrapper around Rapier3D holding static ground, trigger regions and
/// kinematic characters.
pub struct PhysicsWorld {
    pub gravity: Vector<Real>,
    pub rigid_body_set: RigidBodySet,
    pub collider_set: ColliderSet,
    pub integration_parameters: IntegrationParameters,
    pub physics_pipeline: PhysicsPipeline,
    pub island_manager: IslandManager,
    pub broad_phase: DefaultBroadPhase,
    pub narrow_phase: NarrowPhase,
    pub impulse_joint_set: ImpulseJointSet,
    pub multibody_joint_set: MultibodyJointSet,
    pub ccd_solver: CCDSolver,
    pub query_pipeline: QueryPipeline,

    /// Character controllers by character id
    pub characters: HashMap<u64, CharacterState>,
    /// Maps collider handle to region id (for overlap detection)
    pub collider_to_region: HashMap<ColliderHandle, u64>,
}

impl PhysicsWorld {
    /// Creates an empty world. Gravity is applied by the locomotion code,
    /// not by rapier.
    pub fn new() -> Self {
        Self {
            gravity: vector![0.0, 0.0, 0.0],
            rigid_body_set: RigidBodySet::new(),
            collider_set: ColliderSet::new(),
            integration_parameters: IntegrationParameters::default(),
            physics_pipeline: PhysicsPipeline::new(),
            island_manager: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            impulse_joint_set: ImpulseJointSet::new(),
            multibody_joint_set: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            query_pipeline: QueryPipeline::new(),
            characters: HashMap::new(),
            collider_to_region: HashMap::new(),
        }
    }

    /// Steps the simulation and refreshes the query pipeline.
    /// Character moves requested since the last step are applied here.
    pub fn step(&mut self, dt: f32) {
        self.integration_parameters.dt = dt;
        self.physics_pipeline.step(
            &self.gravity,
            &self.integration_parameters,
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.rigid_body_set,
            &mut self.collider_set,
            &mut self.impulse_joint_set,
            &mut self.multibody_joint_set,
            &mut self.ccd_solver,
            Some(&mut self.query_pipeline),
            &(),
            &(),
        );
    }

    /// Adds a fixed cuboid of ground geometry. `rotation` is in degrees.
    pub fn add_block(
        &mut self,
        position: [f32; 3],
        size: [f32; 3],
        rotation: [f32; 3],
    ) -> RigidBodyHandle {
        let quat = euler_degrees_to_quaternion(rotation);
        let body = RigidBodyBuilder::fixed()
            .translation(vector![position[0], position[1], position[2]])
            .rotation(quat.scaled_axis())
            .build();
        let handle = self.rigid_body_set.insert(body);

        let [sx, sy, sz] = size;
        let collider = ColliderBuilder::cuboid(sx / 2.0, sy / 2.0, sz / 2.0)
            .collision_groups(InteractionGroups::new(GROUP_GROUND, Group::ALL))
            .build();
        self.collider_set
            .insert_with_parent(collider, handle, &mut self.rigid_body_set);
        handle
    }

    /// Adds a spherical sensor region. Characters passing through it never
    /// collide with it.
    pub fn add_trigger_region(
        &mut self,
        id: u64,
        position: [f32; 3],
        radius: f32,
    ) -> RigidBodyHandle {
        let body = RigidBodyBuilder::fixed()
            .translation(vector![position[0], position[1], position[2]])
            .build();
        let body_handle = self.rigid_body_set.insert(body);

        let collider = ColliderBuilder::ball(radius)
            .sensor(true)
            .collision_groups(InteractionGroups::new(GROUP_TRIGGER, GROUP_CHARACTER))
            .build();
        let collider_handle =
            self.collider_set
                .insert_with_parent(collider, body_handle, &mut self.rigid_body_set);

        self.collider_to_region.insert(collider_handle, id);
        body_handle
    }

    /// Adds a kinematic capsule character. `position` is the capsule centre.
    pub fn add_character(
        &mut self,
        id: u64,
        position: [f32; 3],
        shape: CapsuleShape,
        tag: &str,
    ) -> RigidBodyHandle {
        let body = RigidBodyBuilder::kinematic_position_based()
            .translation(vector![position[0], position[1], position[2]])
            .build();
        let body_handle = self.rigid_body_set.insert(body);

        // Capsule half-height is the cylinder part: total height = 2*half_height + 2*radius
        let half_height = (shape.height - 2.0 * shape.radius).max(0.0) / 2.0;
        let collider = ColliderBuilder::capsule_y(half_height, shape.radius)
            .collision_groups(InteractionGroups::new(GROUP_CHARACTER, GROUP_GROUND))
            .build();
        let collider_handle = self
            .collider_set
            .insert_with_parent(collider, body_handle, &mut self.rigid_body_set);

        self.characters.insert(
            id,
            CharacterState {
                collider_handle,
                body_handle,
                shape,
                tag: tag.to_string(),
                grounded: false,
            },
        );
        body_handle
    }

    pub fn character_tag(&self, id: u64) -> Option<&str> {
        self.characters.get(&id).map(|c| c.tag.as_str())
    }

    pub fn get_character_position(&self, id: u64) -> Option<Vector3<f32>> {
        let state = self.characters.get(&id)?;
        let body = self.rigid_body_set.get(state.body_handle)?;
        Some(*body.translation())
    }

    /// Motor view of one character for the locomotion code.
    pub fn character(&mut self, id: u64) -> Option<CharacterHandle<'_>> {
        let state = self.characters.get(&id)?;
        let body = state.body_handle;
        let collider = state.collider_handle;
        Some(CharacterHandle {
            world: self,
            id,
            body,
            collider,
        })
    }

    /// Detects characters overlapping trigger regions.
    /// Returns a set of (character id, region id) pairs.
    pub fn detect_overlaps(&self) -> HashSet<(u64, u64)> {
        let mut overlaps = HashSet::new();

        for (&character_id, state) in &self.characters {
            let Some(collider) = self.collider_set.get(state.collider_handle) else {
                continue;
            };

            let filter = QueryFilter::default()
                .exclude_rigid_body(state.body_handle)
                .exclude_solids()
                .groups(InteractionGroups::new(GROUP_CHARACTER, GROUP_TRIGGER));

            self.query_pipeline.intersections_with_shape(
                &self.rigid_body_set,
                &self.collider_set,
                collider.position(),
                collider.shape(),
                filter,
                |other| {
                    if let Some(&region_id) = self.collider_to_region.get(&other) {
                        overlaps.insert((character_id, region_id));
                    }
                    true // continue searching
                },
            );
        }

        overlaps
    }
}

impl Default for PhysicsWorld {
    fn default() -> Self {
        Self::new()
    }
}

fn ground_filter(exclude: Option<RigidBodyHandle>) -> QueryFilter<'static> {
    let filter = QueryFilter::default()
        .exclude_sensors()
        .groups(InteractionGroups::new(GROUP_CHARACTER, GROUP_GROUND));
    match exclude {
        Some(body) => filter.exclude_rigid_body(body),
        None => filter,
    }
}

/// Borrowed character inside a [`PhysicsWorld`], driven through [`CharacterMotor`].
pub struct CharacterHandle<'w> {
    world: &'w mut PhysicsWorld,
    id: u64,
    body: RigidBodyHandle,
    collider: ColliderHandle,
}

impl CharacterHandle<'_> {
    pub fn id(&self) -> u64 {
        self.id
    }

    fn state(&self) -> Option<&CharacterState> {
        self.world.characters.get(&self.id)
    }
}

impl CharacterMotor for CharacterHandle<'_> {
    fn position(&self) -> Vector3<f32> {
        self.world
            .rigid_body_set
            .get(self.body)
            .map(|b| *b.translation())
            .unwrap_or_else(Vector3::zeros)
    }

    fn shape(&self) -> CapsuleShape {
        self.state().map(|s| s.shape).unwrap_or(CapsuleShape {
            radius: 0.0,
            height: 0.0,
            step_offset: 0.0,
            slope_limit: 0.0,
        })
    }

    fn is_grounded(&self) -> bool {
        self.state().is_some_and(|s| s.grounded)
    }

    fn check_sphere(&self, center: Vector3<f32>, radius: f32) -> bool {
        let world = &*self.world;
        let pos = Isometry::translation(center.x, center.y, center.z);
        let mut hit = false;
        world.query_pipeline.intersections_with_shape(
            &world.rigid_body_set,
            &world.collider_set,
            &pos,
            &Ball::new(radius),
            ground_filter(Some(self.body)),
            |_| {
                hit = true;
                false // first hit is enough
            },
        );
        hit
    }

    fn sphere_cast(
        &self,
        origin: Vector3<f32>,
        radius: f32,
        direction: Unit<Vector3<f32>>,
        max_distance: f32,
    ) -> Option<SurfaceHit> {
        let world = &*self.world;
        let pos = Isometry::translation(origin.x, origin.y, origin.z);
        let (_, hit) = world.query_pipeline.cast_shape(
            &world.rigid_body_set,
            &world.collider_set,
            &pos,
            &direction.into_inner(),
            &Ball::new(radius),
            ShapeCastOptions::with_max_time_of_impact(max_distance),
            ground_filter(Some(self.body)),
        )?;
        // Report the normal facing back along the cast
        let normal = if hit.normal1.dot(&direction.into_inner()) > 0.0 {
            -hit.normal1
        } else {
            hit.normal1
        };
        Some(SurfaceHit {
            normal,
            distance: hit.time_of_impact,
        })
    }

    /// Sweeps the capsule through ground geometry and schedules the
    /// resulting translation for the next physics step.
    ///
    /// While stepping is enabled a downward displacement is swept in two
    /// passes, lateral first and then vertical, so the grounded downward
    /// bias cannot drag the capsule back off a step edge. Grounded sweeps
    /// never slide on contact; sliding off steep ground is left to the
    /// airborne locomotion path.
    fn move_by(&mut self, displacement: Vector3<f32>) {
        let shape = self.shape();
        let world = &mut *self.world;
        let (Some(body), Some(collider)) = (
            world.rigid_body_set.get(self.body),
            world.collider_set.get(self.collider),
        ) else {
            return;
        };
        let start = *body.position();
        let collider_shape = collider.shape();
        let dt = world.integration_parameters.dt;
        let filter = ground_filter(Some(self.body));

        let stepping = shape.step_offset > 0.0;
        let slide_angle = if stepping {
            std::f32::consts::FRAC_PI_2
        } else {
            shape.slope_limit.to_radians()
        };
        // The step probe lands a full radius forward, past the rounded
        // bottom of the capsule
        let controller = KinematicCharacterController {
            offset: CharacterLength::Absolute(consts::CONTROLLER_OFFSET),
            autostep: stepping.then(|| CharacterAutostep {
                max_height: CharacterLength::Absolute(shape.step_offset),
                min_width: CharacterLength::Absolute(shape.radius),
                include_dynamic_bodies: true,
            }),
            max_slope_climb_angle: shape.slope_limit.to_radians(),
            min_slope_slide_angle: slide_angle,
            snap_to_ground: stepping.then_some(CharacterLength::Absolute(consts::SNAP_TO_GROUND)),
            ..Default::default()
        };

        let passes = if stepping && displacement.y < 0.0 {
            vec![
                Vector3::new(displacement.x, 0.0, displacement.z),
                Vector3::new(0.0, displacement.y, 0.0),
            ]
        } else {
            vec![displacement]
        };

        let mut position = start;
        let mut grounded = false;
        for desired in passes {
            let movement = controller.move_shape(
                dt,
                &world.rigid_body_set,
                &world.collider_set,
                &world.query_pipeline,
                collider_shape,
                &position,
                desired,
                filter,
                |_collision| {},
            );
            position.translation.vector += movement.translation;
            grounded = movement.grounded;
        }

        if let Some(body) = world.rigid_body_set.get_mut(self.body) {
            body.set_next_kinematic_translation(position.translation.vector);
        }
        if let Some(state) = world.characters.get_mut(&self.id) {
            state.grounded = grounded;
        }
    }

    fn set_step_offset(&mut self, step_offset: f32) {
        if let Some(state) = self.world.characters.get_mut(&self.id) {
            state.shape.step_offset = step_offset;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::player::motor::{ground_normal, slope_angle};

    const DT: f32 = 1.0 / 60.0;

    fn capsule() -> CapsuleShape {
        CapsuleShape {
            radius: 0.5,
            height: 2.0,
            step_offset: 0.3,
            slope_limit: 45.0,
        }
    }

    fn world_with_floor() -> PhysicsWorld {
        let mut world = PhysicsWorld::new();
        // Floor top at y = 0
        world.add_block([0.0, -0.5, 0.0], [100.0, 1.0, 100.0], [0.0, 0.0, 0.0]);
        world
    }

    #[test]
    fn test_character_falls_and_lands() {
        let mut world = world_with_floor();
        world.add_character(1, [0.0, 4.0, 0.0], capsule(), "Player");
        world.step(DT);

        for _ in 0..120 {
            world.character(1).unwrap().move_by(Vector3::new(0.0, -0.2, 0.0));
            world.step(DT);
        }

        let pos = world.get_character_position(1).unwrap();
        let motor = world.character(1).unwrap();
        println!("Landed at y={} grounded={}", pos.y, motor.is_grounded());
        assert!(motor.is_grounded(), "Character should be grounded after landing");
        assert!(pos.y > 0.95 && pos.y < 1.1, "Capsule centre should rest ~1 above floor, got {}", pos.y);
    }

    #[test]
    fn test_check_sphere_sees_ground_not_triggers() {
        let mut world = world_with_floor();
        world.add_character(1, [0.0, 1.02, 0.0], capsule(), "Player");
        world.add_trigger_region(10, [0.0, 20.0, 0.0], 3.0);
        world.step(DT);

        let motor = world.character(1).unwrap();
        assert!(motor.check_sphere(Vector3::new(0.0, -0.5, 0.0), 0.5));
        assert!(
            !motor.check_sphere(Vector3::new(0.0, 20.0, 0.0), 0.5),
            "Sensor regions must not count as ground"
        );
    }

    #[test]
    fn test_ground_normal_on_steep_ramp() {
        let mut world = PhysicsWorld::new();
        // 60 degree ramp around z
        world.add_block([0.0, 0.0, 0.0], [10.0, 1.0, 10.0], [0.0, 0.0, 60.0]);
        world.add_character(1, [0.0, 4.0, 0.0], capsule(), "Player");
        world.step(DT);

        let mut motor = world.character(1).unwrap();
        motor.set_step_offset(0.0);
        let shape = motor.shape();
        let hit = motor.sphere_cast(motor.position(), shape.radius, -Vector3::y_axis(), 10.0);
        assert!(hit.is_some(), "Cast should reach the ramp");
        let angle = slope_angle(&hit.unwrap().normal);
        assert!((angle - 60.0).abs() < 1.0, "Ramp normal should be ~60 degrees, got {}", angle);

        // Short probe from high up misses, falls back to world up
        assert_eq!(ground_normal(&motor), Vector3::y_axis());
    }

    #[test]
    fn test_detect_overlaps_with_trigger_region() {
        let mut world = world_with_floor();
        world.add_character(1, [0.0, 1.0, 0.0], capsule(), "Player");
        world.add_trigger_region(10, [1.0, 1.0, 0.0], 2.0);
        world.add_trigger_region(11, [30.0, 1.0, 0.0], 2.0);
        world.step(DT);

        let overlaps = world.detect_overlaps();
        assert_eq!(overlaps, HashSet::from([(1, 10)]));
        assert_eq!(world.character_tag(1), Some("Player"));
    }

    #[test]
    fn test_character_blocked_by_wall() {
        let mut world = world_with_floor();
        // Wall far taller than the step offset
        world.add_block([2.0, 2.0, 0.0], [1.0, 4.0, 10.0], [0.0, 0.0, 0.0]);
        world.add_character(1, [0.0, 1.05, 0.0], capsule(), "Player");
        world.step(DT);

        for _ in 0..120 {
            world.character(1).unwrap().move_by(Vector3::new(0.1, -0.05, 0.0));
            world.step(DT);
        }

        let pos = world.get_character_position(1).unwrap();
        println!("Stopped at x={}", pos.x);
        // Wall face at x = 1.5, capsule radius 0.5
        assert!(pos.x < 1.05, "Character should stop at the wall, got x={}", pos.x);
    }

    #[test]
    fn test_character_steps_onto_low_block() {
        let mut world = world_with_floor();
        // Step 0.2 tall, below the 0.3 step offset
        world.add_block([4.0, 0.1, 0.0], [4.0, 0.2, 4.0], [0.0, 0.0, 0.0]);
        world.add_character(1, [0.0, 1.05, 0.0], capsule(), "Player");
        world.step(DT);

        // Running pace with the grounded downward bias
        for i in 0..60 {
            world.character(1).unwrap().move_by(Vector3::new(4.0 * DT, -7.0 * DT, 0.0));
            world.step(DT);
            let pos = world.get_character_position(1).unwrap();
            if i % 10 == 0 {
                println!("Frame {}: pos=({:.2}, {:.2})", i, pos.x, pos.y);
            }
        }

        let pos = world.get_character_position(1).unwrap();
        println!("Final: x={} y={}", pos.x, pos.y);
        assert!(pos.x > 2.5, "Character should autostep onto the block, x={}", pos.x);
        assert!(pos.y > 1.15, "Character should stand on the block, y={}", pos.y);
        assert!(world.character(1).unwrap().is_grounded());
    }
}

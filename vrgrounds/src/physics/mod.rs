// Physics world for the testing grounds
//
// Level geometry is a set of static box actors. Each actor carries a name and
// a list of tags (e.g. "Climbable"); its collider stores the actor id in
// `user_data`. Blocking actors stop traces and the character; non-blocking
// actors are sensors that only show up in overlap queries.

pub mod util;

use std::collections::{BTreeSet, HashMap};

use bitflags::bitflags;
use cgmath::{Vector3, Zero};
use rapier3d::control::{CharacterLength, KinematicCharacterController};
use rapier3d::parry::query::{self, Ray};
use rapier3d::parry::shape::{Ball, Shape};
use rapier3d::prelude::*;
use serde::Serialize;

use engine::physics_log;

use self::util::{npoint_to_cgvec, nvec_to_cgmath, vec_to_isometry, vec_to_npoint, vec_to_nvec};

bitflags! {
    pub struct InternalCollisionGroups: u32 {
        const WORLD = 0b0000_0001;
        const SENSOR = 0b0000_0010;
        const ALL = u32::MAX;
    }
}

impl InternalCollisionGroups {
    fn memberships(self) -> InteractionGroups {
        InteractionGroups::new(Group::from_bits_truncate(self.bits()), Group::ALL)
    }

    fn query_filter(self) -> InteractionGroups {
        InteractionGroups::new(Group::ALL, Group::from_bits_truncate(self.bits()))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ActorId(pub u32);

#[derive(Clone, Debug, Serialize)]
pub struct ActorInfo {
    pub id: ActorId,
    pub name: String,
    pub tags: Vec<String>,
    pub blocking: bool,
    pub center: Vector3<f32>,
    pub half_extents: Vector3<f32>,
}

impl ActorInfo {
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}

#[derive(Clone, Copy, Debug)]
pub struct RayHit {
    pub actor: Option<ActorId>,
    pub hit_point: Vector3<f32>,
    pub hit_normal: Vector3<f32>,
    pub distance: f32,
}

/// Gap the character controller keeps between the character and blocking
/// geometry, in meters.
pub const CHARACTER_SKIN: f32 = 0.02;

#[derive(Clone, Copy, Debug)]
pub struct ShapeMovement {
    pub translation: Vector3<f32>,
    pub grounded: bool,
}

pub struct PhysicsWorld {
    bodies: RigidBodySet,
    colliders: ColliderSet,
    query_pipeline: QueryPipeline,
    character_controller: KinematicCharacterController,
    actors: HashMap<ActorId, ActorInfo>,
    actor_colliders: HashMap<ActorId, ColliderHandle>,
    next_actor_id: u32,
}

impl PhysicsWorld {
    pub fn new() -> PhysicsWorld {
        PhysicsWorld {
            bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            query_pipeline: QueryPipeline::new(),
            character_controller: KinematicCharacterController {
                offset: CharacterLength::Absolute(CHARACTER_SKIN),
                ..KinematicCharacterController::default()
            },
            actors: HashMap::new(),
            actor_colliders: HashMap::new(),
            next_actor_id: 0,
        }
    }

    pub fn add_box_actor(
        &mut self,
        name: impl Into<String>,
        tags: Vec<String>,
        center: Vector3<f32>,
        half_extents: Vector3<f32>,
        blocking: bool,
    ) -> ActorId {
        let id = ActorId(self.next_actor_id);
        self.next_actor_id += 1;

        let groups = if blocking {
            InternalCollisionGroups::WORLD
        } else {
            InternalCollisionGroups::SENSOR
        };

        let collider = ColliderBuilder::cuboid(half_extents.x, half_extents.y, half_extents.z)
            .translation(vec_to_nvec(center))
            .sensor(!blocking)
            .collision_groups(groups.memberships())
            .user_data(id.0 as u128)
            .build();
        let handle = self.colliders.insert(collider);

        let info = ActorInfo {
            id,
            name: name.into(),
            tags,
            blocking,
            center,
            half_extents,
        };
        physics_log!(DEBUG, "added actor {:?} '{}' tags={:?}", id, info.name, info.tags);

        self.actors.insert(id, info);
        self.actor_colliders.insert(id, handle);
        self.query_pipeline.update(&self.colliders);
        id
    }

    /// Move an actor. Returns false if the actor does not exist.
    pub fn set_actor_position(&mut self, id: ActorId, center: Vector3<f32>) -> bool {
        let (Some(info), Some(handle)) = (self.actors.get_mut(&id), self.actor_colliders.get(&id))
        else {
            return false;
        };
        let Some(collider) = self.colliders.get_mut(*handle) else {
            return false;
        };
        collider.set_translation(vec_to_nvec(center));
        info.center = center;
        self.query_pipeline.update(&self.colliders);
        true
    }

    pub fn actor(&self, id: ActorId) -> Option<&ActorInfo> {
        self.actors.get(&id)
    }

    pub fn find_actor(&self, name: &str) -> Option<&ActorInfo> {
        self.actors.values().find(|a| a.name == name)
    }

    pub fn actors(&self) -> impl Iterator<Item = &ActorInfo> {
        self.actors.values()
    }

    pub fn actor_count(&self) -> usize {
        self.actors.len()
    }

    fn actor_for_collider(&self, handle: ColliderHandle) -> Option<ActorId> {
        self.colliders
            .get(handle)
            .map(|collider| ActorId(collider.user_data as u32))
            .filter(|id| self.actors.contains_key(id))
    }

    /// Trace a line segment against blocking geometry.
    pub fn ray_cast(&self, start: Vector3<f32>, end: Vector3<f32>) -> Option<RayHit> {
        self.ray_cast_with_groups(start, end, InternalCollisionGroups::WORLD)
    }

    pub fn ray_cast_with_groups(
        &self,
        start: Vector3<f32>,
        end: Vector3<f32>,
        groups: InternalCollisionGroups,
    ) -> Option<RayHit> {
        use cgmath::InnerSpace;

        let delta = end - start;
        let length = delta.magnitude();
        if length <= f32::EPSILON {
            return None;
        }
        let direction = delta / length;

        let ray = Ray::new(vec_to_npoint(start), vec_to_nvec(direction));
        let filter = QueryFilter::default().groups(groups.query_filter());
        let (handle, intersection) = self.query_pipeline.cast_ray_and_get_normal(
            &self.bodies,
            &self.colliders,
            &ray,
            length,
            true,
            filter,
        )?;

        Some(RayHit {
            actor: self.actor_for_collider(handle),
            hit_point: npoint_to_cgvec(ray.point_at(intersection.time_of_impact)),
            hit_normal: nvec_to_cgmath(intersection.normal),
            distance: intersection.time_of_impact,
        })
    }

    /// All actors, blocking or not, intersecting a sphere.
    pub fn overlapping_actors(&self, center: Vector3<f32>, radius: f32) -> BTreeSet<ActorId> {
        let mut overlapping = BTreeSet::new();
        let shape = Ball::new(radius);
        self.query_pipeline.intersections_with_shape(
            &self.bodies,
            &self.colliders,
            &vec_to_isometry(center),
            &shape,
            QueryFilter::default(),
            |handle| {
                if let Some(actor) = self.actor_for_collider(handle) {
                    overlapping.insert(actor);
                }
                true
            },
        );
        overlapping
    }

    /// Slide `shape` from `position` by `desired_translation` against blocking geometry.
    ///
    /// A shape that starts closer than `CHARACTER_SKIN` to blocking geometry
    /// (resting exactly on the floor after a spawn or a teleport, say) is
    /// pushed out first; the returned translation includes that push.
    pub fn move_shape(
        &self,
        dt: f32,
        shape: &dyn Shape,
        position: Vector3<f32>,
        desired_translation: Vector3<f32>,
    ) -> ShapeMovement {
        let correction = self.depenetration(shape, position);
        let start = position + correction;

        let filter = QueryFilter::default()
            .exclude_sensors()
            .groups(InternalCollisionGroups::WORLD.query_filter());
        let movement = self.character_controller.move_shape(
            dt,
            &self.bodies,
            &self.colliders,
            &self.query_pipeline,
            shape,
            &vec_to_isometry(start),
            vec_to_nvec(desired_translation),
            filter,
            |_| {},
        );

        ShapeMovement {
            translation: correction + nvec_to_cgmath(movement.translation),
            // Pushed up out of something means standing on it
            grounded: movement.grounded || correction.y > 0.0,
        }
    }

    /// Translation that moves `shape` at `position` to `CHARACTER_SKIN`
    /// away from every blocking collider it is closer to than that.
    pub fn depenetration(&self, shape: &dyn Shape, position: Vector3<f32>) -> Vector3<f32> {
        let isometry = vec_to_isometry(position);
        let mut correction = Vector3::zero();

        for (_, collider) in self.colliders.iter() {
            if collider.is_sensor() {
                continue;
            }
            let contact = query::contact(
                &isometry,
                shape,
                collider.position(),
                collider.shape(),
                CHARACTER_SKIN,
            );
            if let Ok(Some(contact)) = contact {
                let depth = CHARACTER_SKIN - contact.dist;
                if depth > 0.0 {
                    // normal1 points out of `shape` toward the collider
                    correction -= nvec_to_cgmath(*contact.normal1) * depth;
                }
            }
        }

        if correction != Vector3::zero() {
            physics_log!(TRACE, "pushed shape at {:?} out by {:?}", position, correction);
        }
        correction
    }
}

impl Default for PhysicsWorld {
    fn default() -> Self {
        Self::new()
    }
}

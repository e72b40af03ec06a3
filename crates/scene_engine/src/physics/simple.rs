//! Reference physics world: Euler integration and sphere contacts

use std::cell::Cell;
use std::collections::{BTreeMap, BTreeSet};

use super::{BodyDesc, BodyState, ContactListener, PhysicsError, PhysicsWorld, RigidBodyHandle};
use crate::foundation::collections::EntityId;
use crate::foundation::math::{Quat, Vec3};

/// Speed below which a body starts counting towards sleep
const SLEEP_VELOCITY: f32 = 0.01;

/// Seconds a body must stay slow before it falls asleep
const SLEEP_DELAY: f32 = 0.5;

#[derive(Debug, Clone)]
struct Body {
    position: Vec3,
    rotation: Quat,
    linear_velocity: Vec3,
    angular_velocity: Vec3,
    radius: f32,
    owner: Option<EntityId>,
    awake: bool,
    idle_time: f32,
}

impl Body {
    fn wake(&mut self) {
        self.awake = true;
        self.idle_time = 0.0;
    }
}

/// Minimal rigid-body world
///
/// Bodies are spheres. Every registered, awake body is integrated with
/// explicit Euler steps; a body slower than a small threshold for long
/// enough falls asleep until something touches or teleports it.
pub struct SimplePhysicsWorld {
    bodies: BTreeMap<RigidBodyHandle, Body>,
    next_handle: u32,
    gravity: Vec3,
    touching: BTreeSet<(RigidBodyHandle, RigidBodyHandle)>,
    listeners: Vec<Box<dyn ContactListener>>,
    readers: Cell<u32>,
    writing: bool,
}

impl Default for SimplePhysicsWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl SimplePhysicsWorld {
    /// Empty world without gravity
    pub fn new() -> Self {
        Self {
            bodies: BTreeMap::new(),
            next_handle: 0,
            gravity: Vec3::zeros(),
            touching: BTreeSet::new(),
            listeners: Vec::new(),
            readers: Cell::new(0),
            writing: false,
        }
    }

    /// Builder pattern: Set gravity
    pub fn with_gravity(mut self, gravity: Vec3) -> Self {
        self.gravity = gravity;
        self
    }

    /// Number of bodies created, registered or not
    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    /// Whether a body is awake
    pub fn is_awake(&self, handle: RigidBodyHandle) -> Option<bool> {
        self.bodies.get(&handle).map(|body| body.awake)
    }

    fn body_mut(&mut self, handle: RigidBodyHandle) -> Result<&mut Body, PhysicsError> {
        self.bodies.get_mut(&handle).ok_or(PhysicsError::UnknownBody(handle))
    }

    fn integrate(&mut self, dt: f32) {
        let gravity = self.gravity;
        for body in self.bodies.values_mut().filter(|b| b.owner.is_some() && b.awake) {
            body.linear_velocity += gravity * dt;
            body.position += body.linear_velocity * dt;
            body.rotation = Quat::from_scaled_axis(body.angular_velocity * dt) * body.rotation;

            let slow = body.linear_velocity.magnitude() < SLEEP_VELOCITY
                && body.angular_velocity.magnitude() < SLEEP_VELOCITY;
            if slow {
                body.idle_time += dt;
                if body.idle_time >= SLEEP_DELAY {
                    body.awake = false;
                }
            } else {
                body.idle_time = 0.0;
            }
        }
    }

    fn update_contacts(&mut self) {
        let registered: Vec<_> = self
            .bodies
            .iter()
            .filter(|(_, b)| b.owner.is_some())
            .map(|(h, b)| (*h, b.position, b.radius))
            .collect();

        let mut now_touching = BTreeSet::new();
        for (i, (a, pa, ra)) in registered.iter().enumerate() {
            for (b, pb, rb) in &registered[i + 1..] {
                let reach = ra + rb;
                if (pa - pb).magnitude_squared() <= reach * reach {
                    now_touching.insert((*a, *b));
                }
            }
        }

        for &(a, b) in now_touching.difference(&self.touching) {
            for handle in [a, b] {
                if let Some(body) = self.bodies.get_mut(&handle) {
                    body.wake();
                }
            }
            for listener in &mut self.listeners {
                listener.contact_begin(a, b);
            }
        }
        for &(a, b) in self.touching.difference(&now_touching) {
            for listener in &mut self.listeners {
                listener.contact_end(a, b);
            }
        }

        self.touching = now_touching;
    }

    fn forget_contacts_of(&mut self, handle: RigidBodyHandle) {
        let ended: Vec<_> = self
            .touching
            .iter()
            .filter(|(a, b)| *a == handle || *b == handle)
            .copied()
            .collect();
        for pair in ended {
            self.touching.remove(&pair);
            for listener in &mut self.listeners {
                listener.contact_end(pair.0, pair.1);
            }
        }
    }
}

impl PhysicsWorld for SimplePhysicsWorld {
    fn create_body(&mut self, desc: BodyDesc) -> RigidBodyHandle {
        let handle = RigidBodyHandle(self.next_handle);
        self.next_handle += 1;
        self.bodies.insert(
            handle,
            Body {
                position: desc.position,
                rotation: desc.rotation,
                linear_velocity: desc.linear_velocity,
                angular_velocity: desc.angular_velocity,
                radius: desc.radius,
                owner: None,
                awake: true,
                idle_time: 0.0,
            },
        );
        handle
    }

    fn step(&mut self, dt: f32) -> Result<(), PhysicsError> {
        if self.writing || self.readers.get() > 0 {
            return Err(PhysicsError::AccessConflict("step while the world is marked"));
        }
        self.integrate(dt);
        self.update_contacts();
        Ok(())
    }

    fn register_body(&mut self, handle: RigidBodyHandle, owner: EntityId) -> Result<(), PhysicsError> {
        let body = self.body_mut(handle)?;
        if body.owner.is_some() {
            return Err(PhysicsError::AlreadyRegistered(handle));
        }
        body.owner = Some(owner);
        body.wake();
        log::debug!("Registered rigid body {:?} for {:?}", handle, owner);
        Ok(())
    }

    fn unregister_body(&mut self, handle: RigidBodyHandle) -> Result<(), PhysicsError> {
        let body = self.body_mut(handle)?;
        if body.owner.take().is_none() {
            return Err(PhysicsError::UnknownBody(handle));
        }
        self.forget_contacts_of(handle);
        log::debug!("Unregistered rigid body {:?}", handle);
        Ok(())
    }

    fn body_owner(&self, handle: RigidBodyHandle) -> Option<EntityId> {
        self.bodies.get(&handle).and_then(|body| body.owner)
    }

    fn active_bodies(&self) -> Result<Vec<BodyState>, PhysicsError> {
        if self.writing {
            return Err(PhysicsError::AccessConflict("read while marked for write"));
        }
        Ok(self
            .bodies
            .iter()
            .filter(|(_, b)| b.owner.is_some() && b.awake)
            .map(|(handle, b)| BodyState {
                handle: *handle,
                position: b.position,
                rotation: b.rotation,
            })
            .collect())
    }

    fn set_body_transform(&mut self, handle: RigidBodyHandle, position: Vec3, rotation: Quat) -> Result<(), PhysicsError> {
        if self.readers.get() > 0 {
            return Err(PhysicsError::AccessConflict("write while marked for read"));
        }
        let body = self.body_mut(handle)?;
        body.position = position;
        body.rotation = rotation;
        body.wake();
        Ok(())
    }

    fn mark_for_read(&self) -> Result<(), PhysicsError> {
        if self.writing {
            return Err(PhysicsError::AccessConflict("read while marked for write"));
        }
        self.readers.set(self.readers.get() + 1);
        Ok(())
    }

    fn unmark_for_read(&self) {
        self.readers.set(self.readers.get().saturating_sub(1));
    }

    fn mark_for_write(&mut self) -> Result<(), PhysicsError> {
        if self.writing || self.readers.get() > 0 {
            return Err(PhysicsError::AccessConflict("write while the world is marked"));
        }
        self.writing = true;
        Ok(())
    }

    fn unmark_for_write(&mut self) {
        self.writing = false;
    }

    fn contact_count(&self) -> usize {
        self.touching.len()
    }

    fn add_contact_listener(&mut self, listener: Box<dyn ContactListener>) {
        self.listeners.push(listener);
    }
}

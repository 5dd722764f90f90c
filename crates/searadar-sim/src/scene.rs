//! Synthetic scene: the in-process stand-in for the render and scenario
//! collaborators.
//!
//! Ships and fixed obstacles are hecs entities approximated by reflecting
//! spheres. The scene ray-casts the sensor frustum to produce the same
//! `(normal, depth)` frames a renderer would, and answers contact queries.

use glam::DVec3;
use hecs::World;

use searadar_core::constants::DT;
use searadar_core::types::{Position, Velocity};

use crate::capture::{BeamPose, FrameSpec, RenderSource, SensorFrame};

/// Scenario-assigned id of a ship.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContactId(pub u32);

/// Reflecting body approximation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reflector {
    /// Sphere radius (meters).
    pub radius: f64,
    /// Multiplier on received power.
    pub reflectivity: f64,
}

/// A contact as read from the scene.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContactSnapshot {
    pub id: u32,
    pub position: Position,
    /// Reflector radius (meters).
    pub radius: f64,
}

/// Everything a radar needs from the world on its tick.
pub trait SceneSource: RenderSource {
    /// All current contacts.
    fn contacts(&self) -> Vec<ContactSnapshot>;
}

/// ECS-backed scene.
pub struct Scene {
    world: World,
    next_contact_id: u32,
    ready: bool,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene {
    pub fn new() -> Self {
        Self {
            world: World::new(),
            next_contact_id: 0,
            ready: true,
        }
    }

    /// Whether the render target is available. An unready scene renders nothing.
    pub fn set_ready(&mut self, ready: bool) {
        self.ready = ready;
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    /// Add a ship. Returns its contact id.
    pub fn add_contact(
        &mut self,
        position: Position,
        velocity: Velocity,
        reflector: Reflector,
    ) -> u32 {
        let id = self.next_contact_id;
        self.next_contact_id += 1;
        self.world
            .spawn((ContactId(id), position, velocity, reflector));
        id
    }

    /// Add a fixed reflector that is not reported as a contact.
    pub fn add_obstacle(&mut self, position: Position, reflector: Reflector) -> hecs::Entity {
        self.world.spawn((position, reflector))
    }

    /// Remove a ship. Returns false if it did not exist.
    pub fn remove_contact(&mut self, contact_id: u32) -> bool {
        let entity = self
            .world
            .query::<&ContactId>()
            .iter()
            .find(|(_, id)| id.0 == contact_id)
            .map(|(e, _)| e);
        match entity {
            Some(e) => self.world.despawn(e).is_ok(),
            None => false,
        }
    }

    pub fn contact_position(&self, contact_id: u32) -> Option<Position> {
        self.world
            .query::<(&ContactId, &Position)>()
            .iter()
            .find(|(_, (id, _))| id.0 == contact_id)
            .map(|(_, (_, pos))| *pos)
    }

    pub fn contact_count(&self) -> usize {
        self.world.query::<&ContactId>().iter().count()
    }

    /// Integrate contact motion for one tick.
    pub fn step(&mut self) {
        for (_entity, (pos, vel)) in self.world.query_mut::<(&mut Position, &Velocity)>() {
            pos.x += vel.x * DT;
            pos.y += vel.y * DT;
            pos.z += vel.z * DT;
        }
    }

    /// Nearest sphere hit along a ray within `[near, far]`:
    /// `(distance, world normal, reflectivity)`.
    fn cast(
        reflectors: &[(DVec3, Reflector)],
        origin: DVec3,
        dir: DVec3,
        near: f64,
        far: f64,
    ) -> Option<(f64, DVec3, f64)> {
        let mut best: Option<(f64, DVec3, f64)> = None;
        for (center, reflector) in reflectors {
            let oc = origin - *center;
            let b = oc.dot(dir);
            let c = oc.length_squared() - reflector.radius * reflector.radius;
            let disc = b * b - c;
            if disc < 0.0 {
                continue;
            }
            let root = disc.sqrt();
            let t = if -b - root >= near { -b - root } else { -b + root };
            if t < near || t > far {
                continue;
            }
            if best.is_some_and(|(bt, _, _)| bt <= t) {
                continue;
            }
            let normal = (origin + dir * t - *center) / reflector.radius;
            best = Some((t, normal, reflector.reflectivity));
        }
        best
    }
}

impl RenderSource for Scene {
    fn render(&self, pose: &BeamPose, spec: &FrameSpec) -> Option<SensorFrame> {
        if !self.ready {
            return None;
        }

        let origin = pose.origin.to_dvec3();
        let forward = pose.forward();
        let right = pose.right();
        let up = pose.up();

        // Cull to reflectors that can intersect the beam at all.
        let reach = spec.far;
        let reflectors: Vec<(DVec3, Reflector)> = self
            .world
            .query::<(&Position, &Reflector)>()
            .iter()
            .map(|(_, (pos, r))| (pos.to_dvec3(), *r))
            .filter(|(center, r)| (*center - origin).length() - r.radius <= reach)
            .collect();

        let mut frame = SensorFrame::empty(spec.width, spec.height);
        if reflectors.is_empty() {
            return Some(frame);
        }

        let mut reflectivity = vec![0.0f32; spec.pixel_count()];
        for row in 0..spec.height {
            for col in 0..spec.width {
                let dir = spec.pixel_ray(pose, col, row);
                let Some((t, n, refl)) = Self::cast(&reflectors, origin, dir, spec.near, spec.far)
                else {
                    continue;
                };
                let i = (row * spec.width + col) as usize;
                // Sensor space: +x right, +y up, +z back toward the sensor.
                frame.pixels[i] = [
                    n.dot(right) as f32,
                    n.dot(up) as f32,
                    n.dot(-forward) as f32,
                    t.clamp(spec.near, spec.far) as f32,
                ];
                reflectivity[i] = refl as f32;
            }
        }
        frame.reflectivity = Some(reflectivity);
        Some(frame)
    }
}

impl SceneSource for Scene {
    fn contacts(&self) -> Vec<ContactSnapshot> {
        let mut contacts: Vec<ContactSnapshot> = self
            .world
            .query::<(&ContactId, &Position, &Reflector)>()
            .iter()
            .map(|(_, (id, pos, reflector))| ContactSnapshot {
                id: id.0,
                position: *pos,
                radius: reflector.radius,
            })
            .collect();
        contacts.sort_by_key(|c| c.id);
        contacts
    }
}

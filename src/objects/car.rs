//! The player's delivery car.
//!
//! Direction 0 is +x in world space (down-right on screen) and each further
//! index is 45 degrees counterclockwise, up to index 7.

use std::f64::consts::{FRAC_PI_4, FRAC_PI_8, PI};

use super::respawn::GhostCar;
use super::{Body, Lifecycle, ObjectId, ObjectKind, ObjectType, Shape};
use crate::config::DebugFlags;
use crate::math::units::world;
use crate::math::{clamp, distance_squared};
use crate::services::{AudioService, Cue, SimulationContext};
use crate::world::{Terrain, World};

pub const MAX_SPEED: f64 = 0.003;
pub const ACCELERATION: f64 = 0.000005;
pub const TURN_SPEED: f64 = 1.7;
pub const BRAKE_DECELERATION: f64 = 0.00001;
pub const REVERSE_ACCELERATION: f64 = -0.0002;
pub const REVERSE_MIN_SPEED: f64 = -0.001;
pub const TIME_BEFORE_REVERSE_LIGHTS: f64 = 400.0;
pub const TIME_BEFORE_REVERSE: f64 = 600.0;
pub const TIME_BEFORE_BRAKE_SQUEAL: f64 = 150.0;
pub const DECELERATION_FACTOR: f64 = 0.998;
pub const MAX_ENGINE_PITCH: f64 = 1.3;
pub const ESSENTIALLY_STOPPED: f64 = 0.00004;
pub const PACKAGE_CAPACITY: u32 = 7;
pub const RADIUS: f64 = 0.25;

pub const CAPACITY_MESSAGE: &str = "You require more car capacity. Drop off packages at to carry more!";

/// Which of the sixteen car frames to draw.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CarSprite {
    /// Compass sector, 0 to 7
    pub index: usize,
    /// Reverse lights on
    pub backup: bool,
}

/// Where a car stopped against an obstacle.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ObstacleHit {
    /// Closest point of the obstacle to the car's centre
    pub contact: world::Point2D,
    /// Position the car is pushed back to
    pub target: world::Point2D,
}

#[derive(Clone, Debug)]
pub struct Car {
    /// Heading in radians, only normalised when snapped
    pub direction: f64,
    /// Tiles per millisecond, negative while reversing
    pub speed: f64,
    pub snapped_direction: usize,
    /// Steering applied since the last snap
    pub current_turn: f64,
    pub time_in_reverse: f64,
    pub time_spent_braking: f64,
    /// Surface under the car as of the last move
    pub terrain: Terrain,
    is_beeping: bool,
    is_squealing: bool,
    engine_running: bool,
    /// Carried packages, head first
    packages: Vec<ObjectId>,
}

impl Car {
    pub fn new(direction: f64) -> Self {
        Self {
            direction,
            speed: 0.0,
            snapped_direction: 0,
            current_turn: 0.0,
            time_in_reverse: 0.0,
            time_spent_braking: 0.0,
            terrain: Terrain::Road,
            is_beeping: false,
            is_squealing: false,
            engine_running: false,
            packages: Vec::new(),
        }
    }

    pub fn packages(&self) -> &[ObjectId] {
        &self.packages
    }

    pub fn has_package(&self, id: ObjectId) -> bool {
        self.packages.contains(&id)
    }

    pub fn sprite(&self) -> CarSprite {
        CarSprite {
            index: self.snapped_direction,
            backup: self.time_in_reverse > TIME_BEFORE_REVERSE_LIGHTS,
        }
    }

    pub fn tick(&mut self, body: &mut Body, dt: f64, world: &mut World, ctx: &mut SimulationContext) -> Lifecycle {
        if !self.engine_running {
            ctx.audio.play_looped(Cue::Engine, 0.0);
            self.engine_running = true;
        }

        self.snapped_direction = snapped_direction_index(self.direction);
        self.update_reverse_lights(ctx.audio);

        let input = ctx.input;
        let mut turning = false;
        if input.accelerate {
            self.accelerate(dt, ctx.debug);
        }
        if input.turn_left {
            self.turn_left(dt);
            turning = true;
        }
        if input.turn_right {
            self.turn_right(dt);
            turning = true;
        }
        if input.brake {
            self.brake_or_reverse(dt, ctx.audio);
        } else {
            ctx.audio.stop_cue(Cue::Brake);
            self.time_spent_braking = 0.0;
            self.is_squealing = false;
        }

        self.speed *= DECELERATION_FACTOR;
        if self.speed.abs() < ESSENTIALLY_STOPPED {
            self.speed = 0.0;
        }

        if !turning {
            self.snap_turn_direction();
        }

        // +y is down-left on screen, so a positive heading moves towards -y
        body.position.x += self.direction.cos() * self.speed * dt;
        body.position.y -= self.direction.sin() * self.speed * dt;
        world.reindex(body);

        self.terrain = world.terrain_at(body.position);
        if self.terrain.is_deadly() {
            self.wreck(body, world, ctx);
            return Lifecycle::Despawn;
        }

        if let Some(hit) = self.collide_with_objects(body, world, ctx) {
            body.position = hit.target;
            self.speed = 0.0;
            world.reindex(body);
        }

        self.pull_packages(body, world);
        self.deliver_packages(world, ctx);

        let rate = (self.speed / MAX_SPEED) * (MAX_ENGINE_PITCH - 1.0) + 1.0;
        ctx.audio.set_playback_rate(Cue::Engine.as_ref(), rate);

        Lifecycle::Alive
    }

    fn update_reverse_lights(&mut self, audio: &mut dyn AudioService) {
        if self.time_in_reverse > TIME_BEFORE_REVERSE_LIGHTS {
            if !self.is_beeping {
                audio.play_looped(Cue::Beep, 0.0);
                self.is_beeping = true;
            }
        } else {
            audio.stop_cue(Cue::Beep);
            self.is_beeping = false;
        }
    }

    pub fn accelerate(&mut self, dt: f64, debug: DebugFlags) {
        self.time_in_reverse = 0.0;
        self.speed += ACCELERATION * dt;
        if debug.go_really_fast {
            self.terrain = Terrain::Meringue;
        }

        let cap = self.terrain.max_speed();
        if self.speed >= cap {
            self.speed = cap;
        }
    }

    /// Steers counterclockwise and returns the angle turned. Steering scales
    /// with speed, so a stopped car can't turn.
    pub fn turn_left(&mut self, dt: f64) -> f64 {
        let amount = TURN_SPEED * dt * self.speed;
        self.direction += amount;
        self.current_turn += amount;
        amount
    }

    pub fn turn_right(&mut self, dt: f64) -> f64 {
        let amount = TURN_SPEED * dt * self.speed;
        self.direction -= amount;
        self.current_turn -= amount;
        amount
    }

    /// Brakes while moving forward, waits once stopped, then reverses.
    pub fn brake_or_reverse(&mut self, dt: f64, audio: &mut dyn AudioService) {
        if self.speed > 0.0 {
            self.time_in_reverse = 0.0;
            self.speed = (self.speed - BRAKE_DECELERATION * dt).max(0.0);
            self.time_spent_braking += dt;

            if self.time_spent_braking > TIME_BEFORE_BRAKE_SQUEAL && !self.is_squealing {
                audio.play_once(Cue::Brake);
                self.is_squealing = true;
            }
        } else if self.time_in_reverse < TIME_BEFORE_REVERSE {
            self.time_in_reverse += dt;
            audio.stop_cue(Cue::Brake);
        } else {
            audio.stop_cue(Cue::Brake);
            self.speed = (self.speed + REVERSE_ACCELERATION * dt).max(REVERSE_MIN_SPEED);
        }
    }

    /// Locks the heading to the nearest compass direction. A small turn since
    /// the last snap still moves one sector in that direction.
    pub fn snap_turn_direction(&mut self) {
        let mut index = self.snapped_direction as i64;
        if self.current_turn < FRAC_PI_8 && self.current_turn > -FRAC_PI_8 {
            if self.current_turn > 0.0 {
                index += 1;
            } else if self.current_turn < 0.0 {
                index -= 1;
            }
        }

        self.current_turn = 0.0;
        self.snapped_direction = index.rem_euclid(8) as usize;
        self.direction = FRAC_PI_4 * self.snapped_direction as f64;
    }

    /// Drove off the road: drop everything and send a ghost to the nearest
    /// respawn point.
    fn wreck(&mut self, body: &Body, world: &mut World, ctx: &mut SimulationContext) {
        let cue = match self.terrain {
            Terrain::Water => Cue::Splash,
            _ => Cue::Congratulations,
        };
        ctx.audio.play_once(cue);
        ctx.audio.stop_cue(Cue::Engine);
        ctx.audio.stop_cue(Cue::Beep);
        ctx.economy.fall_in_water();
        self.packages.clear();

        log::info!("car {} drove into {} at {:?}", body.id, self.terrain, body.position);

        let respawn = world
            .nearest_of_type(ObjectType::RespawnPoint, body.position)
            .and_then(|point| match &point.kind {
                ObjectKind::RespawnPoint(respawn) => Some((point.body.position, respawn.direction)),
                _ => None,
            });

        match respawn {
            Some((target, direction)) => {
                let ghost = GhostCar::new(self.sprite(), target, direction);
                world.spawn(body.position, Shape::Point, ObjectKind::GhostCar(ghost));
            }
            None => log::warn!("no respawn point, car {} is gone for good", body.id),
        }
    }

    /// Picks up nearby packages and returns the first obstacle hit, if any.
    fn collide_with_objects(
        &mut self,
        body: &Body,
        world: &World,
        ctx: &mut SimulationContext,
    ) -> Option<ObstacleHit> {
        let mut hit = None;

        for id in world.objects_near(body) {
            let Some(other) = world.get(id) else {
                continue;
            };

            match &other.kind {
                ObjectKind::Obstacle if hit.is_none() => {
                    hit = collide_with_obstacle(body.position, RADIUS, &other.body.bounding_box());
                }
                ObjectKind::Package(_) if !self.has_package(id) => {
                    // compared against the radius itself, not its square
                    if distance_squared(body.position, other.body.position) < RADIUS {
                        self.collect_package(id, ctx);
                    }
                }
                _ => {}
            }
        }

        hit
    }

    fn collect_package(&mut self, id: ObjectId, ctx: &mut SimulationContext) {
        if ctx.economy.held_packages() >= PACKAGE_CAPACITY {
            ctx.hud.set_message(CAPACITY_MESSAGE);
            return;
        }

        ctx.audio.play_once(Cue::Pickup);
        ctx.economy.increment_packages();
        self.packages.push(id);
    }

    /// Drags the train along, each package following the one before it.
    fn pull_packages(&self, body: &Body, world: &mut World) {
        let mut target = body.position;
        for id in &self.packages {
            if let Some(position) = world.drag_package(*id, target) {
                target = position;
            }
        }
    }

    /// Hands every package inside its zone to the economy, tail first.
    fn deliver_packages(&mut self, world: &mut World, ctx: &mut SimulationContext) {
        let delivered: Vec<ObjectId> = self
            .packages
            .iter()
            .rev()
            .copied()
            .filter(|id| world.package_in_zone(*id))
            .collect();

        for id in &delivered {
            ctx.economy.deliver_package(*id, world, ctx.hud);
        }
        self.packages.retain(|id| !delivered.contains(id));
    }
}

/// Classifies a heading into one of the eight compass sectors.
pub fn snapped_direction_index(direction: f64) -> usize {
    let (sin, cos) = direction.sin_cos();
    let sector = PI / 8.0;

    if sin < sector.sin() && sin > (15.0 * sector).sin() {
        if cos > 0.0 {
            0
        } else {
            4
        }
    } else if sin < (3.0 * sector).sin() && sin > 0.0 {
        if cos > 0.0 {
            1
        } else {
            3
        }
    } else if sin > (11.0 * sector).sin() && sin < 0.0 {
        if cos > 0.0 {
            7
        } else {
            5
        }
    } else if sin > 0.0 {
        2
    } else {
        6
    }
}

/// Circle against axis-aligned rectangle. On contact the circle is pushed
/// out along the line from the closest point on the rectangle to its centre.
pub fn collide_with_obstacle(center: world::Point2D, radius: f64, area: &world::Box2D) -> Option<ObstacleHit> {
    let middle = area.center();
    let half = area.size() / 2.0;
    let diff = center - middle;

    let contact = middle
        + world::Vector2D::new(
            clamp(diff.x, -half.width, half.width),
            clamp(diff.y, -half.height, half.height),
        );

    let push = (contact.y - center.y).atan2(center.x - contact.x);
    let target = world::Point2D::new(contact.x + push.cos() * radius, contact.y - push.sin() * radius);

    (distance_squared(contact, center) <= radius * radius).then_some(ObstacleHit { contact, target })
}

use rand::Rng;

use super::{Body, ObjectId, ObjectType};
use crate::economy::{EconomyError, JobId};
use crate::math::units::world;
use crate::world::World;

pub const RADIUS: f64 = 0.25;
/// How closely a dragged package trails whatever pulls it
pub const FOLLOW_DISTANCE: f64 = 0.5;
pub const BOB_SPEED: f64 = 0.006;
pub const BOB_AMPLITUDE: f32 = 3.0;

#[derive(Clone, Debug)]
pub struct Package {
    pub delivery_zone: ObjectId,
    /// Job that spawned this package, if any
    pub job: Option<JobId>,
    /// Bob animation phase in milliseconds
    pub bob: f64,
    pub sprite_variant: usize,
}

impl Package {
    pub fn new<R: Rng + ?Sized>(delivery_zone: ObjectId, job: Option<JobId>, rng: &mut R) -> Self {
        Self {
            delivery_zone,
            job,
            bob: rng.gen_range(0.0..1000.0),
            sprite_variant: rng.gen_range(1..=2),
        }
    }

    pub fn tick(&mut self, body: &Body, dt: f64, world: &World) -> Result<(), EconomyError> {
        self.bob += dt;

        let zone_exists = world
            .get(self.delivery_zone)
            .is_some_and(|zone| zone.object_type() == ObjectType::DeliveryZone);

        if !zone_exists {
            log::error!("package {} had no delivery zone, picking the closest one", body.id);
            let zone = world
                .nearest_of_type(ObjectType::DeliveryZone, body.position)
                .ok_or(EconomyError::NoDeliveryZones)?;
            self.delivery_zone = zone.id();
        }

        Ok(())
    }

    /// Moves the package so it trails `target` at [`FOLLOW_DISTANCE`].
    /// Returns whether it moved; the caller reindexes it.
    pub fn drag_towards(&mut self, body: &mut Body, target: world::Point2D) -> bool {
        self.bob = 0.0;

        let delta = target - body.position;
        let distance = delta.length() - FOLLOW_DISTANCE;
        if distance < 0.0 {
            return false;
        }

        let direction = delta.y.atan2(delta.x);
        body.position.x += direction.cos() * distance;
        body.position.y += direction.sin() * distance;
        true
    }

    /// Vertical sprite offset in pixels.
    pub fn bob_offset(&self) -> f32 {
        (self.bob * BOB_SPEED).sin() as f32 * BOB_AMPLITUDE
    }
}

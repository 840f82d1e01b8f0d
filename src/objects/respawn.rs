use super::car::{self, Car, CarSprite};
use super::{Body, Lifecycle, ObjectKind, Shape};
use crate::math::units::world;
use crate::world::World;

/// Tiles per millisecond a ghost drives back at.
pub const GHOST_SPEED: f64 = 0.005;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RespawnPoint {
    /// Heading given to cars respawned here, in radians
    pub direction: f64,
}

/// Drawn as a faded car while it drives from the wreck to a respawn point,
/// where it turns back into a real car.
#[derive(Clone, Debug)]
pub struct GhostCar {
    pub sprite: CarSprite,
    pub target: world::Point2D,
    /// Heading of the car that will respawn
    pub direction: f64,
}

impl GhostCar {
    pub fn new(sprite: CarSprite, target: world::Point2D, direction: f64) -> Self {
        Self {
            sprite,
            target,
            direction,
        }
    }

    pub fn tick(&mut self, body: &mut Body, dt: f64, world: &mut World) -> Lifecycle {
        let delta = self.target - body.position;
        let step = GHOST_SPEED * dt;

        if delta.length() > step {
            body.position += delta.normalize() * step;
            world.reindex(body);
            return Lifecycle::Alive;
        }

        let id = world.spawn(
            self.target,
            Shape::Circle { radius: car::RADIUS },
            ObjectKind::Car(Car::new(self.direction)),
        );
        log::info!("car {id} respawned at {:?}", self.target);

        Lifecycle::Despawn
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::objects::{ObjectId, ObjectType};
    use crate::services::Cue;
    use crate::test_support::{grid_document, object, Harness};

    #[test]
    fn test_ghost_respawns_car() {
        let mut harness = Harness::new(
            grid_document(&["rrrrrrrr"; 4], 4),
            &[object(1, "RespawnPoint", 1.0, 1.0).with_property("direction", serde_json::json!(90))],
        );
        let ghost = harness.world.spawn(
            world::Point2D::new(2.0, 1.0),
            Shape::Point,
            ObjectKind::GhostCar(GhostCar::new(
                CarSprite::default(),
                world::Point2D::new(1.0, 1.0),
                -std::f64::consts::FRAC_PI_2,
            )),
        );
        assert_eq!(harness.world.camera.target, Some(ghost));

        // one tile at 0.005 tiles/ms takes 200 ms
        for _ in 0..12 {
            harness.tick(16.0).unwrap();
        }
        assert!(harness.world.get(ghost).is_some());
        assert!(harness.world.objects_of_type(ObjectType::Car).next().is_none());

        harness.tick(16.0).unwrap();
        assert!(harness.world.get(ghost).is_none());

        let car = harness.world.objects_of_type(ObjectType::Car).next().unwrap();
        assert_eq!(car.body.position, world::Point2D::new(1.0, 1.0));
        assert_eq!(car.as_car().unwrap().direction, -std::f64::consts::FRAC_PI_2);
        assert_eq!(harness.world.camera.target, Some(car.id()));
        assert_ne!(car.id(), ObjectId(1));

        // the new car starts its engine on its first tick
        harness.audio.clear();
        harness.tick(16.0).unwrap();
        assert_eq!(harness.audio.plays(Cue::Engine), 1);
    }
}

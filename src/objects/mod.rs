use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumDiscriminants, EnumString};

use crate::economy::EconomyError;
use crate::math::units::{screen, world};
use crate::services::SimulationContext;
use crate::world::{ChunkId, World};

pub mod car;
pub mod package;
pub mod respawn;

pub use car::Car;
pub use package::Package;
pub use respawn::{GhostCar, RespawnPoint};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectId(pub u32);

impl ObjectId {
    pub fn raw(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Shape {
    Point,
    /// Centred on the position
    Circle { radius: f64 },
    /// Position is the top-left corner
    Rect { size: world::Size2D },
}

/// The spatial half of a game object.
#[derive(Clone, Debug)]
pub struct Body {
    pub id: ObjectId,
    pub position: world::Point2D,
    pub shape: Shape,
    /// Recomputed whenever the world reindexes the body
    pub screen: screen::Point2D,
    /// Chunks the bounding box currently overlaps, maintained by the chunk index
    pub chunks: BTreeSet<ChunkId>,
}

impl Body {
    pub fn new(id: ObjectId, position: world::Point2D, shape: Shape) -> Self {
        Self {
            id,
            position,
            shape,
            screen: screen::Point2D::zero(),
            chunks: BTreeSet::new(),
        }
    }

    /// Half-open world-space bounds. Points yield a degenerate box.
    pub fn bounding_box(&self) -> world::Box2D {
        let p = self.position;
        match self.shape {
            Shape::Point => world::Box2D::new(p, p),
            Shape::Circle { radius } => {
                let r = world::Vector2D::new(radius, radius);
                world::Box2D::new(p - r, p + r)
            }
            Shape::Rect { size } => world::Box2D::new(p, p + size),
        }
    }

    pub fn center(&self) -> world::Point2D {
        match self.shape {
            Shape::Rect { size } => self.position + size / 2.0,
            _ => self.position,
        }
    }

    pub fn radius(&self) -> f64 {
        match self.shape {
            Shape::Circle { radius } => radius,
            _ => 0.0,
        }
    }
}

/// What an object is, together with any state specific to that kind.
#[derive(Clone, Debug, EnumDiscriminants)]
#[strum_discriminants(name(ObjectType), derive(EnumString, Display, Hash))]
pub enum ObjectKind {
    Car(Car),
    Package(Package),
    /// Solid rectangle that stops cars
    Obstacle,
    /// Rectangle packages are delivered into
    DeliveryZone,
    PackageSpawn,
    RespawnPoint(RespawnPoint),
    /// Placeholder shown while a wrecked car drives back to a respawn point
    GhostCar(GhostCar),
}

/// Whether an object should stay in the world after ticking.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Lifecycle {
    Alive,
    Despawn,
}

#[derive(Clone, Debug)]
pub struct GameObject {
    pub name: String,
    pub body: Body,
    pub kind: ObjectKind,
}

impl GameObject {
    pub fn new(id: ObjectId, position: world::Point2D, shape: Shape, kind: ObjectKind) -> Self {
        Self {
            name: String::new(),
            body: Body::new(id, position, shape),
            kind,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn id(&self) -> ObjectId {
        self.body.id
    }

    pub fn object_type(&self) -> ObjectType {
        ObjectType::from(&self.kind)
    }

    pub fn as_car(&self) -> Option<&Car> {
        match &self.kind {
            ObjectKind::Car(car) => Some(car),
            _ => None,
        }
    }

    pub fn as_car_mut(&mut self) -> Option<&mut Car> {
        match &mut self.kind {
            ObjectKind::Car(car) => Some(car),
            _ => None,
        }
    }

    pub fn as_package(&self) -> Option<&Package> {
        match &self.kind {
            ObjectKind::Package(package) => Some(package),
            _ => None,
        }
    }

    /// Advances this object by `dt` milliseconds. The object has been taken
    /// out of `world` for the duration of the call.
    pub fn tick(
        &mut self,
        dt: f64,
        world: &mut World,
        ctx: &mut SimulationContext,
    ) -> Result<Lifecycle, EconomyError> {
        match &mut self.kind {
            ObjectKind::Car(car) => Ok(car.tick(&mut self.body, dt, world, ctx)),
            ObjectKind::Package(package) => {
                package.tick(&self.body, dt, world)?;
                Ok(Lifecycle::Alive)
            }
            ObjectKind::GhostCar(ghost) => Ok(ghost.tick(&mut self.body, dt, world)),
            ObjectKind::Obstacle | ObjectKind::DeliveryZone | ObjectKind::PackageSpawn | ObjectKind::RespawnPoint(_) => {
                Ok(Lifecycle::Alive)
            }
        }
    }
}

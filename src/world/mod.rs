use std::collections::{BTreeSet, HashMap};

use crate::assets::SpriteTable;
use crate::economy::EconomyError;
use crate::math::units::{map, screen, world};
use crate::math::{distance_squared, point_is_inside, to_screen, TileDimensions};
use crate::objects::{Body, GameObject, Lifecycle, ObjectId, ObjectKind, ObjectType, Shape};
use crate::services::SimulationContext;

mod chunk;
pub mod document;
mod interop;

pub use chunk::{Cell, CellLayer, Chunk, ChunkId, ChunkIndex, Terrain};
pub use interop::MapError;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WorldInfo {
    /// Map size in tiles
    pub size: map::Size2D,
    pub tile: TileDimensions,
}

#[derive(Clone, Copy, Debug, Default)]
pub struct Camera {
    /// Object the camera follows, the most recently added car
    pub target: Option<ObjectId>,
    pub screen: screen::Point2D,
}

/// Draws what [`World::draw`] hands it. Destinations are already in screen
/// space with the camera applied.
pub trait Renderer {
    fn draw_cell(&mut self, cell: &Cell, dest: screen::Point2D);
    fn draw_grid_line(&mut self, from: screen::Point2D, to: screen::Point2D);
    fn draw_object(&mut self, object: &GameObject, dest: screen::Point2D, world: &World);
}

pub struct World {
    pub info: WorldInfo,
    pub camera: Camera,
    layers: Vec<CellLayer>,
    index: ChunkIndex,
    objects: HashMap<ObjectId, GameObject>,
    /// Registration order, which is also tick and draw order
    order: Vec<ObjectId>,
    next_id: u32,
    grid: Vec<(screen::Point2D, screen::Point2D)>,
    sprites: SpriteTable,
}

impl World {
    /// Creates an empty world over `layers`. The first layer is the terrain layer.
    pub fn new(info: WorldInfo, layers: Vec<CellLayer>, sprites: SpriteTable) -> Self {
        let index = ChunkIndex::new(layers.first().map(|layer| layer.chunks.as_slice()).unwrap_or_default());

        let (width, height) = (info.size.width as f64, info.size.height as f64);
        let mut grid = Vec::new();
        for x in 0..=info.size.width {
            let x = x as f64;
            grid.push((
                to_screen(world::Point2D::new(x, 0.0), info.tile),
                to_screen(world::Point2D::new(x, height), info.tile),
            ));
        }
        for y in 0..=info.size.height {
            let y = y as f64;
            grid.push((
                to_screen(world::Point2D::new(0.0, y), info.tile),
                to_screen(world::Point2D::new(width, y), info.tile),
            ));
        }

        Self {
            info,
            camera: Camera::default(),
            layers,
            index,
            objects: HashMap::new(),
            order: Vec::new(),
            next_id: 1,
            grid,
            sprites,
        }
    }

    pub fn sprites(&self) -> &SpriteTable {
        &self.sprites
    }

    pub fn layers(&self) -> &[CellLayer] {
        &self.layers
    }

    pub fn chunk_index(&self) -> &ChunkIndex {
        &self.index
    }

    /// Registers `object` and indexes it. Cars and ghost cars take the camera.
    pub fn add(&mut self, mut object: GameObject) -> ObjectId {
        let id = object.id();
        Self::reindex_body(&mut self.index, self.info.tile, &mut object.body);

        if matches!(object.kind, ObjectKind::Car(_) | ObjectKind::GhostCar(_)) {
            self.camera.target = Some(id);
        }

        self.next_id = self.next_id.max(id.0 + 1);
        if self.objects.insert(id, object).is_some() {
            log::warn!("object {id} was registered twice");
        } else {
            self.order.push(id);
        }

        id
    }

    /// Adds a new object under a fresh id.
    pub fn spawn(&mut self, position: world::Point2D, shape: Shape, kind: ObjectKind) -> ObjectId {
        let id = ObjectId(self.next_id);
        self.add(GameObject::new(id, position, shape, kind))
    }

    pub fn remove(&mut self, id: ObjectId) -> Option<GameObject> {
        let mut object = self.objects.remove(&id)?;
        self.order.retain(|other| *other != id);
        self.index.remove(&mut object.body);
        Some(object)
    }

    pub fn get(&self, id: ObjectId) -> Option<&GameObject> {
        self.objects.get(&id)
    }

    pub fn get_mut(&mut self, id: ObjectId) -> Option<&mut GameObject> {
        self.objects.get_mut(&id)
    }

    pub fn contains(&self, id: ObjectId) -> bool {
        self.objects.contains_key(&id)
    }

    /// Every object, in registration order.
    pub fn objects(&self) -> impl Iterator<Item = &GameObject> {
        self.order.iter().filter_map(|id| self.objects.get(id))
    }

    pub fn objects_of_type(&self, kind: ObjectType) -> impl Iterator<Item = &GameObject> {
        self.objects().filter(move |object| object.object_type() == kind)
    }

    /// Closest object of `kind` to `point`, earliest registered on ties.
    pub fn nearest_of_type(&self, kind: ObjectType, point: world::Point2D) -> Option<&GameObject> {
        self.objects_of_type(kind).min_by(|a, b| {
            distance_squared(a.body.position, point).total_cmp(&distance_squared(b.body.position, point))
        })
    }

    pub fn terrain_at(&self, point: world::Point2D) -> Terrain {
        let chunk = self.index.chunk_containing(point);
        chunk
            .and_then(|chunk| self.layers.first()?.chunks.get(chunk.raw()))
            .map(|chunk| chunk.terrain_at(point))
            .unwrap_or_default()
    }

    /// Refreshes a moved body's screen position and chunk membership.
    pub fn reindex(&mut self, body: &mut Body) {
        Self::reindex_body(&mut self.index, self.info.tile, body);
    }

    fn reindex_body(index: &mut ChunkIndex, tile: TileDimensions, body: &mut Body) {
        body.screen = to_screen(body.position, tile);
        index.reindex(body);
    }

    /// Objects sharing at least one chunk with `body`, chunk by chunk.
    pub fn objects_near(&self, body: &Body) -> Vec<ObjectId> {
        let mut seen = BTreeSet::new();
        body.chunks
            .iter()
            .flat_map(|chunk| self.index.objects_in(*chunk))
            .filter(|id| *id != body.id && seen.insert(*id))
            .collect()
    }

    /// Drags a package towards `target` and returns where it ended up.
    pub fn drag_package(&mut self, id: ObjectId, target: world::Point2D) -> Option<world::Point2D> {
        let object = self.objects.get_mut(&id)?;
        let ObjectKind::Package(package) = &mut object.kind else {
            return None;
        };

        if package.drag_towards(&mut object.body, target) {
            Self::reindex_body(&mut self.index, self.info.tile, &mut object.body);
        }
        Some(object.body.position)
    }

    /// Whether the package has reached its delivery zone.
    pub fn package_in_zone(&self, id: ObjectId) -> bool {
        let Some(object) = self.get(id) else {
            return false;
        };
        let Some(package) = object.as_package() else {
            return false;
        };

        self.get(package.delivery_zone)
            .map(|zone| point_is_inside(object.body.position, &zone.body.bounding_box()))
            .unwrap_or(false)
    }

    /// Advances every object once in registration order, then moves the camera.
    ///
    /// Objects spawned during the tick are first ticked on the next call, and
    /// objects removed during the tick are skipped.
    pub fn tick(&mut self, dt: f64, ctx: &mut SimulationContext) -> Result<(), EconomyError> {
        for id in self.order.clone() {
            let Some(mut object) = self.objects.remove(&id) else {
                continue;
            };

            match object.tick(dt, self, ctx) {
                Ok(Lifecycle::Alive) => {
                    self.objects.insert(id, object);
                }
                Ok(Lifecycle::Despawn) => {
                    self.order.retain(|other| *other != id);
                    self.index.remove(&mut object.body);
                }
                Err(e) => {
                    self.objects.insert(id, object);
                    return Err(e);
                }
            }
        }

        if let Some(target) = self.camera.target.and_then(|id| self.get(id)) {
            self.camera.screen = target.body.screen;
        }

        Ok(())
    }

    /// Draws the visible terrain, the tile grid, then every object.
    pub fn draw(&self, renderer: &mut dyn Renderer, screen_size: screen::Size2D) {
        let offset = screen::Vector2D::new(screen_size.width / 2.0, screen_size.height / 2.0)
            - self.camera.screen.to_vector();

        for layer in &self.layers {
            for chunk in &layer.chunks {
                if !self.is_chunk_visible(chunk, screen_size) {
                    continue;
                }
                for cell in chunk.cells_by_depth() {
                    renderer.draw_cell(cell, cell.screen + offset);
                }
            }
        }

        for (from, to) in &self.grid {
            renderer.draw_grid_line(*from + offset, *to + offset);
        }

        for object in self.objects() {
            renderer.draw_object(object, object.body.screen + offset, self);
        }
    }

    fn is_chunk_visible(&self, chunk: &Chunk, screen_size: screen::Size2D) -> bool {
        let camera = self.camera.screen;
        let chunk_area = screen::Box2D::new(
            screen::Point2D::new(chunk.screen.x - chunk.screen_size.width / 2.0, chunk.screen.y),
            screen::Point2D::new(
                chunk.screen.x + chunk.screen_size.width / 2.0,
                chunk.screen.y + chunk.screen_size.height,
            ),
        );
        let view = screen::Box2D::new(
            camera - screen_size.to_vector() / 2.0,
            camera + screen_size.to_vector() / 2.0,
        );

        chunk_area.intersects(&view)
    }
}

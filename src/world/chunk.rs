use std::collections::{BTreeSet, HashMap};
use std::ops::RangeInclusive;

use ndarray::Array2;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

use crate::assets::ImageKey;
use crate::math::units::{map, screen, world};
use crate::math::{to_screen, TileDimensions};
use crate::objects::{Body, ObjectId};

/// Surface label of a single tile.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Display, EnumIter, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Terrain {
    Road,
    Dirt,
    Grass,
    Sand,
    Water,
    #[default]
    Void,
    Meringue,
}

impl Terrain {
    /// Speed cap for cars on this surface, in tiles per millisecond.
    pub fn max_speed(&self) -> f64 {
        match self {
            Terrain::Road => 0.004,
            Terrain::Dirt => 0.001,
            Terrain::Grass => 0.002,
            Terrain::Sand => 0.0005,
            Terrain::Void => 1.0,
            Terrain::Water => 0.0,
            Terrain::Meringue => 0.02,
        }
    }

    /// Driving onto these surfaces wrecks the car.
    pub fn is_deadly(&self) -> bool {
        matches!(self, Terrain::Water | Terrain::Void)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Cell {
    /// Tile coordinates of this cell
    pub position: map::Point2D,
    pub screen: screen::Point2D,
    pub terrain: Terrain,
    /// `None` for the empty tile
    pub image: Option<ImageKey>,
    pub offset: screen::Vector2D,
}

/// A fixed-size block of cells. Immutable once built; which objects overlap
/// it is tracked by [`ChunkIndex`].
#[derive(Clone, Debug)]
pub struct Chunk {
    pub origin: map::Point2D,
    pub size: map::Size2D,
    /// Top corner of the chunk on screen
    pub screen: screen::Point2D,
    pub screen_size: screen::Size2D,
    cells: Array2<Cell>,
    depth_order: Vec<(usize, usize)>,
}

impl Chunk {
    /// Builds a chunk from its cells in row-major order.
    ///
    /// Returns `None` when the number of cells doesn't match the size.
    pub fn new(origin: map::Point2D, size: map::Size2D, cells: Vec<Cell>, tile: TileDimensions) -> Option<Self> {
        let shape = (size.height.max(0) as usize, size.width.max(0) as usize);
        let cells = Array2::from_shape_vec(shape, cells).ok()?;

        let mut depth_order: Vec<_> = cells.indexed_iter().map(|(index, _)| index).collect();
        depth_order.sort_by(|a, b| cells[*a].screen.y.total_cmp(&cells[*b].screen.y));

        let screen = to_screen(origin.to_f64().cast_unit(), tile);
        let screen_size = screen::Size2D::new(
            to_screen(world::Point2D::new(size.width as f64, 0.0), tile).x * 2.0,
            to_screen(world::Point2D::new(size.width as f64, size.height as f64), tile).y,
        );

        Some(Self {
            origin,
            size,
            screen,
            screen_size,
            cells,
            depth_order,
        })
    }

    pub fn bounds(&self) -> world::Box2D {
        let min = self.origin.to_f64().cast_unit();
        world::Box2D::new(min, min + self.size.to_f64().cast_unit())
    }

    /// Cell at a local column/row, `(0, 0)` being the chunk origin.
    pub fn cell(&self, col: i64, row: i64) -> Option<&Cell> {
        if col < 0 || row < 0 {
            return None;
        }
        self.cells.get((row as usize, col as usize))
    }

    pub fn cells(&self) -> impl Iterator<Item = &Cell> {
        self.cells.iter()
    }

    /// Cells ordered back to front for drawing.
    pub fn cells_by_depth(&self) -> impl Iterator<Item = &Cell> {
        self.depth_order.iter().map(|index| &self.cells[*index])
    }

    pub fn terrain_at(&self, point: world::Point2D) -> Terrain {
        let col = (point.x - self.origin.x as f64).floor() as i64;
        let row = (point.y - self.origin.y as f64).floor() as i64;

        self.cell(col, row).map(|cell| cell.terrain).unwrap_or_default()
    }
}

#[derive(Clone, Debug)]
pub struct CellLayer {
    pub name: String,
    pub size: map::Size2D,
    pub chunks: Vec<Chunk>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChunkId(usize);

impl ChunkId {
    pub fn raw(&self) -> usize {
        self.0
    }
}

/// Spatial index over the chunks of the terrain layer.
///
/// Chunks are looked up by their chunk-grid column and row. Membership is
/// kept on both sides: each chunk knows the objects overlapping it and each
/// [`Body`] knows its chunks, both as plain ids.
#[derive(Clone, Debug)]
pub struct ChunkIndex {
    chunk_size: world::Size2D,
    lookup: HashMap<i32, HashMap<i32, ChunkId>>,
    bounds: Vec<world::Box2D>,
    members: Vec<BTreeSet<ObjectId>>,
}

impl ChunkIndex {
    /// Indexes `chunks`, which must all share the same size.
    pub fn new(chunks: &[Chunk]) -> Self {
        let chunk_size = chunks
            .first()
            .map(|chunk| chunk.size.to_f64().cast_unit())
            .unwrap_or(world::Size2D::new(1.0, 1.0));

        let mut lookup: HashMap<i32, HashMap<i32, ChunkId>> = HashMap::new();
        for (index, chunk) in chunks.iter().enumerate() {
            let col = chunk.origin.x.div_euclid(chunk.size.width.max(1));
            let row = chunk.origin.y.div_euclid(chunk.size.height.max(1));
            lookup.entry(col).or_default().insert(row, ChunkId(index));
        }

        Self {
            chunk_size,
            lookup,
            bounds: chunks.iter().map(Chunk::bounds).collect(),
            members: vec![BTreeSet::new(); chunks.len()],
        }
    }

    pub fn chunk_size(&self) -> world::Size2D {
        self.chunk_size
    }

    pub fn len(&self) -> usize {
        self.bounds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bounds.is_empty()
    }

    fn grid(&self, col: i32, row: i32) -> Option<ChunkId> {
        self.lookup.get(&col).and_then(|rows| rows.get(&row)).copied()
    }

    pub fn chunk_containing(&self, point: world::Point2D) -> Option<ChunkId> {
        let col = (point.x / self.chunk_size.width).floor() as i32;
        let row = (point.y / self.chunk_size.height).floor() as i32;
        self.grid(col, row)
    }

    /// Every chunk whose rectangle intersects `area`, treated as half-open.
    ///
    /// A degenerate area is a point and yields the chunk containing it.
    pub fn chunks_overlapping(&self, area: &world::Box2D) -> BTreeSet<ChunkId> {
        let cols = grid_span(area.min.x, area.max.x, self.chunk_size.width);
        let rows = grid_span(area.min.y, area.max.y, self.chunk_size.height);

        let mut chunks = BTreeSet::new();
        for col in cols {
            for row in rows.clone() {
                if let Some(chunk) = self.grid(col, row) {
                    chunks.insert(chunk);
                }
            }
        }
        chunks
    }

    /// Recomputes which chunks `body` overlaps, updating both sides.
    pub fn reindex(&mut self, body: &mut Body) {
        self.remove(body);

        let chunks = self.chunks_overlapping(&body.bounding_box());
        for chunk in &chunks {
            if let Some(members) = self.members.get_mut(chunk.0) {
                members.insert(body.id);
            }
        }
        body.chunks = chunks;
    }

    /// Drops `body` from every chunk it was in.
    pub fn remove(&mut self, body: &mut Body) {
        for chunk in std::mem::take(&mut body.chunks) {
            if let Some(members) = self.members.get_mut(chunk.0) {
                members.remove(&body.id);
            }
        }
    }

    pub fn objects_in(&self, chunk: ChunkId) -> impl Iterator<Item = ObjectId> + '_ {
        self.members.get(chunk.0).into_iter().flatten().copied()
    }

    pub fn bounds(&self, chunk: ChunkId) -> Option<world::Box2D> {
        self.bounds.get(chunk.0).copied()
    }

    pub fn all_bounds(&self) -> impl Iterator<Item = (ChunkId, world::Box2D)> + '_ {
        self.bounds.iter().enumerate().map(|(index, bounds)| (ChunkId(index), *bounds))
    }
}

/// Chunk-grid cells covered by `[min, max)` along one axis, stepping one
/// chunk at a time from the cell holding `min`.
fn grid_span(min: f64, max: f64, step: f64) -> RangeInclusive<i32> {
    let first = (min / step).floor() as i32;
    let last = if max > min {
        (max / step).ceil() as i32 - 1
    } else {
        first
    };
    first..=last.max(first)
}

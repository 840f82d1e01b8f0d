use std::collections::{HashMap, HashSet};
use std::str::FromStr;

use rand::Rng;
use thiserror::Error;

use super::chunk::{Cell, CellLayer, Chunk, Terrain};
use super::document::{ChunkDocument, MapDocument, ObjectDocument, TileLayerDocument, TilesetDocument, TilesetRef};
use super::{World, WorldInfo};
use crate::assets::{load_json, AssetLoader, ImageKey, LoadError, SpriteTable};
use crate::ensure;
use crate::math::units::{map, screen, world};
use crate::math::{to_screen, TileDimensions};
use crate::objects::{car, package, Car, GameObject, ObjectId, ObjectKind, ObjectType, Package, RespawnPoint, Shape};

/// Asset paths inside the map document are relative to this directory.
const MAP_ROOT: &str = "maps/";

#[derive(Debug, Error)]
pub enum MapError {
    #[error("layers with offsets are not supported")]
    LayerOffset,
    #[error("non-uniform chunk sizes are not supported")]
    NonUniformChunks,
    #[error("chunk at ({0}, {1}) has the wrong number of tiles")]
    ChunkDataLength(i32, i32),
    #[error("the map has no tile layers")]
    NoTileLayers,
    #[error("unrecognized terrain {0}")]
    UnknownTerrain(String),
    #[error("no image for tile {0}")]
    MissingTileImage(u32),
    #[error("unknown object type {0:?}")]
    UnknownObjectType(String),
    #[error("package {0} has no delivery zone")]
    MissingDeliveryZone(ObjectId),
    #[error(transparent)]
    Load(#[from] LoadError),
}

#[derive(Clone, Copy, Debug)]
struct Tile {
    image: Option<ImageKey>,
    terrain: Terrain,
    offset: screen::Vector2D,
}

impl World {
    /// Builds a world from a map document, loading every tile image it uses
    /// and instantiating its objects by their declared type.
    pub fn from_document<L, R>(document: &MapDocument, loader: &mut L, rng: &mut R) -> Result<Self, MapError>
    where
        L: AssetLoader + ?Sized,
        R: Rng + ?Sized,
    {
        let tile = TileDimensions::new(document.tilewidth as f32, document.tileheight as f32);
        let tiles = load_tiles(document, loader)?;

        let layers = document
            .tile_layers()
            .map(|layer| to_layer(layer, &tiles, tile))
            .collect::<Result<Vec<_>, _>>()?;
        ensure!(!layers.is_empty(), MapError::NoTileLayers);

        let info = WorldInfo {
            size: map::Size2D::new(document.width as i32, document.height as i32),
            tile,
        };
        let sprites = SpriteTable::load(loader)?;
        let mut world = World::new(info, layers, sprites);

        let scale = document.tileheight.max(1) as f64;
        let objects: Vec<&ObjectDocument> = document.object_groups().flat_map(|group| &group.objects).collect();
        let zones: HashSet<u32> = objects
            .iter()
            .filter(|object| object.kind == ObjectType::DeliveryZone.to_string())
            .map(|object| object.id)
            .collect();

        for object in objects {
            world.add(to_object(object, scale, &zones, rng)?);
        }

        log::debug!(
            "built {}x{} map with {} layers, {} chunks and {} objects",
            document.width,
            document.height,
            world.layers().len(),
            world.chunk_index().len(),
            world.objects().count()
        );

        Ok(world)
    }
}

/// Tile table for every tile id the layers actually use.
fn load_tiles<L>(document: &MapDocument, loader: &mut L) -> Result<HashMap<u32, Tile>, MapError>
where
    L: AssetLoader + ?Sized,
{
    let used: HashSet<u32> = document
        .tile_layers()
        .flat_map(|layer| layer.chunks())
        .flat_map(|chunk| chunk.data)
        .collect();

    let mut tiles = HashMap::new();
    tiles.insert(
        0,
        Tile {
            image: None,
            terrain: Terrain::Void,
            offset: screen::Vector2D::zero(),
        },
    );

    for tileset in &document.tilesets {
        let tileset = resolve_tileset(tileset, loader)?;
        let offset = tileset
            .tileoffset
            .map(|offset| screen::Vector2D::new(offset.x, offset.y))
            .unwrap_or_default();

        for tile in &tileset.tiles {
            let id = tile.id + tileset.firstgid;
            if !used.contains(&id) {
                continue;
            }

            let terrain = match &tile.kind {
                Some(kind) => Terrain::from_str(kind).map_err(|_| MapError::UnknownTerrain(kind.clone()))?,
                None => Terrain::Void,
            };
            let image = loader.load_image(&format!("{MAP_ROOT}{}", tile.image))?;

            tiles.insert(
                id,
                Tile {
                    image: Some(image),
                    terrain,
                    offset,
                },
            );
        }
    }

    Ok(tiles)
}

fn resolve_tileset<L>(tileset: &TilesetRef, loader: &mut L) -> Result<TilesetDocument, LoadError>
where
    L: AssetLoader + ?Sized,
{
    match tileset {
        TilesetRef::Inline(tileset) => Ok(tileset.clone()),
        TilesetRef::External { firstgid, source } => {
            let mut tileset: TilesetDocument = load_json(loader, &format!("{MAP_ROOT}{source}"))?;
            tileset.firstgid = *firstgid;
            Ok(tileset)
        }
    }
}

fn to_layer(layer: &TileLayerDocument, tiles: &HashMap<u32, Tile>, tile: TileDimensions) -> Result<CellLayer, MapError> {
    ensure!(layer.startx == 0 && layer.starty == 0, MapError::LayerOffset);

    let chunks = layer
        .chunks()
        .iter()
        .map(|chunk| to_chunk(chunk, tiles, tile))
        .collect::<Result<Vec<_>, _>>()?;

    if let Some(first) = chunks.first() {
        ensure!(chunks.iter().all(|chunk| chunk.size == first.size), MapError::NonUniformChunks);
    }

    Ok(CellLayer {
        name: layer.name.clone(),
        size: map::Size2D::new(layer.width, layer.height),
        chunks,
    })
}

fn to_chunk(chunk: &ChunkDocument, tiles: &HashMap<u32, Tile>, tile: TileDimensions) -> Result<Chunk, MapError> {
    let width = chunk.width.max(1);
    let cells = chunk
        .data
        .iter()
        .enumerate()
        .map(|(i, id)| {
            let i = i as i32;
            let position = map::Point2D::new(chunk.x + i % width, chunk.y + i / width);
            let info = tiles.get(id).ok_or(MapError::MissingTileImage(*id))?;

            Ok(Cell {
                position,
                screen: to_screen(position.to_f64().cast_unit(), tile),
                terrain: info.terrain,
                image: info.image,
                offset: info.offset,
            })
        })
        .collect::<Result<Vec<_>, MapError>>()?;

    let origin = map::Point2D::new(chunk.x, chunk.y);
    let size = map::Size2D::new(chunk.width, chunk.height);
    Chunk::new(origin, size, cells, tile).ok_or(MapError::ChunkDataLength(chunk.x, chunk.y))
}

fn to_object<R>(object: &ObjectDocument, scale: f64, zones: &HashSet<u32>, rng: &mut R) -> Result<GameObject, MapError>
where
    R: Rng + ?Sized,
{
    let id = ObjectId(object.id);
    let position = world::Point2D::new(object.x / scale, object.y / scale);
    let size = world::Size2D::new(object.width / scale, object.height / scale);
    let direction = object
        .property("direction")
        .and_then(|value| value.as_f64())
        .map(|degrees| -degrees / 180.0 * std::f64::consts::PI)
        .unwrap_or(0.0);

    let kind = ObjectType::from_str(&object.kind).map_err(|_| MapError::UnknownObjectType(object.kind.clone()))?;
    let (shape, kind) = match kind {
        ObjectType::Car => (
            Shape::Circle { radius: car::RADIUS },
            ObjectKind::Car(Car::new(direction)),
        ),
        ObjectType::Obstacle => (Shape::Rect { size }, ObjectKind::Obstacle),
        ObjectType::DeliveryZone => (Shape::Rect { size }, ObjectKind::DeliveryZone),
        ObjectType::PackageSpawn => (Shape::Point, ObjectKind::PackageSpawn),
        ObjectType::RespawnPoint => (Shape::Point, ObjectKind::RespawnPoint(RespawnPoint { direction })),
        ObjectType::Package => {
            let zone = object
                .property("deliveryZone")
                .and_then(|value| value.as_u64())
                .and_then(|zone| u32::try_from(zone).ok())
                .filter(|zone| zones.contains(zone))
                .ok_or(MapError::MissingDeliveryZone(id))?;

            (
                Shape::Circle {
                    radius: package::RADIUS,
                },
                ObjectKind::Package(Package::new(ObjectId(zone), None, rng)),
            )
        }
        // only exists at runtime
        ObjectType::GhostCar => return Err(MapError::UnknownObjectType(object.kind.clone())),
    };

    Ok(GameObject::new(id, position, shape, kind).with_name(&object.name))
}

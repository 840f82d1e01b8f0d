//! Small in-memory worlds for unit tests.

use std::collections::{HashMap, HashSet};

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::assets::{AssetLoader, ImageCache, ImageKey, LoadError};
use crate::config::{DebugFlags, EconomyConfig};
use crate::economy::{Economy, EconomyError};
use crate::math::units::world;
use crate::objects::{package, ObjectId, ObjectKind, Package, Shape};
use crate::services::{AudioCommand, AudioQueue, Cue, InputState, MessageBar, SimulationContext};
use crate::world::document::{
    ChunkDocument, LayerDocument, MapDocument, ObjectDocument, ObjectGroupDocument, PropertyDocument,
    TileDocument, TileLayerDocument, TilesetDocument, TilesetRef,
};
use crate::world::World;

pub const TILE_WIDTH: u32 = 64;
pub const TILE_HEIGHT: u32 = 32;

/// Serves files from memory. Every image path loads unless it was broken on purpose.
#[derive(Debug, Default)]
pub struct MemoryAssets {
    files: HashMap<String, String>,
    images: ImageCache<String>,
    loaded: HashSet<String>,
    audio: Vec<String>,
    broken: HashSet<String>,
}

impl MemoryAssets {
    pub fn insert_file(&mut self, path: &str, contents: &str) {
        self.files.insert(path.to_owned(), contents.to_owned());
    }

    /// Makes every later load of `path` fail.
    pub fn break_path(&mut self, path: &str) {
        self.broken.insert(path.to_owned());
    }

    pub fn loaded_image(&self, path: &str) -> bool {
        self.loaded.contains(path)
    }

    pub fn audio(&self) -> &[String] {
        &self.audio
    }

    fn check(&self, path: &str) -> Result<(), LoadError> {
        if self.broken.contains(path) {
            return Err(LoadError::fetch(path, "404 Not Found"));
        }
        Ok(())
    }
}

impl AssetLoader for MemoryAssets {
    fn load_image(&mut self, path: &str) -> Result<ImageKey, LoadError> {
        self.check(path)?;
        let key = self
            .images
            .get_or_load(path, |path| Ok::<_, LoadError>(path.to_owned()))?;
        self.loaded.insert(path.to_owned());
        Ok(key)
    }

    fn load_text(&mut self, path: &str) -> Result<String, LoadError> {
        self.check(path)?;
        self.files
            .get(path)
            .cloned()
            .ok_or_else(|| LoadError::fetch(path, "404 Not Found"))
    }

    fn load_audio(&mut self, path: &str, name: &str) -> Result<(), LoadError> {
        self.check(path)?;
        self.audio.push(name.to_owned());
        Ok(())
    }
}

const TERRAIN_TILES: [(char, &str); 6] = [
    ('r', "road"),
    ('d', "dirt"),
    ('g', "grass"),
    ('s', "sand"),
    ('w', "water"),
    ('m', "meringue"),
];

fn tile_id(c: char) -> u32 {
    TERRAIN_TILES
        .iter()
        .position(|(tile, _)| *tile == c)
        .map(|index| index as u32 + 1)
        .unwrap_or(0)
}

/// A map drawn as rows of terrain letters (`r`oad, `d`irt, `g`rass, `s`and,
/// `w`ater, `m`eringue, `.` for nothing), split into square chunks. The grid
/// is padded with empty tiles up to a whole number of chunks.
pub fn grid_document(rows: &[&str], chunk_size: i32) -> MapDocument {
    let height = rows.len() as i32;
    let width = rows.iter().map(|row| row.chars().count()).max().unwrap_or(0) as i32;
    let tile = |x: i32, y: i32| {
        rows.get(y as usize)
            .and_then(|row| row.chars().nth(x as usize))
            .map(tile_id)
            .unwrap_or(0)
    };

    let mut chunks = Vec::new();
    for cy in 0..(height + chunk_size - 1) / chunk_size {
        for cx in 0..(width + chunk_size - 1) / chunk_size {
            let (x, y) = (cx * chunk_size, cy * chunk_size);
            let mut data = Vec::with_capacity((chunk_size * chunk_size) as usize);
            for row in y..y + chunk_size {
                for col in x..x + chunk_size {
                    data.push(tile(col, row));
                }
            }
            chunks.push(ChunkDocument {
                x,
                y,
                width: chunk_size,
                height: chunk_size,
                data,
            });
        }
    }

    let tiles = TERRAIN_TILES
        .iter()
        .enumerate()
        .map(|(id, (_, terrain))| TileDocument {
            id: id as u32,
            image: format!("tiles/{terrain}.png"),
            kind: Some(terrain.to_string()),
        })
        .collect();

    MapDocument {
        width: width as u32,
        height: height as u32,
        tilewidth: TILE_WIDTH,
        tileheight: TILE_HEIGHT,
        layers: vec![LayerDocument::TileLayer(TileLayerDocument {
            name: String::from("ground"),
            width,
            height,
            startx: 0,
            starty: 0,
            data: None,
            chunks,
        })],
        tilesets: vec![TilesetRef::Inline(TilesetDocument {
            firstgid: 1,
            tiles,
            tileoffset: None,
        })],
    }
}

/// A map object at `(x, y)` in tiles.
pub fn object(id: u32, kind: &str, x: f64, y: f64) -> ObjectDocument {
    let scale = f64::from(TILE_HEIGHT);
    ObjectDocument {
        id,
        name: String::new(),
        kind: kind.to_owned(),
        x: x * scale,
        y: y * scale,
        width: 0.0,
        height: 0.0,
        properties: Vec::new(),
    }
}

impl ObjectDocument {
    /// Sets the size in tiles.
    pub fn sized(mut self, width: f64, height: f64) -> Self {
        let scale = f64::from(TILE_HEIGHT);
        self.width = width * scale;
        self.height = height * scale;
        self
    }

    pub fn with_property(mut self, name: &str, value: serde_json::Value) -> Self {
        self.properties.push(PropertyDocument {
            name: name.to_owned(),
            value,
        });
        self
    }
}

pub fn object_group(objects: &[ObjectDocument]) -> LayerDocument {
    LayerDocument::ObjectGroup(ObjectGroupDocument {
        name: String::from("objects"),
        objects: objects.to_vec(),
    })
}

pub fn world_from(mut document: MapDocument, objects: &[ObjectDocument]) -> World {
    document.layers.push(object_group(objects));
    World::from_document(&document, &mut MemoryAssets::default(), &mut StdRng::seed_from_u64(0)).unwrap()
}

/// A world plus everything needed to tick it.
pub struct Harness {
    pub world: World,
    pub economy: Economy,
    pub audio: AudioQueue,
    pub messages: MessageBar,
    pub rng: StdRng,
    pub input: InputState,
    pub debug: DebugFlags,
}

impl Harness {
    pub fn new(document: MapDocument, objects: &[ObjectDocument]) -> Self {
        Self {
            world: world_from(document, objects),
            economy: Economy::dynamic(&EconomyConfig::default()),
            audio: AudioQueue::new(),
            messages: MessageBar::default(),
            rng: StdRng::seed_from_u64(0),
            input: InputState::default(),
            debug: DebugFlags::default(),
        }
    }

    /// Ticks the world only; the economy is left alone.
    pub fn tick(&mut self, dt: f64) -> Result<(), EconomyError> {
        let mut ctx = SimulationContext {
            economy: &mut self.economy,
            audio: &mut self.audio,
            hud: &mut self.messages,
            input: self.input,
            debug: self.debug,
        };
        self.world.tick(dt, &mut ctx)
    }

    pub fn spawn_package(&mut self, x: f64, y: f64, zone: ObjectId) -> ObjectId {
        let package = Package::new(zone, None, &mut self.rng);
        self.world.spawn(
            world::Point2D::new(x, y),
            Shape::Circle {
                radius: package::RADIUS,
            },
            ObjectKind::Package(package),
        )
    }

    /// Moves an object without ticking it.
    pub fn teleport(&mut self, id: ObjectId, position: world::Point2D) {
        let mut body = self.world.get(id).unwrap().body.clone();
        body.position = position;
        self.world.reindex(&mut body);
        self.world.get_mut(id).unwrap().body = body;
    }
}

impl AudioQueue {
    /// Number of times `cue` was started since the queue was last drained.
    pub fn plays(&self, cue: Cue) -> usize {
        self.commands()
            .iter()
            .filter(|command| matches!(command, AudioCommand::Play { name, .. } if name == cue.as_ref()))
            .count()
    }

    pub fn last_playback_rate(&self, cue: Cue) -> Option<f64> {
        self.commands().iter().rev().find_map(|command| match command {
            AudioCommand::SetPlaybackRate(name, rate) if name == cue.as_ref() => Some(*rate),
            _ => None,
        })
    }
}

use std::collections::HashMap;
use std::fmt::Display;

use serde::de::DeserializeOwned;
use strum::IntoEnumIterator;
use thiserror::Error;

use crate::objects::car::CarSprite;
use crate::services::Cue;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to load {path}: {reason}")]
    Fetch { path: String, reason: String },
    #[error("failed to parse {path}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

impl LoadError {
    pub fn fetch(path: &str, reason: impl Display) -> Self {
        Self::Fetch {
            path: path.to_owned(),
            reason: reason.to_string(),
        }
    }
}

/// Opaque handle to an image owned by whoever implements [`AssetLoader`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ImageKey(pub u32);

/// Blocking asset access. Anything that fails to load aborts construction of
/// whatever needed it.
pub trait AssetLoader {
    /// Loads an image, handing back the same key for repeated paths.
    fn load_image(&mut self, path: &str) -> Result<ImageKey, LoadError>;
    fn load_text(&mut self, path: &str) -> Result<String, LoadError>;
    /// Loads a sound and registers it under `name`.
    fn load_audio(&mut self, path: &str, name: &str) -> Result<(), LoadError>;
}

pub fn load_json<T, L>(loader: &mut L, path: &str) -> Result<T, LoadError>
where
    T: DeserializeOwned,
    L: AssetLoader + ?Sized,
{
    let contents = loader.load_text(path)?;
    serde_json::from_str(&contents).map_err(|source| LoadError::Parse {
        path: path.to_owned(),
        source,
    })
}

/// Registers every [`Cue`] with the loader.
pub fn load_cues<L: AssetLoader + ?Sized>(loader: &mut L) -> Result<(), LoadError> {
    for cue in Cue::iter() {
        loader.load_audio(cue.path(), cue.as_ref())?;
    }
    Ok(())
}

/// Path-keyed image storage shared by loader implementations.
#[derive(Debug)]
pub struct ImageCache<T> {
    keys: HashMap<String, ImageKey>,
    images: Vec<T>,
}

impl<T> Default for ImageCache<T> {
    fn default() -> Self {
        Self {
            keys: HashMap::new(),
            images: Vec::new(),
        }
    }
}

impl<T> ImageCache<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_load<E, F>(&mut self, path: &str, load: F) -> Result<ImageKey, LoadError>
    where
        E: Display,
        F: FnOnce(&str) -> Result<T, E>,
    {
        if let Some(key) = self.keys.get(path) {
            return Ok(*key);
        }

        let image = load(path).map_err(|e| LoadError::fetch(path, e))?;
        let key = ImageKey(self.images.len() as u32);
        self.images.push(image);
        self.keys.insert(path.to_owned(), key);

        Ok(key)
    }

    pub fn get(&self, key: ImageKey) -> Option<&T> {
        self.images.get(key.0 as usize)
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }
}

pub const CAR_SPRITES: [&str; 8] = [
    "images/car/carBlue6_011.png",
    "images/car/carBlue6_012.png",
    "images/car/carBlue6_006.png",
    "images/car/carBlue6_005.png",
    "images/car/carBlue6_004.png",
    "images/car/carBlue6_009.png",
    "images/car/carBlue6_010.png",
    "images/car/carBlue6_015.png",
];

pub const CAR_BACKUP_SPRITES: [&str; 8] = [
    "images/car/carBlue6_011.png",
    "images/car/carBlue6_012_backup.png",
    "images/car/carBlue6_006_backup.png",
    "images/car/carBlue6_005_backup.png",
    "images/car/carBlue6_004_backup.png",
    "images/car/carBlue6_009_backup.png",
    "images/car/carBlue6_010.png",
    "images/car/carBlue6_015.png",
];

pub const PACKAGE_SPRITES: [&str; 3] = [
    "images/items/package.png",
    "images/items/box1.png",
    "images/items/box2.png",
];

/// Sprites needed by the world's objects, loaded before the first tick.
#[derive(Clone, Debug, PartialEq)]
pub struct SpriteTable {
    pub car: [ImageKey; 8],
    pub car_backup: [ImageKey; 8],
    pub packages: [ImageKey; 3],
}

impl SpriteTable {
    pub fn load<L: AssetLoader + ?Sized>(loader: &mut L) -> Result<Self, LoadError> {
        Ok(Self {
            car: load_all(loader, &CAR_SPRITES)?,
            car_backup: load_all(loader, &CAR_BACKUP_SPRITES)?,
            packages: load_all(loader, &PACKAGE_SPRITES)?,
        })
    }

    pub fn car(&self, sprite: CarSprite) -> ImageKey {
        let table = if sprite.backup { &self.car_backup } else { &self.car };
        table[sprite.index % table.len()]
    }

    pub fn package(&self, variant: usize) -> ImageKey {
        self.packages[variant % self.packages.len()]
    }
}

fn load_all<L, const N: usize>(loader: &mut L, paths: &[&str; N]) -> Result<[ImageKey; N], LoadError>
where
    L: AssetLoader + ?Sized,
{
    let mut keys = [ImageKey(0); N];
    for (key, path) in keys.iter_mut().zip(paths) {
        *key = loader.load_image(path)?;
    }
    Ok(keys)
}

//! Serde model of the tile-map document, a subset of the Tiled JSON format.

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MapDocument {
    pub width: u32,
    pub height: u32,
    pub tilewidth: u32,
    pub tileheight: u32,
    pub layers: Vec<LayerDocument>,
    #[serde(default)]
    pub tilesets: Vec<TilesetRef>,
}

impl MapDocument {
    pub fn tile_layers(&self) -> impl Iterator<Item = &TileLayerDocument> {
        self.layers.iter().filter_map(|layer| match layer {
            LayerDocument::TileLayer(layer) => Some(layer),
            _ => None,
        })
    }

    pub fn object_groups(&self) -> impl Iterator<Item = &ObjectGroupDocument> {
        self.layers.iter().filter_map(|layer| match layer {
            LayerDocument::ObjectGroup(group) => Some(group),
            _ => None,
        })
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum LayerDocument {
    TileLayer(TileLayerDocument),
    ObjectGroup(ObjectGroupDocument),
    /// Image and group layers carry nothing the simulation uses
    #[serde(other)]
    Unsupported,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TileLayerDocument {
    #[serde(default)]
    pub name: String,
    pub width: i32,
    pub height: i32,
    #[serde(default)]
    pub startx: i32,
    #[serde(default)]
    pub starty: i32,
    /// Finite maps store their tiles inline...
    #[serde(default)]
    pub data: Option<Vec<u32>>,
    /// ...infinite ones split them into chunks
    #[serde(default)]
    pub chunks: Vec<ChunkDocument>,
}

impl TileLayerDocument {
    /// The layer's tiles as chunks, treating inline data as one chunk at the origin.
    pub fn chunks(&self) -> Vec<ChunkDocument> {
        match &self.data {
            Some(data) => vec![ChunkDocument {
                x: 0,
                y: 0,
                width: self.width,
                height: self.height,
                data: data.clone(),
            }],
            None => self.chunks.clone(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChunkDocument {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
    pub data: Vec<u32>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ObjectGroupDocument {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub objects: Vec<ObjectDocument>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ObjectDocument {
    pub id: u32,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", alias = "class", default)]
    pub kind: String,
    /// Pixels, measured in tile heights
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub width: f64,
    #[serde(default)]
    pub height: f64,
    #[serde(default)]
    pub properties: Vec<PropertyDocument>,
}

impl ObjectDocument {
    pub fn property(&self, name: &str) -> Option<&serde_json::Value> {
        self.properties
            .iter()
            .find(|property| property.name == name)
            .map(|property| &property.value)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PropertyDocument {
    pub name: String,
    pub value: serde_json::Value,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TilesetRef {
    External { firstgid: u32, source: String },
    Inline(TilesetDocument),
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TilesetDocument {
    /// Absent in external tileset files, filled in from the referencing map
    #[serde(default)]
    pub firstgid: u32,
    #[serde(default)]
    pub tiles: Vec<TileDocument>,
    #[serde(default)]
    pub tileoffset: Option<TileOffset>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TileOffset {
    pub x: f32,
    pub y: f32,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TileDocument {
    pub id: u32,
    pub image: String,
    #[serde(rename = "type", alias = "class", default)]
    pub kind: Option<String>,
}

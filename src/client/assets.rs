use std::collections::HashMap;
use std::io::Read;

use courier::assets::{AssetLoader, ImageCache, ImageKey, LoadError};
use courier::services::AudioCommand;
use ggez::audio::{SoundSource, Source};
use ggez::graphics::Image;
use ggez::{Context, GameResult};

/// Images and sounds loaded through ggez, addressed by the keys and names the
/// simulation uses.
#[derive(Default)]
pub struct AssetCache {
    images: ImageCache<Image>,
    sounds: HashMap<String, Source>,
}

impl AssetCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn image(&self, key: ImageKey) -> Option<&Image> {
        self.images.get(key)
    }

    /// Plays back one request recorded by the simulation.
    pub fn apply(&mut self, ctx: &Context, command: AudioCommand) -> GameResult {
        let Some(source) = self.sounds.get_mut(command.name()) else {
            log::warn!("no sound registered as {:?}", command.name());
            return Ok(());
        };

        match command {
            AudioCommand::Play { looping, .. } => {
                source.set_repeat(looping.is_some());
                source.play(ctx)
            }
            AudioCommand::Stop(_) => source.stop(ctx),
            AudioCommand::SetPlaybackRate(_, rate) => {
                source.set_pitch(rate as f32);
                Ok(())
            }
            // ggez can't seek, so music starts from the top
            AudioCommand::PlayMusic { .. } => {
                source.set_repeat(true);
                source.play(ctx)
            }
        }
    }

    pub fn stop_all(&mut self, ctx: &Context) -> GameResult {
        for source in self.sounds.values_mut() {
            source.stop(ctx)?;
        }
        Ok(())
    }
}

/// Loads through the ggez filesystem into an [`AssetCache`].
pub struct GgezLoader<'a> {
    ctx: &'a Context,
    assets: &'a mut AssetCache,
}

impl<'a> GgezLoader<'a> {
    pub fn new(ctx: &'a Context, assets: &'a mut AssetCache) -> Self {
        Self { ctx, assets }
    }
}

impl AssetLoader for GgezLoader<'_> {
    fn load_image(&mut self, path: &str) -> Result<ImageKey, LoadError> {
        let ctx = self.ctx;
        self.assets
            .images
            .get_or_load(path, |path| Image::from_path(ctx, resource_path(path)))
    }

    fn load_text(&mut self, path: &str) -> Result<String, LoadError> {
        let mut file = self
            .ctx
            .fs
            .open(resource_path(path))
            .map_err(|e| LoadError::fetch(path, e))?;

        let mut contents = String::new();
        file.read_to_string(&mut contents)
            .map_err(|e| LoadError::fetch(path, e))?;
        Ok(contents)
    }

    fn load_audio(&mut self, path: &str, name: &str) -> Result<(), LoadError> {
        let source = Source::new(self.ctx, resource_path(path)).map_err(|e| LoadError::fetch(path, e))?;
        self.assets.sounds.insert(name.to_owned(), source);
        Ok(())
    }
}

/// Turns an asset path into an absolute resource path, folding away `..`
/// segments since the ggez filesystem refuses them.
fn resource_path(path: &str) -> String {
    let mut parts: Vec<&str> = Vec::new();
    for part in path.split('/') {
        match part {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            part => parts.push(part),
        }
    }
    format!("/{}", parts.join("/"))
}

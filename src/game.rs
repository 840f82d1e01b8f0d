use anyhow::{Context, Result};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::assets::{load_cues, load_json, AssetLoader};
use crate::config::{Config, DebugFlags, GameMode};
use crate::economy::{Economy, EconomyError, GameStatus, TutorialScript};
use crate::math::units::screen;
use crate::services::{AudioQueue, InputState, MessageBar, SimulationContext};
use crate::world::document::MapDocument;
use crate::world::{Renderer, World};

/// One play session: the world, its economy and what they report back.
pub struct Game {
    pub world: World,
    pub economy: Economy,
    pub messages: MessageBar,
    /// Audio requested since the front-end last drained it
    pub audio: AudioQueue,
    rng: StdRng,
    debug: DebugFlags,
    status: GameStatus,
}

impl Game {
    /// Loads the map, its assets and the sounds, then starts the economy.
    pub fn load<L: AssetLoader + ?Sized>(loader: &mut L, config: &Config) -> Result<Self> {
        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let document: MapDocument =
            load_json(loader, &config.map).with_context(|| format!("loading map {}", config.map))?;
        let world = World::from_document(&document, loader, &mut rng)
            .with_context(|| format!("building the world from {}", config.map))?;
        load_cues(loader).context("loading sounds")?;

        let mut economy = match config.mode {
            GameMode::Dynamic => Economy::dynamic(&config.economy),
            GameMode::Static { delay } => {
                let script: TutorialScript = load_json(loader, &config.tutorial)
                    .with_context(|| format!("loading tutorial {}", config.tutorial))?;
                Economy::tutorial(script, delay, config.debug.debug_mode)
            }
        };

        let mut audio = AudioQueue::new();
        economy.start(&mut audio);

        log::info!(
            "loaded {} ({:?} mode) with {} objects",
            config.map,
            config.mode,
            world.objects().count()
        );

        Ok(Self {
            world,
            economy,
            messages: MessageBar::default(),
            audio,
            rng,
            debug: config.debug,
            status: GameStatus::Running,
        })
    }

    pub fn status(&self) -> GameStatus {
        self.status
    }

    /// Advances the economy, then every object. Nothing moves once the
    /// session has ended.
    pub fn tick(&mut self, dt: f64, input: InputState) -> Result<GameStatus, EconomyError> {
        if self.status != GameStatus::Running {
            return Ok(self.status);
        }

        self.status = self
            .economy
            .tick(dt, &mut self.world, &mut self.messages, &mut self.audio, &mut self.rng)?;
        if self.status != GameStatus::Running {
            log::info!("session ended ({:?}) with a score of {}", self.status, self.economy.score());
            return Ok(self.status);
        }

        let mut ctx = SimulationContext {
            economy: &mut self.economy,
            audio: &mut self.audio,
            hud: &mut self.messages,
            input,
            debug: self.debug,
        };
        self.world.tick(dt, &mut ctx)?;

        Ok(self.status)
    }

    pub fn draw(&self, renderer: &mut dyn Renderer, screen_size: screen::Size2D) {
        self.world.draw(renderer, screen_size);
    }
}

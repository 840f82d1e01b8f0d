mod assets;
mod render;
mod utils;

use std::path::PathBuf;

use courier::config::{Config, GameMode};
use courier::economy::GameStatus;
use courier::game::Game;
use courier::math::units::screen;
use courier::services::InputState;
use ggez::conf::{WindowMode, WindowSetup};
use ggez::event::{self, EventHandler};
use ggez::glam::Vec2;
use ggez::graphics::{Canvas, Color, DrawParam, TextLayout};
use ggez::input::keyboard::{KeyCode, KeyInput, KeyboardContext};
use ggez::{Context, ContextBuilder, GameError, GameResult};

use assets::{AssetCache, GgezLoader};
use render::GgezRenderer;
use utils::{hud_text, status_line, OutlinedText};

const CONFIG_PATH: &str = "courier.toml";
const BACKGROUND: Color = Color::new(0.27, 0.55, 0.85, 1.0);

fn main() -> GameResult {
    #[cfg(debug_assertions)]
    env_logger::builder()
        .filter_level(log::LevelFilter::Debug)
        .write_style(env_logger::WriteStyle::Always)
        .init();
    #[cfg(not(debug_assertions))]
    env_logger::init();

    let mut cb = ContextBuilder::new("courier", "courier")
        .window_setup(WindowSetup::default().title("Courier").vsync(true))
        .window_mode(WindowMode::default().dimensions(1280.0, 720.0));

    if let Ok(runtime) = std::env::var("RUNTIME_PATH") {
        let runtime = PathBuf::from(runtime);
        let resources = runtime.join("resources");

        log::info!("Setting runtime to {}", runtime.display());
        std::env::set_current_dir(&runtime)?;

        log::info!("Adding {} to path", resources.display());
        cb = cb.add_resource_path(resources);
    }

    let config = Config::load(CONFIG_PATH).map_err(report)?;
    let (mut ctx, event_loop) = cb.build()?;

    let state = Courier::new(&mut ctx, config)?;
    event::run(ctx, event_loop, state)
}

fn report(error: anyhow::Error) -> GameError {
    GameError::CustomError(format!("{error:#}"))
}

struct Courier {
    config: Config,
    assets: AssetCache,
    game: Game,
}

impl Courier {
    fn new(ctx: &mut Context, config: Config) -> GameResult<Self> {
        let mut assets = AssetCache::new();
        let game = Game::load(&mut GgezLoader::new(ctx, &mut assets), &config).map_err(report)?;

        Ok(Self { config, assets, game })
    }

    /// Starts over in endless mode once the tutorial is done.
    fn leave_tutorial(&mut self, ctx: &mut Context) -> GameResult {
        log::info!("tutorial finished, starting the endless game");
        self.assets.stop_all(ctx)?;

        self.config.mode = GameMode::Dynamic;
        self.game = Game::load(&mut GgezLoader::new(ctx, &mut self.assets), &self.config).map_err(report)?;
        Ok(())
    }
}

fn read_input(keyboard: &KeyboardContext) -> InputState {
    let any = |keys: &[KeyCode]| keys.iter().any(|key| keyboard.is_key_pressed(*key));

    InputState {
        accelerate: any(&[KeyCode::W, KeyCode::Up]),
        turn_left: any(&[KeyCode::A, KeyCode::Left]),
        turn_right: any(&[KeyCode::D, KeyCode::Right]),
        brake: any(&[KeyCode::S, KeyCode::Down]),
    }
}

impl EventHandler for Courier {
    fn update(&mut self, ctx: &mut Context) -> GameResult {
        let dt = ctx.time.delta().as_secs_f64() * 1000.0;
        let input = read_input(&ctx.keyboard);

        let status = self
            .game
            .tick(dt, input)
            .map_err(|e| GameError::CustomError(e.to_string()))?;

        for command in self.game.audio.drain() {
            if let Err(e) = self.assets.apply(ctx, command) {
                log::warn!("audio failed: {e}");
            }
        }

        if status == GameStatus::TutorialFinished {
            self.leave_tutorial(ctx)?;
        }

        Ok(())
    }

    fn draw(&mut self, ctx: &mut Context) -> GameResult {
        let (width, height) = ctx.gfx.drawable_size();
        let mut canvas = Canvas::from_frame(ctx, BACKGROUND);

        let mut renderer =
            GgezRenderer::new(ctx, &mut canvas, &self.assets).show_zones(self.config.debug.debug_mode);
        self.game.draw(&mut renderer, screen::Size2D::new(width, height));

        let message = hud_text(self.game.messages.message(), 24.0);
        canvas.draw(
            &OutlinedText::new(&message),
            DrawParam::default().dest(Vec2::new(16.0, height - 40.0)).color(Color::WHITE),
        );

        let status = hud_text(status_line(&self.game.economy), 20.0);
        canvas.draw(
            &OutlinedText::new(&status),
            DrawParam::default().dest(Vec2::new(16.0, 16.0)).color(Color::WHITE),
        );

        if self.game.status() == GameStatus::Over {
            let mut summary = hud_text(
                format!("Time's up!\nFinal score: {:.2}", self.game.economy.score()),
                48.0,
            );
            summary.set_layout(TextLayout::center());
            canvas.draw(
                &OutlinedText::new(&summary).outline_color(Color::BLACK),
                DrawParam::default()
                    .dest(Vec2::new(width / 2.0, height / 2.0))
                    .color(Color::YELLOW),
            );
        }

        canvas.finish(ctx)
    }

    fn key_down_event(&mut self, _ctx: &mut Context, _input: KeyInput, _repeated: bool) -> GameResult {
        // Override default so esc doesn't close game
        Ok(())
    }
}

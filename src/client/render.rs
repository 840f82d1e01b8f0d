use courier::assets::ImageKey;
use courier::math::units::{screen, world};
use courier::math::to_screen;
use courier::objects::{GameObject, ObjectKind};
use courier::world::{Cell, Renderer, World};
use ggez::glam::Vec2;
use ggez::graphics::{Canvas, Color, DrawMode, DrawParam, Mesh};
use ggez::Context;

use crate::assets::AssetCache;

const GRID_COLOR: Color = Color::new(0.0, 0.0, 0.0, 0.15);
const ZONE_COLOR: Color = Color::new(1.0, 0.85, 0.1, 0.35);
const GHOST_COLOR: Color = Color::new(1.0, 1.0, 1.0, 0.5);

/// Draws the world onto a ggez canvas.
pub struct GgezRenderer<'a> {
    ctx: &'a Context,
    canvas: &'a mut Canvas,
    assets: &'a AssetCache,
    show_zones: bool,
}

impl<'a> GgezRenderer<'a> {
    pub fn new(ctx: &'a Context, canvas: &'a mut Canvas, assets: &'a AssetCache) -> Self {
        Self {
            ctx,
            canvas,
            assets,
            show_zones: false,
        }
    }

    /// Shade delivery zones, which are otherwise invisible.
    pub fn show_zones(self, show_zones: bool) -> Self {
        Self { show_zones, ..self }
    }

    fn draw_image(&mut self, key: ImageKey, dest: screen::Point2D, anchor: Vec2, color: Color) {
        let Some(image) = self.assets.image(key) else {
            log::warn!("image {key:?} was never loaded");
            return;
        };

        let dest: Vec2 = Vec2::from(mint::Point2::from(dest));
        self.canvas
            .draw(image, DrawParam::default().dest(dest).offset(anchor).color(color));
    }
}

impl Renderer for GgezRenderer<'_> {
    fn draw_cell(&mut self, cell: &Cell, dest: screen::Point2D) {
        if let Some(image) = cell.image {
            self.draw_image(image, dest + cell.offset, Vec2::new(0.5, 0.0), Color::WHITE);
        }
    }

    fn draw_grid_line(&mut self, from: screen::Point2D, to: screen::Point2D) {
        let points: [Vec2; 2] = [Vec2::from(mint::Point2::from(from)), Vec2::from(mint::Point2::from(to))];
        match Mesh::new_line(self.ctx, &points, 1.0, GRID_COLOR) {
            Ok(line) => self.canvas.draw(&line, DrawParam::default()),
            Err(e) => log::warn!("skipping grid line: {e}"),
        }
    }

    fn draw_object(&mut self, object: &GameObject, dest: screen::Point2D, world: &World) {
        let sprites = world.sprites();

        match &object.kind {
            ObjectKind::Car(car) => {
                self.draw_image(sprites.car(car.sprite()), dest, Vec2::new(0.5, 0.5), Color::WHITE);
            }
            ObjectKind::GhostCar(ghost) => {
                self.draw_image(sprites.car(ghost.sprite), dest, Vec2::new(0.5, 0.5), GHOST_COLOR);
            }
            ObjectKind::Package(package) => {
                let dest = dest - screen::Vector2D::new(0.0, package.bob_offset());
                self.draw_image(
                    sprites.package(package.sprite_variant),
                    dest,
                    Vec2::new(0.5, 1.0),
                    Color::WHITE,
                );
            }
            ObjectKind::DeliveryZone if self.show_zones => {
                let bounds = object.body.bounding_box();
                let camera = dest - object.body.screen;
                let corners = [
                    bounds.min,
                    world::Point2D::new(bounds.max.x, bounds.min.y),
                    bounds.max,
                    world::Point2D::new(bounds.min.x, bounds.max.y),
                ];
                let points: [Vec2; 4] = corners.map(|corner| Vec2::from(mint::Point2::from(to_screen(corner, world.info.tile) + camera)));

                match Mesh::new_polygon(self.ctx, DrawMode::fill(), &points, ZONE_COLOR) {
                    Ok(zone) => self.canvas.draw(&zone, DrawParam::default()),
                    Err(e) => log::warn!("skipping delivery zone {}: {e}", object.id()),
                }
            }
            _ => {}
        }
    }
}

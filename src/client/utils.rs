use courier::economy::{Economy, Mode};
use ggez::context::Has;
use ggez::glam::Vec2;
use ggez::graphics::{Canvas, Color, DrawParam, Drawable, GraphicsContext, PxScale, Rect, Text, Transform};

/// Text with a one pixel outline so it stays readable over any terrain.
pub struct OutlinedText<'a> {
    inner: &'a Text,
    outline_color: Color,
}

impl<'a> OutlinedText<'a> {
    pub fn new(text: &'a Text) -> Self {
        Self {
            inner: text,
            outline_color: Color::new(0.0, 0.0, 0.0, 0.75),
        }
    }

    pub fn outline_color(self, color: impl Into<Color>) -> Self {
        Self {
            outline_color: color.into(),
            ..self
        }
    }
}

impl Drawable for OutlinedText<'_> {
    fn draw(&self, canvas: &mut Canvas, param: impl Into<DrawParam>) {
        let param: DrawParam = param.into();
        let Transform::Values { dest, .. } = param.transform else {
            return canvas.draw(self.inner, param);
        };
        let dest = Vec2::from(dest);

        for x in -1..=1 {
            for y in -1..=1 {
                if x == 0 && y == 0 {
                    continue;
                }
                let offset = Vec2::new(x as f32, y as f32);
                canvas.draw(self.inner, param.dest(dest + offset).color(self.outline_color));
            }
        }

        canvas.draw(self.inner, param);
    }

    fn dimensions(&self, gfx: &impl Has<GraphicsContext>) -> Option<Rect> {
        self.inner
            .dimensions(gfx)
            .map(|inner| Rect::new(inner.x - 1.0, inner.y - 1.0, inner.w + 2.0, inner.h + 2.0))
    }
}

pub fn hud_text(contents: impl Into<String>, size: f32) -> Text {
    let mut text = Text::new(contents.into());
    text.set_scale(PxScale::from(size));
    text
}

/// Score, clock and job count for the corner of the screen.
pub fn status_line(economy: &Economy) -> String {
    let mut line = format!("Score: {:.2}", economy.score());
    if let Mode::Dynamic(_) = economy.mode() {
        line += &format!("   Time: {}", format_clock(economy.time_remaining()));
    }
    line += &format!("   Jobs: {}   Packages: {}", economy.jobs().len(), economy.held_packages());
    line
}

/// Milliseconds as `m:ss`, never negative.
pub fn format_clock(ms: f64) -> String {
    let seconds = (ms.max(0.0) / 1000.0).ceil() as u64;
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

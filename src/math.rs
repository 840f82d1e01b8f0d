use mint::IntoMint;

pub mod units {
    use paste::paste;

    macro_rules! euclid_units {
        ($($unit:ident => $default:ty),+) => {
            paste! {
                $(
                    pub struct [<$unit Unit>];

                    pub mod [<$unit:snake>] {
                        pub type Point2D<T = $default> = euclid::Point2D<T, super::[<$unit Unit>]>;
                        pub type Vector2D<T = $default> = euclid::Vector2D<T, super::[<$unit Unit>]>;
                        pub type Box2D<T = $default> = euclid::Box2D<T, super::[<$unit Unit>]>;
                        pub type Size2D<T = $default> = euclid::Size2D<T, super::[<$unit Unit>]>;
                        pub type Rect<T = $default> = euclid::Rect<T, super::[<$unit Unit>]>;
                    }

                )+
            }
        };
    }

    // World is measured in tiles, Screen in pixels, Map in whole tiles
    euclid_units!(World => f64, Screen => f32, Map => i32);
}

use units::{screen, world};

pub trait IntoMintExt {
    fn minto<C>(self) -> C
    where
        Self: Sized,
        Self: IntoMint,
        C: From<<Self as IntoMint>::MintType>;
}

impl<T> IntoMintExt for T
where
    T: IntoMint,
{
    fn minto<C>(self) -> C
    where
        C: From<<Self as IntoMint>::MintType>,
    {
        C::from(self.into())
    }
}

/// Pixel size of a single tile in the isometric projection.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TileDimensions {
    pub width: f32,
    pub height: f32,
}

impl TileDimensions {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

/// Projects a world position (in tiles) into isometric screen space.
///
/// World +x runs down-right on screen and world +y runs down-left, so the
/// world origin ends up at the top corner of the map.
pub fn to_screen(point: world::Point2D, tile: TileDimensions) -> screen::Point2D {
    let x = point.x as f32;
    let y = point.y as f32;
    screen::Point2D::new((x - y) * tile.width / 2.0, (x + y) * tile.height / 2.0)
}

pub fn clamp(value: f64, min: f64, max: f64) -> f64 {
    min.max(max.min(value))
}

pub fn distance_squared(a: world::Point2D, b: world::Point2D) -> f64 {
    (a - b).square_length()
}

pub fn point_is_inside(point: world::Point2D, area: &world::Box2D) -> bool {
    area.contains(point)
}

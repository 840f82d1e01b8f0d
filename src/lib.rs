pub mod assets;
pub mod config;
pub mod economy;
pub mod game;
pub mod math;
pub mod objects;
pub mod services;
pub mod world;

#[cfg(test)]
mod test_support;

/// Returns early with `$err` when `$cond` does not hold.
#[macro_export]
macro_rules! ensure {
    ($cond:expr, $err:expr) => {
        if !$cond {
            return Err($err);
        }
    };
}

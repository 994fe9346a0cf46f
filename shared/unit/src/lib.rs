pub mod map;
mod tick;

pub use tick::Tick;

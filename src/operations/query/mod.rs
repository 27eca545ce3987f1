mod area;
mod bounding_box;

pub use area::{IslandArea, LoopArea};
pub use bounding_box::IslandBounds;

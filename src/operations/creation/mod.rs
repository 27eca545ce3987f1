mod make_ellipse;
mod make_island;
mod make_rect;

pub use make_ellipse::MakeEllipse;
pub use make_island::{IslandVertex, MakeIsland};
pub use make_rect::MakeRect;

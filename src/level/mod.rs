mod grid;
mod loader;

pub use grid::{Grid, TILE_SIZE, Tile, TileKind, px_to_tile, tile_to_px, tile_to_px_center};
pub use loader::{LevelError, load_level, parse_level};

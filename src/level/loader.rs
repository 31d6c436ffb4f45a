//! Text level loader.
//!
//! One character per tile, one line per row:
//!
//! ```text
//! ' '   floor
//! '#'   wall
//! '+'   door (closed at load, activation time 10)
//! ```
//!
//! Anything else is logged and degraded to a wall so that a damaged
//! level still loads as something enclosing.

use std::{fs, io, path::Path};

use log::{debug, error};
use thiserror::Error;

use super::grid::{Grid, Tile, TileKind};

/// Errors that can be encountered while reading a level file.
#[derive(Error, Debug)]
pub enum LevelError {
    /// Underlying I/O failure, propagated unchanged.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The source contained no rows at all.
    #[error("level source is empty")]
    Empty,
}

/// Read and parse a level file from disk.
pub fn load_level<P: AsRef<Path>>(path: P) -> Result<Grid, LevelError> {
    debug!("loading level {}", path.as_ref().display());
    let text = fs::read_to_string(path)?;
    parse_level(&text)
}

/// Parse level text into a grid.
///
/// Width is the longest line; shorter lines are padded with walls so
/// every row has the same length and ragged edges stay solid.
pub fn parse_level(text: &str) -> Result<Grid, LevelError> {
    let lines: Vec<&str> = text.lines().collect();
    let width = lines.iter().map(|l| l.chars().count()).max().unwrap_or(0);
    if width == 0 || lines.is_empty() {
        return Err(LevelError::Empty);
    }
    let height = lines.len();

    let mut tiles = Vec::with_capacity(width * height);
    for (y, line) in lines.iter().enumerate() {
        let mut x = 0;
        for ch in line.chars() {
            tiles.push(Tile::new(tile_kind(ch, x, y)));
            x += 1;
        }
        for _ in x..width {
            tiles.push(Tile::new(TileKind::Wall));
        }
    }

    debug!("level dimensions: {width} x {height}");
    Ok(Grid::new(width as i32, height as i32, tiles))
}

fn tile_kind(ch: char, x: usize, y: usize) -> TileKind {
    match ch {
        ' ' => TileKind::Floor,
        '#' => TileKind::Wall,
        '+' => TileKind::Door,
        other => {
            error!("invalid tile {other:?} at ({x},{y}), defaulting to wall");
            TileKind::Wall
        }
    }
}

/*====================================================================*/
/*                                Tests                                */
/*====================================================================*/
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_the_three_tile_kinds() {
        let grid = parse_level("# +\n###").unwrap();
        assert_eq!(grid.width(), 3);
        assert_eq!(grid.height(), 2);
        assert_eq!(grid.tile(0, 0).kind, TileKind::Wall);
        assert_eq!(grid.tile(1, 0).kind, TileKind::Floor);
        assert_eq!(grid.tile(2, 0).kind, TileKind::Door);
        assert!(!grid.tile(2, 0).active);
    }

    #[test]
    fn unknown_characters_degrade_to_walls() {
        let grid = parse_level("x \n  ").unwrap();
        assert_eq!(grid.tile(0, 0).kind, TileKind::Wall);
        assert_eq!(grid.tile(1, 0).kind, TileKind::Floor);
    }

    #[test]
    fn short_rows_are_padded_with_walls() {
        let grid = parse_level("####\n# \n####").unwrap();
        assert_eq!(grid.width(), 4);
        assert_eq!(grid.tile(2, 1).kind, TileKind::Wall);
        assert_eq!(grid.tile(3, 1).kind, TileKind::Wall);
        assert_eq!(grid.tile(1, 1).kind, TileKind::Floor);
    }

    #[test]
    fn empty_source_is_an_error() {
        assert!(matches!(parse_level(""), Err(LevelError::Empty)));
    }
}

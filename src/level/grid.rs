//! Runtime tile grid: immutable dimensions, per-tile door state.
//!
//! Coordinates come in two flavours:
//! * **tile** indices `(0..width, 0..height)`, and
//! * fixed-point **pixel** units, `TILE_SIZE` of them per tile.
//!
//! Only `active` / `flips_in` mutate after load; kind and the
//! capabilities derived from it are fixed per tile.

use glam::IVec2;

/// Fixed-point pixel units per tile.  The frontend maps one tile to 32
/// screen pixels, so one screen pixel is 10 units.
pub const TILE_SIZE: i32 = 320;

/*──────────────────── tile ↔ pixel mapping ─────────────────────*/

/// Top-left corner of tile `t` in pixel units.
#[inline]
pub fn tile_to_px(t: i32) -> i32 {
    t * TILE_SIZE
}

/// Centre of tile `t` in pixel units.
#[inline]
pub fn tile_to_px_center(t: i32) -> i32 {
    t * TILE_SIZE + TILE_SIZE / 2
}

/// Tile index containing pixel coordinate `p` (floor division).
#[inline]
pub fn px_to_tile(p: i32) -> i32 {
    p.div_euclid(TILE_SIZE)
}

/*──────────────────────── tile kinds ───────────────────────────*/

/// Static classification of one grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TileKind {
    Floor,
    Wall,
    Door,
}

impl TileKind {
    /// Ticks a trigger needs before the tile flips, or -1 when the
    /// kind is not activatable.
    #[inline]
    pub fn activation_time(self) -> i32 {
        match self {
            TileKind::Door => 10,
            TileKind::Floor | TileKind::Wall => -1,
        }
    }
}

/// One grid cell: static kind plus door timer state.
#[derive(Debug, Clone, Copy)]
pub struct Tile {
    pub kind: TileKind,
    pub active: bool,
    /// Countdown to the next state flip; -1 = idle.
    pub flips_in: i32,
}

impl Tile {
    pub fn new(kind: TileKind) -> Self {
        Tile {
            kind,
            active: false,
            flips_in: -1,
        }
    }

    #[inline]
    pub fn is_passable(&self) -> bool {
        match self.kind {
            TileKind::Floor => true,
            TileKind::Wall => false,
            TileKind::Door => self.active,
        }
    }

    #[inline]
    pub fn is_transparent(&self) -> bool {
        // Same capability table as passability for the current kinds,
        // kept separate because sight and movement are different
        // questions.
        match self.kind {
            TileKind::Floor => true,
            TileKind::Wall => false,
            TileKind::Door => self.active,
        }
    }

    #[inline]
    pub fn can_be_activated(&self) -> bool {
        self.kind.activation_time() >= 0 && self.flips_in < 0
    }
}

/*──────────────────────────── grid ─────────────────────────────*/

/// Row-major tile grid (immutable dimensions after load).
#[derive(Debug)]
pub struct Grid {
    width: i32,
    height: i32,
    tiles: Vec<Tile>,
}

impl Grid {
    /// Build a grid from row-major tiles.  `tiles.len()` must equal
    /// `width * height`.
    pub fn new(width: i32, height: i32, tiles: Vec<Tile>) -> Self {
        assert!(width > 0 && height > 0, "degenerate grid {width}x{height}");
        assert_eq!(tiles.len(), (width * height) as usize);
        Grid {
            width,
            height,
            tiles,
        }
    }

    #[inline]
    pub fn width(&self) -> i32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> i32 {
        self.height
    }

    #[inline]
    pub fn in_bounds(&self, x: i32, y: i32) -> bool {
        (0..self.width).contains(&x) && (0..self.height).contains(&y)
    }

    #[inline]
    fn idx(&self, x: i32, y: i32) -> usize {
        assert!(self.in_bounds(x, y), "tile ({x},{y}) outside grid");
        (y * self.width + x) as usize
    }

    /// Tile at `(x, y)`.  Panics when out of bounds, which is a
    /// caller contract violation rather than a recoverable error.
    #[inline]
    pub fn tile(&self, x: i32, y: i32) -> &Tile {
        &self.tiles[self.idx(x, y)]
    }

    #[inline]
    pub fn tile_mut(&mut self, x: i32, y: i32) -> &mut Tile {
        let i = self.idx(x, y);
        &mut self.tiles[i]
    }

    #[inline]
    pub fn is_passable(&self, x: i32, y: i32) -> bool {
        self.tile(x, y).is_passable()
    }

    #[inline]
    pub fn is_transparent(&self, x: i32, y: i32) -> bool {
        self.tile(x, y).is_transparent()
    }

    #[inline]
    pub fn can_be_activated(&self, x: i32, y: i32) -> bool {
        self.tile(x, y).can_be_activated()
    }

    /// Arm the flip countdown of an activatable tile.  No-op when the
    /// tile cannot be activated right now (already counting, or plain
    /// floor/wall).
    pub fn trigger(&mut self, x: i32, y: i32) {
        let time = self.tile(x, y).kind.activation_time();
        let tile = self.tile_mut(x, y);
        if time >= 0 && tile.flips_in < 0 {
            tile.flips_in = time;
        }
    }

    /// Advance every armed flip countdown by one tick.  Call exactly
    /// once per simulation step; a tile triggered at frame `f` with
    /// activation time `n` flips at step `f + n`.
    pub fn advance_timers(&mut self) {
        for tile in &mut self.tiles {
            if tile.flips_in > 0 {
                tile.flips_in -= 1;
                if tile.flips_in == 0 {
                    tile.active = !tile.active;
                    tile.flips_in = -1;
                }
            }
        }
    }

    /// Pixel centre of tile `(x, y)`.
    #[inline]
    pub fn tile_center(&self, x: i32, y: i32) -> IVec2 {
        IVec2::new(tile_to_px_center(x), tile_to_px_center(y))
    }
}

/*====================================================================*/
/*                                Tests                                */
/*====================================================================*/

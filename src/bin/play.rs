//! Minimal top-down viewer for the stealth simulation.
//!
//! ```bash
//! cargo run --release -- levels/demo.lev
//! ```

use std::path::PathBuf;

use clap::Parser;
use glam::IVec2;
use minifb::{Key, Window, WindowOptions};

use skulk_rs::level::{Grid, TILE_SIZE, TileKind, load_level, tile_to_px_center};
use skulk_rs::sim::{Body, Buttons, Guard, Heading, MarkKind, Position, Sim, Tuning};

/// Screen pixels per tile; TILE_SIZE fixed-point units map onto this.
const TILE_PX: i32 = 32;

/// CLI options handled via `clap` derive.
#[derive(Parser, Debug)]
#[command(about = "Top-down tile stealth demo")]
struct Args {
    /// Level file (' ' floor, '#' wall, '+' door)
    #[arg(default_value = "levels/demo.lev")]
    level: PathBuf,

    /// Player sight radius in tiles
    #[arg(long, default_value_t = 12)]
    sight: i32,

    /// Number of guards to post around the level
    #[arg(long, default_value_t = 2)]
    guards: usize,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut grid = load_level(&args.level)?;

    // seed spawn points from the open tiles: the player takes the
    // first, guards spread over the rest
    let floors: Vec<IVec2> = (0..grid.height())
        .flat_map(|y| (0..grid.width()).map(move |x| IVec2::new(x, y)))
        .filter(|t| grid.is_passable(t.x, t.y))
        .collect();
    anyhow::ensure!(!floors.is_empty(), "level has no open tiles");

    let center = |t: IVec2| IVec2::new(tile_to_px_center(t.x), tile_to_px_center(t.y));

    let tuning = Tuning {
        sight_radius: args.sight,
        ..Tuning::default()
    };
    let mut sim = Sim::new(tuning, center(floors[0]), 0);
    for i in 0..args.guards {
        let tile = floors[floors.len() - 1 - (i * floors.len() / (args.guards + 1))];
        sim.spawn_guard(center(tile), 180);
    }

    let w = (grid.width() * TILE_PX) as usize;
    let h = (grid.height() * TILE_PX) as usize;
    let mut buffer = vec![0u32; w * h];

    let mut win = Window::new("skulk", w, h, WindowOptions::default())?;
    win.set_target_fps(60);

    while win.is_open() && !win.is_key_down(Key::Escape) {
        let mut buttons = Buttons::empty();
        if win.is_key_down(Key::Up) || win.is_key_down(Key::W) {
            buttons |= Buttons::FORWARD;
        }
        if win.is_key_down(Key::Down) || win.is_key_down(Key::S) {
            buttons |= Buttons::BACKWARD;
        }
        if win.is_key_down(Key::Left) || win.is_key_down(Key::A) {
            buttons |= Buttons::LEFT;
        }
        if win.is_key_down(Key::Right) || win.is_key_down(Key::D) {
            buttons |= Buttons::RIGHT;
        }
        if win.is_key_down(Key::Space) {
            buttons |= Buttons::ACTIVATE;
        }

        sim.step(&mut grid, buttons);

        draw_grid(&mut buffer, w, &grid, &sim);
        draw_marks(&mut buffer, w, h, &sim);
        draw_actors(&mut buffer, w, h, &sim);

        win.update_with_buffer(&buffer, w, h)?;
    }
    Ok(())
}

/*──────────────────── software drawing ────────────────────*/

#[inline]
fn to_screen(px: i32) -> i32 {
    px * TILE_PX / TILE_SIZE
}

fn draw_grid(buf: &mut [u32], w: usize, grid: &Grid, sim: &Sim) {
    for ty in 0..grid.height() {
        for tx in 0..grid.width() {
            let tile = grid.tile(tx, ty);
            let mut colour = match (tile.kind, tile.active) {
                (TileKind::Floor, _) => 0x00_303030,
                (TileKind::Wall, _) => 0x00_808080,
                (TileKind::Door, false) => 0x00_8a5a2b,
                (TileKind::Door, true) => 0x00_c9a36a,
            };
            let lit = sim.sight().is_some_and(|s| s.sight_get(tx, ty));
            if !lit {
                colour = (colour >> 2) & 0x00_3f3f3f;
            }
            for y in 0..TILE_PX {
                let row = ((ty * TILE_PX + y) as usize) * w + (tx * TILE_PX) as usize;
                buf[row..row + TILE_PX as usize].fill(colour);
            }
        }
    }
}

fn draw_marks(buf: &mut [u32], w: usize, h: usize, sim: &Sim) {
    for mark in sim.marks() {
        let colour = match mark.kind {
            MarkKind::StandingOn => 0x00_204020,
            MarkKind::Facing => 0x00_e0d040,
            MarkKind::PathNode => 0x00_2090a0,
            MarkKind::Spotted => 0x00_ff2020,
            MarkKind::Chasing => 0x00_d06020,
            MarkKind::Lost => 0x00_6040c0,
            MarkKind::SightRay => 0x00_604040,
        };
        let sx = to_screen(mark.pos.x);
        let sy = to_screen(mark.pos.y);
        fill_rect(buf, w, h, sx - 2, sy - 2, 4, 4, colour);
    }
}

fn draw_actors(buf: &mut [u32], w: usize, h: usize, sim: &Sim) {
    for (e, (pos, heading, body)) in sim.world().query::<(&Position, &Heading, &Body)>().iter() {
        let is_guard = sim.world().get::<&Guard>(e).is_ok();
        let colour = if is_guard { 0x00_d04040 } else { 0x00_40c040 };
        let cx = to_screen(pos.0.x);
        let cy = to_screen(pos.0.y);
        let r = to_screen(body.radius).max(2);
        fill_circle(buf, w, h, cx, cy, r, colour);

        // heading tick
        let tip = pos.0 + Heading(heading.0).displacement(body.radius + TILE_SIZE / 4);
        draw_line(buf, w, h, cx, cy, to_screen(tip.x), to_screen(tip.y), 0x00_ffffff);
    }
}

fn fill_rect(buf: &mut [u32], w: usize, h: usize, x: i32, y: i32, rw: i32, rh: i32, colour: u32) {
    for py in y..y + rh {
        for px in x..x + rw {
            plot(buf, w, h, px, py, colour);
        }
    }
}

fn fill_circle(buf: &mut [u32], w: usize, h: usize, cx: i32, cy: i32, r: i32, colour: u32) {
    for dy in -r..=r {
        for dx in -r..=r {
            if dx * dx + dy * dy <= r * r {
                plot(buf, w, h, cx + dx, cy + dy, colour);
            }
        }
    }
}

/// Integer Bresenham line-drawing.
fn draw_line(
    buf: &mut [u32],
    w: usize,
    h: usize,
    mut x0: i32,
    mut y0: i32,
    x1: i32,
    y1: i32,
    colour: u32,
) {
    let dx = (x1 - x0).abs();
    let dy = -(y1 - y0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        plot(buf, w, h, x0, y0, colour);
        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            if x0 == x1 {
                break;
            }
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            if y0 == y1 {
                break;
            }
            err += dx;
            y0 += sy;
        }
    }
}

#[inline]
fn plot(buf: &mut [u32], w: usize, h: usize, x: i32, y: i32, colour: u32) {
    if (0..w as i32).contains(&x) && (0..h as i32).contains(&y) {
        buf[y as usize * w + x as usize] = colour;
    }
}

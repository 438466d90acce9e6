//! Procedural level layouts.
//!
//! A layout is generated deterministically from the level number: a hard
//! border, the pillar grid at even coordinates, then seeded breakable and
//! hard walls on the remaining floor. The exit sits in the far corner and
//! enemy spawns scale with the level number. The same number always yields
//! the same layout within a build.

use crate::grid::{Grid, Tile};
use log::info;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use shared::EnemyKind;

/// Levels past this one complete the game.
pub const MAX_LEVEL: u32 = 10;

/// One enemy to create at room start.
#[derive(Debug, Clone, Copy)]
pub struct EnemySpawn {
    pub kind: EnemyKind,
    pub position: (i32, i32),
}

/// Level geometry plus the spawn data handed to a new room.
#[derive(Debug, Clone)]
pub struct LevelLayout {
    pub number: u32,
    pub grid: Grid,
    pub player_start: (i32, i32),
    pub enemy_spawns: Vec<EnemySpawn>,
}

/// Deterministic seed for a level number (splitmix64 finalizer).
fn level_seed(number: u32) -> u64 {
    let mut z = (number as u64).wrapping_add(0x9e37_79b9_7f4a_7c15);
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}

/// Hard (blast-stopping, unbreakable) wall count for a level.
fn hard_wall_count(number: u32) -> usize {
    ((number.saturating_sub(1)) / 2).min(3) as usize
}

/// Breakable wall count for a level, capped so the floor stays playable.
fn breakable_wall_count(number: u32, hard: usize) -> usize {
    let max_breakable = (8 + (number.saturating_sub(1)) as usize).min(12);
    max_breakable.min(15 - hard)
}

/// Enemy head-count and mix for a level. Early levels field static enemies
/// only; chasers appear from level 2 and smart enemies from level 4.
fn enemy_kinds(number: u32) -> Vec<EnemyKind> {
    let total = (1 + number as usize).min(6);
    (0..total)
        .map(|i| {
            if number >= 4 && i % 3 == 2 {
                EnemyKind::Smart
            } else if number >= 2 && i % 2 == 1 {
                EnemyKind::Chasing
            } else {
                EnemyKind::Static
            }
        })
        .collect()
}

impl LevelLayout {
    /// Generates the layout for `number` at the given dimensions. Odd
    /// dimensions give the classic pillar pattern; anything at least 5x5
    /// works.
    pub fn generate(number: u32, width: i32, height: i32) -> Self {
        assert!(width >= 5 && height >= 5);

        let mut grid = Grid::new(width, height);

        // Border
        for x in 0..width {
            grid.set_tile(x, 0, Tile::HardWall);
            grid.set_tile(x, height - 1, Tile::HardWall);
        }
        for y in 0..height {
            grid.set_tile(0, y, Tile::HardWall);
            grid.set_tile(width - 1, y, Tile::HardWall);
        }

        // Pillar grid at even interior coordinates
        for y in (2..height - 1).step_by(2) {
            for x in (2..width - 1).step_by(2) {
                grid.set_tile(x, y, Tile::HardWall);
            }
        }

        let player_start = (1, 1);
        let exit = (width - 2, height - 2);

        let mut rng = rand::rngs::StdRng::seed_from_u64(level_seed(number));

        // Floor tiles that may receive walls: not the start area, not the exit
        let mut available: Vec<(i32, i32)> = Vec::new();
        for y in 1..height - 1 {
            for x in 1..width - 1 {
                if grid.tile_at(x, y) != Tile::Empty {
                    continue;
                }
                if (x, y) == exit {
                    continue;
                }
                let start_distance =
                    (x - player_start.0).abs() + (y - player_start.1).abs();
                if start_distance <= 2 {
                    continue;
                }
                available.push((x, y));
            }
        }
        available.shuffle(&mut rng);

        let hard = hard_wall_count(number);
        for _ in 0..hard {
            if let Some((x, y)) = available.pop() {
                grid.set_tile(x, y, Tile::HardWall);
            }
        }

        let breakable = breakable_wall_count(number, hard).min(available.len());
        for _ in 0..breakable {
            if let Some((x, y)) = available.pop() {
                grid.set_tile(x, y, Tile::BreakableWall);
            }
        }

        grid.set_tile(exit.0, exit.1, Tile::Exit);

        // Enemy spawns on the remaining floor, preferring tiles well away
        // from the player start; relax the distance if the level is cramped.
        let kinds = enemy_kinds(number);
        let mut spawn_tiles: Vec<(i32, i32)> = available
            .iter()
            .copied()
            .filter(|&(x, y)| {
                (x - player_start.0).abs() + (y - player_start.1).abs() >= 3
            })
            .collect();
        if spawn_tiles.len() < kinds.len() {
            spawn_tiles = available.clone();
        }

        let enemy_spawns: Vec<EnemySpawn> = kinds
            .into_iter()
            .zip(spawn_tiles)
            .map(|(kind, position)| EnemySpawn { kind, position })
            .collect();

        info!(
            "Level {} generated: {}x{}, {} hard walls, {} breakable walls, {} enemies",
            number,
            width,
            height,
            hard,
            breakable,
            enemy_spawns.len()
        );

        LevelLayout {
            number,
            grid,
            player_start,
            enemy_spawns,
        }
    }
}

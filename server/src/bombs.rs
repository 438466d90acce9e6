//! Bomb fuses, blast computation and chain detonation.
//!
//! A bomb is armed while its fuse burns, exploding while its linger timer
//! runs, and removed afterwards. Blast tiles are computed exactly once, at
//! the tick the fuse reaches zero. Any armed bomb standing in an active
//! blast detonates in the same tick; the cascade is driven by an explicit
//! worklist rather than recursion, so it terminates after at most one pass
//! per bomb.

use std::collections::HashSet;

use log::info;

use crate::entities::{Bomb, PlayerId};
use crate::grid::{Grid, Tile};

/// What one tick of bomb processing did to the world.
#[derive(Debug, Default)]
pub struct ExplosionOutcome {
    /// Union of all tiles covered by bombs that detonated this tick.
    /// Entities standing in it take blast damage exactly once, no matter
    /// how many blasts overlap their tile.
    pub blast: HashSet<(i32, i32)>,
    /// Walls converted to empty this tick, in detonation order.
    pub destroyed_walls: Vec<(i32, i32)>,
}

/// Number of armed bombs owned by `owner`. Exploding bombs no longer count
/// against the owner's capacity.
pub fn armed_count(bombs: &[Bomb], owner: PlayerId) -> usize {
    bombs
        .iter()
        .filter(|b| b.armed() && b.owner == owner)
        .count()
}

/// Whether an armed bomb already occupies `position`.
pub fn armed_bomb_at(bombs: &[Bomb], position: (i32, i32)) -> bool {
    bombs.iter().any(|b| b.armed() && b.position == position)
}

/// Casts the four cardinal blast rays of a bomb at `position` with the given
/// power. Each ray stops before a hard wall and stops at the first breakable
/// wall, which it converts to empty. Exit tiles are passed over untouched.
/// Returns the covered tiles and the walls broken.
fn compute_blast(
    grid: &mut Grid,
    position: (i32, i32),
    power: u32,
) -> (Vec<(i32, i32)>, Vec<(i32, i32)>) {
    let mut tiles = vec![position];
    let mut broken = Vec::new();

    for (dx, dy) in [(0, -1), (0, 1), (-1, 0), (1, 0)] {
        for r in 1..=power as i32 {
            let (tx, ty) = (position.0 + dx * r, position.1 + dy * r);
            match grid.tile_at(tx, ty) {
                Tile::HardWall => break,
                Tile::BreakableWall => {
                    grid.break_wall(tx, ty);
                    broken.push((tx, ty));
                    tiles.push((tx, ty));
                    break;
                }
                Tile::Empty => tiles.push((tx, ty)),
                Tile::Exit => {}
            }
        }
    }

    (tiles, broken)
}

/// Advances all bomb timers by `delta`, detonating bombs whose fuse ran out,
/// cascading into any armed bomb covered by an active blast, and removing
/// bombs whose linger expired.
pub fn update(grid: &mut Grid, bombs: &mut Vec<Bomb>, delta: f32) -> ExplosionOutcome {
    let mut outcome = ExplosionOutcome::default();

    for bomb in bombs.iter_mut() {
        if bomb.armed() {
            bomb.fuse -= delta;
        } else {
            bomb.linger -= delta;
        }
    }

    // Detonate expired fuses, then cascade to a fixed point: each pass arms
    // at most the bombs still standing in the growing blast union, so the
    // loop is bounded by the bomb count.
    loop {
        let mut detonated_any = false;

        for bomb in bombs.iter_mut() {
            if !bomb.armed() {
                continue;
            }
            let chained = outcome.blast.contains(&bomb.position);
            if bomb.fuse > 0.0 && !chained {
                continue;
            }

            bomb.exploded = true;
            bomb.fuse = 0.0;
            let (tiles, broken) = compute_blast(grid, bomb.position, bomb.power);
            outcome.blast.extend(tiles.iter().copied());
            outcome.destroyed_walls.extend(broken);
            bomb.blast = tiles;
            detonated_any = true;

            info!(
                "Bomb at ({}, {}) exploded{} covering {} tiles",
                bomb.position.0,
                bomb.position.1,
                if chained { " (chain)" } else { "" },
                bomb.blast.len()
            );
        }

        if !detonated_any {
            break;
        }
    }

    bombs.retain(|b| b.armed() || b.linger > 0.0);

    outcome
}

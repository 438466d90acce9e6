//! Tile-occupancy legality.
//!
//! Pure queries composing the grid with live entity positions. Within a
//! tick, movers are processed in a fixed order (players in join order, then
//! enemies in spawn order) and commit immediately, so the first claimant of
//! a tile wins and later claimants fail these checks.

use crate::entities::{Bomb, Enemy, EnemyId, Player, PlayerId};
use crate::grid::{Grid, MoverClass};

/// The entity asking to move, so its own record is skipped in the scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mover {
    Player(PlayerId),
    Enemy(EnemyId),
}

impl Mover {
    fn class(&self) -> MoverClass {
        match self {
            Mover::Player(_) => MoverClass::Player,
            Mover::Enemy(_) => MoverClass::Enemy,
        }
    }
}

/// Whether `mover` may occupy (x, y): the terrain must admit it, no
/// unexploded bomb may sit there, and no blocking entity may hold the tile.
/// Dead players, players who reached the exit, and dead enemies never block.
pub fn can_move_to(
    grid: &Grid,
    players: &[Player],
    bombs: &[Bomb],
    enemies: &[Enemy],
    mover: Mover,
    x: i32,
    y: i32,
) -> bool {
    if !grid.can_enter(x, y, mover.class()) {
        return false;
    }

    if bombs.iter().any(|b| b.armed() && b.position == (x, y)) {
        return false;
    }

    for player in players {
        if let Mover::Player(id) = mover {
            if player.id == id {
                continue;
            }
        }
        if player.in_play() && player.position == (x, y) {
            return false;
        }
    }

    for enemy in enemies {
        if let Mover::Enemy(id) = mover {
            if enemy.id == id {
                continue;
            }
        }
        if enemy.alive && enemy.position == (x, y) {
            return false;
        }
    }

    true
}

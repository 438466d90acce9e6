//! The authoritative Player, Bomb and Enemy records owned by a room.
//!
//! All mutation happens on the room's tick; these types only carry their own
//! small state transitions (damage clamping, one-way death, fuse countdown).

use shared::{
    EnemyKind, BOMB_FUSE_SECS, BOMB_LINGER_SECS, DEFAULT_BOMB_CAPACITY,
    DEFAULT_BOMB_POWER, MAX_HEALTH,
};

pub type PlayerId = u32;
pub type EnemyId = u32;

#[derive(Debug, Clone)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub position: (i32, i32),
    pub health: i32,
    pub alive: bool,
    pub ready: bool,
    pub reached_exit: bool,
    /// Movement rate modifier. Carried for the derived-stats layer; the
    /// tile-based core applies moves as they arrive.
    pub speed: f32,
    pub bomb_capacity: u32,
    pub bomb_power: u32,
}

impl Player {
    pub fn new(id: PlayerId, name: String) -> Self {
        Self {
            id,
            name,
            position: (1, 1),
            health: MAX_HEALTH,
            alive: true,
            ready: false,
            reached_exit: false,
            speed: 1.0,
            bomb_capacity: DEFAULT_BOMB_CAPACITY,
            bomb_power: DEFAULT_BOMB_POWER,
        }
    }

    /// Applies damage, clamping at zero. Death is one-way: a player at zero
    /// health never returns to `alive`.
    pub fn take_damage(&mut self, amount: i32) {
        if !self.alive {
            return;
        }
        self.health = (self.health - amount).max(0);
        if self.health == 0 {
            self.alive = false;
        }
    }

    /// Whether this player participates in collision and damage. Players who
    /// reached the exit are out of play for the rest of the level.
    pub fn in_play(&self) -> bool {
        self.alive && !self.reached_exit
    }
}

/// Bomb fuse/explosion state machine: armed while the fuse burns, exploding
/// while the linger timer runs, then removed by the room.
#[derive(Debug, Clone)]
pub struct Bomb {
    pub owner: PlayerId,
    pub position: (i32, i32),
    pub fuse: f32,
    pub power: u32,
    pub exploded: bool,
    pub linger: f32,
    /// Tiles covered by this bomb's explosion. Computed exactly once, at the
    /// tick the fuse reaches zero; empty until then.
    pub blast: Vec<(i32, i32)>,
}

impl Bomb {
    pub fn new(owner: PlayerId, position: (i32, i32), power: u32) -> Self {
        Self {
            owner,
            position,
            fuse: BOMB_FUSE_SECS,
            power,
            exploded: false,
            linger: BOMB_LINGER_SECS,
            blast: Vec::new(),
        }
    }

    pub fn armed(&self) -> bool {
        !self.exploded
    }
}

#[derive(Debug, Clone)]
pub struct Enemy {
    pub id: EnemyId,
    pub kind: EnemyKind,
    pub spawn_position: (i32, i32),
    pub position: (i32, i32),
    pub health: i32,
    pub alive: bool,
    /// Seconds since this enemy last moved; compared against the variant's
    /// move interval.
    pub move_accumulator: f32,
    /// Seconds since death. Corpses are kept briefly so clients can play a
    /// death animation, then removed.
    pub corpse_timer: f32,
    /// Oscillation state for the chasing variant: axis fixed at creation,
    /// direction flips at obstacles.
    pub patrol_horizontal: bool,
    pub patrol_dir: i32,
}

impl Enemy {
    pub fn new(id: EnemyId, kind: EnemyKind, position: (i32, i32)) -> Self {
        Self {
            id,
            kind,
            spawn_position: position,
            position,
            health: MAX_HEALTH,
            alive: true,
            move_accumulator: 0.0,
            corpse_timer: 0.0,
            // Axis chosen from the spawn coordinates so rooms stay
            // deterministic for a given layout.
            patrol_horizontal: (position.0 + position.1) % 2 == 0,
            patrol_dir: 1,
        }
    }

    pub fn take_damage(&mut self, amount: i32) {
        if !self.alive {
            return;
        }
        self.health = (self.health - amount).max(0);
        if self.health == 0 {
            self.alive = false;
        }
    }
}

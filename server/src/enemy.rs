//! Enemy movement strategies.
//!
//! Each variant implements `Behavior` and is looked up through a
//! registration table keyed by the discriminant, so adding a variant means
//! adding a table entry rather than touching the dispatch. A strategy only
//! proposes a target tile; the room re-validates it against the collision
//! resolver immediately before committing, which also settles same-tick
//! races between enemies (first claimant wins).

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use shared::EnemyKind;

use crate::collision::{can_move_to, Mover};
use crate::entities::{Bomb, Enemy, Player};
use crate::grid::Grid;

/// Read-only view of the room handed to a strategy.
pub struct AiContext<'a> {
    pub grid: &'a Grid,
    pub players: &'a [Player],
    pub bombs: &'a [Bomb],
    pub enemies: &'a [Enemy],
}

impl AiContext<'_> {
    fn enemy_can_enter(&self, enemy: &Enemy, x: i32, y: i32) -> bool {
        can_move_to(
            self.grid,
            self.players,
            self.bombs,
            self.enemies,
            Mover::Enemy(enemy.id),
            x,
            y,
        )
    }

    /// Nearest living, still-playing player by Manhattan distance. Ties go
    /// to the earliest-joined player.
    fn nearest_player(&self, from: (i32, i32)) -> Option<&Player> {
        self.players
            .iter()
            .filter(|p| p.in_play())
            .min_by_key(|p| manhattan(p.position, from))
    }
}

fn manhattan(a: (i32, i32), b: (i32, i32)) -> i32 {
    (a.0 - b.0).abs() + (a.1 - b.1).abs()
}

/// One movement strategy. `decide_move` may update per-enemy strategy state
/// (the chaser's patrol direction) but never commits a position.
pub trait Behavior: Sync {
    /// Seconds between moves for this variant.
    fn move_interval(&self) -> f32;

    fn decide_move(
        &self,
        enemy: &mut Enemy,
        ctx: &AiContext,
        rng: &mut StdRng,
    ) -> Option<(i32, i32)>;
}

/// Wanders at most one tile from its spawn, in a random valid direction.
struct StaticBehavior;

impl Behavior for StaticBehavior {
    fn move_interval(&self) -> f32 {
        1.6
    }

    fn decide_move(
        &self,
        enemy: &mut Enemy,
        ctx: &AiContext,
        rng: &mut StdRng,
    ) -> Option<(i32, i32)> {
        let mut directions = [(0, 1), (0, -1), (1, 0), (-1, 0)];
        directions.shuffle(rng);

        for (dx, dy) in directions {
            let target = (enemy.position.0 + dx, enemy.position.1 + dy);
            if manhattan(target, enemy.spawn_position) > 1 {
                continue;
            }
            if ctx.enemy_can_enter(enemy, target.0, target.1) {
                return Some(target);
            }
        }
        None
    }
}

/// Oscillates along its spawn row or column, reversing at obstacles. The
/// axis is fixed at creation; this enemy never leaves its line.
struct ChasingBehavior;

impl ChasingBehavior {
    fn step(enemy: &Enemy, dir: i32) -> (i32, i32) {
        if enemy.patrol_horizontal {
            (enemy.position.0 + dir, enemy.spawn_position.1)
        } else {
            (enemy.spawn_position.0, enemy.position.1 + dir)
        }
    }
}

impl Behavior for ChasingBehavior {
    fn move_interval(&self) -> f32 {
        0.8
    }

    fn decide_move(
        &self,
        enemy: &mut Enemy,
        ctx: &AiContext,
        _rng: &mut StdRng,
    ) -> Option<(i32, i32)> {
        let ahead = Self::step(enemy, enemy.patrol_dir);
        if ctx.enemy_can_enter(enemy, ahead.0, ahead.1) {
            return Some(ahead);
        }

        // Blocked: turn around and try the other way
        enemy.patrol_dir = -enemy.patrol_dir;
        let back = Self::step(enemy, enemy.patrol_dir);
        if ctx.enemy_can_enter(enemy, back.0, back.1) {
            return Some(back);
        }
        None
    }
}

/// Greedy pursuit: steps to whichever open neighbor most reduces Manhattan
/// distance to the nearest living player, holding position when nothing
/// improves. Candidate order is fixed (+x, -x, +y, -y) so ties are
/// deterministic.
struct SmartBehavior;

impl Behavior for SmartBehavior {
    fn move_interval(&self) -> f32 {
        2.0
    }

    fn decide_move(
        &self,
        enemy: &mut Enemy,
        ctx: &AiContext,
        _rng: &mut StdRng,
    ) -> Option<(i32, i32)> {
        let target = ctx.nearest_player(enemy.position)?.position;
        let current = manhattan(enemy.position, target);

        let mut best: Option<((i32, i32), i32)> = None;
        for (dx, dy) in [(1, 0), (-1, 0), (0, 1), (0, -1)] {
            let candidate = (enemy.position.0 + dx, enemy.position.1 + dy);
            if !ctx.enemy_can_enter(enemy, candidate.0, candidate.1) {
                continue;
            }
            let distance = manhattan(candidate, target);
            if best.map_or(true, |(_, d)| distance < d) {
                best = Some((candidate, distance));
            }
        }

        match best {
            Some((candidate, distance)) if distance < current => Some(candidate),
            _ => None,
        }
    }
}

static STATIC_BEHAVIOR: StaticBehavior = StaticBehavior;
static CHASING_BEHAVIOR: ChasingBehavior = ChasingBehavior;
static SMART_BEHAVIOR: SmartBehavior = SmartBehavior;

/// Registration table mapping discriminants to strategies.
static BEHAVIORS: [(EnemyKind, &(dyn Behavior)); 3] = [
    (EnemyKind::Static, &STATIC_BEHAVIOR),
    (EnemyKind::Chasing, &CHASING_BEHAVIOR),
    (EnemyKind::Smart, &SMART_BEHAVIOR),
];

pub fn behavior_for(kind: EnemyKind) -> &'static dyn Behavior {
    BEHAVIORS
        .iter()
        .find(|(k, _)| *k == kind)
        .map(|(_, b)| *b)
        .unwrap_or(&STATIC_BEHAVIOR)
}

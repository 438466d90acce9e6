//! The authoritative room state machine.
//!
//! One room is one independent simulation. All mutation funnels through
//! `Room::tick`, which applies queued commands in arrival order and then
//! advances bombs, enemies and damage in a fixed phase order. A tick either
//! commits in full or rolls back to its pre-tick state, so a published
//! snapshot never reflects a half-applied tick.

use log::{debug, error, info, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;
use thiserror::Error;

use crate::bombs::{self, ExplosionOutcome};
use crate::collision::{can_move_to, Mover};
use crate::damage::ContactTracker;
use crate::entities::{Bomb, Enemy, Player, PlayerId};
use crate::enemy::{behavior_for, AiContext};
use crate::grid::{Grid, MoverClass, Tile};
use crate::level::{EnemySpawn, LevelLayout, MAX_LEVEL};
use shared::{
    BombView, EnemyView, Intent, PlayerView, RoomSnapshot, BLAST_DAMAGE_ENEMY,
    BLAST_DAMAGE_PLAYER, ENEMY_CORPSE_SECS, MAX_HEALTH,
};

/// Players one room will accept.
pub const MAX_PLAYERS: usize = 4;

/// Why an intent produced no change. Reported back to the submitting
/// context; never an error inside the tick loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RejectReason {
    #[error("target tile is blocked")]
    Blocked,
    #[error("bomb capacity reached")]
    BombCapacity,
    #[error("a bomb already occupies this tile")]
    TileOccupied,
    #[error("player is dead or out of play")]
    NotInPlay,
    #[error("no such player in this room")]
    UnknownPlayer,
    #[error("the game has not started")]
    NotStarted,
    #[error("the room is full")]
    RoomFull,
    #[error("the game already started")]
    AlreadyStarted,
}

/// A tick-fatal failure. The tick that produced it is discarded wholesale.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TickError {
    #[error("state corruption: {0}")]
    StateCorruption(String),
}

/// Work item drained from the room's command queue, in arrival order.
#[derive(Debug, Clone)]
pub enum RoomCommand {
    Join { player_id: PlayerId, name: String },
    Intent { player_id: PlayerId, intent: Intent },
}

#[derive(Clone)]
pub struct Room {
    id: u32,
    level: u32,
    grid: Grid,
    player_start: (i32, i32),
    enemy_spawns: Vec<EnemySpawn>,
    players: Vec<Player>,
    bombs: Vec<Bomb>,
    enemies: Vec<Enemy>,
    next_enemy_id: u32,
    tick: u64,
    started: bool,
    game_over: bool,
    completed: bool,
    contact: ContactTracker,
    rng: StdRng,
    destroyed_since_snapshot: Vec<(i32, i32)>,
}

impl Room {
    pub fn new(id: u32, layout: LevelLayout) -> Self {
        let rng = StdRng::seed_from_u64(0x517c_c1b7_2722_0a95 ^ u64::from(layout.number));
        Self {
            id,
            level: layout.number,
            grid: layout.grid,
            player_start: layout.player_start,
            enemy_spawns: layout.enemy_spawns,
            players: Vec::new(),
            bombs: Vec::new(),
            enemies: Vec::new(),
            next_enemy_id: 0,
            tick: 0,
            started: false,
            game_over: false,
            completed: false,
            contact: ContactTracker::new(),
            rng,
            destroyed_since_snapshot: Vec::new(),
        }
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn started(&self) -> bool {
        self.started
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    /// Advances the room by one tick: queued commands in arrival order, then
    /// bombs, then enemies, then progress checks. On corruption the whole
    /// tick is rolled back and the previous state stands.
    pub fn tick(&mut self, commands: Vec<RoomCommand>, delta: f32) -> Result<(), TickError> {
        let backup = self.clone();
        match self.tick_inner(commands, delta) {
            Ok(()) => Ok(()),
            Err(e) => {
                error!("Room {}: tick {} discarded: {}", self.id, backup.tick + 1, e);
                *self = backup;
                Err(e)
            }
        }
    }

    fn tick_inner(&mut self, commands: Vec<RoomCommand>, delta: f32) -> Result<(), TickError> {
        self.tick += 1;

        for command in commands {
            match command {
                RoomCommand::Join { player_id, name } => {
                    if let Err(reason) = self.add_player(player_id, name) {
                        debug!("Room {}: join rejected: {}", self.id, reason);
                    }
                }
                RoomCommand::Intent { player_id, intent } => {
                    if let Err(reason) = self.apply_intent(player_id, intent) {
                        debug!(
                            "Room {}: intent from player {} rejected: {}",
                            self.id, player_id, reason
                        );
                    }
                }
            }
        }

        if !self.started || self.game_over || self.completed {
            return Ok(());
        }

        let outcome = bombs::update(&mut self.grid, &mut self.bombs, delta);
        self.destroyed_since_snapshot
            .extend(outcome.destroyed_walls.iter().copied());
        self.apply_blast_damage(&outcome);

        self.update_enemies(delta);
        self.enemies
            .retain(|e| e.alive || e.corpse_timer < ENEMY_CORPSE_SECS);

        self.check_progress();
        self.verify_invariants()
    }

    fn add_player(&mut self, player_id: PlayerId, name: String) -> Result<(), RejectReason> {
        if self.started {
            return Err(RejectReason::AlreadyStarted);
        }
        if self.players.len() >= MAX_PLAYERS {
            return Err(RejectReason::RoomFull);
        }
        let mut player = Player::new(player_id, name);
        player.position = self.player_start;
        info!("Room {}: player {} ({}) joined", self.id, player.id, player.name);
        self.players.push(player);
        Ok(())
    }

    /// Validates and applies one intent. A rejection is a no-op: the next
    /// snapshot simply shows no change.
    pub fn apply_intent(
        &mut self,
        player_id: PlayerId,
        intent: Intent,
    ) -> Result<(), RejectReason> {
        let index = self
            .players
            .iter()
            .position(|p| p.id == player_id)
            .ok_or(RejectReason::UnknownPlayer)?;

        match intent {
            Intent::Leave => {
                let player = self.players.remove(index);
                self.contact.remove_player(player.id);
                info!("Room {}: player {} ({}) left", self.id, player.id, player.name);
                Ok(())
            }
            Intent::Ready => {
                self.players[index].ready = true;
                if !self.started && self.players.iter().all(|p| p.ready) {
                    self.start();
                }
                Ok(())
            }
            Intent::Move { direction } => {
                if !self.started {
                    return Err(RejectReason::NotStarted);
                }
                if !self.players[index].in_play() {
                    return Err(RejectReason::NotInPlay);
                }
                let (x, y) = self.players[index].position;
                let (dx, dy) = direction.delta();
                let target = (x + dx, y + dy);

                if !can_move_to(
                    &self.grid,
                    &self.players,
                    &self.bombs,
                    &self.enemies,
                    Mover::Player(player_id),
                    target.0,
                    target.1,
                ) {
                    return Err(RejectReason::Blocked);
                }

                self.players[index].position = target;
                if self.grid.tile_at(target.0, target.1) == Tile::Exit {
                    self.players[index].reached_exit = true;
                    info!(
                        "Room {}: player {} reached the exit at ({}, {})",
                        self.id, player_id, target.0, target.1
                    );
                }
                Ok(())
            }
            Intent::PlaceBomb => {
                if !self.started {
                    return Err(RejectReason::NotStarted);
                }
                let player = &self.players[index];
                if !player.in_play() {
                    return Err(RejectReason::NotInPlay);
                }
                if bombs::armed_count(&self.bombs, player.id) >= player.bomb_capacity as usize {
                    return Err(RejectReason::BombCapacity);
                }
                if bombs::armed_bomb_at(&self.bombs, player.position) {
                    return Err(RejectReason::TileOccupied);
                }
                let bomb = Bomb::new(player.id, player.position, player.bomb_power);
                info!(
                    "Room {}: player {} placed a bomb at ({}, {})",
                    self.id, player.id, player.position.0, player.position.1
                );
                self.bombs.push(bomb);
                Ok(())
            }
        }
    }

    fn start(&mut self) {
        if self.players.is_empty() {
            return;
        }
        self.started = true;
        self.spawn_enemies();
        self.position_players();
        info!(
            "Room {}: game started on level {} with {} players, {} enemies",
            self.id,
            self.level,
            self.players.len(),
            self.enemies.len()
        );
    }

    fn spawn_enemies(&mut self) {
        self.enemies.clear();
        let spawns = self.enemy_spawns.clone();
        for spawn in spawns {
            let (x, y) = spawn.position;
            if !self.grid.can_enter(x, y, MoverClass::Enemy) {
                warn!(
                    "Room {}: enemy spawn at ({}, {}) is blocked, skipping",
                    self.id, x, y
                );
                continue;
            }
            let id = self.next_enemy_id;
            self.next_enemy_id += 1;
            self.enemies.push(Enemy::new(id, spawn.kind, spawn.position));
        }
    }

    /// Places living players on distinct walkable tiles near the level's
    /// start corner, closest first.
    fn position_players(&mut self) {
        let mut candidates: Vec<(i32, i32)> = Vec::new();
        for y in 1..self.grid.height() - 1 {
            for x in 1..self.grid.width() - 1 {
                if !self.grid.can_enter(x, y, MoverClass::Player) {
                    continue;
                }
                if self.enemies.iter().any(|e| e.alive && e.position == (x, y)) {
                    continue;
                }
                candidates.push((x, y));
            }
        }
        let start = self.player_start;
        candidates.sort_by_key(|&(x, y)| {
            ((x - start.0).abs() + (y - start.1).abs(), y, x)
        });

        let mut next = candidates.into_iter();
        for player in self.players.iter_mut().filter(|p| p.alive) {
            if let Some(position) = next.next() {
                player.position = position;
            }
        }
    }

    /// Every in-play player and living enemy inside this tick's blast union
    /// is damaged exactly once, regardless of how many blasts overlap it.
    fn apply_blast_damage(&mut self, outcome: &ExplosionOutcome) {
        if outcome.blast.is_empty() {
            return;
        }

        for player in self.players.iter_mut() {
            if player.in_play() && outcome.blast.contains(&player.position) {
                player.take_damage(BLAST_DAMAGE_PLAYER);
                if player.alive {
                    info!(
                        "Room {}: player {} caught in blast ({} hp left)",
                        self.id, player.id, player.health
                    );
                } else {
                    info!("Room {}: player {} killed by blast", self.id, player.id);
                }
            }
        }

        for enemy in self.enemies.iter_mut() {
            if enemy.alive && outcome.blast.contains(&enemy.position) {
                enemy.take_damage(BLAST_DAMAGE_ENEMY);
                if !enemy.alive {
                    info!("Room {}: enemy {} killed by blast", self.id, enemy.id);
                }
            }
        }
    }

    /// Runs each enemy's strategy in spawn order. Moves commit sequentially
    /// and are re-validated against the resolver at the moment of commit, so
    /// two enemies can never claim one tile in the same tick. Moving enemies
    /// then deal contact damage to adjacent players.
    fn update_enemies(&mut self, delta: f32) {
        for i in 0..self.enemies.len() {
            if !self.enemies[i].alive {
                self.enemies[i].corpse_timer += delta;
                continue;
            }

            let mut enemy = self.enemies[i].clone();
            enemy.move_accumulator += delta;
            let behavior = behavior_for(enemy.kind);
            let mut moved = false;

            if enemy.move_accumulator >= behavior.move_interval() {
                let decision = {
                    let ctx = AiContext {
                        grid: &self.grid,
                        players: &self.players,
                        bombs: &self.bombs,
                        enemies: &self.enemies,
                    };
                    behavior.decide_move(&mut enemy, &ctx, &mut self.rng)
                };

                if let Some(target) = decision {
                    // Re-validate at commit time: an earlier mover may have
                    // claimed the tile since the strategy looked.
                    if can_move_to(
                        &self.grid,
                        &self.players,
                        &self.bombs,
                        &self.enemies,
                        Mover::Enemy(enemy.id),
                        target.0,
                        target.1,
                    ) {
                        enemy.position = target;
                        enemy.move_accumulator = 0.0;
                        moved = true;
                    }
                }
            }

            self.enemies[i] = enemy;

            let attacker = self.enemies[i].clone();
            for player in self.players.iter_mut() {
                if player.in_play() {
                    self.contact.check_and_apply(player, &attacker, moved, delta);
                }
            }
        }
    }

    fn check_progress(&mut self) {
        if self.players.is_empty() {
            return;
        }

        let alive: Vec<&Player> = self.players.iter().filter(|p| p.alive).collect();
        if alive.is_empty() {
            if !self.game_over {
                self.game_over = true;
                info!("Room {}: game over, all players died", self.id);
            }
            return;
        }

        if alive.iter().all(|p| p.reached_exit) {
            self.advance_level();
        }
    }

    /// All living players made the exit: move the room to a freshly
    /// generated next level, or mark the game completed after the last one.
    /// Survivors are healed and repositioned; the dead stay dead.
    fn advance_level(&mut self) {
        if self.level >= MAX_LEVEL {
            self.completed = true;
            info!("Room {}: game completed at level {}", self.id, self.level);
            return;
        }

        self.level += 1;
        let layout =
            LevelLayout::generate(self.level, self.grid.width(), self.grid.height());
        self.grid = layout.grid;
        self.player_start = layout.player_start;
        self.enemy_spawns = layout.enemy_spawns;
        self.bombs.clear();
        self.destroyed_since_snapshot.clear();

        for player in self.players.iter_mut().filter(|p| p.alive) {
            player.health = MAX_HEALTH;
            player.reached_exit = false;
        }

        self.spawn_enemies();
        self.position_players();
        info!("Room {}: advanced to level {}", self.id, self.level);
    }

    /// Post-tick invariant sweep. A violation here means the tick's result
    /// must not be published.
    fn verify_invariants(&self) -> Result<(), TickError> {
        for (i, a) in self.players.iter().enumerate() {
            if !a.in_play() {
                continue;
            }
            for b in self.players.iter().skip(i + 1) {
                if b.in_play() && a.position == b.position {
                    return Err(TickError::StateCorruption(format!(
                        "players {} and {} share tile ({}, {})",
                        a.id, b.id, a.position.0, a.position.1
                    )));
                }
            }
        }

        for (i, a) in self.enemies.iter().enumerate() {
            if !a.alive {
                continue;
            }
            for b in self.enemies.iter().skip(i + 1) {
                if b.alive && a.position == b.position {
                    return Err(TickError::StateCorruption(format!(
                        "enemies {} and {} share tile ({}, {})",
                        a.id, b.id, a.position.0, a.position.1
                    )));
                }
            }
        }

        for player in &self.players {
            if player.health < 0 || player.health > MAX_HEALTH {
                return Err(TickError::StateCorruption(format!(
                    "player {} health {} out of range",
                    player.id, player.health
                )));
            }
            if player.health == 0 && player.alive {
                return Err(TickError::StateCorruption(format!(
                    "player {} alive at zero health",
                    player.id
                )));
            }
        }

        Ok(())
    }

    /// Builds the published view of this room and drains the
    /// destroyed-walls delta, so each wall appears in exactly one snapshot.
    pub fn snapshot(&mut self) -> RoomSnapshot {
        RoomSnapshot {
            tick: self.tick,
            level: self.level,
            started: self.started,
            game_over: self.game_over,
            completed: self.completed,
            players: self
                .players
                .iter()
                .map(|p| PlayerView {
                    id: p.id,
                    name: p.name.clone(),
                    position: p.position,
                    health: p.health,
                    alive: p.alive,
                    ready: p.ready,
                    reached_exit: p.reached_exit,
                })
                .collect(),
            bombs: self
                .bombs
                .iter()
                .map(|b| BombView {
                    owner: b.owner,
                    position: b.position,
                    fuse: b.fuse.max(0.0),
                    exploded: b.exploded,
                    blast: b.blast.clone(),
                })
                .collect(),
            enemies: self
                .enemies
                .iter()
                .map(|e| EnemyView {
                    id: e.id,
                    kind: e.kind,
                    position: e.position,
                    health: e.health,
                    alive: e.alive,
                })
                .collect(),
            destroyed_walls: std::mem::take(&mut self.destroyed_since_snapshot),
        }
    }
}

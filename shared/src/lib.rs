use serde::{Deserialize, Serialize};

/// Maximum (and starting) health for players and enemies.
pub const MAX_HEALTH: i32 = 100;
/// Seconds from bomb placement to detonation.
pub const BOMB_FUSE_SECS: f32 = 4.0;
/// Seconds an explosion lingers before the bomb is removed.
pub const BOMB_LINGER_SECS: f32 = 1.0;
/// Damage a blast deals to a player caught in it.
pub const BLAST_DAMAGE_PLAYER: i32 = 20;
/// Damage a blast deals to an enemy caught in it.
pub const BLAST_DAMAGE_ENEMY: i32 = 50;
/// Damage an adjacent moving enemy deals to a player.
pub const CONTACT_DAMAGE: i32 = 10;
/// Cooldown after the first touch of an enemy, in seconds.
pub const CONTACT_COOLDOWN_FIRST: f32 = 0.5;
/// Cooldown while contact has been sustained past the threshold.
pub const CONTACT_COOLDOWN_SUSTAINED: f32 = 0.2;
/// Seconds of continuous contact before the faster cooldown applies.
pub const CONTACT_SUSTAIN_THRESHOLD: f32 = 3.0;
/// Seconds a dead enemy stays in the room before it is removed.
pub const ENEMY_CORPSE_SECS: f32 = 2.0;
/// Bombs a player may have armed at once, before modifiers.
pub const DEFAULT_BOMB_CAPACITY: u32 = 1;
/// Blast radius in tiles, before modifiers.
pub const DEFAULT_BOMB_POWER: u32 = 1;
/// Default simulation rate in ticks per second.
pub const DEFAULT_TICK_RATE: u32 = 30;
/// Default level dimensions.
pub const DEFAULT_LEVEL_WIDTH: i32 = 11;
pub const DEFAULT_LEVEL_HEIGHT: i32 = 9;

/// A grid-aligned movement direction.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    /// The (dx, dy) offset of one step in this direction. Y grows downward.
    pub fn delta(&self) -> (i32, i32) {
        match self {
            Direction::Up => (0, -1),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
        }
    }
}

/// A client-submitted mutation request. The transport parses inbound
/// messages into these; the room validates and applies them in arrival
/// order during its tick.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub enum Intent {
    Move { direction: Direction },
    PlaceBomb,
    Ready,
    Leave,
}

/// Enemy behavior variants.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EnemyKind {
    Static,
    Chasing,
    Smart,
}

/// Player state as published to clients.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct PlayerView {
    pub id: u32,
    pub name: String,
    pub position: (i32, i32),
    pub health: i32,
    pub alive: bool,
    pub ready: bool,
    pub reached_exit: bool,
}

/// Bomb state as published to clients. `blast` is empty until the bomb
/// explodes, after which it holds the affected tiles.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct BombView {
    pub owner: u32,
    pub position: (i32, i32),
    pub fuse: f32,
    pub exploded: bool,
    pub blast: Vec<(i32, i32)>,
}

/// Enemy state as published to clients.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct EnemyView {
    pub id: u32,
    pub kind: EnemyKind,
    pub position: (i32, i32),
    pub health: i32,
    pub alive: bool,
}

/// A fully-consistent view of one room, published after a tick commits.
/// `destroyed_walls` only lists walls broken since the previous snapshot.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct RoomSnapshot {
    pub tick: u64,
    pub level: u32,
    pub started: bool,
    pub game_over: bool,
    pub completed: bool,
    pub players: Vec<PlayerView>,
    pub bombs: Vec<BombView>,
    pub enemies: Vec<EnemyView>,
    pub destroyed_walls: Vec<(i32, i32)>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_deltas() {
        assert_eq!(Direction::Up.delta(), (0, -1));
        assert_eq!(Direction::Down.delta(), (0, 1));
        assert_eq!(Direction::Left.delta(), (-1, 0));
        assert_eq!(Direction::Right.delta(), (1, 0));
    }

    #[test]
    fn test_intent_serialization() {
        let intent = Intent::Move {
            direction: Direction::Left,
        };
        let serialized = bincode::serialize(&intent).unwrap();
        let deserialized: Intent = bincode::deserialize(&serialized).unwrap();

        match deserialized {
            Intent::Move { direction } => assert_eq!(direction, Direction::Left),
            _ => panic!("Wrong intent type after deserialization"),
        }
    }

    #[test]
    fn test_snapshot_serialization() {
        let snapshot = RoomSnapshot {
            tick: 42,
            level: 1,
            started: true,
            game_over: false,
            completed: false,
            players: vec![PlayerView {
                id: 1,
                name: "alice".to_string(),
                position: (1, 1),
                health: 80,
                alive: true,
                ready: true,
                reached_exit: false,
            }],
            bombs: vec![BombView {
                owner: 1,
                position: (3, 1),
                fuse: 2.5,
                exploded: false,
                blast: vec![],
            }],
            enemies: vec![EnemyView {
                id: 0,
                kind: EnemyKind::Smart,
                position: (7, 5),
                health: 100,
                alive: true,
            }],
            destroyed_walls: vec![(4, 1)],
        };

        let serialized = bincode::serialize(&snapshot).unwrap();
        let deserialized: RoomSnapshot = bincode::deserialize(&serialized).unwrap();

        assert_eq!(deserialized.tick, 42);
        assert_eq!(deserialized.players.len(), 1);
        assert_eq!(deserialized.players[0].name, "alice");
        assert_eq!(deserialized.bombs[0].position, (3, 1));
        assert_eq!(deserialized.enemies[0].kind, EnemyKind::Smart);
        assert_eq!(deserialized.destroyed_walls, vec![(4, 1)]);
    }

    #[test]
    fn test_constants_sanity() {
        assert!(BOMB_FUSE_SECS > 0.0);
        assert!(BOMB_LINGER_SECS > 0.0);
        assert!(BLAST_DAMAGE_PLAYER > 0);
        assert!(BLAST_DAMAGE_ENEMY >= BLAST_DAMAGE_PLAYER);
        assert!(CONTACT_COOLDOWN_SUSTAINED < CONTACT_COOLDOWN_FIRST);
        assert_eq!(MAX_HEALTH % BLAST_DAMAGE_PLAYER, 0);
    }
}

//! Deterministic end-to-end simulation scenarios, driven tick by tick
//! through the public room API.

use server::grid::{Grid, Tile};
use server::level::{EnemySpawn, LevelLayout};
use server::registry::{new_room, RoomHandle, RoomWorker};
use shared::{
    Direction, EnemyKind, Intent, BLAST_DAMAGE_PLAYER, DEFAULT_TICK_RATE, MAX_HEALTH,
};

const DT: f32 = 1.0 / DEFAULT_TICK_RATE as f32;

/// An 11x9 arena with a hard border, an open interior, and the exit in the
/// far corner. Tests add walls and enemy spawns as needed.
fn open_layout(enemy_spawns: Vec<EnemySpawn>) -> LevelLayout {
    let mut grid = Grid::new(11, 9);
    for x in 0..11 {
        grid.set_tile(x, 0, Tile::HardWall);
        grid.set_tile(x, 8, Tile::HardWall);
    }
    for y in 0..9 {
        grid.set_tile(0, y, Tile::HardWall);
        grid.set_tile(10, y, Tile::HardWall);
    }
    grid.set_tile(9, 7, Tile::Exit);
    LevelLayout {
        number: 1,
        grid,
        player_start: (1, 1),
        enemy_spawns,
    }
}

fn started_room(
    layout: LevelLayout,
    names: &[&str],
) -> (RoomHandle, RoomWorker, Vec<u32>) {
    let (handle, mut worker) = new_room(1, layout);
    let ids: Vec<u32> = names.iter().map(|name| handle.join(name)).collect();
    for &id in &ids {
        handle.submit_intent(id, Intent::Ready);
    }
    worker.tick(DT);
    assert!(handle.snapshot().started);
    (handle, worker, ids)
}

/// Submits one move and runs one tick.
fn step(handle: &RoomHandle, worker: &mut RoomWorker, player: u32, direction: Direction) {
    handle.submit_intent(player, Intent::Move { direction });
    worker.tick(DT);
}

fn position_of(handle: &RoomHandle, player: u32) -> (i32, i32) {
    handle
        .snapshot()
        .players
        .iter()
        .find(|p| p.id == player)
        .unwrap()
        .position
}

fn health_of(handle: &RoomHandle, player: u32) -> i32 {
    handle
        .snapshot()
        .players
        .iter()
        .find(|p| p.id == player)
        .unwrap()
        .health
}

#[test]
fn test_static_enemy_stays_within_one_tile_of_spawn() {
    let spawn = (5, 4);
    let layout = open_layout(vec![EnemySpawn {
        kind: EnemyKind::Static,
        position: spawn,
    }]);
    let (handle, mut worker, _ids) = started_room(layout, &["alice"]);

    for _ in 0..1000 {
        worker.tick(DT);
        let snapshot = handle.snapshot();
        let enemy = &snapshot.enemies[0];
        let distance =
            (enemy.position.0 - spawn.0).abs() + (enemy.position.1 - spawn.1).abs();
        assert!(distance <= 1, "static enemy strayed to {:?}", enemy.position);
    }
}

#[test]
fn test_smart_enemy_distance_is_nonincreasing() {
    let layout = open_layout(vec![EnemySpawn {
        kind: EnemyKind::Smart,
        position: (8, 1),
    }]);
    let (handle, mut worker, ids) = started_room(layout, &["alice"]);
    let player_pos = position_of(&handle, ids[0]);

    let enemy_pos = handle.snapshot().enemies[0].position;
    let mut distance =
        (enemy_pos.0 - player_pos.0).abs() + (enemy_pos.1 - player_pos.1).abs();
    let initial = distance;

    // The player holds still; the pursuer must only ever close the gap
    for _ in 0..300 {
        worker.tick(DT);
        let enemy_pos = handle.snapshot().enemies[0].position;
        let new_distance =
            (enemy_pos.0 - player_pos.0).abs() + (enemy_pos.1 - player_pos.1).abs();
        assert!(new_distance <= distance, "smart enemy retreated");
        distance = new_distance;
    }
    assert!(distance < initial);
}

#[test]
fn test_simultaneous_claims_resolve_to_first_mover() {
    let (handle, mut worker, ids) = started_room(open_layout(Vec::new()), &["alice", "bob"]);
    let (alice, bob) = (ids[0], ids[1]);
    assert_eq!(position_of(&handle, alice), (1, 1));
    assert_eq!(position_of(&handle, bob), (2, 1));

    // Separate them so both can target (2,1)... first walk bob to (3,1)
    step(&handle, &mut worker, bob, Direction::Right);
    assert_eq!(position_of(&handle, bob), (3, 1));

    // Both claim (2,1) in the same tick; arrival order decides
    handle.submit_intent(alice, Intent::Move {
        direction: Direction::Right,
    });
    handle.submit_intent(bob, Intent::Move {
        direction: Direction::Left,
    });
    worker.tick(DT);

    assert_eq!(position_of(&handle, alice), (2, 1));
    assert_eq!(position_of(&handle, bob), (3, 1));
}

#[test]
fn test_blast_breaks_wall_and_reports_it_once() {
    let mut layout = open_layout(Vec::new());
    layout.grid.set_tile(4, 1, Tile::BreakableWall);
    let (handle, mut worker, ids) = started_room(layout, &["alice"]);
    let alice = ids[0];

    // Walk beside the wall, drop a bomb, retreat out of the blast
    step(&handle, &mut worker, alice, Direction::Right);
    step(&handle, &mut worker, alice, Direction::Right);
    assert_eq!(position_of(&handle, alice), (3, 1));
    handle.submit_intent(alice, Intent::PlaceBomb);
    worker.tick(DT);
    step(&handle, &mut worker, alice, Direction::Left);
    step(&handle, &mut worker, alice, Direction::Down);
    step(&handle, &mut worker, alice, Direction::Down);

    let mut destroyed = Vec::new();
    for _ in 0..140 {
        worker.tick(DT);
        destroyed.extend(handle.snapshot().destroyed_walls.iter().copied());
    }

    // The wall fell, was reported in exactly one snapshot, and the player
    // was clear of the blast
    assert_eq!(destroyed.iter().filter(|&&w| w == (4, 1)).count(), 1);
    assert_eq!(health_of(&handle, alice), MAX_HEALTH);
}

#[test]
fn test_overlapping_blasts_damage_a_player_once() {
    let (handle, mut worker, ids) =
        started_room(open_layout(Vec::new()), &["alice", "bob", "carol"]);
    let (alice, bob, carol) = (ids[0], ids[1], ids[2]);

    // bob: (2,1) -> (6,1)
    for _ in 0..4 {
        step(&handle, &mut worker, bob, Direction::Right);
    }
    assert_eq!(position_of(&handle, bob), (6, 1));

    // alice: (1,1) -> (4,1)
    for _ in 0..3 {
        step(&handle, &mut worker, alice, Direction::Right);
    }
    assert_eq!(position_of(&handle, alice), (4, 1));

    // carol: (1,2) -> (5,1), between the two bomb sites
    for _ in 0..4 {
        step(&handle, &mut worker, carol, Direction::Right);
    }
    step(&handle, &mut worker, carol, Direction::Up);
    assert_eq!(position_of(&handle, carol), (5, 1));

    // Both bombs in the same tick, so their fuses expire together
    handle.submit_intent(alice, Intent::PlaceBomb);
    handle.submit_intent(bob, Intent::PlaceBomb);
    worker.tick(DT);

    // Bombers retreat clear of their own blasts; carol stays put
    step(&handle, &mut worker, alice, Direction::Left);
    step(&handle, &mut worker, alice, Direction::Down);
    step(&handle, &mut worker, bob, Direction::Right);
    step(&handle, &mut worker, bob, Direction::Down);

    for _ in 0..140 {
        worker.tick(DT);
    }

    // Caught in two simultaneous blasts, damaged exactly once
    assert_eq!(health_of(&handle, carol), MAX_HEALTH - BLAST_DAMAGE_PLAYER);
    assert_eq!(health_of(&handle, alice), MAX_HEALTH);
    assert_eq!(health_of(&handle, bob), MAX_HEALTH);
}

#[test]
fn test_chain_detonation_fires_in_one_tick() {
    let (handle, mut worker, ids) =
        started_room(open_layout(Vec::new()), &["alice", "bob"]);
    let (alice, bob) = (ids[0], ids[1]);

    // alice drops at (3,1), retreats down and away
    step(&handle, &mut worker, alice, Direction::Right);
    step(&handle, &mut worker, alice, Direction::Right);
    handle.submit_intent(alice, Intent::PlaceBomb);
    worker.tick(DT);
    step(&handle, &mut worker, alice, Direction::Down);
    step(&handle, &mut worker, alice, Direction::Down);
    step(&handle, &mut worker, alice, Direction::Left);

    // A second later, bob walks around the armed bomb, drops his own right
    // next to it at (4,1), and retreats
    for _ in 0..30 {
        worker.tick(DT);
    }
    step(&handle, &mut worker, bob, Direction::Down);
    step(&handle, &mut worker, bob, Direction::Right);
    step(&handle, &mut worker, bob, Direction::Right);
    step(&handle, &mut worker, bob, Direction::Up);
    assert_eq!(position_of(&handle, bob), (4, 1));
    handle.submit_intent(bob, Intent::PlaceBomb);
    worker.tick(DT);
    step(&handle, &mut worker, bob, Direction::Right);
    step(&handle, &mut worker, bob, Direction::Right);
    step(&handle, &mut worker, bob, Direction::Down);

    // The first fuse takes the second bomb with it: the tick that shows any
    // explosion shows both
    let mut ticks = 0;
    loop {
        worker.tick(DT);
        ticks += 1;
        assert!(ticks < 200, "no explosion happened");

        let snapshot = handle.snapshot();
        if snapshot.bombs.iter().any(|b| b.exploded) {
            assert_eq!(snapshot.bombs.len(), 2);
            assert!(snapshot.bombs.iter().all(|b| b.exploded));
            assert!(snapshot.bombs.iter().all(|b| !b.blast.is_empty()));
            break;
        }
    }
}

#[test]
fn test_bomb_capacity_holds_under_spam() {
    let (handle, mut worker, ids) = started_room(open_layout(Vec::new()), &["alice"]);
    let alice = ids[0];

    for _ in 0..160 {
        handle.submit_intent(alice, Intent::PlaceBomb);
        worker.tick(DT);
        let snapshot = handle.snapshot();
        let armed = snapshot
            .bombs
            .iter()
            .filter(|b| !b.exploded && b.owner == alice)
            .count();
        assert!(armed <= 1, "capacity exceeded: {} armed bombs", armed);
    }
}

#[test]
fn test_reaching_exit_advances_the_level() {
    let (handle, mut worker, ids) = started_room(open_layout(Vec::new()), &["alice"]);
    let alice = ids[0];

    // Walk the open arena to the exit at (9,7)
    for _ in 0..8 {
        step(&handle, &mut worker, alice, Direction::Right);
    }
    for _ in 0..6 {
        step(&handle, &mut worker, alice, Direction::Down);
    }

    let snapshot = handle.snapshot();
    assert_eq!(snapshot.level, 2);
    assert!(!snapshot.game_over);
    let player = &snapshot.players[0];
    assert_eq!(player.health, MAX_HEALTH);
    assert!(!player.reached_exit);
    // The next level brought fresh enemies
    assert!(!snapshot.enemies.is_empty());
}

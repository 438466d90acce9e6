use clap::Parser;
use log::info;
use rand::Rng;
use server::level::LevelLayout;
use server::registry::RoomRegistry;
use shared::{Direction, Intent};
use std::sync::Arc;
use tokio::time::{interval, Duration};

/// Main-method of the application.
/// Parses command-line arguments, creates a room and drives it with
/// scripted players so the simulation can be watched headless.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Command line arguments
    #[derive(Parser, Debug)]
    #[clap(author, version, about)]
    struct Args {
        /// Tick rate (updates per second)
        #[clap(short, long, default_value = "30")]
        tick_rate: u32,
        /// Level number to start on
        #[clap(short, long, default_value = "1")]
        level: u32,
        /// Level width in tiles
        #[clap(long, default_value = "11")]
        width: i32,
        /// Level height in tiles
        #[clap(long, default_value = "9")]
        height: i32,
        /// Number of scripted players
        #[clap(short, long, default_value = "2")]
        players: usize,
    }

    env_logger::init();
    let args = Args::parse();

    let registry = Arc::new(RoomRegistry::new(args.tick_rate));
    let layout = LevelLayout::generate(args.level, args.width, args.height);
    let room = registry.create_room(layout);

    let player_ids: Vec<u32> = (0..args.players)
        .map(|i| room.join(&format!("player-{}", i + 1)))
        .collect();
    for &id in &player_ids {
        room.submit_intent(id, Intent::Ready);
    }
    info!(
        "Driving room {} with {} scripted players at {} ticks/s",
        room.id(),
        player_ids.len(),
        args.tick_rate
    );

    // Scripted intent producer, standing in for the transport layer
    let driver_handle = {
        let room = room.clone();
        let player_ids = player_ids.clone();
        tokio::spawn(async move {
            let mut timer = interval(Duration::from_millis(250));
            loop {
                timer.tick().await;
                for &id in &player_ids {
                    let intent = match rand::thread_rng().gen_range(0..6) {
                        0 => Intent::PlaceBomb,
                        1 => Intent::Move {
                            direction: Direction::Up,
                        },
                        2 => Intent::Move {
                            direction: Direction::Down,
                        },
                        3 => Intent::Move {
                            direction: Direction::Left,
                        },
                        _ => Intent::Move {
                            direction: Direction::Right,
                        },
                    };
                    room.submit_intent(id, intent);
                }
            }
        })
    };

    // Snapshot reporter: logs the room once per second, ends with the game
    let reporter_handle = {
        let room = room.clone();
        tokio::spawn(async move {
            let mut timer = interval(Duration::from_secs(1));
            loop {
                timer.tick().await;
                let snapshot = room.snapshot();
                info!(
                    "tick {}: level {}, {} players ({} alive), {} bombs, {} enemies",
                    snapshot.tick,
                    snapshot.level,
                    snapshot.players.len(),
                    snapshot.players.iter().filter(|p| p.alive).count(),
                    snapshot.bombs.len(),
                    snapshot.enemies.len()
                );
                if snapshot.game_over || snapshot.completed {
                    info!(
                        "Run finished: {}",
                        if snapshot.completed {
                            "all levels cleared"
                        } else {
                            "all players died"
                        }
                    );
                    break;
                }
            }
        })
    };

    // Handle shutdown gracefully
    tokio::select! {
        result = reporter_handle => {
            if let Err(e) = result {
                eprintln!("Reporter task panicked: {}", e);
            }
        }
        result = driver_handle => {
            if let Err(e) = result {
                eprintln!("Driver task panicked: {}", e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            println!("Received Ctrl+C, shutting down gracefully...");
        }
    }

    registry.destroy_room(room.id());
    Ok(())
}

//! Concurrency gateway and process-wide room arena.
//!
//! Handlers never touch a `Room` directly: they enqueue commands through a
//! `RoomHandle` and read the last published snapshot. Each room has exactly
//! one writer, its `RoomWorker`, which drains the queue in arrival order,
//! runs the tick, and swaps the published snapshot atomically. Producers
//! never block; readers never observe a half-applied tick.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, RwLock};

use log::{info, warn};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{interval, Duration, MissedTickBehavior};

use crate::entities::PlayerId;
use crate::level::LevelLayout;
use crate::room::{Room, RoomCommand};
use shared::{Intent, RoomSnapshot};

/// Cheap, cloneable producer/reader side of one room.
#[derive(Clone)]
pub struct RoomHandle {
    id: u32,
    commands: mpsc::UnboundedSender<RoomCommand>,
    snapshot: watch::Receiver<Arc<RoomSnapshot>>,
    next_player_id: Arc<AtomicU32>,
}

impl RoomHandle {
    pub fn id(&self) -> u32 {
        self.id
    }

    /// Reserves a player id and enqueues the join. The player materializes
    /// on the room's next tick; ids are unique even under concurrent joins.
    pub fn join(&self, name: &str) -> PlayerId {
        let player_id = self.next_player_id.fetch_add(1, Ordering::Relaxed);
        let _ = self.commands.send(RoomCommand::Join {
            player_id,
            name: name.to_string(),
        });
        player_id
    }

    /// Non-blocking enqueue. Returns false if the room's worker is gone.
    pub fn submit_intent(&self, player_id: PlayerId, intent: Intent) -> bool {
        self.commands
            .send(RoomCommand::Intent { player_id, intent })
            .is_ok()
    }

    /// The last fully committed snapshot.
    pub fn snapshot(&self) -> Arc<RoomSnapshot> {
        self.snapshot.borrow().clone()
    }
}

/// The sole writer of one room. Owns the state, the queue's consumer end
/// and the snapshot publisher.
pub struct RoomWorker {
    room: Room,
    commands: mpsc::UnboundedReceiver<RoomCommand>,
    publisher: watch::Sender<Arc<RoomSnapshot>>,
}

impl RoomWorker {
    /// Runs one tick: drain everything queued so far in arrival order,
    /// advance the simulation, publish. A corrupted tick publishes nothing,
    /// leaving the previous snapshot in place.
    pub fn tick(&mut self, delta: f32) {
        let mut batch = Vec::new();
        while let Ok(command) = self.commands.try_recv() {
            batch.push(command);
        }

        if self.room.tick(batch, delta).is_ok() {
            let _ = self.publisher.send(Arc::new(self.room.snapshot()));
        }
    }
}

/// Builds the handle/worker pair for a room. The worker is meant to be
/// moved into a dedicated task; the handle is what everything else sees.
pub fn new_room(id: u32, layout: LevelLayout) -> (RoomHandle, RoomWorker) {
    let mut room = Room::new(id, layout);
    let (command_tx, command_rx) = mpsc::unbounded_channel();
    let (snapshot_tx, snapshot_rx) = watch::channel(Arc::new(room.snapshot()));

    let handle = RoomHandle {
        id,
        commands: command_tx,
        snapshot: snapshot_rx,
        next_player_id: Arc::new(AtomicU32::new(1)),
    };
    let worker = RoomWorker {
        room,
        commands: command_rx,
        publisher: snapshot_tx,
    };
    (handle, worker)
}

/// Drives a worker at a fixed rate. The per-tick delta is the nominal tick
/// duration, not measured wall-clock time, so fuse and chain timing stay
/// reproducible; a stalled host skips ticks instead of stretching them.
pub async fn run_room_loop(mut worker: RoomWorker, tick_rate: u32) {
    let delta = 1.0 / tick_rate as f32;
    let mut timer = interval(Duration::from_secs_f32(delta));
    timer.set_missed_tick_behavior(MissedTickBehavior::Skip);

    // The first tick fires immediately
    timer.tick().await;

    loop {
        timer.tick().await;
        worker.tick(delta);
    }
}

struct RoomEntry {
    handle: RoomHandle,
    task: JoinHandle<()>,
}

/// Process-wide registry of live rooms. Lifecycle is explicit: rooms exist
/// from `create_room` to `destroy_room` and share nothing with each other.
pub struct RoomRegistry {
    rooms: RwLock<HashMap<u32, RoomEntry>>,
    next_room_id: AtomicU32,
    tick_rate: u32,
}

impl RoomRegistry {
    pub fn new(tick_rate: u32) -> Self {
        Self {
            rooms: RwLock::new(HashMap::new()),
            next_room_id: AtomicU32::new(1),
            tick_rate,
        }
    }

    /// Creates a room for the given layout and spawns its tick loop.
    pub fn create_room(&self, layout: LevelLayout) -> RoomHandle {
        let id = self.next_room_id.fetch_add(1, Ordering::Relaxed);
        let (handle, worker) = new_room(id, layout);
        let task = tokio::spawn(run_room_loop(worker, self.tick_rate));

        info!("Room {} created", id);
        let entry = RoomEntry {
            handle: handle.clone(),
            task,
        };
        self.rooms
            .write()
            .expect("room registry lock poisoned")
            .insert(id, entry);
        handle
    }

    pub fn get(&self, room_id: u32) -> Option<RoomHandle> {
        self.rooms
            .read()
            .expect("room registry lock poisoned")
            .get(&room_id)
            .map(|entry| entry.handle.clone())
    }

    /// Enqueues an intent for a room. Returns false for unknown rooms.
    pub fn submit_intent(&self, room_id: u32, player_id: PlayerId, intent: Intent) -> bool {
        match self.get(room_id) {
            Some(handle) => handle.submit_intent(player_id, intent),
            None => {
                warn!("Intent for unknown room {}", room_id);
                false
            }
        }
    }

    /// The last committed snapshot of a room, if it exists.
    pub fn read_snapshot(&self, room_id: u32) -> Option<Arc<RoomSnapshot>> {
        self.get(room_id).map(|handle| handle.snapshot())
    }

    /// Stops a room's tick loop and forgets it.
    pub fn destroy_room(&self, room_id: u32) -> bool {
        let entry = self
            .rooms
            .write()
            .expect("room registry lock poisoned")
            .remove(&room_id);
        match entry {
            Some(entry) => {
                entry.task.abort();
                info!("Room {} destroyed", room_id);
                true
            }
            None => false,
        }
    }

    pub fn room_count(&self) -> usize {
        self.rooms
            .read()
            .expect("room registry lock poisoned")
            .len()
    }
}

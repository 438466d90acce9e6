//! # Arena Simulation Server Library
//!
//! This library provides the authoritative simulation core for a grid-based
//! multiplayer arena game: destructible walls, timed bombs, AI-controlled
//! enemies, and player-vs-player and player-vs-enemy combat. The server is
//! the sole source of truth for positions, health and terrain; clients only
//! submit intents and render the snapshots that come back.
//!
//! ## Core Responsibilities
//!
//! ### Authoritative Simulation
//! Every room runs a fixed-tick state machine. Client intents (move, place
//! bomb, ready, leave) are validated against the collision rules before they
//! change anything, so a modified client cannot walk through walls, stack
//! bombs past its capacity or teleport. Rejected intents are silent no-ops:
//! the next snapshot simply shows no change.
//!
//! ### Deterministic Ticks
//! The tick loop advances with a fixed nominal delta rather than measured
//! wall-clock time, keeping bomb fuses, chain reactions and enemy movement
//! reproducible within a process run. Each tick applies in a fixed phase
//! order: queued intents, bomb fuses and explosions, enemy AI, damage and
//! progress checks. A tick that trips an invariant is discarded wholesale
//! and the previous snapshot stands.
//!
//! ### Snapshot Publication
//! After each committed tick a room publishes an immutable snapshot of its
//! players, bombs, enemies and newly destroyed walls. Readers always see the
//! last fully committed view, never an interleaving of two ticks.
//!
//! ## Architecture Design
//!
//! ### Single Writer Per Room
//! A room's mutable state is owned by exactly one task. Network handlers and
//! other producers interact with it only through a multi-producer command
//! queue and the published snapshot, so the simulation itself needs no
//! internal locking.
//!
//! ### Room Arena
//! Rooms live in a process-wide registry keyed by id. Their lifecycle is
//! explicit — created with a level layout, destroyed on teardown — and no
//! mutable state is shared between rooms.
//!
//! ## Module Organization
//!
//! - [`grid`] — tile map and the destructibility overlay
//! - [`level`] — procedural level layouts and spawn data
//! - [`entities`] — player, bomb and enemy records
//! - [`collision`] — tile-occupancy legality queries
//! - [`bombs`] — fuses, blast rays, chain detonation
//! - [`enemy`] — movement strategies behind one behavior table
//! - [`damage`] — enemy-contact damage cadence
//! - [`room`] — the per-room state machine and snapshot builder
//! - [`registry`] — command queues, tick workers, the room arena
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use server::level::LevelLayout;
//! use server::registry::RoomRegistry;
//! use shared::{Direction, Intent};
//!
//! #[tokio::main]
//! async fn main() {
//!     let registry = RoomRegistry::new(30);
//!     let layout = LevelLayout::generate(1, 11, 9);
//!     let room = registry.create_room(layout);
//!
//!     let player = room.join("alice");
//!     room.submit_intent(player, Intent::Ready);
//!     room.submit_intent(player, Intent::Move { direction: Direction::Right });
//!
//!     // The transport layer broadcasts this after every tick
//!     let snapshot = room.snapshot();
//!     println!("tick {} with {} players", snapshot.tick, snapshot.players.len());
//! }
//! ```

pub mod bombs;
pub mod collision;
pub mod damage;
pub mod entities;
pub mod enemy;
pub mod grid;
pub mod level;
pub mod registry;
pub mod room;

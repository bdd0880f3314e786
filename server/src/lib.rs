//! # Tank Battle Server
//!
//! Authoritative server for a grid-based multiplayer tank battle. Clients
//! send single-byte commands over TCP; the server advances the one true world
//! on a fixed tick and broadcasts the full state to every connected player.
//!
//! ## Architecture
//!
//! Three kinds of tasks run on the multi-threaded tokio runtime:
//!
//! - **Accept loop** ([`network::Server::run`]): registers each connection,
//!   announces the join to the simulation and spawns the connection's tasks.
//! - **Connection tasks**: a reader ([`ingest::read_actions`]) that turns input
//!   bytes into queued actions, and a writer ([`network::write_frames`]) that
//!   drains the connection's outbox onto the socket.
//! - **Simulation** ([`engine::Engine::run`]): the only owner of the
//!   [`world::World`]. It applies joins and leaves, applies at most one queued
//!   action per global cooldown, runs physics on its own tick and broadcasts
//!   each resulting snapshot through the [`registry::SessionRegistry`].
//!
//! Nothing outside the simulation task holds a reference into the world.
//! Readers talk to it through the [`ingest::ActionQueue`] and
//! [`ingest::SessionEvent`]s, and clients only ever see encoded snapshots.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use server::{config::ServerConfig, network::Server, shutdown::Shutdown};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let shutdown = Shutdown::new();
//!     let (server, engine) = Server::bind(&ServerConfig::default(), shutdown.clone()).await?;
//!
//!     tokio::spawn(engine.run(shutdown));
//!     server.run().await;
//!     Ok(())
//! }
//! ```

pub mod bullets;
pub mod config;
pub mod engine;
pub mod ingest;
pub mod network;
pub mod registry;
pub mod scheduler;
pub mod shutdown;
pub mod world;

//! Simulate adverse network conditions between a transport and the network.
//!
//! # Overview
//!
//! A [Simulator] sits between an application transport and the real socket and
//! deliberately degrades delivery: packets are delayed by a configurable
//! latency (plus uniform jitter), dropped with some probability, and
//! occasionally duplicated with an extra random delay. This makes it possible
//! to exercise networked applications under realistic conditions instead of
//! ideal local-network conditions.
//!
//! The simulator is driven by an external simulation clock: the caller queues
//! packets with [Simulator::send], pumps [Simulator::advance] at a regular
//! cadence, and drains due packets with [Simulator::receive] (or
//! [Simulator::receive_sent_to] to poll a single address cheaply). Buffered
//! packets live in a fixed-capacity ring: when the ring wraps, the oldest
//! occupant of the slot is released and overwritten. Nothing here blocks,
//! spawns, or performs I/O; a shared instance must be externally serialized.
//!
//! # Example
//!
//! ```rust
//! use conditioner::{pool::Heap, Config, Simulator, DEFAULT_CAPACITY};
//! use prometheus_client::registry::Registry;
//! use rand::{rngs::StdRng, SeedableRng};
//! use std::net::SocketAddr;
//! use std::sync::{Arc, Mutex};
//!
//! // Create a simulator with deterministic randomness
//! let registry = Arc::new(Mutex::new(Registry::default()));
//! let mut simulator = Simulator::new(
//!     StdRng::seed_from_u64(0),
//!     Heap,
//!     Config {
//!         capacity: DEFAULT_CAPACITY,
//!         registry,
//!     },
//! )
//! .unwrap();
//!
//! // Add 50ms of latency on send
//! simulator.set_latency(50.0).unwrap();
//! assert!(simulator.is_active());
//!
//! // Queue a packet and advance the simulation clock past its delivery time
//! let from: SocketAddr = "127.0.0.1:3000".parse().unwrap();
//! let to: SocketAddr = "127.0.0.1:3001".parse().unwrap();
//! simulator.send(from, to, b"hello");
//! simulator.advance(0.06);
//!
//! // Drain delivered packets
//! let packets = simulator.receive(8);
//! assert_eq!(packets.len(), 1);
//! assert_eq!(packets[0].payload.as_ref(), b"hello");
//! ```

use thiserror::Error;

mod conditions;
mod metrics;
pub mod pool;
mod simulator;
mod store;

pub use simulator::{Config, Packet, Simulator, DEFAULT_CAPACITY};

/// Errors that can occur when configuring the simulator.
#[derive(Debug, Error)]
pub enum Error {
    #[error("capacity must be non-zero")]
    ZeroCapacity,
    #[error("invalid percentage (must be in [0, 100]): {0}")]
    InvalidPercentage(f32),
    #[error("invalid duration (must be non-negative and finite): {0}")]
    InvalidDuration(f32),
}

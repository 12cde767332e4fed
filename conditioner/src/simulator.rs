//! The simulator: send, advance, receive, discard.

use crate::{
    conditions::Conditions,
    metrics::Metrics,
    pool::Pool,
    store::{Entry, Store},
    Error,
};
use prometheus_client::registry::Registry;
use rand::Rng;
use std::{
    collections::VecDeque,
    fmt::Debug,
    sync::{Arc, Mutex},
};
use tracing::debug;

/// Default number of ring slots.
pub const DEFAULT_CAPACITY: usize = 4096;

/// Configuration for a [Simulator].
#[derive(Clone)]
pub struct Config {
    /// Maximum number of packets buffered at any time. Must be non-zero.
    /// When the ring wraps, the oldest occupant of the slot is released.
    pub capacity: usize,

    /// Registry the simulator's counters are registered against.
    pub registry: Arc<Mutex<Registry>>,
}

/// A packet drained from the simulator.
///
/// The payload buffer is owned: dropping it releases it back to the pool it
/// was acquired from.
#[derive(Debug)]
pub struct Packet<A, B> {
    /// Address the packet was sent from.
    pub from: A,

    /// Address the packet was sent to.
    pub to: A,

    /// Owned payload bytes.
    pub payload: B,
}

/// Simulates packet loss, latency, jitter, and duplicate packets.
///
/// The simulator works on packet send: a queued packet is scheduled for
/// delivery `latency ± jitter` milliseconds of simulation time later, may be
/// dropped outright by the loss percentage, and may be duplicated with up to
/// one extra second of delay. [Simulator::advance] promotes due packets into a
/// pending-receive cache that [Simulator::receive] and
/// [Simulator::receive_sent_to] drain; the cache is what keeps per-address
/// polling cheap when many addresses share one instance.
///
/// All methods are synchronous and non-blocking; a shared instance must be
/// externally serialized. Dropping the simulator releases every buffer it
/// still owns.
pub struct Simulator<A, P: Pool, R: Rng> {
    rng: R,
    pool: P,
    conditions: Conditions,
    store: Store<A, P::Buffer>,
    pending: VecDeque<Entry<A, P::Buffer>>,
    time: f64,
    last_promotion: Option<f64>,
    metrics: Metrics,
}

impl<A: Clone + Eq + Debug, P: Pool, R: Rng> Simulator<A, P, R> {
    /// Create a new simulator with a given randomness source, buffer pool,
    /// and configuration.
    ///
    /// All impairment parameters start at zero, so a fresh simulator passes
    /// packets through with no delay and reports [Simulator::is_active] as
    /// false.
    pub fn new(rng: R, pool: P, cfg: Config) -> Result<Self, Error> {
        if cfg.capacity == 0 {
            return Err(Error::ZeroCapacity);
        }
        let metrics = {
            let mut registry = cfg.registry.lock().unwrap();
            Metrics::init(&mut registry)
        };
        Ok(Self {
            rng,
            pool,
            conditions: Conditions::new(),
            store: Store::new(cfg.capacity),
            pending: VecDeque::new(),
            time: 0.0,
            last_promotion: None,
            metrics,
        })
    }

    /// Set the latency added on send, in milliseconds.
    ///
    /// Latency is applied per direction: to simulate a 100ms round trip, add
    /// 50ms of latency to both sides of the connection.
    pub fn set_latency(&mut self, milliseconds: f32) -> Result<(), Error> {
        self.conditions.set_latency(milliseconds)
    }

    /// Set the jitter applied +/- around the latency, in milliseconds.
    pub fn set_jitter(&mut self, milliseconds: f32) -> Result<(), Error> {
        self.conditions.set_jitter(milliseconds)
    }

    /// Set the percentage of sends dropped. 100 drops everything.
    pub fn set_packet_loss(&mut self, percent: f32) -> Result<(), Error> {
        self.conditions.set_packet_loss(percent)
    }

    /// Set the percentage chance of a send being duplicated. The duplicate is
    /// scheduled with up to one extra second of delay.
    pub fn set_duplicate(&mut self, percent: f32) -> Result<(), Error> {
        self.conditions.set_duplicate(percent)
    }

    /// Whether any impairment parameter is non-zero.
    ///
    /// A transport can skip the simulator entirely while this is false.
    pub fn is_active(&self) -> bool {
        self.conditions.is_active()
    }

    /// Current simulation time, in seconds.
    pub fn time(&self) -> f64 {
        self.time
    }

    /// The pool payload buffers are acquired from.
    pub fn pool(&self) -> &P {
        &self.pool
    }

    /// Queue a packet for delivery.
    ///
    /// The payload is copied; the caller keeps ownership of `data`. The send
    /// may be silently dropped by the loss percentage (that is the feature,
    /// not an error), and may queue a second entry if the duplicate chance
    /// succeeds. Each entry consumes one ring slot, displacing (and releasing)
    /// whatever occupied it.
    pub fn send(&mut self, from: A, to: A, data: &[u8]) {
        self.metrics.sent.inc();

        // Loss draw
        let loss = self.conditions.packet_loss() as f64;
        if loss > 0.0 && self.rng.gen_range(0.0..100.0) < loss {
            debug!(?from, ?to, reason = "loss", "dropping packet");
            self.metrics.lost.inc();
            return;
        }

        let delay = self.sample_delay();
        let delivery_time = self.time + delay;
        self.enqueue(from.clone(), to.clone(), data, delivery_time);

        // Duplicate draw, independent of loss
        let duplicate = self.conditions.duplicate() as f64;
        if duplicate > 0.0 && self.rng.gen_range(0.0..100.0) < duplicate {
            let extra = self.rng.gen_range(0.0..=1.0);
            debug!(?from, ?to, extra, "duplicating packet");
            self.metrics.duplicated.inc();
            self.enqueue(from, to, data, delivery_time + extra);
        }
    }

    /// Advance the simulation clock and promote due packets into the
    /// pending-receive cache.
    ///
    /// Must be pumped regularly; packets whose delivery time is still in the
    /// future stay buffered across calls. Promotion is idempotent per time
    /// value, so multiple transports sharing one instance can all call this
    /// at the same logical tick. Time moving backward is ignored.
    pub fn advance(&mut self, now: f64) {
        if now < self.time {
            debug!(now, current = self.time, "ignoring time regression");
            return;
        }
        self.time = now;

        // Already promoted for this tick
        if self.last_promotion == Some(now) {
            return;
        }
        self.last_promotion = Some(now);
        self.store.drain_due(now, &mut self.pending);
    }

    /// Drain up to `max` packets from the pending-receive cache, oldest
    /// promoted first.
    ///
    /// Ownership of each payload transfers to the caller; entries beyond
    /// `max` remain for a later call. Returns an empty vec if nothing is due.
    pub fn receive(&mut self, max: usize) -> Vec<Packet<A, P::Buffer>> {
        let mut packets = Vec::new();
        while packets.len() < max {
            let Some(entry) = self.pending.pop_front() else {
                break;
            };
            self.metrics.delivered.inc();
            packets.push(Packet {
                from: entry.from,
                to: entry.to,
                payload: entry.payload,
            });
        }
        packets
    }

    /// Drain up to `max` packets sent to `to`, leaving everything else in the
    /// cache in its original order.
    ///
    /// Operates on the pending-receive cache only, so polling many addresses
    /// independently does not rescan the full ring each call.
    pub fn receive_sent_to(&mut self, max: usize, to: &A) -> Vec<Packet<A, P::Buffer>> {
        let mut packets = Vec::new();
        let mut rest = VecDeque::with_capacity(self.pending.len());
        while let Some(entry) = self.pending.pop_front() {
            if packets.len() < max && entry.to == *to {
                self.metrics.delivered.inc();
                packets.push(Packet {
                    from: entry.from,
                    to: entry.to,
                    payload: entry.payload,
                });
            } else {
                rest.push_back(entry);
            }
        }
        self.pending = rest;
        packets
    }

    /// Release every buffered packet (ring and pending cache).
    pub fn discard(&mut self) {
        self.store.clear();
        self.pending.clear();
    }

    /// Release only the buffered packets sent from `address`, in both the
    /// ring and the pending cache. Other packets keep their slot and timing.
    pub fn discard_from(&mut self, address: &A) {
        self.store.discard_from(address);
        self.pending.retain(|entry| entry.from != *address);
    }

    // Delay in seconds: latency plus uniform jitter, never negative.
    fn sample_delay(&mut self) -> f64 {
        let mut delay = self.conditions.latency() as f64;
        let jitter = self.conditions.jitter() as f64;
        if jitter > 0.0 {
            delay += self.rng.gen_range(-jitter..=jitter);
        }
        delay.max(0.0) / 1000.0
    }

    fn enqueue(&mut self, from: A, to: A, data: &[u8], delivery_time: f64) {
        let payload = self.pool.acquire(data);
        let displaced = self.store.insert(Entry {
            from,
            to,
            delivery_time,
            payload,
        });
        if let Some(displaced) = displaced {
            debug!(
                from = ?displaced.from,
                to = ?displaced.to,
                reason = "overwritten",
                "dropping packet"
            );
            self.metrics.overwritten.inc();
        }
    }
}

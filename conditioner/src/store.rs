//! Fixed-capacity ring of buffered packets.

use std::collections::VecDeque;

/// One buffered packet.
pub(crate) struct Entry<A, B> {
    pub from: A,
    pub to: A,
    /// Simulation-clock instant at which the packet becomes receivable.
    pub delivery_time: f64,
    pub payload: B,
}

/// Ring of packet slots indexed by a wrapping write cursor.
///
/// Inserting into an occupied slot displaces the prior occupant so capacity
/// never grows and old buffers are released deterministically.
pub(crate) struct Store<A, B> {
    slots: Vec<Option<Entry<A, B>>>,
    cursor: usize,
}

impl<A: PartialEq, B> Store<A, B> {
    pub fn new(capacity: usize) -> Self {
        let mut slots = Vec::with_capacity(capacity);
        slots.resize_with(capacity, || None);
        Self { slots, cursor: 0 }
    }

    /// Write `entry` at the cursor slot, returning whatever occupied it.
    pub fn insert(&mut self, entry: Entry<A, B>) -> Option<Entry<A, B>> {
        let displaced = self.slots[self.cursor].replace(entry);
        self.cursor = (self.cursor + 1) % self.slots.len();
        displaced
    }

    /// Move every entry due at `now` into `pending`, leaving its slot empty.
    ///
    /// Entries are moved, not copied: buffer ownership transfers to the
    /// pending cache.
    pub fn drain_due(&mut self, now: f64, pending: &mut VecDeque<Entry<A, B>>) {
        for slot in self.slots.iter_mut() {
            let due = match slot {
                Some(entry) => entry.delivery_time <= now,
                None => false,
            };
            if due {
                if let Some(entry) = slot.take() {
                    pending.push_back(entry);
                }
            }
        }
    }

    /// Empty every slot, dropping (and thereby releasing) all payloads.
    pub fn clear(&mut self) {
        for slot in self.slots.iter_mut() {
            *slot = None;
        }
        self.cursor = 0;
    }

    /// Empty only the slots whose entry was sent from `address`.
    pub fn discard_from(&mut self, address: &A) {
        for slot in self.slots.iter_mut() {
            let matches = match slot {
                Some(entry) => entry.from == *address,
                None => false,
            };
            if matches {
                *slot = None;
            }
        }
    }

    #[cfg(test)]
    pub fn occupied(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(from: u8, delivery_time: f64, payload: &[u8]) -> Entry<u8, Vec<u8>> {
        Entry {
            from,
            to: 0,
            delivery_time,
            payload: payload.to_vec(),
        }
    }

    #[test]
    fn test_insert_wraps_and_displaces() {
        let mut store = Store::new(2);
        assert!(store.insert(entry(1, 0.0, b"one")).is_none());
        assert!(store.insert(entry(2, 0.0, b"two")).is_none());

        // Third insert wraps and displaces the first
        let displaced = store.insert(entry(3, 0.0, b"three")).unwrap();
        assert_eq!(displaced.payload, b"one");
        assert_eq!(store.occupied(), 2);
    }

    #[test]
    fn test_drain_due_moves_only_due_entries() {
        let mut store = Store::new(4);
        store.insert(entry(1, 0.5, b"early"));
        store.insert(entry(2, 2.0, b"late"));

        let mut pending = VecDeque::new();
        store.drain_due(1.0, &mut pending);
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].payload, b"early");
        assert_eq!(store.occupied(), 1);

        // The late entry stays until its time arrives
        store.drain_due(2.0, &mut pending);
        assert_eq!(pending.len(), 2);
        assert_eq!(store.occupied(), 0);
    }

    #[test]
    fn test_discard_from_leaves_other_senders() {
        let mut store = Store::new(4);
        store.insert(entry(1, 0.0, b"a"));
        store.insert(entry(2, 0.0, b"b"));
        store.insert(entry(1, 0.0, b"c"));

        store.discard_from(&1);
        assert_eq!(store.occupied(), 1);

        let mut pending = VecDeque::new();
        store.drain_due(0.0, &mut pending);
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].from, 2);
    }

    #[test]
    fn test_clear_empties_all_slots() {
        let mut store = Store::new(3);
        store.insert(entry(1, 0.0, b"a"));
        store.insert(entry(2, 0.0, b"b"));
        store.clear();
        assert_eq!(store.occupied(), 0);

        // Cursor restarts at the first slot
        assert!(store.insert(entry(3, 0.0, b"c")).is_none());
    }
}

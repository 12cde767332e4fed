//! Payload buffers and where they come from.
//!
//! Every payload held by the simulator is copied into a buffer acquired from a
//! [Pool] supplied at construction, and released by dropping the owned handle.
//! This keeps every buffer's lifetime traceable to exactly one owner: a store
//! slot, the pending-receive cache, or the caller that drained it.

use bytes::Bytes;
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

/// Source of owned payload buffers.
pub trait Pool: Clone {
    /// Owned buffer handle. Dropping it releases the buffer.
    type Buffer: AsRef<[u8]>;

    /// Copy `data` into a newly acquired buffer.
    ///
    /// The input slice is never aliased: the caller keeps ownership of `data`.
    fn acquire(&self, data: &[u8]) -> Self::Buffer;
}

/// [Pool] backed by the global heap.
#[derive(Clone, Debug, Default)]
pub struct Heap;

impl Pool for Heap {
    type Buffer = Bytes;

    fn acquire(&self, data: &[u8]) -> Bytes {
        Bytes::copy_from_slice(data)
    }
}

/// [Pool] that counts buffers still outstanding.
///
/// Useful in tests to verify that every buffer the simulator acquires is
/// eventually released (drained and dropped, overwritten, or discarded).
#[derive(Clone, Debug, Default)]
pub struct Metered {
    outstanding: Arc<AtomicUsize>,
}

impl Metered {
    /// Number of acquired buffers that have not yet been dropped.
    pub fn outstanding(&self) -> usize {
        self.outstanding.load(Ordering::Relaxed)
    }
}

/// Buffer handle returned by [Metered].
#[derive(Debug)]
pub struct Lease {
    data: Bytes,
    outstanding: Arc<AtomicUsize>,
}

impl AsRef<[u8]> for Lease {
    fn as_ref(&self) -> &[u8] {
        self.data.as_ref()
    }
}

impl Drop for Lease {
    fn drop(&mut self) {
        self.outstanding.fetch_sub(1, Ordering::Relaxed);
    }
}

impl Pool for Metered {
    type Buffer = Lease;

    fn acquire(&self, data: &[u8]) -> Lease {
        self.outstanding.fetch_add(1, Ordering::Relaxed);
        Lease {
            data: Bytes::copy_from_slice(data),
            outstanding: self.outstanding.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heap_copies_input() {
        let mut data = vec![1u8, 2, 3];
        let buffer = Heap.acquire(&data);
        data[0] = 9;
        assert_eq!(buffer.as_ref(), &[1, 2, 3]);
    }

    #[test]
    fn test_metered_tracks_outstanding() {
        let pool = Metered::default();
        assert_eq!(pool.outstanding(), 0);

        let first = pool.acquire(b"a");
        let second = pool.acquire(b"b");
        assert_eq!(pool.outstanding(), 2);
        assert_eq!(first.as_ref(), b"a");

        drop(first);
        assert_eq!(pool.outstanding(), 1);
        drop(second);
        assert_eq!(pool.outstanding(), 0);
    }
}

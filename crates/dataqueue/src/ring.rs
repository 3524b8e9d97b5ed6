use crate::invariants::{
    debug_assert_bounded_count, debug_assert_monotonic, debug_assert_read_not_past_write,
};
use crate::region::{Region, SplitRegion, WriteGrant};
use crossbeam_utils::CachePadded;
use std::sync::atomic::{AtomicU64, Ordering};

// =============================================================================
// MEMORY ORDERING & SYNCHRONIZATION STRATEGY
// =============================================================================
//
// ChannelRing allocates index ranges for exactly one producer and one
// consumer operating concurrently without locks.
//
// ## Logical Cursors
//
// `write` and `read` are unbounded u64 sequence numbers, not wrapped
// indices. The physical storage index is `cursor % capacity`, computed only
// when a range is handed out. Unbounded cursors make "buffered = write -
// read" a single subtraction and rule out ABA confusion between a full and
// an empty ring.
//
// ## Ordering Protocol
//
// **Producer (write side):**
// 1. Load `write` with Relaxed (only the producer stores it)
// 2. Load `read` with Acquire (synchronizes with the consumer's commit)
// 3. Fill the reserved storage range (ordered by step 4)
// 4. Store `write` with Release (publishes sample + timestamp stores)
//
// **Consumer (read side):**
// 1. Load `read` with Relaxed (only the consumer stores it)
// 2. Load `write` with Acquire (synchronizes with the producer's commit)
// 3. Read the reserved storage range
// 4. Store `read` with Release (returns the range to the producer)
//
// The Acquire load of `write` is the load-bearing property: a consumer that
// observes an advanced write cursor also observes every sample and block
// timestamp stored before the matching Release commit.
//
// =============================================================================

/// Per-channel wrap-around index allocator.
///
/// Maps a logical (unbounded) sample stream onto a fixed physical capacity
/// for one producer thread and one consumer thread. The ring hands out
/// index ranges only; sample storage lives in
/// [`SampleStore`](crate::SampleStore).
///
/// Reservation does not advance a cursor; the caller commits exactly the
/// number of samples it actually transferred.
pub struct ChannelRing {
    /// Write cursor (stored by producer, loaded by consumer).
    write: CachePadded<AtomicU64>,
    /// Read cursor (stored by consumer, loaded by producer).
    read: CachePadded<AtomicU64>,
    /// Physical capacity in samples. Not required to be a power of two, so
    /// wrapping uses modulo rather than masking.
    capacity: usize,
}

impl ChannelRing {
    /// Creates a ring over `capacity` physical slots, both cursors at zero.
    pub fn new(capacity: usize) -> Self {
        Self {
            write: CachePadded::new(AtomicU64::new(0)),
            read: CachePadded::new(AtomicU64::new(0)),
            capacity,
        }
    }

    /// Returns the physical capacity in samples.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of samples buffered and not yet released by the consumer.
    #[inline]
    pub fn ready(&self) -> usize {
        let write = self.write.load(Ordering::Acquire);
        let read = self.read.load(Ordering::Relaxed);
        write.wrapping_sub(read) as usize
    }

    /// Number of samples the producer could reserve right now.
    #[inline]
    pub fn free_space(&self) -> usize {
        let write = self.write.load(Ordering::Relaxed);
        let read = self.read.load(Ordering::Acquire);
        self.capacity - write.wrapping_sub(read) as usize
    }

    /// Splits `len` slots starting at the physical position of `cursor`
    /// into at most two contiguous runs.
    fn split(&self, cursor: u64, len: usize) -> SplitRegion {
        let start = (cursor % self.capacity as u64) as usize;
        let first_len = len.min(self.capacity - start);
        SplitRegion {
            first: Region::new(start, first_len),
            second: Region::new(0, len - first_len),
        }
    }

    // ---------------------------------------------------------------------
    // PRODUCER API
    // ---------------------------------------------------------------------

    /// Reserve up to `n` slots for writing.
    ///
    /// Grants `min(n, free_space)` slots as up to two physical runs. A
    /// grant smaller than the request is the overflow condition; the
    /// caller must treat the unreserved tail as dropped.
    ///
    /// Does not advance any cursor; follow with [`commit_write`] for
    /// exactly the number of samples copied in.
    ///
    /// [`commit_write`]: ChannelRing::commit_write
    pub fn reserve_write(&self, n: usize) -> WriteGrant {
        let write = self.write.load(Ordering::Relaxed);
        let read = self.read.load(Ordering::Acquire);
        let free = self.capacity - write.wrapping_sub(read) as usize;

        let granted = n.min(free);
        if granted == 0 {
            return WriteGrant::Empty;
        }

        let region = self.split(write, granted);
        if granted < n {
            WriteGrant::Partial {
                region,
                shortfall: n - granted,
            }
        } else {
            WriteGrant::Full(region)
        }
    }

    /// Advance the write cursor by `n` samples, publishing them to the
    /// consumer. `n` must equal the total size actually copied into the
    /// most recent reservation.
    pub fn commit_write(&self, n: usize) {
        let write = self.write.load(Ordering::Relaxed);
        let new_write = write.wrapping_add(n as u64);

        debug_assert_monotonic!("write", write, new_write);
        let read = self.read.load(Ordering::Relaxed);
        debug_assert_bounded_count!(new_write.wrapping_sub(read) as usize, self.capacity);

        self.write.store(new_write, Ordering::Release);
    }

    // ---------------------------------------------------------------------
    // CONSUMER API
    // ---------------------------------------------------------------------

    /// Reserve up to `n_max` ready samples for reading (`n_max == 0` means
    /// all ready samples), as up to two physical runs.
    ///
    /// Does not advance any cursor; follow with [`commit_read`] once the
    /// range has been consumed.
    ///
    /// [`commit_read`]: ChannelRing::commit_read
    pub fn reserve_read(&self, n_max: usize) -> SplitRegion {
        let read = self.read.load(Ordering::Relaxed);
        let write = self.write.load(Ordering::Acquire);
        let ready = write.wrapping_sub(read) as usize;

        let take = if n_max == 0 { ready } else { ready.min(n_max) };
        self.split(read, take)
    }

    /// Advance the read cursor by `n` samples, freeing capacity for future
    /// writes. `n` must equal the total size of the most recent read
    /// reservation.
    pub fn commit_read(&self, n: usize) {
        let read = self.read.load(Ordering::Relaxed);
        let new_read = read.wrapping_add(n as u64);

        debug_assert_monotonic!("read", read, new_read);
        let write = self.write.load(Ordering::Relaxed);
        debug_assert_read_not_past_write!(new_read, write);

        self.read.store(new_read, Ordering::Release);
    }

    /// Changes the physical capacity. Requires exclusive access; buffered
    /// content is discarded by contract, so callers follow with
    /// [`reset`](ChannelRing::reset).
    pub fn set_capacity(&mut self, capacity: usize) {
        self.capacity = capacity;
    }

    /// Zero both cursors. Requires exclusive access; used on resize, where
    /// buffered content is discarded by contract.
    pub fn reset(&mut self) {
        *self.write.get_mut() = 0;
        *self.read.get_mut() = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reserve_commit_roundtrip() {
        let ring = ChannelRing::new(32);
        assert_eq!(ring.free_space(), 32);
        assert_eq!(ring.ready(), 0);

        let grant = ring.reserve_write(10);
        assert!(grant.is_full());
        let region = grant.region();
        assert_eq!(region.first, Region::new(0, 10));
        assert!(region.second.is_empty());

        // Nothing published until commit.
        assert_eq!(ring.ready(), 0);
        ring.commit_write(10);
        assert_eq!(ring.ready(), 10);
        assert_eq!(ring.free_space(), 22);

        let read = ring.reserve_read(0);
        assert_eq!(read.len(), 10);
        ring.commit_read(10);
        assert_eq!(ring.ready(), 0);
        assert_eq!(ring.free_space(), 32);
    }

    #[test]
    fn test_partial_and_empty_grants() {
        let ring = ChannelRing::new(8);

        let grant = ring.reserve_write(12);
        assert_eq!(grant.granted(), 8);
        assert!(matches!(grant, WriteGrant::Partial { shortfall: 4, .. }));
        ring.commit_write(8);

        assert!(matches!(ring.reserve_write(1), WriteGrant::Empty));
    }

    #[test]
    fn test_wrap_split() {
        let ring = ChannelRing::new(32);

        ring.commit_write(20);
        ring.commit_read(20);

        // Cursor sits at physical 20; 20 slots must split 12 + 8.
        let grant = ring.reserve_write(20);
        let region = grant.region();
        assert_eq!(region.first, Region::new(20, 12));
        assert_eq!(region.second, Region::new(0, 8));
        ring.commit_write(20);

        let read = ring.reserve_read(0);
        assert_eq!(read.first, Region::new(20, 12));
        assert_eq!(read.second, Region::new(0, 8));
    }

    #[test]
    fn test_reserve_read_limit() {
        let ring = ChannelRing::new(16);
        ring.commit_write(10);

        assert_eq!(ring.reserve_read(4).len(), 4);
        assert_eq!(ring.reserve_read(0).len(), 10);
        assert_eq!(ring.reserve_read(100).len(), 10);
    }

    #[test]
    fn test_reset() {
        let mut ring = ChannelRing::new(16);
        ring.commit_write(12);
        ring.commit_read(4);

        ring.reset();
        assert_eq!(ring.ready(), 0);
        assert_eq!(ring.free_space(), 16);
    }

    #[test]
    fn test_set_capacity_then_reset() {
        let mut ring = ChannelRing::new(16);
        ring.commit_write(12);

        ring.set_capacity(32);
        ring.reset();
        assert_eq!(ring.capacity(), 32);
        assert_eq!(ring.ready(), 0);
        assert_eq!(ring.free_space(), 32);

        // The grown capacity is fully reservable.
        assert!(ring.reserve_write(32).is_full());
    }
}

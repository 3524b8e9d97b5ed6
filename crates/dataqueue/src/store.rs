use crate::region::Region;
use std::cell::UnsafeCell;

/// Dense per-channel sample storage addressable by physical index.
///
/// One flat allocation, channel-major: channel `c` owns physical indices
/// `[c * capacity, (c + 1) * capacity)`. Samples are zero-initialized at
/// (re)allocation, so every in-bounds read is defined even before a slot
/// has been written.
///
/// ## Single-Writer Invariants
///
/// The buffer lives behind `UnsafeCell` because the producer writes through
/// a shared reference while the consumer reads. Safety rests on the
/// [`ChannelRing`](crate::ChannelRing) reservation protocol:
///
/// - `copy_in` targets only ranges handed out by `reserve_write`, which lie
///   outside every unreleased read range.
/// - `slice` covers only ranges handed out by `reserve_read`, which the
///   producer cannot reserve until `commit_read` releases them.
/// - Sample stores are published to the consumer by the ring's Release
///   store on the write cursor.
///
/// One writer thread and one reader thread per queue; never two of either.
pub struct SampleStore<T> {
    data: UnsafeCell<Box<[T]>>,
    channels: usize,
    capacity: usize,
}

// Safety: concurrent access is confined to disjoint ranges by the ring
// reservation protocol documented above.
unsafe impl<T: Send> Send for SampleStore<T> {}
unsafe impl<T: Send> Sync for SampleStore<T> {}

impl<T: Copy + Default> SampleStore<T> {
    /// Allocates zeroed storage for `channels` channels of `capacity`
    /// samples each.
    pub fn new(channels: usize, capacity: usize) -> Self {
        Self {
            data: UnsafeCell::new(vec![T::default(); channels * capacity].into_boxed_slice()),
            channels,
            capacity,
        }
    }

    /// Reallocates storage for a new geometry. Prior contents are
    /// discarded; there is no data migration across a resize.
    pub fn resize(&mut self, channels: usize, capacity: usize) {
        *self.data.get_mut() = vec![T::default(); channels * capacity].into_boxed_slice();
        self.channels = channels;
        self.capacity = capacity;
    }
}

impl<T> SampleStore<T> {
    /// Returns the number of channels.
    #[inline]
    pub fn num_channels(&self) -> usize {
        self.channels
    }

    /// Returns the per-channel capacity in samples.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Copies `count` samples from `src[src_start..]` into `channel`'s
    /// storage starting at physical index `dst_start`.
    ///
    /// Producer side only. `[dst_start, dst_start + count)` must be a range
    /// reserved via `reserve_write` and not yet committed.
    pub fn copy_in(&self, channel: usize, dst_start: usize, src: &[T], src_start: usize, count: usize)
    where
        T: Copy,
    {
        debug_assert!(channel < self.channels);
        debug_assert!(dst_start + count <= self.capacity);

        let base = channel * self.capacity + dst_start;
        // SAFETY: the destination range was reserved on the write side, so
        // no reader holds it and no other writer exists (single-producer
        // contract). See the type-level invariants.
        unsafe {
            let data = &mut *self.data.get();
            data[base..base + count].copy_from_slice(&src[src_start..src_start + count]);
        }
    }

    /// Returns `channel`'s samples for a physical region.
    ///
    /// Consumer side only. `region` must come from the read reservation of
    /// an open read session; the slice must not outlive that session.
    pub fn slice(&self, channel: usize, region: Region) -> &[T] {
        debug_assert!(channel < self.channels);
        debug_assert!(region.start + region.len <= self.capacity);

        let base = channel * self.capacity + region.start;
        // SAFETY: the region is read-reserved, so the producer cannot
        // reserve (and thus cannot write) any part of it until the session
        // commits the read. See the type-level invariants.
        unsafe {
            let data = &*self.data.get();
            &data[base..base + region.len]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_copy_in_and_slice_per_channel() {
        let store = SampleStore::<f32>::new(2, 8);

        store.copy_in(0, 2, &[1.0, 2.0, 3.0], 0, 3);
        store.copy_in(1, 0, &[9.0, 8.0], 0, 2);

        assert_eq!(store.slice(0, Region::new(2, 3)), &[1.0, 2.0, 3.0]);
        assert_eq!(store.slice(1, Region::new(0, 2)), &[9.0, 8.0]);
        // Untouched slots read as zero.
        assert_eq!(store.slice(0, Region::new(0, 2)), &[0.0, 0.0]);
    }

    #[test]
    fn test_copy_in_with_source_offset() {
        let store = SampleStore::<u64>::new(1, 4);
        let src = [10, 20, 30, 40];

        store.copy_in(0, 0, &src, 2, 2);
        assert_eq!(store.slice(0, Region::new(0, 2)), &[30, 40]);
    }

    #[test]
    fn test_resize_discards_contents() {
        let mut store = SampleStore::<f32>::new(1, 4);
        store.copy_in(0, 0, &[5.0], 0, 1);

        store.resize(3, 6);
        assert_eq!(store.num_channels(), 3);
        assert_eq!(store.capacity(), 6);
        assert_eq!(store.slice(0, Region::new(0, 1)), &[0.0]);
    }
}

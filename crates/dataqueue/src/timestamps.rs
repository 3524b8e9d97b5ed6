use std::sync::atomic::{AtomicI64, Ordering};

/// Per-channel map from physical block slot to the timestamp of that
/// block's first sample.
///
/// Timestamps are only recorded once per `block_size` samples; interior
/// timestamps are derived by linear extrapolation under the constant
/// sample-rate assumption (one timestamp unit per sample). Slots are
/// overwritten as the ring wraps; stale entries are invalidated implicitly
/// by never being addressed outside the currently valid window.
///
/// Stores and loads are Relaxed: the producer's stamps are published to the
/// consumer by the ring's Release store on the write cursor, and the
/// consumer's Acquire load of that cursor orders its lookups after them.
pub struct TimestampTable {
    block_size: usize,
    blocks_per_channel: usize,
    slots: Box<[AtomicI64]>,
}

impl TimestampTable {
    /// Creates a table for `channels` channels of `num_blocks` block slots,
    /// all stamps zeroed.
    pub fn new(channels: usize, num_blocks: usize, block_size: usize) -> Self {
        let slots = (0..channels * num_blocks)
            .map(|_| AtomicI64::new(0))
            .collect();
        Self {
            block_size,
            blocks_per_channel: num_blocks,
            slots,
        }
    }

    /// Stamps every block boundary crossed by a span of `count` consecutive
    /// samples starting at physical index `start`, whose first sample has
    /// timestamp `first_ts`.
    ///
    /// Each boundary at offset `d` from the span start is stamped
    /// `first_ts + d`. A block is stamped the first time any of its samples
    /// is written: a span starting mid-block skips to the next boundary,
    /// because the current block was stamped by the write that opened it.
    pub fn record_block_starts(&self, channel: usize, start: usize, count: usize, first_ts: i64) {
        debug_assert!(start + count <= self.blocks_per_channel * self.block_size);

        let first_boundary = match start % self.block_size {
            0 => start,
            m => start + (self.block_size - m),
        };

        let mut pos = first_boundary;
        while pos < start + count {
            let slot = channel * self.blocks_per_channel + pos / self.block_size;
            self.slots[slot].store(first_ts + (pos - start) as i64, Ordering::Relaxed);
            pos += self.block_size;
        }
    }

    /// Returns the stamp of the block currently resident at physical block
    /// slot `block_index`. The caller is responsible for knowing the slot
    /// is inside the currently valid window.
    #[inline]
    pub fn lookup(&self, channel: usize, block_index: usize) -> i64 {
        self.slots[channel * self.blocks_per_channel + block_index].load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aligned_span_stamps_every_block() {
        // block_size = 4, 8 blocks
        let table = TimestampTable::new(1, 8, 4);

        table.record_block_starts(0, 0, 12, 100);
        assert_eq!(table.lookup(0, 0), 100);
        assert_eq!(table.lookup(0, 1), 104);
        assert_eq!(table.lookup(0, 2), 108);
        // Block 3 not reached by the span.
        assert_eq!(table.lookup(0, 3), 0);
    }

    #[test]
    fn test_mid_block_span_skips_to_next_boundary() {
        let table = TimestampTable::new(1, 8, 4);

        // Open block 0 with an aligned write, then continue mid-block.
        table.record_block_starts(0, 0, 2, 100);
        table.record_block_starts(0, 2, 6, 102);

        // Block 0 keeps its opening stamp; block 1 stamped at the boundary.
        assert_eq!(table.lookup(0, 0), 100);
        assert_eq!(table.lookup(0, 1), 104);
    }

    #[test]
    fn test_short_span_inside_block_stamps_nothing() {
        let table = TimestampTable::new(1, 8, 4);

        table.record_block_starts(0, 1, 2, 55);
        for block in 0..8 {
            assert_eq!(table.lookup(0, block), 0);
        }
    }

    #[test]
    fn test_channels_are_independent() {
        let table = TimestampTable::new(2, 4, 4);

        table.record_block_starts(0, 0, 4, 10);
        table.record_block_starts(1, 0, 4, 20);

        assert_eq!(table.lookup(0, 0), 10);
        assert_eq!(table.lookup(1, 0), 20);
    }

    #[test]
    fn test_wrapped_slot_is_overwritten() {
        let table = TimestampTable::new(1, 2, 4);

        table.record_block_starts(0, 0, 4, 0);
        assert_eq!(table.lookup(0, 0), 0);

        // The ring wrapped; physical block 0 now holds a later block.
        table.record_block_starts(0, 0, 4, 800);
        assert_eq!(table.lookup(0, 0), 800);
    }
}

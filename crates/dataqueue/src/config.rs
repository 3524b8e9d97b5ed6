/// Configuration for a [`DataQueue`](crate::DataQueue).
///
/// Geometry is fixed per instance: total capacity per channel is
/// `block_size * num_blocks` samples, unchanged until an explicit
/// [`resize`](crate::DataQueue::resize).
#[derive(Debug, Clone, Copy)]
pub struct QueueConfig {
    /// Samples per timestamped block.
    pub block_size: usize,
    /// Blocks of capacity per channel.
    pub num_blocks: usize,
    /// Acquisition sample rate in Hz (informational, fixed per instance).
    pub sample_rate: u32,
}

impl QueueConfig {
    /// Creates a configuration with custom geometry.
    ///
    /// Both geometry values must be non-zero; a zero block size would make
    /// block arithmetic degenerate (checked in debug builds).
    pub const fn new(block_size: usize, num_blocks: usize, sample_rate: u32) -> Self {
        debug_assert!(block_size > 0, "block_size must be non-zero");
        debug_assert!(num_blocks > 0, "num_blocks must be non-zero");
        Self {
            block_size,
            num_blocks,
            sample_rate,
        }
    }

    /// Per-channel capacity in samples.
    #[inline]
    pub const fn capacity(&self) -> usize {
        self.block_size * self.num_blocks
    }
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            block_size: 4096,
            num_blocks: 100,
            sample_rate: 44_100,
        }
    }
}

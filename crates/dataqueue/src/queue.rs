use crate::config::QueueConfig;
use crate::region::SplitRegion;
use crate::ring::ChannelRing;
use crate::store::SampleStore;
use crate::timestamps::TimestampTable;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use thiserror::Error;

/// Error returned when a write exceeded free capacity.
///
/// This is a signal, not a rollback: the `accepted` prefix was copied and
/// committed, and only the remaining tail was discarded. The producer
/// decides whether to drop, retry later, or escalate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("channel overflow: requested {requested} samples, accepted {accepted}")]
pub struct OverflowError {
    /// Number of samples offered.
    pub requested: usize,
    /// Number of samples actually buffered.
    pub accepted: usize,
}

/// Per-channel result of opening a read session.
#[derive(Debug, Clone, Copy)]
pub struct ChannelRead {
    /// Reserved physical index ranges (up to two runs on wrap-around).
    pub region: SplitRegion,
    /// Reconstructed timestamp of the first reserved sample.
    pub timestamp: i64,
}

/// Fixed-capacity multi-channel streaming buffer.
///
/// Decouples a real-time acquisition producer from a disk-writing consumer
/// while reconstructing per-sample timestamps from sparse per-block stamps.
/// Each channel composes a [`ChannelRing`] (index allocation), a row of the
/// shared [`SampleStore`] (sample bytes), and a [`TimestampTable`] row
/// (block-start stamps).
///
/// Exactly two external actors per queue: one producer thread calling
/// [`write_channel`](DataQueue::write_channel), and one consumer thread
/// running read sessions. No operation blocks, and the write path never
/// allocates; allocation happens only in [`set_channels`](DataQueue::set_channels)
/// and [`resize`](DataQueue::resize).
///
/// # Example
///
/// ```
/// use dataqueue_rs::{DataQueue, QueueConfig};
///
/// let mut queue = DataQueue::<f32>::new(QueueConfig::new(4, 8, 1000));
/// queue.set_channels(1);
///
/// queue.write_channel(0, &[0.5; 6], 100).unwrap();
///
/// let session = queue.start_read(0).unwrap();
/// assert_eq!(session.len(0), 6);
/// assert_eq!(session.timestamp(0), 100);
/// let (head, tail) = session.slices(0);
/// assert_eq!(head.len() + tail.len(), 6);
/// session.close();
/// ```
pub struct DataQueue<T> {
    block_size: usize,
    num_blocks: usize,
    capacity: usize,
    sample_rate: u32,
    rings: Vec<ChannelRing>,
    store: SampleStore<T>,
    timestamps: TimestampTable,
    /// Per-channel end timestamp of the previous session, reused when a
    /// read crosses no block boundary. Only the consumer touches these;
    /// Relaxed atomics keep the field shareable without extra plumbing.
    last_read_ts: Vec<AtomicI64>,
    /// Claim flag for the exclusive read session (Idle / ReadOpen).
    read_open: AtomicBool,
}

impl<T: Copy + Default> DataQueue<T> {
    /// Creates a queue with the given geometry and zero channels. Call
    /// [`set_channels`](DataQueue::set_channels) before writing.
    pub fn new(config: QueueConfig) -> Self {
        Self {
            block_size: config.block_size,
            num_blocks: config.num_blocks,
            capacity: config.capacity(),
            sample_rate: config.sample_rate,
            rings: Vec::new(),
            store: SampleStore::new(0, config.capacity()),
            timestamps: TimestampTable::new(0, config.num_blocks, config.block_size),
            last_read_ts: Vec::new(),
            read_open: AtomicBool::new(false),
        }
    }

    /// Reinitializes all per-channel state for `channels` channels at the
    /// current capacity, discarding buffered content.
    ///
    /// No-op while a read session is open (possible only if a session was
    /// leaked, since an open session borrows the queue).
    pub fn set_channels(&mut self, channels: usize) {
        if self.read_open.load(Ordering::Acquire) {
            return;
        }

        self.rings = (0..channels).map(|_| ChannelRing::new(self.capacity)).collect();
        self.store.resize(channels, self.capacity);
        self.timestamps = TimestampTable::new(channels, self.num_blocks, self.block_size);
        self.last_read_ts = (0..channels).map(|_| AtomicI64::new(0)).collect();
    }

    /// Recomputes capacity as `block_size * num_blocks` and resets every
    /// channel, discarding buffered content.
    ///
    /// No-op while a read session is open.
    pub fn resize(&mut self, num_blocks: usize) {
        if self.read_open.load(Ordering::Acquire) {
            return;
        }

        self.num_blocks = num_blocks;
        self.capacity = self.block_size * num_blocks;

        let channels = self.rings.len();
        for ring in &mut self.rings {
            ring.set_capacity(self.capacity);
            ring.reset();
        }
        self.store.resize(channels, self.capacity);
        self.timestamps = TimestampTable::new(channels, self.num_blocks, self.block_size);
        for ts in &self.last_read_ts {
            ts.store(0, Ordering::Relaxed);
        }
    }

    /// Buffers a contiguous span of samples for one channel, whose first
    /// sample has timestamp `first_ts` (one timestamp unit per sample).
    ///
    /// On success returns the number of samples buffered (`samples.len()`).
    /// If free capacity is short, buffers what fits, discards the tail, and
    /// reports the shortfall via [`OverflowError`].
    ///
    /// Producer side only. Panics if `channel` is out of range.
    pub fn write_channel(
        &self,
        channel: usize,
        samples: &[T],
        first_ts: i64,
    ) -> Result<usize, OverflowError> {
        let ring = &self.rings[channel];
        let n = samples.len();

        let region = ring.reserve_write(n).region();
        let SplitRegion { first, second } = region;

        if first.len > 0 {
            self.store.copy_in(channel, first.start, samples, 0, first.len);
            self.timestamps
                .record_block_starts(channel, first.start, first.len, first_ts);
        }
        if second.len > 0 {
            self.store
                .copy_in(channel, second.start, samples, first.len, second.len);
            // The second run continues the same span: its first sample sits
            // `first.len` samples after the span start.
            self.timestamps.record_block_starts(
                channel,
                second.start,
                second.len,
                first_ts + first.len as i64,
            );
        }
        ring.commit_write(region.len());

        // An empty span reserves nothing and is a successful no-op; only a
        // grant shorter than the request is overflow.
        if region.len() == n {
            Ok(n)
        } else {
            Err(OverflowError {
                requested: n,
                accepted: region.len(),
            })
        }
    }

    /// Opens the exclusive read session spanning all channels.
    ///
    /// Reserves up to `max_samples` ready samples per channel
    /// (`max_samples == 0` means all ready samples) and reconstructs one
    /// timestamp per channel for the session: if a block boundary falls
    /// inside the reserved range, the stamp of that block is
    /// back-extrapolated to the range start; otherwise the previous
    /// session's end timestamp is reused as a best-effort continuation.
    ///
    /// Returns `None`, with no state change, if a session is already open.
    /// The session commits its reads and releases the claim when dropped
    /// or [`close`](ReadSession::close)d.
    pub fn start_read(&self, max_samples: usize) -> Option<ReadSession<'_, T>> {
        if self.read_open.swap(true, Ordering::AcqRel) {
            return None;
        }

        let mut channels = Vec::with_capacity(self.rings.len());
        for (chan, ring) in self.rings.iter().enumerate() {
            let region = ring.reserve_read(max_samples);
            let total = region.len();

            let block_mod = region.first.start % self.block_size;
            let block_diff = if block_mod == 0 {
                0
            } else {
                self.block_size - block_mod
            };

            // A boundary strictly inside the range lets us re-derive the
            // start from its stamp; otherwise continue from where the last
            // session left off.
            let timestamp = if block_diff < total {
                let block_index =
                    ((region.first.start + block_diff) / self.block_size) % self.num_blocks;
                self.timestamps.lookup(chan, block_index) - block_diff as i64
            } else {
                self.last_read_ts[chan].load(Ordering::Relaxed)
            };
            self.last_read_ts[chan].store(timestamp + total as i64, Ordering::Relaxed);

            channels.push(ChannelRead { region, timestamp });
        }

        Some(ReadSession {
            queue: self,
            channels,
        })
    }

    /// Returns every channel's stored stamp for physical block slot
    /// `block_index`. Pure lookup, valid in either state; the caller is
    /// responsible for knowing the slot is currently addressable.
    pub fn timestamps_for_block(&self, block_index: usize) -> Vec<i64> {
        (0..self.rings.len())
            .map(|chan| self.timestamps.lookup(chan, block_index))
            .collect()
    }

    /// Read-only handle to the underlying sample storage, for reading
    /// session ranges in place without a second copy.
    ///
    /// Prefer [`ReadSession::slices`], which scopes the access to the
    /// session; ranges read through this handle must come from an open
    /// session and must not be used past its close.
    #[inline]
    pub fn storage(&self) -> &SampleStore<T> {
        &self.store
    }

    /// Returns the number of channels.
    #[inline]
    pub fn num_channels(&self) -> usize {
        self.rings.len()
    }

    /// Returns the configured sample rate in Hz.
    #[inline]
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Returns the samples-per-block geometry constant.
    #[inline]
    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// Returns the current number of capacity blocks per channel.
    #[inline]
    pub fn num_blocks(&self) -> usize {
        self.num_blocks
    }

    /// Returns the current per-channel capacity in samples.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

/// Exclusive read session spanning all channels.
///
/// At most one exists at a time. While open, the reserved ranges are
/// protected from the producer, and [`slices`](ReadSession::slices) hands
/// out direct views into storage for the zero-copy disk-write path. The
/// borrow on the queue makes use-after-close a compile error; dropping the
/// session commits every channel's read (freeing capacity exactly once)
/// and returns the queue to Idle.
pub struct ReadSession<'a, T> {
    queue: &'a DataQueue<T>,
    channels: Vec<ChannelRead>,
}

impl<T> ReadSession<'_, T> {
    /// Returns the number of channels in the session.
    #[inline]
    pub fn num_channels(&self) -> usize {
        self.channels.len()
    }

    /// Per-channel reserved ranges and reconstructed timestamp.
    #[inline]
    pub fn channel(&self, channel: usize) -> &ChannelRead {
        &self.channels[channel]
    }

    /// Reconstructed timestamp of the first reserved sample of `channel`.
    #[inline]
    pub fn timestamp(&self, channel: usize) -> i64 {
        self.channels[channel].timestamp
    }

    /// Number of samples reserved for `channel`.
    #[inline]
    pub fn len(&self, channel: usize) -> usize {
        self.channels[channel].region.len()
    }

    /// Direct views of `channel`'s reserved samples: the leading run and
    /// the wrapped run (empty when the range does not wrap). Together they
    /// form one logically contiguous sequence.
    pub fn slices(&self, channel: usize) -> (&[T], &[T]) {
        let region = &self.channels[channel].region;
        (
            self.queue.store.slice(channel, region.first),
            self.queue.store.slice(channel, region.second),
        )
    }

    /// Closes the session. Equivalent to dropping it; spelled out so call
    /// sites can mark where reserved ranges stop being valid.
    pub fn close(self) {}
}

impl<T> Drop for ReadSession<'_, T> {
    fn drop(&mut self) {
        for (ring, chan) in self.queue.rings.iter().zip(&self.channels) {
            ring.commit_read(chan.region.len());
        }
        self.queue.read_open.store(false, Ordering::Release);
    }
}

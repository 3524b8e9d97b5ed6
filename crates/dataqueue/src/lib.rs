//! DataQueue - Lock-Free Multi-Channel Recording Buffer
//!
//! A fixed-capacity streaming buffer that decouples a real-time
//! data-acquisition producer from a disk-writing consumer, one SPSC ring
//! per channel, while reconstructing per-sample timestamps from sparse
//! per-block stamps.
//!
//! # Key Features
//!
//! - Non-blocking, allocation-free producer hot path with explicit
//!   overflow reporting (no silent drops, no backpressure)
//! - Zero-copy consumer path: an exclusive read session hands out direct
//!   slices into storage, scoped so use-after-close cannot compile
//! - Per-block timestamp table with linear extrapolation between stamps
//! - Acquire/release cursor publication - no locks anywhere
//!
//! # Example
//!
//! ```
//! use dataqueue_rs::{DataQueue, QueueConfig};
//!
//! let mut queue = DataQueue::<f32>::new(QueueConfig::new(1024, 16, 44_100));
//! queue.set_channels(2);
//!
//! // Producer: write a span per channel with its first-sample timestamp.
//! queue.write_channel(0, &[0.25; 512], 0).unwrap();
//! queue.write_channel(1, &[0.75; 512], 0).unwrap();
//!
//! // Consumer: open the exclusive session, read in place, close.
//! let session = queue.start_read(0).unwrap();
//! for chan in 0..session.num_channels() {
//!     let (head, tail) = session.slices(chan);
//!     assert_eq!(head.len() + tail.len(), 512);
//!     assert_eq!(session.timestamp(chan), 0);
//! }
//! session.close();
//! ```

mod config;
mod invariants;
mod queue;
mod region;
mod ring;
mod store;
mod timestamps;

pub use config::QueueConfig;
pub use queue::{ChannelRead, DataQueue, OverflowError, ReadSession};
pub use region::{Region, SplitRegion, WriteGrant};
pub use ring::ChannelRing;
pub use store::SampleStore;
pub use timestamps::TimestampTable;

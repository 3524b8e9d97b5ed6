/// A contiguous run of physical sample indices within one channel's storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Region {
    /// First physical index of the run.
    pub start: usize,
    /// Number of samples in the run.
    pub len: usize,
}

impl Region {
    /// Creates a region covering `[start, start + len)`.
    #[inline]
    pub const fn new(start: usize, len: usize) -> Self {
        Self { start, len }
    }

    /// Returns true if the region covers no samples.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// A reserved index range, split into at most two physical runs.
///
/// A logically contiguous range wraps past the end of physical storage at
/// most once, so `second` is non-empty only when the range crosses the
/// wrap point (in which case it always starts at physical index 0).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SplitRegion {
    /// Leading run, starting at the reserving cursor's physical position.
    pub first: Region,
    /// Wrapped run at the start of storage; empty when no wrap occurred.
    pub second: Region,
}

impl SplitRegion {
    /// Total number of samples covered by both runs.
    #[inline]
    pub const fn len(&self) -> usize {
        self.first.len + self.second.len
    }

    /// Returns true if neither run covers any samples.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Outcome of a write-side reservation.
///
/// The producer asks for `n` slots; the ring grants `min(n, free_space)`.
/// A grant smaller than the request is the overflow condition: the caller
/// must not copy the unreserved tail, and decides whether to drop, retry,
/// or escalate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteGrant {
    /// Every requested slot was reserved.
    Full(SplitRegion),
    /// Free space ran out; only the head of the request was reserved.
    Partial {
        /// The reserved prefix of the request.
        region: SplitRegion,
        /// Number of requested slots that could not be reserved.
        shortfall: usize,
    },
    /// Nothing was reserved: the request was empty, or no free space
    /// remained.
    Empty,
}

impl WriteGrant {
    /// The reserved range (empty for [`WriteGrant::Empty`]).
    #[inline]
    pub fn region(&self) -> SplitRegion {
        match self {
            Self::Full(region) | Self::Partial { region, .. } => *region,
            Self::Empty => SplitRegion::default(),
        }
    }

    /// Number of slots actually reserved.
    #[inline]
    pub fn granted(&self) -> usize {
        self.region().len()
    }

    /// Returns true if the full request was reserved.
    #[inline]
    pub fn is_full(&self) -> bool {
        matches!(self, Self::Full(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_region_len() {
        let split = SplitRegion {
            first: Region::new(28, 4),
            second: Region::new(0, 3),
        };
        assert_eq!(split.len(), 7);
        assert!(!split.is_empty());
        assert!(SplitRegion::default().is_empty());
    }

    #[test]
    fn test_write_grant_accessors() {
        let region = SplitRegion {
            first: Region::new(0, 5),
            second: Region::default(),
        };

        let full = WriteGrant::Full(region);
        assert!(full.is_full());
        assert_eq!(full.granted(), 5);

        let partial = WriteGrant::Partial {
            region,
            shortfall: 3,
        };
        assert!(!partial.is_full());
        assert_eq!(partial.granted(), 5);

        assert_eq!(WriteGrant::Empty.granted(), 0);
        assert!(WriteGrant::Empty.region().is_empty());
    }
}

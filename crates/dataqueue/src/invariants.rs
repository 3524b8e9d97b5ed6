//! Debug assertion macros for ring cursor invariants.
//!
//! These checks are only active in debug builds (`debug_assert!`), so there
//! is zero overhead on the release hot path.

// =============================================================================
// Bounded count: 0 ≤ (write - read) ≤ capacity
// =============================================================================

/// Assert that the number of buffered samples does not exceed capacity.
///
/// Used in: `commit_write()` after computing the new write cursor.
macro_rules! debug_assert_bounded_count {
    ($count:expr, $capacity:expr) => {
        debug_assert!(
            $count <= $capacity,
            "bounded count violated: {} buffered samples exceed capacity {}",
            $count,
            $capacity
        )
    };
}

// =============================================================================
// Read never past write
// =============================================================================

/// Assert that the read cursor does not advance past the write cursor.
///
/// Used in: `commit_read()` before updating the read cursor.
macro_rules! debug_assert_read_not_past_write {
    ($new_read:expr, $write:expr) => {
        debug_assert!(
            $new_read <= $write,
            "read cursor {} advanced past write cursor {}",
            $new_read,
            $write
        )
    };
}

// =============================================================================
// Monotonic progress: cursors only increase
// =============================================================================

/// Assert that a logical cursor only moves forward.
///
/// Used in: `commit_write()` and `commit_read()`.
macro_rules! debug_assert_monotonic {
    ($name:literal, $old:expr, $new:expr) => {
        debug_assert!(
            $new >= $old,
            "monotonic progress violated: {} decreased from {} to {}",
            $name,
            $old,
            $new
        )
    };
}

pub(crate) use debug_assert_bounded_count;
pub(crate) use debug_assert_monotonic;
pub(crate) use debug_assert_read_not_past_write;

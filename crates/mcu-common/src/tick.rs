//! Wraparound-safe tick arithmetic.
//!
//! The hardware clock is a free-running 32-bit counter that rolls over
//! every 2^32 ticks. Plain integer ordering is meaningless across a
//! rollover, so `Tick` does not implement `Ord`; every comparison goes
//! through the signed-difference rule in [`Tick::is_before`].

use std::fmt;

/// An instant on the 32-bit hardware clock.
///
/// Wraps modulo 2^32. Arithmetic is always wrapping; ordering is only
/// available via [`Tick::is_before`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Tick(pub u32);

impl Tick {
    /// Raw counter value.
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Returns true if `self` is before `other` on the wrapping clock.
    ///
    /// Implemented as `(self - other) as i32 < 0`, which stays correct
    /// across counter rollover as long as the two instants are less than
    /// half the counter range apart. Equal ticks are never before each
    /// other. Ticks exactly 2^31 apart hit the signed minimum, so both
    /// directions report "before"; that ambiguity is inherent to the
    /// scheme and accepted (see `half_range_is_before` test).
    #[inline]
    #[must_use]
    pub fn is_before(self, other: Tick) -> bool {
        (self.0.wrapping_sub(other.0) as i32) < 0
    }

    /// `self + ticks`, wrapping at the counter boundary.
    #[inline]
    #[must_use]
    pub fn offset(self, ticks: u32) -> Tick {
        Tick(self.0.wrapping_add(ticks))
    }

    /// Signed distance `self - other`.
    ///
    /// Positive when `self` is after `other`, negative when before.
    #[inline]
    #[must_use]
    pub fn signed_diff(self, other: Tick) -> i32 {
        self.0.wrapping_sub(other.0) as i32
    }

    /// Unsigned elapsed ticks since `earlier`, wrapping.
    #[inline]
    #[must_use]
    pub fn ticks_since(self, earlier: Tick) -> u32 {
        self.0.wrapping_sub(earlier.0)
    }
}

impl fmt::Display for Tick {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Convert microseconds to clock ticks at the given frequency.
///
/// `us * (clock_freq_hz / 1_000_000)`, truncating. The caller must ensure
/// the product fits in 32 bits; [`crate::config::TimingConfig::windows`]
/// performs that check for configured windows.
#[inline]
#[must_use]
pub fn ticks_from_us(us: u32, clock_freq_hz: u32) -> u32 {
    us.wrapping_mul(clock_freq_hz / 1_000_000)
}

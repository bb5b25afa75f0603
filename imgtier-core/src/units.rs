//! Byte quantities for memory thresholds and decoded image footprints.

use std::{fmt, iter::Sum, ops::Add};

const MIB: u64 = 1024 * 1024;

/// A byte count. Addition saturates.
///
/// Displayed in MiB once it reaches one, the unit pressure thresholds are
/// configured in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct ByteSize(u64);

impl ByteSize {
    /// No bytes.
    pub const ZERO: Self = Self(0);

    /// Exact byte count.
    pub const fn from_bytes(bytes: u64) -> Self {
        Self(bytes)
    }

    /// `mib` mebibytes, saturating at `u64::MAX` bytes.
    pub const fn from_mib(mib: u64) -> Self {
        Self(mib.saturating_mul(MIB))
    }

    /// Exact byte count.
    pub const fn as_bytes(self) -> u64 {
        self.0
    }

    /// Whole mebibytes, rounded down.
    pub const fn whole_mib(self) -> u64 {
        self.0 / MIB
    }
}

impl Add for ByteSize {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0.saturating_add(rhs.0))
    }
}

impl Sum for ByteSize {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl fmt::Display for ByteSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 < MIB {
            write!(f, "{} B", self.0)
        } else {
            write!(f, "{:.1} MiB", self.0 as f64 / MIB as f64)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn displays_bytes_then_mib() {
        assert_eq!(ByteSize::from_bytes(4096).to_string(), "4096 B");
        assert_eq!(ByteSize::from_mib(256).to_string(), "256.0 MiB");
        assert_eq!(ByteSize::from_bytes(3 * MIB / 2).to_string(), "1.5 MiB");
    }

    #[test]
    fn sum_saturates() {
        let total: ByteSize = [ByteSize::from_bytes(u64::MAX), ByteSize::from_mib(1)]
            .into_iter()
            .sum();
        assert_eq!(total.as_bytes(), u64::MAX);
        assert_eq!(ByteSize::from_mib(300).whole_mib(), 300);
    }
}

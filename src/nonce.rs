use std::sync::atomic::{AtomicU32, Ordering};

/// Nonce count for one server nonce.
///
/// Shared by every request signed with the same cached scheme, so the
/// increment is a single atomic read-modify-write: concurrent callers always
/// observe distinct, strictly increasing values up to `u32::MAX`.
#[derive(Debug, Default)]
pub struct NonceCounter {
    nc: AtomicU32,
}

impl NonceCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance the counter and return the new value (the first call yields 1).
    ///
    /// `nc` is eight hex digits on the wire, so the counter saturates at
    /// `u32::MAX` instead of wrapping back to `00000000`. A server that lets a
    /// nonce live that long sees the last value repeated and should reject it.
    pub fn increment_and_get(&self) -> u32 {
        match self
            .nc
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_add(1))
        {
            Ok(previous) => previous + 1,
            Err(max) => max,
        }
    }

    /// Last value handed out, 0 if none yet
    pub fn current(&self) -> u32 {
        self.nc.load(Ordering::Acquire)
    }
}

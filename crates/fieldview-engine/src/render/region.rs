use std::sync::{Arc, RwLock};

use anyhow::{Result, anyhow};

use super::error::ContractError;

/// Caller-owned memory the orchestrator reads from on every render call.
pub type SharedBytes = Arc<RwLock<Vec<u8>>>;

/// Wraps `bytes` as a [`SharedBytes`] backing store.
pub fn shared_bytes(bytes: Vec<u8>) -> SharedBytes {
    Arc::new(RwLock::new(bytes))
}

/// A `(backing store, offset, length)` view into caller memory.
///
/// The length is fixed for the lifetime of the region; the contents are read
/// fresh on each [`BufferRegion::with_bytes`] call. The backing store may be
/// shared by several regions (e.g. field data and direct pixels carved out of
/// one emulator memory block).
#[derive(Debug, Clone)]
pub struct BufferRegion {
    backing: SharedBytes,
    offset: usize,
    len: usize,
}

impl BufferRegion {
    /// Creates a region, checking it lies within the backing store as it is now.
    pub fn new(backing: SharedBytes, offset: usize, len: usize) -> Result<Self> {
        let backing_len = read_len(&backing)?;
        check_bounds(offset, len, backing_len)?;
        Ok(Self {
            backing,
            offset,
            len,
        })
    }

    /// Creates a region spanning the whole backing store.
    pub fn whole(backing: SharedBytes) -> Result<Self> {
        let len = read_len(&backing)?;
        Self::new(backing, 0, len)
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn backing(&self) -> &SharedBytes {
        &self.backing
    }

    /// Runs `f` over the region's current bytes under the backing store's read
    /// lock.
    ///
    /// Fails if the backing store has shrunk below the region since creation.
    pub fn with_bytes<R>(&self, f: impl FnOnce(&[u8]) -> R) -> Result<R> {
        let guard = self
            .backing
            .read()
            .map_err(|_| anyhow!("buffer region backing store is poisoned"))?;
        check_bounds(self.offset, self.len, guard.len())?;
        Ok(f(&guard[self.offset..self.offset + self.len]))
    }
}

fn read_len(backing: &SharedBytes) -> Result<usize> {
    backing
        .read()
        .map(|bytes| bytes.len())
        .map_err(|_| anyhow!("buffer region backing store is poisoned"))
}

fn check_bounds(offset: usize, len: usize, backing_len: usize) -> Result<(), ContractError> {
    match offset.checked_add(len) {
        Some(end) if end <= backing_len => Ok(()),
        _ => Err(ContractError::RegionOutOfBounds {
            offset,
            len,
            backing_len,
        }),
    }
}

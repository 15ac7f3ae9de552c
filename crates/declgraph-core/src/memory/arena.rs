use bytemuck::Zeroable;
use serde::{Deserialize, Serialize};
use std::marker::PhantomData;
use std::ptr::NonNull;

use super::debug::{MemoryCategory, MEMORY_TRACKER};
use super::os;
use crate::error::{DeclGraphError, Result};

/// Sizing knobs for one arena. Passed explicitly by the owner; there is no
/// ambient default instance.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ArenaOptions {
    /// Address-space ceiling chosen at construction. The arena can never
    /// hold more than this many bytes.
    pub reservation_bytes: usize,
    /// Unit the committed region grows by.
    pub commit_granularity: usize,
}

impl Default for ArenaOptions {
    fn default() -> Self {
        Self {
            reservation_bytes: 16 * 1024 * 1024,
            commit_granularity: 4 * 1024,
        }
    }
}

impl ArenaOptions {
    pub fn validate(&self) -> Result<()> {
        if self.reservation_bytes == 0 {
            return Err(DeclGraphError::InvalidOptions(
                "reservation_bytes must be non-zero".into(),
            ));
        }
        if self.commit_granularity == 0 {
            return Err(DeclGraphError::InvalidOptions(
                "commit_granularity must be non-zero".into(),
            ));
        }
        Ok(())
    }
}

fn round_up(value: usize, unit: usize) -> Result<usize> {
    value
        .checked_add(unit - 1)
        .map(|v| v / unit * unit)
        .ok_or_else(|| DeclGraphError::InvalidOptions(format!("size overflow: {}", value)))
}

/// Typed, append-only allocator over one pre-reserved address range.
///
/// The full range is reserved up front without backing memory; allocation
/// extends the committed prefix in `commit_granularity` steps. Because the
/// range never moves, every pointer handed out stays valid for the arena's
/// whole lifetime. Dropping the arena releases the range in one step and
/// invalidates all derived pointers.
///
/// Single-writer; not safe for concurrent use.
#[derive(Debug)]
pub struct VirtualArena<T: Zeroable> {
    base: NonNull<u8>,
    used: usize,
    committed: usize,
    reserved: usize,
    granularity: usize,
    category: MemoryCategory,
    _marker: PhantomData<T>,
}

impl<T: Zeroable> VirtualArena<T> {
    pub fn new(category: MemoryCategory) -> Result<Self> {
        Self::with_options(&ArenaOptions::default(), category)
    }

    pub fn with_options(options: &ArenaOptions, category: MemoryCategory) -> Result<Self> {
        options.validate()?;
        assert!(std::mem::size_of::<T>() > 0, "zero-sized arena element");
        let page = os::page_granularity();
        assert!(
            std::mem::align_of::<T>() <= page,
            "element alignment exceeds page granularity"
        );

        // Commits must land on page boundaries, so the granularity is
        // rounded up to a whole number of pages.
        let granularity = round_up(options.commit_granularity, page)?;
        let reserved = round_up(options.reservation_bytes, granularity)?;
        let base = os::reserve(reserved).map_err(|source| DeclGraphError::Reservation {
            requested: reserved,
            source,
        })?;

        Ok(Self {
            base,
            used: 0,
            committed: 0,
            reserved,
            granularity,
            category,
            _marker: PhantomData,
        })
    }

    /// Returns `count` contiguous zero-initialized elements. The pointer
    /// stays valid and unchanged until the arena is dropped.
    pub fn alloc(&mut self, count: usize) -> *mut T {
        let bytes = match count.checked_mul(std::mem::size_of::<T>()) {
            Some(b) => b,
            None => {
                tracing::error!(count, "arena allocation size overflow");
                std::process::abort();
            }
        };
        if self.used + bytes > self.committed {
            self.grow(self.used + bytes - self.committed);
        }

        debug_assert_eq!(self.used % std::mem::align_of::<T>(), 0);
        let ptr = unsafe { self.base.as_ptr().add(self.used) } as *mut T;
        unsafe {
            std::ptr::write_bytes(ptr as *mut u8, 0, bytes);
        }
        self.used += bytes;
        debug_assert!(self.used <= self.committed && self.committed <= self.reserved);
        MEMORY_TRACKER.record_items(self.category, count as u64);
        ptr
    }

    /// Appends one element and returns its index.
    pub fn push(&mut self, value: T) -> u64 {
        let index = self.len() as u64;
        let ptr = self.alloc(1);
        unsafe {
            ptr.write(value);
        }
        index
    }

    /// Number of elements handed out so far.
    #[inline]
    pub fn len(&self) -> usize {
        self.used / std::mem::size_of::<T>()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.used == 0
    }

    #[inline]
    pub fn as_ptr(&self) -> *const T {
        self.base.as_ptr() as *const T
    }

    /// View of all elements in allocation order.
    pub fn as_slice(&self) -> &[T] {
        unsafe { std::slice::from_raw_parts(self.as_ptr(), self.len()) }
    }

    #[inline]
    pub fn used_bytes(&self) -> usize {
        self.used
    }

    #[inline]
    pub fn committed_bytes(&self) -> usize {
        self.committed
    }

    #[inline]
    pub fn reserved_bytes(&self) -> usize {
        self.reserved
    }

    /// Extend the committed region by `shortfall` rounded up to the commit
    /// granularity. Running past the reservation ceiling is unrecoverable:
    /// the ceiling was chosen at startup and there is no relocation path
    /// that would keep issued pointers valid.
    fn grow(&mut self, shortfall: usize) {
        let grow = match shortfall.checked_add(self.granularity - 1) {
            Some(v) => v / self.granularity * self.granularity,
            None => {
                tracing::error!(shortfall, "arena growth size overflow");
                std::process::abort();
            }
        };
        let new_committed = self.committed.saturating_add(grow);
        if new_committed > self.reserved {
            tracing::error!(
                category = ?self.category,
                reserved = self.reserved,
                committed = self.committed,
                shortfall,
                "arena reservation exhausted"
            );
            std::process::abort();
        }
        let at = unsafe { self.base.as_ptr().add(self.committed) };
        if let Err(err) = os::commit(at, grow) {
            tracing::error!(category = ?self.category, %err, grow, "arena commit failed");
            std::process::abort();
        }
        self.committed = new_committed;
        MEMORY_TRACKER.record_commit(self.category, grow as u64);
        tracing::trace!(category = ?self.category, committed = self.committed, "arena grew");
    }
}

impl<T: Zeroable> Drop for VirtualArena<T> {
    fn drop(&mut self) {
        MEMORY_TRACKER.record_release(self.category, self.committed as u64);
        os::release(self.base.as_ptr(), self.reserved);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_arena() -> VirtualArena<u64> {
        let options = ArenaOptions {
            reservation_bytes: 1024 * 1024,
            commit_granularity: 4 * 1024,
        };
        VirtualArena::with_options(&options, MemoryCategory::Other).unwrap()
    }

    #[test]
    fn pointers_stay_put_across_growth() {
        let mut arena = small_arena();
        let first = arena.alloc(8);
        let recorded = first as usize;

        // Force several commit steps.
        for _ in 0..64 {
            arena.alloc(512);
        }

        assert_eq!(first as usize, recorded);
        assert_eq!(arena.as_ptr() as usize, recorded);
    }

    #[test]
    fn allocations_are_zeroed() {
        let mut arena = small_arena();
        let first = arena.alloc(4);
        unsafe {
            for i in 0..4 {
                first.add(i).write(u64::MAX);
            }
        }

        let second = arena.alloc(16);
        for i in 0..16 {
            assert_eq!(unsafe { second.add(i).read() }, 0);
        }
    }

    #[test]
    fn push_and_read_back() {
        let mut arena = small_arena();
        for i in 0..1000u64 {
            assert_eq!(arena.push(i * 3), i);
        }
        let view = arena.as_slice();
        assert_eq!(view.len(), 1000);
        assert_eq!(view[0], 0);
        assert_eq!(view[999], 999 * 3);
    }

    #[test]
    fn bookkeeping_invariant_holds() {
        let mut arena = small_arena();
        assert_eq!(arena.committed_bytes(), 0);
        arena.alloc(1);
        assert!(arena.used_bytes() <= arena.committed_bytes());
        assert!(arena.committed_bytes() <= arena.reserved_bytes());
    }

    #[test]
    fn allocations_are_attributed_to_their_category() {
        let before = MEMORY_TRACKER
            .snapshot()
            .get(&MemoryCategory::Other)
            .map(|s| s.items)
            .unwrap_or(0);

        let mut arena = small_arena();
        for i in 0..10u64 {
            arena.push(i);
        }

        let after = MEMORY_TRACKER
            .snapshot()
            .get(&MemoryCategory::Other)
            .map(|s| s.items)
            .unwrap_or(0);
        assert!(after >= before + 10);
    }

    #[test]
    fn rejects_bad_options() {
        let options = ArenaOptions {
            reservation_bytes: 0,
            commit_granularity: 4096,
        };
        assert!(VirtualArena::<u64>::with_options(&options, MemoryCategory::Other).is_err());
    }
}

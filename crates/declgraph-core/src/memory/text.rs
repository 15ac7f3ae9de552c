use std::ffi::CStr;
use std::os::raw::c_char;

use super::arena::{ArenaOptions, VirtualArena};
use super::debug::MemoryCategory;
use crate::error::Result;

/// Byte arena producing NUL-terminated, pointer-stable copies of text.
///
/// Identical inputs are copied every time; deduplication is deliberately not
/// offered so writers never pay a lookup. A hash-consing layer could sit on
/// top without changing this contract.
#[derive(Debug)]
pub struct TextArena {
    bytes: VirtualArena<u8>,
}

impl TextArena {
    pub fn new() -> Result<Self> {
        Self::with_options(&ArenaOptions::default())
    }

    pub fn with_options(options: &ArenaOptions) -> Result<Self> {
        Ok(Self {
            bytes: VirtualArena::with_options(options, MemoryCategory::Text)?,
        })
    }

    /// Copies `text` into the arena followed by one terminating NUL byte and
    /// returns the copy's start. The pointer stays valid until the arena is
    /// dropped, regardless of later `dupe` calls.
    pub fn dupe(&mut self, text: &[u8]) -> *const c_char {
        let copy = self.bytes.alloc(text.len() + 1);
        unsafe {
            std::ptr::copy_nonoverlapping(text.as_ptr(), copy, text.len());
        }
        // The terminator is already zero: alloc hands out zeroed bytes.
        copy as *const c_char
    }

    pub fn dupe_str(&mut self, text: &str) -> *const c_char {
        self.dupe(text.as_bytes())
    }

    /// Total bytes handed out, terminators included.
    #[inline]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    #[inline]
    pub fn as_ptr(&self) -> *const u8 {
        self.bytes.as_ptr()
    }

    /// The whole interned buffer in copy order.
    pub fn as_slice(&self) -> &[u8] {
        self.bytes.as_slice()
    }

    /// True when `ptr` points into this arena's used range.
    pub fn contains(&self, ptr: *const c_char) -> bool {
        let p = ptr as usize;
        let base = self.bytes.as_ptr() as usize;
        p >= base && p < base + self.bytes.used_bytes()
    }

    /// Reads a NUL-terminated string previously returned by `dupe`.
    ///
    /// # Safety
    /// `ptr` must have been returned by `dupe` on this arena.
    pub unsafe fn resolve(&self, ptr: *const c_char) -> &CStr {
        debug_assert!(self.contains(ptr));
        CStr::from_ptr(ptr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_appends_terminator() {
        let mut text = TextArena::new().unwrap();
        let p = text.dupe_str("hello");
        assert_eq!(unsafe { text.resolve(p) }.to_bytes(), b"hello");
        assert_eq!(text.len(), 6);
    }

    #[test]
    fn equal_inputs_get_distinct_copies() {
        let mut text = TextArena::new().unwrap();
        let a = text.dupe_str("same");
        let b = text.dupe_str("same");
        assert_ne!(a, b);
        assert_eq!(unsafe { text.resolve(a) }, unsafe { text.resolve(b) });
    }

    #[test]
    fn copies_survive_later_growth() {
        let mut text = TextArena::new().unwrap();
        let early = text.dupe_str("early");
        let addr = early as usize;

        let filler = "x".repeat(1024);
        for _ in 0..64 {
            text.dupe_str(&filler);
        }

        assert_eq!(early as usize, addr);
        assert_eq!(unsafe { text.resolve(early) }.to_bytes(), b"early");
    }

    #[test]
    fn empty_string_is_just_a_terminator() {
        let mut text = TextArena::new().unwrap();
        let p = text.dupe(b"");
        assert_eq!(unsafe { text.resolve(p) }.to_bytes(), b"");
        assert_eq!(text.len(), 1);
    }
}

//! Address-space primitives: reserve without backing, commit incrementally,
//! release in one step. Unix uses `mmap`/`mprotect`/`munmap`; Windows uses
//! `VirtualAlloc`/`VirtualFree`.

use std::io;
use std::ptr::NonNull;

/// Reserve `len` bytes of address space with no backing memory.
pub(crate) fn reserve(len: usize) -> io::Result<NonNull<u8>> {
    reserve_impl(len)
}

/// Back `[ptr, ptr + len)` with read-write memory. `ptr` must lie inside a
/// range returned by `reserve` and be page-aligned.
pub(crate) fn commit(ptr: *mut u8, len: usize) -> io::Result<()> {
    commit_impl(ptr, len)
}

/// Decommit and unreserve the whole range in one step.
pub(crate) fn release(ptr: *mut u8, len: usize) {
    release_impl(ptr, len)
}

/// Smallest unit `commit` can operate on.
pub(crate) fn page_granularity() -> usize {
    page_granularity_impl()
}

#[cfg(unix)]
fn reserve_impl(len: usize) -> io::Result<NonNull<u8>> {
    #[allow(unused_mut)]
    let mut flags = libc::MAP_PRIVATE | libc::MAP_ANON;
    #[cfg(target_os = "linux")]
    {
        flags |= libc::MAP_NORESERVE;
    }
    let ptr = unsafe {
        libc::mmap(
            std::ptr::null_mut(),
            len,
            libc::PROT_NONE,
            flags,
            -1,
            0,
        )
    };
    if ptr == libc::MAP_FAILED {
        return Err(io::Error::last_os_error());
    }
    Ok(unsafe { NonNull::new_unchecked(ptr as *mut u8) })
}

#[cfg(windows)]
fn reserve_impl(len: usize) -> io::Result<NonNull<u8>> {
    use windows_sys::Win32::System::Memory::{VirtualAlloc, MEM_RESERVE, PAGE_NOACCESS};

    let ptr = unsafe { VirtualAlloc(std::ptr::null(), len, MEM_RESERVE, PAGE_NOACCESS) };
    NonNull::new(ptr as *mut u8).ok_or_else(io::Error::last_os_error)
}

#[cfg(unix)]
fn commit_impl(ptr: *mut u8, len: usize) -> io::Result<()> {
    let rc = unsafe {
        libc::mprotect(
            ptr as *mut libc::c_void,
            len,
            libc::PROT_READ | libc::PROT_WRITE,
        )
    };
    if rc != 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}

#[cfg(windows)]
fn commit_impl(ptr: *mut u8, len: usize) -> io::Result<()> {
    use windows_sys::Win32::System::Memory::{VirtualAlloc, MEM_COMMIT, PAGE_READWRITE};

    let out = unsafe {
        VirtualAlloc(
            ptr as *const core::ffi::c_void,
            len,
            MEM_COMMIT,
            PAGE_READWRITE,
        )
    };
    if out.is_null() {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}

#[cfg(unix)]
fn release_impl(ptr: *mut u8, len: usize) {
    unsafe {
        libc::munmap(ptr as *mut libc::c_void, len);
    }
}

#[cfg(windows)]
fn release_impl(ptr: *mut u8, _len: usize) {
    use windows_sys::Win32::System::Memory::{VirtualFree, MEM_RELEASE};

    unsafe {
        VirtualFree(ptr as *mut core::ffi::c_void, 0, MEM_RELEASE);
    }
}

#[cfg(unix)]
fn page_granularity_impl() -> usize {
    let sz = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };
    if sz <= 0 {
        4096
    } else {
        sz as usize
    }
}

#[cfg(windows)]
fn page_granularity_impl() -> usize {
    // VirtualAlloc rounds commit requests to page boundaries itself.
    4096
}

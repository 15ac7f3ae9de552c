use bytemuck::Zeroable;
use std::os::raw::c_char;

/// Scope id reported when a declaration or reference has no enclosing scope
/// on the parent stack.
pub const ROOT_SCOPE: i64 = 0;

/// One canonical declaration. `name` points into the text arena owned by the
/// same export; it stays valid until that export is released.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct Node {
    pub id: i64,
    pub name: *const c_char,
}

unsafe impl Zeroable for Node {}

/// Directed edge: `from` is declared or used within `to`'s scope. Duplicates
/// are possible across repeated traversals; no uniqueness is enforced.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Connection {
    pub from: i64,
    pub to: i64,
}

unsafe impl Zeroable for Connection {}

/// Secondary externally visible name for an existing node. Does not create
/// a node of its own.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct LinkIdentifier {
    pub id: i64,
    pub alias: *const c_char,
}

unsafe impl Zeroable for LinkIdentifier {}

/// One translation unit's build command. All pointers target arena storage
/// owned by the compile database; `heuristic` is null when the command was
/// read directly from the manifest rather than inferred.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct CompileCommand {
    pub directory: *const c_char,
    pub filename: *const c_char,
    pub output: *const c_char,
    pub heuristic: *const c_char,
    pub argc: u64,
    pub argv: *const *const c_char,
}

unsafe impl Zeroable for CompileCommand {}

/// One cell of a compile command's argument vector. Transparent over the
/// text pointer so an arena of cells exposes a plain `argv` array.
#[repr(transparent)]
#[derive(Debug, Clone, Copy)]
pub struct ArgvCell(pub *const c_char);

unsafe impl Zeroable for ArgvCell {}

/// Borrowed view over arena-owned storage handed across the FFI boundary.
/// Valid until the owning object's teardown call.
#[repr(C)]
pub struct Slice<T> {
    pub ptr: *const T,
    pub len: u64,
}

impl<T> Slice<T> {
    pub fn empty() -> Self {
        Self {
            ptr: std::ptr::null(),
            len: 0,
        }
    }

    pub fn from_slice(items: &[T]) -> Self {
        Self {
            ptr: items.as_ptr(),
            len: items.len() as u64,
        }
    }

    /// # Safety
    /// `ptr` must still be owned by a live arena and `len` unchanged since
    /// the view was issued.
    pub unsafe fn as_slice(&self) -> &[T] {
        if self.len == 0 {
            return &[];
        }
        std::slice::from_raw_parts(self.ptr, self.len as usize)
    }
}

impl<T> Clone for Slice<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Slice<T> {}

impl<T> std::fmt::Debug for Slice<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Slice")
            .field("ptr", &self.ptr)
            .field("len", &self.len)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slice_round_trip() {
        let items = [1i64, 2, 3];
        let view = Slice::from_slice(&items);
        assert_eq!(view.len, 3);
        assert_eq!(unsafe { view.as_slice() }, &items);
    }

    #[test]
    fn empty_slice_is_safe_to_view() {
        let view = Slice::<Connection>::empty();
        assert!(unsafe { view.as_slice() }.is_empty());
    }

    #[test]
    fn records_have_fixed_layout() {
        assert_eq!(std::mem::size_of::<Connection>(), 16);
        assert_eq!(
            std::mem::size_of::<Node>(),
            std::mem::size_of::<i64>() + std::mem::size_of::<*const c_char>()
        );
    }
}

//! Memory subsystem: reserve/commit arenas, text interning and tracking.
//!
//! Components:
//! - `os`: address-space reservation and commit primitives per platform
//! - `arena`: typed, non-moving arena over one reserved range
//! - `text`: NUL-terminated, pointer-stable text copies
//! - `debug`: memory tracker to record usage by category

pub mod arena;
pub mod debug;
mod os;
pub mod text;

pub use arena::*;
pub use debug::*;
pub use text::*;

pub mod event;
pub mod export;
pub mod recorder;
pub mod sink;

pub use event::*;
pub use export::*;
pub use recorder::*;
pub use sink::*;

//! Frame streaming engine: slot pool, double buffers, background prefetch.

mod manager;
mod queue;
mod slot;
mod worker;

pub use manager::StreamManager;
pub use queue::FRAMES_PER_SLOT;
pub use slot::FrameRef;

//! Encoded-frame streaming and Q15 sample-rate conversion.
//!
//! Two subsystems for feeding a real-time broadcast pipeline on a
//! resource-constrained device:
//!
//! - **Frame streaming**: a fixed pool of stream slots that prefetch the
//!   next encoded frame on a background worker while the current one is
//!   being transmitted, hiding storage latency from the periodic consumer.
//! - **Sample-rate conversion**: stateful Q15 FIR interpolation/decimation
//!   between codec and transport rates, carrying partial-block remainders
//!   across calls.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use framestream::{FileFrameProvider, StreamManager, StreamerConfig};
//!
//! let provider = Arc::new(FileFrameProvider::new("/media"));
//! let manager = StreamManager::new(provider, StreamerConfig::default());
//!
//! let slot = manager.register("announcement.lc3", false)?;
//! // Called once per frame interval by the transport layer:
//! let frame = manager.next_frame(slot)?;
//! if let Some(bytes) = frame.bytes() {
//!     // hand the payload to the broadcast pipeline
//!     transmit(&bytes);
//! }
//! # fn transmit(_payload: &[u8]) {}
//! # Ok::<(), framestream::Error>(())
//! ```

// Error types
pub mod error;
pub use error::{Error, Result};

// Configuration
pub mod config;
pub use config::StreamerConfig;

// Frame source boundary
pub mod source;
pub use source::{FileFrameProvider, FrameRead, FrameSource, FrameSourceProvider, MemoryFrameProvider};

// Streaming engine
pub mod streamer;
pub use streamer::{FrameRef, StreamManager, FRAMES_PER_SLOT};

// Sample-rate conversion
pub mod resampler;
pub use resampler::{Direction, FilterProfile, Resampler, MAX_PROCESS_SAMPLES};

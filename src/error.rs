//! Error types.

use crate::resampler::FilterProfile;
use thiserror::Error;

/// Error type.
#[derive(Error, Debug)]
pub enum Error {
    /// Empty stream name passed to `register`.
    #[error("stream name is empty")]
    InvalidName,

    /// Stream name longer than the configured maximum.
    #[error("stream name exceeds {0} bytes")]
    NameTooLong(usize),

    /// Every slot in the pool is in use. Recoverable: retry after `end`.
    #[error("no free stream slot")]
    NoFreeSlot,

    /// The frame source could not be opened.
    #[error("failed to open frame source `{name}`")]
    SourceOpen {
        /// Name passed to `register`.
        name: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The frame source ended before the first frame could be read.
    #[error("frame source `{0}` contains no frames")]
    EmptySource(String),

    /// Slot handle outside the pool.
    #[error("invalid slot handle {0}")]
    InvalidHandle(usize),

    /// The slot is idle or has ended (including after a prefetch I/O failure).
    #[error("slot {0} is not playing")]
    NotPlaying(usize),

    /// The stream has delivered its last frame.
    #[error("end of stream")]
    EndOfStream,

    /// The background prefetch has not completed yet; the slot keeps playing.
    #[error("no prefetched frame ready")]
    NoFrameReady,

    /// Resampler called with identical input and output rates.
    #[error("input and output sample rates are equal")]
    EqualRates,

    /// Rate pair outside the supported conversion set.
    #[error("unsupported sample rate pair {input} -> {output}")]
    UnsupportedRatePair {
        /// Input sample rate in Hz.
        input: u32,
        /// Output sample rate in Hz.
        output: u32,
    },

    /// No coefficient table for this profile at this conversion ratio.
    #[error("no {profile:?} filter for conversion ratio {ratio}")]
    UnsupportedFilter {
        /// Requested filter profile.
        profile: FilterProfile,
        /// Integer conversion ratio.
        ratio: u8,
    },

    /// Resampler input block larger than the processing limit.
    #[error(
        "input block of {0} samples exceeds the {limit} sample limit",
        limit = crate::resampler::MAX_PROCESS_SAMPLES
    )]
    BlockTooLarge(usize),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type.
pub type Result<T> = std::result::Result<T, Error>;

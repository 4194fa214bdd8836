//! Stateful Q15 sample-rate conversion between codec and transport rates.
//!
//! A [`Resampler`] converts 16-bit PCM blocks between the supported rate
//! pairs (48 kHz down to 24/16 kHz, 16/24 kHz up to 48 kHz), carrying
//! partial-block remainders across calls so the caller can feed blocks of
//! any size and drain exactly its requested capacity per call.

mod filter;
mod fir;

pub use filter::FilterProfile;

use crate::error::{Error, Result};
use fir::FirState;
use smallvec::SmallVec;
use tracing::debug;

/// Largest input block accepted by a single `process` call.
pub const MAX_PROCESS_SAMPLES: usize = 480;

/// Conversion direction derived from the rate pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Interpolating towards 48 kHz.
    Up,
    /// Decimating from 48 kHz.
    Down,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct RateConfig {
    input_rate: u32,
    output_rate: u32,
    profile: FilterProfile,
    direction: Direction,
    ratio: u8,
}

/// Check a rate pair and derive direction and integer ratio.
fn validate_rates(input_rate: u32, output_rate: u32) -> Result<(Direction, u8)> {
    let unsupported = Error::UnsupportedRatePair {
        input: input_rate,
        output: output_rate,
    };

    if input_rate > output_rate {
        if input_rate != 48000 || (output_rate != 24000 && output_rate != 16000) {
            return Err(unsupported);
        }
        Ok((Direction::Down, (input_rate / output_rate) as u8))
    } else {
        if output_rate != 48000 || (input_rate != 24000 && input_rate != 16000) {
            return Err(unsupported);
        }
        Ok((Direction::Up, (output_rate / input_rate) as u8))
    }
}

/// Per-stream conversion context.
///
/// Owned by the caller, one per independent stream; calls on the same
/// context must be serialized. The filter state is re-initialized lazily
/// whenever `(input_rate, output_rate, profile)` differs from the previous
/// call, and only then.
pub struct Resampler {
    config: Option<RateConfig>,
    fir: FirState,
    /// Leftover input samples (< ratio) withheld until a block divides evenly.
    input_carry: SmallVec<[i16; 8]>,
    /// Produced samples not yet delivered to the caller.
    output_carry: SmallVec<[i16; 32]>,
    scratch: Vec<i16>,
}

impl Default for Resampler {
    fn default() -> Self {
        Self::new()
    }
}

impl Resampler {
    /// Create an unconfigured context; the first `process` call initializes it.
    pub fn new() -> Self {
        Self {
            config: None,
            fir: FirState::new(),
            input_carry: SmallVec::new(),
            output_carry: SmallVec::new(),
            scratch: Vec::new(),
        }
    }

    /// Convert one PCM block.
    ///
    /// Consumes the largest prefix of `input_carry ++ input` divisible by the
    /// conversion ratio and withholds the remainder for the next call.
    /// Produced samples are delivered oldest-first up to `output.len()`;
    /// returns the number of samples written. Once production and consumption
    /// reach steady state every call fills `output` exactly.
    ///
    /// Fails without touching the context on equal rates, an unsupported
    /// rate pair, a missing filter table, or an oversized input block.
    pub fn process(
        &mut self,
        profile: FilterProfile,
        input: &[i16],
        input_rate: u32,
        output: &mut [i16],
        output_rate: u32,
    ) -> Result<usize> {
        if input.len() > MAX_PROCESS_SAMPLES {
            return Err(Error::BlockTooLarge(input.len()));
        }
        if input_rate == output_rate {
            return Err(Error::EqualRates);
        }

        let cfg = match self.config {
            Some(c)
                if c.input_rate == input_rate
                    && c.output_rate == output_rate
                    && c.profile == profile =>
            {
                c
            }
            _ => self.reinit(profile, input_rate, output_rate)?,
        };

        let coeffs = filter::coefficients(cfg.profile, cfg.ratio)?;
        let ratio = cfg.ratio as usize;

        // Combine the withheld remainder with this call's input and take the
        // largest prefix the filter primitive can consume.
        self.scratch.clear();
        self.scratch.extend_from_slice(&self.input_carry);
        self.scratch.extend_from_slice(input);
        let processed = self.scratch.len() - self.scratch.len() % ratio;

        self.input_carry.clear();
        self.input_carry.extend_from_slice(&self.scratch[processed..]);

        if processed > 0 {
            let block = &self.scratch[..processed];
            match cfg.direction {
                Direction::Up => {
                    fir::interpolate(coeffs, ratio, &mut self.fir, block, &mut self.output_carry)
                }
                Direction::Down => {
                    fir::decimate(coeffs, ratio, &mut self.fir, block, &mut self.output_carry)
                }
            }
        }

        let delivered = output.len().min(self.output_carry.len());
        output[..delivered].copy_from_slice(&self.output_carry[..delivered]);
        self.output_carry.drain(..delivered);
        Ok(delivered)
    }

    fn reinit(
        &mut self,
        profile: FilterProfile,
        input_rate: u32,
        output_rate: u32,
    ) -> Result<RateConfig> {
        // Validate everything before mutating any state.
        let (direction, ratio) = validate_rates(input_rate, output_rate)?;
        filter::coefficients(profile, ratio)?;

        debug!(input_rate, output_rate, ?profile, "configuration changed, re-initializing filter");

        self.fir.reset();
        self.input_carry.clear();
        self.output_carry.clear();

        // Ratio-3 interpolation starts with two zero samples withheld so the
        // nominal 160-sample 16 kHz cadence divides evenly from the first call.
        if direction == Direction::Up && ratio == 3 {
            self.input_carry.extend_from_slice(&[0, 0]);
        }

        let cfg = RateConfig {
            input_rate,
            output_rate,
            profile,
            direction,
            ratio,
        };
        self.config = Some(cfg);
        Ok(cfg)
    }

    /// Configured input rate, if any call has succeeded.
    pub fn input_rate(&self) -> Option<u32> {
        self.config.map(|c| c.input_rate)
    }

    /// Configured output rate, if any call has succeeded.
    pub fn output_rate(&self) -> Option<u32> {
        self.config.map(|c| c.output_rate)
    }

    /// Configured conversion direction, if any call has succeeded.
    pub fn direction(&self) -> Option<Direction> {
        self.config.map(|c| c.direction)
    }

    /// Configured filter profile, if any call has succeeded.
    pub fn profile(&self) -> Option<FilterProfile> {
        self.config.map(|c| c.profile)
    }

    /// Number of withheld input samples; always below the conversion ratio.
    pub fn input_carry_len(&self) -> usize {
        self.input_carry.len()
    }

    /// Number of produced samples awaiting delivery.
    pub fn output_carry_len(&self) -> usize {
        self.output_carry.len()
    }
}

//! Q15 FIR interpolate/decimate primitives with carried history state.
//!
//! Numeric semantics: products accumulate in 64 bits, the sum is shifted
//! right by 15 (truncating) and saturated to i16.

use smallvec::SmallVec;

/// Largest tap count in the filter bank.
pub(crate) const MAX_TAPS: usize = 33;

/// FIR delay line carried across process calls.
///
/// `history[..hist]` holds the most recent past input samples in
/// chronological order, where `hist` is `taps - 1` for the decimator and
/// `taps / ratio - 1` for the interpolator.
pub(crate) struct FirState {
    history: [i16; MAX_TAPS],
}

impl FirState {
    pub fn new() -> Self {
        Self {
            history: [0; MAX_TAPS],
        }
    }

    /// Zero the delay line.
    pub fn reset(&mut self) {
        self.history = [0; MAX_TAPS];
    }

    #[inline]
    fn sample(&self, input: &[i16], hist: usize, idx: usize) -> i16 {
        if idx < hist {
            self.history[idx]
        } else {
            input[idx - hist]
        }
    }

    /// Retain the last `hist` samples of `history[..hist] ++ input`.
    fn push(&mut self, hist: usize, input: &[i16]) {
        if hist == 0 {
            return;
        }
        if input.len() >= hist {
            self.history[..hist].copy_from_slice(&input[input.len() - hist..]);
        } else {
            let keep = hist - input.len();
            self.history.copy_within(input.len()..hist, 0);
            self.history[keep..hist].copy_from_slice(input);
        }
    }
}

#[inline]
fn sat_q15(acc: i64) -> i16 {
    (acc >> 15).clamp(i16::MIN as i64, i16::MAX as i64) as i16
}

/// Low-pass filter then keep every `ratio`-th sample.
///
/// `input.len()` must be a multiple of `ratio`; produces `input.len() / ratio`
/// samples appended to `out`.
pub(crate) fn decimate(
    coeffs: &[i16],
    ratio: usize,
    state: &mut FirState,
    input: &[i16],
    out: &mut SmallVec<[i16; 32]>,
) {
    debug_assert!(ratio > 1 && input.len() % ratio == 0);
    let hist = coeffs.len() - 1;

    for n in 0..input.len() / ratio {
        let newest = hist + n * ratio + ratio - 1;
        let mut acc: i64 = 0;
        for (k, &c) in coeffs.iter().enumerate() {
            acc += c as i64 * state.sample(input, hist, newest - k) as i64;
        }
        out.push(sat_q15(acc));
    }

    state.push(hist, input);
}

/// Zero-stuffing interpolation by `ratio` followed by polyphase low-pass
/// filtering.
///
/// `coeffs.len()` must be a multiple of `ratio`; produces
/// `input.len() * ratio` samples appended to `out`.
pub(crate) fn interpolate(
    coeffs: &[i16],
    ratio: usize,
    state: &mut FirState,
    input: &[i16],
    out: &mut SmallVec<[i16; 32]>,
) {
    debug_assert!(ratio > 1 && coeffs.len() % ratio == 0);
    let phase_len = coeffs.len() / ratio;
    let hist = phase_len - 1;

    for n in 0..input.len() {
        for j in 0..ratio {
            let mut acc: i64 = 0;
            for k in 0..phase_len {
                acc += coeffs[k * ratio + j] as i64 * state.sample(input, hist, hist + n - k) as i64;
            }
            out.push(sat_q15(acc));
        }
    }

    state.push(hist, input);
}

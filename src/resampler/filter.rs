//! Static Q15 low-pass filter bank, selected by (profile, conversion ratio).

use crate::error::{Error, Result};

/// Filter profile selecting a coefficient family for a conversion ratio.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterProfile {
    /// Minimal-tap averaging filters; cheapest, most aliasing.
    Simple,
    /// 33-tap linear-phase low-pass for ratio 3.
    Small,
}

/// Two-tap averager for 48 kHz <-> 24 kHz.
static SIMPLE_RATIO_2: [i16; 2] = [16383, 16383];

/// Three-tap averager for 48 kHz <-> 16 kHz.
static SIMPLE_RATIO_3: [i16; 3] = [10922, 10922, 10923];

/// 33-tap linear-phase low-pass for 48 kHz <-> 16 kHz.
static SMALL_RATIO_3: [i16; 33] = [
    -9, -7, 33, 82, 34, -154, -297, -84, 479, 793, 145, -1278, -1977, -198, 4214, 9039, 11138,
    9039, 4214, -198, -1977, -1278, 145, 793, 479, -84, -297, -154, 34, 82, 33, -7, -9,
];

/// Look up the coefficient table for a profile at an integer conversion ratio.
pub(crate) fn coefficients(profile: FilterProfile, ratio: u8) -> Result<&'static [i16]> {
    match (profile, ratio) {
        (FilterProfile::Simple, 2) => Ok(&SIMPLE_RATIO_2),
        (FilterProfile::Simple, 3) => Ok(&SIMPLE_RATIO_3),
        (FilterProfile::Small, 3) => Ok(&SMALL_RATIO_3),
        _ => Err(Error::UnsupportedFilter { profile, ratio }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_supported_tables() {
        assert_eq!(coefficients(FilterProfile::Simple, 2).unwrap().len(), 2);
        assert_eq!(coefficients(FilterProfile::Simple, 3).unwrap().len(), 3);
        assert_eq!(coefficients(FilterProfile::Small, 3).unwrap().len(), 33);
    }

    #[test]
    fn test_small_has_no_ratio_2_table() {
        assert!(matches!(
            coefficients(FilterProfile::Small, 2),
            Err(Error::UnsupportedFilter { ratio: 2, .. })
        ));
    }

    #[test]
    fn test_small_table_is_symmetric() {
        let taps = coefficients(FilterProfile::Small, 3).unwrap();
        for i in 0..taps.len() / 2 {
            assert_eq!(taps[i], taps[taps.len() - 1 - i]);
        }
    }

    #[test]
    fn test_interpolator_taps_divide_by_ratio() {
        // The polyphase interpolator requires tap counts that are a
        // multiple of the ratio they serve.
        assert_eq!(coefficients(FilterProfile::Simple, 2).unwrap().len() % 2, 0);
        assert_eq!(coefficients(FilterProfile::Simple, 3).unwrap().len() % 3, 0);
        assert_eq!(coefficients(FilterProfile::Small, 3).unwrap().len() % 3, 0);
    }
}

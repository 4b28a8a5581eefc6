use std::fmt;

use serde::Serialize;

/// Band validated up to 90 phon.
pub const LOW_BAND_HZ: (f64, f64) = (20.0, 4000.0);
/// Band validated up to 80 phon.
pub const HIGH_BAND_HZ: (f64, f64) = (5000.0, 12500.0);
/// Top of the tabulated range; anything above is extrapolated.
pub const TABLE_TOP_HZ: f64 = 12_500.0;

/// Advisory conditions under which the model is outside its validated range.
///
/// These never stop an evaluation and never change the numbers it produces.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AccuracyWarning {
    /// A phon level above 80.
    PhonAbove80 { phon: f64 },
    /// A phon level strictly between 0 and 20.
    PhonBelow20 { phon: f64 },
    /// A frequency outside 20-4000 Hz queried together with a level above 90 phon.
    OutsideLowBandAbove90 { frequency: f64, phon: f64 },
    /// A frequency outside 5000-12500 Hz queried together with a level above 80 phon.
    OutsideHighBandAbove80 { frequency: f64, phon: f64 },
    /// A frequency above the tabulated range.
    Extrapolated { frequency: f64 },
}

impl fmt::Display for AccuracyWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccuracyWarning::PhonAbove80 { phon } => write!(
                f,
                "SPL values may not be accurate for loudness levels above 80 phon (got {phon})"
            ),
            AccuracyWarning::PhonBelow20 { phon } => write!(
                f,
                "SPL values may not be accurate for loudness levels below 20 phon (got {phon})"
            ),
            AccuracyWarning::OutsideLowBandAbove90 { frequency, phon } => write!(
                f,
                "only valid to 90 phon outside 20-4000 Hz ({frequency} Hz at {phon} phon)"
            ),
            AccuracyWarning::OutsideHighBandAbove80 { frequency, phon } => write!(
                f,
                "only valid to 80 phon outside 5000-12500 Hz ({frequency} Hz at {phon} phon)"
            ),
            AccuracyWarning::Extrapolated { frequency } => write!(
                f,
                "model defined only up to 12500 Hz; {frequency} Hz is extrapolated"
            ),
        }
    }
}

fn outside(band: (f64, f64), f: f64) -> bool {
    f < band.0 || f > band.1
}

/// Collect the warnings for a request.  Each condition is reported at most once, naming the first
/// offending value.
pub fn check(phons: &[f64], frequencies: Option<&[f64]>) -> Vec<AccuracyWarning> {
    let mut warnings = Vec::new();

    if let Some(&phon) = phons.iter().find(|&&p| p > 80.0) {
        warnings.push(AccuracyWarning::PhonAbove80 { phon });
    }
    if let Some(&phon) = phons.iter().find(|&&p| p > 0.0 && p < 20.0) {
        warnings.push(AccuracyWarning::PhonBelow20 { phon });
    }

    let Some(freqs) = frequencies else {
        return warnings;
    };

    let loudest = phons.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    if loudest > 90.0 {
        if let Some(&frequency) = freqs.iter().find(|&&f| outside(LOW_BAND_HZ, f)) {
            warnings.push(AccuracyWarning::OutsideLowBandAbove90 {
                frequency,
                phon: loudest,
            });
        }
    }
    if loudest > 80.0 {
        if let Some(&frequency) = freqs.iter().find(|&&f| outside(HIGH_BAND_HZ, f)) {
            warnings.push(AccuracyWarning::OutsideHighBandAbove80 {
                frequency,
                phon: loudest,
            });
        }
    }
    if let Some(&frequency) = freqs.iter().find(|&&f| f > TABLE_TOP_HZ) {
        warnings.push(AccuracyWarning::Extrapolated { frequency });
    }

    warnings
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quiet_request_in_band_has_no_warnings() {
        assert!(check(&[40.0, 60.0], Some(&[100.0, 1000.0])).is_empty());
        assert!(check(&[0.0], None).is_empty());
    }

    #[test]
    fn phon_range_warnings() {
        let w = check(&[10.0, 85.0], None);
        assert_eq!(
            w,
            vec![
                AccuracyWarning::PhonAbove80 { phon: 85.0 },
                AccuracyWarning::PhonBelow20 { phon: 10.0 },
            ]
        );
        // Zero is the threshold curve, not a low level.
        assert!(check(&[0.0, 20.0], None).is_empty());
    }

    #[test]
    fn band_warnings_need_supplied_frequencies() {
        assert_eq!(check(&[95.0], None), vec![AccuracyWarning::PhonAbove80 { phon: 95.0 }]);

        let w = check(&[95.0], Some(&[1000.0, 6000.0]));
        assert!(w.contains(&AccuracyWarning::OutsideLowBandAbove90 {
            frequency: 6000.0,
            phon: 95.0
        }));
        assert!(w.contains(&AccuracyWarning::OutsideHighBandAbove80 {
            frequency: 1000.0,
            phon: 95.0
        }));
    }

    #[test]
    fn extrapolation_warning_is_independent_of_level() {
        let w = check(&[40.0], Some(&[1000.0, 16_000.0, 18_000.0]));
        assert_eq!(w, vec![AccuracyWarning::Extrapolated { frequency: 16_000.0 }]);
    }
}

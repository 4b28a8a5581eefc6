use serde::{Deserialize, Serialize};

use crate::contour::{AccuracyWarning, ContourEngine, ContourRequest, Grid};
use crate::error::Result;

// ---------------------------------------------------------------------------
// Calibration
// ---------------------------------------------------------------------------

/// One measured point tying a playback gain to the SPL it produces.
///
/// The defaults describe a headphone setup where a gain of 0.34 at a 0.1 V RMS reference
/// level measured 111.8 dB SPL.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalibrationPoint {
    /// Reference RMS voltage the gain was measured against.
    pub reference_rms: f64,
    /// Gain applied at the reference level.
    pub gain: f64,
    /// SPL (dB) measured at that gain.
    pub spl_at_gain: f64,
}

impl Default for CalibrationPoint {
    fn default() -> Self {
        Self {
            reference_rms: 0.1,
            gain: 0.34,
            spl_at_gain: 111.8,
        }
    }
}

// ---------------------------------------------------------------------------
// VolumeMapper
// ---------------------------------------------------------------------------

/// Converts SPL values to linear playback volumes.
///
/// Results are not clamped: they may exceed 1.0 or approach zero, and the caller decides what
/// range is safe to play.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct VolumeMapper {
    pub calibration: CalibrationPoint,
}

impl VolumeMapper {
    pub fn new(calibration: CalibrationPoint) -> Self {
        Self { calibration }
    }

    /// Linear volume that produces `spl` dB under this calibration.
    pub fn spl_to_volume(&self, spl: f64) -> f64 {
        let c = &self.calibration;
        (c.gain / c.reference_rms) * 10f64.powf(-c.spl_at_gain / 20.0) * 10f64.powf(spl / 20.0)
    }

    /// Elementwise [`spl_to_volume`](Self::spl_to_volume) over a grid.
    pub fn map_grid(&self, spl: &Grid) -> Grid {
        spl.map(|v| self.spl_to_volume(v))
    }
}

// ---------------------------------------------------------------------------
// Loudness normalization
// ---------------------------------------------------------------------------

/// Playback volumes that make every queried frequency equally loud.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedLoudness {
    /// Volume per (frequency, phon) cell.
    pub volumes: Grid,
    /// Frequency of each cell.
    pub frequencies: Grid,
    /// SPL the volumes were derived from.
    pub spl: Grid,
    pub warnings: Vec<AccuracyWarning>,
}

/// Evaluate the contour for `request` and map it to calibrated volumes.
pub fn normalize_loudness(
    engine: &ContourEngine,
    request: &ContourRequest,
    calibration: CalibrationPoint,
) -> Result<NormalizedLoudness> {
    let contour = engine.evaluate(request)?;
    let volumes = VolumeMapper::new(calibration).map_grid(&contour.spl);
    Ok(NormalizedLoudness {
        volumes,
        frequencies: contour.frequencies,
        spl: contour.spl,
        warnings: contour.warnings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contour::Edition;

    const TOLERANCE: f64 = 1e-12;

    #[test]
    fn calibration_spl_maps_to_gain_over_reference() {
        let mapper = VolumeMapper::default();
        let v = mapper.spl_to_volume(111.8);
        assert!((v - 3.4).abs() < TOLERANCE, "got {v}");
    }

    #[test]
    fn twenty_db_is_a_factor_of_ten() {
        let mapper = VolumeMapper::default();
        let ratio = mapper.spl_to_volume(80.0) / mapper.spl_to_volume(60.0);
        assert!((ratio - 10.0).abs() < 1e-9);
    }

    #[test]
    fn custom_calibration() {
        let mapper = VolumeMapper::new(CalibrationPoint {
            reference_rms: 1.0,
            gain: 0.5,
            spl_at_gain: 90.0,
        });
        assert!((mapper.spl_to_volume(90.0) - 0.5).abs() < TOLERANCE);
        assert!((mapper.spl_to_volume(70.0) - 0.05).abs() < TOLERANCE);
    }

    #[test]
    fn normalized_volumes_follow_the_contour() {
        let engine = ContourEngine::for_edition(Edition::Iso2023).unwrap();
        let request = ContourRequest::new([60.0]).at_frequencies([50.0, 1000.0]);
        let n = normalize_loudness(&engine, &request, CalibrationPoint::default()).unwrap();

        assert_eq!(n.volumes.shape(), (2, 1));
        assert_eq!(n.frequencies.column(0).unwrap(), vec![50.0, 1000.0]);
        // Bass needs more pressure to sound equally loud.
        assert!(n.volumes.get(0, 0).unwrap() > n.volumes.get(1, 0).unwrap());
    }
}

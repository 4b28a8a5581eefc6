use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::contour::Edition;
use crate::volume::CalibrationPoint;

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

/// User settings, read from a JSON file.  Missing fields keep their defaults.
///
/// ```json
/// {
///   "edition": "iso2023",
///   "mirror_index": 0,
///   "phon": 60.0,
///   "squeeze": false,
///   "calibration": { "reference_rms": 0.1, "gain": 0.34, "spl_at_gain": 111.8 }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Which published coefficient table to use.
    pub edition: Edition,
    /// Table row reused as the 20 kHz anchor when extrapolating.
    pub mirror_index: usize,
    /// Loudness level used when none is given on the command line.
    pub phon: f64,
    /// Drop singleton axes from printed results.
    pub squeeze: bool,
    pub calibration: CalibrationPoint,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            edition: Edition::default(),
            mirror_index: 0,
            phon: 60.0,
            squeeze: false,
            calibration: CalibrationPoint::default(),
        }
    }
}

impl Settings {
    /// Load settings from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading settings file {}", path.display()))?;
        Self::from_json(&text).with_context(|| format!("in {}", path.display()))
    }

    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).context("parsing settings JSON")
    }

    /// Settings from `path` if given, defaults otherwise.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::load(p),
            None => Ok(Self::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_gives_defaults() {
        assert_eq!(Settings::from_json("{}").unwrap(), Settings::default());
    }

    #[test]
    fn partial_settings_override_only_given_fields() {
        let s = Settings::from_json(
            r#"{ "edition": "iso2003", "calibration": { "gain": 0.5 } }"#,
        )
        .unwrap();
        assert_eq!(s.edition, Edition::Iso2003);
        assert_eq!(s.mirror_index, 0);
        assert_eq!(s.calibration.gain, 0.5);
        assert_eq!(s.calibration.spl_at_gain, 111.8);
    }

    #[test]
    fn unknown_fields_are_rejected() {
        assert!(Settings::from_json(r#"{ "mirror": 3 }"#).is_err());
    }
}

use crate::config::Settings;
use crate::contour::{AccuracyWarning, ContourEngine, ContourRequest};
use crate::data::model::{LevelRow, ToneSet};
use crate::error::Result;
use crate::volume::{CalibrationPoint, VolumeMapper};

// ---------------------------------------------------------------------------
// Per-tone result
// ---------------------------------------------------------------------------

/// Playback volume for one tone at the session's loudness level.
#[derive(Debug, Clone, PartialEq)]
pub struct ToneVolume {
    pub name: String,
    pub frequency: f64,
    pub spl_db: f64,
    /// Unclamped linear volume; the player decides the safe range.
    pub volume: f64,
}

// ---------------------------------------------------------------------------
// Session state
// ---------------------------------------------------------------------------

/// Everything a tone-playing front end needs, independent of rendering and audio output.
///
/// Volumes are recomputed whenever the tones, the target loudness or the calibration change.
pub struct Session {
    engine: ContourEngine,

    pub mapper: VolumeMapper,

    /// Mirror row for tones above 12.5 kHz.
    pub mirror_index: usize,

    /// Target loudness level in phon.
    pub phon: f64,

    /// Loaded tones (None until the front end supplies some).
    pub tones: Option<ToneSet>,

    /// One entry per tone, in tone order (cached).
    pub volumes: Vec<ToneVolume>,

    /// Accuracy warnings from the last evaluation.
    pub warnings: Vec<AccuracyWarning>,

    /// Status / error message for the front end.
    pub status_message: Option<String>,
}

impl Session {
    pub fn new(settings: &Settings) -> Result<Self> {
        Ok(Self {
            engine: ContourEngine::for_edition(settings.edition)?,
            mapper: VolumeMapper::new(settings.calibration),
            mirror_index: settings.mirror_index,
            phon: settings.phon,
            tones: None,
            volumes: Vec::new(),
            warnings: Vec::new(),
            status_message: None,
        })
    }

    /// Ingest a newly loaded tone set and compute its volumes.
    pub fn set_tones(&mut self, tones: ToneSet) {
        self.tones = Some(tones);
        self.recompute();
    }

    pub fn set_phon(&mut self, phon: f64) {
        self.phon = phon;
        self.recompute();
    }

    pub fn set_calibration(&mut self, calibration: CalibrationPoint) {
        self.mapper = VolumeMapper::new(calibration);
        self.recompute();
    }

    /// Volume for the tone called `name`, if computed.
    pub fn volume_for(&self, name: &str) -> Option<f64> {
        self.volumes
            .iter()
            .find(|v| v.name == name)
            .map(|v| v.volume)
    }

    /// Export rows for the current volumes.
    pub fn rows(&self) -> Vec<LevelRow> {
        self.volumes
            .iter()
            .map(|v| LevelRow {
                name: Some(v.name.clone()),
                frequency_hz: v.frequency,
                phon: self.phon,
                spl_db: v.spl_db,
                volume: Some(v.volume),
            })
            .collect()
    }

    /// Recompute `volumes` after an input change.  Failures clear the volumes and set the
    /// status message.
    pub fn recompute(&mut self) {
        self.volumes.clear();
        self.warnings.clear();
        self.status_message = None;

        let Some(tones) = &self.tones else {
            return;
        };
        let request = ContourRequest::new([self.phon])
            .at_frequencies(tones.frequencies())
            .mirror(self.mirror_index);

        match self.engine.evaluate(&request) {
            Ok(contour) => {
                self.volumes = tones
                    .tones
                    .iter()
                    .zip(contour.spl.column(0).unwrap_or_default())
                    .map(|(tone, spl_db)| ToneVolume {
                        name: tone.name.clone(),
                        frequency: tone.frequency,
                        spl_db,
                        volume: self.mapper.spl_to_volume(spl_db),
                    })
                    .collect();
                self.warnings = contour.warnings;
            }
            Err(e) => {
                log::error!("volume computation failed: {e}");
                self.status_message = Some(e.to_string());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::Tone;

    fn tones() -> ToneSet {
        ToneSet::from_tones(vec![
            Tone::new("bass", 63.0),
            Tone::new("mid", 1000.0),
            Tone::new("air", 16_000.0),
        ])
    }

    #[test]
    fn empty_session_has_no_volumes() {
        let s = Session::new(&Settings::default()).unwrap();
        assert!(s.volumes.is_empty());
        assert!(s.status_message.is_none());
    }

    #[test]
    fn loading_tones_computes_one_volume_each() {
        let mut s = Session::new(&Settings::default()).unwrap();
        s.set_tones(tones());

        assert_eq!(s.volumes.len(), 3);
        assert!(s.volume_for("bass").unwrap() > s.volume_for("mid").unwrap());
        assert!(s
            .warnings
            .iter()
            .any(|w| matches!(w, AccuracyWarning::Extrapolated { .. })));
        assert_eq!(s.rows()[1].name.as_deref(), Some("mid"));
    }

    #[test]
    fn louder_target_raises_every_volume() {
        let mut s = Session::new(&Settings::default()).unwrap();
        s.set_tones(tones());
        let quiet: Vec<f64> = s.volumes.iter().map(|v| v.volume).collect();
        s.set_phon(s.phon + 10.0);
        for (v, q) in s.volumes.iter().zip(quiet) {
            assert!(v.volume > q, "{} did not get louder", v.name);
        }
    }

    #[test]
    fn negative_frequency_sets_status() {
        let mut s = Session::new(&Settings::default()).unwrap();
        s.set_tones(ToneSet::from_tones(vec![Tone::new("bad", -1.0)]));
        assert!(s.volumes.is_empty());
        assert!(s.status_message.unwrap().contains("Invalid frequency"));
    }
}

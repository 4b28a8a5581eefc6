//! ISO 226 equal-loudness contours and calibrated playback volumes.
//!
//! The [`contour::ContourEngine`] turns the standard's 29-point reference table into SPL values
//! at any frequency and loudness level, interpolating the model coefficients with cubic splines
//! and extrapolating above 12.5 kHz against a mirrored 20 kHz anchor.  [`volume::VolumeMapper`]
//! converts those levels into linear playback volumes from a single calibration measurement.
//!
//! ```no_run
//! use equal_loudness::contour::{ContourEngine, ContourRequest, Edition};
//! use equal_loudness::volume::{normalize_loudness, CalibrationPoint};
//!
//! let engine = ContourEngine::for_edition(Edition::Iso2023)?;
//! let request = ContourRequest::new([60.0]).at_frequencies([125.0, 1000.0, 8000.0]);
//! let levels = normalize_loudness(&engine, &request, CalibrationPoint::default())?;
//! for w in &levels.warnings {
//!     eprintln!("{w}");
//! }
//! # Ok::<(), equal_loudness::error::ContourError>(())
//! ```

pub mod config;
pub mod contour;
pub mod data;
pub mod error;
pub mod session;
pub mod volume;

pub use contour::{Contour, ContourEngine, ContourRequest, Edition};
pub use error::{ContourError, Result};
pub use volume::{CalibrationPoint, VolumeMapper};

//! Contour layer: reference table, interpolation and SPL evaluation.
//!
//! Architecture:
//! ```text
//!   ReferenceTable (ISO 226:2003 / :2023)
//!        │
//!        ▼
//!   ┌──────────┐
//!   │  spline   │  not-a-knot cubic per column (alpha, L_U, T_f)
//!   └──────────┘
//!        │          above 12.5 kHz: table + mirrored 20 kHz anchor
//!        ▼
//!   ┌──────────┐
//!   │  engine   │  validate → warn → coefficients → SPL formula
//!   └──────────┘
//!        │
//!        ▼
//!   Contour { axis, spl: Grid, frequencies: Grid, warnings }
//! ```

pub mod engine;
pub mod grid;
pub mod spline;
pub mod table;
pub mod warning;

pub use engine::{spl_at, Contour, ContourEngine, ContourRequest};
pub use grid::{Grid, Squeezed};
pub use table::{Coefficients, Column, Edition, ReferenceTable, MIRROR_ANCHOR_HZ};
pub use warning::AccuracyWarning;

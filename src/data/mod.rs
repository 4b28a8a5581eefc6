//! Data layer: tone sets in, level tables out.
//!
//! Architecture:
//! ```text
//!  .parquet / .json / .csv
//!        │
//!        ▼
//!   ┌──────────┐
//!   │  loader   │  parse file → ToneSet
//!   └──────────┘
//!        │
//!        ▼
//!   ┌──────────┐
//!   │ ToneSet   │  Vec<Tone>, metadata columns
//!   └──────────┘
//!        │          (contour engine + volume mapper)
//!        ▼
//!   ┌──────────┐
//!   │  writer   │  Vec<LevelRow> → .parquet / .json / .csv
//!   └──────────┘
//! ```

pub mod loader;
pub mod model;
pub mod writer;

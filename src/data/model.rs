use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::Serialize;

// ---------------------------------------------------------------------------
// MetadataValue – a single cell in a metadata column
// ---------------------------------------------------------------------------

/// A dynamically-typed value from a tone file column other than `name` / `frequency`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MetadataValue {
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    Null,
}

impl fmt::Display for MetadataValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetadataValue::String(s) => write!(f, "{s}"),
            MetadataValue::Integer(i) => write!(f, "{i}"),
            MetadataValue::Float(v) => write!(f, "{v:.4}"),
            MetadataValue::Bool(b) => write!(f, "{b}"),
            MetadataValue::Null => write!(f, "<null>"),
        }
    }
}

// ---------------------------------------------------------------------------
// Tone – one row of a tone file
// ---------------------------------------------------------------------------

/// A pure tone to be played at an equal-loudness volume.
#[derive(Debug, Clone, PartialEq)]
pub struct Tone {
    pub name: String,
    /// Tone frequency in Hz.
    pub frequency: f64,
    /// Remaining columns: column_name → value.
    pub metadata: BTreeMap<String, MetadataValue>,
}

impl Tone {
    pub fn new(name: impl Into<String>, frequency: f64) -> Self {
        Self {
            name: name.into(),
            frequency,
            metadata: BTreeMap::new(),
        }
    }

    /// Name used when a file has no `name` column.
    pub fn default_name(row: usize) -> String {
        format!("tone_{row}")
    }
}

// ---------------------------------------------------------------------------
// ToneSet – a loaded tone file
// ---------------------------------------------------------------------------

/// All tones of a file, in file order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToneSet {
    pub tones: Vec<Tone>,
    /// Sorted metadata column names across all tones.
    pub column_names: Vec<String>,
}

impl ToneSet {
    pub fn from_tones(tones: Vec<Tone>) -> Self {
        let column_names: BTreeSet<String> = tones
            .iter()
            .flat_map(|t| t.metadata.keys().cloned())
            .collect();
        ToneSet {
            tones,
            column_names: column_names.into_iter().collect(),
        }
    }

    /// Frequencies in file order, ready for a contour request.
    pub fn frequencies(&self) -> Vec<f64> {
        self.tones.iter().map(|t| t.frequency).collect()
    }

    pub fn len(&self) -> usize {
        self.tones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tones.is_empty()
    }
}

// ---------------------------------------------------------------------------
// LevelRow – one exported (frequency, phon) cell
// ---------------------------------------------------------------------------

/// Long-format export row.  `name` and `volume` are empty for plain contour tables.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LevelRow {
    pub name: Option<String>,
    pub frequency_hz: f64,
    pub phon: f64,
    pub spl_db: f64,
    pub volume: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tone_set_collects_metadata_columns() {
        let mut a = Tone::new("a", 100.0);
        a.metadata.insert("level".into(), MetadataValue::Integer(3));
        let mut b = Tone::new("b", 200.0);
        b.metadata.insert("file".into(), MetadataValue::String("b.wav".into()));
        b.metadata.insert("level".into(), MetadataValue::Null);

        let set = ToneSet::from_tones(vec![a, b]);
        assert_eq!(set.column_names, vec!["file".to_string(), "level".to_string()]);
        assert_eq!(set.frequencies(), vec![100.0, 200.0]);
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn metadata_display() {
        assert_eq!(MetadataValue::Float(1.5).to_string(), "1.5000");
        assert_eq!(MetadataValue::Null.to_string(), "<null>");
        assert_eq!(MetadataValue::Integer(4).to_string(), "4");
    }
}

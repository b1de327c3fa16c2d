use std::fmt;

use serde::{Deserialize, Serialize};
use xxhash_rust::xxh32::Xxh32;

/// Producer name written into `Metadata::software` unless overridden.
pub const DEFAULT_SOFTWARE: &str = "colour-specio";

/// Test colours whose every value lies this close to an integer may be
/// stored in the integer field.
pub const INTEGER_TOLERANCE: f64 = 1e-8;

// ---------------------------------------------------------------------------
// SpectralDistribution / SpdMeasurement
// ---------------------------------------------------------------------------

/// A sampled spectral power distribution.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SpectralDistribution {
    /// Sample positions in nanometres, ascending.
    pub wavelengths: Vec<f64>,
    /// Spectral power at each wavelength – same length as `wavelengths`.
    pub values: Vec<f64>,
}

impl SpectralDistribution {
    pub fn new(wavelengths: Vec<f64>, values: Vec<f64>) -> Self {
        Self {
            wavelengths,
            values,
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterate `(wavelength, value)` pairs.
    pub fn samples(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.wavelengths
            .iter()
            .copied()
            .zip(self.values.iter().copied())
    }
}

/// One measurement: the raw spectrum and the quantities derived from it.
///
/// The derived fields are stored as-is in files; they are only recomputed
/// on request (see `colorimetry::Colorimeter`).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SpdMeasurement {
    pub spd: SpectralDistribution,
    /// Integration time in seconds.
    pub exposure: f64,
    /// Absolute tristimulus values (cd/m² scale for `Y`).
    pub xyz: [f64; 3],
    /// CIE 1931 chromaticity.
    pub xy: [f64; 2],
    /// Correlated colour temperature in kelvin.
    pub cct: f64,
    pub duv: f64,
    /// Radiometric power, integral of `spd`.
    pub power: f64,
    pub spectrometer_id: String,
}

// ---------------------------------------------------------------------------
// Metadata
// ---------------------------------------------------------------------------

/// Descriptive strings about how a set of measurements was taken.
///
/// On the wire an empty string and a missing value are the same thing:
/// after a save/load round trip, `None` comes back as `Some("")`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Metadata {
    pub notes: Option<String>,
    pub author: Option<String>,
    pub location: Option<String>,
    pub software: Option<String>,
}

impl Default for Metadata {
    fn default() -> Self {
        Self {
            notes: None,
            author: None,
            location: None,
            software: Some(DEFAULT_SOFTWARE.to_string()),
        }
    }
}

// ---------------------------------------------------------------------------
// TestColors
// ---------------------------------------------------------------------------

/// Which wire field a test-colour row lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorMode {
    Int,
    Float,
}

/// One stimulus, e.g. `[255, 0, 0]` or `[1.0, 0.0, 0.0]`.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum ColorRow {
    Int(Vec<i64>),
    Float(Vec<f64>),
}

impl ColorRow {
    pub fn mode(&self) -> ColorMode {
        match self {
            ColorRow::Int(_) => ColorMode::Int,
            ColorRow::Float(_) => ColorMode::Float,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            ColorRow::Int(v) => v.len(),
            ColorRow::Float(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Channel values as floats, whatever the stored representation.
    pub fn to_f64(&self) -> Vec<f64> {
        match self {
            ColorRow::Int(v) => v.iter().map(|&c| c as f64).collect(),
            ColorRow::Float(v) => v.clone(),
        }
    }
}

/// Rows compare by numeric value: `Int([1, 2])` equals `Float([1.0, 2.0])`.
impl PartialEq for ColorRow {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (ColorRow::Int(a), ColorRow::Int(b)) => a == b,
            _ => self.to_f64() == other.to_f64(),
        }
    }
}

/// The stimulus matrix, one row per test colour.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct TestColors {
    rows: Vec<ColorRow>,
}

impl TestColors {
    pub fn from_rows(rows: Vec<ColorRow>) -> Self {
        Self { rows }
    }

    pub fn from_float_rows(rows: Vec<Vec<f64>>) -> Self {
        Self {
            rows: rows.into_iter().map(ColorRow::Float).collect(),
        }
    }

    pub fn from_int_rows(rows: Vec<Vec<i64>>) -> Self {
        Self {
            rows: rows.into_iter().map(ColorRow::Int).collect(),
        }
    }

    pub fn rows(&self) -> &[ColorRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// All values as float rows.
    pub fn to_f64_rows(&self) -> Vec<Vec<f64>> {
        self.rows.iter().map(ColorRow::to_f64).collect()
    }

    /// Decide how the whole matrix is written.
    ///
    /// `Int` only when every value is within [`INTEGER_TOLERANCE`] of an
    /// integer that fits in `i64` and the matrix spans a range greater than
    /// one; otherwise `Float`. Normalised 0–1 stimuli therefore always stay
    /// floats.
    pub fn wire_mode(&self) -> ColorMode {
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        let mut integral = true;
        let mut any = false;

        for value in self.rows.iter().flat_map(ColorRow::to_f64) {
            any = true;
            let representable = value.abs() < i64::MAX as f64;
            if !(representable && (value - value.round()).abs() < INTEGER_TOLERANCE) {
                integral = false;
                break;
            }
            min = min.min(value);
            max = max.max(value);
        }

        if any && integral && max - min > 1.0 {
            ColorMode::Int
        } else {
            ColorMode::Float
        }
    }
}

// ---------------------------------------------------------------------------
// MeasurementCollection
// ---------------------------------------------------------------------------

/// Everything stored in one `.csmf` file.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MeasurementCollection {
    pub test_colors: TestColors,
    /// Presentation order as indices.
    pub order: Vec<i64>,
    pub measurements: Vec<SpdMeasurement>,
    pub metadata: Metadata,
}

impl MeasurementCollection {
    pub fn new(
        test_colors: TestColors,
        order: Vec<i64>,
        measurements: Vec<SpdMeasurement>,
        metadata: Metadata,
    ) -> Self {
        Self {
            test_colors,
            order,
            measurements,
            metadata,
        }
    }

    /// Human label for the collection: `metadata.notes` when set, otherwise
    /// a hex digest of the spectral data. Always recomputed.
    pub fn shortname(&self) -> String {
        match self.metadata.notes.as_deref() {
            Some(notes) if !notes.is_empty() => notes.to_string(),
            _ => format!("{:08x}", self.spectral_hash()),
        }
    }

    /// xxHash32 over the little-endian `f64` bytes of every sample value,
    /// measurement after measurement.
    pub fn spectral_hash(&self) -> u32 {
        let mut hasher = Xxh32::new(0);
        for measurement in &self.measurements {
            for value in &measurement.spd.values {
                hasher.update(&value.to_le_bytes());
            }
        }
        hasher.digest()
    }
}

impl fmt::Display for MeasurementCollection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Measurement List - {}", self.shortname())
    }
}

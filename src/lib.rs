//! Colour-specio measurement files (`.csmf`).
//!
//! A `.csmf` file holds one [`MeasurementCollection`]: spectral
//! measurements, the test colours that produced them, their presentation
//! order and a few metadata strings, serialized as a single protobuf
//! message.

pub mod colorimetry;
pub mod data;
pub mod error;

pub use colorimetry::{Cie1931, Colorimeter};
pub use data::file::{load, load_with, resolve_path, save};
pub use data::model::{
    ColorMode, ColorRow, MeasurementCollection, Metadata, SpdMeasurement, SpectralDistribution,
    TestColors,
};
pub use error::{CsmfError, Result};

//! Wire messages for the `.csmf` format.
//!
//! The layout is fixed by the external schema; field tags must not change.
//! Proto3 semantics apply: empty strings and empty repeated fields are not
//! written, and missing fields decode to their defaults.

/// A sampled spectrum.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct SpectralDistribution {
    /// Sample positions in nanometres.
    #[prost(double, repeated, tag = "1")]
    pub wavelengths: Vec<f64>,
    #[prost(double, repeated, tag = "2")]
    pub values: Vec<f64>,
}

/// One spectral measurement plus its precomputed derived quantities.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct SpdMeasurement {
    #[prost(message, optional, tag = "1")]
    pub spd: Option<SpectralDistribution>,
    #[prost(double, tag = "2")]
    pub exposure: f64,
    #[prost(double, repeated, tag = "3")]
    pub xyz: Vec<f64>,
    #[prost(double, repeated, tag = "4")]
    pub xy: Vec<f64>,
    #[prost(double, tag = "5")]
    pub cct: f64,
    #[prost(double, tag = "6")]
    pub duv: f64,
    #[prost(double, tag = "7")]
    pub power: f64,
    #[prost(string, tag = "8")]
    pub spectrometer_id: String,
}

/// One stimulus row. At most one of `c` / `f` is populated.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct TestColor {
    #[prost(int64, repeated, tag = "1")]
    pub c: Vec<i64>,
    #[prost(double, repeated, tag = "2")]
    pub f: Vec<f64>,
}

/// Top-level message: one file, one collection.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct CsmfFile {
    #[prost(message, repeated, tag = "1")]
    pub spd_measurements: Vec<SpdMeasurement>,
    #[prost(string, tag = "2")]
    pub notes: String,
    #[prost(string, tag = "3")]
    pub author: String,
    #[prost(string, tag = "4")]
    pub location: String,
    #[prost(string, tag = "5")]
    pub software: String,
    #[prost(int64, repeated, tag = "6")]
    pub order: Vec<i64>,
    #[prost(message, repeated, tag = "7")]
    pub test_colors: Vec<TestColor>,
}

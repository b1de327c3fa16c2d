/// Data layer: in-memory model, wire codec, and file I/O.
///
/// Architecture:
/// ```text
///   MeasurementCollection
///        │
///        ▼
///   ┌────────────┐   per element   ┌─────────────┐
///   │ collection  │ ──────────────▶ │ measurement  │
///   └────────────┘                 └─────────────┘
///        │  proto::CsmfFile
///        ▼
///   ┌──────────┐
///   │   file    │  <stem>.csmf on disk
///   └──────────┘
///
///   .parquet / .json / .csv ──▶ import ──▶ MeasurementCollection ──▶ export ──▶ .csv
/// ```

pub mod collection;
pub mod export;
pub mod file;
pub mod import;
pub mod measurement;
pub mod model;
pub mod proto;

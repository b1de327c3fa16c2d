//! Collection codec: `MeasurementCollection` <-> `proto::CsmfFile` bytes.

use log::debug;
use prost::Message;

use super::measurement;
use super::model::{ColorMode, ColorRow, MeasurementCollection, Metadata, TestColors};
use super::proto;
use crate::colorimetry::{Cie1931, Colorimeter};
use crate::error::{CsmfError, Result};

/// Build the wire message for a collection. The collection is not modified.
pub fn to_proto(collection: &MeasurementCollection) -> proto::CsmfFile {
    let mode = collection.test_colors.wire_mode();
    debug!(
        "encoding {} measurements, {} test colours as {:?}",
        collection.measurements.len(),
        collection.test_colors.len(),
        mode
    );

    let meta = &collection.metadata;
    proto::CsmfFile {
        spd_measurements: collection
            .measurements
            .iter()
            .map(measurement::to_proto)
            .collect(),
        notes: present(&meta.notes),
        author: present(&meta.author),
        location: present(&meta.location),
        software: present(&meta.software),
        order: collection.order.clone(),
        test_colors: collection
            .test_colors
            .rows()
            .iter()
            .map(|row| encode_row(row, mode))
            .collect(),
    }
}

/// Serialize a collection to the bytes of one `.csmf` file.
pub fn encode(collection: &MeasurementCollection) -> Vec<u8> {
    to_proto(collection).encode_to_vec()
}

/// Parse `.csmf` bytes, recomputing derived values with the default
/// observer when `recompute` is set.
pub fn decode(bytes: &[u8], recompute: bool) -> Result<MeasurementCollection> {
    decode_with(bytes, recompute, &Cie1931::default())
}

pub fn decode_with(
    bytes: &[u8],
    recompute: bool,
    colorimeter: &dyn Colorimeter,
) -> Result<MeasurementCollection> {
    let file = proto::CsmfFile::decode(bytes).map_err(CsmfError::MalformedFile)?;
    from_proto(file, recompute, colorimeter)
}

/// Rebuild a collection from an already-parsed message.
///
/// Absent metadata strings come back as `Some("")`. Rows are taken as they
/// are found; a file mixing `c` and `f` rows is accepted.
pub fn from_proto(
    file: proto::CsmfFile,
    recompute: bool,
    colorimeter: &dyn Colorimeter,
) -> Result<MeasurementCollection> {
    let measurements = file
        .spd_measurements
        .into_iter()
        .enumerate()
        .map(|(i, m)| measurement::from_proto(m, i, recompute, colorimeter))
        .collect::<Result<Vec<_>>>()?;

    let rows = file.test_colors.into_iter().map(decode_row).collect();
    let test_colors = TestColors::from_rows(rows);
    debug!(
        "decoded {} measurements, {} test colours",
        measurements.len(),
        test_colors.len()
    );

    Ok(MeasurementCollection {
        test_colors,
        order: file.order,
        measurements,
        metadata: Metadata {
            notes: Some(file.notes),
            author: Some(file.author),
            location: Some(file.location),
            software: Some(file.software),
        },
    })
}

/// Empty and missing strings are both left out of the message.
fn present(field: &Option<String>) -> String {
    field.clone().unwrap_or_default()
}

fn encode_row(row: &ColorRow, mode: ColorMode) -> proto::TestColor {
    match (mode, row) {
        (ColorMode::Int, ColorRow::Int(values)) => proto::TestColor {
            c: values.clone(),
            f: Vec::new(),
        },
        (ColorMode::Int, ColorRow::Float(values)) => proto::TestColor {
            c: values.iter().map(|v| v.round() as i64).collect(),
            f: Vec::new(),
        },
        (ColorMode::Float, row) => proto::TestColor {
            c: Vec::new(),
            f: row.to_f64(),
        },
    }
}

fn decode_row(color: proto::TestColor) -> ColorRow {
    if color.f.is_empty() {
        ColorRow::Int(color.c)
    } else {
        ColorRow::Float(color.f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::{SpdMeasurement, SpectralDistribution};

    fn measurement(seed: f64) -> SpdMeasurement {
        SpdMeasurement {
            spd: SpectralDistribution::new(
                vec![400.0, 450.0, 500.0, 550.0],
                vec![seed, seed * 2.0, seed * 0.5, seed + 1.0],
            ),
            exposure: 0.1 * seed,
            xyz: [seed, seed + 1.0, seed + 2.0],
            xy: [0.3, 0.32],
            cct: 5000.0 + seed,
            duv: 0.001,
            power: 3.0 * seed,
            spectrometer_id: "PR-730".to_string(),
        }
    }

    fn full_metadata() -> Metadata {
        Metadata {
            notes: Some("calibration run".to_string()),
            author: Some("T. Downs".to_string()),
            location: Some("Lab 2".to_string()),
            software: Some("colour-specio".to_string()),
        }
    }

    fn collection(n: usize) -> MeasurementCollection {
        MeasurementCollection {
            test_colors: TestColors::from_float_rows(
                (0..n).map(|i| vec![0.1 * i as f64, 0.5, 0.25]).collect(),
            ),
            order: (0..n as i64).rev().collect(),
            measurements: (0..n).map(|i| measurement(i as f64 + 1.0)).collect(),
            metadata: full_metadata(),
        }
    }

    #[test]
    fn round_trip_preserves_everything() {
        for n in [0, 1, 5] {
            let original = collection(n);
            let decoded = decode(&encode(&original), false).unwrap();
            assert_eq!(decoded, original, "n = {n}");
            assert_eq!(decoded.order, original.order);
        }
    }

    #[test]
    fn encode_does_not_touch_the_source() {
        let original = collection(3);
        let copy = original.clone();
        let _ = encode(&original);
        assert_eq!(original, copy);
    }

    #[test]
    fn integral_float_matrix_collapses_to_int_rows() {
        let mut original = collection(2);
        original.test_colors =
            TestColors::from_float_rows(vec![vec![255.0, 0.0, 0.0], vec![0.0, 128.0, 64.0]]);

        let msg = to_proto(&original);
        assert!(msg.test_colors.iter().all(|tc| tc.f.is_empty() && tc.c.len() == 3));

        let decoded = decode(&encode(&original), false).unwrap();
        assert!(decoded.test_colors.rows().iter().all(|r| r.mode() == ColorMode::Int));
        assert_eq!(decoded.test_colors, original.test_colors);
        assert_eq!(
            decoded.test_colors.to_f64_rows(),
            vec![vec![255.0, 0.0, 0.0], vec![0.0, 128.0, 64.0]]
        );
    }

    #[test]
    fn normalised_stimuli_use_the_float_field() {
        let mut original = collection(2);
        original.test_colors = TestColors::from_int_rows(vec![vec![1, 0, 0], vec![0, 1, 1]]);

        let msg = to_proto(&original);
        assert!(msg.test_colors.iter().all(|tc| tc.c.is_empty() && tc.f.len() == 3));

        let decoded = decode(&encode(&original), false).unwrap();
        assert!(decoded.test_colors.rows().iter().all(|r| r.mode() == ColorMode::Float));
        assert_eq!(decoded.test_colors, original.test_colors);
    }

    #[test]
    fn mode_is_chosen_once_for_the_whole_matrix() {
        let mut original = collection(2);
        original.test_colors = TestColors::from_rows(vec![
            ColorRow::Int(vec![0, 100, 200]),
            ColorRow::Float(vec![0.5, 10.0, 20.0]),
        ]);
        let msg = to_proto(&original);
        assert!(msg.test_colors.iter().all(|tc| tc.c.is_empty()));
    }

    #[test]
    fn whole_numbers_too_large_for_i64_keep_their_value() {
        let mut original = collection(1);
        original.test_colors = TestColors::from_float_rows(vec![vec![0.0, 1e19, -1e20]]);

        let msg = to_proto(&original);
        assert!(msg.test_colors[0].c.is_empty());

        let decoded = decode(&encode(&original), false).unwrap();
        assert_eq!(decoded.test_colors.to_f64_rows(), vec![vec![0.0, 1e19, -1e20]]);
        assert_eq!(decoded.test_colors.rows()[0].mode(), ColorMode::Float);
    }

    #[test]
    fn mixed_rows_in_a_file_are_accepted() {
        let mut msg = to_proto(&collection(2));
        msg.test_colors = vec![
            proto::TestColor {
                c: vec![1, 2, 3],
                f: vec![],
            },
            proto::TestColor {
                c: vec![],
                f: vec![0.5, 0.25, 0.125],
            },
            proto::TestColor::default(),
        ];
        let decoded = decode(&msg.encode_to_vec(), false).unwrap();
        let rows = decoded.test_colors.rows();
        assert_eq!(rows[0], ColorRow::Int(vec![1, 2, 3]));
        assert_eq!(rows[1], ColorRow::Float(vec![0.5, 0.25, 0.125]));
        assert!(rows[2].is_empty());
    }

    #[test]
    fn absent_metadata_comes_back_empty() {
        let mut original = collection(1);
        original.metadata = Metadata {
            notes: None,
            author: Some(String::new()),
            location: None,
            software: None,
        };
        let msg = to_proto(&original);
        assert!(msg.notes.is_empty() && msg.author.is_empty() && msg.software.is_empty());

        let decoded = decode(&encode(&original), false).unwrap();
        assert_eq!(decoded.metadata.notes.as_deref(), Some(""));
        assert_eq!(decoded.metadata.author.as_deref(), Some(""));
        assert_eq!(decoded.metadata.location.as_deref(), Some(""));
        assert_eq!(decoded.metadata.software.as_deref(), Some(""));
        assert_ne!(decoded.metadata, original.metadata);
    }

    #[test]
    fn shortname_survives_round_trip_without_notes() {
        let mut original = collection(3);
        original.metadata.notes = None;
        let decoded = decode(&encode(&original), false).unwrap();
        assert_eq!(decoded.shortname(), original.shortname());
    }

    #[test]
    fn malformed_bytes_are_rejected() {
        for bytes in [&[0x00][..], &[0xff, 0xff, 0xff], &[0x0a, 0x05, 0x01], &[0x0f, 0x01]] {
            let err = decode(bytes, false).unwrap_err();
            assert!(matches!(err, CsmfError::MalformedFile(_)), "{bytes:?}: {err}");
        }
    }

    #[test]
    fn one_bad_measurement_fails_the_whole_decode() {
        let mut msg = to_proto(&collection(3));
        msg.spd_measurements[2].spd = None;
        let err = decode(&msg.encode_to_vec(), false).unwrap_err();
        assert!(matches!(err, CsmfError::MalformedMeasurement { index: 2, .. }));
    }

    #[test]
    fn inconsistent_lengths_pass_through() {
        let mut original = collection(2);
        original.order = vec![4, 3, 2, 1, 0];
        let decoded = decode(&encode(&original), false).unwrap();
        assert_eq!(decoded.order.len(), 5);
        assert_eq!(decoded.measurements.len(), 2);
    }

    #[test]
    fn recompute_rederives_from_samples() {
        let original = collection(2);
        let decoded = decode(&encode(&original), true).unwrap();
        let expected = Cie1931::default().derive(&original.measurements[1].spd);
        assert_eq!(decoded.measurements[1].xyz, expected.xyz);
        assert_eq!(decoded.measurements[1].spd, original.measurements[1].spd);
        assert_ne!(decoded.measurements[1].cct, original.measurements[1].cct);
    }
}

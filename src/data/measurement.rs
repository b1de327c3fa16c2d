//! Single-measurement codec: `SpdMeasurement` <-> `proto::SpdMeasurement`.

use prost::Message;

use super::model::{SpdMeasurement, SpectralDistribution};
use super::proto;
use crate::colorimetry::{Cie1931, Colorimeter};
use crate::error::{CsmfError, Result};

/// Encode one measurement. Total: every in-memory measurement has a wire
/// form.
pub fn to_proto(measurement: &SpdMeasurement) -> proto::SpdMeasurement {
    proto::SpdMeasurement {
        spd: Some(proto::SpectralDistribution {
            wavelengths: measurement.spd.wavelengths.clone(),
            values: measurement.spd.values.clone(),
        }),
        exposure: measurement.exposure,
        xyz: measurement.xyz.to_vec(),
        xy: measurement.xy.to_vec(),
        cct: measurement.cct,
        duv: measurement.duv,
        power: measurement.power,
        spectrometer_id: measurement.spectrometer_id.clone(),
    }
}

/// Decode one measurement.
///
/// With `recompute` the derived fields are recalculated by `colorimeter`
/// from the spectrum; without it the stored values are kept. `index` is
/// only used to label errors.
pub fn from_proto(
    msg: proto::SpdMeasurement,
    index: usize,
    recompute: bool,
    colorimeter: &dyn Colorimeter,
) -> Result<SpdMeasurement> {
    let malformed = |reason: String| CsmfError::MalformedMeasurement { index, reason };

    let spd = msg
        .spd
        .ok_or_else(|| malformed("missing spectral distribution".to_string()))?;
    if spd.wavelengths.len() != spd.values.len() {
        return Err(malformed(format!(
            "{} wavelengths but {} values",
            spd.wavelengths.len(),
            spd.values.len()
        )));
    }

    let mut measurement = SpdMeasurement {
        spd: SpectralDistribution::new(spd.wavelengths, spd.values),
        exposure: msg.exposure,
        spectrometer_id: msg.spectrometer_id,
        ..Default::default()
    };

    if recompute {
        colorimeter.derive(&measurement.spd).apply_to(&mut measurement);
    } else {
        measurement.xyz =
            fixed::<3>(&msg.xyz).map_err(|n| malformed(format!("xyz has {n} components")))?;
        measurement.xy =
            fixed::<2>(&msg.xy).map_err(|n| malformed(format!("xy has {n} components")))?;
        measurement.cct = msg.cct;
        measurement.duv = msg.duv;
        measurement.power = msg.power;
    }

    Ok(measurement)
}

/// Decode a standalone measurement message.
pub fn from_bytes(bytes: &[u8], recompute: bool) -> Result<SpdMeasurement> {
    let msg =
        proto::SpdMeasurement::decode(bytes).map_err(|e| CsmfError::MalformedMeasurement {
            index: 0,
            reason: e.to_string(),
        })?;
    from_proto(msg, 0, recompute, &Cie1931::default())
}

/// Encode a standalone measurement message.
pub fn to_bytes(measurement: &SpdMeasurement) -> Vec<u8> {
    to_proto(measurement).encode_to_vec()
}

/// Empty repeated fields were never written (all-zero values); anything
/// else must have exactly `N` entries.
fn fixed<const N: usize>(values: &[f64]) -> std::result::Result<[f64; N], usize> {
    if values.is_empty() {
        return Ok([0.0; N]);
    }
    values.try_into().map_err(|_| values.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::colorimetry::Derived;

    struct Fixed(Derived);

    impl Colorimeter for Fixed {
        fn derive(&self, _spd: &SpectralDistribution) -> Derived {
            self.0
        }
    }

    fn sample() -> SpdMeasurement {
        SpdMeasurement {
            spd: SpectralDistribution::new(vec![400.0, 500.0, 600.0], vec![0.1, 0.7, 0.3]),
            exposure: 0.2,
            xyz: [10.0, 11.0, 12.0],
            xy: [0.31, 0.33],
            cct: 6400.0,
            duv: 0.002,
            power: 55.0,
            spectrometer_id: "CR-300".to_string(),
        }
    }

    #[test]
    fn stored_values_survive_without_recompute() {
        let decoded = from_bytes(&to_bytes(&sample()), false).unwrap();
        assert_eq!(decoded, sample());
    }

    #[test]
    fn recompute_replaces_derived_fields_only() {
        let derived = Derived {
            xyz: [1.0, 2.0, 3.0],
            xy: [0.2, 0.3],
            cct: 3000.0,
            duv: -0.01,
            power: 9.0,
        };
        let decoded = from_proto(to_proto(&sample()), 0, true, &Fixed(derived)).unwrap();
        assert_eq!(decoded.spd, sample().spd);
        assert_eq!(decoded.exposure, 0.2);
        assert_eq!(decoded.spectrometer_id, "CR-300");
        assert_eq!(decoded.xyz, [1.0, 2.0, 3.0]);
        assert_eq!(decoded.cct, 3000.0);
        assert_eq!(decoded.power, 9.0);
    }

    #[test]
    fn zero_derived_values_decode_as_zero() {
        let m = SpdMeasurement {
            spd: sample().spd,
            ..Default::default()
        };
        let decoded = from_bytes(&to_bytes(&m), false).unwrap();
        assert_eq!(decoded, m);
    }

    #[test]
    fn missing_spd_is_malformed() {
        let mut msg = to_proto(&sample());
        msg.spd = None;
        let err = from_proto(msg, 4, false, &Cie1931::default()).unwrap_err();
        assert!(matches!(err, CsmfError::MalformedMeasurement { index: 4, .. }));
    }

    #[test]
    fn mismatched_sample_lengths_are_malformed() {
        let mut msg = to_proto(&sample());
        if let Some(spd) = msg.spd.as_mut() {
            spd.values.pop();
        }
        let err = from_proto(msg, 1, false, &Cie1931::default()).unwrap_err();
        assert!(matches!(err, CsmfError::MalformedMeasurement { index: 1, .. }));
    }

    #[test]
    fn wrong_tristimulus_arity_is_malformed() {
        let mut msg = to_proto(&sample());
        msg.xyz.push(1.0);
        let err = from_proto(msg, 0, false, &Cie1931::default()).unwrap_err();
        assert!(matches!(err, CsmfError::MalformedMeasurement { .. }));
    }

    #[test]
    fn garbage_bytes_are_malformed() {
        let err = from_bytes(&[0x0a, 0x05, 0x01], false).unwrap_err();
        assert!(matches!(err, CsmfError::MalformedMeasurement { .. }));
    }
}

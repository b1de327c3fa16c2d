use palette::white_point::D65;
use palette::{FromColor, Xyz, Yxy};

use crate::data::model::{SpdMeasurement, SpectralDistribution};

/// Maximum luminous efficacy of radiation, lm/W.
pub const K_M: f64 = 683.0;

// McCamy's cubic and Ohno's Duv polynomial.
const MCCAMY_EPICENTRE: (f64, f64) = (0.3320, 0.1858);
const DUV_CENTRE: (f64, f64) = (0.292, 0.24);
const DUV_COEFFS: [f64; 7] = [
    -0.471106,
    1.925865,
    -2.4243787,
    1.5317403,
    -0.5179722,
    0.0893944,
    -0.00616793,
];

// ---------------------------------------------------------------------------
// Derived quantities
// ---------------------------------------------------------------------------

/// Quantities computed from a spectrum.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Derived {
    pub xyz: [f64; 3],
    pub xy: [f64; 2],
    pub cct: f64,
    pub duv: f64,
    pub power: f64,
}

impl Derived {
    /// Overwrite the derived fields of `measurement`.
    pub fn apply_to(self, measurement: &mut SpdMeasurement) {
        measurement.xyz = self.xyz;
        measurement.xy = self.xy;
        measurement.cct = self.cct;
        measurement.duv = self.duv;
        measurement.power = self.power;
    }
}

/// Computes colorimetric quantities from raw spectral samples.
///
/// Only invoked when a load asks for `recompute`; otherwise the values
/// stored in the file are trusted.
pub trait Colorimeter {
    fn derive(&self, spd: &SpectralDistribution) -> Derived;
}

// ---------------------------------------------------------------------------
// CIE 1931 2° observer
// ---------------------------------------------------------------------------

/// CIE 1931 standard observer, using the multi-lobe Gaussian fit of
/// Wyman, Sloan & Shirley (2013) for the colour matching functions.
#[derive(Debug, Clone, Copy)]
pub struct Cie1931 {
    /// Scale applied to the tristimulus integrals.
    pub k: f64,
}

impl Default for Cie1931 {
    fn default() -> Self {
        Self { k: K_M }
    }
}

impl Cie1931 {
    /// Build a complete measurement with all derived fields filled in.
    pub fn measure(
        &self,
        spd: SpectralDistribution,
        exposure: f64,
        spectrometer_id: impl Into<String>,
    ) -> SpdMeasurement {
        let mut measurement = SpdMeasurement {
            spd,
            exposure,
            spectrometer_id: spectrometer_id.into(),
            ..Default::default()
        };
        self.derive(&measurement.spd).apply_to(&mut measurement);
        measurement
    }
}

impl Colorimeter for Cie1931 {
    fn derive(&self, spd: &SpectralDistribution) -> Derived {
        let x = self.k * integrate(spd, |wl, v| v * x_bar(wl));
        let y = self.k * integrate(spd, |wl, v| v * y_bar(wl));
        let z = self.k * integrate(spd, |wl, v| v * z_bar(wl));
        let power = integrate(spd, |_, v| v);

        if x + y + z <= 0.0 {
            return Derived {
                xyz: [x, y, z],
                power,
                ..Default::default()
            };
        }

        let yxy = Yxy::<D65, f64>::from_color(Xyz::<D65, f64>::new(x, y, z));
        let xy = [yxy.x, yxy.y];

        Derived {
            xyz: [x, y, z],
            xy,
            cct: mccamy_cct(xy),
            duv: ohno_duv(xy),
            power,
        }
    }
}

/// Trapezoidal integral of `f(wavelength, value)` over the sample grid.
fn integrate(spd: &SpectralDistribution, f: impl Fn(f64, f64) -> f64) -> f64 {
    let points: Vec<(f64, f64)> = spd.samples().map(|(wl, v)| (wl, f(wl, v))).collect();
    points
        .windows(2)
        .map(|w| (w[1].0 - w[0].0) * (w[0].1 + w[1].1) / 2.0)
        .sum()
}

/// Piecewise Gaussian with separate widths either side of the peak.
fn lobe(wl: f64, mu: f64, sigma_lo: f64, sigma_hi: f64) -> f64 {
    let sigma = if wl < mu { sigma_lo } else { sigma_hi };
    let t = (wl - mu) / sigma;
    (-0.5 * t * t).exp()
}

fn x_bar(wl: f64) -> f64 {
    1.056 * lobe(wl, 599.8, 37.9, 31.0) + 0.362 * lobe(wl, 442.0, 16.0, 26.7)
        - 0.065 * lobe(wl, 501.1, 20.4, 26.2)
}

fn y_bar(wl: f64) -> f64 {
    0.821 * lobe(wl, 568.8, 46.9, 40.5) + 0.286 * lobe(wl, 530.9, 16.3, 31.1)
}

fn z_bar(wl: f64) -> f64 {
    1.217 * lobe(wl, 437.0, 11.8, 36.0) + 0.681 * lobe(wl, 459.0, 26.0, 13.8)
}

fn mccamy_cct([x, y]: [f64; 2]) -> f64 {
    let n = (x - MCCAMY_EPICENTRE.0) / (MCCAMY_EPICENTRE.1 - y);
    449.0 * n.powi(3) + 3525.0 * n.powi(2) + 6823.3 * n + 5520.33
}

/// Distance from the Planckian locus in CIE 1960 uv.
fn ohno_duv([x, y]: [f64; 2]) -> f64 {
    let denom = -2.0 * x + 12.0 * y + 3.0;
    let u = 4.0 * x / denom;
    let v = 6.0 * y / denom;

    let du = u - DUV_CENTRE.0;
    let dv = v - DUV_CENTRE.1;
    let l_fp = (du * du + dv * dv).sqrt();
    if l_fp == 0.0 {
        return 0.0;
    }
    let a = (du / l_fp).acos();
    let l_bb = DUV_COEFFS.iter().rev().fold(0.0, |acc, &k| acc * a + k);
    l_fp - l_bb
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat(level: f64) -> SpectralDistribution {
        let wavelengths: Vec<f64> = (0..=80).map(|i| 380.0 + 5.0 * i as f64).collect();
        let values = vec![level; wavelengths.len()];
        SpectralDistribution::new(wavelengths, values)
    }

    #[test]
    fn equal_energy_is_near_the_achromatic_point() {
        let d = Cie1931::default().derive(&flat(1.0));
        assert!((d.xy[0] - 1.0 / 3.0).abs() < 0.005, "x = {}", d.xy[0]);
        assert!((d.xy[1] - 1.0 / 3.0).abs() < 0.005, "y = {}", d.xy[1]);
        assert!((d.cct - 5455.0).abs() < 150.0, "cct = {}", d.cct);
        assert!(d.duv.abs() < 0.01, "duv = {}", d.duv);
    }

    #[test]
    fn luminance_uses_photometric_scale() {
        let d = Cie1931::default().derive(&flat(1.0));
        assert!((d.xyz[1] / K_M - 106.9).abs() < 1.5, "Y = {}", d.xyz[1]);
    }

    #[test]
    fn power_is_the_spectral_integral() {
        let d = Cie1931::default().derive(&flat(2.0));
        assert!((d.power - 800.0).abs() < 1e-9);
    }

    #[test]
    fn dark_spectrum_has_no_chromaticity() {
        let d = Cie1931::default().derive(&flat(0.0));
        assert_eq!(d, Derived::default());
    }

    #[test]
    fn measure_fills_derived_fields() {
        let m = Cie1931::default().measure(flat(1.0), 0.25, "sp-1");
        assert_eq!(m.exposure, 0.25);
        assert_eq!(m.spectrometer_id, "sp-1");
        assert!(m.xyz[1] > 0.0);
        assert!(m.cct > 0.0);
    }

    #[test]
    fn reddish_spectrum_is_warmer_than_bluish() {
        let red = SpectralDistribution::new(
            flat(1.0).wavelengths,
            flat(1.0).wavelengths.iter().map(|wl| (wl - 370.0) / 400.0).collect(),
        );
        let blue = SpectralDistribution::new(
            flat(1.0).wavelengths,
            flat(1.0).wavelengths.iter().map(|wl| (790.0 - wl) / 400.0).collect(),
        );
        let cie = Cie1931::default();
        assert!(cie.derive(&red).cct < cie.derive(&blue).cct);
    }
}

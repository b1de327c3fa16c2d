use anyhow::{Context, Result};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use csmf::{Cie1931, MeasurementCollection, Metadata, SpectralDistribution, TestColors};

/// Primary emitters of a simulated display: (peak nm, width nm).
const PRIMARIES: [(f64, f64); 3] = [(625.0, 12.0), (530.0, 18.0), (460.0, 10.0)];

fn gaussian(x: f64, mu: f64, sigma: f64, amplitude: f64) -> f64 {
    amplitude * (-(x - mu).powi(2) / (2.0 * sigma.powi(2))).exp()
}

/// Box-Muller transform for normal distribution
fn gauss(rng: &mut StdRng, mean: f64, std_dev: f64) -> f64 {
    let u1: f64 = rng.gen::<f64>().max(1e-15);
    let u2: f64 = rng.gen();
    let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
    mean + std_dev * z
}

/// Display output for an 8-bit RGB drive level, with sensor noise.
fn display_spectrum(wavelengths: &[f64], rgb: [i64; 3], rng: &mut StdRng) -> Vec<f64> {
    wavelengths
        .iter()
        .map(|&wl| {
            let signal: f64 = PRIMARIES
                .iter()
                .zip(rgb)
                .map(|(&(mu, sigma), level)| {
                    // 2.2 gamma from drive level to radiance
                    let amplitude = (level as f64 / 255.0).powf(2.2) * 0.01;
                    gaussian(wl, mu, sigma, amplitude)
                })
                .sum();
            (signal + gauss(rng, 0.0, 2e-6)).max(0.0)
        })
        .collect()
}

fn main() -> Result<()> {
    env_logger::init();
    let mut rng = StdRng::seed_from_u64(42);

    // Wavelengths: 380 → 780 nm, step 1
    let wavelengths: Vec<f64> = (0..=400).map(|i| 380.0 + i as f64).collect();

    let levels = [0, 64, 128, 192, 255];
    let mut colors: Vec<Vec<i64>> = Vec::new();
    for &r in &levels {
        for &g in &levels {
            for &b in &levels {
                colors.push(vec![r, g, b]);
            }
        }
    }

    let mut order: Vec<i64> = (0..colors.len() as i64).collect();
    order.shuffle(&mut rng);

    let observer = Cie1931::default();
    let measurements = colors
        .iter()
        .map(|rgb| {
            let values = display_spectrum(&wavelengths, [rgb[0], rgb[1], rgb[2]], &mut rng);
            let spd = SpectralDistribution::new(wavelengths.clone(), values);
            observer.measure(spd, 0.5, "synthetic")
        })
        .collect::<Vec<_>>();

    let collection = MeasurementCollection::new(
        TestColors::from_int_rows(colors),
        order,
        measurements,
        Metadata {
            notes: Some("Synthetic RGB display sweep".to_string()),
            author: Some("generate_sample".to_string()),
            ..Default::default()
        },
    );

    let written = csmf::save("sample_data", &collection).context("writing sample file")?;

    println!(
        "Wrote {} measurements ({} wavelengths each) to {}",
        collection.measurements.len(),
        wavelengths.len(),
        written.display()
    );
    Ok(())
}

use std::io::Write;

use anyhow::{Context, Result};

use super::model::MeasurementCollection;

const HEADER: [&str; 13] = [
    "index",
    "order",
    "test_color",
    "wavelength",
    "value",
    "X",
    "Y",
    "Z",
    "x",
    "y",
    "cct",
    "duv",
    "power",
];

/// Write one CSV row per measurement.
///
/// List cells are semicolon-separated so the file reads back through the
/// CSV importer. `order` and `test_color` are blank past the end of their
/// arrays.
pub fn write_csv<W: Write>(collection: &MeasurementCollection, writer: W) -> Result<()> {
    let mut out = csv::Writer::from_writer(writer);
    out.write_record(HEADER).context("writing CSV header")?;

    for (i, m) in collection.measurements.iter().enumerate() {
        let order = collection
            .order
            .get(i)
            .map(i64::to_string)
            .unwrap_or_default();
        let color = collection
            .test_colors
            .rows()
            .get(i)
            .map(|row| join(&row.to_f64()))
            .unwrap_or_default();

        let record = [
            i.to_string(),
            order,
            color,
            join(&m.spd.wavelengths),
            join(&m.spd.values),
            m.xyz[0].to_string(),
            m.xyz[1].to_string(),
            m.xyz[2].to_string(),
            m.xy[0].to_string(),
            m.xy[1].to_string(),
            m.cct.to_string(),
            m.duv.to_string(),
            m.power.to_string(),
        ];
        out.write_record(&record)
            .with_context(|| format!("writing CSV row {i}"))?;
    }

    out.flush().context("flushing CSV output")?;
    Ok(())
}

fn join(values: &[f64]) -> String {
    values
        .iter()
        .map(f64::to_string)
        .collect::<Vec<_>>()
        .join(";")
}

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use arrow::array::{Array, Float32Array, Float64Array};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::model::{EDGE_TAG, SightlineSet};

/// Column name for the azimuthal angle, degrees.
const ANGLE_COLUMN: &str = "phi";
/// Column name for the impact parameter, kpc.
const RADIUS_COLUMN: &str = "radius";

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load one column-density table.  Dispatch by extension.
///
/// Supported formats:
/// * `.parquet` – flat Float64 columns `phi`, `radius`, `<field>/edge`
/// * `.json`    – `{ "phi": [...], "radius": [...], "<field>": { "edge": [...] } }`
/// * `.csv`     – header `phi,radius,<field>/edge`, one sightline per row
pub fn load_file(path: &Path) -> Result<SightlineSet> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match ext.as_str() {
        "parquet" | "pq" => load_parquet(path),
        "json" => load_json(path),
        "csv" => load_csv(path),
        other => bail!("Unsupported file extension: .{other}"),
    }
}

/// Split a `<field>/edge` column name into the field part.
fn edge_field_name(column: &str) -> Option<&str> {
    column
        .strip_suffix(EDGE_TAG)
        .and_then(|s| s.strip_suffix('/'))
        .filter(|s| !s.is_empty())
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

fn load_json(path: &Path) -> Result<SightlineSet> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    parse_json(&text)
}

/// Expected JSON schema: one object per file, ion fields keyed by name with
/// their projections nested under the `edge` tag:
///
/// ```json
/// {
///   "phi":    [12.0, 47.3, ...],
///   "radius": [88.1, 14.9, ...],
///   "H_number_density": { "edge": [3.1e16, 9.4e14, ...] }
/// }
/// ```
fn parse_json(text: &str) -> Result<SightlineSet> {
    let root: JsonValue = serde_json::from_str(text).context("parsing JSON")?;
    let obj = root.as_object().context("expected top-level JSON object")?;

    let mut angle = None;
    let mut radius = None;
    let mut fields = BTreeMap::new();

    for (key, val) in obj {
        match key.as_str() {
            ANGLE_COLUMN => angle = Some(json_array_to_f64(val, key)?),
            RADIUS_COLUMN => radius = Some(json_array_to_f64(val, key)?),
            _ => {
                let entry = val.as_object().with_context(|| {
                    format!("field '{key}' is not an object keyed by '{EDGE_TAG}'")
                })?;
                let edge = entry.get(EDGE_TAG).with_context(|| {
                    format!("field '{key}' is missing its '{EDGE_TAG}' entry")
                })?;
                fields.insert(key.clone(), json_array_to_f64(edge, key)?);
            }
        }
    }

    let angle = angle.with_context(|| format!("missing '{ANGLE_COLUMN}' array"))?;
    let radius = radius.with_context(|| format!("missing '{RADIUS_COLUMN}' array"))?;
    Ok(SightlineSet::from_parts(angle, radius, fields)?)
}

fn json_array_to_f64(val: &JsonValue, name: &str) -> Result<Vec<f64>> {
    let arr = val
        .as_array()
        .with_context(|| format!("'{name}' is not an array"))?;

    arr.iter()
        .enumerate()
        .map(|(j, v)| {
            v.as_f64()
                .with_context(|| format!("{name}[{j}]: not a number"))
        })
        .collect()
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

fn load_csv(path: &Path) -> Result<SightlineSet> {
    let reader = csv::Reader::from_path(path).context("opening CSV")?;
    parse_csv(reader)
}

fn parse_csv<R: std::io::Read>(mut reader: csv::Reader<R>) -> Result<SightlineSet> {
    let headers: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let angle_idx = headers
        .iter()
        .position(|h| h == ANGLE_COLUMN)
        .with_context(|| format!("CSV missing '{ANGLE_COLUMN}' column"))?;
    let radius_idx = headers
        .iter()
        .position(|h| h == RADIUS_COLUMN)
        .with_context(|| format!("CSV missing '{RADIUS_COLUMN}' column"))?;
    let field_cols: Vec<(usize, String)> = headers
        .iter()
        .enumerate()
        .filter_map(|(i, h)| edge_field_name(h).map(|f| (i, f.to_string())))
        .collect();

    let mut angle = Vec::new();
    let mut radius = Vec::new();
    let mut fields: BTreeMap<String, Vec<f64>> = field_cols
        .iter()
        .map(|(_, name)| (name.clone(), Vec::new()))
        .collect();

    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;
        angle.push(parse_float(record.get(angle_idx), row_no, ANGLE_COLUMN)?);
        radius.push(parse_float(record.get(radius_idx), row_no, RADIUS_COLUMN)?);
        for (idx, name) in &field_cols {
            if let Some(values) = fields.get_mut(name) {
                values.push(parse_float(record.get(*idx), row_no, name)?);
            }
        }
    }

    Ok(SightlineSet::from_parts(angle, radius, fields)?)
}

fn parse_float(cell: Option<&str>, row: usize, col: &str) -> Result<f64> {
    let tok = cell.unwrap_or("");
    tok.trim()
        .parse::<f64>()
        .with_context(|| format!("row {row}, column '{col}': '{tok}' is not a number"))
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet column-density table.
///
/// Expected schema: flat `Float64` (or `Float32`) columns named `phi`,
/// `radius`, and `<field>/edge` per ion field. Columns without the edge tag
/// are ignored.
fn load_parquet(path: &Path) -> Result<SightlineSet> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).context("reading parquet metadata")?;

    let schema = builder.schema().clone();
    if schema.index_of(ANGLE_COLUMN).is_err() {
        bail!("Parquet file missing '{ANGLE_COLUMN}' column");
    }
    if schema.index_of(RADIUS_COLUMN).is_err() {
        bail!("Parquet file missing '{RADIUS_COLUMN}' column");
    }

    let reader = builder.build().context("building parquet reader")?;

    let mut angle = Vec::new();
    let mut radius = Vec::new();
    let mut fields: BTreeMap<String, Vec<f64>> = BTreeMap::new();

    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        for (i, schema_field) in batch.schema().fields().iter().enumerate() {
            let name = schema_field.name().clone();
            let col = batch.column(i);
            if name == ANGLE_COLUMN {
                append_f64_column(col, &mut angle)
                    .with_context(|| format!("column '{name}'"))?;
            } else if name == RADIUS_COLUMN {
                append_f64_column(col, &mut radius)
                    .with_context(|| format!("column '{name}'"))?;
            } else if let Some(field) = edge_field_name(&name) {
                append_f64_column(col, fields.entry(field.to_string()).or_default())
                    .with_context(|| format!("column '{name}'"))?;
            } else {
                log::debug!("ignoring column '{name}' without the '{EDGE_TAG}' tag");
            }
        }
    }

    Ok(SightlineSet::from_parts(angle, radius, fields)?)
}

/// Append a flat Float64/Float32 column; nulls are rejected.
fn append_f64_column(col: &Arc<dyn Array>, out: &mut Vec<f64>) -> Result<()> {
    if col.null_count() > 0 {
        bail!("column contains null values");
    }
    if let Some(arr) = col.as_any().downcast_ref::<Float64Array>() {
        out.extend(arr.values().iter().copied());
    } else if let Some(arr) = col.as_any().downcast_ref::<Float32Array>() {
        out.extend(arr.values().iter().map(|&v| f64::from(v)));
    } else {
        bail!(
            "column type is {:?}, expected Float64 or Float32",
            col.data_type()
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_json_table() {
        let text = r#"{
            "phi": [12.0, 47.5, 81.0],
            "radius": [10.0, 75.0, 140.0],
            "H_number_density": { "edge": [3.0e16, 9.0e14, 2.0e13] }
        }"#;
        let set = parse_json(text).unwrap();
        assert_eq!(set.len(), 3);
        assert_eq!(set.field_names(), vec!["H_number_density".to_string()]);
        assert_eq!(set.field("H_number_density").unwrap()[1], 9.0e14);
    }

    #[test]
    fn parse_json_requires_both_axes() {
        let err = parse_json(r#"{ "phi": [1.0] }"#).unwrap_err();
        assert!(format!("{err:#}").contains("radius"));
    }

    #[test]
    fn parse_json_rejects_untagged_fields() {
        let text = r#"{ "phi": [1.0], "radius": [2.0], "density": [1.0] }"#;
        let err = parse_json(text).unwrap_err();
        assert!(format!("{err:#}").contains(EDGE_TAG));
    }

    #[test]
    fn parse_csv_table() {
        let text = "phi,radius,O_p5_number_density/edge\n15.0,25.0,1.5e14\n75.0,120.0,4.0e13\n";
        let set = parse_csv(csv::Reader::from_reader(text.as_bytes())).unwrap();
        assert_eq!(set.len(), 2);
        assert_eq!(set.angle, vec![15.0, 75.0]);
        assert_eq!(set.field("O_p5_number_density").unwrap()[0], 1.5e14);
    }

    #[test]
    fn parse_csv_reports_bad_cells() {
        let text = "phi,radius\n1.0,not-a-radius\n";
        let err = parse_csv(csv::Reader::from_reader(text.as_bytes())).unwrap_err();
        assert!(format!("{err:#}").contains("not-a-radius"));
    }

    #[test]
    fn edge_tag_parsing() {
        assert_eq!(edge_field_name("H_number_density/edge"), Some("H_number_density"));
        assert_eq!(edge_field_name("radius"), None);
        assert_eq!(edge_field_name("/edge"), None);
        assert_eq!(edge_field_name("edge"), None);
    }
}

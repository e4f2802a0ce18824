use std::collections::BTreeMap;

use thiserror::Error;

/// Fixed tag under which each ion field stores its edge-on projection.
pub const EDGE_TAG: &str = "edge";

/// Inconsistent sightline arrays.
#[derive(Debug, Error, PartialEq)]
pub enum DatasetError {
    #[error("angle and radius arrays differ in length ({angle} vs {radius})")]
    AxisLength { angle: usize, radius: usize },
    #[error("field '{field}' has {values} entries for {sightlines} sightlines")]
    FieldLength {
        field: String,
        sightlines: usize,
        values: usize,
    },
    #[error("field sets differ between files: {ours:?} vs {theirs:?}")]
    FieldMismatch {
        ours: Vec<String>,
        theirs: Vec<String>,
    },
}

// ---------------------------------------------------------------------------
// SightlineSet – the complete loaded dataset
// ---------------------------------------------------------------------------

/// All sightlines of one or more snapshots.
///
/// Three parallel representations per sightline index: azimuthal angle
/// (degrees from the projected spin axis), impact radius (kpc), and one
/// column-density array per named ion field. Every array has the same length.
#[derive(Debug, Clone, Default)]
pub struct SightlineSet {
    pub angle: Vec<f64>,
    pub radius: Vec<f64>,
    pub fields: BTreeMap<String, Vec<f64>>,
}

impl SightlineSet {
    /// Build a set, checking that every array covers the same sightlines.
    pub fn from_parts(
        angle: Vec<f64>,
        radius: Vec<f64>,
        fields: BTreeMap<String, Vec<f64>>,
    ) -> Result<Self, DatasetError> {
        if angle.len() != radius.len() {
            return Err(DatasetError::AxisLength {
                angle: angle.len(),
                radius: radius.len(),
            });
        }
        for (name, values) in &fields {
            if values.len() != angle.len() {
                return Err(DatasetError::FieldLength {
                    field: name.clone(),
                    sightlines: angle.len(),
                    values: values.len(),
                });
            }
        }
        Ok(SightlineSet {
            angle,
            radius,
            fields,
        })
    }

    /// Number of sightlines.
    pub fn len(&self) -> usize {
        self.angle.len()
    }

    pub fn is_empty(&self) -> bool {
        self.angle.is_empty()
    }

    /// Ordered ion field names.
    pub fn field_names(&self) -> Vec<String> {
        self.fields.keys().cloned().collect()
    }

    /// Column densities of one ion field.
    pub fn field(&self, name: &str) -> Option<&[f64]> {
        self.fields.get(name).map(Vec::as_slice)
    }

    /// Concatenate another snapshot's sightlines onto this set.
    ///
    /// Both sets must carry the same ion fields; profiles over the merged set
    /// do not depend on the append order.
    pub fn append(&mut self, other: SightlineSet) -> Result<(), DatasetError> {
        if self.is_empty() && self.fields.is_empty() {
            *self = other;
            return Ok(());
        }
        let ours = self.field_names();
        let theirs = other.field_names();
        if ours != theirs {
            return Err(DatasetError::FieldMismatch { ours, theirs });
        }
        self.angle.extend_from_slice(&other.angle);
        self.radius.extend_from_slice(&other.radius);
        for (name, values) in other.fields {
            if let Some(ours) = self.fields.get_mut(&name) {
                ours.extend_from_slice(&values);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(n: usize, offset: f64) -> SightlineSet {
        let angle: Vec<f64> = (0..n).map(|i| offset + i as f64).collect();
        let radius: Vec<f64> = (0..n).map(|i| 10.0 * i as f64).collect();
        let mut fields = BTreeMap::new();
        fields.insert("H_number_density".to_string(), vec![1e16; n]);
        SightlineSet::from_parts(angle, radius, fields).unwrap()
    }

    #[test]
    fn from_parts_rejects_ragged_arrays() {
        let err = SightlineSet::from_parts(vec![1.0], vec![1.0, 2.0], BTreeMap::new());
        assert_eq!(
            err.unwrap_err(),
            DatasetError::AxisLength { angle: 1, radius: 2 }
        );

        let mut fields = BTreeMap::new();
        fields.insert("density".to_string(), vec![1.0, 2.0, 3.0]);
        let err = SightlineSet::from_parts(vec![1.0], vec![2.0], fields).unwrap_err();
        assert!(matches!(
            err,
            DatasetError::FieldLength {
                sightlines: 1,
                values: 3,
                ..
            }
        ));
    }

    #[test]
    fn append_concatenates_all_arrays() {
        let mut merged = SightlineSet::default();
        merged.append(set(3, 0.0)).unwrap();
        merged.append(set(2, 50.0)).unwrap();

        assert_eq!(merged.len(), 5);
        assert_eq!(merged.angle, vec![0.0, 1.0, 2.0, 50.0, 51.0]);
        assert_eq!(merged.field("H_number_density").unwrap().len(), 5);
    }

    #[test]
    fn append_rejects_mismatched_field_sets() {
        let mut merged = set(2, 0.0);
        let mut other = set(2, 0.0);
        other
            .fields
            .insert("O_p5_number_density".to_string(), vec![1e14; 2]);

        let err = merged.append(other).unwrap_err();
        assert!(matches!(err, DatasetError::FieldMismatch { .. }));
    }
}

//! Segmentation class definitions and per-class statistics.

use crate::error::{DataError, Result};
use crate::types::LabelIndex;
use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::{debug, info};

/// Mapping between class names and class indices.
///
/// Names are unique and the indices form the contiguous range `0..len()`, so
/// an index doubles as a position in the label colour palette.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LabelDefinition {
    /// Class names ordered by index.
    names: Vec<String>,
}

impl LabelDefinition {
    /// Build from a name → index mapping, validating uniqueness and contiguity.
    pub fn new(mapping: HashMap<String, LabelIndex>) -> Result<Self> {
        let len = mapping.len();
        let mut slots: Vec<Option<String>> = vec![None; len];
        for (name, index) in mapping {
            let slot = slots.get_mut(index as usize).ok_or_else(|| {
                DataError::InvalidLabelDefinition(format!(
                    "class {name:?} has index {index}, expected indices 0..{len}"
                ))
            })?;
            if let Some(existing) = slot.replace(name.clone()) {
                return Err(DataError::InvalidLabelDefinition(format!(
                    "classes {existing:?} and {name:?} share index {index}"
                )));
            }
        }

        let names = slots
            .into_iter()
            .enumerate()
            .map(|(index, name)| {
                name.ok_or_else(|| {
                    DataError::InvalidLabelDefinition(format!("no class has index {index}"))
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { names })
    }

    /// Build from names ordered by index.
    pub fn from_names<I, S>(names: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut mapping = HashMap::new();
        for (index, name) in names.into_iter().enumerate() {
            let name = name.into();
            if mapping.insert(name.clone(), index as LabelIndex).is_some() {
                return Err(DataError::InvalidLabelDefinition(format!(
                    "class {name:?} is defined twice"
                )));
            }
        }
        Self::new(mapping)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Class name of an index.
    pub fn name_of(&self, index: LabelIndex) -> Option<&str> {
        self.names.get(index as usize).map(String::as_str)
    }

    /// Class index of a name.
    pub fn index_of(&self, name: &str) -> Option<LabelIndex> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|i| i as LabelIndex)
    }

    pub fn contains(&self, index: LabelIndex) -> bool {
        (index as usize) < self.names.len()
    }

    /// `(index, name)` pairs in index order.
    pub fn iter(&self) -> impl Iterator<Item = (LabelIndex, &str)> {
        self.names
            .iter()
            .enumerate()
            .map(|(i, n)| (i as LabelIndex, n.as_str()))
    }

    /// Number of points per class name; every class appears, unused ones with 0.
    pub fn count_labels(&self, labels: &[LabelIndex]) -> Result<BTreeMap<String, usize>> {
        let mut counts = vec![0usize; self.names.len()];
        for (point, &label) in labels.iter().enumerate() {
            let slot = counts
                .get_mut(label as usize)
                .ok_or(DataError::UnknownLabelIndex { point, label })?;
            *slot += 1;
        }
        Ok(self
            .names
            .iter()
            .cloned()
            .zip(counts)
            .collect())
    }

    /// Check that every label is a defined class.
    pub fn validate(&self, labels: &[LabelIndex]) -> Result<()> {
        match labels.iter().position(|&l| !self.contains(l)) {
            Some(point) => Err(DataError::UnknownLabelIndex {
                point,
                label: labels[point],
            }),
            None => Ok(()),
        }
    }
}

/// Read a JSON object of `"class name": index` pairs.
#[tracing::instrument(skip_all, fields(path = %path.display()))]
pub fn read_label_definition(path: &Path) -> Result<LabelDefinition> {
    debug!("Reading label definition");
    let reader = BufReader::new(File::open(path)?);
    let mapping: HashMap<String, LabelIndex> = serde_json::from_reader(reader)?;
    let definition = LabelDefinition::new(mapping)?;
    info!("Loaded {} label classes", definition.len());
    Ok(definition)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn definition() -> LabelDefinition {
        LabelDefinition::from_names(["unassigned", "car", "pedestrian"]).unwrap()
    }

    #[test]
    fn test_lookup_both_ways() {
        let def = definition();
        assert_eq!(def.len(), 3);
        assert_eq!(def.name_of(1), Some("car"));
        assert_eq!(def.index_of("pedestrian"), Some(2));
        assert_eq!(def.name_of(3), None);
        assert_eq!(def.index_of("tree"), None);
    }

    #[test]
    fn test_duplicate_index_rejected() {
        let mapping = HashMap::from([("a".to_string(), 0), ("b".to_string(), 0)]);
        assert!(matches!(
            LabelDefinition::new(mapping),
            Err(DataError::InvalidLabelDefinition(_))
        ));
    }

    #[test]
    fn test_gap_rejected() {
        let mapping = HashMap::from([("a".to_string(), 0), ("b".to_string(), 2)]);
        assert!(matches!(
            LabelDefinition::new(mapping),
            Err(DataError::InvalidLabelDefinition(_))
        ));
    }

    #[test]
    fn test_duplicate_name_rejected() {
        assert!(LabelDefinition::from_names(["a", "a"]).is_err());
    }

    #[test]
    fn test_count_labels_includes_zero_counts() {
        let def = definition();
        let counts = def.count_labels(&[0, 1, 1, 0, 1]).unwrap();
        assert_eq!(counts["unassigned"], 2);
        assert_eq!(counts["car"], 3);
        assert_eq!(counts["pedestrian"], 0);
        assert_eq!(counts.values().sum::<usize>(), 5);
    }

    #[test]
    fn test_count_labels_unknown() {
        let err = definition().count_labels(&[0, 7]).unwrap_err();
        assert!(matches!(err, DataError::UnknownLabelIndex { point: 1, label: 7 }));
    }

    #[test]
    fn test_validate() {
        let def = definition();
        assert!(def.validate(&[0, 1, 2]).is_ok());
        assert!(matches!(
            def.validate(&[0, 3]),
            Err(DataError::UnknownLabelIndex { point: 1, label: 3 })
        ));
    }

    #[test]
    fn test_read_label_definition() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"unassigned": 0, "car": 1, "cyclist": 2}}"#).unwrap();
        let def = read_label_definition(file.path()).unwrap();
        assert_eq!(def.name_of(2), Some("cyclist"));
        let names: Vec<&str> = def.iter().map(|(_, n)| n).collect();
        assert_eq!(names, ["unassigned", "car", "cyclist"]);
    }
}

//! Dataset Feature Builder
//!
//! Turns a labeled sample table into one feature row per source file.

use crate::bands::ChannelType;
use crate::error::BuildError;
use crate::features::FeatureExtractor;
use ndarray::{Array2, ArrayView1, Axis};
use sleep_dataset::{group_by_file, Column, DatasetError, FileGroup, LabeledDataset, FILE_COLUMN};
use std::path::Path;
use tracing::{debug, info};

/// Per-file feature rows with named columns
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMatrix {
    columns: Vec<String>,
    files: Vec<String>,
    values: Array2<f64>,
}

impl FeatureMatrix {
    /// Wrap an existing matrix; `values` must be `files.len() x columns.len()`
    pub fn new(columns: Vec<String>, files: Vec<String>, values: Array2<f64>) -> Result<Self, BuildError> {
        let (rows, cols) = values.dim();
        if rows != files.len() || cols != columns.len() {
            return Err(BuildError::Shape(ndarray::ShapeError::from_kind(
                ndarray::ErrorKind::IncompatibleShape,
            )));
        }
        Ok(Self {
            columns,
            files,
            values,
        })
    }

    /// Build from row vectors, each of `columns.len()` values
    pub fn from_rows(
        columns: Vec<String>,
        files: Vec<String>,
        rows: Vec<Vec<f64>>,
    ) -> Result<Self, BuildError> {
        let shape = (rows.len(), columns.len());
        let flat: Vec<f64> = rows.into_iter().flatten().collect();
        let values = Array2::from_shape_vec(shape, flat)?;
        Self::new(columns, files, values)
    }

    /// Feature column names
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Source file of each row
    pub fn files(&self) -> &[String] {
        &self.files
    }

    /// Raw values, one row per file
    pub fn values(&self) -> &Array2<f64> {
        &self.values
    }

    pub fn n_rows(&self) -> usize {
        self.values.nrows()
    }

    pub fn n_columns(&self) -> usize {
        self.values.ncols()
    }

    /// One row
    pub fn row(&self, index: usize) -> ArrayView1<'_, f64> {
        self.values.row(index)
    }

    /// One column by name
    pub fn column(&self, name: &str) -> Option<ArrayView1<'_, f64>> {
        self.columns
            .iter()
            .position(|c| c == name)
            .map(|idx| self.values.column(idx))
    }

    /// Project onto `columns`, in the given order
    pub fn select(&self, columns: &[String]) -> Result<FeatureMatrix, BuildError> {
        let indices = columns
            .iter()
            .map(|name| {
                self.columns
                    .iter()
                    .position(|c| c == name)
                    .ok_or_else(|| BuildError::UnknownFeature(name.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(FeatureMatrix {
            columns: columns.to_vec(),
            files: self.files.clone(),
            values: self.values.select(Axis(1), &indices),
        })
    }

    /// Subset of rows, in the given order
    pub fn take_rows(&self, rows: &[usize]) -> FeatureMatrix {
        FeatureMatrix {
            columns: self.columns.clone(),
            files: rows.iter().map(|&r| self.files[r].clone()).collect(),
            values: self.values.select(Axis(0), rows),
        }
    }

    /// Rows as plain vectors, the layout model libraries consume
    pub fn to_rows(&self) -> Vec<Vec<f64>> {
        self.values.outer_iter().map(|row| row.to_vec()).collect()
    }

    /// Write `file`, every feature column and the label column as CSV
    pub fn write_csv(&self, path: &Path, labels: &[String], label_column: &str) -> Result<(), BuildError> {
        if labels.len() != self.n_rows() {
            return Err(BuildError::Dataset(DatasetError::LengthMismatch {
                column: label_column.to_string(),
                expected: self.n_rows(),
                actual: labels.len(),
            }));
        }

        let mut writer = csv::Writer::from_path(path)?;

        let mut header = Vec::with_capacity(self.columns.len() + 2);
        header.push(FILE_COLUMN.to_string());
        header.extend(self.columns.iter().cloned());
        header.push(label_column.to_string());
        writer.write_record(&header)?;

        for (idx, row) in self.values.outer_iter().enumerate() {
            let mut record = Vec::with_capacity(header.len());
            record.push(self.files[idx].clone());
            record.extend(row.iter().map(|v| v.to_string()));
            record.push(labels[idx].clone());
            writer.write_record(&record)?;
        }

        writer.flush()?;
        info!("Wrote {} feature rows to {}", self.n_rows(), path.display());
        Ok(())
    }
}

/// Label of a file group; numeric labels are rendered as text
fn group_label(group: &FileGroup, column: &str) -> Result<String, DatasetError> {
    let cells = group.rows.column(column)?;
    match cells {
        Column::Text(_) => group.single_text(column).map(str::to_string),
        Column::Numeric(values) => {
            let first = values.first().ok_or(DatasetError::Empty)?;
            if values.iter().any(|v| v != first) {
                return Err(DatasetError::InconsistentGroup {
                    file: group.file_id.clone(),
                    column: column.to_string(),
                });
            }
            Ok(cells.cell(0))
        }
    }
}

/// Extract one feature row per file of `dataset`.
///
/// Rows follow the order in which files first appear; the returned labels
/// are index-aligned with the rows.
pub fn build(
    dataset: &LabeledDataset,
    signal_column: &str,
    label_column: &str,
    sample_rate: f64,
    multiband: Option<ChannelType>,
) -> Result<(FeatureMatrix, Vec<String>), BuildError> {
    let groups = group_by_file(dataset)?;
    if groups.is_empty() {
        return Err(BuildError::Empty);
    }

    info!(
        "Building features for {} files from column {} (multiband: {})",
        groups.len(),
        signal_column,
        multiband.map(|c| c.as_str()).unwrap_or("off")
    );

    let mut extractor = match multiband {
        Some(channel) => FeatureExtractor::multiband(sample_rate, channel)?,
        None => FeatureExtractor::new(sample_rate),
    };

    let columns = extractor.schema();
    let mut files = Vec::with_capacity(groups.len());
    let mut labels = Vec::with_capacity(groups.len());
    let mut rows = Vec::with_capacity(groups.len());

    for group in &groups {
        let signal = group.rows.numeric(signal_column)?;
        let label = group_label(group, label_column)?;

        let features = extractor.extract(signal).map_err(|source| BuildError::Group {
            file: group.file_id.clone(),
            source,
        })?;
        if features.names() != columns.as_slice() {
            return Err(BuildError::SchemaMismatch {
                file: group.file_id.clone(),
            });
        }

        debug!(
            "File {}: {} samples, label {}",
            group.file_id,
            signal.len(),
            label
        );

        files.push(group.file_id.clone());
        labels.push(label);
        rows.push(features.values().to_vec());
    }

    let matrix = FeatureMatrix::from_rows(columns, files, rows)?;
    info!(
        "Built feature matrix: {} rows x {} columns",
        matrix.n_rows(),
        matrix.n_columns()
    );

    Ok((matrix, labels))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FeatureError;
    use tempfile::tempdir;

    const FS: f64 = 200.0;

    fn recording(files: &[(&str, &str, f64)], samples: usize) -> LabeledDataset {
        let mut eog = Vec::new();
        let mut file = Vec::new();
        let mut stage = Vec::new();
        for &(name, label, freq) in files {
            for i in 0..samples {
                eog.push((2.0 * std::f64::consts::PI * freq * i as f64 / FS).sin());
                file.push(name.to_string());
                stage.push(label.to_string());
            }
        }
        LabeledDataset::from_columns([
            ("eog", Column::Numeric(eog)),
            ("file", Column::Text(file)),
            ("stage", Column::Text(stage)),
        ])
        .unwrap()
    }

    #[test]
    fn test_two_files_two_rows() {
        let dataset = recording(&[("A", "awake", 3.0), ("B", "rem", 8.0)], 600);
        let (matrix, labels) = build(&dataset, "eog", "stage", FS, None).unwrap();

        assert_eq!(matrix.n_rows(), 2);
        assert_eq!(matrix.n_columns(), 14);
        assert_eq!(labels, vec!["awake".to_string(), "rem".to_string()]);
        assert_eq!(matrix.files(), &["A".to_string(), "B".to_string()]);

        let dominant = matrix.column("dominant_frequency").unwrap();
        assert!((dominant[0] - 3.0).abs() < 1.0);
        assert!((dominant[1] - 8.0).abs() < 1.0);
    }

    #[test]
    fn test_multiband_build() {
        let dataset = recording(&[("A", "awake", 3.0), ("B", "rem", 12.0)], 600);
        let (matrix, _) = build(&dataset, "eog", "stage", FS, Some(ChannelType::Eog)).unwrap();
        assert_eq!(matrix.n_columns(), 84);
        assert!(matrix.values().iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_group_error_names_file() {
        // B is too short for the sub-band filters
        let mut dataset = recording(&[("A", "awake", 3.0)], 600);
        dataset.append(&recording(&[("B", "rem", 3.0)], 10)).unwrap();

        let err = build(&dataset, "eog", "stage", FS, Some(ChannelType::Eog)).unwrap_err();
        assert!(matches!(
            err,
            BuildError::Group { ref file, source: FeatureError::Filter { .. } } if file == "B"
        ));
    }

    #[test]
    fn test_extractor_setup_error_names_no_file() {
        // EMG bands reach 99 Hz, above the 50 Hz nyquist of a 100 Hz recording
        let dataset = recording(&[("A", "awake", 3.0), ("B", "rem", 3.0)], 300);
        let err = build(&dataset, "eog", "stage", 100.0, Some(ChannelType::Emg)).unwrap_err();
        assert!(matches!(
            err,
            BuildError::Extractor(FeatureError::Filter { .. })
        ));
    }

    #[test]
    fn test_inconsistent_label_rejected() {
        let mut dataset = recording(&[("A", "awake", 3.0)], 300);
        dataset.append(&recording(&[("A", "rem", 3.0)], 300)).unwrap();
        assert!(matches!(
            build(&dataset, "eog", "stage", FS, None),
            Err(BuildError::Dataset(DatasetError::InconsistentGroup { .. }))
        ));
    }

    #[test]
    fn test_missing_signal_column() {
        let dataset = recording(&[("A", "awake", 3.0)], 300);
        assert!(matches!(
            build(&dataset, "emg", "stage", FS, None),
            Err(BuildError::Dataset(DatasetError::MissingColumn(_)))
        ));
    }

    #[test]
    fn test_empty_dataset() {
        let dataset = recording(&[], 0);
        assert!(matches!(
            build(&dataset, "eog", "stage", FS, None),
            Err(BuildError::Empty)
        ));
    }

    #[test]
    fn test_select_and_take_rows() {
        let dataset = recording(&[("A", "awake", 3.0), ("B", "rem", 8.0), ("C", "nonrem", 1.0)], 400);
        let (matrix, _) = build(&dataset, "eog", "stage", FS, None).unwrap();

        let picked = matrix
            .select(&["std".to_string(), "mean".to_string()])
            .unwrap();
        assert_eq!(picked.columns(), &["std".to_string(), "mean".to_string()]);
        assert_eq!(picked.values()[[1, 0]], matrix.column("std").unwrap()[1]);

        let rows = matrix.take_rows(&[2, 0]);
        assert_eq!(rows.files(), &["C".to_string(), "A".to_string()]);
        assert_eq!(rows.to_rows()[1], matrix.to_rows()[0]);

        assert!(matches!(
            matrix.select(&["nope".to_string()]),
            Err(BuildError::UnknownFeature(_))
        ));
    }

    #[test]
    fn test_write_csv() {
        let dataset = recording(&[("A", "awake", 3.0), ("B", "rem", 8.0)], 300);
        let (matrix, labels) = build(&dataset, "eog", "stage", FS, None).unwrap();

        let dir = tempdir().unwrap();
        let path = dir.path().join("features.csv");
        matrix.write_csv(&path, &labels, "stage").unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let mut lines = content.lines();
        let header = lines.next().unwrap();
        assert!(header.starts_with("file,mean,std"));
        assert!(header.ends_with(",stage"));
        assert!(lines.next().unwrap().starts_with("A,"));
        assert!(lines.next().unwrap().ends_with(",rem"));
    }
}

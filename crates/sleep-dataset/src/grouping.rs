//! Per-File Grouping
//!
//! Recordings must never mix samples across source files, so filtering and
//! feature extraction always run on one file group at a time.

use crate::error::DatasetError;
use crate::table::{LabeledDataset, FILE_COLUMN};
use std::collections::HashMap;
use std::fmt::Display;
use tracing::debug;

/// Rows belonging to one source file, in source order
#[derive(Debug, Clone, PartialEq)]
pub struct FileGroup {
    /// Source file identifier
    pub file_id: String,
    /// The file's rows
    pub rows: LabeledDataset,
}

impl FileGroup {
    /// The single value of a per-file text column (label, partition).
    ///
    /// Every row of a file must agree; disagreement is reported rather than
    /// silently taking the first row.
    pub fn single_text(&self, column: &str) -> Result<&str, DatasetError> {
        let values = self.rows.text(column)?;
        let first = values.first().ok_or(DatasetError::Empty)?;
        if values.iter().any(|v| v != first) {
            return Err(DatasetError::InconsistentGroup {
                file: self.file_id.clone(),
                column: column.to_string(),
            });
        }
        Ok(first.as_str())
    }
}

/// Split `dataset` into one group per file.
///
/// Groups appear in order of first occurrence and keep the source row order.
/// Every row lands in exactly one group.
pub fn group_by_file(dataset: &LabeledDataset) -> Result<Vec<FileGroup>, DatasetError> {
    let files = dataset.text(FILE_COLUMN)?;

    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut members: Vec<(&str, Vec<usize>)> = Vec::new();
    for (row, file) in files.iter().enumerate() {
        let slot = *index.entry(file.as_str()).or_insert_with(|| {
            members.push((file.as_str(), Vec::new()));
            members.len() - 1
        });
        members[slot].1.push(row);
    }

    debug!("Grouped {} rows into {} files", dataset.len(), members.len());

    Ok(members
        .into_iter()
        .map(|(file, rows)| FileGroup {
            file_id: file.to_string(),
            rows: dataset.take(&rows),
        })
        .collect())
}

/// Concatenate group tables back into a single table, in the given order
pub fn concat<'a>(
    tables: impl IntoIterator<Item = &'a LabeledDataset>,
) -> Result<LabeledDataset, DatasetError> {
    let mut combined = LabeledDataset::new();
    for table in tables {
        combined.append(table)?;
    }
    Ok(combined)
}

/// Apply `transform` to one numeric column independently for every file.
///
/// The result holds the groups concatenated in first-occurrence order. A failing
/// transform is reported with the id of the file it failed on.
pub fn apply_filter_per_file<F, E>(
    dataset: &LabeledDataset,
    column: &str,
    mut transform: F,
) -> Result<LabeledDataset, DatasetError>
where
    F: FnMut(&[f64]) -> Result<Vec<f64>, E>,
    E: Display,
{
    // Fail on a bad column before doing any work
    dataset.numeric(column)?;

    let mut groups = group_by_file(dataset)?;
    for group in &mut groups {
        let filtered = transform(group.rows.numeric(column)?).map_err(|e| DatasetError::Transform {
            file: group.file_id.clone(),
            message: e.to_string(),
        })?;
        group.rows.set_numeric(column, filtered)?;
    }

    concat(groups.iter().map(|g| &g.rows))
}

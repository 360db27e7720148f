//! Column-Oriented Labeled Table

use crate::error::DatasetError;
use serde::{Deserialize, Serialize};

/// Source-file identifier column
pub const FILE_COLUMN: &str = "file";
/// Sleep-stage label column
pub const STAGE_COLUMN: &str = "stage";
/// Train/test partition column
pub const SET_COLUMN: &str = "set";

/// A single named column of values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Column {
    /// Real-valued samples
    Numeric(Vec<f64>),
    /// Categorical values (file ids, labels, partitions)
    Text(Vec<String>),
}

impl Column {
    /// Number of rows
    pub fn len(&self) -> usize {
        match self {
            Column::Numeric(values) => values.len(),
            Column::Text(values) => values.len(),
        }
    }

    /// Check if the column has no rows
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Kind name used in error messages
    pub fn kind(&self) -> &'static str {
        match self {
            Column::Numeric(_) => "numeric",
            Column::Text(_) => "text",
        }
    }

    /// Render the value at `row` as it would appear in a CSV cell
    pub fn cell(&self, row: usize) -> String {
        match self {
            Column::Numeric(values) => values[row].to_string(),
            Column::Text(values) => values[row].clone(),
        }
    }

    fn take(&self, rows: &[usize]) -> Column {
        match self {
            Column::Numeric(values) => Column::Numeric(rows.iter().map(|&i| values[i]).collect()),
            Column::Text(values) => Column::Text(rows.iter().map(|&i| values[i].clone()).collect()),
        }
    }

    /// Append `other`'s values; a column of the other kind is ignored
    fn extend(&mut self, other: &Column) {
        match (self, other) {
            (Column::Numeric(a), Column::Numeric(b)) => a.extend_from_slice(b),
            (Column::Text(a), Column::Text(b)) => a.extend(b.iter().cloned()),
            _ => {}
        }
    }
}

/// Rows of channel values tagged with file, stage and partition.
///
/// Stored column-wise; every column has exactly `len()` rows and row order is
/// the temporal order of the samples.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LabeledDataset {
    names: Vec<String>,
    columns: Vec<Column>,
    rows: usize,
}

impl LabeledDataset {
    /// Create an empty table with no columns
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table from named columns of equal length
    pub fn from_columns<S: Into<String>>(
        columns: impl IntoIterator<Item = (S, Column)>,
    ) -> Result<Self, DatasetError> {
        let mut dataset = Self::new();
        for (name, column) in columns {
            dataset.push_column(name, column)?;
        }
        Ok(dataset)
    }

    /// Append a column; its length must match existing columns
    pub fn push_column(&mut self, name: impl Into<String>, column: Column) -> Result<(), DatasetError> {
        let name = name.into();
        if self.names.contains(&name) {
            return Err(DatasetError::DuplicateColumn(name));
        }
        if !self.columns.is_empty() && column.len() != self.rows {
            return Err(DatasetError::LengthMismatch {
                column: name,
                expected: self.rows,
                actual: column.len(),
            });
        }
        self.rows = column.len();
        self.names.push(name);
        self.columns.push(column);
        Ok(())
    }

    /// Replace the values of an existing numeric column
    pub fn set_numeric(&mut self, name: &str, values: Vec<f64>) -> Result<(), DatasetError> {
        if values.len() != self.rows {
            return Err(DatasetError::LengthMismatch {
                column: name.to_string(),
                expected: self.rows,
                actual: values.len(),
            });
        }
        let idx = self.index_of(name)?;
        match &mut self.columns[idx] {
            Column::Numeric(existing) => {
                *existing = values;
                Ok(())
            }
            Column::Text(_) => Err(DatasetError::ColumnType {
                column: name.to_string(),
                expected: "numeric",
            }),
        }
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.rows
    }

    /// Check if the table has no rows
    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    /// Column names in table order
    pub fn column_names(&self) -> &[String] {
        &self.names
    }

    /// Iterate `(name, column)` pairs in table order
    pub fn columns(&self) -> impl Iterator<Item = (&str, &Column)> {
        self.names.iter().map(String::as_str).zip(self.columns.iter())
    }

    /// Look up a column by name
    pub fn column(&self, name: &str) -> Result<&Column, DatasetError> {
        let idx = self.index_of(name)?;
        Ok(&self.columns[idx])
    }

    /// Look up a numeric column by name
    pub fn numeric(&self, name: &str) -> Result<&[f64], DatasetError> {
        match self.column(name)? {
            Column::Numeric(values) => Ok(values),
            Column::Text(_) => Err(DatasetError::ColumnType {
                column: name.to_string(),
                expected: "numeric",
            }),
        }
    }

    /// Look up a text column by name
    pub fn text(&self, name: &str) -> Result<&[String], DatasetError> {
        match self.column(name)? {
            Column::Text(values) => Ok(values),
            Column::Numeric(_) => Err(DatasetError::ColumnType {
                column: name.to_string(),
                expected: "text",
            }),
        }
    }

    /// New table holding the given rows, in the given order
    pub fn take(&self, rows: &[usize]) -> LabeledDataset {
        LabeledDataset {
            names: self.names.clone(),
            columns: self.columns.iter().map(|c| c.take(rows)).collect(),
            rows: rows.len(),
        }
    }

    /// Append all rows of `other`; both tables must share names and column kinds.
    ///
    /// A table without columns adopts the layout of `other`.
    pub fn append(&mut self, other: &LabeledDataset) -> Result<(), DatasetError> {
        if self.columns.is_empty() {
            *self = other.clone();
            return Ok(());
        }
        if self.names != other.names {
            return Err(DatasetError::SchemaMismatch(format!(
                "columns {:?} vs {:?}",
                self.names, other.names
            )));
        }
        for ((name, column), incoming) in self.names.iter().zip(&self.columns).zip(&other.columns) {
            if column.kind() != incoming.kind() {
                return Err(DatasetError::SchemaMismatch(format!(
                    "column {} is {} in one table and {} in the other",
                    name,
                    column.kind(),
                    incoming.kind()
                )));
            }
        }
        for (column, incoming) in self.columns.iter_mut().zip(&other.columns) {
            column.extend(incoming);
        }
        self.rows += other.rows;
        Ok(())
    }

    fn index_of(&self, name: &str) -> Result<usize, DatasetError> {
        self.names
            .iter()
            .position(|n| n == name)
            .ok_or_else(|| DatasetError::MissingColumn(name.to_string()))
    }
}

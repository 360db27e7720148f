//! CSV Input/Output

use crate::error::DatasetError;
use crate::table::{Column, LabeledDataset};
use std::path::Path;
use tracing::{debug, info};

/// Read a CSV table.
///
/// A column is numeric when every one of its cells parses as `f64`; any other
/// column is kept as text.
pub fn read_csv(path: &Path) -> Result<LabeledDataset, DatasetError> {
    let mut reader = csv::Reader::from_path(path)?;
    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();

    let mut cells: Vec<Vec<String>> = vec![Vec::new(); headers.len()];
    for record in reader.records() {
        let record = record?;
        for (column, value) in cells.iter_mut().zip(record.iter()) {
            column.push(value.to_string());
        }
    }

    let columns = headers.into_iter().zip(cells).map(|(name, values)| {
        let parsed: Option<Vec<f64>> = values.iter().map(|v| v.trim().parse::<f64>().ok()).collect();
        let column = match parsed {
            Some(numbers) => Column::Numeric(numbers),
            None => Column::Text(values),
        };
        (name, column)
    });
    let dataset = LabeledDataset::from_columns(columns)?;

    debug!(
        "Read {} rows x {} columns from {}",
        dataset.len(),
        dataset.column_names().len(),
        path.display()
    );
    Ok(dataset)
}

/// Write a table as CSV with a header row
pub fn write_csv(dataset: &LabeledDataset, path: &Path) -> Result<(), DatasetError> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(dataset.column_names())?;

    let columns: Vec<&Column> = dataset.columns().map(|(_, c)| c).collect();
    for row in 0..dataset.len() {
        writer.write_record(columns.iter().map(|c| c.cell(row)))?;
    }
    writer.flush().map_err(|source| DatasetError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    info!("Wrote {} rows to {}", dataset.len(), path.display());
    Ok(())
}

//! Archive Tree Assembly
//!
//! Combines the extracted archive layout `<base>/{Train,Test}/{awake,nonrem,rem}/*.csv`
//! into one labeled table with `stage`, `set` and `file` columns appended.

use crate::error::DatasetError;
use crate::io::read_csv;
use crate::stage::{Partition, SleepStage};
use crate::table::{Column, LabeledDataset, FILE_COLUMN, SET_COLUMN, STAGE_COLUMN};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Per-recording CSV files in `dir`, sorted by name
fn recording_files(dir: &Path) -> Result<Vec<PathBuf>, DatasetError> {
    let entries = fs::read_dir(dir).map_err(|source| DatasetError::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut files = Vec::new();
    for entry in entries {
        let path = entry
            .map_err(|source| DatasetError::Io {
                path: dir.to_path_buf(),
                source,
            })?
            .path();
        if path.extension().is_some_and(|ext| ext == "csv") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Read one recording and tag it with its stage, partition and file name
pub fn load_recording(
    path: &Path,
    stage: SleepStage,
    partition: Partition,
) -> Result<LabeledDataset, DatasetError> {
    let mut recording = read_csv(path)?;
    let rows = recording.len();
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();

    recording.push_column(STAGE_COLUMN, Column::Text(vec![stage.as_str().to_string(); rows]))?;
    recording.push_column(SET_COLUMN, Column::Text(vec![partition.as_str().to_string(); rows]))?;
    recording.push_column(FILE_COLUMN, Column::Text(vec![file_name; rows]))?;
    Ok(recording)
}

/// Walk the extracted archive and concatenate every recording.
///
/// Partitions and stages are visited in folder order, files by name, so the
/// result is reproducible.
pub fn assemble_from_directory(base: &Path) -> Result<LabeledDataset, DatasetError> {
    info!("Assembling dataset from {}", base.display());

    let mut combined = LabeledDataset::new();
    for partition in Partition::ALL {
        for stage in SleepStage::ALL {
            let dir = base.join(partition.as_str()).join(stage.as_str());
            let files = recording_files(&dir)?;
            if files.is_empty() {
                warn!("No recordings in {}", dir.display());
            }
            for path in files {
                let recording = load_recording(&path, stage, partition)?;
                debug!("Loaded {} ({} rows)", path.display(), recording.len());
                combined.append(&recording)?;
            }
        }
    }

    if combined.is_empty() {
        return Err(DatasetError::Empty);
    }

    info!(
        "Assembled {} rows with columns {:?}",
        combined.len(),
        combined.column_names()
    );
    Ok(combined)
}

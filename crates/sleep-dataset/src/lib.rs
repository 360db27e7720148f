//! Labeled Sleep Recordings
//!
//! Tabular model for multi-channel EOG/EMG recordings tagged with file,
//! sleep stage and partition, plus CSV I/O, archive-tree assembly and
//! per-file grouping.

mod assemble;
mod error;
mod grouping;
mod io;
mod stage;
mod table;

pub use assemble::{assemble_from_directory, load_recording};
pub use error::DatasetError;
pub use grouping::{apply_filter_per_file, concat, group_by_file, FileGroup};
pub use io::{read_csv, write_csv};
pub use stage::{Partition, SleepStage};
pub use table::{Column, LabeledDataset, FILE_COLUMN, SET_COLUMN, STAGE_COLUMN};

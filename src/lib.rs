pub mod cli;

mod config;
mod detect;
mod error;
mod excel;
mod i18n;
mod merge;
mod pdf;
mod report;

pub use config::{Config, Limits};
pub use detect::{FileKind, detect_kind, validate_inputs};
pub use error::{AppError, AppResult};
pub use excel::merge_selected;
pub use merge::{
    FileInfo, MergeOptions, MergeReport, Preview, file_info, merge_files, preview, reorder,
};

#[cfg(test)]
mod testutil;

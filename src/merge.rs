use std::fs;
use std::path::{Path, PathBuf};

use chrono::Local;
use log::{error, info};
use serde::Serialize;

use crate::config::Config;
use crate::detect::{self, FileKind};
use crate::error::{AppError, AppResult};
use crate::excel::{self, ExcelInfo};
use crate::pdf::{self, PdfInfo};

#[derive(Debug, Clone, Default)]
pub struct MergeOptions {
    /// Overrides `pdf.bookmarks` from the config when set.
    pub bookmarks: Option<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FailureStage {
    Validation,
    Merge,
}

/// Aggregated outcome of one merge run. Errors and warnings are collected as
/// strings; a failed run never leaves a partial output file behind.
#[derive(Debug, Clone, Serialize)]
pub struct MergeReport {
    pub success: bool,
    pub message: String,
    pub kind: Option<FileKind>,
    pub input_count: usize,
    pub output_file: Option<PathBuf>,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<FailureStage>,
}

impl MergeReport {
    fn new(inputs: &[PathBuf], output: Option<&Path>) -> Self {
        Self {
            success: false,
            message: String::new(),
            kind: None,
            input_count: inputs.len(),
            output_file: output.map(Path::to_path_buf),
            errors: Vec::new(),
            warnings: Vec::new(),
            failure: None,
        }
    }

    fn fail_validation(mut self, message: String) -> Self {
        self.message = message;
        self.failure = Some(FailureStage::Validation);
        self
    }

    /// Maps a failed report onto the process-level error taxonomy.
    pub fn to_error(&self) -> Option<AppError> {
        match self.failure {
            None => None,
            Some(FailureStage::Validation) => Some(AppError::input(
                self.message.clone(),
                Some(crate::tr!(
                    "入力ファイルを確認してください",
                    "Check the input files."
                )),
            )),
            Some(FailureStage::Merge) => Some(AppError::merge(self.message.clone(), None)),
        }
    }
}

/// Validate, route to the format-specific merger and aggregate the outcome.
pub fn merge_files(
    config: &Config,
    inputs: &[PathBuf],
    output: Option<&Path>,
    options: &MergeOptions,
) -> MergeReport {
    let mut report = MergeReport::new(inputs, output);

    let validation = detect::validate_inputs(inputs, &config.limits);
    if !validation.errors.is_empty() {
        report.errors = validation.errors;
        let message = report.errors.join("; ");
        return report.fail_validation(message);
    }
    let Some(kind) = validation.kind else {
        let message = crate::tr!("有効なファイルがありません", "No valid files found");
        report.errors.push(message.clone());
        return report.fail_validation(message);
    };
    report.kind = Some(kind);

    let mut accessible = Vec::new();
    for path in &validation.valid {
        if !detect::is_readable(path) {
            report.errors.push(crate::tr!(
                "ファイルにアクセスできません: {}",
                "File not accessible: {}",
                path.display()
            ));
            continue;
        }
        if validate_integrity(path, kind) {
            accessible.push(path.clone());
        } else {
            report.warnings.push(crate::tr!(
                "ファイルが破損している可能性があります: {}",
                "File may be corrupted: {}",
                path.display()
            ));
        }
    }
    if accessible.is_empty() {
        let message = crate::tr!(
            "アクセス可能なファイルがありません",
            "No accessible files found"
        );
        return report.fail_validation(message);
    }

    let output_file = match resolve_output(config, &accessible, kind, output) {
        Ok(path) => path,
        Err(err) => {
            report.errors.push(err.to_string());
            report.message = err.to_string();
            report.failure = Some(FailureStage::Merge);
            return report;
        }
    };
    report.output_file = Some(output_file.clone());

    let bookmarks = options.bookmarks.unwrap_or(config.pdf.bookmarks);
    let outcome = write_atomic(&output_file, kind, |staged| match kind {
        FileKind::Pdf => pdf::merge_pdfs(&accessible, staged, bookmarks),
        FileKind::Excel => excel::merge_workbooks(&accessible, staged, &config.excel.sheet_prefix),
    });
    match outcome {
        Ok(()) => {
            report.success = true;
            report.message = crate::tr!(
                "{} 件の {} ファイルを結合しました",
                "Successfully merged {} {} files",
                accessible.len(),
                kind
            );
            info!("merge completed: {}", report.message);
        }
        Err(err) => {
            error!("merge failed: {}", err);
            report.errors.push(err.to_string());
            report.message = crate::tr!(
                "{} ファイルの結合に失敗しました",
                "Failed to merge {} files",
                kind
            );
            report.failure = Some(FailureStage::Merge);
        }
    }
    report
}

fn validate_integrity(path: &Path, kind: FileKind) -> bool {
    match kind {
        FileKind::Pdf => pdf::validate_pdf(path),
        FileKind::Excel => excel::validate_workbook(path),
    }
}

fn resolve_output(
    config: &Config,
    inputs: &[PathBuf],
    kind: FileKind,
    output: Option<&Path>,
) -> AppResult<PathBuf> {
    match output {
        Some(path) if path.is_dir() || path.extension().is_none() => {
            generate_output_name(inputs, kind, path)
        }
        Some(path) => Ok(path.to_path_buf()),
        None => {
            let dir = config
                .output
                .dir
                .clone()
                .or_else(|| parent_dir(&inputs[0]))
                .unwrap_or_else(|| PathBuf::from("."));
            generate_output_name(inputs, kind, &dir)
        }
    }
}

fn parent_dir(path: &Path) -> Option<PathBuf> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => Some(parent.to_path_buf()),
        _ => None,
    }
}

fn generate_output_name(inputs: &[PathBuf], kind: FileKind, dir: &Path) -> AppResult<PathBuf> {
    fs::create_dir_all(dir).map_err(|err| {
        AppError::merge(
            crate::tr!(
                "出力ディレクトリを作成できません: {}",
                "Failed to create output directory: {}",
                dir.display()
            ),
            Some(err.to_string()),
        )
    })?;
    let timestamp = Local::now().format("%Y%m%d_%H%M%S");
    Ok(dir.join(format!(
        "merged_{}_{}files_{}.{}",
        kind,
        inputs.len(),
        timestamp,
        kind.extension()
    )))
}

// The merger writes into a staged temp file next to the destination, which
// is persisted only on success.
fn write_atomic(
    output: &Path,
    kind: FileKind,
    write: impl FnOnce(&Path) -> AppResult<()>,
) -> AppResult<()> {
    let parent = parent_dir(output).unwrap_or_else(|| PathBuf::from("."));
    fs::create_dir_all(&parent).map_err(|err| {
        AppError::merge(
            crate::tr!(
                "出力ディレクトリを作成できません: {}",
                "Failed to create output directory: {}",
                parent.display()
            ),
            Some(err.to_string()),
        )
    })?;
    let staged = tempfile::Builder::new()
        .prefix(".docmerge")
        .suffix(&format!(".{}", kind.extension()))
        .tempfile_in(&parent)
        .map_err(|err| {
            AppError::merge(
                crate::tr!(
                    "一時ファイルの作成に失敗しました: {}",
                    "Failed to create a temporary file in {}",
                    parent.display()
                ),
                Some(err.to_string()),
            )
        })?;
    write(staged.path())?;
    staged.persist(output).map_err(|err| {
        AppError::merge(
            crate::tr!(
                "出力ファイルの書き込みに失敗しました: {}",
                "Failed to write output file: {}",
                output.display()
            ),
            Some(err.error.to_string()),
        )
    })?;
    Ok(())
}

#[derive(Debug, Clone, Serialize)]
pub struct FileInfo {
    pub path: PathBuf,
    pub name: String,
    pub size: u64,
    pub size_formatted: String,
    pub kind: Option<FileKind>,
    pub accessible: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pdf: Option<PdfInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub excel: Option<ExcelInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

pub fn file_info(path: &Path) -> FileInfo {
    let size = detect::file_size(path);
    let mut info = FileInfo {
        path: path.to_path_buf(),
        name: path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string()),
        size,
        size_formatted: detect::format_size(size),
        kind: None,
        accessible: detect::is_readable(path),
        pdf: None,
        excel: None,
        error: None,
    };
    match detect::detect_kind(path) {
        Ok(kind) => {
            info.kind = kind;
            match kind {
                Some(FileKind::Pdf) => match pdf::pdf_info(path) {
                    Ok(detail) => info.pdf = Some(detail),
                    Err(err) => info.error = Some(err.to_string()),
                },
                Some(FileKind::Excel) => match excel::workbook_info(path) {
                    Ok(detail) => info.excel = Some(detail),
                    Err(err) => info.error = Some(err.to_string()),
                },
                None => {}
            }
        }
        Err(err) => {
            info.accessible = false;
            info.error = Some(err.to_string());
        }
    }
    info
}

#[derive(Debug, Clone, Serialize)]
pub struct Preview {
    pub valid: bool,
    pub kind: Option<FileKind>,
    pub file_count: usize,
    pub files: Vec<FileInfo>,
    pub total_size: u64,
    pub total_size_formatted: String,
    pub estimated_output_size: u64,
    pub estimated_output_size_formatted: String,
    pub errors: Vec<String>,
}

/// Dry inspection of a merge: what would be merged and how large the result
/// is expected to be. Output size is estimated at 110% of the input total.
pub fn preview(config: &Config, inputs: &[PathBuf]) -> Preview {
    let mut preview = Preview {
        valid: false,
        kind: None,
        file_count: inputs.len(),
        files: Vec::new(),
        total_size: 0,
        total_size_formatted: detect::format_size(0),
        estimated_output_size: 0,
        estimated_output_size_formatted: detect::format_size(0),
        errors: Vec::new(),
    };

    let validation = detect::validate_inputs(inputs, &config.limits);
    if !validation.errors.is_empty() {
        preview.errors = validation.errors;
        return preview;
    }
    preview.kind = validation.kind;
    preview.valid = true;

    let mut total = 0;
    for path in &validation.valid {
        let info = file_info(path);
        total += info.size;
        preview.files.push(info);
    }
    preview.total_size = total;
    preview.total_size_formatted = detect::format_size(total);
    preview.estimated_output_size = (total as f64 * 1.1) as u64;
    preview.estimated_output_size_formatted = detect::format_size(preview.estimated_output_size);
    preview
}

/// Reorder `files` by the given permutation of indices. A malformed
/// permutation is an error rather than a silent no-op.
pub fn reorder(files: &[PathBuf], order: &[usize]) -> AppResult<Vec<PathBuf>> {
    if order.len() != files.len() {
        return Err(AppError::input(
            crate::tr!(
                "並び順の個数がファイル数と一致しません",
                "Order must have the same length as the file list"
            ),
            Some(crate::tr!(
                "{} 個のインデックスを指定してください",
                "Provide exactly {} indices.",
                files.len()
            )),
        ));
    }
    let mut seen = vec![false; files.len()];
    for &index in order {
        if index >= files.len() || seen[index] {
            return Err(AppError::input(
                crate::tr!(
                    "並び順の指定が不正です",
                    "Order must contain every index exactly once"
                ),
                Some(crate::tr!(
                    "0 から {} のインデックスを一度ずつ使ってください",
                    "Use each index from 0 to {} exactly once.",
                    files.len() - 1
                )),
            ));
        }
        seen[index] = true;
    }
    Ok(order.iter().map(|&index| files[index].clone()).collect())
}

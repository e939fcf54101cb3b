use std::collections::BTreeSet;
use std::fmt;
use std::fs::{self, File};
use std::io::Read;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::config::Limits;
use crate::error::{AppError, AppResult};

pub const PDF_EXTENSIONS: &[&str] = &["pdf"];
pub const EXCEL_EXTENSIONS: &[&str] = &["xlsx", "xls", "xlsm"];

const PDF_MAGIC: &[u8] = b"%PDF-";
const ZIP_MAGIC: &[u8] = b"PK\x03\x04";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    Pdf,
    Excel,
}

impl FileKind {
    /// Extension used for generated output files of this kind.
    pub fn extension(self) -> &'static str {
        match self {
            FileKind::Pdf => "pdf",
            FileKind::Excel => "xlsx",
        }
    }
}

impl fmt::Display for FileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FileKind::Pdf => "pdf",
            FileKind::Excel => "excel",
        };
        f.write_str(s)
    }
}

/// Classify a file by extension, falling back to leading magic bytes when the
/// extension is unknown. Returns `Ok(None)` for existing but unsupported files.
pub fn detect_kind(path: &Path) -> AppResult<Option<FileKind>> {
    if !path.exists() {
        return Err(AppError::input(
            crate::tr!(
                "ファイルが見つかりません: {}",
                "File not found: {}",
                path.display()
            ),
            Some(crate::tr!(
                "パスを確認してください",
                "Check the file path."
            )),
        ));
    }
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        let ext = ext.to_ascii_lowercase();
        if PDF_EXTENSIONS.contains(&ext.as_str()) {
            return Ok(Some(FileKind::Pdf));
        }
        if EXCEL_EXTENSIONS.contains(&ext.as_str()) {
            return Ok(Some(FileKind::Excel));
        }
    }
    Ok(sniff_kind(path))
}

// Workbooks are the only zip-packaged format accepted here, so a zip header
// is classified as a workbook.
fn sniff_kind(path: &Path) -> Option<FileKind> {
    let mut file = File::open(path).ok()?;
    let mut head = [0u8; 8];
    let read = file.read(&mut head).ok()?;
    let head = &head[..read];
    if head.starts_with(PDF_MAGIC) {
        return Some(FileKind::Pdf);
    }
    if head.starts_with(ZIP_MAGIC) {
        return Some(FileKind::Excel);
    }
    None
}

#[derive(Debug, Default)]
pub struct Validation {
    pub kind: Option<FileKind>,
    pub valid: Vec<PathBuf>,
    pub errors: Vec<String>,
}

/// Validate a set of input files for merging: enough files, all present,
/// all supported, all of one kind, all within the configured limits.
pub fn validate_inputs(paths: &[PathBuf], limits: &Limits) -> Validation {
    let mut validation = Validation::default();

    if paths.is_empty() {
        validation.errors.push(crate::tr!(
            "ファイルが指定されていません",
            "No files provided"
        ));
        return validation;
    }
    if paths.len() < 2 {
        validation.errors.push(crate::tr!(
            "結合には 2 つ以上のファイルが必要です",
            "At least 2 files are required for merging"
        ));
        return validation;
    }
    if paths.len() > limits.max_files {
        validation.errors.push(crate::tr!(
            "ファイル数が上限を超えています: {} (上限 {})",
            "Too many files: {} (limit {})",
            paths.len(),
            limits.max_files
        ));
        return validation;
    }

    let mut kinds = BTreeSet::new();
    for path in paths {
        match detect_kind(path) {
            Ok(Some(kind)) => {
                let size = file_size(path);
                if size > limits.max_file_size {
                    validation.errors.push(crate::tr!(
                        "ファイルが大きすぎます: {} ({})",
                        "File too large: {} ({})",
                        path.display(),
                        format_size(size)
                    ));
                    continue;
                }
                kinds.insert(kind);
                validation.valid.push(path.clone());
            }
            Ok(None) => {
                validation.errors.push(crate::tr!(
                    "未対応のファイル形式です: {}",
                    "Unsupported file type: {}",
                    path.display()
                ));
            }
            Err(err) => {
                validation.errors.push(err.to_string());
            }
        }
    }

    if kinds.len() > 1 {
        let found = kinds
            .iter()
            .map(|kind| kind.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        validation.errors.push(crate::tr!(
            "すべてのファイルは同じ形式である必要があります: {}",
            "All files must be of the same type. Found: {}",
            found
        ));
        validation.valid.clear();
        return validation;
    }
    validation.kind = kinds.into_iter().next();
    validation
}

pub fn is_readable(path: &Path) -> bool {
    path.is_file() && File::open(path).is_ok()
}

pub fn file_size(path: &Path) -> u64 {
    fs::metadata(path).map(|meta| meta.len()).unwrap_or(0)
}

pub fn format_size(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB"];
    if bytes == 0 {
        return "0 B".to_string();
    }
    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    format!("{:.1} {}", size, UNITS[unit])
}

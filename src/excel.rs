use std::collections::HashSet;
use std::path::{Path, PathBuf};

use log::{info, warn};
use serde::Serialize;
use umya_spreadsheet::{Spreadsheet, Worksheet, reader, writer};

use crate::error::{AppError, AppResult};

// Hard limit imposed by the xlsx format.
const SHEET_NAME_LIMIT: usize = 31;

/// Merge workbooks into `output`, one worksheet per source sheet. Sheet names
/// become `<prefix><stem>_<sheet>`, deduplicated and capped at the xlsx limit.
/// Cloning the worksheet carries cell values, styles, merged ranges and
/// row/column dimensions across workbooks.
pub fn merge_workbooks(inputs: &[PathBuf], output: &Path, prefix: &str) -> AppResult<()> {
    let mut merged = umya_spreadsheet::new_file_empty_worksheet();
    let mut used = HashSet::new();

    for input in inputs {
        info!("processing workbook: {}", input.display());
        let book = load_workbook(input)?;
        let stem = file_stem(input);
        for sheet in book.get_sheet_collection() {
            let name = unique_sheet_name(&used, &format!("{prefix}{stem}"), sheet.get_name());
            used.insert(name.clone());
            copy_sheet(sheet, &name, &mut merged)?;
            info!("copied sheet: {} -> {}", sheet.get_name(), name);
        }
    }

    write_workbook(&merged, output)?;
    info!(
        "merged {} workbooks into {}",
        inputs.len(),
        output.display()
    );
    Ok(())
}

/// Merge only the named sheets of each input workbook. Requested names not
/// present in their workbook are skipped with a warning.
pub fn merge_selected(
    selection: &[(PathBuf, Vec<String>)],
    output: &Path,
    prefix: &str,
) -> AppResult<()> {
    let mut merged = umya_spreadsheet::new_file_empty_worksheet();
    let mut used = HashSet::new();

    for (input, wanted) in selection {
        let book = load_workbook(input)?;
        let stem = file_stem(input);
        for name in wanted {
            if !book
                .get_sheet_collection()
                .iter()
                .any(|sheet| sheet.get_name() == name)
            {
                warn!("sheet not found in {}: {}", input.display(), name);
            }
        }
        for sheet in book.get_sheet_collection() {
            if !wanted.iter().any(|name| name == sheet.get_name()) {
                continue;
            }
            let name = unique_sheet_name(&used, &format!("{prefix}{stem}"), sheet.get_name());
            used.insert(name.clone());
            copy_sheet(sheet, &name, &mut merged)?;
            info!("copied sheet: {} -> {}", sheet.get_name(), name);
        }
    }

    write_workbook(&merged, output)
}

fn copy_sheet(source: &Worksheet, name: &str, merged: &mut Spreadsheet) -> AppResult<()> {
    let mut sheet = source.clone();
    sheet.set_name(name);
    merged.add_sheet(sheet).map_err(|err| {
        AppError::merge(
            crate::tr!(
                "シートの追加に失敗しました: {}",
                "Failed to add sheet: {}",
                name
            ),
            Some(err.to_string()),
        )
    })?;
    Ok(())
}

fn unique_sheet_name(used: &HashSet<String>, stem: &str, sheet: &str) -> String {
    let base = truncate_chars(&format!("{stem}_{sheet}"), SHEET_NAME_LIMIT);
    if !used.contains(&base) {
        return base;
    }
    let mut counter = 1usize;
    loop {
        let suffix = format!("_{counter}");
        let head = truncate_chars(&base, SHEET_NAME_LIMIT.saturating_sub(suffix.chars().count()));
        let candidate = format!("{head}{suffix}");
        if !used.contains(&candidate) {
            return candidate;
        }
        counter += 1;
    }
}

fn truncate_chars(value: &str, limit: usize) -> String {
    value.chars().take(limit).collect()
}

/// A workbook is considered mergeable when it parses and has at least one
/// worksheet. Legacy `.xls` files fail here and surface as a warning upstream.
pub fn validate_workbook(path: &Path) -> bool {
    match reader::xlsx::read(path) {
        Ok(book) => book.get_sheet_count() > 0,
        Err(err) => {
            warn!("workbook validation failed for {}: {}", path.display(), err);
            false
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SheetInfo {
    pub name: String,
    pub max_row: u32,
    pub max_column: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExcelInfo {
    pub sheets: usize,
    pub sheet_names: Vec<String>,
    pub sheets_info: Vec<SheetInfo>,
    pub title: Option<String>,
    pub creator: Option<String>,
    pub description: Option<String>,
}

pub fn workbook_info(path: &Path) -> AppResult<ExcelInfo> {
    let book = load_workbook(path)?;
    let mut sheet_names = Vec::new();
    let mut sheets_info = Vec::new();
    for sheet in book.get_sheet_collection() {
        sheet_names.push(sheet.get_name().to_string());
        sheets_info.push(SheetInfo {
            name: sheet.get_name().to_string(),
            max_row: sheet.get_highest_row(),
            max_column: sheet.get_highest_column(),
        });
    }
    let properties = book.get_properties();
    Ok(ExcelInfo {
        sheets: sheet_names.len(),
        sheet_names,
        sheets_info,
        title: non_empty(properties.get_title()),
        creator: non_empty(properties.get_creator()),
        description: non_empty(properties.get_description()),
    })
}

fn load_workbook(path: &Path) -> AppResult<Spreadsheet> {
    reader::xlsx::read(path).map_err(|err| {
        AppError::merge(
            crate::tr!(
                "ワークブックの読み込みに失敗しました: {}",
                "Failed to read workbook: {}",
                path.display()
            ),
            Some(err.to_string()),
        )
    })
}

fn write_workbook(book: &Spreadsheet, output: &Path) -> AppResult<()> {
    writer::xlsx::write(book, output).map_err(|err| {
        AppError::merge(
            crate::tr!(
                "ワークブックの書き込みに失敗しました: {}",
                "Failed to write workbook: {}",
                output.display()
            ),
            Some(err.to_string()),
        )
    })
}

fn non_empty(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

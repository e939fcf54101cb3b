use std::io::Write;

use tabwriter::TabWriter;

use crate::detect::{EXCEL_EXTENSIONS, FileKind, PDF_EXTENSIONS};
use crate::error::{AppError, AppResult};
use crate::merge::{FileInfo, MergeReport, Preview};

pub fn render_formats() -> String {
    let pdf = dotted(PDF_EXTENSIONS);
    let excel = dotted(EXCEL_EXTENSIONS);
    format!("pdf: {pdf}\nexcel: {excel}\n")
}

fn dotted(extensions: &[&str]) -> String {
    extensions
        .iter()
        .map(|ext| format!(".{ext}"))
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn render_preview(preview: &Preview) -> AppResult<String> {
    if !preview.errors.is_empty() {
        let mut out = String::new();
        for error in &preview.errors {
            out.push_str(&crate::tr!("エラー: {}\n", "error: {}\n", error));
        }
        return Ok(out);
    }

    let mut tw = TabWriter::new(vec![]);
    writeln!(tw, "FILE\tKIND\tSIZE\tSTATUS\tDETAIL").map_err(format_failed)?;
    for info in &preview.files {
        writeln!(
            tw,
            "{}\t{}\t{}\t{}\t{}",
            info.name,
            info.kind
                .map(|kind| kind.to_string())
                .unwrap_or_else(|| "-".to_string()),
            info.size_formatted,
            if info.accessible {
                "ok"
            } else {
                "unreadable"
            },
            file_detail(info),
        )
        .map_err(format_failed)?;
    }
    let mut out = into_string(tw)?;
    if let Some(kind) = preview.kind {
        out.push_str(&crate::tr!(
            "ファイル形式: {}\n",
            "file type: {}\n",
            kind
        ));
    }
    out.push_str(&crate::tr!(
        "合計サイズ: {}\n",
        "total size: {}\n",
        preview.total_size_formatted
    ));
    out.push_str(&crate::tr!(
        "推定出力サイズ: {}\n",
        "estimated output size: {}\n",
        preview.estimated_output_size_formatted
    ));
    Ok(out)
}

fn file_detail(info: &FileInfo) -> String {
    if let Some(pdf) = &info.pdf {
        return crate::tr!("{} ページ", "{} pages", pdf.pages);
    }
    if let Some(excel) = &info.excel {
        let mut names = excel
            .sheet_names
            .iter()
            .take(3)
            .cloned()
            .collect::<Vec<_>>()
            .join(", ");
        if excel.sheet_names.len() > 3 {
            names.push_str("...");
        }
        return crate::tr!(
            "{} シート ({})",
            "{} sheets ({})",
            excel.sheets,
            names
        );
    }
    if let Some(error) = &info.error {
        return error.clone();
    }
    "-".to_string()
}

pub fn render_report(report: &MergeReport) -> String {
    let mut out = String::new();
    if report.success {
        out.push_str(&crate::tr!(
            "成功: {}\n",
            "success: {}\n",
            report.message
        ));
        if let Some(output) = &report.output_file {
            out.push_str(&crate::tr!(
                "出力ファイル: {}\n",
                "output file: {}\n",
                output.display()
            ));
        }
    } else {
        out.push_str(&crate::tr!("失敗: {}\n", "failed: {}\n", report.message));
        for error in &report.errors {
            out.push_str(&format!("  - {error}\n"));
        }
    }
    for warning in &report.warnings {
        out.push_str(&crate::tr!("警告: {}\n", "warning: {}\n", warning));
    }
    out
}

pub fn render_info(info: &FileInfo) -> AppResult<String> {
    let mut tw = TabWriter::new(vec![]);
    writeln!(tw, "PATH\t{}", info.path.display()).map_err(format_failed)?;
    writeln!(tw, "NAME\t{}", info.name).map_err(format_failed)?;
    writeln!(tw, "SIZE\t{}", info.size_formatted).map_err(format_failed)?;
    writeln!(
        tw,
        "KIND\t{}",
        info.kind
            .map(|kind| kind.to_string())
            .unwrap_or_else(|| "-".to_string())
    )
    .map_err(format_failed)?;
    writeln!(tw, "ACCESSIBLE\t{}", info.accessible).map_err(format_failed)?;
    if let Some(pdf) = &info.pdf {
        writeln!(tw, "PAGES\t{}", pdf.pages).map_err(format_failed)?;
        writeln!(tw, "TITLE\t{}", pdf.title.as_deref().unwrap_or("-")).map_err(format_failed)?;
        writeln!(tw, "AUTHOR\t{}", pdf.author.as_deref().unwrap_or("-")).map_err(format_failed)?;
        writeln!(tw, "ENCRYPTED\t{}", pdf.encrypted).map_err(format_failed)?;
    }
    if let Some(excel) = &info.excel {
        writeln!(tw, "SHEETS\t{}", excel.sheets).map_err(format_failed)?;
        writeln!(tw, "SHEET_NAMES\t{}", excel.sheet_names.join(", ")).map_err(format_failed)?;
    }
    if let Some(error) = &info.error {
        writeln!(tw, "ERROR\t{error}").map_err(format_failed)?;
    }
    into_string(tw)
}

fn into_string(tw: TabWriter<Vec<u8>>) -> AppResult<String> {
    let output = tw.into_inner().map_err(format_failed)?;
    String::from_utf8(output).map_err(format_failed)
}

fn format_failed(err: impl ToString) -> AppError {
    AppError::merge(
        crate::tr!(
            "出力の整形に失敗しました",
            "Failed to format output"
        ),
        Some(err.to_string()),
    )
}

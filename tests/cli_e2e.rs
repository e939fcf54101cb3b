use std::fs;
use std::path::Path;

use assert_cmd::Command;
use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, Stream, dictionary};
use predicates::prelude::*;
use tempfile::TempDir;

fn docmerge(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("docmerge").unwrap();
    cmd.env("DOCMERGE_LANG", "en");
    cmd.env_remove("DOCMERGE_CONFIG");
    cmd.env("HOME", home);
    cmd.env("USERPROFILE", home);
    cmd
}

fn write_pdf(path: &Path, pages: &[&str]) {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut kids: Vec<Object> = Vec::new();
    for text in pages {
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 36.into()]),
                Operation::new("Td", vec![100.into(), 600.into()]),
                Operation::new("Tj", vec![Object::string_literal(*text)]),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        });
        kids.push(page_id.into());
    }

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => pages.len() as i64,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.save(path).unwrap();
}

fn write_workbook(path: &Path, value: &str) {
    let mut book = umya_spreadsheet::new_file();
    let sheet = book.get_sheet_mut(&0).unwrap();
    sheet.get_cell_mut("A1").set_value(value);
    umya_spreadsheet::writer::xlsx::write(&book, path).unwrap();
}

#[test]
fn formats_lists_supported_extensions() {
    let home = TempDir::new().unwrap();
    let output = docmerge(home.path()).arg("formats").assert().success();
    let stdout = String::from_utf8(output.get_output().stdout.clone()).unwrap();
    insta::assert_snapshot!(stdout.trim_end(), @r"
    pdf: .pdf
    excel: .xlsx, .xls, .xlsm
    ");
}

#[test]
fn merge_two_pdfs_succeeds() {
    let home = TempDir::new().unwrap();
    let dir = TempDir::new().unwrap();
    let a = dir.path().join("a.pdf");
    let b = dir.path().join("b.pdf");
    write_pdf(&a, &["first"]);
    write_pdf(&b, &["second"]);
    let output = dir.path().join("merged.pdf");

    docmerge(home.path())
        .arg("merge")
        .arg(&a)
        .arg(&b)
        .arg("--output")
        .arg(&output)
        .assert()
        .success()
        .stdout(predicate::str::contains("Successfully merged 2 pdf files"));

    let merged = Document::load(&output).unwrap();
    assert_eq!(merged.get_pages().len(), 2);
}

#[test]
fn merge_single_file_fails_with_input_error() {
    let home = TempDir::new().unwrap();
    let dir = TempDir::new().unwrap();
    let a = dir.path().join("a.pdf");
    write_pdf(&a, &["only"]);

    docmerge(home.path())
        .arg("merge")
        .arg(&a)
        .assert()
        .code(4)
        .stderr(predicate::str::contains("At least 2 files"));
}

#[test]
fn merge_mixed_kinds_fails() {
    let home = TempDir::new().unwrap();
    let dir = TempDir::new().unwrap();
    let pdf = dir.path().join("a.pdf");
    let xlsx = dir.path().join("b.xlsx");
    write_pdf(&pdf, &["page"]);
    write_workbook(&xlsx, "v");

    docmerge(home.path())
        .arg("merge")
        .arg(&pdf)
        .arg(&xlsx)
        .assert()
        .code(4)
        .stderr(predicate::str::contains("same type"));
}

#[test]
fn merge_workbooks_names_sheets_after_sources() {
    let home = TempDir::new().unwrap();
    let dir = TempDir::new().unwrap();
    let a = dir.path().join("north.xlsx");
    let b = dir.path().join("south.xlsx");
    write_workbook(&a, "n");
    write_workbook(&b, "s");
    let output = dir.path().join("merged.xlsx");

    docmerge(home.path())
        .arg("merge")
        .arg(&a)
        .arg(&b)
        .arg("--output")
        .arg(&output)
        .assert()
        .success()
        .stdout(predicate::str::contains("Successfully merged 2 excel files"));

    let merged = umya_spreadsheet::reader::xlsx::read(&output).unwrap();
    let names: Vec<_> = merged
        .get_sheet_collection()
        .iter()
        .map(|sheet| sheet.get_name().to_string())
        .collect();
    assert_eq!(names, vec!["north_Sheet1", "south_Sheet1"]);
}

#[test]
fn merge_into_directory_generates_a_name() {
    let home = TempDir::new().unwrap();
    let dir = TempDir::new().unwrap();
    let a = dir.path().join("a.pdf");
    let b = dir.path().join("b.pdf");
    write_pdf(&a, &["first"]);
    write_pdf(&b, &["second"]);
    let out_dir = dir.path().join("out");

    docmerge(home.path())
        .arg("merge")
        .arg(&a)
        .arg(&b)
        .arg("--output")
        .arg(&out_dir)
        .assert()
        .success()
        .stdout(predicate::str::contains("merged_pdf_2files_"));

    assert_eq!(fs::read_dir(&out_dir).unwrap().count(), 1);
}

#[test]
fn merge_json_reports_structure() {
    let home = TempDir::new().unwrap();
    let dir = TempDir::new().unwrap();
    let a = dir.path().join("a.pdf");
    let b = dir.path().join("b.pdf");
    write_pdf(&a, &["first"]);
    write_pdf(&b, &["second"]);
    let output = dir.path().join("merged.pdf");

    docmerge(home.path())
        .arg("merge")
        .arg(&a)
        .arg(&b)
        .arg("--output")
        .arg(&output)
        .arg("--json")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"success\": true"))
        .stdout(predicate::str::contains("\"kind\": \"pdf\""));
}

#[test]
fn preview_prints_table_and_totals() {
    let home = TempDir::new().unwrap();
    let dir = TempDir::new().unwrap();
    let a = dir.path().join("a.pdf");
    let b = dir.path().join("b.pdf");
    write_pdf(&a, &["first"]);
    write_pdf(&b, &["second", "third"]);

    docmerge(home.path())
        .arg("preview")
        .arg(&a)
        .arg(&b)
        .assert()
        .success()
        .stdout(predicate::str::contains("FILE"))
        .stdout(predicate::str::contains("total size:"))
        .stdout(predicate::str::contains("estimated output size:"));

    // Nothing was written besides the inputs.
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 2);
}

#[test]
fn info_json_reports_page_count() {
    let home = TempDir::new().unwrap();
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("doc.pdf");
    write_pdf(&path, &["one", "two"]);

    docmerge(home.path())
        .arg("info")
        .arg(&path)
        .arg("--json")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"pages\": 2"));
}

#[test]
fn info_missing_file_fails_with_input_error() {
    let home = TempDir::new().unwrap();
    let dir = TempDir::new().unwrap();

    docmerge(home.path())
        .arg("info")
        .arg(dir.path().join("nope.pdf"))
        .assert()
        .code(4)
        .stderr(predicate::str::contains("File not found"));
}

#[test]
fn broken_config_fails_with_config_error() {
    let home = TempDir::new().unwrap();
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("config.toml");
    fs::write(&config, "limits = nope").unwrap();
    let a = dir.path().join("a.pdf");
    let b = dir.path().join("b.pdf");
    write_pdf(&a, &["first"]);
    write_pdf(&b, &["second"]);

    docmerge(home.path())
        .env("DOCMERGE_CONFIG", &config)
        .arg("merge")
        .arg(&a)
        .arg(&b)
        .assert()
        .code(3)
        .stderr(predicate::str::contains("parse config file"));
}

#[test]
fn config_sheet_prefix_is_applied() {
    let home = TempDir::new().unwrap();
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("config.toml");
    fs::write(&config, "[excel]\nsheet_prefix = \"in_\"\n").unwrap();
    let a = dir.path().join("north.xlsx");
    let b = dir.path().join("south.xlsx");
    write_workbook(&a, "n");
    write_workbook(&b, "s");
    let output = dir.path().join("merged.xlsx");

    docmerge(home.path())
        .env("DOCMERGE_CONFIG", &config)
        .arg("merge")
        .arg(&a)
        .arg(&b)
        .arg("--output")
        .arg(&output)
        .assert()
        .success();

    let merged = umya_spreadsheet::reader::xlsx::read(&output).unwrap();
    assert_eq!(
        merged.get_sheet_collection()[0].get_name(),
        "in_north_Sheet1"
    );
}

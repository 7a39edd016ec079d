//! Boundary Tests for xlsxmark
//!
//! Empty sheets, giant merges, very wide and very tall sheets, and unusual names.

use rust_xlsxwriter::*;
use std::io::Cursor;
use xlsxmark::{ConversionReport, ConverterBuilder, MergePolicy};

// Helper module for generating boundary test fixtures
mod fixtures {
    use super::*;

    /// Generate a workbook with an empty sheet (no cells)
    pub fn generate_empty_sheet() -> Result<Vec<u8>, XlsxError> {
        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();
        worksheet.set_name("EmptySheet")?;
        workbook.save_to_buffer()
    }

    /// A single merged region covering A1:J100
    pub fn generate_giant_merge() -> Result<Vec<u8>, XlsxError> {
        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();
        worksheet.merge_range(0, 0, 99, 9, "All", &Format::new())?;
        workbook.save_to_buffer()
    }

    /// Values only in the first row and the last Excel column (XFD)
    pub fn generate_max_columns() -> Result<Vec<u8>, XlsxError> {
        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();
        worksheet.write_string(0, 0, "first")?;
        worksheet.write_string(0, 16_383, "last")?;
        workbook.save_to_buffer()
    }

    /// 1,200 rows in column A plus one value in column E below the sampled prefix
    pub fn generate_tall_sheet() -> Result<Vec<u8>, XlsxError> {
        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();
        for row in 0..1_200 {
            worksheet.write_number(row, 0, f64::from(row))?;
        }
        worksheet.write_string(1_100, 4, "late column")?;
        workbook.save_to_buffer()
    }

    /// Sheet names and values outside ASCII, and a name containing `--`
    pub fn generate_unicode() -> Result<Vec<u8>, XlsxError> {
        let mut workbook = Workbook::new();

        let sheet = workbook.add_worksheet();
        sheet.set_name("売上")?;
        sheet.write_string(0, 0, "商品")?;
        sheet.write_string(0, 1, "数量")?;
        sheet.write_string(1, 0, "りんご")?;
        sheet.write_number(1, 1, 12.0)?;

        let sheet = workbook.add_worksheet();
        sheet.set_name("a--b")?;

        workbook.save_to_buffer()
    }

    /// Formula results that are Excel error values
    pub fn generate_error_values() -> Result<Vec<u8>, XlsxError> {
        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();
        worksheet.write_string(0, 0, "Result")?;
        worksheet.write_formula(1, 0, Formula::new("=1/0").set_result("#DIV/0!"))?;
        workbook.save_to_buffer()
    }
}

fn convert_with_report(data: Vec<u8>, builder: ConverterBuilder) -> (String, ConversionReport) {
    let converter = builder.build().unwrap();
    let mut output = Vec::new();
    let report = converter
        .convert_with_report(Cursor::new(data), &mut output)
        .unwrap();
    (String::from_utf8(output).unwrap(), report)
}

#[test]
fn test_empty_sheet_renders_placeholder() {
    let (markdown, report) = convert_with_report(
        fixtures::generate_empty_sheet().unwrap(),
        ConverterBuilder::new().with_title("Book"),
    );
    assert_eq!(
        markdown,
        "# Book\n\n## EmptySheet\n\n<!-- sheet \"EmptySheet\" has no renderable content -->\n"
    );
    assert!(report.sheets[0].empty);
    assert_eq!((report.sheets[0].rows, report.sheets[0].cols), (0, 0));
}

#[test]
fn test_giant_merge_anchor_only_trims_to_anchor() {
    let (markdown, report) = convert_with_report(
        fixtures::generate_giant_merge().unwrap(),
        ConverterBuilder::new(),
    );
    assert!(markdown.ends_with("## Sheet1\n\n| All |\n| --- |\n"));
    assert_eq!((report.sheets[0].rows, report.sheets[0].cols), (1, 1));
}

#[test]
fn test_giant_merge_fill_covers_region() {
    let (markdown, report) = convert_with_report(
        fixtures::generate_giant_merge().unwrap(),
        ConverterBuilder::new().with_merge_policy(MergePolicy::Fill),
    );
    assert_eq!((report.sheets[0].rows, report.sheets[0].cols), (100, 10));

    let row = format!("|{}", " All |".repeat(10));
    let table_rows = markdown.lines().filter(|line| *line == row).count();
    assert_eq!(table_rows, 100);
}

#[test]
fn test_max_columns_are_not_truncated() {
    let (markdown, report) = convert_with_report(
        fixtures::generate_max_columns().unwrap(),
        ConverterBuilder::new(),
    );
    assert_eq!(report.sheets[0].cols, 16_384);

    let header = markdown
        .lines()
        .find(|line| line.starts_with("| first |"))
        .unwrap();
    assert!(header.ends_with(" last |"));
    assert_eq!(header.matches('|').count(), 16_385);
}

#[test]
fn test_tall_sheet_uses_sampling() {
    let (markdown, report) = convert_with_report(
        fixtures::generate_tall_sheet().unwrap(),
        ConverterBuilder::new().with_scan_limits(1_000, 200),
    );
    let sheet = &report.sheets[0];
    assert!(sheet.sampled);
    assert_eq!(sheet.rows, 1_200);
    // サンプリング範囲外の列は推定に含まれない
    assert_eq!(sheet.cols, 1);
    assert!(!markdown.contains("late column"));
    assert!(markdown.contains("| 1199 |"));

    // しきい値を上げると全走査になる
    let (markdown, report) = convert_with_report(
        fixtures::generate_tall_sheet().unwrap(),
        ConverterBuilder::new().with_scan_limits(5_000, 200),
    );
    assert!(!report.sheets[0].sampled);
    assert_eq!(report.sheets[0].cols, 5);
    assert!(markdown.contains("| 1100 |  |  |  | late column |"));
}

#[test]
fn test_unicode_names_and_alignment() {
    let (markdown, report) = convert_with_report(
        fixtures::generate_unicode().unwrap(),
        ConverterBuilder::new().with_column_alignment(true),
    );
    assert!(markdown.contains(
        "## 売上\n\n\
         | 商品   | 数量 |\n\
         | ------ | ---- |\n\
         | りんご | 12   |\n"
    ));
    // `--`はコメントを閉じないよう分割される
    assert!(markdown.contains("<!-- sheet \"a- -b\" has no renderable content -->"));
    assert_eq!(report.sheets[1].name, "a--b");
}

#[test]
fn test_error_values_render_as_text() {
    let (markdown, _) = convert_with_report(
        fixtures::generate_error_values().unwrap(),
        ConverterBuilder::new(),
    );
    assert!(markdown.contains("| Result |\n| --- |\n| #DIV/0! |\n"));
}

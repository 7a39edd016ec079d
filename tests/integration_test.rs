//! Integration Tests for xlsxmark
//!
//! Workbooks are generated in memory with `rust_xlsxwriter` and converted end to end
//! through `ConverterBuilder`.

use rust_xlsxwriter::*;
use std::io::Cursor;
use xlsxmark::{ConverterBuilder, DateFormat, MergePolicy, SheetSelector, XlsxMarkError};

// Helper module for generating test fixtures
mod fixtures {
    use super::*;

    /// Generate a simple 2x2 table Excel file
    pub fn generate_simple_table() -> Result<Vec<u8>, XlsxError> {
        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();

        worksheet.write_string(0, 0, "Header1")?;
        worksheet.write_string(0, 1, "Header2")?;
        worksheet.write_string(1, 0, "Data1")?;
        worksheet.write_string(1, 1, "Data2")?;

        workbook.save_to_buffer()
    }

    /// Generate a workbook with 3 sheets, the second one empty
    pub fn generate_multi_sheets() -> Result<Vec<u8>, XlsxError> {
        let mut workbook = Workbook::new();

        let sheet1 = workbook.add_worksheet();
        sheet1.set_name("First")?;
        sheet1.write_string(0, 0, "first_data")?;

        let sheet2 = workbook.add_worksheet();
        sheet2.set_name("Empty")?;

        let sheet3 = workbook.add_worksheet();
        sheet3.set_name("Third")?;
        sheet3.write_string(0, 0, "third_data")?;

        workbook.save_to_buffer()
    }

    /// Horizontal merge on the header (A1:C1) and a vertical merge in the body (B2:B3)
    pub fn generate_merged_cells() -> Result<Vec<u8>, XlsxError> {
        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();

        worksheet.merge_range(0, 0, 0, 2, "Header", &Format::new())?;
        worksheet.write_string(1, 0, "a")?;
        worksheet.merge_range(1, 1, 2, 1, "X", &Format::new())?;
        worksheet.write_string(1, 2, "c")?;
        worksheet.write_string(2, 0, "tail")?;

        workbook.save_to_buffer()
    }

    /// Cells carrying bold, italic, strikethrough and background fills
    pub fn generate_styles() -> Result<Vec<u8>, XlsxError> {
        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();

        let bold = Format::new().set_bold();
        let italic = Format::new().set_italic();
        let struck = Format::new().set_bold().set_font_strikethrough();
        let yellow = Format::new()
            .set_pattern(FormatPattern::Solid)
            .set_background_color(Color::RGB(0xFFFF00));

        worksheet.write_string_with_format(0, 0, "Bold", &bold)?;
        worksheet.write_string_with_format(0, 1, "Italic", &italic)?;
        worksheet.write_string(1, 0, "plain")?;
        worksheet.write_string_with_format(1, 1, "DELETE ME", &struck)?;
        worksheet.write_string_with_format(2, 0, "warn", &yellow)?;
        worksheet.write_string(2, 1, "ok")?;

        workbook.save_to_buffer()
    }

    /// Hyperlinked cells, with and without formatting
    pub fn generate_hyperlinks() -> Result<Vec<u8>, XlsxError> {
        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();

        let bold = Format::new().set_bold();
        worksheet.write_string(0, 0, "Link")?;
        worksheet.write_url_with_format(
            1,
            0,
            Url::new("https://example.com").set_text("Docs"),
            &bold,
        )?;
        worksheet.write_url(2, 0, "https://example.org/a")?;

        workbook.save_to_buffer()
    }

    /// Values that need escaping, numbers, booleans, dates and formulas
    pub fn generate_values() -> Result<Vec<u8>, XlsxError> {
        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();

        let date_format = Format::new().set_num_format("yyyy-mm-dd");
        let date = ExcelDateTime::from_ymd(2024, 3, 15)?;

        worksheet.write_string(0, 0, "Text")?;
        worksheet.write_string(0, 1, "Value")?;
        worksheet.write_string(1, 0, "pipe")?;
        worksheet.write_string(1, 1, "a|b")?;
        worksheet.write_string(2, 0, "newline")?;
        worksheet.write_string(2, 1, "line1\nline2")?;
        worksheet.write_string(3, 0, "number")?;
        worksheet.write_number(3, 1, 42.0)?;
        worksheet.write_string(4, 0, "float")?;
        worksheet.write_number(4, 1, 3.25)?;
        worksheet.write_string(5, 0, "bool")?;
        worksheet.write_boolean(5, 1, true)?;
        worksheet.write_string(6, 0, "date")?;
        worksheet.write_datetime_with_format(6, 1, &date, &date_format)?;
        worksheet.write_string(7, 0, "formula")?;
        worksheet.write_formula(7, 1, Formula::new("=SUM(B4:B5)").set_result("45.25"))?;

        workbook.save_to_buffer()
    }

    /// Content placed away from A1 (rows 5-7, columns A-C) with an explicit empty header column
    pub fn generate_offset_table() -> Result<Vec<u8>, XlsxError> {
        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();

        for row in 4..7 {
            for col in 1..3 {
                worksheet.write_string(row, col, &format!("R{}C{}", row + 1, col + 1))?;
            }
        }

        workbook.save_to_buffer()
    }
}

fn convert(data: Vec<u8>, builder: ConverterBuilder) -> String {
    let converter = builder.build().unwrap();
    converter.convert_to_string(Cursor::new(data)).unwrap()
}

#[test]
fn test_simple_table() {
    let markdown = convert(
        fixtures::generate_simple_table().unwrap(),
        ConverterBuilder::new().with_title("Book"),
    );
    assert_eq!(
        markdown,
        "# Book\n\n## Sheet1\n\n| Header1 | Header2 |\n| --- | --- |\n| Data1 | Data2 |\n"
    );
}

#[test]
fn test_default_title() {
    let markdown = convert(
        fixtures::generate_simple_table().unwrap(),
        ConverterBuilder::new(),
    );
    assert!(markdown.starts_with("# Workbook\n\n## Sheet1\n"));
}

#[test]
fn test_multi_sheets_keep_order_and_placeholder() {
    let markdown = convert(
        fixtures::generate_multi_sheets().unwrap(),
        ConverterBuilder::new().with_title("Book"),
    );
    assert_eq!(
        markdown,
        "# Book\n\
         \n\
         ## First\n\
         \n\
         | first_data |\n\
         | --- |\n\
         \n\
         ## Empty\n\
         \n\
         <!-- sheet \"Empty\" has no renderable content -->\n\
         \n\
         ## Third\n\
         \n\
         | third_data |\n\
         | --- |\n"
    );
}

#[test]
fn test_sheet_selection() {
    let data = fixtures::generate_multi_sheets().unwrap();

    let markdown = convert(
        data.clone(),
        ConverterBuilder::new().with_sheet_selector(SheetSelector::Index(2)),
    );
    assert!(markdown.contains("## Third"));
    assert!(!markdown.contains("## First"));

    let markdown = convert(
        data.clone(),
        ConverterBuilder::new().with_sheet_selector(SheetSelector::Names(vec![
            "Third".to_string(),
            "First".to_string(),
        ])),
    );
    let third = markdown.find("## Third").unwrap();
    let first = markdown.find("## First").unwrap();
    assert!(third < first);

    let converter = ConverterBuilder::new()
        .with_sheet_selector(SheetSelector::Name("Missing".to_string()))
        .build()
        .unwrap();
    match converter.convert_to_string(Cursor::new(data)) {
        Err(XlsxMarkError::Config(msg)) => assert!(msg.contains("Missing")),
        other => panic!("Expected Config error, got {:?}", other),
    }
}

#[test]
fn test_merged_cells_anchor_only() {
    let markdown = convert(
        fixtures::generate_merged_cells().unwrap(),
        ConverterBuilder::new(),
    );
    assert!(markdown.contains(
        "| Header |  |  |\n\
         | --- | --- | --- |\n\
         | a | X | c |\n\
         | tail |  |  |\n"
    ));
}

#[test]
fn test_merged_cells_fill() {
    let markdown = convert(
        fixtures::generate_merged_cells().unwrap(),
        ConverterBuilder::new().with_merge_policy(MergePolicy::Fill),
    );
    assert!(markdown.contains(
        "| Header | Header | Header |\n\
         | --- | --- | --- |\n\
         | a | X | c |\n\
         | tail | X |  |\n"
    ));
}

#[test]
fn test_style_annotations() {
    let markdown = convert(fixtures::generate_styles().unwrap(), ConverterBuilder::new());
    assert!(markdown.contains("| **Bold** | _Italic_ |"));
    // 取り消し線付きセルは空
    assert!(markdown.contains("| plain |  |"));
    assert!(!markdown.contains("DELETE ME"));
    assert!(markdown.contains("| warn | ok |"));
}

#[test]
fn test_style_options() {
    let data = fixtures::generate_styles().unwrap();

    let markdown = convert(
        data.clone(),
        ConverterBuilder::new()
            .with_strikethrough_suppression(false)
            .with_background_markup(true),
    );
    assert!(markdown.contains("| plain | **~~DELETE ME~~** |"));
    assert!(markdown.contains("| <span data-bg=\"yellow\">warn</span> | ok |"));

    let markdown = convert(data, ConverterBuilder::new().with_style_annotations(false));
    assert!(markdown.contains("| Bold | Italic |"));
    assert!(markdown.contains("| plain | DELETE ME |"));
}

#[test]
fn test_hyperlinks() {
    let markdown = convert(fixtures::generate_hyperlinks().unwrap(), ConverterBuilder::new());
    assert!(markdown.contains("| **[Docs](https://example.com)** |"));
    assert!(markdown.contains("| [https://example.org/a](https://example.org/a) |"));
}

#[test]
fn test_value_formatting() {
    let markdown = convert(fixtures::generate_values().unwrap(), ConverterBuilder::new());
    assert!(markdown.contains("| pipe | a\\|b |"));
    assert!(markdown.contains("| newline | line1<br>line2 |"));
    assert!(markdown.contains("| number | 42 |"));
    assert!(markdown.contains("| float | 3.25 |"));
    assert!(markdown.contains("| bool | TRUE |"));
    assert!(markdown.contains("| date | 2024-03-15 |"));
    assert!(markdown.contains("| formula | 45.25 |"));

    // 各行のセル数はヘッダーと同じ（エスケープしたパイプは区切りにならない）
    for line in markdown.lines().filter(|line| line.starts_with('|')) {
        let pipes = line.matches('|').count() - line.matches("\\|").count();
        assert_eq!(pipes, 3, "row has wrong cell count: {}", line);
    }
}

#[test]
fn test_custom_date_format() {
    let markdown = convert(
        fixtures::generate_values().unwrap(),
        ConverterBuilder::new().with_date_format(DateFormat::Custom("%Y年%m月%d日".to_string())),
    );
    assert!(markdown.contains("| date | 2024年03月15日 |"));
}

#[test]
fn test_trimming_keeps_first_column() {
    let data = fixtures::generate_offset_table().unwrap();

    let markdown = convert(data.clone(), ConverterBuilder::new());
    assert!(markdown.contains(
        "|  | R5C2 | R5C3 |\n\
         | --- | --- | --- |\n\
         |  | R6C2 | R6C3 |\n\
         |  | R7C2 | R7C3 |\n"
    ));

    // トリミングなしでは先頭の空行も出力される
    let markdown = convert(data, ConverterBuilder::new().with_trimming(false));
    let table_rows = markdown.lines().filter(|line| line.starts_with('|')).count();
    assert_eq!(table_rows, 8);
}

#[test]
fn test_convert_with_report() {
    let converter = ConverterBuilder::new().with_title("Book").build().unwrap();
    let mut output = Vec::new();
    let report = converter
        .convert_with_report(
            Cursor::new(fixtures::generate_multi_sheets().unwrap()),
            &mut output,
        )
        .unwrap();

    assert_eq!(report.title, "Book");
    let names: Vec<&str> = report.sheets.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["First", "Empty", "Third"]);
    assert_eq!(report.empty_sheets().collect::<Vec<_>>(), vec!["Empty"]);
    assert_eq!((report.sheets[0].rows, report.sheets[0].cols), (1, 1));

    let markdown = String::from_utf8(output).unwrap();
    assert!(markdown.ends_with("| third_data |\n| --- |\n"));
}

#[test]
fn test_parallel_conversion_matches_sequential() {
    let data = fixtures::generate_multi_sheets().unwrap();
    let sequential = convert(data.clone(), ConverterBuilder::new());
    let parallel = convert(data, ConverterBuilder::new().with_parallel_sheets(true));
    assert_eq!(sequential, parallel);
}

#[test]
fn test_column_alignment() {
    let markdown = convert(
        fixtures::generate_simple_table().unwrap(),
        ConverterBuilder::new().with_column_alignment(true),
    );
    assert!(markdown.contains("| Header1 | Header2 |\n| ------- | ------- |\n| Data1   | Data2   |\n"));
}

#[test]
fn test_convert_file_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let input_path = dir.path().join("book.xlsx");
    let output_path = dir.path().join("book.md");

    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name("Data").unwrap();
    worksheet.write_string(0, 0, "Name").unwrap();
    worksheet.write_string(1, 0, "apple").unwrap();
    workbook.save(&input_path).unwrap();

    let converter = ConverterBuilder::new().with_title("book").build().unwrap();
    let input = std::fs::File::open(&input_path).unwrap();
    let output = std::fs::File::create(&output_path).unwrap();
    converter.convert(input, output).unwrap();

    let markdown = std::fs::read_to_string(&output_path).unwrap();
    assert_eq!(
        markdown,
        "# book\n\n## Data\n\n| Name |\n| --- |\n| apple |\n"
    );
}

//! xlsxmark - Excel workbook to Markdown converter
//!
//! This crate converts XLSX workbooks into a single Markdown document with one table per sheet.
//! Merged cells are resolved into a single logical grid, empty edges are trimmed, and cell styles
//! (bold, italic, strikethrough, background color) are approximated with Markdown-safe markup.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use std::fs::File;
//! use xlsxmark::ConverterBuilder;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Create a converter with default settings
//!     let converter = ConverterBuilder::new().build()?;
//!
//!     let input = File::open("example.xlsx")?;
//!     let output = File::create("example.md")?;
//!
//!     converter.convert(input, output)?;
//!
//!     Ok(())
//! }
//! ```
//!
//! # Custom Configuration
//!
//! ```rust,no_run
//! use std::fs::File;
//! use xlsxmark::{ConverterBuilder, DateFormat, MergePolicy, SheetSelector};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let converter = ConverterBuilder::new()
//!         .with_sheet_selector(SheetSelector::Name("Summary".to_string()))
//!         .with_merge_policy(MergePolicy::Fill) // repeat merged values in every cell
//!         .with_strikethrough_suppression(false) // render ~~struck~~ text instead of hiding it
//!         .with_date_format(DateFormat::Custom("%Y/%m/%d".to_string()))
//!         .with_title("Quarterly Summary")
//!         .build()?;
//!
//!     let markdown = converter.convert_to_string(File::open("example.xlsx")?)?;
//!     println!("{}", markdown);
//!
//!     Ok(())
//! }
//! ```
//!
//! # In-Memory Workbooks
//!
//! The rendering pipeline does not depend on the XLSX reader; a [`Workbook`] can be built directly.
//!
//! ```rust
//! use xlsxmark::{Cell, CellCoord, CellStyle, ConverterBuilder, Sheet, Workbook};
//!
//! # fn main() -> Result<(), xlsxmark::XlsxMarkError> {
//! let sheet = Sheet::new("Links")
//!     .with_cell(Cell::new(CellCoord::new(1, 1), "Docs")
//!         .with_style(CellStyle::bold())
//!         .with_hyperlink("https://example.com"));
//!
//! let converter = ConverterBuilder::new().build()?;
//! let markdown = converter.render_workbook(&Workbook::new("Book").with_sheet(sheet));
//! assert!(markdown.contains("| **[Docs](https://example.com)** |"));
//! # Ok(())
//! # }
//! ```

mod api;
mod builder;
mod error;
mod formatter;
mod grid;
mod merge;
mod parser;
mod report;
mod security;
mod style;
mod trim;
mod types;

// 公開API
pub use api::{DateFormat, MergePolicy, ScanLimits, SheetSelector};
pub use builder::{Converter, ConverterBuilder};
pub use error::XlsxMarkError;
pub use report::{ConversionReport, SheetReport};
pub use style::{annotate, StyleTag, StyleTagSet};
pub use types::{
    Cell, CellCoord, CellRange, CellStyle, CellValue, MergedRegion, Rgb, Sheet, Workbook,
};

//! xlsxmark CLI
//!
//! Convert an XLSX workbook into a Markdown document with one table per sheet.

use std::fs::File;
use std::io::{self, BufReader, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tracing::info;
use tracing_subscriber::EnvFilter;
use xlsxmark::{ConversionReport, ConverterBuilder, MergePolicy, SheetSelector};

/// How merged regions are rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum MergeMode {
    /// Only the top-left cell of a merged region carries the value
    AnchorOnly,
    /// Every cell of a merged region repeats the value
    Fill,
}

impl From<MergeMode> for MergePolicy {
    fn from(mode: MergeMode) -> Self {
        match mode {
            MergeMode::AnchorOnly => MergePolicy::AnchorOnly,
            MergeMode::Fill => MergePolicy::Fill,
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "xlsxmark", version)]
#[command(about = "Convert an Excel workbook (.xlsx) into Markdown tables")]
struct Args {
    /// Path to the input workbook
    input: PathBuf,

    /// Output path (default: input file name with `.md`; `-` writes to stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Merged-cell rendering
    #[arg(long, value_enum, default_value = "anchor-only")]
    merge_mode: MergeMode,

    /// Do not annotate bold, italic, strikethrough or background color
    #[arg(long)]
    no_style: bool,

    /// Keep empty edge rows and columns (render the declared sheet size)
    #[arg(long)]
    no_trim: bool,

    /// Render struck-through cells as ~~text~~ instead of leaving them empty
    #[arg(long)]
    keep_strikethrough: bool,

    /// Convert only the named sheet (repeatable)
    #[arg(long = "sheet", value_name = "NAME")]
    sheets: Vec<String>,

    /// Print a JSON conversion report
    #[arg(long)]
    report: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let title = args
        .input
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .filter(|stem| !stem.trim().is_empty())
        .unwrap_or_else(|| "Workbook".to_string());

    let selector = if args.sheets.is_empty() {
        SheetSelector::All
    } else {
        SheetSelector::Names(args.sheets.clone())
    };

    let converter = ConverterBuilder::new()
        .with_merge_policy(args.merge_mode.into())
        .with_style_annotations(!args.no_style)
        .with_trimming(!args.no_trim)
        .with_strikethrough_suppression(!args.keep_strikethrough)
        .with_sheet_selector(selector)
        .with_title(title)
        .build()
        .context("Invalid converter configuration")?;

    let input = File::open(&args.input)
        .with_context(|| format!("Failed to open {}", args.input.display()))?;

    let output_path = args
        .output
        .clone()
        .unwrap_or_else(|| args.input.with_extension("md"));
    let to_stdout = output_path == Path::new("-");

    let report = if to_stdout {
        converter
            .convert_with_report(BufReader::new(input), io::stdout().lock())
            .with_context(|| format!("Failed to convert {}", args.input.display()))?
    } else {
        let output = File::create(&output_path)
            .with_context(|| format!("Failed to create {}", output_path.display()))?;
        let report = converter
            .convert_with_report(BufReader::new(input), output)
            .with_context(|| format!("Failed to convert {}", args.input.display()))?;
        info!(output = %output_path.display(), "wrote markdown");
        report
    };

    if args.report {
        // Markdownを標準出力に書いた場合、レポートは標準エラー出力へ
        if to_stdout {
            print_report(&report, io::stderr().lock())?;
        } else {
            print_report(&report, io::stdout().lock())?;
        }
    }

    Ok(())
}

/// ログ出力を初期化（標準エラー出力、`RUST_LOG`で上書き可能）
fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn print_report(report: &ConversionReport, mut writer: impl Write) -> Result<()> {
    serde_json::to_writer_pretty(&mut writer, report).context("Failed to serialize report")?;
    writeln!(writer)?;
    Ok(())
}

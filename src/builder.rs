//! Builder Module
//!
//! Fluent Builder APIを提供し、`Converter`インスタンスを段階的に構築する。
//! `Converter`はドキュメント全体の組み立て（タイトル、シートごとのブロック、結合）を担当します。

use std::io::{BufWriter, Read, Seek, Write};
use std::time::Instant;

use rayon::prelude::*;
use tracing::info;

use crate::api::{DateFormat, MergePolicy, ScanLimits, SheetSelector};
use crate::error::XlsxMarkError;
use crate::formatter::DateFormatter;
use crate::grid::{self, RenderedSheet};
use crate::parser::WorkbookParser;
use crate::report::ConversionReport;
use crate::types::Workbook;

/// タイトルが決まらない場合の既定値
const DEFAULT_TITLE: &str = "Workbook";

/// カスタム日付形式の検証に使うシリアル値（2025-01-01）
const PROBE_DATE_SERIAL: f64 = 45_658.0;

/// 変換処理の設定を保持する内部構造体
///
/// `build()`で検証された後は変更されず、各コンポーネントへ参照で渡されます。
#[derive(Debug, Clone)]
pub(crate) struct ConversionConfig {
    /// セル結合の扱い
    pub merge_policy: MergePolicy,

    /// スタイルタグを付与するか
    pub style_annotations: bool,

    /// 空の端（行・列）を除去するか
    pub trim: bool,

    /// 取り消し線付きセルを空として出力するか
    pub suppress_strikethrough: bool,

    /// 塗りつぶし色を`<span data-bg="...">`で出力するか
    pub background_markup: bool,

    /// 列幅を揃えて出力するか
    pub align_columns: bool,

    /// 大きなシートの走査制限
    pub scan_limits: ScanLimits,

    /// 日付形式
    pub date_format: DateFormat,

    /// シート選択方式
    pub sheet_selector: SheetSelector,

    /// ドキュメントのタイトル（`None`の場合はワークブック名）
    pub title: Option<String>,

    /// シートを並列に描画するか
    pub parallel: bool,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            merge_policy: MergePolicy::AnchorOnly,
            style_annotations: true,
            trim: true,
            suppress_strikethrough: true,
            background_markup: false,
            align_columns: false,
            scan_limits: ScanLimits::default(),
            date_format: DateFormat::Iso8601,
            sheet_selector: SheetSelector::All,
            title: None,
            parallel: false,
        }
    }
}

/// Fluent Builder APIを提供する構造体
///
/// すべての設定項目にデフォルト値が設定されており、必要な設定のみをオーバーライドできます。
///
/// # 使用例
///
/// ```rust,no_run
/// use xlsxmark::{ConverterBuilder, MergePolicy, SheetSelector};
///
/// # fn main() -> Result<(), xlsxmark::XlsxMarkError> {
/// let converter = ConverterBuilder::new()
///     .with_sheet_selector(SheetSelector::Index(0))
///     .with_merge_policy(MergePolicy::Fill)
///     .build()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default)]
pub struct ConverterBuilder {
    /// 内部設定（構築中）
    config: ConversionConfig,
}

impl ConverterBuilder {
    /// デフォルト設定を持つビルダーインスタンスを生成する
    ///
    /// # デフォルト設定
    ///
    /// - セル結合: アンカーセルのみ
    /// - スタイルタグ: 有効
    /// - トリミング: 有効
    /// - 取り消し線付きセルの抑制: 有効
    /// - 背景色のマークアップ: 無効
    /// - 列幅の整列: 無効
    /// - 走査制限: 公称サイズ1000超で先頭200行をサンプリング
    /// - 日付形式: ISO 8601
    /// - シート選択: すべてのシート
    pub fn new() -> Self {
        Self::default()
    }

    /// セル結合の扱いを指定する
    ///
    /// ```rust,no_run
    /// use xlsxmark::{ConverterBuilder, MergePolicy};
    ///
    /// let builder = ConverterBuilder::new().with_merge_policy(MergePolicy::Fill);
    /// ```
    pub fn with_merge_policy(mut self, policy: MergePolicy) -> Self {
        self.config.merge_policy = policy;
        self
    }

    /// スタイルタグ（太字・斜体・取り消し線・背景色）の付与を切り替える
    ///
    /// 無効にした場合、取り消し線による抑制も行われません。ハイパーリンクは常に出力されます。
    pub fn with_style_annotations(mut self, enabled: bool) -> Self {
        self.config.style_annotations = enabled;
        self
    }

    /// 空の端の除去を切り替える
    ///
    /// 無効にした場合、シートの公称サイズ全体を出力します。
    pub fn with_trimming(mut self, enabled: bool) -> Self {
        self.config.trim = enabled;
        self
    }

    /// 取り消し線付きセルを空として出力するかを切り替える
    ///
    /// 無効にした場合、取り消し線は`~~text~~`として出力されます。
    pub fn with_strikethrough_suppression(mut self, enabled: bool) -> Self {
        self.config.suppress_strikethrough = enabled;
        self
    }

    pub fn with_background_markup(mut self, enabled: bool) -> Self {
        self.config.background_markup = enabled;
        self
    }

    pub fn with_column_alignment(mut self, enabled: bool) -> Self {
        self.config.align_columns = enabled;
        self
    }

    /// 大きなシートの走査制限を指定する
    ///
    /// # 引数
    ///
    /// * `threshold` - 公称の行数または列数がこれを超えるとサンプリングに切り替える
    /// * `sample_rows` - サンプリング時に列数の推定に使う先頭行数
    ///
    /// # 制約
    ///
    /// どちらも0より大きくなければならない（`build()`時に検証）
    pub fn with_scan_limits(mut self, threshold: u32, sample_rows: u32) -> Self {
        self.config.scan_limits = ScanLimits {
            threshold,
            sample_rows,
        };
        self
    }

    /// 日付の出力形式を指定する
    ///
    /// ```rust,no_run
    /// use xlsxmark::{ConverterBuilder, DateFormat};
    ///
    /// let builder = ConverterBuilder::new()
    ///     .with_date_format(DateFormat::Custom("%Y/%m/%d".to_string()));
    /// ```
    pub fn with_date_format(mut self, format: DateFormat) -> Self {
        self.config.date_format = format;
        self
    }

    /// 変換対象のシートを選択する
    ///
    /// ```rust,no_run
    /// use xlsxmark::{ConverterBuilder, SheetSelector};
    ///
    /// let builder = ConverterBuilder::new()
    ///     .with_sheet_selector(SheetSelector::Names(vec!["Summary".to_string()]));
    /// ```
    pub fn with_sheet_selector(mut self, selector: SheetSelector) -> Self {
        self.config.sheet_selector = selector;
        self
    }

    /// ドキュメントのタイトル（`# <title>`）を指定する
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.config.title = Some(title.into());
        self
    }

    /// シートを`rayon`で並列に描画するかを切り替える
    ///
    /// 出力の順序と内容は逐次描画と同一です。
    pub fn with_parallel_sheets(mut self, enabled: bool) -> Self {
        self.config.parallel = enabled;
        self
    }

    /// 設定を検証し、`Converter`インスタンスを生成する
    ///
    /// # 戻り値
    ///
    /// * `Ok(Converter)` - 設定が有効な場合
    /// * `Err(XlsxMarkError::Config)` - 設定が無効な場合
    ///   * 走査制限のいずれかが0
    ///   * カスタム日付形式が空、または出力を生成しない
    ///   * タイトルが空白のみ
    pub fn build(self) -> Result<Converter, XlsxMarkError> {
        // 1. 走査制限
        let limits = self.config.scan_limits;
        if limits.threshold == 0 || limits.sample_rows == 0 {
            return Err(XlsxMarkError::Config(format!(
                "Scan limits must be non-zero (threshold: {}, sample_rows: {})",
                limits.threshold, limits.sample_rows
            )));
        }

        // 2. カスタム日付形式（テスト用の日付でフォーマット試行）
        if let DateFormat::Custom(ref pattern) = self.config.date_format {
            let formatted = DateFormatter.format(PROBE_DATE_SERIAL, &self.config.date_format);
            if formatted.map_or(true, |s| s.is_empty()) {
                return Err(XlsxMarkError::Config(format!(
                    "Invalid date format string: '{}'",
                    pattern
                )));
            }
        }

        // 3. タイトル
        if let Some(ref title) = self.config.title {
            if title.trim().is_empty() {
                return Err(XlsxMarkError::Config(
                    "Title must not be blank".to_string(),
                ));
            }
        }

        Ok(Converter {
            config: self.config,
        })
    }
}

/// 変換処理のファサード
///
/// XLSXファイルまたはメモリ上の`Workbook`をMarkdownドキュメントに変換します。
///
/// # 使用例
///
/// ```rust,no_run
/// use std::fs::File;
/// use xlsxmark::ConverterBuilder;
///
/// # fn main() -> Result<(), xlsxmark::XlsxMarkError> {
/// let converter = ConverterBuilder::new().build()?;
/// let input = File::open("book.xlsx")?;
/// let output = File::create("book.md")?;
/// converter.convert(input, output)?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Converter {
    config: ConversionConfig,
}

impl Converter {
    /// メモリ上の`Workbook`をMarkdownドキュメントに変換
    ///
    /// 失敗しない操作です。空のシートはプレースホルダー、縮退した結合範囲はスキップされます。
    pub fn render_workbook(&self, workbook: &Workbook) -> String {
        self.render_workbook_with_report(workbook).0
    }

    /// メモリ上の`Workbook`を変換し、変換結果のレポートも返す
    ///
    /// # 戻り値
    ///
    /// `(Markdownドキュメント, レポート)`
    pub fn render_workbook_with_report(&self, workbook: &Workbook) -> (String, ConversionReport) {
        let started = Instant::now();
        let title = self.resolve_title(workbook);

        // collect()はインデックス順を保つため、並列でも出力順はシート順
        let rendered: Vec<RenderedSheet> = if self.config.parallel {
            workbook
                .sheets
                .par_iter()
                .map(|sheet| grid::render_sheet(sheet, &self.config))
                .collect()
        } else {
            workbook
                .sheets
                .iter()
                .map(|sheet| grid::render_sheet(sheet, &self.config))
                .collect()
        };

        let mut document = format!("# {}\n", title);
        let mut report = ConversionReport {
            title,
            sheets: Vec::with_capacity(rendered.len()),
        };
        for sheet in rendered {
            document.push('\n');
            document.push_str(&sheet.markdown);
            document.push('\n');
            report.sheets.push(sheet.report);
        }

        info!(
            title = %report.title,
            sheets = report.sheets.len(),
            empty_sheets = report.empty_sheets().count(),
            skipped_regions = report.skipped_region_count(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "rendered workbook"
        );

        (document, report)
    }

    /// XLSXファイルをMarkdown形式に変換
    ///
    /// # 引数
    ///
    /// * `input` - XLSXファイルを読み込むためのリーダー
    /// * `output` - Markdown出力先のライター
    ///
    /// # 戻り値
    ///
    /// * `Ok(())` - 変換に成功した場合
    /// * `Err(XlsxMarkError)` - 読み込み・解析・書き込みでエラーが発生した場合
    pub fn convert<R: Read + Seek, W: Write>(
        &self,
        input: R,
        output: W,
    ) -> Result<(), XlsxMarkError> {
        self.convert_with_report(input, output).map(|_| ())
    }

    /// XLSXファイルをMarkdown形式の文字列に変換
    pub fn convert_to_string<R: Read + Seek>(&self, input: R) -> Result<String, XlsxMarkError> {
        let workbook = self.parse(input)?;
        Ok(self.render_workbook(&workbook))
    }

    /// XLSXファイルを変換し、変換結果のレポートを返す
    ///
    /// # 使用例
    ///
    /// ```rust,no_run
    /// use std::fs::File;
    /// use xlsxmark::ConverterBuilder;
    ///
    /// # fn main() -> Result<(), xlsxmark::XlsxMarkError> {
    /// let converter = ConverterBuilder::new().with_title("Inventory").build()?;
    /// let report = converter.convert_with_report(File::open("inventory.xlsx")?, std::io::stdout())?;
    /// for name in report.empty_sheets() {
    ///     eprintln!("empty sheet: {}", name);
    /// }
    /// # Ok(())
    /// # }
    /// ```
    pub fn convert_with_report<R: Read + Seek, W: Write>(
        &self,
        input: R,
        output: W,
    ) -> Result<ConversionReport, XlsxMarkError> {
        let workbook = self.parse(input)?;
        let (document, report) = self.render_workbook_with_report(&workbook);

        let mut writer = BufWriter::new(output);
        writer.write_all(document.as_bytes())?;
        writer.flush()?;

        Ok(report)
    }

    /// XLSXファイルを解析し、選択されたシートを持つ`Workbook`を構築
    pub fn parse<R: Read + Seek>(&self, input: R) -> Result<Workbook, XlsxMarkError> {
        let mut parser = WorkbookParser::open(input)?;
        let name = self.config.title.as_deref().unwrap_or_default();
        parser.parse_workbook(name, &self.config.sheet_selector)
    }

    /// タイトルを決定（設定 > ワークブック名 > 既定値）
    fn resolve_title(&self, workbook: &Workbook) -> String {
        let title = self
            .config
            .title
            .as_deref()
            .unwrap_or(workbook.name.as_str())
            .trim();
        let title = if title.is_empty() { DEFAULT_TITLE } else { title };
        // 見出しは1行に収める
        title.split_whitespace().collect::<Vec<_>>().join(" ")
    }
}

//! Table Renderer Module
//!
//! シートから実効的なトークングリッドを構築し、Markdownテーブルとして出力するモジュール。
//! 結合範囲の解決とトリミングはここで組み合わされます。

use std::time::Instant;

use tracing::{debug, info};
use unicode_width::UnicodeWidthStr;

use crate::builder::ConversionConfig;
use crate::formatter::CellFormatter;
use crate::merge::{self, EffectiveGrid, Placement};
use crate::report::SheetReport;
use crate::trim;
use crate::types::Sheet;

/// 区切り行の最小幅
const MIN_SEPARATOR_WIDTH: usize = 3;

/// 進捗ログを出す描画範囲の最小行数
const PROGRESS_MIN_ROWS: u32 = 1_000;

/// 進捗ログの間隔（行）
const PROGRESS_INTERVAL: u32 = 100;

/// 進捗ログを出す行かどうか
fn is_progress_row(row: u32, total_rows: u32) -> bool {
    total_rows >= PROGRESS_MIN_ROWS && row % PROGRESS_INTERVAL == 0
}

/// 論理的なグリッド構造（行 × 列のフォーマット済みトークン）
///
/// 行ごとの列数は揃っていなくてもよく、出力時に最も長い行に合わせて右側を空セルで埋めます。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct LogicalGrid {
    rows: Vec<Vec<String>>,
}

impl LogicalGrid {
    /// トークンの行からグリッドを生成
    pub fn from_rows(rows: Vec<Vec<String>>) -> Self {
        Self { rows }
    }

    /// シートからグリッドを構築
    ///
    /// 1. 縮退した結合範囲を除外
    /// 2. 描画範囲を決定（トリミング有効時は使用範囲、無効時は公称サイズ。いずれも結合範囲で拡張）
    /// 3. 結合範囲を描画範囲内で解決
    /// 4. 各位置のトークンを生成
    /// 5. トリミング有効時は空の端を除去
    ///
    /// # 引数
    ///
    /// * `sheet` - 対象シート
    /// * `config` - 変換設定
    ///
    /// # 戻り値
    ///
    /// 構築したグリッドと、シートの変換結果（`rows`/`cols`/`empty`はグリッドの最終形を反映）
    pub fn build(sheet: &Sheet, config: &ConversionConfig) -> (Self, SheetReport) {
        let (valid, degenerate) = merge::partition_regions(sheet);

        let window = if config.trim {
            trim::used_extent(sheet, &valid, config.scan_limits, config.merge_policy)
        } else {
            trim::nominal_window(sheet, &valid, config.merge_policy)
        };

        let mut report = SheetReport {
            name: sheet.name().to_string(),
            skipped_regions: degenerate.iter().map(|r| r.range.to_string()).collect(),
            sampled: window.sampled,
            ..Default::default()
        };

        if window.is_empty() {
            report.empty = true;
            return (Self::default(), report);
        }

        let formatter = CellFormatter::new(config);
        let effective = EffectiveGrid::resolve(sheet, &valid, (window.rows, window.cols), &formatter);

        let mut rows = vec![vec![String::new(); window.cols as usize]; window.rows as usize];
        let mut last_row = 0;
        for cell in sheet.cells_up_to_row(window.rows) {
            let coord = cell.coord;
            if coord.row != last_row {
                last_row = coord.row;
                if is_progress_row(coord.row, window.rows) {
                    debug!(
                        sheet = sheet.name(),
                        row = coord.row,
                        total_rows = window.rows,
                        "filling rows"
                    );
                }
            }
            if coord.col > window.cols || effective.placement(coord).is_some() {
                continue;
            }
            rows[(coord.row - 1) as usize][(coord.col - 1) as usize] = formatter.format_cell(cell);
        }
        // 結合範囲内はセルの有無にかかわらず実効的な内容で埋める（Suppressedは空のまま）
        for (coord, placement) in effective.iter() {
            if let Placement::Text(text) = placement {
                rows[(coord.row - 1) as usize][(coord.col - 1) as usize] = text.clone();
            }
        }

        if config.trim {
            trim::trim_edges(&mut rows);
        }

        let grid = Self { rows };
        report.rows = grid.row_count();
        report.cols = grid.col_count();
        report.empty = grid.is_empty();
        (grid, report)
    }

    /// 行数
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// 列数（最も長い行の列数）
    pub fn col_count(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.row_count() == 0 || self.col_count() == 0
    }

    /// Markdownテーブルとして出力
    ///
    /// 1行目をヘッダーとして、ヘッダー行・区切り行・本文行の順に出力します。
    /// 各行は最も長い行の列数まで空セルで埋め、切り詰めは行いません。
    /// グリッドが空の場合はテーブルの代わりにHTMLコメントを1行出力します。
    ///
    /// # 引数
    ///
    /// * `sheet_name` - プレースホルダーに埋め込むシート名
    /// * `align` - 列幅を表示幅で揃えるかどうか
    ///
    /// # 戻り値
    ///
    /// 末尾に改行を含まないMarkdownブロック
    pub fn render_markdown(&self, sheet_name: &str, align: bool) -> String {
        if self.is_empty() {
            return empty_placeholder(sheet_name);
        }

        let cols = self.col_count();
        let widths = if align {
            self.calculate_column_widths(cols)
        } else {
            vec![0; cols]
        };

        let mut lines = Vec::with_capacity(self.rows.len() + 1);
        for (row_idx, row) in self.rows.iter().enumerate() {
            lines.push(render_row(row, &widths));
            if row_idx == 0 {
                lines.push(generate_separator(&widths));
            }
        }
        lines.join("\n")
    }

    /// 列幅を計算（内部ヘルパー）
    ///
    /// 全角文字（日本語など）は表示幅2として計算します。最小幅は3文字。
    fn calculate_column_widths(&self, cols: usize) -> Vec<usize> {
        let mut widths = vec![MIN_SEPARATOR_WIDTH; cols];
        for row in &self.rows {
            for (col_idx, token) in row.iter().enumerate() {
                widths[col_idx] = widths[col_idx].max(token.width());
            }
        }
        widths
    }
}

/// 1行を出力（`widths`の長さまで空セルで埋める）
fn render_row(row: &[String], widths: &[usize]) -> String {
    let mut line = String::from("|");
    for (col_idx, &width) in widths.iter().enumerate() {
        let token = row.get(col_idx).map(String::as_str).unwrap_or("");
        line.push(' ');
        line.push_str(token);
        // 表示幅に基づいて残りを埋める
        let padding = width.saturating_sub(token.width());
        line.extend(std::iter::repeat(' ').take(padding));
        line.push_str(" |");
    }
    line
}

/// ヘッダー区切り行を生成（内部ヘルパー）
fn generate_separator(widths: &[usize]) -> String {
    let mut line = String::from("|");
    for &width in widths {
        line.push(' ');
        line.push_str(&"-".repeat(width.max(MIN_SEPARATOR_WIDTH)));
        line.push_str(" |");
    }
    line
}

/// 空シートのプレースホルダー
///
/// シート名に`--`が含まれるとコメントが途中で閉じるため、間に空白を挟みます。
pub(crate) fn empty_placeholder(sheet_name: &str) -> String {
    let name = sheet_name.replace("--", "- -");
    format!("<!-- sheet \"{}\" has no renderable content -->", name)
}

/// 1シートを変換した結果
#[derive(Debug, Clone)]
pub(crate) struct RenderedSheet {
    /// `## <シート名>`から始まるMarkdownブロック
    pub markdown: String,
    pub report: SheetReport,
}

/// 1シートを見出し付きのMarkdownブロックに変換
pub(crate) fn render_sheet(sheet: &Sheet, config: &ConversionConfig) -> RenderedSheet {
    let started = Instant::now();
    let (grid, report) = LogicalGrid::build(sheet, config);

    let body = grid.render_markdown(sheet.name(), config.align_columns);
    let markdown = format!("## {}\n\n{}", sheet.name(), body);

    if report.empty {
        info!(sheet = sheet.name(), "sheet has no renderable content");
    } else {
        info!(
            sheet = sheet.name(),
            rows = report.rows,
            cols = report.cols,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "rendered sheet"
        );
    }

    RenderedSheet { markdown, report }
}

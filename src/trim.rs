//! Dimension Trimmer Module
//!
//! シートの使用範囲を推定し、構築済みのトークングリッドから空の端（先頭・末尾の行、末尾の列）を取り除くモジュール。

use tracing::debug;

use crate::api::{MergePolicy, ScanLimits};
use crate::types::{Cell, MergedRegion, Sheet};

/// 描画する範囲（1行1列目からの行数・列数）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) struct RenderWindow {
    pub rows: u32,
    pub cols: u32,

    /// 先頭行のサンプリングで列数を推定したかどうか
    pub sampled: bool,
}

impl RenderWindow {
    /// 結合範囲が出力する位置を含むように拡張
    ///
    /// アンカーに内容のない範囲は何も出力しないため対象外です。
    /// `AnchorOnly`ではアンカー以外の位置は空になるので、アンカーまでしか広げません。
    /// シート全体を覆う結合範囲でも、描画範囲が公称サイズ全体に膨らむことはありません。
    fn widen_to(mut self, sheet: &Sheet, regions: &[MergedRegion], policy: MergePolicy) -> Self {
        for region in regions {
            if !sheet.cell(region.anchor).is_some_and(has_content) {
                continue;
            }
            let bound = match policy {
                MergePolicy::Fill => region.range.end,
                MergePolicy::AnchorOnly => region.anchor,
            };
            self.rows = self.rows.max(bound.row);
            self.cols = self.cols.max(bound.col);
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0 || self.cols == 0
    }
}

/// セルに出力される内容があるかどうか
///
/// 値が空でもハイパーリンクがあればURLが出力されるため、内容ありとみなします。
fn has_content(cell: &Cell) -> bool {
    !cell.value.is_empty() || cell.hyperlink.is_some()
}

/// 使用範囲を推定
///
/// 公称サイズが`limits.threshold`以下なら全セルを1回ずつ走査します。
/// 超える場合は先頭`limits.sample_rows`行のみを走査して最大列を推定し、行数は公称の行数を使います。
/// どちらの場合も、結合範囲が出力する位置は推定結果より優先して範囲に含めます。
///
/// # 引数
///
/// * `sheet` - 対象シート
/// * `regions` - 縮退していない結合範囲
/// * `limits` - 大きなシートの走査制限
/// * `policy` - 結合範囲の解決方針
pub(crate) fn used_extent(
    sheet: &Sheet,
    regions: &[MergedRegion],
    limits: ScanLimits,
    policy: MergePolicy,
) -> RenderWindow {
    let (nominal_rows, nominal_cols) = sheet.nominal_extent();

    let window = if nominal_rows > limits.threshold || nominal_cols > limits.threshold {
        let cols = sheet
            .cells_up_to_row(limits.sample_rows)
            .filter(|cell| has_content(cell))
            .map(|cell| cell.coord.col)
            .max()
            .unwrap_or(0);

        // 最後のセルより下は空行しかないため、行数はそこで打ち切る
        let rows = nominal_rows.min(sheet.last_row());

        debug!(
            sheet = sheet.name(),
            nominal_rows,
            nominal_cols,
            sample_rows = limits.sample_rows,
            estimated_cols = cols,
            "large sheet: estimating used columns from leading rows"
        );

        RenderWindow {
            rows,
            cols,
            sampled: true,
        }
    } else {
        sheet
            .cells()
            .filter(|cell| has_content(cell))
            .fold(RenderWindow::default(), |acc, cell| RenderWindow {
                rows: acc.rows.max(cell.coord.row),
                cols: acc.cols.max(cell.coord.col),
                sampled: false,
            })
    };

    window.widen_to(sheet, regions, policy)
}

/// 公称サイズをそのまま描画範囲にする（トリミング無効時）
pub(crate) fn nominal_window(
    sheet: &Sheet,
    regions: &[MergedRegion],
    policy: MergePolicy,
) -> RenderWindow {
    let (rows, cols) = sheet.nominal_extent();
    RenderWindow {
        rows,
        cols,
        sampled: false,
    }
    .widen_to(sheet, regions, policy)
}

/// トークングリッドの空の端を除去
///
/// 前後の空白を除いてすべて空の先頭行・末尾行を除去し、
/// 残った行のすべてで空の末尾列を除去します。先頭列は除去しません。
///
/// # 戻り値
///
/// 残った行数（0ならシートは空）
pub(crate) fn trim_edges(grid: &mut Vec<Vec<String>>) -> usize {
    let is_blank_row = |row: &[String]| row.iter().all(|token| token.trim().is_empty());

    let leading = grid.iter().take_while(|row| is_blank_row(row)).count();
    grid.drain(..leading);

    while grid.last().is_some_and(|row| is_blank_row(row)) {
        grid.pop();
    }

    let used_cols = grid
        .iter()
        .filter_map(|row| row.iter().rposition(|token| !token.trim().is_empty()))
        .max()
        .map_or(0, |last| last + 1);
    for row in grid.iter_mut() {
        row.truncate(used_cols);
    }

    if used_cols == 0 {
        grid.clear();
    }
    grid.len()
}

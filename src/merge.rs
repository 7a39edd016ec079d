//! Merged-Region Resolver Module
//!
//! セル結合範囲を解決し、各グリッド位置で使用する実効的な内容（アンカーの値、または空）を決定するモジュール。

use std::collections::HashMap;

use tracing::warn;

use crate::api::MergePolicy;
use crate::formatter::CellFormatter;
use crate::types::{CellCoord, MergedRegion, Sheet};

/// 結合範囲内の位置に割り当てられる実効的な内容
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Placement {
    /// アンカーセルのフォーマット済みテキスト
    Text(String),

    /// 空として出力（位置自体は残る）
    Suppressed,
}

/// シートの結合範囲を有効なものと縮退したものに分類
///
/// 縮退した範囲（境界の反転・0座標）はスキップ対象として警告を出力します。
///
/// # 戻り値
///
/// `(有効な範囲, 縮退した範囲)`
pub(crate) fn partition_regions(sheet: &Sheet) -> (Vec<MergedRegion>, Vec<MergedRegion>) {
    let (degenerate, valid): (Vec<MergedRegion>, Vec<MergedRegion>) = sheet
        .merged_regions()
        .iter()
        .copied()
        .partition(MergedRegion::is_degenerate);

    for region in &degenerate {
        warn!(
            sheet = sheet.name(),
            region = %region.range,
            "skipping degenerate merged region"
        );
    }

    (valid, degenerate)
}

/// 結合範囲を解決した結果
///
/// 描画範囲内の結合範囲に含まれる位置のみを保持します。
/// 含まれない位置は、そのセル自身の内容で出力されます。
#[derive(Debug, Default)]
pub(crate) struct EffectiveGrid {
    placements: HashMap<CellCoord, Placement>,
}

impl EffectiveGrid {
    /// 結合範囲を解決
    ///
    /// アンカーセルのテキストは範囲ごとに一度だけフォーマットします。
    /// 範囲が重なっている場合は、先に現れた範囲が優先されます。
    ///
    /// # 引数
    ///
    /// * `sheet` - 対象シート
    /// * `regions` - 縮退していない結合範囲
    /// * `window` - 描画範囲（行数, 列数）。範囲外の位置は保持しない
    /// * `formatter` - アンカーセルのフォーマットに使うフォーマッター
    pub fn resolve(
        sheet: &Sheet,
        regions: &[MergedRegion],
        window: (u32, u32),
        formatter: &CellFormatter<'_>,
    ) -> Self {
        let (max_row, max_col) = window;
        let policy = formatter.config().merge_policy;
        let mut placements = HashMap::new();

        for region in regions {
            let start = region.range.start;
            let end = region.range.end;
            if start.row > max_row || start.col > max_col {
                continue;
            }

            let anchor_text = sheet
                .cell(region.anchor)
                .map(|cell| formatter.format_cell(cell))
                .unwrap_or_default();

            for row in start.row..=end.row.min(max_row) {
                for col in start.col..=end.col.min(max_col) {
                    let coord = CellCoord::new(row, col);
                    let placement = if coord == region.anchor {
                        Placement::Text(anchor_text.clone())
                    } else {
                        match policy {
                            MergePolicy::Fill => Placement::Text(anchor_text.clone()),
                            MergePolicy::AnchorOnly => Placement::Suppressed,
                        }
                    };
                    placements.entry(coord).or_insert(placement);
                }
            }
        }

        Self { placements }
    }

    /// 指定位置の実効的な内容を取得（結合範囲外なら`None`）
    pub fn placement(&self, coord: CellCoord) -> Option<&Placement> {
        self.placements.get(&coord)
    }

    /// 結合範囲に含まれる位置と内容を走査（順序は不定）
    pub fn iter(&self) -> impl Iterator<Item = (CellCoord, &Placement)> {
        self.placements
            .iter()
            .map(|(coord, placement)| (*coord, placement))
    }
}

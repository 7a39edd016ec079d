//! Conversion Report Module
//!
//! 変換中に各シートで起きたこと（描画サイズ、スキップした結合範囲、空シート、サンプリング）の要約。
//! `serde`でシリアライズでき、CLIの`--report`ではJSONとして出力されます。

use serde::{Deserialize, Serialize};

/// シート単位の変換結果
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SheetReport {
    /// シート名
    pub name: String,

    /// 出力した行数（ヘッダー行を含む、区切り行を含まない）
    pub rows: usize,

    /// 出力した列数
    pub cols: usize,

    /// 縮退していたためスキップした結合範囲（A1形式）
    pub skipped_regions: Vec<String>,

    /// 描画できる内容がなく、プレースホルダーを出力したかどうか
    pub empty: bool,

    /// 使用範囲の推定に先頭行のサンプリングを使ったかどうか
    pub sampled: bool,
}

/// ワークブック全体の変換結果
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionReport {
    /// ドキュメントのタイトル
    pub title: String,

    /// 変換したシート（出力順）
    pub sheets: Vec<SheetReport>,
}

impl ConversionReport {
    /// 空シートの名前を列挙
    pub fn empty_sheets(&self) -> impl Iterator<Item = &str> {
        self.sheets
            .iter()
            .filter(|sheet| sheet.empty)
            .map(|sheet| sheet.name.as_str())
    }

    /// スキップした結合範囲の総数
    pub fn skipped_region_count(&self) -> usize {
        self.sheets
            .iter()
            .map(|sheet| sheet.skipped_regions.len())
            .sum()
    }
}

//! Public API Types
//!
//! 公開APIで使用する設定用の列挙型を定義するモジュール。

use serde::{Deserialize, Serialize};

/// 結合セルの解決方針
///
/// 変換処理全体で1つの方針が適用されます。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
#[non_exhaustive]
pub enum MergePolicy {
    /// アンカー（左上セル）の位置にのみ値を出力（デフォルト）
    ///
    /// 結合範囲内の他の位置は空セルとして出力されます。
    ///
    /// # 出力例
    ///
    /// ```markdown
    /// | Header |  |  |
    /// | --- | --- | --- |
    /// | Data1 | Data2 | Data3 |
    /// ```
    #[default]
    AnchorOnly,

    /// 結合範囲内のすべての位置にアンカーの値を複製
    ///
    /// # 出力例
    ///
    /// ```markdown
    /// | Header | Header | Header |
    /// | --- | --- | --- |
    /// | Data1 | Data2 | Data3 |
    /// ```
    Fill,
}

/// 日付の出力形式
///
/// 日付書式が設定されたセル（シリアル値）を文字列に変換する際の形式を指定します。
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[non_exhaustive]
pub enum DateFormat {
    /// ISO 8601形式（YYYY-MM-DD、時刻を含む場合は YYYY-MM-DD HH:MM:SS）
    #[default]
    Iso8601,

    /// カスタム形式（chrono互換フォーマット文字列）
    ///
    /// # 使用例
    ///
    /// ```rust,no_run
    /// use xlsxmark::{ConverterBuilder, DateFormat};
    ///
    /// # fn main() -> Result<(), xlsxmark::XlsxMarkError> {
    /// let converter = ConverterBuilder::new()
    ///     .with_date_format(DateFormat::Custom("%Y年%m月%d日".to_string()))
    ///     .build()?;
    /// # Ok(())
    /// # }
    /// ```
    Custom(String),
}

/// シート選択方式
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[non_exhaustive]
pub enum SheetSelector {
    /// すべてのシートを変換（デフォルト）
    #[default]
    All,

    /// インデックス指定（0始まり）
    Index(usize),

    /// シート名指定
    Name(String),

    /// 複数のインデックス指定
    Indices(Vec<usize>),

    /// 複数のシート名指定
    Names(Vec<String>),
}

/// 大きなシートの使用範囲推定に使う走査制限
///
/// 行数または列数が`threshold`を超えるシートでは、先頭`sample_rows`行だけを走査して
/// 最大列を推定します。サンプル外の行にしか値のない列は取りこぼす可能性があります
/// （結合範囲に含まれる列は取りこぼしません）。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanLimits {
    /// 全走査を行う公称サイズの上限
    pub threshold: u32,

    /// サンプリング時に走査する先頭行数
    pub sample_rows: u32,
}

impl Default for ScanLimits {
    fn default() -> Self {
        Self {
            threshold: 1_000,
            sample_rows: 200,
        }
    }
}

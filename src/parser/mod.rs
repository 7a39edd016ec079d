//! Parser Module
//!
//! XLSXファイルを読み込み、メモリ上の`Workbook`モデルに変換します。
//! セル値はcalamineで、スタイル・ハイパーリンク・1904年基準フラグは
//! パッケージ内のXMLパートから直接抽出します。

mod metadata;
mod workbook;

pub(crate) use workbook::WorkbookParser;

//! Error Types Module
//!
//! クレート全体で使用する構造化エラー型を定義するモジュール。
//! `thiserror`を使用して、エラーの自動変換とメッセージフォーマットを実現する。
//!
//! 変換コア（結合解決・トリミング・スタイル注釈・テーブル出力）はエラーを返しません。
//! 縮退した結合範囲や空シートはシート単位で回復され、`ConversionReport`に記録されます。
//! このエラー型が扱うのは、ファイル読み込み・XLSX解析・設定検証など周辺層の失敗です。

use thiserror::Error;

/// xlsxmarkクレート全体で使用するエラー型
///
/// # 使用例
///
/// ```rust,no_run
/// use xlsxmark::XlsxMarkError;
/// use std::fs::File;
///
/// fn read_excel_file(path: &str) -> Result<(), XlsxMarkError> {
///     let file = File::open(path)?;  // Ioエラーが自動的に変換される
///     // ... 処理 ...
///     Ok(())
/// }
/// ```
#[derive(Error, Debug)]
pub enum XlsxMarkError {
    /// I/O操作中に発生したエラー
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// calamineがExcelファイルを解析する際に発生したエラー
    #[error("Failed to parse Excel file: {0}")]
    Parse(#[from] calamine::Error),

    /// UTF-8文字列の変換エラー
    #[error("UTF-8 conversion error: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    /// ZIPアーカイブの解析エラー
    #[error("ZIP archive error: {0}")]
    Zip(String),

    /// XLSX内部のXML解析エラー
    #[error("XML error in '{part}': {message}")]
    Xml {
        /// エラーが発生したパッケージ内のパス（例: `xl/styles.xml`）
        part: String,
        /// エラーの詳細メッセージ
        message: String,
    },

    /// 数値の解析エラー
    #[error("Number parse error: {0}")]
    ParseInt(#[from] std::num::ParseIntError),

    /// 設定の検証に失敗したエラー
    ///
    /// # 例
    ///
    /// ```rust,no_run
    /// use xlsxmark::{ConverterBuilder, XlsxMarkError};
    ///
    /// let result = ConverterBuilder::new()
    ///     .with_scan_limits(0, 200)  // 無効な閾値
    ///     .build();
    ///
    /// match result {
    ///     Err(XlsxMarkError::Config(msg)) => {
    ///         println!("設定エラー: {}", msg);
    ///     }
    ///     _ => {}
    /// }
    /// ```
    #[error("Configuration error: {0}")]
    Config(String),

    /// セキュリティ制限に違反したエラー
    ///
    /// ZIP bomb攻撃、パストラバーサル攻撃、ファイルサイズ制限などに違反した場合に発生します。
    #[error("Security violation: {0}")]
    SecurityViolation(String),
}

impl XlsxMarkError {
    /// XML解析エラーを生成
    pub(crate) fn xml(part: &str, message: impl std::fmt::Display) -> Self {
        XlsxMarkError::Xml {
            part: part.to_string(),
            message: message.to_string(),
        }
    }
}

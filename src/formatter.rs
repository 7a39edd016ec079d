//! Cell Text Formatter Module
//!
//! セルの値・ハイパーリンク・スタイルタグを、Markdownテーブルに安全に埋め込める1つのトークンへ変換するモジュール。

use std::fmt::Write as _;

use chrono::{Duration, NaiveDate, NaiveDateTime};

use crate::api::DateFormat;
use crate::builder::ConversionConfig;
use crate::style::{self, StyleTag, StyleTagSet};
use crate::types::{Cell, CellValue};

/// 改行の置換先
const LINE_BREAK: &str = "<br>";

/// セルフォーマッター
///
/// 変換設定を保持し、セル単位のフォーマット処理のファサードとして機能します。
#[derive(Debug)]
pub(crate) struct CellFormatter<'a> {
    config: &'a ConversionConfig,
    date_formatter: DateFormatter,
}

impl<'a> CellFormatter<'a> {
    pub fn new(config: &'a ConversionConfig) -> Self {
        Self {
            config,
            date_formatter: DateFormatter,
        }
    }

    pub fn config(&self) -> &ConversionConfig {
        self.config
    }

    /// セルをMarkdownトークンに変換
    ///
    /// 処理順序は固定です。
    ///
    /// 1. 取り消し線による抑制 ⇒ 空文字列
    /// 2. 値の文字列化
    /// 3. 改行（`\r\n`, `\r`, `\n`）を`<br>`に正規化
    /// 4. ハイパーリンクがあれば`[text](url)`（値が空ならURLをテキストに使用）
    /// 5. `|`を`\|`にエスケープ（直前のバックスラッシュは二重にする）
    /// 6. 空でなければ背景色・取り消し線・太字・斜体の順に装飾（斜体が最も外側）
    /// 7. 前後の空白を除去
    ///
    /// # 引数
    ///
    /// * `cell` - 変換するセル
    ///
    /// # 戻り値
    ///
    /// Markdownセルとして安全なトークン文字列
    pub fn format_cell(&self, cell: &Cell) -> String {
        let tags = style::annotate_with(cell.style.as_ref(), self.config);
        if style::is_suppressed(&tags, self.config) {
            return String::new();
        }

        let text = self.stringify(&cell.value);
        let text = normalize_line_breaks(&text);
        let text = match cell.hyperlink.as_deref() {
            Some(url) => link(&text, url),
            None => text,
        };
        let text = escape_pipes(&text);

        self.decorate(text.trim(), &tags).trim().to_string()
    }

    /// 値を文字列化
    fn stringify(&self, value: &CellValue) -> String {
        match value {
            CellValue::Empty => String::new(),
            CellValue::Text(s) => s.clone(),
            CellValue::Number(n) => format_number(*n),
            CellValue::Bool(b) => if *b { "TRUE" } else { "FALSE" }.to_string(),
            CellValue::DateTime(serial) => self
                .date_formatter
                .format(*serial, &self.config.date_format)
                .unwrap_or_else(|| format_number(*serial)),
            CellValue::Error(e) => e.clone(),
        }
    }

    /// スタイルタグに応じて装飾
    ///
    /// 空のテキストは装飾しません（`****`のような出力を避ける）。
    fn decorate(&self, text: &str, tags: &StyleTagSet) -> String {
        if text.is_empty() {
            return String::new();
        }

        let mut out = text.to_string();
        if self.config.background_markup {
            if let Some(name) = tags.background() {
                out = format!("<span data-bg=\"{}\">{}</span>", name, out);
            }
        }
        if !self.config.suppress_strikethrough && tags.contains(&StyleTag::Strikethrough) {
            out = format!("~~{}~~", out);
        }
        if tags.contains(&StyleTag::Bold) {
            out = format!("**{}**", out);
        }
        if tags.contains(&StyleTag::Italic) {
            out = format!("_{}_", out);
        }
        out
    }
}

/// 数値を文字列化
///
/// 整数値は小数部なし（`3.0` → `"3"`）、それ以外は往復可能な最短表記。
pub(crate) fn format_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

/// `\r\n`, `\r`, `\n`をそれぞれ1つの`<br>`に置換
fn normalize_line_breaks(s: &str) -> String {
    if !s.contains(|c| c == '\r' || c == '\n') {
        return s.to_string();
    }
    s.replace("\r\n", LINE_BREAK)
        .replace('\r', LINE_BREAK)
        .replace('\n', LINE_BREAK)
}

fn link(text: &str, url: &str) -> String {
    let display = if text.is_empty() { url } else { text };
    format!("[{}]({})", display, url)
}

/// `|`を`\|`にエスケープ
///
/// パイプ直前のバックスラッシュは二重にします（`a\|b` → `a\\\|b`）。
/// そのままだと元のバックスラッシュがパイプのエスケープとして消費され、セルが分割されます。
fn escape_pipes(s: &str) -> String {
    if !s.contains('|') {
        return s.to_string();
    }

    let mut out = String::with_capacity(s.len() + 8);
    let mut backslashes = 0;
    for ch in s.chars() {
        match ch {
            '\\' => backslashes += 1,
            '|' => {
                out.extend(std::iter::repeat('\\').take(backslashes * 2));
                out.push_str("\\|");
                backslashes = 0;
            }
            _ => {
                out.extend(std::iter::repeat('\\').take(backslashes));
                out.push(ch);
                backslashes = 0;
            }
        }
    }
    out.extend(std::iter::repeat('\\').take(backslashes));
    out
}

/// 日付フォーマッター
///
/// Excelのシリアル日付値（1900年システム）を文字列に変換します。
/// 1904年システムのブックは、取り込み時に1900年システムのシリアル値へ換算済みです。
#[derive(Debug)]
pub(crate) struct DateFormatter;

impl DateFormatter {
    /// 日付値をフォーマット
    ///
    /// # 引数
    ///
    /// * `serial_value` - Excelのシリアル日付値
    /// * `format` - 日付形式
    ///
    /// # 戻り値
    ///
    /// * `Some(String)` - フォーマット済み日付文字列
    /// * `None` - 範囲外のシリアル値、またはカスタム形式が解釈できない場合
    ///
    /// # エポック
    ///
    /// - シリアル値1 = 1900年1月1日
    /// - 60以下は1899年12月31日起算、61以上は1899年12月30日起算
    ///   （存在しない1900年2月29日の分をずらす）
    /// - 小数部は時刻（1日 = 1.0）
    pub fn format(&self, serial_value: f64, format: &DateFormat) -> Option<String> {
        let datetime = serial_to_datetime(serial_value)?;
        let has_time = serial_value.fract() != 0.0;

        let pattern = match format {
            DateFormat::Iso8601 if has_time => "%Y-%m-%d %H:%M:%S",
            DateFormat::Iso8601 => "%Y-%m-%d",
            DateFormat::Custom(pattern) => pattern.as_str(),
        };

        // 不正な書式指定子はDisplay時にエラーになるため、write!で受けて回復する
        let mut out = String::new();
        write!(out, "{}", datetime.format(pattern)).ok()?;
        Some(out)
    }
}

/// シリアル値を日時に変換
fn serial_to_datetime(serial_value: f64) -> Option<NaiveDateTime> {
    if !serial_value.is_finite() || serial_value < 0.0 || serial_value >= 2_958_466.0 {
        return None;
    }

    let days = serial_value.trunc() as i64;
    let epoch = if days <= 60 {
        NaiveDate::from_ymd_opt(1899, 12, 31)?
    } else {
        NaiveDate::from_ymd_opt(1899, 12, 30)?
    };
    let date = epoch.checked_add_signed(Duration::days(days))?;

    let seconds = (serial_value.fract() * 86_400.0).round() as i64;
    date.and_hms_opt(0, 0, 0)?
        .checked_add_signed(Duration::seconds(seconds))
}

//! Style Annotator Module
//!
//! セルのスタイル情報（太字・斜体・取り消し線・背景色）から、意味的なスタイルタグの集合を導出するモジュール。

use std::collections::BTreeSet;
use std::fmt;

use crate::builder::ConversionConfig;
use crate::types::{CellStyle, Rgb};

/// 背景色の名前対応表
///
/// 未登録の色は6桁の16進表記にフォールバックします。
/// 色を追加する場合はこの表に行を足すだけでよく、判定処理は変更不要です。
const COLOR_NAMES: &[(Rgb, &str)] = &[
    (Rgb::new(0xFF, 0xFF, 0x00), "yellow"),
    (Rgb::new(0xFF, 0x00, 0x00), "red"),
    (Rgb::new(0x00, 0xFF, 0x00), "green"),
    (Rgb::new(0x00, 0xB0, 0x50), "green"),
    (Rgb::new(0x00, 0x00, 0xFF), "blue"),
    (Rgb::new(0x00, 0x70, 0xC0), "blue"),
    (Rgb::new(0xFF, 0xC0, 0x00), "orange"),
    (Rgb::new(0xFF, 0xA5, 0x00), "orange"),
    (Rgb::new(0xFF, 0xC0, 0xCB), "pink"),
    (Rgb::new(0xFF, 0x99, 0xCC), "pink"),
    (Rgb::new(0x80, 0x80, 0x80), "gray"),
    (Rgb::new(0xC0, 0xC0, 0xC0), "gray"),
    (Rgb::new(0xD9, 0xD9, 0xD9), "gray"),
    (Rgb::new(0xFF, 0xFF, 0x99), "light-yellow"),
    (Rgb::new(0xFF, 0xF2, 0xCC), "light-yellow"),
    (Rgb::new(0xC6, 0xEF, 0xCE), "light-green"),
    (Rgb::new(0xE2, 0xEF, 0xDA), "light-green"),
    (Rgb::new(0x92, 0xD0, 0x50), "light-green"),
    (Rgb::new(0xDD, 0xEB, 0xF7), "light-blue"),
    (Rgb::new(0xBD, 0xD7, 0xEE), "light-blue"),
    (Rgb::new(0x9B, 0xC2, 0xE6), "light-blue"),
    (Rgb::new(0xFF, 0xC7, 0xCE), "light-red"),
    (Rgb::new(0xFC, 0xE4, 0xD6), "light-orange"),
    (Rgb::new(0xF8, 0xCB, 0xAD), "light-orange"),
    (Rgb::new(0xF2, 0xF2, 0xF2), "light-gray"),
];

/// 意味的なスタイルタグ
///
/// `Ord`の順序（太字 → 斜体 → 取り消し線 → 背景色）がタグ集合の走査順になります。
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum StyleTag {
    Bold,
    Italic,
    Strikethrough,
    /// 背景色（色名、または6桁の16進表記）
    Background(String),
}

impl fmt::Display for StyleTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StyleTag::Bold => f.write_str("bold"),
            StyleTag::Italic => f.write_str("italic"),
            StyleTag::Strikethrough => f.write_str("strikethrough"),
            StyleTag::Background(name) => write!(f, "bg:{}", name),
        }
    }
}

/// 順序付きのスタイルタグ集合
///
/// 空の集合も有効です（スタイルなしのセルはほとんどがこれになります）。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StyleTagSet {
    tags: BTreeSet<StyleTag>,
}

impl StyleTagSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, tag: StyleTag) {
        self.tags.insert(tag);
    }

    pub fn contains(&self, tag: &StyleTag) -> bool {
        self.tags.contains(tag)
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    /// 背景色タグの色名を取得
    pub fn background(&self) -> Option<&str> {
        self.tags.iter().find_map(|tag| match tag {
            StyleTag::Background(name) => Some(name.as_str()),
            _ => None,
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = &StyleTag> {
        self.tags.iter()
    }
}

impl FromIterator<StyleTag> for StyleTagSet {
    fn from_iter<I: IntoIterator<Item = StyleTag>>(iter: I) -> Self {
        Self {
            tags: iter.into_iter().collect(),
        }
    }
}

impl fmt::Display for StyleTagSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for tag in &self.tags {
            if !first {
                f.write_str(",")?;
            }
            write!(f, "{}", tag)?;
            first = false;
        }
        Ok(())
    }
}

/// スタイル情報からタグ集合を導出
///
/// # 引数
///
/// * `style` - セルのスタイル情報（書式設定されていないセルは`None`）
///
/// # 戻り値
///
/// スタイル情報がない場合は空の集合
///
/// # 使用例
///
/// ```rust
/// use xlsxmark::{annotate, CellStyle, Rgb};
///
/// let style = CellStyle::bold().with_background(Rgb::new(0xFF, 0xFF, 0x00));
/// assert_eq!(annotate(Some(&style)).to_string(), "bold,bg:yellow");
/// ```
pub fn annotate(style: Option<&CellStyle>) -> StyleTagSet {
    let mut tags = StyleTagSet::new();
    let Some(style) = style else {
        return tags;
    };

    if style.bold {
        tags.insert(StyleTag::Bold);
    }
    if style.italic {
        tags.insert(StyleTag::Italic);
    }
    if style.strikethrough {
        tags.insert(StyleTag::Strikethrough);
    }
    if let Some(name) = style.background.and_then(background_name) {
        tags.insert(StyleTag::Background(name));
    }

    tags
}

/// 変換設定に従ってタグ集合を導出（スタイル注釈が無効なら常に空）
pub(crate) fn annotate_with(style: Option<&CellStyle>, config: &ConversionConfig) -> StyleTagSet {
    if !config.style_annotations {
        return StyleTagSet::new();
    }
    annotate(style)
}

/// タグ集合がセルの抑制（空出力）を意味するかどうか
pub(crate) fn is_suppressed(tags: &StyleTagSet, config: &ConversionConfig) -> bool {
    config.suppress_strikethrough && tags.contains(&StyleTag::Strikethrough)
}

/// 背景色を色名に変換
///
/// 白は「塗りつぶしなし」と同じ扱いで`None`を返します。
pub(crate) fn background_name(color: Rgb) -> Option<String> {
    if color == Rgb::WHITE {
        return None;
    }
    let name = COLOR_NAMES
        .iter()
        .find(|(rgb, _)| *rgb == color)
        .map(|(_, name)| (*name).to_string())
        .unwrap_or_else(|| color.to_hex());
    Some(name)
}

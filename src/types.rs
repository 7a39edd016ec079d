//! Types Module
//!
//! クレート全体で使用するセルモデル（値・座標・スタイル・結合範囲・シート・ワークブック）を定義するモジュール。
//! 座標はすべて1始まり（行優先）です。

use std::collections::BTreeMap;
use std::fmt;

/// セルの値を表す列挙型
///
/// 数式セルはデコーダ側で評価済みの値（キャッシュ値）のみを保持します。
#[derive(Debug, Clone, Default, PartialEq)]
pub enum CellValue {
    /// 空セル
    #[default]
    Empty,

    /// 文字列
    Text(String),

    /// 数値（f64）
    Number(f64),

    /// 論理値
    Bool(bool),

    /// 日付・時刻（Excelのシリアル値）
    DateTime(f64),

    /// エラー値（例: #DIV/0!）
    Error(String),
}

impl CellValue {
    /// 値が空かどうかを判定
    ///
    /// 空文字列も空として扱います。空白のみの文字列は空ではありません（トリミングは後段で行う）。
    pub fn is_empty(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.is_empty(),
            _ => false,
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::Text(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::Text(s)
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        CellValue::Number(n)
    }
}

impl From<i64> for CellValue {
    fn from(n: i64) -> Self {
        CellValue::Number(n as f64)
    }
}

impl From<bool> for CellValue {
    fn from(b: bool) -> Self {
        CellValue::Bool(b)
    }
}

/// セル座標（1始まり）
///
/// `Ord`は行 → 列の順で比較するため、`BTreeMap`のキーにすると行優先で走査されます。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CellCoord {
    pub row: u32,
    pub col: u32,
}

impl CellCoord {
    /// 新しい座標を生成
    pub fn new(row: u32, col: u32) -> Self {
        Self { row, col }
    }

    /// 行・列ともに1以上であれば有効
    pub fn is_valid(&self) -> bool {
        self.row >= 1 && self.col >= 1
    }

    /// A1形式の文字列に変換（例: (1, 1) -> "A1"）
    pub fn to_a1_notation(&self) -> String {
        format!("{}{}", col_index_to_letter(self.col), self.row)
    }

    /// A1形式の文字列を座標に変換（例: "B3" -> (3, 2)）
    ///
    /// `$`（絶対参照記号）は無視します。形式が不正な場合は`None`を返します。
    pub fn from_a1_notation(reference: &str) -> Option<Self> {
        let reference = reference.trim().replace('$', "");
        let split = reference.find(|c: char| c.is_ascii_digit())?;
        let (letters, digits) = reference.split_at(split);

        if letters.is_empty() || !letters.chars().all(|c| c.is_ascii_alphabetic()) {
            return None;
        }

        let mut col: u32 = 0;
        for ch in letters.chars() {
            let val = (ch.to_ascii_uppercase() as u32) - ('A' as u32) + 1;
            col = col.checked_mul(26)?.checked_add(val)?;
        }

        let row = digits.parse::<u32>().ok()?;
        let coord = Self::new(row, col);
        coord.is_valid().then_some(coord)
    }
}

impl fmt::Display for CellCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_a1_notation())
    }
}

/// 列番号を文字列に変換（1 -> "A", 26 -> "Z", 27 -> "AA"）
///
/// 0は無効な列なので`"?"`を返します。
fn col_index_to_letter(mut col: u32) -> String {
    if col == 0 {
        return "?".to_string();
    }

    let mut result = String::new();
    while col > 0 {
        let remainder = (col - 1) % 26;
        result.insert(0, (b'A' + remainder as u8) as char);
        col = (col - 1) / 26;
    }
    result
}

/// セル範囲
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellRange {
    pub start: CellCoord,
    pub end: CellCoord,
}

impl CellRange {
    /// 新しい範囲を生成
    pub fn new(start: CellCoord, end: CellCoord) -> Self {
        Self { start, end }
    }

    /// A1形式の範囲文字列を解析（例: "A1:C3"、単一セル "B2" も可）
    pub fn from_a1_notation(reference: &str) -> Option<Self> {
        match reference.split_once(':') {
            Some((start, end)) => Some(Self::new(
                CellCoord::from_a1_notation(start)?,
                CellCoord::from_a1_notation(end)?,
            )),
            None => {
                let coord = CellCoord::from_a1_notation(reference)?;
                Some(Self::new(coord, coord))
            }
        }
    }

    /// 指定された座標が範囲内にあるかを判定
    pub fn contains(&self, coord: CellCoord) -> bool {
        coord.row >= self.start.row
            && coord.row <= self.end.row
            && coord.col >= self.start.col
            && coord.col <= self.end.col
    }

    /// 開始座標が終了座標を超えている、または0座標を含む場合に`true`
    pub fn is_degenerate(&self) -> bool {
        !self.start.is_valid()
            || !self.end.is_valid()
            || self.start.row > self.end.row
            || self.start.col > self.end.col
    }

    /// 範囲のサイズ（行数 × 列数）。縮退した範囲は(0, 0)
    pub fn size(&self) -> (u32, u32) {
        if self.is_degenerate() {
            return (0, 0);
        }
        (
            self.end.row - self.start.row + 1,
            self.end.col - self.start.col + 1,
        )
    }
}

impl fmt::Display for CellRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.start, self.end)
    }
}

/// セル結合範囲の情報
///
/// アンカー（左上セル）が結合範囲全体の表示内容を決定します。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergedRegion {
    /// 結合範囲
    pub range: CellRange,

    /// アンカーセル（左上セル）の座標
    pub anchor: CellCoord,
}

impl MergedRegion {
    /// 新しい結合範囲を生成
    pub fn new(range: CellRange) -> Self {
        Self {
            anchor: range.start,
            range,
        }
    }

    /// 1始まりの境界値から生成（min_row, min_col, max_row, max_col）
    pub fn from_bounds(min_row: u32, min_col: u32, max_row: u32, max_col: u32) -> Self {
        Self::new(CellRange::new(
            CellCoord::new(min_row, min_col),
            CellCoord::new(max_row, max_col),
        ))
    }

    /// 指定された座標が結合範囲内にあるかを判定
    pub fn contains(&self, coord: CellCoord) -> bool {
        self.range.contains(coord)
    }

    /// 境界が不正（反転・0座標）な結合範囲かどうか
    pub fn is_degenerate(&self) -> bool {
        self.range.is_degenerate()
    }
}

/// RGBカラー
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const WHITE: Rgb = Rgb::new(0xFF, 0xFF, 0xFF);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// `RRGGBB`または`AARRGGBB`形式（先頭の`#`は任意）を解析
    ///
    /// ARGB形式のアルファ成分は無視します。
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.trim().trim_start_matches('#');
        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        let rgb = match hex.len() {
            6 => hex,
            8 => &hex[2..],
            _ => return None,
        };
        let value = u32::from_str_radix(rgb, 16).ok()?;
        Some(Self::new(
            ((value >> 16) & 0xFF) as u8,
            ((value >> 8) & 0xFF) as u8,
            (value & 0xFF) as u8,
        ))
    }

    /// 大文字の6桁16進表記（例: "FFFF00"）
    pub fn to_hex(&self) -> String {
        format!("{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

/// セルのスタイル情報
///
/// 取り込み時に一度だけ構築され、以降は読み取り専用です。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CellStyle {
    pub bold: bool,
    pub italic: bool,
    pub strikethrough: bool,
    /// 塗りつぶし色（塗りつぶしなしの場合は`None`）
    pub background: Option<Rgb>,
}

impl CellStyle {
    pub fn bold() -> Self {
        Self {
            bold: true,
            ..Default::default()
        }
    }

    pub fn italic() -> Self {
        Self {
            italic: true,
            ..Default::default()
        }
    }

    pub fn strikethrough() -> Self {
        Self {
            strikethrough: true,
            ..Default::default()
        }
    }

    pub fn with_bold(mut self) -> Self {
        self.bold = true;
        self
    }

    pub fn with_italic(mut self) -> Self {
        self.italic = true;
        self
    }

    pub fn with_strikethrough(mut self) -> Self {
        self.strikethrough = true;
        self
    }

    pub fn with_background(mut self, color: Rgb) -> Self {
        self.background = Some(color);
        self
    }
}

/// シート上の1セル
#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    /// セル座標（1始まり）
    pub coord: CellCoord,

    /// セルの値（数式セルは評価済みの値）
    pub value: CellValue,

    /// スタイル情報（書式設定されていないセルは`None`）
    pub style: Option<CellStyle>,

    /// ハイパーリンクのURL
    pub hyperlink: Option<String>,
}

impl Cell {
    pub fn new(coord: CellCoord, value: impl Into<CellValue>) -> Self {
        Self {
            coord,
            value: value.into(),
            style: None,
            hyperlink: None,
        }
    }

    pub fn with_style(mut self, style: CellStyle) -> Self {
        self.style = Some(style);
        self
    }

    pub fn with_hyperlink(mut self, url: impl Into<String>) -> Self {
        self.hyperlink = Some(url.into());
        self
    }
}

/// ワークシート
///
/// セルは疎に保持し、行優先で走査できるよう`BTreeMap`に格納します。
/// 公称サイズ（nominal extent）は、実際にデータのある範囲より大きく宣言されていることがあります。
#[derive(Debug, Clone, Default)]
pub struct Sheet {
    name: String,
    cells: BTreeMap<CellCoord, Cell>,
    merged_regions: Vec<MergedRegion>,
    nominal_rows: u32,
    nominal_cols: u32,
}

impl Sheet {
    /// 空のシートを生成
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// セルを追加（同じ座標のセルは置き換え）
    ///
    /// 0座標のセルは無視します。公称サイズはセル位置に合わせて拡張されます。
    pub fn insert(&mut self, cell: Cell) {
        if !cell.coord.is_valid() {
            return;
        }
        self.nominal_rows = self.nominal_rows.max(cell.coord.row);
        self.nominal_cols = self.nominal_cols.max(cell.coord.col);
        self.cells.insert(cell.coord, cell);
    }

    /// 値のみのセルを追加するショートカット
    pub fn set_value(&mut self, row: u32, col: u32, value: impl Into<CellValue>) {
        self.insert(Cell::new(CellCoord::new(row, col), value));
    }

    /// ビルダー形式でセルを追加
    pub fn with_cell(mut self, cell: Cell) -> Self {
        self.insert(cell);
        self
    }

    /// 結合範囲を追加（縮退した範囲もそのまま保持し、解決時にスキップする）
    pub fn add_merged_region(&mut self, region: MergedRegion) {
        self.merged_regions.push(region);
    }

    /// ビルダー形式で結合範囲を追加
    pub fn with_merged_region(mut self, region: MergedRegion) -> Self {
        self.add_merged_region(region);
        self
    }

    /// 宣言された公称サイズを設定（既存のサイズより小さくはならない）
    pub fn declare_extent(&mut self, rows: u32, cols: u32) {
        self.nominal_rows = self.nominal_rows.max(rows);
        self.nominal_cols = self.nominal_cols.max(cols);
    }

    /// ビルダー形式で公称サイズを宣言
    pub fn with_declared_extent(mut self, rows: u32, cols: u32) -> Self {
        self.declare_extent(rows, cols);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// 指定座標のセルを取得
    pub fn cell(&self, coord: CellCoord) -> Option<&Cell> {
        self.cells.get(&coord)
    }

    /// 行優先で全セルを走査
    pub fn cells(&self) -> impl Iterator<Item = &Cell> {
        self.cells.values()
    }

    /// 指定行までのセルを行優先で走査（行は1始まり、`max_row`を含む）
    pub fn cells_up_to_row(&self, max_row: u32) -> impl Iterator<Item = &Cell> {
        self.cells
            .range(..=CellCoord::new(max_row, u32::MAX))
            .map(|(_, cell)| cell)
    }

    /// セルが格納されている最下行（セルがなければ0）
    pub fn last_row(&self) -> u32 {
        self.cells.keys().next_back().map_or(0, |coord| coord.row)
    }

    pub fn merged_regions(&self) -> &[MergedRegion] {
        &self.merged_regions
    }

    /// 公称サイズ（行数, 列数）
    pub fn nominal_extent(&self) -> (u32, u32) {
        (self.nominal_rows, self.nominal_cols)
    }

    /// 格納されているセル数
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }
}

/// ワークブック
///
/// シートの順序はソースでの宣言順で、出力でもこの順序が保たれます。
#[derive(Debug, Clone, Default)]
pub struct Workbook {
    /// ドキュメントのタイトルとして使われる名前
    pub name: String,

    /// シート（宣言順）
    pub sheets: Vec<Sheet>,
}

impl Workbook {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sheets: Vec::new(),
        }
    }

    pub fn with_sheet(mut self, sheet: Sheet) -> Self {
        self.sheets.push(sheet);
        self
    }
}

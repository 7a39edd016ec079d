//! Workbook Parser Module
//!
//! calamineでセル値と結合範囲を読み込み、XMLメタデータ（スタイル・ハイパーリンク・宣言サイズ）と
//! 組み合わせて、変換対象の`Sheet`を構築するモジュール。

use std::io::{Cursor, Read};
use std::sync::Arc;

use calamine::{open_workbook_auto_from_rs, Data, Reader, Sheets, Xlsx};
use tracing::debug;

use crate::api::SheetSelector;
use crate::error::XlsxMarkError;
use crate::parser::metadata::XlsxMetadataParser;
use crate::security::ArchiveLimits;
use crate::types::{Cell, CellCoord, CellValue, MergedRegion, Sheet, Workbook};

/// 1900年エポックと1904年エポックのシリアル値の差（日数）
const EPOCH_1904_OFFSET: f64 = 1462.0;

/// 入力バイト列（calamineとメタデータパーサーで共有）
type SharedBytes = Cursor<Arc<[u8]>>;

/// ワークブックパーサー
///
/// calamineのラッパーとして、ワークブックレベルの操作を提供します。
/// 入力は一度だけメモリに読み込み、calamineとXMLメタデータパーサーで共有します。
pub(crate) struct WorkbookParser {
    /// calamineのワークブック（XLSX形式のみサポート）
    workbook: Xlsx<SharedBytes>,
    /// XMLメタデータパーサー
    metadata: XlsxMetadataParser<SharedBytes>,
}

impl WorkbookParser {
    /// ワークブックを開き、XMLメタデータと結合範囲を読み込む
    ///
    /// # 引数
    ///
    /// * `reader` - XLSXファイルを読み込むためのリーダー
    ///
    /// # 戻り値
    ///
    /// * `Ok(WorkbookParser)` - ワークブックの読み込みに成功した場合
    /// * `Err(XlsxMarkError::SecurityViolation)` - 入力またはアーカイブが制限を超えた場合
    /// * `Err(XlsxMarkError::Config)` - XLSX形式でない場合
    /// * `Err(XlsxMarkError::Parse)` - calamineでの読み込みに失敗した場合
    pub fn open<R: Read>(reader: R) -> Result<Self, XlsxMarkError> {
        Self::open_with_limits(reader, ArchiveLimits::default())
    }

    /// 制限を指定してワークブックを開く
    pub fn open_with_limits<R: Read>(
        mut reader: R,
        limits: ArchiveLimits,
    ) -> Result<Self, XlsxMarkError> {
        // 制限+1バイトまでしか読まない
        let mut buffer = Vec::new();
        reader
            .by_ref()
            .take(limits.max_input_size.saturating_add(1))
            .read_to_end(&mut buffer)?;
        limits.check_input_size(buffer.len() as u64)?;

        let bytes: Arc<[u8]> = Arc::from(buffer);

        // アーカイブの検証はcalamineに渡す前に行う
        let metadata = XlsxMetadataParser::new(Cursor::new(Arc::clone(&bytes)), limits)?;

        let sheets = open_workbook_auto_from_rs(Cursor::new(bytes)).map_err(XlsxMarkError::Parse)?;
        let mut workbook = match sheets {
            Sheets::Xlsx(workbook) => workbook,
            _ => {
                return Err(XlsxMarkError::Config(
                    "Only XLSX format is supported".to_string(),
                ))
            }
        };
        workbook
            .load_merged_regions()
            .map_err(|e| XlsxMarkError::Parse(e.into()))?;

        Ok(Self { workbook, metadata })
    }

    /// すべてのシート名を宣言順で取得
    pub fn sheet_names(&self) -> Vec<String> {
        self.workbook.sheet_names().to_vec()
    }

    /// シート選択方式に基づいてシートを選択
    ///
    /// # 戻り値
    ///
    /// * `Ok(Vec<String>)` - 選択されたシート名のリスト（指定順）
    /// * `Err(XlsxMarkError::Config)` - シートが見つからない、またはインデックスが範囲外の場合
    pub fn select_sheets(&self, selector: &SheetSelector) -> Result<Vec<String>, XlsxMarkError> {
        let all_sheet_names = self.sheet_names();

        let by_index = |index: usize| {
            all_sheet_names.get(index).cloned().ok_or_else(|| {
                XlsxMarkError::Config(format!(
                    "Sheet index {} is out of range (total: {})",
                    index,
                    all_sheet_names.len()
                ))
            })
        };
        let by_name = |name: &String| {
            if all_sheet_names.contains(name) {
                Ok(name.clone())
            } else {
                Err(XlsxMarkError::Config(format!("Sheet '{}' not found", name)))
            }
        };

        match selector {
            SheetSelector::All => Ok(all_sheet_names.clone()),
            SheetSelector::Index(index) => Ok(vec![by_index(*index)?]),
            SheetSelector::Name(name) => Ok(vec![by_name(name)?]),
            SheetSelector::Indices(indices) => indices.iter().map(|&i| by_index(i)).collect(),
            SheetSelector::Names(names) => names.iter().map(by_name).collect(),
        }
    }

    /// シートを解析して`Sheet`を構築
    ///
    /// # 引数
    ///
    /// * `sheet_name` - 解析するシート名
    ///
    /// # 戻り値
    ///
    /// * `Ok(Sheet)` - セル値・スタイル・ハイパーリンク・結合範囲・公称サイズを持つシート
    /// * `Err(XlsxMarkError)` - 解析エラーが発生した場合
    pub fn parse_sheet(&mut self, sheet_name: &str) -> Result<Sheet, XlsxMarkError> {
        let range = self
            .workbook
            .worksheet_range(sheet_name)
            .map_err(|e| XlsxMarkError::Parse(e.into()))?;
        let mut facts = self.metadata.sheet_facts(sheet_name)?;
        let is_1904 = self.metadata.is_1904();

        let mut sheet = Sheet::new(sheet_name);

        // 1. セル値（calamineの座標は0始まりの絶対座標）
        if let Some((start_row, start_col)) = range.start() {
            for (r, c, data) in range.cells() {
                let coord = CellCoord::new(start_row + r as u32 + 1, start_col + c as u32 + 1);
                let value = convert_value(data, is_1904);
                let hyperlink = facts.hyperlinks.remove(&coord);
                if value.is_empty() && hyperlink.is_none() {
                    continue;
                }

                let mut cell = Cell::new(coord, value);
                cell.hyperlink = hyperlink;
                cell.style = facts
                    .style_ids
                    .get(&coord)
                    .and_then(|&id| self.metadata.cell_style(id))
                    .copied();
                sheet.insert(cell);
            }
        }

        // 2. 値を持たないハイパーリンクセル
        for (coord, url) in facts.hyperlinks {
            let style = facts
                .style_ids
                .get(&coord)
                .and_then(|&id| self.metadata.cell_style(id))
                .copied();
            let mut cell = Cell::new(coord, CellValue::Empty).with_hyperlink(url);
            cell.style = style;
            sheet.insert(cell);
        }

        // 3. 公称サイズ（calamineの範囲と<dimension>宣言の大きい方）
        if let Some((end_row, end_col)) = range.end() {
            sheet.declare_extent(end_row + 1, end_col + 1);
        }
        if let Some(dimension) = facts.dimension.filter(|d| !d.is_degenerate()) {
            sheet.declare_extent(dimension.end.row, dimension.end.col);
        }

        // 4. 結合範囲（0始まり -> 1始まり）
        match self.workbook.worksheet_merge_cells(sheet_name) {
            Some(Ok(regions)) => {
                for dims in regions {
                    sheet.add_merged_region(MergedRegion::from_bounds(
                        dims.start.0 + 1,
                        dims.start.1 + 1,
                        dims.end.0 + 1,
                        dims.end.1 + 1,
                    ));
                }
            }
            Some(Err(e)) => return Err(XlsxMarkError::Parse(e.into())),
            None => {}
        }

        debug!(
            sheet = sheet_name,
            cells = sheet.cell_count(),
            merged_regions = sheet.merged_regions().len(),
            "parsed sheet"
        );

        Ok(sheet)
    }

    /// 選択されたシートをすべて解析して`Workbook`を構築
    ///
    /// # 引数
    ///
    /// * `name` - ワークブック名（ドキュメントのタイトルの既定値）
    /// * `selector` - シート選択方式
    pub fn parse_workbook(
        &mut self,
        name: &str,
        selector: &SheetSelector,
    ) -> Result<Workbook, XlsxMarkError> {
        let mut workbook = Workbook::new(name);
        for sheet_name in self.select_sheets(selector)? {
            workbook.sheets.push(self.parse_sheet(&sheet_name)?);
        }
        Ok(workbook)
    }
}

/// calamineのセル値を`CellValue`に変換
///
/// 1904年エポックのシリアル値は1900年エポックに揃えます。
fn convert_value(data: &Data, is_1904: bool) -> CellValue {
    match data {
        Data::Int(i) => CellValue::Number(*i as f64),
        Data::Float(f) => CellValue::Number(*f),
        Data::String(s) if s.is_empty() => CellValue::Empty,
        Data::String(s) => CellValue::Text(s.clone()),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::DateTime(dt) => {
            let serial = dt.as_f64();
            CellValue::DateTime(if is_1904 {
                serial + EPOCH_1904_OFFSET
            } else {
                serial
            })
        }
        Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::Text(s.clone()),
        Data::Error(e) => CellValue::Error(e.to_string()),
        Data::Empty => CellValue::Empty,
        #[allow(unreachable_patterns)]
        _ => CellValue::Empty,
    }
}

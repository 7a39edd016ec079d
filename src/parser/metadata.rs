//! XML Metadata Parser Module
//!
//! XLSX内部のXMLファイルから、calamineで取得できない情報を抽出するモジュール。
//! シート名とワークシートXMLの対応、セルのスタイル（太字・斜体・取り消し線・塗りつぶし）、
//! ハイパーリンク、宣言されたシートサイズ、1904年エポック判定を提供します。

use std::collections::HashMap;
use std::io::{Read, Seek};

use quick_xml::escape::unescape;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use zip::ZipArchive;

use crate::error::XlsxMarkError;
use crate::security::ArchiveLimits;
use crate::types::{CellCoord, CellRange, CellStyle, Rgb};

const WORKBOOK_PART: &str = "xl/workbook.xml";
const WORKBOOK_RELS_PART: &str = "xl/_rels/workbook.xml.rels";
const STYLES_PART: &str = "xl/styles.xml";

/// ワークシートXMLから取り出したシート単位の情報
#[derive(Debug, Clone, Default)]
pub(crate) struct SheetFacts {
    /// セル座標 -> cellXfsのインデックス（`<c s="N">`）
    pub style_ids: HashMap<CellCoord, u32>,

    /// セル座標 -> ハイパーリンクのURL
    pub hyperlinks: HashMap<CellCoord, String>,

    /// `<dimension ref="A1:C10"/>`で宣言された範囲
    pub dimension: Option<CellRange>,
}

/// フォント要素のうち変換に必要な属性
#[derive(Debug, Clone, Copy, Default)]
struct FontFacts {
    bold: bool,
    italic: bool,
    strike: bool,
}

/// XLSXメタデータパーサー
///
/// XLSXファイル（ZIPアーカイブ）からXMLを直接解析します。
/// ワークブック全体の情報は生成時に解析し、シート単位の情報は`sheet_facts`で必要なシートだけ解析します。
pub(crate) struct XlsxMetadataParser<R: Read + Seek> {
    archive: ZipArchive<R>,
    limits: ArchiveLimits,
    /// シート名 -> ワークシートXMLのパス（宣言順）
    sheet_parts: Vec<(String, String)>,
    /// cellXfsのインデックス -> スタイル（書式なしは`None`）
    cell_styles: Vec<Option<CellStyle>>,
    /// 1904年エポックを使用するかどうか
    is_1904: bool,
}

impl<R: Read + Seek> XlsxMetadataParser<R> {
    /// XLSXファイル（ZIPアーカイブ）からメタデータを解析
    ///
    /// # 引数
    ///
    /// * `xlsx_reader` - XLSXファイルを読み込むためのリーダー
    /// * `limits` - アーカイブ読み込みの制限
    ///
    /// # 戻り値
    ///
    /// * `Ok(XlsxMetadataParser)` - メタデータの解析に成功した場合
    /// * `Err(XlsxMarkError)` - 制限違反、またはZIP/XMLの解析エラー
    pub fn new(xlsx_reader: R, limits: ArchiveLimits) -> Result<Self, XlsxMarkError> {
        let mut archive =
            ZipArchive::new(xlsx_reader).map_err(|e| XlsxMarkError::Zip(e.to_string()))?;
        limits.check_archive(&mut archive)?;

        // 1. xl/workbook.xml と xl/_rels/workbook.xml.rels
        let (is_1904, declared_sheets) = match limits.read_entry(&mut archive, WORKBOOK_PART)? {
            Some(xml) => parse_workbook(&xml)?,
            None => (false, Vec::new()),
        };
        let workbook_rels = match limits.read_entry(&mut archive, WORKBOOK_RELS_PART)? {
            Some(xml) => parse_relationships(&xml, WORKBOOK_RELS_PART)?,
            None => HashMap::new(),
        };
        let sheet_parts = declared_sheets
            .into_iter()
            .filter_map(|(name, rel_id)| {
                let target = workbook_rels.get(&rel_id)?;
                Some((name, resolve_target("xl", target)))
            })
            .collect();

        // 2. xl/styles.xml
        let cell_styles = match limits.read_entry(&mut archive, STYLES_PART)? {
            Some(xml) => parse_styles(&xml)?,
            None => Vec::new(),
        };

        Ok(Self {
            archive,
            limits,
            sheet_parts,
            cell_styles,
            is_1904,
        })
    }

    /// 1904年エポックを使用するかどうか
    pub fn is_1904(&self) -> bool {
        self.is_1904
    }

    /// cellXfsのインデックスからスタイルを取得
    pub fn cell_style(&self, style_id: u32) -> Option<&CellStyle> {
        self.cell_styles
            .get(style_id as usize)
            .and_then(Option::as_ref)
    }

    /// シートのワークシートXMLを解析
    ///
    /// シート名に対応するパートが見つからない場合は空の情報を返します。
    pub fn sheet_facts(&mut self, sheet_name: &str) -> Result<SheetFacts, XlsxMarkError> {
        let Some(part) = self
            .sheet_parts
            .iter()
            .find(|(name, _)| name == sheet_name)
            .map(|(_, part)| part.clone())
        else {
            return Ok(SheetFacts::default());
        };

        let Some(xml) = self.limits.read_entry(&mut self.archive, &part)? else {
            return Ok(SheetFacts::default());
        };

        let rels_part = relationships_part_for(&part);
        let rels = match self.limits.read_entry(&mut self.archive, &rels_part)? {
            Some(rels_xml) => parse_relationships(&rels_xml, &rels_part)?,
            None => HashMap::new(),
        };

        parse_worksheet(&xml, &part, &rels)
    }
}

/// パートのパスから、対応するリレーションシップファイルのパスを求める
///
/// 例: `xl/worksheets/sheet1.xml` -> `xl/worksheets/_rels/sheet1.xml.rels`
fn relationships_part_for(part: &str) -> String {
    match part.rsplit_once('/') {
        Some((dir, file)) => format!("{}/_rels/{}.rels", dir, file),
        None => format!("_rels/{}.rels", part),
    }
}

/// リレーションシップのターゲットをパッケージ内の絶対パスに解決
///
/// `/xl/worksheets/sheet1.xml`（絶対）と`worksheets/sheet1.xml`（`base`からの相対）の両方に対応します。
fn resolve_target(base: &str, target: &str) -> String {
    let joined = match target.strip_prefix('/') {
        Some(absolute) => absolute.to_string(),
        None => format!("{}/{}", base, target),
    };

    let mut segments: Vec<&str> = Vec::new();
    for segment in joined.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }
    segments.join("/")
}

/// 属性値を文字列として取得（XMLエスケープを解除）
fn attribute(
    element: &BytesStart<'_>,
    key: &[u8],
    part: &str,
) -> Result<Option<String>, XlsxMarkError> {
    for attr in element.attributes() {
        let attr = attr.map_err(|e| XlsxMarkError::xml(part, e))?;
        if attr.key.as_ref() == key {
            let raw = std::str::from_utf8(&attr.value)?;
            let value = unescape(raw).map_err(|e| XlsxMarkError::xml(part, e))?;
            return Ok(Some(value.into_owned()));
        }
    }
    Ok(None)
}

/// 真偽値属性（`val="0"`などを考慮）
///
/// `<b/>`のように`val`属性がない場合は真とみなします。
fn flag_value(element: &BytesStart<'_>, part: &str) -> Result<bool, XlsxMarkError> {
    Ok(match attribute(element, b"val", part)? {
        Some(v) => !matches!(v.as_str(), "0" | "false"),
        None => true,
    })
}

/// xl/workbook.xml の解析
///
/// `<workbookPr date1904="1"/>` と `<sheet name="..." r:id="rId1"/>` を取り出します。
///
/// # 戻り値
///
/// `(1904年エポックかどうか, [(シート名, リレーションシップID)])`
fn parse_workbook(xml: &[u8]) -> Result<(bool, Vec<(String, String)>), XlsxMarkError> {
    let mut reader = Reader::from_reader(xml);
    reader.trim_text(true);

    let mut buf = Vec::new();
    let mut is_1904 = false;
    let mut sheets = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => match e.local_name().as_ref() {
                b"workbookPr" => {
                    if let Some(value) = attribute(&e, b"date1904", WORKBOOK_PART)? {
                        is_1904 = value == "1" || value == "true";
                    }
                }
                b"sheet" => {
                    let name = attribute(&e, b"name", WORKBOOK_PART)?;
                    let rel_id = attribute(&e, b"r:id", WORKBOOK_PART)?;
                    if let (Some(name), Some(rel_id)) = (name, rel_id) {
                        sheets.push((name, rel_id));
                    }
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(XlsxMarkError::xml(WORKBOOK_PART, e)),
            _ => {}
        }
        buf.clear();
    }

    Ok((is_1904, sheets))
}

/// リレーションシップファイルを解析（Id -> Target）
fn parse_relationships(xml: &[u8], part: &str) -> Result<HashMap<String, String>, XlsxMarkError> {
    let mut reader = Reader::from_reader(xml);
    reader.trim_text(true);

    let mut buf = Vec::new();
    let mut relationships = HashMap::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => {
                if e.local_name().as_ref() == b"Relationship" {
                    let id = attribute(&e, b"Id", part)?;
                    let target = attribute(&e, b"Target", part)?;
                    if let (Some(id), Some(target)) = (id, target) {
                        relationships.insert(id, target);
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(XlsxMarkError::xml(part, e)),
            _ => {}
        }
        buf.clear();
    }

    Ok(relationships)
}

/// xl/styles.xml の解析
///
/// `<fonts>`、`<fills>`、`<cellXfs>`を解析し、cellXfsのインデックスごとのスタイルを構築します。
/// `<dxfs>`（条件付き書式）や`<cellStyleXfs>`内の同名要素は対象外です。
fn parse_styles(xml: &[u8]) -> Result<Vec<Option<CellStyle>>, XlsxMarkError> {
    let mut reader = Reader::from_reader(xml);
    reader.trim_text(true);

    let mut buf = Vec::new();
    let mut fonts: Vec<FontFacts> = Vec::new();
    let mut fills: Vec<Option<Rgb>> = Vec::new();
    let mut xfs: Vec<(Option<usize>, Option<usize>)> = Vec::new();

    let mut in_fonts = false;
    let mut in_fills = false;
    let mut in_cell_xfs = false;
    let mut current_font: Option<FontFacts> = None;
    // (patternTypeが塗りつぶしかどうか, 前景色)
    let mut current_fill: Option<(bool, Option<Rgb>)> = None;

    loop {
        let event = reader
            .read_event_into(&mut buf)
            .map_err(|e| XlsxMarkError::xml(STYLES_PART, e))?;
        let is_empty = matches!(event, Event::Empty(_));

        match event {
            Event::Start(e) | Event::Empty(e) => match e.local_name().as_ref() {
                b"fonts" if !is_empty => in_fonts = true,
                b"fills" if !is_empty => in_fills = true,
                b"cellXfs" if !is_empty => in_cell_xfs = true,
                b"font" if in_fonts => {
                    if is_empty {
                        fonts.push(FontFacts::default());
                    } else {
                        current_font = Some(FontFacts::default());
                    }
                }
                b"b" => {
                    if let Some(font) = current_font.as_mut() {
                        font.bold = flag_value(&e, STYLES_PART)?;
                    }
                }
                b"i" => {
                    if let Some(font) = current_font.as_mut() {
                        font.italic = flag_value(&e, STYLES_PART)?;
                    }
                }
                b"strike" => {
                    if let Some(font) = current_font.as_mut() {
                        font.strike = flag_value(&e, STYLES_PART)?;
                    }
                }
                b"fill" if in_fills => {
                    if is_empty {
                        fills.push(None);
                    } else {
                        current_fill = Some((false, None));
                    }
                }
                b"patternFill" => {
                    if let Some(fill) = current_fill.as_mut() {
                        let pattern = attribute(&e, b"patternType", STYLES_PART)?;
                        fill.0 = !matches!(pattern.as_deref(), None | Some("none"));
                    }
                }
                b"fgColor" => {
                    if let Some(fill) = current_fill.as_mut() {
                        fill.1 = attribute(&e, b"rgb", STYLES_PART)?
                            .as_deref()
                            .and_then(Rgb::from_hex);
                    }
                }
                b"xf" if in_cell_xfs => {
                    let font_id = attribute(&e, b"fontId", STYLES_PART)?
                        .map(|v| v.parse::<usize>())
                        .transpose()?;
                    let fill_id = attribute(&e, b"fillId", STYLES_PART)?
                        .map(|v| v.parse::<usize>())
                        .transpose()?;
                    xfs.push((font_id, fill_id));
                }
                _ => {}
            },
            Event::End(e) => match e.local_name().as_ref() {
                b"fonts" => in_fonts = false,
                b"fills" => in_fills = false,
                b"cellXfs" => in_cell_xfs = false,
                b"font" => {
                    if let Some(font) = current_font.take() {
                        fonts.push(font);
                    }
                }
                b"fill" => {
                    if let Some((solid, color)) = current_fill.take() {
                        fills.push(if solid { color } else { None });
                    }
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    let styles = xfs
        .into_iter()
        .map(|(font_id, fill_id)| {
            let font = font_id
                .and_then(|id| fonts.get(id).copied())
                .unwrap_or_default();
            let background = fill_id.and_then(|id| fills.get(id).copied().flatten());
            let style = CellStyle {
                bold: font.bold,
                italic: font.italic,
                strikethrough: font.strike,
                background,
            };
            (style != CellStyle::default()).then_some(style)
        })
        .collect();

    Ok(styles)
}

/// ワークシートXMLを解析
///
/// `<dimension>`、各セルの`s`属性、`<hyperlink>`を取り出します。
/// 範囲指定（`A1:B2`）のハイパーリンクは左上セルに割り当てます。
/// 外部リンクはリレーションシップのターゲット、ブック内リンクは`#`+`location`をURLとします。
fn parse_worksheet(
    xml: &[u8],
    part: &str,
    rels: &HashMap<String, String>,
) -> Result<SheetFacts, XlsxMarkError> {
    let mut reader = Reader::from_reader(xml);
    reader.trim_text(true);

    let mut buf = Vec::new();
    let mut facts = SheetFacts::default();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => match e.local_name().as_ref() {
                b"dimension" => {
                    facts.dimension = attribute(&e, b"ref", part)?
                        .as_deref()
                        .and_then(CellRange::from_a1_notation);
                }
                b"c" => {
                    let coord = attribute(&e, b"r", part)?
                        .as_deref()
                        .and_then(CellCoord::from_a1_notation);
                    let style_id = attribute(&e, b"s", part)?
                        .map(|v| v.parse::<u32>())
                        .transpose()?;
                    if let (Some(coord), Some(style_id)) = (coord, style_id) {
                        if style_id != 0 {
                            facts.style_ids.insert(coord, style_id);
                        }
                    }
                }
                b"hyperlink" => {
                    let range = attribute(&e, b"ref", part)?
                        .as_deref()
                        .and_then(CellRange::from_a1_notation);
                    let external = attribute(&e, b"r:id", part)?
                        .and_then(|id| rels.get(&id).cloned());
                    let internal = attribute(&e, b"location", part)?
                        .map(|location| format!("#{}", location));
                    let url = external.or(internal).filter(|url| !url.is_empty());
                    if let (Some(range), Some(url)) = (range, url) {
                        facts.hyperlinks.insert(range.start, url);
                    }
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(XlsxMarkError::xml(part, e)),
            _ => {}
        }
        buf.clear();
    }

    Ok(facts)
}

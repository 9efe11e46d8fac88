use crate::error::PartTallyError;
use crate::grid::reference::reference_to_index;
use crate::grid::CellCoordinate;
use crate::grid::CellValue;
use crate::grid::Document;
use crate::grid::SheetGrid;
use crate::source::archive::ZipArchiveExt;
use crate::source::xml::for_each_xml_event;
use crate::source::xml::StartTagExt;
use crate::source::xml::TextSink;
use crate::source::xml::XmlReader;
use crate::source::SourceError;
use quick_xml::events::Event;
use quick_xml::name::QName;
use std::collections::HashMap;
use std::fs::File;
use std::io::BufRead;
use std::io::BufReader;
use std::io::Read;
use std::io::Seek;
use std::path::Path;
use tracing::debug;
use tracing::warn;
use zip::ZipArchive;

// XML tag names for parsing Excel XLSX format
const TAG_SHARED_STRING_ITEM: QName = QName(b"si"); // Shared string table item
const TAG_PHONETIC_TEXT: QName = QName(b"rPh"); // Phonetic text for Asian languages
const TAG_TEXT: QName = QName(b"t"); // Text content within strings
const TAG_SHEET: QName = QName(b"sheet"); // Worksheet definition
const TAG_ROW: QName = QName(b"row"); // Row in worksheet
const TAG_CELL: QName = QName(b"c"); // Cell in worksheet
const TAG_INLINE_STRING: QName = QName(b"is"); // Inline string value
const TAG_VALUE: QName = QName(b"v"); // Cell value content
const TAG_RELATIONSHIP: &[u8] = b"Relationship";

const WORKBOOK_PATH: &str = "xl/workbook.xml";
const WORKBOOK_RELATIONSHIPS_PATH: &str = "xl/_rels/workbook.xml.rels";
const SHARED_STRINGS_PATH: &str = "xl/sharedStrings.xml";

/// How a `<c>` element's value is stored, from its `t` attribute.
#[derive(Copy, Clone, Debug, PartialEq)]
enum CellKind {
    Number,
    SharedString,
    Text,
    Boolean,
    Error,
}

impl CellKind {
    fn parse(kind: Option<&str>) -> Self {
        match kind {
            Some("s") => Self::SharedString,
            Some("inlineStr") | Some("str") | Some("d") => Self::Text,
            Some("b") => Self::Boolean,
            Some("e") => Self::Error,
            _ => Self::Number,
        }
    }
}

/// An Excel 2007+ workbook (`.xlsx`, `.xlsm`).
pub(crate) struct XlsxWorkbook<R: Read + Seek> {
    name: String,
    zip: ZipArchive<R>,
    /// Worksheets as (sheet name, zip path), in workbook order
    sheets: Vec<(String, String)>,
}

impl XlsxWorkbook<BufReader<File>> {
    /// Opens an XLSX file from disk
    ///
    /// # Arguments
    /// * `path` - Path to the `.xlsx` or `.xlsm` file
    ///
    /// # Returns
    /// The workbook with its worksheet list resolved, or an error
    pub(crate) fn open(path: &Path) -> Result<Self, PartTallyError> {
        let file = File::open(path)?;
        Self::from_reader(&path.to_string_lossy(), BufReader::new(file))
    }
}

impl<R: Read + Seek> XlsxWorkbook<R> {
    /// Opens the archive and resolves the worksheet list
    ///
    /// # Arguments
    /// * `name` - Name reported for the document
    /// * `reader` - Seekable source of the ZIP container
    ///
    /// # Returns
    /// The workbook, or an error if the archive is unreadable or has no sheets
    pub(crate) fn from_reader(name: &str, reader: R) -> Result<Self, PartTallyError> {
        let mut zip = ZipArchive::new(reader)?;
        let sheets = load_workbook(&mut zip)?;
        if sheets.is_empty() {
            Err(SourceError::EmptyWorkbook(name.to_owned()))?
        }
        Ok(Self {
            name: name.to_owned(),
            zip,
            sheets,
        })
    }

    /// Reads every worksheet into a [`Document`]
    ///
    /// # Returns
    /// The document with one [`SheetGrid`] per worksheet, in workbook order
    pub(crate) fn read_document(&mut self) -> Result<Document, PartTallyError> {
        let shared_strings = self.load_shared_strings()?;
        let mut sheets = Vec::with_capacity(self.sheets.len());
        for (sheet_name, zip_path) in &self.sheets {
            let mut reader = self
                .zip
                .xml_entry(zip_path)?
                .ok_or_else(|| SourceError::MissingPart(zip_path.to_owned()))?;
            let sheet = read_worksheet(&mut reader, sheet_name, &shared_strings)?;
            debug!(document = %self.name, sheet = %sheet_name, cells = sheet.len(), "worksheet loaded");
            sheets.push(sheet);
        }
        Ok(Document::new(&self.name, sheets))
    }

    /// Loads the shared string table; a workbook without one has none.
    fn load_shared_strings(&mut self) -> Result<Vec<String>, PartTallyError> {
        let mut shared_strings = Vec::new();
        let Some(mut reader) = self.zip.xml_entry(SHARED_STRINGS_PATH)? else {
            return Ok(shared_strings);
        };
        for_each_xml_event!(reader => {
            Event::Start(event) if event.name() == TAG_SHARED_STRING_ITEM => {
                shared_strings.push(read_string_value(&mut reader, TAG_SHARED_STRING_ITEM, false)?);
            }
        });
        Ok(shared_strings)
    }
}

/// Reads `<sheetData>` cells into a sheet grid.
///
/// Cells without a usable `r` attribute are placed by counting rows and
/// cells. Error cells are dropped.
///
/// # Arguments
/// * `reader` - XML reader positioned at the start of the worksheet part
/// * `sheet_name` - Name given to the resulting grid
/// * `shared_strings` - Shared string table for `t="s"` cells
fn read_worksheet<B: BufRead>(
    reader: &mut XmlReader<B>,
    sheet_name: &str,
    shared_strings: &[String],
) -> Result<SheetGrid, PartTallyError> {
    let mut cells = Vec::<(CellCoordinate, CellValue)>::new();
    let mut row_count = 0usize;
    let mut col_count = 0usize;
    let mut row = 0usize;
    let mut col = 0usize;
    let mut kind = CellKind::Number;
    let mut value = String::new();
    for_each_xml_event!(reader => {
        Event::Start(event) if event.name() == TAG_ROW => {
            row_count = event
                .parsed_attribute::<usize>("r")
                .ok()
                .flatten()
                .and_then(|r| r.checked_sub(1))
                .unwrap_or(row_count);
            col_count = 0;
        }
        Event::End(event) if event.name() == TAG_ROW => {
            row_count += 1;
        }
        Event::Start(event) if event.name() == TAG_CELL => {
            (row, col) = event
                .attribute("r")?
                .and_then(|reference| reference_to_index(&reference))
                .unwrap_or((row_count, col_count));
            col_count = col + 1;
            kind = CellKind::parse(event.attribute("t")?.as_deref());
            value.clear();
        }
        Event::Start(event) if event.name() == TAG_INLINE_STRING => {
            value = read_string_value(reader, TAG_INLINE_STRING, false)?;
        }
        Event::Start(event) if event.name() == TAG_VALUE => {
            value = read_string_value(reader, TAG_VALUE, true)?;
        }
        Event::End(event) if event.name() == TAG_CELL && !value.is_empty() => {
            let reference = CellCoordinate::from_index(row, col);
            match (reference, to_cell_value(kind, &value, shared_strings)) {
                (Some(coordinate), Some(cell)) => cells.push((coordinate, cell)),
                (coordinate, _) => warn!(
                    sheet = sheet_name,
                    cell = ?coordinate.map(|c| c.to_string()),
                    value = %value,
                    "cell skipped"
                ),
            }
            value.clear();
        }
    });
    Ok(SheetGrid::from_cells(sheet_name, cells))
}

/// Converts the raw `<v>`/`<is>` text of a cell into a value.
fn to_cell_value(kind: CellKind, value: &str, shared_strings: &[String]) -> Option<CellValue> {
    match kind {
        CellKind::Number => Some(
            value
                .parse::<f64>()
                .map(CellValue::Number)
                .unwrap_or_else(|_| CellValue::from(value)),
        ),
        CellKind::SharedString => value
            .parse::<usize>()
            .ok()
            .and_then(|index| shared_strings.get(index))
            .map(|text| CellValue::from(text.as_str())),
        CellKind::Text => Some(CellValue::from(value)),
        CellKind::Boolean => Some(CellValue::Boolean(value == "1" || value == "true")),
        CellKind::Error => None,
    }
}

/// Lists worksheets as (name, zip path) pairs from `xl/workbook.xml`.
fn load_workbook<R: Read + Seek>(zip: &mut ZipArchive<R>) -> Result<Vec<(String, String)>, PartTallyError> {
    let relationships = load_relationships(zip, WORKBOOK_RELATIONSHIPS_PATH)?;
    let mut reader = zip
        .xml_entry(WORKBOOK_PATH)?
        .ok_or_else(|| SourceError::MissingPart(WORKBOOK_PATH.to_owned()))?;
    let mut sheets = Vec::new();
    for_each_xml_event!(reader => {
        Event::Start(event) if event.name() == TAG_SHEET => {
            let mut name = None::<String>;
            let mut id = None::<String>;
            for attribute in event.attributes() {
                let attribute = attribute?;
                match attribute.key.local_name().as_ref() {
                    b"name" => name = Some(attribute.unescape_value()?.into_owned()),
                    b"id" => id = Some(attribute.unescape_value()?.into_owned()),
                    _ => (),
                }
            }
            if let Some((name, id)) = name.zip(id) {
                if let Some(path) = relationships.get(&id) {
                    sheets.push((name, path.to_owned()));
                }
            }
        }
    });
    Ok(sheets)
}

/// Maps relationship ids to worksheet zip paths.
fn load_relationships<R: Read + Seek>(
    zip: &mut ZipArchive<R>,
    path: &str,
) -> Result<HashMap<String, String>, PartTallyError> {
    let mut reader = zip
        .xml_entry(path)?
        .ok_or_else(|| SourceError::MissingPart(path.to_owned()))?;
    let mut relationships = HashMap::new();
    for_each_xml_event!(reader => {
        Event::Start(event) if event.local_name().as_ref() == TAG_RELATIONSHIP => {
            let is_worksheet = event
                .attribute("Type")?
                .map(|kind| kind.ends_with("/worksheet"))
                .unwrap_or(true);
            if let (true, Some(id), Some(target)) = (is_worksheet, event.attribute("Id")?, event.attribute("Target")?) {
                relationships.insert(id, to_zip_path(&target));
            }
        }
    });
    Ok(relationships)
}

/// Resolves a relationship target against the `xl/` folder.
fn to_zip_path(target: &str) -> String {
    if let Some(absolute) = target.strip_prefix('/') {
        absolute.to_owned()
    } else if target.starts_with("xl/") {
        target.to_owned()
    } else {
        format!("xl/{target}")
    }
}

/// Collects text up to `end_tag`, skipping phonetic runs.
///
/// With `is_text_content` the element's own text counts; otherwise only
/// text inside `<t>` children does (rich text and shared strings).
fn read_string_value<B: BufRead>(
    reader: &mut XmlReader<B>,
    end_tag: QName,
    is_text_content: bool,
) -> Result<String, PartTallyError> {
    let mut is_phonetic_text = false;
    let mut is_text = is_text_content;
    let mut text = String::new();
    for_each_xml_event!(reader => {
        Event::End(event) if event.name() == end_tag => break,
        Event::Start(event) if event.name() == TAG_PHONETIC_TEXT => is_phonetic_text = true,
        Event::End(event) if event.name() == TAG_PHONETIC_TEXT => is_phonetic_text = false,
        Event::Start(event) if !is_phonetic_text && event.name() == TAG_TEXT => is_text = true,
        Event::End(event) if is_text && event.name() == TAG_TEXT => is_text = false,
        Event::Text(event) if is_text => text.append_text(&event)?,
        Event::CData(event) if is_text => text.push_str(&event.xml_content()?),
        Event::GeneralRef(event) if is_text => text.append_reference(&event)?,
    });
    Ok(text)
}

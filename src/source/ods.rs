use crate::error::PartTallyError;
use crate::grid::CellCoordinate;
use crate::grid::CellValue;
use crate::grid::Document;
use crate::grid::SheetGrid;
use crate::source::archive::ZipArchiveExt;
use crate::source::xml::for_each_xml_event;
use crate::source::xml::StartTagExt;
use crate::source::xml::TextSink;
use crate::source::SourceError;
use quick_xml::events::Event;
use quick_xml::name::QName;
use std::fs::File;
use std::io::BufReader;
use std::io::Read;
use std::io::Seek;
use std::path::Path;
use tracing::debug;
use tracing::warn;
use zip::ZipArchive;

/// ODS file MIME type identifier
const MIME_TYPE: &str = "application/vnd.oasis.opendocument.spreadsheet";
/// XML element name for table (sheet)
const TABLE: QName = QName(b"table:table");
/// XML element name for table row
const TABLE_ROW: QName = QName(b"table:table-row");
/// XML element name for table cell
const TABLE_CELL: QName = QName(b"table:table-cell");
/// XML element name for covered table cell (merged cells)
const TABLE_COVERED_CELL: QName = QName(b"table:covered-table-cell");
/// XML element name for annotations (comments)
const ANNOTATION: QName = QName(b"office:annotation");
/// XML element name for paragraph text
const PARAGRAPH: QName = QName(b"text:p");
/// XML element name for string (space) text
const SPACE: QName = QName(b"text:s");
const FILE_ENTRY: QName = QName(b"manifest:file-entry");
const ENCRYPTION_DATA: QName = QName(b"manifest:encryption-data");

/// How the collected text of a cell becomes a [`CellValue`].
#[derive(Clone, Copy, Debug, PartialEq)]
enum OdsKind {
    Text,
    Number,
    Boolean,
}

/// An OpenDocument spreadsheet (`.ods`).
pub(crate) struct OdsWorkbook<R: Read + Seek> {
    name: String,
    zip: ZipArchive<R>,
}

impl OdsWorkbook<BufReader<File>> {
    /// Opens an ODS file from disk
    ///
    /// # Arguments
    /// * `path` - Path to the `.ods` file
    ///
    /// # Returns
    /// The workbook, or an error if it cannot be opened as an ODS spreadsheet
    pub(crate) fn open(path: &Path) -> Result<Self, PartTallyError> {
        let file = File::open(path)?;
        Self::from_reader(&path.to_string_lossy(), BufReader::new(file))
    }
}

impl<R: Read + Seek> OdsWorkbook<R> {
    /// Opens the archive, checking the MIME type and encryption
    ///
    /// # Arguments
    /// * `name` - Name reported for the document
    /// * `reader` - Seekable source of the ZIP container
    pub(crate) fn from_reader(name: &str, reader: R) -> Result<Self, PartTallyError> {
        let mut zip = ZipArchive::new(reader)?;
        check_mime(&mut zip, name)?;
        if is_password_protected(&mut zip)? {
            Err(SourceError::PasswordProtected(name.to_owned()))?
        }
        Ok(Self {
            name: name.to_owned(),
            zip,
        })
    }

    /// Reads every `table:table` of `content.xml` into a [`Document`]
    ///
    /// Repeated rows and columns are expanded for non-empty cells only.
    ///
    /// # Returns
    /// The document with one [`SheetGrid`] per table, in document order
    pub(crate) fn read_document(&mut self) -> Result<Document, PartTallyError> {
        let mut reader = self
            .zip
            .xml_entry("content.xml")?
            .ok_or_else(|| SourceError::MissingPart("content.xml".to_owned()))?;
        let mut sheets = Vec::<SheetGrid>::new();
        let mut sheet_name = String::new();
        let mut cells = Vec::<(CellCoordinate, CellValue)>::new();

        // Position of the current row/cell and how often each repeats
        let mut row = 0usize;
        let mut col = 0usize;
        let mut rows_repeated = 1usize;
        let mut cols_repeated = 1usize;
        let mut value = None::<String>;
        let mut kind = OdsKind::Text;
        // Whether paragraph text belongs to the value, and whether we are in a comment
        let mut text_context = false;
        let mut comment_context = false;
        for_each_xml_event!(reader => {
            Event::Start(event) if event.name() == TABLE => {
                sheet_name = event
                    .attribute("table:name")?
                    .unwrap_or_else(|| format!("Sheet{}", sheets.len() + 1));
                cells.clear();
                row = 0;
            }
            Event::End(event) if event.name() == TABLE => {
                let sheet = SheetGrid::from_cells(&sheet_name, cells.drain(..));
                debug!(document = %self.name, sheet = %sheet_name, cells = sheet.len(), "table loaded");
                sheets.push(sheet);
            }
            Event::Start(event) if event.name() == TABLE_ROW => {
                rows_repeated = event.parsed_attribute("table:number-rows-repeated")?.unwrap_or(1);
                col = 0;
            }
            Event::End(event) if event.name() == TABLE_ROW => {
                row += rows_repeated;
            }
            Event::Start(event) if event.name() == TABLE_CELL || event.name() == TABLE_COVERED_CELL => {
                cols_repeated = event.parsed_attribute("table:number-columns-repeated")?.unwrap_or(1);
                kind = OdsKind::Text;
                text_context = false;
                value = None;
                let is_error = event
                    .attribute("calcext:value-type")?
                    .map(|kind| kind == "error")
                    .unwrap_or(false);
                match event.attribute("office:value-type")?.as_deref() {
                    _ if is_error => (),
                    Some("string") => match event.attribute("office:string-value")? {
                        Some(text) => value = Some(text),
                        None => {
                            value = Some(String::new());
                            text_context = true;
                        }
                    },
                    Some("boolean") => {
                        value = event.attribute("office:boolean-value")?;
                        kind = OdsKind::Boolean;
                    }
                    Some("date") => value = event.attribute("office:date-value")?,
                    Some("time") => value = event.attribute("office:time-value")?,
                    Some(_) => {
                        value = event.attribute("office:value")?;
                        kind = OdsKind::Number;
                    }
                    None => (),
                }
            }
            Event::End(event) if event.name() == TABLE_CELL || event.name() == TABLE_COVERED_CELL => {
                if let Some(text) = value.take().filter(|text| !text.is_empty()) {
                    let cell = match kind {
                        OdsKind::Number => match text.parse::<f64>() {
                            Ok(number) => CellValue::Number(number),
                            Err(_) => CellValue::Text(text),
                        },
                        OdsKind::Boolean => CellValue::Boolean(text != "false" && text != "0"),
                        OdsKind::Text => CellValue::Text(text),
                    };
                    for row_offset in 0..rows_repeated {
                        for col_offset in 0..cols_repeated {
                            match CellCoordinate::from_index(row + row_offset, col + col_offset) {
                                Some(coordinate) => cells.push((coordinate, cell.clone())),
                                None => warn!(sheet = %sheet_name, "cell outside addressable range skipped"),
                            }
                        }
                    }
                }
                col += cols_repeated;
                text_context = false;
                comment_context = false;
            }
            Event::Start(event) if text_context && event.name() == ANNOTATION => comment_context = true,
            Event::End(event) if text_context && event.name() == ANNOTATION => comment_context = false,
            Event::Start(event) if text_context && !comment_context && event.name() == PARAGRAPH => {
                if let Some(text) = value.as_mut().filter(|text| !text.is_empty()) {
                    text.push('\n');
                }
            }
            Event::Start(event) if text_context && !comment_context && event.name() == SPACE => {
                let count: usize = event.parsed_attribute("text:c")?.unwrap_or(1);
                if let Some(text) = value.as_mut() {
                    text.extend(std::iter::repeat(' ').take(count));
                }
            }
            Event::Text(event) if text_context && !comment_context => {
                if let Some(text) = value.as_mut() {
                    text.append_text(&event)?;
                }
            }
            Event::GeneralRef(event) if text_context && !comment_context => {
                if let Some(text) = value.as_mut() {
                    text.append_reference(&event)?;
                }
            }
        });
        Ok(Document::new(&self.name, sheets))
    }
}

/// Rejects archives whose `mimetype` entry is not an ODS spreadsheet.
fn check_mime<R: Read + Seek>(zip: &mut ZipArchive<R>, name: &str) -> Result<(), PartTallyError> {
    if let Some(mut file) = zip.entry("mimetype")? {
        let mut mime_type = String::new();
        file.read_to_string(&mut mime_type)?;
        if mime_type.trim() != MIME_TYPE {
            Err(SourceError::MimeType(name.to_owned()))?
        }
    }
    Ok(())
}

/// True when the manifest declares encryption data for any entry.
fn is_password_protected<R: Read + Seek>(zip: &mut ZipArchive<R>) -> Result<bool, PartTallyError> {
    let Some(mut reader) = zip.xml_entry("META-INF/manifest.xml")? else {
        return Ok(false);
    };
    let mut in_file_entry = false;
    for_each_xml_event!(reader => {
        Event::Start(event) if event.name() == FILE_ENTRY => in_file_entry = true,
        Event::End(event) if event.name() == FILE_ENTRY => in_file_entry = false,
        Event::Start(event) if in_file_entry && event.name() == ENCRYPTION_DATA => return Ok(true),
    });
    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::reference::parse;
    use crate::source::fixtures::ods_bytes;
    use crate::source::fixtures::ods_bytes_with;
    use std::io::Cursor;

    fn read(tables: &str) -> Document {
        OdsWorkbook::from_reader("test.ods", Cursor::new(ods_bytes(tables)))
            .unwrap()
            .read_document()
            .unwrap()
    }

    fn text(sheet: &SheetGrid, reference: &str) -> Option<String> {
        sheet.get(&parse(reference).unwrap()).map(CellValue::to_string)
    }

    #[test]
    fn reads_tables_and_value_types() {
        let document = read(
            r#"<table:table table:name="Parts">
                <table:table-row>
                    <table:table-cell office:value-type="string"><text:p>Part Number</text:p></table:table-cell>
                    <table:table-cell office:value-type="float" office:value="42"><text:p>42</text:p></table:table-cell>
                    <table:table-cell office:value-type="boolean" office:boolean-value="true"><text:p>TRUE</text:p></table:table-cell>
                    <table:table-cell office:value-type="date" office:date-value="2024-01-31"><text:p>31/01/24</text:p></table:table-cell>
                    <table:table-cell office:value-type="string" calcext:value-type="error"><text:p>#N/A</text:p></table:table-cell>
                </table:table-row>
            </table:table>
            <table:table table:name="Empty"><table:table-row><table:table-cell/></table:table-row></table:table>"#,
        );

        let names: Vec<&str> = document.sheets.iter().map(SheetGrid::name).collect();
        assert_eq!(names, ["Parts", "Empty"]);
        let sheet = &document.sheets[0];
        assert_eq!(text(sheet, "A1").as_deref(), Some("Part Number"));
        assert_eq!(sheet.get(&parse("B1").unwrap()), Some(&CellValue::Number(42.0)));
        assert_eq!(text(sheet, "C1").as_deref(), Some("true"));
        assert_eq!(text(sheet, "D1").as_deref(), Some("2024-01-31"));
        assert_eq!(text(sheet, "E1"), None);
        assert!(document.sheets[1].is_empty());
    }

    #[test]
    fn expands_repeats_for_non_empty_cells_only() {
        let document = read(
            r#"<table:table table:name="S">
                <table:table-row table:number-rows-repeated="2">
                    <table:table-cell table:number-columns-repeated="3"/>
                    <table:table-cell office:value-type="string" table:number-columns-repeated="2"><text:p>x</text:p></table:table-cell>
                </table:table-row>
                <table:table-row><table:table-cell office:value-type="string"><text:p>y</text:p></table:table-cell></table:table-row>
            </table:table>"#,
        );
        let sheet = &document.sheets[0];

        assert_eq!(sheet.len(), 5);
        for reference in ["D1", "E1", "D2", "E2"] {
            assert_eq!(text(sheet, reference).as_deref(), Some("x"), "{reference}");
        }
        assert_eq!(text(sheet, "A3").as_deref(), Some("y"));
        assert_eq!(sheet.max_row(), 3);
    }

    #[test]
    fn text_paragraphs_spaces_and_annotations() {
        let document = read(
            r#"<table:table table:name="S"><table:table-row>
                <table:table-cell office:value-type="string"><office:annotation><text:p>note</text:p></office:annotation><text:p>Part<text:s text:c="2"/>Number</text:p><text:p>A&amp;B</text:p></table:table-cell>
            </table:table-row></table:table>"#,
        );

        assert_eq!(text(&document.sheets[0], "A1").as_deref(), Some("Part  Number\nA&B"));
    }

    #[test]
    fn wrong_mime_type_is_error() {
        let bytes = ods_bytes_with("", "application/zip", false);
        let error = OdsWorkbook::from_reader("x.ods", Cursor::new(bytes)).err().expect("mime error");
        assert_eq!(error.to_string(), "Invalid ODS MIME type in 'x.ods'");
    }

    #[test]
    fn encrypted_is_error() {
        let bytes = ods_bytes_with("", MIME_TYPE, true);
        let error = OdsWorkbook::from_reader("x.ods", Cursor::new(bytes)).err().expect("encrypted");
        assert_eq!(error.to_string(), "Workbook 'x.ods' is password protected");
    }
}

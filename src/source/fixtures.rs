//! In-memory workbook builders for tests.
use std::io::Cursor;
use std::io::Write;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

pub(crate) struct XlsxSheet<'a> {
    name: &'a str,
    /// Raw `<sheetData>` content
    rows: &'a str,
}

impl<'a> XlsxSheet<'a> {
    pub(crate) fn new(name: &'a str, rows: &'a str) -> Self {
        Self { name, rows }
    }
}

fn write_entries(entries: &[(String, String)]) -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, content) in entries {
        writer
            .start_file(name.as_str(), SimpleFileOptions::default())
            .expect("start zip entry");
        writer.write_all(content.as_bytes()).expect("write zip entry");
    }
    writer.finish().expect("finish zip").into_inner()
}

/// Builds an `.xlsx` archive; each shared string is the raw inner XML of an `<si>`.
pub(crate) fn xlsx_bytes(sheets: &[XlsxSheet], shared_strings: &[&str]) -> Vec<u8> {
    let mut workbook = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheets>"#,
    );
    let mut relationships = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
    );
    let mut entries = Vec::new();
    for (index, sheet) in sheets.iter().enumerate() {
        let id = index + 1;
        workbook.push_str(&format!(r#"<sheet name="{}" sheetId="{id}" r:id="rId{id}"/>"#, sheet.name));
        relationships.push_str(&format!(
            r#"<Relationship Id="rId{id}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet{id}.xml"/>"#
        ));
        entries.push((
            format!("xl/worksheets/sheet{id}.xml"),
            format!(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData>{}</sheetData></worksheet>"#,
                sheet.rows
            ),
        ));
    }
    relationships.push_str(&format!(
        r#"<Relationship Id="rId{}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/sharedStrings" Target="sharedStrings.xml"/>"#,
        sheets.len() + 1
    ));
    workbook.push_str("</sheets></workbook>");
    relationships.push_str("</Relationships>");
    entries.push(("xl/workbook.xml".to_owned(), workbook));
    entries.push(("xl/_rels/workbook.xml.rels".to_owned(), relationships));

    if !shared_strings.is_empty() {
        let items: String = shared_strings.iter().map(|item| format!("<si>{item}</si>")).collect();
        entries.push((
            "xl/sharedStrings.xml".to_owned(),
            format!(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<sst xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" count="{0}" uniqueCount="{0}">{items}</sst>"#,
                shared_strings.len()
            ),
        ));
    }
    write_entries(&entries)
}

/// Builds an `.ods` archive; `tables` is the raw content of `<office:spreadsheet>`.
pub(crate) fn ods_bytes(tables: &str) -> Vec<u8> {
    ods_bytes_with(tables, "application/vnd.oasis.opendocument.spreadsheet", false)
}

pub(crate) fn ods_bytes_with(tables: &str, mime_type: &str, encrypted: bool) -> Vec<u8> {
    let encryption = if encrypted {
        r#"<manifest:encryption-data manifest:checksum-type="SHA1/1K" manifest:checksum="x"/>"#
    } else {
        ""
    };
    let entries = [
        ("mimetype".to_owned(), mime_type.to_owned()),
        (
            "META-INF/manifest.xml".to_owned(),
            format!(
                r#"<?xml version="1.0" encoding="UTF-8"?>
<manifest:manifest xmlns:manifest="urn:oasis:names:tc:opendocument:xmlns:manifest:1.0" manifest:version="1.2">
<manifest:file-entry manifest:full-path="/" manifest:media-type="application/vnd.oasis.opendocument.spreadsheet"/>
<manifest:file-entry manifest:full-path="content.xml" manifest:media-type="text/xml">{encryption}</manifest:file-entry>
</manifest:manifest>"#
            ),
        ),
        (
            "content.xml".to_owned(),
            format!(
                r#"<?xml version="1.0" encoding="UTF-8"?>
<office:document-content xmlns:office="urn:oasis:names:tc:opendocument:xmlns:office:1.0" xmlns:table="urn:oasis:names:tc:opendocument:xmlns:table:1.0" xmlns:text="urn:oasis:names:tc:opendocument:xmlns:text:1.0" xmlns:calcext="urn:org:documentfoundation:names:experimental:calc:xmlns:calcext:1.0" office:version="1.2"><office:body><office:spreadsheet>{tables}</office:spreadsheet></office:body></office:document-content>"#
            ),
        ),
    ];
    write_entries(&entries)
}

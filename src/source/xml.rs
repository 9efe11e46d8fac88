//! Thin layer over `quick-xml` shared by the XLSX and ODS readers.
use crate::error::PartTallyError;
use quick_xml::escape::resolve_xml_entity;
use quick_xml::events::BytesRef;
use quick_xml::events::BytesStart;
use quick_xml::events::BytesText;
use quick_xml::events::Event;
use quick_xml::Reader;
use std::io::BufRead;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum XmlError {
    #[error("Unknown entity '&{0};'")]
    UnknownEntity(String),

    #[error("Attribute '{name}' has unexpected value '{value}'")]
    AttributeValue { name: String, value: String },
}

/// Event reader with a reusable buffer, configured for spreadsheet parts.
pub(crate) struct XmlReader<R: BufRead> {
    reader: Reader<R>,
    buffer: Vec<u8>,
}

impl<R: BufRead> XmlReader<R> {
    pub(crate) fn new(source: R) -> Self {
        let mut reader = Reader::from_reader(source);
        let config = reader.config_mut();
        config.check_comments = false;
        config.check_end_names = false;
        // <c/> and <table:table-cell/> arrive as Start + End pairs
        config.expand_empty_elements = true;
        config.trim_text(false);
        Self {
            reader,
            buffer: Vec::with_capacity(1024),
        }
    }

    /// Next event, `None` at end of input.
    pub(crate) fn next(&mut self) -> Result<Option<Event<'_>>, PartTallyError> {
        self.buffer.clear();
        match self.reader.read_event_into(&mut self.buffer)? {
            Event::Eof => Ok(None),
            event => Ok(Some(event)),
        }
    }
}

/// Attribute access on start tags.
pub(crate) trait StartTagExt {
    /// Unescaped value of the named attribute.
    fn attribute(&self, name: &str) -> Result<Option<String>, PartTallyError>;

    /// Named attribute parsed into `T`.
    fn parsed_attribute<T: FromStr>(&self, name: &str) -> Result<Option<T>, PartTallyError>;
}

impl StartTagExt for BytesStart<'_> {
    fn attribute(&self, name: &str) -> Result<Option<String>, PartTallyError> {
        match self.try_get_attribute(name)? {
            Some(attribute) => Ok(Some(attribute.unescape_value()?.into_owned())),
            None => Ok(None),
        }
    }

    fn parsed_attribute<T: FromStr>(&self, name: &str) -> Result<Option<T>, PartTallyError> {
        let Some(value) = self.attribute(name)? else {
            return Ok(None);
        };
        match value.parse() {
            Ok(parsed) => Ok(Some(parsed)),
            Err(_) => Err(XmlError::AttributeValue {
                name: name.to_owned(),
                value,
            })?,
        }
    }
}

/// Accumulates character data, resolving entity and character references.
pub(crate) trait TextSink {
    fn append_text(&mut self, text: &BytesText) -> Result<(), PartTallyError>;

    fn append_reference(&mut self, reference: &BytesRef) -> Result<(), PartTallyError>;
}

impl TextSink for String {
    fn append_text(&mut self, text: &BytesText) -> Result<(), PartTallyError> {
        self.push_str(&text.xml_content()?);
        Ok(())
    }

    fn append_reference(&mut self, reference: &BytesRef) -> Result<(), PartTallyError> {
        let raw = reference.xml_content()?;
        if let Some(number) = raw.strip_prefix('#') {
            let code = match number.strip_prefix('x') {
                Some(hex) => u32::from_str_radix(hex, 16)?,
                None => number.parse::<u32>()?,
            };
            if let Some(character) = char::from_u32(code) {
                self.push(character);
            }
        } else if let Some(entity) = resolve_xml_entity(&raw) {
            self.push_str(entity);
        } else {
            Err(XmlError::UnknownEntity(raw.to_string()))?;
        }
        Ok(())
    }
}

/// Loops over the remaining events of an [`XmlReader`], dispatching to the
/// given match arms; unmatched events are ignored.
macro_rules! for_each_xml_event {
    ($reader:expr => { $($arms:tt)* }) => {
        while let Some(event) = $reader.next()? {
            match event {
                Event::Eof => break,
                $($arms)*
                _ => (),
            }
        }
    };
}

pub(crate) use for_each_xml_event;

//! Entry lookup inside the ZIP containers used by `.xlsx` and `.ods`.
use crate::error::PartTallyError;
use crate::source::xml::XmlReader;
use std::io::BufReader;
use std::io::Read;
use std::io::Seek;
use zip::read::ZipFile;
use zip::result::ZipError;
use zip::ZipArchive;

pub(crate) trait ZipArchiveExt<R: Read + Seek> {
    /// Entry by name, ignoring ASCII case and accepting `\` separators.
    fn entry(&mut self, name: &str) -> Result<Option<ZipFile<'_, R>>, PartTallyError>;

    /// XML reader over an entry.
    fn xml_entry(&mut self, name: &str) -> Result<Option<XmlReader<BufReader<ZipFile<'_, R>>>>, PartTallyError>;
}

impl<R: Read + Seek> ZipArchiveExt<R> for ZipArchive<R> {
    fn entry(&mut self, name: &str) -> Result<Option<ZipFile<'_, R>>, PartTallyError> {
        let wanted = name.replace('\\', "/");
        let Some(stored) = self
            .file_names()
            .find(|stored| wanted.eq_ignore_ascii_case(stored))
            .map(str::to_owned)
        else {
            return Ok(None);
        };
        match self.by_name(&stored) {
            Ok(file) => Ok(Some(file)),
            Err(ZipError::FileNotFound) => Ok(None),
            Err(error) => Err(error)?,
        }
    }

    fn xml_entry(&mut self, name: &str) -> Result<Option<XmlReader<BufReader<ZipFile<'_, R>>>>, PartTallyError> {
        Ok(self
            .entry(name)?
            .map(|file| XmlReader::new(BufReader::new(file))))
    }
}

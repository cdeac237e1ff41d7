//! ZIP archive helper for reading parts of an XLSX package.

use crate::helpers::xml::XmlReader;
use crate::workbook::LoadError;
use std::io::BufReader;
use std::io::Read;
use std::io::Seek;
use zip::read::ZipFile;
use zip::result::ZipError;
use zip::ZipArchive;

/// Helper trait for ZIP archive operations with spreadsheet-specific
/// reader creation.
pub(crate) trait ZipHelper<RS: Read + Seek> {
    /// Gets a file from the archive by name, matching case-insensitively
    /// and treating backslashes as path separators. Returns `None` when
    /// the part is absent, which is a normal condition for optional parts
    /// such as `xl/sharedStrings.xml`.
    fn file(&'_ mut self, name: &str) -> Result<Option<ZipFile<'_, RS>>, LoadError>;

    /// Creates an XML reader over a part within the archive.
    fn xml_reader(
        &'_ mut self,
        name: &str,
    ) -> Result<Option<XmlReader<BufReader<ZipFile<'_, RS>>>>, LoadError>;
}

impl<RS: Read + Seek> ZipHelper<RS> for ZipArchive<RS> {
    fn file(&'_ mut self, name: &str) -> Result<Option<ZipFile<'_, RS>>, LoadError> {
        let pattern = name.replace('\\', "/");
        let path = self
            .file_names()
            .find(|file_name| pattern.eq_ignore_ascii_case(file_name))
            .map(|file_name| file_name.to_owned());
        match path.map(|file_name| self.by_name(&file_name)).transpose() {
            Ok(Some(file)) => Ok(Some(file)),
            Ok(None) | Err(ZipError::FileNotFound) => Ok(None),
            Err(error) => Err(error)?,
        }
    }

    fn xml_reader(
        &'_ mut self,
        name: &str,
    ) -> Result<Option<XmlReader<BufReader<ZipFile<'_, RS>>>>, LoadError> {
        let reader = self
            .file(name)?
            .map(|file| XmlReader::new(BufReader::new(file)));
        Ok(reader)
    }
}
